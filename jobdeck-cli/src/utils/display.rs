use chrono::{DateTime, Utc};
use comfy_table::Table;
use jobdeck::{DashboardView, Job, JobActions, JobRow, JobStats, JobStatus, NotificationLevel};
use std::fmt;

pub fn status_icon(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending => "🟡",
        JobStatus::Running => "🔵",
        JobStatus::Completed => "🟢",
        JobStatus::Failed => "🔴",
        JobStatus::Cancelled => "⚪",
    }
}

pub struct JobTable {
    table: Table,
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}

impl JobTable {
    pub fn new() -> Self {
        let mut table = Table::new();
        table.set_header(vec![
            "ID",
            "Name",
            "Status",
            "Attempts",
            "Next Run",
            "Last Run",
            "Repeat",
            "Actions",
            "Last Error",
        ]);
        Self { table }
    }

    pub fn add_row(&mut self, row: &JobRow) {
        let job = &row.job;
        let locked = if job.is_locked() { " 🔒" } else { "" };

        self.table.add_row(vec![
            short_id(&job.id).to_string(),
            job.name.clone(),
            format!("{} {}{}", status_icon(job.status), job.status, locked),
            job.attempts.to_string(),
            format_timestamp(job.next_run_at),
            format_timestamp(job.last_run_at),
            job.repeat
                .as_ref()
                .map(|repeat| repeat.to_string())
                .unwrap_or_else(|| "-".to_string()),
            format_actions(&row.actions),
            row.error_summary.clone().unwrap_or_default(),
        ]);
    }

    pub fn len(&self) -> usize {
        self.table.row_iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for JobTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table)
    }
}

pub struct StatsTable {
    table: Table,
}

impl StatsTable {
    pub fn new(stats: &JobStats) -> Self {
        let mut table = Table::new();
        table.set_header(vec!["Status", "Count"]);
        for status in JobStatus::ALL {
            table.add_row(vec![
                format!("{} {}", status_icon(status), status),
                stats.count(status).to_string(),
            ]);
        }
        table.add_row(vec!["Total".to_string(), stats.total.to_string()]);
        Self { table }
    }
}

impl fmt::Display for StatsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table)
    }
}

/// Ids longer than 12 characters are shortened for the list view.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(12) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

pub fn format_timestamp(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn format_actions(actions: &JobActions) -> String {
    actions
        .enabled()
        .iter()
        .map(|action| action.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The page table, its range and navigation line, then notifications.
pub fn render_view(view: &DashboardView) -> String {
    let mut out = String::new();

    if view.loading && view.total_count == 0 {
        out.push_str("⏳ Loading jobs...\n");
        return out;
    }

    if let Some(stats) = &view.stats {
        out.push_str(&format!(
            "📊 {} total | {} pending | {} running | {} completed | {} failed | {} cancelled\n",
            stats.total,
            stats.pending,
            stats.running,
            stats.completed,
            stats.failed,
            stats.cancelled
        ));
    }

    if view.rows.is_empty() {
        out.push_str("No jobs found\n");
    } else {
        let mut table = JobTable::new();
        for row in &view.rows {
            table.add_row(row);
        }
        out.push_str(&format!("{}\n", table));
    }

    if let Some(range) = &view.range {
        out.push_str(&format!("{}\n", range));
    }
    if view.total_pages > 1 {
        let buttons: Vec<String> = view
            .page_buttons
            .iter()
            .map(|page| {
                if *page == view.page {
                    format!("[{}]", page)
                } else {
                    page.to_string()
                }
            })
            .collect();
        out.push_str(&format!(
            "{} {} {}\n",
            if view.has_previous { "‹ prev" } else { "" },
            buttons.join(" "),
            if view.has_next { "next ›" } else { "" }
        ));
    }
    if view.loading {
        out.push_str("🔄 Refreshing...\n");
    }

    for notification in &view.notifications {
        let icon = match notification.level {
            NotificationLevel::Info => "✅",
            NotificationLevel::Error => "❌",
        };
        out.push_str(&format!("{} {}\n", icon, notification.message));
    }

    out
}

pub fn render_job_details(job: &Job) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec!["ID".to_string(), job.id.clone()]);
    table.add_row(vec!["Name".to_string(), job.name.clone()]);
    table.add_row(vec![
        "Status".to_string(),
        format!("{} {}", status_icon(job.status), job.status),
    ]);
    table.add_row(vec!["Attempts".to_string(), job.attempts.to_string()]);
    if let Some(priority) = job.priority {
        table.add_row(vec!["Priority".to_string(), priority.to_string()]);
    }
    if let Some(concurrency) = job.concurrency {
        table.add_row(vec!["Concurrency".to_string(), concurrency.to_string()]);
    }
    if let Some(key) = &job.dedupe_key {
        table.add_row(vec!["Dedupe Key".to_string(), key.clone()]);
    }
    table.add_row(vec!["Next Run".to_string(), format_timestamp(job.next_run_at)]);
    table.add_row(vec!["Last Run".to_string(), format_timestamp(job.last_run_at)]);
    table.add_row(vec![
        "Locked By".to_string(),
        job.locked_by.clone().unwrap_or_else(|| "-".to_string()),
    ]);
    if let Some(retry) = &job.retry {
        table.add_row(vec![
            "Retry".to_string(),
            format!("{} attempts, delay {}", retry.max_attempts, retry.delay),
        ]);
    }
    if let Some(repeat) = &job.repeat {
        table.add_row(vec!["Repeat".to_string(), repeat.to_string()]);
    }
    table.add_row(vec!["Actions".to_string(), format_actions(&job.actions())]);
    table.add_row(vec!["Created".to_string(), format_timestamp(Some(job.created_at))]);
    table.add_row(vec!["Updated".to_string(), format_timestamp(Some(job.updated_at))]);
    table.add_row(vec![
        "Data".to_string(),
        serde_json::to_string_pretty(&job.data).unwrap_or_else(|_| job.data.to_string()),
    ]);
    if let Some(error) = &job.last_error {
        table.add_row(vec!["Last Error".to_string(), error.clone()]);
    }
    table.to_string()
}
