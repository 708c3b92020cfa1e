use crate::error::DashboardError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Opaque identifier assigned by the remote scheduler.
pub type JobId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub const ALL: [JobStatus; 5] = [
        JobStatus::Pending,
        JobStatus::Running,
        JobStatus::Completed,
        JobStatus::Failed,
        JobStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Only failed jobs can be sent back to pending.
    pub fn can_retry(&self) -> bool {
        matches!(self, JobStatus::Failed)
    }

    pub fn can_cancel(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Running)
    }

    /// Completed and cancelled jobs never move again from the client's point of view.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DashboardError::validation(format!("Unknown job status: {}", s)))
    }
}

/// User-initiated actions a job row can offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobAction {
    Edit,
    Retry,
    Cancel,
    Delete,
}

impl JobAction {
    pub fn is_available_for(&self, status: JobStatus) -> bool {
        match self {
            JobAction::Edit | JobAction::Delete => true,
            JobAction::Retry => status.can_retry(),
            JobAction::Cancel => status.can_cancel(),
        }
    }

    /// Destructive actions need an explicit yes from the user before anything is sent.
    pub fn requires_confirmation(&self) -> bool {
        matches!(self, JobAction::Cancel | JobAction::Delete)
    }
}

impl fmt::Display for JobAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobAction::Edit => "edit",
            JobAction::Retry => "retry",
            JobAction::Cancel => "cancel",
            JobAction::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// The set of actions enabled for one job, derived from its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobActions {
    pub edit: bool,
    pub retry: bool,
    pub cancel: bool,
    pub delete: bool,
}

impl JobActions {
    pub fn for_status(status: JobStatus) -> Self {
        Self {
            edit: JobAction::Edit.is_available_for(status),
            retry: JobAction::Retry.is_available_for(status),
            cancel: JobAction::Cancel.is_available_for(status),
            delete: JobAction::Delete.is_available_for(status),
        }
    }

    pub fn contains(&self, action: JobAction) -> bool {
        match action {
            JobAction::Edit => self.edit,
            JobAction::Retry => self.retry,
            JobAction::Cancel => self.cancel,
            JobAction::Delete => self.delete,
        }
    }

    pub fn enabled(&self) -> Vec<JobAction> {
        [
            JobAction::Edit,
            JobAction::Retry,
            JobAction::Cancel,
            JobAction::Delete,
        ]
        .into_iter()
        .filter(|action| self.contains(*action))
        .collect()
    }
}

/// Delay between retry attempts.
///
/// The scheduler may hold a delay computed from the attempt number. That form
/// cannot cross the wire, so anything that is not a plain millisecond count
/// decodes to `Dynamic` and is only ever displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryDelay {
    Fixed(u64),
    #[default]
    Dynamic,
}

impl RetryDelay {
    pub fn is_dynamic(&self) -> bool {
        matches!(self, RetryDelay::Dynamic)
    }

    pub fn as_millis(&self) -> Option<u64> {
        match self {
            RetryDelay::Fixed(ms) => Some(*ms),
            RetryDelay::Dynamic => None,
        }
    }
}

impl fmt::Display for RetryDelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryDelay::Fixed(ms) => write!(f, "{}ms", ms),
            RetryDelay::Dynamic => f.write_str("Dynamic"),
        }
    }
}

impl Serialize for RetryDelay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RetryDelay::Fixed(ms) => serializer.serialize_u64(*ms),
            RetryDelay::Dynamic => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for RetryDelay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let fixed = value.as_u64().or_else(|| {
            value
                .as_f64()
                .filter(|ms| ms.is_finite() && *ms >= 0.0 && ms.fract() == 0.0)
                .map(|ms| ms as u64)
        });
        Ok(fixed.map(RetryDelay::Fixed).unwrap_or(RetryDelay::Dynamic))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    #[serde(default)]
    pub max_attempts: u32,
    #[serde(default, skip_serializing_if = "RetryDelay::is_dynamic")]
    pub delay: RetryDelay,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay_ms: u64) -> Self {
        Self {
            max_attempts,
            delay: RetryDelay::Fixed(delay_ms),
        }
    }
}

/// Recurrence of a job. Exactly one form is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepeatSchedule {
    Cron {
        expression: String,
        timezone: Option<String>,
    },
    Every {
        interval_ms: u64,
    },
}

impl RepeatSchedule {
    pub fn cron(expression: impl Into<String>) -> Self {
        RepeatSchedule::Cron {
            expression: expression.into(),
            timezone: None,
        }
    }

    pub fn every(interval_ms: u64) -> Self {
        RepeatSchedule::Every { interval_ms }
    }
}

impl fmt::Display for RepeatSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepeatSchedule::Cron {
                expression,
                timezone: Some(tz),
            } => write!(f, "cron {} ({})", expression, tz),
            RepeatSchedule::Cron { expression, .. } => write!(f, "cron {}", expression),
            RepeatSchedule::Every { interval_ms } => write!(f, "every {}ms", interval_ms),
        }
    }
}

/// Wire shape `{cron?, every?, timezone?}` for repeat schedules.
pub(crate) mod repeat_wire {
    use super::RepeatSchedule;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct RepeatWire {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cron: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        every: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timezone: Option<String>,
    }

    impl RepeatWire {
        // cron wins when a payload carries both
        fn into_schedule(self) -> Option<RepeatSchedule> {
            match (self.cron, self.every) {
                (Some(expression), _) if !expression.trim().is_empty() => {
                    Some(RepeatSchedule::Cron {
                        expression,
                        timezone: self.timezone.filter(|tz| !tz.trim().is_empty()),
                    })
                }
                (_, Some(interval_ms)) if interval_ms > 0 => {
                    Some(RepeatSchedule::Every { interval_ms })
                }
                _ => None,
            }
        }
    }

    impl From<&RepeatSchedule> for RepeatWire {
        fn from(schedule: &RepeatSchedule) -> Self {
            match schedule {
                RepeatSchedule::Cron {
                    expression,
                    timezone,
                } => RepeatWire {
                    cron: Some(expression.clone()),
                    every: None,
                    timezone: timezone.clone(),
                },
                RepeatSchedule::Every { interval_ms } => RepeatWire {
                    cron: None,
                    every: Some(*interval_ms),
                    timezone: None,
                },
            }
        }
    }

    pub fn serialize<S: Serializer>(
        schedule: &Option<RepeatSchedule>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        schedule.as_ref().map(RepeatWire::from).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<RepeatSchedule>, D::Error> {
        let wire = Option::<RepeatWire>::deserialize(deserializer)?;
        Ok(wire.and_then(RepeatWire::into_schedule))
    }
}

/// A job as reported by the remote scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(rename = "_id")]
    pub id: JobId,
    pub name: String,
    #[serde(default)]
    pub data: serde_json::Value,
    pub status: JobStatus,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_run_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "repeat_wire")]
    pub repeat: Option<RepeatSchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedupe_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const ERROR_SUMMARY_LEN: usize = 100;

impl Job {
    pub fn new(id: impl Into<JobId>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            data: serde_json::Value::Object(Default::default()),
            status: JobStatus::Pending,
            attempts: 0,
            next_run_at: Some(now),
            last_run_at: None,
            locked_at: None,
            locked_by: None,
            retry: None,
            repeat: None,
            last_error: None,
            priority: None,
            concurrency: None,
            dedupe_key: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn with_repeat(mut self, repeat: RepeatSchedule) -> Self {
        self.repeat = Some(repeat);
        self
    }

    pub fn with_last_error(mut self, error: impl Into<String>) -> Self {
        self.last_error = Some(error.into());
        self
    }

    pub fn with_lock(mut self, worker: impl Into<String>) -> Self {
        self.locked_by = Some(worker.into());
        self.locked_at = Some(Utc::now());
        self
    }

    /// A job is claimed by a worker while a lock owner is present.
    pub fn is_locked(&self) -> bool {
        self.locked_by.is_some()
    }

    pub fn is_recurring(&self) -> bool {
        self.repeat.is_some()
    }

    pub fn actions(&self) -> JobActions {
        JobActions::for_status(self.status)
    }

    /// Last error shortened for list rows.
    pub fn error_summary(&self) -> Option<String> {
        let error = self.last_error.as_deref()?;
        if error.chars().count() > ERROR_SUMMARY_LEN {
            let head: String = error.chars().take(ERROR_SUMMARY_LEN).collect();
            Some(format!("{}...", head))
        } else {
            Some(error.to_string())
        }
    }
}

/// Per-status counts reported by `GET /jobs/stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobStats {
    pub total: u64,
    pub pending: u64,
    pub running: u64,
    pub completed: u64,
    pub failed: u64,
    pub cancelled: u64,
}

impl JobStats {
    pub fn count(&self, status: JobStatus) -> u64 {
        match status {
            JobStatus::Pending => self.pending,
            JobStatus::Running => self.running,
            JobStatus::Completed => self.completed,
            JobStatus::Failed => self.failed,
            JobStatus::Cancelled => self.cancelled,
        }
    }

    pub fn from_jobs<'a>(jobs: impl IntoIterator<Item = &'a Job>) -> Self {
        jobs.into_iter().fold(Self::default(), |mut stats, job| {
            stats.total += 1;
            match job.status {
                JobStatus::Pending => stats.pending += 1,
                JobStatus::Running => stats.running += 1,
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Failed => stats.failed += 1,
                JobStatus::Cancelled => stats.cancelled += 1,
            }
            stats
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    NextRunAt,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::NextRunAt => "nextRunAt",
            SortField::CreatedAt => "createdAt",
            SortField::UpdatedAt => "updatedAt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Server-side query for `GET /jobs`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobQuery {
    pub name: Option<String>,
    pub statuses: Vec<JobStatus>,
    pub limit: Option<u32>,
    pub skip: Option<u32>,
    pub sort: Option<(SortField, SortOrder)>,
}

impl JobQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_skip(mut self, skip: u32) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn sorted_by(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort = Some((field, order));
        self
    }

    /// Query pairs in bracket notation: `status[]=a&status[]=b`, `sort[field]=createdAt`.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(name) = &self.name {
            pairs.push(("name".to_string(), name.clone()));
        }
        match self.statuses.as_slice() {
            [] => {}
            [status] => pairs.push(("status".to_string(), status.to_string())),
            many => {
                for status in many {
                    pairs.push(("status[]".to_string(), status.to_string()));
                }
            }
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(skip) = self.skip {
            pairs.push(("skip".to_string(), skip.to_string()));
        }
        if let Some((field, order)) = self.sort {
            pairs.push(("sort[field]".to_string(), field.as_str().to_string()));
            pairs.push(("sort[order]".to_string(), order.as_str().to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_transitions_offered() {
        assert!(JobStatus::Failed.can_retry());
        for status in [
            JobStatus::Pending,
            JobStatus::Running,
            JobStatus::Completed,
            JobStatus::Cancelled,
        ] {
            assert!(!status.can_retry(), "{} must not offer retry", status);
        }

        assert!(JobStatus::Pending.can_cancel());
        assert!(JobStatus::Running.can_cancel());
        assert!(!JobStatus::Completed.can_cancel());
        assert!(!JobStatus::Failed.can_cancel());
        assert!(!JobStatus::Cancelled.can_cancel());

        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("failed".parse::<JobStatus>().unwrap(), JobStatus::Failed);
        assert_eq!(" Running ".parse::<JobStatus>().unwrap(), JobStatus::Running);
        assert!("dead".parse::<JobStatus>().unwrap_err().is_validation());
    }

    #[test]
    fn test_actions_by_status() {
        let failed = JobActions::for_status(JobStatus::Failed);
        assert_eq!(
            failed.enabled(),
            vec![JobAction::Edit, JobAction::Retry, JobAction::Delete]
        );

        let running = JobActions::for_status(JobStatus::Running);
        assert_eq!(
            running.enabled(),
            vec![JobAction::Edit, JobAction::Cancel, JobAction::Delete]
        );

        let completed = JobActions::for_status(JobStatus::Completed);
        assert!(!completed.retry);
        assert!(!completed.cancel);
        assert!(completed.delete);

        assert!(JobAction::Delete.requires_confirmation());
        assert!(JobAction::Cancel.requires_confirmation());
        assert!(!JobAction::Retry.requires_confirmation());
    }

    #[test]
    fn test_job_deserialize_wire_format() {
        let raw = json!({
            "_id": "65a1f0c2e4b0a1b2c3d4e5f6",
            "name": "send-email-campaign",
            "data": {"to": "user@example.com"},
            "status": "failed",
            "attempts": 2,
            "nextRunAt": "2025-01-12T10:00:00.000Z",
            "lockedBy": "worker-7",
            "retry": {"maxAttempts": 5, "delay": 2000},
            "repeat": {"cron": "*/5 * * * *", "timezone": "Europe/London"},
            "lastError": "SMTP timeout",
            "dedupeKey": "campaign-42",
            "createdAt": "2025-01-12T09:00:00.000Z",
            "updatedAt": "2025-01-12T09:30:00.000Z"
        });

        let job: Job = serde_json::from_value(raw).unwrap();
        assert_eq!(job.id, "65a1f0c2e4b0a1b2c3d4e5f6");
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.attempts, 2);
        assert!(job.is_locked());
        assert_eq!(job.retry, Some(RetryPolicy::fixed(5, 2000)));
        assert_eq!(
            job.repeat,
            Some(RepeatSchedule::Cron {
                expression: "*/5 * * * *".to_string(),
                timezone: Some("Europe/London".to_string()),
            })
        );
        assert_eq!(job.dedupe_key.as_deref(), Some("campaign-42"));
        assert!(job.last_run_at.is_none());
    }

    #[test]
    fn test_dynamic_retry_delay_is_display_only() {
        let raw = json!({
            "_id": "a",
            "name": "backoff",
            "status": "pending",
            "retry": {"maxAttempts": 4},
            "createdAt": "2025-01-12T09:00:00Z",
            "updatedAt": "2025-01-12T09:00:00Z"
        });
        let job: Job = serde_json::from_value(raw).unwrap();
        let retry = job.retry.clone().unwrap();
        assert!(retry.delay.is_dynamic());
        assert_eq!(retry.delay.to_string(), "Dynamic");

        let encoded = serde_json::to_value(&job).unwrap();
        assert_eq!(encoded["retry"], json!({"maxAttempts": 4}));
    }

    #[test]
    fn test_repeat_prefers_cron_and_drops_empty() {
        let both: Job = serde_json::from_value(json!({
            "_id": "a", "name": "n", "status": "pending",
            "repeat": {"cron": "0 * * * *", "every": 60000},
            "createdAt": "2025-01-12T09:00:00Z", "updatedAt": "2025-01-12T09:00:00Z"
        }))
        .unwrap();
        assert_eq!(both.repeat, Some(RepeatSchedule::cron("0 * * * *")));

        let empty: Job = serde_json::from_value(json!({
            "_id": "b", "name": "n", "status": "pending", "repeat": {},
            "createdAt": "2025-01-12T09:00:00Z", "updatedAt": "2025-01-12T09:00:00Z"
        }))
        .unwrap();
        assert!(empty.repeat.is_none());

        let every = Job::new("c", "tick").with_repeat(RepeatSchedule::every(30_000));
        let encoded = serde_json::to_value(&every).unwrap();
        assert_eq!(encoded["repeat"], json!({"every": 30000}));
    }

    #[test]
    fn test_error_summary_truncates() {
        let long = "x".repeat(150);
        let job = Job::new("a", "n").with_last_error(long);
        let summary = job.error_summary().unwrap();
        assert_eq!(summary.len(), 103);
        assert!(summary.ends_with("..."));

        let short = Job::new("b", "n").with_last_error("boom");
        assert_eq!(short.error_summary().as_deref(), Some("boom"));
        assert!(Job::new("c", "n").error_summary().is_none());
    }

    #[test]
    fn test_stats_from_jobs() {
        let jobs = vec![
            Job::new("1", "a"),
            Job::new("2", "b").with_status(JobStatus::Failed),
            Job::new("3", "c").with_status(JobStatus::Failed),
        ];
        let stats = JobStats::from_jobs(&jobs);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.count(JobStatus::Failed), 2);
        assert_eq!(stats.count(JobStatus::Pending), 1);
    }

    #[test]
    fn test_query_pairs() {
        let query = JobQuery::new()
            .with_name("email")
            .with_status(JobStatus::Failed)
            .with_limit(50)
            .sorted_by(SortField::CreatedAt, SortOrder::Desc);
        assert_eq!(
            query.to_query_pairs(),
            vec![
                ("name".to_string(), "email".to_string()),
                ("status".to_string(), "failed".to_string()),
                ("limit".to_string(), "50".to_string()),
                ("sort[field]".to_string(), "createdAt".to_string()),
                ("sort[order]".to_string(), "desc".to_string()),
            ]
        );

        let many = JobQuery::new()
            .with_status(JobStatus::Pending)
            .with_status(JobStatus::Running)
            .with_skip(20);
        assert_eq!(
            many.to_query_pairs(),
            vec![
                ("status[]".to_string(), "pending".to_string()),
                ("status[]".to_string(), "running".to_string()),
                ("skip".to_string(), "20".to_string()),
            ]
        );
        assert!(JobQuery::default().to_query_pairs().is_empty());
    }
}
