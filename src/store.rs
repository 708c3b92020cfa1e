//! View state of a dashboard session, driven by a pure reducer.
//!
//! Every change to the authoritative collection or to the view parameters
//! arrives as a [`ViewEvent`]. [`ViewState::reduce`] applies one event and
//! recomputes every derived value before returning, so no caller can observe
//! a collection whose filtered sequence or page is out of date.

use crate::{
    filter::{JobFilter, filter_jobs},
    job::{Job, JobActions, JobId, JobStats},
    pagination::{PageRange, PageSize, clamp_page, page_buttons, paginate, total_pages},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use tracing::{debug, warn};

/// Notifications kept before the oldest is dropped.
pub const MAX_NOTIFICATIONS: usize = 20;

/// Monotonic number attached to each list refresh when it starts.
pub type RefreshSeq = u64;

/// How overlapping list refreshes resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// Every completion applies; the one that finishes last wins.
    #[default]
    LastCompletion,
    /// A completion older than the newest applied refresh is discarded.
    LatestRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Create,
    Update,
    Delete,
    Cancel,
    Retry,
}

impl CommandKind {
    pub fn past_tense(&self) -> &'static str {
        match self {
            CommandKind::Create => "created",
            CommandKind::Update => "updated",
            CommandKind::Delete => "deleted",
            CommandKind::Cancel => "cancelled",
            CommandKind::Retry => "queued for retry",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandKind::Create => "create",
            CommandKind::Update => "update",
            CommandKind::Delete => "delete",
            CommandKind::Cancel => "cancel",
            CommandKind::Retry => "retry",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    RefreshStarted {
        seq: RefreshSeq,
    },
    JobsRefreshed {
        seq: RefreshSeq,
        jobs: Vec<Job>,
    },
    RefreshFailed {
        seq: RefreshSeq,
        message: String,
    },
    StatsRefreshed(JobStats),
    StatsFailed(String),
    FilterChanged(JobFilter),
    PageChanged(u32),
    PageSizeChanged(PageSize),
    JobSelected(Option<JobId>),
    CommandCompleted {
        command: CommandKind,
        job_id: Option<JobId>,
        error: Option<String>,
    },
    /// Drop the notification at this index, oldest first.
    NotificationDismissed(usize),
    NotificationsCleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Non-blocking message for the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// One visible row with the actions it offers.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRow {
    pub job: Job,
    pub actions: JobActions,
    pub error_summary: Option<String>,
}

impl From<Job> for JobRow {
    fn from(job: Job) -> Self {
        Self {
            actions: job.actions(),
            error_summary: job.error_summary(),
            job,
        }
    }
}

/// Read-only snapshot handed to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub rows: Vec<JobRow>,
    pub page: u32,
    pub page_size: PageSize,
    pub total_pages: u32,
    pub page_buttons: Vec<u32>,
    pub range: Option<PageRange>,
    pub has_previous: bool,
    pub has_next: bool,
    pub filtered_count: usize,
    pub total_count: usize,
    pub filter: JobFilter,
    pub stats: Option<JobStats>,
    pub loading: bool,
    pub selected: Option<Job>,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone)]
pub struct ViewState {
    policy: RefreshPolicy,
    jobs: Vec<Job>,
    filter: JobFilter,
    filtered: Vec<Job>,
    page: u32,
    page_size: PageSize,
    stats: Option<JobStats>,
    in_flight: BTreeSet<RefreshSeq>,
    newest_applied: Option<RefreshSeq>,
    loaded: bool,
    selected: Option<JobId>,
    notifications: VecDeque<Notification>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(RefreshPolicy::default(), PageSize::default())
    }
}

impl ViewState {
    pub fn new(policy: RefreshPolicy, page_size: PageSize) -> Self {
        Self {
            policy,
            jobs: Vec::new(),
            filter: JobFilter::default(),
            filtered: Vec::new(),
            page: 1,
            page_size,
            stats: None,
            in_flight: BTreeSet::new(),
            newest_applied: None,
            loaded: false,
            selected: None,
            notifications: VecDeque::new(),
        }
    }

    /// `(state, event) -> state'`
    pub fn reduce(mut self, event: ViewEvent) -> Self {
        self.apply(event);
        self
    }

    /// In-place form of [`ViewState::reduce`].
    pub fn apply(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::RefreshStarted { seq } => {
                self.in_flight.insert(seq);
            }
            ViewEvent::JobsRefreshed { seq, jobs } => {
                self.in_flight.remove(&seq);
                if self.policy == RefreshPolicy::LatestRequest
                    && self.newest_applied.is_some_and(|newest| seq < newest)
                {
                    warn!(
                        "Discarding stale job refresh #{} (newest applied #{})",
                        seq,
                        self.newest_applied.unwrap_or_default()
                    );
                    return;
                }
                debug!("Applying job refresh #{} with {} jobs", seq, jobs.len());
                self.newest_applied = Some(self.newest_applied.map_or(seq, |n| n.max(seq)));
                self.loaded = true;
                self.jobs = jobs;
                let jobs = &self.jobs;
                self.selected = self
                    .selected
                    .take()
                    .filter(|id| jobs.iter().any(|job| &job.id == id));
                self.recompute();
            }
            ViewEvent::RefreshFailed { seq, message } => {
                self.in_flight.remove(&seq);
                if !self.loaded {
                    // nothing good to fall back to on the first load
                    self.loaded = true;
                    self.jobs.clear();
                    self.recompute();
                }
                self.notify(
                    NotificationLevel::Error,
                    format!("Failed to fetch jobs: {}", message),
                );
            }
            ViewEvent::StatsRefreshed(stats) => {
                self.stats = Some(stats);
            }
            ViewEvent::StatsFailed(message) => {
                self.notify(
                    NotificationLevel::Error,
                    format!("Failed to fetch stats: {}", message),
                );
            }
            ViewEvent::FilterChanged(filter) => {
                self.filter = filter;
                self.recompute();
            }
            ViewEvent::PageChanged(page) => {
                self.page = clamp_page(page, self.total_pages());
            }
            ViewEvent::PageSizeChanged(page_size) => {
                self.page_size = page_size;
                self.page = 1;
            }
            ViewEvent::JobSelected(id) => {
                self.selected = id;
            }
            ViewEvent::CommandCompleted {
                command,
                job_id,
                error,
            } => match error {
                Some(error) => self.notify(
                    NotificationLevel::Error,
                    format!("Failed to {} job: {}", command, error),
                ),
                None => {
                    let subject = job_id
                        .map(|id| format!("Job {}", id))
                        .unwrap_or_else(|| "Job".to_string());
                    self.notify(
                        NotificationLevel::Info,
                        format!("{} {}", subject, command.past_tense()),
                    );
                }
            },
            ViewEvent::NotificationDismissed(index) => {
                self.notifications.remove(index);
            }
            ViewEvent::NotificationsCleared => {
                self.notifications.clear();
            }
        }
    }

    fn recompute(&mut self) {
        self.filtered = filter_jobs(&self.jobs, &self.filter);
        self.page = 1;
    }

    fn notify(&mut self, level: NotificationLevel, message: String) {
        if self.notifications.len() == MAX_NOTIFICATIONS {
            self.notifications.pop_front();
        }
        self.notifications.push_back(Notification {
            level,
            message,
            at: Utc::now(),
        });
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    /// The authoritative collection as last refreshed.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn find_job(&self, id: &str) -> Option<&Job> {
        self.jobs.iter().find(|job| job.id == id)
    }

    pub fn filtered(&self) -> &[Job] {
        &self.filtered
    }

    pub fn filter(&self) -> &JobFilter {
        &self.filter
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn total_pages(&self) -> u32 {
        total_pages(self.filtered.len(), self.page_size)
    }

    pub fn stats(&self) -> Option<&JobStats> {
        self.stats.as_ref()
    }

    /// True until the first load settles and while any refresh is in flight.
    pub fn is_loading(&self) -> bool {
        !self.loaded || !self.in_flight.is_empty()
    }

    /// The selected job, resolved against the current collection.
    pub fn selected_job(&self) -> Option<&Job> {
        self.selected.as_deref().and_then(|id| self.find_job(id))
    }

    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter()
    }

    pub fn view(&self) -> DashboardView {
        let page = paginate(&self.filtered, self.page, self.page_size);
        DashboardView {
            rows: page.window.into_iter().map(JobRow::from).collect(),
            page: self.page,
            page_size: self.page_size,
            total_pages: page.total_pages,
            page_buttons: page_buttons(self.page, page.total_pages),
            range: PageRange::new(self.page, self.page_size, self.filtered.len()),
            has_previous: self.page > 1,
            has_next: self.page < page.total_pages,
            filtered_count: self.filtered.len(),
            total_count: self.jobs.len(),
            filter: self.filter.clone(),
            stats: self.stats,
            loading: self.is_loading(),
            selected: self.selected_job().cloned(),
            notifications: self.notifications.iter().cloned().collect(),
        }
    }
}
