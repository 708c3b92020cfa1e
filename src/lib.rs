//! # jobdeck
//!
//! Client-side state and view derivation for a remote job scheduler dashboard.
//!
//! The scheduler owns the jobs; jobdeck mirrors them, derives what a dashboard
//! shows (filtered rows, pages, enabled actions, notifications) and dispatches
//! lifecycle commands back to the scheduler's HTTP API.
//!
//! ## Features
//!
//! - **Typed job model**: lifecycle states, tagged retry delays and repeat schedules
//! - **Pure view reducer**: every change is a [`ViewEvent`] applied by [`ViewState::reduce`]
//! - **Filtering and pagination**: status and name filters, fixed page sizes, page windows
//! - **Guarded commands**: availability checks, confirmation of destructive actions,
//!   validated create/edit forms
//! - **Background refresh**: a periodic, non-coalescing [`RefreshScheduler`]
//! - **Pluggable repository**: HTTP client plus an in-memory implementation for
//!   offline use and tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jobdeck::{Dashboard, DashboardConfig, RefreshScheduler, repository::HttpJobRepository};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> jobdeck::Result<()> {
//!     let config = DashboardConfig::load()?;
//!     let repository = Arc::new(HttpJobRepository::new(&config)?);
//!
//!     // cancel and delete ask before anything is sent
//!     let dashboard = Dashboard::new(repository, Arc::new(|_: &str| false), &config);
//!
//!     let scheduler = RefreshScheduler::from_config(dashboard.clone(), &config)?.spawn();
//!
//!     let mut revisions = dashboard.subscribe();
//!     while revisions.changed().await.is_ok() {
//!         let view = dashboard.view().await;
//!         for row in &view.rows {
//!             println!("{} {} {}", row.job.id, row.job.name, row.job.status);
//!         }
//!         if let Some(range) = &view.range {
//!             println!("{}", range);
//!         }
//!     }
//!
//!     scheduler.shutdown().await
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### View state
//!
//! [`ViewState`] holds the authoritative collection as last refreshed, the
//! filter, the current page and the notifications. Derived values are
//! recomputed inside the reducer, so a [`DashboardView`] is always consistent.
//!
//! ### Refresh ordering
//!
//! Refreshes are numbered when they start. With
//! [`RefreshPolicy::LastCompletion`] every completion is applied, so the one
//! that finishes last wins. [`RefreshPolicy::LatestRequest`] discards a
//! completion older than the newest one already applied.
//!
//! ### Commands
//!
//! [`Dashboard`] exposes `save`, `delete`, `retry` and `cancel`. Each issues at
//! most one repository call and is followed by a full refresh; the view is
//! never mutated optimistically.

pub mod config;
pub mod cron;
pub mod dashboard;
pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod form;
pub mod job;
pub mod pagination;
pub mod refresh;
pub mod repository;
pub mod store;

pub use config::DashboardConfig;
pub use cron::{CronError, CronPreview};
pub use dashboard::Dashboard;
pub use dispatcher::{Command, CommandDispatcher, CommandOutcome, Confirmation};
pub use error::DashboardError;
pub use filter::{JobFilter, filter_jobs};
pub use form::{JobForm, JobPayload, RepeatKind};
pub use job::{
    Job, JobAction, JobActions, JobId, JobQuery, JobStats, JobStatus, RepeatSchedule, RetryDelay,
    RetryPolicy, SortField, SortOrder,
};
pub use pagination::{Page, PageRange, PageSize, paginate};
pub use refresh::{RefreshHandle, RefreshScheduler};
pub use repository::{HttpJobRepository, InMemoryJobRepository, JobRepository};
pub use store::{
    CommandKind, DashboardView, JobRow, Notification, NotificationLevel, RefreshPolicy,
    RefreshSeq, ViewEvent, ViewState,
};

pub type Result<T> = std::result::Result<T, DashboardError>;
