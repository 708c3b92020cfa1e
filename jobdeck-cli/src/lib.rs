//! # jobdeck CLI
//!
//! Terminal front end for [`jobdeck`]: list, inspect, create, edit and manage
//! jobs held by a remote scheduler, or keep a live view open with `watch`.
//!
//! ## Basic Usage
//!
//! ```bash
//! # List failed jobs, second page of 20
//! jobdeck list --status failed --page 2 --page-size 20
//!
//! # Show one job, including upcoming cron runs
//! jobdeck show 65a1f0c2
//!
//! # Create a recurring job
//! jobdeck create --name nightly-report \
//!   --data '{"format": "pdf"}' \
//!   --cron "0 2 * * *" --timezone "Europe/Berlin"
//!
//! # Destructive commands need an explicit confirmation
//! jobdeck cancel 65a1f0c2 --confirm
//! jobdeck delete 65a1f0c2 --confirm
//!
//! # Live view, refreshed every 10 seconds
//! jobdeck watch --interval 10
//! ```
//!
//! ## Configuration
//!
//! Settings are read from `<config dir>/jobdeck/config.toml` and can be
//! overridden with `JOBDECK_API_URL`, `JOBDECK_REFRESH_SECS` and
//! `JOBDECK_PAGE_SIZE`, then with `--api-url`.
//!
//! ```bash
//! jobdeck config init
//! jobdeck config show
//! ```
//!
//! ## Verbose and Quiet Modes
//!
//! ```bash
//! jobdeck -v list
//! jobdeck -q retry 65a1f0c2
//! ```

pub mod commands;
pub mod utils;

pub use commands::*;
pub use utils::*;
