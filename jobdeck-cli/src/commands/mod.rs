pub mod config;
pub mod job;
pub mod watch;

pub use config::ConfigCommand;
pub use job::{JobCommand, JobFields};
pub use watch::WatchArgs;
