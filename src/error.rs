use crate::job::{JobAction, JobStatus};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Cannot {action} a job with status {status}")]
    ActionUnavailable { action: JobAction, status: JobStatus },

    #[error("Job repository unavailable: {message}")]
    RepositoryUnavailable { message: String },

    #[error("Job not found: {id}")]
    JobNotFound { id: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DashboardError {
    pub fn validation(message: impl Into<String>) -> Self {
        DashboardError::Validation {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        DashboardError::RepositoryUnavailable {
            message: message.into(),
        }
    }

    /// Local input problems that block a command before anything is sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DashboardError::Validation { .. } | DashboardError::ActionUnavailable { .. }
        )
    }

    /// Failures reported by (or on the way to) the remote scheduler.
    pub fn is_repository_error(&self) -> bool {
        matches!(
            self,
            DashboardError::RepositoryUnavailable { .. } | DashboardError::JobNotFound { .. }
        )
    }
}

// Transport, status and decode failures all surface as an unavailable repository
impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        DashboardError::RepositoryUnavailable {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for DashboardError {
    fn from(err: toml::de::Error) -> Self {
        DashboardError::Config(format!("TOML deserialization error: {}", err))
    }
}

impl From<toml::ser::Error> for DashboardError {
    fn from(err: toml::ser::Error) -> Self {
        DashboardError::Config(format!("TOML serialization error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let validation = DashboardError::validation("Invalid JSON in Data field");
        assert_eq!(
            validation.to_string(),
            "Validation error: Invalid JSON in Data field"
        );

        let unavailable = DashboardError::ActionUnavailable {
            action: JobAction::Retry,
            status: JobStatus::Completed,
        };
        assert_eq!(
            unavailable.to_string(),
            "Cannot retry a job with status completed"
        );

        let not_found = DashboardError::JobNotFound {
            id: "65a1f0c2".to_string(),
        };
        assert_eq!(not_found.to_string(), "Job not found: 65a1f0c2");
    }

    #[test]
    fn test_error_classification() {
        assert!(DashboardError::validation("bad").is_validation());
        assert!(!DashboardError::validation("bad").is_repository_error());

        let repo = DashboardError::unavailable("connection refused");
        assert!(repo.is_repository_error());
        assert!(!repo.is_validation());

        let config = DashboardError::Config("missing".to_string());
        assert!(!config.is_validation());
        assert!(!config.is_repository_error());
    }

    #[test]
    fn test_error_from_toml() {
        let parse = toml::from_str::<toml::Value>("= broken");
        assert!(parse.is_err());

        let error: DashboardError = parse.unwrap_err().into();
        assert!(matches!(error, DashboardError::Config(_)));
    }
}
