//! The create/edit buffer and its validation into a request payload.
//!
//! A form is an owned projection of a job snapshot taken when editing starts.
//! It never aliases the store: later refreshes do not touch it, and its values
//! reach the scheduler only through [`JobForm::validate`] and a save command.

use crate::{
    Result,
    cron::parse_timezone,
    error::DashboardError,
    job::{Job, JobId, RepeatSchedule, RetryDelay, RetryPolicy, repeat_wire},
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

pub const DEFAULT_MAX_RETRIES: &str = "3";
pub const DEFAULT_RETRY_DELAY_MS: &str = "1000";

const RUN_AT_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatKind {
    #[default]
    None,
    Cron,
    Every,
}

/// Body of `POST /jobs` and `PUT /jobs/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    /// Only sent on create; names are immutable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub data: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_at: Option<DateTime<Utc>>,
    pub retry: RetryPolicy,
    #[serde(skip_serializing_if = "Option::is_none", with = "repeat_wire")]
    pub repeat: Option<RepeatSchedule>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobForm {
    editing: Option<JobId>,
    pub name: String,
    pub run_at: String,
    pub data_json: String,
    repeat_kind: RepeatKind,
    pub cron_expression: String,
    pub timezone: String,
    pub every_interval: String,
    pub max_retries: String,
    pub retry_delay: String,
}

impl Default for JobForm {
    fn default() -> Self {
        Self::blank()
    }
}

impl JobForm {
    /// An empty create form.
    pub fn blank() -> Self {
        Self {
            editing: None,
            name: String::new(),
            run_at: String::new(),
            data_json: "{}".to_string(),
            repeat_kind: RepeatKind::None,
            cron_expression: String::new(),
            timezone: String::new(),
            every_interval: String::new(),
            max_retries: DEFAULT_MAX_RETRIES.to_string(),
            retry_delay: DEFAULT_RETRY_DELAY_MS.to_string(),
        }
    }

    /// An edit form seeded from `job`, targeting its id.
    pub fn from_job(job: &Job) -> Self {
        let mut form = Self::blank();
        form.editing = Some(job.id.clone());
        form.name = job.name.clone();
        form.run_at = job
            .next_run_at
            .map(|at| at.format(RUN_AT_INPUT_FORMAT).to_string())
            .unwrap_or_default();
        form.data_json = if job.data.is_null() {
            "{}".to_string()
        } else {
            serde_json::to_string_pretty(&job.data).unwrap_or_else(|_| "{}".to_string())
        };

        match &job.repeat {
            Some(RepeatSchedule::Cron {
                expression,
                timezone,
            }) => {
                form.repeat_kind = RepeatKind::Cron;
                form.cron_expression = expression.clone();
                form.timezone = timezone.clone().unwrap_or_default();
            }
            Some(RepeatSchedule::Every { interval_ms }) => {
                form.repeat_kind = RepeatKind::Every;
                form.every_interval = interval_ms.to_string();
            }
            None => {}
        }

        if let Some(retry) = &job.retry {
            form.max_retries = retry.max_attempts.to_string();
            // a computed delay cannot be edited or sent back; leave the field empty
            form.retry_delay = retry
                .delay
                .as_millis()
                .map(|ms| ms.to_string())
                .unwrap_or_default();
        }

        form
    }

    pub fn editing_target(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn repeat_kind(&self) -> RepeatKind {
        self.repeat_kind
    }

    /// Switch the repeat form. Only the selected kind's value is ever sent.
    pub fn select_repeat(&mut self, kind: RepeatKind) {
        self.repeat_kind = kind;
    }

    pub fn validate(&self) -> Result<JobPayload> {
        let data: serde_json::Value = serde_json::from_str(&self.data_json)
            .map_err(|_| DashboardError::validation("Invalid JSON in Data field"))?;

        let name = if self.is_editing() {
            None
        } else {
            let name = self.name.trim();
            if name.is_empty() {
                return Err(DashboardError::validation("Job name is required"));
            }
            Some(name.to_string())
        };

        let run_at = parse_run_at(&self.run_at)?;

        let max_attempts: u32 = parse_integer(&self.max_retries, "Max retries")?;
        if max_attempts == 0 {
            return Err(DashboardError::validation(
                "Max retries must be a positive integer",
            ));
        }

        let delay = if self.retry_delay.trim().is_empty() {
            RetryDelay::Dynamic
        } else {
            RetryDelay::Fixed(parse_integer(&self.retry_delay, "Retry delay")?)
        };

        Ok(JobPayload {
            name,
            data,
            run_at,
            retry: RetryPolicy {
                max_attempts,
                delay,
            },
            repeat: self.repeat_schedule()?,
        })
    }

    fn repeat_schedule(&self) -> Result<Option<RepeatSchedule>> {
        match self.repeat_kind {
            RepeatKind::Cron if !self.cron_expression.trim().is_empty() => {
                let timezone = self.timezone.trim();
                let timezone = if timezone.is_empty() {
                    None
                } else {
                    parse_timezone(timezone)
                        .map_err(|e| DashboardError::validation(e.to_string()))?;
                    Some(timezone.to_string())
                };
                Ok(Some(RepeatSchedule::Cron {
                    expression: self.cron_expression.trim().to_string(),
                    timezone,
                }))
            }
            RepeatKind::Every if !self.every_interval.trim().is_empty() => {
                let interval_ms: u64 = parse_integer(&self.every_interval, "Repeat interval")?;
                if interval_ms == 0 {
                    return Err(DashboardError::validation(
                        "Repeat interval must be greater than zero",
                    ));
                }
                Ok(Some(RepeatSchedule::Every { interval_ms }))
            }
            _ => Ok(None),
        }
    }
}

fn parse_integer<T: std::str::FromStr>(value: &str, field: &str) -> Result<T> {
    value.trim().parse::<T>().map_err(|_| {
        DashboardError::validation(format!("{} must be a whole number, got '{}'", field, value))
    })
}

/// Accepts RFC 3339 or the `YYYY-MM-DDTHH:MM` datetime-input shape (read as UTC).
fn parse_run_at(value: &str) -> Result<Option<DateTime<Utc>>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(at.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(value, RUN_AT_INPUT_FORMAT)
        .map(|naive| Some(naive.and_utc()))
        .map_err(|_| DashboardError::validation(format!("Invalid run time: '{}'", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobStatus;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_blank_form_defaults() {
        let form = JobForm::blank();
        assert!(!form.is_editing());
        assert_eq!(form.data_json, "{}");
        assert_eq!(form.repeat_kind(), RepeatKind::None);

        let mut form = form;
        form.name = "send-email-campaign".to_string();
        let payload = form.validate().unwrap();
        assert_eq!(payload.name.as_deref(), Some("send-email-campaign"));
        assert_eq!(payload.data, json!({}));
        assert_eq!(payload.retry, RetryPolicy::fixed(3, 1000));
        assert!(payload.repeat.is_none());
        assert!(payload.run_at.is_none());
    }

    #[test]
    fn test_malformed_data_is_a_validation_error() {
        let mut form = JobForm::blank();
        form.name = "broken".to_string();
        form.data_json = "{invalid".to_string();

        let err = form.validate().unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Validation error: Invalid JSON in Data field");
    }

    #[test]
    fn test_create_requires_name() {
        let err = JobForm::blank().validate().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_numeric_fields_must_be_integers() {
        let mut form = JobForm::blank();
        form.name = "n".to_string();
        form.max_retries = "three".to_string();
        assert!(form.validate().unwrap_err().is_validation());

        form.max_retries = "0".to_string();
        assert!(form.validate().unwrap_err().is_validation());

        form.max_retries = "5".to_string();
        form.retry_delay = "1.5".to_string();
        assert!(form.validate().unwrap_err().is_validation());

        form.retry_delay = " 2500 ".to_string();
        assert_eq!(form.validate().unwrap().retry, RetryPolicy::fixed(5, 2500));
    }

    #[test]
    fn test_selecting_repeat_kind_sends_only_that_kind() {
        let mut form = JobForm::blank();
        form.name = "report".to_string();
        form.cron_expression = "0 9 * * *".to_string();
        form.timezone = "Europe/Paris".to_string();
        form.every_interval = "60000".to_string();

        form.select_repeat(RepeatKind::Cron);
        assert_eq!(
            form.validate().unwrap().repeat,
            Some(RepeatSchedule::Cron {
                expression: "0 9 * * *".to_string(),
                timezone: Some("Europe/Paris".to_string()),
            })
        );

        form.select_repeat(RepeatKind::Every);
        let payload = form.validate().unwrap();
        assert_eq!(payload.repeat, Some(RepeatSchedule::every(60_000)));
        let body = serde_json::to_value(&payload).unwrap();
        assert_eq!(body["repeat"], json!({"every": 60000}));

        form.select_repeat(RepeatKind::None);
        let body = serde_json::to_value(form.validate().unwrap()).unwrap();
        assert!(body.get("repeat").is_none());
    }

    #[test]
    fn test_repeat_validation() {
        let mut form = JobForm::blank();
        form.name = "n".to_string();
        form.select_repeat(RepeatKind::Every);
        form.every_interval = "0".to_string();
        assert!(form.validate().unwrap_err().is_validation());

        form.select_repeat(RepeatKind::Cron);
        form.cron_expression = "*/5 * * * *".to_string();
        form.timezone = "Mars/Olympus".to_string();
        assert!(form.validate().unwrap_err().is_validation());

        // an empty selected value means no schedule
        form.cron_expression = "  ".to_string();
        assert!(form.validate().unwrap().repeat.is_none());
    }

    #[test]
    fn test_run_at_formats() {
        let mut form = JobForm::blank();
        form.name = "n".to_string();
        form.run_at = "2025-03-01T08:30".to_string();
        assert_eq!(
            form.validate().unwrap().run_at,
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap())
        );

        form.run_at = "2025-03-01T08:30:00+02:00".to_string();
        assert_eq!(
            form.validate().unwrap().run_at,
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 6, 30, 0).unwrap())
        );

        form.run_at = "tomorrow".to_string();
        assert!(form.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_edit_projection_and_update_payload() {
        let mut job = Job::new("65a1", "nightly-report")
            .with_status(JobStatus::Failed)
            .with_data(json!({"region": "eu"}))
            .with_retry(RetryPolicy::fixed(4, 2000))
            .with_repeat(RepeatSchedule::Cron {
                expression: "0 2 * * *".to_string(),
                timezone: Some("UTC".to_string()),
            });
        job.next_run_at = Some(Utc.with_ymd_and_hms(2025, 1, 12, 2, 0, 0).unwrap());

        let mut form = JobForm::from_job(&job);
        assert_eq!(form.editing_target(), Some("65a1"));
        assert_eq!(form.run_at, "2025-01-12T02:00");
        assert_eq!(form.repeat_kind(), RepeatKind::Cron);
        assert_eq!(form.max_retries, "4");
        assert_eq!(form.retry_delay, "2000");

        // edits stay in the buffer
        form.name = "renamed".to_string();
        form.data_json = r#"{"region": "us"}"#.to_string();
        assert_eq!(job.name, "nightly-report");
        assert_eq!(job.data, json!({"region": "eu"}));

        let payload = form.validate().unwrap();
        let body = serde_json::to_value(&payload).unwrap();
        assert!(body.get("name").is_none());
        assert_eq!(body["data"], json!({"region": "us"}));
        assert_eq!(body["retry"], json!({"maxAttempts": 4, "delay": 2000}));
        assert_eq!(body["repeat"], json!({"cron": "0 2 * * *", "timezone": "UTC"}));
        assert_eq!(body["runAt"], json!("2025-01-12T02:00:00Z"));
    }

    #[test]
    fn test_dynamic_delay_is_not_round_tripped() {
        let job = Job::new("a", "backoff").with_retry(RetryPolicy {
            max_attempts: 6,
            delay: RetryDelay::Dynamic,
        });

        let form = JobForm::from_job(&job);
        assert_eq!(form.retry_delay, "");

        let body = serde_json::to_value(form.validate().unwrap()).unwrap();
        assert_eq!(body["retry"], json!({"maxAttempts": 6}));
    }
}
