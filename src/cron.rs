//! Upcoming-run previews for repeat schedules.
//!
//! Schedulers commonly take classic five-field cron expressions, while the
//! `cron` crate expects a leading seconds field. Five-field expressions are
//! widened with a `0` seconds field before parsing. A preview is informational
//! only: an expression this module cannot parse simply has no preview.

use crate::job::RepeatSchedule;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CronError {
    #[error("Invalid cron expression: {0}")]
    InvalidExpression(String),
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

/// Parse an IANA timezone name such as `Europe/London`.
pub fn parse_timezone(timezone: &str) -> Result<Tz, CronError> {
    timezone
        .trim()
        .parse::<Tz>()
        .map_err(|_| CronError::InvalidTimezone(timezone.to_string()))
}

fn normalize_expression(expression: &str) -> String {
    let expression = expression.trim();
    if expression.split_whitespace().count() == 5 {
        format!("0 {}", expression)
    } else {
        expression.to_string()
    }
}

/// A parsed cron expression bound to a timezone.
#[derive(Debug, Clone)]
pub struct CronPreview {
    pub expression: String,
    pub timezone: Tz,
    schedule: Schedule,
}

impl CronPreview {
    pub fn new(expression: &str, timezone: Option<&str>) -> Result<Self, CronError> {
        let schedule = Schedule::from_str(&normalize_expression(expression))
            .map_err(|e| CronError::InvalidExpression(format!("{}: {}", expression, e)))?;

        let timezone = match timezone {
            Some(tz) if !tz.trim().is_empty() => parse_timezone(tz)?,
            _ => Tz::UTC,
        };

        Ok(Self {
            expression: expression.to_string(),
            timezone,
            schedule,
        })
    }

    /// Get the next execution time after the given datetime
    pub fn next_execution(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.upcoming(after, 1).into_iter().next()
    }

    pub fn upcoming(&self, after: DateTime<Utc>, count: usize) -> Vec<DateTime<Utc>> {
        let after_tz = after.with_timezone(&self.timezone);
        self.schedule
            .after(&after_tz)
            .take(count)
            .map(|next| next.with_timezone(&Utc))
            .collect()
    }
}

impl RepeatSchedule {
    /// The next `count` runs after `after`; empty when the schedule cannot be previewed.
    pub fn upcoming(&self, after: DateTime<Utc>, count: usize) -> Vec<DateTime<Utc>> {
        match self {
            RepeatSchedule::Cron {
                expression,
                timezone,
            } => CronPreview::new(expression, timezone.as_deref())
                .map(|preview| preview.upcoming(after, count))
                .unwrap_or_default(),
            RepeatSchedule::Every { interval_ms } => {
                let Ok(step) = i64::try_from(*interval_ms).map(Duration::milliseconds) else {
                    return Vec::new();
                };
                (1..=count as i32)
                    .map_while(|k| step.checked_mul(k).and_then(|d| after.checked_add_signed(d)))
                    .collect()
            }
        }
    }
}
