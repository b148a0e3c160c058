//! Publish-state derivation
//!
//! The editor never asks for a status directly. It is derived from the
//! "publish immediately" switch and the optional schedule timestamp:
//!
//! | publish immediately | schedule         | status    |
//! |---------------------|------------------|-----------|
//! | yes                 | any              | PUBLISHED |
//! | no                  | in the future    | SCHEDULED |
//! | no                  | now or earlier   | PUBLISHED |
//! | no                  | none             | DRAFT     |
//!
//! Schedule values use the `YYYY-MM-DDTHH:MM` form of a datetime-local
//! input and are read as UTC.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use thiserror::Error;

use crate::models::BlogStatus;

const SCHEDULE_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Clone, Error, PartialEq)]
#[error("Invalid publish date: {0}")]
pub struct ScheduleError(pub String);

impl BlogStatus {
    /// Status a submission should carry
    pub fn derive(publish_immediately: bool, scheduled_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        if publish_immediately {
            return BlogStatus::Published;
        }
        match scheduled_at {
            Some(at) if at > now => BlogStatus::Scheduled,
            Some(_) => BlogStatus::Published,
            None => BlogStatus::Draft,
        }
    }
}

/// Whether the editor shows the schedule field
pub fn schedule_field_visible(publish_immediately: bool) -> bool {
    !publish_immediately
}

/// Parse a schedule value; blank means "no schedule".
///
/// Accepts the datetime-local form (with or without seconds) and RFC 3339.
pub fn parse_schedule(value: &str) -> Result<Option<DateTime<Utc>>, ScheduleError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }

    NaiveDateTime::parse_from_str(value, SCHEDULE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map(|naive| Some(naive.and_utc()))
        .map_err(|_| ScheduleError(value.to_string()))
}

/// Format a timestamp for the schedule field
pub fn format_schedule(at: DateTime<Utc>) -> String {
    at.format(SCHEDULE_FORMAT).to_string()
}

/// Timestamp as sent to the content API
pub fn to_wire(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
