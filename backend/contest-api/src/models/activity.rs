use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::bson_datetime_as_chrono_option;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NotStarted,
    Started,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::NotStarted => "not_started",
            SessionStatus::Started => "started",
            SessionStatus::Completed => "completed",
        }
    }
}

/// One student's attempt at one contest ("contest_activity" collection).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    pub contest_id: String,
    pub student_id: String,
    pub status: SessionStatus,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "bson_datetime_as_chrono_option"
    )]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "bson_datetime_as_chrono_option"
    )]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StartSessionRequest {
    #[validate(length(min = 1, message = "contest_id is required"))]
    #[serde(default)]
    pub contest_id: String,
    #[validate(length(min = 1, message = "student_id is required"))]
    #[serde(default)]
    pub student_id: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FinishSessionRequest {
    #[validate(length(min = 1, message = "contest_id is required"))]
    #[serde(default)]
    pub contest_id: String,
    #[validate(length(min = 1, message = "student_id is required"))]
    #[serde(default)]
    pub student_id: String,
    /// Opaque result payload submitted by the client.
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionStatusResponse {
    pub contest_id: String,
    pub student_id: String,
    pub status: SessionStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Snapshot counts for one contest. `started` and `completed` are mutually
/// exclusive: each record counts under its current status only.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContestStats {
    pub registered: u64,
    pub started: u64,
    pub completed: u64,
}
