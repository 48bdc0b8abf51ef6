//! Admin-facing notifications.

use serde::{Deserialize, Serialize};

use super::StudentRecord;

/// Kind of pending admin action. Only signup requests exist today.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    SignupRequest,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::SignupRequest => "signup_request",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "signup_request" => Some(NotificationKind::SignupRequest),
            _ => None,
        }
    }
}

/// A pending admin action with a snapshot of the student at signup time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub user: StudentRecord,
    pub timestamp: String,
}

/// Admin dashboard summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub notifications: Vec<Notification>,
    pub total_students: i64,
}

/// Students grouped by approval state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDirectory {
    pub approved_students: Vec<StudentRecord>,
    pub pending_students: Vec<StudentRecord>,
    pub total_approved: usize,
    pub total_pending: usize,
}

/// Outcome of an admin action that notifies the student by email.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminActionResult {
    pub student: StudentRecord,
    pub email_sent: bool,
}
