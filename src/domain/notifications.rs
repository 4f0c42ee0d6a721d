//! Notification domain types
//!
//! The core decides when to notify, whom, and with which template; delivery
//! belongs to the dispatcher collaborator.

use serde::{Deserialize, Serialize};

/// Notification template
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTemplate {
    /// A case crossed the escalation threshold; sent to the review board.
    Escalation,
    /// A new case entered intake.
    CaseOpened,
    /// A case reached resolution.
    Resolution,
}

impl std::fmt::Display for NotificationTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationTemplate::Escalation => write!(f, "escalation"),
            NotificationTemplate::CaseOpened => write!(f, "case_opened"),
            NotificationTemplate::Resolution => write!(f, "resolution"),
        }
    }
}
