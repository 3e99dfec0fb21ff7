//! SessionStatus enum for tracking the lifecycle of counselling sessions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{StateMachine, ValidationError};

/// Lifecycle status of a counselling session.
///
/// `Pending` is a student request awaiting the counsellor; `Progress` is
/// an approved, upcoming or running session; `Rescheduled` is a
/// student-proposed new slot awaiting counsellor confirmation.
/// `Cancelled` and `Completed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Pending,
    Progress,
    Rescheduled,
    Cancelled,
    Completed,
}

impl SessionStatus {
    /// Returns true if the session claims its calendar slot.
    ///
    /// Only active sessions count for counsellor overlap checks and for
    /// subtracting booked intervals from availability.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Pending | SessionStatus::Progress)
    }

    /// Returns the wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Progress => "progress",
            SessionStatus::Rescheduled => "rescheduled",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Completed => "completed",
        }
    }
}

impl StateMachine for SessionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SessionStatus::*;
        matches!(
            (self, target),
            (Pending, Progress)
                | (Pending, Rescheduled)
                | (Pending, Cancelled)
                | (Rescheduled, Progress)
                | (Rescheduled, Cancelled)
                | (Progress, Completed)
                | (Progress, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SessionStatus::*;
        match self {
            Pending => vec![Progress, Rescheduled, Cancelled],
            Rescheduled => vec![Progress, Cancelled],
            Progress => vec![Completed, Cancelled],
            Cancelled => vec![],
            Completed => vec![],
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SessionStatus::Pending),
            "progress" => Ok(SessionStatus::Progress),
            "rescheduled" => Ok(SessionStatus::Rescheduled),
            "cancelled" => Ok(SessionStatus::Cancelled),
            "completed" => Ok(SessionStatus::Completed),
            other => Err(ValidationError::invalid_format(
                "session_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}
