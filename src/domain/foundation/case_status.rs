//! CaseStatus enum for tracking the lifecycle of counselling cases.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{StateMachine, ValidationError};

/// Lifecycle status of a case.
///
/// Mirrors the outcome of the case's governing session. `Referred`
/// marks a case handed over to another counsellor in its entirety; like
/// `Completed` and `Cancelled` it is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    #[default]
    Pending,
    Progress,
    Cancelled,
    Completed,
    Referred,
}

impl CaseStatus {
    /// Returns the wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Pending => "pending",
            CaseStatus::Progress => "progress",
            CaseStatus::Cancelled => "cancelled",
            CaseStatus::Completed => "completed",
            CaseStatus::Referred => "referred",
        }
    }
}

impl StateMachine for CaseStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use CaseStatus::*;
        // A case may close straight out of Pending: a counsellor
        // reschedule self-approves the session without an accept call.
        matches!(
            (self, target),
            (Pending, Progress)
                | (Pending, Completed)
                | (Pending, Cancelled)
                | (Pending, Referred)
                | (Progress, Completed)
                | (Progress, Cancelled)
                | (Progress, Referred)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use CaseStatus::*;
        match self {
            Pending => vec![Progress, Completed, Cancelled, Referred],
            Progress => vec![Completed, Cancelled, Referred],
            Cancelled => vec![],
            Completed => vec![],
            Referred => vec![],
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CaseStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CaseStatus::Pending),
            "progress" => Ok(CaseStatus::Progress),
            "cancelled" => Ok(CaseStatus::Cancelled),
            "completed" => Ok(CaseStatus::Completed),
            "referred" => Ok(CaseStatus::Referred),
            other => Err(ValidationError::invalid_format(
                "case_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}
