//! Acting party of a lifecycle transition.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the counselling relationship initiated an operation.
///
/// Reschedule and cancel remarks are tagged with the actor so the two
/// sides' remarks never mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    Student,
    Counsellor,
}

impl Actor {
    /// Returns the wire representation of the actor.
    pub fn as_str(&self) -> &'static str {
        match self {
            Actor::Student => "student",
            Actor::Counsellor => "counsellor",
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_snake_case() {
        assert_eq!(serde_json::to_string(&Actor::Student).unwrap(), "\"student\"");
        assert_eq!(
            serde_json::to_string(&Actor::Counsellor).unwrap(),
            "\"counsellor\""
        );
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(Actor::Student.to_string(), "student");
        assert_eq!(Actor::Counsellor.to_string(), "counsellor");
    }
}
