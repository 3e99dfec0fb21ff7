//! Human-readable sequence codes for cases and sessions.
//!
//! Cases carry `CS_{n:03}` codes allocated from a persistence-owned
//! sequence; sessions derive their code from the owning case and their
//! ordinal position (`CS_001/SC_02`). Both are assigned once.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequence code of a case (`CS_001`, `CS_002`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseCode(String);

impl CaseCode {
    /// Creates a case code from an allocated sequence number.
    pub fn new(number: u32) -> Self {
        Self(format!("CS_{:03}", number))
    }

    /// Reconstructs a case code from its stored representation.
    pub fn from_raw(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Derives the session code for the session at `ordinal` (1-based)
    /// within this case.
    pub fn session_code(&self, ordinal: usize) -> SessionCode {
        SessionCode(format!("{}/SC_{:02}", self.0, ordinal))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sequence code of a session within a case (`CS_001/SC_01`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionCode(String);

impl SessionCode {
    /// Reconstructs a session code from its stored representation.
    pub fn from_raw(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
