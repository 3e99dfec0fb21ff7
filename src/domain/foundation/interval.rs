//! Time interval value object.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// Wall-clock time interval within a single day.
///
/// # Invariants
///
/// - `start < end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    start: NaiveTime,
    end: NaiveTime,
}

impl Interval {
    /// Creates a new interval.
    ///
    /// # Errors
    ///
    /// - `InvalidFormat` if `start` is not strictly before `end`
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::invalid_format(
                "interval",
                "start must be before end",
            ));
        }
        Ok(Self { start, end })
    }

    /// Returns the interval start.
    pub fn start(&self) -> NaiveTime {
        self.start
    }

    /// Returns the interval end.
    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Returns true if the two intervals share any instant.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns true if this interval begins at the given time.
    ///
    /// Availability subtraction matches booked slots by start-time
    /// equality, not by overlap.
    pub fn starts_at(&self, time: NaiveTime) -> bool {
        self.start == time
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}
