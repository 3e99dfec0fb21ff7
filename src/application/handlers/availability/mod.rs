//! Availability workflow handlers.

mod get_available_intervals;
mod remove_interval;
mod set_day_availability;

pub use get_available_intervals::{GetAvailableIntervalsHandler, GetAvailableIntervalsQuery};
pub use remove_interval::{RemoveIntervalCommand, RemoveIntervalHandler};
pub use set_day_availability::{SetDayAvailabilityCommand, SetDayAvailabilityHandler};
