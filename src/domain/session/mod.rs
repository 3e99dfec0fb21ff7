//! Session module - one requested or scheduled counselling meeting.

mod aggregate;

pub use aggregate::{Remark, Session};
