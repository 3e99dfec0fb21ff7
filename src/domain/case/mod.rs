//! Case module - the aggregate thread of sessions for one student.

mod aggregate;

pub use aggregate::{Case, ReferralEntry, ReferralRemark};
