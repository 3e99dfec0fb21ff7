//! In-memory adapters for testing and embedding.
//!
//! All repositories share one [`MemoryStore`], the analogue of the
//! single relational store the PostgreSQL adapters talk to. Delivery is
//! synchronous and deterministic, which is what the test suites rely
//! on.
//!
//! # Security Note
//!
//! These adapters are for **testing only** and should not be used in
//! production. They use `.expect()` on lock operations which will panic
//! if locks are poisoned. Production code should use the PostgreSQL and
//! Resend adapters.

mod directory;
mod mail;
mod store;

pub use directory::InMemoryUserDirectory;
pub use mail::RecordingMailSender;
pub use store::{
    InMemoryAvailabilityRepository, InMemoryCaseRepository, InMemoryNotificationRepository,
    InMemorySessionRepository, MemoryStore,
};
