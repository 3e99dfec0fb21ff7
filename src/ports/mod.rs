//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `SessionRepository` / `CaseRepository` - aggregate persistence,
//!   including the conditional updates that serve as the sole
//!   concurrency control for racing transitions
//! - `NotificationRepository` - notification rows
//! - `AvailabilityRepository` - per-weekday availability entries
//!
//! ## Outbound Ports
//!
//! - `MailSender` - asynchronous email dispatch
//! - `UserDirectory` - profile lookup against the identity collaborator

mod availability_repository;
mod case_repository;
mod mail_sender;
mod notification_repository;
mod session_repository;
mod user_directory;

pub use availability_repository::AvailabilityRepository;
pub use case_repository::CaseRepository;
pub use mail_sender::{EmailMessage, MailSender};
pub use notification_repository::NotificationRepository;
pub use session_repository::SessionRepository;
pub use user_directory::{UserDirectory, UserProfile};
