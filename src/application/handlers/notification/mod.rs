//! Notification workflow handlers.

mod mark_as_read;

pub use mark_as_read::{MarkNotificationReadCommand, MarkNotificationReadHandler};
