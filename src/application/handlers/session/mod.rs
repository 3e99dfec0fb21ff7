//! Session workflow handlers.

mod accept_session;
mod cancel_session;
mod request_session;
mod reschedule_session;

pub use accept_session::{AcceptSessionCommand, AcceptSessionHandler, AcceptSessionResult};
pub use cancel_session::{CancelSessionCommand, CancelSessionHandler, CancelSessionResult};
pub use request_session::{RequestSessionCommand, RequestSessionHandler, RequestSessionResult};
pub use reschedule_session::{
    RescheduleSessionCommand, RescheduleSessionHandler, RescheduleSessionResult,
};
