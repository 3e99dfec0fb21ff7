//! Command handlers - the workflow orchestration surface.
//!
//! One handler per business operation, composed from the entity
//! aggregates, the repository ports, and the notification coordinator.
//! Each `handle` call is one atomic business use case from the caller's
//! perspective; multi-step persistence failures are annotated with the
//! step reached and logged, never silently absorbed.

pub mod availability;
pub mod case;
pub mod notification;
pub mod session;
