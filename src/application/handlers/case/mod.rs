//! Case workflow handlers.

mod add_entry;

pub use add_entry::{AddEntryCommand, AddEntryHandler, AddEntryOutcome, EntryPayload};
