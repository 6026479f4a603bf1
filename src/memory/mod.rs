//! In-memory backend.
//!
//! [`MemoryConnection`] implements the data-access traits without a real
//! database. It journals every call (including failed ones) and can be told
//! to fail the next call of a given kind, which makes session behavior on
//! error paths observable.

mod connection;
mod journal;

pub use connection::{MemoryCommand, MemoryConnection, MemoryTransaction};
pub use journal::{Call, Journal, JournalEntry, Operation};
