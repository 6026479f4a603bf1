//! dbsession - scoped connection and transaction sessions
//!
//! A session wraps one database resource for the length of a scope. A
//! connection-open session opens the connection and closes it exactly
//! once. A transaction session begins a transaction and, unless it was
//! committed, rolls it back exactly once. Ending happens on every exit
//! path: explicit `end_session`, `dispose`, early return, `?`, or panic.
//!
//! # Example
//!
//! ```
//! use dbsession::db::{DbCommand, DbConnection, SessionExt};
//! use dbsession::memory::MemoryConnection;
//!
//! let conn = MemoryConnection::new();
//! {
//!     let _open = conn.open_session().unwrap();
//!     let mut tx = conn.begin_transaction_session().unwrap();
//!
//!     let mut cmd = conn.create_command();
//!     cmd.set_command_text("UPDATE persons SET name = 'Foo' WHERE id = 1");
//!     cmd.execute_non_query().unwrap();
//!
//!     tx.commit().unwrap();
//! }
//! assert_eq!(conn.applied().len(), 1);
//! ```

pub mod db;
pub mod memory;
pub mod session;
pub mod transaction;
