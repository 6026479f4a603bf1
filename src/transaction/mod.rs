//! Transaction sessions.
//!
//! A [`TransactionSession`] begins a transaction when created and rolls it
//! back when it ends, unless its `commit()` succeeded first.
//!
//! # Usage
//!
//! ```ignore
//! use dbsession::db::SessionExt;
//!
//! let _open = conn.open_session()?;
//! let mut tx = conn.begin_transaction_session()?;
//! // execute statements
//! tx.commit()?;
//! // leaving scope: no rollback (committed), then close
//! ```

mod isolation;
mod session;

pub use isolation::IsolationLevel;
pub use session::{TransactionScope, TransactionSession};
