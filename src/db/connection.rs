//! Data-access capabilities consumed by sessions.
//!
//! Sessions drive a backend only through these traits. Connection methods
//! take `&self` because a connection is a shared handle: an open session
//! and a transaction session borrow the same one at the same time.
//!
//! [`DbTransaction::commit`] and [`DbTransaction::rollback`] take
//! `&mut self`. A transaction session only hands out `&T`, so application
//! code cannot commit or roll back behind the session's back.

use thiserror::Error;

use crate::transaction::IsolationLevel;

/// Result type for backend operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors reported by a data-access backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DbError {
    /// The connection is not open.
    #[error("connection is not open")]
    NotOpen,

    /// The connection is already open.
    #[error("connection is already open")]
    AlreadyOpen,

    /// The transaction was already committed or rolled back.
    #[error("transaction has already completed")]
    TransactionCompleted,

    /// The connection does not support parallel transactions.
    #[error("a transaction is already in progress on this connection")]
    TransactionInProgress,

    /// A command was executed without command text.
    #[error("command text is empty")]
    EmptyCommand,

    /// Failure reported by the backend itself.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Whether a connection is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Closed,
    Open,
}

/// A connection to a relational database.
pub trait DbConnection {
    /// Transaction handle returned by `begin_transaction`.
    type Transaction: DbTransaction;
    /// Command handle returned by `create_command`.
    type Command: DbCommand;

    /// Open the connection.
    fn open(&self) -> DbResult<()>;

    /// Close the connection.
    fn close(&self) -> DbResult<()>;

    /// Current connection state.
    fn state(&self) -> ConnectionState;

    /// Create a command bound to this connection.
    fn create_command(&self) -> Self::Command;

    /// Begin a transaction with the backend's default isolation level.
    fn begin_transaction(&self) -> DbResult<Self::Transaction>;

    /// Begin a transaction with the given isolation level.
    fn begin_transaction_with(&self, isolation: IsolationLevel) -> DbResult<Self::Transaction>;
}

/// A database transaction.
pub trait DbTransaction {
    /// Commit the transaction.
    fn commit(&mut self) -> DbResult<()>;

    /// Roll the transaction back.
    fn rollback(&mut self) -> DbResult<()>;

    /// Isolation level the transaction runs under.
    fn isolation_level(&self) -> IsolationLevel;
}

/// A statement to run against a connection.
pub trait DbCommand {
    /// Set the statement text.
    fn set_command_text(&mut self, text: &str);

    /// Get the statement text.
    fn command_text(&self) -> &str;

    /// Execute the statement, returning the number of rows affected.
    fn execute_non_query(&mut self) -> DbResult<u64>;
}
