//! In-memory connection that records every call it receives.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;
use ulid::Ulid;

use super::journal::{Call, Journal, Operation};
use crate::db::{ConnectionState, DbCommand, DbConnection, DbError, DbResult, DbTransaction};
use crate::transaction::IsolationLevel;

#[derive(Debug, Default)]
struct Inner {
    state: ConnectionState,
    /// ID of the transaction in progress, if any.
    active: Option<String>,
    /// Statements executed inside the active transaction.
    pending: Vec<String>,
    /// Statements that are committed or ran outside a transaction.
    applied: Vec<String>,
    default_isolation: IsolationLevel,
    faults: HashSet<Operation>,
    journal: Journal,
}

impl Inner {
    /// Run `f` as `call`, unless a fault is armed for it, and journal the attempt.
    fn run<R>(&mut self, call: Call, f: impl FnOnce(&mut Inner) -> DbResult<R>) -> DbResult<R> {
        let operation = call.operation();
        let result = if self.faults.remove(&operation) {
            Err(DbError::Backend(format!("injected {} failure", operation)))
        } else {
            f(self)
        };
        trace!(%call, ok = result.is_ok(), "memory backend call");
        self.journal.push(call, result.is_ok());
        result
    }

    fn ensure_open(&self) -> DbResult<()> {
        match self.state {
            ConnectionState::Open => Ok(()),
            ConnectionState::Closed => Err(DbError::NotOpen),
        }
    }

    fn ensure_active(&self, tx_id: &str) -> DbResult<()> {
        self.ensure_open()?;
        match self.active.as_deref() {
            Some(active) if active == tx_id => Ok(()),
            _ => Err(DbError::TransactionCompleted),
        }
    }
}

/// A connection backed by process memory.
///
/// Clones share state, so a test can keep a clone to inspect the journal
/// while sessions borrow the original.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnection {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryConnection {
    /// Create a closed connection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the isolation level used by `begin_transaction`.
    pub fn with_default_isolation(self, level: IsolationLevel) -> Self {
        self.inner.lock().default_isolation = level;
        self
    }

    /// Make the next call of `operation` fail with [`DbError::Backend`].
    ///
    /// The failed call is still journaled.
    pub fn fail_on(&self, operation: Operation) {
        self.inner.lock().faults.insert(operation);
    }

    /// Snapshot of the call journal.
    pub fn journal(&self) -> Journal {
        self.inner.lock().journal.clone()
    }

    /// Statements that took effect.
    pub fn applied(&self) -> Vec<String> {
        self.inner.lock().applied.clone()
    }

    /// Statements waiting for the active transaction to commit.
    pub fn pending(&self) -> Vec<String> {
        self.inner.lock().pending.clone()
    }

    /// Check if a transaction is in progress.
    pub fn in_transaction(&self) -> bool {
        self.inner.lock().active.is_some()
    }

    fn begin(&self, requested: Option<IsolationLevel>) -> DbResult<MemoryTransaction> {
        let mut inner = self.inner.lock();
        let id = inner.run(Call::BeginTransaction(requested), |inner| {
            inner.ensure_open()?;
            if inner.active.is_some() {
                return Err(DbError::TransactionInProgress);
            }
            let id = Ulid::new().to_string().to_lowercase();
            inner.active = Some(id.clone());
            Ok(id)
        })?;

        Ok(MemoryTransaction {
            id,
            isolation: requested.unwrap_or(inner.default_isolation),
            completed: false,
            inner: self.inner.clone(),
        })
    }
}

impl DbConnection for MemoryConnection {
    type Transaction = MemoryTransaction;
    type Command = MemoryCommand;

    fn open(&self) -> DbResult<()> {
        self.inner.lock().run(Call::Open, |inner| {
            if inner.state == ConnectionState::Open {
                return Err(DbError::AlreadyOpen);
            }
            inner.state = ConnectionState::Open;
            Ok(())
        })
    }

    fn close(&self) -> DbResult<()> {
        self.inner.lock().run(Call::Close, |inner| {
            // Closing discards whatever the active transaction did.
            if inner.active.take().is_some() {
                inner.pending.clear();
            }
            inner.state = ConnectionState::Closed;
            Ok(())
        })
    }

    fn state(&self) -> ConnectionState {
        self.inner.lock().state
    }

    fn create_command(&self) -> MemoryCommand {
        MemoryCommand {
            text: String::new(),
            inner: self.inner.clone(),
        }
    }

    fn begin_transaction(&self) -> DbResult<MemoryTransaction> {
        self.begin(None)
    }

    fn begin_transaction_with(&self, isolation: IsolationLevel) -> DbResult<MemoryTransaction> {
        self.begin(Some(isolation))
    }
}

/// Transaction on a [`MemoryConnection`].
#[derive(Debug)]
pub struct MemoryTransaction {
    id: String,
    isolation: IsolationLevel,
    completed: bool,
    inner: Arc<Mutex<Inner>>,
}

impl MemoryTransaction {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Check if the transaction was committed or rolled back.
    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

impl DbTransaction for MemoryTransaction {
    fn commit(&mut self) -> DbResult<()> {
        let completed = self.completed;
        let id = self.id.as_str();
        self.inner.lock().run(Call::Commit, |inner| {
            if completed {
                return Err(DbError::TransactionCompleted);
            }
            inner.ensure_active(id)?;
            let pending = std::mem::take(&mut inner.pending);
            inner.applied.extend(pending);
            inner.active = None;
            Ok(())
        })?;
        self.completed = true;
        Ok(())
    }

    fn rollback(&mut self) -> DbResult<()> {
        let completed = self.completed;
        let id = self.id.as_str();
        self.inner.lock().run(Call::Rollback, |inner| {
            if completed {
                return Err(DbError::TransactionCompleted);
            }
            inner.ensure_active(id)?;
            inner.pending.clear();
            inner.active = None;
            Ok(())
        })?;
        self.completed = true;
        Ok(())
    }

    fn isolation_level(&self) -> IsolationLevel {
        self.isolation
    }
}

/// Command on a [`MemoryConnection`].
///
/// Inside a transaction the statement is held back until commit;
/// otherwise it takes effect immediately.
#[derive(Debug)]
pub struct MemoryCommand {
    text: String,
    inner: Arc<Mutex<Inner>>,
}

impl DbCommand for MemoryCommand {
    fn set_command_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    fn command_text(&self) -> &str {
        &self.text
    }

    fn execute_non_query(&mut self) -> DbResult<u64> {
        let text = self.text.clone();
        self.inner.lock().run(Call::Execute(text.clone()), |inner| {
            if text.trim().is_empty() {
                return Err(DbError::EmptyCommand);
            }
            inner.ensure_open()?;
            if inner.active.is_some() {
                inner.pending.push(text);
            } else {
                inner.applied.push(text);
            }
            Ok(1)
        })
    }
}
