//! Transaction session: begin on start, roll back on end unless committed.
//!
//! ```text
//!  Active(committed=false) ──commit()──▶ Active(committed=true)
//!          │                                     │
//!     end_session()                         end_session()
//!          ▼                                     ▼
//!  Ended(rollback attempted)             Ended(no-op)
//! ```

use chrono::{DateTime, Utc};
use tracing::debug;
use ulid::Ulid;

use super::isolation::IsolationLevel;
use crate::db::{DbConnection, DbTransaction};
use crate::session::{Cleanup, EndSession, Session, SessionError, SessionResult, UsingSession};

/// End-of-session hook that rolls back an uncommitted transaction.
#[derive(Debug)]
pub struct TransactionScope<T> {
    id: String,
    transaction: T,
    committed: bool,
    started_at: DateTime<Utc>,
}

impl<T: DbTransaction> EndSession for TransactionScope<T> {
    const KIND: &'static str = "transaction";

    fn do_end_session(&mut self, cleanup: Cleanup) -> SessionResult<()> {
        if self.committed {
            return Ok(());
        }
        debug!(session = %self.id, %cleanup, "rolling back uncommitted transaction");
        self.transaction.rollback().map_err(SessionError::Rollback)
    }
}

/// A session around one transaction.
///
/// Commit through `commit()` on the session; anything else rolls
/// back when the session ends.
pub type TransactionSession<T> = UsingSession<TransactionScope<T>>;

impl<T: DbTransaction> UsingSession<TransactionScope<T>> {
    /// Begin a transaction on an already open connection.
    ///
    /// `isolation` is passed to the backend as is; `None` uses the backend
    /// default. If beginning fails no session is returned.
    pub fn begin<C>(connection: &C, isolation: Option<IsolationLevel>) -> SessionResult<Self>
    where
        C: DbConnection<Transaction = T> + ?Sized,
    {
        let transaction = match isolation {
            Some(level) => connection.begin_transaction_with(level),
            None => connection.begin_transaction(),
        }
        .map_err(SessionError::Begin)?;

        let id = Ulid::new().to_string().to_lowercase();
        debug!(
            session = %id,
            isolation = %transaction.isolation_level(),
            "transaction started"
        );

        Ok(UsingSession::start(TransactionScope {
            id,
            transaction,
            committed: false,
            started_at: Utc::now(),
        }))
    }

    /// The transaction managed by this session.
    pub fn transaction(&self) -> &T {
        &self.hook().transaction
    }

    /// Check if `commit()` has succeeded.
    pub fn is_committed(&self) -> bool {
        self.hook().committed
    }

    /// Session ID, used to correlate log lines.
    pub fn id(&self) -> &str {
        &self.hook().id
    }

    /// When the transaction began.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.hook().started_at
    }

    /// Commit the transaction.
    ///
    /// The committed flag is set only after the backend commit succeeds, so a
    /// failed commit still rolls back on end. Once the session has ended this
    /// returns [`SessionError::Ended`] without touching the transaction.
    pub fn commit(&mut self) -> SessionResult<()> {
        if self.is_session_ended() {
            return Err(SessionError::Ended {
                kind: <TransactionScope<T> as EndSession>::KIND,
            });
        }

        let scope = self.hook_mut();
        scope.transaction.commit().map_err(SessionError::Commit)?;
        scope.committed = true;
        debug!(session = %scope.id, "transaction committed");
        Ok(())
    }
}
