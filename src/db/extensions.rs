//! Convenience constructors for sessions.

use super::connection::DbConnection;
use super::open::ConnectionOpenSession;
use crate::session::SessionResult;
use crate::transaction::{IsolationLevel, TransactionSession};

/// Open `connection` for the lifetime of the returned session.
pub fn open_session<C: DbConnection + ?Sized>(
    connection: &C,
) -> SessionResult<ConnectionOpenSession<'_, C>> {
    ConnectionOpenSession::open(Some(connection))
}

/// Like [`open_session`], but `None` yields a session that does nothing.
pub fn open_optional_session<C: DbConnection + ?Sized>(
    connection: Option<&C>,
) -> SessionResult<ConnectionOpenSession<'_, C>> {
    ConnectionOpenSession::open(connection)
}

/// Begin a transaction with the backend's default isolation level.
pub fn begin_transaction_session<C: DbConnection + ?Sized>(
    connection: &C,
) -> SessionResult<TransactionSession<C::Transaction>> {
    TransactionSession::begin(connection, None)
}

/// Begin a transaction with the given isolation level.
pub fn begin_transaction_session_with<C: DbConnection + ?Sized>(
    connection: &C,
    isolation: IsolationLevel,
) -> SessionResult<TransactionSession<C::Transaction>> {
    TransactionSession::begin(connection, Some(isolation))
}

/// Session constructors as methods on any connection.
pub trait SessionExt: DbConnection {
    /// See [`open_session`].
    fn open_session(&self) -> SessionResult<ConnectionOpenSession<'_, Self>>;

    /// See [`begin_transaction_session`].
    fn begin_transaction_session(&self) -> SessionResult<TransactionSession<Self::Transaction>>;

    /// See [`begin_transaction_session_with`].
    fn begin_transaction_session_with(
        &self,
        isolation: IsolationLevel,
    ) -> SessionResult<TransactionSession<Self::Transaction>>;
}

impl<C: DbConnection + ?Sized> SessionExt for C {
    fn open_session(&self) -> SessionResult<ConnectionOpenSession<'_, Self>> {
        ConnectionOpenSession::open(Some(self))
    }

    fn begin_transaction_session(&self) -> SessionResult<TransactionSession<Self::Transaction>> {
        TransactionSession::begin(self, None)
    }

    fn begin_transaction_session_with(
        &self,
        isolation: IsolationLevel,
    ) -> SessionResult<TransactionSession<Self::Transaction>> {
        TransactionSession::begin(self, Some(isolation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ConnectionState, DbTransaction};
    use crate::memory::{Call, MemoryConnection};

    #[test]
    fn test_free_functions() {
        let conn = MemoryConnection::new();
        {
            let _open = open_session(&conn).unwrap();
            let mut tx = begin_transaction_session_with(&conn, IsolationLevel::Snapshot).unwrap();
            tx.commit().unwrap();
        }
        assert_eq!(
            conn.journal().calls(),
            vec![
                Call::Open,
                Call::BeginTransaction(Some(IsolationLevel::Snapshot)),
                Call::Commit,
                Call::Close,
            ]
        );
    }

    #[test]
    fn test_optional_session() {
        let missing: Option<&MemoryConnection> = None;
        let session = open_optional_session(missing).unwrap();
        assert!(session.connection().is_none());
    }

    #[test]
    fn test_extension_methods() {
        let conn = MemoryConnection::new();
        {
            let _open = conn.open_session().unwrap();
            assert_eq!(conn.state(), ConnectionState::Open);

            let tx = conn.begin_transaction_session().unwrap();
            assert_eq!(tx.transaction().isolation_level(), IsolationLevel::ReadCommitted);
        }
        assert_eq!(
            conn.journal().calls(),
            vec![
                Call::Open,
                Call::BeginTransaction(None),
                Call::Rollback,
                Call::Close,
            ]
        );
    }

    #[test]
    fn test_generic_caller() {
        fn run<C: DbConnection + ?Sized>(conn: &C) -> SessionResult<()> {
            let _open = open_session(conn)?;
            let mut tx = begin_transaction_session(conn)?;
            tx.commit()
        }

        let conn = MemoryConnection::new();
        run(&conn).unwrap();
        assert_eq!(conn.journal().count(&Call::Commit), 1);
        assert_eq!(conn.journal().count(&Call::Rollback), 0);
    }
}
