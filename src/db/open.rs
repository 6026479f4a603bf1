//! Connection-open session: open on start, close on end.

use std::fmt;

use tracing::debug;

use super::connection::DbConnection;
use crate::session::{Cleanup, EndSession, SessionError, SessionResult, UsingSession};

/// End-of-session hook that closes a connection.
pub struct ConnectionOpen<'c, C: ?Sized> {
    connection: Option<&'c C>,
}

impl<C: DbConnection + ?Sized> EndSession for ConnectionOpen<'_, C> {
    const KIND: &'static str = "connection";

    fn do_end_session(&mut self, cleanup: Cleanup) -> SessionResult<()> {
        match self.connection {
            Some(connection) => {
                debug!(%cleanup, "closing connection");
                connection.close().map_err(SessionError::Close)
            }
            None => Ok(()),
        }
    }
}

impl<C: ?Sized> fmt::Debug for ConnectionOpen<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOpen")
            .field("attached", &self.connection.is_some())
            .finish()
    }
}

/// A session that keeps a connection open until it ends.
pub type ConnectionOpenSession<'c, C> = UsingSession<ConnectionOpen<'c, C>>;

impl<'c, C: DbConnection + ?Sized> UsingSession<ConnectionOpen<'c, C>> {
    /// Open `connection` and start a session that closes it.
    ///
    /// `None` starts a session that does nothing on end, for call sites with
    /// an optional connection. If opening fails no session is returned.
    pub fn open(connection: Option<&'c C>) -> SessionResult<Self> {
        if let Some(connection) = connection {
            connection.open().map_err(SessionError::Open)?;
            debug!("connection opened");
        }
        Ok(UsingSession::start(ConnectionOpen { connection }))
    }

    /// The connection managed by this session.
    pub fn connection(&self) -> Option<&'c C> {
        self.hook().connection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ConnectionState, DbError};
    use crate::memory::{Call, MemoryConnection, Operation};
    use crate::session::Session;

    #[test]
    fn test_open_and_close() {
        let conn = MemoryConnection::new();
        {
            let session = ConnectionOpenSession::open(Some(&conn)).unwrap();
            assert_eq!(conn.state(), ConnectionState::Open);
            assert!(session.connection().is_some());
        }
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert_eq!(conn.journal().calls(), vec![Call::Open, Call::Close]);
    }

    #[test]
    fn test_null_connection_is_noop() {
        let mut session = ConnectionOpenSession::<MemoryConnection>::open(None).unwrap();
        assert!(session.connection().is_none());
        session.end_session().unwrap();
        session.end_session().unwrap();
        assert!(session.is_session_ended());
    }

    #[test]
    fn test_open_failure_returns_no_session() {
        let conn = MemoryConnection::new();
        conn.fail_on(Operation::Open);

        let err = ConnectionOpenSession::open(Some(&conn)).unwrap_err();
        assert!(err.is_acquisition());
        assert_eq!(conn.state(), ConnectionState::Closed);
        // No close for a connection that never opened.
        assert_eq!(conn.journal().calls(), vec![Call::Open]);
    }

    #[test]
    fn test_close_failure_propagates_once() {
        let conn = MemoryConnection::new();
        let mut session = ConnectionOpenSession::open(Some(&conn)).unwrap();
        conn.fail_on(Operation::Close);

        let err = session.end_session().unwrap_err();
        assert!(matches!(err, SessionError::Close(DbError::Backend(_))));
        assert!(session.is_session_ended());

        session.end_session().unwrap();
        session.dispose().unwrap();
        drop(session);
        assert_eq!(conn.journal().count(&Call::Close), 1);
    }

    #[test]
    fn test_explicit_end_then_scope_exit() {
        let conn = MemoryConnection::new();
        {
            let mut session = ConnectionOpenSession::open(Some(&conn)).unwrap();
            session.end_session().unwrap();
            assert_eq!(conn.state(), ConnectionState::Closed);
        }
        assert_eq!(conn.journal().calls(), vec![Call::Open, Call::Close]);
    }
}
