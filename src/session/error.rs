//! Session error types.

use thiserror::Error;

use crate::db::DbError;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors raised while acquiring, committing or ending a session.
///
/// Each resource variant carries the backend failure as its source, so the
/// failed lifecycle step and the underlying cause are both visible.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Opening the connection failed; no session was created.
    #[error("failed to open connection: {0}")]
    Open(#[source] DbError),

    /// Beginning the transaction failed; no session was created.
    #[error("failed to begin transaction: {0}")]
    Begin(#[source] DbError),

    /// Committing failed. The session stays uncommitted and rolls back on end.
    #[error("failed to commit transaction: {0}")]
    Commit(#[source] DbError),

    /// Closing the connection failed while ending the session.
    #[error("failed to close connection: {0}")]
    Close(#[source] DbError),

    /// Rolling back failed while ending the session.
    #[error("failed to roll back transaction: {0}")]
    Rollback(#[source] DbError),

    /// The session already ended; the operation is no longer allowed.
    #[error("{kind} session has already ended")]
    Ended { kind: &'static str },
}

impl SessionError {
    /// Check if the error happened while acquiring the resource.
    pub fn is_acquisition(&self) -> bool {
        matches!(self, SessionError::Open(_) | SessionError::Begin(_))
    }

    /// Check if the error happened while ending the session.
    ///
    /// Cleanup failures are never retried: the session is already marked
    /// ended when they surface.
    pub fn is_cleanup(&self) -> bool {
        matches!(self, SessionError::Close(_) | SessionError::Rollback(_))
    }

    /// The backend error behind this failure, if any.
    pub fn db_error(&self) -> Option<&DbError> {
        match self {
            SessionError::Open(e)
            | SessionError::Begin(e)
            | SessionError::Commit(e)
            | SessionError::Close(e)
            | SessionError::Rollback(e) => Some(e),
            SessionError::Ended { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let open = SessionError::Open(DbError::AlreadyOpen);
        assert!(open.is_acquisition());
        assert!(!open.is_cleanup());

        let rollback = SessionError::Rollback(DbError::NotOpen);
        assert!(rollback.is_cleanup());
        assert!(!rollback.is_acquisition());

        let commit = SessionError::Commit(DbError::Backend("disk full".into()));
        assert!(!commit.is_acquisition());
        assert!(!commit.is_cleanup());
    }

    #[test]
    fn test_error_source() {
        let err = SessionError::Close(DbError::Backend("socket reset".into()));
        assert_eq!(err.to_string(), "failed to close connection: backend error: socket reset");
        assert!(matches!(err.db_error(), Some(DbError::Backend(_))));

        let ended = SessionError::Ended { kind: "transaction" };
        assert_eq!(ended.to_string(), "transaction session has already ended");
        assert!(ended.db_error().is_none());
    }
}
