//! Session contract and the shared end-of-session guard.

use std::fmt;

use tracing::{debug, error, trace};

use super::dispose::{Cleanup, Disposable, Disposing};
use super::error::{SessionError, SessionResult};

/// A begun-but-not-yet-concluded resource lifecycle.
pub trait Session {
    /// Check if [`Session::end_session`] has run at least once.
    fn is_session_ended(&self) -> bool;

    /// Conclude the session.
    ///
    /// Only the first call does any work; later calls return `Ok(())`.
    /// Dropping the session ends it too, so an explicit call is only
    /// needed to end early or to observe a cleanup failure.
    fn end_session(&mut self) -> SessionResult<()>;
}

/// Resource-specific end-of-session work.
pub trait EndSession {
    /// Short name used in logs and errors.
    const KIND: &'static str;

    /// Release the resource. Runs at most once per session.
    fn do_end_session(&mut self, cleanup: Cleanup) -> SessionResult<()>;
}

/// Idempotence guard around an [`EndSession`] hook.
pub struct SessionCell<H> {
    hook: H,
    ended: bool,
}

impl<H: EndSession> SessionCell<H> {
    /// Wrap a hook whose resource has just been acquired.
    pub fn new(hook: H) -> Self {
        Self { hook, ended: false }
    }

    /// Get the hook.
    pub fn hook(&self) -> &H {
        &self.hook
    }

    pub(crate) fn hook_mut(&mut self) -> &mut H {
        &mut self.hook
    }

    fn end_with(&mut self, cleanup: Cleanup) -> SessionResult<()> {
        if self.ended {
            trace!(kind = H::KIND, %cleanup, "session already ended");
            return Ok(());
        }
        // Marked before the hook runs: a failed close or rollback is not retried.
        self.ended = true;
        debug!(kind = H::KIND, %cleanup, "ending session");
        self.hook.do_end_session(cleanup)
    }
}

impl<H: EndSession> Session for SessionCell<H> {
    fn is_session_ended(&self) -> bool {
        self.ended
    }

    fn end_session(&mut self) -> SessionResult<()> {
        self.end_with(Cleanup::Deterministic)
    }
}

impl<H: EndSession> Disposing for SessionCell<H> {
    fn disposing(&mut self, cleanup: Cleanup) -> SessionResult<()> {
        self.end_with(cleanup)
    }
}

impl<H: fmt::Debug> fmt::Debug for SessionCell<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCell")
            .field("hook", &self.hook)
            .field("ended", &self.ended)
            .finish()
    }
}

/// A session that ends when disposed or dropped.
///
/// Every concrete session is one of these: a [`SessionCell`] inside a
/// [`Disposable`], so disposal and explicit ending share one guard.
pub type UsingSession<H> = Disposable<SessionCell<H>>;

impl<H: EndSession> Disposable<SessionCell<H>> {
    /// Start a session over a hook whose resource is already acquired.
    pub fn start(hook: H) -> Self {
        Disposable::new(SessionCell::new(hook))
    }

    /// Get the resource hook.
    pub fn hook(&self) -> &H {
        self.get_ref().hook()
    }

    pub(crate) fn hook_mut(&mut self) -> &mut H {
        self.get_mut().hook_mut()
    }
}

impl<H: EndSession> Session for Disposable<SessionCell<H>> {
    fn is_session_ended(&self) -> bool {
        self.get_ref().is_session_ended()
    }

    fn end_session(&mut self) -> SessionResult<()> {
        self.get_mut().end_session()
    }
}

/// Run `body` inside a session and end it deterministically afterwards.
///
/// This is the scoped form that reports cleanup failures, with the same
/// precedence as a `finally` block:
/// - body succeeds, cleanup fails: the cleanup error is returned.
/// - body fails, cleanup succeeds: the body error is returned.
/// - both fail: the cleanup error is returned and the body error is logged.
///
/// A panic in `body` unwinds through `Drop`, which ends the session as a
/// fallback cleanup.
pub fn using<H, R, E, F>(mut session: UsingSession<H>, body: F) -> Result<R, E>
where
    H: EndSession,
    E: From<SessionError> + fmt::Debug,
    F: FnOnce(&mut UsingSession<H>) -> Result<R, E>,
{
    let outcome = body(&mut session);
    let cleanup = session.dispose();

    match (outcome, cleanup) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(E::from(e)),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(cleanup_err)) => {
            error!(kind = H::KIND, error = ?e, "scope failed before its cleanup also failed");
            Err(E::from(cleanup_err))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::db::DbError;

    /// Counts hook invocations.
    struct Counter {
        ends: Rc<Cell<usize>>,
        last: Rc<Cell<Option<Cleanup>>>,
        fail: bool,
    }

    impl EndSession for Counter {
        const KIND: &'static str = "counter";

        fn do_end_session(&mut self, cleanup: Cleanup) -> SessionResult<()> {
            self.ends.set(self.ends.get() + 1);
            self.last.set(Some(cleanup));
            if self.fail {
                Err(SessionError::Close(DbError::Backend("counter".into())))
            } else {
                Ok(())
            }
        }
    }

    struct Tally {
        ends: Rc<Cell<usize>>,
        last: Rc<Cell<Option<Cleanup>>>,
    }

    fn session(fail: bool) -> (UsingSession<Counter>, Tally) {
        let ends = Rc::new(Cell::new(0));
        let last = Rc::new(Cell::new(None));
        let session = UsingSession::start(Counter {
            ends: ends.clone(),
            last: last.clone(),
            fail,
        });
        (session, Tally { ends, last })
    }

    #[test]
    fn test_end_session_is_idempotent() {
        let (mut s, tally) = session(false);
        assert!(!s.is_session_ended());

        for _ in 0..3 {
            s.end_session().unwrap();
        }
        assert!(s.is_session_ended());
        assert!(!s.is_disposed());

        s.dispose().unwrap();
        drop(s);

        assert_eq!(tally.ends.get(), 1);
        assert_eq!(tally.last.get(), Some(Cleanup::Deterministic));
    }

    #[test]
    fn test_dispose_ends_session() {
        let (mut s, tally) = session(false);
        s.dispose().unwrap();
        assert!(s.is_session_ended());
        s.end_session().unwrap();
        assert_eq!(tally.ends.get(), 1);
    }

    #[test]
    fn test_drop_ends_session() {
        let (s, tally) = session(false);
        drop(s);
        assert_eq!(tally.ends.get(), 1);
        assert_eq!(tally.last.get(), Some(Cleanup::Fallback));
    }

    #[test]
    fn test_failed_end_is_marked_ended() {
        let (mut s, tally) = session(true);
        let err = s.end_session().unwrap_err();
        assert!(err.is_cleanup());
        assert!(s.is_session_ended());

        // No retry, neither explicitly nor from disposal.
        s.end_session().unwrap();
        s.dispose().unwrap();
        drop(s);
        assert_eq!(tally.ends.get(), 1);
    }

    #[test]
    fn test_using_ok() {
        let (s, tally) = session(false);
        let value: SessionResult<u32> = using(s, |s| {
            assert!(!s.is_session_ended());
            Ok(7)
        });
        assert_eq!(value.unwrap(), 7);
        assert_eq!(tally.ends.get(), 1);
        assert_eq!(tally.last.get(), Some(Cleanup::Deterministic));
    }

    #[test]
    fn test_using_surfaces_cleanup_error() {
        let (s, tally) = session(true);
        let result: SessionResult<()> = using(s, |_| Ok(()));
        assert!(matches!(result, Err(SessionError::Close(_))));
        assert_eq!(tally.ends.get(), 1);
    }

    #[test]
    fn test_using_returns_body_error() {
        let (s, tally) = session(false);
        let result: SessionResult<()> =
            using(s, |_| Err(SessionError::Commit(DbError::NotOpen)));
        assert!(matches!(result, Err(SessionError::Commit(_))));
        assert_eq!(tally.ends.get(), 1);
    }

    #[test]
    fn test_using_cleanup_error_wins() {
        let (s, tally) = session(true);
        let result: SessionResult<()> =
            using(s, |_| Err(SessionError::Commit(DbError::NotOpen)));
        assert!(matches!(result, Err(SessionError::Close(_))));
        assert_eq!(tally.ends.get(), 1);
    }

    #[test]
    fn test_using_after_explicit_end() {
        let (s, tally) = session(false);
        let result: SessionResult<()> = using(s, |s| s.end_session());
        assert!(result.is_ok());
        assert_eq!(tally.ends.get(), 1);
    }
}
