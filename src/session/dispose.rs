//! One-time cleanup primitive.
//!
//! [`Disposable`] owns a value whose cleanup must run at most once. The
//! owner can request cleanup explicitly with [`Disposable::dispose`], which
//! reports failures. If it never does, `Drop` runs the same hook as a
//! best-effort fallback and only logs failures.
//!
//! `std::mem::forget` skips both paths. Nothing else can reclaim the
//! resource in that case.

use std::fmt;

use tracing::{trace, warn};

use super::error::SessionResult;

/// How a cleanup was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cleanup {
    /// Requested by the owner. Failures propagate to the caller.
    Deterministic,
    /// Run from `Drop` because the owner never requested cleanup.
    /// Failures are suppressed.
    Fallback,
}

impl fmt::Display for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cleanup::Deterministic => write!(f, "deterministic"),
            Cleanup::Fallback => write!(f, "fallback"),
        }
    }
}

/// The cleanup hook invoked by [`Disposable`].
pub trait Disposing {
    /// Release whatever this value holds.
    ///
    /// Called at most once per [`Disposable`]. During a
    /// [`Cleanup::Fallback`] other values may already have been dropped, so
    /// implementations should only touch what they own.
    fn disposing(&mut self, cleanup: Cleanup) -> SessionResult<()>;
}

/// A value whose cleanup hook runs exactly once.
pub struct Disposable<T: Disposing> {
    inner: T,
    disposed: bool,
}

impl<T: Disposing> Disposable<T> {
    /// Wrap a value. Cleanup is armed from this point on.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            disposed: false,
        }
    }

    /// Check if cleanup has already run (explicitly or not).
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Run cleanup now.
    ///
    /// The first call invokes the hook with [`Cleanup::Deterministic`] and
    /// returns its result. Later calls do nothing. Once this has been
    /// called, dropping the value does not run the hook again, even if it
    /// failed.
    pub fn dispose(&mut self) -> SessionResult<()> {
        if self.disposed {
            trace!("dispose called on an already disposed value");
            return Ok(());
        }
        self.disposed = true;
        self.inner.disposing(Cleanup::Deterministic)
    }

    /// Get a reference to the wrapped value.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Get a mutable reference to the wrapped value.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

impl<T: Disposing + fmt::Debug> fmt::Debug for Disposable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposable")
            .field("inner", &self.inner)
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl<T: Disposing> Drop for Disposable<T> {
    fn drop(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Err(e) = self.inner.disposing(Cleanup::Fallback) {
            warn!(error = %e, "fallback cleanup failed");
        }
    }
}
