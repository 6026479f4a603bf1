//! Session lifecycle core.
//!
//! A session wraps one acquired resource and guarantees that its
//! end-of-session work (close a connection, roll back a transaction) runs
//! exactly once, whether the owner ends it explicitly, disposes it, or just
//! lets it go out of scope.
//!
//! # Layers
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  Disposable<T>   dispose() / Drop fallback   │
//! │  ┌────────────────────────────────────────┐  │
//! │  │ SessionCell<H>   ended flag, Session   │  │
//! │  │  ┌──────────────────────────────────┐  │  │
//! │  │  │ H: EndSession   resource hook    │  │  │
//! │  │  └──────────────────────────────────┘  │  │
//! │  └────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use dbsession::session::{using, Session};
//!
//! let session = UsingSession::start(hook);
//! using(session, |s| {
//!     // work with the resource
//!     Ok::<_, SessionError>(())
//! })?;
//! ```

mod base;
mod dispose;
mod error;

pub use base::{using, EndSession, Session, SessionCell, UsingSession};
pub use dispose::{Cleanup, Disposable, Disposing};
pub use error::{SessionError, SessionResult};
