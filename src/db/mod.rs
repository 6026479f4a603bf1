//! Data-access traits and the connection-facing session API.

mod connection;
mod extensions;
mod open;

pub use connection::{
    ConnectionState, DbCommand, DbConnection, DbError, DbResult, DbTransaction,
};
pub use extensions::{
    begin_transaction_session, begin_transaction_session_with, open_optional_session,
    open_session, SessionExt,
};
pub use open::{ConnectionOpen, ConnectionOpenSession};
