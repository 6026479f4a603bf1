//! Transaction isolation levels.
//!
//! Sessions never interpret the level. It is handed to the backend's
//! `begin_transaction_with` unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    /// A level other than the listed ones is in use; it cannot be determined.
    Unspecified,

    /// Pending changes from more highly isolated transactions cannot be overwritten.
    Chaos,

    /// Dirty reads are possible.
    ReadUncommitted,

    /// Each read sees the latest committed data.
    #[default]
    ReadCommitted,

    /// Rows read stay locked until the transaction ends.
    RepeatableRead,

    /// Ranges read are locked, preventing phantom rows.
    Serializable,

    /// Reads see a versioned snapshot taken at transaction start.
    Snapshot,
}

impl IsolationLevel {
    /// All levels, in declaration order.
    pub const ALL: [IsolationLevel; 7] = [
        IsolationLevel::Unspecified,
        IsolationLevel::Chaos,
        IsolationLevel::ReadUncommitted,
        IsolationLevel::ReadCommitted,
        IsolationLevel::RepeatableRead,
        IsolationLevel::Serializable,
        IsolationLevel::Snapshot,
    ];
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IsolationLevel::Unspecified => write!(f, "UNSPECIFIED"),
            IsolationLevel::Chaos => write!(f, "CHAOS"),
            IsolationLevel::ReadUncommitted => write!(f, "READ UNCOMMITTED"),
            IsolationLevel::ReadCommitted => write!(f, "READ COMMITTED"),
            IsolationLevel::RepeatableRead => write!(f, "REPEATABLE READ"),
            IsolationLevel::Serializable => write!(f, "SERIALIZABLE"),
            IsolationLevel::Snapshot => write!(f, "SNAPSHOT"),
        }
    }
}

/// Parse isolation level from string (SQL syntax).
impl std::str::FromStr for IsolationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_uppercase()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect();

        match normalized.as_str() {
            "UNSPECIFIED" => Ok(IsolationLevel::Unspecified),
            "CHAOS" => Ok(IsolationLevel::Chaos),
            "READUNCOMMITTED" => Ok(IsolationLevel::ReadUncommitted),
            "READCOMMITTED" => Ok(IsolationLevel::ReadCommitted),
            "REPEATABLEREAD" => Ok(IsolationLevel::RepeatableRead),
            "SERIALIZABLE" => Ok(IsolationLevel::Serializable),
            "SNAPSHOT" => Ok(IsolationLevel::Snapshot),
            _ => Err(format!("unknown isolation level: {}", s)),
        }
    }
}
