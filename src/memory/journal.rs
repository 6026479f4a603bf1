//! Call journal for the in-memory backend.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::transaction::IsolationLevel;

/// Kind of backend call, used for fault injection and counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Open,
    Close,
    BeginTransaction,
    Commit,
    Rollback,
    Execute,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Open => write!(f, "open"),
            Operation::Close => write!(f, "close"),
            Operation::BeginTransaction => write!(f, "begin transaction"),
            Operation::Commit => write!(f, "commit"),
            Operation::Rollback => write!(f, "rollback"),
            Operation::Execute => write!(f, "execute"),
        }
    }
}

/// A backend call with its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", content = "arg", rename_all = "snake_case")]
pub enum Call {
    Open,
    Close,
    /// `None` when the backend default isolation level was requested.
    BeginTransaction(Option<IsolationLevel>),
    Commit,
    Rollback,
    Execute(String),
}

impl Call {
    /// The operation this call performs.
    pub fn operation(&self) -> Operation {
        match self {
            Call::Open => Operation::Open,
            Call::Close => Operation::Close,
            Call::BeginTransaction(_) => Operation::BeginTransaction,
            Call::Commit => Operation::Commit,
            Call::Rollback => Operation::Rollback,
            Call::Execute(_) => Operation::Execute,
        }
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Call::BeginTransaction(Some(level)) => write!(f, "begin transaction ({})", level),
            Call::Execute(sql) => write!(f, "execute: {}", sql),
            other => write!(f, "{}", other.operation()),
        }
    }
}

/// One attempted call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub call: Call,
    /// Whether the call succeeded.
    pub ok: bool,
    pub at: DateTime<Utc>,
}

/// Ordered record of every call a connection received, including failed ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    pub(crate) fn push(&mut self, call: Call, ok: bool) {
        self.entries.push(JournalEntry {
            call,
            ok,
            at: Utc::now(),
        });
    }

    /// All entries in call order.
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// The calls without outcome or timestamp.
    pub fn calls(&self) -> Vec<Call> {
        self.entries.iter().map(|e| e.call.clone()).collect()
    }

    /// Number of attempts of exactly this call.
    pub fn count(&self, call: &Call) -> usize {
        self.entries.iter().filter(|e| &e.call == call).count()
    }

    /// Number of attempts of an operation, whatever its arguments.
    pub fn count_operation(&self, operation: Operation) -> usize {
        self.entries
            .iter()
            .filter(|e| e.call.operation() == operation)
            .count()
    }

    /// Number of entries that failed.
    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|e| !e.ok).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let mut journal = Journal::default();
        journal.push(Call::Open, true);
        journal.push(Call::BeginTransaction(None), true);
        journal.push(Call::BeginTransaction(Some(IsolationLevel::Snapshot)), false);
        journal.push(Call::Close, true);

        assert_eq!(journal.len(), 4);
        assert_eq!(journal.count(&Call::BeginTransaction(None)), 1);
        assert_eq!(journal.count_operation(Operation::BeginTransaction), 2);
        assert_eq!(journal.failures(), 1);
    }

    #[test]
    fn test_call_display() {
        assert_eq!(Call::Commit.to_string(), "commit");
        assert_eq!(
            Call::BeginTransaction(Some(IsolationLevel::RepeatableRead)).to_string(),
            "begin transaction (REPEATABLE READ)"
        );
        assert_eq!(
            Call::Execute("DELETE FROM t".into()).to_string(),
            "execute: DELETE FROM t"
        );
    }

    #[test]
    fn test_journal_json() {
        let mut journal = Journal::default();
        journal.push(Call::Execute("SELECT 1".into()), true);

        let value = serde_json::to_value(&journal).unwrap();
        assert_eq!(value["entries"][0]["call"]["call"], "execute");
        assert_eq!(value["entries"][0]["call"]["arg"], "SELECT 1");
        assert_eq!(value["entries"][0]["ok"], true);
    }
}
