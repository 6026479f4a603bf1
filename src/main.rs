//! dbsession - session pattern demo
//!
//! Runs one update against an in-memory connection, either in the classic
//! open/try/finally style or with sessions, and prints the calls the
//! connection received.

use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dbsession::db::{DbCommand, DbConnection, DbError, DbTransaction, SessionExt};
use dbsession::memory::{Journal, MemoryConnection, Operation};
use dbsession::session::{using, SessionError};
use dbsession::transaction::IsolationLevel;

const DEFAULT_STATEMENT: &str = "UPDATE persons SET name = 'Foo' WHERE id = 1";

/// How the scenario manages the connection and transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Style {
    /// Explicit open/close and commit/rollback on every path.
    Classic,
    /// Connection and transaction sessions.
    Session,
}

#[derive(Debug, Parser)]
#[command(name = "dbsession", version, about = "Compare classic and session-managed connection handling")]
struct Args {
    /// Connection handling style.
    #[arg(long, value_enum, default_value_t = Style::Session)]
    style: Style,

    /// Statement to execute.
    #[arg(short, long, default_value = DEFAULT_STATEMENT)]
    statement: String,

    /// Run without a transaction.
    #[arg(long)]
    no_transaction: bool,

    /// Isolation level for the transaction (e.g. "serializable").
    #[arg(long)]
    isolation: Option<IsolationLevel>,

    /// Make the statement fail, before the commit is reached.
    #[arg(long)]
    fail_execute: bool,

    /// Make the commit fail.
    #[arg(long)]
    fail_commit: bool,

    /// Make the rollback fail.
    #[arg(long)]
    fail_rollback: bool,

    /// Make closing the connection fail.
    #[arg(long)]
    fail_close: bool,

    /// Print the journal as JSON.
    #[arg(long)]
    json: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

/// Scenario configuration.
#[derive(Debug, Clone)]
struct DemoConfig {
    style: Style,
    statement: String,
    transaction: bool,
    isolation: Option<IsolationLevel>,
    faults: Vec<Operation>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            style: Style::Session,
            statement: DEFAULT_STATEMENT.to_string(),
            transaction: true,
            isolation: None,
            faults: Vec::new(),
        }
    }
}

impl DemoConfig {
    fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    fn statement(mut self, statement: impl Into<String>) -> Self {
        self.statement = statement.into();
        self
    }

    fn transaction(mut self, value: bool) -> Self {
        self.transaction = value;
        self
    }

    fn isolation(mut self, level: Option<IsolationLevel>) -> Self {
        self.isolation = level;
        self
    }

    fn fail_on(mut self, operation: Operation) -> Self {
        self.faults.push(operation);
        self
    }
}

impl From<&Args> for DemoConfig {
    fn from(args: &Args) -> Self {
        let mut config = DemoConfig::default()
            .style(args.style)
            .statement(args.statement.clone())
            .transaction(!args.no_transaction)
            .isolation(args.isolation);

        let faults = [
            (args.fail_execute, Operation::Execute),
            (args.fail_commit, Operation::Commit),
            (args.fail_rollback, Operation::Rollback),
            (args.fail_close, Operation::Close),
        ];
        for (enabled, operation) in faults {
            if enabled {
                config = config.fail_on(operation);
            }
        }
        config
    }
}

#[derive(Debug, Error)]
enum DemoError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Db(#[from] DbError),
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = DemoConfig::from(&args);
    let (conn, outcome) = run(&config);

    if let Err(e) = print_report(&conn.journal(), &conn, args.json) {
        eprintln!("Error writing report: {}", e);
        return ExitCode::FAILURE;
    }

    match outcome {
        Ok(rows) => {
            info!(rows, "scenario completed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "dbsession=debug" } else { "dbsession=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(config: &DemoConfig) -> (MemoryConnection, Result<u64, DemoError>) {
    let conn = MemoryConnection::new();
    for operation in &config.faults {
        conn.fail_on(*operation);
    }

    info!(style = ?config.style, transaction = config.transaction, "running scenario");
    let outcome = match config.style {
        Style::Classic => run_classic(&conn, config),
        Style::Session => run_session(&conn, config),
    };
    (conn, outcome)
}

fn execute(conn: &MemoryConnection, sql: &str) -> Result<u64, DbError> {
    let mut cmd = conn.create_command();
    cmd.set_command_text(sql);
    cmd.execute_non_query()
}

fn run_classic(conn: &MemoryConnection, config: &DemoConfig) -> Result<u64, DemoError> {
    conn.open()?;
    let outcome = classic_body(conn, config);
    let closed = conn.close();
    let rows = outcome?;
    closed?;
    Ok(rows)
}

fn classic_body(conn: &MemoryConnection, config: &DemoConfig) -> Result<u64, DemoError> {
    if !config.transaction {
        return Ok(execute(conn, &config.statement)?);
    }

    let mut tx = match config.isolation {
        Some(level) => conn.begin_transaction_with(level)?,
        None => conn.begin_transaction()?,
    };
    let result = execute(conn, &config.statement).and_then(|rows| tx.commit().map(|()| rows));
    match result {
        Ok(rows) => Ok(rows),
        Err(e) => {
            warn!(error = %e, "rolling back");
            tx.rollback()?;
            Err(e.into())
        }
    }
}

fn run_session(conn: &MemoryConnection, config: &DemoConfig) -> Result<u64, DemoError> {
    using(conn.open_session()?, |_| -> Result<u64, DemoError> {
        if !config.transaction {
            return Ok(execute(conn, &config.statement)?);
        }

        let tx = match config.isolation {
            Some(level) => conn.begin_transaction_session_with(level)?,
            None => conn.begin_transaction_session()?,
        };
        using(tx, |tx| -> Result<u64, DemoError> {
            let rows = execute(conn, &config.statement)?;
            tx.commit()?;
            Ok(rows)
        })
    })
}

fn print_report(
    journal: &Journal,
    conn: &MemoryConnection,
    json: bool,
) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(journal)?);
        return Ok(());
    }

    for (i, entry) in journal.entries().iter().enumerate() {
        let status = if entry.ok { "ok" } else { "FAILED" };
        println!("{:>3}. {:<60} {}", i + 1, entry.call.to_string(), status);
    }
    println!("({} applied statement(s))", conn.applied().len());
    Ok(())
}
