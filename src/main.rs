use clap::{Parser, ValueEnum};
use loanledger::application::ledger::{LoanLedger, Receipt};
use loanledger::domain::ports::LedgerStoreBox;
use loanledger::domain::time::ManualClock;
use loanledger::infrastructure::in_memory::InMemoryLedgerStore;
use loanledger::interfaces::csv::command_reader::CommandReader;
use loanledger::interfaces::csv::report_writer::ReportWriter;
use loanledger::interfaces::json::event_writer::EventWriter;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, BufWriter, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Report {
    /// One row per loan
    Loans,
    /// One row per party with its value flows
    Accounts,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input commands CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Report written to stdout once all commands are processed
    #[arg(long, value_enum, default_value_t = Report::Loans)]
    report: Report,

    /// Write every emitted notification to this file as JSON lines
    #[arg(long)]
    events: Option<PathBuf>,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_ansi(io::stderr().is_terminal())
                .with_writer(io::stderr),
        )
        .with(env_filter)
        .init();
}

fn open_store(db_path: Option<PathBuf>) -> Result<LedgerStoreBox> {
    match db_path {
        Some(db_path) => open_persistent(&db_path),
        None => Ok(Box::new(InMemoryLedgerStore::new())),
    }
}

#[cfg(feature = "storage-rocksdb")]
fn open_persistent(db_path: &Path) -> Result<LedgerStoreBox> {
    let store =
        loanledger::infrastructure::rocksdb::RocksDBStore::open(db_path).into_diagnostic()?;
    tracing::info!(path = %db_path.display(), "using RocksDB storage");
    Ok(Box::new(store))
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_persistent(db_path: &Path) -> Result<LedgerStoreBox> {
    warn!(
        path = %db_path.display(),
        "persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled; falling back to in-memory storage"
    );
    Ok(Box::new(InMemoryLedgerStore::new()))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let clock = ManualClock::from_system();
    let store = open_store(cli.db_path)?;
    let ledger = LoanLedger::open(store, Arc::new(clock.clone()))
        .await
        .into_diagnostic()?;

    let mut events = match cli.events {
        Some(path) => Some(EventWriter::new(BufWriter::new(
            File::create(path).into_diagnostic()?,
        ))),
        None => None,
    };

    let file = File::open(cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    for (row, command) in reader.commands().enumerate() {
        let call = match command.and_then(|c| c.into_call()) {
            Ok(call) => call,
            Err(e) => {
                warn!(row = row + 1, error = %e, "Error reading command");
                continue;
            }
        };
        if let Some(at) = call.at {
            clock.set(at);
        }

        match ledger.dispatch(call).await {
            Ok(Receipt::Event(event)) => {
                if let Some(writer) = events.as_mut() {
                    writer.write_event(&event).into_diagnostic()?;
                }
            }
            Ok(Receipt::Requested(_)) => {}
            Err(e) => warn!(row = row + 1, error = %e, "Error processing command"),
        }
    }

    if let Some(mut writer) = events {
        writer.flush().into_diagnostic()?;
    }

    let snapshot = ledger.into_results().await.into_diagnostic()?;

    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock());
    let written = match cli.report {
        Report::Loans => writer.write_loans(snapshot.loans),
        Report::Accounts => writer.write_accounts(snapshot.accounts),
    };
    written.into_diagnostic()?;

    Ok(())
}
