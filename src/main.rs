use clap::Parser;
use ledger_core::application::engine::EngineConfig;
use ledger_core::application::service::LedgerService;
use ledger_core::domain::ports::AccountStoreBox;
use ledger_core::infrastructure::in_memory::InMemoryAccountStore;
use ledger_core::interfaces::batch::BatchRunner;
use ledger_core::interfaces::csv::account_writer::AccountWriter;
use ledger_core::interfaces::csv::command_reader::CommandReader;
use ledger_core::telemetry;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input commands CSV file (`type, account, from, to, amount, tx`)
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "LEDGER_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Upper bound for each storage call, in milliseconds.
    #[arg(long, env = "LEDGER_STORE_TIMEOUT_MS", default_value_t = 5_000)]
    store_timeout_ms: u64,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, env = "LEDGER_LOG", default_value = "warn")]
    log_level: String,
}

fn open_store(db_path: Option<PathBuf>) -> Result<AccountStoreBox> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            use ledger_core::infrastructure::rocksdb::RocksDBStore;
            info!(path = %path.display(), "using RocksDB storage");
            let store = RocksDBStore::open(path).into_diagnostic()?;
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            warn!(
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
            );
            Ok(Box::new(InMemoryAccountStore::new()))
        }
        None => Ok(Box::new(InMemoryAccountStore::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(&cli.log_level);

    let config = EngineConfig {
        store_timeout: Duration::from_millis(cli.store_timeout_ms),
    };
    let store = open_store(cli.db_path)?;
    let mut runner = BatchRunner::new(LedgerService::with_config(store, config));

    let file = File::open(cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    for (row, command) in reader.commands().enumerate() {
        match command {
            Ok(command) => {
                if let Err(e) = runner.execute(command).await {
                    warn!(row = row + 1, error = %e, "failed to execute command");
                }
            }
            Err(e) => {
                warn!(row = row + 1, error = %e, "failed to read command");
            }
        }
    }

    let (accounts, aliases) = runner.into_results().await.into_diagnostic()?;
    info!(accounts = accounts.len(), "batch complete");

    let stdout = io::stdout();
    let mut writer = AccountWriter::new(stdout.lock());
    writer.write_accounts(&accounts, &aliases).into_diagnostic()?;

    Ok(())
}
