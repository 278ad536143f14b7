use clap::Parser;
use flightsurety::application::engine::GovernanceEngine;
use flightsurety::config::RegistryConfig;
use flightsurety::domain::identity::Identity;
use flightsurety::domain::ports::RegistryStoreBox;
use flightsurety::infrastructure::in_memory::InMemoryRegistryStore;
#[cfg(feature = "storage-rocksdb")]
use flightsurety::infrastructure::rocksdb::RocksDBRegistryStore;
use flightsurety::interfaces::csv::airline_writer::AirlineWriter;
use flightsurety::interfaces::csv::operation_reader::OperationReader;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input operations CSV file
    input: PathBuf,

    /// Identity that owns the registry and may pause it or authorize callers.
    #[arg(long)]
    owner: Identity,

    /// Airline registered when the registry is created.
    #[arg(long)]
    first_airline: Identity,

    /// Identity the governance engine presents to the store. Defaults to the owner.
    #[arg(long)]
    app: Option<Identity>,

    /// JSON file with registry parameters (funding threshold, bootstrap size).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

fn open_store(cli: &Cli, config: &RegistryConfig) -> Result<RegistryStoreBox> {
    #[cfg(feature = "storage-rocksdb")]
    {
        if let Some(db_path) = &cli.db_path {
            let store = RocksDBRegistryStore::open(db_path, cli.owner, cli.first_airline, config)
                .into_diagnostic()?;
            return Ok(Box::new(store));
        }
    }

    #[cfg(not(feature = "storage-rocksdb"))]
    {
        if cli.db_path.is_some() {
            warn!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
        }
    }

    Ok(Box::new(InMemoryRegistryStore::new(
        cli.owner,
        cli.first_airline,
        config,
    )))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RegistryConfig::load(path).into_diagnostic()?,
        None => RegistryConfig::default(),
    };

    let store = open_store(&cli, &config)?;
    let app = cli.app.unwrap_or(cli.owner);
    let engine = GovernanceEngine::new(app, store, &config);
    if app != cli.owner {
        engine
            .authorize_caller(cli.owner, app)
            .await
            .into_diagnostic()?;
    }

    // Process operations
    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = OperationReader::new(file);
    for op_result in reader.operations() {
        match op_result {
            Ok(op) => {
                if let Err(e) = engine.process_operation(op).await {
                    warn!(kind = ?e.kind(), "Operation rejected: {}", e);
                }
            }
            Err(e) => {
                warn!("Error reading operation: {}", e);
            }
        }
    }

    let airlines = engine.into_results().await.into_diagnostic()?;

    // Output final state
    let stdout = io::stdout();
    let mut writer = AirlineWriter::new(stdout.lock());
    writer.write_airlines(airlines).into_diagnostic()?;

    Ok(())
}
