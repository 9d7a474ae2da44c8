use clap::{Parser, Subcommand};
use prospector::config::Config;
use prospector::ingest;
use prospector::logging::init_logging;
use prospector::research::{GeminiProvider, Orchestrator};
use prospector::server;
use prospector::storage::{SqliteStore, Store};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "prospector")]
#[command(about = "Conference attendee research and prospect ranking")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load an attendee export into the store (idempotent)
    Load {
        /// Path to the attendee CSV export
        #[arg(long)]
        file: String,
    },
    /// Run a research pass over companies not yet enriched
    Research {
        /// Limit the number of companies to research (0 = all)
        #[arg(long, default_value_t = 0)]
        limit: usize,
    },
    /// Load an export, then run a research pass
    Run {
        /// Path to the attendee CSV export
        #[arg(long)]
        file: String,
        /// Limit the number of companies to research (0 = all)
        #[arg(long, default_value_t = 0)]
        limit: usize,
    },
    /// Serve the prospect read API
    Serve,
}

async fn load_export(store: &dyn Store, file: &str) -> anyhow::Result<()> {
    let rows = ingest::read_rows(file)?;
    println!("Loaded {} attendee rows from {}", rows.len(), file);

    let report = ingest::ingest(store, &rows).await?;
    println!("\n📊 Ingest Results:");
    println!("   Companies created: {}", report.companies_created);
    println!("   Attendees created: {}", report.attendees_created);
    println!("   Duplicate rows skipped: {}", report.duplicate_rows);
    println!("   Rows dropped: {}", report.dropped_rows);
    Ok(())
}

async fn research_pass(
    config: &Config,
    store: Arc<dyn Store>,
    limit: usize,
) -> anyhow::Result<()> {
    let provider = GeminiProvider::new(
        config.research.model.clone(),
        Duration::from_secs(config.research.timeout_seconds),
    )?;
    let orchestrator = Orchestrator::new(
        store,
        Arc::new(provider),
        Duration::from_millis(config.research.delay_ms),
    );

    let limit = (limit > 0).then_some(limit);
    let report = orchestrator.run_pass(limit).await?;

    if !report.failures.is_empty() {
        println!("\n⚠️  {} companies failed and remain pending:", report.failures.len());
        for (name, error) in &report.failures {
            println!("   - {name}: {error}");
        }
    }

    println!("\n\n=== COMPLETE ===");
    print!("{}", orchestrator.summary().await?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let config = Config::load()?;
    let store: Arc<dyn Store> = Arc::new(SqliteStore::open(&config.database.path)?);
    info!("Using prospect store at {}", config.database.path);

    match cli.command {
        Commands::Load { file } => {
            load_export(store.as_ref(), &file).await?;
        }
        Commands::Research { limit } => {
            research_pass(&config, store, limit).await?;
        }
        Commands::Run { file, limit } => {
            load_export(store.as_ref(), &file).await?;
            research_pass(&config, store, limit).await?;
        }
        Commands::Serve => {
            server::serve(&config, store).await?;
        }
    }

    Ok(())
}
