//! CLI application for receipt ingestion and expense tracking.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, config, ingest, ocr, receipts, transactions};

/// Tally - Turn receipt photos and PDFs into expense records
#[derive(Parser)]
#[command(name = "tally")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a single receipt file
    Ingest(ingest::IngestArgs),

    /// Ingest multiple receipt files
    Batch(batch::BatchArgs),

    /// List, show or delete stored receipts
    Receipts(receipts::ReceiptsArgs),

    /// List ledger transactions
    Transactions(transactions::TransactionsArgs),

    /// Inspect the OCR backend
    Ocr(ocr::OcrArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Ingest(args) => ingest::run(args, config_path).await,
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::Receipts(args) => receipts::run(args, config_path).await,
        Commands::Transactions(args) => transactions::run(args, config_path).await,
        Commands::Ocr(args) => ocr::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path).await,
    }
}
