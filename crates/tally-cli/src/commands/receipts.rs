//! Receipts command - browse and delete stored receipts.

use clap::{Args, Subcommand};
use console::style;
use uuid::Uuid;

use tally_core::{Ingestor, Receipt};

use super::{load_config, OutputFormat, DEFAULT_USER};

/// Arguments for the receipts command.
#[derive(Args)]
pub struct ReceiptsArgs {
    /// Owner of the receipts
    #[arg(short, long, global = true, default_value = DEFAULT_USER)]
    user: String,

    #[command(subcommand)]
    command: ReceiptsCommand,
}

#[derive(Subcommand)]
enum ReceiptsCommand {
    /// List receipts, newest first
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show one receipt with its extracted fields
    Show {
        /// Receipt id
        id: Uuid,
    },

    /// Delete a receipt and its stored file
    Delete {
        /// Receipt id
        id: Uuid,
    },
}

pub async fn run(args: ReceiptsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let ingestor = Ingestor::records_from_config(&config)?;

    match args.command {
        ReceiptsCommand::List { format } => list(&ingestor, &args.user, format),
        ReceiptsCommand::Show { id } => {
            let receipt = ingestor.receipt(&args.user, id)?;
            println!("{}", serde_json::to_string_pretty(&receipt)?);
            Ok(())
        }
        ReceiptsCommand::Delete { id } => {
            let receipt = ingestor.delete_receipt(&args.user, id)?;
            println!(
                "{} Deleted receipt {} ({})",
                style("✓").green(),
                receipt.id,
                receipt.original_name
            );
            Ok(())
        }
    }
}

fn list(ingestor: &Ingestor, owner: &str, format: OutputFormat) -> anyhow::Result<()> {
    let receipts = ingestor.receipts(owner)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&receipts)?),
        OutputFormat::Csv => print!("{}", format_csv(&receipts)?),
        OutputFormat::Text => {
            if receipts.is_empty() {
                println!("{} No receipts for {}", style("ℹ").blue(), owner);
            }
            for receipt in &receipts {
                println!("{}", format_line(receipt));
            }
        }
    }

    Ok(())
}

fn status(receipt: &Receipt) -> &'static str {
    if receipt.processed() {
        "processed"
    } else if receipt.raw_text().is_some() {
        "failed"
    } else {
        "pending"
    }
}

fn format_line(receipt: &Receipt) -> String {
    let total = receipt
        .total_amount()
        .map(|a| a.to_string())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{}  {}  {:<9}  {:>10}  {}",
        receipt.id,
        receipt.created_at.format("%Y-%m-%d %H:%M"),
        status(receipt),
        total,
        receipt.original_name
    )
}

fn format_csv(receipts: &[Receipt]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "id",
        "created_at",
        "original_name",
        "media_type",
        "status",
        "total_amount",
        "merchant",
        "locator",
    ])?;

    for receipt in receipts {
        wtr.write_record([
            &receipt.id.to_string(),
            &receipt.created_at.to_rfc3339(),
            &receipt.original_name,
            &receipt.media_type.to_string(),
            status(receipt),
            &receipt.total_amount().map(|a| a.to_string()).unwrap_or_default(),
            &receipt
                .fields()
                .and_then(|f| f.merchant_name.clone())
                .unwrap_or_default(),
            &receipt.locator.display().to_string(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}
