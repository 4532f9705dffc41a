//! Ingest command - store a single receipt and derive its expense.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use tally_core::{IngestReport, Ingestor};

use super::{load_config, read_upload, OutputFormat, DEFAULT_USER};

/// Arguments for the ingest command.
#[derive(Args)]
pub struct IngestArgs {
    /// Receipt file (JPEG, PNG or PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Owner of the receipt
    #[arg(short, long, default_value = DEFAULT_USER)]
    user: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

pub async fn run(args: IngestArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let upload = read_upload(&args.user, &args.input, &config)?;
    info!("Ingesting file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Extracting text...");

    let ingestor = Arc::new(Ingestor::from_config(&config)?);
    let report = tokio::task::spawn_blocking(move || ingestor.ingest(upload)).await??;

    pb.finish_and_clear();

    if let Some(warning) = &report.warning {
        eprintln!("{} {}", style("⚠").yellow(), warning);
    }

    let output = format_report(&report, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn format_report(report: &IngestReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Csv => format_csv(report),
        OutputFormat::Text => Ok(format_text(report)),
    }
}

fn format_csv(report: &IngestReport) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "receipt_id",
        "original_name",
        "processed",
        "total_amount",
        "merchant",
        "date",
        "category",
        "transaction_id",
    ])?;

    let fields = report.receipt.fields();
    wtr.write_record([
        &report.receipt.id.to_string(),
        &report.receipt.original_name,
        &report.processed.to_string(),
        &report.receipt.total_amount().map(|a| a.to_string()).unwrap_or_default(),
        &fields.and_then(|f| f.merchant_name.clone()).unwrap_or_default(),
        &fields
            .and_then(|f| f.transaction_date)
            .map(|d| d.to_string())
            .unwrap_or_default(),
        &report.category.map(|c| c.to_string()).unwrap_or_default(),
        &report
            .transaction
            .as_ref()
            .map(|t| t.id.to_string())
            .unwrap_or_default(),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(report: &IngestReport) -> String {
    let receipt = &report.receipt;
    let mut output = String::new();

    output.push_str(&format!("{}\n", report.message));
    output.push_str(&format!("Receipt: {}\n", receipt.id));
    output.push_str(&format!("File: {} ({})\n", receipt.original_name, receipt.media_type));
    output.push_str(&format!("Stored at: {}\n", receipt.locator.display()));

    if let Some(fields) = receipt.fields() {
        output.push('\n');
        if let Some(merchant) = &fields.merchant_name {
            output.push_str(&format!("Merchant: {}\n", merchant));
        }
        if let Some(date) = fields.transaction_date {
            output.push_str(&format!("Date:     {}\n", date));
        }
        match fields.total_amount {
            Some(total) => output.push_str(&format!("Total:    {}\n", total)),
            None => output.push_str("Total:    not found\n"),
        }
    }

    if let Some(category) = report.category {
        output.push_str(&format!("Category: {}\n", category));
    }

    if let Some(tx) = &report.transaction {
        output.push_str(&format!(
            "\nExpense {} recorded: {} in {}\n",
            tx.id, tx.amount, tx.category
        ));
    }

    output
}
