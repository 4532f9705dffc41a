//! Batch command - ingest many receipt files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use tally_core::models::receipt::MediaType;
use tally_core::{IngestReport, Ingestor, TallyConfig};

use super::ingest::format_report;
use super::{load_config, read_upload, OutputFormat, DEFAULT_USER};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Owner of the receipts
    #[arg(short, long, default_value = DEFAULT_USER)]
    user: String,

    /// Output directory for per-file reports
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of ingesting a single file.
struct BatchResult {
    path: PathBuf,
    report: Option<IngestReport>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = Arc::new(load_config(config_path)?);

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| MediaType::content_type_for(p).is_some())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to ingest",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let ingestor = Arc::new(Ingestor::from_config(&config)?);
    let jobs = args.jobs.max(1);
    let mut pending = files.into_iter().enumerate();
    let mut tasks = JoinSet::new();
    let mut results: Vec<(usize, BatchResult)> = Vec::new();

    loop {
        while tasks.len() < jobs {
            let Some((index, path)) = pending.next() else {
                break;
            };
            let ingestor = Arc::clone(&ingestor);
            let config = Arc::clone(&config);
            let owner = args.user.clone();
            tasks.spawn_blocking(move || (index, ingest_one(&ingestor, &owner, path, &config)));
        }

        let Some(joined) = tasks.join_next().await else {
            break;
        };
        let (index, result) = joined?;
        overall_pb.inc(1);

        if let Some(error_msg) = &result.error {
            if args.continue_on_error {
                warn!("Failed to ingest {}: {}", result.path.display(), error_msg);
            } else {
                error!("Failed to ingest {}: {}", result.path.display(), error_msg);
                tasks.abort_all();
                anyhow::bail!("Ingestion failed: {}", error_msg);
            }
        }

        results.push((index, result));
    }

    overall_pb.finish_with_message("Complete");

    results.sort_by_key(|(index, _)| *index);
    let results: Vec<BatchResult> = results.into_iter().map(|(_, r)| r).collect();

    if let Some(output_dir) = &args.output_dir {
        write_reports(output_dir, &results, args.format)?;
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let processed = results
        .iter()
        .filter(|r| r.report.as_ref().is_some_and(|rep| rep.processed))
        .count();
    let unreadable = results
        .iter()
        .filter(|r| r.report.as_ref().is_some_and(|rep| !rep.processed))
        .count();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();
    let expenses = results
        .iter()
        .filter(|r| r.report.as_ref().is_some_and(|rep| rep.transaction.is_some()))
        .count();

    println!();
    println!(
        "{} Ingested {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} processed, {} without text, {} failed, {} expenses recorded",
        style(processed).green(),
        style(unreadable).yellow(),
        style(failed.len()).red(),
        expenses
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn ingest_one(ingestor: &Ingestor, owner: &str, path: PathBuf, config: &TallyConfig) -> BatchResult {
    let file_start = Instant::now();
    let outcome = read_upload(owner, &path, config)
        .and_then(|upload| ingestor.ingest(upload).map_err(anyhow::Error::from));
    let processing_time_ms = file_start.elapsed().as_millis() as u64;

    match outcome {
        Ok(report) => BatchResult {
            path,
            report: Some(report),
            error: None,
            processing_time_ms,
        },
        Err(e) => BatchResult {
            path,
            report: None,
            error: Some(e.to_string()),
            processing_time_ms,
        },
    }
}

fn write_reports(output_dir: &Path, results: &[BatchResult], format: OutputFormat) -> anyhow::Result<()> {
    let extension = match format {
        OutputFormat::Json => "json",
        OutputFormat::Csv => "csv",
        OutputFormat::Text => "txt",
    };

    for result in results {
        let Some(report) = &result.report else {
            continue;
        };

        let output_name = result
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("receipt");
        let output_path = output_dir.join(format!("{}.{}", output_name, extension));

        fs::write(&output_path, format_report(report, format)?)?;
        debug!("Wrote output to {}", output_path.display());
    }

    Ok(())
}

fn write_summary(path: &Path, results: &[BatchResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "receipt_id",
        "total_amount",
        "category",
        "transaction_id",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result.path.file_name().and_then(|s| s.to_str()).unwrap_or("");

        if let Some(report) = &result.report {
            let status = if report.processed { "processed" } else { "no_text" };
            wtr.write_record([
                filename,
                status,
                &report.receipt.id.to_string(),
                &report
                    .receipt
                    .total_amount()
                    .map(|a| a.to_string())
                    .unwrap_or_default(),
                &report.category.map(|c| c.to_string()).unwrap_or_default(),
                &report
                    .transaction
                    .as_ref()
                    .map(|t| t.id.to_string())
                    .unwrap_or_default(),
                &result.processing_time_ms.to_string(),
                report.warning.as_deref().unwrap_or(""),
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
