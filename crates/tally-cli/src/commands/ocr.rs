//! OCR command - check the backend and preview extraction without storing.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use tally_core::models::config::OcrBackendKind;
use tally_core::models::receipt::MediaType;
use tally_core::ocr::TesseractCli;
use tally_core::rules::{find_receipt_date, guess_merchant};
use tally_core::{classify, create_capability, find_likely_amount, TextExtractor};

use super::load_config;

/// Arguments for the ocr command.
#[derive(Args)]
pub struct OcrArgs {
    #[command(subcommand)]
    command: OcrCommand,
}

#[derive(Subcommand)]
enum OcrCommand {
    /// Show the configured backend and whether it can run
    Status,

    /// Extract text from a file and show the detected fields
    Extract {
        /// Receipt file (JPEG, PNG or PDF)
        input: PathBuf,

        /// Print only the raw text
        #[arg(long)]
        raw: bool,
    },
}

pub async fn run(args: OcrArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    match args.command {
        OcrCommand::Status => {
            let capability = create_capability(&config.ocr);

            println!("Backend: {:?}", config.ocr.backend);
            if capability.is_available() {
                println!("Status:  {}", style("available").green());
            } else {
                println!("Status:  {}", style("unavailable").yellow());
                println!();
                println!("Images will be stored without extracted text.");
            }

            match config.ocr.backend {
                OcrBackendKind::Tesseract => {
                    let cli = TesseractCli::new(&config.ocr);
                    match cli.version() {
                        Ok(version) => println!("Version: {}", version),
                        Err(e) => println!("Error:   {}", e),
                    }
                    println!(
                        "Options: -l {} --oem {} --psm {}",
                        config.ocr.language,
                        config.ocr.engine_mode,
                        config.ocr.page_segmentation_mode
                    );
                }
                OcrBackendKind::Onnx => {
                    println!("Models:  {}", config.ocr.model_dir.display());
                }
                OcrBackendKind::None => {}
            }

            Ok(())
        }
        OcrCommand::Extract { input, raw } => {
            let media_type = MediaType::content_type_for(&input)
                .map(MediaType::from_content_type)
                .transpose()?
                .ok_or_else(|| anyhow::anyhow!("Unsupported file format: {}", input.display()))?;

            if !input.exists() {
                anyhow::bail!("Input file not found: {}", input.display());
            }

            let extractor = TextExtractor::new(create_capability(&config.ocr))
                .with_ocr_timeout(config.ocr.timeout());
            let outcome =
                tokio::task::spawn_blocking(move || extractor.extract(&input, media_type)).await?;

            if raw {
                println!("{}", outcome.text);
                return Ok(());
            }

            if outcome.is_empty() {
                println!("{} No text extracted", style("⚠").yellow());
                return Ok(());
            }

            println!("Strategy: {:?}", outcome.strategy);
            println!(
                "Total:    {}",
                find_likely_amount(&outcome.text)
                    .map(|a| a.to_string())
                    .unwrap_or_else(|| "not found".to_string())
            );
            println!("Category: {}", classify(&outcome.text));
            if let Some(merchant) = guess_merchant(&outcome.text) {
                println!("Merchant: {}", merchant);
            }
            if let Some(date) = find_receipt_date(&outcome.text) {
                println!("Date:     {}", date);
            }
            println!();
            println!("{}", outcome.text.trim());

            Ok(())
        }
    }
}
