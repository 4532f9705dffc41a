//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod ingest;
pub mod ocr;
pub mod receipts;
pub mod transactions;

use std::path::{Path, PathBuf};

use tracing::debug;

use tally_core::{TallyConfig, Upload};

/// Owner used when `--user` is not given.
pub const DEFAULT_USER: &str = "local";

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tally")
        .join("config.json")
}

/// Load `path`, else the default config file if present, else defaults; then
/// apply environment overrides.
pub fn load_config(path: Option<&str>) -> anyhow::Result<TallyConfig> {
    let config = match path {
        Some(path) => TallyConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path, e))?,
        None => {
            let default_path = default_config_path();
            if default_path.exists() {
                debug!("Using config file {}", default_path.display());
                TallyConfig::from_file(&default_path)?
            } else {
                TallyConfig::default()
            }
        }
    };

    Ok(config.with_env_overrides()?)
}

/// Read a receipt file, enforcing the configured size limit.
pub fn read_upload(owner: &str, path: &Path, config: &TallyConfig) -> anyhow::Result<Upload> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }

    let size = path.metadata()?.len();
    let limit = config.storage.max_file_size;
    if size > limit {
        anyhow::bail!(
            "{} is {} bytes, larger than the {} byte limit",
            path.display(),
            size,
            limit
        );
    }

    Ok(Upload::from_file(owner, path)?)
}
