//! OCR through the system `tesseract` executable.

use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::OcrCapability;
use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// Runs `tesseract <file> stdout -l <lang> --oem <n> --psm <n>`.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    program: PathBuf,
    language: String,
    engine_mode: u8,
    page_segmentation_mode: u8,
    timeout: Option<Duration>,
}

const POLL_INTERVAL: Duration = Duration::from_millis(25);

impl TesseractCli {
    /// Create a backend without probing the executable.
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            program: config.tesseract_path.clone(),
            language: config.language.clone(),
            engine_mode: config.engine_mode,
            page_segmentation_mode: config.page_segmentation_mode,
            timeout: config.timeout(),
        }
    }

    /// Create a backend, checking once that the executable runs.
    pub fn detect(config: &OcrConfig) -> Result<Self, OcrError> {
        let cli = Self::new(config);
        let version = cli.version()?;
        debug!("Found {}", version);
        Ok(cli)
    }

    /// First line of `tesseract --version`.
    pub fn version(&self) -> Result<String, OcrError> {
        let output = Command::new(&self.program)
            .arg("--version")
            .output()
            .map_err(|e| OcrError::Spawn {
                program: self.program.display().to_string(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(OcrError::Unavailable(format!(
                "{} --version exited with {}",
                self.program.display(),
                output.status
            )));
        }

        // Older releases print the version on stderr.
        let text = if output.stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr).into_owned()
        } else {
            String::from_utf8_lossy(&output.stdout).into_owned()
        };
        Ok(text.lines().next().unwrap_or_default().trim().to_string())
    }

    fn arguments(&self, path: &Path) -> Vec<String> {
        vec![
            path.display().to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            self.language.clone(),
            "--oem".to_string(),
            self.engine_mode.to_string(),
            "--psm".to_string(),
            self.page_segmentation_mode.to_string(),
        ]
    }
}

/// Run `command` to completion. Returns `None` if it was still running after
/// `limit` and had to be killed.
///
/// Output is collected in anonymous temp files while polling.
fn output_within(command: &mut Command, limit: Option<Duration>) -> io::Result<Option<Output>> {
    let mut stdout = tempfile::tempfile()?;
    let mut stderr = tempfile::tempfile()?;

    let mut child = command
        .stdin(Stdio::null())
        .stdout(stdout.try_clone()?)
        .stderr(stderr.try_clone()?)
        .spawn()?;

    let start = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if limit.is_some_and(|limit| start.elapsed() >= limit) {
            // The child may exit between try_wait and kill.
            let _ = child.kill();
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    };

    Ok(Some(Output {
        status,
        stdout: read_back(&mut stdout)?,
        stderr: read_back(&mut stderr)?,
    }))
}

fn read_back(file: &mut std::fs::File) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    file.seek(SeekFrom::Start(0))?;
    file.read_to_end(&mut buf)?;
    Ok(buf)
}

impl OcrCapability for TesseractCli {
    fn recognize(&self, path: &Path) -> Result<String, OcrError> {
        let start = Instant::now();

        let mut command = Command::new(&self.program);
        command.args(self.arguments(path));

        let output = output_within(&mut command, self.timeout)
            .map_err(|e| OcrError::Spawn {
                program: self.program.display().to_string(),
                reason: e.to_string(),
            })?
            .ok_or_else(|| {
                warn!("Killed tesseract on {} after {:?}", path.display(), self.timeout);
                OcrError::Timeout(self.timeout.unwrap_or_default())
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Backend(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();

        info!(
            "OCR complete: {} chars from {} in {}ms",
            text.trim().len(),
            path.display(),
            start.elapsed().as_millis()
        );

        Ok(text)
    }

    fn backend(&self) -> &'static str {
        "tesseract"
    }
}
