use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

/// Log to `<log_dir>/<name>_<timestamp>.log`. Returns the log file path.
pub fn init_logger(log_dir: &Path, name: &str, verbose: bool) -> Result<PathBuf> {
    create_dir_all(log_dir).with_context(|| format!("creating {}", log_dir.display()))?;
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let log_path = log_dir.join(format!("{name}_{timestamp}.log"));
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    WriteLogger::init(
        level,
        ConfigBuilder::new().build(),
        File::create(&log_path).with_context(|| format!("creating {}", log_path.display()))?,
    )
    .context("Failed to initialise logger")?;
    Ok(log_path)
}
