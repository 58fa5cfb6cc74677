//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod process;
pub mod report;

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use glob::glob;
use tracing::debug;

use mailfacts_core::MailfactsConfig;

/// Multi-threaded runtime the subcommands run on.
///
/// Callers shut it down with `shutdown_background`, so blocking tasks left
/// behind by a timeout do not keep the process alive.
pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread().enable_all().build()
}

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailfacts")
        .join("config.json")
}

/// Load the configuration named on the command line, else the default file
/// if it exists, else built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<MailfactsConfig> {
    if let Some(path) = config_path {
        return Ok(MailfactsConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config at {}", default_path.display());
        Ok(MailfactsConfig::from_file(&default_path)?)
    } else {
        Ok(MailfactsConfig::default())
    }
}

/// Reference instant for relative dates: midnight of `date`, or now.
pub fn reference_instant(date: Option<NaiveDate>) -> NaiveDateTime {
    match date {
        Some(date) => date.and_time(NaiveTime::MIN),
        None => Local::now().naive_local(),
    }
}

/// Expand a glob pattern into the regular files it matches, sorted.
pub fn expand_inputs(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = glob(pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", pattern);
    }

    Ok(files)
}
