use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::report::ReportSettings;

/// Application-level constants
pub const APP_NAME: &str = "DentiMap";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Hosted segmentation API.
pub const DEFAULT_API_BASE_URL: &str = "https://harshithreddy01-dentimap.hf.space/api/v1";
pub const API_BASE_URL_ENV: &str = "DENTIMAP_API_BASE_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// API base URL, overridable through `DENTIMAP_API_BASE_URL`.
pub fn api_base_url() -> String {
    resolve_api_base_url(std::env::var(API_BASE_URL_ENV).ok())
}

fn resolve_api_base_url(overridden: Option<String>) -> String {
    overridden
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
}

/// Get the application data directory
/// ~/DentiMap/ when a home directory exists, else the working directory.
pub fn app_data_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(APP_NAME),
        None => {
            tracing::warn!("Cannot determine home directory, using working directory");
            PathBuf::from(".")
        }
    }
}

/// Where generated reports are saved by default.
pub fn reports_dir() -> PathBuf {
    app_data_dir().join("reports")
}

pub fn default_log_filter() -> &'static str {
    "dentimap_lib=info,dentimap=info"
}

/// Loads report settings from JSON. Missing fields take their defaults.
pub fn load_settings(path: &Path) -> Result<ReportSettings, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let settings = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "Loaded report settings");
    Ok(settings)
}
