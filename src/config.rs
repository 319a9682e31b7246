use std::env;
use std::fs;
use std::path::PathBuf;

use crate::models::{OfficeOrder, SummaryOptions};

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MAX_UPLOAD_MB: u64 = 100;

/// Runtime settings for the upload service. Read from the process
/// environment after loading `.env` from the working directory.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub result_dir: PathBuf,
    pub max_upload_bytes: u64,
    /// Keep uploads of the download route after a successful run.
    pub keep_uploads: bool,
    pub html_options: SummaryOptions,
    pub download_options: SummaryOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            upload_dir: PathBuf::from("uploads"),
            result_dir: PathBuf::from("results"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            keep_uploads: false,
            html_options: SummaryOptions::html_preset(),
            download_options: SummaryOptions::download_preset(),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_flag(key: &str) -> Option<bool> {
    env_string(key).and_then(|v| parse_flag(&v))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Megabytes to bytes. `None` for non-numbers and values that overflow.
fn parse_upload_limit(megabytes: &str) -> Option<u64> {
    megabytes
        .parse::<u64>()
        .ok()
        .and_then(|mb| mb.checked_mul(1024 * 1024))
}

fn order_from_flag(sorted: bool) -> OfficeOrder {
    if sorted {
        OfficeOrder::Sorted
    } else {
        OfficeOrder::FirstSeen
    }
}

fn apply_option_env(options: SummaryOptions, prefix: &str) -> SummaryOptions {
    let mut options = options;
    if let Some(on) = env_flag(&format!("{}_ACTIVE_ONLY", prefix)) {
        options = options.with_active_ledger(on);
    }
    if let Some(sorted) = env_flag(&format!("{}_SORT", prefix)) {
        options = options.with_order(order_from_flag(sorted));
    }
    options
}

impl AppConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();
        let port = env_string("LOKET_PORT")
            .or_else(|| env_string("PORT"))
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);
        let max_upload_bytes = env_string("LOKET_MAX_UPLOAD_MB")
            .and_then(|v| parse_upload_limit(&v))
            .unwrap_or(defaults.max_upload_bytes);
        Self {
            host: env_string("LOKET_HOST").unwrap_or(defaults.host),
            port,
            upload_dir: env_string("LOKET_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            result_dir: env_string("LOKET_RESULT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.result_dir),
            max_upload_bytes,
            keep_uploads: env_flag("LOKET_KEEP_UPLOADS").unwrap_or(defaults.keep_uploads),
            html_options: apply_option_env(defaults.html_options, "LOKET_HTML"),
            download_options: apply_option_env(defaults.download_options, "LOKET_DOWNLOAD"),
        }
    }

    /// Create the upload and result directories if they do not exist yet.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.upload_dir)?;
        fs::create_dir_all(&self.result_dir)?;
        Ok(())
    }
}
