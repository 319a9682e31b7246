use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::{Result, SummaryError};
use crate::excel;
use crate::models::SummaryOptions;
use crate::services::summarizer;
use crate::types::SummaryTable;

/// File name of the downloadable summary workbook.
pub const RESULT_FILE_NAME: &str = "summaryloket.xlsx";

const FALLBACK_UPLOAD_NAME: &str = "upload.xlsx";

/// A file received from the upload form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._ -]").expect("upload name regex"))
}

/// Reduce a client supplied file name to a plain basename safe to join
/// onto the upload directory.
pub fn sanitize_upload_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned = unsafe_chars().replace_all(base, "_");
    let cleaned = cleaned.trim().trim_start_matches('.');
    if cleaned.is_empty() {
        FALLBACK_UPLOAD_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Store the upload under `upload_dir`, overwriting any earlier file of the same name.
pub fn save_upload(upload_dir: &Path, upload: &UploadedFile) -> Result<PathBuf> {
    fs::create_dir_all(upload_dir)?;
    let path = upload_dir.join(sanitize_upload_name(&upload.filename));
    if let Err(e) = fs::write(&path, &upload.bytes) {
        // Do not leave a truncated file behind.
        if path.is_file() {
            remove_upload(&path);
        }
        return Err(e.into());
    }
    info!(path = %path.display(), bytes = upload.bytes.len(), "upload saved");
    Ok(path)
}

/// Validate a workbook on disk and summarise its DATA CONTROL sheet.
pub fn summarize_file(path: &Path, options: &SummaryOptions, max_bytes: u64) -> Result<SummaryTable> {
    excel::validate_excel_file(path, max_bytes)?;
    let sheet = excel::read_sheet(path, excel::SOURCE_SHEET)?;
    summarizer::summarize(&sheet, options)
}

fn remove_upload(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(path = %path.display(), "could not remove upload: {}", e);
    }
}

fn write_result(config: &AppConfig, table: &SummaryTable) -> Result<PathBuf> {
    fs::create_dir_all(&config.result_dir)?;
    let out = config.result_dir.join(RESULT_FILE_NAME);
    excel::export_summary_to_excel(table, &out)?;
    Ok(out)
}

/// Summarise the upload and write the result workbook to
/// `result_dir/summaryloket.xlsx`, replacing the previous one.
/// The saved upload is removed if any step fails, and after success
/// unless `keep_uploads` is set.
pub fn export_upload(
    config: &AppConfig,
    upload: &UploadedFile,
    options: &SummaryOptions,
) -> Result<PathBuf> {
    let path = save_upload(&config.upload_dir, upload)?;
    let result = summarize_file(&path, options, config.max_upload_bytes)
        .and_then(|table| write_result(config, &table));
    if result.is_err() || !config.keep_uploads {
        remove_upload(&path);
    }
    result
}

/// Summary for the HTML page. The upload is kept on disk.
pub fn summarize_for_page(config: &AppConfig, upload: &UploadedFile) -> Result<SummaryTable> {
    let path = save_upload(&config.upload_dir, upload)?;
    summarize_file(&path, &config.html_options, config.max_upload_bytes)
}

/// Bytes of the download workbook for the upload.
pub fn build_download(config: &AppConfig, upload: &UploadedFile) -> Result<Vec<u8>> {
    let path = export_upload(config, upload, &config.download_options)?;
    fs::read(&path).map_err(SummaryError::from)
}
