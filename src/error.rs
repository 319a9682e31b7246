use thiserror::Error;

pub type Result<T> = std::result::Result<T, SummaryError>;

/// Errors from reading a workbook and building its summary.
/// The Display text is shown to the user as-is.
#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("Sheet '{0}' not found in the Excel file.")]
    SheetNotFound(String),

    #[error("Header containing '{0}' not found.")]
    HeaderNotFound(String),

    #[error("Column not found: '{0}'")]
    MissingColumn(String),

    #[error("Could not open Excel file: {0}")]
    Open(String),

    #[error("{0}")]
    InvalidFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not write Excel file: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl SummaryError {
    /// Errors caused by the uploaded content rather than by the server.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, SummaryError::Io(_) | SummaryError::Xlsx(_))
    }
}
