use crate::browser::BrowserError;
use crate::report::ReportError;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, ProbeError>;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("Logging setup error: {0}")]
    LoggingSetup(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("operation cancelled")]
    Cancelled,

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}
