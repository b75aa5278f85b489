use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to load PDF: {0}")]
    PdfLoad(#[from] lopdf::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("no file matching '{prefix}*{extension}' found among {candidates} candidate(s)")]
    SourceDocumentNotFound {
        prefix: String,
        extension: String,
        candidates: usize,
    },

    #[error("no ruled table grid detected on any selected page")]
    NoTablesFound,

    #[error("page {page}: table fragment has {found} column(s), schema defines {expected}")]
    ColumnCountMismatch {
        page: u32,
        expected: usize,
        found: usize,
    },

    #[error("mapped column '{column}' is missing from the extracted table")]
    MissingColumn { column: String },

    #[error("no pages available after applying selection")]
    NoPagesSelected,

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("download failed for '{url}': {reason}")]
    Download { url: String, reason: String },

    #[error("invalid option: {0}")]
    InvalidOption(String),
}
