use std::path::PathBuf;
use thiserror::Error;

use crate::document::Action;

#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Failed to parse layout file {path}: {source}")]
    LayoutParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid cell reference '{0}'. Expected a coordinate like 'C11'")]
    InvalidCellRef(String),

    #[error("Invalid template layout: {0}")]
    InvalidLayout(String),

    #[error("Customer name is required before saving")]
    MissingCustomerName,

    #[error("Record file not found: {0}")]
    RecordNotFound(PathBuf),

    #[error("Failed to read record {path}: {source}")]
    RecordParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode record: {0}")]
    RecordEncode(#[from] serde_json::Error),

    #[error("Invalid record reference '{0}'. Use 'bomboniere list' to see available records.")]
    InvalidRecordReference(String),

    #[error("{0} is not inside the orders or quotes directory")]
    NotARecordPath(PathBuf),

    #[error("'{action}' is not available for {state}")]
    ActionNotAvailable { action: Action, state: &'static str },

    #[error("Invalid {field} '{value}'. Allowed values: {allowed}")]
    InvalidChoice {
        field: &'static str,
        value: String,
        allowed: String,
    },

    #[error("Invalid item format '{0}'. Expected 'COMPANY;CODE;DESCRIPTION;QTY;PRICE'")]
    InvalidItemFormat(String),

    #[error("Invalid date '{0}'. Expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Template file not found: {0}")]
    TemplateNotFound(PathBuf),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Converter '{0}' not found. Install LibreOffice to produce PDF printouts.")]
    ConverterNotFound(String),

    #[error("PDF conversion failed: {0}")]
    ConversionFailed(String),

    #[error("PDF conversion timed out after {0} seconds")]
    ConversionTimeout(u64),

    #[error("Could not print or open the file ({reason}). You can find it at: {path}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OrderError>;
