use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while producing timesheets
#[derive(Debug, Error)]
pub enum TimesheetError {
    #[error("Failed to open spreadsheet {0}: {1}")]
    SpreadsheetOpen(PathBuf, String),

    #[error("Worksheet not found: {0}")]
    SheetNotFound(String),

    #[error("Invalid date in cell (row {row}, column {column}): {value:?}")]
    InvalidDate {
        row: u32,
        column: u32,
        value: String,
    },

    #[error("Failed to read template {0}: {1}")]
    TemplateRead(PathBuf, std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    Lopdf(#[from] lopdf::Error),

    #[error("Spreadsheet error: {0}")]
    Calamine(#[from] calamine::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for timesheet operations
pub type Result<T> = std::result::Result<T, TimesheetError>;
