// src/utils/error.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("No table found in HTML")]
    NoTable,

    #[error("Too few rows ({found}) for a Financial Highlights table (need at least {required})")]
    TooFewRows { found: usize, required: usize },

    #[error("Invalid XBRL instance document: {0}")]
    InvalidXml(#[from] roxmltree::Error),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Data processing failed: {0}")]
    Processing(String),
}
