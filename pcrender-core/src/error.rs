//! Error types for pcrender

use thiserror::Error;

/// Main error type for pcrender operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Renderer error: {0}")]
    Renderer(String),
}

/// Result type alias for pcrender operations
pub type Result<T> = std::result::Result<T, Error>;
