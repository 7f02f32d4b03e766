//! Error types for the waterfall core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum WfError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown palette id: {0}")]
    UnknownPalette(u8),
}

/// Result type alias
pub type WfResult<T> = Result<T, WfError>;
