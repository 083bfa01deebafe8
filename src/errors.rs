// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Job failures are never errors: a non-zero exit is a [`JobStatus`] value
//! that the scheduler counts. Errors here are the things that stop a run
//! before (or instead of) processing records.
//!
//! [`JobStatus`]: crate::types::JobStatus

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipeError {
    #[error("usage error: {0}")]
    Usage(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipeError {
    /// Whether this error should be reported with the usage exit status.
    pub fn is_usage(&self) -> bool {
        matches!(self, PipeError::Usage(_) | PipeError::Config(_) | PipeError::Toml(_))
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PipeError>;
