//! Error taxonomy for the crop advisor core
//!
//! Every variant is a local, recoverable condition. None of them should take
//! the process down; callers surface the message and move on.

use thiserror::Error;

/// Errors produced by dataset loading, prediction and scoring
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AdvisorError {
    /// An operation needed the reference dataset before one was loaded
    #[error("model not initialized: load a reference dataset first")]
    ModelNotInitialized,

    /// Lookup for a crop label absent from the range-profile table
    #[error("no data available for crop: {0}")]
    UnknownCrop(String),

    /// Malformed input while loading a reference dataset
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),

    /// Missing or non-numeric value in a query
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, AdvisorError>;
