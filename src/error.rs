//! Error handling for vin-core
//!
//! Format errors are raised while parsing, range errors on mutating paths
//! that address missing nodes or layers, and invariant errors when an edit
//! would break a rule of the layered model.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for vin-core operations
pub type Result<T> = std::result::Result<T, VinError>;

/// Main error type for vin-core operations
#[derive(Error, Debug)]
pub enum VinError {
    // Format Errors
    #[error("Invalid v.in format: {reason}")]
    Format { reason: String },

    #[error("Invalid v.in format at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    // Range Errors
    #[error("Node index {index} out of range")]
    NodeOutOfRange { index: usize },

    #[error("Part index {index} out of range (expected 0, 1 or 2)")]
    PartOutOfRange { index: usize },

    #[error("Layer index {ilayer} out of range (model has {nlayer} layers)")]
    LayerOutOfRange { ilayer: usize, nlayer: usize },

    // Model Rule Errors
    #[error("{reason}")]
    Invariant { reason: String },

    // Batch Errors
    #[error("Selected nodes {first} and {second} share layer {ilayer}; edit them one layer at a time")]
    BatchConflict {
        ilayer: usize,
        first: String,
        second: String,
    },

    #[error("Invalid selection: {reason}")]
    InvalidSelection { reason: String },

    // Poisson Ratio Errors
    #[error("Invalid poisson ratio data: {reason}")]
    InvalidPois { reason: String },

    // File Errors
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read file: {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}: {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VinError {
    /// Shorthand for a whole-text format error
    pub fn format(reason: impl Into<String>) -> Self {
        VinError::Format {
            reason: reason.into(),
        }
    }

    /// Shorthand for a format error located at a 1-based line number
    pub fn parse(line: usize, reason: impl Into<String>) -> Self {
        VinError::Parse {
            line,
            reason: reason.into(),
        }
    }

    /// Shorthand for a broken model rule
    pub fn invariant(reason: impl Into<String>) -> Self {
        VinError::Invariant {
            reason: reason.into(),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            VinError::Format { .. } | VinError::Parse { .. } => "FORMAT_ERROR",
            VinError::NodeOutOfRange { .. }
            | VinError::PartOutOfRange { .. }
            | VinError::LayerOutOfRange { .. } => "INDEX_ERROR",
            VinError::Invariant { .. } => "INVARIANT_VIOLATION",
            VinError::BatchConflict { .. } => "BATCH_CONFLICT",
            VinError::InvalidSelection { .. } => "INVALID_SELECTION",
            VinError::InvalidPois { .. } => "INVALID_POIS",
            VinError::FileNotFound { .. } => "FILE_NOT_FOUND",
            VinError::FileReadError { .. } => "FILE_READ_ERROR",
            VinError::FileWriteError { .. } => "FILE_WRITE_ERROR",
            VinError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// True for errors raised while parsing model or Poisson text
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            VinError::Format { .. } | VinError::Parse { .. } | VinError::InvalidPois { .. }
        )
    }

    /// True for errors that reject an edit without touching the model.
    ///
    /// Batch operations report these per node and carry on.
    pub fn is_rejected_edit(&self) -> bool {
        matches!(
            self,
            VinError::Invariant { .. }
                | VinError::NodeOutOfRange { .. }
                | VinError::PartOutOfRange { .. }
                | VinError::LayerOutOfRange { .. }
        )
    }

    /// Returns a user-friendly recovery suggestion.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            VinError::Format { .. } | VinError::Parse { .. } => {
                Some("Check that the file is a rayinvr v.in model ending with the 2 terminal lines.")
            }
            VinError::FileNotFound { .. } => Some("Check the file path and try again."),
            VinError::BatchConflict { .. } => {
                Some("Select at most one node per layer when inserting or deleting several nodes.")
            }
            VinError::Invariant { .. } => {
                Some("The first and last nodes of a line only move vertically and cannot be deleted.")
            }
            VinError::InvalidPois { .. } => {
                Some("Paste either a single 'pois=' line or the four pois/poisl/poisb/poisbl lines.")
            }
            _ => None,
        }
    }
}
