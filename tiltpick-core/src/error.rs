//! Error types for tiltpick-core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for tiltpick operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for metadata parsing and filename matching.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed metadata document line.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A tilt section lacks a field needed for matching or ordering.
    #[error("section with ZValue {z_value} has no {field} entry")]
    MissingField { z_value: i64, field: &'static str },

    /// No candidate image files were supplied.
    #[error("no candidate tilt image files to match against")]
    NoCandidates,

    /// The best candidate scored below the configured threshold.
    #[error(
        "best match for '{query}' is '{}' with score {score:.1} (minimum {min_score:.1})",
        .candidate.display()
    )]
    LowConfidenceMatch {
        query: String,
        candidate: PathBuf,
        score: f64,
        min_score: f64,
    },
}
