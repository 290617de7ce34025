//! I/O error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid file format.
    #[error("invalid file format: {0}")]
    InvalidFormat(String),

    /// MRC data mode that cannot be decoded.
    #[error("unsupported MRC mode {0}")]
    UnsupportedMode(i32),

    /// A file expected to hold one 2-D image holds several sections.
    #[error("{} holds {nz} sections, expected a single image", .path.display())]
    NotSingleImage { path: PathBuf, nz: usize },

    /// A tilt series needs at least one file.
    #[error("cannot build a tilt series from an empty file list")]
    EmptySeries,

    /// A slice does not match the shape or mode of the first file.
    #[error(
        "{} is {found_shape:?} mode {found_mode}, expected {expected_shape:?} mode {expected_mode}",
        .path.display()
    )]
    ShapeMismatch {
        path: PathBuf,
        expected_shape: (usize, usize),
        found_shape: (usize, usize),
        expected_mode: i32,
        found_mode: i32,
    },

    /// Slice index past the end of the series.
    #[error("slice index {index} out of bounds for series of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Array construction error.
    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] tiltpick_core::Error),
}
