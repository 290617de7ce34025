//! Viewer error types.

use crate::layer::LayerId;
use thiserror::Error;

/// Result type for viewer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Viewer error types.
#[derive(Error, Debug)]
pub enum Error {
    /// Metadata or matching error.
    #[error("core error: {0}")]
    Core(#[from] tiltpick_core::Error),

    /// Image reading error.
    #[error("I/O error: {0}")]
    Io(#[from] tiltpick_io::Error),

    /// No metadata document is selected.
    #[error("no metadata document selected")]
    NothingSelected,

    /// The viewer no longer holds the selector's layer.
    #[error("viewer has no layer {0:?}")]
    UnknownLayer(LayerId),
}
