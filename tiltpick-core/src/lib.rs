//! tiltpick-core: Tilt-series metadata and filename ordering.
//!
//! This crate parses SerialEM metadata documents, pairs each recorded tilt
//! with an image file on disk by fuzzy filename similarity, orders the
//! result by tilt angle, and provides the per-image normalization applied
//! to every slice of a tilt series.
//!

pub mod error;
pub mod fuzzy;
pub mod mdoc;
pub mod normalise;
pub mod ordering;

pub use error::{Error, Result};
pub use mdoc::{MdocSection, MdocTable};
pub use normalise::normalise_image;
pub use ordering::{
    get_ordered_tilt_images, get_ordered_tilt_images_with_config, get_ordered_tilt_matches,
    match_tilt_image_filenames, mdoc_basename, sort_by_tilt_angle, LowConfidencePolicy,
    MatchConfig, TiltMatch, DEFAULT_MIN_SCORE,
};
