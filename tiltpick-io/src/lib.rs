//! tiltpick-io: MRC image I/O and lazy tilt-series volumes.
//!
//! This crate reads and writes MRC2014 files using memory-mapped files via
//! memmap2, and builds tilt-series volumes whose slices are read and
//! normalized only when requested.
//!

mod error;
pub mod lazy;
pub mod mrc;

pub use error::{Error, Result};
pub use lazy::{
    lazy_tilt_series_from_tilt_images, ImageSlice, LazyTiltSeries, MrcSliceReader, SliceReader,
};
pub use mrc::{
    get_image_shape, read_mrc, read_mrc_image, write_mrc, MrcFile, MrcHeader, MrcMode,
    HEADER_LEN,
};
