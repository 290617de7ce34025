//! Lazily evaluated tilt-series volumes.
//!
//! A [`LazyTiltSeries`] records which file backs each slice but reads pixel
//! data only when a slice is requested. Only the first file is read at
//! construction, to learn the image shape and data mode that every other
//! slice is checked against when it is evaluated.

use crate::mrc::{read_mrc_image, MrcMode};
use crate::{Error, Result};
use ndarray::{Array2, Array3, ArrayView2, Axis};
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tiltpick_core::normalise_image;

/// One 2-D image as read from disk, before normalization.
#[derive(Debug, Clone)]
pub struct ImageSlice {
    /// Pixel values as `(ny, nx)`.
    pub data: Array2<f32>,
    /// Data mode the pixels were stored in.
    pub mode: MrcMode,
}

/// Source of single 2-D images.
///
/// Implementations must be safe to call from several threads, since
/// [`LazyTiltSeries::compute`] evaluates slices in parallel.
pub trait SliceReader: Send + Sync {
    /// Reads the image stored at `path`.
    ///
    /// # Errors
    /// Returns an error if the image cannot be read.
    fn read_slice(&self, path: &Path) -> Result<ImageSlice>;
}

/// Reads single-image MRC files.
#[derive(Debug, Clone, Copy, Default)]
pub struct MrcSliceReader;

impl SliceReader for MrcSliceReader {
    fn read_slice(&self, path: &Path) -> Result<ImageSlice> {
        let (data, mode) = read_mrc_image(path)?;
        Ok(ImageSlice { data, mode })
    }
}

/// A stack of normalized images, one per file, evaluated on demand.
///
/// The slice axis is the file order given at construction. Cloning is
/// cheap and shares the file list and reader.
#[derive(Clone)]
pub struct LazyTiltSeries {
    files: Arc<[PathBuf]>,
    height: usize,
    width: usize,
    mode: MrcMode,
    reader: Arc<dyn SliceReader>,
}

impl fmt::Debug for LazyTiltSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyTiltSeries")
            .field("shape", &self.shape())
            .field("mode", &self.mode)
            .field("files", &self.files)
            .finish_non_exhaustive()
    }
}

impl LazyTiltSeries {
    /// Builds a series over MRC files, probing the first one.
    ///
    /// # Errors
    /// Returns [`Error::EmptySeries`] for an empty list, or the error from
    /// reading the first file.
    pub fn new<P: AsRef<Path>>(files: &[P]) -> Result<Self> {
        Self::with_reader(files, Arc::new(MrcSliceReader))
    }

    /// Builds a series using a custom slice reader, probing the first file.
    ///
    /// # Errors
    /// Returns [`Error::EmptySeries`] for an empty list, or the error from
    /// reading the first file.
    pub fn with_reader<P: AsRef<Path>>(files: &[P], reader: Arc<dyn SliceReader>) -> Result<Self> {
        let files: Arc<[PathBuf]> = files.iter().map(|f| f.as_ref().to_path_buf()).collect();
        let first = files.first().ok_or(Error::EmptySeries)?;
        let sample = reader.read_slice(first)?;
        let (height, width) = sample.data.dim();
        log::debug!(
            "tilt series of {} images, {}x{} {}",
            files.len(),
            height,
            width,
            sample.mode.name()
        );
        Ok(Self {
            files,
            height,
            width,
            mode: sample.mode,
            reader,
        })
    }

    /// Number of slices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Always false; a series holds at least one slice.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Shape of the full volume as `[slices, height, width]`.
    #[must_use]
    pub fn shape(&self) -> [usize; 3] {
        [self.files.len(), self.height, self.width]
    }

    /// Data mode of the probed first file.
    #[must_use]
    pub fn mode(&self) -> MrcMode {
        self.mode
    }

    /// Files backing each slice, in slice order.
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Reads file `index` without normalizing it.
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfBounds`], a read error, or
    /// [`Error::ShapeMismatch`] if the file differs from the probed shape or mode.
    pub fn raw_slice(&self, index: usize) -> Result<Array2<f32>> {
        let path = self.files.get(index).ok_or(Error::IndexOutOfBounds {
            index,
            len: self.files.len(),
        })?;
        let slice = self.reader.read_slice(path)?;
        let found_shape = slice.data.dim();
        if found_shape != (self.height, self.width) || slice.mode != self.mode {
            return Err(Error::ShapeMismatch {
                path: path.clone(),
                expected_shape: (self.height, self.width),
                found_shape,
                expected_mode: self.mode.code(),
                found_mode: slice.mode.code(),
            });
        }
        Ok(slice.data)
    }

    /// Evaluates slice `index`: reads its file and normalizes it.
    ///
    /// # Errors
    /// See [`Self::raw_slice`].
    pub fn slice(&self, index: usize) -> Result<Array2<f32>> {
        Ok(normalise_image(&self.raw_slice(index)?))
    }

    /// Evaluates every slice in parallel and stacks them as `(K, ny, nx)`.
    ///
    /// # Errors
    /// Returns the first error encountered by any slice.
    pub fn compute(&self) -> Result<Array3<f32>> {
        let slices = (0..self.len())
            .into_par_iter()
            .map(|i| self.slice(i))
            .collect::<Result<Vec<_>>>()?;
        let views: Vec<ArrayView2<'_, f32>> = slices.iter().map(Array2::view).collect();
        Ok(ndarray::stack(Axis(0), &views)?)
    }
}

/// Builds a lazy, per-slice normalized tilt series from MRC files.
///
/// The first file is read immediately to learn the image shape and mode;
/// the remaining files are only read when their slices are evaluated.
///
/// # Errors
/// See [`LazyTiltSeries::new`].
pub fn lazy_tilt_series_from_tilt_images<P: AsRef<Path>>(files: &[P]) -> Result<LazyTiltSeries> {
    LazyTiltSeries::new(files)
}
