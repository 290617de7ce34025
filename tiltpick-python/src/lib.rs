//! tiltpick-python: PyO3 Python bindings for tiltpick.
#![allow(
    clippy::doc_markdown,
    clippy::needless_pass_by_value,
    clippy::uninlined_format_args
)]
//!
//! Tilt-series ordering, MRC reading and the lazily evaluated tilt series
//! are exposed to Python with numpy arrays for image data.

use std::path::PathBuf;

use numpy::{Element, IntoPyArray, PyArray2, PyArray3, PyArrayDyn, PyReadonlyArrayDyn};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use tiltpick_core::{LowConfidencePolicy, MatchConfig, DEFAULT_MIN_SCORE};
use tiltpick_io::LazyTiltSeries;

fn io_error(context: &str, err: impl std::fmt::Display) -> PyErr {
    pyo3::exceptions::PyIOError::new_err(format!("{context}: {err}"))
}

fn value_error(context: &str, err: impl std::fmt::Display) -> PyErr {
    pyo3::exceptions::PyValueError::new_err(format!("{context}: {err}"))
}

fn core_error(context: &str, err: tiltpick_core::Error) -> PyErr {
    match err {
        tiltpick_core::Error::Io(_) => io_error(context, err),
        _ => value_error(context, err),
    }
}

fn read_error(context: &str, err: tiltpick_io::Error) -> PyErr {
    match err {
        tiltpick_io::Error::Io(_) => io_error(context, err),
        tiltpick_io::Error::IndexOutOfBounds { .. } => {
            pyo3::exceptions::PyIndexError::new_err(format!("{context}: {err}"))
        }
        tiltpick_io::Error::CoreError(e) => core_error(context, e),
        _ => value_error(context, err),
    }
}

fn match_config(min_score: f64, strict: bool) -> MatchConfig {
    let policy = if strict {
        LowConfidencePolicy::Reject
    } else {
        LowConfidencePolicy::Warn
    };
    MatchConfig::default()
        .with_min_score(min_score)
        .with_low_confidence(policy)
}

/// Order tilt image files by the tilt angles recorded in an mdoc file.
#[pyfunction]
#[pyo3(signature = (mdoc_file, tilt_image_files, min_score=DEFAULT_MIN_SCORE, strict=false))]
fn get_ordered_tilt_images(
    py: Python<'_>,
    mdoc_file: PathBuf,
    tilt_image_files: Vec<PathBuf>,
    min_score: f64,
    strict: bool,
) -> PyResult<Vec<PathBuf>> {
    let config = match_config(min_score, strict);
    py.allow_threads(|| {
        tiltpick_core::get_ordered_tilt_images_with_config(&mdoc_file, &tilt_image_files, &config)
    })
    .map_err(|e| core_error("get_ordered_tilt_images", e))
}

/// Ordered matches as a list of dicts with z_value, tilt_angle,
/// mdoc_basename, path and score.
#[pyfunction]
#[pyo3(signature = (mdoc_file, tilt_image_files, min_score=DEFAULT_MIN_SCORE, strict=false))]
fn get_ordered_tilt_matches<'py>(
    py: Python<'py>,
    mdoc_file: PathBuf,
    tilt_image_files: Vec<PathBuf>,
    min_score: f64,
    strict: bool,
) -> PyResult<Vec<Bound<'py, PyDict>>> {
    let config = match_config(min_score, strict);
    let matches = py
        .allow_threads(|| {
            tiltpick_core::get_ordered_tilt_matches(&mdoc_file, &tilt_image_files, &config)
        })
        .map_err(|e| core_error("get_ordered_tilt_matches", e))?;

    matches
        .into_iter()
        .map(|m| {
            let dict = PyDict::new(py);
            dict.set_item("z_value", m.z_value)?;
            dict.set_item("tilt_angle", m.tilt_angle)?;
            dict.set_item("mdoc_basename", m.mdoc_basename)?;
            dict.set_item("path", m.path)?;
            dict.set_item("score", m.score)?;
            Ok(dict)
        })
        .collect()
}

/// Shape (nz, ny, nx) of an MRC file, read from its header.
#[pyfunction]
fn get_image_shape(filename: PathBuf) -> PyResult<(usize, usize, usize)> {
    tiltpick_io::get_image_shape(&filename)
        .map_err(|e| read_error(&format!("get_image_shape: {}", filename.display()), e))
}

/// Read the full data block of an MRC file as float32 (nz, ny, nx).
#[pyfunction]
fn read_mrc<'py>(py: Python<'py>, filename: PathBuf) -> PyResult<Bound<'py, PyArray3<f32>>> {
    let data = py
        .allow_threads(|| tiltpick_io::read_mrc(&filename))
        .map_err(|e| read_error(&format!("read_mrc: {}", filename.display()), e))?;
    Ok(data.into_pyarray(py))
}

fn normalise_as<'py, T>(
    py: Python<'py>,
    image: &Bound<'py, PyAny>,
) -> Option<Bound<'py, PyArrayDyn<f32>>>
where
    T: Element + Copy + Into<f64>,
{
    let array = image.extract::<PyReadonlyArrayDyn<'py, T>>().ok()?;
    Some(tiltpick_core::normalise_image(&array.as_array()).into_pyarray(py))
}

/// Subtract the mean and divide by the standard deviation.
///
/// Accepts float32, float64, int8, uint8, int16, uint16, int32 and uint32
/// arrays; the result is always float32.
#[pyfunction]
fn normalise_image<'py>(
    py: Python<'py>,
    image: &Bound<'py, PyAny>,
) -> PyResult<Bound<'py, PyArrayDyn<f32>>> {
    normalise_as::<f32>(py, image)
        .or_else(|| normalise_as::<f64>(py, image))
        .or_else(|| normalise_as::<i16>(py, image))
        .or_else(|| normalise_as::<u16>(py, image))
        .or_else(|| normalise_as::<i8>(py, image))
        .or_else(|| normalise_as::<u8>(py, image))
        .or_else(|| normalise_as::<i32>(py, image))
        .or_else(|| normalise_as::<u32>(py, image))
        .ok_or_else(|| {
            pyo3::exceptions::PyTypeError::new_err(
                "normalise_image: expected a numpy array of a real numeric dtype",
            )
        })
}

/// Python wrapper for a lazily evaluated tilt series.
#[pyclass(name = "LazyTiltSeries", frozen)]
pub struct PyLazyTiltSeries {
    inner: LazyTiltSeries,
}

impl PyLazyTiltSeries {
    fn resolve_index(&self, index: isize) -> PyResult<usize> {
        let len = self.inner.len();
        let resolved = if index < 0 {
            len.checked_sub(index.unsigned_abs())
        } else {
            Some(index.unsigned_abs())
        };
        resolved.filter(|&i| i < len).ok_or_else(|| {
            pyo3::exceptions::PyIndexError::new_err(format!(
                "index {index} out of range for {len} slices"
            ))
        })
    }
}

#[pymethods]
impl PyLazyTiltSeries {
    #[new]
    fn new(py: Python<'_>, files: Vec<PathBuf>) -> PyResult<Self> {
        let inner = py
            .allow_threads(|| tiltpick_io::lazy_tilt_series_from_tilt_images(&files))
            .map_err(|e| read_error("LazyTiltSeries", e))?;
        Ok(Self { inner })
    }

    /// (slices, height, width)
    #[getter]
    fn shape(&self) -> (usize, usize, usize) {
        let [k, h, w] = self.inner.shape();
        (k, h, w)
    }

    #[getter]
    fn dtype(&self) -> &'static str {
        "float32"
    }

    /// Name of the MRC mode of the source files.
    #[getter]
    fn mode(&self) -> &'static str {
        self.inner.mode().name()
    }

    #[getter]
    fn files(&self) -> Vec<PathBuf> {
        self.inner.files().to_vec()
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    /// Read and normalise one slice.
    fn __getitem__<'py>(
        &self,
        py: Python<'py>,
        index: isize,
    ) -> PyResult<Bound<'py, PyArray2<f32>>> {
        let index = self.resolve_index(index)?;
        let slice = py
            .allow_threads(|| self.inner.slice(index))
            .map_err(|e| read_error("LazyTiltSeries.__getitem__", e))?;
        Ok(slice.into_pyarray(py))
    }

    /// Read and normalise every slice into a (slices, height, width) array.
    fn compute<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray3<f32>>> {
        let volume = py
            .allow_threads(|| self.inner.compute())
            .map_err(|e| read_error("LazyTiltSeries.compute", e))?;
        Ok(volume.into_pyarray(py))
    }

    fn __repr__(&self) -> String {
        format!(
            "LazyTiltSeries(shape={:?}, mode={})",
            self.inner.shape(),
            self.inner.mode()
        )
    }
}

/// Build a lazily evaluated, normalised tilt series from ordered files.
#[pyfunction]
fn lazy_tilt_series_from_tilt_images(
    py: Python<'_>,
    files: Vec<PathBuf>,
) -> PyResult<PyLazyTiltSeries> {
    PyLazyTiltSeries::new(py, files)
}

/// Python module for tiltpick.
#[pymodule]
fn tiltpick(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyLazyTiltSeries>()?;
    m.add_function(wrap_pyfunction!(get_ordered_tilt_images, m)?)?;
    m.add_function(wrap_pyfunction!(get_ordered_tilt_matches, m)?)?;
    m.add_function(wrap_pyfunction!(get_image_shape, m)?)?;
    m.add_function(wrap_pyfunction!(read_mrc, m)?)?;
    m.add_function(wrap_pyfunction!(normalise_image, m)?)?;
    m.add_function(wrap_pyfunction!(lazy_tilt_series_from_tilt_images, m)?)?;
    Ok(())
}
