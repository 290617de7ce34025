//! Image layers and the data they display.

use crate::Result;
use ndarray::{array, Array2, ArrayD, Axis, Ix2};
use tiltpick_io::LazyTiltSeries;

/// Handle to a layer held by a viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(pub usize);

/// Data shown by an image layer.
#[derive(Debug, Clone)]
pub enum LayerData {
    /// An in-memory 2-D image or 3-D stack.
    Array(ArrayD<f32>),
    /// A tilt series evaluated one slice at a time.
    TiltSeries(LazyTiltSeries),
}

impl LayerData {
    /// Shape of the data, slowest axis first.
    #[must_use]
    pub fn shape(&self) -> Vec<usize> {
        match self {
            Self::Array(a) => a.shape().to_vec(),
            Self::TiltSeries(s) => s.shape().to_vec(),
        }
    }

    /// Number of 2-D planes: 1 for an image, the leading axis for a stack.
    #[must_use]
    pub fn n_planes(&self) -> usize {
        match self {
            Self::Array(a) if a.ndim() == 3 => a.shape()[0],
            Self::Array(a) if a.ndim() == 2 => 1,
            Self::Array(_) => 0,
            Self::TiltSeries(s) => s.len(),
        }
    }

    /// Evaluates plane `index` for display.
    ///
    /// # Errors
    /// Returns [`tiltpick_io::Error::IndexOutOfBounds`] for a plane that does
    /// not exist, or the error raised while evaluating a tilt-series slice.
    pub fn plane(&self, index: usize) -> Result<Array2<f32>> {
        let len = self.n_planes();
        if index >= len {
            return Err(tiltpick_io::Error::IndexOutOfBounds { index, len }.into());
        }
        match self {
            Self::TiltSeries(s) => Ok(s.slice(index)?),
            Self::Array(a) => {
                let view = if a.ndim() == 3 {
                    a.index_axis(Axis(0), index)
                } else {
                    a.view()
                };
                Ok(view
                    .into_dimensionality::<Ix2>()
                    .map_err(tiltpick_io::Error::from)?
                    .to_owned())
            }
        }
    }

    /// Minimum and maximum of in-memory data; `None` for lazy data.
    #[must_use]
    pub fn value_range(&self) -> Option<(f32, f32)> {
        match self {
            Self::Array(a) if !a.is_empty() => {
                let min = a.iter().copied().fold(f32::INFINITY, f32::min);
                let max = a.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                Some((min, max))
            }
            _ => None,
        }
    }
}

/// An image layer: data plus display contrast settings.
#[derive(Debug, Clone)]
pub struct ImageLayer {
    /// Display name.
    pub name: String,
    data: LayerData,
    /// Values mapped to black and white.
    pub contrast_limits: (f32, f32),
    /// Range the contrast limits may be adjusted within.
    pub contrast_limits_range: (f32, f32),
}

impl ImageLayer {
    /// Creates a layer, deriving contrast from in-memory data.
    #[must_use]
    pub fn new(name: impl Into<String>, data: LayerData) -> Self {
        let range = data.value_range().unwrap_or((0.0, 1.0));
        Self {
            name: name.into(),
            data,
            contrast_limits: range,
            contrast_limits_range: range,
        }
    }

    /// A 3x3 checkerboard shown before any tilt series is loaded.
    #[must_use]
    pub fn placeholder() -> Self {
        let data = array![[1.0f32, 0.0, 1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 1.0]];
        Self::new("tilt series", LayerData::Array(data.into_dyn()))
    }

    /// The displayed data.
    #[must_use]
    pub fn data(&self) -> &LayerData {
        &self.data
    }

    /// Replaces the displayed data.
    ///
    /// In-memory data resets the contrast range to its values. Lazy data is
    /// not evaluated, so the current contrast settings are kept.
    pub fn set_data(&mut self, data: LayerData) {
        if let Some(range) = data.value_range() {
            self.contrast_limits_range = range;
            self.contrast_limits = range;
        }
        self.data = data;
    }

    /// Sets the contrast limits to span the full contrast range.
    pub fn reset_contrast_limits(&mut self) {
        self.contrast_limits = self.contrast_limits_range;
    }
}

impl From<LazyTiltSeries> for LayerData {
    fn from(series: LazyTiltSeries) -> Self {
        Self::TiltSeries(series)
    }
}

impl From<ArrayD<f32>> for LayerData {
    fn from(array: ArrayD<f32>) -> Self {
        Self::Array(array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_placeholder() {
        let layer = ImageLayer::placeholder();
        assert_eq!(layer.data().shape(), vec![3, 3]);
        assert_eq!(layer.data().n_planes(), 1);
        assert_eq!(layer.contrast_limits, (0.0, 1.0));
        let plane = layer.data().plane(0).unwrap();
        assert_eq!(plane[[1, 1]], 1.0);
        assert_eq!(plane[[0, 1]], 0.0);
        assert!(layer.data().plane(1).is_err());
    }

    #[test]
    fn test_stack_planes() {
        let stack = Array3::from_shape_fn((2, 2, 2), |(z, y, x)| (z * 4 + y * 2 + x) as f32);
        let data = LayerData::from(stack.into_dyn());
        assert_eq!(data.n_planes(), 2);
        assert_eq!(data.plane(1).unwrap()[[0, 0]], 4.0);
        assert_eq!(data.value_range(), Some((0.0, 7.0)));
    }

    #[test]
    fn test_set_data_updates_contrast_for_arrays() {
        let mut layer = ImageLayer::placeholder();
        layer.contrast_limits = (0.2, 0.8);
        let image = ndarray::Array2::from_elem((2, 2), 5.0f32);
        layer.set_data(LayerData::from(image.into_dyn()));
        assert_eq!(layer.contrast_limits, (5.0, 5.0));

        layer.contrast_limits_range = (-2.0, 2.0);
        layer.reset_contrast_limits();
        assert_eq!(layer.contrast_limits, (-2.0, 2.0));
    }
}
