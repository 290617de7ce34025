//! The viewer a selector displays into.

use crate::layer::{ImageLayer, LayerId};

/// A display surface holding image layers.
///
/// The selector talks to the viewer only through this trait, so the same
/// selection logic drives the desktop GUI, the command line and tests.
pub trait Viewer {
    /// Adds a layer and returns its handle.
    fn add_image(&mut self, layer: ImageLayer) -> LayerId;

    /// Looks up a layer.
    fn layer(&self, id: LayerId) -> Option<&ImageLayer>;

    /// Looks up a layer for modification.
    fn layer_mut(&mut self, id: LayerId) -> Option<&mut ImageLayer>;

    /// Called after a layer's data has been replaced.
    fn layer_data_changed(&mut self, _id: LayerId) {}

    /// Fits the view to the current layers.
    fn reset_view(&mut self);
}

/// A viewer with no display, recording the calls made on it.
#[derive(Debug, Default)]
pub struct HeadlessViewer {
    layers: Vec<ImageLayer>,
    /// Number of [`Viewer::reset_view`] calls.
    pub view_resets: usize,
    /// Number of [`Viewer::layer_data_changed`] calls.
    pub data_changes: usize,
}

impl HeadlessViewer {
    /// Creates an empty viewer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All layers, in insertion order.
    #[must_use]
    pub fn layers(&self) -> &[ImageLayer] {
        &self.layers
    }
}

impl Viewer for HeadlessViewer {
    fn add_image(&mut self, layer: ImageLayer) -> LayerId {
        self.layers.push(layer);
        LayerId(self.layers.len() - 1)
    }

    fn layer(&self, id: LayerId) -> Option<&ImageLayer> {
        self.layers.get(id.0)
    }

    fn layer_mut(&mut self, id: LayerId) -> Option<&mut ImageLayer> {
        self.layers.get_mut(id.0)
    }

    fn layer_data_changed(&mut self, _id: LayerId) {
        self.data_changes += 1;
    }

    fn reset_view(&mut self) {
        self.view_resets += 1;
    }
}
