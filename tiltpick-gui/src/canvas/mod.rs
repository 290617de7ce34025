//! The on-screen viewer and image rendering.

mod colormap;
mod texture;

pub use colormap::Colormap;
pub use texture::generate_plane_image;

use tiltpick_viewer::{ImageLayer, LayerId, Viewer};

/// Viewer state rendered by the egui front end.
///
/// Changes made through [`Viewer`] are recorded as flags that the next frame
/// consumes: a redraw regenerates the texture, a view reset refits the plot.
#[derive(Debug, Default)]
pub struct EguiViewer {
    layers: Vec<ImageLayer>,
    /// Index of the displayed plane along the leading axis.
    pub(crate) current_plane: usize,
    /// The texture no longer reflects the layer.
    pub(crate) needs_redraw: bool,
    /// The plot bounds should be refitted on the next frame.
    pub(crate) reset_requested: bool,
}

impl EguiViewer {
    /// Number of planes in the first layer.
    pub(crate) fn n_planes(&self) -> usize {
        self.layers.first().map_or(0, |l| l.data().n_planes())
    }

    /// Moves to `plane`, clamped to the available planes.
    pub(crate) fn set_current_plane(&mut self, plane: usize) {
        let clamped = plane.min(self.n_planes().saturating_sub(1));
        if clamped != self.current_plane {
            self.current_plane = clamped;
            self.needs_redraw = true;
        }
    }
}

impl Viewer for EguiViewer {
    fn add_image(&mut self, layer: ImageLayer) -> LayerId {
        self.layers.push(layer);
        self.needs_redraw = true;
        LayerId(self.layers.len() - 1)
    }

    fn layer(&self, id: LayerId) -> Option<&ImageLayer> {
        self.layers.get(id.0)
    }

    fn layer_mut(&mut self, id: LayerId) -> Option<&mut ImageLayer> {
        self.layers.get_mut(id.0)
    }

    fn layer_data_changed(&mut self, id: LayerId) {
        let n = self.layers.get(id.0).map_or(0, |l| l.data().n_planes());
        // Series are ordered by angle, so the middle plane is nearest zero tilt.
        self.current_plane = n / 2;
        self.needs_redraw = true;
    }

    fn reset_view(&mut self) {
        self.reset_requested = true;
        self.needs_redraw = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use tiltpick_viewer::LayerData;

    #[test]
    fn test_data_change_centres_plane() {
        let mut viewer = EguiViewer::default();
        let id = viewer.add_image(ImageLayer::placeholder());
        viewer.needs_redraw = false;

        let stack = Array3::<f32>::zeros((5, 2, 2)).into_dyn();
        viewer.layer_mut(id).unwrap().set_data(LayerData::from(stack));
        viewer.layer_data_changed(id);
        assert_eq!(viewer.current_plane, 2);
        assert!(viewer.needs_redraw);

        viewer.set_current_plane(99);
        assert_eq!(viewer.current_plane, 4);
    }

    #[test]
    fn test_reset_view_flags() {
        let mut viewer = EguiViewer::default();
        viewer.reset_view();
        assert!(viewer.reset_requested);
        assert!(viewer.needs_redraw);
    }
}
