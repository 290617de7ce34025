//! Binding between user-chosen files and the viewer's displayed tilt series.

use crate::layer::{ImageLayer, LayerData, LayerId};
use crate::list::SelectableList;
use crate::viewer::Viewer;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tiltpick_core::{get_ordered_tilt_images_with_config, MatchConfig};
use tiltpick_io::lazy_tilt_series_from_tilt_images;

/// Contrast range applied by [`Selector::reset_display`]; slices are
/// z-score normalized, so this spans two standard deviations.
pub const NORMALISED_CONTRAST_RANGE: (f32, f32) = (-2.0, 2.0);

/// Holds the metadata documents and candidate images a user has chosen and
/// loads the selected tilt series into a viewer layer.
#[derive(Debug)]
pub struct Selector<V: Viewer> {
    mdoc_files: SelectableList<PathBuf>,
    tilt_image_files: Vec<PathBuf>,
    viewer: V,
    image_layer: LayerId,
    match_config: MatchConfig,
}

impl<V: Viewer> Selector<V> {
    /// Creates a selector, adding a placeholder image layer to `viewer`.
    pub fn new(mut viewer: V) -> Self {
        let image_layer = viewer.add_image(ImageLayer::placeholder());
        Self {
            mdoc_files: SelectableList::default(),
            tilt_image_files: Vec::new(),
            viewer,
            image_layer,
            match_config: MatchConfig::default(),
        }
    }

    /// Sets the configuration used to match metadata to image files.
    #[must_use]
    pub fn with_match_config(mut self, config: MatchConfig) -> Self {
        self.match_config = config;
        self
    }

    /// Configuration used to match metadata to image files.
    #[must_use]
    pub fn match_config(&self) -> &MatchConfig {
        &self.match_config
    }

    /// Replaces the match configuration used by later loads.
    pub fn set_match_config(&mut self, config: MatchConfig) {
        self.match_config = config;
    }

    /// Metadata documents available for loading.
    #[must_use]
    pub fn mdoc_files(&self) -> &SelectableList<PathBuf> {
        &self.mdoc_files
    }

    /// Metadata documents, for selection and editing.
    pub fn mdoc_files_mut(&mut self) -> &mut SelectableList<PathBuf> {
        &mut self.mdoc_files
    }

    /// Replaces the metadata documents with a fresh, unselected list.
    pub fn set_mdoc_files(&mut self, files: Vec<PathBuf>) {
        self.mdoc_files = SelectableList::new(files);
    }

    /// Candidate tilt image files.
    #[must_use]
    pub fn tilt_image_files(&self) -> &[PathBuf] {
        &self.tilt_image_files
    }

    /// Replaces the candidate tilt image files.
    pub fn set_tilt_image_files(&mut self, files: Vec<PathBuf>) {
        self.tilt_image_files = files;
    }

    /// The viewer being displayed into.
    #[must_use]
    pub fn viewer(&self) -> &V {
        &self.viewer
    }

    /// The viewer, for front-end state changes.
    pub fn viewer_mut(&mut self) -> &mut V {
        &mut self.viewer
    }

    /// Handle of the displayed image layer.
    #[must_use]
    pub fn image_layer_id(&self) -> LayerId {
        self.image_layer
    }

    /// The displayed image layer.
    ///
    /// # Errors
    /// Returns [`Error::UnknownLayer`] if the viewer dropped the layer.
    pub fn image_layer(&self) -> Result<&ImageLayer> {
        self.viewer
            .layer(self.image_layer)
            .ok_or(Error::UnknownLayer(self.image_layer))
    }

    fn image_layer_mut(&mut self) -> Result<&mut ImageLayer> {
        let id = self.image_layer;
        self.viewer.layer_mut(id).ok_or(Error::UnknownLayer(id))
    }

    /// Orders the candidate images by the tilt angles in `mdoc_file` and
    /// displays them as a lazily evaluated tilt series.
    ///
    /// The layer is only modified once the series has been built; on error
    /// the previous data stays displayed.
    ///
    /// # Errors
    /// Returns an error if the document cannot be read, matching fails, or
    /// the first ordered image cannot be read.
    pub fn load_tilt_series<P: AsRef<Path>>(&mut self, mdoc_file: P) -> Result<()> {
        let mdoc_file = mdoc_file.as_ref();
        let ordered = get_ordered_tilt_images_with_config(
            mdoc_file,
            &self.tilt_image_files,
            &self.match_config,
        )?;
        let series = lazy_tilt_series_from_tilt_images(&ordered)?;
        log::info!(
            "loaded {} as {:?} tilt series",
            mdoc_file.display(),
            series.shape()
        );

        self.image_layer_mut()?.set_data(LayerData::TiltSeries(series));
        self.viewer.layer_data_changed(self.image_layer);
        Ok(())
    }

    /// Loads the active entry of [`Self::mdoc_files`].
    ///
    /// # Errors
    /// Returns [`Error::NothingSelected`] if no entry is active, otherwise as
    /// [`Self::load_tilt_series`].
    pub fn load_selected(&mut self) -> Result<()> {
        let mdoc_file = self.mdoc_files.active().cloned().ok_or(Error::NothingSelected)?;
        self.load_tilt_series(mdoc_file)
    }

    /// Applies the display settings for normalized data: contrast range
    /// [`NORMALISED_CONTRAST_RANGE`], contrast limits reset to it, and a
    /// view reset.
    ///
    /// # Errors
    /// Returns [`Error::UnknownLayer`] if the viewer dropped the layer.
    pub fn reset_display(&mut self) -> Result<()> {
        let layer = self.image_layer_mut()?;
        layer.contrast_limits_range = NORMALISED_CONTRAST_RANGE;
        layer.reset_contrast_limits();
        self.viewer.reset_view();
        Ok(())
    }
}
