//! Main application state and logic.
//!
//! Contains the `TiltPickApp` struct which owns the selector, the rendered
//! slice texture and the display settings.

use std::path::PathBuf;

use eframe::egui;
use ndarray::Array2;

use crate::canvas::{generate_plane_image, Colormap, EguiViewer};
use crate::startup::StartupFiles;
use tiltpick_core::{LowConfidencePolicy, MatchConfig};
use tiltpick_viewer::{ImageLayer, Selector, Viewer};

/// Main application state.
pub struct TiltPickApp {
    /// Selection state bound to the on-screen viewer.
    pub(crate) selector: Selector<EguiViewer>,

    /// Minimum filename match score (0-100).
    pub(crate) min_score: f64,
    /// Refuse low-confidence matches instead of warning.
    pub(crate) strict: bool,

    /// Currently displayed plane, kept for cursor readout.
    pub(crate) plane: Option<Array2<f32>>,
    /// Current cursor info (column, row, value).
    pub(crate) cursor_info: Option<(usize, usize, f32)>,

    /// Status line shown under the controls.
    pub(crate) status_text: String,

    /// Cached slice texture.
    pub(crate) texture: Option<egui::TextureHandle>,
    /// Current colormap selection.
    pub(crate) colormap: Colormap,
}

impl Default for TiltPickApp {
    fn default() -> Self {
        let config = MatchConfig::default();
        Self {
            min_score: config.min_score,
            strict: config.low_confidence == LowConfidencePolicy::Reject,
            selector: Selector::new(EguiViewer::default()).with_match_config(config),
            plane: None,
            cursor_info: None,
            status_text: "Add metadata documents and tilt images".to_string(),
            texture: None,
            colormap: Colormap::default(),
        }
    }
}

impl TiltPickApp {
    /// Append metadata documents to the selectable list.
    pub fn add_mdoc_files(&mut self, paths: Vec<PathBuf>) {
        let list = self.selector.mdoc_files_mut();
        for path in paths {
            if !list.iter().any(|p| p == &path) {
                list.push(path);
            }
        }
    }

    /// Apply files given on the command line.
    pub fn open_startup_files(&mut self, files: StartupFiles) {
        if !files.tilt_images.is_empty() {
            self.set_tilt_images(files.tilt_images);
        }
        self.add_mdoc_files(files.mdoc_files);
    }

    /// Remove the selected metadata document from the list.
    pub fn remove_selected_mdoc(&mut self) {
        let list = self.selector.mdoc_files_mut();
        if let Some(index) = list.active_index() {
            list.remove(index);
        }
    }

    /// Replace the candidate tilt images.
    pub fn set_tilt_images(&mut self, mut paths: Vec<PathBuf>) {
        paths.sort();
        self.status_text = format!("{} tilt images available", paths.len());
        self.selector.set_tilt_image_files(paths);
    }

    /// Push the match settings from the controls into the selector.
    pub fn apply_match_settings(&mut self) {
        let policy = if self.strict {
            LowConfidencePolicy::Reject
        } else {
            LowConfidencePolicy::Warn
        };
        self.selector.set_match_config(
            MatchConfig::default()
                .with_min_score(self.min_score)
                .with_low_confidence(policy),
        );
    }

    /// Select metadata document `index` and display its tilt series.
    pub fn select_mdoc(&mut self, index: usize) {
        self.selector.mdoc_files_mut().select(index);
        let name = self
            .selector
            .mdoc_files()
            .active()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        let result = self
            .selector
            .load_selected()
            .and_then(|()| self.selector.reset_display());
        match result {
            Ok(()) => {
                let n = self.selector.viewer().n_planes();
                self.status_text = format!("Loaded {n} tilts from {name}");
            }
            Err(e) => {
                log::error!("failed to load {name}: {e}");
                self.status_text = format!("Error: {e}");
            }
        }
    }

    /// The displayed image layer, for contrast edits.
    pub(crate) fn image_layer_mut(&mut self) -> Option<&mut ImageLayer> {
        let id = self.selector.image_layer_id();
        self.selector.viewer_mut().layer_mut(id)
    }

    /// Regenerate the slice texture if the viewer state changed.
    pub fn refresh_texture(&mut self, ctx: &egui::Context) {
        let viewer = self.selector.viewer_mut();
        if !viewer.needs_redraw {
            return;
        }
        viewer.needs_redraw = false;
        let index = viewer.current_plane;

        let layer = match self.selector.image_layer() {
            Ok(layer) => layer,
            Err(e) => {
                self.status_text = format!("Error: {e}");
                return;
            }
        };
        match layer.data().plane(index) {
            Ok(plane) => {
                let img = generate_plane_image(plane.view(), layer.contrast_limits, self.colormap);
                self.texture = Some(ctx.load_texture("slice", img, egui::TextureOptions::NEAREST));
                self.plane = Some(plane);
            }
            Err(e) => {
                log::error!("failed to evaluate slice {index}: {e}");
                self.status_text = format!("Error: {e}");
                self.texture = None;
                self.plane = None;
            }
        }
    }
}

impl eframe::App for TiltPickApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.refresh_texture(ctx);
        self.render_side_panel(ctx);
        self.render_central_panel(ctx);
    }
}
