//! Main view (central panel) rendering.

use eframe::egui;
use egui_plot::{Plot, PlotImage, PlotPoint};

use crate::app::TiltPickApp;
use crate::util::{f64_to_usize_bounded, usize_to_f32};

impl TiltPickApp {
    /// Render the central panel with the current slice.
    pub(crate) fn render_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(tex) = &self.texture else {
                ui.centered_and_justified(|ui| ui.label("No Data"));
                return;
            };
            let [width, height] = tex.size();
            let (w, h) = (f64::from(usize_to_f32(width)), f64::from(usize_to_f32(height)));

            let mut plot = Plot::new("slice").data_aspect(1.0);
            let viewer = self.selector.viewer_mut();
            if viewer.reset_requested {
                viewer.reset_requested = false;
                plot = plot.reset();
            }

            let plane = self.plane.as_ref();
            let mut cursor_info = None;
            plot.show(ui, |plot_ui| {
                plot_ui.image(PlotImage::new(
                    tex,
                    PlotPoint::new(w / 2.0, h / 2.0),
                    [usize_to_f32(width), usize_to_f32(height)],
                ));

                // Row 0 is drawn at the top of the image.
                if let Some(curr) = plot_ui.pointer_coordinate() {
                    if let (Some(col), Some(row), Some(plane)) = (
                        f64_to_usize_bounded(curr.x, width),
                        f64_to_usize_bounded(h - curr.y, height),
                        plane,
                    ) {
                        cursor_info = plane.get((row, col)).map(|&v| (col, row, v));
                    }
                }
            });
            self.cursor_info = cursor_info;
        });
    }
}
