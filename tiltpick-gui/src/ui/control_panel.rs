//! Control panel (left sidebar) rendering.

use std::path::Path;

use eframe::egui;

use crate::app::TiltPickApp;
use crate::canvas::Colormap;

fn file_label(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |n| n.to_string_lossy().into_owned(),
    )
}

impl TiltPickApp {
    /// Render the left side panel with file selection and display controls.
    pub(crate) fn render_side_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("controls")
            .min_width(280.0)
            .show(ctx, |ui| {
                ui.heading("tiltpick");
                ui.separator();

                self.render_mdoc_section(ui);
                ui.separator();
                self.render_tilt_image_section(ui);
                ui.separator();
                self.render_matching_section(ui);
                ui.separator();
                self.render_display_section(ui);
                ui.separator();

                ui.label(&self.status_text);
                if let Some((x, y, v)) = self.cursor_info {
                    ui.monospace(format!("x {x:>4}  y {y:>4}  value {v:>9.3}"));
                }
            });
    }

    fn render_mdoc_section(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Metadata documents").strong());
        ui.horizontal(|ui| {
            if ui.button("Add...").clicked() {
                if let Some(paths) = rfd::FileDialog::new()
                    .add_filter("SerialEM metadata", &["mdoc"])
                    .pick_files()
                {
                    self.add_mdoc_files(paths);
                }
            }
            let has_selection = self.selector.mdoc_files().active_index().is_some();
            if ui
                .add_enabled(has_selection, egui::Button::new("Remove"))
                .clicked()
            {
                self.remove_selected_mdoc();
            }
        });

        let mut clicked = None;
        egui::ScrollArea::vertical()
            .max_height(220.0)
            .show(ui, |ui| {
                let list = self.selector.mdoc_files();
                for (i, path) in list.iter().enumerate() {
                    let selected = list.active_index() == Some(i);
                    if ui
                        .selectable_label(selected, file_label(path))
                        .on_hover_text(path.display().to_string())
                        .clicked()
                    {
                        clicked = Some(i);
                    }
                }
            });
        if let Some(i) = clicked {
            self.select_mdoc(i);
        }
    }

    fn render_tilt_image_section(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Tilt images").strong());
        ui.horizontal(|ui| {
            if ui.button("Choose...").clicked() {
                if let Some(paths) = rfd::FileDialog::new()
                    .add_filter("MRC image", &["mrc", "mrcs"])
                    .pick_files()
                {
                    self.set_tilt_images(paths);
                }
            }
            ui.label(format!(
                "{} files",
                self.selector.tilt_image_files().len()
            ));
        });
        if let Some(first) = self.selector.tilt_image_files().first() {
            if let Some(dir) = first.parent() {
                ui.small(dir.display().to_string());
            }
        }
    }

    fn render_matching_section(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Matching").strong());
        let mut changed = false;
        ui.horizontal(|ui| {
            ui.label("Minimum score");
            changed |= ui
                .add(egui::DragValue::new(&mut self.min_score).range(0.0..=100.0))
                .changed();
        });
        changed |= ui
            .checkbox(&mut self.strict, "Reject low-confidence matches")
            .changed();
        if changed {
            self.apply_match_settings();
        }
    }

    fn render_display_section(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Display").strong());

        let n_planes = self.selector.viewer().n_planes();
        if n_planes > 1 {
            let mut plane = self.selector.viewer().current_plane;
            if ui
                .add(egui::Slider::new(&mut plane, 0..=n_planes - 1).text("Tilt index"))
                .changed()
            {
                self.selector.viewer_mut().set_current_plane(plane);
            }
        }

        let mut redraw = false;
        if let Some(layer) = self.image_layer_mut() {
            let (lo, hi) = layer.contrast_limits_range;
            let (mut min, mut max) = layer.contrast_limits;
            redraw |= ui
                .add(egui::Slider::new(&mut min, lo..=hi).text("Contrast min"))
                .changed();
            redraw |= ui
                .add(egui::Slider::new(&mut max, lo..=hi).text("Contrast max"))
                .changed();
            layer.contrast_limits = (min.min(max), max.max(min));
        }

        let previous = self.colormap;
        egui::ComboBox::from_label("Colormap")
            .selected_text(self.colormap.to_string())
            .show_ui(ui, |ui| {
                for cmap in Colormap::ALL {
                    ui.selectable_value(&mut self.colormap, cmap, cmap.to_string());
                }
            });
        redraw |= previous != self.colormap;

        if ui.button("Reset display").clicked() {
            if let Err(e) = self.selector.reset_display() {
                self.status_text = format!("Error: {e}");
            }
        }

        if redraw {
            self.selector.viewer_mut().needs_redraw = true;
        }
    }
}
