//! tiltpick GUI application entry point.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod canvas;
mod startup;
mod ui;
mod util;

use app::TiltPickApp;
use eframe::egui;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut app = TiltPickApp::default();
    match startup::files_from_args(std::env::args_os().skip(1)) {
        Ok(files) => app.open_startup_files(files),
        Err(e) => log::error!("{e:#}"),
    }

    let opts = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native("tiltpick", opts, Box::new(|_cc| Ok(Box::new(app))))
}
