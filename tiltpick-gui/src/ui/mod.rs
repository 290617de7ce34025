//! UI rendering modules.
//!
//! - `control_panel`: Left sidebar with file lists and display controls
//! - `main_view`: Central panel with the current slice

mod control_panel;
mod main_view;
