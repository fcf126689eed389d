// GUI-subsystem binary: no console window is ever allocated by Windows.
#![windows_subsystem = "windows"]
#![allow(dead_code)] // API surface kept for planned features (templates, multi-export)
#![allow(clippy::too_many_arguments)]
#![allow(clippy::large_enum_variant)]

#[macro_use]
pub mod logger;
mod app;
mod assets;
mod canvas;
mod components;
mod io;
mod ops;
mod scene;
mod theme;

use app::MemeForgeApp;
use eframe::egui;

fn main() -> Result<(), eframe::Error> {
    // Initialize session log (overwrites previous session log)
    logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([820.0, 560.0])
            .with_title("MemeForge"),
        ..Default::default()
    };

    eframe::run_native(
        "MemeForge",
        options,
        Box::new(|cc| Box::new(MemeForgeApp::new(cc))),
    )
}
