#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod context;
mod helpers;
mod modules;
mod theme;

use duoscope_core::duoscope_log;

fn main() -> eframe::Result {
    if let Err(e) = ffmpeg_the_third::init() {
        duoscope_log!("[app] FFmpeg init failed: {e}");
        std::process::exit(1);
    }

    // Optional first argument: a ReviewConfig JSON file overriding the saved settings.
    let config_path = std::env::args_os().nth(1).map(std::path::PathBuf::from);

    let native_options = eframe::NativeOptions {
        centered: true,
        viewport: egui::ViewportBuilder::default()
            .with_title("duoscope")
            .with_inner_size([1440.0, 900.0])
            .with_min_inner_size([900.0, 600.0])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "duoscope",
        native_options,
        Box::new(move |cc| Ok(Box::new(app::DuoscopeApp::new(cc, config_path)))),
    )
}
