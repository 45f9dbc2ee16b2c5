//! Desktop GUI for the face symmetry analyzer.

use eframe::NativeOptions;
use facesym_core::APP_TITLE;
use facesym_gui::FaceSymApp;
use facesym_utils::init_logging;
use log::warn;

/// Main entry point for the GUI application.
fn main() -> eframe::Result<()> {
    if let Err(err) = init_logging(log::LevelFilter::Info) {
        eprintln!("failed to initialize logging: {err:#}");
    }
    let mut options = NativeOptions::default();
    options.viewport = options
        .viewport
        .with_title(APP_TITLE)
        .with_inner_size([960.0, 760.0])
        .with_drag_and_drop(true);

    let result = eframe::run_native(
        APP_TITLE,
        options,
        Box::new(|cc| Ok(Box::new(FaceSymApp::new(cc)))),
    );
    if let Err(err) = &result {
        warn!("GUI exited with an error: {err}");
    }
    result
}
