#![windows_subsystem = "windows"]

use eframe::egui;
use mapfe::app::MapFEApp;
use mapfe::logger;

fn main() -> Result<(), eframe::Error> {
    // Session log (overwrites the previous session's file)
    logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 720.0])
            .with_title("MapFE"),
        ..Default::default()
    };

    eframe::run_native(
        "MapFE",
        options,
        Box::new(|cc| Box::new(MapFEApp::new(cc))),
    )
}
