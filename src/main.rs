mod app;
mod state;
mod ui;

use app::BookingDashboardApp;
use booking_dashboard::config::PipelineConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = PipelineConfig::from_env().unwrap_or_else(|e| {
        log::error!("{e}; falling back to default settings");
        PipelineConfig::default()
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Booking Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(BookingDashboardApp::new(config)))),
    )
}
