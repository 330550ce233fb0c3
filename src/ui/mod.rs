use eframe::egui::Color32;

use booking_dashboard::color::Rgb;

pub mod panels;
pub mod plot;
pub mod table;

pub fn color32([r, g, b]: Rgb) -> Color32 {
    Color32::from_rgb(r, g, b)
}
