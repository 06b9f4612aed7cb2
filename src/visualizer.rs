// src/visualizer.rs
use crate::config::DisplayConfig;
use eframe::egui::{Color32, ColorImage};
use ndarray::Array2;
// Viridis control points, evenly spaced from low to high power
const VIRIDIS: [[u8; 3]; 11] = [
    [68, 1, 84],
    [72, 35, 116],
    [64, 67, 135],
    [52, 94, 141],
    [41, 120, 142],
    [32, 144, 140],
    [34, 167, 132],
    [68, 190, 112],
    [121, 209, 81],
    [189, 222, 38],
    [253, 231, 36],
];
/// Linear interpolation through the viridis control points; `t` is clamped to 0..=1.
pub fn viridis(t: f64) -> Color32 {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (VIRIDIS.len() - 1) as f64;
    let lo = scaled.floor() as usize;
    let hi = (lo + 1).min(VIRIDIS.len() - 1);
    let frac = scaled - lo as f64;
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    let (a, b) = (VIRIDIS[lo], VIRIDIS[hi]);
    Color32::from_rgb(mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2]))
}
/// Maps one power cell onto the colormap; cells without data stay transparent.
pub fn power_color(power_db: f64, display: &DisplayConfig) -> Color32 {
    if power_db.is_nan() {
        return Color32::TRANSPARENT;
    }
    let span = display.power_max_db - display.power_min_db;
    viridis((power_db - display.power_min_db) / span)
}
/// Waterfall snapshot as an image, newest row on top. `None` until any row has data.
pub fn waterfall_image(snapshot: &Array2<f64>, display: &DisplayConfig) -> Option<ColorImage> {
    let (rows, cols) = snapshot.dim();
    if rows == 0 || cols == 0 {
        return None;
    }
    let pixels = snapshot
        .iter()
        .map(|value| power_color(*value, display))
        .collect();
    Some(ColorImage {
        size: [cols, rows],
        pixels,
    })
}
