//! Photometric mapping: magnitude to marker size, B−V to display color.

pub type Rgb = [f64; 3];

pub const BLUE: Rgb = [0.0, 0.0, 1.0];
pub const BLUE_WHITE: Rgb = [0.5, 0.5, 1.0];
pub const WHITE: Rgb = [1.0, 1.0, 1.0];
pub const YELLOW_WHITE: Rgb = [1.0, 1.0, 0.5];
pub const YELLOW: Rgb = [1.0, 1.0, 0.0];
pub const ORANGE: Rgb = [1.0, 0.5, 0.0];
pub const RED: Rgb = [1.0, 0.0, 0.0];

/// Smallest marker size, reached at magnitude 5.
pub const MIN_MARKER_SIZE: f64 = 0.1;

/// Map a B−V color index to RGB.
///
/// Bins are closed on the upper end: `(−0.30, 0.0]` is blue-white,
/// `(1.0, 1.5]` orange, and so on. NaN falls through to red.
pub fn bv_to_rgb(bv: f64) -> Rgb {
    if bv <= -0.30 {
        BLUE
    } else if bv <= 0.0 {
        BLUE_WHITE
    } else if bv <= 0.30 {
        WHITE
    } else if bv <= 0.60 {
        YELLOW_WHITE
    } else if bv <= 1.0 {
        YELLOW
    } else if bv <= 1.5 {
        ORANGE
    } else {
        RED
    }
}

/// Color of a star whose index may be missing. Missing maps to red.
pub fn star_rgb(color_index: Option<f64>) -> Rgb {
    color_index.map_or(RED, bv_to_rgb)
}

/// Linear magnitude → marker size fit, floored at [`MIN_MARKER_SIZE`].
pub fn magnitude_to_size(magnitude: f64) -> f64 {
    (-4.975 * magnitude + 24.975).max(MIN_MARKER_SIZE)
}
