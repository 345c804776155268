use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

use crate::analysis::scores::ConfusionCell;

// ---------------------------------------------------------------------------
// Diverging colour scale for the decision contour
// ---------------------------------------------------------------------------

/// Nine-stop red → white → blue diverging scale (RdBu).
const RD_BU: [(u8, u8, u8); 9] = [
    (178, 24, 43),
    (214, 96, 77),
    (244, 165, 130),
    (253, 219, 199),
    (247, 247, 247),
    (209, 229, 240),
    (146, 197, 222),
    (67, 147, 195),
    (33, 102, 172),
];

/// Colour at position `t ∈ [0, 1]` of the diverging scale, interpolated in
/// linear RGB between neighbouring stops.
pub fn diverging(t: f64) -> Color32 {
    let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) };
    let pos = t * (RD_BU.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(RD_BU.len() - 1);
    let frac = (pos - lo as f64) as f32;

    let mixed = linear(RD_BU[lo]).mix(linear(RD_BU[hi]), frac);
    let rgb: Srgb = Srgb::from_linear(mixed);
    to_color32(rgb)
}

/// Apply an opacity in `[0, 1]`.
pub fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let [r, g, b, _] = color.to_array();
    Color32::from_rgba_unmultiplied(r, g, b, (opacity.clamp(0.0, 1.0) * 255.0) as u8)
}

fn linear((r, g, b): (u8, u8, u8)) -> LinSrgb {
    Srgb::new(r, g, b).into_format::<f32>().into_linear()
}

fn to_color32(rgb: Srgb) -> Color32 {
    Color32::from_rgb(
        (rgb.red * 255.0).round() as u8,
        (rgb.green * 255.0).round() as u8,
        (rgb.blue * 255.0).round() as u8,
    )
}

// ---------------------------------------------------------------------------
// Fixed colours
// ---------------------------------------------------------------------------

/// Marker colour of a class label: 0 red, 1 blue.
pub fn class_color(label: u8) -> Color32 {
    if label == 0 {
        Color32::from_rgb(0xFF, 0x00, 0x00)
    } else {
        Color32::from_rgb(0x00, 0x00, 0xFF)
    }
}

/// Threshold contour line colour.
pub const THRESHOLD_LINE: Color32 = Color32::from_rgb(0x22, 0x22, 0x22);

/// Pie slice colours: blues for positives-as-truth, reds for negatives.
pub fn confusion_color(cell: ConfusionCell) -> Color32 {
    match cell {
        ConfusionCell::TruePositive => Color32::from_rgb(107, 174, 214),
        ConfusionCell::FalseNegative => Color32::from_rgb(8, 81, 156),
        ConfusionCell::FalsePositive => Color32::from_rgb(165, 15, 21),
        ConfusionCell::TrueNegative => Color32::from_rgb(251, 106, 74),
    }
}

// ---------------------------------------------------------------------------
// Categorical palette for subjects
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.65, 0.5);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diverging_scale_hits_its_stops() {
        assert_eq!(diverging(0.0), Color32::from_rgb(178, 24, 43));
        assert_eq!(diverging(0.5), Color32::from_rgb(247, 247, 247));
        assert_eq!(diverging(1.0), Color32::from_rgb(33, 102, 172));
    }

    #[test]
    fn diverging_scale_clamps() {
        assert_eq!(diverging(-3.0), diverging(0.0));
        assert_eq!(diverging(7.0), diverging(1.0));
        assert_eq!(diverging(f64::NAN), diverging(0.5));
    }

    #[test]
    fn palette_size_matches_request() {
        assert!(generate_palette(0).is_empty());
        let p = generate_palette(5);
        assert_eq!(p.len(), 5);
        assert_ne!(p[0], p[1]);
    }
}
