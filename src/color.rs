use std::collections::BTreeMap;

use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

/// 8-bit sRGB triple shared by the egui and PNG renderers.
pub type Rgb = [u8; 3];

/// Fill for cells whose value is undefined.
pub const UNDEFINED: Rgb = [200, 200, 200];

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Rgb> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            to_rgb(hsl.into_color())
        })
        .collect()
}

fn to_rgb(rgb: Srgb) -> Rgb {
    let c: Srgb<u8> = rgb.into_format();
    [c.red, c.green, c.blue]
}

/// Cool-warm diverging colour for a correlation in `[-1, 1]`.
///
/// -1 maps to blue, 0 to near-white, +1 to red. Values outside the range are
/// clamped.
pub fn diverging(value: f64) -> Rgb {
    let cool: LinSrgb = Srgb::new(0.23f32, 0.30, 0.75).into_linear();
    let mid: LinSrgb = Srgb::new(0.87f32, 0.87, 0.87).into_linear();
    let warm: LinSrgb = Srgb::new(0.71f32, 0.02, 0.15).into_linear();

    let t = value.clamp(-1.0, 1.0) as f32;
    let mixed = if t < 0.0 { mid.mix(cool, -t) } else { mid.mix(warm, t) };
    to_rgb(Srgb::from_linear(mixed))
}

// ---------------------------------------------------------------------------
// Color mapping: category label → colour
// ---------------------------------------------------------------------------

/// Maps category labels (hotel types, customer types) to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Rgb>,
    default_color: Rgb,
}

impl ColorMap {
    /// Build a colour map, assigning hues in the order labels are given.
    pub fn new<S: AsRef<str>>(labels: &[S]) -> Self {
        let palette = generate_palette(labels.len());
        let mapping = labels
            .iter()
            .zip(palette)
            .map(|(label, c)| (label.as_ref().to_string(), c))
            .collect();

        ColorMap {
            mapping,
            default_color: [128, 128, 128],
        }
    }

    /// Look up the colour for a label; unknown labels are grey.
    pub fn color_for(&self, label: &str) -> Rgb {
        self.mapping.get(label).copied().unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_colours_are_distinct() {
        let colours = generate_palette(5);
        assert_eq!(colours.len(), 5);
        for (i, a) in colours.iter().enumerate() {
            for b in &colours[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn diverging_endpoints() {
        let cold = diverging(-1.0);
        let hot = diverging(1.0);
        assert!(cold[2] > cold[0], "negative correlation is blue: {cold:?}");
        assert!(hot[0] > hot[2], "positive correlation is red: {hot:?}");
        assert_eq!(diverging(5.0), hot);
    }

    #[test]
    fn unknown_label_is_grey() {
        let map = ColorMap::new(&["City Hotel", "Resort Hotel"]);
        assert_ne!(map.color_for("City Hotel"), map.color_for("Resort Hotel"));
        assert_eq!(map.color_for("Hostel"), [128, 128, 128]);
    }
}
