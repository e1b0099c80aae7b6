/// Colouring of fractal output.
///
/// Escape-time pixels are coloured from the fraction `iterations / limit`
/// through a [`Palette`]; points that never escape get the interior colour.

pub mod gradient;
pub mod hue;

use serde::{Deserialize, Serialize};

use crate::engine::types::Color;
use gradient::ColorGradient;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Palette {
    /// Fully saturated hue of the escape fraction.
    #[default]
    Hue,
    Gradient { gradient: ColorGradient },
}

impl Palette {
    /// Colour for a point that escaped after `iterations` out of `limit`.
    pub fn escape_color(&self, iterations: u32, limit: u32) -> Color {
        let t = if limit == 0 { 0.0 } else { iterations as f64 / limit as f64 };
        match self {
            Palette::Hue => Color(hue::fully_saturated_hue_to_hex(t)),
            Palette::Gradient { gradient } => Color(gradient.sample_hex(t)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hue_palette_matches_hue_fn() {
        let c = Palette::Hue.escape_color(10, 80);
        assert_eq!(c.as_str(), hue::fully_saturated_hue_to_hex(0.125));
    }

    #[test]
    fn test_gradient_palette() {
        let p = Palette::Gradient { gradient: ColorGradient::from_hex_stops(&[(0.0, "#000000"), (1.0, "#ffffff")]) };
        assert_eq!(p.escape_color(80, 80).as_str(), "#ffffff");
        assert_eq!(p.escape_color(0, 0).as_str(), "#000000");
    }
}
