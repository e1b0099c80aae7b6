/// Multi-stop colour gradient, an alternative to hue colouring for escape-time output.
///
/// Stops are kept sorted by position; sampling interpolates linearly in RGB
/// between the two stops around `t` and clamps outside the first and last.

use serde::{Deserialize, Serialize};

use crate::math::utils::{self, float_to_byte, parse_hex_color, rgb_to_hex};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    /// Position in [0, 1] range
    pub position: f64,
    /// RGB channels in [0, 1]
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorGradient {
    stops: Vec<ColorStop>,
}

impl Default for ColorGradient {
    /// Deep blue through white to orange, ending in black for the slowest escapes.
    fn default() -> Self {
        Self::from_hex_stops(&[
            (0.0, "#000044"),
            (0.25, "#0066ff"),
            (0.5, "#ffffff"),
            (0.75, "#ff6600"),
            (1.0, "#000000"),
        ])
    }
}

impl ColorGradient {
    pub fn new(mut stops: Vec<ColorStop>) -> Self {
        stops.sort_by(|a, b| a.position.total_cmp(&b.position));
        Self { stops }
    }

    /// Stops given as `(position, "#rrggbb")`.
    pub fn from_hex_stops(stops: &[(f64, &str)]) -> Self {
        Self::new(
            stops
                .iter()
                .map(|(position, hex)| {
                    let (r, g, b) = parse_hex_color(hex);
                    ColorStop { position: *position, r, g, b }
                })
                .collect(),
        )
    }

    /// Flat `[pos, r, g, b, pos, r, g, b, ...]`; an empty or short buffer gives the default.
    pub fn from_flat(data: &[f64]) -> Self {
        let stops: Vec<ColorStop> = data
            .chunks_exact(4)
            .map(|c| ColorStop { position: c[0], r: c[1], g: c[2], b: c[3] })
            .collect();
        if stops.is_empty() {
            return Self::default();
        }
        Self::new(stops)
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// RGB in [0, 1] at position `t`.
    pub fn sample(&self, t: f64) -> (f64, f64, f64) {
        let t = utils::clamp(t, 0.0, 1.0);
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return (0.0, 0.0, 0.0),
        };
        if t <= first.position {
            return (first.r, first.g, first.b);
        }
        if t >= last.position {
            return (last.r, last.g, last.b);
        }
        for pair in self.stops.windows(2) {
            let (s0, s1) = (&pair[0], &pair[1]);
            if t >= s0.position && t <= s1.position {
                let span = s1.position - s0.position;
                let frac = if span > 1e-10 { (t - s0.position) / span } else { 0.0 };
                return (
                    utils::lerp(s0.r, s1.r, frac),
                    utils::lerp(s0.g, s1.g, frac),
                    utils::lerp(s0.b, s1.b, frac),
                );
            }
        }
        (last.r, last.g, last.b)
    }

    pub fn sample_hex(&self, t: f64) -> String {
        let (r, g, b) = self.sample(t);
        rgb_to_hex(float_to_byte(r), float_to_byte(g), float_to_byte(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_endpoints() {
        let g = ColorGradient::default();
        assert_eq!(g.sample_hex(0.0), "#000044");
        assert_eq!(g.sample_hex(1.0), "#000000");
        assert_eq!(g.sample_hex(-3.0), "#000044");
        assert_eq!(g.sample_hex(7.0), "#000000");
    }

    #[test]
    fn test_gradient_midpoint() {
        let g = ColorGradient::default();
        let (r, g_val, b) = g.sample(0.5);
        assert!((r - 1.0).abs() < 0.01);
        assert!((g_val - 1.0).abs() < 0.01);
        assert!((b - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_interpolates_between_stops() {
        let g = ColorGradient::from_hex_stops(&[(1.0, "#ffffff"), (0.0, "#000000")]);
        assert_eq!(g.stops()[0].position, 0.0);
        assert_eq!(g.sample_hex(0.5), "#808080");
    }

    #[test]
    fn test_from_flat() {
        let g = ColorGradient::from_flat(&[0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 99.0]);
        assert_eq!(g.stops().len(), 2);
        assert_eq!(g.sample_hex(0.0), "#ff0000");
        assert_eq!(ColorGradient::from_flat(&[0.5]), ColorGradient::default());
    }
}
