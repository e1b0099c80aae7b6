/// Hue based colouring for iteration counts.
///
/// Both functions take the hue as a fraction in [0, 1] and split it into six
/// equal sectors. Inside a sector the secondary channel is
/// `c * (1 - |(h / 60) mod 2 - 1|)`; with `h` given as a fraction rather than
/// in degrees that term stays close to zero, so the output is dominated by
/// the primary channel of each sector. Hues outside [0, 1] map to black.

use crate::math::utils::{float_to_byte, rgb_to_hex};

const SECTOR_1: f64 = 0.166666667;
const SECTOR_2: f64 = 0.333333333;
const SECTOR_3: f64 = 0.5;
const SECTOR_4: f64 = 0.666666667;
const SECTOR_5: f64 = 0.833333333;

/// `(r, g, b)` for chroma `c` and secondary `x`, before the lightness offset.
#[inline]
fn sector_rgb(h: f64, c: f64, x: f64) -> (f64, f64, f64) {
    if (0.0..SECTOR_1).contains(&h) {
        (c, x, 0.0)
    } else if (SECTOR_1..SECTOR_2).contains(&h) {
        (x, c, 0.0)
    } else if (SECTOR_2..SECTOR_3).contains(&h) {
        (0.0, c, x)
    } else if (SECTOR_3..SECTOR_4).contains(&h) {
        (0.0, x, c)
    } else if (SECTOR_4..SECTOR_5).contains(&h) {
        (x, 0.0, c)
    } else if (SECTOR_5..=1.0).contains(&h) {
        (c, 0.0, x)
    } else {
        (0.0, 0.0, 0.0)
    }
}

#[inline(always)]
fn secondary(c: f64, h: f64) -> f64 {
    c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs())
}

/// Fully saturated, mid-lightness hue as `"#rrggbb"`.
pub fn fully_saturated_hue_to_hex(h: f64) -> String {
    let (r, g, b) = sector_rgb(h, 1.0, secondary(1.0, h));
    rgb_to_hex(float_to_byte(r), float_to_byte(g), float_to_byte(b))
}

/// HSL to `"#rrggbb"`, all components as fractions in [0, 1].
pub fn hsl_to_hex(h: f64, s: f64, l: f64) -> String {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let m = l - c / 2.0;
    let (r, g, b) = sector_rgb(h, c, secondary(c, h));
    rgb_to_hex(float_to_byte(r + m), float_to_byte(g + m), float_to_byte(b + m))
}
