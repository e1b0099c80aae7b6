/// Numeric helpers shared across the linear algebra, canvas and colouring code.
///
/// Clamping, interpolation, colour byte packing, the colinearity test used
/// by triangle drawing, and the affine solve used to map a texture onto a
/// screen triangle.

/// Absolute tolerance for `Vector`/`Matrix` equality.
pub const TOLERANCE: f64 = 1e-6;

/// Clamp a value to [min, max] range.
#[inline(always)]
pub fn clamp(v: f64, min: f64, max: f64) -> f64 {
    if v < min { min } else if v > max { max } else { v }
}

/// Linear interpolation between a and b.
#[inline(always)]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Pack a float in [0, 1] to a byte, rounding to nearest.
#[inline(always)]
pub fn float_to_byte(v: f64) -> u8 {
    let vi = (v * 255.0).round() as i32;
    if vi < 0 { 0 } else if vi > 255 { 255 } else { vi as u8 }
}

/// Format an RGB byte triple as a CSS hex colour `"#rrggbb"`.
pub fn rgb_to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Parse a CSS hex color string "#RRGGBB" to (r, g, b) as f64 in [0, 1].
pub fn parse_hex_color(hex: &str) -> (f64, f64, f64) {
    let hex = hex.trim_start_matches('#');
    if hex.len() < 6 || !hex.is_char_boundary(6) {
        return (0.0, 0.0, 0.0);
    }
    let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
    let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
    let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
    (r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0)
}

/// True when the three points lie on one line (zero signed area).
#[inline]
pub fn are_colinear(x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) -> bool {
    x1 * y2 + y1 * x3 + x2 * y3 - y1 * x2 - x3 * y2 - x1 * y3 == 0.0
}

/// Affine transform `(m11, m12, m21, m22, dx, dy)` taking texture pixel
/// coordinates `(u, v)` to screen coordinates `(x, y)` for three vertex pairs.
///
/// Returns `None` when the texture triangle is degenerate.
pub fn solve_texture_affine(
    screen: [(f64, f64); 3],
    texture: [(f64, f64); 3],
) -> Option<[f64; 6]> {
    let [(x0, y0), (x1, y1), (x2, y2)] = screen;
    let [(u0, v0), (u1, v1), (u2, v2)] = texture;

    let denom = u0 * (v2 - v1) - u1 * v2 + u2 * v1 + (u1 - u2) * v0;
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }

    let m11 = -(v0 * (x2 - x1) - v1 * x2 + v2 * x1 + (v1 - v2) * x0) / denom;
    let m12 = (v1 * y2 + v0 * (y1 - y2) - v2 * y1 + (v2 - v1) * y0) / denom;
    let m21 = (u0 * (x2 - x1) - u1 * x2 + u2 * x1 + (u1 - u2) * x0) / denom;
    let m22 = -(u1 * y2 + u0 * (y1 - y2) - u2 * y1 + (u2 - u1) * y0) / denom;
    let dx = (u0 * (v2 * x1 - v1 * x2) + v0 * (u1 * x2 - u2 * x1) + (u2 * v1 - u1 * v2) * x0) / denom;
    let dy = (u0 * (v2 * y1 - v1 * y2) + v0 * (u1 * y2 - u2 * y1) + (u2 * v1 - u1 * v2) * y0) / denom;

    Some([m11, m12, m21, m22, dx, dy])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(1.5, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-0.5, 0.0, 1.0), 0.0);
        assert_eq!(clamp(0.5, 0.0, 1.0), 0.5);
    }

    #[test]
    fn test_lerp() {
        assert!((lerp(0.0, 10.0, 0.5) - 5.0).abs() < 1e-10);
        assert!((lerp(-4.0, 4.0, 1.0) - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_hex_round_trip() {
        assert_eq!(rgb_to_hex(255, 128, 0), "#ff8000");
        let (r, g, b) = parse_hex_color("#ff8040");
        assert!((r - 1.0).abs() < 0.01);
        assert!((g - 0.502).abs() < 0.01);
        assert!((b - 0.251).abs() < 0.01);
        assert_eq!(parse_hex_color("brown"), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_float_to_byte_rounds() {
        assert_eq!(float_to_byte(1.0), 255);
        assert_eq!(float_to_byte(0.5), 128);
        assert_eq!(float_to_byte(-2.0), 0);
    }

    #[test]
    fn test_colinear() {
        assert!(are_colinear(0.0, 0.0, 1.0, 1.0, 3.0, 3.0));
        assert!(!are_colinear(0.0, 0.0, 1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_texture_affine_maps_vertices() {
        let screen = [(10.0, 20.0), (110.0, 25.0), (15.0, 140.0)];
        let texture = [(0.0, 0.0), (64.0, 0.0), (0.0, 64.0)];
        let [m11, m12, m21, m22, dx, dy] = solve_texture_affine(screen, texture).unwrap();
        for ((x, y), (u, v)) in screen.iter().zip(texture.iter()) {
            let sx = m11 * u + m21 * v + dx;
            let sy = m12 * u + m22 * v + dy;
            assert!((sx - x).abs() < 1e-9, "x {sx} vs {x}");
            assert!((sy - y).abs() < 1e-9, "y {sy} vs {y}");
        }
    }

    #[test]
    fn test_texture_affine_degenerate() {
        let screen = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)];
        let texture = [(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)];
        assert!(solve_texture_affine(screen, texture).is_none());
    }
}
