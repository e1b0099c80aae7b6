/// World <-> raster coordinate mapping.
///
/// The mapping is `sx = x_aspect * (x + |x_min|)` and `sy = y_aspect * (y_max - y)`.
/// X is anchored on the magnitude of `x_min` while Y is anchored on `y_max`,
/// so the two axes only agree for windows whose left edge is at or left of zero.
/// Aspect ratios are cached and go stale whenever the window or raster size
/// changes; call [`ScreenRangeConverter::resize`] before converting again.

use serde::{Deserialize, Serialize};

use super::range::Range2D;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenRangeConverter {
    #[serde(flatten)]
    pub range: Range2D,
    pub width: f64,
    pub height: f64,
    pub x_aspect_ratio: f64,
    pub y_aspect_ratio: f64,
}

impl ScreenRangeConverter {
    /// Window plus raster size. Aspect ratios stay zero until `resize`.
    pub fn new(range: Range2D, width: f64, height: f64) -> Self {
        Self { range, width, height, x_aspect_ratio: 0.0, y_aspect_ratio: 0.0 }
    }

    /// `new` followed by `resize` with the same size.
    pub fn with_size(range: Range2D, width: f64, height: f64) -> Self {
        let mut converter = Self::new(range, width, height);
        converter.resize(width, height);
        converter
    }

    pub fn standard() -> Self {
        Self::new(Range2D::standard(), 0.0, 0.0)
    }

    /// Replace the world window. Aspect ratios are stale afterwards.
    pub fn set_range(&mut self, range: Range2D) {
        self.range = range;
    }

    pub fn range2d(&self) -> Range2D {
        self.range
    }

    pub fn has_data(&self) -> bool {
        self.range.has_data()
    }

    /// Store the raster size and recompute both aspect ratios.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.x_aspect_ratio = width / self.range.x_range();
        self.y_aspect_ratio = height / self.range.y_range();
    }

    #[inline(always)]
    pub fn world_to_screen_x(&self, x: f64) -> f64 {
        self.x_aspect_ratio * (x + self.range.x_min.abs())
    }

    #[inline(always)]
    pub fn world_to_screen_y(&self, y: f64) -> f64 {
        self.y_aspect_ratio * (self.range.y_max - y)
    }

    #[inline]
    pub fn world_to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        (self.world_to_screen_x(x), self.world_to_screen_y(y))
    }

    /// Exact inverse of [`world_to_screen`](Self::world_to_screen).
    #[inline]
    pub fn screen_to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
        (
            sx / self.x_aspect_ratio - self.range.x_min.abs(),
            self.range.y_max - sy / self.y_aspect_ratio,
        )
    }

    /// World units per horizontal pixel.
    pub fn screen_delta_x(&self) -> f64 {
        self.range.x_range() / self.width
    }

    /// World units per vertical pixel.
    pub fn screen_delta_y(&self) -> f64 {
        self.range.y_range() / self.height
    }

    /// Stretch the X window so world units are square on this raster.
    pub fn auto_scale_width_to_match_height(&mut self) {
        if self.width <= 0.0 || self.height <= 0.0 {
            return;
        }
        let width_over_height = self.width / self.height;
        self.range.x_max = self.range.y_max * width_over_height;
        self.range.x_min = self.range.y_min * width_over_height;
        self.resize(self.width, self.height);
    }

    /// Stretch the Y window so world units are square on this raster.
    pub fn auto_scale_height_to_match_width(&mut self) {
        if self.width <= 0.0 || self.height <= 0.0 {
            return;
        }
        let height_over_width = self.height / self.width;
        self.range.y_max *= height_over_width;
        self.range.y_min *= height_over_width;
        self.resize(self.width, self.height);
    }

    /// Widen the short axis about its centre until a pixel spans the same
    /// world distance on both axes. The original window stays fully visible.
    pub fn fit_square_pixels(&mut self) {
        if !(self.width > 0.0 && self.height > 0.0 && self.has_data()) {
            return;
        }
        let (dx, dy) = (self.screen_delta_x(), self.screen_delta_y());
        if (dx - dy).abs() <= 1e-9 * dx.max(dy) {
            return;
        }
        if dx < dy {
            let (centre, half) = ((self.range.x_min + self.range.x_max) / 2.0, dy * self.width / 2.0);
            self.range.x_min = centre - half;
            self.range.x_max = centre + half;
        } else {
            let (centre, half) = ((self.range.y_min + self.range.y_max) / 2.0, dx * self.height / 2.0);
            self.range.y_min = centre - half;
            self.range.y_max = centre + half;
        }
        self.resize(self.width, self.height);
    }
}

/// Display window plus an independent window the data is evaluated over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenRangeWithDataFocusArea {
    #[serde(flatten)]
    pub screen: ScreenRangeConverter,
    pub data_evaluation_range: Range2D,
}

impl ScreenRangeWithDataFocusArea {
    /// The evaluation window starts out equal to the display window.
    pub fn new(screen: ScreenRangeConverter) -> Self {
        Self { data_evaluation_range: screen.range, screen }
    }

    pub fn set_data_evaluation_range(&mut self, range: Range2D) {
        self.data_evaluation_range = range;
    }

    /// Half-open pixel column span covered by the evaluation window, clipped to the raster.
    pub fn pixel_columns(&self) -> std::ops::Range<u32> {
        let start = self.screen.world_to_screen_x(self.data_evaluation_range.x_min);
        let end = self.screen.world_to_screen_x(self.data_evaluation_range.x_max);
        clip_span(start, end, self.screen.width)
    }

    /// Half-open pixel row span covered by the evaluation window, clipped to the raster.
    pub fn pixel_rows(&self) -> std::ops::Range<u32> {
        let start = self.screen.world_to_screen_y(self.data_evaluation_range.y_max);
        let end = self.screen.world_to_screen_y(self.data_evaluation_range.y_min);
        clip_span(start, end + 1.0, self.screen.height)
    }
}

fn clip_span(start: f64, end: f64, limit: f64) -> std::ops::Range<u32> {
    if !(start.is_finite() && end.is_finite() && limit.is_finite()) {
        return 0..0;
    }
    let limit = limit.max(0.0);
    let lo = start.ceil().clamp(0.0, limit) as u32;
    let hi = end.ceil().clamp(0.0, limit) as u32;
    lo..hi.max(lo)
}
