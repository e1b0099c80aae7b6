/// Walks a function across an x interval and turns it into line/point segments.
///
/// Samples sit at `x_i = min + i * step` for `i = 0..=floor((max - min) / step)`.
/// Each neighbouring pair of samples becomes a line when both are calculable
/// and a lone point when only the left one is. A final sample that is
/// calculable after an uncalculable one is emitted as a point too, so no
/// isolated value is ever dropped.

use serde::{Deserialize, Serialize};

use super::{calculable, DifferentiableFunction};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Segment {
    Line { x1: f64, y1: f64, x2: f64, y2: f64 },
    Point { x: f64, y: f64 },
}

pub struct CurveTracer<'f, F: DifferentiableFunction + ?Sized> {
    function: &'f F,
    min: f64,
    step: f64,
    sample_count: usize,
}

impl<'f, F: DifferentiableFunction + ?Sized> CurveTracer<'f, F> {
    /// A non-positive or non-finite step, or `max < min`, traces nothing.
    pub fn new(function: &'f F, min: f64, max: f64, step: f64) -> Self {
        let span = (max - min) / step;
        let sample_count = if step > 0.0 && span.is_finite() && span >= 0.0 {
            (span + 1e-9).floor() as usize + 1
        } else {
            0
        };
        Self { function, min, step, sample_count }
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    #[inline]
    fn sample_x(&self, i: usize) -> f64 {
        self.min + i as f64 * self.step
    }

    fn sample(&self, i: usize) -> Option<f64> {
        let x = self.sample_x(i);
        let y = calculable(self.function, x);
        if y.is_none() {
            log::trace!("not calculable at x = {x}");
        }
        y
    }

    /// Fresh pass over the interval. Each call starts from `min` again.
    pub fn segments(&self) -> Segments<'_, 'f, F> {
        Segments { tracer: self, index: 0, carried: None, previous_calculable: false, finished: self.sample_count == 0 }
    }
}

/// Lazy segment sequence produced by [`CurveTracer::segments`].
pub struct Segments<'t, 'f, F: DifferentiableFunction + ?Sized> {
    tracer: &'t CurveTracer<'f, F>,
    index: usize,
    carried: Option<Option<f64>>,
    previous_calculable: bool,
    finished: bool,
}

impl<'t, 'f, F: DifferentiableFunction + ?Sized> Iterator for Segments<'t, 'f, F> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        while !self.finished {
            let i = self.index;
            let x1 = self.tracer.sample_x(i);
            let y1 = match self.carried.take() {
                Some(y) => y,
                None => self.tracer.sample(i),
            };

            if i + 1 >= self.tracer.sample_count {
                self.finished = true;
                return match y1 {
                    Some(y) if !self.previous_calculable => Some(Segment::Point { x: x1, y }),
                    _ => None,
                };
            }

            let x2 = self.tracer.sample_x(i + 1);
            let y2 = self.tracer.sample(i + 1);
            self.index += 1;
            self.carried = Some(y2);
            self.previous_calculable = y1.is_some();

            match (y1, y2) {
                (Some(y1), Some(y2)) => return Some(Segment::Line { x1, y1, x2, y2 }),
                (Some(y), None) => return Some(Segment::Point { x: x1, y }),
                _ => {}
            }
        }
        None
    }
}
