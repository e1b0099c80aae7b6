/// Messages passed from a fractal job to its consumer.
///
/// Messages travel as JSON text. Doubles are written in shortest round-trip
/// form and parsed back exactly, and colours are opaque strings, so a decoded
/// message is bit-for-bit the one that was encoded.

use serde::{Deserialize, Serialize};

use super::job::JobId;
use super::types::{Color, ColoredPoint, Pixel};
use crate::error::Result;
use crate::formulas::FractalOutput;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FractalMessage {
    /// `{jobId, x, y, color}` from an escape-time job.
    #[serde(rename_all = "camelCase")]
    Pixel { job_id: JobId, x: u32, y: u32, color: Color },
    /// `{jobId, elements, color}` from an IFS job.
    #[serde(rename_all = "camelCase")]
    Point { job_id: JobId, elements: Vec<f64>, color: Color },
}

impl FractalMessage {
    pub fn from_output(job_id: JobId, output: FractalOutput) -> Self {
        match output {
            FractalOutput::Pixel(Pixel { x, y, color }) => FractalMessage::Pixel { job_id, x, y, color },
            FractalOutput::Point(ColoredPoint { point, color }) => {
                FractalMessage::Point { job_id, elements: point.elements, color }
            }
        }
    }

    pub fn job_id(&self) -> JobId {
        match self {
            FractalMessage::Pixel { job_id, .. } | FractalMessage::Point { job_id, .. } => *job_id,
        }
    }

    pub fn color(&self) -> &Color {
        match self {
            FractalMessage::Pixel { color, .. } | FractalMessage::Point { color, .. } => color,
        }
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector;

    #[test]
    fn test_pixel_wire_shape() {
        let msg = FractalMessage::Pixel { job_id: 3, x: 10, y: 20, color: Color::new("#ff0100") };
        let text = msg.encode().unwrap();
        assert_eq!(text, r##"{"jobId":3,"x":10,"y":20,"color":"#ff0100"}"##);
        assert_eq!(FractalMessage::decode(&text).unwrap(), msg);
    }

    #[test]
    fn test_point_doubles_are_exact() {
        let awkward = [0.1, 1.0 / 3.0, -2.1818, f64::MIN_POSITIVE, 1e308, 5e-324, 0.30000000000000004, -0.0];
        let msg = FractalMessage::Point { job_id: u32::MAX as u64 + 1, elements: awkward.to_vec(), color: Color::new("#00FF80") };
        let back = FractalMessage::decode(&msg.encode().unwrap()).unwrap();
        let FractalMessage::Point { job_id, elements, color } = back else {
            panic!("decoded as the wrong variant");
        };
        assert_eq!(job_id, u32::MAX as u64 + 1);
        assert_eq!(color.as_str(), "#00FF80");
        for (a, b) in awkward.iter().zip(&elements) {
            assert_eq!(a.to_bits(), b.to_bits(), "{a} came back as {b}");
        }
    }

    #[test]
    fn test_from_output() {
        let point = FractalOutput::Point(ColoredPoint::new(Vector::from_xy(0.5, 1.5), Color::new("brown")));
        let msg = FractalMessage::from_output(9, point);
        assert_eq!(msg.job_id(), 9);
        assert_eq!(msg.color().as_str(), "brown");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["elements"][1], 1.5);
    }

    #[test]
    fn test_rejects_unknown_shape() {
        assert!(FractalMessage::decode(r#"{"jobId":1,"color":"red"}"#).is_err());
    }
}
