// crates/duoscope-core/src/payload.rs
//
// The outbound measurement message: one request carrying both cameras' rulers,
// each in its own half-local frame (left x from the left edge, right x from
// the midline, y from the top).
//
//   {"keypoints_left":  {"P0":{"x":..,"y":..},"P1":{"x":..,"y":..}},
//    "keypoints_right": {"P0":{"x":..,"y":..},"P1":{"x":..,"y":..}}}

use serde::{Deserialize, Serialize};

use crate::helpers::geometry::Point;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keypoints {
    #[serde(rename = "P0")]
    pub p0: Point,
    #[serde(rename = "P1")]
    pub p1: Point,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasurementPayload {
    pub keypoints_left:  Keypoints,
    pub keypoints_right: Keypoints,
}

impl MeasurementPayload {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Receiver for completed measurement pairs. Sending is fire-and-forget:
/// the sink reports failures on its own channel, never back to the caller.
pub trait MeasurementSink {
    fn send(&mut self, payload: MeasurementPayload);
}

impl MeasurementSink for Vec<MeasurementPayload> {
    fn send(&mut self, payload: MeasurementPayload) {
        self.push(payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_uses_original_key_names() {
        let p = MeasurementPayload {
            keypoints_left:  Keypoints { p0: Point::new(10.0, 20.0), p1: Point::new(30.0, 40.0) },
            keypoints_right: Keypoints { p0: Point::new(1.5, 2.0),   p1: Point::new(3.0, 4.0) },
        };
        let v: serde_json::Value = serde_json::from_str(&p.to_json().unwrap()).unwrap();
        assert_eq!(v["keypoints_left"]["P0"]["x"], 10.0);
        assert_eq!(v["keypoints_left"]["P1"]["y"], 40.0);
        assert_eq!(v["keypoints_right"]["P0"]["x"], 1.5);
        assert!(v.get("keypoints_right").unwrap().get("p0").is_none());
    }
}
