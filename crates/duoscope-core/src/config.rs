// crates/duoscope-core/src/config.rs
//
// Review settings. Serializable so the desktop host can persist them with
// the rest of its app storage; every field has a serde default so older
// saved blobs keep loading after new fields are added.

use serde::{Deserialize, Serialize};

use crate::helpers::frames::DEFAULT_FRAME_RATE;
use crate::surface::Rgba;

/// Warm marker colour for rulers on the left camera.
pub const LEFT_RULER_COLOUR:  Rgba = Rgba::rgb(0xFF, 0x11, 0x44);
/// Cool marker colour for rulers on the right camera.
pub const RIGHT_RULER_COLOUR: Rgba = Rgba::rgb(0x40, 0xE0, 0xD0);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Agreed frame rate of both recordings.
    pub frame_rate:             f64,
    /// Largest tolerated gap, in frames, between the two aligned playheads.
    pub drift_tolerance_frames: i64,
    /// Where completed measurement pairs are POSTed.
    pub endpoint:               String,
    /// Archive completed rulers instead of ignoring clicks once a side is done.
    pub keep_ruler_history:     bool,
    /// How close (px) a press must land to a ruler point to start dragging it.
    pub grab_radius_px:         f32,
    /// Base radius of a ruler point; the drawn marker is π× this across.
    pub point_radius_px:        f32,
    /// Host tick cadence.
    pub tick_interval_ms:       u64,
    pub left_colour:            Rgba,
    pub right_colour:           Rgba,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            frame_rate:             DEFAULT_FRAME_RATE,
            drift_tolerance_frames: 1,
            endpoint:               "http://127.0.0.1:8080/processing/".into(),
            keep_ruler_history:     false,
            grab_radius_px:         8.0,
            point_radius_px:        2.0,
            tick_interval_ms:       16,
            left_colour:            LEFT_RULER_COLOUR,
            right_colour:           RIGHT_RULER_COLOUR,
        }
    }
}

impl ReviewConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut cfg: ReviewConfig = serde_json::from_str(json)?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// Pull nonsense values back to something the synchronizer can run with.
    pub fn sanitize(&mut self) {
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            self.frame_rate = DEFAULT_FRAME_RATE;
        }
        self.drift_tolerance_frames = self.drift_tolerance_frames.max(0);
        self.grab_radius_px         = self.grab_radius_px.max(1.0);
        self.point_radius_px        = self.point_radius_px.max(0.5);
        self.tick_interval_ms       = self.tick_interval_ms.clamp(1, 1_000);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = ReviewConfig::from_json(r#"{ "frame_rate": 25.0 }"#).unwrap();
        assert_eq!(cfg.frame_rate, 25.0);
        assert_eq!(cfg.drift_tolerance_frames, 1);
        assert_eq!(cfg.left_colour, LEFT_RULER_COLOUR);
    }

    #[test]
    fn sanitize_repairs_bad_rate() {
        let cfg = ReviewConfig::from_json(r#"{ "frame_rate": -1.0, "tick_interval_ms": 0 }"#).unwrap();
        assert_eq!(cfg.frame_rate, DEFAULT_FRAME_RATE);
        assert_eq!(cfg.tick_interval_ms, 1);
    }
}
