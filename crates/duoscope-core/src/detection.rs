// crates/duoscope-core/src/detection.rs
//
// Decoder for the event-detection record produced server-side for each video:
//
//   {"DetectedEvents":[
//       {"Event_QRCode":     {"frame": 12, ...}},
//       {"Event_Activity_1": {"frame_start": 60, "frame_end": 120}},
//       ...
//   ]}
//
// The record may arrive base64-wrapped, and the detector writes some numbers
// as strings ("0"), so every numeric field accepts either form. A malformed
// entry is skipped and logged; only an undecodable record is an error.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use thiserror::Error;

use crate::duoscope_log;

const EVENTS_KEY:      &str = "DetectedEvents";
const QR_KEY:          &str = "Event_QRCode";
const ACTIVITY_PREFIX: &str = "Event_Activity_";

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("detection record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("detection record is neither JSON nor base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("decoded detection record is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("detection record has no DetectedEvents list")]
    MissingEvents,
}

/// One detected activity interval, in raw stream frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Activity {
    pub id:          u32,
    pub frame_start: i64,
    pub frame_end:   i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DetectionRecord {
    /// Raw frame of the sync QR code; seeds the stream's frame offset.
    pub qr_frame:   Option<i64>,
    /// Activities ordered by id.
    pub activities: Vec<Activity>,
}

impl DetectionRecord {
    /// Parse plain JSON or a base64-wrapped JSON record.
    pub fn parse(input: &str) -> Result<Self, DetectionError> {
        let trimmed = input.trim();
        if trimmed.starts_with('{') {
            return Self::from_json(trimmed);
        }
        let compact: String = trimmed.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let bytes = STANDARD.decode(compact)?;
        Self::from_json(&String::from_utf8(bytes)?)
    }

    pub fn from_json(json: &str) -> Result<Self, DetectionError> {
        let root: Value = serde_json::from_str(json)?;
        let entries = root
            .get(EVENTS_KEY)
            .and_then(Value::as_array)
            .ok_or(DetectionError::MissingEvents)?;

        let mut record = DetectionRecord::default();
        for entry in entries {
            let Some(obj) = entry.as_object() else {
                duoscope_log!("[detection] skipping non-object entry {entry}");
                continue;
            };
            for (key, body) in obj {
                record.absorb(key, body);
            }
        }
        // Stable sort, so the first entry for a repeated id survives the dedup.
        record.activities.sort_by_key(|a| a.id);
        let before = record.activities.len();
        record.activities.dedup_by_key(|a| a.id);
        if record.activities.len() < before {
            duoscope_log!(
                "[detection] {} repeated activity ids skipped",
                before - record.activities.len()
            );
        }
        Ok(record)
    }

    fn absorb(&mut self, key: &str, body: &Value) {
        if key == QR_KEY {
            match body.get("frame").and_then(number) {
                Some(f) if self.qr_frame.is_none() => self.qr_frame = Some(f),
                Some(_) => duoscope_log!("[detection] extra QR code entry ignored"),
                None    => duoscope_log!("[detection] QR code entry without a frame"),
            }
        } else if let Some(suffix) = key.strip_prefix(ACTIVITY_PREFIX) {
            let id    = suffix.parse::<u32>().ok();
            let start = body.get("frame_start").and_then(number);
            let end   = body.get("frame_end").and_then(number);
            match (id, start, end) {
                (Some(id), Some(frame_start), Some(frame_end)) => {
                    self.activities.push(Activity { id, frame_start, frame_end });
                }
                _ => duoscope_log!("[detection] malformed activity {key} skipped"),
            }
        } else {
            duoscope_log!("[detection] unknown entry {key} skipped");
        }
    }
}

/// A frame number written either as a JSON number or as a numeric string.
fn number(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.round() as i64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{"DetectedEvents":[
        {"Event_QRCode":{"frame":12,"data":"cam-a"}},
        {"Event_Activity_2":{"frame_start":"200","frame_end":260}},
        {"Event_Activity_1":{"frame_start":60,"frame_end":"120"}}
    ]}"#;

    #[test]
    fn parses_qr_and_activities_in_id_order() {
        let r = DetectionRecord::parse(SAMPLE).unwrap();
        assert_eq!(r.qr_frame, Some(12));
        assert_eq!(r.activities, vec![
            Activity { id: 1, frame_start: 60,  frame_end: 120 },
            Activity { id: 2, frame_start: 200, frame_end: 260 },
        ]);
    }

    #[test]
    fn repeated_activity_id_keeps_first_entry() {
        let json = r#"{"DetectedEvents":[
            {"Event_Activity_1":{"frame_start":10,"frame_end":20}},
            {"Event_Activity_1":{"frame_start":500,"frame_end":600}},
            {"Event_Activity_2":{"frame_start":30,"frame_end":40}}
        ]}"#;
        let r = DetectionRecord::parse(json).unwrap();
        assert_eq!(r.activities, vec![
            Activity { id: 1, frame_start: 10, frame_end: 20 },
            Activity { id: 2, frame_start: 30, frame_end: 40 },
        ]);
    }

    #[test]
    fn accepts_base64_wrapped_record() {
        let wrapped = STANDARD.encode(SAMPLE);
        let r = DetectionRecord::parse(&format!("\n{wrapped}\n")).unwrap();
        assert_eq!(r.qr_frame, Some(12));
        assert_eq!(r.activities.len(), 2);
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let json = r#"{"DetectedEvents":[
            {"Event_Activity_x":{"frame_start":1,"frame_end":2}},
            {"Event_Activity_3":{"frame_start":"soon","frame_end":2}},
            {"Event_Activity_4":{"frame_start":"0","frame_end":9}},
            "garbage",
            {"Event_Other":{}}
        ]}"#;
        let r = DetectionRecord::parse(json).unwrap();
        assert_eq!(r.qr_frame, None);
        assert_eq!(r.activities, vec![Activity { id: 4, frame_start: 0, frame_end: 9 }]);
    }

    #[test]
    fn missing_list_is_an_error() {
        assert!(matches!(DetectionRecord::parse(r#"{"events":[]}"#), Err(DetectionError::MissingEvents)));
        assert!(matches!(DetectionRecord::parse("{not json"), Err(DetectionError::Json(_))));
        assert!(matches!(DetectionRecord::parse("%%%"), Err(DetectionError::Base64(_))));
    }
}
