// crates/duoscope-core/src/media_types.rs
//
// Types that flow across the channels between duoscope-media and duoscope-ui.
// Plain data only; no egui or ffmpeg types.

use std::path::PathBuf;
use uuid::Uuid;

/// What a probe learned about a video file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MediaInfo {
    pub duration: f64,
    /// Average frame rate reported by the container; 0.0 when unknown.
    pub fps:      f64,
    pub width:    u32,
    pub height:   u32,
}

/// A decoded, scaled frame ready for display.
#[derive(Clone, Debug)]
pub struct RgbaFrame {
    /// Increments per decoded frame of a stream, so hosts can skip re-uploads.
    pub serial:    u64,
    pub timestamp: f64,
    pub width:     u32,
    pub height:    u32,
    pub data:      Vec<u8>, // RGBA
}

/// Results sent from the MediaWorker background threads to the UI.
pub enum MediaResult {
    Probed { id: Uuid, path: PathBuf, info: MediaInfo },
    Error  { id: Uuid, msg: String },
}

/// Outcome of one measurement upload.
#[derive(Clone, Debug, PartialEq)]
pub enum UploadResult {
    Sent   { status: u16 },
    Failed { msg: String },
}
