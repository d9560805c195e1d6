// crates/duoscope-ui/src/context.rs
//
// AppContext: runtime-only state of the desktop host. Nothing here is
// persisted; the saved settings live in ReviewConfig (see app.rs).
//
// Per camera side the host remembers what the operator picked (video path,
// probe result, detection record) so the review can be rebuilt from scratch
// whenever a probe finishes or the settings change.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use uuid::Uuid;

use duoscope_core::detection::DetectionRecord;
use duoscope_core::duoscope_log;
use duoscope_core::helpers::geometry::Side;
use duoscope_core::media_types::MediaInfo;
use duoscope_media::{MediaWorker, Uploader};

use crate::helpers::surface::FrameTextures;

/// Everything the operator loaded for one camera.
#[derive(Default)]
pub struct SideSource {
    pub video:         Option<PathBuf>,
    /// Set once the background probe for `video` succeeds.
    pub info:          Option<MediaInfo>,
    /// Probe in flight for `video`; results with another id are stale.
    pub probe_id:      Option<Uuid>,
    pub metadata:      Option<DetectionRecord>,
    pub metadata_path: Option<PathBuf>,
}

impl SideSource {
    pub fn is_ready(&self) -> bool {
        self.video.is_some() && self.info.is_some()
    }
}

/// Last thing worth telling the operator, shown in the bottom bar.
#[derive(Default)]
pub struct StatusLine {
    pub text:     String,
    pub is_error: bool,
}

impl StatusLine {
    pub fn info(&mut self, msg: impl Into<String>) {
        self.text     = msg.into();
        self.is_error = false;
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        self.text     = msg.into();
        self.is_error = true;
        duoscope_log!("[app] {}", self.text);
    }
}

pub struct AppContext {
    pub media_worker: MediaWorker,
    pub uploader:     Uploader,
    pub textures:     FrameTextures,
    pub status:       StatusLine,
    sources:          [SideSource; 2],
    started:          Instant,
}

impl AppContext {
    pub fn new(endpoint: &str) -> Self {
        Self {
            media_worker: MediaWorker::new(),
            uploader:     Uploader::new(endpoint),
            textures:     FrameTextures::default(),
            status:       StatusLine::default(),
            sources:      Default::default(),
            started:      Instant::now(),
        }
    }

    /// Host clock handed to the core; zero at app start.
    pub fn now(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn source(&self, side: Side) -> &SideSource {
        &self.sources[side_index(side)]
    }

    pub fn source_mut(&mut self, side: Side) -> &mut SideSource {
        &mut self.sources[side_index(side)]
    }

    /// Which side a probe result belongs to, if it isn't stale.
    pub fn side_for_probe(&self, id: Uuid) -> Option<Side> {
        Side::BOTH.into_iter().find(|&s| self.source(s).probe_id == Some(id))
    }

    pub fn clear_sources(&mut self) {
        self.sources = Default::default();
        self.textures.clear();
    }
}

fn side_index(side: Side) -> usize {
    match side {
        Side::Left  => 0,
        Side::Right => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_probe_ids_match_no_side() {
        let mut ctx = AppContext::new("http://127.0.0.1:9/");
        let id = Uuid::new_v4();
        ctx.source_mut(Side::Right).probe_id = Some(id);
        assert_eq!(ctx.side_for_probe(id), Some(Side::Right));
        assert_eq!(ctx.side_for_probe(Uuid::new_v4()), None);
    }

    #[test]
    fn source_needs_probe_before_ready() {
        let mut ctx = AppContext::new("http://127.0.0.1:9/");
        ctx.source_mut(Side::Left).video = Some(PathBuf::from("a.mp4"));
        assert!(!ctx.source(Side::Left).is_ready());
        ctx.source_mut(Side::Left).info = Some(MediaInfo { duration: 1.0, fps: 30.0, width: 2, height: 2 });
        assert!(ctx.source(Side::Left).is_ready());
        ctx.clear_sources();
        assert!(ctx.source(Side::Left).video.is_none());
    }
}
