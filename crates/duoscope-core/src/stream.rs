// crates/duoscope-core/src/stream.rs
//
// StreamHandle: one external video resource plus the frame bookkeeping the
// synchronizer needs (offset, frame count, adjusted frame count).
//
// The handle owns no playback logic. Play/pause/seek decisions live in
// sync.rs; the handle only translates between frames and the stream's clock.

use serde::{Deserialize, Serialize};

use crate::helpers::frames::{duration_frames, frame_at, frame_to_secs};
use crate::helpers::geometry::Side;

/// What a host must provide for each video it hands to the core.
///
/// Implemented by `duoscope_media::VideoStream` for real files and by
/// `FakeStream` in tests.
pub trait MediaStream {
    /// Whatever the host's surface knows how to blit.
    type Frame;

    /// Playback position in seconds.
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, secs: f64);
    /// Media length in seconds (0.0 when not yet known).
    fn duration(&self) -> f64;
    fn is_paused(&self) -> bool;
    fn is_ended(&self) -> bool;
    fn play(&mut self);
    fn pause(&mut self);
    /// Image for the current position, if one has been decoded.
    fn frame(&self) -> Option<&Self::Frame>;
}

/// Which slot of the review a stream occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamTag {
    Left,
    Right,
    /// Only one video loaded; it fills the whole display.
    Single,
}

impl StreamTag {
    pub fn label(self) -> &'static str {
        match self {
            StreamTag::Left   => "left",
            StreamTag::Right  => "right",
            StreamTag::Single => "single",
        }
    }
}

impl From<Side> for StreamTag {
    fn from(side: Side) -> Self {
        match side {
            Side::Left  => StreamTag::Left,
            Side::Right => StreamTag::Right,
        }
    }
}

pub struct StreamHandle<M: MediaStream> {
    pub tag:         StreamTag,
    media:           M,
    fps:             f64,
    frame_offset:    u64,
    duration_frames: u64,
    /// Last observed `is_ended()`, so the synchronizer reacts to the edge only.
    pub(crate) was_ended: bool,
}

impl<M: MediaStream> StreamHandle<M> {
    pub fn new(tag: StreamTag, media: M, fps: f64) -> Self {
        let duration_frames = duration_frames(media.duration(), fps);
        Self {
            tag, media, fps,
            frame_offset: 0, duration_frames,
            was_ended: false,
        }
    }

    pub fn media(&self) -> &M { &self.media }
    pub fn media_mut(&mut self) -> &mut M { &mut self.media }

    pub fn frame_offset(&self) -> u64 { self.frame_offset }
    pub fn duration_frames(&self) -> u64 { self.duration_frames }

    /// Frames in the usable range, `duration_frames − frame_offset`.
    pub fn adjusted_frame_count(&self) -> u64 {
        self.duration_frames - self.frame_offset
    }

    /// Set the usable-range start, clamped to `[0, duration_frames]`.
    /// Returns the offset actually stored.
    pub fn set_frame_offset(&mut self, frame: u64) -> u64 {
        self.frame_offset = frame.min(self.duration_frames);
        self.frame_offset
    }

    /// `ceil(current_time × fps) − frame_offset`, the alignment unit.
    pub fn current_frame(&self) -> i64 {
        frame_at(self.media.current_time(), self.fps) - self.frame_offset as i64
    }

    /// Playback time of the first usable frame.
    pub fn anchor_secs(&self) -> f64 {
        frame_to_secs(self.frame_offset as i64, self.fps)
    }

    /// Move to adjusted frame `frame` (relative to the offset), clamped to the media.
    pub fn seek_adjusted(&mut self, frame: i64) {
        let secs = frame_to_secs(frame.saturating_add(self.frame_offset as i64), self.fps);
        let dur  = self.media.duration().max(0.0);
        self.media.set_current_time(secs.clamp(0.0, dur));
    }

    /// Put the stream back at the start of its usable range.
    pub fn rewind_to_anchor(&mut self) {
        let secs = self.anchor_secs();
        self.media.set_current_time(secs);
    }

    pub fn is_paused(&self) -> bool { self.media.is_paused() }
    pub fn is_ended(&self) -> bool { self.media.is_ended() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeStream;

    #[test]
    fn counts_follow_duration_and_offset() {
        let mut h = StreamHandle::new(StreamTag::Left, FakeStream::new(10.0), 30.0);
        assert_eq!(h.duration_frames(), 300);
        assert_eq!(h.adjusted_frame_count(), 300);
        h.set_frame_offset(30);
        assert_eq!(h.adjusted_frame_count(), 270);
    }

    #[test]
    fn offset_is_clamped_to_duration() {
        let mut h = StreamHandle::new(StreamTag::Right, FakeStream::new(2.0), 30.0);
        assert_eq!(h.set_frame_offset(1_000), 60);
        assert_eq!(h.adjusted_frame_count(), 0);
    }

    #[test]
    fn current_frame_is_offset_relative() {
        let mut h = StreamHandle::new(StreamTag::Left, FakeStream::new(10.0), 30.0);
        h.set_frame_offset(30);
        h.media_mut().set_current_time(2.0);
        assert_eq!(h.current_frame(), 30);
        h.media_mut().set_current_time(0.5);
        assert_eq!(h.current_frame(), -15);
    }

    #[test]
    fn seek_adjusted_clamps_into_media() {
        let mut h = StreamHandle::new(StreamTag::Left, FakeStream::new(10.0), 30.0);
        h.set_frame_offset(60);
        h.seek_adjusted(-200);
        assert_eq!(h.media().current_time(), 0.0);
        h.seek_adjusted(10_000);
        assert_eq!(h.media().current_time(), 10.0);
        h.seek_adjusted(30);
        assert!((h.media().current_time() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn extreme_seek_saturates_instead_of_overflowing() {
        let mut h = StreamHandle::new(StreamTag::Left, FakeStream::new(10.0), 30.0);
        h.set_frame_offset(60);
        h.seek_adjusted(i64::MAX);
        assert_eq!(h.media().current_time(), 10.0);
    }
}
