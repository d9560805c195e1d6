// crates/duoscope-core/src/sync.rs
//
// Synchronizer: keeps two independently clocked videos frame-locked and
// renders them side by side.
//
// Alignment unit is the offset-relative frame (`StreamHandle::current_frame`),
// never raw seconds; the frame rate and each stream's offset are the only
// reference the two recordings share.
//
// Drift correction:
//   tick(now) compares both aligned frames. When the leader is more than
//   `tolerance` frames ahead it is paused, and a resume is scheduled
//   `gap / fps` seconds later so the lagging stream can catch up in wall-clock
//   terms. While a resume is pending no new decision is taken; once it fires
//   the check runs again in the same tick.
//
// Missing streams are a supported configuration (single-video review, or
// nothing loaded yet): every operation touching an absent stream is a no-op.
// A lone stream is tagged `Single`, sits in the left slot and fills the display.

use std::time::Duration;

use crate::duoscope_log;
use crate::helpers::frames::{format_frame_time, gap_to_duration};
use crate::helpers::geometry::{Rect, Side};
use crate::schedule::ResumeSchedule;
use crate::stream::{MediaStream, StreamHandle, StreamTag};
use crate::surface::FrameSurface;

/// Corrections in a row before the log calls the drift persistent.
const PERSISTENT_DRIFT_COUNT: u32 = 3;

/// What the scrubber bar should show after a draw.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScrubberState {
    /// Shortest usable range across loaded streams, in frames.
    pub max:     u64,
    /// Furthest aligned frame across loaded streams.
    pub value:   i64,
    /// Text for the adjusted-time readout.
    pub readout: String,
}

impl ScrubberState {
    /// Playhead position as a fraction of the bar, clamped to `[0, 1]`.
    /// `None` when nothing with a usable range is loaded.
    pub fn fraction(&self) -> Option<f32> {
        if self.max == 0 {
            return None;
        }
        Some((self.value as f64 / self.max as f64).clamp(0.0, 1.0) as f32)
    }
}

/// A drift correction decided by the synchronizer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Correction {
    /// Stream that was paused.
    pub paused:    Side,
    /// Frame gap that triggered the pause.
    pub gap:       i64,
    /// Host time at which the paused stream resumes.
    pub resume_at: Duration,
}

/// Outcome of one `tick`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickReport {
    pub resumed:    Option<Side>,
    pub correction: Option<Correction>,
}

pub struct Synchronizer<M: MediaStream> {
    fps:          f64,
    tolerance:    i64,
    left:         Option<StreamHandle<M>>,
    right:        Option<StreamHandle<M>>,
    schedule:     ResumeSchedule,
    scrubber:     ScrubberState,
    /// Consecutive ticks that needed a correction.
    drift_streak: u32,
}

impl<M: MediaStream> Synchronizer<M> {
    pub fn new(fps: f64, tolerance: i64) -> Self {
        Self {
            fps,
            tolerance:    tolerance.max(0),
            left:         None,
            right:        None,
            schedule:     ResumeSchedule::new(),
            scrubber:     ScrubberState::default(),
            drift_streak: 0,
        }
    }

    /// Take ownership of the loaded media. Offsets start at 0.
    pub fn load(&mut self, left: Option<M>, right: Option<M>) {
        self.schedule.cancel();
        self.drift_streak = 0;
        let fps = self.fps;
        (self.left, self.right) = match (left, right) {
            (Some(l), Some(r)) => (
                Some(StreamHandle::new(StreamTag::Left, l, fps)),
                Some(StreamHandle::new(StreamTag::Right, r, fps)),
            ),
            (Some(only), None) | (None, Some(only)) => {
                (Some(StreamHandle::new(StreamTag::Single, only, fps)), None)
            }
            (None, None) => (None, None),
        };
        for h in self.handles() {
            duoscope_log!(
                "[sync] loaded {} stream: {} frames",
                h.tag.label(), h.duration_frames()
            );
        }
        self.scrubber = self.compute_scrubber();
    }

    pub fn fps(&self) -> f64 { self.fps }
    pub fn tolerance(&self) -> i64 { self.tolerance }
    pub fn has_media(&self) -> bool { self.left.is_some() }
    pub fn is_single(&self) -> bool {
        self.left.as_ref().is_some_and(|h| h.tag == StreamTag::Single)
    }

    pub fn handle(&self, side: Side) -> Option<&StreamHandle<M>> {
        match side {
            Side::Left  => self.left.as_ref(),
            Side::Right => self.right.as_ref(),
        }
    }

    pub fn handle_mut(&mut self, side: Side) -> Option<&mut StreamHandle<M>> {
        match side {
            Side::Left  => self.left.as_mut(),
            Side::Right => self.right.as_mut(),
        }
    }

    fn handles(&self) -> impl Iterator<Item = &StreamHandle<M>> {
        self.left.iter().chain(self.right.iter())
    }

    fn handles_mut(&mut self) -> impl Iterator<Item = &mut StreamHandle<M>> {
        self.left.iter_mut().chain(self.right.iter_mut())
    }

    /// Aligned frame of one stream, `None` if that stream is absent.
    pub fn current_frame(&self, side: Side) -> Option<i64> {
        self.handle(side).map(|h| h.current_frame())
    }

    /// True while any stream is running or waiting on a correction resume.
    pub fn is_playing(&self) -> bool {
        self.schedule.is_pending() || self.handles().any(|h| !h.is_paused())
    }

    pub fn pending_resume(&self) -> Option<crate::schedule::PendingResume> {
        self.schedule.pending()
    }

    // ── Offsets ──────────────────────────────────────────────────────────────

    /// Set one stream's usable-range start. Returns the clamped offset stored.
    pub fn set_frame_offset(&mut self, side: Side, frame: u64) -> Option<u64> {
        let h = self.handle_mut(side)?;
        let stored = h.set_frame_offset(frame);
        duoscope_log!("[sync] {} offset → {stored}", h.tag.label());
        self.scrubber = self.compute_scrubber();
        Some(stored)
    }

    // ── Transport ────────────────────────────────────────────────────────────

    /// Start both streams. Streams that ran off the end restart from their
    /// offset; any drift already present is corrected right away.
    pub fn play(&mut self, now: Duration) -> Option<Correction> {
        if !self.has_media() {
            return None;
        }
        self.schedule.cancel();
        let any_ended = self.handles().any(|h| h.is_ended());
        for h in self.handles_mut() {
            if any_ended {
                h.rewind_to_anchor();
            }
            h.was_ended = false;
            h.media_mut().play();
        }
        self.correct_drift(now)
    }

    /// Pause both streams and cancel any pending correction resume.
    pub fn pause(&mut self) {
        if let Some(p) = self.schedule.cancel() {
            duoscope_log!("[sync] cancelled pending resume of {}", p.side.label());
        }
        self.drift_streak = 0;
        for h in self.handles_mut() {
            h.media_mut().pause();
        }
    }

    /// Re-anchor both streams at their offsets and restart together.
    pub fn sync(&mut self, now: Duration) -> Option<Correction> {
        self.pause();
        for h in self.handles_mut() {
            h.rewind_to_anchor();
        }
        self.play(now)
    }

    /// Put every stream at adjusted frame `delta_frames` (relative to its offset).
    pub fn seek_relative(&mut self, delta_frames: i64) {
        for h in self.handles_mut() {
            h.seek_adjusted(delta_frames);
        }
        self.scrubber = self.compute_scrubber();
    }

    /// Seek to a fraction of the shared usable range.
    pub fn seek_fraction(&mut self, fraction: f32) {
        let max = self.compute_scrubber().max;
        let frame = (fraction.clamp(0.0, 1.0) as f64 * max as f64).round() as i64;
        self.seek_relative(frame);
    }

    /// Step both streams by `frames` from the current scrubber value.
    pub fn step(&mut self, frames: i64) {
        let value = self.compute_scrubber().value;
        self.seek_relative(value + frames);
    }

    // ── Per-step work ────────────────────────────────────────────────────────

    /// One host step: react to streams that just ended, fire a due resume,
    /// then check drift.
    pub fn tick(&mut self, now: Duration) -> TickReport {
        let mut report = TickReport::default();
        self.poll_ended();

        if let Some(p) = self.schedule.take_due(now) {
            if let Some(h) = self.handle_mut(p.side) {
                if !h.is_ended() {
                    h.media_mut().play();
                }
            }
            report.resumed = Some(p.side);
        }

        if !self.schedule.is_pending() {
            report.correction = self.correct_drift(now);
        }
        report
    }

    /// A stream finished: stop its counterpart so the pair stays aligned.
    pub fn handle_ended(&mut self, side: Side) {
        if self.is_single() {
            return;
        }
        self.schedule.cancel();
        if let Some(other) = self.handle_mut(side.other()) {
            other.media_mut().pause();
            duoscope_log!("[sync] {} ended → paused {}", side.label(), other.tag.label());
        }
    }

    fn poll_ended(&mut self) {
        let mut newly_ended = Vec::new();
        for side in Side::BOTH {
            if let Some(h) = self.handle_mut(side) {
                let ended = h.is_ended();
                if ended && !h.was_ended {
                    newly_ended.push(side);
                }
                h.was_ended = ended;
            }
        }
        for side in newly_ended {
            self.handle_ended(side);
        }
    }

    fn correct_drift(&mut self, now: Duration) -> Option<Correction> {
        let (l, r) = (self.left.as_ref()?, self.right.as_ref()?);
        if (l.is_paused() && r.is_paused()) || (l.is_ended() && r.is_ended()) {
            return None;
        }

        let (lf, rf) = (l.current_frame(), r.current_frame());
        let (ahead, gap) = if lf >= rf { (Side::Left, lf - rf) } else { (Side::Right, rf - lf) };
        if gap <= self.tolerance {
            self.drift_streak = 0;
            return None;
        }

        if let Some(h) = self.handle_mut(ahead) {
            h.media_mut().pause();
        }
        let resume_at = now + gap_to_duration(gap, self.fps);
        self.schedule.schedule(ahead, resume_at);

        self.drift_streak += 1;
        if self.drift_streak >= PERSISTENT_DRIFT_COUNT {
            duoscope_log!(
                "[sync] drift persists ({} corrections in a row), {} ahead by {gap}",
                self.drift_streak, ahead.label()
            );
        } else {
            duoscope_log!("[sync] {} ahead by {gap} frames, holding it", ahead.label());
        }
        Some(Correction { paused: ahead, gap, resume_at })
    }

    // ── Rendering ────────────────────────────────────────────────────────────

    /// Blit each stream into its half of `surface` and refresh the scrubber.
    pub fn draw<S: FrameSurface<M::Frame>>(&mut self, surface: &mut S) -> &ScrubberState {
        let (w, h) = surface.size();
        for handle in self.left.iter().chain(self.right.iter()) {
            let dest = match handle.tag {
                StreamTag::Left   => Rect::half(Side::Left, w, h),
                StreamTag::Right  => Rect::half(Side::Right, w, h),
                StreamTag::Single => Rect::new(0.0, 0.0, w, h),
            };
            if let Some(frame) = handle.media().frame() {
                surface.blit(frame, dest);
            }
        }
        self.scrubber = self.compute_scrubber();
        &self.scrubber
    }

    pub fn scrubber(&self) -> &ScrubberState { &self.scrubber }

    fn compute_scrubber(&self) -> ScrubberState {
        let max   = self.handles().map(|h| h.adjusted_frame_count()).min().unwrap_or(0);
        let value = self.handles().map(|h| h.current_frame()).max().unwrap_or(0);
        let readout = if self.has_media() {
            format!("{value} ({})", format_frame_time(value, self.fps))
        } else {
            String::new()
        };
        ScrubberState { max, value, readout }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::frames::frame_to_secs;
    use crate::testing::{DrawOp, FakeStream, RecordingSurface};

    const FPS: f64 = 30.0;

    fn pair(dur: f64) -> Synchronizer<FakeStream> {
        let mut s = Synchronizer::new(FPS, 1);
        s.load(Some(FakeStream::new(dur)), Some(FakeStream::new(dur)));
        s
    }

    fn set_frame(s: &mut Synchronizer<FakeStream>, side: Side, frame: i64) {
        s.handle_mut(side).unwrap().media_mut().time = frame_to_secs(frame, FPS);
    }

    fn advance(s: &mut Synchronizer<FakeStream>, secs: f64) {
        for side in Side::BOTH {
            s.handle_mut(side).unwrap().media_mut().advance(secs);
        }
    }

    fn secs(v: f64) -> Duration { Duration::from_secs_f64(v) }

    #[test]
    fn load_builds_handles_with_zero_offset() {
        let s = pair(10.0);
        for side in Side::BOTH {
            let h = s.handle(side).unwrap();
            assert_eq!(h.frame_offset(), 0);
            assert_eq!(h.duration_frames(), 300);
            assert_eq!(h.adjusted_frame_count(), 300);
        }
        assert_eq!(s.handle(Side::Left).unwrap().tag, StreamTag::Left);
        assert_eq!(s.handle(Side::Right).unwrap().tag, StreamTag::Right);
    }

    #[test]
    fn lone_stream_is_single() {
        let mut s: Synchronizer<FakeStream> = Synchronizer::new(FPS, 1);
        s.load(None, Some(FakeStream::new(5.0)));
        assert!(s.is_single());
        assert!(s.handle(Side::Right).is_none());
        assert!(s.play(secs(0.0)).is_none());
        assert!(s.is_playing());
    }

    #[test]
    fn nothing_loaded_is_a_no_op() {
        let mut s: Synchronizer<FakeStream> = Synchronizer::new(FPS, 1);
        assert!(s.play(secs(0.0)).is_none());
        s.pause();
        s.seek_relative(40);
        assert_eq!(s.tick(secs(1.0)), TickReport::default());
        let mut surface = RecordingSurface::new(640.0, 360.0);
        assert_eq!(s.draw(&mut surface).max, 0);
        assert!(surface.ops.is_empty());
    }

    #[test]
    fn drift_scenario_pauses_leader_and_resumes_after_gap() {
        let mut s = pair(10.0);
        assert!(s.play(secs(0.0)).is_none());

        set_frame(&mut s, Side::Left, 40);
        set_frame(&mut s, Side::Right, 38);
        let now = secs(1.0);
        let c = s.tick(now).correction.expect("left should be held");
        assert_eq!(c.paused, Side::Left);
        assert_eq!(c.gap, 2);
        assert_eq!(c.resume_at, now + gap_to_duration(2, FPS));
        assert!(s.handle(Side::Left).unwrap().is_paused());
        assert!(!s.handle(Side::Right).unwrap().is_paused());

        // Nothing fires early.
        assert_eq!(s.tick(now + Duration::from_millis(30)).resumed, None);

        advance(&mut s, 2.0 / 30.0);
        let report = s.tick(c.resume_at);
        assert_eq!(report.resumed, Some(Side::Left));
        assert!(report.correction.is_none());
        let gap = s.current_frame(Side::Left).unwrap() - s.current_frame(Side::Right).unwrap();
        assert!(gap.abs() <= 1);
        assert!(!s.handle(Side::Left).unwrap().is_paused());
    }

    #[test]
    fn right_ahead_is_held_too() {
        let mut s = pair(10.0);
        s.play(secs(0.0));
        set_frame(&mut s, Side::Left, 100);
        set_frame(&mut s, Side::Right, 105);
        let c = s.tick(secs(4.0)).correction.unwrap();
        assert_eq!(c.paused, Side::Right);
        assert_eq!(c.gap, 5);
    }

    #[test]
    fn gap_within_tolerance_is_left_alone() {
        let mut s = pair(10.0);
        s.play(secs(0.0));
        set_frame(&mut s, Side::Left, 41);
        set_frame(&mut s, Side::Right, 40);
        assert!(s.tick(secs(1.0)).correction.is_none());
    }

    #[test]
    fn drift_is_measured_on_offset_frames() {
        let mut s = pair(20.0);
        s.set_frame_offset(Side::Left, 30);
        s.sync(secs(0.0));
        // 60 raw − 30 offset = 30 aligned, right at 30 aligned
        set_frame(&mut s, Side::Left, 60);
        set_frame(&mut s, Side::Right, 30);
        assert!(s.tick(secs(2.0)).correction.is_none());
    }

    #[test]
    fn settles_within_tolerance_over_many_ticks() {
        let mut s = pair(30.0);
        s.play(secs(0.0));
        set_frame(&mut s, Side::Left, 90);
        set_frame(&mut s, Side::Right, 72);
        let step = 1.0 / 60.0;
        let mut t = 0.0;
        for _ in 0..240 {
            t += step;
            advance(&mut s, step);
            s.tick(secs(t));
        }
        assert!(s.pending_resume().is_none());
        let gap = s.current_frame(Side::Left).unwrap() - s.current_frame(Side::Right).unwrap();
        assert!(gap.abs() <= 1, "gap {gap} after settling");
    }

    #[test]
    fn pause_cancels_pending_resume() {
        let mut s = pair(10.0);
        s.play(secs(0.0));
        set_frame(&mut s, Side::Left, 50);
        set_frame(&mut s, Side::Right, 40);
        let c = s.tick(secs(1.0)).correction.unwrap();
        s.pause();
        assert!(s.pending_resume().is_none());
        let report = s.tick(c.resume_at + secs(1.0));
        assert_eq!(report.resumed, None);
        assert!(s.handle(Side::Left).unwrap().is_paused());
        assert!(s.handle(Side::Right).unwrap().is_paused());
        assert!(!s.is_playing());
    }

    #[test]
    fn play_corrects_pre_existing_offset_immediately() {
        let mut s = pair(10.0);
        set_frame(&mut s, Side::Right, 12);
        let c = s.play(secs(0.0)).unwrap();
        assert_eq!(c.paused, Side::Right);
        assert_eq!(c.gap, 12);
    }

    #[test]
    fn ended_stream_pauses_counterpart_and_play_rewinds() {
        let mut s = pair(2.0);
        s.set_frame_offset(Side::Right, 15);
        s.sync(secs(0.0));
        set_frame(&mut s, Side::Right, 45);
        advance(&mut s, 1.99); // left reaches 1.99s, right runs off the end
        assert!(s.handle(Side::Right).unwrap().is_ended());
        s.tick(secs(2.0));
        assert!(s.handle(Side::Left).unwrap().is_paused());
        assert!(!s.is_playing());

        s.play(secs(3.0));
        assert_eq!(s.handle(Side::Left).unwrap().media().time, 0.0);
        assert!((s.handle(Side::Right).unwrap().media().time - 0.5).abs() < 1e-9);
        assert_eq!(s.current_frame(Side::Left), Some(0));
        assert_eq!(s.current_frame(Side::Right), Some(0));
    }

    #[test]
    fn seek_back_after_end_then_play_keeps_position() {
        let mut s = pair(2.0);
        s.play(secs(0.0));
        advance(&mut s, 3.0);
        s.tick(secs(3.0));
        assert!(s.handle(Side::Left).unwrap().is_ended());

        s.seek_relative(30);
        s.play(secs(4.0));
        assert_eq!(s.current_frame(Side::Left), Some(30));
        assert_eq!(s.current_frame(Side::Right), Some(30));
        assert!(s.is_playing());
    }

    #[test]
    fn sync_reanchors_at_offsets() {
        let mut s = pair(10.0);
        s.set_frame_offset(Side::Left, 45);
        s.set_frame_offset(Side::Right, 12);
        set_frame(&mut s, Side::Left, 200);
        set_frame(&mut s, Side::Right, 7);
        assert!(s.sync(secs(0.0)).is_none());
        assert_eq!(s.current_frame(Side::Left), Some(0));
        assert_eq!(s.current_frame(Side::Right), Some(0));
        assert!(s.is_playing());
    }

    #[test]
    fn seek_relative_is_offset_based_and_clamped() {
        let mut s = pair(10.0);
        s.set_frame_offset(Side::Left, 30);
        s.seek_relative(60);
        assert!((s.handle(Side::Left).unwrap().media().time - 3.0).abs() < 1e-9);
        assert!((s.handle(Side::Right).unwrap().media().time - 2.0).abs() < 1e-9);
        s.seek_relative(100_000);
        assert_eq!(s.handle(Side::Left).unwrap().media().time, 10.0);
        s.seek_relative(-100_000);
        assert_eq!(s.handle(Side::Right).unwrap().media().time, 0.0);
    }

    #[test]
    fn draw_blits_halves_and_reports_scrubber() {
        let mut s = pair(10.0);
        s.set_frame_offset(Side::Left, 30);
        s.handle_mut(Side::Right).unwrap().media_mut().frame = Some(7);
        set_frame(&mut s, Side::Left, 90);
        set_frame(&mut s, Side::Right, 20);
        let mut surface = RecordingSurface::new(640.0, 360.0);
        let sc = s.draw(&mut surface).clone();
        assert_eq!(sc.max, 270);
        assert_eq!(sc.value, 60);
        assert!(sc.readout.starts_with("60"));
        assert_eq!(surface.ops, vec![
            DrawOp::Blit(0, Rect::new(0.0, 0.0, 320.0, 360.0)),
            DrawOp::Blit(7, Rect::new(320.0, 0.0, 320.0, 360.0)),
        ]);
    }

    #[test]
    fn single_stream_fills_the_display() {
        let mut s: Synchronizer<FakeStream> = Synchronizer::new(FPS, 1);
        s.load(Some(FakeStream::new(3.0)), None);
        let mut surface = RecordingSurface::new(640.0, 360.0);
        s.draw(&mut surface);
        assert_eq!(surface.ops, vec![DrawOp::Blit(0, Rect::new(0.0, 0.0, 640.0, 360.0))]);
    }
}
