// crates/duoscope-core/src/session.rs
//
// ReviewSession: the single owner of one review (synchronizer, measurement
// toolkit and event overlay) and the only place ReviewCommands are applied.
//
// Per host step the order is fixed (see `frame`):
//   tick (drift decision) → video frames → event overlay → ruler overlay
//
// Completed measurement pairs are queued in an outbox; the host drains it and
// hands the payloads to its uploader.

use std::time::Duration;

use crate::commands::ReviewCommand;
use crate::config::ReviewConfig;
use crate::detection::DetectionRecord;
use crate::duoscope_log;
use crate::events::EventOverlay;
use crate::helpers::geometry::Side;
use crate::payload::{MeasurementPayload, MeasurementSink};
use crate::stream::MediaStream;
use crate::surface::{FrameSurface, Surface};
use crate::sync::{Synchronizer, TickReport};
use crate::toolkit::MeasurementToolkit;

pub struct ReviewSession<M: MediaStream> {
    config:  ReviewConfig,
    sync:    Synchronizer<M>,
    toolkit: MeasurementToolkit,
    events:  EventOverlay,
    outbox:  Vec<MeasurementPayload>,
}

impl<M: MediaStream> ReviewSession<M> {
    pub fn new(mut config: ReviewConfig) -> Self {
        config.sanitize();
        Self {
            sync:    Synchronizer::new(config.frame_rate, config.drift_tolerance_frames),
            toolkit: MeasurementToolkit::new(&config),
            events:  EventOverlay::new(),
            outbox:  Vec::new(),
            config,
        }
    }

    /// Rebuild synchronizer, toolkit and overlay together. Media is dropped,
    /// any pending drift resume with it.
    pub fn reset(&mut self) {
        let canvas = self.toolkit.canvas_size();
        self.sync.pause();
        self.sync    = Synchronizer::new(self.config.frame_rate, self.config.drift_tolerance_frames);
        self.toolkit = MeasurementToolkit::new(&self.config);
        self.toolkit.set_canvas_size(canvas.0, canvas.1);
        self.events  = EventOverlay::new();
        self.outbox.clear();
        duoscope_log!("[session] reset");
    }

    pub fn config(&self) -> &ReviewConfig { &self.config }

    /// Replace the configuration. Takes effect on the next `reset`.
    pub fn set_config(&mut self, mut config: ReviewConfig) {
        config.sanitize();
        self.config = config;
    }

    pub fn synchronizer(&self) -> &Synchronizer<M> { &self.sync }
    pub fn synchronizer_mut(&mut self) -> &mut Synchronizer<M> { &mut self.sync }
    pub fn toolkit(&self) -> &MeasurementToolkit { &self.toolkit }
    pub fn events(&self) -> &EventOverlay { &self.events }

    // ── Loading ──────────────────────────────────────────────────────────────

    /// Start a new review over `left` / `right`. Rulers and events from the
    /// previous media are dropped.
    pub fn load_media(&mut self, left: Option<M>, right: Option<M>) {
        self.sync.load(left, right);
        self.toolkit.clear_rulers();
        self.events.clear();
    }

    /// Apply a detection record to one stream: its QR frame becomes the
    /// offset, its activities become events. Returns the number of events added.
    pub fn load_metadata(&mut self, side: Side, record: &DetectionRecord) -> usize {
        if self.sync.handle(side).is_none() {
            duoscope_log!("[session] metadata for absent {} stream ignored", side.label());
            return 0;
        }
        if let Some(qr) = record.qr_frame {
            self.sync.set_frame_offset(side, qr.max(0) as u64);
        }
        let Some(h) = self.sync.handle(side) else { return 0 };
        let (offset, adjusted) = (h.frame_offset(), h.adjusted_frame_count());

        let mut added = 0;
        for a in &record.activities {
            if self.events.add_raw_event(a.frame_start, a.frame_end, offset, adjusted).is_some() {
                added += 1;
            }
        }
        duoscope_log!(
            "[session] {} metadata: offset {offset}, {added}/{} events",
            side.label(), record.activities.len()
        );
        added
    }

    // ── Commands ─────────────────────────────────────────────────────────────

    pub fn apply(&mut self, cmd: ReviewCommand, now: Duration) {
        match cmd {
            ReviewCommand::Play => { self.sync.play(now); }
            ReviewCommand::Pause => self.sync.pause(),
            ReviewCommand::TogglePlay => {
                if self.sync.is_playing() {
                    self.sync.pause();
                } else {
                    self.sync.play(now);
                }
            }
            ReviewCommand::Sync => { self.sync.sync(now); }
            ReviewCommand::SeekFrame(frame)  => self.sync.seek_relative(frame),
            ReviewCommand::SeekFraction(f)   => self.sync.seek_fraction(f),
            ReviewCommand::StepFrames(n) => {
                self.sync.pause();
                self.sync.step(n);
            }
            ReviewCommand::SetFrameOffset { side, frame } => {
                self.sync.set_frame_offset(side, frame);
            }

            ReviewCommand::SelectTool(mode) => self.toolkit.select_tool(mode),
            ReviewCommand::PointerMoved(p)  => self.toolkit.pointer_moved(p),
            ReviewCommand::Click(p) => {
                self.toolkit.pointer_moved(p);
                let sent = self.toolkit.apply_tool();
                self.queue(sent);
            }
            ReviewCommand::BeginDrag(p) => { self.toolkit.begin_drag(p); }
            ReviewCommand::DragTo(p)    => self.toolkit.drag_to(p),
            ReviewCommand::EndDrag => {
                let sent = self.toolkit.end_drag();
                self.queue(sent);
            }
            ReviewCommand::ClearRulers => self.toolkit.clear_rulers(),

            ReviewCommand::NextEvent     => self.jump_to_event(true),
            ReviewCommand::PreviousEvent => self.jump_to_event(false),

            ReviewCommand::Reset => self.reset(),
        }
    }

    fn queue(&mut self, payload: Option<MeasurementPayload>) {
        if let Some(p) = payload {
            self.outbox.push(p);
        }
    }

    fn jump_to_event(&mut self, forward: bool) {
        let sc = self.sync.scrubber();
        let Some(here) = sc.fraction() else { return };
        // Seeks land on whole frames, so treat anything within half a frame as "here".
        let slack = 0.5 / sc.max as f64;
        let here  = here as f64;
        let target = if forward {
            self.events.next_event_after(here + slack)
        } else {
            self.events.previous_event_before(here - slack)
        };
        if let Some(e) = target {
            duoscope_log!("[events] jump to event at {:.3}", e.start);
            let start = e.start as f32;
            self.sync.pause();
            self.sync.seek_fraction(start);
        }
    }

    // ── Output ───────────────────────────────────────────────────────────────

    /// Hand every queued payload to `sink`.
    pub fn flush_to(&mut self, sink: &mut dyn MeasurementSink) {
        for p in self.outbox.drain(..) {
            sink.send(p);
        }
    }

    /// Keep the toolkit's idea of the canvas in step with the host widget.
    pub fn set_canvas_size(&mut self, width: f32, height: f32) {
        self.toolkit.set_canvas_size(width, height);
    }

    /// One host step: drift check, then paint video, event bar and rulers.
    pub fn frame<S, T>(&mut self, now: Duration, main: &mut S, scrubber: &mut T) -> TickReport
    where
        S: FrameSurface<M::Frame>,
        T: Surface,
    {
        let report = self.sync.tick(now);

        let (w, h) = main.size();
        self.toolkit.set_canvas_size(w, h);
        main.clear();
        self.sync.draw(main);
        self.events.draw(scrubber, self.sync.scrubber());
        self.toolkit.render(main);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::geometry::Point;
    use crate::testing::{DrawOp, FakeStream, RecordingSurface};
    use crate::toolkit::ToolMode;

    fn session() -> ReviewSession<FakeStream> {
        let mut s = ReviewSession::new(ReviewConfig::default());
        s.load_media(Some(FakeStream::new(10.0)), Some(FakeStream::new(10.0)));
        s.set_canvas_size(640.0, 360.0);
        s
    }

    fn record(qr: i64, acts: &[(i64, i64)]) -> DetectionRecord {
        DetectionRecord {
            qr_frame:   Some(qr),
            activities: acts.iter().enumerate().map(|(i, &(s, e))| crate::detection::Activity {
                id: i as u32 + 1, frame_start: s, frame_end: e,
            }).collect(),
        }
    }

    const T0: Duration = Duration::ZERO;

    #[test]
    fn metadata_sets_offset_and_events() {
        let mut s = session();
        assert_eq!(s.load_metadata(Side::Left, &record(30, &[(60, 120), (150, 180)])), 2);
        assert_eq!(s.synchronizer().handle(Side::Left).unwrap().frame_offset(), 30);
        let e = s.events().events()[0];
        assert!((e.start - 30.0 / 270.0).abs() < 1e-12);
        assert!((e.end - 90.0 / 270.0).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_activity_frames_do_not_panic() {
        let json = r#"{"DetectedEvents":[
            {"Event_QRCode":{"frame":30}},
            {"Event_Activity_1":{"frame_start":"-1e30","frame_end":120}}
        ]}"#;
        let rec = DetectionRecord::parse(json).unwrap();
        assert_eq!(rec.activities[0].frame_start, i64::MIN);

        let mut s = session();
        assert_eq!(s.load_metadata(Side::Left, &rec), 1);
        let e = s.events().events()[0];
        assert_eq!(e.start, 0.0);
        assert!((e.end - 90.0 / 270.0).abs() < 1e-12);
    }

    #[test]
    fn metadata_for_absent_stream_is_ignored() {
        let mut s: ReviewSession<FakeStream> = ReviewSession::new(ReviewConfig::default());
        s.load_media(Some(FakeStream::new(10.0)), None);
        assert_eq!(s.load_metadata(Side::Right, &record(5, &[(10, 20)])), 0);
        assert!(s.events().is_empty());
    }

    #[test]
    fn clicks_queue_exactly_one_payload() {
        let mut s = session();
        s.apply(ReviewCommand::SelectTool(ToolMode::Ruler), T0);
        for p in [(100.0, 100.0), (200.0, 150.0), (420.0, 100.0), (520.0, 150.0)] {
            s.apply(ReviewCommand::Click(Point::new(p.0, p.1)), T0);
        }
        s.apply(ReviewCommand::Click(Point::new(10.0, 10.0)), T0);
        let mut sink: Vec<MeasurementPayload> = Vec::new();
        s.flush_to(&mut sink);
        assert_eq!(sink.len(), 1);
        s.flush_to(&mut sink);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn frame_paints_in_fixed_order() {
        let mut s = session();
        s.apply(ReviewCommand::SelectTool(ToolMode::Ruler), T0);
        s.apply(ReviewCommand::Click(Point::new(100.0, 100.0)), T0);
        let mut main = RecordingSurface::new(640.0, 360.0);
        let mut bar  = RecordingSurface::new(640.0, 12.0);
        s.frame(T0, &mut main, &mut bar);
        assert_eq!(main.ops[0], DrawOp::Clear);
        assert!(matches!(main.ops[1], DrawOp::Blit(..)));
        assert!(matches!(main.ops[2], DrawOp::Blit(..)));
        assert!(matches!(main.ops[3], DrawOp::Circle(..)));
        // playhead at frame 0 of 300
        assert_eq!(bar.rects().len(), 1);
    }

    #[test]
    fn toggle_play_flips_transport() {
        let mut s = session();
        s.apply(ReviewCommand::TogglePlay, T0);
        assert!(s.synchronizer().is_playing());
        s.apply(ReviewCommand::TogglePlay, T0);
        assert!(!s.synchronizer().is_playing());
    }

    #[test]
    fn event_navigation_seeks_to_event_start() {
        let mut s = session();
        s.load_metadata(Side::Left, &record(0, &[(90, 120), (30, 60)]));
        let mut main = RecordingSurface::new(640.0, 360.0);
        let mut bar  = RecordingSurface::new(640.0, 12.0);
        s.frame(T0, &mut main, &mut bar);

        s.apply(ReviewCommand::NextEvent, T0);
        assert_eq!(s.synchronizer().scrubber().value, 30);
        s.apply(ReviewCommand::NextEvent, T0);
        assert_eq!(s.synchronizer().scrubber().value, 90);
        s.apply(ReviewCommand::NextEvent, T0);
        assert_eq!(s.synchronizer().scrubber().value, 90);
        s.apply(ReviewCommand::PreviousEvent, T0);
        assert_eq!(s.synchronizer().scrubber().value, 30);
    }

    #[test]
    fn reset_drops_everything_but_config() {
        let mut s = session();
        s.load_metadata(Side::Left, &record(10, &[(20, 40)]));
        s.apply(ReviewCommand::Play, T0);
        s.apply(ReviewCommand::Reset, T0);
        assert!(!s.synchronizer().has_media());
        assert!(s.events().is_empty());
        assert!(s.toolkit().ruler(Side::Left).is_none());
        assert_eq!(s.toolkit().canvas_size(), (640.0, 360.0));
        assert_eq!(s.config(), &ReviewConfig::default());
    }
}
