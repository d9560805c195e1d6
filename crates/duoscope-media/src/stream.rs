// crates/duoscope-media/src/stream.rs
//
// VideoStream: a video file with its own playback clock and a background
// decode thread, exposed to the core through `MediaStream`.
//
// Each stream runs on its own wall clock, exactly like two independent
// players would; keeping the pair aligned is the synchronizer's job.
//
// Decode thread protocol (crossbeam channels):
//   UI → thread   DecodeCmd::Show / Play / Stop, tagged with a generation
//   thread → UI   DecodedFrame, tagged with the generation that asked for it
//
// Every seek, play or pause bumps the generation, so frames already in
// flight for an old position are dropped by `pump` instead of flashing up.
// The frame channel is bounded: a full channel blocks the decoder, which is
// the rate limit during playback. Dropping the stream disconnects both
// channels and the thread exits.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use anyhow::Result;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TryRecvError};

use duoscope_core::duoscope_log;
use duoscope_core::media_types::{MediaInfo, RgbaFrame};
use duoscope_core::stream::MediaStream;

use crate::decode::FrameDecoder;

/// Decoded frames buffered ahead of the clock (~1 s at 30 fps).
const FRAME_LOOKAHEAD: usize = 32;

enum DecodeCmd {
    /// Decode the single frame at `ts` and stop.
    Show { ts: f64, generation: u64 },
    /// Decode continuously from `ts`.
    Play { ts: f64, generation: u64 },
    Stop,
}

struct DecodedFrame {
    generation: u64,
    frame:      RgbaFrame,
}

// ── Playback clock ───────────────────────────────────────────────────────────

/// Wall-clock position of one stream, clamped to its duration.
#[derive(Clone, Copy, Debug)]
struct PlaybackClock {
    base:     f64,
    started:  Option<Instant>,
    duration: f64,
}

impl PlaybackClock {
    fn new(duration: f64) -> Self {
        Self { base: 0.0, started: None, duration: duration.max(0.0) }
    }

    fn position(&self, at: Instant) -> f64 {
        let run = self.started.map_or(0.0, |s| at.saturating_duration_since(s).as_secs_f64());
        (self.base + run).min(self.duration)
    }

    fn is_running(&self) -> bool { self.started.is_some() }

    fn ended(&self, at: Instant) -> bool {
        self.duration > 0.0 && self.position(at) >= self.duration
    }

    fn start(&mut self, at: Instant) {
        if self.started.is_none() {
            self.started = Some(at);
        }
    }

    fn stop(&mut self, at: Instant) {
        self.base    = self.position(at);
        self.started = None;
    }

    fn set(&mut self, secs: f64, at: Instant) {
        self.base = secs.clamp(0.0, self.duration);
        if self.started.is_some() {
            self.started = Some(at);
        }
    }
}

// ── VideoStream ──────────────────────────────────────────────────────────────

pub struct VideoStream {
    path:       PathBuf,
    info:       MediaInfo,
    clock:      PlaybackClock,
    current:    Option<RgbaFrame>,
    /// Next frame of the running generation, still ahead of the clock.
    pending:    Option<RgbaFrame>,
    generation: u64,
    cmd_tx:     Sender<DecodeCmd>,
    frame_rx:   Receiver<DecodedFrame>,
}

impl VideoStream {
    /// Start the decode thread for `path` and show its first frame.
    /// `max_width` caps the decoded picture width (0 = native).
    pub fn open(path: &Path, info: MediaInfo, max_width: u32) -> Result<Self> {
        let (cmd_tx, cmd_rx)     = unbounded::<DecodeCmd>();
        let (frame_tx, frame_rx) = bounded::<DecodedFrame>(FRAME_LOOKAHEAD);

        let thread_path = path.to_path_buf();
        thread::Builder::new()
            .name(format!("decode {}", path.display()))
            .spawn(move || decode_loop(thread_path, max_width, cmd_rx, frame_tx))?;

        let mut s = Self {
            path: path.to_path_buf(),
            info,
            clock:      PlaybackClock::new(info.duration),
            current:    None,
            pending:    None,
            generation: 0,
            cmd_tx,
            frame_rx,
        };
        s.request_show(0.0);
        Ok(s)
    }

    pub fn path(&self) -> &Path { &self.path }
    pub fn info(&self) -> MediaInfo { self.info }

    /// Pull decoded frames that are due. Call once per host step before
    /// drawing. Returns `true` when the displayed frame changed.
    pub fn pump(&mut self) -> bool {
        let now     = self.clock.position(Instant::now());
        let running = self.clock.is_running();
        let mut changed = false;

        loop {
            let next = match self.pending.take() {
                Some(f) => f,
                None => match self.frame_rx.try_recv() {
                    Ok(d) if d.generation == self.generation => d.frame,
                    Ok(_) => continue, // stale position
                    Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
                },
            };
            if running && next.timestamp > now {
                self.pending = Some(next);
                break;
            }
            self.current = Some(next);
            changed = true;
        }
        changed
    }

    fn bump(&mut self) -> u64 {
        self.generation += 1;
        self.pending = None;
        self.generation
    }

    fn request_show(&mut self, ts: f64) {
        let generation = self.bump();
        self.send(DecodeCmd::Show { ts, generation });
    }

    fn request_play(&mut self, ts: f64) {
        let generation = self.bump();
        self.send(DecodeCmd::Play { ts, generation });
    }

    fn send(&self, cmd: DecodeCmd) {
        if self.cmd_tx.send(cmd).is_err() {
            duoscope_log!("[media] decode thread gone for {}", self.path.display());
        }
    }
}

impl MediaStream for VideoStream {
    type Frame = RgbaFrame;

    fn current_time(&self) -> f64 {
        self.clock.position(Instant::now())
    }

    fn set_current_time(&mut self, secs: f64) {
        let at = Instant::now();
        self.clock.set(secs, at);
        let ts = self.clock.position(at);
        if self.clock.is_running() {
            self.request_play(ts);
        } else {
            self.request_show(ts);
        }
    }

    fn duration(&self) -> f64 { self.info.duration }

    fn is_paused(&self) -> bool {
        !self.clock.is_running() || self.is_ended()
    }

    fn is_ended(&self) -> bool {
        self.clock.ended(Instant::now())
    }

    fn play(&mut self) {
        if self.clock.is_running() && !self.is_ended() {
            return;
        }
        let at = Instant::now();
        self.clock.stop(at);
        self.clock.start(at);
        let ts = self.clock.position(at);
        self.request_play(ts);
    }

    fn pause(&mut self) {
        if !self.clock.is_running() {
            return;
        }
        self.clock.stop(Instant::now());
        self.bump();
        self.send(DecodeCmd::Stop);
    }

    fn frame(&self) -> Option<&RgbaFrame> { self.current.as_ref() }
}

// ── Decode thread ────────────────────────────────────────────────────────────

fn decode_loop(
    path:      PathBuf,
    max_width: u32,
    cmd_rx:    Receiver<DecodeCmd>,
    frame_tx:  Sender<DecodedFrame>,
) {
    let mut active: Option<(u64, FrameDecoder)> = None;
    loop {
        // Block for a command while idle; poll while decoding.
        let cmd = if active.is_some() {
            match cmd_rx.try_recv() {
                Ok(c) => Some(c),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => return,
            }
        } else {
            match cmd_rx.recv() {
                Ok(c) => Some(c),
                Err(_) => return,
            }
        };

        match cmd {
            Some(DecodeCmd::Show { ts, generation }) => {
                active = None;
                match FrameDecoder::open(&path, ts, max_width) {
                    Ok(mut d) => {
                        if let Some(frame) = d.advance_to(ts) {
                            if frame_tx.send(DecodedFrame { generation, frame }).is_err() { return; }
                        }
                    }
                    Err(e) => duoscope_log!("[media] open {}: {e}", path.display()),
                }
                continue;
            }
            Some(DecodeCmd::Play { ts, generation }) => {
                active = None;
                match FrameDecoder::open(&path, ts, max_width) {
                    Ok(mut d) => {
                        if let Some(frame) = d.advance_to(ts) {
                            if frame_tx.send(DecodedFrame { generation, frame }).is_err() { return; }
                        }
                        active = Some((generation, d));
                    }
                    Err(e) => duoscope_log!("[media] open {}: {e}", path.display()),
                }
                continue;
            }
            Some(DecodeCmd::Stop) => { active = None; continue; }
            None => {}
        }

        let mut eof = false;
        if let Some((generation, d)) = active.as_mut() {
            match d.next_frame() {
                Some(frame) => {
                    let generation = *generation;
                    if frame_tx.send(DecodedFrame { generation, frame }).is_err() { return; }
                }
                None => eof = true,
            }
        }
        if eof {
            active = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn clock_runs_only_while_started() {
        let t0 = Instant::now();
        let mut c = PlaybackClock::new(10.0);
        assert_eq!(c.position(t0 + Duration::from_secs(3)), 0.0);
        c.start(t0);
        assert!((c.position(t0 + Duration::from_millis(1500)) - 1.5).abs() < 1e-9);
        c.stop(t0 + Duration::from_secs(2));
        assert!((c.position(t0 + Duration::from_secs(9)) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn clock_clamps_at_duration_and_reports_end() {
        let t0 = Instant::now();
        let mut c = PlaybackClock::new(2.0);
        c.start(t0);
        let later = t0 + Duration::from_secs(5);
        assert_eq!(c.position(later), 2.0);
        assert!(c.ended(later));
        c.set(0.5, later);
        assert!(!c.ended(later));
        assert!((c.position(later + Duration::from_millis(500)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn set_is_clamped() {
        let t0 = Instant::now();
        let mut c = PlaybackClock::new(4.0);
        c.set(-1.0, t0);
        assert_eq!(c.position(t0), 0.0);
        c.set(9.0, t0);
        assert_eq!(c.position(t0), 4.0);
    }
}
