// crates/duoscope-core/src/events.rs
//
// EventOverlay: detected-event intervals drawn as coloured bands on the
// scrubber surface, plus the white playhead marker.
//
// Event positions are fractions of the usable (offset-trimmed) range, so the
// same overlay lines up with the scrubber whatever the surface width.

use uuid::Uuid;

use crate::helpers::geometry::Rect;
use crate::surface::{Rgba, Surface};
use crate::sync::ScrubberState;

/// Width of the playhead marker in pixels.
pub const MARKER_WIDTH: f32 = 5.0;

/// Navigation ignores events closer than this to the current position, so
/// jumping to an event and asking for the next one moves on.
const NAV_EPSILON: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Event {
    pub start:  f64,
    pub end:    f64,
    pub colour: Rgba,
}

/// A fresh colour built from random UUID bytes.
fn random_colour() -> Rgba {
    let b = Uuid::new_v4().into_bytes();
    Rgba::rgb(b[0], b[1], b[2])
}

#[derive(Debug, Default)]
pub struct EventOverlay {
    events: Vec<Event>,
}

impl EventOverlay {
    pub fn new() -> Self { Self::default() }

    /// Add an interval given as fractions of the usable range. Bounds are
    /// clamped to `[0, 1]` and put in order.
    pub fn add_event(&mut self, start: f64, end: f64) -> &Event {
        let (a, b) = (start.clamp(0.0, 1.0), end.clamp(0.0, 1.0));
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        self.events.push(Event { start, end, colour: random_colour() });
        &self.events[self.events.len() - 1]
    }

    /// Add an interval given in raw stream frames.
    ///
    /// `(raw − offset) / adjusted` per bound; nothing is added when the
    /// stream has no usable range yet.
    pub fn add_raw_event(
        &mut self,
        raw_start: i64,
        raw_end:   i64,
        offset:    u64,
        adjusted:  u64,
    ) -> Option<&Event> {
        if adjusted == 0 {
            return None;
        }
        // Float arithmetic: malformed records can carry frames near i64::MIN.
        let norm = |raw: i64| (raw as f64 - offset as f64) / adjusted as f64;
        Some(self.add_event(norm(raw_start), norm(raw_end)))
    }

    pub fn events(&self) -> &[Event] { &self.events }
    pub fn len(&self) -> usize { self.events.len() }
    pub fn is_empty(&self) -> bool { self.events.is_empty() }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// First event starting after `fraction`.
    pub fn next_event_after(&self, fraction: f64) -> Option<&Event> {
        self.events
            .iter()
            .filter(|e| e.start > fraction + NAV_EPSILON)
            .min_by(|a, b| a.start.total_cmp(&b.start))
    }

    /// Last event starting before `fraction`.
    pub fn previous_event_before(&self, fraction: f64) -> Option<&Event> {
        self.events
            .iter()
            .filter(|e| e.start < fraction - NAV_EPSILON)
            .max_by(|a, b| a.start.total_cmp(&b.start))
    }

    /// Repaint the scrubber surface: bands first, playhead marker on top.
    pub fn draw(&mut self, surface: &mut dyn Surface, scrubber: &ScrubberState) {
        let (w, h) = surface.size();
        surface.clear();
        for e in &self.events {
            let x0 = (e.start * w as f64) as f32;
            let x1 = (e.end * w as f64) as f32;
            surface.fill_rect(Rect::new(x0, 0.0, x1 - x0, h), e.colour);
        }
        if let Some(f) = scrubber.fraction() {
            surface.fill_rect(Rect::new(f * w, 0.0, MARKER_WIDTH, h), Rgba::WHITE);
        }
    }
}
