// crates/duoscope-core/src/testing.rs
//
// Test doubles shared by the unit tests in this crate.

use crate::helpers::geometry::{Point, Rect};
use crate::stream::MediaStream;
use crate::surface::{FrameSurface, Rgba, Surface};

/// A stream whose clock only moves when the test calls `advance`.
pub struct FakeStream {
    pub time:     f64,
    pub duration: f64,
    pub paused:   bool,
    pub ended:    bool,
    pub frame:    Option<u32>,
}

impl FakeStream {
    pub fn new(duration: f64) -> Self {
        Self { time: 0.0, duration, paused: true, ended: false, frame: Some(0) }
    }

    /// Let `secs` of wall-clock pass. Paused or ended streams don't move;
    /// reaching the end pauses the stream and raises `ended`.
    pub fn advance(&mut self, secs: f64) {
        if self.paused || self.ended {
            return;
        }
        self.time += secs;
        if self.time >= self.duration {
            self.time   = self.duration;
            self.ended  = true;
            self.paused = true;
        }
    }
}

impl MediaStream for FakeStream {
    type Frame = u32;

    fn current_time(&self) -> f64 { self.time }
    fn set_current_time(&mut self, secs: f64) {
        self.time = secs;
        if secs < self.duration {
            self.ended = false;
        }
    }
    fn duration(&self) -> f64 { self.duration }
    fn is_paused(&self) -> bool { self.paused }
    fn is_ended(&self) -> bool { self.ended }
    fn play(&mut self) {
        self.paused = false;
        self.ended  = false;
    }
    fn pause(&mut self) { self.paused = true; }
    fn frame(&self) -> Option<&u32> { self.frame.as_ref() }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Clear,
    Rect(Rect, Rgba),
    Line(Point, Point, Rgba),
    Circle(Point, Rgba),
    Blit(u32, Rect),
}

/// Records every draw call instead of painting.
pub struct RecordingSurface {
    pub width:  f32,
    pub height: f32,
    pub ops:    Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height, ops: Vec::new() }
    }

    pub fn rects(&self) -> Vec<(Rect, Rgba)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Rect(r, c) => Some((*r, *c)),
            _ => None,
        }).collect()
    }

    pub fn count(&self, pred: impl Fn(&DrawOp) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (f32, f32) { (self.width, self.height) }
    fn clear(&mut self) { self.ops.push(DrawOp::Clear); }
    fn fill_rect(&mut self, rect: Rect, colour: Rgba) {
        self.ops.push(DrawOp::Rect(rect, colour));
    }
    fn line(&mut self, from: Point, to: Point, _width: f32, colour: Rgba) {
        self.ops.push(DrawOp::Line(from, to, colour));
    }
    fn fill_circle(&mut self, centre: Point, _radius: f32, colour: Rgba) {
        self.ops.push(DrawOp::Circle(centre, colour));
    }
}

impl FrameSurface<u32> for RecordingSurface {
    fn blit(&mut self, frame: &u32, dest: Rect) {
        self.ops.push(DrawOp::Blit(*frame, dest));
    }
}
