// crates/duoscope-core/src/helpers/geometry.rs
//
// Canvas-space geometry for the measurement overlay.
//
// All coordinates are canvas-local pixels: (0, 0) is the top-left corner of
// the split display, x grows right, y grows down. The display is divided at
// its vertical midline into a left half and a right half; each half is the
// local frame of one camera.

use serde::{Deserialize, Serialize};

/// Which half of the split display (and which camera) something belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn other(self) -> Side {
        match self {
            Side::Left  => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Side of the display containing canvas x-coordinate `x`.
    /// The midline itself belongs to the left half.
    ///
    /// ```
    /// use duoscope_core::helpers::geometry::Side;
    /// assert_eq!(Side::at(320.0, 640.0), Side::Left);
    /// assert_eq!(Side::at(320.5, 640.0), Side::Right);
    /// ```
    pub fn at(x: f32, canvas_width: f32) -> Side {
        if x <= canvas_width / 2.0 { Side::Left } else { Side::Right }
    }

    /// Horizontal origin of this side's local frame.
    pub fn origin_x(self, canvas_width: f32) -> f32 {
        match self {
            Side::Left  => 0.0,
            Side::Right => canvas_width / 2.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Side::Left  => "left",
            Side::Right => "right",
        }
    }
}

/// A position on the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self { Self { x, y } }

    /// Clamp into `[0, width] × [0, height]`.
    pub fn clamped(self, width: f32, height: f32) -> Self {
        Self {
            x: self.x.clamp(0.0, width.max(0.0)),
            y: self.y.clamp(0.0, height.max(0.0)),
        }
    }

    pub fn distance_to(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Re-express this canvas point in `side`'s half-local frame.
    pub fn to_half_local(self, side: Side, canvas_width: f32) -> Point {
        Point { x: self.x - side.origin_x(canvas_width), y: self.y }
    }
}

/// Axis-aligned rectangle in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self { Self { x, y, w, h } }

    /// Left or right half of a `width × height` canvas.
    pub fn half(side: Side, width: f32, height: f32) -> Self {
        Rect::new(side.origin_x(width), 0.0, width / 2.0, height)
    }

    pub fn right(&self) -> f32 { self.x + self.w }
}

/// Segment between two points. Derived from a ruler, never stored on its own.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line {
    pub start: Point,
    pub end:   Point,
}

impl Line {
    pub fn new(start: Point, end: Point) -> Self { Self { start, end } }

    /// Euclidean length rounded to three decimals.
    ///
    /// ```
    /// use duoscope_core::helpers::geometry::{Line, Point};
    /// let l = Line::new(Point::new(0.0, 0.0), Point::new(3.0, 4.0));
    /// assert_eq!(l.length(), 5.0);
    /// ```
    pub fn length(&self) -> f64 {
        let dx = (self.end.x - self.start.x) as f64;
        let dy = (self.end.y - self.start.y) as f64;
        ((dx * dx + dy * dy).sqrt() * 1000.0).round() / 1000.0
    }

    /// Rotation, in degrees, of a vertical bar anchored at `start` so that it
    /// lies along the segment. This is what the overlay uses to orient the
    /// drawn ruler body.
    pub fn angle_degrees(&self) -> f64 {
        let dy = (self.start.y - self.end.y) as f64;
        let dx = (self.start.x - self.end.x) as f64;
        (dy.atan2(dx) + std::f64::consts::FRAC_PI_2).to_degrees()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_is_symmetric() {
        let a = Point::new(12.5, 80.0);
        let b = Point::new(200.25, 17.75);
        assert_eq!(Line::new(a, b).length(), Line::new(b, a).length());
    }

    #[test]
    fn length_rounds_to_three_decimals() {
        let l = Line::new(Point::new(0.0, 0.0), Point::new(1.0, 1.0));
        assert_eq!(l.length(), 1.414);
    }

    #[test]
    fn angle_of_downward_segment() {
        // start above end: the bar hangs straight down, no rotation
        let l = Line::new(Point::new(10.0, 10.0), Point::new(10.0, 50.0));
        assert!(l.angle_degrees().abs() < 1e-9);
    }

    #[test]
    fn half_local_right_side_subtracts_midline() {
        let p = Point::new(500.0, 40.0).to_half_local(Side::Right, 640.0);
        assert_eq!(p, Point::new(180.0, 40.0));
        let q = Point::new(100.0, 40.0).to_half_local(Side::Left, 640.0);
        assert_eq!(q, Point::new(100.0, 40.0));
    }

    #[test]
    fn clamp_keeps_points_on_canvas() {
        let p = Point::new(-4.0, 900.0).clamped(640.0, 360.0);
        assert_eq!(p, Point::new(0.0, 360.0));
    }

    #[test]
    fn halves_tile_the_canvas() {
        let l = Rect::half(Side::Left, 640.0, 360.0);
        let r = Rect::half(Side::Right, 640.0, 360.0);
        assert_eq!(l.right(), r.x);
        assert_eq!(r.right(), 640.0);
    }
}
