// crates/duoscope-core/src/ruler.rs
//
// A ruler is a two-point measurement on one camera half. It is created by the
// first ruler-tool click on a half and completed by the second; after that its
// points can only be moved by dragging.
//
// Rendering goes through the Drawable trait. Building a ruler never paints.

use uuid::Uuid;

use crate::helpers::geometry::{Line, Point};
use crate::surface::{Drawable, Rgba, Surface};

/// Stroke width of a ruler's line.
pub const LINE_WIDTH: f32 = 2.0;

/// Which of a ruler's two points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointIndex {
    First,
    Second,
}

/// A point marker: filled disc `radius × π` across.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Marker {
    pub at:     Point,
    pub radius: f32,
    pub colour: Rgba,
}

impl Drawable for Marker {
    fn render(&self, surface: &mut dyn Surface) {
        surface.fill_circle(self.at, self.radius * std::f32::consts::PI, self.colour);
    }
}

/// A ruler's connecting segment in its colour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub line:   Line,
    pub colour: Rgba,
}

impl Drawable for Segment {
    fn render(&self, surface: &mut dyn Surface) {
        surface.line(self.line.start, self.line.end, LINE_WIDTH, self.colour);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Ruler {
    pub id:           Uuid,
    pub colour:       Rgba,
    pub point_radius: f32,
    point1:           Option<Point>,
    point2:           Option<Point>,
}

impl Ruler {
    pub fn new(colour: Rgba, point_radius: f32) -> Self {
        Self { id: Uuid::new_v4(), colour, point_radius, point1: None, point2: None }
    }

    /// Place the next point. Returns `true` when this call completed the ruler.
    /// A complete ruler ignores further points.
    pub fn add_point(&mut self, p: Point) -> bool {
        match (self.point1, self.point2) {
            (None, _)          => { self.point1 = Some(p); false }
            (Some(_), None)    => { self.point2 = Some(p); true }
            (Some(_), Some(_)) => false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.point1.is_some() && self.point2.is_some()
    }

    pub fn point1(&self) -> Option<Point> { self.point1 }
    pub fn point2(&self) -> Option<Point> { self.point2 }

    pub fn point(&self, idx: PointIndex) -> Option<Point> {
        match idx {
            PointIndex::First  => self.point1,
            PointIndex::Second => self.point2,
        }
    }

    /// Move an existing point. Unset points stay unset.
    pub fn move_point(&mut self, idx: PointIndex, to: Point) {
        let slot = match idx {
            PointIndex::First  => &mut self.point1,
            PointIndex::Second => &mut self.point2,
        };
        if slot.is_some() {
            *slot = Some(to);
        }
    }

    pub fn line(&self) -> Option<Line> {
        Some(Line::new(self.point1?, self.point2?))
    }

    /// Closest placed point within `radius` of `pos`, with its distance.
    pub fn hit(&self, pos: Point, radius: f32) -> Option<(PointIndex, f32)> {
        [PointIndex::First, PointIndex::Second]
            .into_iter()
            .filter_map(|idx| self.point(idx).map(|p| (idx, p.distance_to(pos))))
            .filter(|&(_, d)| d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    fn markers(&self) -> impl Iterator<Item = Marker> + '_ {
        self.point1.into_iter().chain(self.point2).map(|at| Marker {
            at, radius: self.point_radius, colour: self.colour,
        })
    }
}

impl Drawable for Ruler {
    fn render(&self, surface: &mut dyn Surface) {
        if let Some(line) = self.line() {
            Segment { line, colour: self.colour }.render(surface);
        }
        for m in self.markers() {
            m.render(surface);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{DrawOp, RecordingSurface};

    const RED: Rgba = Rgba::rgb(0xFF, 0x11, 0x44);

    #[test]
    fn completes_on_second_point_only() {
        let mut r = Ruler::new(RED, 2.0);
        assert!(!r.add_point(Point::new(1.0, 1.0)));
        assert!(!r.is_complete());
        assert!(r.add_point(Point::new(5.0, 5.0)));
        assert!(r.is_complete());
        assert!(!r.add_point(Point::new(9.0, 9.0)));
        assert_eq!(r.point2(), Some(Point::new(5.0, 5.0)));
    }

    #[test]
    fn move_keeps_completeness() {
        let mut r = Ruler::new(RED, 2.0);
        r.move_point(PointIndex::First, Point::new(3.0, 3.0));
        assert_eq!(r.point1(), None);
        r.add_point(Point::new(0.0, 0.0));
        r.add_point(Point::new(3.0, 4.0));
        r.move_point(PointIndex::Second, Point::new(6.0, 8.0));
        assert!(r.is_complete());
        assert_eq!(r.line().unwrap().length(), 10.0);
    }

    #[test]
    fn hit_picks_nearest_point_in_radius() {
        let mut r = Ruler::new(RED, 2.0);
        r.add_point(Point::new(10.0, 10.0));
        r.add_point(Point::new(16.0, 10.0));
        assert_eq!(r.hit(Point::new(14.0, 10.0), 8.0).map(|h| h.0), Some(PointIndex::Second));
        assert!(r.hit(Point::new(40.0, 40.0), 8.0).is_none());
    }

    #[test]
    fn renders_line_before_markers() {
        let mut r = Ruler::new(RED, 2.0);
        r.add_point(Point::new(0.0, 0.0));
        let mut s = RecordingSurface::new(100.0, 100.0);
        r.render(&mut s);
        assert_eq!(s.ops, vec![DrawOp::Circle(Point::new(0.0, 0.0), RED)]);

        r.add_point(Point::new(3.0, 4.0));
        let mut s = RecordingSurface::new(100.0, 100.0);
        r.render(&mut s);
        assert!(matches!(s.ops[0], DrawOp::Line(..)));
        assert_eq!(s.count(|op| matches!(op, DrawOp::Circle(..))), 2);
    }
}
