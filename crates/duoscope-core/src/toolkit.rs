// crates/duoscope-core/src/toolkit.rs
//
// MeasurementToolkit: tool selection, one active ruler per camera half,
// drag editing and measurement emission.
//
// Pointer positions arrive already canvas-local (the host subtracts the
// canvas origin). The half a click lands in is decided by the midline:
// x ≤ width / 2 is the left camera.
//
// Emission rule: a payload leaves the toolkit exactly once per newly completed
// pair: when a click completes a ruler and the other half is already
// complete, and again after a drag edit while both halves are complete.
// Clicks on a half whose ruler is already complete are ignored, unless ruler
// history is on, in which case the finished ruler is archived and a new one
// started.

use crate::config::ReviewConfig;
use crate::duoscope_log;
use crate::helpers::geometry::{Point, Rect, Side};
use crate::payload::{Keypoints, MeasurementPayload};
use crate::ruler::{PointIndex, Ruler};
use crate::surface::{Drawable, Rgba, Surface};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ToolMode {
    #[default]
    None,
    Ruler,
    Clear,
}

impl ToolMode {
    pub fn label(self) -> &'static str {
        match self {
            ToolMode::None  => "none",
            ToolMode::Ruler => "ruler",
            ToolMode::Clear => "clear",
        }
    }
}

/// Line lengths for the readout panel. `None` for a half without a complete ruler.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RulerReadout {
    pub left:  Option<f64>,
    pub right: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct DragTarget {
    side:  Side,
    point: PointIndex,
}

pub struct MeasurementToolkit {
    mode:            ToolMode,
    canvas:          (f32, f32),
    pointer:         Option<Point>,
    left:            Option<Ruler>,
    right:           Option<Ruler>,
    history_left:    Vec<Ruler>,
    history_right:   Vec<Ruler>,
    drag:            Option<DragTarget>,
    readout_visible: bool,

    keep_history:    bool,
    grab_radius:     f32,
    point_radius:    f32,
    left_colour:     Rgba,
    right_colour:    Rgba,
}

impl MeasurementToolkit {
    pub fn new(config: &ReviewConfig) -> Self {
        Self {
            mode:            ToolMode::None,
            canvas:          (0.0, 0.0),
            pointer:         None,
            left:            None,
            right:           None,
            history_left:    Vec::new(),
            history_right:   Vec::new(),
            drag:            None,
            readout_visible: false,
            keep_history:    config.keep_ruler_history,
            grab_radius:     config.grab_radius_px,
            point_radius:    config.point_radius_px,
            left_colour:     config.left_colour,
            right_colour:    config.right_colour,
        }
    }

    pub fn set_canvas_size(&mut self, width: f32, height: f32) {
        self.canvas = (width.max(0.0), height.max(0.0));
    }

    pub fn canvas_size(&self) -> (f32, f32) { self.canvas }

    /// Record the latest canvas-local pointer position.
    pub fn pointer_moved(&mut self, pos: Point) {
        let (w, h) = self.canvas;
        self.pointer = Some(pos.clamped(w, h));
    }

    pub fn pointer(&self) -> Option<Point> { self.pointer }

    // ── Tool selection ───────────────────────────────────────────────────────

    pub fn mode(&self) -> ToolMode { self.mode }

    /// Selecting the active tool again deselects it.
    pub fn select_tool(&mut self, mode: ToolMode) {
        self.mode = if self.mode == mode { ToolMode::None } else { mode };
        duoscope_log!("[toolkit] tool → {}", self.mode.label());
    }

    /// Run the active tool at the last pointer position.
    pub fn apply_tool(&mut self) -> Option<MeasurementPayload> {
        match self.mode {
            ToolMode::Ruler => self.add_ruler_point(),
            ToolMode::Clear => {
                self.clear_rulers();
                None
            }
            ToolMode::None => {
                duoscope_log!("[toolkit] click with no tool selected");
                None
            }
        }
    }

    // ── Rulers ───────────────────────────────────────────────────────────────

    pub fn ruler(&self, side: Side) -> Option<&Ruler> {
        match side {
            Side::Left  => self.left.as_ref(),
            Side::Right => self.right.as_ref(),
        }
    }

    /// Completed rulers archived on `side`, oldest first.
    pub fn history(&self, side: Side) -> &[Ruler] {
        match side {
            Side::Left  => &self.history_left,
            Side::Right => &self.history_right,
        }
    }

    fn slot(&mut self, side: Side) -> (&mut Option<Ruler>, &mut Vec<Ruler>) {
        match side {
            Side::Left  => (&mut self.left, &mut self.history_left),
            Side::Right => (&mut self.right, &mut self.history_right),
        }
    }

    fn colour(&self, side: Side) -> Rgba {
        match side {
            Side::Left  => self.left_colour,
            Side::Right => self.right_colour,
        }
    }

    /// Place the next ruler point at the last pointer position.
    pub fn add_ruler_point(&mut self) -> Option<MeasurementPayload> {
        let Some(pos) = self.pointer else {
            duoscope_log!("[toolkit] ruler click before any pointer position");
            return None;
        };
        let side         = Side::at(pos.x, self.canvas.0);
        let colour       = self.colour(side);
        let point_radius = self.point_radius;
        let keep_history = self.keep_history;

        let (active, history) = self.slot(side);
        if active.as_ref().is_some_and(Ruler::is_complete) {
            if !keep_history {
                return None;
            }
            history.extend(active.take());
        }
        let ruler     = active.get_or_insert_with(|| Ruler::new(colour, point_radius));
        let completed = ruler.add_point(pos);
        duoscope_log!(
            "[toolkit] {} ruler point ({:.1}, {:.1}){}",
            side.label(), pos.x, pos.y, if completed { " (complete)" } else { "" }
        );

        if completed { self.emit() } else { None }
    }

    /// Drop every ruler and hide the readout. Safe to call repeatedly.
    pub fn clear_rulers(&mut self) {
        self.left  = None;
        self.right = None;
        self.history_left.clear();
        self.history_right.clear();
        self.drag = None;
        self.readout_visible = false;
    }

    /// Build the payload if both halves hold a complete ruler.
    pub fn payload(&self) -> Option<MeasurementPayload> {
        let w = self.canvas.0;
        let keypoints = |side: Side| -> Option<Keypoints> {
            let r = self.ruler(side)?;
            Some(Keypoints {
                p0: r.point1()?.to_half_local(side, w),
                p1: r.point2()?.to_half_local(side, w),
            })
        };
        Some(MeasurementPayload {
            keypoints_left:  keypoints(Side::Left)?,
            keypoints_right: keypoints(Side::Right)?,
        })
    }

    fn emit(&mut self) -> Option<MeasurementPayload> {
        let payload = self.payload()?;
        self.readout_visible = true;
        duoscope_log!("[toolkit] measurement pair complete");
        Some(payload)
    }

    // ── Drag editing ─────────────────────────────────────────────────────────

    /// Grab the ruler point nearest to `pos`, if one is within the grab radius.
    pub fn begin_drag(&mut self, pos: Point) -> bool {
        self.drag = Side::BOTH
            .into_iter()
            .filter_map(|side| {
                let (point, d) = self.ruler(side)?.hit(pos, self.grab_radius)?;
                Some((DragTarget { side, point }, d))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(t, _)| t);
        self.drag.is_some()
    }

    pub fn is_dragging(&self) -> bool { self.drag.is_some() }

    /// Move the grabbed point, kept inside its own half.
    pub fn drag_to(&mut self, pos: Point) {
        let Some(target) = self.drag else { return };
        let (w, h) = self.canvas;
        let half = Rect::half(target.side, w, h);
        let to = Point::new(pos.x.clamp(half.x, half.right()), pos.y.clamp(0.0, h));
        self.pointer = Some(to);
        let (active, _) = self.slot(target.side);
        if let Some(r) = active.as_mut() {
            r.move_point(target.point, to);
        }
    }

    /// Release the grabbed point; re-send if both halves are complete.
    pub fn end_drag(&mut self) -> Option<MeasurementPayload> {
        self.drag.take()?;
        self.emit()
    }

    // ── Output ───────────────────────────────────────────────────────────────

    pub fn readout(&self) -> RulerReadout {
        let len = |side| self.ruler(side).and_then(Ruler::line).map(|l| l.length());
        RulerReadout { left: len(Side::Left), right: len(Side::Right) }
    }

    pub fn readout_visible(&self) -> bool { self.readout_visible }

    /// Paint archived rulers, then each half's active ruler.
    pub fn render(&self, surface: &mut dyn Surface) {
        for side in Side::BOTH {
            for r in self.history(side) {
                r.render(surface);
            }
            if let Some(r) = self.ruler(side) {
                r.render(surface);
            }
        }
    }
}
