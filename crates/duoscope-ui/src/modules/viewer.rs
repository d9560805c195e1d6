// crates/duoscope-ui/src/modules/viewer.rs
//
// ViewerModule: the split-screen canvas and the scrubber bar under it.
//
// This module only lays out and reads input. Painting happens afterwards in
// DuoscopeApp::paint, which hands both rects to ReviewSession::frame so the
// core controls draw order. Pointer positions are sent canvas-local.

use egui::{Pos2, Rect, RichText, Sense, Ui, Vec2};

use duoscope_core::commands::ReviewCommand;
use duoscope_core::helpers::geometry::{Point, Side};
use duoscope_core::toolkit::ToolMode;

use super::{AppCommand, ReviewModule, ReviewView};
use crate::theme::{DARK_TEXT_DIM, ACCENT};

const BAR_HEIGHT:  f32 = 14.0;
const BAR_GAP:     f32 = 6.0;
const FOOTER:      f32 = 22.0;
/// Width / height of one camera when nothing is probed yet.
const FALLBACK_ASPECT: f32 = 16.0 / 9.0;

#[derive(Default)]
pub struct ViewerModule {
    canvas:       Option<Rect>,
    bar:          Option<Rect>,
    last_pointer: Option<Pos2>,
    last_seek:    Option<f32>,
}

impl ViewerModule {
    pub fn new() -> Self { Self::default() }

    /// Rects allocated in the last `ui` pass: `(canvas, scrubber)`.
    pub fn layout(&self) -> Option<(Rect, Rect)> {
        Some((self.canvas?, self.bar?))
    }
}

impl ReviewModule for ViewerModule {
    fn name(&self) -> &str { "Viewer" }

    fn ui(&mut self, ui: &mut Ui, view: &ReviewView<'_>, cmd: &mut Vec<AppCommand>) {
        let sync   = view.session.synchronizer();
        let aspect = canvas_aspect(view);

        let avail = ui.available_size();
        let size  = fit_size(
            Vec2::new(avail.x, (avail.y - BAR_HEIGHT - BAR_GAP - FOOTER).max(0.0)),
            aspect,
        );

        // ── Canvas ───────────────────────────────────────────────────────────
        let canvas = ui
            .vertical_centered(|ui| ui.allocate_exact_size(size, Sense::click_and_drag()))
            .inner;
        let (canvas_rect, resp) = canvas;
        let local = |p: Pos2| Point::new(p.x - canvas_rect.min.x, p.y - canvas_rect.min.y);

        if let Some(p) = resp.hover_pos() {
            if self.last_pointer != Some(p) {
                self.last_pointer = Some(p);
                cmd.push(ReviewCommand::PointerMoved(local(p)).into());
            }
        }
        if resp.clicked() {
            if let Some(p) = resp.interact_pointer_pos() {
                cmd.push(ReviewCommand::Click(local(p)).into());
            }
        }
        if resp.drag_started() {
            let origin = ui.input(|i| i.pointer.press_origin()).or(resp.interact_pointer_pos());
            if let Some(p) = origin {
                cmd.push(ReviewCommand::BeginDrag(local(p)).into());
            }
        }
        if resp.dragged() {
            if let Some(p) = resp.interact_pointer_pos() {
                cmd.push(ReviewCommand::DragTo(local(p)).into());
            }
        }
        if resp.drag_stopped() {
            cmd.push(ReviewCommand::EndDrag.into());
        }
        if view.session.toolkit().mode() == ToolMode::Ruler && resp.hovered() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Crosshair);
        }

        // ── Scrubber ─────────────────────────────────────────────────────────
        ui.add_space(BAR_GAP);
        let (bar_rect, bar_resp) = ui
            .vertical_centered(|ui| {
                ui.allocate_exact_size(Vec2::new(size.x, BAR_HEIGHT), Sense::click_and_drag())
            })
            .inner;
        if (bar_resp.clicked() || bar_resp.dragged()) && sync.has_media() {
            if let Some(p) = bar_resp.interact_pointer_pos() {
                let f = bar_fraction(bar_rect, p.x);
                if self.last_seek != Some(f) || bar_resp.clicked() {
                    self.last_seek = Some(f);
                    cmd.push(ReviewCommand::SeekFraction(f).into());
                }
            }
        }
        if bar_resp.drag_stopped() {
            self.last_seek = None;
        }

        // ── Footer ───────────────────────────────────────────────────────────
        ui.horizontal(|ui| {
            ui.set_width(size.x);
            let sc = sync.scrubber();
            ui.label(RichText::new(&sc.readout).monospace().size(12.0).color(ACCENT));
            ui.label(
                RichText::new(format!("/ {}", sc.max)).monospace().size(12.0).color(DARK_TEXT_DIM),
            );
            if let Some(p) = sync.pending_resume() {
                ui.label(
                    RichText::new(format!("holding {}", p.side.label()))
                        .size(11.0)
                        .color(DARK_TEXT_DIM),
                );
            }
        });

        self.canvas = Some(canvas_rect);
        self.bar    = Some(bar_rect);
    }
}

/// Width / height of the whole canvas: two cameras side by side, or one.
fn canvas_aspect(view: &ReviewView<'_>) -> f32 {
    let one = Side::BOTH
        .iter()
        .filter_map(|&s| view.context.source(s).info)
        .find(|i| i.width > 0 && i.height > 0)
        .map(|i| i.width as f32 / i.height as f32)
        .unwrap_or(FALLBACK_ASPECT);
    if view.session.synchronizer().is_single() { one } else { one * 2.0 }
}

/// Largest size with `aspect` that fits in `avail`.
fn fit_size(avail: Vec2, aspect: f32) -> Vec2 {
    if avail.x <= 0.0 || avail.y <= 0.0 || aspect <= 0.0 {
        return Vec2::ZERO;
    }
    if avail.x / avail.y > aspect {
        Vec2::new(avail.y * aspect, avail.y)
    } else {
        Vec2::new(avail.x, avail.x / aspect)
    }
}

fn bar_fraction(bar: Rect, x: f32) -> f32 {
    if bar.width() <= 0.0 {
        return 0.0;
    }
    ((x - bar.min.x) / bar.width()).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_is_limited_by_the_tighter_axis() {
        assert_eq!(fit_size(Vec2::new(1000.0, 200.0), 2.0), Vec2::new(400.0, 200.0));
        assert_eq!(fit_size(Vec2::new(400.0, 1000.0), 2.0), Vec2::new(400.0, 200.0));
        assert_eq!(fit_size(Vec2::new(0.0, 10.0), 2.0), Vec2::ZERO);
    }

    #[test]
    fn bar_fraction_is_clamped() {
        let bar = Rect::from_min_size(Pos2::new(100.0, 0.0), Vec2::new(200.0, 10.0));
        assert_eq!(bar_fraction(bar, 150.0), 0.25);
        assert_eq!(bar_fraction(bar, 50.0), 0.0);
        assert_eq!(bar_fraction(bar, 400.0), 1.0);
    }
}
