// crates/duoscope-ui/src/helpers/surface.rs
//
// PainterSurface: the core's drawing traits implemented over an egui Painter.
//
// The core paints in surface-local pixels with the origin at the top-left of
// the canvas; everything here is offset by the widget rect's min corner.
// Video frames go through FrameTextures, which keeps one GPU texture per blit
// slot (left half, right half) and re-uploads only when the frame serial
// changes.

use egui::{Color32, ColorImage, Painter, Pos2, Rect, Stroke, TextureHandle, TextureOptions};

use duoscope_core::helpers::geometry::{Point, Rect as CanvasRect};
use duoscope_core::media_types::RgbaFrame;
use duoscope_core::surface::{FrameSurface, Rgba, Surface};

use crate::theme::color32;

// ── Texture slots ────────────────────────────────────────────────────────────

/// GPU copies of the frames on screen, indexed by blit order within a paint.
#[derive(Default)]
pub struct FrameTextures {
    slots: Vec<(u64, TextureHandle)>,
}

impl FrameTextures {
    /// Drop every texture (media unloaded).
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    fn upload(&mut self, painter: &Painter, slot: usize, frame: &RgbaFrame) -> Option<egui::TextureId> {
        let image = frame_image(frame)?;
        if slot == self.slots.len() {
            let tex = painter.ctx().load_texture(
                format!("duoscope_frame_{slot}"),
                image,
                TextureOptions::LINEAR,
            );
            self.slots.push((frame.serial, tex));
        } else {
            let (serial, tex) = self.slots.get_mut(slot)?;
            if *serial != frame.serial {
                tex.set(image, TextureOptions::LINEAR);
                *serial = frame.serial;
            }
        }
        self.slots.get(slot).map(|(_, t)| t.id())
    }
}

/// `None` when the pixel buffer doesn't match the advertised size.
fn frame_image(frame: &RgbaFrame) -> Option<ColorImage> {
    let (w, h) = (frame.width as usize, frame.height as usize);
    if w == 0 || h == 0 || frame.data.len() != w * h * 4 {
        return None;
    }
    Some(ColorImage::from_rgba_unmultiplied([w, h], &frame.data))
}

// ── Surface ──────────────────────────────────────────────────────────────────

pub struct PainterSurface<'a> {
    painter:    Painter,
    rect:       Rect,
    background: Color32,
    textures:   Option<&'a mut FrameTextures>,
    next_slot:  usize,
}

impl<'a> PainterSurface<'a> {
    /// Main display: shows video frames.
    pub fn canvas(painter: Painter, rect: Rect, textures: &'a mut FrameTextures) -> Self {
        Self { painter, rect, background: Color32::BLACK, textures: Some(textures), next_slot: 0 }
    }

    /// Overlay-only surface (the scrubber event bar). Blits are ignored.
    pub fn bar(painter: Painter, rect: Rect, background: Color32) -> Self {
        Self { painter, rect, background, textures: None, next_slot: 0 }
    }

    fn to_screen(&self, p: Point) -> Pos2 {
        to_screen(self.rect.min, p)
    }

    fn to_screen_rect(&self, r: CanvasRect) -> Rect {
        Rect::from_min_size(
            self.to_screen(Point::new(r.x, r.y)),
            egui::vec2(r.w, r.h),
        )
    }
}

fn to_screen(origin: Pos2, p: Point) -> Pos2 {
    Pos2::new(origin.x + p.x, origin.y + p.y)
}

impl Surface for PainterSurface<'_> {
    fn size(&self) -> (f32, f32) {
        (self.rect.width(), self.rect.height())
    }

    fn clear(&mut self) {
        self.next_slot = 0;
        self.painter.rect_filled(self.rect, 0.0, self.background);
    }

    fn fill_rect(&mut self, rect: CanvasRect, colour: Rgba) {
        let r = self.to_screen_rect(rect).intersect(self.rect);
        self.painter.rect_filled(r, 0.0, color32(colour));
    }

    fn line(&mut self, from: Point, to: Point, width: f32, colour: Rgba) {
        self.painter.line_segment(
            [self.to_screen(from), self.to_screen(to)],
            Stroke::new(width, color32(colour)),
        );
    }

    fn fill_circle(&mut self, centre: Point, radius: f32, colour: Rgba) {
        self.painter.circle_filled(self.to_screen(centre), radius, color32(colour));
    }
}

impl FrameSurface<RgbaFrame> for PainterSurface<'_> {
    fn blit(&mut self, frame: &RgbaFrame, dest: CanvasRect) {
        let slot = self.next_slot;
        self.next_slot += 1;
        let Some(textures) = self.textures.as_deref_mut() else { return };
        let Some(id) = textures.upload(&self.painter, slot, frame) else { return };
        let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
        self.painter.image(id, self.to_screen_rect(dest), uv, Color32::WHITE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(w: u32, h: u32, len: usize) -> RgbaFrame {
        RgbaFrame { serial: 1, timestamp: 0.0, width: w, height: h, data: vec![0; len] }
    }

    #[test]
    fn core_points_are_offset_by_widget_origin() {
        let p = to_screen(Pos2::new(100.0, 40.0), Point::new(12.0, 3.5));
        assert_eq!(p, Pos2::new(112.0, 43.5));
    }

    #[test]
    fn mismatched_frame_buffer_is_skipped() {
        assert!(frame_image(&frame(4, 2, 32)).is_some());
        assert!(frame_image(&frame(4, 2, 31)).is_none());
        assert!(frame_image(&frame(0, 2, 0)).is_none());
    }
}
