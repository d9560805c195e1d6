// crates/duoscope-ui/src/modules/toolbar.rs
//
// ToolbarModule: file pickers, transport, tool toggles and shortcuts.
//
// Transport buttons are painted by hand (tbtn!) so the strip keeps a fixed
// height regardless of font metrics. Shortcuts are ignored while a text
// field has focus.

use egui::{Align2, Color32, FontId, Pos2, Rect, RichText, Sense, Stroke, Ui, Vec2};

use duoscope_core::commands::ReviewCommand;
use duoscope_core::helpers::geometry::Side;
use duoscope_core::toolkit::ToolMode;

use super::{AppCommand, ReviewModule, ReviewView};
use crate::theme::{ACCENT, DARK_BG_2, DARK_BG_3};

const BTN_SIZE: f32 = 26.0;
const BTN_GAP:  f32 = 3.0;
const BTN_R:    f32 = 4.0;

#[derive(Default)]
pub struct ToolbarModule;

impl ToolbarModule {
    pub fn new() -> Self { Self }

    fn shortcuts(&self, ui: &Ui, cmd: &mut Vec<AppCommand>) {
        if ui.memory(|m| m.focused().is_some()) {
            return;
        }
        let pressed = |k: egui::Key| ui.input(|i| i.key_pressed(k));
        if pressed(egui::Key::Space)      { cmd.push(ReviewCommand::TogglePlay.into()); }
        if pressed(egui::Key::ArrowLeft)  { cmd.push(ReviewCommand::StepFrames(-1).into()); }
        if pressed(egui::Key::ArrowRight) { cmd.push(ReviewCommand::StepFrames(1).into()); }
        if pressed(egui::Key::S)          { cmd.push(ReviewCommand::Sync.into()); }
        if pressed(egui::Key::R)          { cmd.push(ReviewCommand::SelectTool(ToolMode::Ruler).into()); }
        if pressed(egui::Key::N)          { cmd.push(ReviewCommand::NextEvent.into()); }
        if pressed(egui::Key::P)          { cmd.push(ReviewCommand::PreviousEvent.into()); }
        if pressed(egui::Key::Escape)     { cmd.push(ReviewCommand::SelectTool(ToolMode::None).into()); }
    }
}

impl ReviewModule for ToolbarModule {
    fn name(&self) -> &str { "Toolbar" }

    fn ui(&mut self, ui: &mut Ui, view: &ReviewView<'_>, cmd: &mut Vec<AppCommand>) {
        self.shortcuts(ui, cmd);

        let sync      = view.session.synchronizer();
        let has_media = sync.has_media();
        let playing   = sync.is_playing();
        let has_events = !view.session.events().is_empty();

        ui.horizontal_centered(|ui| {
            ui.label(RichText::new("◫ duoscope").strong().size(15.0).color(ACCENT));
            ui.separator();

            // ── Files ────────────────────────────────────────────────────────
            for side in Side::BOTH {
                let name = if side == Side::Left { "Left" } else { "Right" };
                ui.menu_button(format!("{name} ▾"), |ui| {
                    if ui.button("Video…").clicked() {
                        cmd.push(AppCommand::OpenVideo(side));
                        ui.close();
                    }
                    if ui.button("Detection metadata…").clicked() {
                        cmd.push(AppCommand::OpenMetadata(side));
                        ui.close();
                    }
                });
            }
            if ui.add_enabled(has_media, egui::Button::new("Close")).clicked() {
                cmd.push(AppCommand::CloseMedia);
            }
            ui.separator();

            // ── Transport ────────────────────────────────────────────────────
            let width = 7.0 * (BTN_SIZE + BTN_GAP);
            let (strip, _) = ui.allocate_exact_size(Vec2::new(width, BTN_SIZE), Sense::hover());
            let painter = ui.painter_at(strip);
            let cy = strip.center().y;
            let mut x = strip.min.x;

            macro_rules! tbtn {
                ($id:expr, $glyph:expr, $active:expr, $enabled:expr) => {{
                    let r = Rect::from_min_size(Pos2::new(x, cy - BTN_SIZE / 2.0), Vec2::splat(BTN_SIZE));
                    let resp = ui.interact(r, ui.id().with($id), Sense::click());
                    let (bg, icol) = if !$enabled {
                        (DARK_BG_3, Color32::from_gray(80))
                    } else if resp.is_pointer_button_down_on() {
                        (DARK_BG_2.gamma_multiply(0.6), Color32::WHITE)
                    } else if resp.hovered() {
                        (DARK_BG_2, ACCENT.linear_multiply(1.2))
                    } else if $active {
                        (DARK_BG_3, ACCENT)
                    } else {
                        (DARK_BG_3, Color32::from_gray(175))
                    };
                    painter.rect_filled(r, BTN_R, bg);
                    if $enabled && (resp.hovered() || $active) {
                        painter.rect_stroke(r, BTN_R,
                            Stroke::new(1.0, ACCENT.gamma_multiply(0.35)),
                            egui::StrokeKind::Outside);
                    }
                    painter.text(r.center(), Align2::CENTER_CENTER, $glyph,
                        FontId::proportional(13.0), icol);
                    x += BTN_SIZE + BTN_GAP;
                    $enabled && resp.clicked()
                }};
            }

            if tbtn!("prev_event", "⏮", false, has_events) {
                cmd.push(ReviewCommand::PreviousEvent.into());
            }
            if tbtn!("step_back", "◀", false, has_media) {
                cmd.push(ReviewCommand::StepFrames(-1).into());
            }
            if tbtn!("play", if playing { "⏸" } else { "▶" }, playing, has_media) {
                cmd.push(ReviewCommand::TogglePlay.into());
            }
            if tbtn!("step_fwd", "▶|", false, has_media) {
                cmd.push(ReviewCommand::StepFrames(1).into());
            }
            if tbtn!("next_event", "⏭", false, has_events) {
                cmd.push(ReviewCommand::NextEvent.into());
            }
            if tbtn!("sync", "⟲", false, has_media && !sync.is_single()) {
                cmd.push(ReviewCommand::Sync.into());
            }
            if tbtn!("pause_all", "■", false, has_media) {
                cmd.push(ReviewCommand::Pause.into());
            }
            ui.separator();

            // ── Tools ────────────────────────────────────────────────────────
            let mode = view.session.toolkit().mode();
            for tool in [ToolMode::Ruler, ToolMode::Clear] {
                let label = match tool {
                    ToolMode::Ruler => "📏 Ruler",
                    _               => "✖ Clear",
                };
                if ui.selectable_label(mode == tool, label).clicked() {
                    cmd.push(ReviewCommand::SelectTool(tool).into());
                }
            }
            ui.label(
                RichText::new("Space play · ←/→ step · S sync · N/P events · R ruler")
                    .size(11.0)
                    .weak(),
            );
        });
    }
}
