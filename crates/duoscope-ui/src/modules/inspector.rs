// crates/duoscope-ui/src/modules/inspector.rs
//
// InspectorModule: right-hand panel. Loaded sources and their offsets,
// measurement readout, the event list and review settings.
//
// Settings are edited on a draft copy and only sent as UpdateConfig when the
// operator applies them, because applying rebuilds the review.

use egui::{Grid, RichText, Ui};

use duoscope_core::commands::ReviewCommand;
use duoscope_core::helpers::frames::format_frame_time;
use duoscope_core::helpers::geometry::Side;
use duoscope_core::ReviewConfig;

use super::{AppCommand, ReviewModule, ReviewView};
use crate::helpers::format::{file_label, length_label};
use crate::theme::{color32, ACCENT, DARK_TEXT_DIM};

const NAME_CHARS: usize = 26;

#[derive(Default)]
pub struct InspectorModule {
    draft: Option<ReviewConfig>,
}

impl InspectorModule {
    pub fn new() -> Self { Self::default() }

    fn sources(&self, ui: &mut Ui, view: &ReviewView<'_>, cmd: &mut Vec<AppCommand>) {
        let sync = view.session.synchronizer();
        for side in Side::BOTH {
            let src = view.context.source(side);
            ui.label(RichText::new(side.label().to_uppercase()).strong().size(11.0).color(DARK_TEXT_DIM));
            ui.label(file_label(src.video.as_deref(), NAME_CHARS));
            match (&src.info, src.probe_id) {
                (_, Some(_)) => { ui.label(RichText::new("probing…").weak()); }
                (Some(i), None) => {
                    ui.label(
                        RichText::new(format!("{}×{} · {:.3} fps · {:.1}s", i.width, i.height, i.fps, i.duration))
                            .size(11.0)
                            .weak(),
                    );
                }
                (None, None) => {}
            }
            if src.metadata_path.is_some() {
                ui.label(
                    RichText::new(format!("meta: {}", file_label(src.metadata_path.as_deref(), NAME_CHARS)))
                        .size(11.0)
                        .weak(),
                );
            }

            // A single stream always lives in the left slot.
            let slot = if sync.is_single() && src.is_ready() { Side::Left } else { side };
            if let Some(h) = sync.handle(slot).filter(|_| src.is_ready()) {
                let mut offset = h.frame_offset();
                ui.horizontal(|ui| {
                    ui.label("Offset");
                    let resp = ui.add(
                        egui::DragValue::new(&mut offset)
                            .range(0..=h.duration_frames())
                            .suffix(" f"),
                    );
                    if resp.changed() {
                        cmd.push(ReviewCommand::SetFrameOffset { side: slot, frame: offset }.into());
                    }
                    ui.label(
                        RichText::new(format!("frame {}", h.current_frame()))
                            .monospace()
                            .size(11.0),
                    );
                });
            }
            ui.add_space(6.0);
        }
    }

    fn measurements(&self, ui: &mut Ui, view: &ReviewView<'_>) {
        let toolkit = view.session.toolkit();
        let cfg     = view.session.config();
        let readout = toolkit.readout();
        Grid::new("ruler_readout").num_columns(2).spacing([12.0, 4.0]).show(ui, |ui| {
            for (side, length, colour) in [
                (Side::Left,  readout.left,  cfg.left_colour),
                (Side::Right, readout.right, cfg.right_colour),
            ] {
                ui.label(RichText::new(side.label()).color(color32(colour)));
                ui.label(RichText::new(length_label(length)).monospace());
                ui.end_row();
            }
        });
        if toolkit.readout_visible() {
            ui.label(RichText::new("pair sent").size(11.0).color(ACCENT));
        }
        if cfg.keep_ruler_history {
            ui.label(
                RichText::new(format!(
                    "history: {} left · {} right",
                    toolkit.history(Side::Left).len(),
                    toolkit.history(Side::Right).len()
                ))
                .size(11.0)
                .weak(),
            );
        }
    }

    fn events(&self, ui: &mut Ui, view: &ReviewView<'_>, cmd: &mut Vec<AppCommand>) {
        let events = view.session.events();
        let sync   = view.session.synchronizer();
        let total  = sync.scrubber().max as f64;
        ui.label(format!("{} events", events.len()));
        egui::ScrollArea::vertical().max_height(180.0).show(ui, |ui| {
            for (i, e) in events.events().iter().enumerate() {
                let at = (e.start * total).round() as i64;
                ui.horizontal(|ui| {
                    let (swatch, _) = ui.allocate_exact_size(egui::vec2(8.0, 8.0), egui::Sense::hover());
                    ui.painter().rect_filled(swatch, 1.0, color32(e.colour));
                    let text = format!("#{:<2} {}", i + 1, format_frame_time(at, sync.fps()));
                    if ui.button(RichText::new(text).monospace().size(11.0)).clicked() {
                        cmd.push(ReviewCommand::Pause.into());
                        cmd.push(ReviewCommand::SeekFraction(e.start as f32).into());
                    }
                });
            }
        });
    }

    fn settings(&mut self, ui: &mut Ui, view: &ReviewView<'_>, cmd: &mut Vec<AppCommand>) {
        let current = view.session.config();
        let draft   = self.draft.get_or_insert_with(|| current.clone());

        Grid::new("review_settings").num_columns(2).spacing([8.0, 4.0]).show(ui, |ui| {
            ui.label("Endpoint");
            ui.text_edit_singleline(&mut draft.endpoint);
            ui.end_row();
            ui.label("Frame rate");
            ui.add(egui::DragValue::new(&mut draft.frame_rate).range(1.0..=240.0).speed(0.1));
            ui.end_row();
            ui.label("Drift tolerance");
            ui.add(egui::DragValue::new(&mut draft.drift_tolerance_frames).range(0..=30).suffix(" f"));
            ui.end_row();
            ui.label("Grab radius");
            ui.add(egui::DragValue::new(&mut draft.grab_radius_px).range(1.0..=40.0).suffix(" px"));
            ui.end_row();
            ui.label("Tick");
            ui.add(egui::DragValue::new(&mut draft.tick_interval_ms).range(1..=200).suffix(" ms"));
            ui.end_row();
        });
        ui.checkbox(&mut draft.keep_ruler_history, "Keep ruler history");

        let dirty = *draft != *current;
        ui.horizontal(|ui| {
            if ui.add_enabled(dirty, egui::Button::new("Apply")).clicked() {
                cmd.push(AppCommand::UpdateConfig(draft.clone()));
            }
            if ui.add_enabled(dirty, egui::Button::new("Revert")).clicked() {
                *draft = current.clone();
            }
        });
        if dirty {
            ui.label(RichText::new("applying reloads the review").size(11.0).weak());
        }
    }
}

impl ReviewModule for InspectorModule {
    fn name(&self) -> &str { "Inspector" }

    fn ui(&mut self, ui: &mut Ui, view: &ReviewView<'_>, cmd: &mut Vec<AppCommand>) {
        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.heading("Sources");
            self.sources(ui, view, cmd);
            ui.separator();
            ui.heading("Measurement");
            self.measurements(ui, view);
            ui.separator();
            ui.heading("Events");
            self.events(ui, view, cmd);
            ui.separator();
            egui::CollapsingHeader::new("Settings").default_open(false).show(ui, |ui| {
                self.settings(ui, view, cmd);
            });
        });
    }
}
