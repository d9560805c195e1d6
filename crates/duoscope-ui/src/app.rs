// crates/duoscope-ui/src/app.rs
//
// DuoscopeApp: the eframe host around one ReviewSession.
//
// Per frame:
//   poll workers → pump decoded frames → panels (emit AppCommands)
//   → ReviewSession::frame paints canvas + scrubber → process commands
//   → hand completed measurement pairs to the uploader
//
// The review is rebuilt from the remembered sources (reload_media) whenever
// a probe lands, metadata is picked or settings change, so the core never
// sees a half-loaded pair.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, Result};
use rfd::FileDialog;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use duoscope_core::commands::ReviewCommand;
use duoscope_core::detection::DetectionRecord;
use duoscope_core::duoscope_log;
use duoscope_core::helpers::geometry::Side;
use duoscope_core::media_types::{MediaResult, UploadResult};
use duoscope_core::{ReviewConfig, ReviewSession};
use duoscope_media::VideoStream;

use crate::context::AppContext;
use crate::helpers::surface::PainterSurface;
use crate::modules::inspector::InspectorModule;
use crate::modules::toolbar::ToolbarModule;
use crate::modules::viewer::ViewerModule;
use crate::modules::{AppCommand, ReviewModule, ReviewView};
use crate::theme::{configure_style, DARK_BG_0, DARK_TEXT_DIM, STATUS_ERR, STATUS_OK};

/// Decoded frames are scaled down to this width; each half of the canvas is
/// rarely wider on screen.
const DECODE_MAX_WIDTH: u32 = 960;

#[derive(Serialize, Deserialize)]
struct AppStorage {
    config: ReviewConfig,
}

// ── App ───────────────────────────────────────────────────────────────────────

pub struct DuoscopeApp {
    session:      ReviewSession<VideoStream>,
    context:      AppContext,
    toolbar:      ToolbarModule,
    viewer:       ViewerModule,
    inspector:    InspectorModule,
    /// Commands emitted by panels each frame, processed after the UI pass
    pending_cmds: Vec<AppCommand>,
}

impl DuoscopeApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config_path: Option<PathBuf>) -> Self {
        configure_style(&cc.egui_ctx);
        cc.egui_ctx.options_mut(|o| {
            o.theme_preference = egui::ThemePreference::Dark;
        });

        let stored = cc.storage
            .and_then(|s| eframe::get_value::<AppStorage>(s, eframe::APP_KEY))
            .map(|d| d.config)
            .unwrap_or_default();

        let config = match config_path {
            Some(path) => match read_config(&path) {
                Ok(cfg) => {
                    duoscope_log!("[app] config loaded from {}", path.display());
                    cfg
                }
                Err(e) => {
                    duoscope_log!("[app] {e:#}; using saved settings");
                    stored
                }
            },
            None => stored,
        };

        let context = AppContext::new(&config.endpoint);
        Self {
            session:      ReviewSession::new(config),
            context,
            toolbar:      ToolbarModule::new(),
            viewer:       ViewerModule::new(),
            inspector:    InspectorModule::new(),
            pending_cmds: Vec::new(),
        }
    }

    fn process_command(&mut self, cmd: AppCommand) {
        match cmd {
            AppCommand::Review(cmd) => {
                let now = self.context.now();
                self.session.apply(cmd, now);
            }

            AppCommand::OpenVideo(side) => {
                let Some(path) = FileDialog::new()
                    .add_filter("Video", &["mp4", "mov", "mkv", "avi", "webm", "m4v"])
                    .pick_file()
                else { return };
                let id = Uuid::new_v4();
                let src = self.context.source_mut(side);
                src.video    = Some(path.clone());
                src.info     = None;
                src.probe_id = Some(id);
                self.context.status.info(format!("probing {}…", path.display()));
                self.context.media_worker.probe(id, path);
            }

            AppCommand::OpenMetadata(side) => {
                let Some(path) = FileDialog::new()
                    .add_filter("Detection record", &["json", "txt", "b64"])
                    .pick_file()
                else { return };
                match read_metadata(&path) {
                    Ok(record) => {
                        let n = record.activities.len();
                        let src = self.context.source_mut(side);
                        src.metadata      = Some(record);
                        src.metadata_path = Some(path);
                        self.context.status.info(format!("{} metadata: {n} activities", side.label()));
                        self.reload_media();
                    }
                    Err(e) => self.context.status.error(format!("{e:#}")),
                }
            }

            AppCommand::CloseMedia => {
                self.context.clear_sources();
                self.session.apply(ReviewCommand::Reset, self.context.now());
                self.context.status.info("review closed");
            }

            AppCommand::UpdateConfig(config) => {
                self.context.uploader.set_endpoint(config.endpoint.clone());
                self.session.set_config(config);
                self.reload_media();
                self.context.status.info("settings applied");
            }
        }
    }

    /// Start the review over from the remembered sources: fresh session,
    /// fresh streams, metadata re-applied.
    fn reload_media(&mut self) {
        self.session.reset();
        self.context.textures.clear();

        let left  = self.open_stream(Side::Left);
        let right = self.open_stream(Side::Right);
        let present = [left.is_some(), right.is_some()];
        if !present.iter().any(|p| *p) {
            return;
        }
        let single = !(present[0] && present[1]);
        self.session.load_media(left, right);

        for (side, loaded) in Side::BOTH.into_iter().zip(present) {
            if !loaded { continue; }
            let Some(record) = self.context.source(side).metadata.as_ref() else { continue };
            // A single stream always lives in the left slot.
            let slot = if single { Side::Left } else { side };
            let added = self.session.load_metadata(slot, record);
            duoscope_log!("[app] {} metadata applied: {added} events", side.label());
        }
    }

    fn open_stream(&mut self, side: Side) -> Option<VideoStream> {
        let src  = self.context.source(side);
        let path = src.video.clone()?;
        let info = src.info?;
        match VideoStream::open(&path, info, DECODE_MAX_WIDTH) {
            Ok(s)  => Some(s),
            Err(e) => {
                self.context.status.error(format!("open {}: {e:#}", path.display()));
                None
            }
        }
    }

    // ── Worker polling ───────────────────────────────────────────────────────

    fn poll_media(&mut self) {
        let mut reload = false;
        while let Ok(result) = self.context.media_worker.rx.try_recv() {
            match result {
                MediaResult::Probed { id, path, info } => {
                    let Some(side) = self.context.side_for_probe(id) else { continue };
                    let src = self.context.source_mut(side);
                    src.info     = Some(info);
                    src.probe_id = None;
                    let agreed = self.session.config().frame_rate;
                    if info.fps > 0.0 && (info.fps - agreed).abs() > 0.01 {
                        self.context.status.info(format!(
                            "{} is {:.3} fps, review runs at {agreed}",
                            path.display(), info.fps
                        ));
                    } else {
                        self.context.status.info(format!("{} ready", side.label()));
                    }
                    reload = true;
                }
                MediaResult::Error { id, msg } => {
                    let Some(side) = self.context.side_for_probe(id) else { continue };
                    *self.context.source_mut(side) = Default::default();
                    self.context.status.error(format!("{} video: {msg}", side.label()));
                    reload = true;
                }
            }
        }
        if reload {
            self.reload_media();
        }
    }

    fn poll_uploads(&mut self) {
        while let Ok(result) = self.context.uploader.rx.try_recv() {
            match result {
                UploadResult::Sent { status } if status < 400 => {
                    self.context.status.info(format!("measurement sent (HTTP {status})"));
                }
                UploadResult::Sent { status } => {
                    self.context.status.error(format!("measurement rejected (HTTP {status})"));
                }
                UploadResult::Failed { msg } => {
                    self.context.status.error(format!("measurement not sent: {msg}"));
                }
            }
        }
    }

    /// Pull due frames out of the decode threads. `true` if anything changed.
    fn pump_streams(&mut self) -> bool {
        let sync = self.session.synchronizer_mut();
        let mut changed = false;
        for side in Side::BOTH {
            if let Some(h) = sync.handle_mut(side) {
                changed |= h.media_mut().pump();
            }
        }
        changed
    }

    // ── Painting ─────────────────────────────────────────────────────────────

    fn paint(&mut self, ui: &egui::Ui, canvas: egui::Rect, bar: egui::Rect) {
        let now = self.context.now();
        let mut main  = PainterSurface::canvas(ui.painter_at(canvas), canvas, &mut self.context.textures);
        let mut strip = PainterSurface::bar(ui.painter_at(bar), bar, DARK_BG_0);
        let report = self.session.frame(now, &mut main, &mut strip);
        if let Some(side) = report.resumed {
            duoscope_log!("[app] {} resumed", side.label());
        }
    }
}

fn read_config(path: &Path) -> Result<ReviewConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    ReviewConfig::from_json(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn read_metadata(path: &Path) -> Result<DetectionRecord> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading metadata {}", path.display()))?;
    DetectionRecord::parse(&text).with_context(|| format!("decoding metadata {}", path.display()))
}

// ── eframe::App ──────────────────────────────────────────────────────────────

impl eframe::App for DuoscopeApp {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &AppStorage { config: self.session.config().clone() });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.context.media_worker.shutdown();
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_media();
        self.poll_uploads();
        let fresh_frames = self.pump_streams();

        egui::TopBottomPanel::top(egui::Id::new(self.toolbar.name()))
            .exact_height(38.0)
            .show(ctx, |ui| {
                let view = ReviewView { session: &self.session, context: &self.context };
                self.toolbar.ui(ui, &view, &mut self.pending_cmds);
            });

        egui::TopBottomPanel::bottom("status_panel")
            .exact_height(24.0)
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    let status = &self.context.status;
                    let colour = if status.is_error { STATUS_ERR } else { STATUS_OK };
                    ui.label(egui::RichText::new(&status.text).size(12.0).color(colour));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            egui::RichText::new(self.context.uploader.endpoint())
                                .size(11.0)
                                .color(DARK_TEXT_DIM),
                        );
                    });
                });
            });

        egui::SidePanel::right(egui::Id::new(self.inspector.name()))
            .resizable(true)
            .default_width(260.0)
            .min_width(200.0)
            .show(ctx, |ui| {
                let view = ReviewView { session: &self.session, context: &self.context };
                self.inspector.ui(ui, &view, &mut self.pending_cmds);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let view = ReviewView { session: &self.session, context: &self.context };
            self.viewer.ui(ui, &view, &mut self.pending_cmds);
            if let Some((canvas, bar)) = self.viewer.layout() {
                self.paint(ui, canvas, bar);
            }
        });

        // ── Process commands emitted by panels this frame ─────────────────────
        let cmds: Vec<AppCommand> = self.pending_cmds.drain(..).collect();
        for cmd in cmds {
            self.process_command(cmd);
        }
        self.session.flush_to(&mut self.context.uploader);

        let sync = self.session.synchronizer();
        if sync.has_media() || fresh_frames {
            let tick = self.session.config().tick_interval_ms;
            ctx.request_repaint_after(Duration::from_millis(tick));
        }
    }
}
