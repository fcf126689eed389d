use crate::assets::{self, AppSettings};
use crate::canvas::Canvas;
use crate::components::image_panel::{ImageAction, ImagePanel, ImageTab};
use crate::components::overlay_panel::OverlayPanel;
use crate::components::text_panel::TextPanel;
use crate::io::{self, ImageSlot, IoResult};
use crate::ops::compose;
use crate::scene::{SceneImage, SceneState};
use crate::theme::{Theme, ThemeMode};
use eframe::egui;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// Outcome of the most recent IO event, shown in the status bar until the
/// next one replaces it.
struct StatusMessage {
    text: String,
    error: bool,
}

pub struct MemeForgeApp {
    scene: SceneState,
    canvas: Canvas,
    image_panel: ImagePanel,
    overlay_panel: OverlayPanel,
    text_panel: TextPanel,
    settings: AppSettings,
    theme: Theme,
    io_sender: mpsc::Sender<IoResult>,
    io_receiver: mpsc::Receiver<IoResult>,
    pending_io_ops: usize,
    status: Option<StatusMessage>,
    /// Style tweaks in the add-text form are persisted once the pointer is
    /// up, not on every slider tick.
    settings_dirty: bool,
}

impl MemeForgeApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = AppSettings::load();
        let theme = Theme::from_mode(settings.theme_mode);
        theme.apply(&cc.egui_ctx);

        // Resolve the caption typeface before the canvas asks for it.
        assets::install_caption_font(&cc.egui_ctx);

        let (io_sender, io_receiver) = mpsc::channel();

        Self {
            scene: SceneState::new(),
            canvas: Canvas::new(),
            image_panel: ImagePanel::default(),
            overlay_panel: OverlayPanel::default(),
            text_panel: TextPanel::default(),
            settings,
            theme,
            io_sender,
            io_receiver,
            pending_io_ops: 0,
            status: None,
            settings_dirty: false,
        }
    }

    fn set_status(&mut self, text: String, error: bool) {
        self.status = Some(StatusMessage { text, error });
    }

    // -- background IO ----------------------------------------------------

    /// Decode an image file off the UI thread and deliver it to `slot`.
    fn spawn_load(&mut self, path: PathBuf, slot: ImageSlot) {
        let sender = self.io_sender.clone();
        self.pending_io_ops += 1;
        rayon::spawn(move || {
            let result = match io::decode_image(&path) {
                Ok(pixels) => IoResult::ImageLoaded { slot, pixels, path },
                Err(error) => IoResult::LoadFailed { slot, path, error },
            };
            let _ = sender.send(result);
        });
    }

    /// Flatten the scene at the preview's container size and write the PNG,
    /// both off the UI thread.
    fn spawn_export(&mut self) {
        let Some(snapshot) = self.scene.snapshot() else {
            return;
        };
        let edge = self.canvas.last_edge().round().max(64.0) as u32;
        let font = assets::caption_font().map(|f| f.font.clone());
        let sender = self.io_sender.clone();
        self.pending_io_ops += 1;
        log_info!("Export started ({edge}px container)");
        rayon::spawn(move || {
            let result = compose::flatten(&snapshot, edge, font.as_ref())
                .map_err(io::ExportError::Compose)
                .and_then(|img| io::write_export(&img));
            let _ = sender.send(match result {
                Ok(path) => IoResult::ExportComplete { path },
                Err(error) => IoResult::ExportFailed {
                    error: error.to_string(),
                },
            });
        });
    }

    fn poll_io_results(&mut self) {
        while let Ok(result) = self.io_receiver.try_recv() {
            self.pending_io_ops = self.pending_io_ops.saturating_sub(1);
            match result {
                IoResult::ImageLoaded { slot, pixels, path } => {
                    let label = file_label(&path);
                    match slot {
                        ImageSlot::Base => {
                            self.scene.set_base(SceneImage::new(pixels));
                            self.set_status(format!("Loaded {label}"), false);
                        }
                        ImageSlot::Overlay => {
                            self.scene.add_overlay(SceneImage::new(pixels));
                            self.set_status(format!("Added overlay {label}"), false);
                        }
                    }
                    log_info!("Loaded image: {}", path.display());
                }
                IoResult::LoadFailed { slot: _, path, error } => {
                    log_err!("Failed to load {}: {}", path.display(), error);
                    self.set_status(format!("Could not load {}: {error}", file_label(&path)), true);
                }
                IoResult::ExportComplete { path } => {
                    log_info!("Exported meme: {}", path.display());
                    self.set_status(format!("Saved {}", path.display()), false);
                }
                IoResult::ExportFailed { error } => {
                    log_err!("Export failed: {}", error);
                    self.set_status(format!("Export failed: {error}"), true);
                }
            }
        }
    }

    // -- ingestion routing -------------------------------------------------

    fn handle_image_action(&mut self, action: ImageAction) {
        match action {
            ImageAction::PickBase => {
                if let Some(path) = io::pick_image_path("Choose the main image") {
                    self.spawn_load(path, ImageSlot::Base);
                }
            }
            ImageAction::PickOverlays => {
                for path in io::pick_image_paths("Choose overlay images") {
                    self.spawn_load(path, ImageSlot::Overlay);
                }
            }
        }
    }

    /// Window-level drops, routed by the active ingestion tab. The overlay
    /// tab turns every file into its own overlay; the base slot takes
    /// exactly one file per drop (last image in the batch wins).
    fn handle_dropped_files(&mut self, dropped: Vec<egui::DroppedFile>) {
        let paths: Vec<PathBuf> = dropped
            .into_iter()
            .filter_map(|f| f.path)
            .filter(|p| io::is_image_path(p))
            .collect();
        if paths.is_empty() {
            return;
        }
        let to_overlays =
            self.image_panel.active_tab == ImageTab::Overlay && self.scene.has_base();
        if to_overlays {
            for path in paths {
                self.spawn_load(path, ImageSlot::Overlay);
            }
        } else if let Some(path) = paths.into_iter().next_back() {
            self.spawn_load(path, ImageSlot::Base);
        }
    }

    // -- chrome ------------------------------------------------------------

    fn show_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("MemeForge");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let label = match self.theme.mode {
                        ThemeMode::Light => "🌙 Dark",
                        ThemeMode::Dark => "☀ Light",
                    };
                    if ui.button(label).clicked() {
                        self.theme.toggle();
                        self.theme.apply(ctx);
                        self.settings.theme_mode = self.theme.mode;
                        self.settings.save();
                    }
                });
            });
        });
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let can_export = self.scene.has_base();
                if ui
                    .add_enabled(can_export, egui::Button::new("Download meme"))
                    .on_disabled_hover_text("Load a main image first")
                    .clicked()
                {
                    self.spawn_export();
                }
                if self.pending_io_ops > 0 {
                    ui.add(egui::Spinner::new().size(14.0));
                }
                if let Some(status) = &self.status {
                    let color = if status.error {
                        self.theme.error_text
                    } else {
                        ui.visuals().text_color()
                    };
                    ui.colored_label(color, &status.text);
                }
            });
        });
    }

    fn show_controls(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("controls")
            .default_width(300.0)
            .min_width(250.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .id_source("controls_scroll")
                    .show(ui, |ui| {
                        ui.add_space(4.0);
                        ui.strong("Images");
                        let action = self.image_panel.show(ui, &self.scene);
                        if let Some(action) = action {
                            self.handle_image_action(action);
                        }

                        ui.add_space(8.0);
                        ui.separator();
                        ui.strong("Overlays");
                        self.overlay_panel.show(ui, &mut self.scene);

                        ui.add_space(8.0);
                        ui.separator();
                        ui.strong("Text");
                        if self.text_panel.show(
                            ui,
                            &mut self.scene,
                            &mut self.settings.caption_style,
                        ) {
                            self.settings_dirty = true;
                        }
                    });
            });
    }
}

impl eframe::App for MemeForgeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_io_results();

        let dropped: Vec<egui::DroppedFile> = ctx.input(|i| i.raw.dropped_files.clone());
        if !dropped.is_empty() {
            self.handle_dropped_files(dropped);
        }

        // Delete removes the selected element, but never while a text field
        // has keyboard focus.
        let typing = ctx.memory(|m| m.focus().is_some());
        if !typing {
            let delete_pressed = ctx.input(|i| {
                i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace)
            });
            if delete_pressed {
                self.scene.remove_selected();
            }
        }

        self.show_top_bar(ctx);
        self.show_status_bar(ctx);
        self.show_controls(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.with_layout(
                egui::Layout::centered_and_justified(egui::Direction::TopDown),
                |ui| {
                    self.canvas.show(ui, &mut self.scene, &self.theme);
                },
            );
        });

        // Persist style tweaks once the slider drag is over.
        if self.settings_dirty && !ctx.input(|i| i.pointer.any_down()) {
            self.settings.save();
            self.settings_dirty = false;
        }

        if self.pending_io_ops > 0 {
            ctx.request_repaint();
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if self.settings_dirty {
            self.settings.save();
        }
        log_info!("Session ended");
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
