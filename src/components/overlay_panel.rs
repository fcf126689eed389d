use eframe::egui;
use egui::{Color32, Pos2, Rect, Sense, Stroke, Vec2};
use uuid::Uuid;

use crate::ops::compose;
use crate::scene::{SceneState, OVERLAY_SIZE_MAX, OVERLAY_SIZE_MIN};

const THUMB_EDGE: f32 = 40.0;

/// Overlay management: a scrollable list with selection, per-item size
/// control, stacking and the base swap.
#[derive(Default)]
pub struct OverlayPanel;

impl OverlayPanel {
    pub fn show(&mut self, ui: &mut egui::Ui, scene: &mut SceneState) {
        if scene.overlays().is_empty() {
            ui.weak("Overlays you add appear here.");
            return;
        }

        // Snapshot the ids up front; rows mutate the scene as they go and
        // stale ids degrade to no-ops.
        let ids: Vec<Uuid> = scene.overlays().iter().map(|o| o.id).collect();
        let accent = ui.visuals().selection.bg_fill;

        egui::ScrollArea::vertical()
            .id_source("overlay_list")
            .max_height(230.0)
            .show(ui, |ui| {
                for (index, id) in ids.into_iter().enumerate() {
                    self.show_row(ui, scene, id, index, accent);
                    ui.add_space(3.0);
                }
            });
    }

    fn show_row(
        &mut self,
        ui: &mut egui::Ui,
        scene: &mut SceneState,
        id: Uuid,
        index: usize,
        accent: Color32,
    ) {
        let Some(overlay) = scene.overlay(id) else {
            return;
        };
        let (w, h) = overlay.image.dimensions();
        let mut size = overlay.size;
        let is_selected = scene.selection().overlay() == Some(id);

        let stroke = if is_selected {
            Stroke::new(1.5, accent)
        } else {
            ui.visuals().widgets.noninteractive.bg_stroke
        };

        egui::Frame::none()
            .stroke(stroke)
            .rounding(4.0)
            .inner_margin(6.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    self.draw_thumbnail(ui, scene, id);
                    if ui
                        .selectable_label(is_selected, format!("Overlay {}", index + 1))
                        .clicked()
                    {
                        scene.select_overlay(id);
                    }
                    ui.weak(format!("{w} × {h}"));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("✕").on_hover_text("Remove overlay").clicked() {
                            scene.remove_overlay(id);
                        }
                    });
                });

                if is_selected {
                    ui.horizontal(|ui| {
                        ui.label("Size");
                        if ui
                            .add(
                                egui::Slider::new(&mut size, OVERLAY_SIZE_MIN..=OVERLAY_SIZE_MAX)
                                    .suffix("%")
                                    .max_decimals(0),
                            )
                            .changed()
                        {
                            scene.resize_overlay(id, size);
                        }
                    });
                    ui.horizontal_wrapped(|ui| {
                        if ui.small_button("To front").clicked() {
                            scene.bring_selected_to_front();
                        }
                        if ui.small_button("Swap with base").clicked() {
                            scene.swap_with_base(id);
                        }
                        if ui.small_button("Reset position").clicked() {
                            scene.reset_selected_position();
                        }
                    });
                }
            });
    }

    /// Small preview square; reuses the overlay's live texture rather than
    /// keeping a separate thumbnail cache.
    fn draw_thumbnail(&self, ui: &mut egui::Ui, scene: &mut SceneState, id: Uuid) {
        let (rect, _) = ui.allocate_exact_size(Vec2::splat(THUMB_EDGE), Sense::hover());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 2.0, ui.visuals().extreme_bg_color);

        let Some((w, h)) = scene.overlay(id).map(|o| o.image.dimensions()) else {
            return;
        };
        let Some(tex) = scene.overlay_texture(id, ui.ctx()) else {
            return;
        };
        let (fw, fh) = compose::contain_size(w, h, rect.width() - 4.0, rect.height() - 4.0);
        if fw < 1.0 || fh < 1.0 {
            return;
        }
        let inner = Rect::from_center_size(rect.center(), Vec2::new(fw, fh));
        painter.image(
            tex.id(),
            inner,
            Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
            Color32::WHITE,
        );
    }
}
