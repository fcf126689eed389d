use eframe::egui;
use egui::{Color32, Stroke};
use uuid::Uuid;

use crate::scene::{
    SceneState, TextStyle, FONT_SIZE_MAX, FONT_SIZE_MIN, STROKE_WIDTH_MAX, STROKE_WIDTH_MIN,
};

/// Caption authoring: the add form, whose style fields persist app-wide,
/// plus the caption list with in-place editing of the selected one.
#[derive(Default)]
pub struct TextPanel {
    new_content: String,
}

impl TextPanel {
    /// Returns true when the add form's style fields changed, so the app
    /// can persist them as the default caption style.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        scene: &mut SceneState,
        style: &mut TextStyle,
    ) -> bool {
        ui.add(
            egui::TextEdit::singleline(&mut self.new_content)
                .hint_text("Caption text…")
                .desired_width(f32::INFINITY),
        );
        let style_changed = style_controls(
            ui,
            &mut style.color,
            &mut style.font_size,
            &mut style.stroke_width,
        );

        let can_add = !self.new_content.trim().is_empty();
        if ui
            .add_enabled(can_add, egui::Button::new("Add text"))
            .clicked()
            && scene.add_text(self.new_content.clone(), *style).is_some()
        {
            self.new_content.clear();
        }

        ui.add_space(6.0);
        self.show_list(ui, scene);

        style_changed
    }

    fn show_list(&mut self, ui: &mut egui::Ui, scene: &mut SceneState) {
        if scene.texts().is_empty() {
            ui.weak("Captions you add appear here.");
            return;
        }
        let ids: Vec<Uuid> = scene.texts().iter().map(|t| t.id).collect();
        let accent = ui.visuals().selection.bg_fill;

        egui::ScrollArea::vertical()
            .id_source("text_list")
            .max_height(250.0)
            .show(ui, |ui| {
                for id in ids {
                    self.show_row(ui, scene, id, accent);
                    ui.add_space(3.0);
                }
            });
    }

    fn show_row(&mut self, ui: &mut egui::Ui, scene: &mut SceneState, id: Uuid, accent: Color32) {
        let Some(text) = scene.text(id) else {
            return;
        };
        let is_selected = scene.selection().text() == Some(id);
        let title = row_title(&text.content);
        // Working copies; edits feed back through the scene setters.
        let mut content = text.content.clone();
        let mut color = text.color;
        let mut font_size = text.font_size;
        let mut stroke_width = text.stroke_width;

        let frame_stroke = if is_selected {
            Stroke::new(1.5, accent)
        } else {
            ui.visuals().widgets.noninteractive.bg_stroke
        };

        egui::Frame::none()
            .stroke(frame_stroke)
            .rounding(4.0)
            .inner_margin(6.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    if ui.selectable_label(is_selected, title).clicked() {
                        scene.select_text(id);
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("✕").on_hover_text("Remove caption").clicked() {
                            scene.remove_text(id);
                        }
                    });
                });

                if is_selected {
                    let edit = ui.add(
                        egui::TextEdit::singleline(&mut content)
                            .id_source(("caption_edit", id))
                            .desired_width(f32::INFINITY),
                    );
                    if edit.changed() {
                        scene.set_text_content(id, &content);
                    }
                    if style_controls(ui, &mut color, &mut font_size, &mut stroke_width) {
                        scene.set_text_color(id, color);
                        scene.set_text_font_size(id, font_size);
                        scene.set_text_stroke_width(id, stroke_width);
                    }
                    ui.horizontal_wrapped(|ui| {
                        if ui.small_button("To front").clicked() {
                            scene.bring_selected_to_front();
                        }
                        if ui.small_button("Reset position").clicked() {
                            scene.reset_selected_position();
                        }
                    });
                }
            });
    }
}

/// Shared style row set for both the add form and the selected caption.
fn style_controls(
    ui: &mut egui::Ui,
    color: &mut [u8; 3],
    font_size: &mut f32,
    stroke_width: &mut f32,
) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        ui.label("Color");
        changed |= ui.color_edit_button_srgb(color).changed();
    });
    ui.horizontal(|ui| {
        ui.label("Font size");
        changed |= ui
            .add(
                egui::Slider::new(font_size, FONT_SIZE_MIN..=FONT_SIZE_MAX)
                    .suffix(" px")
                    .max_decimals(0),
            )
            .changed();
    });
    ui.horizontal(|ui| {
        ui.label("Outline");
        changed |= ui
            .add(
                egui::Slider::new(stroke_width, STROKE_WIDTH_MIN..=STROKE_WIDTH_MAX)
                    .step_by(0.5)
                    .fixed_decimals(1),
            )
            .changed();
    });
    changed
}

fn row_title(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return "(empty)".to_owned();
    }
    let mut title: String = trimmed.chars().take(24).collect();
    if trimmed.chars().count() > 24 {
        title.push('…');
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_titles_are_truncated_and_never_blank() {
        assert_eq!(row_title("  hello  "), "hello");
        assert_eq!(row_title(""), "(empty)");
        assert_eq!(row_title("   "), "(empty)");

        let long = "when the compiler finally accepts your lifetimes";
        let title = row_title(long);
        assert!(title.ends_with('…'));
        assert_eq!(title.chars().count(), 25);
    }
}
