use eframe::egui;
use egui::{
    Align2, Color32, CursorIcon, FontId, Pos2, Rect, Response, Sense, Shape, Stroke, Ui, Vec2,
};
use uuid::Uuid;

use crate::assets::{self, CAPTION_FONT_FAMILY};
use crate::ops::caption::{self, CaptionLayout};
use crate::ops::compose::{self, CANVAS_BACKDROP};
use crate::scene::{ElementKind, PercentPos, SceneState, Selection, TextElement};
use crate::theme::Theme;

/// Horizontal padding around a caption's hit/ring box, matching the preview
/// chrome rather than the rendered glyphs.
const TEXT_PAD_X: f32 = 16.0;
const TEXT_PAD_Y: f32 = 8.0;

/// One drag gesture. `Dragging` pins the grabbed element for the whole
/// gesture, so the pointer can cross other elements without switching targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { kind: ElementKind, id: Uuid },
}

/// The square editing container: paints the scene, runs drag gestures and
/// remembers its on-screen size for the exporter.
pub struct Canvas {
    drag: DragState,
    last_edge: f32,
    caption_family: egui::FontFamily,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    pub fn new() -> Self {
        // If the caption typeface failed to install, egui's proportional
        // family keeps preview captions legible.
        let caption_family = if assets::caption_font().is_some() {
            egui::FontFamily::Name(CAPTION_FONT_FAMILY.into())
        } else {
            egui::FontFamily::Proportional
        };
        Self {
            drag: DragState::Idle,
            last_edge: 0.0,
            caption_family,
        }
    }

    /// Edge length (pixels) the container was last shown at. The export
    /// flattens at exactly this size, so the PNG matches the preview.
    pub fn last_edge(&self) -> f32 {
        self.last_edge
    }

    pub fn show(&mut self, ui: &mut Ui, scene: &mut SceneState, theme: &Theme) {
        let avail = ui.available_size();
        let edge = avail.x.min(avail.y).max(64.0);
        self.last_edge = edge;

        let (rect, response) = ui.allocate_exact_size(Vec2::splat(edge), Sense::click_and_drag());
        let weak_text = ui.visuals().weak_text_color();

        // Input first: a grab re-orders z and should paint re-ordered in the
        // same frame, like the browser original re-rendering on mousedown.
        self.handle_pointer(ui.ctx(), scene, &response, rect);

        let painter = ui.painter_at(rect);
        let backdrop = Color32::from_rgba_premultiplied(
            CANVAS_BACKDROP[0],
            CANVAS_BACKDROP[1],
            CANVAS_BACKDROP[2],
            CANVAS_BACKDROP[3],
        );
        painter.rect_filled(rect, 4.0, backdrop);

        if scene.has_base() {
            self.paint_base(ui.ctx(), &painter, scene, rect);
            self.paint_elements(ui.ctx(), &painter, scene, rect);
            self.paint_selection(&painter, scene, rect, theme);
        } else {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "Drop your main image here or use the controls",
                FontId::proportional(15.0),
                weak_text,
            );
        }

        draw_dashed_frame(&painter, rect, theme.canvas_frame);
    }

    // -- painting --------------------------------------------------------

    fn paint_base(
        &self,
        ctx: &egui::Context,
        painter: &egui::Painter,
        scene: &mut SceneState,
        rect: Rect,
    ) {
        let Some((bw, bh)) = scene.base().map(|b| b.dimensions()) else {
            return;
        };
        let Some(tex) = scene.base_texture(ctx) else {
            return;
        };
        let (fw, fh) = compose::contain_size(bw, bh, rect.width(), rect.height());
        let image_rect = Rect::from_center_size(rect.center(), Vec2::new(fw, fh));
        painter.image(tex.id(), image_rect, uv_full(), Color32::WHITE);
    }

    fn paint_elements(
        &self,
        ctx: &egui::Context,
        painter: &egui::Painter,
        scene: &mut SceneState,
        rect: Rect,
    ) {
        for (kind, id) in scene.draw_order() {
            match kind {
                ElementKind::Overlay => {
                    let Some(overlay) = scene.overlay(id) else {
                        continue;
                    };
                    let bbox = overlay_rect(overlay.pos, overlay.size, rect);
                    let (ow, oh) = overlay.image.dimensions();
                    let (fw, fh) = compose::contain_size(ow, oh, bbox.width(), bbox.height());
                    if fw < 1.0 || fh < 1.0 {
                        continue;
                    }
                    let inner = Rect::from_center_size(bbox.center(), Vec2::new(fw, fh));
                    let Some(tex) = scene.overlay_texture(id, ctx) else {
                        continue;
                    };
                    painter.image(tex.id(), inner, uv_full(), Color32::WHITE);
                }
                ElementKind::Text => {
                    let Some(text) = scene.text(id) else {
                        continue;
                    };
                    self.paint_caption(painter, text, rect);
                }
            }
        }
    }

    fn paint_caption(&self, painter: &egui::Painter, text: &TextElement, rect: Rect) {
        if text.content.trim().is_empty() {
            return;
        }
        let edge = rect.width();
        let (ax, ay) = compose::caption_anchor(text.pos, edge);
        let anchor = Pos2::new(rect.min.x + ax, rect.min.y + ay);
        let fill = Color32::from_rgb(text.color[0], text.color[1], text.color[2]);
        let font_id = FontId::new(text.font_size, self.caption_family.clone());

        let Some(layout) = self.caption_layout(text, edge) else {
            // No resolved caption font: single unwrapped line, still outlined.
            self.paint_outlined_line(
                painter,
                anchor,
                &text.content.to_uppercase(),
                &font_id,
                fill,
                text.stroke_width,
            );
            return;
        };

        let top = anchor.y - layout.height / 2.0;
        for (i, line) in layout.lines.iter().enumerate() {
            let cy = top + (i as f32 + 0.5) * layout.line_height;
            self.paint_outlined_line(
                painter,
                Pos2::new(anchor.x, cy),
                line,
                &font_id,
                fill,
                text.stroke_width,
            );
        }
    }

    /// One centered line: four black copies at the diagonal stroke offsets,
    /// then the fill on top.
    fn paint_outlined_line(
        &self,
        painter: &egui::Painter,
        center: Pos2,
        line: &str,
        font_id: &FontId,
        fill: Color32,
        stroke: f32,
    ) {
        if stroke > 0.0 {
            for (dx, dy) in [(-stroke, -stroke), (stroke, -stroke), (-stroke, stroke), (stroke, stroke)]
            {
                painter.text(
                    center + Vec2::new(dx, dy),
                    Align2::CENTER_CENTER,
                    line,
                    font_id.clone(),
                    Color32::BLACK,
                );
            }
        }
        painter.text(center, Align2::CENTER_CENTER, line, font_id.clone(), fill);
    }

    fn paint_selection(
        &self,
        painter: &egui::Painter,
        scene: &SceneState,
        rect: Rect,
        theme: &Theme,
    ) {
        match scene.selection() {
            Selection::Overlay(id) => {
                if let Some(overlay) = scene.overlay(id) {
                    let ring = overlay_rect(overlay.pos, overlay.size, rect).expand(3.0);
                    painter.rect_stroke(ring, 2.0, Stroke::new(2.0, theme.accent));
                }
            }
            Selection::Text(id) => {
                if let Some(text) = scene.text(id) {
                    let ring = self.text_ring_rect(text, rect);
                    painter.rect_filled(ring, 2.0, Color32::from_black_alpha(26));
                    painter.rect_stroke(ring.expand(3.0), 2.0, Stroke::new(2.0, theme.accent));
                }
            }
            Selection::None => {}
        }
    }

    // -- geometry --------------------------------------------------------

    fn caption_layout(&self, text: &TextElement, edge: f32) -> Option<CaptionLayout> {
        let font = assets::caption_font()?;
        caption::layout_caption(&font.font, text.font_size, &text.content, edge)
    }

    /// Hit/ring box of a caption: the text block plus its padding chrome.
    fn text_ring_rect(&self, text: &TextElement, rect: Rect) -> Rect {
        let edge = rect.width();
        let (ax, ay) = compose::caption_anchor(text.pos, edge);
        let center = Pos2::new(rect.min.x + ax, rect.min.y + ay);
        let (w, h) = match self.caption_layout(text, edge) {
            Some(layout) => (layout.width, layout.height),
            // Rough footprint when no font resolved or the content is blank.
            None => (
                text.content.chars().count() as f32 * text.font_size * 0.55,
                text.font_size * caption::LINE_HEIGHT,
            ),
        };
        Rect::from_center_size(
            center,
            Vec2::new(w + TEXT_PAD_X * 2.0, h + TEXT_PAD_Y * 2.0),
        )
    }

    /// Topmost element under the pointer, scanning descending z.
    fn hit_test(&self, scene: &SceneState, rect: Rect, pos: Pos2) -> Option<(ElementKind, Uuid)> {
        for (kind, id) in scene.draw_order().into_iter().rev() {
            let hit_rect = match kind {
                ElementKind::Overlay => scene.overlay(id).map(|o| overlay_rect(o.pos, o.size, rect)),
                ElementKind::Text => scene.text(id).map(|t| self.text_ring_rect(t, rect)),
            };
            if let Some(r) = hit_rect
                && r.contains(pos)
            {
                return Some((kind, id));
            }
        }
        None
    }

    // -- input -----------------------------------------------------------

    fn handle_pointer(
        &mut self,
        ctx: &egui::Context,
        scene: &mut SceneState,
        response: &Response,
        rect: Rect,
    ) {
        // A release anywhere ends the gesture, even when the pointer left the
        // window mid-drag.
        if ctx.input(|i| i.pointer.any_released()) {
            self.drag = DragState::Idle;
        }

        if response.drag_started()
            && let Some(pos) = response.interact_pointer_pos()
            && let Some((kind, id)) = self.hit_test(scene, rect, pos)
        {
            // Press selects and raises, exactly like dragging does.
            scene.grab(kind, id);
            self.drag = DragState::Dragging { kind, id };
        }

        if let DragState::Dragging { kind, id } = self.drag {
            if response.dragged()
                && let Some(pos) = response.interact_pointer_pos()
            {
                let pct = pointer_to_percent(pos, rect);
                let moved = match kind {
                    ElementKind::Overlay => scene.move_overlay(id, pct),
                    ElementKind::Text => scene.move_text(id, pct),
                };
                if !moved {
                    log_warn!("Drag target disappeared mid-gesture; ending drag");
                    self.drag = DragState::Idle;
                }
            }
            ctx.output_mut(|o| o.cursor_icon = CursorIcon::Grabbing);
        } else if let Some(hover) = response.hover_pos()
            && self.hit_test(scene, rect, hover).is_some()
        {
            ctx.output_mut(|o| o.cursor_icon = CursorIcon::Grab);
        }

        if response.drag_released() {
            self.drag = DragState::Idle;
        }
    }
}

/// Pointer position to percent-of-container coordinates. Unclamped; the
/// scene clamps per element kind.
pub fn pointer_to_percent(pos: Pos2, rect: Rect) -> PercentPos {
    PercentPos::new(
        (pos.x - rect.left()) / rect.width() * 100.0,
        (pos.y - rect.top()) / rect.height() * 100.0,
    )
}

/// An overlay's box inside the container, in screen coordinates.
fn overlay_rect(pos: PercentPos, size: f32, rect: Rect) -> Rect {
    let bbox = compose::overlay_box(pos, size, rect.width());
    Rect::from_center_size(
        Pos2::new(rect.min.x + bbox.cx, rect.min.y + bbox.cy),
        Vec2::new(bbox.w, bbox.h),
    )
}

fn uv_full() -> Rect {
    Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0))
}

fn draw_dashed_frame(painter: &egui::Painter, rect: Rect, color: Color32) {
    let stroke = Stroke::new(2.0, color);
    let corners = [
        rect.left_top(),
        rect.right_top(),
        rect.right_bottom(),
        rect.left_bottom(),
    ];
    let mut shapes: Vec<Shape> = Vec::new();
    for i in 0..4 {
        shapes.extend(Shape::dashed_line(
            &[corners[i], corners[(i + 1) % 4]],
            stroke,
            8.0,
            6.0,
        ));
    }
    painter.extend(shapes);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container() -> Rect {
        Rect::from_min_size(Pos2::new(100.0, 50.0), Vec2::splat(400.0))
    }

    #[test]
    fn pointer_maps_to_percent_coordinates() {
        let rect = container();
        let center = pointer_to_percent(rect.center(), rect);
        assert_eq!(center, PercentPos::new(50.0, 50.0));

        let origin = pointer_to_percent(rect.left_top(), rect);
        assert_eq!(origin, PercentPos::new(0.0, 0.0));

        let outside = pointer_to_percent(Pos2::new(600.0, 30.0), rect);
        assert!(outside.x > 100.0);
        assert!(outside.y < 0.0);
    }

    #[test]
    fn overlay_rect_is_center_anchored() {
        let rect = container();
        let r = overlay_rect(PercentPos::new(50.0, 50.0), 50.0, rect);
        assert_eq!(r.center(), rect.center());
        assert_eq!(r.width(), 200.0);
        assert_eq!(r.height(), 200.0);
    }

    #[test]
    fn drag_state_defaults_to_idle() {
        assert_eq!(DragState::default(), DragState::Idle);
    }
}
