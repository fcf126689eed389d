use egui::TextureHandle;
use image::RgbaImage;
use uuid::Uuid;

/// Default position (percent of container) for new elements and "reset position".
pub const DEFAULT_POS: PercentPos = PercentPos { x: 25.0, y: 25.0 };
/// Default edge length for a freshly added overlay, percent of the container edge.
pub const DEFAULT_OVERLAY_SIZE: f32 = 50.0;

/// Overlay size slider bounds (percent of container edge).
pub const OVERLAY_SIZE_MIN: f32 = 10.0;
pub const OVERLAY_SIZE_MAX: f32 = 100.0;
/// Caption font size bounds (pixels at container scale).
pub const FONT_SIZE_MIN: f32 = 12.0;
pub const FONT_SIZE_MAX: f32 = 72.0;
/// Caption outline width bounds (the slider steps by 0.5).
pub const STROKE_WIDTH_MIN: f32 = 0.0;
pub const STROKE_WIDTH_MAX: f32 = 5.0;

// ============================================================================
// POSITIONS
// ============================================================================

/// A point in percent-of-container units. `(0, 0)` is the container's top-left
/// corner, `(100, 100)` the bottom-right; elements are center-anchored on it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PercentPos {
    pub x: f32,
    pub y: f32,
}

impl PercentPos {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Clamp for an overlay of edge length `size`: the box is center-anchored,
    /// so the upper bound shrinks with the element — `[0, 100 - size/2]` keeps
    /// at least half of the box inside the container on every edge.
    pub fn clamped_for_overlay(self, size: f32) -> Self {
        let hi = (100.0 - size / 2.0).max(0.0);
        Self {
            x: self.x.clamp(0.0, hi),
            y: self.y.clamp(0.0, hi),
        }
    }

    /// Clamp for a text caption: the full `[0, 100]` square.
    pub fn clamped_for_text(self) -> Self {
        Self {
            x: self.x.clamp(0.0, 100.0),
            y: self.y.clamp(0.0, 100.0),
        }
    }
}

// ============================================================================
// SCENE ELEMENTS
// ============================================================================

/// Decoded pixels plus the lazily created GPU texture used to display them.
/// The texture travels with the pixels, so swapping images between the base
/// slot and an overlay keeps both views consistent without re-uploading.
#[derive(Clone)]
pub struct SceneImage {
    pixels: RgbaImage,
    texture: Option<TextureHandle>,
}

impl SceneImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            pixels,
            texture: None,
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Upload the pixels on first use and hand back the (cheaply cloneable)
    /// texture handle. Subsequent calls reuse the cached handle.
    pub fn texture(&mut self, ctx: &egui::Context, name: &str) -> TextureHandle {
        if let Some(tex) = &self.texture {
            return tex.clone();
        }
        let color_image = egui::ColorImage::from_rgba_unmultiplied(
            [self.pixels.width() as usize, self.pixels.height() as usize],
            self.pixels.as_raw(),
        );
        let tex = ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR);
        self.texture = Some(tex.clone());
        tex
    }
}

/// A secondary image layer above the base image: a square box center-anchored
/// at `pos`, edge length `size` percent of the container edge, depth `z`.
pub struct OverlayImage {
    pub id: Uuid,
    pub image: SceneImage,
    pub pos: PercentPos,
    pub size: f32,
    pub z: u64,
}

/// A styled caption layer, center-anchored at `pos`.
#[derive(Clone, Debug, PartialEq)]
pub struct TextElement {
    pub id: Uuid,
    pub content: String,
    pub pos: PercentPos,
    /// Fill color, sRGB.
    pub color: [u8; 3],
    /// Font size in pixels at the preview container's scale.
    pub font_size: f32,
    /// Hard outline offset in pixels (0 disables the outline).
    pub stroke_width: f32,
    pub z: u64,
}

/// Style fields of the new-text form; they persist between additions so the
/// next caption starts from the previous one's look.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub color: [u8; 3],
    pub font_size: f32,
    pub stroke_width: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            color: [255, 255, 255],
            font_size: 36.0,
            stroke_width: 2.0,
        }
    }
}

/// Which kind of scene element a drag or hit-test refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    Overlay,
    Text,
}

/// The scene-wide selection. A single tagged value, so "at most one of
/// overlay/text is selected" holds by construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Overlay(Uuid),
    Text(Uuid),
}

impl Selection {
    pub fn overlay(self) -> Option<Uuid> {
        match self {
            Selection::Overlay(id) => Some(id),
            _ => None,
        }
    }

    pub fn text(self) -> Option<Uuid> {
        match self {
            Selection::Text(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_none(self) -> bool {
        self == Selection::None
    }
}

// ============================================================================
// SCENE STATE
// ============================================================================

/// The whole editable scene: one optional base image, ordered overlays and
/// captions, the shared z counter and the current selection.
///
/// Every mutation keyed by id returns `bool` — `false` means the id no longer
/// exists and nothing changed. Callers treat that as a no-op (stale ids come
/// from UI races, not user errors) but can log it.
pub struct SceneState {
    base: Option<SceneImage>,
    overlays: Vec<OverlayImage>,
    texts: Vec<TextElement>,
    selection: Selection,
    /// Never reused: every creation, grab and bring-to-front consumes the
    /// next value, so the most recently touched element renders on top.
    next_z: u64,
}

impl Default for SceneState {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneState {
    pub fn new() -> Self {
        Self {
            base: None,
            overlays: Vec::new(),
            texts: Vec::new(),
            selection: Selection::None,
            next_z: 1,
        }
    }

    // -- accessors -------------------------------------------------------

    pub fn has_base(&self) -> bool {
        self.base.is_some()
    }

    pub fn base(&self) -> Option<&SceneImage> {
        self.base.as_ref()
    }

    pub fn overlays(&self) -> &[OverlayImage] {
        &self.overlays
    }

    pub fn texts(&self) -> &[TextElement] {
        &self.texts
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn overlay(&self, id: Uuid) -> Option<&OverlayImage> {
        self.overlays.iter().find(|o| o.id == id)
    }

    pub fn text(&self, id: Uuid) -> Option<&TextElement> {
        self.texts.iter().find(|t| t.id == id)
    }

    pub fn selected_overlay(&self) -> Option<&OverlayImage> {
        self.selection.overlay().and_then(|id| self.overlay(id))
    }

    pub fn selected_text(&self) -> Option<&TextElement> {
        self.selection.text().and_then(|id| self.text(id))
    }

    /// `(kind, id)` pairs in ascending z order — overlays and captions
    /// interleave by depth, exactly the order the renderer paints them in.
    pub fn draw_order(&self) -> Vec<(ElementKind, Uuid)> {
        let mut order: Vec<(u64, ElementKind, Uuid)> = self
            .overlays
            .iter()
            .map(|o| (o.z, ElementKind::Overlay, o.id))
            .chain(self.texts.iter().map(|t| (t.z, ElementKind::Text, t.id)))
            .collect();
        order.sort_by_key(|(z, _, _)| *z);
        order.into_iter().map(|(_, kind, id)| (kind, id)).collect()
    }

    // -- textures (display-side; pixels stay authoritative) --------------

    pub fn base_texture(&mut self, ctx: &egui::Context) -> Option<TextureHandle> {
        self.base.as_mut().map(|img| img.texture(ctx, "meme-base"))
    }

    pub fn overlay_texture(&mut self, id: Uuid, ctx: &egui::Context) -> Option<TextureHandle> {
        let name = format!("overlay-{id}");
        self.overlays
            .iter_mut()
            .find(|o| o.id == id)
            .map(|o| o.image.texture(ctx, &name))
    }

    // -- base slot -------------------------------------------------------

    /// Replace the base image (the slot holds exactly one; last one wins).
    pub fn set_base(&mut self, image: SceneImage) {
        self.base = Some(image);
    }

    // -- element creation ------------------------------------------------

    /// Append an overlay with default position/size and the next z, and make
    /// it the sole selection.
    pub fn add_overlay(&mut self, image: SceneImage) -> Uuid {
        let id = Uuid::new_v4();
        let z = self.take_z();
        self.overlays.push(OverlayImage {
            id,
            image,
            pos: DEFAULT_POS,
            size: DEFAULT_OVERLAY_SIZE,
            z,
        });
        self.selection = Selection::Overlay(id);
        id
    }

    /// Append a caption with default position, the given style and the next
    /// z, and make it the sole selection. Whitespace-only content is refused
    /// (the add form is disabled for it; this guard catches programmatic use).
    pub fn add_text(&mut self, content: impl Into<String>, style: TextStyle) -> Option<Uuid> {
        let content = content.into();
        if content.trim().is_empty() {
            return None;
        }
        let id = Uuid::new_v4();
        let z = self.take_z();
        self.texts.push(TextElement {
            id,
            content,
            pos: DEFAULT_POS,
            color: style.color,
            font_size: style.font_size.clamp(FONT_SIZE_MIN, FONT_SIZE_MAX),
            stroke_width: style.stroke_width.clamp(STROKE_WIDTH_MIN, STROKE_WIDTH_MAX),
            z,
        });
        self.selection = Selection::Text(id);
        Some(id)
    }

    // -- element patches -------------------------------------------------

    pub fn move_overlay(&mut self, id: Uuid, pos: PercentPos) -> bool {
        let Some(overlay) = self.overlays.iter_mut().find(|o| o.id == id) else {
            return false;
        };
        overlay.pos = pos.clamped_for_overlay(overlay.size);
        true
    }

    /// Set the overlay's edge length (clamped to the slider range) and
    /// re-clamp its position, so the position invariant holds after growth.
    pub fn resize_overlay(&mut self, id: Uuid, size: f32) -> bool {
        let Some(overlay) = self.overlays.iter_mut().find(|o| o.id == id) else {
            return false;
        };
        overlay.size = size.clamp(OVERLAY_SIZE_MIN, OVERLAY_SIZE_MAX);
        overlay.pos = overlay.pos.clamped_for_overlay(overlay.size);
        true
    }

    pub fn move_text(&mut self, id: Uuid, pos: PercentPos) -> bool {
        let Some(text) = self.texts.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        text.pos = pos.clamped_for_text();
        true
    }

    pub fn set_text_content(&mut self, id: Uuid, content: &str) -> bool {
        let Some(text) = self.texts.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        text.content = content.to_owned();
        true
    }

    pub fn set_text_color(&mut self, id: Uuid, color: [u8; 3]) -> bool {
        let Some(text) = self.texts.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        text.color = color;
        true
    }

    pub fn set_text_font_size(&mut self, id: Uuid, font_size: f32) -> bool {
        let Some(text) = self.texts.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        text.font_size = font_size.clamp(FONT_SIZE_MIN, FONT_SIZE_MAX);
        true
    }

    pub fn set_text_stroke_width(&mut self, id: Uuid, stroke_width: f32) -> bool {
        let Some(text) = self.texts.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        text.stroke_width = stroke_width.clamp(STROKE_WIDTH_MIN, STROKE_WIDTH_MAX);
        true
    }

    // -- element removal -------------------------------------------------

    pub fn remove_overlay(&mut self, id: Uuid) -> bool {
        let before = self.overlays.len();
        self.overlays.retain(|o| o.id != id);
        let removed = self.overlays.len() != before;
        if removed && self.selection == Selection::Overlay(id) {
            self.selection = Selection::None;
        }
        removed
    }

    pub fn remove_text(&mut self, id: Uuid) -> bool {
        let before = self.texts.len();
        self.texts.retain(|t| t.id != id);
        let removed = self.texts.len() != before;
        if removed && self.selection == Selection::Text(id) {
            self.selection = Selection::None;
        }
        removed
    }

    /// Remove whatever is currently selected (the Delete-key path).
    pub fn remove_selected(&mut self) -> bool {
        match self.selection {
            Selection::Overlay(id) => self.remove_overlay(id),
            Selection::Text(id) => self.remove_text(id),
            Selection::None => false,
        }
    }

    // -- base/overlay swap -----------------------------------------------

    /// Exchange image data between the base slot and the overlay. The overlay
    /// keeps its id, position, size and z — only the pictures trade places.
    pub fn swap_with_base(&mut self, id: Uuid) -> bool {
        let Some(base) = self.base.as_mut() else {
            return false;
        };
        let Some(overlay) = self.overlays.iter_mut().find(|o| o.id == id) else {
            return false;
        };
        std::mem::swap(base, &mut overlay.image);
        true
    }

    // -- selection -------------------------------------------------------

    /// Select an overlay from the management list. Clears any text selection;
    /// does not touch z.
    pub fn select_overlay(&mut self, id: Uuid) -> bool {
        if self.overlay(id).is_none() {
            return false;
        }
        self.selection = Selection::Overlay(id);
        true
    }

    pub fn select_text(&mut self, id: Uuid) -> bool {
        if self.text(id).is_none() {
            return false;
        }
        self.selection = Selection::Text(id);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
    }

    /// Drag-start semantics: select the element AND raise it to the front by
    /// consuming the next z (grab-to-front).
    pub fn grab(&mut self, kind: ElementKind, id: Uuid) -> bool {
        match kind {
            ElementKind::Overlay => {
                let Some(idx) = self.overlays.iter().position(|o| o.id == id) else {
                    return false;
                };
                let z = self.take_z();
                self.overlays[idx].z = z;
                self.selection = Selection::Overlay(id);
                true
            }
            ElementKind::Text => {
                let Some(idx) = self.texts.iter().position(|t| t.id == id) else {
                    return false;
                };
                let z = self.take_z();
                self.texts[idx].z = z;
                self.selection = Selection::Text(id);
                true
            }
        }
    }

    /// Re-assign the next z to the selected element only.
    pub fn bring_selected_to_front(&mut self) -> bool {
        match self.selection {
            Selection::Overlay(id) => self.grab(ElementKind::Overlay, id),
            Selection::Text(id) => self.grab(ElementKind::Text, id),
            Selection::None => false,
        }
    }

    /// Put the selected element back at the default position, whatever its
    /// kind and wherever it was.
    pub fn reset_selected_position(&mut self) -> bool {
        match self.selection {
            Selection::Overlay(id) => self.move_overlay(id, DEFAULT_POS),
            Selection::Text(id) => self.move_text(id, DEFAULT_POS),
            Selection::None => false,
        }
    }

    fn take_z(&mut self) -> u64 {
        let z = self.next_z;
        self.next_z += 1;
        z
    }

    // -- export snapshot -------------------------------------------------

    /// Plain-data copy of everything the exporter needs. `None` while the
    /// base slot is empty — there is nothing to flatten and the Download
    /// action stays disabled.
    pub fn snapshot(&self) -> Option<SceneSnapshot> {
        let base = self.base.as_ref()?.pixels().clone();
        Some(SceneSnapshot {
            base,
            overlays: self
                .overlays
                .iter()
                .map(|o| OverlaySnapshot {
                    pixels: o.image.pixels().clone(),
                    pos: o.pos,
                    size: o.size,
                    z: o.z,
                })
                .collect(),
            texts: self.texts.clone(),
        })
    }
}

/// What the export thread receives: no ids, no textures, just pixels and
/// layout. Cloned out of the scene so the UI thread keeps editing freely
/// while the flatten runs.
pub struct SceneSnapshot {
    pub base: RgbaImage,
    pub overlays: Vec<OverlaySnapshot>,
    pub texts: Vec<TextElement>,
}

pub struct OverlaySnapshot {
    pub pixels: RgbaImage,
    pub pos: PercentPos,
    pub size: f32,
    pub z: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn img(w: u32, h: u32, px: [u8; 4]) -> SceneImage {
        SceneImage::new(RgbaImage::from_pixel(w, h, Rgba(px)))
    }

    fn scene_with_base() -> SceneState {
        let mut scene = SceneState::new();
        scene.set_base(img(8, 8, [10, 10, 10, 255]));
        scene
    }

    #[test]
    fn new_overlay_gets_defaults_and_sole_selection() {
        let mut scene = scene_with_base();
        let id = scene.add_overlay(img(4, 4, [1, 2, 3, 255]));
        let overlay = scene.overlay(id).unwrap();
        assert_eq!(overlay.pos, PercentPos::new(25.0, 25.0));
        assert_eq!(overlay.size, 50.0);
        assert_eq!(scene.selection(), Selection::Overlay(id));
    }

    #[test]
    fn z_values_are_strictly_increasing_and_never_reused() {
        let mut scene = scene_with_base();
        let a = scene.add_overlay(img(4, 4, [1, 0, 0, 255]));
        let b = scene.add_overlay(img(4, 4, [2, 0, 0, 255]));
        let t = scene.add_text("top text", TextStyle::default()).unwrap();

        let za = scene.overlay(a).unwrap().z;
        let zb = scene.overlay(b).unwrap().z;
        let zt = scene.text(t).unwrap().z;
        assert!(za < zb && zb < zt);

        // Grabbing the first overlay raises it above everything added so far.
        assert!(scene.grab(ElementKind::Overlay, a));
        let za2 = scene.overlay(a).unwrap().z;
        assert!(za2 > zt);
        // The old value was not recycled.
        assert_ne!(za2, za);
        assert_ne!(za2, zb);
        assert_ne!(za2, zt);
    }

    #[test]
    fn text_added_after_overlays_renders_above_them() {
        let mut scene = scene_with_base();
        let a = scene.add_overlay(img(4, 4, [1, 0, 0, 255]));
        let b = scene.add_overlay(img(4, 4, [2, 0, 0, 255]));
        let t = scene.add_text("caption", TextStyle::default()).unwrap();
        let zt = scene.text(t).unwrap().z;
        assert!(zt > scene.overlay(a).unwrap().z);
        assert!(zt > scene.overlay(b).unwrap().z);
        // And the draw order ends with the caption.
        assert_eq!(scene.draw_order().last(), Some(&(ElementKind::Text, t)));
    }

    #[test]
    fn selection_is_mutually_exclusive() {
        let mut scene = scene_with_base();
        let o = scene.add_overlay(img(4, 4, [1, 0, 0, 255]));
        let t = scene.add_text("hi", TextStyle::default()).unwrap();
        assert_eq!(scene.selection(), Selection::Text(t));

        assert!(scene.select_overlay(o));
        assert_eq!(scene.selection(), Selection::Overlay(o));
        assert_eq!(scene.selection().text(), None);
        assert_eq!(scene.selected_overlay().map(|ov| ov.id), Some(o));
        assert!(scene.selected_text().is_none());

        assert!(scene.select_text(t));
        assert_eq!(scene.selection(), Selection::Text(t));
        assert_eq!(scene.selection().overlay(), None);
        assert_eq!(scene.selected_text().map(|tx| tx.id), Some(t));
        assert!(scene.selected_overlay().is_none());
    }

    #[test]
    fn removing_selected_element_clears_selection() {
        let mut scene = scene_with_base();
        let o = scene.add_overlay(img(4, 4, [1, 0, 0, 255]));
        assert!(scene.remove_overlay(o));
        assert!(scene.selection().is_none());

        let t = scene.add_text("bye", TextStyle::default()).unwrap();
        assert!(scene.remove_text(t));
        assert!(scene.selection().is_none());
        assert!(scene.texts().is_empty());
    }

    #[test]
    fn removing_unselected_element_keeps_selection() {
        let mut scene = scene_with_base();
        let a = scene.add_overlay(img(4, 4, [1, 0, 0, 255]));
        let b = scene.add_overlay(img(4, 4, [2, 0, 0, 255]));
        assert_eq!(scene.selection(), Selection::Overlay(b));
        assert!(scene.remove_overlay(a));
        assert_eq!(scene.selection(), Selection::Overlay(b));
    }

    #[test]
    fn overlay_drag_clamps_to_shrunken_upper_bound() {
        let mut scene = scene_with_base();
        let id = scene.add_overlay(img(4, 4, [1, 0, 0, 255]));
        assert!(scene.resize_overlay(id, 80.0));
        // Pointer at the bottom-right corner of the container.
        assert!(scene.move_overlay(id, PercentPos::new(100.0, 100.0)));
        assert_eq!(scene.overlay(id).unwrap().pos, PercentPos::new(60.0, 60.0));

        // And below zero on the other side.
        assert!(scene.move_overlay(id, PercentPos::new(-15.0, -3.0)));
        assert_eq!(scene.overlay(id).unwrap().pos, PercentPos::new(0.0, 0.0));
    }

    #[test]
    fn text_drag_clamps_to_full_container() {
        let mut scene = scene_with_base();
        let id = scene.add_text("edge", TextStyle::default()).unwrap();
        assert!(scene.move_text(id, PercentPos::new(130.0, -20.0)));
        assert_eq!(scene.text(id).unwrap().pos, PercentPos::new(100.0, 0.0));
    }

    #[test]
    fn resize_reclamps_position_to_new_bound() {
        let mut scene = scene_with_base();
        let id = scene.add_overlay(img(4, 4, [1, 0, 0, 255]));
        assert!(scene.resize_overlay(id, 80.0));
        assert!(scene.move_overlay(id, PercentPos::new(60.0, 60.0)));
        // Growing to 100 shrinks the legal square to [0, 50].
        assert!(scene.resize_overlay(id, 100.0));
        assert_eq!(scene.overlay(id).unwrap().pos, PercentPos::new(50.0, 50.0));
    }

    #[test]
    fn reset_position_restores_default_for_either_kind() {
        let mut scene = scene_with_base();
        let o = scene.add_overlay(img(4, 4, [1, 0, 0, 255]));
        scene.move_overlay(o, PercentPos::new(70.0, 5.0));
        scene.select_overlay(o);
        assert!(scene.reset_selected_position());
        assert_eq!(scene.overlay(o).unwrap().pos, DEFAULT_POS);

        let t = scene.add_text("back", TextStyle::default()).unwrap();
        scene.move_text(t, PercentPos::new(99.0, 99.0));
        assert!(scene.reset_selected_position());
        assert_eq!(scene.text(t).unwrap().pos, DEFAULT_POS);
    }

    #[test]
    fn swap_with_base_exchanges_pixels_only() {
        let mut scene = SceneState::new();
        scene.set_base(img(8, 6, [9, 9, 9, 255]));
        let id = scene.add_overlay(img(3, 5, [7, 7, 7, 255]));
        scene.move_overlay(id, PercentPos::new(40.0, 10.0));
        let before = scene.overlay(id).unwrap();
        let (pos, size, z) = (before.pos, before.size, before.z);

        assert!(scene.swap_with_base(id));

        let after = scene.overlay(id).unwrap();
        assert_eq!(after.id, id);
        assert_eq!(after.pos, pos);
        assert_eq!(after.size, size);
        assert_eq!(after.z, z);
        // The pictures traded places.
        assert_eq!(after.image.dimensions(), (8, 6));
        assert_eq!(scene.base().unwrap().dimensions(), (3, 5));
    }

    #[test]
    fn swap_requires_base_and_overlay() {
        let mut scene = SceneState::new();
        let id = scene.add_overlay(img(4, 4, [1, 0, 0, 255]));
        assert!(!scene.swap_with_base(id)); // no base yet
        scene.set_base(img(8, 8, [0, 0, 0, 255]));
        assert!(!scene.swap_with_base(Uuid::new_v4())); // unknown overlay
        assert!(scene.swap_with_base(id));
    }

    #[test]
    fn unknown_ids_are_silent_noops() {
        let mut scene = scene_with_base();
        scene.add_overlay(img(4, 4, [1, 0, 0, 255]));
        scene.add_text("solid", TextStyle::default());
        let ghost = Uuid::new_v4();

        assert!(!scene.move_overlay(ghost, PercentPos::new(1.0, 1.0)));
        assert!(!scene.resize_overlay(ghost, 60.0));
        assert!(!scene.move_text(ghost, PercentPos::new(1.0, 1.0)));
        assert!(!scene.set_text_content(ghost, "x"));
        assert!(!scene.set_text_color(ghost, [0, 0, 0]));
        assert!(!scene.set_text_font_size(ghost, 20.0));
        assert!(!scene.set_text_stroke_width(ghost, 1.0));
        assert!(!scene.remove_overlay(ghost));
        assert!(!scene.remove_text(ghost));
        assert!(!scene.select_overlay(ghost));
        assert!(!scene.select_text(ghost));

        assert_eq!(scene.overlays().len(), 1);
        assert_eq!(scene.texts().len(), 1);
    }

    #[test]
    fn add_text_refuses_blank_content() {
        let mut scene = scene_with_base();
        assert!(scene.add_text("", TextStyle::default()).is_none());
        assert!(scene.add_text("   \n\t", TextStyle::default()).is_none());
        assert!(scene.texts().is_empty());
        assert!(scene.selection().is_none());
    }

    #[test]
    fn text_style_fields_are_range_clamped() {
        let mut scene = scene_with_base();
        let style = TextStyle {
            color: [1, 2, 3],
            font_size: 500.0,
            stroke_width: -2.0,
        };
        let id = scene.add_text("big", style).unwrap();
        let text = scene.text(id).unwrap();
        assert_eq!(text.font_size, FONT_SIZE_MAX);
        assert_eq!(text.stroke_width, STROKE_WIDTH_MIN);

        assert!(scene.set_text_font_size(id, 1.0));
        assert_eq!(scene.text(id).unwrap().font_size, FONT_SIZE_MIN);
        assert!(scene.set_text_stroke_width(id, 99.0));
        assert_eq!(scene.text(id).unwrap().stroke_width, STROKE_WIDTH_MAX);
    }

    #[test]
    fn list_selection_does_not_touch_z() {
        let mut scene = scene_with_base();
        let a = scene.add_overlay(img(4, 4, [1, 0, 0, 255]));
        let b = scene.add_overlay(img(4, 4, [2, 0, 0, 255]));
        let za = scene.overlay(a).unwrap().z;
        assert!(scene.select_overlay(a));
        assert_eq!(scene.overlay(a).unwrap().z, za);
        assert!(scene.overlay(b).unwrap().z > za);
    }

    #[test]
    fn bring_to_front_raises_only_the_selection() {
        let mut scene = scene_with_base();
        let a = scene.add_overlay(img(4, 4, [1, 0, 0, 255]));
        let t = scene.add_text("lift me", TextStyle::default()).unwrap();
        let zo_before = scene.overlay(a).unwrap().z;

        assert_eq!(scene.selection(), Selection::Text(t));
        assert!(scene.bring_selected_to_front());
        assert!(scene.text(t).unwrap().z > zo_before);
        assert_eq!(scene.overlay(a).unwrap().z, zo_before);

        scene.clear_selection();
        assert!(!scene.bring_selected_to_front());
    }

    #[test]
    fn base_slot_holds_one_image_last_wins() {
        let mut scene = SceneState::new();
        scene.set_base(img(2, 2, [1, 1, 1, 255]));
        scene.set_base(img(5, 7, [2, 2, 2, 255]));
        assert_eq!(scene.base().unwrap().dimensions(), (5, 7));
    }

    #[test]
    fn snapshot_requires_base() {
        let mut scene = SceneState::new();
        scene.add_overlay(img(4, 4, [1, 0, 0, 255]));
        assert!(scene.snapshot().is_none());

        scene.set_base(img(8, 8, [0, 0, 0, 255]));
        let snap = scene.snapshot().unwrap();
        assert_eq!(snap.base.dimensions(), (8, 8));
        assert_eq!(snap.overlays.len(), 1);
    }

    #[test]
    fn remove_selected_follows_the_selection() {
        let mut scene = scene_with_base();
        let o = scene.add_overlay(img(4, 4, [1, 0, 0, 255]));
        let t = scene.add_text("zap", TextStyle::default()).unwrap();

        assert!(scene.remove_selected()); // text was selected last
        assert!(scene.text(t).is_none());
        assert!(scene.selection().is_none());

        scene.select_overlay(o);
        assert!(scene.remove_selected());
        assert!(scene.overlay(o).is_none());
        assert!(!scene.remove_selected());
    }
}
