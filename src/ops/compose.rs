// ============================================================================
// COMPOSE — flattens the scene into a single RGBA image
// ============================================================================
//
// The same geometry functions drive both the on-screen preview and the export,
// so the PNG a user downloads matches what the canvas showed pixel for pixel:
//   contain_size()  — object-fit: scale to fit a box, preserving aspect
//   overlay_box()   — percent position/size to a center-anchored pixel box
//   flatten()       — backdrop, letterboxed base, then every overlay and
//                     caption in ascending z order
// ============================================================================

use ab_glyph::FontArc;
use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::ops::caption;
use crate::scene::{OverlaySnapshot, PercentPos, SceneSnapshot, TextElement};

/// Backdrop behind the letterboxed base image, in both preview and export.
pub const CANVAS_BACKDROP: [u8; 4] = [243, 244, 246, 255];

/// A center-anchored box in container pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelBox {
    pub cx: f32,
    pub cy: f32,
    pub w: f32,
    pub h: f32,
}

/// Scale `(img_w, img_h)` to fit inside `(box_w, box_h)` without cropping,
/// preserving aspect ratio. Upscales small images, like `object-fit: contain`.
pub fn contain_size(img_w: u32, img_h: u32, box_w: f32, box_h: f32) -> (f32, f32) {
    if img_w == 0 || img_h == 0 || box_w <= 0.0 || box_h <= 0.0 {
        return (0.0, 0.0);
    }
    let scale = (box_w / img_w as f32).min(box_h / img_h as f32);
    (img_w as f32 * scale, img_h as f32 * scale)
}

/// The box an overlay occupies inside a square container with edge length
/// `edge` pixels: centered at `pos` percent, `size` percent on both axes.
pub fn overlay_box(pos: PercentPos, size: f32, edge: f32) -> PixelBox {
    PixelBox {
        cx: pos.x / 100.0 * edge,
        cy: pos.y / 100.0 * edge,
        w: size / 100.0 * edge,
        h: size / 100.0 * edge,
    }
}

/// Pixel position of a caption's anchor point inside the container.
pub fn caption_anchor(pos: PercentPos, edge: f32) -> (f32, f32) {
    (pos.x / 100.0 * edge, pos.y / 100.0 * edge)
}

/// Flatten a scene snapshot onto a square canvas of `edge` pixels: backdrop,
/// letterboxed base, then overlays and captions interleaved in ascending z.
///
/// `font` is the caption typeface; it is only consulted when the snapshot
/// actually contains captions.
pub fn flatten(
    snapshot: &SceneSnapshot,
    edge: u32,
    font: Option<&FontArc>,
) -> Result<RgbaImage, String> {
    if edge == 0 {
        return Err("Canvas size is zero".to_string());
    }
    let edge_f = edge as f32;
    let mut canvas = RgbaImage::from_pixel(edge, edge, Rgba(CANVAS_BACKDROP));

    // Base image, scaled to fit and centered.
    let (bw, bh) = snapshot.base.dimensions();
    let (fit_w, fit_h) = contain_size(bw, bh, edge_f, edge_f);
    if fit_w >= 1.0 && fit_h >= 1.0 {
        let scaled = resize_to(&snapshot.base, fit_w, fit_h);
        stamp_centered(&mut canvas, &scaled, edge_f / 2.0, edge_f / 2.0);
    }

    // Overlays and captions share one depth axis.
    enum Layer<'a> {
        Overlay(&'a OverlaySnapshot),
        Text(&'a TextElement),
    }
    let mut layers: Vec<(u64, Layer)> = snapshot
        .overlays
        .iter()
        .map(|o| (o.z, Layer::Overlay(o)))
        .chain(snapshot.texts.iter().map(|t| (t.z, Layer::Text(t))))
        .collect();
    layers.sort_by_key(|(z, _)| *z);

    for (_, layer) in layers {
        match layer {
            Layer::Overlay(overlay) => {
                let bbox = overlay_box(overlay.pos, overlay.size, edge_f);
                let (ow, oh) = overlay.pixels.dimensions();
                let (fit_w, fit_h) = contain_size(ow, oh, bbox.w, bbox.h);
                if fit_w < 1.0 || fit_h < 1.0 {
                    continue;
                }
                let scaled = resize_to(&overlay.pixels, fit_w, fit_h);
                stamp_centered(&mut canvas, &scaled, bbox.cx, bbox.cy);
            }
            Layer::Text(text) => {
                if text.content.trim().is_empty() {
                    continue;
                }
                let Some(font) = font else {
                    return Err("No usable caption font was found".to_string());
                };
                let Some(block) = caption::render_caption(text, edge_f, font) else {
                    continue;
                };
                let (ax, ay) = caption_anchor(text.pos, edge_f);
                stamp_centered(&mut canvas, &block, ax, ay);
            }
        }
    }

    Ok(canvas)
}

fn resize_to(image: &RgbaImage, w: f32, h: f32) -> RgbaImage {
    let rw = (w.round() as u32).max(1);
    let rh = (h.round() as u32).max(1);
    if (rw, rh) == image.dimensions() {
        return image.clone();
    }
    image::imageops::resize(image, rw, rh, image::imageops::FilterType::Triangle)
}

/// Alpha-composite `src` onto `canvas` so its center lands on `(cx, cy)`.
/// Rows are blended in parallel; pixels outside the canvas are clipped.
fn stamp_centered(canvas: &mut RgbaImage, src: &RgbaImage, cx: f32, cy: f32) {
    let left = (cx - src.width() as f32 / 2.0).round() as i64;
    let top = (cy - src.height() as f32 / 2.0).round() as i64;
    stamp(canvas, src, left, top);
}

fn stamp(canvas: &mut RgbaImage, src: &RgbaImage, left: i64, top: i64) {
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    let (sw, sh) = (src.width() as i64, src.height() as i64);

    let x0 = left.max(0);
    let y0 = top.max(0);
    let x1 = (left + sw).min(cw);
    let y1 = (top + sh).min(ch);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let stride = cw as usize * 4;
    let src_stride = sw as usize * 4;
    let src_buf: &[u8] = src;
    let canvas_buf: &mut [u8] = canvas;

    canvas_buf
        .par_chunks_exact_mut(stride)
        .skip(y0 as usize)
        .take((y1 - y0) as usize)
        .enumerate()
        .for_each(|(i, row)| {
            let sy = (y0 + i as i64 - top) as usize;
            let src_row = &src_buf[sy * src_stride..(sy + 1) * src_stride];
            for x in x0..x1 {
                let sx = (x - left) as usize;
                let di = x as usize * 4;
                let s = &src_row[sx * 4..sx * 4 + 4];
                let d = &mut row[di..di + 4];
                let blended = src_over(
                    Rgba([d[0], d[1], d[2], d[3]]),
                    Rgba([s[0], s[1], s[2], s[3]]),
                );
                d.copy_from_slice(&blended.0);
            }
        });
}

/// Straight-alpha source-over compositing.
pub(crate) fn src_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    if src[3] == 0 {
        return dst;
    }
    if src[3] == 255 || dst[3] == 0 {
        return src;
    }
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }
    let inv = 1.0 / out_a;
    Rgba([
        ((src[0] as f32 * sa + dst[0] as f32 * da * (1.0 - sa)) * inv)
            .round()
            .clamp(0.0, 255.0) as u8,
        ((src[1] as f32 * sa + dst[1] as f32 * da * (1.0 - sa)) * inv)
            .round()
            .clamp(0.0, 255.0) as u8,
        ((src[2] as f32 * sa + dst[2] as f32 * da * (1.0 - sa)) * inv)
            .round()
            .clamp(0.0, 255.0) as u8,
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}
