// ============================================================================
// CAPTION — meme-style text rasterization
// ============================================================================
//
// Classic meme lettering: uppercase, bold display font, white fill with a
// hard black outline. The outline is four copies of the text offset to the
// diagonals by the stroke width, painted under the fill. Text wraps at 80%
// of the container width and lines are centered within the block.
// ============================================================================

use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont, point};
use image::{Rgba, RgbaImage};

use crate::ops::compose::src_over;
use crate::scene::TextElement;

/// Captions wrap once a line would exceed this fraction of the container.
pub const WRAP_FRACTION: f32 = 0.8;
/// Vertical advance between lines, as a multiple of the font size.
pub const LINE_HEIGHT: f32 = 1.2;

/// Wrapped lines of one caption plus the pixel footprint of the text block.
/// Both the canvas preview and the export raster start from this, so they
/// always agree on where lines break and how large the block is.
pub struct CaptionLayout {
    /// Uppercased, wrapped display lines.
    pub lines: Vec<String>,
    /// Width of the widest line.
    pub width: f32,
    /// Total height (`lines * line_height`).
    pub height: f32,
    /// Vertical advance between line centers.
    pub line_height: f32,
}

/// Uppercase and wrap a caption against the container. `None` when the
/// content is blank or shapes to nothing.
pub fn layout_caption(
    font: &FontArc,
    font_size: f32,
    content: &str,
    container_edge: f32,
) -> Option<CaptionLayout> {
    if content.trim().is_empty() {
        return None;
    }
    let display = content.to_uppercase();
    let px = PxScale::from(font_size);
    let lines = wrap_lines(font, px, &display, container_edge * WRAP_FRACTION);
    if lines.is_empty() {
        return None;
    }
    let scaled = font.as_scaled(px);
    let width = lines
        .iter()
        .map(|l| line_width(&scaled, l))
        .fold(0.0f32, f32::max);
    if width < 0.5 {
        return None;
    }
    let line_height = font_size * LINE_HEIGHT;
    Some(CaptionLayout {
        height: lines.len() as f32 * line_height,
        lines,
        width,
        line_height,
    })
}

/// Rasterize one caption into a tight RGBA block, outline included. The
/// caller stamps the block centered on the caption's anchor. Returns `None`
/// when there is nothing visible to draw.
pub fn render_caption(text: &TextElement, container_edge: f32, font: &FontArc) -> Option<RgbaImage> {
    let layout = layout_caption(font, text.font_size, &text.content, container_edge)?;
    let px = PxScale::from(text.font_size);
    let line_h = layout.line_height;
    let lines = &layout.lines;

    let stroke = text.stroke_width.max(0.0);
    // Room for the outline offsets plus a little antialiasing slack.
    let margin = stroke.ceil() + 2.0;
    let block_w = (layout.width + margin * 2.0).ceil().max(1.0) as u32;
    let block_h = (layout.height + margin * 2.0).ceil().max(1.0) as u32;

    let mut out = RgbaImage::new(block_w, block_h);
    let mut coverage = vec![0.0f32; block_w as usize * block_h as usize];

    // Outline first, fill last, so the fill always sits on top.
    let mut passes: Vec<([f32; 2], [u8; 3])> = Vec::new();
    if stroke > 0.0 {
        for (dx, dy) in [
            (-stroke, -stroke),
            (stroke, -stroke),
            (-stroke, stroke),
            (stroke, stroke),
        ] {
            passes.push(([dx, dy], [0, 0, 0]));
        }
    }
    passes.push(([0.0, 0.0], text.color));

    for (offset, color) in passes {
        coverage.fill(0.0);
        rasterize_lines(
            font, px, lines, &mut coverage, block_w, block_h, margin, line_h, offset,
        );
        blend_coverage(&mut out, &coverage, color);
    }

    Some(out)
}

/// Greedy word wrap against a pixel budget. Words never break internally, so
/// a single word wider than the budget overflows on its own line. All runs
/// of whitespace collapse to single spaces.
pub fn wrap_lines(font: &FontArc, px: PxScale, text: &str, max_width: f32) -> Vec<String> {
    let scaled = font.as_scaled(px);
    let space = scaled.h_advance(scaled.glyph_id(' '));

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_w = 0.0f32;
    for word in text.split_whitespace() {
        let word_w = line_width(&scaled, word);
        if current.is_empty() {
            current.push_str(word);
            current_w = word_w;
        } else if current_w + space + word_w <= max_width {
            current.push(' ');
            current.push_str(word);
            current_w += space + word_w;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_w = word_w;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Kerned advance width of a single line.
fn line_width(scaled: &ab_glyph::PxScaleFont<&FontArc>, line: &str) -> f32 {
    let mut w = 0.0f32;
    let mut prev: Option<GlyphId> = None;
    for ch in line.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(p) = prev {
            w += scaled.kern(p, id);
        }
        w += scaled.h_advance(id);
        prev = Some(id);
    }
    w
}

/// Draw every line into the coverage buffer (max-accumulate), shifted by
/// `offset`. Lines are centered horizontally; each line box is `line_h` tall
/// with the glyph extent centered inside it.
fn rasterize_lines(
    font: &FontArc,
    px: PxScale,
    lines: &[String],
    coverage: &mut [f32],
    w: u32,
    h: u32,
    margin: f32,
    line_h: f32,
    offset: [f32; 2],
) {
    let scaled = font.as_scaled(px);
    let ascent = scaled.ascent();
    let glyph_extent = ascent - scaled.descent();
    let half_leading = (line_h - glyph_extent) / 2.0;

    for (li, line) in lines.iter().enumerate() {
        let lw = line_width(&scaled, line);
        let mut x = (w as f32 - lw) / 2.0 + offset[0];
        let baseline = margin + li as f32 * line_h + half_leading + ascent + offset[1];

        let mut prev: Option<GlyphId> = None;
        for ch in line.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(p) = prev {
                x += scaled.kern(p, id);
            }
            let glyph = id.with_scale_and_position(px, point(x, baseline));
            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, cov| {
                    let ix = bounds.min.x as i32 + gx as i32;
                    let iy = bounds.min.y as i32 + gy as i32;
                    if ix >= 0 && iy >= 0 && (ix as u32) < w && (iy as u32) < h {
                        let idx = iy as usize * w as usize + ix as usize;
                        coverage[idx] = coverage[idx].max(cov);
                    }
                });
            }
            x += scaled.h_advance(id);
            prev = Some(id);
        }
    }
}

/// Composite one colored pass of coverage onto the block.
fn blend_coverage(out: &mut RgbaImage, coverage: &[f32], color: [u8; 3]) {
    let w = out.width() as usize;
    for (i, &cov) in coverage.iter().enumerate() {
        if cov > 0.001 {
            let a = (cov * 255.0).round().min(255.0) as u8;
            let x = (i % w) as u32;
            let y = (i / w) as u32;
            let dst = *out.get_pixel(x, y);
            out.put_pixel(x, y, src_over(dst, Rgba([color[0], color[1], color[2], a])));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::PercentPos;
    use uuid::Uuid;

    /// Pull a parseable Latin-capable font out of egui's embedded set.
    fn test_font() -> FontArc {
        let defs = egui::FontDefinitions::default();
        defs.font_data
            .values()
            .find_map(|data| {
                FontArc::try_from_vec(data.font.clone().into_owned())
                    .ok()
                    .filter(|f| f.glyph_id('A').0 != 0)
            })
            .expect("egui ships at least one usable embedded font")
    }

    fn caption(content: &str, font_size: f32, stroke: f32, color: [u8; 3]) -> TextElement {
        TextElement {
            id: Uuid::new_v4(),
            content: content.to_string(),
            pos: PercentPos::new(25.0, 25.0),
            color,
            font_size,
            stroke_width: stroke,
            z: 1,
        }
    }

    #[test]
    fn wrap_keeps_short_text_on_one_line() {
        let font = test_font();
        let lines = wrap_lines(&font, PxScale::from(24.0), "HELLO WORLD", 10_000.0);
        assert_eq!(lines, vec!["HELLO WORLD".to_string()]);
    }

    #[test]
    fn wrap_breaks_on_word_boundaries() {
        let font = test_font();
        let px = PxScale::from(24.0);
        let scaled = font.as_scaled(px);
        let one_word = line_width(&scaled, "HELLO");
        // Budget fits one word but not two.
        let lines = wrap_lines(&font, px, "HELLO HELLO HELLO", one_word * 1.5);
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l == "HELLO"));
    }

    #[test]
    fn wrap_never_splits_a_word() {
        let font = test_font();
        let lines = wrap_lines(&font, PxScale::from(24.0), "UNBREAKABLE", 1.0);
        assert_eq!(lines, vec!["UNBREAKABLE".to_string()]);
    }

    #[test]
    fn wrap_collapses_whitespace_runs() {
        let font = test_font();
        let lines = wrap_lines(&font, PxScale::from(24.0), "  A \n\t B  ", 10_000.0);
        assert_eq!(lines, vec!["A B".to_string()]);
    }

    #[test]
    fn line_width_grows_with_content() {
        let font = test_font();
        let scaled = font.as_scaled(PxScale::from(24.0));
        let one = line_width(&scaled, "M");
        let two = line_width(&scaled, "MM");
        assert!(one > 0.0);
        assert!(two > one);
    }

    #[test]
    fn render_produces_visible_pixels() {
        let font = test_font();
        let block = render_caption(&caption("HELLO", 36.0, 2.0, [255, 255, 255]), 400.0, &font)
            .expect("caption renders");
        assert!(block.pixels().any(|p| p[3] > 0));
    }

    #[test]
    fn render_is_uppercase_insensitive() {
        let font = test_font();
        let lower = render_caption(&caption("hello", 36.0, 2.0, [255, 255, 255]), 400.0, &font)
            .expect("renders");
        let upper = render_caption(&caption("HELLO", 36.0, 2.0, [255, 255, 255]), 400.0, &font)
            .expect("renders");
        assert_eq!(lower.as_raw(), upper.as_raw());
    }

    #[test]
    fn blank_captions_render_nothing() {
        let font = test_font();
        assert!(render_caption(&caption("   ", 36.0, 2.0, [255, 255, 255]), 400.0, &font).is_none());
    }

    #[test]
    fn zero_stroke_leaves_only_fill_pixels() {
        let font = test_font();
        let block = render_caption(&caption("HI", 36.0, 0.0, [255, 255, 255]), 400.0, &font)
            .expect("renders");
        for p in block.pixels() {
            if p[3] > 0 {
                assert_eq!([p[0], p[1], p[2]], [255, 255, 255]);
            }
        }
    }

    #[test]
    fn stroke_adds_black_outline_pixels() {
        let font = test_font();
        let block = render_caption(&caption("H", 48.0, 3.0, [255, 255, 255]), 400.0, &font)
            .expect("renders");
        let has_black = block
            .pixels()
            .any(|p| p[3] > 200 && p[0] < 20 && p[1] < 20 && p[2] < 20);
        assert!(has_black, "outline should leave pure black pixels");
    }

    #[test]
    fn fill_color_reaches_the_output() {
        let font = test_font();
        let block = render_caption(&caption("H", 48.0, 0.0, [255, 0, 0]), 400.0, &font)
            .expect("renders");
        let has_red = block.pixels().any(|p| p[3] > 200 && p[0] > 200 && p[1] < 30);
        assert!(has_red);
    }

    #[test]
    fn layout_footprint_matches_the_rendered_block() {
        let font = test_font();
        let text = caption("TWO WORDS HERE", 30.0, 2.0, [255, 255, 255]);
        let layout = layout_caption(&font, text.font_size, &text.content, 400.0).unwrap();
        let block = render_caption(&text, 400.0, &font).unwrap();
        // Raster block = layout footprint + outline margin on every side.
        let margin = text.stroke_width.ceil() + 2.0;
        assert_eq!(block.width(), (layout.width + margin * 2.0).ceil() as u32);
        assert_eq!(block.height(), (layout.height + margin * 2.0).ceil() as u32);
    }

    #[test]
    fn layout_uppercases_and_counts_lines() {
        let font = test_font();
        let wide = layout_caption(&font, 24.0, "hello world", 10_000.0).unwrap();
        assert_eq!(wide.lines, vec!["HELLO WORLD".to_string()]);
        assert_eq!(wide.height, wide.line_height);

        assert!(layout_caption(&font, 24.0, "  \t ", 400.0).is_none());
    }

    #[test]
    fn wrapping_makes_the_block_taller_not_wider() {
        let font = test_font();
        let narrow = render_caption(
            &caption("WORD WORD WORD WORD", 24.0, 0.0, [255, 255, 255]),
            160.0,
            &font,
        )
        .expect("renders");
        let wide = render_caption(
            &caption("WORD WORD WORD WORD", 24.0, 0.0, [255, 255, 255]),
            4000.0,
            &font,
        )
        .expect("renders");
        assert!(narrow.height() > wide.height());
        assert!(narrow.width() < wide.width());
    }
}
