//! Text runs as glyph outlines.
//!
//! Runs are laid out in element-local coordinates: lines wrap at word
//! boundaries inside the element box and explicit newlines always break.
//! The result is a single path, so text follows the element transform
//! (zoom and rotation) like every other overlay node.

use crate::overlay::TextRun;
use crate::renderer::{RenderResult, RendererError};
use ab_glyph::{Font, FontRef, GlyphId, OutlineCurve, PxScale, ScaleFont};
use kurbo::{BezPath, Point, Rect};
use std::ops::Range;

/// Embedded DejaVu Sans (Bitstream Vera license, see `assets/`).
static DEJAVU_SANS: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Inset between the element box and its text.
pub const TEXT_PADDING: f64 = 8.0;
/// Caret width in element units.
pub const CARET_WIDTH: f64 = 1.5;

/// A laid out text run.
#[derive(Debug, Clone)]
pub struct TextLayout {
    /// All glyph outlines, filled with the non-zero rule.
    pub glyphs: BezPath,
    /// Caret rectangle when the run is being edited.
    pub caret: Option<Rect>,
    /// Number of laid out lines.
    pub line_count: usize,
}

/// Lays out [`TextRun`]s with the embedded font.
#[derive(Clone)]
pub struct TextOutliner {
    font: FontRef<'static>,
}

impl TextOutliner {
    pub fn new() -> RenderResult<Self> {
        let font = FontRef::try_from_slice(DEJAVU_SANS)
            .map_err(|e| RendererError::InitFailed(format!("failed to load embedded font: {e}")))?;
        Ok(Self { font })
    }

    pub fn layout(&self, run: &TextRun) -> TextLayout {
        let font_size = run.font_size as f32;
        if !font_size.is_finite() || font_size <= 0.0 {
            return TextLayout {
                glyphs: BezPath::new(),
                caret: None,
                line_count: 0,
            };
        }
        let scaled = self.font.as_scaled(PxScale::from(font_size));
        let line_height = f64::from(scaled.height() + scaled.line_gap());
        let ascent = f64::from(scaled.ascent());
        let descent = f64::from(scaled.descent());
        let max_width = (run.bounds.width - 2.0 * TEXT_PADDING).max(0.0);

        let lines = self.wrap(&run.content, font_size, max_width);
        let mut glyphs = BezPath::new();
        for (i, line) in lines.iter().enumerate() {
            let baseline = TEXT_PADDING + ascent + i as f64 * line_height;
            self.outline_line(&mut glyphs, &run.content[line.clone()], font_size, baseline);
        }

        let caret = run.cursor.map(|cursor| {
            let index = caret_line(&lines, cursor);
            let start = lines[index].start;
            let prefix = run.content.get(start..cursor.max(start)).unwrap_or("");
            let x = TEXT_PADDING + self.measure(prefix, font_size);
            let baseline = TEXT_PADDING + ascent + index as f64 * line_height;
            Rect::new(x, baseline - ascent, x + CARET_WIDTH, baseline - descent)
        });

        TextLayout {
            glyphs,
            caret,
            line_count: lines.len(),
        }
    }

    /// Advance width of `text` including kerning.
    fn measure(&self, text: &str, font_size: f32) -> f64 {
        let scaled = self.font.as_scaled(PxScale::from(font_size));
        let mut width = 0.0;
        let mut previous: Option<GlyphId> = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        f64::from(width)
    }

    /// Byte ranges of the lines of `text`. Always returns at least one line.
    fn wrap(&self, text: &str, font_size: f32, max_width: f64) -> Vec<Range<usize>> {
        let mut lines = Vec::new();
        let mut offset = 0;
        for paragraph in text.split('\n') {
            let mut start = 0;
            let mut last_break = None;
            for (i, ch) in paragraph.char_indices() {
                let end = i + ch.len_utf8();
                if self.measure(&paragraph[start..end], font_size) > max_width {
                    if let Some(brk) = last_break.filter(|&b| b > start) {
                        lines.push(offset + start..offset + brk);
                        start = brk;
                    }
                }
                if ch == ' ' {
                    last_break = Some(end);
                }
            }
            lines.push(offset + start..offset + paragraph.len());
            offset += paragraph.len() + 1;
        }
        lines
    }

    fn outline_line(&self, path: &mut BezPath, text: &str, font_size: f32, baseline: f64) {
        let scaled = self.font.as_scaled(PxScale::from(font_size));
        let sx = f64::from(scaled.h_scale_factor());
        let sy = f64::from(scaled.v_scale_factor());
        let mut pen_x = TEXT_PADDING;
        let mut previous: Option<GlyphId> = None;

        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                pen_x += f64::from(scaled.kern(prev, id));
            }
            if let Some(outline) = self.font.outline(id) {
                // Font units are y-up
                let map = |p: ab_glyph::Point| Point::new(pen_x + f64::from(p.x) * sx, baseline - f64::from(p.y) * sy);
                let mut current: Option<Point> = None;
                for curve in &outline.curves {
                    let (from, to) = match curve {
                        OutlineCurve::Line(a, b) | OutlineCurve::Quad(a, _, b) | OutlineCurve::Cubic(a, _, _, b) => {
                            (map(*a), map(*b))
                        }
                    };
                    if current != Some(from) {
                        path.move_to(from);
                    }
                    match curve {
                        OutlineCurve::Line(..) => path.line_to(to),
                        OutlineCurve::Quad(_, c, _) => path.quad_to(map(*c), to),
                        OutlineCurve::Cubic(_, c1, c2, _) => path.curve_to(map(*c1), map(*c2), to),
                    }
                    current = Some(to);
                }
            }
            pen_x += f64::from(scaled.h_advance(id));
            previous = Some(id);
        }
    }
}

/// Line holding the caret at byte offset `cursor`. A caret on a soft break
/// belongs to the following line.
fn caret_line(lines: &[Range<usize>], cursor: usize) -> usize {
    lines
        .iter()
        .position(|line| cursor >= line.start && cursor < line.end)
        .or_else(|| lines.iter().rposition(|line| cursor >= line.start))
        .unwrap_or(0)
}
