//! Raster layer for freehand strokes.
//!
//! Strokes are replayed from scratch every frame, in creation order, so the
//! layer is a pure function of the document's stroke list and the viewport.
//! Erase strokes punch holes in whatever was painted before them.

use crate::renderer::{RenderResult, RendererError};
use deskboard_core::{Rgba, Stroke, StrokeMode};
use kurbo::{Affine, BezPath, PathEl};
use tiny_skia::{BlendMode, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Transform};

/// Pixel layer holding the composited result of all strokes.
pub struct StrokeLayer {
    pixmap: Pixmap,
}

impl StrokeLayer {
    /// Create a transparent layer of the given size.
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        Ok(Self {
            pixmap: new_pixmap(width, height)?,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Match the layer to the surface size. Contents are discarded on change.
    pub fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        if self.width() != width || self.height() != height {
            self.pixmap = new_pixmap(width, height)?;
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    /// Clear the layer and paint `strokes` in order.
    pub fn replay<'s>(&mut self, strokes: impl IntoIterator<Item = &'s Stroke>, transform: Affine) {
        self.clear();
        let mut painted = 0usize;
        for stroke in strokes {
            if self.draw_stroke(stroke, transform) {
                painted += 1;
            }
        }
        log::trace!("stroke layer replayed {painted} strokes");
    }

    /// Paint a single stroke on top of the layer. Returns false if the stroke
    /// has nothing to paint.
    pub fn draw_stroke(&mut self, stroke: &Stroke, transform: Affine) -> bool {
        if stroke.is_degenerate() {
            return false;
        }
        let Some(path) = to_skia_path(&stroke.to_path()) else {
            return false;
        };

        let mut paint = Paint::default();
        paint.anti_alias = true;
        match stroke.mode {
            StrokeMode::Draw => paint.set_color(to_skia_color(stroke.color)),
            StrokeMode::Erase => {
                paint.set_color_rgba8(0, 0, 0, 255);
                paint.blend_mode = BlendMode::DestinationOut;
            }
        }

        // Width is in document units; the transform scales it with zoom
        let style = tiny_skia::Stroke {
            width: stroke.stroke_width as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Default::default()
        };
        self.pixmap
            .stroke_path(&path, &paint, &style, to_skia_transform(transform), None);
        true
    }
}

pub(crate) fn new_pixmap(width: u32, height: u32) -> RenderResult<Pixmap> {
    Pixmap::new(width, height)
        .ok_or_else(|| RendererError::InitFailed(format!("invalid surface size {width}x{height}")))
}

/// Convert a kurbo path. Returns `None` for paths with no drawable segment.
pub(crate) fn to_skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => builder.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32),
            PathEl::CurveTo(p1, p2, p3) => builder.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => builder.close(),
        }
    }
    builder.finish()
}

pub(crate) fn to_skia_transform(affine: Affine) -> Transform {
    let [sx, ky, kx, sy, tx, ty] = affine.as_coeffs();
    Transform::from_row(sx as f32, ky as f32, kx as f32, sy as f32, tx as f32, ty as f32)
}

pub(crate) fn to_skia_color(color: Rgba) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    fn line(mode: StrokeMode, width: f64, y: f64) -> Stroke {
        Stroke::from_points(
            mode,
            Rgba::new(220, 38, 38, 255),
            width,
            vec![Point::new(10.0, y), Point::new(90.0, y)],
        )
    }

    fn alpha(layer: &StrokeLayer, x: u32, y: u32) -> u8 {
        layer.pixmap().pixel(x, y).map_or(0, |p| p.alpha())
    }

    #[test]
    fn test_draw_stroke_paints_pixels() {
        let mut layer = StrokeLayer::new(100, 100).unwrap();
        assert!(layer.draw_stroke(&line(StrokeMode::Draw, 10.0, 50.0), Affine::IDENTITY));
        assert_eq!(alpha(&layer, 50, 50), 255);
        assert_eq!(alpha(&layer, 50, 10), 0);

        let pixel = layer.pixmap().pixel(50, 50).unwrap().demultiply();
        assert_eq!((pixel.red(), pixel.green(), pixel.blue()), (220, 38, 38));
    }

    #[test]
    fn test_erase_clears_pixels() {
        let mut layer = StrokeLayer::new(100, 100).unwrap();
        let strokes = [
            line(StrokeMode::Draw, 10.0, 50.0),
            line(StrokeMode::Erase, 20.0, 50.0),
        ];
        layer.replay(&strokes, Affine::IDENTITY);
        assert_eq!(alpha(&layer, 50, 50), 0);
        assert!(layer.pixmap().data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_draw_after_erase_is_visible() {
        let mut layer = StrokeLayer::new(100, 100).unwrap();
        let strokes = [
            line(StrokeMode::Draw, 10.0, 50.0),
            line(StrokeMode::Erase, 20.0, 50.0),
            line(StrokeMode::Draw, 10.0, 50.0),
        ];
        layer.replay(&strokes, Affine::IDENTITY);
        assert_eq!(alpha(&layer, 50, 50), 255);
    }

    #[test]
    fn test_degenerate_strokes_render_nothing() {
        let mut layer = StrokeLayer::new(50, 50).unwrap();
        let dot = Stroke::new(StrokeMode::Draw, Rgba::black(), 8.0, Point::new(25.0, 25.0));
        let empty = Stroke::from_points(StrokeMode::Draw, Rgba::black(), 8.0, Vec::new());
        assert!(!layer.draw_stroke(&dot, Affine::IDENTITY));
        assert!(!layer.draw_stroke(&empty, Affine::IDENTITY));
        assert!(layer.pixmap().data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_width_scales_with_zoom() {
        let mut layer = StrokeLayer::new(200, 100).unwrap();
        layer.draw_stroke(&line(StrokeMode::Draw, 4.0, 50.0), Affine::IDENTITY);
        assert_eq!(alpha(&layer, 50, 52), 0);

        // Same stroke at 2x: y=25 maps to 50 and the 4 unit width to 8 pixels
        layer.replay([&line(StrokeMode::Draw, 4.0, 25.0)], Affine::scale(2.0));
        assert_eq!(alpha(&layer, 50, 52), 255);
    }

    #[test]
    fn test_replay_clears_previous_frame() {
        let mut layer = StrokeLayer::new(100, 100).unwrap();
        layer.draw_stroke(&line(StrokeMode::Draw, 10.0, 50.0), Affine::IDENTITY);
        layer.replay(std::iter::empty(), Affine::IDENTITY);
        assert_eq!(alpha(&layer, 50, 50), 0);
    }

    #[test]
    fn test_invalid_size() {
        assert!(matches!(StrokeLayer::new(0, 10), Err(RendererError::InitFailed(_))));
        let mut layer = StrokeLayer::new(10, 10).unwrap();
        layer.resize(20, 30).unwrap();
        assert_eq!((layer.width(), layer.height()), (20, 30));
    }

    #[test]
    fn test_transform_coefficients() {
        let affine = Affine::translate((5.0, 7.0)) * Affine::scale(2.0);
        let transform = to_skia_transform(affine);
        assert_eq!((transform.sx, transform.sy), (2.0, 2.0));
        assert_eq!((transform.tx, transform.ty), (5.0, 7.0));
    }
}
