//! CPU renderer built on tiny-skia.

use crate::grid::{GRID_DOT_COLOR, GRID_LINE_COLOR, GRID_LINE_WIDTH, grid_lines};
use crate::overlay::{NodeRole, OverlayNode, build_overlay};
use crate::raster::{StrokeLayer, new_pixmap, to_skia_path, to_skia_transform};
use crate::renderer::{GridStyle, RenderContext, RenderResult, Renderer, RendererError};
use crate::text::TextOutliner;
use deskboard_core::{Document, ElementId, ElementKind, EmbeddedImage, Viewport};
use kurbo::{Affine, Point, Rect, Shape, Size};
use peniko::Color;
use std::collections::HashMap;
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, LineCap, LineJoin, Paint, Pixmap, PixmapPaint, Transform,
};

/// Result of rendering to PNG.
pub struct PngRenderResult {
    /// RGBA pixel data (4 bytes per pixel, straight alpha).
    pub rgba_data: Vec<u8>,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

impl PngRenderResult {
    fn from_pixmap(pixmap: &Pixmap) -> Self {
        let rgba_data = pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();
        Self {
            rgba_data,
            width: pixmap.width(),
            height: pixmap.height(),
        }
    }

    /// Encode the pixels as a PNG file.
    pub fn encode(&self) -> RenderResult<Vec<u8>> {
        let mut png_data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut png_data, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);

            let mut writer = encoder
                .write_header()
                .map_err(|e| RendererError::Encode(format!("failed to write PNG header: {e}")))?;
            writer
                .write_image_data(&self.rgba_data)
                .map_err(|e| RendererError::Encode(format!("failed to write PNG data: {e}")))?;
        }
        Ok(png_data)
    }
}

/// Software renderer producing a pixmap per frame.
///
/// Paint order is background, grid, stroke layer, then the element overlay.
pub struct SkiaRenderer {
    frame: Option<Pixmap>,
    strokes: Option<StrokeLayer>,
    /// Decoded images keyed by element id; `None` marks a failed decode.
    image_cache: HashMap<ElementId, Option<Pixmap>>,
    /// Missing only if the embedded font fails to parse.
    text: Option<TextOutliner>,
}

impl Default for SkiaRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SkiaRenderer {
    pub fn new() -> Self {
        let text = TextOutliner::new()
            .map_err(|e| log::warn!("text will not be drawn: {e}"))
            .ok();
        Self {
            frame: None,
            strokes: None,
            image_cache: HashMap::new(),
            text,
        }
    }

    /// The last rendered frame (premultiplied RGBA).
    pub fn pixmap(&self) -> Option<&Pixmap> {
        self.frame.as_ref()
    }

    /// Render a frame and return its pixels.
    pub fn render_to_png(&mut self, ctx: &RenderContext) -> RenderResult<PngRenderResult> {
        self.build_scene(ctx)?;
        let frame = self
            .frame
            .as_ref()
            .ok_or_else(|| RendererError::RenderFailed("no frame rendered".to_string()))?;
        Ok(PngRenderResult::from_pixmap(frame))
    }

    fn prepare_surfaces(&mut self, width: u32, height: u32) -> RenderResult<()> {
        let reuse = self
            .frame
            .as_ref()
            .is_some_and(|f| f.width() == width && f.height() == height);
        if !reuse {
            self.frame = Some(new_pixmap(width, height)?);
        }
        match &mut self.strokes {
            Some(layer) => layer.resize(width, height)?,
            None => self.strokes = Some(StrokeLayer::new(width, height)?),
        }
        Ok(())
    }

    fn cached_image(&mut self, id: ElementId, image: &EmbeddedImage) -> Option<&Pixmap> {
        self.image_cache
            .entry(id)
            .or_insert_with(|| match decode_image(image) {
                Ok(pixmap) => Some(pixmap),
                Err(e) => {
                    log::warn!("failed to decode image {id}: {e}");
                    None
                }
            })
            .as_ref()
    }

    fn prune_image_cache(&mut self, document: &Document) {
        self.image_cache.retain(|id, _| document.element(*id).is_some());
    }
}

impl Renderer for SkiaRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) -> RenderResult<()> {
        let (width, height) = ctx.pixel_size();
        self.prepare_surfaces(width, height)?;
        let background = self.background_color(ctx);
        let nodes = build_overlay(ctx);

        let mut frame = self
            .frame
            .take()
            .ok_or_else(|| RendererError::RenderFailed("frame surface missing".to_string()))?;
        frame.fill(skia_color(background));
        draw_grid(&mut frame, ctx);

        if let Some(layer) = &mut self.strokes {
            let strokes = ctx.document.strokes.iter().chain(ctx.active_stroke);
            layer.replay(strokes, ctx.viewport.surface_transform());
            frame.draw_pixmap(
                0,
                0,
                layer.pixmap().as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }

        for node in &nodes {
            if node.kind == ElementKind::Image && node.role == NodeRole::Element {
                self.draw_image(&mut frame, node, ctx.document);
            }
            draw_node(&mut frame, node);
            if let Some(outliner) = &self.text {
                draw_text(&mut frame, node, outliner);
            }
        }

        self.frame = Some(frame);
        self.prune_image_cache(ctx.document);
        Ok(())
    }
}

impl SkiaRenderer {
    fn draw_image(&mut self, frame: &mut Pixmap, node: &OverlayNode, document: &Document) {
        let Some(element) = document.element(node.element_id) else {
            return;
        };
        let size = element.size();
        let opacity = element.style.opacity as f32;
        let decoded = match &element.image {
            Some(image) => self.cached_image(element.id(), image),
            None => None,
        };

        match decoded {
            Some(pixmap) => {
                let scale = Affine::scale_non_uniform(
                    size.width / pixmap.width() as f64,
                    size.height / pixmap.height() as f64,
                );
                let paint = PixmapPaint {
                    opacity,
                    quality: FilterQuality::Bilinear,
                    ..PixmapPaint::default()
                };
                frame.draw_pixmap(
                    0,
                    0,
                    pixmap.as_ref(),
                    &paint,
                    to_skia_transform(node.transform * scale),
                    None,
                );
            }
            None => draw_placeholder(frame, node, size, opacity),
        }
    }
}

fn draw_placeholder(frame: &mut Pixmap, node: &OverlayNode, size: Size, opacity: f32) {
    let rect = Rect::from_origin_size(Point::ZERO, size);
    let Some(path) = to_skia_path(&rect.to_path(0.1)) else {
        return;
    };
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    let paint = solid_paint(Color::from_rgba8(200, 200, 200, alpha));
    frame.fill_path(&path, &paint, FillRule::Winding, to_skia_transform(node.transform), None);
}

fn draw_node(frame: &mut Pixmap, node: &OverlayNode) {
    // Empty or single-point outlines have nothing to paint
    let Some(path) = to_skia_path(&node.path) else {
        return;
    };
    let transform = to_skia_transform(node.transform);

    if let Some(fill) = node.fill {
        frame.fill_path(&path, &solid_paint(fill), FillRule::Winding, transform, None);
    }
    if let Some(color) = node.stroke {
        let stroke = tiny_skia::Stroke {
            width: node.stroke_width as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Default::default()
        };
        frame.stroke_path(&path, &solid_paint(color), &stroke, transform, None);
    }
}

fn draw_text(frame: &mut Pixmap, node: &OverlayNode, outliner: &TextOutliner) {
    let Some(run) = &node.text else {
        return;
    };
    let layout = outliner.layout(run);
    let paint = solid_paint(run.color);
    let transform = to_skia_transform(node.transform);
    if let Some(path) = to_skia_path(&layout.glyphs) {
        frame.fill_path(&path, &paint, FillRule::Winding, transform, None);
    }
    if let Some(path) = layout.caret.and_then(|caret| to_skia_path(&caret.to_path(0.1))) {
        frame.fill_path(&path, &paint, FillRule::Winding, transform, None);
    }
}

fn draw_grid(frame: &mut Pixmap, ctx: &RenderContext) {
    if ctx.grid_style == GridStyle::None {
        return;
    }
    let Some(grid) = grid_lines(ctx.viewport, ctx.viewport_size, ctx.grid_cell_size) else {
        return;
    };

    match ctx.grid_style {
        GridStyle::Lines => {
            if let Some(path) = to_skia_path(&grid.lines_path()) {
                let stroke = tiny_skia::Stroke {
                    width: GRID_LINE_WIDTH as f32,
                    ..Default::default()
                };
                frame.stroke_path(&path, &solid_paint(GRID_LINE_COLOR), &stroke, Transform::identity(), None);
            }
        }
        GridStyle::Dots => {
            if let Some(path) = to_skia_path(&grid.dots_path()) {
                frame.fill_path(
                    &path,
                    &solid_paint(GRID_DOT_COLOR),
                    FillRule::Winding,
                    Transform::identity(),
                    None,
                );
            }
        }
        GridStyle::None => {}
    }
}

fn decode_image(image: &EmbeddedImage) -> RenderResult<Pixmap> {
    let bytes = image
        .bytes()
        .map_err(|e| RendererError::RenderFailed(format!("invalid image payload: {e}")))?;
    let decoded = ::image::load_from_memory(&bytes)
        .map_err(|e| RendererError::RenderFailed(format!("failed to decode {}: {e}", image.format.mime_type())))?
        .to_rgba8();

    let (width, height) = decoded.dimensions();
    let mut pixmap = new_pixmap(width, height)?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(decoded.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

fn skia_color(color: Color) -> tiny_skia::Color {
    let c = color.to_rgba8();
    tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn solid_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(skia_color(color));
    paint.anti_alias = true;
    paint
}

/// Render `document` as seen through `viewport` and encode it as PNG.
///
/// The export has a white background and shows neither the grid nor the
/// selection. Text runs are drawn with the embedded font.
pub fn export_to_raster(document: &Document, viewport: &Viewport, size: Size) -> RenderResult<Vec<u8>> {
    let ctx = RenderContext::new(document, viewport, size)
        .with_background(Color::from_rgba8(255, 255, 255, 255))
        .with_grid(GridStyle::None);
    let mut renderer = SkiaRenderer::new();
    let result = renderer.render_to_png(&ctx)?;
    log::info!("exported {}x{} PNG", result.width, result.height);
    result.encode()
}
