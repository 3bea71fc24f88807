//! Deskboard Render Library
//!
//! Software rendering for Deskboard documents. Freehand strokes are
//! rasterized into a [`StrokeLayer`]; elements are described as an overlay of
//! vector nodes that [`SkiaRenderer`] paints on top.

mod grid;
mod overlay;
mod raster;
mod renderer;
mod skia_impl;
mod text;

pub use grid::{GridLines, MIN_GRID_SPACING, grid_lines};
pub use overlay::{NodeRole, OverlayNode, SELECTION_PADDING, SELECTION_STROKE_WIDTH, TextRun, build_overlay};
pub use raster::StrokeLayer;
pub use renderer::{DEFAULT_GRID_CELL_SIZE, GridStyle, RenderContext, RenderResult, Renderer, RendererError};
pub use skia_impl::{PngRenderResult, SkiaRenderer, export_to_raster};
pub use text::{CARET_WIDTH, TEXT_PADDING, TextLayout, TextOutliner};
