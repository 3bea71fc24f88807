//! Background grid geometry in surface pixels.
//!
//! The grid is cosmetic: it follows pan and zoom but is never part of the
//! document or of hit testing.

use deskboard_core::Viewport;
use kurbo::{BezPath, Point, Rect, Size, Vec2};
use peniko::Color;

/// Below this on-screen spacing the grid is not drawn.
pub const MIN_GRID_SPACING: f64 = 4.0;

pub const GRID_LINE_COLOR: Color = Color::from_rgba8(200, 200, 200, 100);
pub const GRID_LINE_WIDTH: f64 = 0.5;
pub const GRID_DOT_COLOR: Color = Color::from_rgba8(160, 160, 160, 70);
/// Half-size of a grid dot.
pub const GRID_DOT_SIZE: f64 = 1.5;

/// Grid line positions for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLines {
    /// Distance between lines in pixels (`cell_size * zoom`).
    pub spacing: f64,
    /// Position of the first line on each axis (`pan mod spacing`).
    pub offset: Vec2,
    /// X positions of vertical lines.
    pub xs: Vec<f64>,
    /// Y positions of horizontal lines.
    pub ys: Vec<f64>,
    size: Size,
}

/// Compute the grid for a surface of `size` pixels.
///
/// Returns `None` when the grid would be too dense to be useful.
pub fn grid_lines(viewport: &Viewport, size: Size, cell_size: f64) -> Option<GridLines> {
    let spacing = cell_size * viewport.zoom;
    if !spacing.is_finite() || spacing < MIN_GRID_SPACING {
        return None;
    }
    let offset = Vec2::new(
        viewport.pan.x.rem_euclid(spacing),
        viewport.pan.y.rem_euclid(spacing),
    );
    Some(GridLines {
        spacing,
        offset,
        xs: positions(offset.x, spacing, size.width),
        ys: positions(offset.y, spacing, size.height),
        size,
    })
}

fn positions(start: f64, spacing: f64, extent: f64) -> Vec<f64> {
    let mut out = Vec::new();
    let mut p = start;
    while p <= extent {
        out.push(p);
        p += spacing;
    }
    out
}

impl GridLines {
    /// All lines batched into one path.
    pub fn lines_path(&self) -> BezPath {
        let mut path = BezPath::new();
        for &x in &self.xs {
            path.move_to(Point::new(x, 0.0));
            path.line_to(Point::new(x, self.size.height));
        }
        for &y in &self.ys {
            path.move_to(Point::new(0.0, y));
            path.line_to(Point::new(self.size.width, y));
        }
        path
    }

    /// A small square at every intersection, batched into one path.
    pub fn dots_path(&self) -> BezPath {
        let mut path = BezPath::new();
        for &x in &self.xs {
            for &y in &self.ys {
                let rect = Rect::new(x - GRID_DOT_SIZE, y - GRID_DOT_SIZE, x + GRID_DOT_SIZE, y + GRID_DOT_SIZE);
                path.move_to(Point::new(rect.x0, rect.y0));
                path.line_to(Point::new(rect.x1, rect.y0));
                path.line_to(Point::new(rect.x1, rect.y1));
                path.line_to(Point::new(rect.x0, rect.y1));
                path.close_path();
            }
        }
        path
    }
}
