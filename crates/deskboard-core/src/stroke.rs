//! Freehand pen and eraser strokes.

use crate::style::Rgba;
use kurbo::{BezPath, Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for strokes.
pub type StrokeId = Uuid;

/// How a stroke composites onto the raster layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeMode {
    /// Paint color.
    #[default]
    Draw,
    /// Remove previously painted color (destination-out).
    Erase,
}

/// A freehand path (series of points in document coordinates).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub(crate) id: StrokeId,
    pub points: Vec<Point>,
    pub color: Rgba,
    pub stroke_width: f64,
    #[serde(default)]
    pub mode: StrokeMode,
}

impl Stroke {
    /// Start a stroke at `start`.
    pub fn new(mode: StrokeMode, color: Rgba, stroke_width: f64, start: Point) -> Self {
        Self::from_points(mode, color, stroke_width, vec![start])
    }

    /// Create from existing points.
    pub fn from_points(mode: StrokeMode, color: Rgba, stroke_width: f64, points: Vec<Point>) -> Self {
        let stroke_width = if stroke_width.is_finite() { stroke_width.max(0.1) } else { 1.0 };
        Self {
            id: Uuid::new_v4(),
            points,
            color,
            stroke_width,
            mode,
        }
    }

    pub fn id(&self) -> StrokeId {
        self.id
    }

    /// Add a point to the path. Non-finite points are dropped.
    pub fn add_point(&mut self, point: Point) {
        if point.x.is_finite() && point.y.is_finite() {
            self.points.push(point);
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A stroke with fewer than two points paints nothing.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 2
    }

    /// Bounding box of the path, not inflated by the stroke width.
    pub fn bounds(&self) -> Option<Rect> {
        let first = *self.points.first()?;
        Some(
            self.points
                .iter()
                .skip(1)
                .fold(Rect::from_points(first, first), |r, p| r.union_pt(*p)),
        )
    }

    /// Polyline path; empty for degenerate strokes.
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        if self.is_degenerate() {
            return path;
        }
        path.move_to(self.points[0]);
        for point in &self.points[1..] {
            path.line_to(*point);
        }
        path
    }

    /// Simplify the path by removing redundant points.
    pub fn simplify(&mut self, tolerance: f64) {
        if self.points.len() < 3 || tolerance <= 0.0 {
            return;
        }
        self.points = rdp_simplify(&self.points, tolerance);
    }
}

/// Ramer-Douglas-Peucker line simplification.
fn rdp_simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let first = points[0];
    let last = points[points.len() - 1];

    let mut max_dist = 0.0;
    let mut max_index = 0;
    for (i, point) in points.iter().enumerate().take(points.len() - 1).skip(1) {
        let dist = perpendicular_distance(*point, first, last);
        if dist > max_dist {
            max_dist = dist;
            max_index = i;
        }
    }

    if max_dist > tolerance {
        let mut left = rdp_simplify(&points[..=max_index], tolerance);
        let right = rdp_simplify(&points[max_index..], tolerance);
        // Junction point is in both halves
        left.pop();
        left.extend(right);
        left
    } else {
        vec![first, last]
    }
}

fn perpendicular_distance(point: Point, line_start: Point, line_end: Point) -> f64 {
    let line = line_end - line_start;
    let len_sq = line.hypot2();
    if len_sq < f64::EPSILON {
        return (point - line_start).hypot();
    }
    (point - line_start).cross(line).abs() / len_sq.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pen(points: &[(f64, f64)]) -> Stroke {
        Stroke::from_points(
            StrokeMode::Draw,
            Rgba::black(),
            3.0,
            points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
        )
    }

    #[test]
    fn test_degenerate_stroke_has_empty_path() {
        let stroke = Stroke::new(StrokeMode::Draw, Rgba::black(), 2.0, Point::new(5.0, 5.0));
        assert!(stroke.is_degenerate());
        assert!(stroke.to_path().elements().is_empty());
    }

    #[test]
    fn test_add_points() {
        let mut stroke = Stroke::new(StrokeMode::Erase, Rgba::black(), 2.0, Point::ZERO);
        stroke.add_point(Point::new(10.0, 10.0));
        stroke.add_point(Point::new(f64::NAN, 0.0));
        assert_eq!(stroke.len(), 2);
        assert_eq!(stroke.mode, StrokeMode::Erase);
    }

    #[test]
    fn test_bounds() {
        let stroke = pen(&[(0.0, 0.0), (100.0, 50.0), (50.0, 100.0)]);
        let bounds = stroke.bounds().unwrap();
        assert_eq!(bounds, Rect::new(0.0, 0.0, 100.0, 100.0));
        assert!(pen(&[]).bounds().is_none());
    }

    #[test]
    fn test_simplify_keeps_corners() {
        let mut stroke = pen(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        stroke.simplify(0.5);
        assert_eq!(stroke.len(), 3);

        let mut wobble = pen(&[(0.0, 0.0), (1.0, 0.1), (2.0, 0.0), (3.0, 0.1), (4.0, 0.0)]);
        wobble.simplify(0.5);
        assert_eq!(wobble.len(), 2);
    }
}
