use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::types::{PixelPoint, Rect};

/// Point symbol kinds available to traces and legends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MarkerShape {
    #[default]
    Circle,
    Square,
    Diamond,
    TriangleUp,
    TriangleDown,
    Cross,
    Plus,
}

/// Resolved symbol geometry in pixel space.
///
/// Surfaces draw an `Ellipse` as a filled/stroked ellipse, a `Polygon` as
/// a closed shape, and `Lines` as independent stroked segments.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerGeometry {
    Ellipse(Rect),
    Polygon(SmallVec<[PixelPoint; 4]>),
    Lines(SmallVec<[(PixelPoint, PixelPoint); 2]>),
}

/// Builds the geometry for `shape` centered on `center` with the given
/// overall size (diameter / edge extent) in pixels.
#[must_use]
pub fn marker_geometry(shape: MarkerShape, center: PixelPoint, size_px: f64) -> MarkerGeometry {
    let half = size_px * 0.5;
    match shape {
        MarkerShape::Circle => MarkerGeometry::Ellipse(Rect::new(
            center.x - half,
            center.y - half,
            size_px,
            size_px,
        )),
        MarkerShape::Square => MarkerGeometry::Polygon(SmallVec::from_slice(&[
            PixelPoint::new(center.x - half, center.y - half),
            PixelPoint::new(center.x + half, center.y - half),
            PixelPoint::new(center.x + half, center.y + half),
            PixelPoint::new(center.x - half, center.y + half),
        ])),
        MarkerShape::Diamond => MarkerGeometry::Polygon(SmallVec::from_slice(&[
            PixelPoint::new(center.x, center.y - half),
            PixelPoint::new(center.x + half, center.y),
            PixelPoint::new(center.x, center.y + half),
            PixelPoint::new(center.x - half, center.y),
        ])),
        MarkerShape::TriangleUp => MarkerGeometry::Polygon(SmallVec::from_slice(&[
            PixelPoint::new(center.x, center.y - half),
            PixelPoint::new(center.x + half, center.y + half),
            PixelPoint::new(center.x - half, center.y + half),
        ])),
        MarkerShape::TriangleDown => MarkerGeometry::Polygon(SmallVec::from_slice(&[
            PixelPoint::new(center.x - half, center.y - half),
            PixelPoint::new(center.x + half, center.y - half),
            PixelPoint::new(center.x, center.y + half),
        ])),
        MarkerShape::Cross => MarkerGeometry::Lines(SmallVec::from_slice(&[
            (
                PixelPoint::new(center.x - half, center.y - half),
                PixelPoint::new(center.x + half, center.y + half),
            ),
            (
                PixelPoint::new(center.x - half, center.y + half),
                PixelPoint::new(center.x + half, center.y - half),
            ),
        ])),
        MarkerShape::Plus => MarkerGeometry::Lines(SmallVec::from_slice(&[
            (
                PixelPoint::new(center.x - half, center.y),
                PixelPoint::new(center.x + half, center.y),
            ),
            (
                PixelPoint::new(center.x, center.y - half),
                PixelPoint::new(center.x, center.y + half),
            ),
        ])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_geometry_is_centered() {
        let geometry = marker_geometry(MarkerShape::Circle, PixelPoint::new(10.0, 20.0), 6.0);
        let MarkerGeometry::Ellipse(bounds) = geometry else {
            panic!("expected ellipse");
        };
        assert_eq!(bounds, Rect::new(7.0, 17.0, 6.0, 6.0));
    }

    #[test]
    fn triangle_up_points_upward() {
        let geometry = marker_geometry(MarkerShape::TriangleUp, PixelPoint::new(0.0, 0.0), 4.0);
        let MarkerGeometry::Polygon(points) = geometry else {
            panic!("expected polygon");
        };
        let apex = points[0];
        assert!(apex.y < points[1].y && apex.y < points[2].y);
    }

    #[test]
    fn plus_uses_two_axis_aligned_segments() {
        let geometry = marker_geometry(MarkerShape::Plus, PixelPoint::new(0.0, 0.0), 8.0);
        let MarkerGeometry::Lines(lines) = geometry else {
            panic!("expected lines");
        };
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].0.y, lines[0].1.y);
        assert_eq!(lines[1].0.x, lines[1].1.x);
    }
}
