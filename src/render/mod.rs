mod recording;
mod style;

pub use recording::{DrawCommand, RecordingSurface};
pub use style::{Brush, Color, Font, LineStyle, Pen};

use crate::core::types::{PixelPoint, Rect};

/// Text-measurement capability injected into label generation.
pub trait TextMeasure {
    /// Returns the bounding rectangle of `text` rendered with `font`,
    /// rotated by `angle_deg` degrees.
    fn measure_text(&self, text: &str, font: &Font, angle_deg: f64) -> Rect;
}

/// Contract implemented by any drawing surface.
///
/// The chart core emits fully resolved pixel-space geometry through these
/// calls, so surfaces stay isolated from scale, layout, and interaction
/// logic. All styling arrives as declarative descriptors.
pub trait Surface: TextMeasure {
    fn draw_line(&mut self, from: PixelPoint, to: PixelPoint, pen: &Pen);

    /// Draws a connected polyline through `points`.
    fn draw_lines(&mut self, points: &[PixelPoint], pen: &Pen);

    fn draw_polygon(&mut self, points: &[PixelPoint], pen: Option<&Pen>, brush: Option<&Brush>);

    fn draw_rect(&mut self, rect: Rect, pen: Option<&Pen>, brush: Option<&Brush>);

    fn draw_rounded_rect(
        &mut self,
        rect: Rect,
        corner_radius: f64,
        pen: Option<&Pen>,
        brush: Option<&Brush>,
    );

    fn draw_ellipse(&mut self, bounds: Rect, pen: Option<&Pen>, brush: Option<&Brush>);

    fn draw_text(&mut self, text: &str, at: PixelPoint, font: &Font, color: Color, angle_deg: f64);

    /// Draws a meteorological wind barb at `at`.
    ///
    /// `speed` is in the host's speed unit and selects the barb feathers;
    /// `direction_deg` is the direction the wind blows from, clockwise
    /// from north.
    fn draw_wind_barb(&mut self, at: PixelPoint, speed: f64, direction_deg: f64, pen: &Pen);

    fn set_clip(&mut self, rect: Rect);

    fn clear_clip(&mut self);
}
