use crate::core::types::{PixelPoint, Rect};
use crate::render::style::{Brush, Color, Font, Pen};
use crate::render::{Surface, TextMeasure};

/// Estimated advance width per character, as a fraction of font size.
const CHAR_WIDTH_FACTOR: f64 = 0.6;
/// Estimated line height as a fraction of font size.
const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Line {
        from: PixelPoint,
        to: PixelPoint,
        pen: Pen,
    },
    Lines {
        points: Vec<PixelPoint>,
        pen: Pen,
    },
    Polygon {
        points: Vec<PixelPoint>,
        pen: Option<Pen>,
        brush: Option<Brush>,
    },
    Rect {
        rect: Rect,
        pen: Option<Pen>,
        brush: Option<Brush>,
    },
    RoundedRect {
        rect: Rect,
        corner_radius: f64,
        pen: Option<Pen>,
        brush: Option<Brush>,
    },
    Ellipse {
        bounds: Rect,
        pen: Option<Pen>,
        brush: Option<Brush>,
    },
    Text {
        text: String,
        at: PixelPoint,
        font: Font,
        color: Color,
        angle_deg: f64,
    },
    WindBarb {
        at: PixelPoint,
        speed: f64,
        direction_deg: f64,
        pen: Pen,
    },
    SetClip {
        rect: Rect,
    },
    ClearClip,
}

/// Surface that records draw commands instead of painting.
///
/// Used by tests and headless hosts; text metrics are estimated from
/// character count and font size.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    #[must_use]
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl TextMeasure for RecordingSurface {
    fn measure_text(&self, text: &str, font: &Font, angle_deg: f64) -> Rect {
        let width = text.chars().count() as f64 * font.size_px * CHAR_WIDTH_FACTOR;
        let height = font.size_px * LINE_HEIGHT_FACTOR;
        // Right-angle rotations swap the extents; other angles keep the
        // axis-aligned bounding box of the rotated rectangle.
        let radians = angle_deg.to_radians();
        let (sin, cos) = (radians.sin().abs(), radians.cos().abs());
        Rect::new(0.0, 0.0, width * cos + height * sin, width * sin + height * cos)
    }
}

impl Surface for RecordingSurface {
    fn draw_line(&mut self, from: PixelPoint, to: PixelPoint, pen: &Pen) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            pen: *pen,
        });
    }

    fn draw_lines(&mut self, points: &[PixelPoint], pen: &Pen) {
        self.commands.push(DrawCommand::Lines {
            points: points.to_vec(),
            pen: *pen,
        });
    }

    fn draw_polygon(&mut self, points: &[PixelPoint], pen: Option<&Pen>, brush: Option<&Brush>) {
        self.commands.push(DrawCommand::Polygon {
            points: points.to_vec(),
            pen: pen.copied(),
            brush: brush.copied(),
        });
    }

    fn draw_rect(&mut self, rect: Rect, pen: Option<&Pen>, brush: Option<&Brush>) {
        self.commands.push(DrawCommand::Rect {
            rect,
            pen: pen.copied(),
            brush: brush.copied(),
        });
    }

    fn draw_rounded_rect(
        &mut self,
        rect: Rect,
        corner_radius: f64,
        pen: Option<&Pen>,
        brush: Option<&Brush>,
    ) {
        self.commands.push(DrawCommand::RoundedRect {
            rect,
            corner_radius,
            pen: pen.copied(),
            brush: brush.copied(),
        });
    }

    fn draw_ellipse(&mut self, bounds: Rect, pen: Option<&Pen>, brush: Option<&Brush>) {
        self.commands.push(DrawCommand::Ellipse {
            bounds,
            pen: pen.copied(),
            brush: brush.copied(),
        });
    }

    fn draw_text(&mut self, text: &str, at: PixelPoint, font: &Font, color: Color, angle_deg: f64) {
        self.commands.push(DrawCommand::Text {
            text: text.to_owned(),
            at,
            font: font.clone(),
            color,
            angle_deg,
        });
    }

    fn draw_wind_barb(&mut self, at: PixelPoint, speed: f64, direction_deg: f64, pen: &Pen) {
        self.commands.push(DrawCommand::WindBarb {
            at,
            speed,
            direction_deg,
            pen: *pen,
        });
    }

    fn set_clip(&mut self, rect: Rect) {
        self.commands.push(DrawCommand::SetClip { rect });
    }

    fn clear_clip(&mut self) {
        self.commands.push(DrawCommand::ClearClip);
    }
}
