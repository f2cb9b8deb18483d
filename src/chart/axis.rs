use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::scale::{Scale, ScaleConfig};
use crate::core::types::{PixelPoint, Rect};
use crate::error::{ChartError, ChartResult};
use crate::layout::{LayoutTree, NodeId};
use crate::render::{Brush, Color, Font, Pen, Surface, TextMeasure};

/// Tick mark length in pixels for the scale strip.
const TICK_LENGTH_PX: f64 = 6.0;
/// Minor tick length in pixels.
const MINOR_TICK_LENGTH_PX: f64 = 3.0;
/// Gap between strips inside one axis.
const STRIP_MARGIN_PX: f64 = 2.0;

/// Edge of the plot area an axis is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisPosition {
    Bottom,
    Top,
    Left,
    Right,
}

impl AxisPosition {
    #[must_use]
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

/// Highlighted value band drawn across the plot area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightBand {
    pub name: String,
    pub owner: String,
    pub from: f64,
    pub to: f64,
    pub brush: Brush,
}

/// Snapshot of the bounds-affecting axis settings, used for zoom undo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisState {
    pub min: f64,
    pub max: f64,
    pub auto_min: bool,
    pub auto_max: bool,
    pub offset_min_px: f64,
    pub offset_max_px: f64,
    pub time_format: String,
}

/// Layout node handles assembled by [`Axis::build_layout`].
#[derive(Debug, Clone, Copy)]
pub struct AxisNodes {
    pub container: NodeId,
    pub scale_strip: NodeId,
    pub label_strip: Option<NodeId>,
    pub caption_strip: Option<NodeId>,
}

/// A drawable axis: a [`Scale`] composed with strip layout, ticks, grid,
/// caption, and highlighted bands.
#[derive(Debug, Clone)]
pub struct Axis {
    position: AxisPosition,
    scale: Scale,
    auto_min: bool,
    auto_max: bool,
    explicit_min: f64,
    explicit_max: f64,
    offset_min_px: f64,
    offset_max_px: f64,
    minor_tick_count: usize,
    minor_pen: Option<Pen>,
    grid_pen: Option<Pen>,
    axis_pen: Pen,
    label_font: Font,
    label_color: Color,
    caption: Option<String>,
    caption_font: Font,
    bands: IndexMap<String, HighlightBand>,
    /// Root-frame pixel position of the scale region start; set by the
    /// owning chart when the plot area is placed.
    screen_origin_px: f64,
    nodes: Option<AxisNodes>,
}

impl Axis {
    #[must_use]
    pub fn new(position: AxisPosition) -> Self {
        let scale = Scale::new(ScaleConfig {
            vertical: position.is_vertical(),
            ..ScaleConfig::default()
        });
        Self {
            position,
            scale,
            auto_min: true,
            auto_max: true,
            explicit_min: 0.0,
            explicit_max: 1.0,
            offset_min_px: 0.0,
            offset_max_px: 0.0,
            minor_tick_count: 0,
            minor_pen: None,
            grid_pen: None,
            axis_pen: Pen::default(),
            label_font: Font::default(),
            label_color: Color::BLACK,
            caption: None,
            caption_font: Font::default().with_bold(true),
            bands: IndexMap::new(),
            screen_origin_px: 0.0,
            nodes: None,
        }
    }

    #[must_use]
    pub fn time(position: AxisPosition) -> Self {
        let mut axis = Self::new(position);
        axis.scale.config_mut().time_domain = true;
        axis
    }

    #[must_use]
    pub fn position(&self) -> AxisPosition {
        self.position
    }

    #[must_use]
    pub fn scale(&self) -> &Scale {
        &self.scale
    }

    pub fn scale_mut(&mut self) -> &mut Scale {
        &mut self.scale
    }

    #[must_use]
    pub fn is_time_domain(&self) -> bool {
        self.scale.config().time_domain
    }

    #[must_use]
    pub fn is_auto_bounds(&self) -> bool {
        self.auto_min && self.auto_max
    }

    /// Forces explicit bounds; both auto flags are cleared.
    pub fn set_explicit_bounds(&mut self, min: f64, max: f64) -> ChartResult<()> {
        if !min.is_finite() || !max.is_finite() {
            return Err(ChartError::InvalidData(
                "explicit axis bounds must be finite".to_owned(),
            ));
        }
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        self.explicit_min = min;
        self.explicit_max = max;
        self.auto_min = false;
        self.auto_max = false;
        // The mapping must reflect the new view right away; gesture
        // commits read it back before the next layout pass runs.
        self.scale.set_bounds(min, max);
        Ok(())
    }

    pub fn set_auto_bounds(&mut self) {
        self.auto_min = true;
        self.auto_max = true;
    }

    pub fn set_auto_flags(&mut self, auto_min: bool, auto_max: bool) {
        self.auto_min = auto_min;
        self.auto_max = auto_max;
    }

    pub fn set_offsets_px(&mut self, offset_min_px: f64, offset_max_px: f64) -> ChartResult<()> {
        if !offset_min_px.is_finite()
            || !offset_max_px.is_finite()
            || offset_min_px < 0.0
            || offset_max_px < 0.0
        {
            return Err(ChartError::InvalidData(
                "axis offsets must be finite and >= 0".to_owned(),
            ));
        }
        self.offset_min_px = offset_min_px;
        self.offset_max_px = offset_max_px;
        Ok(())
    }

    pub fn set_minor_ticks(&mut self, count: usize, pen: Option<Pen>) {
        self.minor_tick_count = count;
        self.minor_pen = pen;
    }

    pub fn set_grid_pen(&mut self, pen: Option<Pen>) {
        self.grid_pen = pen;
    }

    pub fn set_axis_pen(&mut self, pen: Pen) {
        self.axis_pen = pen;
    }

    pub fn set_label_style(&mut self, font: Font, color: Color) {
        self.label_font = font;
        self.label_color = color;
    }

    pub fn set_caption(&mut self, caption: Option<String>) {
        self.caption = caption;
    }

    #[must_use]
    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    pub fn add_band(&mut self, band: HighlightBand) {
        self.bands.insert(band.name.clone(), band);
    }

    pub fn remove_band(&mut self, name: &str) -> bool {
        self.bands.shift_remove(name).is_some()
    }

    /// Removes every band registered by `owner`; returns how many.
    pub fn remove_bands_by_owner(&mut self, owner: &str) -> usize {
        let before = self.bands.len();
        self.bands.retain(|_, band| band.owner != owner);
        before - self.bands.len()
    }

    #[must_use]
    pub fn bands(&self) -> impl Iterator<Item = &HighlightBand> {
        self.bands.values()
    }

    /// Resolves effective bounds and applies them to the scale.
    ///
    /// `trace_ranges` are the (min, max) value ranges of visible,
    /// bounds-contributing traces on this axis; reference-only traces are
    /// excluded by the caller. `bar_half_width` is the extra value-space
    /// extension for the domain axis of bar traces. Pixel offsets convert
    /// into value space via the scale's local mapping derivative.
    pub fn compute_bounds(&mut self, trace_ranges: &[(f64, f64)], bar_half_width: f64) {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for (range_min, range_max) in trace_ranges {
            if range_min.is_finite() {
                min = min.min(*range_min);
            }
            if range_max.is_finite() {
                max = max.max(*range_max);
            }
        }

        if !self.auto_min {
            min = self.explicit_min;
        }
        if !self.auto_max {
            max = self.explicit_max;
        }

        self.scale.set_bounds(min, max);

        let mut extend_min = self.scale.offset_to_value_delta(self.offset_min_px, false);
        let mut extend_max = self.scale.offset_to_value_delta(self.offset_max_px, true);
        if bar_half_width > 0.0 {
            if self.auto_min {
                extend_min += bar_half_width;
            }
            if self.auto_max {
                extend_max += bar_half_width;
            }
        }

        let (current_min, current_max) = self.scale.bounds();
        let new_min = if self.auto_min {
            current_min - extend_min
        } else {
            current_min
        };
        let new_max = if self.auto_max {
            current_max + extend_max
        } else {
            current_max
        };
        self.scale.set_bounds(new_min, new_max);

        debug!(
            position = ?self.position,
            min = new_min,
            max = new_max,
            "axis bounds resolved"
        );
    }

    /// Generates labels for the current bounds and assembles the strip
    /// tree (scale strip + optional label strip + optional caption strip)
    /// under `parent`. Strip order follows the axis position.
    pub fn build_layout(
        &mut self,
        tree: &mut LayoutTree,
        parent: NodeId,
        extent_px: f64,
        measure: &dyn TextMeasure,
    ) -> ChartResult<AxisNodes> {
        self.scale.set_size_px(extent_px)?;
        let (min, max) = self.scale.bounds();
        let font = self.label_font.clone();
        self.scale.generate_labels(max, min, measure, &font)?;

        let vertical = self.position.is_vertical();
        let along = extent_px;

        let label_thickness = self
            .scale
            .labels()
            .iter()
            .map(|label| {
                if vertical {
                    label.rect.width
                } else {
                    label.rect.height
                }
            })
            .fold(0.0, f64::max);

        let caption_thickness = self.caption.as_ref().map(|caption| {
            let rect = measure.measure_text(caption, &self.caption_font, 0.0);
            if vertical { rect.width } else { rect.height }
        });

        let strip_rect = |thickness: f64| {
            if vertical {
                Rect::new(0.0, 0.0, thickness, along)
            } else {
                Rect::new(0.0, 0.0, along, thickness)
            }
        };

        let container = tree.add_child(parent, Rect::default())?;
        let scale_strip = tree.add_child(container, strip_rect(TICK_LENGTH_PX))?;
        let label_strip = if label_thickness > 0.0 {
            Some(tree.add_child(container, strip_rect(label_thickness))?)
        } else {
            None
        };
        let caption_strip = match caption_thickness {
            Some(thickness) => Some(tree.add_child(container, strip_rect(thickness))?),
            None => None,
        };

        // The scale strip sits next to the plot edge, so strips stack
        // outward: downward for bottom, upward for top, and mirrored for
        // left/right. Top/left axes therefore place the caption first.
        let outward_first = matches!(self.position, AxisPosition::Top | AxisPosition::Left);
        if outward_first {
            let mut order: Vec<NodeId> = Vec::new();
            if let Some(id) = caption_strip {
                order.push(id);
            }
            if let Some(id) = label_strip {
                order.push(id);
            }
            order.push(scale_strip);
            self.reorder_strips(tree, &order)?;
            tree.rect(container)?;
        } else if vertical {
            tree.stack_horizontal(container, STRIP_MARGIN_PX)?;
        } else {
            tree.stack_vertical(container, STRIP_MARGIN_PX)?;
        }

        let nodes = AxisNodes {
            container,
            scale_strip,
            label_strip,
            caption_strip,
        };
        self.nodes = Some(nodes);
        Ok(nodes)
    }

    /// Thickness (perpendicular extent) of the assembled axis.
    pub fn thickness_px(&self, tree: &mut LayoutTree) -> ChartResult<f64> {
        let Some(nodes) = self.nodes else {
            return Ok(0.0);
        };
        let rect = tree.rect(nodes.container)?;
        Ok(if self.position.is_vertical() {
            rect.width
        } else {
            rect.height
        })
    }

    #[must_use]
    pub fn nodes(&self) -> Option<AxisNodes> {
        self.nodes
    }

    /// Anchors the scale region at a root-frame pixel position; set by the
    /// chart after the plot area is placed.
    pub fn set_screen_origin_px(&mut self, origin_px: f64) {
        self.screen_origin_px = origin_px;
    }

    /// Maps a value onto the root-frame pixel coordinate along this axis
    /// (X for horizontal positions, Y for vertical ones).
    #[must_use]
    pub fn value_to_pos(&self, value: f64) -> f64 {
        self.screen_origin_px + self.scale.value_to_pos(value)
    }

    /// Inverse of [`Axis::value_to_pos`].
    #[must_use]
    pub fn pos_to_value(&self, pos: f64) -> f64 {
        self.scale.pos_to_value(pos - self.screen_origin_px)
    }

    #[must_use]
    pub fn state(&self) -> AxisState {
        let (min, max) = self.scale.bounds();
        AxisState {
            min: if self.auto_min { min } else { self.explicit_min },
            max: if self.auto_max { max } else { self.explicit_max },
            auto_min: self.auto_min,
            auto_max: self.auto_max,
            offset_min_px: self.offset_min_px,
            offset_max_px: self.offset_max_px,
            time_format: self.scale.config().time_format.clone(),
        }
    }

    pub fn set_state(&mut self, state: &AxisState) -> ChartResult<()> {
        if !state.min.is_finite() || !state.max.is_finite() {
            return Err(ChartError::InvalidData(
                "axis state bounds must be finite".to_owned(),
            ));
        }
        self.explicit_min = state.min;
        self.explicit_max = state.max;
        self.auto_min = state.auto_min;
        self.auto_max = state.auto_max;
        self.offset_min_px = state.offset_min_px;
        self.offset_max_px = state.offset_max_px;
        self.scale.config_mut().time_format = state.time_format.clone();
        self.scale.set_bounds(state.min, state.max);
        Ok(())
    }

    /// Draws the axis line, ticks, labels, caption, and optional grid.
    ///
    /// Highlight bands are intentionally not drawn here; the chart draws
    /// them after all other content via [`Axis::draw_bands`].
    pub fn draw(
        &self,
        surface: &mut dyn Surface,
        tree: &mut LayoutTree,
        plot_rect: Rect,
    ) -> ChartResult<()> {
        let Some(nodes) = self.nodes else {
            return Ok(());
        };
        let strip = tree.rect_in_root(nodes.scale_strip)?;
        let label_strip = match nodes.label_strip {
            Some(id) => Some(tree.rect_in_root(id)?),
            None => None,
        };
        let caption_strip = match nodes.caption_strip {
            Some(id) => Some(tree.rect_in_root(id)?),
            None => None,
        };

        self.draw_axis_line(surface, strip);
        self.draw_grid(surface, plot_rect);
        self.draw_ticks(surface, strip);
        if let Some(rect) = label_strip {
            self.draw_labels(surface, rect);
        }
        if let (Some(rect), Some(caption)) = (caption_strip, self.caption.as_deref()) {
            self.draw_caption(surface, rect, caption);
        }
        Ok(())
    }

    /// Draws the highlighted value bands across the plot area.
    pub fn draw_bands(&self, surface: &mut dyn Surface, plot_rect: Rect) {
        for band in self.bands.values() {
            let from = self.value_to_pos(band.from);
            let to = self.value_to_pos(band.to);
            let (low, high) = if from <= to { (from, to) } else { (to, from) };
            let rect = if self.position.is_vertical() {
                Rect::new(plot_rect.x, low, plot_rect.width, high - low)
            } else {
                Rect::new(low, plot_rect.y, high - low, plot_rect.height)
            };
            surface.draw_rect(rect, None, Some(&band.brush));
        }
    }

    fn draw_axis_line(&self, surface: &mut dyn Surface, strip: Rect) {
        let (from, to) = match self.position {
            AxisPosition::Bottom => (
                PixelPoint::new(strip.x, strip.y),
                PixelPoint::new(strip.right(), strip.y),
            ),
            AxisPosition::Top => (
                PixelPoint::new(strip.x, strip.bottom()),
                PixelPoint::new(strip.right(), strip.bottom()),
            ),
            AxisPosition::Left => (
                PixelPoint::new(strip.right(), strip.y),
                PixelPoint::new(strip.right(), strip.bottom()),
            ),
            AxisPosition::Right => (
                PixelPoint::new(strip.x, strip.y),
                PixelPoint::new(strip.x, strip.bottom()),
            ),
        };
        surface.draw_line(from, to, &self.axis_pen);
    }

    fn draw_grid(&self, surface: &mut dyn Surface, plot_rect: Rect) {
        let Some(grid_pen) = self.grid_pen else {
            return;
        };
        for label in self.scale.labels() {
            let pos = self.value_to_pos(label.value);
            let (from, to) = if self.position.is_vertical() {
                (
                    PixelPoint::new(plot_rect.x, pos),
                    PixelPoint::new(plot_rect.right(), pos),
                )
            } else {
                (
                    PixelPoint::new(pos, plot_rect.y),
                    PixelPoint::new(pos, plot_rect.bottom()),
                )
            };
            surface.draw_line(from, to, &grid_pen);
        }
    }

    fn draw_ticks(&self, surface: &mut dyn Surface, strip: Rect) {
        for label in self.scale.labels() {
            let pos = self.value_to_pos(label.value);
            let (from, to) = self.tick_endpoints(strip, pos, TICK_LENGTH_PX);
            surface.draw_line(from, to, &self.axis_pen);
        }

        // Minor ticks only when a minor pen is configured and count > 0.
        if let Some(minor_pen) = self.minor_pen
            && self.minor_tick_count > 0
        {
            for tick_pos in self
                .scale
                .generate_minor_ticks(MINOR_TICK_LENGTH_PX, self.minor_tick_count)
            {
                let pos = self.screen_origin_px + tick_pos;
                let (from, to) = self.tick_endpoints(strip, pos, MINOR_TICK_LENGTH_PX);
                surface.draw_line(from, to, &minor_pen);
            }
        }
    }

    fn tick_endpoints(&self, strip: Rect, pos: f64, length: f64) -> (PixelPoint, PixelPoint) {
        match self.position {
            AxisPosition::Bottom => (
                PixelPoint::new(pos, strip.y),
                PixelPoint::new(pos, strip.y + length),
            ),
            AxisPosition::Top => (
                PixelPoint::new(pos, strip.bottom()),
                PixelPoint::new(pos, strip.bottom() - length),
            ),
            AxisPosition::Left => (
                PixelPoint::new(strip.right(), pos),
                PixelPoint::new(strip.right() - length, pos),
            ),
            AxisPosition::Right => (
                PixelPoint::new(strip.x, pos),
                PixelPoint::new(strip.x + length, pos),
            ),
        }
    }

    fn draw_labels(&self, surface: &mut dyn Surface, strip: Rect) {
        for label in self.scale.labels() {
            let pos = self.value_to_pos(label.value);
            let at = if self.position.is_vertical() {
                PixelPoint::new(strip.x, pos - label.rect.height * 0.5)
            } else {
                PixelPoint::new(pos - label.rect.width * 0.5, strip.y)
            };
            surface.draw_text(&label.text, at, &self.label_font, self.label_color, 0.0);
        }
    }

    fn draw_caption(&self, surface: &mut dyn Surface, strip: Rect, caption: &str) {
        let measured = surface.measure_text(caption, &self.caption_font, 0.0);
        let (at, angle) = if self.position.is_vertical() {
            (
                PixelPoint::new(strip.x, strip.center().y + measured.width * 0.5),
                -90.0,
            )
        } else {
            (
                PixelPoint::new(strip.center().x - measured.width * 0.5, strip.y),
                0.0,
            )
        };
        surface.draw_text(caption, at, &self.caption_font, self.label_color, angle);
    }

    fn reorder_strips(&self, tree: &mut LayoutTree, order: &[NodeId]) -> ChartResult<()> {
        // Stack manually in the requested visual order.
        let mut offset = 0.0;
        for id in order {
            let rect = tree.rect(*id)?;
            if self.position.is_vertical() {
                tree.set_origin(*id, offset, 0.0)?;
                offset += rect.width + STRIP_MARGIN_PX;
            } else {
                tree.set_origin(*id, 0.0, offset)?;
                offset += rect.height + STRIP_MARGIN_PX;
            }
        }
        Ok(())
    }
}
