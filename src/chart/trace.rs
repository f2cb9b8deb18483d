use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::chart::AxisId;
use crate::chart::axis::Axis;
use crate::core::marker::{MarkerGeometry, MarkerShape, marker_geometry};
use crate::core::types::{PixelPoint, Rect};
use crate::error::{ChartError, ChartResult};
use crate::render::{Brush, Font, Pen, Surface};

/// Gap between a mark label and its anchor point.
const MARK_GAP_PX: f64 = 10.0;
/// Padding inside a mark label box.
const MARK_PADDING_PX: f64 = 3.0;

/// One sample of a trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TracePoint {
    pub domain: f64,
    pub range: f64,
    /// Auxiliary component, e.g. wind direction in degrees.
    pub aux: Option<f64>,
    /// Acquisition timestamp, carried when the domain is time.
    pub timestamp: Option<DateTime<Utc>>,
}

impl TracePoint {
    #[must_use]
    pub fn new(domain: f64, range: f64) -> Self {
        Self {
            domain,
            range,
            aux: None,
            timestamp: None,
        }
    }

    #[must_use]
    pub fn with_aux(mut self, aux: f64) -> Self {
        self.aux = Some(aux);
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.domain.is_finite() && self.range.is_finite()
    }
}

/// Rendering algorithm selector for a trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TraceKind {
    Line { stairs: bool },
    Bar,
    Area,
    Point,
    WindBarb,
    /// Static line across the plot at a fixed range value.
    ReferenceLine { value: f64 },
    /// Static dot at a fixed (domain, range) position.
    ReferenceDot { domain: f64, range: f64 },
}

impl TraceKind {
    /// Reference-only kinds annotate a view and never contribute to
    /// automatic axis bounds.
    #[must_use]
    pub fn is_reference(self) -> bool {
        matches!(self, Self::ReferenceLine { .. } | Self::ReferenceDot { .. })
    }
}

/// One side of the threshold configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub value: f64,
    pub pen: Pen,
    pub brush: Option<Brush>,
}

/// Compass direction used as the preferred placement for a mark label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compass {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Compass {
    /// Unit offset of the direction, in screen coordinates (Y grows down).
    #[must_use]
    fn unit(self) -> (f64, f64) {
        match self {
            Self::North => (0.0, -1.0),
            Self::NorthEast => (0.707, -0.707),
            Self::East => (1.0, 0.0),
            Self::SouthEast => (0.707, 0.707),
            Self::South => (0.0, 1.0),
            Self::SouthWest => (-0.707, 0.707),
            Self::West => (-1.0, 0.0),
            Self::NorthWest => (-0.707, -0.707),
        }
    }

    #[must_use]
    fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::NorthEast => Self::SouthWest,
            Self::East => Self::West,
            Self::SouthEast => Self::NorthWest,
            Self::South => Self::North,
            Self::SouthWest => Self::NorthEast,
            Self::West => Self::East,
            Self::NorthWest => Self::SouthEast,
        }
    }
}

/// Textual annotation anchored to a trace point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    pub text: String,
    pub domain: f64,
    pub range: f64,
    pub preferred: Compass,
}

/// A mark with resolved screen geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedMark {
    pub text: String,
    pub anchor: PixelPoint,
    pub rect: Rect,
}

/// Sub-segment of a line with the pen it must be stroked with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColoredSegment {
    pub from: PixelPoint,
    pub to: PixelPoint,
    pub pen: Pen,
}

/// Shared bar sizing resolved once per frame by the chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarLayout {
    /// Width of one bar in pixels.
    pub width_px: f64,
    /// This trace's slot inside the per-category group.
    pub slot: usize,
    pub slot_count: usize,
    /// Overlapped bars all draw at the tick position.
    pub overlap: bool,
}

/// One data series with its rendering configuration.
#[derive(Debug, Clone)]
pub struct Trace {
    name: String,
    kind: TraceKind,
    visible: bool,
    domain_axis: AxisId,
    range_axis: AxisId,
    pen: Pen,
    brush: Brush,
    /// Alternate fill for area parts below the baseline.
    below_brush: Option<Brush>,
    marker: MarkerShape,
    marker_size_px: f64,
    threshold_high: Option<Threshold>,
    threshold_low: Option<Threshold>,
    marks: Vec<Mark>,
    mark_font: Font,
    /// Keep points ordered ascending by domain (time-domain traces).
    time_sorted: bool,
    points: Vec<TracePoint>,
}

impl Trace {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: TraceKind,
        domain_axis: AxisId,
        range_axis: AxisId,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            visible: true,
            domain_axis,
            range_axis,
            pen: Pen::default(),
            brush: Brush::default(),
            below_brush: None,
            marker: MarkerShape::Circle,
            marker_size_px: 6.0,
            threshold_high: None,
            threshold_low: None,
            marks: Vec::new(),
            mark_font: Font::default(),
            time_sorted: false,
            points: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> TraceKind {
        self.kind
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    #[must_use]
    pub fn domain_axis(&self) -> AxisId {
        self.domain_axis
    }

    #[must_use]
    pub fn range_axis(&self) -> AxisId {
        self.range_axis
    }

    pub(crate) fn set_range_axis(&mut self, axis: AxisId) {
        self.range_axis = axis;
    }

    #[must_use]
    pub fn pen(&self) -> Pen {
        self.pen
    }

    pub fn set_pen(&mut self, pen: Pen) {
        self.pen = pen;
    }

    #[must_use]
    pub fn brush(&self) -> Brush {
        self.brush
    }

    pub fn set_brush(&mut self, brush: Brush) {
        self.brush = brush;
    }

    pub fn set_below_brush(&mut self, brush: Option<Brush>) {
        self.below_brush = brush;
    }

    pub fn set_marker(&mut self, shape: MarkerShape, size_px: f64) {
        self.marker = shape;
        self.marker_size_px = size_px;
    }

    pub fn set_threshold_high(&mut self, threshold: Option<Threshold>) {
        self.threshold_high = threshold;
    }

    pub fn set_threshold_low(&mut self, threshold: Option<Threshold>) {
        self.threshold_low = threshold;
    }

    #[must_use]
    pub fn threshold_high(&self) -> Option<Threshold> {
        self.threshold_high
    }

    #[must_use]
    pub fn threshold_low(&self) -> Option<Threshold> {
        self.threshold_low
    }

    pub fn add_mark(&mut self, mark: Mark) {
        self.marks.push(mark);
    }

    pub fn clear_marks(&mut self) {
        self.marks.clear();
    }

    #[must_use]
    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub(crate) fn set_time_sorted(&mut self, time_sorted: bool) {
        self.time_sorted = time_sorted;
    }

    #[must_use]
    pub fn points(&self) -> &[TracePoint] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Appends a point; time-sorted traces perform an ordered insert by
    /// domain value so the sequence stays ascending.
    pub fn add_point(&mut self, point: TracePoint) {
        if !self.time_sorted {
            self.points.push(point);
            return;
        }
        let index = self
            .points
            .partition_point(|existing| existing.domain <= point.domain);
        self.points.insert(index, point);
    }

    /// Removes points whose timestamp (or domain, interpreted as unix
    /// seconds when no timestamp is carried) is older than `cutoff`.
    pub fn remove_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        let cutoff_seconds = cutoff.timestamp() as f64;
        let before = self.points.len();
        self.points.retain(|point| match point.timestamp {
            Some(stamp) => stamp >= cutoff,
            None => point.domain >= cutoff_seconds,
        });
        before - self.points.len()
    }

    /// Keeps only the newest `max_count` points.
    pub fn trim_to_count(&mut self, max_count: usize) -> usize {
        if self.points.len() <= max_count {
            return 0;
        }
        let excess = self.points.len() - max_count;
        self.points.drain(0..excess);
        excess
    }

    /// Value range along the domain axis; (+inf, -inf) when the trace is
    /// empty, invisible, or reference-only.
    #[must_use]
    pub fn domain_bounds(&self) -> (f64, f64) {
        if !self.visible || self.kind.is_reference() {
            return (f64::INFINITY, f64::NEG_INFINITY);
        }
        finite_bounds(self.points.iter().map(|point| point.domain))
    }

    /// Value range along the range axis; (+inf, -inf) when the trace is
    /// empty, invisible, or reference-only.
    #[must_use]
    pub fn range_bounds(&self) -> (f64, f64) {
        if !self.visible || self.kind.is_reference() {
            return (f64::INFINITY, f64::NEG_INFINITY);
        }
        finite_bounds(self.points.iter().map(|point| point.range))
    }

    /// Smallest absolute domain delta between consecutive points.
    ///
    /// Drives the shared per-category bar width.
    #[must_use]
    pub fn min_domain_step(&self) -> Option<f64> {
        let mut step: Option<f64> = None;
        for pair in self.points.windows(2) {
            let delta = (pair[1].domain - pair[0].domain).abs();
            if delta > 0.0 && delta.is_finite() {
                step = Some(match step {
                    Some(current) => current.min(delta),
                    None => delta,
                });
            }
        }
        step
    }

    /// Nearest visible point to `pos` within `radius` pixels, by
    /// screen-space Euclidean distance. Returns the point index and its
    /// distance.
    #[must_use]
    pub fn hit_test(
        &self,
        pos: PixelPoint,
        radius: f64,
        domain_axis: &Axis,
        range_axis: &Axis,
    ) -> Option<(usize, f64)> {
        if !self.visible {
            return None;
        }
        self.points
            .iter()
            .enumerate()
            .filter_map(|(index, point)| {
                let projected = project_point(*point, domain_axis, range_axis)?;
                let distance = pos.distance_to(projected);
                (distance <= radius).then_some((index, distance))
            })
            .min_by_key(|(_, distance)| OrderedFloat(*distance))
    }

    /// Draws the trace into `plot_rect` using the dispatch table for its
    /// kind, then places and draws its marks.
    pub fn draw(
        &self,
        surface: &mut dyn Surface,
        domain_axis: &Axis,
        range_axis: &Axis,
        plot_rect: Rect,
        bar_layout: Option<BarLayout>,
    ) -> ChartResult<()> {
        if !self.visible {
            return Ok(());
        }

        match self.kind {
            TraceKind::Line { stairs } => {
                render_line(self, surface, domain_axis, range_axis, plot_rect, stairs);
            }
            TraceKind::Bar => {
                if let Some(layout) = bar_layout {
                    render_bars(self, surface, domain_axis, range_axis, layout);
                }
            }
            TraceKind::Area => render_area(self, surface, domain_axis, range_axis),
            TraceKind::Point => render_points(self, surface, domain_axis, range_axis, plot_rect),
            TraceKind::WindBarb => {
                render_wind_barbs(self, surface, domain_axis, range_axis, plot_rect);
            }
            TraceKind::ReferenceLine { value } => {
                render_reference_line(self, surface, range_axis, plot_rect, value);
            }
            TraceKind::ReferenceDot { domain, range } => {
                render_reference_dot(self, surface, domain_axis, range_axis, domain, range);
            }
        }

        self.draw_marks(surface, domain_axis, range_axis, plot_rect)?;
        Ok(())
    }

    fn draw_marks(
        &self,
        surface: &mut dyn Surface,
        domain_axis: &Axis,
        range_axis: &Axis,
        plot_rect: Rect,
    ) -> ChartResult<()> {
        for mark in &self.marks {
            let point = TracePoint::new(mark.domain, mark.range);
            let Some(anchor) = project_point(point, domain_axis, range_axis) else {
                continue;
            };
            let measured = surface.measure_text(&mark.text, &self.mark_font, 0.0);
            let placed = place_mark(
                &mark.text,
                anchor,
                measured.size(),
                mark.preferred,
                plot_rect,
            );

            let edge = nearest_edge_point(placed.rect, anchor);
            surface.draw_line(anchor, edge, &self.pen);
            surface.draw_rounded_rect(placed.rect, 2.0, Some(&self.pen), None);
            surface.draw_text(
                &placed.text,
                PixelPoint::new(
                    placed.rect.x + MARK_PADDING_PX,
                    placed.rect.y + MARK_PADDING_PX,
                ),
                &self.mark_font,
                self.pen.color,
                0.0,
            );
        }
        Ok(())
    }

    fn pen_for_value(&self, value: f64) -> Pen {
        if let Some(high) = self.threshold_high
            && value > high.value
        {
            return high.pen;
        }
        if let Some(low) = self.threshold_low
            && value < low.value
        {
            return low.pen;
        }
        self.pen
    }

    fn brush_for_value(&self, value: f64) -> Brush {
        if let Some(high) = self.threshold_high
            && value > high.value
            && let Some(brush) = high.brush
        {
            return brush;
        }
        if let Some(low) = self.threshold_low
            && value < low.value
            && let Some(brush) = low.brush
        {
            return brush;
        }
        self.brush
    }
}

/// Projects a point into root-frame screen coordinates, swapping X/Y when
/// the domain axis is vertical. Returns `None` for non-finite points.
#[must_use]
pub fn project_point(
    point: TracePoint,
    domain_axis: &Axis,
    range_axis: &Axis,
) -> Option<PixelPoint> {
    if !point.is_finite() {
        return None;
    }
    let domain_pos = domain_axis.value_to_pos(point.domain);
    let range_pos = range_axis.value_to_pos(point.range);
    let projected = if domain_axis.position().is_vertical() {
        PixelPoint::new(range_pos, domain_pos)
    } else {
        PixelPoint::new(domain_pos, range_pos)
    };
    projected.is_finite().then_some(projected)
}

fn finite_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for value in values {
        if !value.is_finite() {
            continue;
        }
        min = min.min(value);
        max = max.max(value);
    }
    (min, max)
}

fn render_line(
    trace: &Trace,
    surface: &mut dyn Surface,
    domain_axis: &Axis,
    range_axis: &Axis,
    plot_rect: Rect,
    stairs: bool,
) {
    let thresholds_active = trace.threshold_high.is_some() || trace.threshold_low.is_some();
    let range_vertical = !domain_axis.position().is_vertical();

    let mut run: Vec<PixelPoint> = Vec::new();
    let flush = |surface: &mut dyn Surface, run: &mut Vec<PixelPoint>| {
        if run.len() >= 2 {
            surface.draw_lines(run, &trace.pen);
        }
        run.clear();
    };

    let mut previous: Option<TracePoint> = None;
    for point in &trace.points {
        if !point.is_finite() {
            // A gap in the data: never connect across it.
            flush(surface, &mut run);
            previous = None;
            continue;
        }

        let Some(prev) = previous else {
            previous = Some(*point);
            continue;
        };
        previous = Some(*point);

        let mut segment_points: SmallVec<[(TracePoint, TracePoint); 2]> = SmallVec::new();
        if stairs {
            // Step through (new domain, old range) before rising.
            let corner = TracePoint::new(point.domain, prev.range);
            segment_points.push((prev, corner));
            segment_points.push((corner, *point));
        } else {
            segment_points.push((prev, *point));
        }

        for (from_value, to_value) in segment_points {
            let (Some(from), Some(to)) = (
                project_point(from_value, domain_axis, range_axis),
                project_point(to_value, domain_axis, range_axis),
            ) else {
                flush(surface, &mut run);
                continue;
            };

            // A segment is drawn only when an endpoint lies inside the plot.
            if !plot_rect.contains(from) && !plot_rect.contains(to) {
                flush(surface, &mut run);
                continue;
            }

            if thresholds_active {
                flush(surface, &mut run);
                let segments = split_threshold_segments(
                    from,
                    to,
                    from_value.range,
                    to_value.range,
                    trace.pen,
                    trace.threshold_high,
                    trace.threshold_low,
                    range_axis,
                    range_vertical,
                );
                for colored in segments {
                    surface.draw_line(colored.from, colored.to, &colored.pen);
                }
            } else {
                if run.is_empty() {
                    run.push(from);
                }
                run.push(to);
            }
        }
    }
    flush(surface, &mut run);
}

/// Splits one projected segment at every enabled threshold it straddles.
///
/// Crossings are interpolated in screen space against the threshold's
/// screen position, so sub-segments meet exactly where the drawn
/// threshold line sits. The range coordinate is Y for horizontal domain
/// axes and X for vertical ones; the two orientations use separate
/// interpolation formulas.
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn split_threshold_segments(
    from: PixelPoint,
    to: PixelPoint,
    from_value: f64,
    to_value: f64,
    base_pen: Pen,
    high: Option<Threshold>,
    low: Option<Threshold>,
    range_axis: &Axis,
    range_vertical: bool,
) -> SmallVec<[ColoredSegment; 3]> {
    let range_coord = |point: PixelPoint| if range_vertical { point.y } else { point.x };

    let mut crossings: SmallVec<[f64; 2]> = SmallVec::new();
    for threshold in [high, low].into_iter().flatten() {
        let sides_differ = (from_value > threshold.value) != (to_value > threshold.value);
        if !sides_differ {
            continue;
        }
        let threshold_pos = range_axis.value_to_pos(threshold.value);
        let start = range_coord(from);
        let end = range_coord(to);
        if (end - start).abs() <= f64::EPSILON {
            continue;
        }
        let t = (threshold_pos - start) / (end - start);
        if t > 0.0 && t < 1.0 {
            crossings.push(t);
        }
    }
    crossings.sort_by(|a, b| a.total_cmp(b));

    let lerp = |t: f64| {
        PixelPoint::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t)
    };

    let classify = |t_mid: f64| -> Pen {
        // Classify the sub-interval by its screen-space midpoint relative
        // to each threshold's screen position, honoring the direction in
        // which values grow along the segment.
        let mid_coord = range_coord(lerp(t_mid));
        let start = range_coord(from);
        let end = range_coord(to);
        let flat = (end - start).abs() <= f64::EPSILON;
        let value_grows_with_coord = (to_value - from_value) * (end - start) > 0.0;

        // True when the midpoint sits on the large-value side of `threshold`.
        let above = |threshold: f64| -> bool {
            if flat {
                return from_value > threshold;
            }
            let threshold_pos = range_axis.value_to_pos(threshold);
            if value_grows_with_coord {
                mid_coord > threshold_pos
            } else {
                mid_coord < threshold_pos
            }
        };

        if let Some(threshold) = high
            && above(threshold.value)
        {
            return threshold.pen;
        }
        if let Some(threshold) = low
            && !above(threshold.value)
        {
            return threshold.pen;
        }
        base_pen
    };

    let mut segments: SmallVec<[ColoredSegment; 3]> = SmallVec::new();
    let mut t_start = 0.0;
    for t_cross in crossings.iter().copied().chain(std::iter::once(1.0)) {
        if t_cross <= t_start {
            continue;
        }
        let t_mid = (t_start + t_cross) * 0.5;
        segments.push(ColoredSegment {
            from: lerp(t_start),
            to: lerp(t_cross),
            pen: classify(t_mid),
        });
        t_start = t_cross;
    }
    segments
}

fn render_bars(
    trace: &Trace,
    surface: &mut dyn Surface,
    domain_axis: &Axis,
    range_axis: &Axis,
    layout: BarLayout,
) {
    let baseline = range_axis.value_to_pos(0.0);
    let slot_offset = if layout.overlap {
        0.0
    } else {
        (layout.slot as f64 - (layout.slot_count as f64 - 1.0) * 0.5) * layout.width_px
    };

    for point in &trace.points {
        if !point.is_finite() {
            continue;
        }
        let center = domain_axis.value_to_pos(point.domain) + slot_offset;
        let value_pos = range_axis.value_to_pos(point.range);
        let (top, bottom) = if value_pos <= baseline {
            (value_pos, baseline)
        } else {
            (baseline, value_pos)
        };

        let rect = if domain_axis.position().is_vertical() {
            Rect::new(top, center - layout.width_px * 0.5, bottom - top, layout.width_px)
        } else {
            Rect::new(center - layout.width_px * 0.5, top, layout.width_px, bottom - top)
        };

        let brush = trace.brush_for_value(point.range);
        surface.draw_rect(rect, None, Some(&brush));
        // Inset the border by half the pen width so adjacent bars do not
        // visually double their shared edges.
        let border = rect.inset(trace.pen.width * 0.5);
        surface.draw_rect(border, Some(&trace.pen), None);
    }
}

fn render_area(trace: &Trace, surface: &mut dyn Surface, domain_axis: &Axis, range_axis: &Axis) {
    let baseline = range_axis.value_to_pos(0.0);
    let below_brush = trace.below_brush.unwrap_or(trace.brush);
    let domain_vertical = domain_axis.position().is_vertical();

    let mut polygon: Vec<PixelPoint> = Vec::new();
    let mut polygon_above = true;

    let close_polygon = |surface: &mut dyn Surface, polygon: &mut Vec<PixelPoint>, above: bool| {
        if polygon.len() < 2 {
            polygon.clear();
            return;
        }
        let first = polygon[0];
        let last = polygon[polygon.len() - 1];
        let (base_last, base_first) = if domain_vertical {
            (
                PixelPoint::new(baseline, last.y),
                PixelPoint::new(baseline, first.y),
            )
        } else {
            (
                PixelPoint::new(last.x, baseline),
                PixelPoint::new(first.x, baseline),
            )
        };
        polygon.push(base_last);
        polygon.push(base_first);
        let brush = if above {
            trace.brush
        } else {
            below_brush
        };
        surface.draw_polygon(polygon, None, Some(&brush));
        polygon.clear();
    };

    let mut previous: Option<TracePoint> = None;
    for point in &trace.points {
        if !point.is_finite() {
            close_polygon(surface, &mut polygon, polygon_above);
            previous = None;
            continue;
        }

        let above = point.range >= 0.0;
        let projected = match project_point(*point, domain_axis, range_axis) {
            Some(projected) => projected,
            None => {
                close_polygon(surface, &mut polygon, polygon_above);
                previous = None;
                continue;
            }
        };

        if let Some(prev) = previous {
            let prev_above = prev.range >= 0.0;
            if prev_above != above {
                // Split the fill exactly at the baseline crossing.
                let t = prev.range / (prev.range - point.range);
                let crossing_domain = prev.domain + t * (point.domain - prev.domain);
                let crossing = project_point(
                    TracePoint::new(crossing_domain, 0.0),
                    domain_axis,
                    range_axis,
                );
                if let Some(crossing) = crossing {
                    polygon.push(crossing);
                    close_polygon(surface, &mut polygon, prev_above);
                    polygon.push(crossing);
                }
                polygon_above = above;
            }
        } else {
            polygon_above = above;
        }

        if polygon.is_empty() {
            polygon_above = above;
        }
        polygon.push(projected);
        previous = Some(*point);
    }
    close_polygon(surface, &mut polygon, polygon_above);
}

fn render_points(
    trace: &Trace,
    surface: &mut dyn Surface,
    domain_axis: &Axis,
    range_axis: &Axis,
    plot_rect: Rect,
) {
    for point in &trace.points {
        let Some(projected) = project_point(*point, domain_axis, range_axis) else {
            continue;
        };
        if !plot_rect.contains(projected) {
            continue;
        }
        let pen = trace.pen_for_value(point.range);
        let brush = trace.brush_for_value(point.range);
        draw_marker(surface, trace.marker, projected, trace.marker_size_px, pen, brush);
    }
}

fn render_wind_barbs(
    trace: &Trace,
    surface: &mut dyn Surface,
    domain_axis: &Axis,
    range_axis: &Axis,
    plot_rect: Rect,
) {
    for point in &trace.points {
        let Some(projected) = project_point(*point, domain_axis, range_axis) else {
            continue;
        };
        if !plot_rect.contains(projected) {
            continue;
        }
        let Some(direction) = point.aux.filter(|aux| aux.is_finite()) else {
            continue;
        };
        let pen = trace.pen_for_value(point.range);
        surface.draw_wind_barb(projected, point.range, direction, &pen);
    }
}

fn render_reference_line(
    trace: &Trace,
    surface: &mut dyn Surface,
    range_axis: &Axis,
    plot_rect: Rect,
    value: f64,
) {
    if !value.is_finite() {
        return;
    }
    let pen = trace.pen_for_value(value);
    let pos = range_axis.value_to_pos(value);
    let (from, to) = if range_axis.position().is_vertical() {
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
    surface.draw_line(from, to, &pen);
}

fn render_reference_dot(
    trace: &Trace,
    surface: &mut dyn Surface,
    domain_axis: &Axis,
    range_axis: &Axis,
    domain: f64,
    range: f64,
) {
    let Some(projected) = project_point(TracePoint::new(domain, range), domain_axis, range_axis)
    else {
        return;
    };
    let pen = trace.pen_for_value(range);
    let brush = trace.brush_for_value(range);
    draw_marker(surface, trace.marker, projected, trace.marker_size_px, pen, brush);
}

fn draw_marker(
    surface: &mut dyn Surface,
    shape: MarkerShape,
    at: PixelPoint,
    size_px: f64,
    pen: Pen,
    brush: Brush,
) {
    match marker_geometry(shape, at, size_px) {
        MarkerGeometry::Ellipse(bounds) => {
            surface.draw_ellipse(bounds, Some(&pen), Some(&brush));
        }
        MarkerGeometry::Polygon(points) => {
            surface.draw_polygon(&points, Some(&pen), Some(&brush));
        }
        MarkerGeometry::Lines(lines) => {
            for (from, to) in lines {
                surface.draw_line(from, to, &pen);
            }
        }
    }
}

/// Places a mark label near its anchor.
///
/// The preferred compass direction is tried first; if the label rectangle
/// leaves the plot bounds the direction is flipped, and the result is
/// clamped inside the plot either way.
#[must_use]
pub fn place_mark(
    text: &str,
    anchor: PixelPoint,
    text_size: crate::core::types::Size,
    preferred: Compass,
    plot_rect: Rect,
) -> PlacedMark {
    let width = text_size.width + 2.0 * MARK_PADDING_PX;
    let height = text_size.height + 2.0 * MARK_PADDING_PX;

    let rect_for = |direction: Compass| {
        let (dx, dy) = direction.unit();
        let center_x = anchor.x + dx * (MARK_GAP_PX + width * 0.5);
        let center_y = anchor.y + dy * (MARK_GAP_PX + height * 0.5);
        Rect::new(center_x - width * 0.5, center_y - height * 0.5, width, height)
    };

    let fits = |rect: Rect| {
        rect.x >= plot_rect.x
            && rect.y >= plot_rect.y
            && rect.right() <= plot_rect.right()
            && rect.bottom() <= plot_rect.bottom()
    };

    let mut rect = rect_for(preferred);
    if !fits(rect) {
        let flipped = rect_for(preferred.opposite());
        if fits(flipped) {
            rect = flipped;
        }
    }

    // Clamp whichever candidate won into the plot bounds.
    let x = rect
        .x
        .clamp(plot_rect.x, (plot_rect.right() - rect.width).max(plot_rect.x));
    let y = rect
        .y
        .clamp(plot_rect.y, (plot_rect.bottom() - rect.height).max(plot_rect.y));

    PlacedMark {
        text: text.to_owned(),
        anchor,
        rect: Rect::new(x, y, rect.width, rect.height),
    }
}

fn nearest_edge_point(rect: Rect, from: PixelPoint) -> PixelPoint {
    PixelPoint::new(
        from.x.clamp(rect.x, rect.right()),
        from.y.clamp(rect.y, rect.bottom()),
    )
}

pub(crate) fn validate_radius(radius: f64) -> ChartResult<f64> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(ChartError::InvalidData(
            "hit test radius must be finite and > 0".to_owned(),
        ));
    }
    Ok(radius)
}
