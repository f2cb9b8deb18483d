use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chart::axis::{Axis, AxisState};
use crate::chart::trace::{BarLayout, Trace, TraceKind, TracePoint, validate_radius};
use crate::chart::{AxisId, TraceId};
use crate::core::types::{PixelPoint, Rect, Viewport};
use crate::error::{ChartError, ChartResult};
use crate::interaction::{GestureConfig, GestureMachine, GestureOutcome, GestureState, PointerEvent};
use crate::layout::{LayoutTree, NodeId};
use crate::render::{Brush, Color, Font, Pen, Surface, TextMeasure};

/// Side of a legend color swatch.
const LEGEND_SWATCH_PX: f64 = 10.0;
/// Gap between a legend swatch and its trace name.
const LEGEND_GAP_PX: f64 = 4.0;

/// Chart-wide presentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    pub background: Brush,
    pub title_font: Font,
    pub title_color: Color,
    pub legend_font: Font,
    pub show_legend: bool,
    /// Outer margin and gap between stacked same-side axes.
    pub margin_px: f64,
    /// Fraction of the smallest domain step a bar group occupies.
    pub bar_width_ratio: f64,
    /// Draw every bar trace at the tick position instead of side by side.
    pub bar_overlap: bool,
    pub gestures: GestureConfig,
    /// Pen for the in-progress zoom rubber band.
    pub zoom_pen: Pen,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            background: Brush::new(Color::WHITE),
            title_font: Font::default().with_bold(true),
            title_color: Color::BLACK,
            legend_font: Font::default(),
            show_legend: true,
            margin_px: 4.0,
            bar_width_ratio: 0.8,
            bar_overlap: false,
            gestures: GestureConfig::default(),
            zoom_pen: Pen::default(),
        }
    }
}

/// Snapshot of every axis's bounds-affecting settings, in axis insertion
/// order. Serializable so hosts can persist and recall views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphState {
    pub axes: Vec<AxisState>,
}

/// One legend row with its resolved root-frame rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub trace: TraceId,
    pub name: String,
    pub rect: Rect,
}

/// The chart: axes, traces, legend, title, layout, and interaction glued
/// together over an abstract [`Surface`].
///
/// Mutations invalidate cached positions; [`Chart::draw`] re-runs layout
/// when needed, so hosts redraw without tracking dirtiness themselves.
#[derive(Debug)]
pub struct Chart {
    config: ChartConfig,
    title: Option<String>,
    viewport: Viewport,
    axes: Vec<Axis>,
    traces: Vec<Trace>,
    /// Gesture targets; default to the first horizontal / vertical axis.
    gesture_domain: Option<AxisId>,
    gesture_range: Option<AxisId>,
    gestures: GestureMachine,
    /// Single-level view backup recalled by the restore gesture.
    backup: Option<GraphState>,
    positions_valid: bool,
    tree: LayoutTree,
    plot_rect: Rect,
    legend_rect: Rect,
    legend_entries: Vec<LegendEntry>,
    /// Per-trace bar sizing resolved during layout; parallel to `traces`.
    bar_layouts: Vec<Option<BarLayout>>,
}

impl Chart {
    pub fn new(viewport: Viewport) -> ChartResult<Self> {
        viewport.validate()?;
        let config = ChartConfig::default();
        let gestures = GestureMachine::new(config.gestures);
        Ok(Self {
            config,
            title: None,
            viewport,
            axes: Vec::new(),
            traces: Vec::new(),
            gesture_domain: None,
            gesture_range: None,
            gestures,
            backup: None,
            positions_valid: false,
            tree: LayoutTree::new(),
            plot_rect: Rect::default(),
            legend_rect: Rect::default(),
            legend_entries: Vec::new(),
            bar_layouts: Vec::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ChartConfig) {
        self.gestures.set_config(config.gestures);
        self.config = config;
        self.invalidate();
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title;
        self.invalidate();
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) -> ChartResult<()> {
        viewport.validate()?;
        self.viewport = viewport;
        self.invalidate();
        Ok(())
    }

    /// Flags cached positions as out of date; the next draw re-layouts.
    pub fn invalidate(&mut self) {
        self.positions_valid = false;
    }

    #[must_use]
    pub fn positions_valid(&self) -> bool {
        self.positions_valid
    }

    #[must_use]
    pub fn plot_rect(&self) -> Rect {
        self.plot_rect
    }

    #[must_use]
    pub fn legend_rect(&self) -> Rect {
        self.legend_rect
    }

    #[must_use]
    pub fn legend_entries(&self) -> &[LegendEntry] {
        &self.legend_entries
    }

    /// The legend entry under a root-frame point, if any.
    #[must_use]
    pub fn legend_hit(&self, pos: PixelPoint) -> Option<TraceId> {
        self.legend_entries
            .iter()
            .find(|entry| entry.rect.contains(pos))
            .map(|entry| entry.trace)
    }

    // ----- axes -------------------------------------------------------

    pub fn add_axis(&mut self, axis: Axis) -> AxisId {
        let id = AxisId(self.axes.len());
        let vertical = axis.position().is_vertical();
        if vertical {
            self.gesture_range.get_or_insert(id);
        } else {
            self.gesture_domain.get_or_insert(id);
        }
        self.axes.push(axis);
        self.invalidate();
        id
    }

    pub fn axis(&self, id: AxisId) -> ChartResult<&Axis> {
        self.axes.get(id.0).ok_or(ChartError::UnknownAxis(id.0))
    }

    pub fn axis_mut(&mut self, id: AxisId) -> ChartResult<&mut Axis> {
        self.positions_valid = false;
        self.axes.get_mut(id.0).ok_or(ChartError::UnknownAxis(id.0))
    }

    #[must_use]
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Selects which axes zoom, pan, and wheel gestures act on.
    pub fn set_gesture_axes(&mut self, domain: AxisId, range: AxisId) -> ChartResult<()> {
        self.axis(domain)?;
        self.axis(range)?;
        self.gesture_domain = Some(domain);
        self.gesture_range = Some(range);
        Ok(())
    }

    // ----- traces -----------------------------------------------------

    /// Registers a trace. Its domain and range axes must exist and have
    /// perpendicular orientations; time-domain axes switch the trace to
    /// ordered insertion.
    pub fn add_trace(&mut self, mut trace: Trace) -> ChartResult<TraceId> {
        let domain = self.axis(trace.domain_axis())?;
        let range = self.axis(trace.range_axis())?;
        if domain.position().is_vertical() == range.position().is_vertical() {
            return Err(ChartError::InvalidData(
                "trace axes must have perpendicular orientations".to_owned(),
            ));
        }
        trace.set_time_sorted(domain.is_time_domain());
        let id = TraceId(self.traces.len());
        self.traces.push(trace);
        self.invalidate();
        Ok(id)
    }

    pub fn trace(&self, id: TraceId) -> ChartResult<&Trace> {
        self.traces.get(id.0).ok_or(ChartError::UnknownTrace(id.0))
    }

    pub fn trace_mut(&mut self, id: TraceId) -> ChartResult<&mut Trace> {
        self.positions_valid = false;
        self.traces
            .get_mut(id.0)
            .ok_or(ChartError::UnknownTrace(id.0))
    }

    #[must_use]
    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    pub fn set_trace_visible(&mut self, id: TraceId, visible: bool) -> ChartResult<()> {
        self.trace_mut(id)?.set_visible(visible);
        Ok(())
    }

    /// Reassigns a trace to another range axis of the matching orientation.
    pub fn set_trace_range_axis(&mut self, id: TraceId, axis: AxisId) -> ChartResult<()> {
        let domain_vertical = {
            let trace = self.trace(id)?;
            self.axis(trace.domain_axis())?.position().is_vertical()
        };
        if self.axis(axis)?.position().is_vertical() == domain_vertical {
            return Err(ChartError::InvalidData(
                "trace axes must have perpendicular orientations".to_owned(),
            ));
        }
        self.trace_mut(id)?.set_range_axis(axis);
        Ok(())
    }

    pub fn add_point(&mut self, id: TraceId, point: TracePoint) -> ChartResult<()> {
        self.trace_mut(id)?.add_point(point);
        Ok(())
    }

    /// Drops points older than `cutoff` from every trace.
    pub fn remove_points_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        let removed: usize = self
            .traces
            .iter_mut()
            .map(|trace| trace.remove_older_than(cutoff))
            .sum();
        if removed > 0 {
            self.invalidate();
        }
        removed
    }

    /// Nearest visible point across all traces within `radius` pixels.
    pub fn hit_test(
        &self,
        pos: PixelPoint,
        radius: f64,
    ) -> ChartResult<Option<(TraceId, usize, f64)>> {
        let radius = validate_radius(radius)?;
        let mut best: Option<(TraceId, usize, f64)> = None;
        for (index, trace) in self.traces.iter().enumerate() {
            let domain = self.axis(trace.domain_axis())?;
            let range = self.axis(trace.range_axis())?;
            if let Some((point_index, distance)) = trace.hit_test(pos, radius, domain, range)
                && best.is_none_or(|(_, _, current)| distance < current)
            {
                best = Some((TraceId(index), point_index, distance));
            }
        }
        Ok(best)
    }

    // ----- state / undo ----------------------------------------------

    #[must_use]
    pub fn state(&self) -> GraphState {
        GraphState {
            axes: self.axes.iter().map(Axis::state).collect(),
        }
    }

    pub fn set_state(&mut self, state: &GraphState) -> ChartResult<()> {
        if state.axes.len() != self.axes.len() {
            return Err(ChartError::InvalidData(format!(
                "state carries {} axes, chart has {}",
                state.axes.len(),
                self.axes.len()
            )));
        }
        for (axis, snapshot) in self.axes.iter_mut().zip(&state.axes) {
            axis.set_state(snapshot)?;
        }
        self.invalidate();
        Ok(())
    }

    /// Snapshots the current view so the restore gesture can recall it.
    pub fn backup_settings(&mut self) {
        self.backup = Some(self.state());
    }

    /// Recalls the snapshot taken by [`Chart::backup_settings`]; returns
    /// whether one existed.
    pub fn restore_settings(&mut self) -> ChartResult<bool> {
        match self.backup.take() {
            Some(state) => {
                self.set_state(&state)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ----- interaction ------------------------------------------------

    #[must_use]
    pub fn gesture_state(&self) -> GestureState {
        self.gestures.state()
    }

    /// Rubber-band rectangle of an in-progress zoom drag.
    #[must_use]
    pub fn zoom_rect(&self) -> Option<Rect> {
        self.gestures.zoom_rect()
    }

    /// Feeds a pointer event through the gesture machine and applies the
    /// outcome to the gesture axes.
    pub fn on_pointer(&mut self, event: PointerEvent) -> ChartResult<GestureOutcome> {
        let was_idle = matches!(self.gestures.state(), GestureState::Idle);
        let outcome = self.gestures.handle(event);
        // A pan mutates bounds incrementally, so the view to recall is
        // the one from the moment the drag began.
        if was_idle && matches!(self.gestures.state(), GestureState::ContextDrag { .. }) {
            self.backup_settings();
        }
        match outcome {
            GestureOutcome::ZoomCommitted { rect } => {
                self.backup_settings();
                self.apply_zoom_rect(rect)?;
                debug!(?rect, "zoom committed");
            }
            GestureOutcome::ZoomCancelled => {
                for id in [self.gesture_domain, self.gesture_range].into_iter().flatten() {
                    self.axis_mut(id)?.set_auto_bounds();
                }
                self.invalidate();
                debug!("zoom cancelled, automatic bounds restored");
            }
            GestureOutcome::Pan { dx, dy } => {
                self.apply_pan(dx, dy)?;
            }
            GestureOutcome::RestoreRequested => {
                let restored = self.restore_settings()?;
                debug!(restored, "previous view requested");
            }
            GestureOutcome::WheelZoom { at, factor } => {
                self.apply_wheel_zoom(at, factor)?;
            }
            GestureOutcome::None => {}
        }
        Ok(outcome)
    }

    fn apply_zoom_rect(&mut self, rect: Rect) -> ChartResult<()> {
        for id in [self.gesture_domain, self.gesture_range].into_iter().flatten() {
            let axis = self.axis_mut(id)?;
            let (from, to) = if axis.position().is_vertical() {
                (rect.y, rect.bottom())
            } else {
                (rect.x, rect.right())
            };
            let a = axis.pos_to_value(from);
            let b = axis.pos_to_value(to);
            axis.set_explicit_bounds(a.min(b), a.max(b))?;
        }
        self.invalidate();
        Ok(())
    }

    fn apply_pan(&mut self, dx: f64, dy: f64) -> ChartResult<()> {
        for id in [self.gesture_domain, self.gesture_range].into_iter().flatten() {
            let axis = self.axis_mut(id)?;
            let delta_px = if axis.position().is_vertical() { dy } else { dx };
            if delta_px == 0.0 {
                continue;
            }
            // Content follows the pointer: shift bounds by the value span
            // the pixel displacement covers, in the opposite direction.
            let origin = axis.pos_to_value(0.0);
            let shifted = axis.pos_to_value(delta_px);
            let delta_value = shifted - origin;
            let (min, max) = axis.scale().bounds();
            axis.set_explicit_bounds(min - delta_value, max - delta_value)?;
        }
        self.invalidate();
        Ok(())
    }

    fn apply_wheel_zoom(&mut self, at: PixelPoint, factor: f64) -> ChartResult<()> {
        let Some(id) = self.gesture_domain else {
            return Ok(());
        };
        if !factor.is_finite() || factor <= 0.0 {
            return Ok(());
        }
        let axis = self.axis_mut(id)?;
        let coord = if axis.position().is_vertical() { at.y } else { at.x };
        let anchor = axis.pos_to_value(coord);
        let (min, max) = axis.scale().bounds();
        let new_min = anchor - (anchor - min) / factor;
        let new_max = anchor + (max - anchor) / factor;
        axis.set_explicit_bounds(new_min, new_max)?;
        self.invalidate();
        Ok(())
    }

    // ----- layout -----------------------------------------------------

    /// Resolves axis bounds, assembles the layout tree, and caches the
    /// plot and legend geometry.
    pub fn layout(&mut self, measure: &dyn TextMeasure) -> ChartResult<()> {
        self.viewport.validate()?;

        let margin = self.config.margin_px;
        let full = self.viewport.rect();

        let title_height = match self.title.as_deref() {
            Some(title) => {
                measure
                    .measure_text(title, &self.config.title_font, 0.0)
                    .height
                    + margin
            }
            None => 0.0,
        };

        let provisional_h = (full.width - 2.0 * margin).max(1.0);
        let provisional_v = (full.height - 2.0 * margin).max(1.0);

        // Seed every scale with its provisional extent before bounds
        // resolution, so pixel-offset padding maps through a real pixel
        // size on the first frame instead of a stale or zero one.
        for axis in &mut self.axes {
            let extent = if axis.position().is_vertical() {
                provisional_v
            } else {
                provisional_h
            };
            axis.scale_mut().set_size_px(extent)?;
        }
        self.compute_axis_bounds();

        // First pass at provisional extents, to learn each axis's
        // thickness before the plot area is known.
        let mut scratch = LayoutTree::new();
        let scratch_root = scratch.root();
        let mut thickness = vec![0.0; self.axes.len()];
        for (index, axis) in self.axes.iter_mut().enumerate() {
            let extent = if axis.position().is_vertical() {
                provisional_v
            } else {
                provisional_h
            };
            axis.build_layout(&mut scratch, scratch_root, extent, measure)?;
            thickness[index] = axis.thickness_px(&mut scratch)?;
        }

        use crate::chart::axis::AxisPosition::{Bottom, Left, Right, Top};
        let side_total = |position: crate::chart::axis::AxisPosition| {
            self.axes
                .iter()
                .zip(&thickness)
                .filter(|(axis, _)| axis.position() == position)
                .map(|(_, t)| t + margin)
                .sum::<f64>()
        };
        let left_total = side_total(Left);
        let right_total = side_total(Right);
        let top_total = side_total(Top);
        let bottom_total = side_total(Bottom);

        let legend_height = self.measure_legend_height(measure, provisional_h);

        let plot_x = margin + left_total;
        let plot_y = margin + title_height + legend_height + top_total;
        let plot_width = full.width - plot_x - right_total - margin;
        let plot_height = full.height - plot_y - bottom_total - margin;
        if plot_width <= 0.0 || plot_height <= 0.0 {
            return Err(ChartError::InvalidViewport {
                width: self.viewport.width,
                height: self.viewport.height,
            });
        }

        // Second pass at exact extents, into the tree that draw reads.
        let mut tree = LayoutTree::new();
        let root = tree.root();
        tree.set_rect(root, full)?;

        let plot_rect = Rect::new(plot_x, plot_y, plot_width, plot_height);
        tree.add_child(root, plot_rect)?;

        let mut bottom_offset = plot_rect.bottom() + margin;
        let mut top_offset = plot_y - margin;
        let mut left_offset = plot_x - margin;
        let mut right_offset = plot_rect.right() + margin;
        for axis in &mut self.axes {
            let position = axis.position();
            let extent = if position.is_vertical() {
                plot_height
            } else {
                plot_width
            };
            let nodes = axis.build_layout(&mut tree, root, extent, measure)?;
            let actual = axis.thickness_px(&mut tree)?;
            match position {
                Bottom => {
                    tree.set_origin(nodes.container, plot_x, bottom_offset)?;
                    bottom_offset += actual + margin;
                }
                Top => {
                    top_offset -= actual;
                    tree.set_origin(nodes.container, plot_x, top_offset)?;
                    top_offset -= margin;
                }
                Left => {
                    left_offset -= actual;
                    tree.set_origin(nodes.container, left_offset, plot_y)?;
                    left_offset -= margin;
                }
                Right => {
                    tree.set_origin(nodes.container, right_offset, plot_y)?;
                    right_offset += actual + margin;
                }
            }
            axis.set_screen_origin_px(if position.is_vertical() {
                plot_y
            } else {
                plot_x
            });
        }

        self.legend_entries.clear();
        self.legend_rect = Rect::default();
        if self.config.show_legend {
            self.build_legend(&mut tree, root, measure, margin, title_height, provisional_h)?;
        }

        self.bar_layouts = self.compute_bar_layouts();
        self.tree = tree;
        self.plot_rect = plot_rect;
        self.positions_valid = true;
        debug!(
            ?plot_rect,
            axes = self.axes.len(),
            traces = self.traces.len(),
            "chart layout resolved"
        );
        Ok(())
    }

    /// Resolves automatic bounds on every axis from its visible,
    /// bounds-contributing traces, widened by half a bar group where bar
    /// traces ride the axis.
    fn compute_axis_bounds(&mut self) {
        for (index, axis) in self.axes.iter_mut().enumerate() {
            let id = AxisId(index);
            let mut ranges: Vec<(f64, f64)> = Vec::new();
            let mut bar_step: Option<f64> = None;
            for trace in &self.traces {
                if trace.domain_axis() == id {
                    ranges.push(trace.domain_bounds());
                    if trace.kind() == TraceKind::Bar
                        && let Some(step) = trace.min_domain_step()
                    {
                        bar_step = Some(match bar_step {
                            Some(current) => current.min(step),
                            None => step,
                        });
                    }
                }
                if trace.range_axis() == id {
                    ranges.push(trace.range_bounds());
                }
            }
            let bar_half_width = bar_step
                .map(|step| step * self.config.bar_width_ratio * 0.5)
                .unwrap_or(0.0);
            axis.compute_bounds(&ranges, bar_half_width);
        }
    }

    /// Shared per-frame bar sizing: every bar trace on one domain axis
    /// gets the same width, derived from the smallest domain step among
    /// them. Traces step-less on their axis get no layout and are skipped
    /// at draw time.
    fn compute_bar_layouts(&self) -> Vec<Option<BarLayout>> {
        let mut layouts = vec![None; self.traces.len()];
        for (axis_index, axis) in self.axes.iter().enumerate() {
            let id = AxisId(axis_index);
            let group: Vec<usize> = self
                .traces
                .iter()
                .enumerate()
                .filter(|(_, trace)| {
                    trace.kind() == TraceKind::Bar && trace.domain_axis() == id
                })
                .map(|(index, _)| index)
                .collect();
            if group.is_empty() {
                continue;
            }
            let step = group
                .iter()
                .filter_map(|&index| self.traces[index].min_domain_step())
                .min_by_key(|step| OrderedFloat(*step));
            let Some(step) = step else {
                continue;
            };
            let (min, _) = axis.scale().bounds();
            let group_px = (axis.value_to_pos(min + step) - axis.value_to_pos(min)).abs()
                * self.config.bar_width_ratio;
            let slot_count = group.len();
            let width_px = if self.config.bar_overlap {
                group_px
            } else {
                group_px / slot_count as f64
            };
            for (slot, &index) in group.iter().enumerate() {
                layouts[index] = Some(BarLayout {
                    width_px,
                    slot,
                    slot_count,
                    overlap: self.config.bar_overlap,
                });
            }
        }
        layouts
    }

    /// Height the legend grid will occupy, mirroring the uniform-cell wrap
    /// [`LayoutTree::stack_grid`] applies when the entries are placed.
    fn measure_legend_height(&self, measure: &dyn TextMeasure, width: f64) -> f64 {
        if !self.config.show_legend {
            return 0.0;
        }
        let mut cell_width = 0.0_f64;
        let mut cell_height = 0.0_f64;
        let mut count = 0usize;
        for trace in self.traces.iter().filter(|trace| trace.is_visible()) {
            let text = measure.measure_text(trace.name(), &self.config.legend_font, 0.0);
            cell_width = cell_width.max(LEGEND_SWATCH_PX + LEGEND_GAP_PX + text.width + LEGEND_GAP_PX);
            cell_height = cell_height.max(text.height.max(LEGEND_SWATCH_PX));
            count += 1;
        }
        if count == 0 {
            return 0.0;
        }
        let per_row = if cell_width > 0.0 {
            ((width / cell_width).floor() as usize).max(1)
        } else {
            1
        };
        let rows = count.div_ceil(per_row);
        rows as f64 * cell_height + self.config.margin_px
    }

    fn build_legend(
        &mut self,
        tree: &mut LayoutTree,
        root: NodeId,
        measure: &dyn TextMeasure,
        margin: f64,
        title_height: f64,
        width: f64,
    ) -> ChartResult<()> {
        let visible: Vec<(TraceId, String)> = self
            .traces
            .iter()
            .enumerate()
            .filter(|(_, trace)| trace.is_visible())
            .map(|(index, trace)| (TraceId(index), trace.name().to_owned()))
            .collect();
        if visible.is_empty() {
            return Ok(());
        }

        let container = tree.add_child(root, Rect::default())?;
        let mut nodes = Vec::with_capacity(visible.len());
        for (_, name) in &visible {
            let text = measure.measure_text(name, &self.config.legend_font, 0.0);
            let entry_width = LEGEND_SWATCH_PX + LEGEND_GAP_PX + text.width + LEGEND_GAP_PX;
            let entry_height = text.height.max(LEGEND_SWATCH_PX);
            let node = tree.add_child(container, Rect::new(0.0, 0.0, entry_width, entry_height))?;
            nodes.push(node);
        }
        tree.stack_grid(container, width, false)?;
        tree.set_origin(container, margin, margin + title_height)?;

        for ((trace, name), node) in visible.into_iter().zip(nodes) {
            let rect = tree.rect_in_root(node)?;
            self.legend_entries.push(LegendEntry { trace, name, rect });
        }
        self.legend_rect = tree.rect_in_root(container)?;
        Ok(())
    }

    // ----- drawing ----------------------------------------------------

    /// Renders the chart: background, title, legend, clipped traces, axes,
    /// then highlight bands and any in-progress zoom rectangle on top.
    pub fn draw(&mut self, surface: &mut dyn Surface) -> ChartResult<()> {
        if !self.positions_valid {
            self.layout(&*surface)?;
        }

        let full = self.viewport.rect();
        surface.draw_rect(full, None, Some(&self.config.background));

        if let Some(title) = self.title.as_deref() {
            let measured = surface.measure_text(title, &self.config.title_font, 0.0);
            let at = PixelPoint::new(
                full.center().x - measured.width * 0.5,
                self.config.margin_px,
            );
            surface.draw_text(title, at, &self.config.title_font, self.config.title_color, 0.0);
        }

        self.draw_legend(surface);

        let plot_rect = self.plot_rect;
        surface.set_clip(plot_rect);
        for (index, trace) in self.traces.iter().enumerate() {
            let domain = &self.axes[trace.domain_axis().0];
            let range = &self.axes[trace.range_axis().0];
            trace.draw(surface, domain, range, plot_rect, self.bar_layouts[index])?;
        }
        surface.clear_clip();

        for axis in &self.axes {
            axis.draw(surface, &mut self.tree, plot_rect)?;
        }
        for axis in &self.axes {
            axis.draw_bands(surface, plot_rect);
        }

        if let Some(rect) = self.gestures.zoom_rect() {
            surface.draw_rect(rect, Some(&self.config.zoom_pen), None);
        }
        Ok(())
    }

    fn draw_legend(&self, surface: &mut dyn Surface) {
        for entry in &self.legend_entries {
            let Ok(trace) = self.trace(entry.trace) else {
                continue;
            };
            let swatch = Rect::new(
                entry.rect.x,
                entry.rect.center().y - LEGEND_SWATCH_PX * 0.5,
                LEGEND_SWATCH_PX,
                LEGEND_SWATCH_PX,
            );
            let pen = trace.pen();
            let brush = trace.brush();
            surface.draw_rect(swatch, Some(&pen), Some(&brush));
            surface.draw_text(
                &entry.name,
                PixelPoint::new(swatch.right() + LEGEND_GAP_PX, entry.rect.y),
                &self.config.legend_font,
                pen.color,
                0.0,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::axis::AxisPosition;

    fn chart() -> Chart {
        Chart::new(Viewport::new(800, 600)).unwrap()
    }

    #[test]
    fn unknown_axis_is_an_error() {
        let chart = chart();
        assert!(matches!(
            chart.axis(AxisId(3)),
            Err(ChartError::UnknownAxis(3))
        ));
    }

    #[test]
    fn trace_axes_must_be_perpendicular() {
        let mut chart = chart();
        let bottom = chart.add_axis(Axis::new(AxisPosition::Bottom));
        let top = chart.add_axis(Axis::new(AxisPosition::Top));
        let result = chart.add_trace(Trace::new(
            "t",
            TraceKind::Line { stairs: false },
            bottom,
            top,
        ));
        assert!(matches!(result, Err(ChartError::InvalidData(_))));
    }

    #[test]
    fn time_domain_axis_switches_trace_to_ordered_insert() {
        let mut chart = chart();
        let bottom = chart.add_axis(Axis::time(AxisPosition::Bottom));
        let left = chart.add_axis(Axis::new(AxisPosition::Left));
        let id = chart
            .add_trace(Trace::new(
                "t",
                TraceKind::Line { stairs: false },
                bottom,
                left,
            ))
            .unwrap();
        chart.add_point(id, TracePoint::new(20.0, 1.0)).unwrap();
        chart.add_point(id, TracePoint::new(10.0, 2.0)).unwrap();
        let domains: Vec<f64> = chart
            .trace(id)
            .unwrap()
            .points()
            .iter()
            .map(|point| point.domain)
            .collect();
        assert_eq!(domains, vec![10.0, 20.0]);
    }

    #[test]
    fn state_roundtrip_restores_bounds() {
        let mut chart = chart();
        let bottom = chart.add_axis(Axis::new(AxisPosition::Bottom));
        chart
            .axis_mut(bottom)
            .unwrap()
            .set_explicit_bounds(2.0, 9.0)
            .unwrap();
        let state = chart.state();
        chart
            .axis_mut(bottom)
            .unwrap()
            .set_explicit_bounds(0.0, 1.0)
            .unwrap();
        chart.set_state(&state).unwrap();
        let (min, max) = chart.axis(bottom).unwrap().scale().bounds();
        assert!((min - 2.0).abs() < 1e-12);
        assert!((max - 9.0).abs() < 1e-12);
    }
}
