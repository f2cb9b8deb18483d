use approx::assert_relative_eq;
use traceplot::Chart;
use traceplot::chart::trace::BarLayout;
use traceplot::chart::{Axis, AxisId, AxisPosition, Threshold, Trace, TraceKind, TracePoint};
use traceplot::core::types::{Rect, Viewport};
use traceplot::render::{Brush, Color, DrawCommand, Pen, RecordingSurface};

fn fixture(range_min: f64, range_max: f64) -> (Chart, AxisId, AxisId) {
    let mut chart = Chart::new(Viewport::new(400, 300)).expect("chart");
    let bottom = chart.add_axis(Axis::new(AxisPosition::Bottom));
    let left = chart.add_axis(Axis::new(AxisPosition::Left));
    {
        let axis = chart.axis_mut(bottom).expect("axis");
        axis.scale_mut().set_bounds(0.0, 10.0);
        axis.scale_mut().set_size_px(100.0).expect("size");
        axis.set_screen_origin_px(0.0);
    }
    {
        let axis = chart.axis_mut(left).expect("axis");
        axis.scale_mut().set_bounds(range_min, range_max);
        axis.scale_mut().set_size_px(100.0).expect("size");
        axis.set_screen_origin_px(0.0);
    }
    (chart, bottom, left)
}

fn layout(width_px: f64, slot: usize, slot_count: usize) -> BarLayout {
    BarLayout {
        width_px,
        slot,
        slot_count,
        overlap: false,
    }
}

fn fill_rects(surface: &RecordingSurface) -> Vec<Rect> {
    surface
        .commands()
        .iter()
        .filter_map(|command| match command {
            DrawCommand::Rect {
                rect,
                pen: None,
                brush: Some(_),
            } => Some(*rect),
            _ => None,
        })
        .collect()
}

#[test]
fn bar_spans_from_baseline_to_value() {
    let (chart, bottom, left) = fixture(0.0, 10.0);
    let mut trace = Trace::new("bars", TraceKind::Bar, bottom, left);
    trace.add_point(TracePoint::new(5.0, 4.0));

    let mut surface = RecordingSurface::new();
    trace
        .draw(
            &mut surface,
            chart.axis(bottom).expect("axis"),
            chart.axis(left).expect("axis"),
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Some(layout(10.0, 0, 1)),
        )
        .expect("draw");

    let fills = fill_rects(&surface);
    assert_eq!(fills.len(), 1);
    // Value 4 sits at y=60; the baseline (value 0) at y=100.
    assert_relative_eq!(fills[0].x, 45.0, epsilon = 1e-9);
    assert_relative_eq!(fills[0].y, 60.0, epsilon = 1e-9);
    assert_relative_eq!(fills[0].width, 10.0, epsilon = 1e-9);
    assert_relative_eq!(fills[0].height, 40.0, epsilon = 1e-9);
}

#[test]
fn bar_border_is_inset_by_half_pen_width() {
    let (chart, bottom, left) = fixture(0.0, 10.0);
    let mut trace = Trace::new("bars", TraceKind::Bar, bottom, left);
    trace.set_pen(Pen::new(Color::BLACK, 1.0));
    trace.add_point(TracePoint::new(5.0, 4.0));

    let mut surface = RecordingSurface::new();
    trace
        .draw(
            &mut surface,
            chart.axis(bottom).expect("axis"),
            chart.axis(left).expect("axis"),
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Some(layout(10.0, 0, 1)),
        )
        .expect("draw");

    let border = surface
        .commands()
        .iter()
        .find_map(|command| match command {
            DrawCommand::Rect {
                rect,
                pen: Some(_),
                brush: None,
            } => Some(*rect),
            _ => None,
        })
        .expect("border rect");
    assert_relative_eq!(border.x, 45.5, epsilon = 1e-9);
    assert_relative_eq!(border.width, 9.0, epsilon = 1e-9);
}

#[test]
fn side_by_side_slots_offset_around_the_tick() {
    let (chart, bottom, left) = fixture(0.0, 10.0);
    let mut first = Trace::new("a", TraceKind::Bar, bottom, left);
    first.add_point(TracePoint::new(5.0, 4.0));
    let mut second = Trace::new("b", TraceKind::Bar, bottom, left);
    second.add_point(TracePoint::new(5.0, 6.0));

    let mut surface = RecordingSurface::new();
    for (trace, slot) in [(&first, 0), (&second, 1)] {
        trace
            .draw(
                &mut surface,
                chart.axis(bottom).expect("axis"),
                chart.axis(left).expect("axis"),
                Rect::new(0.0, 0.0, 100.0, 100.0),
                Some(layout(5.0, slot, 2)),
            )
            .expect("draw");
    }

    let fills = fill_rects(&surface);
    assert_eq!(fills.len(), 2);
    // Slots center the 2x5px group on the tick at x=50.
    assert_relative_eq!(fills[0].x, 45.0, epsilon = 1e-9);
    assert_relative_eq!(fills[1].x, 50.0, epsilon = 1e-9);
}

#[test]
fn negative_bar_hangs_below_the_baseline() {
    let (chart, bottom, left) = fixture(-10.0, 10.0);
    let mut trace = Trace::new("bars", TraceKind::Bar, bottom, left);
    trace.add_point(TracePoint::new(5.0, -4.0));

    let mut surface = RecordingSurface::new();
    trace
        .draw(
            &mut surface,
            chart.axis(bottom).expect("axis"),
            chart.axis(left).expect("axis"),
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Some(layout(10.0, 0, 1)),
        )
        .expect("draw");

    let fills = fill_rects(&surface);
    // Baseline at y=50, value -4 at y=70.
    assert_relative_eq!(fills[0].y, 50.0, epsilon = 1e-9);
    assert_relative_eq!(fills[0].height, 20.0, epsilon = 1e-9);
}

#[test]
fn bars_without_layout_are_skipped() {
    let (chart, bottom, left) = fixture(0.0, 10.0);
    let mut trace = Trace::new("bars", TraceKind::Bar, bottom, left);
    trace.add_point(TracePoint::new(5.0, 4.0));

    let mut surface = RecordingSurface::new();
    trace
        .draw(
            &mut surface,
            chart.axis(bottom).expect("axis"),
            chart.axis(left).expect("axis"),
            Rect::new(0.0, 0.0, 100.0, 100.0),
            None,
        )
        .expect("draw");
    assert!(fill_rects(&surface).is_empty());
}

#[test]
fn threshold_brush_recolors_tall_bars() {
    let (chart, bottom, left) = fixture(0.0, 10.0);
    let mut trace = Trace::new("bars", TraceKind::Bar, bottom, left);
    let alert = Brush::new(Color::rgb(1.0, 0.0, 0.0));
    trace.set_brush(Brush::new(Color::rgb(0.0, 0.0, 1.0)));
    trace.set_threshold_high(Some(Threshold {
        value: 3.0,
        pen: Pen::default(),
        brush: Some(alert),
    }));
    trace.add_point(TracePoint::new(2.0, 2.0));
    trace.add_point(TracePoint::new(5.0, 4.0));

    let mut surface = RecordingSurface::new();
    trace
        .draw(
            &mut surface,
            chart.axis(bottom).expect("axis"),
            chart.axis(left).expect("axis"),
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Some(layout(10.0, 0, 1)),
        )
        .expect("draw");

    let brushes: Vec<Brush> = surface
        .commands()
        .iter()
        .filter_map(|command| match command {
            DrawCommand::Rect {
                pen: None,
                brush: Some(brush),
                ..
            } => Some(*brush),
            _ => None,
        })
        .collect();
    assert_eq!(brushes.len(), 2);
    assert_eq!(brushes[0], trace.brush());
    assert_eq!(brushes[1], alert);
}

#[test]
fn area_fill_splits_at_the_baseline() {
    let (chart, bottom, left) = fixture(-10.0, 10.0);
    let mut trace = Trace::new("area", TraceKind::Area, bottom, left);
    let below = Brush::new(Color::rgb(0.8, 0.2, 0.2));
    trace.set_brush(Brush::new(Color::rgb(0.2, 0.2, 0.8)));
    trace.set_below_brush(Some(below));
    trace.add_point(TracePoint::new(0.0, 5.0));
    trace.add_point(TracePoint::new(10.0, -5.0));

    let mut surface = RecordingSurface::new();
    trace
        .draw(
            &mut surface,
            chart.axis(bottom).expect("axis"),
            chart.axis(left).expect("axis"),
            Rect::new(0.0, 0.0, 100.0, 100.0),
            None,
        )
        .expect("draw");

    let polygons: Vec<(Vec<_>, Brush)> = surface
        .commands()
        .iter()
        .filter_map(|command| match command {
            DrawCommand::Polygon {
                points,
                brush: Some(brush),
                ..
            } => Some((points.clone(), *brush)),
            _ => None,
        })
        .collect();
    assert_eq!(polygons.len(), 2);

    // Both fills meet at the baseline crossing (50, 50).
    assert!(polygons[0].0.iter().any(|p| (p.x - 50.0).abs() < 1e-9 && (p.y - 50.0).abs() < 1e-9));
    assert!(polygons[1].0.iter().any(|p| (p.x - 50.0).abs() < 1e-9 && (p.y - 50.0).abs() < 1e-9));
    assert_eq!(polygons[0].1, trace.brush());
    assert_eq!(polygons[1].1, below);
}

#[test]
fn area_without_below_brush_reuses_main_brush() {
    let (chart, bottom, left) = fixture(-10.0, 10.0);
    let mut trace = Trace::new("area", TraceKind::Area, bottom, left);
    trace.add_point(TracePoint::new(0.0, 5.0));
    trace.add_point(TracePoint::new(10.0, -5.0));

    let mut surface = RecordingSurface::new();
    trace
        .draw(
            &mut surface,
            chart.axis(bottom).expect("axis"),
            chart.axis(left).expect("axis"),
            Rect::new(0.0, 0.0, 100.0, 100.0),
            None,
        )
        .expect("draw");

    let brushes: Vec<Brush> = surface
        .commands()
        .iter()
        .filter_map(|command| match command {
            DrawCommand::Polygon {
                brush: Some(brush), ..
            } => Some(*brush),
            _ => None,
        })
        .collect();
    assert_eq!(brushes, vec![trace.brush(), trace.brush()]);
}

#[test]
fn chart_layout_gives_sibling_bars_equal_width() {
    let mut chart = Chart::new(Viewport::new(800, 600)).expect("chart");
    let bottom = chart.add_axis(Axis::new(AxisPosition::Bottom));
    let left = chart.add_axis(Axis::new(AxisPosition::Left));

    let mut first = Trace::new("a", TraceKind::Bar, bottom, left);
    let mut second = Trace::new("b", TraceKind::Bar, bottom, left);
    for domain in 0..5 {
        first.add_point(TracePoint::new(f64::from(domain), 2.0));
        second.add_point(TracePoint::new(f64::from(domain), 3.0));
    }
    chart.add_trace(first).expect("trace");
    chart.add_trace(second).expect("trace");

    let mut surface = RecordingSurface::new();
    chart.draw(&mut surface).expect("draw");

    let widths: Vec<f64> = surface
        .commands()
        .iter()
        .filter_map(|command| match command {
            DrawCommand::Rect {
                rect,
                pen: None,
                brush: Some(brush),
            } if *brush == Brush::default() && rect.height > 0.0 && rect.width < 100.0 => {
                Some(rect.width)
            }
            _ => None,
        })
        .collect();
    assert_eq!(widths.len(), 10, "five bars per trace");
    for width in &widths {
        assert_relative_eq!(*width, widths[0], epsilon = 1e-9);
        assert!(*width > 0.0);
    }
}
