use proptest::prelude::*;
use traceplot::Chart;
use traceplot::chart::trace::{project_point, split_threshold_segments};
use traceplot::chart::{Axis, AxisId, AxisPosition, Threshold, TracePoint};
use traceplot::core::types::Viewport;
use traceplot::render::{Color, Pen};

fn fixture() -> (Chart, AxisId, AxisId) {
    let mut chart = Chart::new(Viewport::new(400, 300)).expect("chart");
    let bottom = chart.add_axis(Axis::new(AxisPosition::Bottom));
    let left = chart.add_axis(Axis::new(AxisPosition::Left));
    for id in [bottom, left] {
        let axis = chart.axis_mut(id).expect("axis");
        axis.scale_mut().set_bounds(-20.0, 30.0);
        axis.scale_mut().set_size_px(100.0).expect("size");
        axis.set_screen_origin_px(0.0);
    }
    (chart, bottom, left)
}

proptest! {
    #[test]
    fn threshold_segments_tile_the_original_segment(
        d0 in -10.0_f64..20.0,
        d1 in -10.0_f64..20.0,
        v0 in -10.0_f64..20.0,
        v1 in -10.0_f64..20.0,
    ) {
        prop_assume!((d1 - d0).abs() > 1e-6);
        let (chart, bottom, left) = fixture();
        let domain = chart.axis(bottom).expect("axis");
        let range = chart.axis(left).expect("axis");

        let base = Pen::default();
        let high = Threshold {
            value: 5.0,
            pen: Pen::new(Color::rgb(1.0, 0.0, 0.0), 1.0),
            brush: None,
        };
        let low = Threshold {
            value: 2.0,
            pen: Pen::new(Color::rgb(0.0, 0.0, 1.0), 1.0),
            brush: None,
        };

        let from = project_point(TracePoint::new(d0, v0), domain, range).expect("from");
        let to = project_point(TracePoint::new(d1, v1), domain, range).expect("to");
        let segments = split_threshold_segments(
            from, to, v0, v1, base, Some(high), Some(low), range, true,
        );

        prop_assert!(!segments.is_empty());
        prop_assert!(segments.len() <= 3);
        prop_assert!((segments[0].from.x - from.x).abs() < 1e-9);
        prop_assert!((segments[0].from.y - from.y).abs() < 1e-9);
        let last = segments[segments.len() - 1];
        prop_assert!((last.to.x - to.x).abs() < 1e-9);
        prop_assert!((last.to.y - to.y).abs() < 1e-9);
        for pair in segments.windows(2) {
            prop_assert!((pair[0].to.x - pair[1].from.x).abs() < 1e-9);
            prop_assert!((pair[0].to.y - pair[1].from.y).abs() < 1e-9);
        }
    }

    #[test]
    fn segment_wholly_on_one_side_keeps_one_pen(
        d0 in -10.0_f64..20.0,
        d1 in -10.0_f64..20.0,
        v0 in 6.0_f64..20.0,
        v1 in 6.0_f64..20.0,
    ) {
        prop_assume!((d1 - d0).abs() > 1e-6);
        let (chart, bottom, left) = fixture();
        let domain = chart.axis(bottom).expect("axis");
        let range = chart.axis(left).expect("axis");

        let high_pen = Pen::new(Color::rgb(1.0, 0.0, 0.0), 1.0);
        let high = Threshold { value: 5.0, pen: high_pen, brush: None };

        let from = project_point(TracePoint::new(d0, v0), domain, range).expect("from");
        let to = project_point(TracePoint::new(d1, v1), domain, range).expect("to");
        let segments = split_threshold_segments(
            from, to, v0, v1, Pen::default(), Some(high), None, range, true,
        );

        prop_assert_eq!(segments.len(), 1);
        prop_assert_eq!(segments[0].pen, high_pen);
    }
}
