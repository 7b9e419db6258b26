// File: crates/plot-core/tests/guide.rs
// Purpose: Axis tick generation, including ranges finer than the float resolution at their magnitude.

use plot_core::guide::{log_ticks, nice_ticks};
use plot_core::range::shared;
use plot_core::{
    AxisView, CartesianFrame, Dimension, Insets, LayoutBox, PlotOptions, PlotView, Range1d, RendererView, ScaleKind,
};

#[test]
fn nice_ticks_use_round_steps() {
    let (ticks, step) = nice_ticks(0.0, 10.0, 5);
    assert_eq!(step, 2.0);
    assert_eq!(ticks, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);

    let (ticks, step) = nice_ticks(-30.0, 30.0, 6);
    assert_eq!(step, 10.0);
    assert_eq!(ticks.len(), 7);
    assert!(ticks.contains(&0.0));
}

#[test]
fn huge_magnitude_narrow_span_yields_single_tick() {
    let (ticks, _) = nice_ticks(1e16, 1e16 + 2.0, 6);
    assert_eq!(ticks, vec![1e16]);
}

#[test]
fn deep_zoom_below_resolution_yields_single_tick() {
    let (ticks, _) = nice_ticks(1000.0, 1000.0 + 3e-13, 6);
    assert_eq!(ticks.len(), 1);
    assert_eq!(ticks[0], 1000.0);
}

#[test]
fn tick_count_is_bounded() {
    for (lo, hi) in [(0.0, 1.0), (1e-300, 1e-299), (-1e300, 1e300), (123.456, 123.457)] {
        let (ticks, _) = nice_ticks(lo, hi, 6);
        assert!(!ticks.is_empty() && ticks.len() <= 24, "{lo} {hi}: {}", ticks.len());
    }
    assert!(nice_ticks(f64::NAN, 1.0, 6).0.is_empty());
}

#[test]
fn log_ticks_prefer_decades() {
    assert_eq!(log_ticks(1.0, 500.0, 6), vec![1.0, 10.0, 100.0]);
    assert!(!log_ticks(2.0, 3.0, 6).is_empty());
}

#[test]
fn axis_over_unresolvable_range_still_paints() {
    let x = shared(Range1d::new(1e16, 1e16 + 2.0));
    let mut frame = CartesianFrame::new(x.clone(), shared(Range1d::new(0.0, 1.0)), ScaleKind::Linear, ScaleKind::Linear)
        .expect("frame");
    frame.set_bbox(LayoutBox::new(0.0, 0.0, 200.0, 100.0));
    let mut axis = AxisView::new(Dimension::X);
    axis.update_panel(&frame).expect("ticks");
    assert_eq!(axis.ticks().len(), 1);

    let opts = PlotOptions { width: 200, height: 120, min_border: Insets::uniform(5), ..PlotOptions::default() };
    let mut pv = PlotView::new(opts, x, shared(Range1d::new(0.0, 1.0)), ScaleKind::Linear, ScaleKind::Linear)
        .expect("plot");
    pv.add_renderer(AxisView::new(Dimension::X));
    pv.paint().expect("paint");
    assert_eq!(pv.paint_count(), 1);
}
