// File: crates/plot-core/tests/frame.rs
// Purpose: Frame registry: named ranges, scale compatibility, retargeting and screen mapping.

use plot_core::range::{shared, ScaleHint};
use plot_core::{CartesianFrame, DataRange1d, Dimension, FactorRange, LayoutBox, PlotError, Range1d, ScaleKind, DEFAULT};

fn frame_0_10() -> CartesianFrame {
    let mut f = CartesianFrame::new(
        shared(Range1d::new(0.0, 10.0)),
        shared(Range1d::new(0.0, 10.0)),
        ScaleKind::Linear,
        ScaleKind::Linear,
    )
    .expect("frame");
    f.set_bbox(LayoutBox::new(50.0, 20.0, 500.0, 300.0));
    f
}

#[test]
fn y_target_runs_bottom_to_top() {
    let f = frame_0_10();
    let (sx, sy) = f.map_to_screen(&[0.0, 10.0], &[0.0, 10.0], DEFAULT, DEFAULT).expect("map");
    assert_eq!(sx, vec![50.0, 550.0]);
    assert_eq!(sy, vec![320.0, 20.0]);

    let (x, y) = f.map_from_screen(&[300.0], &[170.0], DEFAULT, DEFAULT).expect("invert");
    assert!((x[0] - 5.0).abs() < 1e-9 && (y[0] - 5.0).abs() < 1e-9);
}

#[test]
fn set_bbox_retargets_every_scale() {
    let mut f = frame_0_10();
    f.add_x_range("extra", shared(Range1d::new(100.0, 200.0))).expect("extra");
    f.set_bbox(LayoutBox::new(0.0, 0.0, 100.0, 100.0));
    let s = f.x_scale("extra").expect("scale");
    assert_eq!(s.compute(150.0), 50.0);
    assert_eq!(f.y_target().start, 100.0);
    assert_eq!(f.y_target().end, 0.0);
}

#[test]
fn unknown_range_names_are_errors() {
    let f = frame_0_10();
    assert!(matches!(f.x_scale("nope"), Err(PlotError::UnknownRange { axis: "x", .. })));
    assert!(matches!(f.range(Dimension::Y, "nope"), Err(PlotError::UnknownRange { axis: "y", .. })));
    assert!(f.map_to_screen(&[1.0], &[1.0], DEFAULT, "nope").is_err());
}

#[test]
fn categorical_pairing_is_checked() {
    let err = CartesianFrame::new(
        shared(FactorRange::new(["a", "b"])),
        shared(Range1d::new(0.0, 1.0)),
        ScaleKind::Linear,
        ScaleKind::Linear,
    );
    assert!(matches!(err, Err(PlotError::IncompatibleScale { axis: "x", range_kind: "FactorRange", .. })));

    let err = CartesianFrame::new(
        shared(Range1d::new(0.0, 1.0)),
        shared(Range1d::new(0.0, 1.0)),
        ScaleKind::Linear,
        ScaleKind::Categorical,
    );
    assert!(matches!(err, Err(PlotError::IncompatibleScale { axis: "y", range_kind: "Range1d", .. })));

    let ok = CartesianFrame::new(
        shared(FactorRange::new(["a", "b"])),
        shared(Range1d::new(0.0, 1.0)),
        ScaleKind::Categorical,
        ScaleKind::Linear,
    );
    assert!(ok.is_ok());
}

#[test]
fn log_scale_marks_data_range_hint() {
    let y = shared(DataRange1d::default());
    let _f = CartesianFrame::new(shared(Range1d::new(0.0, 1.0)), y.clone(), ScaleKind::Linear, ScaleKind::Log).expect("frame");
    let hint = y.borrow().as_data().map(|d| d.config.scale_hint);
    assert_eq!(hint, Some(ScaleHint::Log));
}

#[test]
fn per_name_scale_override() {
    let mut f = frame_0_10();
    f.add_y_range_with_scale("log", shared(Range1d::new(1.0, 1000.0)), ScaleKind::Log).expect("log");
    assert_eq!(f.y_scale("log").expect("scale").kind(), ScaleKind::Log);
    assert_eq!(f.y_scale(DEFAULT).expect("scale").kind(), ScaleKind::Linear);
    let sy = f.y_scale("log").expect("scale").compute(10.0);
    // One decade of three: a third of the way up from the bottom (320).
    assert!((sy - (320.0 - 100.0)).abs() < 1e-9, "{sy}");
    assert_eq!(f.y_ranges().count(), 2);
}

#[test]
fn ranges_revision_moves_with_any_range() {
    let f = frame_0_10();
    let before = f.ranges_revision();
    f.x_range(DEFAULT).expect("x").borrow_mut().set_interactive(1.0, 2.0);
    assert!(f.ranges_revision() > before);
}

#[test]
fn shared_range_moves_both_frames() {
    let x = shared(Range1d::new(0.0, 10.0));
    let mut a = CartesianFrame::new(x.clone(), shared(Range1d::new(0.0, 1.0)), ScaleKind::Linear, ScaleKind::Linear).expect("a");
    let mut b = CartesianFrame::new(x.clone(), shared(Range1d::new(0.0, 1.0)), ScaleKind::Linear, ScaleKind::Linear).expect("b");
    a.set_bbox(LayoutBox::new(0.0, 0.0, 100.0, 100.0));
    b.set_bbox(LayoutBox::new(0.0, 0.0, 200.0, 100.0));
    x.borrow_mut().set_interactive(0.0, 20.0);
    assert_eq!(a.x_scale(DEFAULT).expect("a").compute(10.0), 50.0);
    assert_eq!(b.x_scale(DEFAULT).expect("b").compute(10.0), 100.0);
}
