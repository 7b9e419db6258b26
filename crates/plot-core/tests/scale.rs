// File: crates/plot-core/tests/scale.rs
// Purpose: Linear/log/categorical scale mapping, inversion and degenerate fallbacks.

use plot_core::range::shared;
use plot_core::{FactorRange, Interval, Range1d, Scale, ScaleKind};
use proptest::prelude::*;

fn linear(start: f64, end: f64, t0: f64, t1: f64) -> Scale {
    Scale::new(ScaleKind::Linear, shared(Range1d::new(start, end)), Interval::new(t0, t1))
}

fn log(start: f64, end: f64, t0: f64, t1: f64) -> Scale {
    Scale::new(ScaleKind::Log, shared(Range1d::new(start, end)), Interval::new(t0, t1))
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * (1.0 + a.abs().max(b.abs()))
}

proptest! {
    #[test]
    fn linear_invert_round_trips(
        start in -1e6f64..1e6,
        width in 1e-3f64..1e6,
        t0 in -2000f64..2000.0,
        t_width in 1.0f64..4000.0,
        flip in any::<bool>(),
        x in -1e6f64..1e6,
    ) {
        let (t0, t1) = if flip { (t0 + t_width, t0) } else { (t0, t0 + t_width) };
        let s = linear(start, start + width, t0, t1);
        let back = s.invert(s.compute(x));
        prop_assert!((back - x).abs() <= 1e-6 * (1.0 + x.abs()) * (1.0 + width.recip()), "x={x} back={back}");
    }

    #[test]
    fn r_compute_and_r_invert_round_trip(
        start in -1e3f64..1e3,
        width in 0.5f64..1e3,
        a in -1e3f64..1e3,
        b in -1e3f64..1e3,
        reversed in any::<bool>(),
    ) {
        let (t0, t1) = if reversed { (500.0, 100.0) } else { (100.0, 500.0) };
        let s = linear(start, start + width, t0, t1);
        let (sx0, sx1) = s.r_compute(a, b);
        let (x0, x1) = s.r_invert(sx0, sx1);
        prop_assert!(close(x0, a) && close(x1, b), "({a},{b}) -> ({sx0},{sx1}) -> ({x0},{x1})");
    }

    #[test]
    fn log_is_monotonic(
        lo in 1e-3f64..1e3,
        decades in 0.1f64..6.0,
        x1 in 1e-4f64..1e8,
        x2 in 1e-4f64..1e8,
    ) {
        let s = log(lo, lo * 10f64.powf(decades), 0.0, 400.0);
        let (a, b) = (x1.min(x2), x1.max(x2));
        prop_assert!(s.compute(a) <= s.compute(b));
    }

    #[test]
    fn log_maps_endpoints_to_target(lo in 1e-3f64..1e3, decades in 0.1f64..6.0) {
        let hi = lo * 10f64.powf(decades);
        let s = log(lo, hi, 20.0, 620.0);
        prop_assert!(close(s.compute(lo), 20.0));
        prop_assert!(close(s.compute(hi), 620.0));
    }
}

#[test]
fn degenerate_linear_source_maps_to_target_middle() {
    let s = linear(5.0, 5.0, 0.0, 100.0);
    assert_eq!(s.compute(5.0), 50.0);
    assert_eq!(s.compute(-3.0), 50.0);
    assert_eq!(s.invert(10.0), 5.0);
}

#[test]
fn log_of_non_positive_is_nan() {
    let s = log(1.0, 100.0, 0.0, 200.0);
    assert!(s.compute(0.0).is_nan());
    assert!(s.compute(-1.0).is_nan());
    assert!(close(s.compute(10.0), 100.0));
}

#[test]
fn log_degenerate_source_expands_to_decades() {
    // 50 sits between 10 and 100: the source becomes [10, 100].
    let s = log(50.0, 50.0, 0.0, 100.0);
    assert!(close(s.compute(10.0), 0.0));
    assert!(close(s.compute(100.0), 100.0));

    // Exact power of ten: [100, 1000].
    let s = log(100.0, 100.0, 0.0, 100.0);
    assert!(close(s.compute(100.0), 0.0));
    assert!(close(s.compute(1000.0), 100.0));

    // Zero collapses to [1, 10].
    let s = log(0.0, 0.0, 0.0, 100.0);
    assert!(close(s.compute(1.0), 0.0));
    assert!(close(s.compute(10.0), 100.0));
}

#[test]
fn reversed_range_flips_mapping() {
    let s = linear(10.0, 0.0, 0.0, 100.0);
    assert!(close(s.compute(10.0), 0.0));
    assert!(close(s.compute(0.0), 100.0));
    let (a, b) = s.r_compute(0.0, 10.0);
    assert!(close(a, 100.0) && close(b, 0.0));
}

#[test]
fn reversed_target_r_compute_is_ascending() {
    // y-style target: bottom (400) -> top (0).
    let s = linear(0.0, 10.0, 400.0, 0.0);
    let (a, b) = s.r_compute(0.0, 10.0);
    assert!(close(a, 0.0) && close(b, 400.0));
}

#[test]
fn categorical_factors_map_to_cell_centres() {
    let range = shared(FactorRange::new(["a", "b", "c"]));
    let s = Scale::new(ScaleKind::Categorical, range, Interval::new(0.0, 300.0));
    assert!(close(s.compute_factor("a").unwrap_or(f64::NAN), 50.0));
    assert!(close(s.compute_factor("c").unwrap_or(f64::NAN), 250.0));
    assert_eq!(s.compute_factor("zzz"), None);

    let v = s.v_compute_factors(&["b", "nope"]);
    assert!(close(v[0], 150.0));
    assert!(v[1].is_nan());
}

#[test]
fn factor_padding_spaces_cells() {
    let fr = FactorRange::with_padding(["a", "b"], 0.5, 0.0, plot_core::PaddingUnits::Percent);
    assert_eq!(fr.synthetic("a"), Some(0.5));
    assert_eq!(fr.synthetic("b"), Some(2.0));
    assert_eq!(fr.start(), 0.0);
    assert_eq!(fr.end(), 2.5);
    assert_eq!(fr.synthetic_with_offset("b", -0.25), Some(1.75));
}

#[test]
fn scale_tracks_range_changes_without_rebuild() {
    let range = shared(Range1d::new(0.0, 10.0));
    let s = Scale::new(ScaleKind::Linear, range.clone(), Interval::new(0.0, 100.0));
    assert!(close(s.compute(5.0), 50.0));
    range.borrow_mut().set_interactive(0.0, 20.0);
    assert!(close(s.compute(5.0), 25.0));
}
