// File: crates/plot-core/tests/data_range.rs
// Purpose: DataRange1d auto-ranging: contributor union, padding, log fallbacks, follow, freeze/reset.

use std::collections::BTreeMap;

use plot_core::range::{ScaleHint, LOG_DEFAULT_MAX, LOG_DEFAULT_MIN};
use plot_core::types::{PlotId, RendererId};
use plot_core::{BBox, Bounds, DataRange1d, DataRangeConfig, Dimension, Follow, PaddingUnits, Range};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * (1.0 + a.abs().max(b.abs()))
}

fn unpadded() -> DataRange1d {
    DataRange1d::new(DataRangeConfig { range_padding: 0.0, ..DataRangeConfig::default() })
}

fn one(bbox: BBox) -> BTreeMap<RendererId, BBox> {
    BTreeMap::from([(RendererId::fresh(), bbox)])
}

fn y_bounds(y0: f64, y1: f64) -> BBox {
    BBox::new(0.0, y0, 1.0, y1)
}

#[test]
fn union_of_two_contributors_and_detach() {
    let mut r = unpadded();
    let (a, b) = (PlotId::fresh(), PlotId::fresh());
    r.update(&one(y_bounds(0.0, 10.0)), Dimension::Y, a, None);
    r.update(&one(y_bounds(5.0, 20.0)), Dimension::Y, b, None);
    assert_eq!((r.start(), r.end()), (0.0, 20.0));
    assert_eq!(r.contributors().count(), 2);

    assert!(r.detach(b));
    assert!(r.needs_update());
    r.update(&one(y_bounds(0.0, 10.0)), Dimension::Y, a, None);
    assert_eq!((r.start(), r.end()), (0.0, 10.0));
    assert!(!r.needs_update());
}

#[test]
fn contributor_overwrites_its_own_entry() {
    let mut r = unpadded();
    let p = PlotId::fresh();
    r.update(&one(y_bounds(0.0, 10.0)), Dimension::Y, p, None);
    r.update(&one(y_bounds(2.0, 3.0)), Dimension::Y, p, None);
    assert_eq!((r.start(), r.end()), (2.0, 3.0));
    assert_eq!(r.contributors().count(), 1);
}

#[test]
fn default_percent_padding() {
    let mut r = DataRange1d::default();
    r.update(&one(y_bounds(0.0, 10.0)), Dimension::Y, PlotId::fresh(), None);
    assert!(close(r.start(), -0.5), "{}", r.start());
    assert!(close(r.end(), 10.5), "{}", r.end());
}

#[test]
fn absolute_padding() {
    let mut r = DataRange1d::new(DataRangeConfig {
        range_padding: 2.0,
        range_padding_units: PaddingUnits::Absolute,
        ..DataRangeConfig::default()
    });
    r.update(&one(y_bounds(0.0, 10.0)), Dimension::Y, PlotId::fresh(), None);
    assert_eq!((r.start(), r.end()), (-2.0, 12.0));
}

#[test]
fn empty_and_degenerate_inputs_use_default_span() {
    let mut r = DataRange1d::default();
    r.update(&BTreeMap::new(), Dimension::X, PlotId::fresh(), None);
    assert_eq!((r.start(), r.end()), (-1.0, 1.0));

    let mut r = DataRange1d::default();
    r.update(&one(BBox::new(3.0, 0.0, 3.0, 1.0)), Dimension::X, PlotId::fresh(), None);
    assert_eq!((r.start(), r.end()), (2.0, 4.0));
}

#[test]
fn log_fallbacks_when_no_positive_data() {
    let mut r = DataRange1d::new(DataRangeConfig { scale_hint: ScaleHint::Log, ..DataRangeConfig::default() });
    r.update(&BTreeMap::new(), Dimension::Y, PlotId::fresh(), None);
    // Defaults 0.1..10 padded by 10% in log space.
    let span = (LOG_DEFAULT_MAX.log10() - LOG_DEFAULT_MIN.log10()) * 1.1;
    assert!(close(r.start(), 10f64.powf(-span / 2.0)));
    assert!(close(r.end(), 10f64.powf(span / 2.0)));
}

#[test]
fn log_missing_min_derives_from_max() {
    let r = DataRange1d::new(DataRangeConfig {
        scale_hint: ScaleHint::Log,
        range_padding: 0.0,
        ..DataRangeConfig::default()
    });
    let (start, end) = r.compute_range(-5.0, 1000.0);
    assert!(close(start, 10.0));
    assert!(close(end, 1000.0));
}

#[test]
fn log_single_value_spans_default_decades() {
    let r = DataRange1d::new(DataRangeConfig { scale_hint: ScaleHint::Log, ..DataRangeConfig::default() });
    let (start, end) = r.compute_range(100.0, 100.0);
    assert!(close(start, 10f64.powf(2.0 - 2.001 / 2.0)));
    assert!(close(end, 10f64.powf(2.0 + 2.001 / 2.0)));
}

#[test]
fn flipped_swaps_start_and_end() {
    let mut r = DataRange1d::new(DataRangeConfig { range_padding: 0.0, flipped: true, ..DataRangeConfig::default() });
    r.update(&one(y_bounds(0.0, 10.0)), Dimension::Y, PlotId::fresh(), None);
    assert_eq!((r.start(), r.end()), (10.0, 0.0));
    assert!(Range::from(r).is_reversed());
}

#[test]
fn follow_end_keeps_trailing_interval() {
    let mut r = DataRange1d::new(DataRangeConfig {
        range_padding: 0.0,
        follow: Some(Follow::End),
        follow_interval: Some(5.0),
        ..DataRangeConfig::default()
    });
    r.update(&one(y_bounds(0.0, 20.0)), Dimension::Y, PlotId::fresh(), None);
    assert_eq!((r.start(), r.end()), (15.0, 20.0));

    r.config.follow = Some(Follow::Start);
    r.update(&one(y_bounds(0.0, 20.0)), Dimension::Y, PlotId::fresh(), None);
    assert_eq!((r.start(), r.end()), (0.0, 5.0));
}

#[test]
fn follow_unsets_auto_bounds() {
    let mut r = DataRange1d::new(DataRangeConfig {
        follow: Some(Follow::End),
        bounds: Bounds::Auto,
        ..DataRangeConfig::default()
    });
    r.update(&one(y_bounds(0.0, 1.0)), Dimension::Y, PlotId::fresh(), None);
    assert_eq!(r.config.bounds, Bounds::Unbounded);
}

#[test]
fn auto_bounds_mirror_computed_range() {
    let mut r = DataRange1d::new(DataRangeConfig { range_padding: 0.0, bounds: Bounds::Auto, ..DataRangeConfig::default() });
    r.update(&one(y_bounds(2.0, 8.0)), Dimension::Y, PlotId::fresh(), None);
    let range = Range::from(r);
    assert_eq!(range.limits(), (Some(2.0), Some(8.0)));
}

#[test]
fn explicit_start_end_override() {
    let mut r = DataRange1d::new(DataRangeConfig { start: Some(-3.0), range_padding: 0.0, ..DataRangeConfig::default() });
    assert_eq!(r.start(), -3.0);
    r.update(&one(y_bounds(0.0, 10.0)), Dimension::Y, PlotId::fresh(), None);
    assert_eq!((r.start(), r.end()), (-3.0, 10.0));

    // Non-positive explicit values are ignored in log mode.
    let mut r = DataRange1d::new(DataRangeConfig {
        start: Some(0.0),
        range_padding: 0.0,
        scale_hint: ScaleHint::Log,
        ..DataRangeConfig::default()
    });
    r.update(&one(y_bounds(1.0, 100.0)), Dimension::Y, PlotId::fresh(), None);
    assert!(close(r.start(), 1.0));
}

#[test]
fn interactive_update_freezes_until_reset() {
    let mut r = unpadded();
    let p = PlotId::fresh();
    r.update(&one(y_bounds(0.0, 10.0)), Dimension::Y, p, None);
    r.set_interactive(3.0, 4.0);
    assert!(r.have_updated_interactively);
    assert!(!r.update(&one(y_bounds(0.0, 50.0)), Dimension::Y, p, None));
    assert_eq!((r.start(), r.end()), (3.0, 4.0));

    r.reset();
    assert!(!r.have_updated_interactively);
    assert!(r.update(&one(y_bounds(0.0, 50.0)), Dimension::Y, p, None));
    assert_eq!((r.start(), r.end()), (0.0, 50.0));
}

#[test]
fn renderer_subset_filters_contributions() {
    let (keep, skip) = (RendererId::fresh(), RendererId::fresh());
    let mut r = DataRange1d::new(DataRangeConfig {
        range_padding: 0.0,
        renderers: Some(vec![keep]),
        ..DataRangeConfig::default()
    });
    let bounds = BTreeMap::from([(keep, y_bounds(1.0, 2.0)), (skip, y_bounds(-100.0, 100.0))]);
    r.update(&bounds, Dimension::Y, PlotId::fresh(), None);
    assert_eq!((r.start(), r.end()), (1.0, 2.0));
}

#[test]
fn aspect_adjustment_grows_the_narrow_side() {
    let b = DataRange1d::adjust_bounds_for_aspect(&BBox::new(0.0, 0.0, 10.0, 2.0), 1.0);
    assert_eq!(b, BBox::new(0.0, -4.0, 10.0, 6.0));

    let b = DataRange1d::adjust_bounds_for_aspect(&BBox::new(0.0, 0.0, 2.0, 10.0), 2.0);
    assert_eq!(b, BBox::new(-9.0, 0.0, 11.0, 10.0));

    let mut r = unpadded();
    r.update(&one(BBox::new(0.0, 0.0, 10.0, 2.0)), Dimension::Y, PlotId::fresh(), Some(1.0));
    assert_eq!((r.start(), r.end()), (-4.0, 6.0));
}

#[test]
fn revision_bumps_only_on_change() {
    let mut range = Range::from(unpadded());
    let p = PlotId::fresh();
    let r0 = range.revision();
    let dr = range.as_data_mut().map(|d| d.update(&one(y_bounds(0.0, 1.0)), Dimension::Y, p, None));
    assert_eq!(dr, Some(true));
    let r1 = range.revision();
    assert!(r1 > r0);
    let dr = range.as_data_mut().map(|d| d.update(&one(y_bounds(0.0, 1.0)), Dimension::Y, p, None));
    assert_eq!(dr, Some(false));
    assert_eq!(range.revision(), r1);
}
