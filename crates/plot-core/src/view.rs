// File: crates/plot-core/src/view.rs
// Summary: Interactive navigation over a frame's ranges: pan, zoom and range snapshots.
// Notes:
// - Gestures are expressed in screen pixels and inverted through each range's
//   scale, so log and categorical axes pan/zoom consistently.
// - Writes go through `Range::set_interactive`, which freezes auto-ranging.

use std::collections::BTreeMap;

use crate::frame::CartesianFrame;
use crate::range::{Range, RangeRef};
use crate::scale::Scale;
use crate::types::Dimension;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gesture {
    Pan,
    Zoom,
}

/// Start/end of every named range on both axes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RangeState {
    pub x: BTreeMap<String, (f64, f64)>,
    pub y: BTreeMap<String, (f64, f64)>,
}

impl RangeState {
    pub fn capture(frame: &CartesianFrame) -> Self {
        Self { x: snapshot(frame.x_ranges()), y: snapshot(frame.y_ranges()) }
    }

    /// Write the snapshot back; names the frame does not know are skipped.
    pub fn apply(&self, frame: &CartesianFrame) -> bool {
        let mut changed = false;
        for (dim, map) in [(Dimension::X, &self.x), (Dimension::Y, &self.y)] {
            for (name, &(start, end)) in map {
                let Ok(range) = frame.range(dim, name) else { continue };
                let mut r = range.borrow_mut();
                if r.start() != start || r.end() != end {
                    r.set_interactive(start, end);
                    changed = true;
                }
            }
        }
        changed
    }
}

fn snapshot<'a>(ranges: impl Iterator<Item = (&'a String, &'a RangeRef)>) -> BTreeMap<String, (f64, f64)> {
    ranges
        .map(|(name, r)| {
            let r = r.borrow();
            (name.clone(), (r.start(), r.end()))
        })
        .collect()
}

/// Fit a proposed interval into the range's interval and bound limits, keeping
/// its orientation. `None` rejects the update (interval limits violated).
pub fn constrain(range: &Range, start: f64, end: f64, gesture: Gesture) -> Option<(f64, f64)> {
    if !(start.is_finite() && end.is_finite()) {
        return None;
    }
    let (mut lo, mut hi) = (start.min(end), start.max(end));
    let span = hi - lo;
    let (min_interval, max_interval) = range.intervals();
    if min_interval.is_some_and(|m| span < m) || max_interval.is_some_and(|m| span > m) {
        return None;
    }
    let (bmin, bmax) = range.limits();
    match gesture {
        Gesture::Pan => {
            if let Some(m) = bmin.filter(|&m| lo < m) {
                hi += m - lo;
                lo = m;
            }
            if let Some(m) = bmax.filter(|&m| hi > m) {
                lo -= hi - m;
                hi = m;
            }
            if let Some(m) = bmin {
                lo = lo.max(m);
            }
        }
        Gesture::Zoom => {
            if let Some(m) = bmin {
                lo = lo.max(m);
            }
            if let Some(m) = bmax {
                hi = hi.min(m);
            }
        }
    }
    Some(if range.is_reversed() { (hi, lo) } else { (lo, hi) })
}

/// Screen interval of the scale's target, ascending.
fn screen_span(scale: &Scale) -> (f64, f64) {
    let t = scale.target();
    (t.start.min(t.end), t.start.max(t.end))
}

fn propose(scale: &Scale, sx0: f64, sx1: f64, gesture: Gesture) -> Option<(RangeRef, (f64, f64))> {
    let (start, end) = scale.r_invert(sx0, sx1);
    let range = scale.source().clone();
    let fitted = constrain(&range.borrow(), start, end, gesture)?;
    Some((range, fitted))
}

fn apply_all(proposals: Vec<(RangeRef, (f64, f64))>) -> bool {
    let mut changed = false;
    for (range, (start, end)) in proposals {
        let mut r = range.borrow_mut();
        if r.start() != start || r.end() != end {
            r.set_interactive(start, end);
            changed = true;
        }
    }
    changed
}

fn scales(frame: &CartesianFrame, dim: Dimension) -> Vec<&Scale> {
    let names: Vec<String> = match dim {
        Dimension::X => frame.x_ranges().map(|(n, _)| n.clone()).collect(),
        Dimension::Y => frame.y_ranges().map(|(n, _)| n.clone()).collect(),
    };
    names.iter().filter_map(|n| frame.scale(dim, n).ok()).collect()
}

/// Drag the content by `(dx, dy)` pixels. Ranges that would violate their
/// interval limits are left alone; bounded ranges stop at their bounds.
pub fn pan_by_pixels(frame: &CartesianFrame, dx: f64, dy: f64) -> bool {
    let mut proposals = Vec::new();
    for (dim, d) in [(Dimension::X, dx), (Dimension::Y, dy)] {
        if d == 0.0 {
            continue;
        }
        for scale in scales(frame, dim) {
            let (s0, s1) = screen_span(scale);
            proposals.extend(propose(scale, s0 - d, s1 - d, Gesture::Pan));
        }
    }
    apply_all(proposals)
}

/// Zoom around the pixel `(sx, sy)`. Positive `factor` zooms in (0.1 narrows
/// every range by 10 percent). The whole gesture is dropped if any range
/// would leave its interval limits, so axes stay in proportion.
pub fn zoom_at_pixel(frame: &CartesianFrame, factor: f64, sx: f64, sy: f64) -> bool {
    if !factor.is_finite() || factor >= 1.0 {
        return false;
    }
    let mut proposals = Vec::new();
    for (dim, anchor) in [(Dimension::X, sx), (Dimension::Y, sy)] {
        for scale in scales(frame, dim) {
            let (s0, s1) = screen_span(scale);
            let a = anchor.clamp(s0, s1);
            let n0 = s0 - (s0 - a) * factor;
            let n1 = s1 - (s1 - a) * factor;
            match propose(scale, n0, n1, Gesture::Zoom) {
                Some(p) => proposals.push(p),
                None => return false,
            }
        }
    }
    apply_all(proposals)
}
