// File: crates/plot-core/src/frame.rs
// Summary: Cartesian frame: named x/y ranges, their scales, and the frame's pixel box.
// Notes:
// - Every frame has a range named `DEFAULT` on each axis.
// - Scale targets are rebuilt whenever the box changes; the y target runs
//   bottom -> top so larger data values sit higher on screen.

use std::collections::BTreeMap;

use crate::error::{PlotError, Result};
use crate::geometry::LayoutBox;
use crate::range::{RangeRef, ScaleHint};
use crate::scale::{Interval, Scale, ScaleKind};
use crate::types::Dimension;

pub const DEFAULT: &str = "default";

#[derive(Debug)]
struct Axis {
    name: &'static str,
    default_kind: ScaleKind,
    ranges: BTreeMap<String, RangeRef>,
    scales: BTreeMap<String, Scale>,
}

impl Axis {
    fn new(name: &'static str, default_kind: ScaleKind) -> Self {
        Self { name, default_kind, ranges: BTreeMap::new(), scales: BTreeMap::new() }
    }

    fn insert(&mut self, name: &str, range: RangeRef, kind: ScaleKind, target: Interval) -> Result<()> {
        {
            let mut r = range.borrow_mut();
            if r.is_categorical() != kind.accepts_categorical() {
                return Err(PlotError::IncompatibleScale {
                    axis: self.name,
                    name: name.to_string(),
                    range_kind: r.kind_name(),
                    scale: kind,
                });
            }
            if let Some(dr) = r.as_data_mut() {
                dr.config.scale_hint = if kind == ScaleKind::Log { ScaleHint::Log } else { ScaleHint::Auto };
            }
        }
        self.scales.insert(name.to_string(), Scale::new(kind, range.clone(), target));
        self.ranges.insert(name.to_string(), range);
        Ok(())
    }

    fn scale(&self, name: &str) -> Result<&Scale> {
        self.scales
            .get(name)
            .ok_or_else(|| PlotError::UnknownRange { axis: self.name, name: name.to_string() })
    }

    fn range(&self, name: &str) -> Result<RangeRef> {
        self.ranges
            .get(name)
            .cloned()
            .ok_or_else(|| PlotError::UnknownRange { axis: self.name, name: name.to_string() })
    }

    fn retarget(&mut self, target: Interval) {
        for s in self.scales.values_mut() {
            s.set_target(target);
        }
    }
}

#[derive(Debug)]
pub struct CartesianFrame {
    x: Axis,
    y: Axis,
    bbox: LayoutBox,
}

impl CartesianFrame {
    /// Build a frame with default ranges and scale kinds. Fails when a range
    /// and a scale kind do not fit together (categorical vs numeric).
    pub fn new(x_range: RangeRef, y_range: RangeRef, x_scale: ScaleKind, y_scale: ScaleKind) -> Result<Self> {
        let mut frame = Self {
            x: Axis::new("x", x_scale),
            y: Axis::new("y", y_scale),
            bbox: LayoutBox::default(),
        };
        frame.add_x_range(DEFAULT, x_range)?;
        frame.add_y_range(DEFAULT, y_range)?;
        Ok(frame)
    }

    pub fn bbox(&self) -> LayoutBox { self.bbox }

    pub fn x_target(&self) -> Interval {
        Interval::new(self.bbox.left, self.bbox.right())
    }

    pub fn y_target(&self) -> Interval {
        Interval::new(self.bbox.bottom(), self.bbox.top)
    }

    pub fn set_bbox(&mut self, bbox: LayoutBox) {
        if bbox == self.bbox {
            return;
        }
        self.bbox = bbox;
        let (xt, yt) = (self.x_target(), self.y_target());
        self.x.retarget(xt);
        self.y.retarget(yt);
    }

    /// Register (or replace) an extra x range using the frame's default x scale kind.
    pub fn add_x_range(&mut self, name: &str, range: RangeRef) -> Result<()> {
        let kind = self.x.default_kind;
        self.add_x_range_with_scale(name, range, kind)
    }

    pub fn add_y_range(&mut self, name: &str, range: RangeRef) -> Result<()> {
        let kind = self.y.default_kind;
        self.add_y_range_with_scale(name, range, kind)
    }

    pub fn add_x_range_with_scale(&mut self, name: &str, range: RangeRef, kind: ScaleKind) -> Result<()> {
        let target = self.x_target();
        self.x.insert(name, range, kind, target)
    }

    pub fn add_y_range_with_scale(&mut self, name: &str, range: RangeRef, kind: ScaleKind) -> Result<()> {
        let target = self.y_target();
        self.y.insert(name, range, kind, target)
    }

    pub fn x_scale(&self, name: &str) -> Result<&Scale> { self.x.scale(name) }
    pub fn y_scale(&self, name: &str) -> Result<&Scale> { self.y.scale(name) }
    pub fn x_range(&self, name: &str) -> Result<RangeRef> { self.x.range(name) }
    pub fn y_range(&self, name: &str) -> Result<RangeRef> { self.y.range(name) }

    pub fn range(&self, dim: Dimension, name: &str) -> Result<RangeRef> {
        match dim {
            Dimension::X => self.x.range(name),
            Dimension::Y => self.y.range(name),
        }
    }

    pub fn scale(&self, dim: Dimension, name: &str) -> Result<&Scale> {
        match dim {
            Dimension::X => self.x.scale(name),
            Dimension::Y => self.y.scale(name),
        }
    }

    pub fn x_ranges(&self) -> impl Iterator<Item = (&String, &RangeRef)> {
        self.x.ranges.iter()
    }

    pub fn y_ranges(&self) -> impl Iterator<Item = (&String, &RangeRef)> {
        self.y.ranges.iter()
    }

    /// Sum of all range revisions; changes whenever any registered range moves.
    pub fn ranges_revision(&self) -> u64 {
        self.x
            .ranges
            .values()
            .chain(self.y.ranges.values())
            .map(|r| r.borrow().revision())
            .sum()
    }

    pub fn map_to_screen(&self, xs: &[f64], ys: &[f64], x_name: &str, y_name: &str) -> Result<(Vec<f64>, Vec<f64>)> {
        let sx = self.x.scale(x_name)?.v_compute(xs);
        let sy = self.y.scale(y_name)?.v_compute(ys);
        Ok((sx, sy))
    }

    pub fn map_from_screen(&self, sx: &[f64], sy: &[f64], x_name: &str, y_name: &str) -> Result<(Vec<f64>, Vec<f64>)> {
        let xs = self.x.scale(x_name)?.v_invert(sx);
        let ys = self.y.scale(y_name)?.v_invert(sy);
        Ok((xs, ys))
    }
}
