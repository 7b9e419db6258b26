// File: crates/plot-core/src/hittest.rs
// Summary: Pointer geometries, hit-test capabilities and a screen-space grid index.

use std::collections::BTreeSet;

use crate::selection::Selection;
use crate::source::{CdsView, SourceRef};
use crate::types::Dimension;

/// Pointer-derived geometry in screen (logical pixel) coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Point { sx: f64, sy: f64 },
    /// Full-height (`X`) or full-width (`Y`) line at `value`.
    Span { dim: Dimension, value: f64 },
    Rect { sx0: f64, sy0: f64, sx1: f64, sy1: f64 },
    Poly { sxs: Vec<f64>, sys: Vec<f64> },
}

impl Geometry {
    /// Rect with normalised corners.
    pub fn rect(sx0: f64, sy0: f64, sx1: f64, sy1: f64) -> Self {
        Geometry::Rect { sx0: sx0.min(sx1), sy0: sy0.min(sy1), sx1: sx0.max(sx1), sy1: sy0.max(sy1) }
    }
}

/// Renderers that resolve a geometry to rows of a single source.
pub trait HitTestable {
    /// Hits in the renderer's local (view-filtered) index space.
    fn hit_test(&self, geometry: &Geometry) -> Option<Selection>;
    fn source(&self) -> SourceRef;
    fn view(&self) -> &CdsView;
}

/// Renderers whose hits expand across several linked sources (graphs).
pub trait LinkedSelectable {
    /// Hits already converted to full row indices, one entry per touched source.
    fn linked_hit_test(&self, geometry: &Geometry, inspection: bool) -> Vec<(SourceRef, Selection)>;
}

/// Uniform grid over item bounding boxes.
#[derive(Clone, Debug, Default)]
pub struct SpatialIndex {
    x0: f64,
    y0: f64,
    cell: f64,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<usize>>,
    /// Items with a non-finite box; never returned.
    skipped: usize,
}

const TARGET_PER_CELL: f64 = 8.0;

impl SpatialIndex {
    /// Build from `(x0, y0, x1, y1)` boxes indexed by position.
    pub fn build(boxes: &[(f64, f64, f64, f64)]) -> Self {
        let finite: Vec<usize> = (0..boxes.len())
            .filter(|&i| {
                let (a, b, c, d) = boxes[i];
                a.is_finite() && b.is_finite() && c.is_finite() && d.is_finite()
            })
            .collect();
        if finite.is_empty() {
            return Self { skipped: boxes.len(), ..Self::default() };
        }
        let (mut x0, mut y0, mut x1, mut y1) = (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for &i in &finite {
            let (a, b, c, d) = boxes[i];
            x0 = x0.min(a.min(c));
            y0 = y0.min(b.min(d));
            x1 = x1.max(a.max(c));
            y1 = y1.max(b.max(d));
        }
        let area = ((x1 - x0) * (y1 - y0)).max(1.0);
        let cell = (area * TARGET_PER_CELL / finite.len() as f64).sqrt().max(1.0);
        let cols = (((x1 - x0) / cell).floor() as usize + 1).min(4096);
        let rows = (((y1 - y0) / cell).floor() as usize + 1).min(4096);
        let mut index = Self { x0, y0, cell, cols, rows, cells: vec![Vec::new(); cols * rows], skipped: boxes.len() - finite.len() };
        for &i in &finite {
            let (a, b, c, d) = boxes[i];
            let (ca, ra) = index.cell_of(a.min(c), b.min(d));
            let (cb, rb) = index.cell_of(a.max(c), b.max(d));
            for r in ra..=rb {
                for col in ca..=cb {
                    index.cells[r * cols + col].push(i);
                }
            }
        }
        index
    }

    fn cell_of(&self, x: f64, y: f64) -> (usize, usize) {
        let c = ((x - self.x0) / self.cell).floor().clamp(0.0, (self.cols - 1) as f64) as usize;
        let r = ((y - self.y0) / self.cell).floor().clamp(0.0, (self.rows - 1) as f64) as usize;
        (c, r)
    }

    pub fn skipped(&self) -> usize { self.skipped }

    /// Candidate items whose cell overlaps the query box, ascending.
    pub fn query(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<usize> {
        if self.cells.is_empty() {
            return Vec::new();
        }
        let (lx, hx) = (x0.min(x1), x0.max(x1));
        let (ly, hy) = (y0.min(y1), y0.max(y1));
        let (ex1, ey1) = (self.x0 + self.cell * self.cols as f64, self.y0 + self.cell * self.rows as f64);
        if hx < self.x0 || lx > ex1 || hy < self.y0 || ly > ey1 {
            return Vec::new();
        }
        let (ca, ra) = self.cell_of(lx, ly);
        let (cb, rb) = self.cell_of(hx, hy);
        let mut out = BTreeSet::new();
        for r in ra..=rb {
            for c in ca..=cb {
                out.extend(self.cells[r * self.cols + c].iter().copied());
            }
        }
        out.into_iter().collect()
    }
}
