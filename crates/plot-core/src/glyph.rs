// File: crates/plot-core/src/glyph.rs
// Summary: Reference glyphs (Scatter markers, line Segments): data loading, bounds, mapping, hit-testing, painting.

use skia_safe as skia;

use crate::geometry::{dist_to_segment_squared, point_in_poly, BBox};
use crate::hittest::{Geometry, SpatialIndex};
use crate::scale::Scale;
use crate::source::ColumnDataSource;
use crate::types::Dimension;

/// Colors for one painted subset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphStyle {
    pub fill: skia::Color,
    pub line: skia::Color,
    pub alpha: u8,
}

impl GlyphStyle {
    fn paints(&self, line_width: f32) -> (skia::Paint, skia::Paint) {
        let mut fill = skia::Paint::default();
        fill.set_anti_alias(true);
        fill.set_style(skia::paint::Style::Fill);
        fill.set_color(self.fill.with_a(self.alpha));

        let mut stroke = skia::Paint::default();
        stroke.set_anti_alias(true);
        stroke.set_style(skia::paint::Style::Stroke);
        stroke.set_stroke_width(line_width);
        stroke.set_color(self.line.with_a(self.alpha));
        (fill, stroke)
    }
}

pub trait Glyph {
    /// Load the rows visible through the renderer's view (local order).
    fn set_data(&mut self, source: &ColumnDataSource, rows: &[usize]);
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn bounds(&self) -> BBox;
    /// Bounds over strictly positive coordinates only.
    fn log_bounds(&self) -> BBox;
    fn map(&mut self, x: &Scale, y: &Scale);
    /// Local indices hit by `geometry`, ascending. Requires a prior `map`.
    fn hit_test(&self, geometry: &Geometry) -> Vec<usize>;
    fn paint(&self, canvas: &skia::Canvas, indices: &[usize], style: &GlyphStyle);
    fn supports_gpu(&self) -> bool {
        false
    }
}

fn extend_positive(b: &mut BBox, x: f64, y: f64) {
    b.extend(if x > 0.0 { x } else { f64::NAN }, if y > 0.0 { y } else { f64::NAN });
}

// ---- Scatter ----------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Scatter {
    x_field: String,
    y_field: String,
    /// Marker radius in logical pixels.
    pub radius: f64,
    pub line_width: f32,
    xs: Vec<f64>,
    ys: Vec<f64>,
    sxs: Vec<f64>,
    sys: Vec<f64>,
    index: SpatialIndex,
}

impl Scatter {
    pub fn new(x_field: &str, y_field: &str) -> Self {
        Self {
            x_field: x_field.to_string(),
            y_field: y_field.to_string(),
            radius: 4.0,
            line_width: 1.0,
            xs: Vec::new(),
            ys: Vec::new(),
            sxs: Vec::new(),
            sys: Vec::new(),
            index: SpatialIndex::default(),
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn screen_coords(&self) -> (&[f64], &[f64]) {
        (&self.sxs, &self.sys)
    }

    fn hit_candidates(&self, indices: Vec<usize>, keep: impl Fn(f64, f64) -> bool) -> Vec<usize> {
        indices.into_iter().filter(|&i| keep(self.sxs[i], self.sys[i])).collect()
    }
}

impl Glyph for Scatter {
    fn set_data(&mut self, source: &ColumnDataSource, rows: &[usize]) {
        self.xs = source.f64_values(&self.x_field, rows);
        self.ys = source.f64_values(&self.y_field, rows);
        self.sxs.clear();
        self.sys.clear();
        self.index = SpatialIndex::default();
    }

    fn len(&self) -> usize {
        self.xs.len()
    }

    fn bounds(&self) -> BBox {
        let mut b = BBox::empty();
        for (&x, &y) in self.xs.iter().zip(&self.ys) {
            if x.is_finite() && y.is_finite() {
                b.extend(x, y);
            }
        }
        b
    }

    fn log_bounds(&self) -> BBox {
        let mut b = BBox::empty();
        for (&x, &y) in self.xs.iter().zip(&self.ys) {
            extend_positive(&mut b, x, y);
        }
        b
    }

    fn map(&mut self, x: &Scale, y: &Scale) {
        self.sxs = x.v_compute(&self.xs);
        self.sys = y.v_compute(&self.ys);
        let r = self.radius;
        let boxes: Vec<_> = self.sxs.iter().zip(&self.sys).map(|(&sx, &sy)| (sx - r, sy - r, sx + r, sy + r)).collect();
        self.index = SpatialIndex::build(&boxes);
    }

    fn hit_test(&self, geometry: &Geometry) -> Vec<usize> {
        let r = self.radius;
        match geometry {
            &Geometry::Point { sx, sy } => {
                let candidates = self.index.query(sx - r, sy - r, sx + r, sy + r);
                self.hit_candidates(candidates, |px, py| (px - sx).powi(2) + (py - sy).powi(2) <= r * r)
            }
            &Geometry::Span { dim: Dimension::X, value } => {
                let candidates = self.index.query(value - r, f64::MIN, value + r, f64::MAX);
                self.hit_candidates(candidates, |px, _| (px - value).abs() <= r)
            }
            &Geometry::Span { dim: Dimension::Y, value } => {
                let candidates = self.index.query(f64::MIN, value - r, f64::MAX, value + r);
                self.hit_candidates(candidates, |_, py| (py - value).abs() <= r)
            }
            &Geometry::Rect { sx0, sy0, sx1, sy1 } => {
                let candidates = self.index.query(sx0, sy0, sx1, sy1);
                self.hit_candidates(candidates, |px, py| px >= sx0 && px <= sx1 && py >= sy0 && py <= sy1)
            }
            Geometry::Poly { sxs, sys } => {
                let mut bb = BBox::empty();
                for (&x, &y) in sxs.iter().zip(sys) {
                    bb.extend(x, y);
                }
                if bb.is_empty() {
                    return Vec::new();
                }
                let candidates = self.index.query(bb.x0, bb.y0, bb.x1, bb.y1);
                self.hit_candidates(candidates, |px, py| point_in_poly(px, py, sxs, sys))
            }
        }
    }

    fn paint(&self, canvas: &skia::Canvas, indices: &[usize], style: &GlyphStyle) {
        let (fill, stroke) = style.paints(self.line_width);
        let r = self.radius as f32;
        for &i in indices {
            let (Some(&sx), Some(&sy)) = (self.sxs.get(i), self.sys.get(i)) else { continue };
            if !(sx.is_finite() && sy.is_finite()) {
                continue;
            }
            let c = (sx as f32, sy as f32);
            canvas.draw_circle(c, r, &fill);
            canvas.draw_circle(c, r, &stroke);
        }
    }

    fn supports_gpu(&self) -> bool {
        true
    }
}

// ---- Segment ----------------------------------------------------------------

#[derive(Clone, Debug)]
struct SegmentFields {
    x0: String,
    y0: String,
    x1: String,
    y1: String,
}

/// Straight line segments. With no fields the coordinates are pushed in by
/// the owner through `set_coords` (graph edges).
#[derive(Clone, Debug)]
pub struct Segment {
    fields: Option<SegmentFields>,
    pub line_width: f32,
    coords: [Vec<f64>; 4],
    screen: [Vec<f64>; 4],
    index: SpatialIndex,
}

/// Pixel tolerance for point hits on thin lines.
const SEGMENT_HIT_TOLERANCE: f64 = 2.0;

fn orient(ax: f64, ay: f64, bx: f64, by: f64, cx: f64, cy: f64) -> f64 {
    (bx - ax) * (cy - ay) - (by - ay) * (cx - ax)
}

fn segments_cross(p: (f64, f64, f64, f64), q: (f64, f64, f64, f64)) -> bool {
    let d1 = orient(q.0, q.1, q.2, q.3, p.0, p.1);
    let d2 = orient(q.0, q.1, q.2, q.3, p.2, p.3);
    let d3 = orient(p.0, p.1, p.2, p.3, q.0, q.1);
    let d4 = orient(p.0, p.1, p.2, p.3, q.2, q.3);
    (d1 * d2 <= 0.0) && (d3 * d4 <= 0.0)
}

impl Segment {
    pub fn new(x0: &str, y0: &str, x1: &str, y1: &str) -> Self {
        Self {
            fields: Some(SegmentFields { x0: x0.into(), y0: y0.into(), x1: x1.into(), y1: y1.into() }),
            ..Self::external()
        }
    }

    pub fn external() -> Self {
        Self {
            fields: None,
            line_width: 1.5,
            coords: Default::default(),
            screen: Default::default(),
            index: SpatialIndex::default(),
        }
    }

    pub fn set_coords(&mut self, x0: Vec<f64>, y0: Vec<f64>, x1: Vec<f64>, y1: Vec<f64>) {
        self.coords = [x0, y0, x1, y1];
        self.screen = Default::default();
        self.index = SpatialIndex::default();
    }

    fn screen_segment(&self, i: usize) -> (f64, f64, f64, f64) {
        (self.screen[0][i], self.screen[1][i], self.screen[2][i], self.screen[3][i])
    }
}

impl Glyph for Segment {
    fn set_data(&mut self, source: &ColumnDataSource, rows: &[usize]) {
        let Some(f) = &self.fields else { return };
        let coords = [
            source.f64_values(&f.x0, rows),
            source.f64_values(&f.y0, rows),
            source.f64_values(&f.x1, rows),
            source.f64_values(&f.y1, rows),
        ];
        self.coords = coords;
        self.screen = Default::default();
        self.index = SpatialIndex::default();
    }

    fn len(&self) -> usize {
        self.coords[0].len()
    }

    fn bounds(&self) -> BBox {
        let mut b = BBox::empty();
        for i in 0..self.len() {
            b.extend(self.coords[0][i], self.coords[1][i]);
            b.extend(self.coords[2][i], self.coords[3][i]);
        }
        b
    }

    fn log_bounds(&self) -> BBox {
        let mut b = BBox::empty();
        for i in 0..self.len() {
            extend_positive(&mut b, self.coords[0][i], self.coords[1][i]);
            extend_positive(&mut b, self.coords[2][i], self.coords[3][i]);
        }
        b
    }

    fn map(&mut self, x: &Scale, y: &Scale) {
        self.screen = [
            x.v_compute(&self.coords[0]),
            y.v_compute(&self.coords[1]),
            x.v_compute(&self.coords[2]),
            y.v_compute(&self.coords[3]),
        ];
        let t = SEGMENT_HIT_TOLERANCE;
        let boxes: Vec<_> = (0..self.len())
            .map(|i| {
                let (a, b, c, d) = self.screen_segment(i);
                (a.min(c) - t, b.min(d) - t, a.max(c) + t, b.max(d) + t)
            })
            .collect();
        self.index = SpatialIndex::build(&boxes);
    }

    fn hit_test(&self, geometry: &Geometry) -> Vec<usize> {
        if self.screen[0].len() != self.len() {
            return Vec::new();
        }
        let t = SEGMENT_HIT_TOLERANCE.max(self.line_width as f64 / 2.0);
        let keep = |candidates: Vec<usize>, f: &dyn Fn((f64, f64, f64, f64)) -> bool| -> Vec<usize> {
            candidates.into_iter().filter(|&i| f(self.screen_segment(i))).collect()
        };
        match geometry {
            &Geometry::Point { sx, sy } => {
                let c = self.index.query(sx - t, sy - t, sx + t, sy + t);
                keep(c, &|(a, b, cx, d)| dist_to_segment_squared(sx, sy, a, b, cx, d) <= t * t)
            }
            &Geometry::Span { dim: Dimension::X, value } => {
                let c = self.index.query(value, f64::MIN, value, f64::MAX);
                keep(c, &|(a, _, cx, _)| a.min(cx) <= value && value <= a.max(cx))
            }
            &Geometry::Span { dim: Dimension::Y, value } => {
                let c = self.index.query(f64::MIN, value, f64::MAX, value);
                keep(c, &|(_, b, _, d)| b.min(d) <= value && value <= b.max(d))
            }
            &Geometry::Rect { sx0, sy0, sx1, sy1 } => {
                let c = self.index.query(sx0, sy0, sx1, sy1);
                let inside = move |x: f64, y: f64| x >= sx0 && x <= sx1 && y >= sy0 && y <= sy1;
                let edges = [
                    (sx0, sy0, sx1, sy0),
                    (sx1, sy0, sx1, sy1),
                    (sx1, sy1, sx0, sy1),
                    (sx0, sy1, sx0, sy0),
                ];
                keep(c, &|s| inside(s.0, s.1) || inside(s.2, s.3) || edges.iter().any(|e| segments_cross(s, *e)))
            }
            Geometry::Poly { sxs, sys } => {
                let mut bb = BBox::empty();
                for (&x, &y) in sxs.iter().zip(sys) {
                    bb.extend(x, y);
                }
                if bb.is_empty() {
                    return Vec::new();
                }
                let c = self.index.query(bb.x0, bb.y0, bb.x1, bb.y1);
                keep(c, &|(a, b, cx, d)| point_in_poly(a, b, sxs, sys) && point_in_poly(cx, d, sxs, sys))
            }
        }
    }

    fn paint(&self, canvas: &skia::Canvas, indices: &[usize], style: &GlyphStyle) {
        if self.screen[0].len() != self.len() {
            return;
        }
        let (_, stroke) = style.paints(self.line_width);
        for &i in indices {
            if i >= self.len() {
                continue;
            }
            let (a, b, c, d) = self.screen_segment(i);
            if [a, b, c, d].iter().all(|v| v.is_finite()) {
                canvas.draw_line((a as f32, b as f32), (c as f32, d as f32), &stroke);
            }
        }
    }

    fn supports_gpu(&self) -> bool {
        true
    }
}
