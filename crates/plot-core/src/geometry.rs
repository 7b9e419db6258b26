// File: crates/plot-core/src/geometry.rs
// Summary: Lightweight geometry helpers: data-space bounding boxes and pixel layout boxes.

/// Axis-aligned bounding box in data units. The empty box is inverted
/// (`x0 = +inf`, `x1 = -inf`) so that `union` with it is the identity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BBox {
    pub const fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub const fn empty() -> Self {
        Self {
            x0: f64::INFINITY,
            y0: f64::INFINITY,
            x1: f64::NEG_INFINITY,
            y1: f64::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.x0 <= self.x1 && self.y0 <= self.y1)
    }

    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Grow the box to include a point; non-finite coordinates are skipped.
    pub fn extend(&mut self, x: f64, y: f64) {
        if x.is_finite() {
            self.x0 = self.x0.min(x);
            self.x1 = self.x1.max(x);
        }
        if y.is_finite() {
            self.y0 = self.y0.min(y);
            self.y1 = self.y1.max(y);
        }
    }

    pub fn width(&self) -> f64 { self.x1 - self.x0 }
    pub fn height(&self) -> f64 { self.y1 - self.y0 }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    pub fn intersects(&self, other: &BBox) -> bool {
        self.x0 <= other.x1 && other.x0 <= self.x1 && self.y0 <= other.y1 && other.y0 <= self.y1
    }

    /// Bounds along one dimension as `(min, max)`.
    pub fn span(&self, dim: crate::types::Dimension) -> (f64, f64) {
        match dim {
            crate::types::Dimension::X => (self.x0, self.x1),
            crate::types::Dimension::Y => (self.y0, self.y1),
        }
    }
}

impl Default for BBox {
    fn default() -> Self {
        Self::empty()
    }
}

/// Pixel box of a layout node (canvas, frame or panel), in logical pixels.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct LayoutBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl LayoutBox {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    pub fn from_ltrb(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self { left, top, width: right - left, height: bottom - top }
    }

    pub fn right(&self) -> f64 { self.left + self.width }
    pub fn bottom(&self) -> f64 { self.top + self.height }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right() && y >= self.top && y <= self.bottom()
    }

    pub fn to_rect(&self) -> skia_safe::Rect {
        skia_safe::Rect::from_xywh(self.left as f32, self.top as f32, self.width as f32, self.height as f32)
    }
}

/// Even-odd point-in-polygon test.
pub fn point_in_poly(x: f64, y: f64, xs: &[f64], ys: &[f64]) -> bool {
    let n = xs.len().min(ys.len());
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (xs[i], ys[i]);
        let (xj, yj) = (xs[j], ys[j]);
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Squared distance from `(px, py)` to the segment `(x0, y0)-(x1, y1)`.
pub fn dist_to_segment_squared(px: f64, py: f64, x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
    let (dx, dy) = (x1 - x0, y1 - y0);
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return (px - x0).powi(2) + (py - y0).powi(2);
    }
    let t = (((px - x0) * dx + (py - y0) * dy) / len2).clamp(0.0, 1.0);
    (px - (x0 + t * dx)).powi(2) + (py - (y0 + t * dy)).powi(2)
}
