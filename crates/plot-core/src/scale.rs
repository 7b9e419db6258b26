// File: crates/plot-core/src/scale.rs
// Summary: Data to screen mapping (linear, log, categorical) over a shared source range.
// Notes:
// - Coefficients are derived from the source range's current start/end on each
//   call, so a scale never goes stale when the range moves.
// - Non-finite results are NaN, never errors; callers skip NaN points.

use crate::range::RangeRef;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScaleKind {
    Linear,
    Log,
    Categorical,
}

impl ScaleKind {
    pub fn accepts_categorical(self) -> bool {
        matches!(self, ScaleKind::Categorical)
    }
}

/// Target interval in screen units. `start > end` is a reversed target
/// (the y axis, where screen coordinates grow downward).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn is_reversed(&self) -> bool {
        self.start > self.end
    }
}

#[derive(Clone, Copy, Debug)]
enum Mapper {
    Linear { factor: f64, offset: f64 },
    /// Zero-width source: everything lands in the middle of the target.
    Degenerate { target_mid: f64, source_start: f64 },
    Log { factor: f64, offset: f64, inter_factor: f64, inter_offset: f64 },
}

impl Mapper {
    fn compute(&self, x: f64) -> f64 {
        match *self {
            Mapper::Linear { factor, offset } => factor * x + offset,
            Mapper::Degenerate { target_mid, .. } => target_mid,
            Mapper::Log { factor, offset, inter_factor, inter_offset } => {
                if inter_factor == 0.0 {
                    return 0.0;
                }
                let t = (x.ln() - inter_offset) / inter_factor;
                if t.is_finite() {
                    t * factor + offset
                } else {
                    f64::NAN
                }
            }
        }
    }

    fn invert(&self, sx: f64) -> f64 {
        match *self {
            Mapper::Linear { factor, offset } => (sx - offset) / factor,
            Mapper::Degenerate { source_start, .. } => source_start,
            Mapper::Log { factor, offset, inter_factor, inter_offset } => {
                let t = (sx - offset) / factor;
                (inter_factor * t + inter_offset).exp()
            }
        }
    }
}

/// Nudge a log source interval away from zero/negative/degenerate values.
fn log_safe_interval(orig_start: f64, orig_end: f64) -> (f64, f64) {
    let mut start = if orig_start < 0.0 { 0.0 } else { orig_start };
    let mut end = if orig_end < 0.0 { 0.0 } else { orig_end };
    if start == end {
        if start == 0.0 {
            return (1.0, 10.0);
        }
        let log_val = start.log10();
        start = 10f64.powf(log_val.floor());
        end = if log_val.ceil() != log_val.floor() {
            10f64.powf(log_val.ceil())
        } else {
            10f64.powf(log_val.ceil() + 1.0)
        };
    }
    (start, end)
}

#[derive(Clone, Debug)]
pub struct Scale {
    kind: ScaleKind,
    source: RangeRef,
    target: Interval,
}

impl Scale {
    pub fn new(kind: ScaleKind, source: RangeRef, target: Interval) -> Self {
        Self { kind, source, target }
    }

    pub fn kind(&self) -> ScaleKind { self.kind }
    pub fn source(&self) -> &RangeRef { &self.source }
    pub fn target(&self) -> Interval { self.target }

    pub fn set_target(&mut self, target: Interval) {
        self.target = target;
    }

    fn mapper(&self) -> Mapper {
        let (ss, se) = {
            let r = self.source.borrow();
            (r.start(), r.end())
        };
        let Interval { start: ts, end: te } = self.target;
        match self.kind {
            ScaleKind::Linear | ScaleKind::Categorical => {
                if se == ss {
                    Mapper::Degenerate { target_mid: (ts + te) / 2.0, source_start: ss }
                } else {
                    let factor = (te - ts) / (se - ss);
                    Mapper::Linear { factor, offset: -factor * ss + ts }
                }
            }
            ScaleKind::Log => {
                let (start, end) = log_safe_interval(ss, se);
                let (inter_factor, inter_offset) = if start == 0.0 {
                    (end.ln(), 0.0)
                } else {
                    (end.ln() - start.ln(), start.ln())
                };
                Mapper::Log { factor: te - ts, offset: ts, inter_factor, inter_offset }
            }
        }
    }

    pub fn compute(&self, x: f64) -> f64 {
        self.mapper().compute(x)
    }

    pub fn v_compute(&self, xs: &[f64]) -> Vec<f64> {
        let m = self.mapper();
        xs.iter().map(|&x| m.compute(x)).collect()
    }

    pub fn invert(&self, sx: f64) -> f64 {
        self.mapper().invert(sx)
    }

    pub fn v_invert(&self, sxs: &[f64]) -> Vec<f64> {
        let m = self.mapper();
        sxs.iter().map(|&x| m.invert(x)).collect()
    }

    /// Map an interval, returned in ascending screen order for reversed targets.
    pub fn r_compute(&self, x0: f64, x1: f64) -> (f64, f64) {
        let m = self.mapper();
        if self.target.is_reversed() {
            (m.compute(x1), m.compute(x0))
        } else {
            (m.compute(x0), m.compute(x1))
        }
    }

    pub fn r_invert(&self, sx0: f64, sx1: f64) -> (f64, f64) {
        let m = self.mapper();
        if self.target.is_reversed() {
            (m.invert(sx1), m.invert(sx0))
        } else {
            (m.invert(sx0), m.invert(sx1))
        }
    }

    /// Screen position of a factor's centre. `None` unless this is a
    /// categorical scale over a factor range that knows the factor.
    pub fn compute_factor(&self, factor: &str) -> Option<f64> {
        if self.kind != ScaleKind::Categorical {
            return None;
        }
        let synthetic = self.source.borrow().as_factor()?.synthetic(factor)?;
        Some(self.compute(synthetic))
    }

    /// Vectorised `compute_factor`; unknown factors map to NaN.
    pub fn v_compute_factors<S: AsRef<str>>(&self, factors: &[S]) -> Vec<f64> {
        let synthetic: Vec<f64> = {
            let src = self.source.borrow();
            match src.as_factor() {
                Some(fr) => factors.iter().map(|f| fr.synthetic(f.as_ref()).unwrap_or(f64::NAN)).collect(),
                None => vec![f64::NAN; factors.len()],
            }
        };
        self.v_compute(&synthetic)
    }
}
