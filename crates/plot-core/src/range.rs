// File: crates/plot-core/src/range.rs
// Summary: Data-unit ranges: fixed Range1d, auto-computed DataRange1d and categorical FactorRange.
// Notes:
// - Ranges are shared between frames (and between plots) through `RangeRef`.
// - Every mutation bumps a revision counter; consumers compare revisions instead
//   of subscribing to change events.
// - DataRange1d::update never fails: degenerate inputs resolve through the
//   fallback heuristics below because it runs on every interactive frame.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::geometry::BBox;
use crate::types::{Dimension, PlotId, RendererId};

pub type RangeRef = Rc<RefCell<Range>>;

/// Wrap any range flavour in a shared handle.
pub fn shared(range: impl Into<Range>) -> RangeRef {
    Rc::new(RefCell::new(range.into()))
}

/// Log-mode substitution when the minimum is missing but the maximum is usable.
pub const LOG_MIN_FROM_MAX_DIVISOR: f64 = 100.0;
/// Log-mode substitution when the maximum is missing but the minimum is usable.
pub const LOG_MAX_FROM_MIN_FACTOR: f64 = 100.0;
/// Log-mode minimum when neither bound is usable.
pub const LOG_DEFAULT_MIN: f64 = 0.1;
/// Log-mode maximum when neither bound is usable.
pub const LOG_DEFAULT_MAX: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaddingUnits {
    Percent,
    Absolute,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Follow {
    Start,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScaleHint {
    Auto,
    Log,
}

/// Limits for interactive range updates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Bounds {
    Unbounded,
    /// Bounds follow the computed start/end (DataRange1d only).
    Auto,
    Explicit { min: Option<f64>, max: Option<f64> },
}

impl Bounds {
    /// Resolve to concrete limits given the start/end `Auto` should follow.
    pub fn resolve(&self, start: f64, end: f64) -> (Option<f64>, Option<f64>) {
        match *self {
            Bounds::Unbounded => (None, None),
            Bounds::Auto => (Some(start.min(end)), Some(start.max(end))),
            Bounds::Explicit { min, max } => (min, max),
        }
    }
}

// ---- Range1d ----------------------------------------------------------------

/// Fixed range; `start > end` encodes a flipped axis.
#[derive(Clone, Debug)]
pub struct Range1d {
    start: f64,
    end: f64,
    pub bounds: Bounds,
    pub min_interval: Option<f64>,
    pub max_interval: Option<f64>,
    initial: (f64, f64),
    revision: u64,
}

impl Range1d {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            bounds: Bounds::Unbounded,
            min_interval: None,
            max_interval: None,
            initial: (start, end),
            revision: 0,
        }
    }

    pub fn with_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.bounds = Bounds::Explicit { min, max };
        self
    }

    pub fn with_intervals(mut self, min_interval: Option<f64>, max_interval: Option<f64>) -> Self {
        self.min_interval = min_interval;
        self.max_interval = max_interval;
        self
    }

    pub fn start(&self) -> f64 { self.start }
    pub fn end(&self) -> f64 { self.end }

    /// Returns true when the values actually changed.
    pub fn set(&mut self, start: f64, end: f64) -> bool {
        if start == self.start && end == self.end {
            return false;
        }
        self.start = start;
        self.end = end;
        self.revision += 1;
        true
    }

    pub fn reset(&mut self) {
        let (s, e) = self.initial;
        self.set(s, e);
    }
}

// ---- DataRange1d ------------------------------------------------------------

/// User-facing configuration of an auto-range. `reset()` restores the values
/// the range was constructed with.
#[derive(Clone, Debug, PartialEq)]
pub struct DataRangeConfig {
    /// Explicit start overriding the computed one (ignored in log mode if <= 0).
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub range_padding: f64,
    pub range_padding_units: PaddingUnits,
    pub follow: Option<Follow>,
    pub follow_interval: Option<f64>,
    pub default_span: f64,
    pub scale_hint: ScaleHint,
    pub flipped: bool,
    pub only_visible: bool,
    /// Restrict contributions to these renderers; `None` means all of them.
    pub renderers: Option<Vec<RendererId>>,
    pub bounds: Bounds,
    pub min_interval: Option<f64>,
    pub max_interval: Option<f64>,
}

impl Default for DataRangeConfig {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            range_padding: 0.1,
            range_padding_units: PaddingUnits::Percent,
            follow: None,
            follow_interval: None,
            default_span: 2.0,
            scale_hint: ScaleHint::Auto,
            flipped: false,
            only_visible: false,
            renderers: None,
            bounds: Bounds::Unbounded,
            min_interval: None,
            max_interval: None,
        }
    }
}

/// Range whose start/end are computed from renderer bounds on every paint.
#[derive(Clone, Debug)]
pub struct DataRange1d {
    pub config: DataRangeConfig,
    initial: DataRangeConfig,
    start: f64,
    end: f64,
    /// Set by interactive tools; freezes auto-recompute until `reset()`.
    pub have_updated_interactively: bool,
    plot_bounds: BTreeMap<PlotId, BBox>,
    /// Computed start/end captured by the last auto update, used by `Bounds::Auto`.
    auto_limits: Option<(f64, f64)>,
    needs_update: bool,
    revision: u64,
}

impl Default for DataRange1d {
    fn default() -> Self {
        Self::new(DataRangeConfig::default())
    }
}

impl DataRange1d {
    pub fn new(config: DataRangeConfig) -> Self {
        let start = config.start.unwrap_or(f64::NAN);
        let end = config.end.unwrap_or(f64::NAN);
        Self {
            initial: config.clone(),
            config,
            start,
            end,
            have_updated_interactively: false,
            plot_bounds: BTreeMap::new(),
            auto_limits: None,
            needs_update: true,
            revision: 0,
        }
    }

    pub fn start(&self) -> f64 { self.start }
    pub fn end(&self) -> f64 { self.end }

    /// True after reset/detach until the next `update` re-derives start/end.
    pub fn needs_update(&self) -> bool { self.needs_update }

    /// Contributors currently cached, keyed by plot.
    pub fn contributors(&self) -> impl Iterator<Item = (&PlotId, &BBox)> {
        self.plot_bounds.iter()
    }

    /// Restore the initial configuration and unfreeze auto-ranging. Start/end
    /// stay as they are until the next `update`.
    pub fn reset(&mut self) {
        self.config = self.initial.clone();
        self.have_updated_interactively = false;
        self.needs_update = true;
        self.revision += 1;
    }

    /// Drop a plot's cached bounds, e.g. when the plot goes away.
    pub fn detach(&mut self, plot: PlotId) -> bool {
        let removed = self.plot_bounds.remove(&plot).is_some();
        if removed {
            self.needs_update = true;
        }
        removed
    }

    /// Interactive tools (pan, zoom, range slider) write through here.
    pub fn set_interactive(&mut self, start: f64, end: f64) {
        self.have_updated_interactively = true;
        self.assign(start, end);
    }

    fn assign(&mut self, start: f64, end: f64) -> bool {
        let same = |a: f64, b: f64| a == b || (a.is_nan() && b.is_nan());
        if same(start, self.start) && same(end, self.end) {
            return false;
        }
        self.start = start;
        self.end = end;
        self.revision += 1;
        true
    }

    /// Union of the bounds of the renderers this range listens to.
    pub fn compute_plot_bounds(&self, bounds: &BTreeMap<RendererId, BBox>) -> BBox {
        let mut result = BBox::empty();
        for (id, rect) in bounds {
            let wanted = match &self.config.renderers {
                Some(ids) => ids.contains(id),
                None => true,
            };
            if wanted {
                result = result.union(rect);
            }
        }
        result
    }

    /// Grow the narrower side of `bounds` (centred) so width/height == ratio.
    pub fn adjust_bounds_for_aspect(bounds: &BBox, ratio: f64) -> BBox {
        let mut width = bounds.x1 - bounds.x0;
        if !(width > 0.0) {
            width = 1.0;
        }
        let mut height = bounds.y1 - bounds.y0;
        if !(height > 0.0) {
            height = 1.0;
        }
        let xcenter = 0.5 * (bounds.x1 + bounds.x0);
        let ycenter = 0.5 * (bounds.y1 + bounds.y0);
        if width < ratio * height {
            width = ratio * height;
        } else {
            height = width / ratio;
        }
        BBox::new(
            xcenter - 0.5 * width,
            ycenter - 0.5 * height,
            xcenter + 0.5 * width,
            ycenter + 0.5 * height,
        )
    }

    /// Min/max of the requested dimension across all contributing plots.
    pub fn compute_min_max<'a>(plot_bounds: impl IntoIterator<Item = &'a BBox>, dim: Dimension) -> (f64, f64) {
        let overall = plot_bounds.into_iter().fold(BBox::empty(), |acc, b| acc.union(b));
        overall.span(dim)
    }

    /// Turn data min/max into padded (and possibly flipped/followed) start/end.
    pub fn compute_range(&self, min: f64, max: f64) -> (f64, f64) {
        let cfg = &self.config;
        let padding = cfg.range_padding;
        let (mut start, mut end);

        if cfg.scale_hint == ScaleHint::Log {
            let usable = |v: f64| v.is_finite() && v > 0.0;
            let (mut min, mut max) = (min, max);
            if !usable(min) {
                min = if usable(max) { max / LOG_MIN_FROM_MAX_DIVISOR } else { LOG_DEFAULT_MIN };
                tracing::warn!(min, "could not determine minimum data value for log axis, using fallback");
            }
            if !usable(max) {
                max = if usable(min) { min * LOG_MAX_FROM_MIN_FACTOR } else { LOG_DEFAULT_MAX };
                tracing::warn!(max, "could not determine maximum data value for log axis, using fallback");
            }

            let (center, span);
            if max == min {
                span = cfg.default_span + 0.001;
                center = min.log10();
            } else {
                let (log_min, log_max) = match cfg.range_padding_units {
                    PaddingUnits::Percent => (min.log10(), max.log10()),
                    PaddingUnits::Absolute => ((min - padding).log10(), (max + padding).log10()),
                };
                span = match cfg.range_padding_units {
                    PaddingUnits::Percent => (log_max - log_min) * (1.0 + padding),
                    PaddingUnits::Absolute => log_max - log_min,
                };
                center = (log_min + log_max) / 2.0;
            }
            start = 10f64.powf(center - span / 2.0);
            end = 10f64.powf(center + span / 2.0);
        } else {
            let (min, max) = if min.is_finite() && max.is_finite() { (min, max) } else { (0.0, 0.0) };
            let span = if max == min {
                cfg.default_span
            } else {
                match cfg.range_padding_units {
                    PaddingUnits::Percent => (max - min) * (1.0 + padding),
                    PaddingUnits::Absolute => (max - min) + 2.0 * padding,
                }
            };
            let center = (max + min) / 2.0;
            start = center - span / 2.0;
            end = center + span / 2.0;
        }

        let mut follow_sign = 1.0;
        if cfg.flipped {
            std::mem::swap(&mut start, &mut end);
            follow_sign = -1.0;
        }

        if let Some(interval) = cfg.follow_interval {
            if (start - end).abs() > interval {
                match cfg.follow {
                    Some(Follow::Start) => end = start + follow_sign * interval,
                    Some(Follow::End) => start = end - follow_sign * interval,
                    None => {}
                }
            }
        }

        (start, end)
    }

    /// Re-derive start/end from renderer bounds contributed by `plot`.
    /// Returns true when start or end changed.
    pub fn update(
        &mut self,
        bounds: &BTreeMap<RendererId, BBox>,
        dim: Dimension,
        plot: PlotId,
        ratio: Option<f64>,
    ) -> bool {
        if self.have_updated_interactively {
            return false;
        }
        if self.config.follow.is_some() && self.config.bounds == Bounds::Auto {
            tracing::warn!("follow enabled so bounds are unset");
            self.config.bounds = Bounds::Unbounded;
        }

        let mut total = self.compute_plot_bounds(bounds);
        if let Some(ratio) = ratio.filter(|r| r.is_finite() && *r > 0.0) {
            total = Self::adjust_bounds_for_aspect(&total, ratio);
        }
        self.plot_bounds.insert(plot, total);

        let (min, max) = Self::compute_min_max(self.plot_bounds.values(), dim);
        let (mut start, mut end) = self.compute_range(min, max);

        let log = self.config.scale_hint == ScaleHint::Log;
        if let Some(s) = self.config.start {
            if !log || s > 0.0 {
                start = s;
            }
        }
        if let Some(e) = self.config.end {
            if !log || e > 0.0 {
                end = e;
            }
        }

        self.needs_update = false;
        if self.config.bounds == Bounds::Auto {
            self.auto_limits = Some((start, end));
        }
        let changed = self.assign(start, end);
        if changed {
            tracing::debug!(?dim, start, end, "data range recomputed");
        }
        changed
    }
}

// ---- FactorRange ------------------------------------------------------------

/// Categorical range. Factor `i` occupies the unit cell starting at
/// `i * (1 + factor_padding)` and maps to that cell's centre.
#[derive(Clone, Debug)]
pub struct FactorRange {
    factors: Vec<String>,
    lookup: HashMap<String, f64>,
    pub factor_padding: f64,
    pub range_padding: f64,
    pub range_padding_units: PaddingUnits,
    start: f64,
    end: f64,
    initial: (f64, f64),
    revision: u64,
}

impl FactorRange {
    pub fn new<S: Into<String>>(factors: impl IntoIterator<Item = S>) -> Self {
        Self::with_padding(factors, 0.0, 0.0, PaddingUnits::Percent)
    }

    pub fn with_padding<S: Into<String>>(
        factors: impl IntoIterator<Item = S>,
        factor_padding: f64,
        range_padding: f64,
        range_padding_units: PaddingUnits,
    ) -> Self {
        let factors: Vec<String> = factors.into_iter().map(Into::into).collect();
        let mut lookup = HashMap::with_capacity(factors.len());
        for (i, f) in factors.iter().enumerate() {
            lookup.entry(f.clone()).or_insert(0.5 + i as f64 * (1.0 + factor_padding));
        }
        let n = factors.len() as f64;
        let total_padding = (n - 1.0).max(0.0) * factor_padding;
        let half = match range_padding_units {
            PaddingUnits::Percent => (n + total_padding) * range_padding / 2.0,
            PaddingUnits::Absolute => range_padding,
        };
        let (start, end) = (-half, n + total_padding + half);
        Self {
            factors,
            lookup,
            factor_padding,
            range_padding,
            range_padding_units,
            start,
            end,
            initial: (start, end),
            revision: 0,
        }
    }

    pub fn factors(&self) -> &[String] { &self.factors }
    pub fn start(&self) -> f64 { self.start }
    pub fn end(&self) -> f64 { self.end }

    /// Synthetic coordinate of a factor's centre; `None` for unknown factors.
    pub fn synthetic(&self, factor: &str) -> Option<f64> {
        self.lookup.get(factor).copied()
    }

    /// Synthetic coordinate shifted within the factor cell (`offset` in [-0.5, 0.5]).
    pub fn synthetic_with_offset(&self, factor: &str, offset: f64) -> Option<f64> {
        self.synthetic(factor).map(|v| v + offset)
    }

    fn set(&mut self, start: f64, end: f64) {
        if start != self.start || end != self.end {
            self.start = start;
            self.end = end;
            self.revision += 1;
        }
    }
}

// ---- Range ------------------------------------------------------------------

#[derive(Clone, Debug)]
pub enum Range {
    Fixed(Range1d),
    Data(DataRange1d),
    Factor(FactorRange),
}

impl From<Range1d> for Range {
    fn from(r: Range1d) -> Self { Range::Fixed(r) }
}

impl From<DataRange1d> for Range {
    fn from(r: DataRange1d) -> Self { Range::Data(r) }
}

impl From<FactorRange> for Range {
    fn from(r: FactorRange) -> Self { Range::Factor(r) }
}

impl Range {
    pub fn start(&self) -> f64 {
        match self {
            Range::Fixed(r) => r.start(),
            Range::Data(r) => r.start(),
            Range::Factor(r) => r.start(),
        }
    }

    pub fn end(&self) -> f64 {
        match self {
            Range::Fixed(r) => r.end(),
            Range::Data(r) => r.end(),
            Range::Factor(r) => r.end(),
        }
    }

    pub fn min(&self) -> f64 { self.start().min(self.end()) }
    pub fn max(&self) -> f64 { self.start().max(self.end()) }
    pub fn span(&self) -> f64 { (self.end() - self.start()).abs() }
    pub fn is_reversed(&self) -> bool { self.start() > self.end() }
    pub fn is_valid(&self) -> bool { self.start().is_finite() && self.end().is_finite() }
    pub fn is_categorical(&self) -> bool { matches!(self, Range::Factor(_)) }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Range::Fixed(_) => "Range1d",
            Range::Data(_) => "DataRange1d",
            Range::Factor(_) => "FactorRange",
        }
    }

    pub fn revision(&self) -> u64 {
        match self {
            Range::Fixed(r) => r.revision,
            Range::Data(r) => r.revision,
            Range::Factor(r) => r.revision,
        }
    }

    pub fn bounds(&self) -> Bounds {
        match self {
            Range::Fixed(r) => r.bounds,
            Range::Data(r) => r.config.bounds,
            Range::Factor(_) => Bounds::Unbounded,
        }
    }

    /// Concrete (min, max) limits for interactive updates.
    pub fn limits(&self) -> (Option<f64>, Option<f64>) {
        match self {
            Range::Data(r) if r.config.bounds == Bounds::Auto => match r.auto_limits {
                Some((s, e)) => Bounds::Auto.resolve(s, e),
                None => (None, None),
            },
            _ => self.bounds().resolve(self.start(), self.end()),
        }
    }

    pub fn intervals(&self) -> (Option<f64>, Option<f64>) {
        match self {
            Range::Fixed(r) => (r.min_interval, r.max_interval),
            Range::Data(r) => (r.config.min_interval, r.config.max_interval),
            Range::Factor(_) => (None, None),
        }
    }

    /// Write start/end from an interactive gesture.
    pub fn set_interactive(&mut self, start: f64, end: f64) {
        match self {
            Range::Fixed(r) => {
                r.set(start, end);
            }
            Range::Data(r) => r.set_interactive(start, end),
            Range::Factor(r) => r.set(start, end),
        }
    }

    pub fn reset(&mut self) {
        match self {
            Range::Fixed(r) => r.reset(),
            Range::Data(r) => r.reset(),
            Range::Factor(r) => {
                let (s, e) = r.initial;
                r.set(s, e);
            }
        }
    }

    pub fn as_data(&self) -> Option<&DataRange1d> {
        match self {
            Range::Data(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_data_mut(&mut self) -> Option<&mut DataRange1d> {
        match self {
            Range::Data(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_factor(&self) -> Option<&FactorRange> {
        match self {
            Range::Factor(r) => Some(r),
            _ => None,
        }
    }
}
