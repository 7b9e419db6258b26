// File: crates/plot-core/src/renderer.rs
// Summary: Renderer view contract used by the paint pass, plus the glyph renderer view.
// Notes:
// - Views are polled, not notified: `data_revision` tells the plot when to
//   recompute auto-ranges, `has_finished` gates snapshotting.
// - Capabilities (hit-testing, linked selection, side panels) are opt-in
//   trait methods instead of type checks.

use skia_safe as skia;

use crate::canvas::FrameLayers;
use crate::error::Result;
use crate::frame::{CartesianFrame, DEFAULT};
use crate::geometry::BBox;
use crate::glyph::{Glyph, GlyphStyle};
use crate::hittest::{Geometry, HitTestable, LinkedSelectable};
use crate::layout::{PlotLayout, Side};
use crate::selection::Selection;
use crate::source::{CdsView, SourceRef};
use crate::theme::Theme;
use crate::types::{RenderLevel, RendererId};

/// Level-of-detail decision for the current paint pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lod {
    pub active: bool,
    pub factor: usize,
    pub threshold: Option<usize>,
}

impl Lod {
    pub const OFF: Lod = Lod { active: false, factor: 1, threshold: None };

    /// Whether a renderer with `n` items should paint decimated.
    pub fn applies_to(&self, n: usize) -> bool {
        self.active && self.factor > 1 && self.threshold.is_some_and(|t| n > t)
    }
}

/// Everything a view may touch while painting.
pub struct PaintContext<'a, 'b> {
    pub layers: &'a mut FrameLayers<'b>,
    pub frame: &'a CartesianFrame,
    pub layout: &'a PlotLayout,
    pub theme: &'a Theme,
    pub lod: Lod,
}

impl PaintContext<'_, '_> {
    pub fn canvas(&self) -> &skia::Canvas {
        self.layers.primary()
    }
}

pub trait RendererView {
    fn id(&self) -> RendererId;
    fn level(&self) -> RenderLevel;

    fn visible(&self) -> bool {
        true
    }

    fn x_range_name(&self) -> &str {
        DEFAULT
    }

    fn y_range_name(&self) -> &str {
        DEFAULT
    }

    /// Reload data whose source changed since the last call.
    fn sync_data(&mut self) {}

    /// Sum of the revisions of the sources this view reads.
    fn data_revision(&self) -> u64 {
        0
    }

    /// Data-space extent for auto-ranging; `None` when the view does not contribute.
    fn bounds(&self) -> Option<BBox> {
        None
    }

    fn log_bounds(&self) -> Option<BBox> {
        self.bounds()
    }

    /// Side and thickness when the view occupies a layout panel.
    fn panel(&self) -> Option<(Side, f64)> {
        None
    }

    /// Refresh whatever `panel()` depends on (tick labels) once ranges are final.
    fn update_panel(&mut self, _frame: &CartesianFrame) -> Result<()> {
        Ok(())
    }

    /// Map data to screen using the frame's current scales.
    fn map_data(&mut self, _frame: &CartesianFrame) -> Result<()> {
        Ok(())
    }

    fn paint(&mut self, ctx: &mut PaintContext<'_, '_>) -> Result<()>;

    /// False while asynchronous content (tiles, images) is outstanding.
    fn has_finished(&self) -> bool {
        true
    }

    /// Items drawn in the last paint pass.
    fn painted_items(&self) -> usize {
        0
    }

    fn sources(&self) -> Vec<SourceRef> {
        Vec::new()
    }

    fn hit_testable(&self) -> Option<&dyn HitTestable> {
        None
    }

    fn linked_selectable(&self) -> Option<&dyn LinkedSelectable> {
        None
    }
}

/// Every `factor`-th index, always keeping the last one.
pub fn decimate(indices: &[usize], factor: usize) -> Vec<usize> {
    if factor <= 1 || indices.is_empty() {
        return indices.to_vec();
    }
    let mut out: Vec<usize> = indices.iter().copied().step_by(factor).collect();
    if let Some(&last) = indices.last() {
        if out.last() != Some(&last) {
            out.push(last);
        }
    }
    out
}

/// A glyph bound to a data source through a view.
pub struct GlyphRendererView<G> {
    id: RendererId,
    source: SourceRef,
    view: CdsView,
    glyph: G,
    x_range_name: String,
    y_range_name: String,
    pub visible: bool,
    /// Draw into the GPU layer when one is available.
    pub use_gpu: bool,
    loaded: Option<u64>,
    painted: usize,
}

impl<G: Glyph> GlyphRendererView<G> {
    pub fn new(source: SourceRef, glyph: G) -> Self {
        Self {
            id: RendererId::fresh(),
            source,
            view: CdsView::all(),
            glyph,
            x_range_name: DEFAULT.to_string(),
            y_range_name: DEFAULT.to_string(),
            visible: true,
            use_gpu: false,
            loaded: None,
            painted: 0,
        }
    }

    pub fn with_view(mut self, view: CdsView) -> Self {
        self.view = view;
        self.loaded = None;
        self
    }

    pub fn with_ranges(mut self, x_range_name: &str, y_range_name: &str) -> Self {
        self.x_range_name = x_range_name.to_string();
        self.y_range_name = y_range_name.to_string();
        self
    }

    pub fn with_gpu(mut self, use_gpu: bool) -> Self {
        self.use_gpu = use_gpu;
        self
    }

    pub fn glyph(&self) -> &G { &self.glyph }
    pub fn glyph_mut(&mut self) -> &mut G { &mut self.glyph }
    pub fn source(&self) -> &SourceRef { &self.source }
    pub fn cds_view(&self) -> &CdsView { &self.view }

    /// Full row indices in local order.
    pub fn subset(&self) -> Vec<usize> {
        self.view.subset(self.source.borrow().len())
    }

    /// Reload glyph data if the source changed; true when it did.
    pub fn reload_if_stale(&mut self) -> bool {
        let src = self.source.borrow();
        if self.loaded == Some(src.revision()) {
            return false;
        }
        let rows = self.view.subset(src.len());
        self.glyph.set_data(&src, &rows);
        self.loaded = Some(src.revision());
        true
    }

    pub fn hit_local(&self, geometry: &Geometry) -> Vec<usize> {
        self.glyph.hit_test(geometry)
    }

    /// Local indices split into (unselected, selected, inspected).
    fn partition(&self) -> (Vec<usize>, Vec<usize>, Vec<usize>) {
        let src = self.source.borrow();
        let selected = self.view.selection_to_local(&src.selected).indices;
        let inspected = self.view.selection_to_local(&src.inspected).indices;
        let n = self.glyph.len();
        let mut rest = Vec::with_capacity(n);
        let mut sel = Vec::new();
        for i in 0..n {
            if selected.contains(&i) {
                sel.push(i);
            } else {
                rest.push(i);
            }
        }
        (rest, sel, inspected.into_iter().filter(|&i| i < n).collect())
    }
}

impl<G: Glyph> RendererView for GlyphRendererView<G> {
    fn id(&self) -> RendererId { self.id }
    fn level(&self) -> RenderLevel { RenderLevel::Glyph }
    fn visible(&self) -> bool { self.visible }
    fn x_range_name(&self) -> &str { &self.x_range_name }
    fn y_range_name(&self) -> &str { &self.y_range_name }

    fn sync_data(&mut self) {
        self.reload_if_stale();
    }

    fn data_revision(&self) -> u64 {
        self.source.borrow().revision()
    }

    fn bounds(&self) -> Option<BBox> {
        Some(self.glyph.bounds())
    }

    fn log_bounds(&self) -> Option<BBox> {
        Some(self.glyph.log_bounds())
    }

    fn map_data(&mut self, frame: &CartesianFrame) -> Result<()> {
        let xs = frame.x_scale(&self.x_range_name)?;
        let ys = frame.y_scale(&self.y_range_name)?;
        self.glyph.map(xs, ys);
        Ok(())
    }

    fn paint(&mut self, ctx: &mut PaintContext<'_, '_>) -> Result<()> {
        let (rest, selected, inspected) = self.partition();
        let theme = ctx.theme;
        let base = GlyphStyle { fill: theme.glyph_fill, line: theme.glyph_line, alpha: 255 };

        let decimated = ctx.lod.applies_to(self.glyph.len());
        let canvas = ctx.layers.glyph_canvas(self.use_gpu && self.glyph.supports_gpu());
        self.painted = 0;
        if selected.is_empty() {
            let rest = if decimated { decimate(&rest, ctx.lod.factor) } else { rest };
            self.glyph.paint(canvas, &rest, &base);
            self.painted += rest.len();
        } else {
            let dim = GlyphStyle { alpha: theme.nonselection_alpha, ..base };
            let rest = if decimated { decimate(&rest, ctx.lod.factor) } else { rest };
            self.glyph.paint(canvas, &rest, &dim);
            let sel = GlyphStyle { fill: theme.selection, line: theme.selection, alpha: 255 };
            self.glyph.paint(canvas, &selected, &sel);
            self.painted += rest.len() + selected.len();
        }
        if !inspected.is_empty() {
            let hover = GlyphStyle { fill: theme.hover, line: theme.hover, alpha: 255 };
            self.glyph.paint(canvas, &inspected, &hover);
        }
        Ok(())
    }

    fn painted_items(&self) -> usize {
        self.painted
    }

    fn sources(&self) -> Vec<SourceRef> {
        vec![self.source.clone()]
    }

    fn hit_testable(&self) -> Option<&dyn HitTestable> {
        Some(self)
    }
}

impl<G: Glyph> HitTestable for GlyphRendererView<G> {
    fn hit_test(&self, geometry: &Geometry) -> Option<Selection> {
        if !self.visible {
            return None;
        }
        Some(Selection::from_indices(self.glyph.hit_test(geometry)))
    }

    fn source(&self) -> SourceRef {
        self.source.clone()
    }

    fn view(&self) -> &CdsView {
        &self.view
    }
}
