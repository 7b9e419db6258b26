// File: crates/plot-core/src/plot.rs
// Summary: PlotView: owns frame, layout, canvas and renderer views and drives the paint pass.
// Notes:
// - A paint pass runs, in order: surface sizing, auto-range update (only when
//   data or a range changed), panel metrics, layout (only when its inputs
//   changed), data mapping, then the levels Image..Overlay. The GPU layer is
//   blitted right after the glyph level.
// - Renderer paint errors propagate out of the pass unchanged.

use std::collections::BTreeMap;
use std::time::Instant;

use skia_safe as skia;

use crate::canvas::{Artifact, Canvas, FrameLayers};
use crate::config::{OutputBackend, PlotOptions};
use crate::error::Result;
use crate::frame::{CartesianFrame, DEFAULT};
use crate::geometry::{BBox, LayoutBox};
use crate::gpu::{self, GpuContext};
use crate::hittest::Geometry;
use crate::layout::{PanelSpec, PlotLayout};
use crate::range::{RangeRef, ScaleHint};
use crate::renderer::{Lod, PaintContext, RendererView};
use crate::scale::ScaleKind;
use crate::scheduler::RenderScheduler;
use crate::selection::{Selection, SelectionMode};
use crate::selection_manager;
use crate::theme::Theme;
use crate::types::{Dimension, Insets, PlotId, RenderLevel, RendererId, SourceId};
use crate::view::{self, RangeState};

/// Selections of every source a plot reads, by source id.
pub type SelectionSnapshot = BTreeMap<SourceId, Selection>;

#[derive(Clone, Copy, Debug)]
struct Interaction {
    start: Instant,
    last: Instant,
}

type LayoutInputs = (i32, i32, Insets, Vec<PanelSpec>);

pub struct PlotView {
    id: PlotId,
    options: PlotOptions,
    frame: CartesianFrame,
    layout: PlotLayout,
    canvas: Canvas,
    renderers: Vec<Box<dyn RendererView>>,
    scheduler: RenderScheduler,
    /// Renderer data revisions seen by the last auto-range update.
    data_stamp: Option<Vec<(RendererId, u64, bool)>>,
    /// Frame box the aspect-matched ranges were last computed for.
    aspect_box: Option<LayoutBox>,
    layout_inputs: Option<LayoutInputs>,
    layout_solves: u64,
    range_updates: u64,
    interaction: Option<Interaction>,
    lod: Lod,
    finished: bool,
}

impl PlotView {
    /// GPU plots pick up the context installed with `gpu::install`.
    pub fn new(options: PlotOptions, x_range: RangeRef, y_range: RangeRef, x_scale: ScaleKind, y_scale: ScaleKind) -> Result<Self> {
        let ctx = gpu::installed();
        Self::with_gpu(options, x_range, y_range, x_scale, y_scale, ctx)
    }

    pub fn with_gpu(
        options: PlotOptions,
        x_range: RangeRef,
        y_range: RangeRef,
        x_scale: ScaleKind,
        y_scale: ScaleKind,
        gpu: Option<GpuContext>,
    ) -> Result<Self> {
        let frame = CartesianFrame::new(x_range, y_range, x_scale, y_scale)?;
        let gpu = if options.output_backend == OutputBackend::Gpu { gpu } else { None };
        let canvas = Canvas::new(options.output_backend, options.width, options.height, options.pixel_ratio(), gpu)?;
        let scheduler = RenderScheduler::new(options.throttle);
        Ok(Self {
            id: PlotId::fresh(),
            options,
            frame,
            layout: PlotLayout::new(),
            canvas,
            renderers: Vec::new(),
            scheduler,
            data_stamp: None,
            aspect_box: None,
            layout_inputs: None,
            layout_solves: 0,
            range_updates: 0,
            interaction: None,
            lod: Lod::OFF,
            finished: false,
        })
    }

    pub fn id(&self) -> PlotId { self.id }
    pub fn options(&self) -> &PlotOptions { &self.options }
    pub fn frame(&self) -> &CartesianFrame { &self.frame }
    pub fn frame_mut(&mut self) -> &mut CartesianFrame { &mut self.frame }
    pub fn layout(&self) -> &PlotLayout { &self.layout }
    pub fn canvas(&self) -> &Canvas { &self.canvas }
    pub fn scheduler(&self) -> &RenderScheduler { &self.scheduler }
    pub fn renderers(&self) -> &[Box<dyn RendererView>] { &self.renderers }

    pub fn set_theme(&mut self, theme: Theme) {
        self.options.theme = theme;
    }

    pub fn add_renderer(&mut self, renderer: impl RendererView + 'static) -> RendererId {
        let id = renderer.id();
        self.renderers.push(Box::new(renderer));
        self.data_stamp = None;
        id
    }

    pub fn remove_renderer(&mut self, id: RendererId) -> Option<Box<dyn RendererView>> {
        let pos = self.renderers.iter().position(|r| r.id() == id)?;
        self.data_stamp = None;
        Some(self.renderers.remove(pos))
    }

    pub fn renderer_mut(&mut self, id: RendererId) -> Option<&mut (dyn RendererView + 'static)> {
        self.renderers.iter_mut().find(|r| r.id() == id).map(|r| r.as_mut())
    }

    // ---- scheduling ---------------------------------------------------------

    pub fn request_render(&mut self, now: Instant) {
        self.scheduler.request(now);
    }

    pub fn pause(&mut self) {
        self.scheduler.pause();
    }

    pub fn unpause(&mut self, now: Instant) {
        self.scheduler.unpause(now);
    }

    pub fn is_paused(&self) -> bool {
        self.scheduler.is_paused()
    }

    /// Host timer hook: ends an idle interaction and runs a due paint.
    /// Returns true when a paint pass ran.
    pub fn tick(&mut self, now: Instant) -> Result<bool> {
        if let Some(i) = self.interaction {
            if now.saturating_duration_since(i.last) >= self.options.lod_timeout {
                self.interaction = None;
                tracing::debug!("interaction idle, restoring full detail");
                self.scheduler.request(now);
            }
        }
        if self.scheduler.due(now) {
            self.paint_at(now)?;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn paint(&mut self) -> Result<()> {
        self.paint_at(Instant::now())
    }

    /// Run one paint pass immediately, regardless of throttling.
    pub fn paint_at(&mut self, now: Instant) -> Result<()> {
        self.scheduler.begin();
        let out = self.paint_pass(now);
        self.scheduler.finish(now);
        out
    }

    pub fn paint_count(&self) -> u64 { self.scheduler.paint_count() }
    pub fn layout_count(&self) -> u64 { self.layout_solves }
    pub fn range_update_count(&self) -> u64 { self.range_updates }

    /// Level-of-detail settings used by the last paint pass.
    pub fn last_lod(&self) -> Lod { self.lod }

    /// True once every renderer reported its content complete in the last pass.
    pub fn has_finished(&self) -> bool { self.finished }

    // ---- interaction --------------------------------------------------------

    /// Note an interactive event. Events closer than `lod_interval` extend the
    /// current interaction; level of detail stays on until `lod_timeout` of idle.
    pub fn interactive_start(&mut self, now: Instant) {
        if let Some(i) = self.interaction.as_mut() {
            if now.saturating_duration_since(i.last) <= self.options.lod_interval {
                i.last = now;
                return;
            }
        }
        self.interaction = Some(Interaction { start: now, last: now });
    }

    pub fn lod_active(&self, now: Instant) -> bool {
        self.interaction
            .is_some_and(|i| now.saturating_duration_since(i.last) < self.options.lod_timeout)
    }

    /// Start of the current interaction, if any.
    pub fn interaction_started(&self) -> Option<Instant> {
        self.interaction.map(|i| i.start)
    }

    pub fn pan_by_pixels(&mut self, dx: f64, dy: f64, now: Instant) -> bool {
        self.interactive_start(now);
        let changed = view::pan_by_pixels(&self.frame, dx, dy);
        if changed {
            self.scheduler.request(now);
        }
        changed
    }

    pub fn zoom_at_pixel(&mut self, factor: f64, sx: f64, sy: f64, now: Instant) -> bool {
        self.interactive_start(now);
        let changed = view::zoom_at_pixel(&self.frame, factor, sx, sy);
        if changed {
            self.scheduler.request(now);
        }
        changed
    }

    pub fn range_state(&self) -> RangeState {
        RangeState::capture(&self.frame)
    }

    pub fn restore_range_state(&mut self, state: &RangeState, now: Instant) -> bool {
        let changed = state.apply(&self.frame);
        if changed {
            self.scheduler.request(now);
        }
        changed
    }

    /// Restore every range to its initial state and unfreeze auto-ranging.
    pub fn reset(&mut self, now: Instant) {
        for (_, r) in self.frame.x_ranges().chain(self.frame.y_ranges()) {
            r.borrow_mut().reset();
        }
        self.interaction = None;
        self.data_stamp = None;
        self.scheduler.request(now);
    }

    /// Change the logical size; zero sizes are ignored.
    pub fn resize(&mut self, width: i32, height: i32, now: Instant) -> bool {
        if width <= 0 || height <= 0 || (width == self.options.width && height == self.options.height) {
            return false;
        }
        self.options.width = width;
        self.options.height = height;
        self.scheduler.request(now);
        true
    }

    pub fn set_device_pixel_ratio(&mut self, ratio: f32, now: Instant) {
        if ratio != self.options.device_pixel_ratio {
            self.options.device_pixel_ratio = ratio;
            self.scheduler.request(now);
        }
    }

    // ---- selection ----------------------------------------------------------

    pub fn select(&mut self, geometry: &Geometry, mode: SelectionMode) -> bool {
        let changed = selection_manager::select(&self.renderers, geometry, mode);
        if changed {
            self.scheduler.request(Instant::now());
        }
        changed
    }

    pub fn inspect(&mut self, geometry: &Geometry) -> bool {
        let changed = selection_manager::inspect(&self.renderers, geometry);
        if changed {
            self.scheduler.request(Instant::now());
        }
        changed
    }

    pub fn clear_selection(&mut self) -> bool {
        let changed = selection_manager::clear(&self.renderers);
        if changed {
            self.scheduler.request(Instant::now());
        }
        changed
    }

    pub fn get_selection(&self) -> SelectionSnapshot {
        let mut out = SelectionSnapshot::new();
        for r in &self.renderers {
            for s in r.sources() {
                let src = s.borrow();
                out.entry(src.id()).or_insert_with(|| src.selected.clone());
            }
        }
        out
    }

    /// Overwrite selections of the sources named in `snapshot`.
    pub fn update_selection(&mut self, snapshot: &SelectionSnapshot) {
        for r in &self.renderers {
            for s in r.sources() {
                let mut src = s.borrow_mut();
                if let Some(sel) = snapshot.get(&src.id()) {
                    src.selected = sel.clone();
                }
            }
        }
        self.scheduler.request(Instant::now());
    }

    // ---- coordinates and export ---------------------------------------------

    pub fn map_to_screen(&self, xs: &[f64], ys: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
        self.frame.map_to_screen(xs, ys, DEFAULT, DEFAULT)
    }

    pub fn map_from_screen(&self, sx: &[f64], sy: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
        self.frame.map_from_screen(sx, sy, DEFAULT, DEFAULT)
    }

    pub fn frame_box(&self) -> LayoutBox {
        self.frame.bbox()
    }

    pub fn panel_box(&self, id: RendererId) -> Option<LayoutBox> {
        self.layout.panel_box(id)
    }

    /// PNG (raster, GPU) or PDF (vector) of the current state. Paints first
    /// when nothing was painted yet or a paint is pending.
    pub fn export(&mut self) -> Result<Artifact> {
        if self.scheduler.paint_count() == 0 || self.scheduler.is_pending() {
            self.paint()?;
        }
        self.canvas.export()
    }

    pub fn to_png(&mut self) -> Result<Vec<u8>> {
        if self.scheduler.paint_count() == 0 || self.scheduler.is_pending() {
            self.paint()?;
        }
        self.canvas.to_png()
    }

    // ---- paint pass ---------------------------------------------------------

    fn data_stamp_now(&self) -> Vec<(RendererId, u64, bool)> {
        self.renderers.iter().map(|r| (r.id(), r.data_revision(), r.visible())).collect()
    }

    fn data_ranges_dirty(&self) -> bool {
        self.frame
            .x_ranges()
            .chain(self.frame.y_ranges())
            .any(|(_, r)| r.borrow().as_data().is_some_and(|d| d.needs_update()))
    }

    fn aspect_ratio(&self) -> Option<f64> {
        if !self.options.match_aspect {
            return None;
        }
        let fb = self.frame.bbox();
        (fb.width > 0.0 && fb.height > 0.0).then(|| fb.width / (self.options.aspect_scale * fb.height))
    }

    /// Recompute every DataRange1d from the renderers bound to it by name.
    fn update_dataranges(&mut self) -> bool {
        let ratio = self.aspect_ratio();
        let mut changed = false;
        for dim in [Dimension::X, Dimension::Y] {
            let ranges: Vec<(String, RangeRef)> = match dim {
                Dimension::X => self.frame.x_ranges().map(|(n, r)| (n.clone(), r.clone())).collect(),
                Dimension::Y => self.frame.y_ranges().map(|(n, r)| (n.clone(), r.clone())).collect(),
            };
            for (name, range) in ranges {
                let mut r = range.borrow_mut();
                let Some(dr) = r.as_data_mut() else { continue };
                let log = dr.config.scale_hint == ScaleHint::Log;
                let only_visible = dr.config.only_visible;
                let bounds: BTreeMap<RendererId, BBox> = self
                    .renderers
                    .iter()
                    .filter(|v| !only_visible || v.visible())
                    .filter(|v| match dim {
                        Dimension::X => v.x_range_name() == name,
                        Dimension::Y => v.y_range_name() == name,
                    })
                    .filter_map(|v| {
                        let b = if log { v.log_bounds() } else { v.bounds() };
                        b.map(|b| (v.id(), b))
                    })
                    .collect();
                changed |= dr.update(&bounds, dim, self.id, ratio);
            }
        }
        changed
    }

    fn update_layout(&mut self) -> Result<()> {
        let panels: Vec<PanelSpec> = self
            .renderers
            .iter()
            .filter(|r| r.visible())
            .filter_map(|r| r.panel().map(|(side, size)| PanelSpec { id: r.id(), side, size }))
            .collect();
        let (w, h, border) = (self.options.width, self.options.height, self.options.min_border);
        if let Some((pw, ph, pb, pp)) = &self.layout_inputs {
            if (*pw, *ph, *pb) == (w, h, border) && *pp == panels {
                return Ok(());
            }
        }
        if self.layout.compute(w as f64, h as f64, border, &panels)? {
            self.layout_solves += 1;
            self.frame.set_bbox(self.layout.frame_box());
        }
        self.layout_inputs = Some((w, h, border, panels));
        Ok(())
    }

    fn paint_pass(&mut self, now: Instant) -> Result<()> {
        let ratio = self.options.pixel_ratio();
        self.canvas.resize(self.options.width, self.options.height, ratio)?;

        for r in &mut self.renderers {
            r.sync_data();
        }
        let stamp = self.data_stamp_now();
        if self.data_stamp.as_ref() != Some(&stamp) || self.data_ranges_dirty() {
            if self.options.match_aspect && self.frame.bbox().width <= 0.0 {
                self.update_layout()?;
            }
            if self.update_dataranges() {
                self.range_updates += 1;
            }
            self.data_stamp = Some(stamp);
            self.aspect_box = Some(self.frame.bbox());
        }

        for r in &mut self.renderers {
            r.update_panel(&self.frame)?;
        }
        self.update_layout()?;
        // Aspect-matched ranges follow the frame's shape.
        let fb = self.frame.bbox();
        if self.options.match_aspect && fb.width > 0.0 && fb.height > 0.0 && self.aspect_box != Some(fb) {
            if self.update_dataranges() {
                self.range_updates += 1;
            }
            self.aspect_box = Some(fb);
        }
        for r in &mut self.renderers {
            r.map_data(&self.frame)?;
        }

        self.lod = Lod {
            active: self.lod_active(now),
            factor: self.options.lod_factor,
            threshold: self.options.lod_threshold,
        };
        tracing::trace!(plot = self.id.0, lod = self.lod.active, "paint pass");

        let Self { canvas, renderers, frame, layout, options, lod, .. } = self;
        let lod = *lod;
        canvas.render(|layers| paint_levels(layers, renderers, frame, layout, options, lod))??;

        self.finished = self.renderers.iter().all(|r| r.has_finished());
        Ok(())
    }
}

fn fill_paint(color: skia::Color) -> skia::Paint {
    let mut p = skia::Paint::default();
    p.set_color(color);
    p
}

fn paint_level(
    level: RenderLevel,
    layers: &mut FrameLayers<'_>,
    renderers: &mut [Box<dyn RendererView>],
    frame: &CartesianFrame,
    layout: &PlotLayout,
    theme: &Theme,
    lod: Lod,
) -> Result<()> {
    for r in renderers.iter_mut().filter(|r| r.level() == level && r.visible()) {
        let mut ctx = PaintContext { layers: &mut *layers, frame, layout, theme, lod };
        r.paint(&mut ctx)?;
    }
    Ok(())
}

fn paint_levels(
    layers: &mut FrameLayers<'_>,
    renderers: &mut [Box<dyn RendererView>],
    frame: &CartesianFrame,
    layout: &PlotLayout,
    options: &PlotOptions,
    lod: Lod,
) -> Result<()> {
    let theme = &options.theme;
    let fb = frame.bbox().to_rect();
    {
        let c = layers.primary();
        c.clear(theme.border_fill);
        c.draw_rect(fb, &fill_paint(theme.background_fill));
    }

    layers.push_clip(fb);
    for level in RenderLevel::FRAME {
        if let Err(err) = paint_level(level, layers, renderers, frame, layout, theme, lod) {
            layers.pop_clip();
            return Err(err);
        }
    }
    layers.pop_clip();
    layers.blit_gpu();

    if options.outline {
        let mut p = fill_paint(theme.outline);
        p.set_style(skia::paint::Style::Stroke);
        p.set_stroke_width(1.0);
        layers.primary().draw_rect(fb, &p);
    }
    for level in [RenderLevel::Annotation, RenderLevel::Overlay] {
        paint_level(level, layers, renderers, frame, layout, theme, lod)?;
    }
    Ok(())
}

impl Drop for PlotView {
    fn drop(&mut self) {
        for (_, r) in self.frame.x_ranges().chain(self.frame.y_ranges()) {
            if let Ok(mut r) = r.try_borrow_mut() {
                if let Some(dr) = r.as_data_mut() {
                    dr.detach(self.id);
                }
            }
        }
    }
}
