// File: crates/plot-core/src/guide.rs
// Summary: Side-panel guides (axis, title, colorbar): panel thickness metrics and painting.
// Notes:
// - Text extents are estimated from font size and character count so panel
//   sizes do not depend on which fonts the host has installed.

use skia_safe as skia;

use crate::error::Result;
use crate::frame::{CartesianFrame, DEFAULT};
use crate::layout::Side;
use crate::renderer::{PaintContext, RendererView};
use crate::scale::ScaleKind;
use crate::types::{Dimension, RenderLevel, RendererId};

/// Average glyph advance as a fraction of the font size.
const CHAR_WIDTH_FACTOR: f64 = 0.6;
const LINE_HEIGHT_FACTOR: f64 = 1.2;

pub fn text_width(text: &str, font_size: f32) -> f64 {
    text.chars().count() as f64 * font_size as f64 * CHAR_WIDTH_FACTOR
}

pub fn line_height(font_size: f32) -> f64 {
    font_size as f64 * LINE_HEIGHT_FACTOR
}

/// Round tick positions (1, 2, 5 x 10^k steps) covering `[lo, hi]`, plus the step.
pub fn nice_ticks(lo: f64, hi: f64, desired: usize) -> (Vec<f64>, f64) {
    let (lo, hi) = (lo.min(hi), lo.max(hi));
    if !(lo.is_finite() && hi.is_finite()) {
        return (Vec::new(), 1.0);
    }
    if lo == hi {
        return (vec![lo], 1.0);
    }
    let raw = (hi - lo) / desired.max(1) as f64;
    let mag = 10f64.powf(raw.log10().floor());
    let norm = raw / mag;
    let step = if norm < 1.5 {
        1.0
    } else if norm < 3.0 {
        2.0
    } else if norm < 7.0 {
        5.0
    } else {
        10.0
    } * mag;
    let first = (lo / step).ceil() * step;
    // Step below the float resolution at this magnitude: ticks would not advance.
    if !(step > 0.0) || first + step == first {
        return (vec![lo], step);
    }
    let count = ((hi - first) / step + 1e-9).floor();
    if !(count >= 0.0) {
        return (vec![lo], step);
    }
    let count = (count as usize + 1).min(desired.max(1) * 4);
    let ticks = (0..count)
        .map(|i| first + i as f64 * step)
        .map(|t| if t.abs() < step * 1e-9 { 0.0 } else { t })
        .collect();
    (ticks, step)
}

/// Decades inside `[lo, hi]`; falls back to linear ticks when fewer than two fit.
pub fn log_ticks(lo: f64, hi: f64, desired: usize) -> Vec<f64> {
    let (lo, hi) = (lo.min(hi), lo.max(hi));
    if lo > 0.0 && hi.is_finite() {
        let (a, b) = (lo.log10().ceil() as i32, hi.log10().floor() as i32);
        if b > a {
            return (a..=b).map(|e| 10f64.powi(e)).collect();
        }
    }
    nice_ticks(lo.max(f64::MIN_POSITIVE), hi, desired).0
}

pub fn format_tick(v: f64, step: f64) -> String {
    let a = v.abs();
    if a != 0.0 && (a >= 1e6 || a < 1e-4) {
        return format!("{v:.1e}");
    }
    let decimals = if step > 0.0 && step < 1.0 { (-step.log10().floor()) as usize } else { 0 };
    format!("{v:.decimals$}")
}

fn text_paint(color: skia::Color) -> skia::Paint {
    let mut p = skia::Paint::default();
    p.set_anti_alias(true);
    p.set_color(color);
    p
}

fn line_paint(color: skia::Color, width: f32) -> skia::Paint {
    let mut p = skia::Paint::default();
    p.set_anti_alias(true);
    p.set_style(skia::paint::Style::Stroke);
    p.set_stroke_width(width);
    p.set_color(color);
    p
}

fn font(size: f32) -> skia::Font {
    let mut f = skia::Font::default();
    f.set_size(size);
    f
}

// ---- Axis -------------------------------------------------------------------

pub struct AxisView {
    id: RendererId,
    dim: Dimension,
    side: Side,
    range_name: String,
    pub label: Option<String>,
    pub desired_ticks: usize,
    pub major_tick_out: f64,
    pub major_label_standoff: f64,
    pub axis_label_standoff: f64,
    pub font_size: f32,
    pub label_font_size: f32,
    /// Data positions and text of the current ticks.
    ticks: Vec<(f64, String)>,
}

impl AxisView {
    /// X axes go below the frame, y axes to the left.
    pub fn new(dim: Dimension) -> Self {
        let side = match dim {
            Dimension::X => Side::Below,
            Dimension::Y => Side::Left,
        };
        Self::on_side(dim, side)
    }

    pub fn on_side(dim: Dimension, side: Side) -> Self {
        Self {
            id: RendererId::fresh(),
            dim,
            side,
            range_name: DEFAULT.to_string(),
            label: None,
            desired_ticks: 6,
            major_tick_out: 6.0,
            major_label_standoff: 5.0,
            axis_label_standoff: 5.0,
            font_size: 11.0,
            label_font_size: 13.0,
            ticks: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_range(mut self, name: &str) -> Self {
        self.range_name = name.to_string();
        self
    }

    pub fn ticks(&self) -> &[(f64, String)] {
        &self.ticks
    }

    fn label_extent(&self) -> f64 {
        if self.side.is_horizontal() {
            if self.ticks.is_empty() { 0.0 } else { line_height(self.font_size) }
        } else {
            self.ticks.iter().map(|(_, t)| text_width(t, self.font_size)).fold(0.0, f64::max)
        }
    }
}

impl RendererView for AxisView {
    fn id(&self) -> RendererId { self.id }
    fn level(&self) -> RenderLevel { RenderLevel::Annotation }

    fn panel(&self) -> Option<(Side, f64)> {
        let mut size = self.major_tick_out + self.major_label_standoff + self.label_extent();
        if self.label.is_some() {
            size += self.axis_label_standoff + line_height(self.label_font_size);
        }
        Some((self.side, size.ceil()))
    }

    fn update_panel(&mut self, frame: &CartesianFrame) -> Result<()> {
        let range = frame.range(self.dim, &self.range_name)?;
        let kind = frame.scale(self.dim, &self.range_name)?.kind();
        let r = range.borrow();
        self.ticks = match (kind, r.as_factor()) {
            (ScaleKind::Categorical, Some(fr)) => fr
                .factors()
                .iter()
                .filter_map(|f| fr.synthetic(f).map(|v| (v, f.clone())))
                .collect(),
            (ScaleKind::Log, _) => log_ticks(r.min(), r.max(), self.desired_ticks)
                .into_iter()
                .map(|v| (v, format_tick(v, v)))
                .collect(),
            _ => {
                let (ticks, step) = nice_ticks(r.min(), r.max(), self.desired_ticks);
                ticks.into_iter().map(|v| (v, format_tick(v, step))).collect()
            }
        };
        Ok(())
    }

    fn paint(&mut self, ctx: &mut PaintContext<'_, '_>) -> Result<()> {
        let Some(pb) = ctx.layout.panel_box(self.id) else { return Ok(()) };
        let scale = ctx.frame.scale(self.dim, &self.range_name)?;
        let fb = ctx.frame.bbox();
        let canvas = ctx.canvas();
        let axis = line_paint(ctx.theme.axis_line, 1.0);
        let tick = line_paint(ctx.theme.tick, 1.0);
        let text = text_paint(ctx.theme.axis_label);
        let tick_font = font(self.font_size);
        let out = self.major_tick_out as f32;
        let standoff = self.major_label_standoff as f32;

        for (v, label) in &self.ticks {
            let s = scale.compute(*v);
            if !s.is_finite() {
                continue;
            }
            let s = s as f32;
            let w = text_width(label, self.font_size) as f32;
            match self.side {
                Side::Below => {
                    let y = pb.top as f32;
                    canvas.draw_line((s, y), (s, y + out), &tick);
                    canvas.draw_str(label, (s - w / 2.0, y + out + standoff + self.font_size), &tick_font, &text);
                }
                Side::Above => {
                    let y = pb.bottom() as f32;
                    canvas.draw_line((s, y), (s, y - out), &tick);
                    canvas.draw_str(label, (s - w / 2.0, y - out - standoff), &tick_font, &text);
                }
                Side::Left => {
                    let x = pb.right() as f32;
                    canvas.draw_line((x - out, s), (x, s), &tick);
                    canvas.draw_str(label, (x - out - standoff - w, s + self.font_size / 3.0), &tick_font, &text);
                }
                Side::Right => {
                    let x = pb.left as f32;
                    canvas.draw_line((x, s), (x + out, s), &tick);
                    canvas.draw_str(label, (x + out + standoff, s + self.font_size / 3.0), &tick_font, &text);
                }
            }
        }

        let (l, t, r, b) = (fb.left as f32, fb.top as f32, fb.right() as f32, fb.bottom() as f32);
        match self.side {
            Side::Below => canvas.draw_line((l, b), (r, b), &axis),
            Side::Above => canvas.draw_line((l, t), (r, t), &axis),
            Side::Left => canvas.draw_line((l, t), (l, b), &axis),
            Side::Right => canvas.draw_line((r, t), (r, b), &axis),
        };

        if let Some(label) = &self.label {
            let label_font = font(self.label_font_size);
            let w = text_width(label, self.label_font_size) as f32;
            let lh = self.label_font_size;
            match self.side {
                Side::Below => {
                    let cx = (l + r) / 2.0;
                    canvas.draw_str(label, (cx - w / 2.0, pb.bottom() as f32 - lh * 0.2), &label_font, &text);
                }
                Side::Above => {
                    let cx = (l + r) / 2.0;
                    canvas.draw_str(label, (cx - w / 2.0, pb.top as f32 + lh), &label_font, &text);
                }
                Side::Left | Side::Right => {
                    let cy = (t + b) / 2.0;
                    let x = if self.side == Side::Left { pb.left as f32 + lh } else { pb.right() as f32 - lh * 0.2 };
                    canvas.save();
                    canvas.translate((x, cy));
                    canvas.rotate(-90.0, None);
                    canvas.draw_str(label, (-w / 2.0, 0.0), &label_font, &text);
                    canvas.restore();
                }
            }
        }
        Ok(())
    }
}

// ---- Title ------------------------------------------------------------------

pub struct TitleView {
    id: RendererId,
    side: Side,
    pub text: String,
    pub font_size: f32,
    pub standoff: f64,
}

impl TitleView {
    pub fn new(text: impl Into<String>) -> Self {
        Self { id: RendererId::fresh(), side: Side::Above, text: text.into(), font_size: 13.0, standoff: 10.0 }
    }

    pub fn on_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }
}

impl RendererView for TitleView {
    fn id(&self) -> RendererId { self.id }
    fn level(&self) -> RenderLevel { RenderLevel::Annotation }

    fn panel(&self) -> Option<(Side, f64)> {
        if self.text.is_empty() {
            return Some((self.side, 0.0));
        }
        Some((self.side, (line_height(self.font_size) + self.standoff).ceil()))
    }

    fn paint(&mut self, ctx: &mut PaintContext<'_, '_>) -> Result<()> {
        let Some(pb) = ctx.layout.panel_box(self.id) else { return Ok(()) };
        if self.text.is_empty() {
            return Ok(());
        }
        let canvas = ctx.canvas();
        let paint = text_paint(ctx.theme.axis_label);
        let f = font(self.font_size);
        let half = (self.standoff / 2.0) as f32;
        match self.side {
            Side::Above => {
                canvas.draw_str(&self.text, (pb.left as f32, pb.bottom() as f32 - half), &f, &paint);
            }
            Side::Below => {
                canvas.draw_str(&self.text, (pb.left as f32, pb.top as f32 + half + self.font_size), &f, &paint);
            }
            Side::Left | Side::Right => {
                let w = text_width(&self.text, self.font_size) as f32;
                let cy = (pb.top + pb.height / 2.0) as f32;
                let x = (pb.left + pb.width / 2.0) as f32 + self.font_size / 3.0;
                canvas.save();
                canvas.translate((x, cy));
                canvas.rotate(-90.0, None);
                canvas.draw_str(&self.text, (-w / 2.0, 0.0), &f, &paint);
                canvas.restore();
            }
        }
        Ok(())
    }
}

// ---- ColorBar ---------------------------------------------------------------

/// Linear color mapper legend: `palette[0]` at `low`, last entry at `high`.
pub struct ColorBarView {
    id: RendererId,
    side: Side,
    pub low: f64,
    pub high: f64,
    pub palette: Vec<skia::Color>,
    pub bar_width: f64,
    pub padding: f64,
    pub tick_out: f64,
    pub label_standoff: f64,
    pub font_size: f32,
    ticks: Vec<(f64, String)>,
}

impl ColorBarView {
    pub fn new(low: f64, high: f64, palette: Vec<skia::Color>) -> Self {
        let mut view = Self {
            id: RendererId::fresh(),
            side: Side::Right,
            low,
            high,
            palette,
            bar_width: 20.0,
            padding: 10.0,
            tick_out: 4.0,
            label_standoff: 4.0,
            font_size: 10.0,
            ticks: Vec::new(),
        };
        view.refresh_ticks();
        view
    }

    pub fn on_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    fn refresh_ticks(&mut self) {
        let (ticks, step) = nice_ticks(self.low, self.high, 5);
        self.ticks = ticks.into_iter().map(|v| (v, format_tick(v, step))).collect();
    }

    /// Palette entry for a value; out-of-range values clamp to the ends.
    pub fn color_for(&self, v: f64) -> Option<skia::Color> {
        let n = self.palette.len();
        if n == 0 || !v.is_finite() {
            return None;
        }
        let span = self.high - self.low;
        let t = if span == 0.0 { 0.0 } else { ((v - self.low) / span).clamp(0.0, 1.0) };
        let i = ((t * n as f64).floor() as usize).min(n - 1);
        Some(self.palette[i])
    }
}

impl RendererView for ColorBarView {
    fn id(&self) -> RendererId { self.id }
    fn level(&self) -> RenderLevel { RenderLevel::Annotation }

    fn panel(&self) -> Option<(Side, f64)> {
        let labels = if self.side.is_horizontal() {
            line_height(self.font_size)
        } else {
            self.ticks.iter().map(|(_, t)| text_width(t, self.font_size)).fold(0.0, f64::max)
        };
        Some((self.side, (2.0 * self.padding + self.bar_width + self.tick_out + self.label_standoff + labels).ceil()))
    }

    fn update_panel(&mut self, _frame: &CartesianFrame) -> Result<()> {
        self.refresh_ticks();
        Ok(())
    }

    fn paint(&mut self, ctx: &mut PaintContext<'_, '_>) -> Result<()> {
        let Some(pb) = ctx.layout.panel_box(self.id) else { return Ok(()) };
        let n = self.palette.len();
        if n == 0 {
            return Ok(());
        }
        let canvas = ctx.canvas();
        let vertical = !self.side.is_horizontal();
        let pad = self.padding;
        let (x0, y0, x1, y1) = if vertical {
            (pb.left + pad, pb.top + pad, pb.left + pad + self.bar_width, pb.bottom() - pad)
        } else {
            (pb.left + pad, pb.top + pad, pb.right() - pad, pb.top + pad + self.bar_width)
        };
        if x1 <= x0 || y1 <= y0 {
            return Ok(());
        }

        let mut fill = skia::Paint::default();
        fill.set_style(skia::paint::Style::Fill);
        for (i, c) in self.palette.iter().enumerate() {
            let (a, b) = (i as f64 / n as f64, (i + 1) as f64 / n as f64);
            let rect = if vertical {
                skia::Rect::from_ltrb(x0 as f32, (y1 - b * (y1 - y0)) as f32, x1 as f32, (y1 - a * (y1 - y0)) as f32)
            } else {
                skia::Rect::from_ltrb((x0 + a * (x1 - x0)) as f32, y0 as f32, (x0 + b * (x1 - x0)) as f32, y1 as f32)
            };
            fill.set_color(*c);
            canvas.draw_rect(rect, &fill);
        }
        canvas.draw_rect(skia::Rect::from_ltrb(x0 as f32, y0 as f32, x1 as f32, y1 as f32), &line_paint(ctx.theme.outline, 1.0));

        let span = self.high - self.low;
        if span == 0.0 {
            return Ok(());
        }
        let tick = line_paint(ctx.theme.tick, 1.0);
        let text = text_paint(ctx.theme.axis_label);
        let f = font(self.font_size);
        for (v, label) in &self.ticks {
            let t = (v - self.low) / span;
            if vertical {
                let y = (y1 - t * (y1 - y0)) as f32;
                let x = x1 as f32;
                canvas.draw_line((x, y), (x + self.tick_out as f32, y), &tick);
                let lx = x + (self.tick_out + self.label_standoff) as f32;
                canvas.draw_str(label, (lx, y + self.font_size / 3.0), &f, &text);
            } else {
                let x = (x0 + t * (x1 - x0)) as f32;
                let y = y1 as f32;
                canvas.draw_line((x, y), (x, y + self.tick_out as f32), &tick);
                let w = text_width(label, self.font_size) as f32;
                canvas.draw_str(label, (x - w / 2.0, y + (self.tick_out + self.label_standoff) as f32 + self.font_size), &f, &text);
            }
        }
        Ok(())
    }
}
