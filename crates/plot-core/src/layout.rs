// File: crates/plot-core/src/layout.rs
// Summary: Constraint layout of canvas, central frame and stacked side panels.
// Notes:
// - Panels stack outward from the frame edge in registration order.
// - Constraints are rebuilt only when the panel topology or min_border changes;
//   size-only changes go through edit-variable suggestions.
// - Zero or non-finite canvas sizes skip the solve (the previous boxes stay).

use std::collections::HashMap;

use crate::geometry::LayoutBox;
use crate::solver::{strength, Constraint, Solver, SolverResult, Variable};
use crate::types::{Insets, RendererId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
    Above,
    Below,
}

impl Side {
    pub fn is_horizontal(self) -> bool {
        matches!(self, Side::Above | Side::Below)
    }
}

/// A side panel request: which renderer, where, and how thick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanelSpec {
    pub id: RendererId,
    pub side: Side,
    pub size: f64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct TopologyKey {
    panels: Vec<(RendererId, Side)>,
    min_border: Insets,
}

#[derive(Clone, Copy, Debug)]
struct PanelVars {
    id: RendererId,
    side: Side,
    /// Lower coordinate along the stacking axis.
    start: Variable,
    end: Variable,
    size: Variable,
}

#[derive(Clone, Copy, Debug)]
struct FrameVars {
    left: Variable,
    top: Variable,
    right: Variable,
    bottom: Variable,
}

#[derive(Debug)]
pub struct PlotLayout {
    solver: Solver,
    width: Variable,
    height: Variable,
    frame: FrameVars,
    panels: Vec<PanelVars>,
    key: Option<TopologyKey>,
    rebuilds: u64,
    canvas_box: LayoutBox,
    frame_box: LayoutBox,
    panel_boxes: HashMap<RendererId, LayoutBox>,
}

impl Default for PlotLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl PlotLayout {
    pub fn new() -> Self {
        Self {
            solver: Solver::new(),
            width: Variable::new(),
            height: Variable::new(),
            frame: FrameVars {
                left: Variable::new(),
                top: Variable::new(),
                right: Variable::new(),
                bottom: Variable::new(),
            },
            panels: Vec::new(),
            key: None,
            rebuilds: 0,
            canvas_box: LayoutBox::default(),
            frame_box: LayoutBox::default(),
            panel_boxes: HashMap::new(),
        }
    }

    pub fn canvas_box(&self) -> LayoutBox { self.canvas_box }
    pub fn frame_box(&self) -> LayoutBox { self.frame_box }

    pub fn panel_box(&self, id: RendererId) -> Option<LayoutBox> {
        self.panel_boxes.get(&id).copied()
    }

    /// How many times the constraint set was rebuilt from scratch.
    pub fn rebuild_count(&self) -> u64 { self.rebuilds }

    /// Solve for the given canvas size. Returns false when the solve was
    /// skipped because the size is degenerate.
    pub fn compute(&mut self, width: f64, height: f64, min_border: Insets, panels: &[PanelSpec]) -> SolverResult<bool> {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            tracing::debug!(width, height, "skipping layout for degenerate canvas");
            return Ok(false);
        }

        let key = TopologyKey {
            panels: panels.iter().map(|p| (p.id, p.side)).collect(),
            min_border,
        };
        if self.key.as_ref() != Some(&key) {
            self.rebuild(panels, min_border)?;
            self.key = Some(key);
        }

        self.solver.suggest_value(self.width, width)?;
        self.solver.suggest_value(self.height, height)?;
        for (vars, spec) in self.panels.iter().zip(panels) {
            self.solver.suggest_value(vars.size, spec.size.max(0.0))?;
        }
        self.solver.update_variables();
        self.read_boxes();
        Ok(true)
    }

    fn rebuild(&mut self, panels: &[PanelSpec], min_border: Insets) -> SolverResult<()> {
        self.solver.reset();
        self.rebuilds += 1;
        tracing::debug!(panels = panels.len(), rebuilds = self.rebuilds, "rebuilding layout constraints");

        let s = &mut self.solver;
        let f = self.frame;
        let (w, h) = (self.width, self.height);

        s.add_edit_variable(w, strength::STRONG)?;
        s.add_edit_variable(h, strength::STRONG)?;
        s.add_constraint(Constraint::ge(w, 0.0, strength::REQUIRED))?;
        s.add_constraint(Constraint::ge(h, 0.0, strength::REQUIRED))?;

        // The frame takes whatever the panels leave over.
        s.add_constraint(Constraint::eq(f.left, 0.0, strength::WEAK))?;
        s.add_constraint(Constraint::eq(f.top, 0.0, strength::WEAK))?;
        s.add_constraint(Constraint::eq(f.right, w, strength::WEAK))?;
        s.add_constraint(Constraint::eq(f.bottom, h, strength::WEAK))?;
        s.add_constraint(Constraint::ge(f.right - f.left, 0.0, strength::STRONG))?;
        s.add_constraint(Constraint::ge(f.bottom - f.top, 0.0, strength::STRONG))?;

        self.panels.clear();
        for side in [Side::Left, Side::Right, Side::Above, Side::Below] {
            let mut outer: Option<PanelVars> = None;
            for spec in panels.iter().filter(|p| p.side == side) {
                let vars = PanelVars {
                    id: spec.id,
                    side,
                    start: Variable::new(),
                    end: Variable::new(),
                    size: Variable::new(),
                };
                s.add_edit_variable(vars.size, strength::STRONG)?;
                s.add_constraint(Constraint::eq(vars.end - vars.start, vars.size, strength::REQUIRED))?;
                let abut = match (side, outer) {
                    (Side::Left, None) => Constraint::eq(vars.end, f.left, strength::REQUIRED),
                    (Side::Right, None) => Constraint::eq(vars.start, f.right, strength::REQUIRED),
                    (Side::Above, None) => Constraint::eq(vars.end, f.top, strength::REQUIRED),
                    (Side::Below, None) => Constraint::eq(vars.start, f.bottom, strength::REQUIRED),
                    (Side::Left | Side::Above, Some(prev)) => Constraint::eq(vars.end, prev.start, strength::REQUIRED),
                    (Side::Right | Side::Below, Some(prev)) => Constraint::eq(vars.start, prev.end, strength::REQUIRED),
                };
                s.add_constraint(abut)?;
                outer = Some(vars);
                self.panels.push(vars);
            }

            let border = match side {
                Side::Left => min_border.left,
                Side::Right => min_border.right,
                Side::Above => min_border.top,
                Side::Below => min_border.bottom,
            } as f64;
            let edge = match (side, outer) {
                (Side::Left, None) => Constraint::ge(f.left, border, strength::REQUIRED),
                (Side::Right, None) => Constraint::le(f.right, w - border, strength::REQUIRED),
                (Side::Above, None) => Constraint::ge(f.top, border, strength::REQUIRED),
                (Side::Below, None) => Constraint::le(f.bottom, h - border, strength::REQUIRED),
                (Side::Left | Side::Above, Some(o)) => Constraint::ge(o.start, border, strength::REQUIRED),
                (Side::Right, Some(o)) => Constraint::le(o.end, w - border, strength::REQUIRED),
                (Side::Below, Some(o)) => Constraint::le(o.end, h - border, strength::REQUIRED),
            };
            s.add_constraint(edge)?;
        }

        // Keep suggestion order aligned with the caller's panel order.
        let order: HashMap<RendererId, usize> = panels.iter().enumerate().map(|(i, p)| (p.id, i)).collect();
        self.panels.sort_by_key(|p| order.get(&p.id).copied().unwrap_or(usize::MAX));
        Ok(())
    }

    fn read_boxes(&mut self) {
        let s = &self.solver;
        let (w, h) = (s.value(self.width), s.value(self.height));
        self.canvas_box = LayoutBox::new(0.0, 0.0, w, h);

        let f = self.frame;
        let (fl, ft, fr, fb) = (s.value(f.left), s.value(f.top), s.value(f.right), s.value(f.bottom));
        self.frame_box = LayoutBox::from_ltrb(fl, ft, fr, fb);

        self.panel_boxes.clear();
        for p in &self.panels {
            let (a, b) = (s.value(p.start), s.value(p.end));
            let bx = if p.side.is_horizontal() {
                LayoutBox::from_ltrb(fl, a, fr, b)
            } else {
                LayoutBox::from_ltrb(a, ft, b, fb)
            };
            self.panel_boxes.insert(p.id, bx);
        }
    }
}
