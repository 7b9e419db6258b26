// File: crates/plot-core/src/solver.rs
// Summary: Incremental Cassowary linear constraint solver (simplex over a tableau of rows).
// Notes:
// - Required constraints must hold; weaker ones are minimised by weighted error.
// - Edit variables allow cheap re-solves: `suggest_value` + dual simplex, no rebuild.
// - Symbol ordering (BTreeMap) keeps pivot choice deterministic.

use std::collections::{BTreeMap, HashMap};
use std::ops::{Add, Mul, Neg, Sub};
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    #[error("constraint already added")]
    DuplicateConstraint,
    #[error("unknown constraint")]
    UnknownConstraint,
    #[error("required constraint cannot be satisfied")]
    Unsatisfiable,
    #[error("edit variable already registered")]
    DuplicateEditVariable,
    #[error("unknown edit variable")]
    UnknownEditVariable,
    #[error("edit variables cannot have required strength")]
    BadRequiredStrength,
    #[error("objective function is unbounded")]
    Unbounded,
    #[error("dual optimize failed")]
    DualOptimizeFailed,
    #[error("internal solver error: {0}")]
    Internal(&'static str),
}

pub type SolverResult<T> = std::result::Result<T, SolverError>;

pub mod strength {
    /// Build a strength from three tiers plus a weight.
    pub fn create(a: f64, b: f64, c: f64, w: f64) -> f64 {
        let mut result = 0.0;
        result += (a * w).clamp(0.0, 1000.0) * 1_000_000.0;
        result += (b * w).clamp(0.0, 1000.0) * 1000.0;
        result += (c * w).clamp(0.0, 1000.0);
        result
    }

    pub const REQUIRED: f64 = 1_001_001_000.0;
    pub const STRONG: f64 = 1_000_000.0;
    pub const MEDIUM: f64 = 1000.0;
    pub const WEAK: f64 = 1.0;

    pub fn clip(value: f64) -> f64 {
        value.clamp(0.0, REQUIRED)
    }
}

static NEXT_VARIABLE: AtomicU64 = AtomicU64::new(1);

/// Opaque solver variable; its value lives in the solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(u64);

impl Variable {
    pub fn new() -> Self {
        Self(NEXT_VARIABLE.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for Variable {
    fn default() -> Self {
        Self::new()
    }
}

/// Linear expression `sum(coeff * var) + constant`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Expression {
    pub terms: Vec<(Variable, f64)>,
    pub constant: f64,
}

impl Expression {
    pub fn constant(value: f64) -> Self {
        Self { terms: Vec::new(), constant: value }
    }

    /// Merge duplicate variables.
    fn reduced(&self) -> BTreeMap<Variable, f64> {
        let mut out = BTreeMap::new();
        for &(v, c) in &self.terms {
            *out.entry(v).or_insert(0.0) += c;
        }
        out
    }
}

impl From<Variable> for Expression {
    fn from(v: Variable) -> Self {
        Self { terms: vec![(v, 1.0)], constant: 0.0 }
    }
}

impl From<f64> for Expression {
    fn from(c: f64) -> Self {
        Self::constant(c)
    }
}

impl<T: Into<Expression>> Add<T> for Expression {
    type Output = Expression;
    fn add(mut self, rhs: T) -> Expression {
        let rhs = rhs.into();
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
        self
    }
}

impl<T: Into<Expression>> Sub<T> for Expression {
    type Output = Expression;
    fn sub(self, rhs: T) -> Expression {
        self + (-rhs.into())
    }
}

impl Neg for Expression {
    type Output = Expression;
    fn neg(self) -> Expression {
        self * -1.0
    }
}

impl Mul<f64> for Expression {
    type Output = Expression;
    fn mul(mut self, k: f64) -> Expression {
        for t in &mut self.terms {
            t.1 *= k;
        }
        self.constant *= k;
        self
    }
}

impl<T: Into<Expression>> Add<T> for Variable {
    type Output = Expression;
    fn add(self, rhs: T) -> Expression {
        Expression::from(self) + rhs
    }
}

impl<T: Into<Expression>> Sub<T> for Variable {
    type Output = Expression;
    fn sub(self, rhs: T) -> Expression {
        Expression::from(self) - rhs
    }
}

impl Mul<f64> for Variable {
    type Output = Expression;
    fn mul(self, k: f64) -> Expression {
        Expression::from(self) * k
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelationalOperator {
    Le,
    Ge,
    Eq,
}

/// `expression op 0` with a strength.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    expression: Expression,
    op: RelationalOperator,
    strength: f64,
}

impl Constraint {
    /// `lhs op rhs`, stored as `lhs - rhs op 0`.
    pub fn new(lhs: impl Into<Expression>, op: RelationalOperator, rhs: impl Into<Expression>, strength: f64) -> Self {
        Self { expression: lhs.into() - rhs.into(), op, strength: strength::clip(strength) }
    }

    pub fn eq(lhs: impl Into<Expression>, rhs: impl Into<Expression>, strength: f64) -> Self {
        Self::new(lhs, RelationalOperator::Eq, rhs, strength)
    }

    pub fn ge(lhs: impl Into<Expression>, rhs: impl Into<Expression>, strength: f64) -> Self {
        Self::new(lhs, RelationalOperator::Ge, rhs, strength)
    }

    pub fn le(lhs: impl Into<Expression>, rhs: impl Into<Expression>, strength: f64) -> Self {
        Self::new(lhs, RelationalOperator::Le, rhs, strength)
    }

    pub fn strength(&self) -> f64 { self.strength }
    pub fn op(&self) -> RelationalOperator { self.op }
}

/// Handle returned by `Solver::add_constraint`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConstraintId(u64);

// ---- tableau ----------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum SymbolKind {
    Invalid,
    External,
    Slack,
    Error,
    Dummy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Symbol {
    id: u64,
    kind: SymbolKind,
}

impl Symbol {
    const INVALID: Symbol = Symbol { id: 0, kind: SymbolKind::Invalid };

    fn is_invalid(&self) -> bool {
        self.kind == SymbolKind::Invalid
    }

    fn is_pivotable(&self) -> bool {
        matches!(self.kind, SymbolKind::Slack | SymbolKind::Error)
    }
}

fn near_zero(v: f64) -> bool {
    v.abs() < 1.0e-8
}

#[derive(Clone, Debug, Default)]
struct Row {
    cells: BTreeMap<Symbol, f64>,
    constant: f64,
}

impl Row {
    fn new(constant: f64) -> Self {
        Self { cells: BTreeMap::new(), constant }
    }

    fn add(&mut self, value: f64) -> f64 {
        self.constant += value;
        self.constant
    }

    fn insert_symbol(&mut self, symbol: Symbol, coefficient: f64) {
        let entry = self.cells.entry(symbol).or_insert(0.0);
        *entry += coefficient;
        if near_zero(*entry) {
            self.cells.remove(&symbol);
        }
    }

    fn insert_row(&mut self, other: &Row, coefficient: f64) {
        self.constant += other.constant * coefficient;
        for (&s, &c) in &other.cells {
            self.insert_symbol(s, c * coefficient);
        }
    }

    fn remove(&mut self, symbol: Symbol) {
        self.cells.remove(&symbol);
    }

    fn reverse_sign(&mut self) {
        self.constant = -self.constant;
        for c in self.cells.values_mut() {
            *c = -*c;
        }
    }

    /// Solve `row == 0` for `symbol`; the symbol leaves the cells.
    fn solve_for(&mut self, symbol: Symbol) {
        let Some(c) = self.cells.remove(&symbol) else { return };
        let coeff = -1.0 / c;
        self.constant *= coeff;
        for v in self.cells.values_mut() {
            *v *= coeff;
        }
    }

    /// Solve `lhs == row` for `rhs`.
    fn solve_for_pair(&mut self, lhs: Symbol, rhs: Symbol) {
        self.insert_symbol(lhs, -1.0);
        self.solve_for(rhs);
    }

    fn coefficient_for(&self, symbol: Symbol) -> f64 {
        self.cells.get(&symbol).copied().unwrap_or(0.0)
    }

    fn substitute(&mut self, symbol: Symbol, row: &Row) {
        if let Some(c) = self.cells.remove(&symbol) {
            self.insert_row(row, c);
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Tag {
    marker: Symbol,
    other: Symbol,
}

#[derive(Clone, Copy, Debug)]
struct EditInfo {
    tag: Tag,
    constraint: ConstraintId,
    constant: f64,
}

#[derive(Clone, Copy)]
enum Objective {
    Main,
    Artificial,
}

#[derive(Debug, Default)]
pub struct Solver {
    constraints: HashMap<ConstraintId, (Constraint, Tag)>,
    rows: BTreeMap<Symbol, Row>,
    vars: BTreeMap<Variable, Symbol>,
    values: HashMap<Variable, f64>,
    edits: HashMap<Variable, EditInfo>,
    infeasible_rows: Vec<Symbol>,
    objective: Row,
    artificial: Option<Row>,
    id_tick: u64,
    constraint_tick: u64,
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every constraint and edit variable.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn has_constraint(&self, id: ConstraintId) -> bool {
        self.constraints.contains_key(&id)
    }

    pub fn has_edit_variable(&self, v: Variable) -> bool {
        self.edits.contains_key(&v)
    }

    /// Value computed by the last `update_variables`; 0 for unknown variables.
    pub fn value(&self, v: Variable) -> f64 {
        self.values.get(&v).copied().unwrap_or(0.0)
    }

    pub fn add_constraint(&mut self, constraint: Constraint) -> SolverResult<ConstraintId> {
        let (mut row, tag) = self.create_row(&constraint);
        let mut subject = Self::choose_subject(&row, &tag);

        if subject.is_invalid() && row.cells.keys().all(|s| s.kind == SymbolKind::Dummy) {
            if !near_zero(row.constant) {
                return Err(SolverError::Unsatisfiable);
            }
            subject = tag.marker;
        }

        if subject.is_invalid() {
            if !self.add_with_artificial_variable(&row)? {
                return Err(SolverError::Unsatisfiable);
            }
        } else {
            row.solve_for(subject);
            self.substitute(subject, &row);
            self.rows.insert(subject, row);
        }

        self.constraint_tick += 1;
        let id = ConstraintId(self.constraint_tick);
        self.constraints.insert(id, (constraint, tag));
        self.optimize(Objective::Main)?;
        Ok(id)
    }

    pub fn remove_constraint(&mut self, id: ConstraintId) -> SolverResult<()> {
        let (constraint, tag) = self.constraints.remove(&id).ok_or(SolverError::UnknownConstraint)?;
        self.remove_constraint_effects(&constraint, &tag);

        if self.rows.remove(&tag.marker).is_none() {
            let leaving = self.marker_leaving_symbol(tag.marker);
            if leaving.is_invalid() {
                return Err(SolverError::Internal("failed to find leaving row"));
            }
            let mut row = self.rows.remove(&leaving).ok_or(SolverError::Internal("leaving row vanished"))?;
            row.solve_for_pair(leaving, tag.marker);
            self.substitute(tag.marker, &row);
        }
        self.optimize(Objective::Main)
    }

    pub fn add_edit_variable(&mut self, v: Variable, strength: f64) -> SolverResult<()> {
        if self.edits.contains_key(&v) {
            return Err(SolverError::DuplicateEditVariable);
        }
        let strength = strength::clip(strength);
        if strength == strength::REQUIRED {
            return Err(SolverError::BadRequiredStrength);
        }
        let id = self.add_constraint(Constraint::new(v, RelationalOperator::Eq, 0.0, strength))?;
        let tag = self.constraints.get(&id).map(|(_, t)| *t).ok_or(SolverError::Internal("edit constraint missing"))?;
        self.edits.insert(v, EditInfo { tag, constraint: id, constant: 0.0 });
        Ok(())
    }

    pub fn remove_edit_variable(&mut self, v: Variable) -> SolverResult<()> {
        let info = self.edits.remove(&v).ok_or(SolverError::UnknownEditVariable)?;
        self.remove_constraint(info.constraint)
    }

    pub fn suggest_value(&mut self, v: Variable, value: f64) -> SolverResult<()> {
        let info = self.edits.get_mut(&v).ok_or(SolverError::UnknownEditVariable)?;
        let delta = value - info.constant;
        info.constant = value;
        let tag = info.tag;

        if let Some(row) = self.rows.get_mut(&tag.marker) {
            if row.add(-delta) < 0.0 {
                self.infeasible_rows.push(tag.marker);
            }
            return self.dual_optimize();
        }
        if let Some(row) = self.rows.get_mut(&tag.other) {
            if row.add(delta) < 0.0 {
                self.infeasible_rows.push(tag.other);
            }
            return self.dual_optimize();
        }
        for (&symbol, row) in self.rows.iter_mut() {
            let coeff = row.coefficient_for(tag.marker);
            if coeff != 0.0 && row.add(delta * coeff) < 0.0 && symbol.kind != SymbolKind::External {
                self.infeasible_rows.push(symbol);
            }
        }
        self.dual_optimize()
    }

    /// Copy the tableau's solution into the variable values.
    pub fn update_variables(&mut self) {
        for (&var, sym) in &self.vars {
            let value = self.rows.get(sym).map(|r| r.constant).unwrap_or(0.0);
            self.values.insert(var, value);
        }
    }

    // ---- internals ----

    fn make_symbol(&mut self, kind: SymbolKind) -> Symbol {
        self.id_tick += 1;
        Symbol { id: self.id_tick, kind }
    }

    fn var_symbol(&mut self, v: Variable) -> Symbol {
        if let Some(s) = self.vars.get(&v) {
            return *s;
        }
        let s = self.make_symbol(SymbolKind::External);
        self.vars.insert(v, s);
        s
    }

    fn create_row(&mut self, constraint: &Constraint) -> (Row, Tag) {
        let mut row = Row::new(constraint.expression.constant);
        for (v, coeff) in constraint.expression.reduced() {
            if near_zero(coeff) {
                continue;
            }
            let symbol = self.var_symbol(v);
            match self.rows.get(&symbol) {
                Some(basic) => row.insert_row(basic, coeff),
                None => row.insert_symbol(symbol, coeff),
            }
        }

        let strength = constraint.strength;
        let mut tag = Tag { marker: Symbol::INVALID, other: Symbol::INVALID };
        match constraint.op {
            RelationalOperator::Le | RelationalOperator::Ge => {
                let coeff = if constraint.op == RelationalOperator::Le { 1.0 } else { -1.0 };
                let slack = self.make_symbol(SymbolKind::Slack);
                tag.marker = slack;
                row.insert_symbol(slack, coeff);
                if strength < strength::REQUIRED {
                    let error = self.make_symbol(SymbolKind::Error);
                    tag.other = error;
                    row.insert_symbol(error, -coeff);
                    self.objective.insert_symbol(error, strength);
                }
            }
            RelationalOperator::Eq => {
                if strength < strength::REQUIRED {
                    let plus = self.make_symbol(SymbolKind::Error);
                    let minus = self.make_symbol(SymbolKind::Error);
                    tag.marker = plus;
                    tag.other = minus;
                    row.insert_symbol(plus, -1.0);
                    row.insert_symbol(minus, 1.0);
                    self.objective.insert_symbol(plus, strength);
                    self.objective.insert_symbol(minus, strength);
                } else {
                    let dummy = self.make_symbol(SymbolKind::Dummy);
                    tag.marker = dummy;
                    row.insert_symbol(dummy, 1.0);
                }
            }
        }

        if row.constant < 0.0 {
            row.reverse_sign();
        }
        (row, tag)
    }

    fn choose_subject(row: &Row, tag: &Tag) -> Symbol {
        if let Some(s) = row.cells.keys().find(|s| s.kind == SymbolKind::External) {
            return *s;
        }
        if tag.marker.is_pivotable() && row.coefficient_for(tag.marker) < 0.0 {
            return tag.marker;
        }
        if tag.other.is_pivotable() && row.coefficient_for(tag.other) < 0.0 {
            return tag.other;
        }
        Symbol::INVALID
    }

    fn add_with_artificial_variable(&mut self, row: &Row) -> SolverResult<bool> {
        let art = self.make_symbol(SymbolKind::Slack);
        self.rows.insert(art, row.clone());
        self.artificial = Some(row.clone());

        self.optimize(Objective::Artificial)?;
        let success = self.artificial.as_ref().map(|r| near_zero(r.constant)).unwrap_or(false);
        self.artificial = None;

        if let Some(mut basic) = self.rows.remove(&art) {
            if basic.cells.is_empty() {
                return Ok(success);
            }
            let entering = basic.cells.keys().copied().find(Symbol::is_pivotable).unwrap_or(Symbol::INVALID);
            if entering.is_invalid() {
                return Ok(false);
            }
            basic.solve_for_pair(art, entering);
            self.substitute(entering, &basic);
            self.rows.insert(entering, basic);
        }

        for r in self.rows.values_mut() {
            r.remove(art);
        }
        self.objective.remove(art);
        Ok(success)
    }

    fn substitute(&mut self, symbol: Symbol, row: &Row) {
        for (&s, r) in self.rows.iter_mut() {
            r.substitute(symbol, row);
            if s.kind != SymbolKind::External && r.constant < 0.0 {
                self.infeasible_rows.push(s);
            }
        }
        self.objective.substitute(symbol, row);
        if let Some(art) = self.artificial.as_mut() {
            art.substitute(symbol, row);
        }
    }

    fn optimize(&mut self, which: Objective) -> SolverResult<()> {
        loop {
            let entering = {
                let objective = match which {
                    Objective::Main => &self.objective,
                    Objective::Artificial => self.artificial.as_ref().ok_or(SolverError::Internal("no artificial row"))?,
                };
                objective
                    .cells
                    .iter()
                    .find(|(s, c)| s.kind != SymbolKind::Dummy && **c < 0.0)
                    .map(|(s, _)| *s)
            };
            let Some(entering) = entering else { return Ok(()) };

            let leaving = self.leaving_symbol(entering);
            if leaving.is_invalid() {
                return Err(SolverError::Unbounded);
            }
            let mut row = self.rows.remove(&leaving).ok_or(SolverError::Internal("leaving row vanished"))?;
            row.solve_for_pair(leaving, entering);
            self.substitute(entering, &row);
            self.rows.insert(entering, row);
        }
    }

    fn dual_optimize(&mut self) -> SolverResult<()> {
        while let Some(leaving) = self.infeasible_rows.pop() {
            let needs_pivot = self.rows.get(&leaving).map(|r| r.constant < 0.0).unwrap_or(false);
            if !needs_pivot {
                continue;
            }
            let Some(mut row) = self.rows.remove(&leaving) else { continue };
            let entering = self.dual_entering_symbol(&row);
            if entering.is_invalid() {
                self.rows.insert(leaving, row);
                return Err(SolverError::DualOptimizeFailed);
            }
            row.solve_for_pair(leaving, entering);
            self.substitute(entering, &row);
            self.rows.insert(entering, row);
        }
        Ok(())
    }

    fn leaving_symbol(&self, entering: Symbol) -> Symbol {
        let mut ratio = f64::MAX;
        let mut found = Symbol::INVALID;
        for (&s, row) in &self.rows {
            if s.kind == SymbolKind::External {
                continue;
            }
            let temp = row.coefficient_for(entering);
            if temp < 0.0 {
                let r = -row.constant / temp;
                if r < ratio {
                    ratio = r;
                    found = s;
                }
            }
        }
        found
    }

    fn dual_entering_symbol(&self, row: &Row) -> Symbol {
        let mut ratio = f64::MAX;
        let mut entering = Symbol::INVALID;
        for (&s, &c) in &row.cells {
            if c > 0.0 && s.kind != SymbolKind::Dummy {
                let r = self.objective.coefficient_for(s) / c;
                if r < ratio {
                    ratio = r;
                    entering = s;
                }
            }
        }
        entering
    }

    fn marker_leaving_symbol(&self, marker: Symbol) -> Symbol {
        let (mut r1, mut r2) = (f64::MAX, f64::MAX);
        let (mut first, mut second, mut third) = (Symbol::INVALID, Symbol::INVALID, Symbol::INVALID);
        for (&s, row) in &self.rows {
            let c = row.coefficient_for(marker);
            if c == 0.0 {
                continue;
            }
            if s.kind == SymbolKind::External {
                third = s;
            } else if c < 0.0 {
                let r = -row.constant / c;
                if r < r1 {
                    r1 = r;
                    first = s;
                }
            } else {
                let r = row.constant / c;
                if r < r2 {
                    r2 = r;
                    second = s;
                }
            }
        }
        if !first.is_invalid() {
            first
        } else if !second.is_invalid() {
            second
        } else {
            third
        }
    }

    fn remove_constraint_effects(&mut self, constraint: &Constraint, tag: &Tag) {
        if tag.marker.kind == SymbolKind::Error {
            self.remove_marker_effects(tag.marker, constraint.strength);
        }
        if tag.other.kind == SymbolKind::Error {
            self.remove_marker_effects(tag.other, constraint.strength);
        }
    }

    fn remove_marker_effects(&mut self, marker: Symbol, strength: f64) {
        match self.rows.get(&marker) {
            Some(row) => {
                let row = row.clone();
                self.objective.insert_row(&row, -strength);
            }
            None => self.objective.insert_symbol(marker, -strength),
        }
    }
}
