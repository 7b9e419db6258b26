// File: crates/plot-core/src/source.rs
// Summary: Column data source (named columns + selections) and index-filtered views over it.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::selection::Selection;
use crate::types::SourceId;

pub type SourceRef = Rc<RefCell<ColumnDataSource>>;

#[derive(Clone, Debug, PartialEq)]
pub enum ColumnData {
    Float(Vec<f64>),
    Int(Vec<i64>),
    Str(Vec<String>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Float(v) => v.len(),
            ColumnData::Int(v) => v.len(),
            ColumnData::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric value of a row; strings and out-of-range rows are NaN.
    pub fn f64_at(&self, i: usize) -> f64 {
        match self {
            ColumnData::Float(v) => v.get(i).copied().unwrap_or(f64::NAN),
            ColumnData::Int(v) => v.get(i).map(|&x| x as f64).unwrap_or(f64::NAN),
            ColumnData::Str(_) => f64::NAN,
        }
    }

    /// Join key of a row (node ids, edge endpoints).
    pub fn key_at(&self, i: usize) -> Option<ColumnKey> {
        match self {
            ColumnData::Float(v) => {
                let x = *v.get(i)?;
                (x.is_finite() && x.fract() == 0.0).then_some(ColumnKey::Int(x as i64))
            }
            ColumnData::Int(v) => v.get(i).map(|&x| ColumnKey::Int(x)),
            ColumnData::Str(v) => v.get(i).map(|s| ColumnKey::Str(s.clone())),
        }
    }
}

impl From<Vec<f64>> for ColumnData {
    fn from(v: Vec<f64>) -> Self { ColumnData::Float(v) }
}

impl From<Vec<i64>> for ColumnData {
    fn from(v: Vec<i64>) -> Self { ColumnData::Int(v) }
}

impl From<Vec<String>> for ColumnData {
    fn from(v: Vec<String>) -> Self { ColumnData::Str(v) }
}

impl From<Vec<&str>> for ColumnData {
    fn from(v: Vec<&str>) -> Self { ColumnData::Str(v.into_iter().map(String::from).collect()) }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnKey {
    Int(i64),
    Str(String),
}

#[derive(Debug)]
pub struct ColumnDataSource {
    id: SourceId,
    columns: BTreeMap<String, ColumnData>,
    pub selected: Selection,
    /// Hover state; kept apart from `selected`.
    pub inspected: Selection,
    revision: u64,
}

impl Default for ColumnDataSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnDataSource {
    pub fn new() -> Self {
        Self {
            id: SourceId::fresh(),
            columns: BTreeMap::new(),
            selected: Selection::default(),
            inspected: Selection::default(),
            revision: 0,
        }
    }

    pub fn with_column(mut self, name: &str, data: impl Into<ColumnData>) -> Self {
        self.set_column(name, data);
        self
    }

    pub fn shared(self) -> SourceRef {
        Rc::new(RefCell::new(self))
    }

    pub fn id(&self) -> SourceId { self.id }

    /// Bumped on every column change; drives auto-range recomputation.
    pub fn revision(&self) -> u64 { self.revision }

    pub fn set_column(&mut self, name: &str, data: impl Into<ColumnData>) {
        self.columns.insert(name.to_string(), data.into());
        self.revision += 1;
    }

    pub fn remove_column(&mut self, name: &str) -> Option<ColumnData> {
        let removed = self.columns.remove(name);
        if removed.is_some() {
            self.revision += 1;
        }
        removed
    }

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns.get(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Row count: length of the longest column.
    pub fn len(&self) -> usize {
        self.columns.values().map(ColumnData::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric values for `rows`; a missing column yields NaNs.
    pub fn f64_values(&self, name: &str, rows: &[usize]) -> Vec<f64> {
        match self.columns.get(name) {
            Some(col) => rows.iter().map(|&i| col.f64_at(i)).collect(),
            None => vec![f64::NAN; rows.len()],
        }
    }
}

/// Index filter over a source. `None` shows every row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CdsView {
    filter: Option<Vec<usize>>,
}

impl CdsView {
    pub fn all() -> Self {
        Self { filter: None }
    }

    pub fn filtered(mut rows: Vec<usize>) -> Self {
        rows.sort_unstable();
        rows.dedup();
        Self { filter: Some(rows) }
    }

    /// Full row indices visible through the view, in local order.
    pub fn subset(&self, len: usize) -> Vec<usize> {
        match &self.filter {
            None => (0..len).collect(),
            Some(rows) => rows.iter().copied().filter(|&i| i < len).collect(),
        }
    }

    pub fn to_full(&self, local: usize) -> Option<usize> {
        match &self.filter {
            None => Some(local),
            Some(rows) => rows.get(local).copied(),
        }
    }

    pub fn to_local(&self, full: usize) -> Option<usize> {
        match &self.filter {
            None => Some(full),
            Some(rows) => rows.binary_search(&full).ok(),
        }
    }

    pub fn selection_to_full(&self, local: &Selection) -> Selection {
        local.map_indices(|i| self.to_full(i))
    }

    pub fn selection_to_local(&self, full: &Selection) -> Selection {
        full.map_indices(|i| self.to_local(i))
    }
}
