// File: crates/plot-core/src/selection.rs
// Summary: Selection state per data source and the modes used to combine selections.

use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SelectionMode {
    #[default]
    Replace,
    /// Union with the current selection.
    Append,
    Intersect,
    Subtract,
    /// Symmetric difference.
    Invert,
}

/// A hit inside an image glyph: row plus pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ImageIndex {
    pub index: usize,
    pub i: usize,
    pub j: usize,
}

/// Selected rows of one source. Indices always refer to full, unfiltered rows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    pub indices: BTreeSet<usize>,
    pub line_indices: BTreeSet<usize>,
    /// Row -> sub-indices for multi-part glyphs.
    pub multiline_indices: BTreeMap<usize, BTreeSet<usize>>,
    pub image_indices: BTreeSet<ImageIndex>,
}

fn combine<T: Ord + Clone>(current: &BTreeSet<T>, other: &BTreeSet<T>, mode: SelectionMode) -> BTreeSet<T> {
    match mode {
        SelectionMode::Replace => other.clone(),
        SelectionMode::Append => current.union(other).cloned().collect(),
        SelectionMode::Intersect => current.intersection(other).cloned().collect(),
        SelectionMode::Subtract => current.difference(other).cloned().collect(),
        SelectionMode::Invert => current.symmetric_difference(other).cloned().collect(),
    }
}

impl Selection {
    pub fn from_indices(indices: impl IntoIterator<Item = usize>) -> Self {
        Self { indices: indices.into_iter().collect(), ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
            && self.line_indices.is_empty()
            && self.multiline_indices.is_empty()
            && self.image_indices.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Apply `other` to this selection according to `mode`.
    pub fn update(&mut self, other: &Selection, mode: SelectionMode) {
        self.indices = combine(&self.indices, &other.indices, mode);
        self.line_indices = combine(&self.line_indices, &other.line_indices, mode);
        self.image_indices = combine(&self.image_indices, &other.image_indices, mode);

        let keys: BTreeSet<usize> = self.multiline_indices.keys().chain(other.multiline_indices.keys()).copied().collect();
        let empty = BTreeSet::new();
        let mut merged = BTreeMap::new();
        for k in keys {
            let cur = self.multiline_indices.get(&k).unwrap_or(&empty);
            let oth = other.multiline_indices.get(&k).unwrap_or(&empty);
            let v = combine(cur, oth, mode);
            if !v.is_empty() {
                merged.insert(k, v);
            }
        }
        self.multiline_indices = merged;
    }

    /// Re-key every index through `f`; rows `f` maps to `None` are dropped.
    pub fn map_indices(&self, f: impl Fn(usize) -> Option<usize>) -> Selection {
        Selection {
            indices: self.indices.iter().filter_map(|&i| f(i)).collect(),
            line_indices: self.line_indices.iter().filter_map(|&i| f(i)).collect(),
            multiline_indices: self
                .multiline_indices
                .iter()
                .filter_map(|(&k, v)| f(k).map(|k| (k, v.clone())))
                .collect(),
            image_indices: self
                .image_indices
                .iter()
                .filter_map(|ix| f(ix.index).map(|index| ImageIndex { index, ..*ix }))
                .collect(),
        }
    }
}
