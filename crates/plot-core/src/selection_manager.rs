// File: crates/plot-core/src/selection_manager.rs
// Summary: Resolves pointer geometry against renderer views and writes the result into sources.
// Notes:
// - Hits are gathered per source first, then applied once per source, so two
//   renderers sharing a source combine before the selection mode runs.

use std::collections::BTreeMap;

use crate::hittest::Geometry;
use crate::renderer::RendererView;
use crate::selection::{Selection, SelectionMode};
use crate::source::SourceRef;
use crate::types::SourceId;

type Hits = BTreeMap<SourceId, (SourceRef, Selection)>;

fn merge(hits: &mut Hits, source: SourceRef, sel: Selection) {
    let id = source.borrow().id();
    match hits.get_mut(&id) {
        Some((_, acc)) => acc.update(&sel, SelectionMode::Append),
        None => {
            hits.insert(id, (source, sel));
        }
    }
}

/// Full-index hits per source for every visible renderer.
pub fn collect_hits(renderers: &[Box<dyn RendererView>], geometry: &Geometry, inspection: bool) -> Hits {
    let mut hits = Hits::new();
    for r in renderers.iter().filter(|r| r.visible()) {
        if let Some(linked) = r.linked_selectable() {
            for (source, sel) in linked.linked_hit_test(geometry, inspection) {
                merge(&mut hits, source, sel);
            }
        } else if let Some(ht) = r.hit_testable() {
            if let Some(local) = ht.hit_test(geometry) {
                let full = ht.view().selection_to_full(&local);
                merge(&mut hits, ht.source(), full);
            }
        }
    }
    hits
}

/// Every distinct source the renderers read.
fn all_sources(renderers: &[Box<dyn RendererView>]) -> Vec<SourceRef> {
    let mut seen = BTreeMap::new();
    for r in renderers {
        for s in r.sources() {
            let id = s.borrow().id();
            seen.entry(id).or_insert(s);
        }
    }
    seen.into_values().collect()
}

/// Hit-test `geometry` and update `selected` on the touched sources. With
/// `Replace`, sources that were hit-tested but missed are cleared too.
/// Returns true when any selection changed.
pub fn select(renderers: &[Box<dyn RendererView>], geometry: &Geometry, mode: SelectionMode) -> bool {
    let hits = collect_hits(renderers, geometry, false);
    let mut changed = false;
    for source in all_sources(renderers) {
        let id = source.borrow().id();
        let mut src = source.borrow_mut();
        let before = src.selected.clone();
        match hits.get(&id) {
            Some((_, sel)) => src.selected.update(sel, mode),
            None if mode == SelectionMode::Replace => src.selected.clear(),
            None => {}
        }
        changed |= src.selected != before;
    }
    tracing::debug!(?mode, sources = hits.len(), changed, "selection applied");
    changed
}

/// Hover: replace `inspected` on every source the renderers read.
pub fn inspect(renderers: &[Box<dyn RendererView>], geometry: &Geometry) -> bool {
    let hits = collect_hits(renderers, geometry, true);
    let mut changed = false;
    for source in all_sources(renderers) {
        let id = source.borrow().id();
        let mut src = source.borrow_mut();
        let next = hits.get(&id).map(|(_, sel)| sel.clone()).unwrap_or_default();
        if src.inspected != next {
            src.inspected = next;
            changed = true;
        }
    }
    changed
}

/// Empty `selected` on every source the renderers read.
pub fn clear(renderers: &[Box<dyn RendererView>]) -> bool {
    let mut changed = false;
    for source in all_sources(renderers) {
        let mut src = source.borrow_mut();
        if !src.selected.is_empty() {
            src.selected.clear();
            changed = true;
        }
    }
    changed
}
