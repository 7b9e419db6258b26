// File: crates/plot-core/src/graph.rs
// Summary: Graph renderer: node markers plus edge segments joined by node id, with linked selection policies.
// Notes:
// - Nodes source columns: `index` (node id), `x`, `y`.
// - Edges source columns: `start`, `end` (node ids). Edge geometry is derived
//   from node positions whenever either source changes.

use std::collections::{BTreeSet, HashMap};

use crate::error::Result;
use crate::frame::CartesianFrame;
use crate::geometry::BBox;
use crate::glyph::{Scatter, Segment};
use crate::hittest::{Geometry, LinkedSelectable};
use crate::renderer::{GlyphRendererView, PaintContext, RendererView};
use crate::selection::Selection;
use crate::source::{ColumnDataSource, ColumnKey, SourceRef};
use crate::types::{RenderLevel, RendererId};

pub const NODE_INDEX: &str = "index";
pub const EDGE_START: &str = "start";
pub const EDGE_END: &str = "end";

/// How a hit on one part of the graph spreads to the other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum GraphPolicy {
    #[default]
    NodesOnly,
    NodesAndLinkedEdges,
    EdgesAndLinkedNodes,
    /// Hit nodes plus every node sharing an edge with them.
    NodesAndAdjacentNodes,
}

pub struct GraphRendererView {
    id: RendererId,
    nodes: GlyphRendererView<Scatter>,
    edges: GlyphRendererView<Segment>,
    pub selection_policy: GraphPolicy,
    pub inspection_policy: GraphPolicy,
    edge_stamp: Option<(u64, u64)>,
}

fn keys(src: &ColumnDataSource, column: &str, rows: &[usize]) -> Vec<Option<ColumnKey>> {
    match src.column(column) {
        Some(col) => rows.iter().map(|&i| col.key_at(i)).collect(),
        None => vec![None; rows.len()],
    }
}

impl GraphRendererView {
    pub fn new(nodes: SourceRef, edges: SourceRef) -> Self {
        Self {
            id: RendererId::fresh(),
            nodes: GlyphRendererView::new(nodes, Scatter::new("x", "y")),
            edges: GlyphRendererView::new(edges, Segment::external()),
            selection_policy: GraphPolicy::default(),
            inspection_policy: GraphPolicy::default(),
            edge_stamp: None,
        }
    }

    pub fn with_policies(mut self, selection: GraphPolicy, inspection: GraphPolicy) -> Self {
        self.selection_policy = selection;
        self.inspection_policy = inspection;
        self
    }

    pub fn node_source(&self) -> &SourceRef { self.nodes.source() }
    pub fn edge_source(&self) -> &SourceRef { self.edges.source() }

    fn layout_edges(&mut self) {
        let node_rows = self.nodes.subset();
        let edge_rows = self.edges.subset();
        let positions: HashMap<ColumnKey, (f64, f64)> = {
            let src = self.nodes.source().borrow();
            let ids = keys(&src, NODE_INDEX, &node_rows);
            let xs = src.f64_values("x", &node_rows);
            let ys = src.f64_values("y", &node_rows);
            ids.into_iter()
                .zip(xs.into_iter().zip(ys))
                .filter_map(|(k, p)| k.map(|k| (k, p)))
                .collect()
        };
        let (starts, ends) = {
            let src = self.edges.source().borrow();
            (keys(&src, EDGE_START, &edge_rows), keys(&src, EDGE_END, &edge_rows))
        };
        let lookup = |k: &Option<ColumnKey>| k.as_ref().and_then(|k| positions.get(k)).copied().unwrap_or((f64::NAN, f64::NAN));
        let (mut x0, mut y0, mut x1, mut y1) = (Vec::new(), Vec::new(), Vec::new(), Vec::new());
        for (s, e) in starts.iter().zip(&ends) {
            let (a, b) = lookup(s);
            let (c, d) = lookup(e);
            x0.push(a);
            y0.push(b);
            x1.push(c);
            y1.push(d);
        }
        self.edges.glyph_mut().set_coords(x0, y0, x1, y1);
    }

    /// Node ids of the given full node rows.
    fn node_ids(&self, rows: &BTreeSet<usize>) -> BTreeSet<ColumnKey> {
        let src = self.nodes.source().borrow();
        let Some(col) = src.column(NODE_INDEX) else { return BTreeSet::new() };
        rows.iter().filter_map(|&i| col.key_at(i)).collect()
    }

    /// Full edge rows whose start or end is in `ids`.
    fn linked_edges(&self, ids: &BTreeSet<ColumnKey>) -> BTreeSet<usize> {
        let src = self.edges.source().borrow();
        let (Some(start), Some(end)) = (src.column(EDGE_START), src.column(EDGE_END)) else {
            return BTreeSet::new();
        };
        self.edges
            .subset()
            .into_iter()
            .filter(|&i| {
                start.key_at(i).is_some_and(|k| ids.contains(&k)) || end.key_at(i).is_some_and(|k| ids.contains(&k))
            })
            .collect()
    }

    /// Endpoint ids of the given full edge rows.
    fn edge_endpoints(&self, rows: &BTreeSet<usize>) -> BTreeSet<ColumnKey> {
        let src = self.edges.source().borrow();
        let mut out = BTreeSet::new();
        for name in [EDGE_START, EDGE_END] {
            if let Some(col) = src.column(name) {
                out.extend(rows.iter().filter_map(|&i| col.key_at(i)));
            }
        }
        out
    }

    /// Full node rows whose id is in `ids`.
    fn nodes_with_ids(&self, ids: &BTreeSet<ColumnKey>) -> BTreeSet<usize> {
        let src = self.nodes.source().borrow();
        let Some(col) = src.column(NODE_INDEX) else { return BTreeSet::new() };
        self.nodes
            .subset()
            .into_iter()
            .filter(|&i| col.key_at(i).is_some_and(|k| ids.contains(&k)))
            .collect()
    }

    fn node_hits(&self, geometry: &Geometry) -> BTreeSet<usize> {
        let local = self.nodes.hit_local(geometry);
        local.into_iter().filter_map(|i| self.nodes.cds_view().to_full(i)).collect()
    }

    fn edge_hits(&self, geometry: &Geometry) -> BTreeSet<usize> {
        let local = self.edges.hit_local(geometry);
        local.into_iter().filter_map(|i| self.edges.cds_view().to_full(i)).collect()
    }

    /// Resolve a geometry under `policy` to (node rows, edge rows), full indices.
    pub fn resolve(&self, geometry: &Geometry, policy: GraphPolicy) -> (Option<BTreeSet<usize>>, Option<BTreeSet<usize>>) {
        match policy {
            GraphPolicy::NodesOnly => (Some(self.node_hits(geometry)), None),
            GraphPolicy::NodesAndLinkedEdges => {
                let nodes = self.node_hits(geometry);
                let edges = self.linked_edges(&self.node_ids(&nodes));
                (Some(nodes), Some(edges))
            }
            GraphPolicy::EdgesAndLinkedNodes => {
                let edges = self.edge_hits(geometry);
                let nodes = self.nodes_with_ids(&self.edge_endpoints(&edges));
                (Some(nodes), Some(edges))
            }
            GraphPolicy::NodesAndAdjacentNodes => {
                let nodes = self.node_hits(geometry);
                let edges = self.linked_edges(&self.node_ids(&nodes));
                let mut all = nodes;
                all.extend(self.nodes_with_ids(&self.edge_endpoints(&edges)));
                (Some(all), None)
            }
        }
    }
}

impl RendererView for GraphRendererView {
    fn id(&self) -> RendererId { self.id }
    fn level(&self) -> RenderLevel { RenderLevel::Glyph }

    fn sync_data(&mut self) {
        self.nodes.reload_if_stale();
        self.edges.reload_if_stale();
        let stamp = (self.nodes.data_revision(), self.edges.data_revision());
        if self.edge_stamp != Some(stamp) {
            self.layout_edges();
            self.edge_stamp = Some(stamp);
        }
    }

    fn data_revision(&self) -> u64 {
        self.nodes.data_revision() + self.edges.data_revision()
    }

    fn bounds(&self) -> Option<BBox> {
        let b = self.nodes.bounds()?;
        Some(match self.edges.bounds() {
            Some(e) => b.union(&e),
            None => b,
        })
    }

    fn log_bounds(&self) -> Option<BBox> {
        self.nodes.log_bounds()
    }

    fn map_data(&mut self, frame: &CartesianFrame) -> Result<()> {
        self.edges.map_data(frame)?;
        self.nodes.map_data(frame)
    }

    fn paint(&mut self, ctx: &mut PaintContext<'_, '_>) -> Result<()> {
        self.edges.paint(ctx)?;
        self.nodes.paint(ctx)
    }

    fn painted_items(&self) -> usize {
        self.nodes.painted_items() + self.edges.painted_items()
    }

    fn sources(&self) -> Vec<SourceRef> {
        vec![self.nodes.source().clone(), self.edges.source().clone()]
    }

    fn linked_selectable(&self) -> Option<&dyn LinkedSelectable> {
        Some(self)
    }
}

impl LinkedSelectable for GraphRendererView {
    fn linked_hit_test(&self, geometry: &Geometry, inspection: bool) -> Vec<(SourceRef, Selection)> {
        let policy = if inspection { self.inspection_policy } else { self.selection_policy };
        let (nodes, edges) = self.resolve(geometry, policy);
        let mut out = Vec::new();
        if let Some(rows) = nodes {
            out.push((self.nodes.source().clone(), Selection::from_indices(rows)));
        }
        if let Some(rows) = edges {
            out.push((self.edges.source().clone(), Selection::from_indices(rows)));
        }
        out
    }
}
