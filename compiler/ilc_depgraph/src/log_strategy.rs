//! Diagnostic record keeping for the dependency walk.
//!
//! A strategy observes marks and edges. It never decides what gets marked, so
//! switching strategies changes memory use and report detail only.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::report::{DependencyReport, ReportKind, ReportNode, ReportReason};
use crate::{DependencyContext, NodeId, Reason};

/// Observer attached to a [`DependencyAnalyzer`](crate::DependencyAnalyzer).
pub trait LogStrategy: Default {
    /// Whether the analyzer should report every edge it visits.
    const TRACKS_EDGES: bool;

    /// Short name for tracing output.
    const NAME: &'static str;

    /// `node` has just been marked, discovered from `source` (`None` for roots).
    fn node_marked(&mut self, node: NodeId, source: Option<NodeId>, reason: &Reason);

    /// A static or root edge was visited. Called only when [`Self::TRACKS_EDGES`] is set.
    fn edge_visited(&mut self, _source: Option<NodeId>, _target: NodeId, _reason: &Reason) {}

    /// A conditional edge fired. Called only when [`Self::TRACKS_EDGES`] is set.
    fn conditional_edge_visited(
        &mut self,
        _source: NodeId,
        _condition: NodeId,
        _target: NodeId,
        _reason: &Reason,
    ) {
    }

    /// Chain of reasons leading from `node` back to a root, nearest first.
    fn discovery_path(&self, _node: NodeId) -> Option<Vec<MarkReason>> {
        None
    }

    fn report<C: DependencyContext>(&self, context: &C, marked: &[NodeId])
        -> Option<DependencyReport>;
}

/// Why a node was marked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarkReason {
    /// The node that required it, or `None` for a root.
    pub source: Option<NodeId>,
    pub reason: Reason,
}

/// Keeps nothing. The production default.
#[derive(Debug, Default)]
pub struct NoLogStrategy;

impl LogStrategy for NoLogStrategy {
    const TRACKS_EDGES: bool = false;
    const NAME: &'static str = "none";

    #[inline]
    fn node_marked(&mut self, _node: NodeId, _source: Option<NodeId>, _reason: &Reason) {}

    fn report<C: DependencyContext>(&self, _context: &C, _marked: &[NodeId])
        -> Option<DependencyReport> {
        None
    }
}

/// Keeps the first reason each node was marked for.
#[derive(Debug, Default)]
pub struct FirstMarkLogStrategy {
    reasons: FxHashMap<NodeId, MarkReason>,
}

impl FirstMarkLogStrategy {
    pub fn reason(&self, node: NodeId) -> Option<&MarkReason> {
        self.reasons.get(&node)
    }

    pub fn len(&self) -> usize {
        self.reasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }
}

impl LogStrategy for FirstMarkLogStrategy {
    const TRACKS_EDGES: bool = false;
    const NAME: &'static str = "first-mark";

    fn node_marked(&mut self, node: NodeId, source: Option<NodeId>, reason: &Reason) {
        self.reasons.entry(node).or_insert_with(|| MarkReason {
            source,
            reason: reason.clone(),
        });
    }

    fn discovery_path(&self, node: NodeId) -> Option<Vec<MarkReason>> {
        let mut path = Vec::new();
        let mut current = Some(node);
        // Sources are always marked before their targets, so the chain ends at a
        // root; the bound only guards against a corrupted record.
        while let Some(id) = current {
            if path.len() > self.reasons.len() {
                break;
            }
            let record = self.reasons.get(&id)?;
            path.push(record.clone());
            current = record.source;
        }
        Some(path)
    }

    fn report<C: DependencyContext>(&self, context: &C, marked: &[NodeId])
        -> Option<DependencyReport> {
        let nodes = marked
            .iter()
            .map(|&node| ReportNode {
                name: context.node_name(node),
                reasons: self
                    .reasons
                    .get(&node)
                    .map(|record| ReportReason {
                        source: record.source.map(|s| context.node_name(s)),
                        condition: None,
                        reason: record.reason.to_string(),
                    })
                    .into_iter()
                    .collect(),
            })
            .collect();
        Some(DependencyReport {
            kind: ReportKind::FirstMark,
            nodes,
        })
    }
}

/// One recorded edge of the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphEdge {
    /// `None` for root edges.
    pub source: Option<NodeId>,
    pub target: NodeId,
    /// The node whose marking activated this edge, for conditional edges.
    pub condition: Option<NodeId>,
    pub reason: Reason,
}

/// Keeps every distinct edge visited, in visit order.
///
/// Memory grows with the number of edges rather than nodes.
#[derive(Debug, Default)]
pub struct FullGraphLogStrategy {
    edges: Vec<GraphEdge>,
    seen: FxHashSet<GraphEdge>,
    first_incoming: FxHashMap<NodeId, usize>,
}

impl FullGraphLogStrategy {
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Recorded edges ending at `target`, in visit order.
    pub fn incoming(&self, target: NodeId) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(move |edge| edge.target == target)
    }

    /// Whether any edge `source -> target` was recorded.
    pub fn contains_edge(&self, source: Option<NodeId>, target: NodeId) -> bool {
        self.edges
            .iter()
            .any(|edge| edge.source == source && edge.target == target)
    }

    fn record(&mut self, edge: GraphEdge) {
        if self.seen.contains(&edge) {
            return;
        }
        self.first_incoming
            .entry(edge.target)
            .or_insert(self.edges.len());
        self.seen.insert(edge.clone());
        self.edges.push(edge);
    }
}

impl LogStrategy for FullGraphLogStrategy {
    const TRACKS_EDGES: bool = true;
    const NAME: &'static str = "full-graph";

    #[inline]
    fn node_marked(&mut self, _node: NodeId, _source: Option<NodeId>, _reason: &Reason) {}

    fn edge_visited(&mut self, source: Option<NodeId>, target: NodeId, reason: &Reason) {
        self.record(GraphEdge {
            source,
            target,
            condition: None,
            reason: reason.clone(),
        });
    }

    fn conditional_edge_visited(
        &mut self,
        source: NodeId,
        condition: NodeId,
        target: NodeId,
        reason: &Reason,
    ) {
        self.record(GraphEdge {
            source: Some(source),
            target,
            condition: Some(condition),
            reason: reason.clone(),
        });
    }

    fn discovery_path(&self, node: NodeId) -> Option<Vec<MarkReason>> {
        let mut path = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            if path.len() > self.first_incoming.len() {
                break;
            }
            let edge = &self.edges[*self.first_incoming.get(&id)?];
            path.push(MarkReason {
                source: edge.source,
                reason: edge.reason.clone(),
            });
            current = edge.source;
        }
        Some(path)
    }

    fn report<C: DependencyContext>(&self, context: &C, marked: &[NodeId])
        -> Option<DependencyReport> {
        let mut incoming: FxHashMap<NodeId, Vec<ReportReason>> = FxHashMap::default();
        for edge in &self.edges {
            incoming.entry(edge.target).or_default().push(ReportReason {
                source: edge.source.map(|s| context.node_name(s)),
                condition: edge.condition.map(|c| context.node_name(c)),
                reason: edge.reason.to_string(),
            });
        }
        let nodes = marked
            .iter()
            .map(|node| ReportNode {
                name: context.node_name(*node),
                reasons: incoming.remove(node).unwrap_or_default(),
            })
            .collect();
        Some(DependencyReport {
            kind: ReportKind::FullGraph,
            nodes,
        })
    }
}

#[cfg(test)]
mod tests;
