//! The fixpoint engine.
//!
//! # Algorithm
//!
//! A FIFO queue is seeded with the roots. Until it is empty:
//!
//! 1. Pop an entry; skip it if its node is already marked.
//! 2. Query the node's static and conditional dependencies. A failed query
//!    aborts the walk and leaves the analyzer as it was before the pop.
//! 3. Mark the node and tell the log strategy.
//! 4. Fire deferred conditional edges waiting on this node.
//! 5. Enqueue unmarked static dependencies.
//! 6. Fire conditional dependencies whose condition is already marked, defer
//!    the rest under their condition node.
//!
//! Only unmarked nodes are enqueued and marks are never removed, so the walk
//! terminates on any finite (if growing) node universe and cycles simply
//! close.
//!
//! # Parallel Walk
//!
//! [`DependencyAnalyzer::compute_marked_nodes_parallel`] drains the queue in
//! waves. Dependency queries for a wave run on the rayon pool; their results
//! are then applied in queue order through the same marking step as the
//! sequential walk, so marks, recorded reasons and reported errors match it
//! exactly.

use std::collections::VecDeque;

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, debug_span, trace};

use crate::log_strategy::LogStrategy;
use crate::report::DependencyReport;
use crate::{
    AnalysisError, ConditionalDependencyEntry, DependencyContext, DependencyListEntry, NodeId,
    Reason,
};

/// Counters describing a walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisStats {
    pub nodes_marked: usize,
    /// Static edges visited, including edges into already-marked nodes.
    pub edges_visited: usize,
    /// Queue entries skipped because their node was already marked.
    pub revisits: usize,
    pub conditional_activations: usize,
    /// Waves processed by the parallel walk (zero for sequential walks).
    pub waves: usize,
}

#[derive(Debug, Clone)]
struct PendingMark {
    node: NodeId,
    source: Option<NodeId>,
    reason: Reason,
}

#[derive(Debug, Clone)]
struct DeferredDependency {
    source: NodeId,
    target: NodeId,
    reason: Reason,
}

struct NodeDependencies {
    static_deps: Vec<DependencyListEntry>,
    conditional: Vec<ConditionalDependencyEntry>,
}

fn query_dependencies<C: DependencyContext>(
    context: &C,
    node: NodeId,
) -> Result<NodeDependencies, C::Error> {
    Ok(NodeDependencies {
        static_deps: context.static_dependencies(node)?,
        conditional: context.conditional_dependencies(node)?,
    })
}

/// Computes the set of nodes reachable from a set of roots.
pub struct DependencyAnalyzer<'ctx, C: DependencyContext, L: LogStrategy> {
    context: &'ctx C,
    log: L,
    marked: FxHashSet<NodeId>,
    marked_nodes: Vec<NodeId>,
    pending: VecDeque<PendingMark>,
    /// Conditional edges waiting for their condition node, keyed by that node.
    deferred: FxHashMap<NodeId, Vec<DeferredDependency>>,
    stats: AnalysisStats,
}

impl<'ctx, C: DependencyContext, L: LogStrategy> DependencyAnalyzer<'ctx, C, L> {
    pub fn new(context: &'ctx C) -> Self {
        Self {
            context,
            log: L::default(),
            marked: FxHashSet::default(),
            marked_nodes: Vec::new(),
            pending: VecDeque::new(),
            deferred: FxHashMap::default(),
            stats: AnalysisStats::default(),
        }
    }

    /// Seed an analyzer with `roots` and run it to completion.
    pub fn run<R>(
        context: &'ctx C,
        roots: impl IntoIterator<Item = (NodeId, R)>,
    ) -> Result<Self, AnalysisError>
    where
        R: Into<Reason>,
    {
        let mut analyzer = Self::new(context);
        for (node, reason) in roots {
            analyzer.add_root(node, reason);
        }
        analyzer.compute_marked_nodes()?;
        Ok(analyzer)
    }

    /// Declare `node` required regardless of other references.
    ///
    /// Roots may be added after a walk; the next walk continues from the
    /// existing marks.
    pub fn add_root(&mut self, node: NodeId, reason: impl Into<Reason>) {
        let reason = reason.into();
        if L::TRACKS_EDGES {
            self.log.edge_visited(None, node, &reason);
        }
        self.enqueue(node, None, reason);
    }

    /// Run the walk until the queue is empty.
    pub fn compute_marked_nodes(&mut self) -> Result<(), AnalysisError> {
        let _span = debug_span!("compute_marked_nodes", strategy = L::NAME).entered();

        while let Some(item) = self.pending.pop_front() {
            if self.marked.contains(&item.node) {
                self.stats.revisits += 1;
                continue;
            }
            match query_dependencies(self.context, item.node) {
                Ok(deps) => self.mark(item, deps),
                Err(source) => {
                    let err = self.query_failed(&item, source);
                    self.pending.push_front(item);
                    return Err(err);
                }
            }
        }

        debug!(stats = ?self.stats, "dependency walk complete");
        Ok(())
    }

    pub fn marked_nodes(&self) -> &[NodeId] {
        &self.marked_nodes
    }

    pub fn is_marked(&self, node: NodeId) -> bool {
        self.marked.contains(&node)
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    pub fn stats(&self) -> AnalysisStats {
        self.stats
    }

    /// Conditional edges whose condition was never marked.
    pub fn deferred_count(&self) -> usize {
        self.deferred.values().map(Vec::len).sum()
    }

    /// Render the strategy's record, if it keeps one.
    pub fn report(&self) -> Option<DependencyReport> {
        self.log.report(self.context, &self.marked_nodes)
    }

    pub fn context(&self) -> &'ctx C {
        self.context
    }

    fn enqueue(&mut self, node: NodeId, source: Option<NodeId>, reason: Reason) {
        if !self.marked.contains(&node) {
            self.pending.push_back(PendingMark {
                node,
                source,
                reason,
            });
        }
    }

    fn mark(&mut self, item: PendingMark, deps: NodeDependencies) {
        let PendingMark {
            node,
            source,
            reason,
        } = item;

        self.marked.insert(node);
        self.marked_nodes.push(node);
        self.stats.nodes_marked += 1;
        trace!(%node, ?source, %reason, "marked");
        self.log.node_marked(node, source, &reason);

        if let Some(waiting) = self.deferred.remove(&node) {
            for deferred in waiting {
                self.activate(deferred.source, node, deferred.target, deferred.reason);
            }
        }

        for dep in deps.static_deps {
            self.stats.edges_visited += 1;
            if L::TRACKS_EDGES {
                self.log.edge_visited(Some(node), dep.node, &dep.reason);
            }
            self.enqueue(dep.node, Some(node), dep.reason);
        }

        for cond in deps.conditional {
            if self.marked.contains(&cond.condition) {
                self.activate(node, cond.condition, cond.node, cond.reason);
            } else {
                self.deferred
                    .entry(cond.condition)
                    .or_default()
                    .push(DeferredDependency {
                        source: node,
                        target: cond.node,
                        reason: cond.reason,
                    });
            }
        }
    }

    fn activate(&mut self, source: NodeId, condition: NodeId, target: NodeId, reason: Reason) {
        self.stats.conditional_activations += 1;
        if L::TRACKS_EDGES {
            self.log
                .conditional_edge_visited(source, condition, target, &reason);
        }
        self.enqueue(target, Some(source), reason);
    }

    fn query_failed(&self, item: &PendingMark, source: C::Error) -> AnalysisError {
        AnalysisError::DependencyQuery {
            node: self.context.node_name(item.node),
            path: self.discovery_path(item),
            source: Box::new(source),
        }
    }

    fn describe_hop(&self, source: Option<NodeId>, reason: &Reason) -> String {
        match source {
            Some(src) => format!("{} ({reason})", self.context.node_name(src)),
            None => format!("root ({reason})"),
        }
    }

    fn discovery_path(&self, item: &PendingMark) -> Vec<String> {
        let mut path = vec![self.describe_hop(item.source, &item.reason)];
        if let Some(chain) = item.source.and_then(|src| self.log.discovery_path(src)) {
            path.extend(
                chain
                    .iter()
                    .map(|hop| self.describe_hop(hop.source, &hop.reason)),
            );
        }
        path
    }
}

impl<C: DependencyContext + Sync, L: LogStrategy> DependencyAnalyzer<'_, C, L> {
    /// Run the walk with dependency queries spread across the rayon pool.
    pub fn compute_marked_nodes_parallel(&mut self) -> Result<(), AnalysisError> {
        let _span = debug_span!("compute_marked_nodes_parallel", strategy = L::NAME).entered();

        while !self.pending.is_empty() {
            self.stats.waves += 1;
            let wave: Vec<PendingMark> = self.pending.drain(..).collect();

            let mut seen = FxHashSet::default();
            let to_query: Vec<NodeId> = wave
                .iter()
                .map(|item| item.node)
                .filter(|node| !self.marked.contains(node) && seen.insert(*node))
                .collect();
            trace!(wave = self.stats.waves, nodes = to_query.len(), "querying wave");

            let context = self.context;
            let results: Vec<Result<NodeDependencies, C::Error>> = to_query
                .par_iter()
                .map(|&node| query_dependencies(context, node))
                .collect();
            let mut computed: FxHashMap<NodeId, Result<NodeDependencies, C::Error>> =
                to_query.into_iter().zip(results).collect();

            let mut items = wave.into_iter();
            while let Some(item) = items.next() {
                if self.marked.contains(&item.node) {
                    self.stats.revisits += 1;
                    continue;
                }
                let deps = match computed.remove(&item.node) {
                    Some(result) => result,
                    None => query_dependencies(self.context, item.node),
                };
                match deps {
                    Ok(deps) => self.mark(item, deps),
                    Err(source) => {
                        let err = self.query_failed(&item, source);
                        // Restore the queue as the sequential walk would leave it.
                        let mut restored: VecDeque<PendingMark> =
                            std::iter::once(item).chain(items).collect();
                        restored.extend(self.pending.drain(..));
                        self.pending = restored;
                        return Err(err);
                    }
                }
            }
        }

        debug!(stats = ?self.stats, "parallel dependency walk complete");
        Ok(())
    }
}
