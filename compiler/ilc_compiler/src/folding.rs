//! Folding of combinable nodes with identical contents.

use ilc_depgraph::NodeId;
use rustc_hash::FxHashMap;

use crate::factory::NodeFactory;

/// Which marked nodes are emitted, and which share another node's storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoldingPlan {
    survivors: Vec<NodeId>,
    /// Folded node to the canonical node whose storage it shares.
    folded: FxHashMap<NodeId, NodeId>,
}

impl FoldingPlan {
    /// Group combinable nodes by contents. The first in marking order is
    /// canonical. Indirection cells always survive: their address is what
    /// consumers load through.
    pub fn compute(factory: &NodeFactory, marked: &[NodeId]) -> Self {
        let mut plan = Self::default();
        let mut canonical_by_contents: FxHashMap<Vec<u8>, NodeId> = FxHashMap::default();

        for &id in marked {
            let Some(node) = factory.node(id) else {
                continue;
            };
            if node.is_indirection_cell() || !node.is_combinable() {
                plan.survivors.push(id);
                continue;
            }
            let contents = node.data().unwrap_or_default().to_vec();
            match canonical_by_contents.get(&contents) {
                Some(&canonical) => {
                    plan.folded.insert(id, canonical);
                }
                None => {
                    canonical_by_contents.insert(contents, id);
                    plan.survivors.push(id);
                }
            }
        }
        plan
    }

    /// Nodes that get their own storage, in marking order.
    pub fn survivors(&self) -> &[NodeId] {
        &self.survivors
    }

    /// The node whose storage `node` shares, if it was folded.
    pub fn canonical(&self, node: NodeId) -> Option<NodeId> {
        self.folded.get(&node).copied()
    }

    pub fn folded_count(&self) -> usize {
        self.folded.len()
    }
}
