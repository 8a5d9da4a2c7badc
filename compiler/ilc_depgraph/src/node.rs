//! Node handles and the dependency query contract.

use std::borrow::Cow;
use std::fmt;

/// Why an edge exists. Usually a static string, occasionally formatted.
pub type Reason = Cow<'static, str>;

/// Stable handle to a node owned by a [`DependencyContext`].
///
/// Two handles are equal exactly when they denote the same node; this is the
/// deduplication contract the analyzer relies on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Index into the owning arena.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Handle for arena slot `index`, or `None` once the arena outgrows `u32`.
    #[inline]
    pub fn try_from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(Self)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// A static edge: always present once the source node is visited.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyListEntry {
    pub node: NodeId,
    pub reason: Reason,
}

impl DependencyListEntry {
    pub fn new(node: NodeId, reason: impl Into<Reason>) -> Self {
        Self {
            node,
            reason: reason.into(),
        }
    }
}

/// A conditional edge: `node` is required only once `condition` is marked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConditionalDependencyEntry {
    pub node: NodeId,
    pub condition: NodeId,
    pub reason: Reason,
}

impl ConditionalDependencyEntry {
    pub fn new(node: NodeId, condition: NodeId, reason: impl Into<Reason>) -> Self {
        Self {
            node,
            condition,
            reason: reason.into(),
        }
    }
}

/// The analyzer's view of a node graph.
///
/// Implementors own the nodes. Dependency queries may create new nodes and
/// may run expensive work, but must be idempotent: querying the same node
/// twice yields the same edges without redoing the work.
pub trait DependencyContext {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Human-readable name, used in diagnostics and reports.
    fn node_name(&self, node: NodeId) -> String;

    fn static_dependencies(&self, node: NodeId) -> Result<Vec<DependencyListEntry>, Self::Error>;

    fn conditional_dependencies(
        &self,
        _node: NodeId,
    ) -> Result<Vec<ConditionalDependencyEntry>, Self::Error> {
        Ok(Vec::new())
    }
}
