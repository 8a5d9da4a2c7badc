//! Demand-driven dependency analysis.
//!
//! The analyzer computes which nodes of a compilation graph must exist in the
//! output. The graph is not known up front: each node reports its
//! dependencies when it is visited, and visiting may do expensive work
//! (compiling a method body) that discovers further nodes. The walk is a
//! work-list fixpoint over a graph that grows while it is traversed.
//!
//! # Pieces
//!
//! - [`NodeId`] and [`DependencyContext`]: the opaque view of the graph. The
//!   framework never inspects node internals; the context owns the nodes and
//!   answers dependency queries for them.
//! - [`DependencyAnalyzer`]: the fixpoint engine. Marking is monotonic and
//!   checked before enqueueing, which bounds the walk and closes cycles
//!   without recursion.
//! - [`LogStrategy`]: what diagnostic record to keep. [`NoLogStrategy`],
//!   [`FirstMarkLogStrategy`] and [`FullGraphLogStrategy`] never influence
//!   which nodes get marked.
//! - [`DependencyReport`]: the rendered answer to "why is this in my binary".
//!
//! # Ordering
//!
//! The marked set is independent of root order and dependency-list order.
//! The recorded reasons are not: the queue is FIFO, so the first enqueue of a
//! node is the reason its mark carries.

mod analyzer;
mod error;
mod log_strategy;
mod node;
mod report;

pub use analyzer::{AnalysisStats, DependencyAnalyzer};
pub use error::AnalysisError;
pub use log_strategy::{
    FirstMarkLogStrategy, FullGraphLogStrategy, GraphEdge, LogStrategy, MarkReason,
    NoLogStrategy,
};
pub use node::{ConditionalDependencyEntry, DependencyContext, DependencyListEntry, NodeId, Reason};
pub use report::{DependencyReport, ReportKind, ReportNode, ReportReason};
