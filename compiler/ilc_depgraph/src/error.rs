use std::error::Error;

use thiserror::Error;

/// A failure that aborts the dependency walk.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A node's dependency query failed (for example, its method body did not compile).
    ///
    /// `path` lists how the node was reached, nearest hop first.
    #[error("cannot compute dependencies of `{node}` (reached via {})", .path.join(" <- "))]
    DependencyQuery {
        node: String,
        path: Vec<String>,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}
