//! Running a configured compilation.

use std::path::PathBuf;

use ilc_depgraph::{
    AnalysisError, AnalysisStats, DependencyAnalyzer, DependencyReport, FirstMarkLogStrategy,
    FullGraphLogStrategy, LogStrategy, NoLogStrategy, NodeId, Reason,
};
use tracing::{debug, info, info_span, warn};

use crate::builder::DependencyTrackingLevel;
use crate::factory::NodeFactory;
use crate::folding::FoldingPlan;
use crate::metadata::{GeneratedMetadata, MetadataManager};
use crate::nodes::NodeKey;
use crate::roots::{CompilationRootProvider, RootingServiceProvider};
use crate::{CompilationError, DiagnosticFailure, Logger, NodeError};

/// A validated compilation, ready to run. Built by
/// [`CompilationBuilder`](crate::CompilationBuilder).
pub struct Compilation {
    factory: NodeFactory,
    logger: Logger,
    tracking_level: DependencyTrackingLevel,
    root_providers: Vec<Box<dyn CompilationRootProvider>>,
    metadata_manager: MetadataManager,
    dependency_log_file: Option<PathBuf>,
    parallel: bool,
}

/// A node the walk marked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedNode {
    pub id: NodeId,
    pub name: String,
    pub key: NodeKey,
    pub is_indirection_cell: bool,
    pub is_combinable: bool,
}

#[derive(Debug, Clone)]
pub struct CompilationResults {
    /// In marking order.
    pub marked_nodes: Vec<MarkedNode>,
    /// Present when dependency tracking is enabled.
    pub report: Option<DependencyReport>,
    pub stats: AnalysisStats,
    pub folding: FoldingPlan,
    pub metadata: GeneratedMetadata,
    /// Diagnostic artifacts that could not be written. The compilation
    /// itself still succeeded.
    pub diagnostic_failures: Vec<DiagnosticFailure>,
}

impl CompilationResults {
    pub fn marked_node(&self, name: &str) -> Option<&MarkedNode> {
        self.marked_nodes.iter().find(|node| node.name == name)
    }

    pub fn marked_names(&self) -> impl Iterator<Item = &str> {
        self.marked_nodes.iter().map(|node| node.name.as_str())
    }
}

struct WalkOutcome {
    marked: Vec<NodeId>,
    report: Option<DependencyReport>,
    stats: AnalysisStats,
}

impl Compilation {
    pub(crate) fn new(
        factory: NodeFactory,
        logger: Logger,
        tracking_level: DependencyTrackingLevel,
        root_providers: Vec<Box<dyn CompilationRootProvider>>,
        metadata_manager: MetadataManager,
        dependency_log_file: Option<PathBuf>,
        parallel: bool,
    ) -> Self {
        Self {
            factory,
            logger,
            tracking_level,
            root_providers,
            metadata_manager,
            dependency_log_file,
            parallel,
        }
    }

    pub fn factory(&self) -> &NodeFactory {
        &self.factory
    }

    pub fn tracking_level(&self) -> DependencyTrackingLevel {
        self.tracking_level
    }

    /// Gather roots, walk the graph, then fold, collect metadata and write
    /// the diagnostic logs.
    pub fn compile(&self) -> Result<CompilationResults, CompilationError> {
        let _span = info_span!("compile", tracking = %self.tracking_level).entered();

        let roots = self.gather_roots()?;
        self.logger
            .log(format_args!("{} compilation roots", roots.len()));

        let walk = match self.tracking_level {
            DependencyTrackingLevel::None => self.walk::<NoLogStrategy>(roots)?,
            DependencyTrackingLevel::First => self.walk::<FirstMarkLogStrategy>(roots)?,
            DependencyTrackingLevel::All => self.walk::<FullGraphLogStrategy>(roots)?,
        };
        info!(
            marked = walk.stats.nodes_marked,
            edges = walk.stats.edges_visited,
            "dependency analysis finished"
        );
        self.logger.log(format_args!(
            "{} nodes marked, {} edges visited",
            walk.stats.nodes_marked, walk.stats.edges_visited
        ));

        let folding = FoldingPlan::compute(&self.factory, &walk.marked);
        debug!(folded = folding.folded_count(), "folded combinable nodes");

        let metadata = self.metadata_manager.collect(&self.factory, &walk.marked);

        let mut diagnostic_failures = Vec::new();
        if let Err(failure) = self.metadata_manager.write_log(&metadata) {
            diagnostic_failures.push(failure);
        }
        if let Some(failure) = self.write_dependency_log(walk.report.as_ref()) {
            diagnostic_failures.push(failure);
        }
        for failure in &diagnostic_failures {
            warn!(%failure, "diagnostic output skipped");
            self.logger.log(format_args!("warning: {failure}"));
        }

        let marked_nodes = walk
            .marked
            .iter()
            .filter_map(|&id| {
                self.factory.node(id).map(|node| MarkedNode {
                    id,
                    name: node.name().to_string(),
                    key: node.key().clone(),
                    is_indirection_cell: node.is_indirection_cell(),
                    is_combinable: node.is_combinable(),
                })
            })
            .collect();

        Ok(CompilationResults {
            marked_nodes,
            report: walk.report,
            stats: walk.stats,
            folding,
            metadata,
            diagnostic_failures,
        })
    }

    fn gather_roots(&self) -> Result<Vec<(NodeId, Reason)>, NodeError> {
        let mut rooting = RootingServiceProvider::new(&self.factory);
        for provider in &self.root_providers {
            provider.add_compilation_roots(&mut rooting)?;
        }
        Ok(rooting.into_roots())
    }

    fn walk<L: LogStrategy>(&self, roots: Vec<(NodeId, Reason)>) -> Result<WalkOutcome, AnalysisError> {
        let mut analyzer = DependencyAnalyzer::<NodeFactory, L>::new(&self.factory);
        for (node, reason) in roots {
            analyzer.add_root(node, reason);
        }
        if self.parallel {
            analyzer.compute_marked_nodes_parallel()?;
        } else {
            analyzer.compute_marked_nodes()?;
        }
        Ok(WalkOutcome {
            marked: analyzer.marked_nodes().to_vec(),
            report: analyzer.report(),
            stats: analyzer.stats(),
        })
    }

    fn write_dependency_log(&self, report: Option<&DependencyReport>) -> Option<DiagnosticFailure> {
        let path = self.dependency_log_file.as_ref()?;
        let report = report?;
        report.write_to(path).err().map(|e| DiagnosticFailure {
            artifact: path.clone(),
            message: e.to_string(),
        })
    }
}
