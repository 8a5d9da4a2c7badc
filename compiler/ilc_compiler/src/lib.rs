//! ILC back end: node kinds, the node factory and the compilation driver.
//!
//! This crate binds the generic walk in `ilc_depgraph` to the entities of a
//! compiled program. Each [`Node`] stands for one thing the output needs
//! (a method body, a type descriptor, a generic dictionary, an import cell)
//! and the [`NodeFactory`] answers what each node depends on.
//!
//! # Architecture
//!
//! ```text
//! CompilationOptions ──> CompilationBuilder ──> Compilation::compile
//!                                                    │
//!             root providers ──> RootingServiceProvider
//!                                                    │
//!                   DependencyAnalyzer<NodeFactory, LogStrategy>
//!                                                    │
//!          FoldingPlan · GeneratedMetadata · DependencyReport
//! ```
//!
//! # Tracing
//!
//! Set `RUST_LOG` and call [`init_tracing`] to see spans for compilation,
//! analysis waves and per-method code generation.

mod builder;
mod codegen;
mod compilation;
mod error;
mod factory;
mod folding;
mod logger;
pub mod mangle;
mod metadata;
mod module_group;
mod nodes;
mod roots;
pub mod testing;

use std::sync::Once;

pub use builder::{CompilationBuilder, CompilationOptions, DependencyTrackingLevel, OptimizationMode};
pub use codegen::{
    BackendOption, CodeGenerator, CodeReference, CodegenError, CodegenOptions, CompiledMethod,
    SymbolRequest,
};
pub use compilation::{Compilation, CompilationResults, MarkedNode};
pub use error::{CompilationError, ConfigError, DiagnosticFailure, NodeError};
pub use factory::NodeFactory;
pub use folding::FoldingPlan;
pub use logger::{LogBuffer, Logger};
pub use mangle::NameMangler;
pub use metadata::{GeneratedMetadata, MetadataEntry, MetadataManager};
pub use module_group::{
    CompilationModuleGroup, MultiModuleCompilationModuleGroup, SingleFileCompilationModuleGroup,
};
pub use nodes::{Node, NodeKey};
pub use roots::{
    CompilationRootProvider, EntryPointRootProvider, ExplicitRootProvider, LibraryRootProvider,
    RootingServiceProvider,
};

static TRACING_INIT: Once = Once::new();

/// Initialize the tracing subscriber.
///
/// Does nothing unless `RUST_LOG` is set. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
