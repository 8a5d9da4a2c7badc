//! Compilation configuration.
//!
//! Options are a plain struct with defaults for every field. A
//! [`CompilationBuilder`] validates them once and produces an immutable
//! [`Compilation`]; nothing is validated lazily during the walk.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use ilc_typesys::TypeSystemContext;
use tracing::debug;

use crate::codegen::{BackendOption, CodeGenerator, CodegenOptions};
use crate::compilation::Compilation;
use crate::factory::NodeFactory;
use crate::metadata::MetadataManager;
use crate::module_group::CompilationModuleGroup;
use crate::roots::CompilationRootProvider;
use crate::{ConfigError, Logger};

/// How much of the dependency graph is kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DependencyTrackingLevel {
    /// Tracking disabled. Least memory, no report.
    #[default]
    None,
    /// The first reason each node was marked.
    First,
    /// Every edge visited.
    All,
}

impl FromStr for DependencyTrackingLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "first" => Ok(Self::First),
            "all" => Ok(Self::All),
            _ => Err(ConfigError::UnknownTrackingLevel(s.to_string())),
        }
    }
}

impl fmt::Display for DependencyTrackingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::First => write!(f, "first"),
            Self::All => write!(f, "all"),
        }
    }
}

/// Optimization goal handed to code generation. The dependency walk ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizationMode {
    #[default]
    None,
    /// Minimize code size.
    PreferSize,
    /// Favor size for rarely executed code (class constructors), speed elsewhere.
    Blended,
    /// Maximize execution speed.
    PreferSpeed,
}

impl FromStr for OptimizationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "none" => Ok(Self::None),
            "prefer-size" | "size" => Ok(Self::PreferSize),
            "blended" => Ok(Self::Blended),
            "prefer-speed" | "speed" => Ok(Self::PreferSpeed),
            _ => Err(ConfigError::UnknownOptimizationMode(s.to_string())),
        }
    }
}

impl fmt::Display for OptimizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::PreferSize => write!(f, "prefer-size"),
            Self::Blended => write!(f, "blended"),
            Self::PreferSpeed => write!(f, "prefer-speed"),
        }
    }
}

/// Everything a compilation can be configured with.
#[derive(Default)]
pub struct CompilationOptions {
    pub logger: Logger,
    pub tracking_level: DependencyTrackingLevel,
    pub roots: Vec<Box<dyn CompilationRootProvider>>,
    pub optimization_mode: OptimizationMode,
    pub debug_info: bool,
    /// Raw `name[=value]` strings, parsed when the compilation is built.
    pub backend_options: Vec<String>,
    /// Dependency report destination. Requires tracking.
    pub dependency_log_file: Option<PathBuf>,
    pub metadata_log_file: Option<PathBuf>,
    /// Compute dependency queries on the rayon pool.
    pub parallel: bool,
}

impl fmt::Debug for CompilationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilationOptions")
            .field("logger", &self.logger)
            .field("tracking_level", &self.tracking_level)
            .field("roots", &self.roots.len())
            .field("optimization_mode", &self.optimization_mode)
            .field("debug_info", &self.debug_info)
            .field("backend_options", &self.backend_options)
            .field("dependency_log_file", &self.dependency_log_file)
            .field("metadata_log_file", &self.metadata_log_file)
            .field("parallel", &self.parallel)
            .finish()
    }
}

impl CompilationOptions {
    /// Check the options for contradictions and parse backend options.
    fn validate(&self) -> Result<Vec<BackendOption>, ConfigError> {
        let backend_options = self
            .backend_options
            .iter()
            .map(|opt| opt.parse())
            .collect::<Result<Vec<BackendOption>, _>>()?;

        if let Some(path) = &self.dependency_log_file {
            if self.tracking_level == DependencyTrackingLevel::None {
                return Err(ConfigError::LogFileWithoutTracking(path.clone()));
            }
            if self.metadata_log_file.as_ref() == Some(path) {
                return Err(ConfigError::ConflictingLogFiles(path.clone()));
            }
        }
        Ok(backend_options)
    }
}

/// Assembles a [`Compilation`] from a type system, a module group, a backend
/// and options.
pub struct CompilationBuilder {
    context: Arc<TypeSystemContext>,
    module_group: Arc<dyn CompilationModuleGroup>,
    backend: Arc<dyn CodeGenerator>,
    options: CompilationOptions,
}

impl CompilationBuilder {
    pub fn new(
        context: Arc<TypeSystemContext>,
        module_group: Arc<dyn CompilationModuleGroup>,
        backend: Arc<dyn CodeGenerator>,
        options: CompilationOptions,
    ) -> Self {
        Self {
            context,
            module_group,
            backend,
            options,
        }
    }

    pub fn options(&self) -> &CompilationOptions {
        &self.options
    }

    /// Validate the options and create the compilation. No node exists
    /// before this succeeds.
    pub fn to_compilation(self) -> Result<Compilation, ConfigError> {
        let backend_options = self.options.validate()?;
        let options = self.options;
        debug!(
            tracking = %options.tracking_level,
            optimization = %options.optimization_mode,
            roots = options.roots.len(),
            parallel = options.parallel,
            "building compilation"
        );

        let codegen_options = CodegenOptions {
            optimization_mode: options.optimization_mode,
            debug_info: options.debug_info,
            backend_options,
        };
        let factory = NodeFactory::new(
            self.context,
            self.module_group,
            self.backend,
            codegen_options,
        );
        Ok(Compilation::new(
            factory,
            options.logger,
            options.tracking_level,
            options.roots,
            MetadataManager::new(options.metadata_log_file),
            options.dependency_log_file,
            options.parallel,
        ))
    }
}
