//! Error types for the compilation driver.
//!
//! Node construction, configuration and the dependency walk abort the
//! compilation. Diagnostic output failures never do: they are collected as
//! [`DiagnosticFailure`] values in the results.

use std::path::PathBuf;

use ilc_depgraph::AnalysisError;
use thiserror::Error;

use crate::codegen::CodegenError;

/// Failure to construct a node or compute its dependencies.
#[derive(Debug, Error)]
pub enum NodeError {
    /// No node can exist for `key`: the entity is unknown, still open, or
    /// lacks what the key asks for.
    #[error(
        "cannot create node for {key}{}: {message}",
        .requested_by.as_ref().map(|by| format!(" (requested by `{by}`)")).unwrap_or_default()
    )]
    KeyResolution {
        key: String,
        /// Name of the node whose dependency query asked for `key`.
        requested_by: Option<String>,
        message: String,
    },

    #[error("code generation failed for `{method}`")]
    Codegen {
        method: String,
        #[source]
        source: CodegenError,
    },
}

/// Invalid or contradictory compilation options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown dependency tracking level `{0}` (expected none, first or all)")]
    UnknownTrackingLevel(String),

    #[error(
        "unknown optimization mode `{0}` (expected none, prefer-size, blended or prefer-speed)"
    )]
    UnknownOptimizationMode(String),

    #[error("malformed backend option `{0}` (expected `name` or `name=value`)")]
    MalformedBackendOption(String),

    #[error("dependency log `{}` requested but dependency tracking is disabled", .0.display())]
    LogFileWithoutTracking(PathBuf),

    #[error("metadata log and dependency log both write to `{}`", .0.display())]
    ConflictingLogFiles(PathBuf),
}

/// Any failure that aborts a compilation.
#[derive(Debug, Error)]
pub enum CompilationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Node(#[from] NodeError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// A best-effort diagnostic artifact that could not be written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not write {}: {message}", .artifact.display())]
pub struct DiagnosticFailure {
    pub artifact: PathBuf,
    pub message: String,
}
