//! The boundary to native code generation.
//!
//! Generating code for a method body is outside this crate. A backend
//! implements [`CodeGenerator`]; the factory calls it while answering a
//! method entrypoint's dependency query and turns every [`CodeReference`] it
//! reports into a graph edge.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use ilc_depgraph::Reason;
use ilc_typesys::{MethodId, TypeId, TypeSystemContext};
use thiserror::Error;

use crate::builder::OptimizationMode;
use crate::ConfigError;

/// A symbol that compiled code refers to, before the module group decides
/// whether it is local or imported.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SymbolRequest {
    /// A call target.
    MethodEntrypoint(MethodId),
    /// A type handle (allocation, cast, static base).
    TypeHandle(TypeId),
    /// A virtual call through a slot.
    VirtualMethodUse(MethodId),
    MethodGenericDictionary(MethodId),
    TypeGenericDictionary(TypeId),
    /// A link-time symbol such as a runtime helper.
    ExternSymbol(String),
    /// Read-only data (string literals, RVA statics).
    ReadOnlyDataBlob { name: String, data: Arc<[u8]> },
}

/// One reference found in a compiled method body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeReference {
    pub target: SymbolRequest,
    pub reason: Reason,
}

impl CodeReference {
    pub fn new(target: SymbolRequest, reason: impl Into<Reason>) -> Self {
        Self {
            target,
            reason: reason.into(),
        }
    }
}

/// Output of compiling one method body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledMethod {
    pub code: Vec<u8>,
    pub references: Vec<CodeReference>,
}

/// A backend-specific `name[=value]` option.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackendOption {
    pub name: String,
    pub value: Option<String>,
}

impl FromStr for BackendOption {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ConfigError::MalformedBackendOption(s.to_string());
        let (name, value) = match s.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (s, None),
        };
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(malformed());
        }
        if value.is_some_and(str::is_empty) {
            return Err(malformed());
        }
        Ok(Self {
            name: name.to_string(),
            value: value.map(str::to_string),
        })
    }
}

impl fmt::Display for BackendOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={value}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Settings handed to the backend for every method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodegenOptions {
    pub optimization_mode: OptimizationMode,
    pub debug_info: bool,
    pub backend_options: Vec<BackendOption>,
}

impl CodegenOptions {
    /// Value of the last backend option called `name`.
    pub fn backend_option(&self, name: &str) -> Option<&BackendOption> {
        self.backend_options.iter().rev().find(|opt| opt.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    /// The backend cannot compile this method (no body, unsupported construct).
    #[error("{0}")]
    Unsupported(String),

    #[error("backend failure: {0}")]
    Backend(String),
}

/// A native code generator for method bodies.
pub trait CodeGenerator: Send + Sync {
    fn compile_method(
        &self,
        context: &TypeSystemContext,
        method: MethodId,
        options: &CodegenOptions,
    ) -> Result<CompiledMethod, CodegenError>;
}
