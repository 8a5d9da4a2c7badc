//! A deterministic code generator for tests and backend-less runs.

use std::sync::atomic::{AtomicUsize, Ordering};

use ilc_typesys::{MethodId, TypeSystemContext};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::codegen::{CodeGenerator, CodeReference, CodegenError, CodegenOptions, CompiledMethod};

/// Body emitted for methods without a script: a single `ret`.
const DEFAULT_BODY: &[u8] = &[0xC3];

#[derive(Debug, Clone)]
enum Script {
    Compile(Vec<CodeReference>),
    Fail(CodegenError),
}

/// Table-driven backend: each method's references are fixed up front.
///
/// Unscripted methods compile to a body with no references. Invocations are
/// counted so tests can observe memoization.
#[derive(Debug, Default)]
pub struct ScriptedCodeGenerator {
    scripts: FxHashMap<MethodId, Script>,
    invocations: AtomicUsize,
    per_method: Mutex<FxHashMap<MethodId, usize>>,
}

impl ScriptedCodeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiling `method` reports `references`, in order.
    #[must_use]
    pub fn with_method(
        mut self,
        method: MethodId,
        references: impl IntoIterator<Item = CodeReference>,
    ) -> Self {
        self.scripts
            .insert(method, Script::Compile(references.into_iter().collect()));
        self
    }

    /// Compiling `method` fails with `message`.
    #[must_use]
    pub fn with_failure(mut self, method: MethodId, message: impl Into<String>) -> Self {
        self.scripts.insert(
            method,
            Script::Fail(CodegenError::Unsupported(message.into())),
        );
        self
    }

    /// Total `compile_method` calls.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::Relaxed)
    }

    pub fn invocations_for(&self, method: MethodId) -> usize {
        self.per_method.lock().get(&method).copied().unwrap_or(0)
    }
}

impl CodeGenerator for ScriptedCodeGenerator {
    fn compile_method(
        &self,
        _context: &TypeSystemContext,
        method: MethodId,
        options: &CodegenOptions,
    ) -> Result<CompiledMethod, CodegenError> {
        self.invocations.fetch_add(1, Ordering::Relaxed);
        *self.per_method.lock().entry(method).or_insert(0) += 1;

        let references = match self.scripts.get(&method) {
            Some(Script::Fail(err)) => return Err(err.clone()),
            Some(Script::Compile(references)) => references.clone(),
            None => Vec::new(),
        };
        let mut code = DEFAULT_BODY.to_vec();
        if options.debug_info {
            // Stand-in for a line table.
            code.push(0xCC);
        }
        Ok(CompiledMethod { code, references })
    }
}
