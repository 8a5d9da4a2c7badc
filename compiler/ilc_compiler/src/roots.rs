//! Compilation roots: nodes required regardless of other references.

use ilc_depgraph::{NodeId, Reason};
use ilc_typesys::{MethodId, ModuleId};
use tracing::debug;

use crate::codegen::SymbolRequest;
use crate::factory::NodeFactory;
use crate::NodeError;

/// Collects roots from providers, in the order they are added.
pub struct RootingServiceProvider<'a> {
    factory: &'a NodeFactory,
    roots: Vec<(NodeId, Reason)>,
}

impl<'a> RootingServiceProvider<'a> {
    pub fn new(factory: &'a NodeFactory) -> Self {
        Self {
            factory,
            roots: Vec::new(),
        }
    }

    pub fn factory(&self) -> &'a NodeFactory {
        self.factory
    }

    pub fn add_root(&mut self, node: NodeId, reason: impl Into<Reason>) {
        self.roots.push((node, reason.into()));
    }

    /// Resolve `request` against the module group and root the result.
    pub fn root_symbol(
        &mut self,
        request: &SymbolRequest,
        reason: impl Into<Reason>,
    ) -> Result<NodeId, NodeError> {
        let node = self.factory.resolve(request)?;
        self.add_root(node, reason);
        Ok(node)
    }

    pub fn roots(&self) -> &[(NodeId, Reason)] {
        &self.roots
    }

    pub fn into_roots(self) -> Vec<(NodeId, Reason)> {
        self.roots
    }
}

pub trait CompilationRootProvider: Send + Sync {
    fn add_compilation_roots(&self, rooting: &mut RootingServiceProvider<'_>)
        -> Result<(), NodeError>;
}

/// Roots the program's entry point.
#[derive(Debug, Clone, Copy)]
pub struct EntryPointRootProvider {
    pub entry_point: MethodId,
}

impl EntryPointRootProvider {
    pub fn new(entry_point: MethodId) -> Self {
        Self { entry_point }
    }
}

impl CompilationRootProvider for EntryPointRootProvider {
    fn add_compilation_roots(
        &self,
        rooting: &mut RootingServiceProvider<'_>,
    ) -> Result<(), NodeError> {
        rooting.root_symbol(
            &SymbolRequest::MethodEntrypoint(self.entry_point),
            "entry point",
        )?;
        Ok(())
    }
}

/// Roots the exported surface of a library: every closed, non-generic type
/// and method defined in the module.
#[derive(Debug, Clone, Copy)]
pub struct LibraryRootProvider {
    pub module: ModuleId,
}

impl LibraryRootProvider {
    pub fn new(module: ModuleId) -> Self {
        Self { module }
    }
}

impl CompilationRootProvider for LibraryRootProvider {
    fn add_compilation_roots(
        &self,
        rooting: &mut RootingServiceProvider<'_>,
    ) -> Result<(), NodeError> {
        let context = rooting.factory().context();
        let mut rooted = 0usize;
        for ty in context.types_in_module(self.module) {
            let Ok(desc) = context.type_desc(ty) else {
                continue;
            };
            if desc.is_open() || desc.instantiation.is_some() {
                continue;
            }
            rooting.root_symbol(&SymbolRequest::TypeHandle(ty), "library type")?;
            rooted += 1;

            for method in context.methods_of_type(ty) {
                let Ok(method_desc) = context.method(method) else {
                    continue;
                };
                if method_desc.generic_param_count > 0 || method_desc.instantiation.is_some() {
                    continue;
                }
                rooting.root_symbol(&SymbolRequest::MethodEntrypoint(method), "library method")?;
                rooted += 1;
            }
        }
        debug!(module = %self.module, rooted, "rooted library surface");
        Ok(())
    }
}

/// Roots an explicit list of symbols, e.g. from a root file or exports list.
#[derive(Debug, Clone, Default)]
pub struct ExplicitRootProvider {
    pub roots: Vec<(SymbolRequest, Reason)>,
}

impl ExplicitRootProvider {
    pub fn new(roots: impl IntoIterator<Item = (SymbolRequest, Reason)>) -> Self {
        Self {
            roots: roots.into_iter().collect(),
        }
    }
}

impl CompilationRootProvider for ExplicitRootProvider {
    fn add_compilation_roots(
        &self,
        rooting: &mut RootingServiceProvider<'_>,
    ) -> Result<(), NodeError> {
        for (request, reason) in &self.roots {
            rooting.root_symbol(request, reason.clone())?;
        }
        Ok(())
    }
}
