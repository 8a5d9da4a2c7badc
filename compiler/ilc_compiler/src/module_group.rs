//! Which entities this compilation unit emits.
//!
//! Everything the group contains is compiled locally; everything else is
//! referenced through extern or import nodes and resolved at link time.

use ilc_typesys::{MethodId, ModuleId, TypeId, TypeSystemContext};
use rustc_hash::FxHashSet;

pub trait CompilationModuleGroup: Send + Sync {
    fn contains_type(&self, context: &TypeSystemContext, ty: TypeId) -> bool;

    fn contains_method(&self, context: &TypeSystemContext, method: MethodId) -> bool;

    /// Whether this unit emits the generic dictionary of `method`.
    fn contains_method_dictionary(&self, context: &TypeSystemContext, method: MethodId) -> bool {
        self.contains_method(context, method)
    }

    /// Whether this unit emits the generic dictionary of `ty`.
    fn contains_type_dictionary(&self, context: &TypeSystemContext, ty: TypeId) -> bool {
        self.contains_type(context, ty)
    }

    /// Whether every module's code lands in this unit.
    fn is_single_file(&self) -> bool;
}

/// Compile the whole program into one unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleFileCompilationModuleGroup;

impl CompilationModuleGroup for SingleFileCompilationModuleGroup {
    fn contains_type(&self, _context: &TypeSystemContext, _ty: TypeId) -> bool {
        true
    }

    fn contains_method(&self, _context: &TypeSystemContext, _method: MethodId) -> bool {
        true
    }

    fn is_single_file(&self) -> bool {
        true
    }
}

/// Compile a subset of the program's modules into one unit.
///
/// An instantiation belongs to the unit only if its definition and every
/// type argument do; otherwise the unit that owns all of them emits it.
#[derive(Debug, Clone, Default)]
pub struct MultiModuleCompilationModuleGroup {
    modules: FxHashSet<ModuleId>,
}

impl MultiModuleCompilationModuleGroup {
    pub fn new(modules: impl IntoIterator<Item = ModuleId>) -> Self {
        Self {
            modules: modules.into_iter().collect(),
        }
    }

    pub fn contains_module(&self, module: ModuleId) -> bool {
        self.modules.contains(&module)
    }
}

impl CompilationModuleGroup for MultiModuleCompilationModuleGroup {
    fn contains_type(&self, context: &TypeSystemContext, ty: TypeId) -> bool {
        let Ok(desc) = context.type_desc(ty) else {
            return false;
        };
        self.contains_module(desc.module)
            && desc
                .type_args()
                .iter()
                .all(|&arg| self.contains_type(context, arg))
    }

    fn contains_method(&self, context: &TypeSystemContext, method: MethodId) -> bool {
        let Ok(desc) = context.method(method) else {
            return false;
        };
        self.contains_type(context, desc.owning_type)
            && desc
                .type_args()
                .iter()
                .all(|&arg| self.contains_type(context, arg))
    }

    fn is_single_file(&self) -> bool {
        false
    }
}
