//! Shared fixtures for compilation tests.
//!
//! The program has two modules:
//! - `Core`: `System.Object` (virtual `ToString`), `System.Int32`, and
//!   `System.Helpers` with a generic `MethodB<T>`
//! - `App`: `App.TypeT` (`MethodA`, `MethodC`), `App.Widget` overriding
//!   `ToString`, and `Program` (`Main`, `Helper`)

use std::sync::Arc;

use ilc_compiler::testing::ScriptedCodeGenerator;
use ilc_compiler::{
    Compilation, CompilationBuilder, CompilationModuleGroup, CompilationOptions,
    CompilationResults,
};
use ilc_typesys::{
    AssemblyDefinition, EcmaAssembly, MethodDefinition, MethodId, ModuleId, TypeDefinition, TypeId,
    TypeSystemContext,
};

pub const METHOD_A: &str = "_ilc_App$NApp$$TypeT$$MethodA";
pub const METHOD_C: &str = "_ilc_App$NApp$$TypeT$$MethodC";
pub const TYPE_T: &str = "_ilc_App$NApp$$TypeT$EEType";
pub const IMPORTED_DICT_B: &str =
    "__imp___GenericDict__ilc_Core$NSystem$$Helpers$$MethodB$LTCore$NSystem$$Int32$GT";
pub const MAIN: &str = "_ilc_App$$Program$$Main";
pub const HELPER: &str = "_ilc_App$$Program$$Helper";

#[derive(Debug, Clone, Copy)]
pub struct Ids {
    pub core: ModuleId,
    pub app: ModuleId,
    pub to_string: MethodId,
    pub int32: TypeId,
    pub method_b_int: MethodId,
    pub type_t: TypeId,
    pub method_a: MethodId,
    pub method_c: MethodId,
    pub widget: TypeId,
    pub main: MethodId,
    pub helper: MethodId,
}

#[must_use]
pub fn world() -> (TypeSystemContext, Ids) {
    let mut context = TypeSystemContext::new();
    let core = context.add_module(EcmaAssembly::new(AssemblyDefinition::named("Core")));
    let app = context.add_module(EcmaAssembly::new(AssemblyDefinition::named("App")));

    let object = context
        .define_type(TypeDefinition::new(core, "System", "Object"))
        .unwrap();
    let to_string = context
        .define_method(MethodDefinition::new(object, "ToString").virtual_slot())
        .unwrap();
    let int32 = context
        .define_type(TypeDefinition::new(core, "System", "Int32").with_base(object))
        .unwrap();
    let helpers = context
        .define_type(TypeDefinition::new(core, "System", "Helpers"))
        .unwrap();
    let method_b = context
        .define_method(MethodDefinition::new(helpers, "MethodB").with_generic_params(1))
        .unwrap();
    let method_b_int = context.instantiate_method(method_b, &[int32]).unwrap();

    let type_t = context
        .define_type(TypeDefinition::new(app, "App", "TypeT"))
        .unwrap();
    let method_a = context
        .define_method(MethodDefinition::new(type_t, "MethodA"))
        .unwrap();
    let method_c = context
        .define_method(MethodDefinition::new(type_t, "MethodC"))
        .unwrap();

    let widget = context
        .define_type(TypeDefinition::new(app, "App", "Widget").with_base(object))
        .unwrap();
    let widget_to_string = context
        .define_method(MethodDefinition::new(widget, "ToString"))
        .unwrap();
    context
        .add_virtual_override(widget, to_string, widget_to_string)
        .unwrap();

    let program_ty = context
        .define_type(TypeDefinition::new(app, "", "Program"))
        .unwrap();
    let main = context
        .define_method(MethodDefinition::new(program_ty, "Main"))
        .unwrap();
    let helper = context
        .define_method(MethodDefinition::new(program_ty, "Helper"))
        .unwrap();

    let ids = Ids {
        core,
        app,
        to_string,
        int32,
        method_b_int,
        type_t,
        method_a,
        method_c,
        widget,
        main,
        helper,
    };
    (context, ids)
}

/// Build a compilation over `context`.
pub fn compilation(
    context: TypeSystemContext,
    group: impl CompilationModuleGroup + 'static,
    backend: ScriptedCodeGenerator,
    options: CompilationOptions,
) -> Compilation {
    CompilationBuilder::new(Arc::new(context), Arc::new(group), Arc::new(backend), options)
        .to_compilation()
        .unwrap()
}

/// Build and run a compilation.
pub fn compile(
    context: TypeSystemContext,
    group: impl CompilationModuleGroup + 'static,
    backend: ScriptedCodeGenerator,
    options: CompilationOptions,
) -> CompilationResults {
    compilation(context, group, backend, options)
        .compile()
        .unwrap()
}

/// Marked symbol names, sorted.
#[must_use]
pub fn sorted_names(results: &CompilationResults) -> Vec<String> {
    let mut names: Vec<String> = results.marked_names().map(str::to_string).collect();
    names.sort();
    names
}
