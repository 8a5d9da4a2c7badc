use ilc_compiler::testing::ScriptedCodeGenerator;
use ilc_compiler::{
    CompilationOptions, DependencyTrackingLevel, ExplicitRootProvider, LibraryRootProvider,
    MultiModuleCompilationModuleGroup, SingleFileCompilationModuleGroup, SymbolRequest,
};
use pretty_assertions::assert_eq;

use crate::util::{compile, world, MAIN, TYPE_T};

#[test]
fn library_roots_cover_non_generic_surface() {
    let (context, ids) = world();

    let results = compile(
        context,
        MultiModuleCompilationModuleGroup::new([ids.core]),
        ScriptedCodeGenerator::new(),
        CompilationOptions {
            tracking_level: DependencyTrackingLevel::First,
            roots: vec![Box::new(LibraryRootProvider::new(ids.core))],
            ..CompilationOptions::default()
        },
    );

    let report = results.report.as_ref().unwrap();
    let roots: Vec<&str> = report
        .nodes
        .iter()
        .filter(|node| node.reasons.iter().any(|r| r.source.is_none()))
        .map(|node| node.name.as_str())
        .collect();
    assert_eq!(
        roots,
        vec![
            "_ilc_Core$NSystem$$Object$EEType",
            "_ilc_Core$NSystem$$Object$$ToString",
            "_ilc_Core$NSystem$$Int32$EEType",
            "_ilc_Core$NSystem$$Helpers$EEType",
        ]
    );
    // Generic MethodB and its instantiation are not part of the surface.
    assert!(!results.marked_names().any(|name| name.contains("MethodB")));
}

#[test]
fn explicit_roots_resolve_through_the_group() {
    let (context, ids) = world();

    let results = compile(
        context,
        SingleFileCompilationModuleGroup,
        ScriptedCodeGenerator::new(),
        CompilationOptions {
            tracking_level: DependencyTrackingLevel::First,
            roots: vec![Box::new(ExplicitRootProvider::new([
                (SymbolRequest::MethodEntrypoint(ids.main), "exported".into()),
                (SymbolRequest::TypeHandle(ids.type_t), "reflection".into()),
                (SymbolRequest::ExternSymbol("RhpThrowEx".to_string()), "runtime".into()),
            ]))],
            ..CompilationOptions::default()
        },
    );

    let report = results.report.as_ref().unwrap();
    assert_eq!(report.node(MAIN).unwrap().reasons[0].describe(), "root: exported");
    assert_eq!(report.node(TYPE_T).unwrap().reasons[0].describe(), "root: reflection");
    assert_eq!(
        report.node("RhpThrowEx").unwrap().reasons[0].describe(),
        "root: runtime"
    );
}
