//! End-to-end walks over small programs.

use std::sync::Arc;

use ilc_compiler::testing::ScriptedCodeGenerator;
use ilc_compiler::{
    CodeReference, CodegenOptions, CompilationOptions, DependencyTrackingLevel,
    EntryPointRootProvider, MultiModuleCompilationModuleGroup, NodeFactory, NodeKey,
    SingleFileCompilationModuleGroup, SymbolRequest,
};
use pretty_assertions::assert_eq;

use crate::util::{
    compile, sorted_names, world, HELPER, IMPORTED_DICT_B, MAIN, METHOD_A, METHOD_C, TYPE_T,
};

fn options(tracking_level: DependencyTrackingLevel, entry: ilc_typesys::MethodId) -> CompilationOptions {
    CompilationOptions {
        tracking_level,
        roots: vec![Box::new(EntryPointRootProvider::new(entry))],
        ..CompilationOptions::default()
    }
}

#[test]
fn method_with_imported_dictionary_marks_exactly_three() {
    let (context, ids) = world();
    let backend = ScriptedCodeGenerator::new().with_method(
        ids.method_a,
        [
            CodeReference::new(SymbolRequest::TypeHandle(ids.type_t), "ldtoken"),
            CodeReference::new(
                SymbolRequest::MethodGenericDictionary(ids.method_b_int),
                "generic lookup",
            ),
        ],
    );
    let group = MultiModuleCompilationModuleGroup::new([ids.app]);

    let results = compile(
        context,
        group,
        backend,
        options(DependencyTrackingLevel::First, ids.method_a),
    );

    assert_eq!(
        results.marked_names().collect::<Vec<_>>(),
        vec![METHOD_A, TYPE_T, IMPORTED_DICT_B]
    );

    let dict = results.marked_node(IMPORTED_DICT_B).unwrap();
    assert_eq!(dict.key, NodeKey::ImportedMethodGenericDictionary(ids.method_b_int));
    assert!(dict.is_indirection_cell);

    let report = results.report.as_ref().unwrap();
    let reasons = &report.node(IMPORTED_DICT_B).unwrap().reasons;
    assert_eq!(reasons.len(), 1);
    assert_eq!(reasons[0].describe(), format!("required by {METHOD_A}"));
    assert_eq!(reasons[0].reason, "generic lookup");

    assert_eq!(
        report.node(METHOD_A).unwrap().reasons[0].describe(),
        "root: entry point"
    );
    // TypeT is reached twice; the first edge wins.
    assert_eq!(report.node(TYPE_T).unwrap().reasons[0].reason, "owning type");
}

#[test]
fn cycle_marks_each_method_once() {
    let (context, ids) = world();
    let backend = ScriptedCodeGenerator::new()
        .with_method(
            ids.method_a,
            [CodeReference::new(
                SymbolRequest::MethodEntrypoint(ids.method_c),
                "call",
            )],
        )
        .with_method(
            ids.method_c,
            [CodeReference::new(
                SymbolRequest::MethodEntrypoint(ids.method_a),
                "call",
            )],
        );

    let results = compile(
        context,
        SingleFileCompilationModuleGroup,
        backend,
        options(DependencyTrackingLevel::All, ids.method_a),
    );

    let mut expected = vec![METHOD_A, METHOD_C, TYPE_T];
    expected.sort_unstable();
    assert_eq!(sorted_names(&results), expected);
    assert_eq!(results.stats.nodes_marked, 3);

    // Full graph keeps the back edge into the already-marked root.
    let report = results.report.as_ref().unwrap();
    let into_a: Vec<String> = report
        .node(METHOD_A)
        .unwrap()
        .reasons
        .iter()
        .map(ilc_depgraph::ReportReason::describe)
        .collect();
    assert_eq!(
        into_a,
        vec!["root: entry point".to_string(), format!("required by {METHOD_C}")]
    );
}

#[test]
fn imported_dictionary_names_are_deterministic() {
    let name_from_fresh_factory = || {
        let (context, ids) = world();
        let factory = NodeFactory::new(
            Arc::new(context),
            Arc::new(MultiModuleCompilationModuleGroup::new([ids.app])),
            Arc::new(ScriptedCodeGenerator::new()),
            CodegenOptions::default(),
        );
        let id = factory.method_generic_dictionary(ids.method_b_int).unwrap();
        factory.node(id).unwrap().name().to_string()
    };

    let first = name_from_fresh_factory();
    let second = name_from_fresh_factory();
    assert_eq!(first, second);
    assert_eq!(first, IMPORTED_DICT_B);
}

#[test]
fn override_compiles_only_when_slot_is_used() {
    let run = |call_virtually: bool| {
        let (context, ids) = world();
        let mut references = vec![CodeReference::new(
            SymbolRequest::TypeHandle(ids.widget),
            "newobj",
        )];
        if call_virtually {
            references.push(CodeReference::new(
                SymbolRequest::VirtualMethodUse(ids.to_string),
                "callvirt",
            ));
        }
        let backend = ScriptedCodeGenerator::new().with_method(ids.main, references);
        compile(
            context,
            SingleFileCompilationModuleGroup,
            backend,
            options(DependencyTrackingLevel::None, ids.main),
        )
    };

    let without = run(false);
    assert!(!without
        .marked_names()
        .any(|name| name == "_ilc_App$NApp$$Widget$$ToString"));

    let with = run(true);
    assert!(with
        .marked_names()
        .any(|name| name == "_ilc_App$NApp$$Widget$$ToString"));
    assert_eq!(with.stats.conditional_activations, 1);
}

#[test]
fn parallel_walk_matches_sequential() {
    let run = |parallel: bool| {
        let (context, ids) = world();
        let backend = ScriptedCodeGenerator::new()
            .with_method(
                ids.main,
                [
                    CodeReference::new(SymbolRequest::MethodEntrypoint(ids.helper), "call"),
                    CodeReference::new(SymbolRequest::MethodEntrypoint(ids.method_a), "call"),
                    CodeReference::new(SymbolRequest::TypeHandle(ids.widget), "newobj"),
                    CodeReference::new(SymbolRequest::VirtualMethodUse(ids.to_string), "callvirt"),
                ],
            )
            .with_method(
                ids.method_a,
                [
                    CodeReference::new(
                        SymbolRequest::MethodGenericDictionary(ids.method_b_int),
                        "generic lookup",
                    ),
                    CodeReference::new(SymbolRequest::MethodEntrypoint(ids.method_c), "call"),
                ],
            )
            .with_method(
                ids.helper,
                [CodeReference::new(SymbolRequest::TypeHandle(ids.int32), "box")],
            );
        compile(
            context,
            MultiModuleCompilationModuleGroup::new([ids.app]),
            backend,
            CompilationOptions {
                parallel,
                ..options(DependencyTrackingLevel::First, ids.main)
            },
        )
    };

    let sequential = run(false);
    let parallel = run(true);
    assert_eq!(sorted_names(&parallel), sorted_names(&sequential));
    assert!(sequential.marked_names().any(|name| name == HELPER));
    assert!(sequential.marked_names().any(|name| name == MAIN));
    assert!(parallel.stats.waves > 0);
}
