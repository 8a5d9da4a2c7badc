//! Errors, logs and best-effort diagnostic output.

use std::sync::Arc;

use ilc_compiler::testing::ScriptedCodeGenerator;
use ilc_compiler::{
    CodeReference, CompilationBuilder, CompilationError, CompilationOptions, ConfigError,
    DependencyTrackingLevel, EntryPointRootProvider, LogBuffer, Logger, NodeError,
    SingleFileCompilationModuleGroup, SymbolRequest,
};
use ilc_depgraph::AnalysisError;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use crate::util::{compilation, compile, world, HELPER, MAIN};

fn main_calls_helper() -> (ilc_typesys::TypeSystemContext, crate::util::Ids, ScriptedCodeGenerator) {
    let (context, ids) = world();
    let backend = ScriptedCodeGenerator::new().with_method(
        ids.main,
        [CodeReference::new(
            SymbolRequest::MethodEntrypoint(ids.helper),
            "call",
        )],
    );
    (context, ids, backend)
}

#[test]
fn config_errors_stop_before_the_walk() {
    let (context, ids, backend) = main_calls_helper();
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("deps.txt");

    let err = CompilationBuilder::new(
        Arc::new(context),
        Arc::new(SingleFileCompilationModuleGroup),
        Arc::new(backend),
        CompilationOptions {
            roots: vec![Box::new(EntryPointRootProvider::new(ids.main))],
            dependency_log_file: Some(log.clone()),
            ..CompilationOptions::default()
        },
    )
    .to_compilation()
    .err();

    assert_eq!(err, Some(ConfigError::LogFileWithoutTracking(log.clone())));
    assert!(!log.exists());

    let as_compilation_error = CompilationError::from(ConfigError::LogFileWithoutTracking(log));
    assert!(as_compilation_error
        .to_string()
        .contains("dependency tracking is disabled"));
}

#[test]
fn dependency_log_is_written_as_json() {
    let (context, ids, backend) = main_calls_helper();
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("deps.json");

    let results = compile(
        context,
        SingleFileCompilationModuleGroup,
        backend,
        CompilationOptions {
            tracking_level: DependencyTrackingLevel::First,
            roots: vec![Box::new(EntryPointRootProvider::new(ids.main))],
            dependency_log_file: Some(log.clone()),
            ..CompilationOptions::default()
        },
    );

    assert!(results.diagnostic_failures.is_empty());
    let json = std::fs::read_to_string(&log).unwrap();
    assert!(json.contains("\"kind\": \"first_mark\""));
    assert!(json.contains(HELPER));
}

#[test]
fn metadata_log_lists_local_entities() {
    let (context, ids, backend) = main_calls_helper();
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("metadata.txt");

    let results = compile(
        context,
        SingleFileCompilationModuleGroup,
        backend,
        CompilationOptions {
            roots: vec![Box::new(EntryPointRootProvider::new(ids.main))],
            metadata_log_file: Some(log.clone()),
            ..CompilationOptions::default()
        },
    );

    let names: Vec<&str> = results
        .metadata
        .methods
        .iter()
        .map(|entry| entry.name.as_str())
        .collect();
    assert_eq!(names, vec!["Program.Helper", "Program.Main"]);
    assert_eq!(results.metadata.types.len(), 1);

    let written = std::fs::read_to_string(&log).unwrap();
    assert_eq!(written, results.metadata.to_log());
    assert!(written.contains(&format!("method Program.Main {MAIN}")));
}

#[test]
fn unwritable_log_does_not_abort() {
    let (context, ids, backend) = main_calls_helper();
    let temp = TempDir::new().unwrap();
    // A directory cannot be written as a file.
    let log = temp.path().to_path_buf();

    let results = compile(
        context,
        SingleFileCompilationModuleGroup,
        backend,
        CompilationOptions {
            tracking_level: DependencyTrackingLevel::All,
            roots: vec![Box::new(EntryPointRootProvider::new(ids.main))],
            dependency_log_file: Some(log.clone()),
            ..CompilationOptions::default()
        },
    );

    assert_eq!(results.diagnostic_failures.len(), 1);
    assert_eq!(results.diagnostic_failures[0].artifact, log);
    assert_eq!(results.marked_nodes.len(), 3);
}

#[test]
fn verbose_logger_reports_progress() {
    let (context, ids, backend) = main_calls_helper();
    let buffer = LogBuffer::new();

    compile(
        context,
        SingleFileCompilationModuleGroup,
        backend,
        CompilationOptions {
            logger: Logger::new(buffer.clone()),
            roots: vec![Box::new(EntryPointRootProvider::new(ids.main))],
            ..CompilationOptions::default()
        },
    );

    assert_eq!(
        buffer.contents(),
        "1 compilation roots\n3 nodes marked, 3 edges visited\n"
    );
}

#[test]
fn codegen_failure_aborts_with_discovery_path() {
    let (context, ids, backend) = main_calls_helper();
    let backend = backend.with_failure(ids.helper, "no IL body");

    let err = compilation(
        context,
        SingleFileCompilationModuleGroup,
        backend,
        CompilationOptions {
            tracking_level: DependencyTrackingLevel::First,
            roots: vec![Box::new(EntryPointRootProvider::new(ids.main))],
            ..CompilationOptions::default()
        },
    )
    .compile()
    .unwrap_err();

    let (node, path, source) = match err {
        CompilationError::Analysis(AnalysisError::DependencyQuery { node, path, source }) => {
            (node, path, source)
        }
        other => panic!("expected an analysis error, got {other}"),
    };
    assert_eq!(node, HELPER);
    assert_eq!(
        path,
        vec![format!("{MAIN} (call)"), "root (entry point)".to_string()]
    );
    let node_error = source.downcast_ref::<NodeError>().unwrap();
    assert!(matches!(node_error, NodeError::Codegen { .. }));
    assert_eq!(
        std::error::Error::source(node_error).unwrap().to_string(),
        "no IL body"
    );
}

#[test]
fn unresolvable_root_is_a_node_error() {
    let (context, _ids) = world();

    let err = compilation(
        context,
        SingleFileCompilationModuleGroup,
        ScriptedCodeGenerator::new(),
        CompilationOptions {
            roots: vec![Box::new(EntryPointRootProvider::new(
                ilc_typesys::MethodId::from_raw(999),
            ))],
            ..CompilationOptions::default()
        },
    )
    .compile()
    .unwrap_err();

    assert!(matches!(err, CompilationError::Node(NodeError::KeyResolution { .. })));
}
