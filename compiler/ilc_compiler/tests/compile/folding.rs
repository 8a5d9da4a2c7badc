use std::sync::Arc;

use ilc_compiler::testing::ScriptedCodeGenerator;
use ilc_compiler::{
    CodeReference, CompilationOptions, EntryPointRootProvider, MultiModuleCompilationModuleGroup,
    SymbolRequest,
};
use pretty_assertions::assert_eq;

use crate::util::{compile, world};

fn blob(name: &str, data: &[u8]) -> CodeReference {
    CodeReference::new(
        SymbolRequest::ReadOnlyDataBlob {
            name: name.to_string(),
            data: Arc::from(data),
        },
        "ldstr",
    )
}

#[test]
fn identical_blobs_fold_and_imports_survive() {
    let (context, ids) = world();
    let backend = ScriptedCodeGenerator::new().with_method(
        ids.main,
        [
            blob("str_0", b"hello"),
            blob("str_1", b"hello"),
            blob("str_2", b"world"),
            CodeReference::new(SymbolRequest::TypeHandle(ids.int32), "box"),
            CodeReference::new(
                SymbolRequest::MethodGenericDictionary(ids.method_b_int),
                "generic lookup",
            ),
        ],
    );

    let results = compile(
        context,
        MultiModuleCompilationModuleGroup::new([ids.app]),
        backend,
        CompilationOptions {
            roots: vec![Box::new(EntryPointRootProvider::new(ids.main))],
            ..CompilationOptions::default()
        },
    );

    let id_of = |name: &str| results.marked_node(name).unwrap().id;
    let folding = &results.folding;
    assert_eq!(folding.folded_count(), 1);
    assert_eq!(folding.canonical(id_of("str_1")), Some(id_of("str_0")));
    assert_eq!(folding.canonical(id_of("str_0")), None);
    assert!(!folding.survivors().contains(&id_of("str_1")));
    assert!(folding.survivors().contains(&id_of("str_2")));

    let cells: Vec<_> = results
        .marked_nodes
        .iter()
        .filter(|node| node.is_indirection_cell)
        .collect();
    assert_eq!(cells.len(), 2);
    for cell in cells {
        assert!(folding.survivors().contains(&cell.id));
        assert_eq!(folding.canonical(cell.id), None);
    }
    assert_eq!(folding.survivors().len(), results.marked_nodes.len() - 1);
}
