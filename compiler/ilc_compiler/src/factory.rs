//! The node factory: identity authority and dependency oracle.
//!
//! # Identity
//!
//! Every node is created through [`NodeFactory::get_or_create`]. Nodes live
//! in an arena behind one `RwLock`; lookups take the read lock, creation
//! double-checks under the write lock, so concurrent requests for the same
//! key observe a single [`NodeId`].
//!
//! # Dependencies
//!
//! The factory implements [`DependencyContext`]. A method entrypoint's query
//! compiles the method (once, memoized on the node) and turns the references
//! found in its body into edges. Whether a referenced entity becomes a local
//! node or an extern/import node is decided by the [`CompilationModuleGroup`].

use std::sync::Arc;

use ilc_depgraph::{ConditionalDependencyEntry, DependencyContext, DependencyListEntry, NodeId};
use ilc_typesys::{MethodId, TypeId, TypeSystemContext};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug_span, trace};

use crate::codegen::{CodeGenerator, CodegenOptions, CompiledMethod, SymbolRequest};
use crate::mangle::NameMangler;
use crate::module_group::CompilationModuleGroup;
use crate::nodes::{Node, NodeKey};
use crate::NodeError;

#[derive(Default)]
struct FactoryState {
    nodes: Vec<Arc<Node>>,
    by_key: FxHashMap<NodeKey, NodeId>,
}

/// Creates and owns every node of one compilation.
pub struct NodeFactory {
    context: Arc<TypeSystemContext>,
    module_group: Arc<dyn CompilationModuleGroup>,
    backend: Arc<dyn CodeGenerator>,
    codegen_options: CodegenOptions,
    mangler: NameMangler,
    state: RwLock<FactoryState>,
}

impl NodeFactory {
    pub fn new(
        context: Arc<TypeSystemContext>,
        module_group: Arc<dyn CompilationModuleGroup>,
        backend: Arc<dyn CodeGenerator>,
        codegen_options: CodegenOptions,
    ) -> Self {
        Self {
            context,
            module_group,
            backend,
            codegen_options,
            mangler: NameMangler::new(),
            state: RwLock::new(FactoryState::default()),
        }
    }

    pub fn context(&self) -> &TypeSystemContext {
        &self.context
    }

    pub fn module_group(&self) -> &dyn CompilationModuleGroup {
        &*self.module_group
    }

    pub fn name_mangler(&self) -> &NameMangler {
        &self.mangler
    }

    pub fn codegen_options(&self) -> &CodegenOptions {
        &self.codegen_options
    }

    // -- Identity --

    /// The node for `key`, created on first request.
    ///
    /// Data blobs cannot be created through this entry point since their
    /// contents are not part of the key; use [`Self::read_only_data_blob`].
    pub fn get_or_create(&self, key: NodeKey) -> Result<NodeId, NodeError> {
        self.intern(key, None, None)
    }

    /// The node for `key`, if it has been created.
    pub fn lookup(&self, key: &NodeKey) -> Option<NodeId> {
        self.state.read().by_key.get(key).copied()
    }

    pub fn node(&self, id: NodeId) -> Option<Arc<Node>> {
        self.state.read().nodes.get(id.index()).cloned()
    }

    pub fn node_count(&self) -> usize {
        self.state.read().nodes.len()
    }

    fn intern(
        &self,
        key: NodeKey,
        data: Option<Arc<[u8]>>,
        requested_by: Option<NodeId>,
    ) -> Result<NodeId, NodeError> {
        // Fast path: node already exists
        let existing = {
            let state = self.state.read();
            state
                .by_key
                .get(&key)
                .map(|&id| (id, Self::same_contents(&state, id, data.as_deref())))
        };
        if let Some((id, same)) = existing {
            return self.existing_or_conflict(id, same, &key, requested_by);
        }

        let name = self
            .symbol_name(&key, data.is_some())
            .map_err(|message| self.key_error(&key, requested_by, message))?;

        let mut state = self.state.write();

        // Double-check after acquiring write lock
        if let Some(&id) = state.by_key.get(&key) {
            let same = Self::same_contents(&state, id, data.as_deref());
            drop(state);
            return self.existing_or_conflict(id, same, &key, requested_by);
        }

        let Some(id) = Self::next_slot(state.nodes.len()) else {
            drop(state);
            return Err(self.key_error(&key, requested_by, "node arena is full".to_string()));
        };
        trace!(%id, %key, %name, "created node");
        state
            .nodes
            .push(Arc::new(Node::new(key.clone(), name, data)));
        state.by_key.insert(key, id);
        Ok(id)
    }

    fn next_slot(len: usize) -> Option<NodeId> {
        NodeId::try_from_index(len)
    }

    /// A blob requested again must carry the same bytes. Other keys carry no data.
    fn same_contents(state: &FactoryState, id: NodeId, data: Option<&[u8]>) -> bool {
        match data {
            Some(data) => state.nodes.get(id.index()).and_then(|node| node.data()) == Some(data),
            None => true,
        }
    }

    fn existing_or_conflict(
        &self,
        id: NodeId,
        same_contents: bool,
        key: &NodeKey,
        requested_by: Option<NodeId>,
    ) -> Result<NodeId, NodeError> {
        if same_contents {
            Ok(id)
        } else {
            Err(self.key_error(
                key,
                requested_by,
                "data blob already defined with different contents".to_string(),
            ))
        }
    }

    /// Validate `key` against the type system and compute its symbol name.
    fn symbol_name(&self, key: &NodeKey, has_data: bool) -> Result<String, String> {
        let context = &*self.context;
        let mangler = &self.mangler;
        let name = match key {
            NodeKey::MethodEntrypoint(method) | NodeKey::ExternMethod(method) => {
                self.require_closed_method(*method)?;
                mangler.mangle_method(context, *method)
            }
            NodeKey::VirtualMethodUse(method) => {
                let desc = context.method(*method).map_err(|e| e.to_string())?;
                if !desc.is_virtual {
                    return Err("method does not introduce a virtual slot".to_string());
                }
                mangler.virtual_method_use_name(context, *method)
            }
            NodeKey::TypeDescriptor(ty) => {
                self.require_closed_type(*ty)?;
                mangler.type_descriptor_name(context, *ty)
            }
            NodeKey::ImportedTypeDescriptor(ty) => {
                self.require_closed_type(*ty)?;
                mangler
                    .type_descriptor_name(context, *ty)
                    .map(|local| mangler.imported(&local))
            }
            NodeKey::MethodGenericDictionary(method) => {
                self.require_method_dictionary(*method)?;
                mangler.method_dictionary_name(context, *method)
            }
            NodeKey::ImportedMethodGenericDictionary(method) => {
                self.require_method_dictionary(*method)?;
                mangler
                    .method_dictionary_name(context, *method)
                    .map(|local| mangler.imported(&local))
            }
            NodeKey::TypeGenericDictionary(ty) => {
                self.require_type_dictionary(*ty)?;
                mangler.type_dictionary_name(context, *ty)
            }
            NodeKey::ImportedTypeGenericDictionary(ty) => {
                self.require_type_dictionary(*ty)?;
                mangler
                    .type_dictionary_name(context, *ty)
                    .map(|local| mangler.imported(&local))
            }
            NodeKey::ExternSymbol(name) => {
                if name.is_empty() {
                    return Err("extern symbol name is empty".to_string());
                }
                Ok(name.clone())
            }
            NodeKey::ReadOnlyDataBlob(name) => {
                if name.is_empty() {
                    return Err("data blob name is empty".to_string());
                }
                if !has_data {
                    return Err("no contents supplied for data blob".to_string());
                }
                Ok(name.clone())
            }
        };
        name.map_err(|e| e.to_string())
    }

    fn require_closed_method(&self, method: MethodId) -> Result<(), String> {
        if self
            .context
            .is_open_method(method)
            .map_err(|e| e.to_string())?
        {
            return Err("open generic method cannot be compiled".to_string());
        }
        Ok(())
    }

    fn require_closed_type(&self, ty: TypeId) -> Result<(), String> {
        if self.context.type_desc(ty).map_err(|e| e.to_string())?.is_open() {
            return Err("open generic type has no runtime representation".to_string());
        }
        Ok(())
    }

    fn require_method_dictionary(&self, method: MethodId) -> Result<(), String> {
        self.require_closed_method(method)?;
        let desc = self.context.method(method).map_err(|e| e.to_string())?;
        if desc.type_args().is_empty() {
            return Err("method is not a generic instantiation".to_string());
        }
        Ok(())
    }

    fn require_type_dictionary(&self, ty: TypeId) -> Result<(), String> {
        self.require_closed_type(ty)?;
        let desc = self.context.type_desc(ty).map_err(|e| e.to_string())?;
        if desc.type_args().is_empty() {
            return Err("type is not a generic instantiation".to_string());
        }
        Ok(())
    }

    /// `MethodEntrypoint(App.Program.Main)`, falling back to raw handles.
    fn describe_key(&self, key: &NodeKey) -> String {
        let context = &*self.context;
        let entity = match key {
            NodeKey::MethodEntrypoint(m)
            | NodeKey::ExternMethod(m)
            | NodeKey::VirtualMethodUse(m)
            | NodeKey::MethodGenericDictionary(m)
            | NodeKey::ImportedMethodGenericDictionary(m) => context.method_display_name(*m).ok(),
            NodeKey::TypeDescriptor(t)
            | NodeKey::ImportedTypeDescriptor(t)
            | NodeKey::TypeGenericDictionary(t)
            | NodeKey::ImportedTypeGenericDictionary(t) => context.type_display_name(*t).ok(),
            NodeKey::ExternSymbol(_) | NodeKey::ReadOnlyDataBlob(_) => None,
        };
        match entity {
            Some(entity) => format!("{}({entity})", key.kind()),
            None => key.to_string(),
        }
    }

    fn key_error(&self, key: &NodeKey, requested_by: Option<NodeId>, message: String) -> NodeError {
        NodeError::KeyResolution {
            key: self.describe_key(key),
            requested_by: requested_by.map(|id| self.node_name(id)),
            message,
        }
    }

    // -- Group-aware resolution --

    /// The node a reference to `request` binds to in this compilation unit.
    pub fn resolve(&self, request: &SymbolRequest) -> Result<NodeId, NodeError> {
        self.resolve_for(request, None)
    }

    fn resolve_for(
        &self,
        request: &SymbolRequest,
        requested_by: Option<NodeId>,
    ) -> Result<NodeId, NodeError> {
        let context = &*self.context;
        let group = &*self.module_group;
        let (key, data) = match request {
            SymbolRequest::MethodEntrypoint(m) => {
                if group.contains_method(context, *m) {
                    (NodeKey::MethodEntrypoint(*m), None)
                } else {
                    (NodeKey::ExternMethod(*m), None)
                }
            }
            SymbolRequest::TypeHandle(t) => {
                if group.contains_type(context, *t) {
                    (NodeKey::TypeDescriptor(*t), None)
                } else {
                    (NodeKey::ImportedTypeDescriptor(*t), None)
                }
            }
            SymbolRequest::VirtualMethodUse(m) => (NodeKey::VirtualMethodUse(*m), None),
            SymbolRequest::MethodGenericDictionary(m) => {
                if group.contains_method_dictionary(context, *m) {
                    (NodeKey::MethodGenericDictionary(*m), None)
                } else {
                    (NodeKey::ImportedMethodGenericDictionary(*m), None)
                }
            }
            SymbolRequest::TypeGenericDictionary(t) => {
                if group.contains_type_dictionary(context, *t) {
                    (NodeKey::TypeGenericDictionary(*t), None)
                } else {
                    (NodeKey::ImportedTypeGenericDictionary(*t), None)
                }
            }
            SymbolRequest::ExternSymbol(name) => (NodeKey::ExternSymbol(name.clone()), None),
            SymbolRequest::ReadOnlyDataBlob { name, data } => (
                NodeKey::ReadOnlyDataBlob(name.clone()),
                Some(Arc::clone(data)),
            ),
        };
        self.intern(key, data, requested_by)
    }

    /// Code for `method`: local entrypoint or extern reference.
    pub fn method_entrypoint(&self, method: MethodId) -> Result<NodeId, NodeError> {
        self.resolve(&SymbolRequest::MethodEntrypoint(method))
    }

    /// Type descriptor for `ty`: local or imported.
    pub fn type_handle(&self, ty: TypeId) -> Result<NodeId, NodeError> {
        self.resolve(&SymbolRequest::TypeHandle(ty))
    }

    pub fn virtual_method_use(&self, method: MethodId) -> Result<NodeId, NodeError> {
        self.resolve(&SymbolRequest::VirtualMethodUse(method))
    }

    /// Generic dictionary of a method instantiation: local or imported.
    pub fn method_generic_dictionary(&self, method: MethodId) -> Result<NodeId, NodeError> {
        self.resolve(&SymbolRequest::MethodGenericDictionary(method))
    }

    /// Generic dictionary of a type instantiation: local or imported.
    pub fn type_generic_dictionary(&self, ty: TypeId) -> Result<NodeId, NodeError> {
        self.resolve(&SymbolRequest::TypeGenericDictionary(ty))
    }

    pub fn extern_symbol(&self, name: impl Into<String>) -> Result<NodeId, NodeError> {
        self.resolve(&SymbolRequest::ExternSymbol(name.into()))
    }

    /// Read-only data named `name`. Requesting an existing name with other
    /// contents is an error.
    pub fn read_only_data_blob(
        &self,
        name: impl Into<String>,
        data: impl Into<Arc<[u8]>>,
    ) -> Result<NodeId, NodeError> {
        self.resolve(&SymbolRequest::ReadOnlyDataBlob {
            name: name.into(),
            data: data.into(),
        })
    }

    // -- Dependency queries --

    fn existing_node(&self, id: NodeId) -> Result<Arc<Node>, NodeError> {
        self.node(id).ok_or_else(|| NodeError::KeyResolution {
            key: id.to_string(),
            requested_by: None,
            message: "node does not belong to this factory".to_string(),
        })
    }

    /// Compile `method` for `node`, or return the body compiled earlier.
    fn compiled_method(&self, node: &Node, method: MethodId) -> Result<Arc<CompiledMethod>, NodeError> {
        if let Some(compiled) = node.compiled_method() {
            return Ok(Arc::clone(compiled));
        }
        let _span = debug_span!("compile_method", method = node.name()).entered();
        let compiled = self
            .backend
            .compile_method(&self.context, method, &self.codegen_options)
            .map_err(|source| NodeError::Codegen {
                method: node.name().to_string(),
                source,
            })?;
        trace!(
            code_bytes = compiled.code.len(),
            references = compiled.references.len(),
            "compiled method"
        );
        Ok(node.set_compiled_method(Arc::new(compiled)))
    }

    fn method_dependencies(
        &self,
        id: NodeId,
        node: &Node,
        method: MethodId,
    ) -> Result<Vec<DependencyListEntry>, NodeError> {
        let desc = self
            .context
            .method(method)
            .map_err(|e| self.key_error(node.key(), None, e.to_string()))?;
        let mut deps = vec![DependencyListEntry::new(
            self.resolve_for(&SymbolRequest::TypeHandle(desc.owning_type), Some(id))?,
            "owning type",
        )];
        if !desc.type_args().is_empty() {
            deps.push(DependencyListEntry::new(
                self.resolve_for(&SymbolRequest::MethodGenericDictionary(method), Some(id))?,
                "generic dictionary",
            ));
        }

        let compiled = self.compiled_method(node, method)?;
        for reference in &compiled.references {
            deps.push(DependencyListEntry::new(
                self.resolve_for(&reference.target, Some(id))?,
                reference.reason.clone(),
            ));
        }
        Ok(deps)
    }

    fn type_dependencies(
        &self,
        id: NodeId,
        node: &Node,
        ty: TypeId,
    ) -> Result<Vec<DependencyListEntry>, NodeError> {
        let desc = self
            .context
            .type_desc(ty)
            .map_err(|e| self.key_error(node.key(), None, e.to_string()))?;
        let mut deps = Vec::new();
        if let Some(base) = desc.base {
            deps.push(DependencyListEntry::new(
                self.resolve_for(&SymbolRequest::TypeHandle(base), Some(id))?,
                "base type",
            ));
        }
        if !desc.type_args().is_empty() {
            deps.push(DependencyListEntry::new(
                self.resolve_for(&SymbolRequest::TypeGenericDictionary(ty), Some(id))?,
                "generic dictionary",
            ));
        }
        Ok(deps)
    }

    fn instantiation_arguments(&self, id: NodeId, args: &[TypeId]) -> Result<Vec<DependencyListEntry>, NodeError> {
        args.iter()
            .map(|&arg| {
                Ok(DependencyListEntry::new(
                    self.resolve_for(&SymbolRequest::TypeHandle(arg), Some(id))?,
                    "instantiation argument",
                ))
            })
            .collect()
    }
}

impl DependencyContext for NodeFactory {
    type Error = NodeError;

    fn node_name(&self, node: NodeId) -> String {
        self.node(node)
            .map_or_else(|| node.to_string(), |n| n.name().to_string())
    }

    fn static_dependencies(&self, id: NodeId) -> Result<Vec<DependencyListEntry>, NodeError> {
        let node = self.existing_node(id)?;
        let context = &*self.context;
        let lookup_error = |e: ilc_typesys::TypeSystemError| self.key_error(node.key(), None, e.to_string());

        match node.key() {
            NodeKey::MethodEntrypoint(method) => self.method_dependencies(id, &node, *method),
            NodeKey::TypeDescriptor(ty) => self.type_dependencies(id, &node, *ty),
            NodeKey::VirtualMethodUse(method) => {
                let owner = context.method(*method).map_err(lookup_error)?.owning_type;
                Ok(vec![DependencyListEntry::new(
                    self.resolve_for(&SymbolRequest::TypeHandle(owner), Some(id))?,
                    "declaring type",
                )])
            }
            NodeKey::MethodGenericDictionary(method) => {
                let desc = context.method(*method).map_err(lookup_error)?;
                self.instantiation_arguments(id, desc.type_args())
            }
            NodeKey::TypeGenericDictionary(ty) => {
                let desc = context.type_desc(*ty).map_err(lookup_error)?;
                self.instantiation_arguments(id, desc.type_args())
            }
            // Leaf references resolved at link time.
            NodeKey::ExternMethod(_)
            | NodeKey::ImportedTypeDescriptor(_)
            | NodeKey::ImportedMethodGenericDictionary(_)
            | NodeKey::ImportedTypeGenericDictionary(_)
            | NodeKey::ExternSymbol(_)
            | NodeKey::ReadOnlyDataBlob(_) => Ok(Vec::new()),
        }
    }

    fn conditional_dependencies(
        &self,
        id: NodeId,
    ) -> Result<Vec<ConditionalDependencyEntry>, NodeError> {
        let node = self.existing_node(id)?;
        let NodeKey::TypeDescriptor(ty) = node.key() else {
            return Ok(Vec::new());
        };
        let desc = self
            .context
            .type_desc(*ty)
            .map_err(|e| self.key_error(node.key(), None, e.to_string()))?;

        desc.virtual_overrides
            .iter()
            .map(|over| {
                let condition = self.intern(NodeKey::VirtualMethodUse(over.declaration), None, Some(id))?;
                let target =
                    self.resolve_for(&SymbolRequest::MethodEntrypoint(over.implementation), Some(id))?;
                Ok(ConditionalDependencyEntry::new(target, condition, "virtual override"))
            })
            .collect()
    }
}
