//! Node kinds of the compilation graph.

use std::fmt;
use std::sync::{Arc, OnceLock};

use ilc_typesys::{MethodId, TypeId};

use crate::codegen::CompiledMethod;

/// Logical identity of a node. One node exists per key per factory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKey {
    /// Code for a method compiled in this unit.
    MethodEntrypoint(MethodId),
    /// A method compiled in another unit, bound at link time.
    ExternMethod(MethodId),
    /// Runtime type descriptor for a type laid out in this unit.
    TypeDescriptor(TypeId),
    /// Import cell for a type descriptor from another unit.
    ImportedTypeDescriptor(TypeId),
    /// The virtual slot introduced by this method is called somewhere.
    VirtualMethodUse(MethodId),
    MethodGenericDictionary(MethodId),
    TypeGenericDictionary(TypeId),
    /// Import cell for a method dictionary emitted by another unit.
    ImportedMethodGenericDictionary(MethodId),
    /// Import cell for a type dictionary emitted by another unit.
    ImportedTypeGenericDictionary(TypeId),
    ExternSymbol(String),
    ReadOnlyDataBlob(String),
}

impl NodeKey {
    /// Import cells are loaded through one extra indirection.
    pub fn is_indirection_cell(&self) -> bool {
        matches!(
            self,
            Self::ImportedTypeDescriptor(_)
                | Self::ImportedMethodGenericDictionary(_)
                | Self::ImportedTypeGenericDictionary(_)
        )
    }

    /// Storage may be shared with other nodes of identical content.
    pub fn is_combinable(&self) -> bool {
        matches!(self, Self::ReadOnlyDataBlob(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::MethodEntrypoint(_) => "MethodEntrypoint",
            Self::ExternMethod(_) => "ExternMethod",
            Self::TypeDescriptor(_) => "TypeDescriptor",
            Self::ImportedTypeDescriptor(_) => "ImportedTypeDescriptor",
            Self::VirtualMethodUse(_) => "VirtualMethodUse",
            Self::MethodGenericDictionary(_) => "MethodGenericDictionary",
            Self::TypeGenericDictionary(_) => "TypeGenericDictionary",
            Self::ImportedMethodGenericDictionary(_) => "ImportedMethodGenericDictionary",
            Self::ImportedTypeGenericDictionary(_) => "ImportedTypeGenericDictionary",
            Self::ExternSymbol(_) => "ExternSymbol",
            Self::ReadOnlyDataBlob(_) => "ReadOnlyDataBlob",
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MethodEntrypoint(m)
            | Self::ExternMethod(m)
            | Self::VirtualMethodUse(m)
            | Self::MethodGenericDictionary(m)
            | Self::ImportedMethodGenericDictionary(m) => write!(f, "{}({m})", self.kind()),
            Self::TypeDescriptor(t)
            | Self::ImportedTypeDescriptor(t)
            | Self::TypeGenericDictionary(t)
            | Self::ImportedTypeGenericDictionary(t) => write!(f, "{}({t})", self.kind()),
            Self::ExternSymbol(name) | Self::ReadOnlyDataBlob(name) => {
                write!(f, "{}({name:?})", self.kind())
            }
        }
    }
}

/// A vertex of the compilation graph. Owned by the factory's arena.
#[derive(Debug)]
pub struct Node {
    key: NodeKey,
    name: String,
    data: Option<Arc<[u8]>>,
    compiled: OnceLock<Arc<CompiledMethod>>,
}

impl Node {
    pub(crate) fn new(key: NodeKey, name: String, data: Option<Arc<[u8]>>) -> Self {
        Self {
            key,
            name,
            data,
            compiled: OnceLock::new(),
        }
    }

    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    /// Symbol name; also used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_indirection_cell(&self) -> bool {
        self.key.is_indirection_cell()
    }

    pub fn is_combinable(&self) -> bool {
        self.key.is_combinable()
    }

    /// Contents of a data blob.
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Compiled body, once the node's dependencies have been computed.
    pub fn compiled_method(&self) -> Option<&Arc<CompiledMethod>> {
        self.compiled.get()
    }

    /// Store the compiled body. The first stored value is kept.
    pub(crate) fn set_compiled_method(&self, compiled: Arc<CompiledMethod>) -> Arc<CompiledMethod> {
        Arc::clone(self.compiled.get_or_init(|| compiled))
    }
}
