use thiserror::Error;

use crate::{MethodId, ModuleId, TypeId};

/// Failure to resolve or construct a type-system entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeSystemError {
    #[error("unknown {0}")]
    UnknownModule(ModuleId),

    #[error("unknown {0}")]
    UnknownType(TypeId),

    #[error("unknown {0}")]
    UnknownMethod(MethodId),

    /// Wrong number of type arguments for a generic definition.
    #[error("`{name}` expects {expected} type argument(s), found {found}")]
    ArityMismatch {
        name: String,
        expected: u32,
        found: usize,
    },

    /// Instantiation requested for something that is not an open generic definition.
    #[error("`{0}` is not a generic definition")]
    NotGenericDefinition(String),

    /// Override declared for a method that is not virtual.
    #[error("`{0}` is not virtual")]
    NotVirtual(String),
}
