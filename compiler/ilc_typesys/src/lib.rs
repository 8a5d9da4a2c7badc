//! ILC type system boundary.
//!
//! The dependency-analysis back end never decodes metadata itself. This crate
//! is the narrow surface it consumes from the front end:
//!
//! - **Modules** ([`EcmaAssembly`]) with a lazily computed, cached
//!   [`AssemblyName`] and assembly-level custom attribute queries
//! - **Type descriptors** ([`TypeDesc`]) for definitions and closed generic
//!   instantiations, including base types and virtual overrides
//! - **Method descriptors** ([`MethodDesc`]) for definitions and generic
//!   method instantiations
//!
//! # Design
//!
//! - **Handles, not pointers**: entities are referenced by [`ModuleId`],
//!   [`TypeId`] and [`MethodId`]. Handles are `Copy + Hash`, so they make
//!   cheap node keys for the dependency graph.
//! - **Interned instantiations**: instantiating the same definition over the
//!   same arguments twice yields the same handle. Node identity downstream
//!   relies on this.
//! - **Build, then share**: a [`TypeSystemContext`] is populated with `&mut`
//!   access and then frozen behind an `Arc` for the compilation.

mod assembly;
mod context;
mod error;
mod ids;

pub use assembly::{
    AssemblyContentType, AssemblyDefinition, AssemblyFlags, AssemblyName, AssemblyVersion,
    CustomAttribute, EcmaAssembly,
};
pub use context::{
    MethodDefinition, MethodDesc, MethodInstantiation, TypeDefinition, TypeDesc,
    TypeInstantiation, TypeSystemContext, VirtualOverride,
};
pub use error::TypeSystemError;
pub use ids::{MethodId, ModuleId, TypeId};
