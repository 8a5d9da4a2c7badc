//! Storage for modules, types and methods.

use std::fmt::Write;

use rustc_hash::FxHashMap;

use crate::{EcmaAssembly, MethodId, ModuleId, TypeId, TypeSystemError};

/// Input for [`TypeSystemContext::define_type`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefinition {
    pub module: ModuleId,
    pub namespace: String,
    pub name: String,
    pub generic_param_count: u32,
    pub base: Option<TypeId>,
}

impl TypeDefinition {
    /// Non-generic type with no base.
    pub fn new(module: ModuleId, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module,
            namespace: namespace.into(),
            name: name.into(),
            generic_param_count: 0,
            base: None,
        }
    }

    #[must_use]
    pub fn with_generic_params(mut self, count: u32) -> Self {
        self.generic_param_count = count;
        self
    }

    #[must_use]
    pub fn with_base(mut self, base: TypeId) -> Self {
        self.base = Some(base);
        self
    }
}

/// Input for [`TypeSystemContext::define_method`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDefinition {
    pub owning_type: TypeId,
    pub name: String,
    pub generic_param_count: u32,
    pub is_virtual: bool,
}

impl MethodDefinition {
    pub fn new(owning_type: TypeId, name: impl Into<String>) -> Self {
        Self {
            owning_type,
            name: name.into(),
            generic_param_count: 0,
            is_virtual: false,
        }
    }

    #[must_use]
    pub fn with_generic_params(mut self, count: u32) -> Self {
        self.generic_param_count = count;
        self
    }

    #[must_use]
    pub fn virtual_slot(mut self) -> Self {
        self.is_virtual = true;
        self
    }
}

/// A closed generic type: a definition applied to type arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeInstantiation {
    pub definition: TypeId,
    pub args: Vec<TypeId>,
}

/// A generic method applied to method-level type arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodInstantiation {
    pub definition: MethodId,
    pub args: Vec<TypeId>,
}

/// `implementation` overrides the virtual slot introduced by `declaration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VirtualOverride {
    pub declaration: MethodId,
    pub implementation: MethodId,
}

#[derive(Debug, Clone)]
pub struct TypeDesc {
    pub module: ModuleId,
    pub namespace: String,
    pub name: String,
    /// Unbound type parameters. Zero for closed types and instantiations.
    pub generic_param_count: u32,
    pub instantiation: Option<TypeInstantiation>,
    pub base: Option<TypeId>,
    pub virtual_overrides: Vec<VirtualOverride>,
}

impl TypeDesc {
    /// An open generic definition cannot be laid out or compiled.
    pub fn is_open(&self) -> bool {
        self.generic_param_count > 0
    }

    /// Type arguments of an instantiation (empty for definitions).
    pub fn type_args(&self) -> &[TypeId] {
        match &self.instantiation {
            Some(inst) => &inst.args,
            None => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct MethodDesc {
    pub owning_type: TypeId,
    pub name: String,
    pub generic_param_count: u32,
    pub instantiation: Option<MethodInstantiation>,
    pub is_virtual: bool,
}

impl MethodDesc {
    /// Method-level type arguments (empty unless this is an instantiation).
    pub fn type_args(&self) -> &[TypeId] {
        match &self.instantiation {
            Some(inst) => &inst.args,
            None => &[],
        }
    }
}

/// Owns every module, type and method known to one compilation.
#[derive(Debug, Default)]
pub struct TypeSystemContext {
    modules: Vec<EcmaAssembly>,
    types: Vec<TypeDesc>,
    methods: Vec<MethodDesc>,
    type_instantiations: FxHashMap<TypeInstantiation, TypeId>,
    method_instantiations: FxHashMap<MethodInstantiation, MethodId>,
}

impl TypeSystemContext {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Population --

    pub fn add_module(&mut self, assembly: EcmaAssembly) -> ModuleId {
        let id = ModuleId::from_index(self.modules.len());
        self.modules.push(assembly);
        id
    }

    pub fn define_type(&mut self, def: TypeDefinition) -> Result<TypeId, TypeSystemError> {
        self.module(def.module)?;
        if let Some(base) = def.base {
            self.type_desc(base)?;
        }
        let id = TypeId::from_index(self.types.len());
        self.types.push(TypeDesc {
            module: def.module,
            namespace: def.namespace,
            name: def.name,
            generic_param_count: def.generic_param_count,
            instantiation: None,
            base: def.base,
            virtual_overrides: Vec::new(),
        });
        Ok(id)
    }

    pub fn define_method(&mut self, def: MethodDefinition) -> Result<MethodId, TypeSystemError> {
        self.type_desc(def.owning_type)?;
        let id = MethodId::from_index(self.methods.len());
        self.methods.push(MethodDesc {
            owning_type: def.owning_type,
            name: def.name,
            generic_param_count: def.generic_param_count,
            instantiation: None,
            is_virtual: def.is_virtual,
        });
        Ok(id)
    }

    /// Record that `implementation` on `ty` overrides the virtual `declaration`.
    pub fn add_virtual_override(
        &mut self,
        ty: TypeId,
        declaration: MethodId,
        implementation: MethodId,
    ) -> Result<(), TypeSystemError> {
        if !self.method(declaration)?.is_virtual {
            return Err(TypeSystemError::NotVirtual(
                self.method_display_name(declaration)?,
            ));
        }
        self.method(implementation)?;
        let desc = self
            .types
            .get_mut(ty.index())
            .ok_or(TypeSystemError::UnknownType(ty))?;
        desc.virtual_overrides.push(VirtualOverride {
            declaration,
            implementation,
        });
        Ok(())
    }

    /// Close a generic type definition over `args`.
    ///
    /// Interned: the same definition and arguments always produce the same [`TypeId`].
    pub fn instantiate_type(
        &mut self,
        definition: TypeId,
        args: &[TypeId],
    ) -> Result<TypeId, TypeSystemError> {
        let def = self.type_desc(definition)?;
        if def.instantiation.is_some() || def.generic_param_count == 0 {
            return Err(TypeSystemError::NotGenericDefinition(
                self.type_display_name(definition)?,
            ));
        }
        if def.generic_param_count as usize != args.len() {
            return Err(TypeSystemError::ArityMismatch {
                name: self.type_display_name(definition)?,
                expected: def.generic_param_count,
                found: args.len(),
            });
        }
        for &arg in args {
            self.type_desc(arg)?;
        }

        let key = TypeInstantiation {
            definition,
            args: args.to_vec(),
        };
        if let Some(&existing) = self.type_instantiations.get(&key) {
            return Ok(existing);
        }

        let def = self.type_desc(definition)?;
        let desc = TypeDesc {
            module: def.module,
            namespace: def.namespace.clone(),
            name: def.name.clone(),
            generic_param_count: 0,
            instantiation: Some(key.clone()),
            base: def.base,
            virtual_overrides: def.virtual_overrides.clone(),
        };
        let id = TypeId::from_index(self.types.len());
        self.types.push(desc);
        self.type_instantiations.insert(key, id);
        Ok(id)
    }

    /// Close a generic method definition over method-level `args`.
    pub fn instantiate_method(
        &mut self,
        definition: MethodId,
        args: &[TypeId],
    ) -> Result<MethodId, TypeSystemError> {
        let def = self.method(definition)?;
        if def.instantiation.is_some() || def.generic_param_count == 0 {
            return Err(TypeSystemError::NotGenericDefinition(
                self.method_display_name(definition)?,
            ));
        }
        if def.generic_param_count as usize != args.len() {
            return Err(TypeSystemError::ArityMismatch {
                name: self.method_display_name(definition)?,
                expected: def.generic_param_count,
                found: args.len(),
            });
        }
        for &arg in args {
            self.type_desc(arg)?;
        }

        let key = MethodInstantiation {
            definition,
            args: args.to_vec(),
        };
        if let Some(&existing) = self.method_instantiations.get(&key) {
            return Ok(existing);
        }

        let def = self.method(definition)?;
        let desc = MethodDesc {
            owning_type: def.owning_type,
            name: def.name.clone(),
            generic_param_count: 0,
            instantiation: Some(key.clone()),
            is_virtual: def.is_virtual,
        };
        let id = MethodId::from_index(self.methods.len());
        self.methods.push(desc);
        self.method_instantiations.insert(key, id);
        Ok(id)
    }

    // -- Lookup --

    pub fn module(&self, id: ModuleId) -> Result<&EcmaAssembly, TypeSystemError> {
        self.modules
            .get(id.index())
            .ok_or(TypeSystemError::UnknownModule(id))
    }

    pub fn type_desc(&self, id: TypeId) -> Result<&TypeDesc, TypeSystemError> {
        self.types
            .get(id.index())
            .ok_or(TypeSystemError::UnknownType(id))
    }

    pub fn method(&self, id: MethodId) -> Result<&MethodDesc, TypeSystemError> {
        self.methods
            .get(id.index())
            .ok_or(TypeSystemError::UnknownMethod(id))
    }

    /// Module that defines `ty` (for instantiations, the definition's module).
    pub fn module_of_type(&self, ty: TypeId) -> Result<ModuleId, TypeSystemError> {
        Ok(self.type_desc(ty)?.module)
    }

    /// A method is open if it or its owning type still has unbound type parameters.
    pub fn is_open_method(&self, id: MethodId) -> Result<bool, TypeSystemError> {
        let method = self.method(id)?;
        Ok(method.generic_param_count > 0 || self.type_desc(method.owning_type)?.is_open())
    }

    pub fn module_ids(&self) -> impl Iterator<Item = ModuleId> + '_ {
        (0..self.modules.len()).map(ModuleId::from_index)
    }

    /// Types defined in `module`, in definition order. Includes instantiations.
    pub fn types_in_module(&self, module: ModuleId) -> impl Iterator<Item = TypeId> + '_ {
        self.types
            .iter()
            .enumerate()
            .filter(move |(_, desc)| desc.module == module)
            .map(|(i, _)| TypeId::from_index(i))
    }

    /// Methods declared on `ty`, in definition order. Includes instantiations.
    pub fn methods_of_type(&self, ty: TypeId) -> impl Iterator<Item = MethodId> + '_ {
        self.methods
            .iter()
            .enumerate()
            .filter(move |(_, desc)| desc.owning_type == ty)
            .map(|(i, _)| MethodId::from_index(i))
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    // -- Display --

    /// `Namespace.Name<Arg, ...>`, for diagnostics.
    pub fn type_display_name(&self, id: TypeId) -> Result<String, TypeSystemError> {
        let mut out = String::new();
        self.write_type_name(&mut out, id)?;
        Ok(out)
    }

    /// `Namespace.Type.Method<Arg, ...>`, for diagnostics.
    pub fn method_display_name(&self, id: MethodId) -> Result<String, TypeSystemError> {
        let method = self.method(id)?;
        let mut out = String::new();
        self.write_type_name(&mut out, method.owning_type)?;
        out.push('.');
        out.push_str(&method.name);
        self.write_type_args(&mut out, method.type_args())?;
        Ok(out)
    }

    fn write_type_name(&self, out: &mut String, id: TypeId) -> Result<(), TypeSystemError> {
        let desc = self.type_desc(id)?;
        if !desc.namespace.is_empty() {
            out.push_str(&desc.namespace);
            out.push('.');
        }
        out.push_str(&desc.name);
        if desc.is_open() {
            let _ = write!(out, "`{}", desc.generic_param_count);
        }
        self.write_type_args(out, desc.type_args())
    }

    fn write_type_args(&self, out: &mut String, args: &[TypeId]) -> Result<(), TypeSystemError> {
        if args.is_empty() {
            return Ok(());
        }
        out.push('<');
        for (i, &arg) in args.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_type_name(out, arg)?;
        }
        out.push('>');
        Ok(())
    }
}
