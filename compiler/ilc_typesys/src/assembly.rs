//! Assemblies (modules) and their identity.

use std::fmt;
use std::sync::OnceLock;

use bitflags::bitflags;

bitflags! {
    /// Assembly definition flags as stored in the `Assembly` metadata table.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AssemblyFlags: u32 {
        const PUBLIC_KEY = 0x0001;
        const RETARGETABLE = 0x0100;
        const WINDOWS_RUNTIME = 0x0200;
        const DISABLE_JIT_COMPILE_OPTIMIZER = 0x4000;
        const ENABLE_JIT_COMPILE_TRACKING = 0x8000;
    }
}

/// Bits of [`AssemblyFlags`] that encode the content type.
const CONTENT_TYPE_MASK: u32 = 0x0E00;
const CONTENT_TYPE_SHIFT: u32 = 9;

impl AssemblyFlags {
    /// Decode the content type carried in the flags.
    #[must_use]
    pub fn content_type(self) -> AssemblyContentType {
        match (self.bits() & CONTENT_TYPE_MASK) >> CONTENT_TYPE_SHIFT {
            1 => AssemblyContentType::WindowsRuntime,
            _ => AssemblyContentType::Default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AssemblyContentType {
    #[default]
    Default,
    WindowsRuntime,
}

/// Four-part assembly version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AssemblyVersion {
    pub major: u16,
    pub minor: u16,
    pub build: u16,
    pub revision: u16,
}

impl AssemblyVersion {
    pub const fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }
}

impl fmt::Display for AssemblyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

/// An assembly-level custom attribute, identified by its type's namespace and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomAttribute {
    pub namespace: String,
    pub name: String,
}

impl CustomAttribute {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

/// Raw assembly definition row, as handed over by the metadata reader.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssemblyDefinition {
    pub name: String,
    pub version: AssemblyVersion,
    pub public_key: Vec<u8>,
    pub culture: String,
    pub flags: AssemblyFlags,
    pub custom_attributes: Vec<CustomAttribute>,
}

impl AssemblyDefinition {
    /// Definition with just a simple name and defaults for everything else.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Identity of an assembly, derived from its definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssemblyName {
    pub name: String,
    pub version: AssemblyVersion,
    pub public_key: Vec<u8>,
    /// `None` for the invariant (neutral) culture.
    pub culture_name: Option<String>,
    pub content_type: AssemblyContentType,
}

impl fmt::Display for AssemblyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, Version={}, Culture={}",
            self.name,
            self.version,
            self.culture_name.as_deref().unwrap_or("neutral")
        )?;
        if self.content_type == AssemblyContentType::WindowsRuntime {
            write!(f, ", ContentType=WindowsRuntime")?;
        }
        Ok(())
    }
}

/// A module loaded from portable-executable metadata.
#[derive(Debug)]
pub struct EcmaAssembly {
    definition: AssemblyDefinition,
    name: OnceLock<AssemblyName>,
}

impl EcmaAssembly {
    pub fn new(definition: AssemblyDefinition) -> Self {
        Self {
            definition,
            name: OnceLock::new(),
        }
    }

    pub fn definition(&self) -> &AssemblyDefinition {
        &self.definition
    }

    /// The assembly's identity.
    ///
    /// Computed on first access and cached for the lifetime of the module.
    /// The returned value is shared; callers that need to modify it must
    /// `clone()` it first.
    pub fn name(&self) -> &AssemblyName {
        self.name.get_or_init(|| {
            let def = &self.definition;
            AssemblyName {
                name: def.name.clone(),
                version: def.version,
                public_key: def.public_key.clone(),
                culture_name: (!def.culture.is_empty()).then(|| def.culture.clone()),
                content_type: def.flags.content_type(),
            }
        })
    }

    /// Returns `true` if the assembly carries a custom attribute of the given type.
    pub fn has_assembly_custom_attribute(&self, namespace: &str, name: &str) -> bool {
        self.definition
            .custom_attributes
            .iter()
            .any(|attr| attr.namespace == namespace && attr.name == name)
    }
}

impl fmt::Display for EcmaAssembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name().name)
    }
}
