//! Symbol mangling for compiled types, methods and dictionaries.
//!
//! Names are a pure function of the type system entity, so separately
//! compiled units agree on every symbol without communicating.
//!
//! # Mangling Scheme
//!
//! ```text
//! type   := _ilc_<assembly>[$N<namespace>]$$<name>[$LT<type>($C<type>)*$GT]
//! method := <type>$$<name>[$LT<type>($C<type>)*$GT]
//! ```
//!
//! Where:
//! - `_ilc_` is the prefix identifying compiled symbols
//! - `$N` opens the namespace and is omitted for the global namespace
//! - `$$` ends the owning path of a name
//! - type arguments are mangled recursively, without the prefix
//!
//! Inside a component, ASCII alphanumerics and `_` pass through and every
//! other character is escaped: `.` is `$_`, common punctuation uses the
//! lowercase escapes `$lt $gt $cm $lb $rb $lp $rp $cl $d`, and anything
//! else is `$u<hex>$`. No escape is a prefix of another or of a structural
//! marker, so the encoding is injective.
//!
//! # Examples
//!
//! | Entity | Mangled Name |
//! |--------|--------------|
//! | `System.Object` in `CoreLib` | `_ilc_CoreLib$NSystem$$Object` |
//! | `Program.Main` in `App` | `_ilc_App$$Program$$Main` |
//! | `List<Int32>` | `_ilc_CoreLib$NSystem$$List$LTCoreLib$NSystem$$Int32$GT` |
//! | type descriptor of `Object` | `_ilc_CoreLib$NSystem$$Object$EEType` |
//! | imported dictionary of `M<Int32>` | `__imp___GenericDict__ilc_...$$M$LT...$GT` |

use std::fmt::Write;

use ilc_typesys::{MethodId, TypeId, TypeSystemContext, TypeSystemError};

/// The prefix for all mangled type and method symbols.
pub const MANGLE_PREFIX: &str = "_ilc_";

/// Marks a reference to a symbol defined in another compilation unit.
pub const IMPORT_PREFIX: &str = "__imp_";

pub const METHOD_DICTIONARY_PREFIX: &str = "__GenericDict_";

pub const TYPE_DICTIONARY_PREFIX: &str = "__TypeGenericDict_";

pub const TYPE_DESCRIPTOR_SUFFIX: &str = "$EEType";

const VIRTUAL_USE_PREFIX: &str = "VirtualMethodUse_";

/// Opens a non-empty namespace.
const NAMESPACE_MARK: &str = "$N";

/// Ends the owning path before a type or method name.
const NAME_MARK: &str = "$$";

/// Deterministic symbol namer.
///
/// Stateless: two manglers always agree.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameMangler;

impl NameMangler {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Mangle a type (definition or instantiation).
    pub fn mangle_type(
        &self,
        context: &TypeSystemContext,
        ty: TypeId,
    ) -> Result<String, TypeSystemError> {
        let mut result = String::with_capacity(64);
        result.push_str(MANGLE_PREFIX);
        Self::encode_type(&mut result, context, ty)?;
        Ok(result)
    }

    /// Mangle a method: `<owning type>$$<name>[$LT<args>$GT]`.
    pub fn mangle_method(
        &self,
        context: &TypeSystemContext,
        method: MethodId,
    ) -> Result<String, TypeSystemError> {
        let desc = context.method(method)?;
        let mut result = String::with_capacity(96);
        result.push_str(MANGLE_PREFIX);
        Self::encode_type(&mut result, context, desc.owning_type)?;
        result.push_str(NAME_MARK);
        Self::encode_component(&mut result, &desc.name);
        Self::encode_type_args(&mut result, context, desc.type_args())?;
        Ok(result)
    }

    pub fn type_descriptor_name(
        &self,
        context: &TypeSystemContext,
        ty: TypeId,
    ) -> Result<String, TypeSystemError> {
        let mut name = self.mangle_type(context, ty)?;
        name.push_str(TYPE_DESCRIPTOR_SUFFIX);
        Ok(name)
    }

    pub fn method_dictionary_name(
        &self,
        context: &TypeSystemContext,
        method: MethodId,
    ) -> Result<String, TypeSystemError> {
        Ok(format!(
            "{METHOD_DICTIONARY_PREFIX}{}",
            self.mangle_method(context, method)?
        ))
    }

    pub fn type_dictionary_name(
        &self,
        context: &TypeSystemContext,
        ty: TypeId,
    ) -> Result<String, TypeSystemError> {
        Ok(format!(
            "{TYPE_DICTIONARY_PREFIX}{}",
            self.mangle_type(context, ty)?
        ))
    }

    pub fn virtual_method_use_name(
        &self,
        context: &TypeSystemContext,
        method: MethodId,
    ) -> Result<String, TypeSystemError> {
        Ok(format!(
            "{VIRTUAL_USE_PREFIX}{}",
            self.mangle_method(context, method)?
        ))
    }

    /// Name of the import cell for a symbol defined elsewhere.
    #[must_use]
    pub fn imported(&self, local_name: &str) -> String {
        format!("{IMPORT_PREFIX}{local_name}")
    }

    // -- Internal encoding helpers --

    fn encode_type(
        out: &mut String,
        context: &TypeSystemContext,
        ty: TypeId,
    ) -> Result<(), TypeSystemError> {
        let desc = context.type_desc(ty)?;
        let assembly = context.module(desc.module)?;
        Self::encode_component(out, &assembly.name().name);
        if !desc.namespace.is_empty() {
            out.push_str(NAMESPACE_MARK);
            Self::encode_component(out, &desc.namespace);
        }
        out.push_str(NAME_MARK);
        Self::encode_component(out, &desc.name);
        Self::encode_type_args(out, context, desc.type_args())
    }

    fn encode_type_args(
        out: &mut String,
        context: &TypeSystemContext,
        args: &[TypeId],
    ) -> Result<(), TypeSystemError> {
        if args.is_empty() {
            return Ok(());
        }
        out.push_str("$LT");
        for (i, &arg) in args.iter().enumerate() {
            if i > 0 {
                out.push_str("$C");
            }
            Self::encode_type(out, context, arg)?;
        }
        out.push_str("$GT");
        Ok(())
    }

    /// Encode a character as a terminated hex escape (e.g., '@' -> "$u40$").
    #[inline]
    fn encode_char_hex(out: &mut String, c: char) {
        let _ = write!(out, "$u{:x}$", c as u32);
    }

    fn encode_component(out: &mut String, name: &str) {
        for c in name.chars() {
            match c {
                c if c.is_ascii_alphanumeric() || c == '_' => out.push(c),
                '.' => out.push_str("$_"),
                '<' => out.push_str("$lt"),
                '>' => out.push_str("$gt"),
                ',' => out.push_str("$cm"),
                '[' => out.push_str("$lb"),
                ']' => out.push_str("$rb"),
                '(' => out.push_str("$lp"),
                ')' => out.push_str("$rp"),
                ':' => out.push_str("$cl"),
                '-' => out.push_str("$d"),
                _ => Self::encode_char_hex(out, c),
            }
        }
    }
}
