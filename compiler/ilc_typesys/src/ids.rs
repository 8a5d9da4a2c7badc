//! Entity handles.

use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $tag:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            /// Create a handle from a raw index. Use only for tests and deserialization.
            #[inline]
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            /// Raw index into the owning context's storage.
            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            #[inline]
            pub(crate) fn index(self) -> usize {
                self.0 as usize
            }

            pub(crate) fn from_index(index: usize) -> Self {
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "context storage never exceeds u32::MAX entries"
                )]
                let raw = index as u32;
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($tag, "#{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Handle to a module (assembly) in a [`TypeSystemContext`](crate::TypeSystemContext).
    ModuleId,
    "module"
);
define_id!(
    /// Handle to a type definition or closed instantiation.
    TypeId,
    "type"
);
define_id!(
    /// Handle to a method definition or method instantiation.
    MethodId,
    "method"
);
