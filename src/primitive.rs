// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The fixed enumeration of C primitive kinds, their known spellings, and
//! the shared static default descriptors (spec.md §4.2, §9).

use once_cell::unsync::Lazy;
use std::fmt;
use std::rc::Rc;

use crate::ty::{Type, TypeKind};

/// The target machine's word size, restricted to the two values the spec
/// recognises (spec.md §3 invariant 5).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WordSize {
    Four,
    Eight,
}

impl WordSize {
    pub fn from_bytes(bytes: u8) -> Option<Self> {
        match bytes {
            4 => Some(Self::Four),
            8 => Some(Self::Eight),
            _ => None,
        }
    }

    pub fn byte_size(self) -> u8 {
        match self {
            Self::Four => 4,
            Self::Eight => 8,
        }
    }
}

/// One of the C primitives the index recognises (spec.md §3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Void,
    Char,
    SignedChar,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Bool,
    Float,
    Double,
    LongDouble,
    SizeT,
    PtrdiffT,
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.spellings().first().copied().unwrap_or("?"))
    }
}

impl PrimitiveKind {
    /// The base kind (spec.md §4.2 step 3) a finder's returned descriptor
    /// must match for this primitive to be accepted.
    pub fn base_kind(self) -> TypeKind {
        match self {
            Self::Bool => TypeKind::Bool,
            Self::Float | Self::Double | Self::LongDouble => TypeKind::Float,
            Self::Void => TypeKind::Void,
            _ => TypeKind::Int,
        }
    }

    pub fn is_signed(self) -> bool {
        !matches!(
            self,
            Self::UnsignedChar
                | Self::UnsignedShort
                | Self::UnsignedInt
                | Self::UnsignedLong
                | Self::UnsignedLongLong
                | Self::Bool
        )
    }

    /// The ordered list of C spellings tried against the finder chain
    /// (spec.md §4.2 step 3). `size_t`/`ptrdiff_t` have none: they are
    /// always synthesized (step 5), never looked up by name.
    pub fn spellings(self) -> &'static [&'static str] {
        match self {
            Self::Void => &["void"],
            Self::Char => &["char"],
            Self::SignedChar => &["signed char"],
            Self::UnsignedChar => &["unsigned char"],
            Self::Short => &["short", "signed short", "short int", "signed short int"],
            Self::UnsignedShort => &["unsigned short", "unsigned short int"],
            Self::Int => &["int", "signed", "signed int"],
            Self::UnsignedInt => &["unsigned int", "unsigned"],
            Self::Long => &["long", "signed long", "long int", "signed long int"],
            Self::UnsignedLong => &["unsigned long", "unsigned long int"],
            Self::LongLong => &[
                "long long",
                "signed long long",
                "long long int",
                "signed long long int",
            ],
            Self::UnsignedLongLong => &["unsigned long long", "unsigned long long int"],
            Self::Bool => &["_Bool", "bool"],
            Self::Float => &["float"],
            Self::Double => &["double"],
            Self::LongDouble => &["long double"],
            Self::SizeT | Self::PtrdiffT => &[],
        }
    }

    /// The canonical spelling used to name a synthesized descriptor
    /// (typedefs for `size_t`/`ptrdiff_t`, and error messages).
    pub fn canonical_name(self) -> &'static str {
        match self {
            Self::SizeT => "size_t",
            Self::PtrdiffT => "ptrdiff_t",
            other => other.spellings()[0],
        }
    }
}

macro_rules! default_primitive {
    ($fn_name:ident, $kind:ident, $name:expr, $size:expr, $signed:expr) => {
        fn $fn_name() -> Rc<Type> {
            thread_local! {
                static DEFAULT: Lazy<Rc<Type>> = Lazy::new(|| {
                    Rc::new(Type::$kind {
                        name: $name.to_string(),
                        byte_size: $size,
                        signed: $signed,
                    })
                });
            }
            DEFAULT.with(|d| Rc::clone(&d))
        }
    };
}

// Shared static default primitive descriptors (spec.md §9): "static
// (compile-time) data" in the original, `thread_local!` singletons here
// since `Type` is built from `Rc` and is therefore not `Sync`. Within one
// thread every `TypeIndex` hands out the *same* `Rc` for a given default,
// matching the "process-wide immutable constants" intent.
default_primitive!(default_char, Int, "char", 1, true);
default_primitive!(default_signed_char, Int, "signed char", 1, true);
default_primitive!(default_unsigned_char, Int, "unsigned char", 1, false);
default_primitive!(default_short, Int, "short", 2, true);
default_primitive!(default_unsigned_short, Int, "unsigned short", 2, false);
default_primitive!(default_int, Int, "int", 4, true);
default_primitive!(default_unsigned_int, Int, "unsigned int", 4, false);
default_primitive!(default_long_32, Int, "long", 4, true);
default_primitive!(default_long_64, Int, "long", 8, true);
default_primitive!(default_unsigned_long_32, Int, "unsigned long", 4, false);
default_primitive!(default_unsigned_long_64, Int, "unsigned long", 8, false);
default_primitive!(default_long_long, Int, "long long", 8, true);
default_primitive!(
    default_unsigned_long_long,
    Int,
    "unsigned long long",
    8,
    false
);
default_primitive!(default_float, Float, "float", 4, true);
default_primitive!(default_double, Float, "double", 8, true);
default_primitive!(default_long_double, Float, "long double", 16, true);

fn default_bool() -> Rc<Type> {
    thread_local! {
        static DEFAULT: Lazy<Rc<Type>> = Lazy::new(|| {
            Rc::new(Type::Bool {
                name: "_Bool".to_string(),
                byte_size: 1,
            })
        });
    }
    DEFAULT.with(|d| Rc::clone(&d))
}

fn void_singleton() -> Rc<Type> {
    thread_local! {
        static VOID: Lazy<Rc<Type>> = Lazy::new(|| Rc::new(Type::Void));
    }
    VOID.with(|d| Rc::clone(&d))
}

/// The shared default descriptor for `kind`, given `word_size` (only
/// consulted for `long`/`unsigned long`, which it never is for: callers
/// resolve those two ahead of time in `TypeIndex::find_primitive`).
/// `size_t`/`ptrdiff_t` have no default entry point here; they are only
/// ever synthesized (spec.md §4.2 step 5).
pub(crate) fn default_descriptor(kind: PrimitiveKind) -> Rc<Type> {
    match kind {
        PrimitiveKind::Void => void_singleton(),
        PrimitiveKind::Char => default_char(),
        PrimitiveKind::SignedChar => default_signed_char(),
        PrimitiveKind::UnsignedChar => default_unsigned_char(),
        PrimitiveKind::Short => default_short(),
        PrimitiveKind::UnsignedShort => default_unsigned_short(),
        PrimitiveKind::Int => default_int(),
        PrimitiveKind::UnsignedInt => default_unsigned_int(),
        // 64-bit default; the 32-bit word-size special case is handled by
        // the caller before falling back here (spec.md §4.2 step 4).
        PrimitiveKind::Long => default_long_64(),
        PrimitiveKind::UnsignedLong => default_unsigned_long_64(),
        PrimitiveKind::LongLong => default_long_long(),
        PrimitiveKind::UnsignedLongLong => default_unsigned_long_long(),
        PrimitiveKind::Bool => default_bool(),
        PrimitiveKind::Float => default_float(),
        PrimitiveKind::Double => default_double(),
        PrimitiveKind::LongDouble => default_long_double(),
        PrimitiveKind::SizeT | PrimitiveKind::PtrdiffT => {
            unreachable!("size_t/ptrdiff_t are always synthesized, never defaulted")
        }
    }
}

/// The word-size-specific 32-bit default for `long`/`unsigned long`
/// (spec.md §4.2 step 4). Only meaningful for those two kinds.
pub(crate) fn default_32bit_long(kind: PrimitiveKind) -> Rc<Type> {
    match kind {
        PrimitiveKind::Long => default_long_32(),
        PrimitiveKind::UnsignedLong => default_unsigned_long_32(),
        _ => unreachable!("only long/unsigned long have a 32-bit special default"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_descriptor_is_cached_identical() {
        let a = default_descriptor(PrimitiveKind::Int);
        let b = default_descriptor(PrimitiveKind::Int);
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn long_defaults_differ_by_word_size() {
        let ws4 = default_32bit_long(PrimitiveKind::Long);
        let ws8 = default_descriptor(PrimitiveKind::Long);
        match (&*ws4, &*ws8) {
            (Type::Int { byte_size: 4, .. }, Type::Int { byte_size: 8, .. }) => {}
            other => panic!("unexpected defaults: {other:?}"),
        }
    }

    #[test]
    fn base_kind_classification() {
        assert_eq!(PrimitiveKind::Long.base_kind(), TypeKind::Int);
        assert_eq!(PrimitiveKind::Bool.base_kind(), TypeKind::Bool);
        assert_eq!(PrimitiveKind::Double.base_kind(), TypeKind::Float);
        assert_eq!(PrimitiveKind::Void.base_kind(), TypeKind::Void);
    }

    #[test]
    fn size_t_has_no_spellings() {
        assert!(PrimitiveKind::SizeT.spellings().is_empty());
        assert!(PrimitiveKind::PtrdiffT.spellings().is_empty());
    }
}
