// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Error taxonomy for the type index (spec.md §7).

use crate::ty::TypeKind;

/// Errors observable from the index. Propagation policy: errors are
/// returned unchanged, never logged-and-swallowed or retried (spec.md §7).
#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    /// A named type was not found by any finder.
    #[error("could not find {kind} '{name}'{}", filename.as_deref().map(|f| format!(" in {f}")).unwrap_or_default())]
    NotFound {
        kind: TypeKind,
        name: String,
        filename: Option<String>,
    },

    /// A member name was not found on an aggregate, either because the
    /// member cache is cold-then-empty or because it is warm and
    /// authoritative (spec.md §3 invariant 4).
    #[error("no member named '{name}' in {containing}")]
    MemberNotFound { name: String, containing: String },

    /// A structural mismatch: a finder returned the wrong kind, or a
    /// member lookup was attempted on a non-aggregate.
    #[error("{0}")]
    Type(String),

    /// A precondition was violated (spec.md §3 invariant 5): word size
    /// unset, or set to something other than 4 or 8.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Allocation failure. Any partially constructed descriptor is
    /// dropped before this is returned (spec.md §7).
    #[error("out of memory")]
    OutOfMemory,

    /// A finder's own backing store failed. The index does not interpret
    /// this error; it is propagated verbatim (spec.md §4.1).
    #[error(transparent)]
    Finder(#[from] anyhow::Error),
}

impl IndexError {
    /// True for the two "not found" kinds (a named type, or a member),
    /// which the spec collectively calls the *lookup* error kind
    /// (spec.md §7). Consumers match on this, not on a specific variant,
    /// to implement the "try an alternate shape" fallback of spec.md §6.3.
    pub fn is_lookup(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::MemberNotFound { .. })
    }

    pub fn is_type_error(&self) -> bool {
        matches!(self, Self::Type(_))
    }

    pub(crate) fn not_a_struct_or_union(type_name: impl AsRef<str>) -> Self {
        Self::Type(format!(
            "'{}' is not a structure or union",
            type_name.as_ref()
        ))
    }

    pub(crate) fn kind_mismatch(expected: TypeKind, found: TypeKind, name: &str) -> Self {
        Self::Type(format!(
            "finder returned a {found} descriptor for '{name}', expected {expected}"
        ))
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
