// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! An in-memory registry of C-family type descriptors.
//!
//! A [`TypeIndex`] resolves primitive, named (struct/union/enum/typedef),
//! pointer, and array types to canonical, reference-counted descriptors,
//! backed by an application-supplied chain of finder callbacks. It does
//! not parse debug information itself; finders are how a consumer plugs in
//! a real debug-info reader.
//!
//! ```
//! use std::rc::Rc;
//! use type_index::{FinderQuery, QualifiedType, Type, TypeIndex, TypeKind};
//!
//! let index = TypeIndex::new();
//! index.set_word_size(8).unwrap();
//! index.add_finder(|_: &TypeIndex, query: FinderQuery<'_>| {
//!     if query.kind == TypeKind::Int && query.name == "int" {
//!         Ok(QualifiedType::unqualified(Rc::new(Type::Int {
//!             name: "int".to_string(),
//!             byte_size: 4,
//!             signed: true,
//!         })))
//!     } else {
//!         Ok(QualifiedType::none())
//!     }
//! });
//!
//! let int_ty = index.find_primitive(type_index::PrimitiveKind::Int).unwrap();
//! let pointer = index.pointer_type(QualifiedType::unqualified(int_ty)).unwrap();
//! assert_eq!(pointer.kind(), TypeKind::Pointer);
//! ```

mod error;
mod finder;
mod index;
mod intern;
mod member_cache;
mod primitive;
mod qualifiers;
mod ty;

pub use error::{IndexError, Result};
pub use finder::{Finder, FinderQuery};
pub use index::TypeIndex;
pub use member_cache::MemberValue;
pub use primitive::{PrimitiveKind, WordSize};
pub use qualifiers::{QualifiedType, Qualifiers};
pub use ty::{Enumerator, Member, Type, TypeKind};
