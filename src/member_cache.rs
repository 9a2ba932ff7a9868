// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The member resolution cache (spec.md §4.6): flattens anonymous nested
//! aggregates into a map keyed by (outer type, member name) on first
//! access.

use hashbrown::{HashMap, HashSet};
use std::rc::Rc;

use crate::qualifiers::QualifiedType;
use crate::ty::Type;

/// `(outer_type identity, member name)`, the key spec.md §3 calls
/// `MemberKey`. The outer type is identified by `Rc` pointer identity
/// rather than by value, matching the interning scheme used everywhere
/// else in the index.
#[derive(Clone, PartialEq, Eq, Hash)]
struct MemberKey {
    outer: usize,
    name: String,
}

/// `(member_type_ref, bit_offset_from_outer, bit_field_size)`, spec.md
/// §3's `MemberValue`.
#[derive(Clone, Debug)]
pub struct MemberValue {
    pub ty: QualifiedType,
    pub bit_offset: u64,
    pub bit_field_size: u64,
}

#[derive(Default)]
pub(crate) struct MemberCache {
    members: HashMap<MemberKey, MemberValue>,
    /// Types that have been fully flattened. Membership here makes a
    /// subsequent miss authoritative (spec.md §3 invariant 4): we don't
    /// re-walk the type, we simply report "no such member".
    members_cached: HashSet<usize>,
}

fn identity(ty: &Rc<Type>) -> usize {
    Rc::as_ptr(ty) as usize
}

impl MemberCache {
    pub(crate) fn get(&self, outer: &Rc<Type>, name: &str) -> Option<MemberValue> {
        self.members
            .get(&MemberKey {
                outer: identity(outer),
                name: name.to_string(),
            })
            .cloned()
    }

    pub(crate) fn is_fully_cached(&self, outer: &Rc<Type>) -> bool {
        self.members_cached.contains(&identity(outer))
    }

    pub(crate) fn mark_fully_cached(&mut self, outer: &Rc<Type>) {
        self.members_cached.insert(identity(outer));
    }

    /// Insert a named member if it isn't already present. "A duplicate
    /// insertion is permissible but the first write wins" (spec.md §4.6):
    /// this is exactly `HashMap::entry().or_insert()`.
    pub(crate) fn insert_first_write_wins(
        &mut self,
        outer: &Rc<Type>,
        name: &str,
        value: MemberValue,
    ) {
        self.members
            .entry(MemberKey {
                outer: identity(outer),
                name: name.to_string(),
            })
            .or_insert(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qualifiers::Qualifiers;

    fn dummy_struct(name: &str) -> Rc<Type> {
        Rc::new(Type::Struct {
            name: Some(name.to_string()),
            byte_size: 0,
            complete: true,
            members: vec![],
        })
    }

    #[test]
    fn first_write_wins() {
        let mut cache = MemberCache::default();
        let outer = dummy_struct("S");
        let int_ty = Rc::new(Type::Int {
            name: "int".into(),
            byte_size: 4,
            signed: true,
        });

        cache.insert_first_write_wins(
            &outer,
            "x",
            MemberValue {
                ty: QualifiedType::new(int_ty.clone(), Qualifiers::empty()),
                bit_offset: 0,
                bit_field_size: 0,
            },
        );
        cache.insert_first_write_wins(
            &outer,
            "x",
            MemberValue {
                ty: QualifiedType::new(int_ty, Qualifiers::empty()),
                bit_offset: 64,
                bit_field_size: 0,
            },
        );

        assert_eq!(cache.get(&outer, "x").unwrap().bit_offset, 0);
    }

    #[test]
    fn distinct_outer_types_do_not_collide() {
        let mut cache = MemberCache::default();
        let a = dummy_struct("A");
        let b = dummy_struct("B");
        let int_ty = Rc::new(Type::Int {
            name: "int".into(),
            byte_size: 4,
            signed: true,
        });

        cache.insert_first_write_wins(
            &a,
            "x",
            MemberValue {
                ty: QualifiedType::new(int_ty.clone(), Qualifiers::empty()),
                bit_offset: 0,
                bit_field_size: 0,
            },
        );

        assert!(cache.get(&a, "x").is_some());
        assert!(cache.get(&b, "x").is_none());
    }

    #[test]
    fn authority_after_full_cache() {
        let mut cache = MemberCache::default();
        let outer = dummy_struct("S");
        assert!(!cache.is_fully_cached(&outer));
        cache.mark_fully_cached(&outer);
        assert!(cache.is_fully_cached(&outer));
    }
}
