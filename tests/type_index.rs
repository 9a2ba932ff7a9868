// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::rc::Rc;

use type_index::{
    FinderQuery, IndexError, Member, PrimitiveKind, QualifiedType, Qualifiers, Type, TypeIndex,
    TypeKind,
};

fn int_type() -> Rc<Type> {
    Rc::new(Type::Int {
        name: "int".to_string(),
        byte_size: 4,
        signed: true,
    })
}

#[test]
fn long_byte_size_tracks_target_word_size() {
    let narrow = TypeIndex::new();
    narrow.set_word_size(4).unwrap();
    let long32 = narrow.find_primitive(PrimitiveKind::Long).unwrap();

    let wide = TypeIndex::new();
    wide.set_word_size(8).unwrap();
    let long64 = wide.find_primitive(PrimitiveKind::Long).unwrap();

    assert!(matches!(&*long32, Type::Int { byte_size: 4, .. }));
    assert!(matches!(&*long64, Type::Int { byte_size: 8, .. }));
}

#[test]
fn size_t_resolves_through_unsigned_long_when_word_size_is_known() {
    let index = TypeIndex::new();
    index.set_word_size(8).unwrap();
    let size_t = index.find_primitive(PrimitiveKind::SizeT).unwrap();
    match &*size_t {
        Type::Typedef { name, aliased } => {
            assert_eq!(name, "size_t");
            assert!(matches!(
                aliased.ty.as_deref(),
                Some(Type::Int {
                    byte_size: 8,
                    signed: false,
                    ..
                })
            ));
        }
        other => panic!("expected a typedef, got {other:?}"),
    }
}

#[test]
fn size_t_is_invalid_argument_without_word_size_even_if_unsigned_int_is_findable() {
    let index = TypeIndex::new();
    index.add_finder(|_: &TypeIndex, query: FinderQuery<'_>| {
        if query.name == "unsigned int" {
            Ok(QualifiedType::unqualified(Rc::new(Type::Int {
                name: "unsigned int".to_string(),
                byte_size: 4,
                signed: false,
            })))
        } else {
            Ok(QualifiedType::none())
        }
    });

    let err = index.find_primitive(PrimitiveKind::SizeT).unwrap_err();
    assert!(matches!(err, IndexError::InvalidArgument(_)));
    assert!(!err.is_lookup());
}

#[test]
fn pointer_types_intern_by_referenced_identity_and_qualifiers() {
    let index = TypeIndex::new();
    index.set_word_size(8).unwrap();
    let int_ty = int_type();

    let plain_a = index
        .pointer_type(QualifiedType::unqualified(int_ty.clone()))
        .unwrap();
    let plain_b = index
        .pointer_type(QualifiedType::unqualified(int_ty.clone()))
        .unwrap();
    assert!(Rc::ptr_eq(&plain_a, &plain_b), "int* should be interned");

    let const_ptr = index
        .pointer_type(QualifiedType::new(int_ty, Qualifiers::CONST))
        .unwrap();
    assert!(
        !Rc::ptr_eq(&plain_a, &const_ptr),
        "const int* must be distinct from int*"
    );
}

#[test]
fn array_types_distinguish_complete_from_incomplete_and_intern_each() {
    let index = TypeIndex::new();
    let int_ty = int_type();

    let ten = index.array_type(QualifiedType::unqualified(int_ty.clone()), 10);
    let ten_again = index.array_type(QualifiedType::unqualified(int_ty.clone()), 10);
    assert!(Rc::ptr_eq(&ten, &ten_again));

    let twenty = index.array_type(QualifiedType::unqualified(int_ty.clone()), 20);
    assert!(!Rc::ptr_eq(&ten, &twenty));

    let incomplete = index.incomplete_array_type(QualifiedType::unqualified(int_ty.clone()));
    let incomplete_again = index.incomplete_array_type(QualifiedType::unqualified(int_ty));
    assert!(Rc::ptr_eq(&incomplete, &incomplete_again));
    assert!(!Rc::ptr_eq(&ten, &incomplete));
}

#[test]
fn anonymous_union_members_flatten_into_the_containing_struct() {
    let index = TypeIndex::new();
    let int_ty = int_type();

    let inner_union = Rc::new(Type::Union {
        name: None,
        byte_size: 8,
        complete: true,
        members: vec![
            Member::named("as_int", QualifiedType::unqualified(int_ty.clone()), 0),
            Member::named("as_bytes", QualifiedType::unqualified(int_ty.clone()), 0),
        ],
    });
    let outer = Rc::new(Type::Struct {
        name: Some("event".to_string()),
        byte_size: 16,
        complete: true,
        members: vec![
            Member::named("tag", QualifiedType::unqualified(int_ty), 0),
            Member::anonymous(QualifiedType::unqualified(inner_union), 64),
        ],
    });

    let as_int = index.find_member(&outer, "as_int").unwrap();
    assert_eq!(as_int.bit_offset, 64);
    let as_bytes = index.find_member(&outer, "as_bytes").unwrap();
    assert_eq!(as_bytes.bit_offset, 64);

    // A cold miss on a fully-cached aggregate is authoritative, not a retry.
    let err = index.find_member(&outer, "missing").unwrap_err();
    assert!(err.is_lookup());
}

#[test]
fn finder_returning_the_wrong_kind_is_a_type_error_not_a_lookup_error() {
    let index = TypeIndex::new();
    index.add_finder(|_: &TypeIndex, query: FinderQuery<'_>| {
        if query.kind == TypeKind::Int && query.name == "int" {
            Ok(QualifiedType::unqualified(Rc::new(Type::Float {
                name: "int".to_string(),
                byte_size: 4,
            })))
        } else {
            Ok(QualifiedType::none())
        }
    });

    let err = index.find_primitive(PrimitiveKind::Int).unwrap_err();
    assert!(err.is_type_error());
    assert!(!err.is_lookup());
}

#[test]
fn named_struct_lookup_reports_a_lookup_error_when_no_finder_claims_it() {
    let index = TypeIndex::new();
    let err = index
        .find(TypeKind::Struct, "task_struct", Some("sched.h"))
        .unwrap_err();
    assert!(err.is_lookup());
    assert_eq!(
        err.to_string(),
        "could not find struct 'task_struct' in sched.h"
    );
}

#[test]
fn named_lookup_rejects_a_finder_that_returns_the_wrong_kind() {
    // spec.md §8 scenario 6: a finder registered for name "T" returns a
    // struct descriptor when `find(enum, "T", None)` is called.
    let index = TypeIndex::new();
    index.add_finder(|_: &TypeIndex, _: FinderQuery<'_>| {
        Ok(QualifiedType::unqualified(Rc::new(Type::Struct {
            name: Some("T".to_string()),
            byte_size: 0,
            complete: true,
            members: vec![],
        })))
    });

    let err = index.find(TypeKind::Enum, "T", None).unwrap_err();
    assert!(err.is_type_error());
    assert!(!err.is_lookup());
}
