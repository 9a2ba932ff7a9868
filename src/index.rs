// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! [`TypeIndex`], the façade tying together primitive resolution, named-type
//! lookup, derived-type interning, and member flattening (spec.md §4).

use hashbrown::HashMap;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{IndexError, Result};
use crate::finder::{Finder, FinderQuery};
use crate::intern::{ArrayKey, InternTable, PointerKey};
use crate::member_cache::{MemberCache, MemberValue};
use crate::primitive::{default_32bit_long, default_descriptor, PrimitiveKind, WordSize};
use crate::qualifiers::QualifiedType;
use crate::ty::{Type, TypeKind};

type FinderFn = dyn Fn(&TypeIndex, FinderQuery<'_>) -> Result<QualifiedType>;

/// An in-memory registry of C-family type descriptors. `&self`-only API:
/// all state lives behind `Cell`/`RefCell` so a finder callback can call
/// back into the index while it is itself being consulted (spec.md §4.7).
pub struct TypeIndex {
    word_size: Cell<Option<WordSize>>,
    primitives: RefCell<HashMap<PrimitiveKind, Rc<Type>>>,
    finders: RefCell<Vec<Rc<FinderFn>>>,
    pointers: RefCell<InternTable<PointerKey>>,
    arrays: RefCell<InternTable<ArrayKey>>,
    members: RefCell<MemberCache>,
}

impl Default for TypeIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeIndex {
    pub fn new() -> Self {
        Self {
            word_size: Cell::new(None),
            primitives: RefCell::new(HashMap::new()),
            finders: RefCell::new(Vec::new()),
            pointers: RefCell::new(InternTable::default()),
            arrays: RefCell::new(InternTable::default()),
            members: RefCell::new(MemberCache::default()),
        }
    }

    /// Sets the target's word size in bytes; must be 4 or 8 (spec.md §3
    /// invariant 5). Idempotent if called again with the same value;
    /// conflicting with a previously set value is an error, since every
    /// cached word-size-dependent default would otherwise be stale.
    pub fn set_word_size(&self, bytes: u8) -> Result<()> {
        let requested = WordSize::from_bytes(bytes)
            .ok_or_else(|| IndexError::InvalidArgument(format!("invalid word size: {bytes}")))?;
        match self.word_size.get() {
            Some(existing) if existing != requested => Err(IndexError::InvalidArgument(
                "word size is already set to a different value".to_string(),
            )),
            _ => {
                self.word_size.set(Some(requested));
                Ok(())
            }
        }
    }

    fn require_word_size(&self) -> Result<WordSize> {
        self.word_size
            .get()
            .ok_or_else(|| IndexError::InvalidArgument("word size has not been set".to_string()))
    }

    /// Pushes a finder onto the chain. Finders are consulted most-recently
    /// added first (spec.md §4.1).
    pub fn add_finder<F>(&self, finder: F)
    where
        F: Finder + 'static,
    {
        self.finders.borrow_mut().push(Rc::new(finder));
    }

    /// Pops the most recently added finder off the chain. Returns `false`
    /// if the chain was already empty.
    pub fn remove_finder(&self) -> bool {
        self.finders.borrow_mut().pop().is_some()
    }

    /// Consults the finder chain for `(kind, name, filename)`. Returns
    /// `Ok(None)` if no finder claims it (not an error: the caller decides
    /// what "not found" means), `Ok(Some(_))` on a match, `Err` if a finder
    /// itself failed.
    ///
    /// The finder list is cloned out of its `RefCell` before any finder
    /// runs, so a finder that re-enters the index (e.g. to resolve a
    /// nested type) never trips a double-borrow panic.
    fn consult_finders(
        &self,
        kind: TypeKind,
        name: &str,
        filename: Option<&str>,
    ) -> Result<Option<QualifiedType>> {
        let finders: Vec<Rc<FinderFn>> = self.finders.borrow().iter().cloned().collect();
        for finder in finders.iter().rev() {
            let result = finder(
                self,
                FinderQuery {
                    kind,
                    name,
                    filename,
                },
            )?;
            if !result.is_none() {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    /// Resolves a named type (spec.md §4.3): struct, union, enum, typedef,
    /// or function tag. Unlike primitives, there is no cache here — the
    /// finder(s) own that decision, since a named lookup may legitimately
    /// return a different descriptor per filename.
    pub fn find(&self, kind: TypeKind, name: &str, filename: Option<&str>) -> Result<QualifiedType> {
        match self.consult_finders(kind, name, filename)? {
            Some(found) => {
                let found_kind = found
                    .ty
                    .as_ref()
                    .expect("consult_finders only returns Some for a non-none result")
                    .kind();
                if found_kind != kind {
                    log::warn!("finder returned a {found_kind} descriptor for '{name}', expected {kind}");
                    return Err(IndexError::kind_mismatch(kind, found_kind, name));
                }
                Ok(found)
            }
            None => Err(IndexError::NotFound {
                kind,
                name: name.to_string(),
                filename: filename.map(str::to_string),
            }),
        }
    }

    /// Resolves a primitive (spec.md §4.2). Cached by [`PrimitiveKind`]
    /// after the first resolution, so repeated calls are O(1).
    pub fn find_primitive(&self, kind: PrimitiveKind) -> Result<Rc<Type>> {
        if let Some(cached) = self.primitives.borrow().get(&kind) {
            return Ok(Rc::clone(cached));
        }
        let resolved = self.resolve_primitive(kind)?;
        self.primitives
            .borrow_mut()
            .insert(kind, Rc::clone(&resolved));
        Ok(resolved)
    }

    fn resolve_primitive(&self, kind: PrimitiveKind) -> Result<Rc<Type>> {
        match kind {
            // size_t/ptrdiff_t are never looked up by spelling (spec.md
            // §4.2 step 5): each is a typedef aliasing whichever candidate
            // integer kind, in the given order, actually has a byte size
            // matching the target word size.
            PrimitiveKind::SizeT => self.synthesize_word_sized_typedef(
                kind,
                &[
                    PrimitiveKind::UnsignedLong,
                    PrimitiveKind::UnsignedLongLong,
                    PrimitiveKind::UnsignedInt,
                ],
            ),
            PrimitiveKind::PtrdiffT => self.synthesize_word_sized_typedef(
                kind,
                &[PrimitiveKind::Long, PrimitiveKind::LongLong, PrimitiveKind::Int],
            ),
            _ => self.resolve_spelled_primitive(kind),
        }
    }

    /// Implements spec.md §4.2 step 5: try `candidates` in order, resolving
    /// each recursively (which may in turn hit a finder), and alias the
    /// first one whose byte size equals the target word size. Fails
    /// `invalid-argument` if none matches, even if a finder resolved one of
    /// the candidates to some other size.
    fn synthesize_word_sized_typedef(
        &self,
        kind: PrimitiveKind,
        candidates: &[PrimitiveKind],
    ) -> Result<Rc<Type>> {
        let word_size = self.require_word_size()?;
        for &candidate in candidates {
            let resolved = self.find_primitive(candidate)?;
            if let Type::Int { byte_size, .. } = &*resolved {
                if *byte_size == word_size.byte_size() {
                    return Ok(Rc::new(Type::Typedef {
                        name: kind.canonical_name().to_string(),
                        aliased: QualifiedType::unqualified(resolved),
                    }));
                }
            }
        }
        Err(IndexError::InvalidArgument(format!(
            "no {}-byte integer type available to synthesize {}",
            word_size.byte_size(),
            kind.canonical_name()
        )))
    }

    fn resolve_spelled_primitive(&self, kind: PrimitiveKind) -> Result<Rc<Type>> {
        for spelling in kind.spellings() {
            if let Some(found) = self.consult_finders(kind.base_kind(), spelling, None)? {
                let descriptor = found
                    .ty
                    .expect("consult_finders only returns Some for a non-none result");
                if descriptor.kind() != kind.base_kind() {
                    log::warn!(
                        "finder returned a {} descriptor for '{spelling}', expected {}",
                        descriptor.kind(),
                        kind.base_kind()
                    );
                    return Err(IndexError::kind_mismatch(
                        kind.base_kind(),
                        descriptor.kind(),
                        spelling,
                    ));
                }
                return Ok(descriptor);
            }
        }
        // No finder claimed any spelling: fall back to the shared default.
        // `long`/`unsigned long` are the only kinds whose default depends
        // on the target word size (spec.md §4.2 step 4).
        match kind {
            PrimitiveKind::Long | PrimitiveKind::UnsignedLong => {
                let word_size = self.require_word_size()?;
                Ok(match word_size {
                    WordSize::Four => default_32bit_long(kind),
                    WordSize::Eight => default_descriptor(kind),
                })
            }
            _ => Ok(default_descriptor(kind)),
        }
    }

    /// Interns a pointer to `referenced`, constructing it on first request
    /// (spec.md §4.4, §3 invariant 1). Requires the word size to already be
    /// set, since a pointer's byte size depends on it.
    pub fn pointer_type(&self, referenced: QualifiedType) -> Result<Rc<Type>> {
        let word_size = self.require_word_size()?;
        let key = PointerKey::new(referenced.identity_key());
        Ok(self.pointers.borrow_mut().get_or_insert(key, || {
            Rc::new(Type::Pointer {
                word_size: word_size.byte_size(),
                referenced,
            })
        }))
    }

    /// Interns a complete array of `length` elements of `element` (spec.md
    /// §4.5, §3 invariant 2).
    pub fn array_type(&self, element: QualifiedType, length: u64) -> Rc<Type> {
        let key = ArrayKey::complete(element.identity_key(), length);
        self.arrays
            .borrow_mut()
            .get_or_insert(key, || Rc::new(Type::Array {
                complete: true,
                length,
                element,
            }))
    }

    /// Interns an incomplete array of `element` (no declared length).
    /// All incomplete arrays over the same element intern to one
    /// descriptor regardless of how many times this is called.
    pub fn incomplete_array_type(&self, element: QualifiedType) -> Rc<Type> {
        let key = ArrayKey::incomplete(element.identity_key());
        self.arrays
            .borrow_mut()
            .get_or_insert(key, || Rc::new(Type::Array {
                complete: false,
                length: 0,
                element,
            }))
    }

    /// Resolves `name` as a member of `outer` (spec.md §4.6), flattening
    /// anonymous nested struct/union members on first access and caching
    /// the result for every subsequent lookup against the same aggregate.
    pub fn find_member(&self, outer: &Rc<Type>, name: &str) -> Result<MemberValue> {
        let underlying = underlying_type(outer);
        if underlying.members().is_none() {
            return Err(IndexError::not_a_struct_or_union(underlying.display_name()));
        }

        if let Some(value) = self.members.borrow().get(&underlying, name) {
            return Ok(value);
        }
        if self.members.borrow().is_fully_cached(&underlying) {
            return Err(member_not_found(name, &underlying));
        }

        log::trace!(
            "flattening members of {} to resolve '{name}'",
            underlying.display_name()
        );
        self.cache_members(&underlying, &underlying, 0);
        self.members.borrow_mut().mark_fully_cached(&underlying);

        self.members
            .borrow()
            .get(&underlying, name)
            .ok_or_else(|| member_not_found(name, &underlying))
    }

    /// DFS over `current`'s members, accumulating `base_offset` from the
    /// outermost aggregate. Named members are recorded directly; anonymous
    /// members are flattened by recursing into their own members (spec.md
    /// §4.6: "anonymous nested struct/union members are flattened into
    /// their containing aggregate").
    fn cache_members(&self, outer_root: &Rc<Type>, current: &Rc<Type>, base_offset: u64) {
        let members = match current.members() {
            Some(members) => members,
            None => return,
        };
        for member in members {
            let offset = base_offset + member.bit_offset;
            match &member.name {
                Some(name) => {
                    self.members.borrow_mut().insert_first_write_wins(
                        outer_root,
                        name,
                        MemberValue {
                            ty: member.ty.clone(),
                            bit_offset: offset,
                            bit_field_size: member.bit_field_size,
                        },
                    );
                }
                None => {
                    if let Some(inner) = &member.ty.ty {
                        let inner_underlying = underlying_type(inner);
                        self.cache_members(outer_root, &inner_underlying, offset);
                    }
                }
            }
        }
    }
}

/// Follows `Typedef` chains down to the first non-typedef descriptor
/// (spec.md §4.6: member lookup and anonymous-member flattening both need
/// the underlying aggregate, not whatever typedef name was used to refer
/// to it).
fn underlying_type(ty: &Rc<Type>) -> Rc<Type> {
    match &**ty {
        Type::Typedef { aliased, .. } => match &aliased.ty {
            Some(inner) => underlying_type(inner),
            None => Rc::clone(ty),
        },
        _ => Rc::clone(ty),
    }
}

fn member_not_found(name: &str, containing: &Rc<Type>) -> IndexError {
    IndexError::MemberNotFound {
        name: name.to_string(),
        containing: containing.display_name(),
    }
}
