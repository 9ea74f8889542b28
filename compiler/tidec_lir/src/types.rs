//! The type system: representation, construction, and layout of every type
//! the accepted C subset can name.
//!
//! Types live in a [`tidec_utils::arena::Arena`] and are referred to by
//! [`TypeId`] handles, the same pattern the rest of this crate's data model
//! uses for AST nodes and symbols. A handle never outlives the [`TypeSystem`]
//! that issued it.

use tidec_abi::{AbiAndPrefAlign, BackendRepr, FieldLayout, Layout, LayoutCtx, Size};
use tidec_utils::arena::{Arena, Id};

pub type TypeId = Id<TypeInfo>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The basic (non-derived) scalar kinds this subset recognizes.
pub enum BasicKind {
    Void,
    Bool,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A field of a `struct`/`union` type, in declaration order.
pub struct Field {
    pub name: String,
    pub ty: TypeId,
    /// Byte offset from the start of the aggregate, filled in once the
    /// aggregate's layout has been finalized.
    pub offset: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Basic(BasicKind),
    /// `T*`.
    Pointer(TypeId),
    /// `T[n]`. `None` length means an incomplete array type (e.g. an
    /// `extern` declaration of unknown size), which can only appear as a
    /// function parameter or be completed later by an initializer.
    Array(TypeId, Option<u64>),
    /// A function type: parameter types in declaration order, the return
    /// type, and whether the parameter list ends in `...`.
    Function {
        params: Vec<TypeId>,
        ret: TypeId,
        variadic: bool,
        /// True for a callee with no prototype in scope (an implicit
        /// `int foo()` declaration synthesized at the first call site).
        implicit: bool,
    },
    /// `struct`/`union` with the given tag name (empty for an anonymous
    /// aggregate synthesized under a name like `anon.0`) and fields once
    /// the definition has been seen; `None` fields means a forward
    /// declaration (`struct P;`).
    Struct {
        tag: String,
        fields: Option<Vec<Field>>,
    },
    Union {
        tag: String,
        fields: Option<Vec<Field>>,
    },
    /// `enum` with the given tag and its enumerators' values, assigned
    /// sequentially from 0 unless an initializer overrides one. The
    /// underlying representation is always `i32`.
    Enum {
        tag: String,
        enumerators: Vec<(String, i64)>,
    },
    /// A name introduced by `typedef`, aliasing another type. Kept as its
    /// own variant (rather than resolved away immediately) so that
    /// diagnostics and `sizeof`/declarations can still refer to the
    /// typedef's spelling; `TypeSystem::resolve` strips it.
    Typedef(String, TypeId),
}

#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub kind: TypeKind,
    pub layout: Layout,
}

/// Owns every [`TypeInfo`] produced while compiling one translation unit,
/// and the fixed size/alignment table this subset always uses.
pub struct TypeSystem {
    arena: Arena<TypeInfo>,
    layout_ctx: LayoutCtx,
    anon_counter: u32,

    pub void: TypeId,
    pub bool_ty: TypeId,
    pub char_ty: TypeId,
    pub short_ty: TypeId,
    pub int_ty: TypeId,
    pub long_ty: TypeId,
    pub float_ty: TypeId,
    pub double_ty: TypeId,
}

impl TypeSystem {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let layout_ctx = LayoutCtx::new();

        let mk = |arena: &mut Arena<TypeInfo>, kind: BasicKind, size: u64, align: u64| {
            let layout = if matches!(kind, BasicKind::Void) {
                Layout {
                    size: Size::ZERO,
                    align: AbiAndPrefAlign::new(1),
                    backend_repr: BackendRepr::Zst,
                }
            } else {
                Layout {
                    size: Size::from_bytes(size),
                    align: AbiAndPrefAlign::new(align),
                    backend_repr: BackendRepr::Scalar,
                }
            };
            arena.alloc(TypeInfo { kind: TypeKind::Basic(kind), layout })
        };

        let void = mk(&mut arena, BasicKind::Void, 0, 1);
        let bool_ty = mk(&mut arena, BasicKind::Bool, 1, 1);
        let char_ty = mk(&mut arena, BasicKind::Char, 1, 1);
        let short_ty = mk(&mut arena, BasicKind::Short, 2, 2);
        let int_ty = mk(&mut arena, BasicKind::Int, 4, 4);
        let long_ty = mk(&mut arena, BasicKind::Long, 8, 8);
        let float_ty = mk(&mut arena, BasicKind::Float, 4, 4);
        let double_ty = mk(&mut arena, BasicKind::Double, 8, 8);

        TypeSystem {
            arena,
            layout_ctx,
            anon_counter: 0,
            void,
            bool_ty,
            char_ty,
            short_ty,
            int_ty,
            long_ty,
            float_ty,
            double_ty,
        }
    }

    pub fn get(&self, id: TypeId) -> &TypeInfo {
        self.arena.get(id)
    }

    pub fn size_of(&self, id: TypeId) -> u64 {
        self.get(id).layout.size.bytes()
    }

    pub fn align_of(&self, id: TypeId) -> u64 {
        self.get(id).layout.align.abi.bytes()
    }

    /// Generates the next anonymous aggregate tag, `anon.0`, `anon.1`, ...,
    /// used when a struct/union literal has no name of its own.
    pub fn next_anon_tag(&mut self) -> String {
        let tag = format!("anon.{}", self.anon_counter);
        self.anon_counter += 1;
        tag
    }

    pub fn pointer_to(&mut self, pointee: TypeId) -> TypeId {
        let layout = self.layout_ctx.scalar_layout(8, 8);
        self.arena.alloc(TypeInfo {
            kind: TypeKind::Pointer(pointee),
            layout,
        })
    }

    /// Array of `count` elements of `element`; `count == None` for an
    /// incomplete array (no layout finalized yet; `size_of` on such a type
    /// is a caller error, matching the original's "incomplete type" check).
    pub fn array_of(&mut self, element: TypeId, count: Option<u64>) -> TypeId {
        let layout = match count {
            Some(n) => self.layout_ctx.array_layout(self.get(element).layout, n),
            None => Layout {
                size: Size::ZERO,
                align: self.get(element).layout.align,
                backend_repr: BackendRepr::Memory,
            },
        };
        self.arena.alloc(TypeInfo {
            kind: TypeKind::Array(element, count),
            layout,
        })
    }

    pub fn function_of(
        &mut self,
        params: Vec<TypeId>,
        ret: TypeId,
        variadic: bool,
        implicit: bool,
    ) -> TypeId {
        // Functions have no object representation; their "layout" is
        // never queried for size, only used to satisfy `TypeInfo`'s shape.
        let layout = Layout {
            size: Size::ZERO,
            align: AbiAndPrefAlign::new(1),
            backend_repr: BackendRepr::Zst,
        };
        self.arena.alloc(TypeInfo {
            kind: TypeKind::Function { params, ret, variadic, implicit },
            layout,
        })
    }

    /// Registers a forward declaration (`struct Foo;`) with no fields yet.
    pub fn declare_struct(&mut self, tag: String) -> TypeId {
        let layout = Layout { size: Size::ZERO, align: AbiAndPrefAlign::new(1), backend_repr: BackendRepr::Memory };
        self.arena.alloc(TypeInfo { kind: TypeKind::Struct { tag, fields: None }, layout })
    }

    pub fn declare_union(&mut self, tag: String) -> TypeId {
        let layout = Layout { size: Size::ZERO, align: AbiAndPrefAlign::new(1), backend_repr: BackendRepr::Memory };
        self.arena.alloc(TypeInfo { kind: TypeKind::Union { tag, fields: None }, layout })
    }

    /// Finalizes a struct's fields and layout in place, filling in each
    /// field's byte offset.
    pub fn define_struct(&mut self, id: TypeId, mut fields: Vec<Field>) {
        let field_layouts: Vec<FieldLayout> = fields
            .iter()
            .map(|f| FieldLayout { layout: self.get(f.ty).layout })
            .collect();
        let (layout, offsets) = self.layout_ctx.struct_layout(&field_layouts);
        for (field, offset) in fields.iter_mut().zip(offsets) {
            field.offset = offset;
        }
        let tag = match &self.get(id).kind {
            TypeKind::Struct { tag, .. } => tag.clone(),
            _ => panic!("define_struct called on a non-struct type"),
        };
        *self.arena.get_mut(id) = TypeInfo {
            kind: TypeKind::Struct { tag, fields: Some(fields) },
            layout,
        };
    }

    pub fn define_union(&mut self, id: TypeId, fields: Vec<Field>) {
        let field_layouts: Vec<FieldLayout> = fields
            .iter()
            .map(|f| FieldLayout { layout: self.get(f.ty).layout })
            .collect();
        let layout = self.layout_ctx.union_layout(&field_layouts);
        let tag = match &self.get(id).kind {
            TypeKind::Union { tag, .. } => tag.clone(),
            _ => panic!("define_union called on a non-union type"),
        };
        *self.arena.get_mut(id) = TypeInfo {
            kind: TypeKind::Union { tag, fields: Some(fields) },
            layout,
        };
    }

    /// Registers an `enum`, assigning sequential values from 0 to any
    /// enumerator without an explicit initializer.
    pub fn define_enum(&mut self, tag: String, enumerators: Vec<(String, Option<i64>)>) -> TypeId {
        let mut next = 0i64;
        let resolved = enumerators
            .into_iter()
            .map(|(name, explicit)| {
                let value = explicit.unwrap_or(next);
                next = value + 1;
                (name, value)
            })
            .collect();
        let layout = self.layout_ctx.scalar_layout(4, 4);
        self.arena.alloc(TypeInfo {
            kind: TypeKind::Enum { tag, enumerators: resolved },
            layout,
        })
    }

    pub fn typedef(&mut self, name: String, aliased: TypeId) -> TypeId {
        let layout = self.get(aliased).layout;
        self.arena.alloc(TypeInfo { kind: TypeKind::Typedef(name, aliased), layout })
    }

    /// Strips any chain of `typedef` wrappers down to the underlying type.
    pub fn resolve(&self, mut id: TypeId) -> TypeId {
        while let TypeKind::Typedef(_, aliased) = self.get(id).kind {
            id = aliased;
        }
        id
    }

    /// Creates an independent copy of `id`'s `TypeInfo`, used when a
    /// declarator needs its own mutable type distinct from a type that was
    /// looked up by name (e.g. qualifying a typedef'd type with `const`
    /// would, if qualifiers were tracked, need its own node; duplicating
    /// up front keeps that future extension from aliasing unrelated
    /// declarations today).
    pub fn duplicate(&mut self, id: TypeId) -> TypeId {
        let info = self.get(id).clone();
        self.arena.alloc(info)
    }

    /// Structural compatibility, the `TypeSystem::types_compatible`
    /// mentioned throughout the emitter and declaration-merging logic.
    /// Two function types are compatible if their return types are
    /// compatible, their parameter counts match and each parameter pair is
    /// compatible, or if either side is `implicit` (an inferred
    /// `int foo()` stands in for any real prototype later seen for the
    /// same name).
    pub fn types_compatible(&self, a: TypeId, b: TypeId) -> bool {
        let a = self.resolve(a);
        let b = self.resolve(b);
        if a == b {
            return true;
        }
        match (&self.get(a).kind, &self.get(b).kind) {
            (TypeKind::Basic(x), TypeKind::Basic(y)) => x == y,
            (TypeKind::Pointer(x), TypeKind::Pointer(y)) => self.types_compatible(*x, *y),
            (TypeKind::Array(x, nx), TypeKind::Array(y, ny)) => {
                self.types_compatible(*x, *y) && (nx.is_none() || ny.is_none() || nx == ny)
            }
            (
                TypeKind::Function { params: pa, ret: ra, implicit: ia, .. },
                TypeKind::Function { params: pb, ret: rb, implicit: ib, .. },
            ) => {
                if *ia || *ib {
                    return self.types_compatible(*ra, *rb);
                }
                pa.len() == pb.len()
                    && self.types_compatible(*ra, *rb)
                    && pa.iter().zip(pb).all(|(x, y)| self.types_compatible(*x, *y))
            }
            (TypeKind::Struct { tag: ta, .. }, TypeKind::Struct { tag: tb, .. }) => ta == tb,
            (TypeKind::Union { tag: ta, .. }, TypeKind::Union { tag: tb, .. }) => ta == tb,
            (TypeKind::Enum { tag: ta, .. }, TypeKind::Enum { tag: tb, .. }) => ta == tb,
            // A pointer is compatible with any integer kind so that a
            // literal `0` (or any other integer constant) can stand in
            // for a null pointer in comparisons and initializers.
            (TypeKind::Pointer(_), TypeKind::Basic(k)) | (TypeKind::Basic(k), TypeKind::Pointer(_)) => {
                !matches!(k, BasicKind::Float | BasicKind::Double | BasicKind::Void)
            }
            _ => false,
        }
    }

    pub fn is_scalar(&self, id: TypeId) -> bool {
        matches!(
            self.get(self.resolve(id)).kind,
            TypeKind::Basic(_) | TypeKind::Pointer(_) | TypeKind::Enum { .. }
        )
    }

    pub fn is_aggregate(&self, id: TypeId) -> bool {
        matches!(
            self.get(self.resolve(id)).kind,
            TypeKind::Struct { .. } | TypeKind::Union { .. } | TypeKind::Array(..)
        )
    }
}

impl Default for TypeSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_size_table_matches_spec() {
        let ts = TypeSystem::new();
        assert_eq!(ts.size_of(ts.bool_ty), 1);
        assert_eq!(ts.size_of(ts.char_ty), 1);
        assert_eq!(ts.size_of(ts.short_ty), 2);
        assert_eq!(ts.size_of(ts.int_ty), 4);
        assert_eq!(ts.size_of(ts.long_ty), 8);
        assert_eq!(ts.size_of(ts.float_ty), 4);
        assert_eq!(ts.size_of(ts.double_ty), 8);
    }

    #[test]
    fn pointer_is_always_eight_bytes() {
        let mut ts = TypeSystem::new();
        let p = ts.pointer_to(ts.int_ty);
        assert_eq!(ts.size_of(p), 8);
        assert_eq!(ts.align_of(p), 8);
    }

    #[test]
    fn struct_field_offsets_are_assigned() {
        let mut ts = TypeSystem::new();
        let s = ts.declare_struct("P".to_string());
        ts.define_struct(
            s,
            vec![
                Field { name: "c".to_string(), ty: ts.char_ty, offset: 0 },
                Field { name: "i".to_string(), ty: ts.int_ty, offset: 0 },
            ],
        );
        match &ts.get(s).kind {
            TypeKind::Struct { fields: Some(fields), .. } => {
                assert_eq!(fields[0].offset, 0);
                assert_eq!(fields[1].offset, 4);
            }
            _ => panic!("expected a defined struct"),
        }
        assert_eq!(ts.size_of(s), 8);
    }

    #[test]
    fn enum_values_are_sequential_unless_overridden() {
        let mut ts = TypeSystem::new();
        let e = ts.define_enum(
            "Color".to_string(),
            vec![
                ("RED".to_string(), None),
                ("GREEN".to_string(), Some(5)),
                ("BLUE".to_string(), None),
            ],
        );
        match &ts.get(e).kind {
            TypeKind::Enum { enumerators, .. } => {
                assert_eq!(enumerators, &vec![
                    ("RED".to_string(), 0),
                    ("GREEN".to_string(), 5),
                    ("BLUE".to_string(), 6),
                ]);
            }
            _ => panic!("expected an enum"),
        }
        assert_eq!(ts.size_of(e), 4);
    }

    #[test]
    fn implicit_function_type_is_compatible_with_any_prototype() {
        let mut ts = TypeSystem::new();
        let implicit = ts.function_of(vec![], ts.int_ty, true, true);
        let real = ts.function_of(vec![ts.int_ty, ts.int_ty], ts.int_ty, false, false);
        assert!(ts.types_compatible(implicit, real));
    }
}
