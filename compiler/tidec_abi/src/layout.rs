use crate::size_and_align::{AbiAndPrefAlign, Align, Size};

/// Represents a type along with its size and alignment information.
///
/// This is commonly used during codegen and layout computation to reason about
/// how values should be represented in memory on the target platform.
#[derive(Debug, Clone)]
pub struct TyAndLayout<T> {
    /// The type this layout refers to.
    pub ty: T,
    /// The layout information for the type, including size and alignment.
    pub layout: Layout,
}

/// Represents the layout of a type in the target architecture.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    /// The size of the type in bytes.
    pub size: Size,
    /// The ABI and preferred alignment of the type.
    pub align: AbiAndPrefAlign,
    /// How the backend should represent this type at the value level.
    pub backend_repr: BackendRepr,
}

#[derive(Debug, Clone, Copy)]
pub enum BackendRepr {
    /// A single scalar machine value (integer, pointer, or float).
    Scalar,
    /// A value with no runtime representation (e.g. `void`).
    Zst,
    /// An aggregate (struct/union/array) passed and stored by reference to
    /// memory with the given size/alignment rather than as a single value.
    Memory,
}

/// Inputs needed to compute the layout of an aggregate from its field
/// layouts, in declaration order.
pub struct FieldLayout {
    pub layout: Layout,
}

/// Sequences the fixed-table primitive layouts and struct/union layout
/// finalization used throughout the type system. This does not know about
/// any particular language's type representation: callers hand it raw
/// sizes/alignments (for scalars) or a list of field layouts (for
/// aggregates) and get back a finished `Layout`.
pub struct LayoutCtx;

impl LayoutCtx {
    pub fn new() -> Self {
        LayoutCtx
    }

    /// Computes the layout of a scalar of the given size and alignment
    /// (bool/char/short/int/long/float/double/pointer/enum all go through
    /// this path; they differ only in the `(size, align)` pair passed in).
    pub fn scalar_layout(&self, size_bytes: u64, align_bytes: u64) -> Layout {
        Layout {
            size: Size::from_bytes(size_bytes),
            align: AbiAndPrefAlign::new(align_bytes),
            backend_repr: BackendRepr::Scalar,
        }
    }

    pub fn zst_layout(&self) -> Layout {
        Layout {
            size: Size::ZERO,
            align: AbiAndPrefAlign::new(1),
            backend_repr: BackendRepr::Zst,
        }
    }

    /// Finalizes a `struct` layout: fields are placed in declaration order,
    /// each aligned to its own requirement, trailing padding added so the
    /// whole type's size is a multiple of its alignment (the alignment of
    /// the largest member), matching the System V layout rule this
    /// compiler's fixed size table implies. Returns the finished layout
    /// together with each field's byte offset, in the same order as `fields`.
    pub fn struct_layout(&self, fields: &[FieldLayout]) -> (Layout, Vec<u64>) {
        let mut offset = Size::ZERO;
        let mut align = Align::ONE;
        let mut offsets = Vec::with_capacity(fields.len());

        for field in fields {
            let field_align = field.layout.align.abi;
            offset = offset.align_to(field_align);
            offsets.push(offset.bytes());
            offset = offset + field.layout.size;
            align = align.max(field_align);
        }

        let size = offset.align_to(align);
        (
            Layout {
                size,
                align: AbiAndPrefAlign { abi: align, pref: align },
                backend_repr: BackendRepr::Memory,
            },
            offsets,
        )
    }

    /// Finalizes a `union` layout: every member starts at offset 0, the
    /// union's size is the largest member's size rounded up to the
    /// largest member's alignment.
    pub fn union_layout(&self, fields: &[FieldLayout]) -> Layout {
        let mut size = Size::ZERO;
        let mut align = Align::ONE;

        for field in fields {
            if field.layout.size > size {
                size = field.layout.size;
            }
            align = align.max(field.layout.align.abi);
        }

        Layout {
            size: size.align_to(align),
            align: AbiAndPrefAlign { abi: align, pref: align },
            backend_repr: BackendRepr::Memory,
        }
    }

    /// Finalizes an array layout: `element.size * count`, alignment equal
    /// to the element's alignment.
    pub fn array_layout(&self, element: Layout, count: u64) -> Layout {
        Layout {
            size: element.size * count,
            align: element.align,
            backend_repr: BackendRepr::Memory,
        }
    }

    /// Wraps a layout together with the type it describes.
    pub fn compute_layout<T>(&self, ty: T, layout: Layout) -> TyAndLayout<T> {
        TyAndLayout { ty, layout }
    }
}

impl Default for LayoutCtx {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn struct_layout_packs_and_pads() {
        let ctx = LayoutCtx::new();
        // struct { char c; int i; } -> offsets 0, 4; size 8, align 4.
        let char_layout = ctx.scalar_layout(1, 1);
        let int_layout = ctx.scalar_layout(4, 4);
        let (layout, offsets) = ctx.struct_layout(&[
            FieldLayout { layout: char_layout },
            FieldLayout { layout: int_layout },
        ]);
        assert_eq!(offsets, vec![0, 4]);
        assert_eq!(layout.size.bytes(), 8);
        assert_eq!(layout.align.abi.bytes(), 4);
    }

    #[test]
    fn union_layout_takes_largest_member() {
        let ctx = LayoutCtx::new();
        let int_layout = ctx.scalar_layout(4, 4);
        let long_layout = ctx.scalar_layout(8, 8);
        let layout = ctx.union_layout(&[
            FieldLayout { layout: int_layout },
            FieldLayout { layout: long_layout },
        ]);
        assert_eq!(layout.size.bytes(), 8);
        assert_eq!(layout.align.abi.bytes(), 8);
    }

    #[test]
    fn array_layout_multiplies_element_size() {
        let ctx = LayoutCtx::new();
        let int_layout = ctx.scalar_layout(4, 4);
        let layout = ctx.array_layout(int_layout, 10);
        assert_eq!(layout.size.bytes(), 40);
        assert_eq!(layout.align.abi.bytes(), 4);
    }
}
