//! Maps this compiler's C-subset types to their literal, typed-pointer-era
//! LLVM textual spelling (`i8*`, not the opaque-pointer `ptr`), since the
//! emitter's output is checked by substring match against exactly that
//! syntax.

use tidec_lir::types::{BasicKind, TypeId, TypeKind, TypeSystem};

/// Returns the LLVM type text for `ty`, e.g. `i32`, `i8*`, `[10 x i32]`,
/// `%struct.P`, `%struct.P*`.
pub fn llvm_type_of(types: &TypeSystem, ty: TypeId) -> String {
    let ty = types.resolve(ty);
    match &types.get(ty).kind {
        TypeKind::Basic(BasicKind::Void) => "void".to_string(),
        // `bool` has no native LLVM bit-width of its own in this subset;
        // it is stored as a full byte (`i8`) everywhere except the single
        // `i1` produced transiently by comparisons, matching the
        // bool-to-int asymmetry spec.md's Open Questions deliberately
        // leaves unresolved.
        TypeKind::Basic(BasicKind::Bool) => "i8".to_string(),
        TypeKind::Basic(BasicKind::Char) => "i8".to_string(),
        TypeKind::Basic(BasicKind::Short) => "i16".to_string(),
        TypeKind::Basic(BasicKind::Int) => "i32".to_string(),
        TypeKind::Basic(BasicKind::Long) => "i64".to_string(),
        TypeKind::Basic(BasicKind::Float) => "float".to_string(),
        TypeKind::Basic(BasicKind::Double) => "double".to_string(),
        TypeKind::Pointer(pointee) => {
            let pointee = types.resolve(*pointee);
            if matches!(types.get(pointee).kind, TypeKind::Basic(BasicKind::Void)) {
                // LLVM has no `void*`; the typed-pointer era spells it `i8*`.
                "i8*".to_string()
            } else {
                format!("{}*", llvm_type_of(types, pointee))
            }
        }
        TypeKind::Array(element, Some(count)) => {
            format!("[{} x {}]", count, llvm_type_of(types, *element))
        }
        TypeKind::Array(element, None) => {
            // An incomplete array decays to a pointer to its element when
            // it appears anywhere a concrete type is required.
            format!("{}*", llvm_type_of(types, *element))
        }
        TypeKind::Function { params, ret, variadic, .. } => {
            let params: Vec<String> = params.iter().map(|p| llvm_type_of(types, *p)).collect();
            let mut joined = params.join(", ");
            if *variadic {
                if !joined.is_empty() {
                    joined.push_str(", ");
                }
                joined.push_str("...");
            }
            format!("{} ({})", llvm_type_of(types, *ret), joined)
        }
        TypeKind::Struct { tag, .. } => format!("%struct.{}", tag),
        TypeKind::Union { tag, .. } => format!("%union.{}", tag),
        TypeKind::Enum { .. } => "i32".to_string(),
        TypeKind::Typedef(..) => unreachable!("resolve() strips typedefs"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_map_to_fixed_width_integers() {
        let ts = TypeSystem::new();
        assert_eq!(llvm_type_of(&ts, ts.char_ty), "i8");
        assert_eq!(llvm_type_of(&ts, ts.short_ty), "i16");
        assert_eq!(llvm_type_of(&ts, ts.int_ty), "i32");
        assert_eq!(llvm_type_of(&ts, ts.long_ty), "i64");
    }

    #[test]
    fn pointer_uses_typed_pointer_syntax() {
        let mut ts = TypeSystem::new();
        let p = ts.pointer_to(ts.int_ty);
        assert_eq!(llvm_type_of(&ts, p), "i32*");
    }

    #[test]
    fn void_pointer_is_i8_star() {
        let mut ts = TypeSystem::new();
        let p = ts.pointer_to(ts.void);
        assert_eq!(llvm_type_of(&ts, p), "i8*");
    }

    #[test]
    fn struct_type_uses_struct_dot_tag() {
        let mut ts = TypeSystem::new();
        let s = ts.declare_struct("P".to_string());
        assert_eq!(llvm_type_of(&ts, s), "%struct.P");
    }

    #[test]
    fn array_type_uses_bracket_syntax() {
        let mut ts = TypeSystem::new();
        let arr = ts.array_of(ts.int_ty, Some(10));
        assert_eq!(llvm_type_of(&ts, arr), "[10 x i32]");
    }
}
