//! Subscript (`a[i]`) and member (`s.f`/`p->f`) access, and the `load`
//! that turns an lvalue address into the value it holds.

use tidec_codegen_ssa::llvm_ty::llvm_type_of;
use tidec_codegen_ssa::Value;
use tidec_lir::types::{TypeId, TypeKind};
use tidec_lir::NodeId;

use crate::entry::FnCtx;
use crate::expr::{codegen_expr, codegen_expr_loaded};

/// Reports a semantic error this emitter has no recovery for (a malformed
/// expression tree a correct frontend would never build: subscripting a
/// scalar, assigning to a non-lvalue, and the like) through the shared
/// `ErrorSink` rather than aborting the whole compilation, and returns a
/// placeholder `i32 0` so the caller's tree walk can still finish.
pub(crate) fn error_value(fcx: &mut FnCtx<'_, '_>, message: &str) -> Value {
    fcx.cgx.errors.error_report(0, message);
    Value::rvalue("i32", "0")
}

/// Turns an lvalue (an address) into the value it holds by emitting a
/// `load`; a value that is already an rvalue is returned unchanged. `ty`
/// is the *value's* type, i.e. what `v.llvm_ty` should already equal.
pub fn load_if_lvalue(fcx: &mut FnCtx<'_, '_>, value: Value, ty: TypeId) -> String {
    if !value.is_lvalue {
        return value.text;
    }
    let llvm_ty = llvm_type_of(&fcx.cgx.tu.types, ty);
    let reg = fcx.new_reg();
    fcx.sink
        .emit(format!("{} = load {}, {}* {}", reg, llvm_ty, llvm_ty, value.text));
    reg
}

/// `base[index]`, lowered to a `getelementptr` off the decayed base
/// address. Evaluates to the *address* of the element (an lvalue).
pub fn codegen_subscript(fcx: &mut FnCtx<'_, '_>, base: NodeId, index: NodeId) -> Value {
    let base_ty = fcx.cgx.tu.ast.get(base).ty.unwrap_or(fcx.cgx.tu.types.int_ty);
    let resolved_base_ty = fcx.cgx.tu.types.resolve(base_ty);

    let (element_ty, base_addr, indices) = match fcx.cgx.tu.types.get(resolved_base_ty).kind.clone() {
        TypeKind::Array(element, _) => {
            let base_value = codegen_expr(fcx, base);
            // An array lvalue decays to a pointer to its first element
            // without an intervening `load` (there is nothing to load;
            // the array's address already *is* the pointer value).
            (element, base_value.text, "i32 0, ".to_string())
        }
        TypeKind::Pointer(pointee) => {
            let base_value = codegen_expr_loaded(fcx, base);
            (pointee, base_value.text, String::new())
        }
        other => {
            return error_value(fcx, &format!("cannot subscript a value of kind {:?}", other));
        }
    };

    let index_value = codegen_expr_loaded(fcx, index);
    let element_llvm_ty = llvm_type_of(&fcx.cgx.tu.types, element_ty);
    let base_llvm_ty = llvm_type_of(&fcx.cgx.tu.types, fcx.cgx.tu.types.resolve(base_ty));

    let reg = fcx.new_reg();
    fcx.sink.emit(format!(
        "{} = getelementptr inbounds {}, {}* {}, {}i32 {}",
        reg, base_llvm_ty, base_llvm_ty, base_addr, indices, index_value.text
    ));
    Value::lvalue(element_llvm_ty, reg)
}

/// `base.field` / `base->field`, lowered to a `getelementptr` to the
/// field's offset within the aggregate. Evaluates to the field's address.
pub fn codegen_member(fcx: &mut FnCtx<'_, '_>, base: NodeId, field: &str, arrow: bool) -> Value {
    let base_ty = fcx.cgx.tu.ast.get(base).ty.unwrap_or(fcx.cgx.tu.types.int_ty);

    let (aggregate_ty, aggregate_addr) = if arrow {
        let pointer_ty = fcx.cgx.tu.types.resolve(base_ty);
        let pointee = match fcx.cgx.tu.types.get(pointer_ty).kind {
            TypeKind::Pointer(pointee) => pointee,
            _ => return error_value(fcx, "`->` applied to a non-pointer"),
        };
        let base_value = codegen_expr_loaded(fcx, base);
        (pointee, base_value.text)
    } else {
        let base_value = codegen_expr(fcx, base);
        (fcx.cgx.tu.types.resolve(base_ty), base_value.text)
    };

    let fields = match &fcx.cgx.tu.types.get(aggregate_ty).kind {
        TypeKind::Struct { fields: Some(fields), .. } => fields,
        TypeKind::Union { fields: Some(fields), .. } => fields,
        other => {
            let message = format!("member access on an incomplete or non-aggregate type {:?}", other);
            return error_value(fcx, &message);
        }
    };
    let field_index = match fields.iter().position(|f| f.name == field) {
        Some(index) => index,
        None => return error_value(fcx, &format!("no member named `{}`", field)),
    };
    let field_ty = fields[field_index].ty;

    let aggregate_llvm_ty = llvm_type_of(&fcx.cgx.tu.types, aggregate_ty);
    let field_llvm_ty = llvm_type_of(&fcx.cgx.tu.types, field_ty);

    let is_union = matches!(fcx.cgx.tu.types.get(aggregate_ty).kind, TypeKind::Union { .. });
    let reg = fcx.new_reg();
    if is_union {
        // Every union member starts at offset 0: a bitcast of the
        // aggregate's address to a pointer to the member's type suffices.
        fcx.sink.emit(format!(
            "{} = bitcast {}* {} to {}*",
            reg, aggregate_llvm_ty, aggregate_addr, field_llvm_ty
        ));
    } else {
        fcx.sink.emit(format!(
            "{} = getelementptr inbounds {}, {}* {}, i32 0, i32 {}",
            reg, aggregate_llvm_ty, aggregate_llvm_ty, aggregate_addr, field_index
        ));
    }
    Value::lvalue(field_llvm_ty, reg)
}
