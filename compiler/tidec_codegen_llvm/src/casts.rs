//! Explicit `(T)expr` casts and the implicit conversions arithmetic,
//! assignment, and call-argument passing all need.
//!
//! Every integer type in this subset is treated as signed (there is no
//! `unsigned` keyword), so a widening integer conversion is always `sext`
//! and a narrowing-to-int-from-float conversion is always `fptosi`.

use tidec_codegen_ssa::llvm_ty::llvm_type_of;
use tidec_codegen_ssa::Value;
use tidec_lir::types::{BasicKind, TypeId, TypeKind};
use tidec_lir::NodeId;

use crate::entry::FnCtx;
use crate::expr::codegen_expr_loaded;

pub(crate) fn is_float_kind(fcx: &FnCtx<'_, '_>, ty: TypeId) -> bool {
    matches!(
        fcx.cgx.tu.types.get(ty).kind,
        TypeKind::Basic(BasicKind::Float) | TypeKind::Basic(BasicKind::Double)
    )
}

pub(crate) fn is_pointer_kind(fcx: &FnCtx<'_, '_>, ty: TypeId) -> bool {
    matches!(fcx.cgx.tu.types.get(ty).kind, TypeKind::Pointer(_))
}

fn bit_width(llvm_ty: &str) -> u32 {
    match llvm_ty {
        "i1" => 1,
        "i8" => 8,
        "i16" => 16,
        "i32" => 32,
        "i64" => 64,
        "float" => 32,
        "double" => 64,
        other => panic!("cannot convert to/from `{}`", other),
    }
}

/// Converts `value` (already evaluated, of type `from_ty`) to `to_ty`,
/// emitting whatever single conversion instruction is needed. Returns
/// `value` itself unchanged when no conversion is required.
pub fn convert_value(fcx: &mut FnCtx<'_, '_>, value: &str, from_ty: TypeId, to_ty: TypeId) -> String {
    let from_resolved = fcx.cgx.tu.types.resolve(from_ty);
    let to_resolved = fcx.cgx.tu.types.resolve(to_ty);
    if from_resolved == to_resolved {
        return value.to_string();
    }
    // `(void)expr` discards the value outright; there is nothing to convert
    // and no instruction to emit.
    if matches!(fcx.cgx.tu.types.get(to_resolved).kind, TypeKind::Basic(BasicKind::Void)) {
        return value.to_string();
    }

    let from_llvm = llvm_type_of(&fcx.cgx.tu.types, from_resolved);
    let to_llvm = llvm_type_of(&fcx.cgx.tu.types, to_resolved);

    // `bool` shares `i8`'s storage width but not its value domain (always
    // `0` or `1`), so it needs its own rules ahead of both the
    // same-llvm-type short circuit below (it would otherwise treat a
    // `char`-vs-`bool` conversion, both `i8`, as a no-op) and the generic
    // trunc/sext selection (which would trunc a large int straight to
    // `bool` instead of normalizing it).
    let from_bool = matches!(fcx.cgx.tu.types.get(from_resolved).kind, TypeKind::Basic(BasicKind::Bool));
    let to_bool = matches!(fcx.cgx.tu.types.get(to_resolved).kind, TypeKind::Basic(BasicKind::Bool));
    if to_bool && !from_bool {
        let cmp = fcx.new_reg();
        fcx.sink.emit(format!("{} = icmp ne {} {}, 0", cmp, from_llvm, value));
        let reg = fcx.new_reg();
        fcx.sink.emit(format!("{} = zext i1 {} to {}", reg, cmp, to_llvm));
        return reg;
    }
    if from_bool && !to_bool && !is_float_kind(fcx, to_resolved) && !is_pointer_kind(fcx, to_resolved) {
        let reg = fcx.new_reg();
        fcx.sink
            .emit(format!("{} = zext {} {} to {}", reg, from_llvm, value, to_llvm));
        return reg;
    }

    if from_llvm == to_llvm {
        return value.to_string();
    }

    let from_float = is_float_kind(fcx, from_resolved);
    let to_float = is_float_kind(fcx, to_resolved);
    let from_ptr = is_pointer_kind(fcx, from_resolved);
    let to_ptr = is_pointer_kind(fcx, to_resolved);

    let instr = if from_ptr && to_ptr {
        "bitcast"
    } else if from_ptr {
        "ptrtoint"
    } else if to_ptr {
        "inttoptr"
    } else if from_float && to_float {
        if bit_width(&from_llvm) < bit_width(&to_llvm) { "fpext" } else { "fptrunc" }
    } else if from_float {
        "fptosi"
    } else if to_float {
        "sitofp"
    } else if bit_width(&from_llvm) < bit_width(&to_llvm) {
        "sext"
    } else {
        "trunc"
    };

    let reg = fcx.new_reg();
    fcx.sink
        .emit(format!("{} = {} {} {} to {}", reg, instr, from_llvm, value, to_llvm));
    reg
}

pub fn codegen_cast(fcx: &mut FnCtx<'_, '_>, target: TypeId, operand: NodeId) -> Value {
    let operand_ty = fcx
        .cgx
        .tu
        .ast
        .get(operand)
        .ty
        .unwrap_or(fcx.cgx.tu.types.int_ty);
    let operand_val = codegen_expr_loaded(fcx, operand);
    let converted = convert_value(fcx, &operand_val.text, operand_ty, target);
    let target_llvm_ty = llvm_type_of(&fcx.cgx.tu.types, target);
    Value::rvalue(target_llvm_ty, converted)
}
