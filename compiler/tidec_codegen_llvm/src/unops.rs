//! Unary operator lowering: sign/bitwise negation, logical not,
//! address-of/dereference, the four increment/decrement forms, and
//! `sizeof expr`.

use tidec_codegen_ssa::llvm_ty::llvm_type_of;
use tidec_codegen_ssa::Value;
use tidec_lir::ast::UnaryOp;
use tidec_lir::NodeId;

use crate::access::{error_value, load_if_lvalue};
use crate::casts::is_float_kind;
use crate::entry::FnCtx;
use crate::expr::{codegen_expr, codegen_expr_loaded};

pub fn codegen_unary_op(fcx: &mut FnCtx<'_, '_>, op: UnaryOp, operand: NodeId) -> Value {
    match op {
        UnaryOp::Plus => codegen_expr_loaded(fcx, operand),

        UnaryOp::Neg => {
            let ty = fcx.cgx.tu.ast.get(operand).ty.unwrap_or(fcx.cgx.tu.types.int_ty);
            let llvm_ty = llvm_type_of(&fcx.cgx.tu.types, ty);
            let value = codegen_expr_loaded(fcx, operand);
            let reg = fcx.new_reg();
            if is_float_kind(fcx, fcx.cgx.tu.types.resolve(ty)) {
                fcx.sink.emit(format!("{} = fneg {} {}", reg, llvm_ty, value.text));
            } else {
                fcx.sink
                    .emit(format!("{} = sub {} 0, {}", reg, llvm_ty, value.text));
            }
            Value::rvalue(llvm_ty, reg)
        }

        UnaryOp::BitNot => {
            let ty = fcx.cgx.tu.ast.get(operand).ty.unwrap_or(fcx.cgx.tu.types.int_ty);
            let llvm_ty = llvm_type_of(&fcx.cgx.tu.types, ty);
            let value = codegen_expr_loaded(fcx, operand);
            let reg = fcx.new_reg();
            fcx.sink
                .emit(format!("{} = xor {} {}, -1", reg, llvm_ty, value.text));
            Value::rvalue(llvm_ty, reg)
        }

        UnaryOp::Not => {
            let ty = fcx.cgx.tu.ast.get(operand).ty.unwrap_or(fcx.cgx.tu.types.int_ty);
            let llvm_ty = llvm_type_of(&fcx.cgx.tu.types, ty);
            let value = codegen_expr_loaded(fcx, operand);
            let cmp = fcx.new_reg();
            fcx.sink
                .emit(format!("{} = icmp eq {} {}, 0", cmp, llvm_ty, value.text));
            let widened = fcx.new_reg();
            fcx.sink.emit(format!("{} = zext i1 {} to i32", widened, cmp));
            Value::rvalue("i32", widened)
        }

        UnaryOp::AddrOf => {
            let addr = codegen_expr(fcx, operand);
            if !addr.is_lvalue {
                return error_value(fcx, "cannot take the address of a non-lvalue expression");
            }
            let ty = fcx.cgx.tu.ast.get(operand).ty.unwrap_or(fcx.cgx.tu.types.int_ty);
            let pointee_llvm_ty = llvm_type_of(&fcx.cgx.tu.types, ty);
            Value::rvalue(format!("{}*", pointee_llvm_ty), addr.text)
        }

        UnaryOp::Deref => {
            let ty = fcx.cgx.tu.ast.get(operand).ty.unwrap_or(fcx.cgx.tu.types.int_ty);
            let pointee = match fcx.cgx.tu.types.get(fcx.cgx.tu.types.resolve(ty)).kind {
                tidec_lir::types::TypeKind::Pointer(pointee) => pointee,
                ref other => {
                    return error_value(fcx, &format!("cannot dereference a value of kind {:?}", other));
                }
            };
            let ptr_value = codegen_expr_loaded(fcx, operand);
            let pointee_llvm_ty = llvm_type_of(&fcx.cgx.tu.types, pointee);
            Value::lvalue(pointee_llvm_ty, ptr_value.text)
        }

        UnaryOp::PreInc | UnaryOp::PreDec => codegen_step(fcx, operand, op == UnaryOp::PreInc, true),
        UnaryOp::PostInc | UnaryOp::PostDec => codegen_step(fcx, operand, op == UnaryOp::PostInc, false),

        UnaryOp::SizeofExpr => {
            let ty = fcx.cgx.tu.ast.get(operand).ty.unwrap_or(fcx.cgx.tu.types.int_ty);
            let size = fcx.cgx.tu.types.size_of(ty);
            Value::constant("i32", size.to_string())
        }
    }
}

/// `++x`/`--x`/`x++`/`x--`. Loads the current value, steps it by one
/// (scaled by the pointee's size for pointer operands), stores the new
/// value back, and yields either the new value (`is_pre`) or the value
/// read before stepping.
fn codegen_step(fcx: &mut FnCtx<'_, '_>, operand: NodeId, is_increment: bool, is_pre: bool) -> Value {
    let ty = fcx.cgx.tu.ast.get(operand).ty.unwrap_or(fcx.cgx.tu.types.int_ty);
    let llvm_ty = llvm_type_of(&fcx.cgx.tu.types, ty);
    let resolved = fcx.cgx.tu.types.resolve(ty);

    let addr = codegen_expr(fcx, operand);
    if !addr.is_lvalue {
        return error_value(fcx, "operand of `++`/`--` is not assignable");
    }
    let current = load_if_lvalue(fcx, addr.clone(), ty);

    let stepped = if let tidec_lir::types::TypeKind::Pointer(pointee) =
        fcx.cgx.tu.types.get(resolved).kind
    {
        let pointee_llvm_ty = llvm_type_of(&fcx.cgx.tu.types, pointee);
        let index = if is_increment { 1i32 } else { -1 };
        let reg = fcx.new_reg();
        fcx.sink.emit(format!(
            "{} = getelementptr inbounds {}, {} {}, i32 {}",
            reg, pointee_llvm_ty, llvm_ty, current, index
        ));
        reg
    } else if is_float_kind(fcx, resolved) {
        let reg = fcx.new_reg();
        let instr = if is_increment { "fadd" } else { "fsub" };
        fcx.sink
            .emit(format!("{} = {} {} {}, 1.0", reg, instr, llvm_ty, current));
        reg
    } else {
        let reg = fcx.new_reg();
        let instr = if is_increment { "add" } else { "sub" };
        fcx.sink
            .emit(format!("{} = {} {} {}, 1", reg, instr, llvm_ty, current));
        reg
    };

    fcx.sink
        .emit(format!("store {} {}, {}* {}", llvm_ty, stepped, llvm_ty, addr.text));

    if is_pre {
        Value::rvalue(llvm_ty, stepped)
    } else {
        Value::rvalue(llvm_ty, current)
    }
}
