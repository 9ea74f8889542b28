//! `cond ? then_branch : else_branch`, lowered with a scratch stack slot
//! rather than a `phi`, matching the rest of this crate's alloca-based
//! treatment of merge points (see `statements::codegen_statement`'s `if`).

use tidec_codegen_ssa::llvm_ty::llvm_type_of;
use tidec_codegen_ssa::Value;
use tidec_lir::NodeId;

use crate::casts::convert_value;
use crate::entry::FnCtx;
use crate::expr::{codegen_expr_as_i1, codegen_expr_loaded};

pub fn codegen_conditional(
    fcx: &mut FnCtx<'_, '_>,
    cond: NodeId,
    then_branch: NodeId,
    else_branch: NodeId,
) -> Value {
    let result_ty = fcx
        .cgx
        .tu
        .ast
        .get(then_branch)
        .ty
        .or(fcx.cgx.tu.ast.get(else_branch).ty)
        .unwrap_or(fcx.cgx.tu.types.int_ty);
    let llvm_ty = llvm_type_of(&fcx.cgx.tu.types, result_ty);

    let slot = fcx.new_reg();
    fcx.sink.emit_alloca(format!("{} = alloca {}", slot, llvm_ty));

    let then_label = fcx.new_label("cond.then");
    let else_label = fcx.new_label("cond.else");
    let end_label = fcx.new_label("cond.end");

    let cond_val = codegen_expr_as_i1(fcx, cond);
    fcx.sink
        .emit(format!("br i1 {}, label %{}, label %{}", cond_val, then_label, else_label));

    fcx.sink.emit_raw(format!("{}:", then_label));
    let then_ty = fcx.cgx.tu.ast.get(then_branch).ty.unwrap_or(result_ty);
    let then_val = codegen_expr_loaded(fcx, then_branch);
    let then_conv = convert_value(fcx, &then_val.text, then_ty, result_ty);
    fcx.sink
        .emit(format!("store {} {}, {}* {}", llvm_ty, then_conv, llvm_ty, slot));
    fcx.sink.emit(format!("br label %{}", end_label));

    fcx.sink.emit_raw(format!("{}:", else_label));
    let else_ty = fcx.cgx.tu.ast.get(else_branch).ty.unwrap_or(result_ty);
    let else_val = codegen_expr_loaded(fcx, else_branch);
    let else_conv = convert_value(fcx, &else_val.text, else_ty, result_ty);
    fcx.sink
        .emit(format!("store {} {}, {}* {}", llvm_ty, else_conv, llvm_ty, slot));
    fcx.sink.emit(format!("br label %{}", end_label));

    fcx.sink.emit_raw(format!("{}:", end_label));
    let loaded = fcx.new_reg();
    fcx.sink
        .emit(format!("{} = load {}, {}* {}", loaded, llvm_ty, llvm_ty, slot));
    Value::rvalue(llvm_ty, loaded)
}
