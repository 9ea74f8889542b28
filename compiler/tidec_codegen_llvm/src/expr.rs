//! Dispatches one expression-level AST node to its value, enforcing the
//! lvalue/rvalue discipline the rest of this crate's modules rely on:
//! identifiers, subscripts, and member accesses evaluate to the *address*
//! of their storage (`Value::is_lvalue == true`); everything else
//! evaluates to the value itself.

use tidec_codegen_ssa::llvm_ty::llvm_type_of;
use tidec_codegen_ssa::Value;
use tidec_lir::ast::{AstKind, Constant};
use tidec_lir::symbol::StorageClass;
use tidec_lir::NodeId;

use crate::access::{codegen_member, codegen_subscript, load_if_lvalue};
use crate::binops::codegen_binary_op;
use crate::calls::codegen_call;
use crate::casts::codegen_cast;
use crate::entry::FnCtx;
use crate::ternary::codegen_conditional;
use crate::unops::codegen_unary_op;

pub fn codegen_expr(fcx: &mut FnCtx<'_, '_>, node: NodeId) -> Value {
    let kind = fcx.cgx.tu.ast.get(node).kind.clone();
    match kind {
        AstKind::Identifier(name) => codegen_identifier(fcx, &name),

        AstKind::Constant(Constant::Int(v)) => Value::constant("i32", v.to_string()),
        AstKind::Constant(Constant::Char(v)) => Value::constant("i8", v.to_string()),
        AstKind::Constant(Constant::Float(v)) => Value::constant("double", format!("{:?}", v)),

        AstKind::StringLiteral(contents) => {
            let name = fcx.cgx.intern_string(&contents);
            let byte_len = contents.as_bytes().len() + 1;
            let reg = fcx.new_reg();
            fcx.sink.emit(format!(
                "{} = getelementptr inbounds [{} x i8], [{} x i8]* {}, i64 0, i64 0",
                reg, byte_len, byte_len, name
            ));
            Value::rvalue("i8*", reg)
        }

        AstKind::BinaryOp { op, lhs, rhs } => codegen_binary_op(fcx, op, lhs, rhs),
        AstKind::UnaryOp { op, operand } => codegen_unary_op(fcx, op, operand),
        AstKind::Cast { target, operand } => codegen_cast(fcx, target, operand),
        AstKind::SizeofType { target } => {
            let size = fcx.cgx.tu.types.size_of(target);
            Value::constant("i32", size.to_string())
        }
        AstKind::Conditional { cond, then_branch, else_branch } => {
            codegen_conditional(fcx, cond, then_branch, else_branch)
        }
        AstKind::Call { callee, args } => codegen_call(fcx, callee, args),
        AstKind::Subscript { base, index } => codegen_subscript(fcx, base, index),
        AstKind::Member { base, field, arrow } => codegen_member(fcx, base, &field, arrow),

        other => panic!("{:?} is not an expression", other),
    }
}

/// Loads the value of an expression, issuing a `load` if it evaluated to
/// an address. Most call sites want this rather than the raw `Value`.
pub fn codegen_expr_loaded(fcx: &mut FnCtx<'_, '_>, node: NodeId) -> Value {
    let ty = fcx.cgx.tu.ast.get(node).ty.unwrap_or(fcx.cgx.tu.types.int_ty);
    let value = codegen_expr(fcx, node);
    let llvm_ty = llvm_type_of(&fcx.cgx.tu.types, ty);
    let text = crate::access::load_if_lvalue(fcx, value, ty);
    Value::rvalue(llvm_ty, text)
}

/// Evaluates `node` and truncates/compares it down to an `i1`, the form
/// every branch condition needs. Anything already an `i1`-producing
/// comparison is passed straight through by `icmp_ne_zero`'s caller; this
/// handles the common case of branching on an arbitrary scalar.
pub fn codegen_expr_as_i1(fcx: &mut FnCtx<'_, '_>, node: NodeId) -> String {
    let ty = fcx.cgx.tu.ast.get(node).ty.unwrap_or(fcx.cgx.tu.types.int_ty);
    let value = codegen_expr(fcx, node);
    let text = load_if_lvalue(fcx, value, ty);
    let llvm_ty = llvm_type_of(&fcx.cgx.tu.types, ty);
    let reg = fcx.new_reg();
    fcx.sink
        .emit(format!("{} = icmp ne {} {}, 0", reg, llvm_ty, text));
    reg
}

fn codegen_identifier(fcx: &mut FnCtx<'_, '_>, name: &str) -> Value {
    if let Some((addr, ty)) = fcx.lookup_local(name).cloned() {
        let llvm_ty = llvm_type_of(&fcx.cgx.tu.types, ty);
        return Value::lvalue(llvm_ty, addr);
    }

    let symbol = fcx
        .cgx
        .tu
        .symbols
        .lookup(name)
        .unwrap_or_else(|| panic!("undefined identifier `{}`", name));
    let llvm_ty = llvm_type_of(&fcx.cgx.tu.types, symbol.ty);

    if matches!(
        fcx.cgx.tu.types.get(fcx.cgx.tu.types.resolve(symbol.ty)).kind,
        tidec_lir::types::TypeKind::Function { .. }
    ) {
        return Value::function(llvm_ty, format!("@{}", name));
    }

    // Any other file-scope symbol (`extern`/`static`/plain global) is
    // addressed the same way: its mangled name is its address.
    debug_assert!(matches!(
        symbol.storage,
        StorageClass::Extern | StorageClass::Static | StorageClass::Auto
    ));
    Value::lvalue(llvm_ty, format!("@{}", name))
}
