//! Binary operator lowering: arithmetic and pointer arithmetic,
//! comparisons, bitwise ops, the short-circuiting logical operators,
//! assignment (plain and compound), and the comma operator.

use tidec_codegen_ssa::llvm_ty::llvm_type_of;
use tidec_codegen_ssa::Value;
use tidec_lir::ast::BinaryOp;
use tidec_lir::types::{BasicKind, TypeId, TypeKind};
use tidec_lir::NodeId;

use crate::access::{error_value, load_if_lvalue};
use crate::casts::{convert_value, is_float_kind, is_pointer_kind};
use crate::entry::FnCtx;
use crate::expr::{codegen_expr, codegen_expr_as_i1, codegen_expr_loaded};

pub fn codegen_binary_op(fcx: &mut FnCtx<'_, '_>, op: BinaryOp, lhs: NodeId, rhs: NodeId) -> Value {
    match op {
        BinaryOp::Assign => codegen_assign(fcx, lhs, rhs),
        BinaryOp::AddAssign
        | BinaryOp::SubAssign
        | BinaryOp::MulAssign
        | BinaryOp::DivAssign
        | BinaryOp::ModAssign
        | BinaryOp::AndAssign
        | BinaryOp::OrAssign
        | BinaryOp::XorAssign
        | BinaryOp::ShlAssign
        | BinaryOp::ShrAssign => codegen_compound_assign(fcx, op, lhs, rhs),
        BinaryOp::LogAnd => codegen_short_circuit(fcx, true, lhs, rhs),
        BinaryOp::LogOr => codegen_short_circuit(fcx, false, lhs, rhs),
        BinaryOp::Comma => {
            codegen_expr(fcx, lhs);
            codegen_expr(fcx, rhs)
        }
        _ => codegen_arithmetic(fcx, op, lhs, rhs),
    }
}

fn node_ty(fcx: &FnCtx<'_, '_>, node: NodeId) -> TypeId {
    fcx.cgx.tu.ast.get(node).ty.unwrap_or(fcx.cgx.tu.types.int_ty)
}

fn numeric_rank(fcx: &FnCtx<'_, '_>, ty: TypeId) -> u8 {
    let resolved = fcx.cgx.tu.types.resolve(ty);
    match fcx.cgx.tu.types.get(resolved).kind {
        TypeKind::Basic(BasicKind::Double) => 4,
        TypeKind::Basic(BasicKind::Float) => 3,
        TypeKind::Basic(BasicKind::Long) => 2,
        _ => 1, // bool/char/short/int/enum all promote to (at least) `int`
    }
}

/// C's "usual arithmetic conversions", simplified to this subset's scalar
/// kinds: the wider of the two operand types wins, with every integer
/// smaller than `int` promoted to `int` first.
fn common_numeric_type(fcx: &FnCtx<'_, '_>, a: TypeId, b: TypeId) -> TypeId {
    let types = &fcx.cgx.tu.types;
    match numeric_rank(fcx, a).max(numeric_rank(fcx, b)) {
        4 => types.double_ty,
        3 => types.float_ty,
        2 => types.long_ty,
        _ => types.int_ty,
    }
}

fn pointee(fcx: &FnCtx<'_, '_>, ty: TypeId) -> TypeId {
    match fcx.cgx.tu.types.get(fcx.cgx.tu.types.resolve(ty)).kind {
        TypeKind::Pointer(pointee) => pointee,
        ref other => panic!("expected a pointer type, found {:?}", other),
    }
}

fn codegen_arithmetic(fcx: &mut FnCtx<'_, '_>, op: BinaryOp, lhs: NodeId, rhs: NodeId) -> Value {
    let lhs_ty = node_ty(fcx, lhs);
    let rhs_ty = node_ty(fcx, rhs);

    if matches!(op, BinaryOp::Add | BinaryOp::Sub) {
        if let Some(value) = try_pointer_arithmetic(fcx, op, lhs, rhs, lhs_ty, rhs_ty) {
            return value;
        }
    }

    let result_ty = common_numeric_type(fcx, lhs_ty, rhs_ty);
    let result_llvm_ty = llvm_type_of(&fcx.cgx.tu.types, result_ty);
    let is_float = is_float_kind(fcx, fcx.cgx.tu.types.resolve(result_ty));

    let lhs_val = codegen_expr_loaded(fcx, lhs);
    let lhs_conv = convert_value(fcx, &lhs_val.text, lhs_ty, result_ty);
    let rhs_val = codegen_expr_loaded(fcx, rhs);
    let rhs_conv = convert_value(fcx, &rhs_val.text, rhs_ty, result_ty);

    if matches!(
        op,
        BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
    ) {
        let cmp_op = match op {
            BinaryOp::Lt => if is_float { "olt" } else { "slt" },
            BinaryOp::Gt => if is_float { "ogt" } else { "sgt" },
            BinaryOp::Le => if is_float { "ole" } else { "sle" },
            BinaryOp::Ge => if is_float { "oge" } else { "sge" },
            BinaryOp::Eq => if is_float { "oeq" } else { "eq" },
            BinaryOp::Ne => if is_float { "one" } else { "ne" },
            _ => unreachable!(),
        };
        let cmp_reg = fcx.new_reg();
        fcx.sink.emit(format!(
            "{} = {} {} {} {}, {}",
            cmp_reg,
            if is_float { "fcmp" } else { "icmp" },
            cmp_op,
            result_llvm_ty,
            lhs_conv,
            rhs_conv
        ));
        let widened = fcx.new_reg();
        fcx.sink.emit(format!("{} = zext i1 {} to i32", widened, cmp_reg));
        return Value::rvalue("i32", widened);
    }

    let instr = match op {
        BinaryOp::Add => if is_float { "fadd" } else { "add" },
        BinaryOp::Sub => if is_float { "fsub" } else { "sub" },
        BinaryOp::Mul => if is_float { "fmul" } else { "mul" },
        BinaryOp::Div => if is_float { "fdiv" } else { "sdiv" },
        BinaryOp::Mod => "srem",
        BinaryOp::BitAnd => "and",
        BinaryOp::BitOr => "or",
        BinaryOp::BitXor => "xor",
        BinaryOp::Shl => "shl",
        BinaryOp::Shr => "ashr",
        other => panic!("{:?} is not an arithmetic operator", other),
    };
    let reg = fcx.new_reg();
    fcx.sink
        .emit(format!("{} = {} {} {}, {}", reg, instr, result_llvm_ty, lhs_conv, rhs_conv));
    Value::rvalue(result_llvm_ty, reg)
}

/// Handles `ptr + int`, `int + ptr`, `ptr - int`, and `ptr - ptr`. Returns
/// `None` when neither operand is a pointer, so the caller falls back to
/// ordinary scalar arithmetic.
fn try_pointer_arithmetic(
    fcx: &mut FnCtx<'_, '_>,
    op: BinaryOp,
    lhs: NodeId,
    rhs: NodeId,
    lhs_ty: TypeId,
    rhs_ty: TypeId,
) -> Option<Value> {
    let lhs_is_ptr = is_pointer_kind(fcx, fcx.cgx.tu.types.resolve(lhs_ty));
    let rhs_is_ptr = is_pointer_kind(fcx, fcx.cgx.tu.types.resolve(rhs_ty));
    if !lhs_is_ptr && !rhs_is_ptr {
        return None;
    }

    if lhs_is_ptr && rhs_is_ptr {
        if op != BinaryOp::Sub {
            return Some(error_value(fcx, "two pointers cannot be added together"));
        }
        let element_ty = pointee(fcx, lhs_ty);
        let element_size = fcx.cgx.tu.types.size_of(element_ty).max(1);
        let ptr_llvm_ty = llvm_type_of(&fcx.cgx.tu.types, fcx.cgx.tu.types.resolve(lhs_ty));
        let lhs_val = codegen_expr_loaded(fcx, lhs);
        let rhs_val = codegen_expr_loaded(fcx, rhs);
        let l_int = fcx.new_reg();
        fcx.sink
            .emit(format!("{} = ptrtoint {} {} to i64", l_int, ptr_llvm_ty, lhs_val.text));
        let r_int = fcx.new_reg();
        fcx.sink
            .emit(format!("{} = ptrtoint {} {} to i64", r_int, ptr_llvm_ty, rhs_val.text));
        let diff = fcx.new_reg();
        fcx.sink.emit(format!("{} = sub i64 {}, {}", diff, l_int, r_int));
        let scaled = fcx.new_reg();
        fcx.sink
            .emit(format!("{} = sdiv i64 {}, {}", scaled, diff, element_size));
        let truncated = fcx.new_reg();
        fcx.sink
            .emit(format!("{} = trunc i64 {} to i32", truncated, scaled));
        return Some(Value::rvalue("i32", truncated));
    }

    let (ptr_node, ptr_ty, int_node, int_ty, negate) = if lhs_is_ptr {
        (lhs, lhs_ty, rhs, rhs_ty, op == BinaryOp::Sub)
    } else {
        if op == BinaryOp::Sub {
            return Some(error_value(fcx, "cannot subtract a pointer from an integer"));
        }
        (rhs, rhs_ty, lhs, lhs_ty, false)
    };

    let element_ty = pointee(fcx, ptr_ty);
    let element_llvm_ty = llvm_type_of(&fcx.cgx.tu.types, element_ty);
    let ptr_llvm_ty = llvm_type_of(&fcx.cgx.tu.types, fcx.cgx.tu.types.resolve(ptr_ty));

    let ptr_val = codegen_expr_loaded(fcx, ptr_node);
    let index_val = codegen_expr_loaded(fcx, int_node);
    let index_i32 = convert_value(fcx, &index_val.text, int_ty, fcx.cgx.tu.types.int_ty);
    let index_i32 = if negate {
        let neg = fcx.new_reg();
        fcx.sink.emit(format!("{} = sub i32 0, {}", neg, index_i32));
        neg
    } else {
        index_i32
    };

    let reg = fcx.new_reg();
    fcx.sink.emit(format!(
        "{} = getelementptr inbounds {}, {} {}, i32 {}",
        reg, element_llvm_ty, ptr_llvm_ty, ptr_val.text, index_i32
    ));
    Some(Value::rvalue(ptr_llvm_ty, reg))
}

/// `lhs = rhs`. Evaluates `rhs` first (a destination array/struct member
/// expression must not be re-evaluated after the value it indexes into has
/// changed), converts it to the destination's type, stores it, and yields
/// the stored value — matching C's "assignment is itself an expression"
/// semantics.
fn codegen_assign(fcx: &mut FnCtx<'_, '_>, lhs: NodeId, rhs: NodeId) -> Value {
    let lhs_ty = node_ty(fcx, lhs);
    let rhs_ty = node_ty(fcx, rhs);
    let rhs_val = codegen_expr_loaded(fcx, rhs);
    let converted = convert_value(fcx, &rhs_val.text, rhs_ty, lhs_ty);

    let lhs_val = codegen_expr(fcx, lhs);
    if !lhs_val.is_lvalue {
        return error_value(fcx, "left-hand side of an assignment is not assignable");
    }
    let llvm_ty = llvm_type_of(&fcx.cgx.tu.types, lhs_ty);
    fcx.sink
        .emit(format!("store {} {}, {}* {}", llvm_ty, converted, llvm_ty, lhs_val.text));
    Value::rvalue(llvm_ty, converted)
}

/// `lhs OP= rhs`, expanded to `lhs = lhs OP rhs` but evaluating `lhs`'s
/// address only once.
fn codegen_compound_assign(fcx: &mut FnCtx<'_, '_>, op: BinaryOp, lhs: NodeId, rhs: NodeId) -> Value {
    let lhs_ty = node_ty(fcx, lhs);
    let rhs_ty = node_ty(fcx, rhs);
    let llvm_ty = llvm_type_of(&fcx.cgx.tu.types, lhs_ty);

    let lhs_addr = codegen_expr(fcx, lhs);
    if !lhs_addr.is_lvalue {
        return error_value(fcx, "left-hand side of a compound assignment is not assignable");
    }
    let current = load_if_lvalue(fcx, lhs_addr.clone(), lhs_ty);

    let underlying = op.underlying();
    let is_float = is_float_kind(fcx, fcx.cgx.tu.types.resolve(lhs_ty));
    let is_ptr = is_pointer_kind(fcx, fcx.cgx.tu.types.resolve(lhs_ty));

    let rhs_val = codegen_expr_loaded(fcx, rhs);

    let new_value = if is_ptr && matches!(underlying, BinaryOp::Add | BinaryOp::Sub) {
        let element_ty = pointee(fcx, lhs_ty);
        let element_llvm_ty = llvm_type_of(&fcx.cgx.tu.types, element_ty);
        let index_i32 = convert_value(fcx, &rhs_val.text, rhs_ty, fcx.cgx.tu.types.int_ty);
        let index_i32 = if underlying == BinaryOp::Sub {
            let neg = fcx.new_reg();
            fcx.sink.emit(format!("{} = sub i32 0, {}", neg, index_i32));
            neg
        } else {
            index_i32
        };
        let reg = fcx.new_reg();
        fcx.sink.emit(format!(
            "{} = getelementptr inbounds {}, {} {}, i32 {}",
            reg, element_llvm_ty, llvm_ty, current, index_i32
        ));
        reg
    } else {
        let rhs_conv = convert_value(fcx, &rhs_val.text, rhs_ty, lhs_ty);
        let instr = match underlying {
            BinaryOp::Add => if is_float { "fadd" } else { "add" },
            BinaryOp::Sub => if is_float { "fsub" } else { "sub" },
            BinaryOp::Mul => if is_float { "fmul" } else { "mul" },
            BinaryOp::Div => if is_float { "fdiv" } else { "sdiv" },
            BinaryOp::Mod => "srem",
            BinaryOp::BitAnd => "and",
            BinaryOp::BitOr => "or",
            BinaryOp::BitXor => "xor",
            BinaryOp::Shl => "shl",
            BinaryOp::Shr => "ashr",
            other => panic!("{:?} is not a compound-assignable operator", other),
        };
        let reg = fcx.new_reg();
        fcx.sink
            .emit(format!("{} = {} {} {}, {}", reg, instr, llvm_ty, current, rhs_conv));
        reg
    };

    fcx.sink
        .emit(format!("store {} {}, {}* {}", llvm_ty, new_value, llvm_ty, lhs_addr.text));
    Value::rvalue(llvm_ty, new_value)
}

/// `&&`/`||`, lowered with real control flow so the right-hand side is
/// only evaluated when it can affect the result.
fn codegen_short_circuit(fcx: &mut FnCtx<'_, '_>, is_and: bool, lhs: NodeId, rhs: NodeId) -> Value {
    let slot = fcx.new_reg();
    fcx.sink.emit_alloca(format!("{} = alloca i32", slot));

    let rhs_label = fcx.new_label(if is_and { "and.rhs" } else { "or.rhs" });
    let short_label = fcx.new_label(if is_and { "and.short" } else { "or.short" });
    let end_label = fcx.new_label(if is_and { "and.end" } else { "or.end" });

    let lhs_cond = codegen_expr_as_i1(fcx, lhs);
    if is_and {
        fcx.sink
            .emit(format!("br i1 {}, label %{}, label %{}", lhs_cond, rhs_label, short_label));
    } else {
        fcx.sink
            .emit(format!("br i1 {}, label %{}, label %{}", lhs_cond, short_label, rhs_label));
    }

    fcx.sink.emit_raw(format!("{}:", short_label));
    fcx.sink
        .emit(format!("store i32 {}, i32* {}", if is_and { 0 } else { 1 }, slot));
    fcx.sink.emit(format!("br label %{}", end_label));

    fcx.sink.emit_raw(format!("{}:", rhs_label));
    let rhs_cond = codegen_expr_as_i1(fcx, rhs);
    let rhs_as_i32 = fcx.new_reg();
    fcx.sink
        .emit(format!("{} = zext i1 {} to i32", rhs_as_i32, rhs_cond));
    fcx.sink
        .emit(format!("store i32 {}, i32* {}", rhs_as_i32, slot));
    fcx.sink.emit(format!("br label %{}", end_label));

    fcx.sink.emit_raw(format!("{}:", end_label));
    let result = fcx.new_reg();
    fcx.sink
        .emit(format!("{} = load i32, i32* {}", result, slot));
    Value::rvalue("i32", result)
}
