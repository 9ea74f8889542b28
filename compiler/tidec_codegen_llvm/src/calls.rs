//! Call expression lowering: ordinary direct calls (with implicit
//! `int name(...)` declaration for an undeclared callee), calls through a
//! function pointer, default argument promotion for the variadic tail of
//! a call, and the handful of `__builtin_*` intrinsics this subset
//! recognizes.

use tidec_codegen_ssa::llvm_ty::llvm_type_of;
use tidec_codegen_ssa::Value;
use tidec_lir::ast::AstKind;
use tidec_lir::types::{BasicKind, TypeId, TypeKind};
use tidec_lir::NodeId;

use crate::access::error_value;
use crate::casts::convert_value;
use crate::entry::FnCtx;
use crate::expr::{codegen_expr, codegen_expr_loaded};

pub fn codegen_call(fcx: &mut FnCtx<'_, '_>, callee: NodeId, args: Vec<NodeId>) -> Value {
    if let AstKind::Identifier(name) = fcx.cgx.tu.ast.get(callee).kind.clone() {
        if let Some(value) = codegen_builtin_call(fcx, &name, &args) {
            return value;
        }
        return codegen_direct_call(fcx, &name, &args);
    }

    let callee_ty = fcx.cgx.tu.ast.get(callee).ty.unwrap_or(fcx.cgx.tu.types.int_ty);
    let resolved = fcx.cgx.tu.types.resolve(callee_ty);
    let function_ty = match fcx.cgx.tu.types.get(resolved).kind {
        TypeKind::Pointer(pointee) => pointee,
        TypeKind::Function { .. } => resolved,
        ref other => return error_value(fcx, &format!("cannot call a value of kind {:?}", other)),
    };
    let (param_tys, ret_ty, variadic) =
        match fcx.cgx.tu.types.get(fcx.cgx.tu.types.resolve(function_ty)).kind.clone() {
            TypeKind::Function { params, ret, variadic, .. } => (params, ret, variadic),
            ref other => {
                return error_value(fcx, &format!("callee does not have function type (found {:?})", other));
            }
        };

    let callee_val = codegen_expr_loaded(fcx, callee);
    emit_call(fcx, &callee_val.text, ret_ty, &param_tys, variadic, None, &args)
}

fn codegen_direct_call(fcx: &mut FnCtx<'_, '_>, name: &str, args: &[NodeId]) -> Value {
    let symbol = fcx.cgx.tu.symbols.lookup(name).map(|s| (s.ty, s.defined));

    let (ret_ty, param_tys, variadic, is_defined_here) = match symbol {
        Some((ty, defined)) => {
            let resolved = fcx.cgx.tu.types.resolve(ty);
            match fcx.cgx.tu.types.get(resolved).kind.clone() {
                TypeKind::Function { params, ret, variadic, .. } => (ret, params, variadic, defined),
                other => {
                    return error_value(fcx, &format!("`{}` is not callable (found {:?})", name, other));
                }
            }
        }
        // An undeclared callee implicitly declares `int name(...)`, the
        // legacy C rule this subset still honors at the first call site.
        None => (fcx.cgx.tu.types.int_ty, Vec::new(), true, false),
    };

    // `printf`/`scanf` have no prototype in this subset (no headers), but
    // their real runtime signature fixes the format-string parameter as
    // `i8*` ahead of the variadic tail; every other implicitly-declared
    // variadic function folds all of its arguments into that tail.
    let sig_override = if !is_defined_here && (name == "printf" || name == "scanf") {
        Some(["i8*"].as_slice())
    } else {
        None
    };

    if !is_defined_here {
        let ret_llvm = llvm_type_of(&fcx.cgx.tu.types, ret_ty);
        let mut params_sig: Vec<String> = match sig_override {
            Some(prefix) => prefix.iter().map(|s| s.to_string()).collect(),
            None => param_tys.iter().map(|t| llvm_type_of(&fcx.cgx.tu.types, *t)).collect(),
        };
        if variadic {
            params_sig.push("...".to_string());
        }
        fcx.cgx
            .declare_external(name, format!("{} @{}({})", ret_llvm, name, params_sig.join(", ")));
    }

    emit_call(fcx, &format!("@{}", name), ret_ty, &param_tys, variadic, sig_override, args)
}

/// Emits the `call` instruction once the callee's operand text and
/// signature are known, shared by direct calls, implicit declarations,
/// and calls through a function pointer. `sig_prefix_override`, when set,
/// replaces the signature's fixed leading types (but not `param_tys`,
/// which still governs argument conversion) — used for the handful of
/// variadic runtime functions whose first parameter's type is known even
/// without a prototype in scope.
fn emit_call(
    fcx: &mut FnCtx<'_, '_>,
    callee_text: &str,
    ret_ty: TypeId,
    param_tys: &[TypeId],
    variadic: bool,
    sig_prefix_override: Option<&[&str]>,
    args: &[NodeId],
) -> Value {
    let ret_llvm = llvm_type_of(&fcx.cgx.tu.types, ret_ty);

    let mut arg_texts = Vec::with_capacity(args.len());
    for (i, &arg) in args.iter().enumerate() {
        let arg_ty = fcx.cgx.tu.ast.get(arg).ty.unwrap_or(fcx.cgx.tu.types.int_ty);
        // A string literal passed directly as a call argument (the
        // overwhelmingly common case: a `printf`/`scanf` format string)
        // is referenced by its interned global's name directly rather
        // than through an intervening `getelementptr`/register, since the
        // callee only ever reads it as `i8*`.
        let arg_val = if let AstKind::StringLiteral(contents) = fcx.cgx.tu.ast.get(arg).kind.clone() {
            let name = fcx.cgx.intern_string(&contents);
            Value::rvalue("i8*", name)
        } else {
            codegen_expr_loaded(fcx, arg)
        };

        let target_ty = match param_tys.get(i) {
            Some(&param_ty) => param_ty,
            // The variadic tail: C's default argument promotions apply
            // (a `float` argument is always passed as `double`); every
            // other type passes through as its own type.
            None => {
                if matches!(
                    fcx.cgx.tu.types.get(fcx.cgx.tu.types.resolve(arg_ty)).kind,
                    TypeKind::Basic(BasicKind::Float)
                ) {
                    fcx.cgx.tu.types.double_ty
                } else {
                    arg_ty
                }
            }
        };
        let converted = convert_value(fcx, &arg_val.text, arg_ty, target_ty);
        let llvm_ty = llvm_type_of(&fcx.cgx.tu.types, target_ty);
        arg_texts.push(format!("{} {}", llvm_ty, converted));
    }

    let is_void = matches!(
        fcx.cgx.tu.types.get(fcx.cgx.tu.types.resolve(ret_ty)).kind,
        TypeKind::Basic(BasicKind::Void)
    );

    let call_sig = if variadic {
        let mut parts: Vec<String> = match sig_prefix_override {
            Some(prefix) => prefix.iter().map(|s| s.to_string()).collect(),
            None => param_tys.iter().map(|t| llvm_type_of(&fcx.cgx.tu.types, *t)).collect(),
        };
        parts.push("...".to_string());
        format!("{} ({})", ret_llvm, parts.join(", "))
    } else {
        ret_llvm.clone()
    };

    if is_void {
        fcx.sink
            .emit(format!("call {} {}({})", call_sig, callee_text, arg_texts.join(", ")));
        Value::rvalue("void", "")
    } else {
        let reg = fcx.new_reg();
        fcx.sink.emit(format!(
            "{} = call {} {}({})",
            reg,
            call_sig,
            callee_text,
            arg_texts.join(", ")
        ));
        Value::rvalue(ret_llvm, reg)
    }
}

/// Bitcasts a pointer-typed rvalue's operand text to `i8*`, the form
/// every LLVM memory intrinsic expects its pointer operands in.
fn bitcast_rvalue_ptr_to_i8(fcx: &mut FnCtx<'_, '_>, llvm_ty: &str, text: &str) -> String {
    if llvm_ty == "i8*" {
        return text.to_string();
    }
    let reg = fcx.new_reg();
    fcx.sink
        .emit(format!("{} = bitcast {} {} to i8*", reg, llvm_ty, text));
    reg
}

fn codegen_builtin_call(fcx: &mut FnCtx<'_, '_>, name: &str, args: &[NodeId]) -> Option<Value> {
    match name {
        "__builtin_va_start" => {
            let list_addr = codegen_expr(fcx, args[0]);
            let raw = bitcast_rvalue_ptr_to_i8(fcx, &format!("{}*", list_addr.llvm_ty), &list_addr.text);
            fcx.cgx.declare_external("llvm.va_start", "void @llvm.va_start(i8*)");
            fcx.sink.emit(format!("call void @llvm.va_start(i8* {})", raw));
            Some(Value::rvalue("void", ""))
        }
        "__builtin_va_end" => {
            let list_addr = codegen_expr(fcx, args[0]);
            let raw = bitcast_rvalue_ptr_to_i8(fcx, &format!("{}*", list_addr.llvm_ty), &list_addr.text);
            fcx.cgx.declare_external("llvm.va_end", "void @llvm.va_end(i8*)");
            fcx.sink.emit(format!("call void @llvm.va_end(i8* {})", raw));
            Some(Value::rvalue("void", ""))
        }
        "__builtin_memcpy" => {
            let dest = codegen_expr_loaded(fcx, args[0]);
            let src = codegen_expr_loaded(fcx, args[1]);
            let len_ty = fcx.cgx.tu.ast.get(args[2]).ty.unwrap_or(fcx.cgx.tu.types.long_ty);
            let len = codegen_expr_loaded(fcx, args[2]);
            let len_i64 = convert_value(fcx, &len.text, len_ty, fcx.cgx.tu.types.long_ty);

            let dest_i8 = bitcast_rvalue_ptr_to_i8(fcx, &dest.llvm_ty, &dest.text);
            let src_i8 = bitcast_rvalue_ptr_to_i8(fcx, &src.llvm_ty, &src.text);

            fcx.cgx.declare_external(
                "llvm.memcpy.p0i8.p0i8.i64",
                "void @llvm.memcpy.p0i8.p0i8.i64(i8*, i8*, i64, i1)",
            );
            fcx.sink.emit(format!(
                "call void @llvm.memcpy.p0i8.p0i8.i64(i8* {}, i8* {}, i64 {}, i1 false)",
                dest_i8, src_i8, len_i64
            ));
            Some(Value::rvalue(dest.llvm_ty, dest.text))
        }
        "__builtin_memset" => {
            let dest = codegen_expr_loaded(fcx, args[0]);
            let byte_ty = fcx.cgx.tu.ast.get(args[1]).ty.unwrap_or(fcx.cgx.tu.types.int_ty);
            let byte = codegen_expr_loaded(fcx, args[1]);
            let byte_i8 = convert_value(fcx, &byte.text, byte_ty, fcx.cgx.tu.types.char_ty);
            let len_ty = fcx.cgx.tu.ast.get(args[2]).ty.unwrap_or(fcx.cgx.tu.types.long_ty);
            let len = codegen_expr_loaded(fcx, args[2]);
            let len_i64 = convert_value(fcx, &len.text, len_ty, fcx.cgx.tu.types.long_ty);

            let dest_i8 = bitcast_rvalue_ptr_to_i8(fcx, &dest.llvm_ty, &dest.text);

            fcx.cgx.declare_external(
                "llvm.memset.p0i8.i64",
                "void @llvm.memset.p0i8.i64(i8*, i8, i64, i1)",
            );
            fcx.sink.emit(format!(
                "call void @llvm.memset.p0i8.i64(i8* {}, i8 {}, i64 {}, i1 false)",
                dest_i8, byte_i8, len_i64
            ));
            Some(Value::rvalue(dest.llvm_ty, dest.text))
        }
        _ => None,
    }
}
