//! Lowers one statement-level AST node. Returns `true` when the statement
//! unconditionally transfers control away (a `return`/`break`/`continue`,
//! or an `if`/loop whose every path does so) so callers know not to emit a
//! fallthrough branch into unreachable code.

use tidec_lir::ast::AstKind;
use tidec_lir::NodeId;

use crate::entry::FnCtx;
use crate::expr::{codegen_expr, codegen_expr_as_i1};

pub fn codegen_statement(fcx: &mut FnCtx<'_, '_>, node: NodeId) -> bool {
    let kind = fcx.cgx.tu.ast.get(node).kind.clone();
    match kind {
        AstKind::CompoundStatement(statements) => {
            for stmt in statements {
                if codegen_statement(fcx, stmt) {
                    return true;
                }
            }
            false
        }

        AstKind::StatementList(statements) => {
            for stmt in statements {
                if codegen_statement(fcx, stmt) {
                    return true;
                }
            }
            false
        }

        AstKind::ExprStatement(expr) => {
            codegen_expr(fcx, expr);
            false
        }

        AstKind::Declaration { name, ty, init } => {
            let addr = fcx.declare_local(&name, ty);
            if let Some(init) = init {
                let value = codegen_expr(fcx, init);
                let loaded = crate::access::load_if_lvalue(fcx, value, ty);
                let llvm_ty = tidec_codegen_ssa::llvm_ty::llvm_type_of(&fcx.cgx.tu.types, ty);
                fcx.sink.emit(format!(
                    "store {} {}, {}* {}",
                    llvm_ty, loaded, llvm_ty, addr
                ));
            }
            false
        }

        AstKind::If { cond, then_branch, else_branch } => {
            let then_label = fcx.new_label("if.then");
            let merge_label = fcx.new_label("if.end");
            let cond_val = codegen_expr_as_i1(fcx, cond);

            match else_branch {
                Some(else_branch) => {
                    let else_label = fcx.new_label("if.else");
                    fcx.sink.emit(format!(
                        "br i1 {}, label %{}, label %{}",
                        cond_val, then_label, else_label
                    ));

                    fcx.sink.emit_raw(format!("{}:", then_label));
                    let then_terminated = codegen_statement(fcx, then_branch);
                    if !then_terminated {
                        fcx.sink.emit(format!("br label %{}", merge_label));
                    }

                    fcx.sink.emit_raw(format!("{}:", else_label));
                    let else_terminated = codegen_statement(fcx, else_branch);
                    if !else_terminated {
                        fcx.sink.emit(format!("br label %{}", merge_label));
                    }

                    if then_terminated && else_terminated {
                        true
                    } else {
                        fcx.sink.emit_raw(format!("{}:", merge_label));
                        false
                    }
                }
                None => {
                    fcx.sink.emit(format!(
                        "br i1 {}, label %{}, label %{}",
                        cond_val, then_label, merge_label
                    ));
                    fcx.sink.emit_raw(format!("{}:", then_label));
                    let then_terminated = codegen_statement(fcx, then_branch);
                    if !then_terminated {
                        fcx.sink.emit(format!("br label %{}", merge_label));
                    }
                    fcx.sink.emit_raw(format!("{}:", merge_label));
                    false
                }
            }
        }

        AstKind::While { cond, body } => {
            let cond_label = fcx.new_label("while.cond");
            let body_label = fcx.new_label("while.body");
            let end_label = fcx.new_label("while.end");

            fcx.sink.emit(format!("br label %{}", cond_label));
            fcx.sink.emit_raw(format!("{}:", cond_label));
            let cond_val = codegen_expr_as_i1(fcx, cond);
            fcx.sink.emit(format!(
                "br i1 {}, label %{}, label %{}",
                cond_val, body_label, end_label
            ));

            fcx.sink.emit_raw(format!("{}:", body_label));
            fcx.break_labels.push(end_label.clone());
            fcx.continue_labels.push(cond_label.clone());
            let body_terminated = codegen_statement(fcx, body);
            fcx.break_labels.pop();
            fcx.continue_labels.pop();
            if !body_terminated {
                fcx.sink.emit(format!("br label %{}", cond_label));
            }

            fcx.sink.emit_raw(format!("{}:", end_label));
            false
        }

        AstKind::DoWhile { body, cond } => {
            let body_label = fcx.new_label("do.body");
            let cond_label = fcx.new_label("do.cond");
            let end_label = fcx.new_label("do.end");

            fcx.sink.emit(format!("br label %{}", body_label));
            fcx.sink.emit_raw(format!("{}:", body_label));
            fcx.break_labels.push(end_label.clone());
            fcx.continue_labels.push(cond_label.clone());
            let body_terminated = codegen_statement(fcx, body);
            fcx.break_labels.pop();
            fcx.continue_labels.pop();
            if !body_terminated {
                fcx.sink.emit(format!("br label %{}", cond_label));
            }

            fcx.sink.emit_raw(format!("{}:", cond_label));
            let cond_val = codegen_expr_as_i1(fcx, cond);
            fcx.sink.emit(format!(
                "br i1 {}, label %{}, label %{}",
                cond_val, body_label, end_label
            ));

            fcx.sink.emit_raw(format!("{}:", end_label));
            false
        }

        AstKind::For { init, cond, step, body } => {
            if let Some(init) = init {
                // `init` is either a `Declaration` or an `ExprStatement`
                // produced by the parser; both are ordinary statements.
                codegen_statement(fcx, init);
            }

            let cond_label = fcx.new_label("for_cond");
            let body_label = fcx.new_label("for_body");
            let step_label = fcx.new_label("for_incr");
            let end_label = fcx.new_label("for_end");

            fcx.sink.emit(format!("br label %{}", cond_label));
            fcx.sink.emit_raw(format!("{}:", cond_label));
            match cond {
                Some(cond) => {
                    let cond_val = codegen_expr_as_i1(fcx, cond);
                    fcx.sink.emit(format!(
                        "br i1 {}, label %{}, label %{}",
                        cond_val, body_label, end_label
                    ));
                }
                None => {
                    fcx.sink.emit(format!("br label %{}", body_label));
                }
            }

            fcx.sink.emit_raw(format!("{}:", body_label));
            fcx.break_labels.push(end_label.clone());
            fcx.continue_labels.push(step_label.clone());
            let body_terminated = codegen_statement(fcx, body);
            fcx.break_labels.pop();
            fcx.continue_labels.pop();
            if !body_terminated {
                fcx.sink.emit(format!("br label %{}", step_label));
            }

            fcx.sink.emit_raw(format!("{}:", step_label));
            if let Some(step) = step {
                codegen_expr(fcx, step);
            }
            fcx.sink.emit(format!("br label %{}", cond_label));

            fcx.sink.emit_raw(format!("{}:", end_label));
            false
        }

        AstKind::Switch { scrutinee, body } => crate::switch::codegen_switch(fcx, scrutinee, body),

        AstKind::Case { .. } | AstKind::Default { .. } => {
            panic!("case/default label outside of a switch body")
        }

        AstKind::Return(value) => {
            match value {
                Some(expr) => {
                    let expr_ty = fcx.cgx.tu.ast.get(expr).ty.unwrap_or(fcx.cgx.tu.types.int_ty);
                    let value = codegen_expr(fcx, expr);
                    let loaded = crate::access::load_if_lvalue(fcx, value, expr_ty);
                    let ret_ty = fcx.ret_ty;
                    let converted = crate::casts::convert_value(fcx, &loaded, expr_ty, ret_ty);
                    let llvm_ty = tidec_codegen_ssa::llvm_ty::llvm_type_of(&fcx.cgx.tu.types, ret_ty);
                    fcx.sink.emit(format!("ret {} {}", llvm_ty, converted));
                }
                None => fcx.sink.emit("ret void"),
            }
            true
        }

        AstKind::Break => {
            let label = fcx
                .break_labels
                .last()
                .cloned()
                .expect("`break` outside of a loop or switch");
            fcx.sink.emit(format!("br label %{}", label));
            true
        }

        AstKind::Continue => {
            let label = fcx
                .continue_labels
                .last()
                .cloned()
                .expect("`continue` outside of a loop");
            fcx.sink.emit(format!("br label %{}", label));
            true
        }

        AstKind::Goto(label) => {
            fcx.sink.emit(format!("br label %user_label_{}", label));
            true
        }

        // A label's own block is entered by falling through from the
        // preceding statement as well as by any `goto` that targets it, so
        // the preceding block is always closed off with an explicit branch
        // first.
        AstKind::Label(label) => {
            let name = format!("user_label_{}", label);
            fcx.sink.emit(format!("br label %{}", name));
            fcx.sink.emit_raw(format!("{}:", name));
            false
        }

        other => panic!("{:?} is not a statement", other),
    }
}
