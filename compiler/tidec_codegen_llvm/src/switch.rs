//! `switch` lowering.
//!
//! This does not use LLVM's `switch` instruction; it lowers to a sequential
//! chain of `icmp eq` + conditional branch checks, one per `case`, falling
//! through to `default` (or straight past the switch, if there is none) when
//! no case matches. This mirrors the original C compiler's case-label
//! backpatch approach more directly than a single `switch` instruction
//! would, and keeps fallthrough between cases (no `break`) expressible as
//! an ordinary unconditional branch into the next case's block.

use tidec_codegen_ssa::llvm_ty::llvm_type_of;
use tidec_lir::ast::AstKind;
use tidec_lir::NodeId;

use crate::access::load_if_lvalue;
use crate::entry::FnCtx;
use crate::expr::codegen_expr;
use crate::statements::codegen_statement;

/// One `case`/`default` arm: `value == None` marks the `default` arm.
struct Arm {
    value: Option<i64>,
    body: NodeId,
}

fn collect_arms(fcx: &FnCtx<'_, '_>, body: NodeId) -> Vec<Arm> {
    let statements = match &fcx.cgx.tu.ast.get(body).kind {
        AstKind::CompoundStatement(statements) | AstKind::StatementList(statements) => {
            statements.clone()
        }
        _ => panic!("switch body must be a compound statement"),
    };

    statements
        .into_iter()
        .map(|stmt| match &fcx.cgx.tu.ast.get(stmt).kind {
            AstKind::Case { value, body } => Arm { value: Some(*value), body: *body },
            AstKind::Default { body } => Arm { value: None, body: *body },
            _ => panic!("switch body may only contain `case`/`default` labels"),
        })
        .collect()
}

pub fn codegen_switch(fcx: &mut FnCtx<'_, '_>, scrutinee: NodeId, body: NodeId) -> bool {
    let arms = collect_arms(fcx, body);

    let scrutinee_ty = fcx
        .cgx
        .tu
        .ast
        .get(scrutinee)
        .ty
        .unwrap_or(fcx.cgx.tu.types.int_ty);
    let scrutinee_val = codegen_expr(fcx, scrutinee);
    let scrutinee_val = load_if_lvalue(fcx, scrutinee_val, scrutinee_ty);
    let llvm_ty = llvm_type_of(&fcx.cgx.tu.types, scrutinee_ty);

    let end_label = fcx.new_label("switch.end");
    let default_label = fcx.new_label("switch.default");
    let has_default = arms.iter().any(|a| a.value.is_none());
    let fallback_label = if has_default { default_label.clone() } else { end_label.clone() };

    let case_labels: Vec<Option<String>> = arms
        .iter()
        .map(|a| a.value.map(|_| fcx.new_label("switch.case")))
        .collect();
    let check_labels: Vec<String> = arms
        .iter()
        .filter(|a| a.value.is_some())
        .map(|_| fcx.new_label("switch.check"))
        .collect();

    let value_indices: Vec<usize> = arms
        .iter()
        .enumerate()
        .filter(|(_, a)| a.value.is_some())
        .map(|(i, _)| i)
        .collect();

    if value_indices.is_empty() {
        fcx.sink.emit(format!("br label %{}", fallback_label));
    } else {
        fcx.sink.emit(format!("br label %{}", check_labels[0]));
    }

    for (chain_idx, &arm_idx) in value_indices.iter().enumerate() {
        fcx.sink.emit_raw(format!("{}:", check_labels[chain_idx]));
        let cmp = fcx.new_reg();
        fcx.sink.emit(format!(
            "{} = icmp eq {} {}, {}",
            cmp,
            llvm_ty,
            scrutinee_val,
            arms[arm_idx].value.unwrap()
        ));
        let next = check_labels.get(chain_idx + 1).cloned().unwrap_or_else(|| fallback_label.clone());
        fcx.sink.emit(format!(
            "br i1 {}, label %{}, label %{}",
            cmp,
            case_labels[arm_idx].as_ref().unwrap(),
            next
        ));
    }

    fcx.break_labels.push(end_label.clone());

    let mut fell_through = false;
    for (i, arm) in arms.iter().enumerate() {
        let label = match &arm.value {
            Some(_) => case_labels[i].clone().unwrap(),
            None => default_label.clone(),
        };
        fcx.sink.emit_raw(format!("{}:", label));
        let terminated = codegen_statement(fcx, arm.body);
        if !terminated {
            let next_label = arms
                .get(i + 1)
                .map(|next_arm| match &next_arm.value {
                    Some(_) => case_labels[i + 1].clone().unwrap(),
                    None => default_label.clone(),
                })
                .unwrap_or_else(|| end_label.clone());
            fcx.sink.emit(format!("br label %{}", next_label));
            fell_through = true;
        }
    }
    let _ = fell_through;

    if !has_default {
        fcx.sink.emit_raw(format!("{}:", default_label));
        fcx.sink.emit(format!("br label %{}", end_label));
    }

    fcx.break_labels.pop();

    fcx.sink.emit_raw(format!("{}:", end_label));
    false
}
