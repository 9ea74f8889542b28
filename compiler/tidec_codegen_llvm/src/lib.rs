//! Emits one translation unit's LLVM IR text: struct/union type
//! definitions, global variables, and function bodies, in that fixed
//! order (see [`context::CodegenCtx::finish`]).

pub mod access;
pub mod binops;
pub mod calls;
pub mod casts;
pub mod context;
pub mod entry;
pub mod expr;
pub mod sink;
pub mod statements;
pub mod switch;
pub mod ternary;
pub mod unops;

use tidec_codegen_ssa::llvm_ty::llvm_type_of;
use tidec_lir::ast::AstKind;
use tidec_lir::symbol::StorageClass;
use tidec_lir::types::{TypeId, TypeKind};
use tidec_lir::{NodeId, TranslationUnit};

use context::CodegenCtx;

/// Compiles a fully parsed and type-checked translation unit to its LLVM
/// IR text.
pub fn compile_translation_unit(tu: &TranslationUnit) -> String {
    let mut cgx = CodegenCtx::new(tu);

    // These four intrinsics are always declared in the module preamble,
    // whether or not this translation unit happens to use them.
    cgx.declare_external("llvm.va_start", "void @llvm.va_start(i8*)");
    cgx.declare_external("llvm.va_end", "void @llvm.va_end(i8*)");
    cgx.declare_external(
        "llvm.memcpy.p0i8.p0i8.i64",
        "void @llvm.memcpy.p0i8.p0i8.i64(i8*, i8*, i64, i1)",
    );
    cgx.declare_external("llvm.memset.p0i8.i64", "void @llvm.memset.p0i8.i64(i8*, i8, i64, i1)");

    for &ty in tu.symbols.all_aggregates() {
        emit_aggregate_type(&mut cgx, ty);
    }

    let root = tu.root.expect("translation unit has no parsed root");
    let top_level = match &tu.ast.get(root).kind {
        AstKind::StatementList(items) | AstKind::CompoundStatement(items) => items.clone(),
        other => panic!("translation unit root must be a statement list, found {:?}", other),
    };

    for item in top_level {
        match tu.ast.get(item).kind.clone() {
            AstKind::FunctionDefinition { name, ty, params, body } => {
                entry::emit_function(&mut cgx, &name, ty, &params, body);
            }
            AstKind::Declaration { name, ty, init } => {
                emit_global(&mut cgx, &name, ty, init);
            }
            other => panic!("{:?} cannot appear at file scope", other),
        }
    }

    cgx.finish()
}

fn emit_aggregate_type(cgx: &mut CodegenCtx<'_>, ty: TypeId) {
    match &cgx.tu.types.get(ty).kind {
        TypeKind::Struct { tag, fields: Some(fields) } => {
            let field_list: Vec<String> =
                fields.iter().map(|f| llvm_type_of(&cgx.tu.types, f.ty)).collect();
            cgx.push_struct_type(format!("%struct.{} = type {{ {} }}", tag, field_list.join(", ")));
        }
        TypeKind::Struct { tag, fields: None } => {
            cgx.push_struct_type(format!("%struct.{} = type opaque", tag));
        }
        TypeKind::Union { tag, fields: Some(_) } => {
            // A union's LLVM representation is a byte blob the size of its
            // largest member; `access::codegen_member` bitcasts it to the
            // member's real type on every access rather than modeling the
            // overlay as an LLVM type itself.
            let size = cgx.tu.types.size_of(ty).max(1);
            cgx.push_struct_type(format!("%union.{} = type {{ [{} x i8] }}", tag, size));
        }
        TypeKind::Union { tag, fields: None } => {
            cgx.push_struct_type(format!("%union.{} = type opaque", tag));
        }
        _ => {}
    }
}

fn emit_global(cgx: &mut CodegenCtx<'_>, name: &str, ty: TypeId, init: Option<NodeId>) {
    let storage = cgx.tu.symbols.lookup(name).map(|s| s.storage);
    if storage == Some(StorageClass::Extern) && init.is_none() {
        // Declared but not defined here; assumed to be defined in
        // whichever translation unit actually holds it.
        return;
    }

    let llvm_ty = llvm_type_of(&cgx.tu.types, ty);
    let initializer = match init {
        Some(node) if matches!(cgx.tu.ast.get(node).kind, AstKind::InitializerList(_)) => {
            let AstKind::InitializerList(elements) = cgx.tu.ast.get(node).kind.clone() else {
                unreachable!()
            };
            render_initializer_list(cgx, ty, &elements)
        }
        Some(node) => cgx
            .tu
            .ast
            .evaluate_constant(node)
            .map(|v| v.to_string())
            .unwrap_or_else(|| "zeroinitializer".to_string()),
        None => "zeroinitializer".to_string(),
    };
    let linkage = if storage == Some(StorageClass::Static) { "internal " } else { "" };
    cgx.push_global(format!("@{} = {}global {} {}", name, linkage, llvm_ty, initializer));
}

/// Renders a brace initializer list as the bracketed/braced constant-value
/// text LLVM expects *after* the aggregate's own type (the caller already
/// wrote that type once, either as the global's declared type or as the
/// `ElemT` half of a `ElemT value` pair one level up, so this never repeats
/// it). An array initializer shorter than the array's declared length is
/// zero-padded, matching C's brace-initializer rule.
fn render_initializer_list(cgx: &CodegenCtx<'_>, ty: TypeId, elements: &[NodeId]) -> String {
    let resolved = cgx.tu.types.resolve(ty);
    match cgx.tu.types.get(resolved).kind.clone() {
        TypeKind::Array(elem, count) => {
            let elem_llvm = llvm_type_of(&cgx.tu.types, elem);
            let len = count.map(|c| c as usize).unwrap_or(elements.len());
            let parts: Vec<String> = (0..len)
                .map(|i| match elements.get(i) {
                    Some(&node) => format!("{} {}", elem_llvm, render_initializer_element(cgx, elem, node)),
                    None => format!("{} 0", elem_llvm),
                })
                .collect();
            format!("[{}]", parts.join(", "))
        }
        TypeKind::Struct { fields: Some(fields), .. } => {
            let parts: Vec<String> = fields
                .iter()
                .enumerate()
                .map(|(i, field)| {
                    let field_llvm = llvm_type_of(&cgx.tu.types, field.ty);
                    match elements.get(i) {
                        Some(&node) => {
                            format!("{} {}", field_llvm, render_initializer_element(cgx, field.ty, node))
                        }
                        None => format!("{} 0", field_llvm),
                    }
                })
                .collect();
            format!("{{ {} }}", parts.join(", "))
        }
        // Any other target (a scalar brace-initialized with one element,
        // e.g. `int x = {5};`) just takes that element's own value.
        _ => elements
            .first()
            .and_then(|&node| cgx.tu.ast.evaluate_constant(node))
            .map(|v| v.to_string())
            .unwrap_or_else(|| "0".to_string()),
    }
}

fn render_initializer_element(cgx: &CodegenCtx<'_>, elem_ty: TypeId, node: NodeId) -> String {
    if let AstKind::InitializerList(nested) = cgx.tu.ast.get(node).kind.clone() {
        return render_initializer_list(cgx, elem_ty, &nested);
    }
    cgx.tu
        .ast
        .evaluate_constant(node)
        .map(|v| v.to_string())
        .unwrap_or_else(|| "0".to_string())
}
