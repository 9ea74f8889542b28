//! Per-function emission: the prologue (parameter allocas), orchestrating
//! the statement walk over the function body, and the epilogue (implicit
//! terminator when control falls off the end of the function).

use std::collections::HashMap;

use tidec_codegen_ssa::llvm_ty::llvm_type_of;
use tidec_lir::types::{BasicKind, TypeId, TypeKind};
use tidec_lir::NodeId;
use tracing::instrument;

use crate::context::CodegenCtx;
use crate::sink::Sink;
use crate::statements::codegen_statement;

/// Per-function mutable state: the register/label counters, the map from
/// local variable name to its stack-slot address and type, and the
/// current loop/switch's `break`/`continue` targets.
pub struct FnCtx<'a, 'b> {
    pub cgx: &'b mut CodegenCtx<'a>,
    pub sink: Sink,
    next_reg: u32,
    next_label: u32,
    pub locals: HashMap<String, (String, TypeId)>,
    pub ret_ty: TypeId,
    pub break_labels: Vec<String>,
    pub continue_labels: Vec<String>,
}

impl<'a, 'b> FnCtx<'a, 'b> {
    pub fn new(cgx: &'b mut CodegenCtx<'a>, ret_ty: TypeId) -> Self {
        FnCtx {
            cgx,
            sink: Sink::new(),
            next_reg: 1,
            next_label: 0,
            locals: HashMap::new(),
            ret_ty,
            break_labels: Vec::new(),
            continue_labels: Vec::new(),
        }
    }

    pub fn new_reg(&mut self) -> String {
        let reg = format!("%{}", self.next_reg);
        self.next_reg += 1;
        reg
    }

    pub fn new_label(&mut self, prefix: &str) -> String {
        let label = format!("{}.{}", prefix, self.next_label);
        self.next_label += 1;
        label
    }

    /// Allocates a stack slot for a local of type `ty`, registers it under
    /// `name`, and returns the address register it was given.
    pub fn declare_local(&mut self, name: &str, ty: TypeId) -> String {
        let reg = self.new_reg();
        let llvm_ty = llvm_type_of(&self.cgx.tu.types, ty);
        self.sink
            .emit_alloca(format!("{} = alloca {}", reg, llvm_ty));
        self.locals.insert(name.to_string(), (reg.clone(), ty));
        reg
    }

    pub fn lookup_local(&self, name: &str) -> Option<&(String, TypeId)> {
        self.locals.get(name)
    }
}

/// Emits one function definition: `define <ret> @<name>(<params>) { ... }`.
#[instrument(level = "debug", skip(cgx, body), fields(function = %name))]
pub fn emit_function(
    cgx: &mut CodegenCtx<'_>,
    name: &str,
    ty: TypeId,
    param_names: &[String],
    body: NodeId,
) {
    let (param_tys, ret_ty, variadic) = match &cgx.tu.types.get(ty).kind {
        TypeKind::Function { params, ret, variadic, .. } => (params.clone(), *ret, *variadic),
        _ => panic!("emit_function called with a non-function type"),
    };

    let ret_llvm_ty = llvm_type_of(&cgx.tu.types, ret_ty);
    let param_list: Vec<String> = param_tys
        .iter()
        .zip(param_names.iter())
        .enumerate()
        .map(|(i, (ty, _))| format!("{} %p{}", llvm_type_of(&cgx.tu.types, *ty), i))
        .collect();
    let mut signature = format!("define {} @{}({}", ret_llvm_ty, name, param_list.join(", "));
    if variadic {
        if !param_list.is_empty() {
            signature.push_str(", ");
        }
        signature.push_str("...");
    }
    signature.push_str(") {");

    let mut fcx = FnCtx::new(cgx, ret_ty);
    fcx.sink.emit_raw("entry:");

    for (i, (param_ty, param_name)) in param_tys.iter().zip(param_names.iter()).enumerate() {
        let addr = fcx.declare_local(param_name, *param_ty);
        let llvm_ty = llvm_type_of(&fcx.cgx.tu.types, *param_ty);
        fcx.sink
            .emit(format!("store {} %p{}, {}* {}", llvm_ty, i, llvm_ty, addr));
    }

    let terminated = codegen_statement(&mut fcx, body);

    if !terminated {
        if cgx_void(&fcx, ret_ty) {
            fcx.sink.emit("ret void");
        } else {
            // Control can fall off the end of a non-void function with no
            // `return` (a source-level bug, but not this compiler's to
            // diagnose); a zero/null of the declared return type keeps the
            // emitted IR well-formed instead of reaching for `unreachable`.
            let llvm_ty = llvm_type_of(&fcx.cgx.tu.types, ret_ty);
            let zero = zero_value_text(&fcx, ret_ty);
            fcx.sink.emit(format!("ret {} {}", llvm_ty, zero));
        }
    }

    let body_text = fcx.sink.finish();
    cgx.push_function(format!("{}\n{}}}", signature, body_text));
}

fn cgx_void(fcx: &FnCtx<'_, '_>, ty: TypeId) -> bool {
    matches!(
        fcx.cgx.tu.types.get(ty).kind,
        TypeKind::Basic(tidec_lir::types::BasicKind::Void)
    )
}

/// The zero/null literal text for `ty`'s implicit fallback `ret`.
fn zero_value_text(fcx: &FnCtx<'_, '_>, ty: TypeId) -> String {
    let resolved = fcx.cgx.tu.types.resolve(ty);
    match fcx.cgx.tu.types.get(resolved).kind {
        TypeKind::Pointer(_) => "null".to_string(),
        TypeKind::Basic(BasicKind::Float) | TypeKind::Basic(BasicKind::Double) => {
            format!("{:?}", 0.0f64)
        }
        TypeKind::Struct { .. } | TypeKind::Union { .. } | TypeKind::Array(..) => {
            "zeroinitializer".to_string()
        }
        _ => "0".to_string(),
    }
}
