//! The backend-agnostic value vocabulary the emitter passes around while
//! walking an expression tree.
//!
//! This plays the role `rustc_codegen_ssa`'s `OperandRef`/`PlaceRef` play
//! for a multi-backend compiler: a small descriptor that names what an
//! expression evaluated to without hard-coding LLVM's textual syntax into
//! every call site. Since this workspace only ever targets one backend,
//! the descriptor's `llvm_ty`/`text` fields are themselves LLVM-flavored
//! strings rather than a further layer of indirection — there is exactly
//! one backend, so a second abstraction layer over it would have no
//! second implementation to abstract over.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// An SSA register produced by a previous instruction, e.g. `%3`.
    Register,
    /// The address of a global variable or string constant, e.g. `@g`.
    Global,
    /// A literal constant operand, e.g. `5` or `null`.
    Constant,
    /// A function's address, used as a `call` callee operand.
    Function,
}

#[derive(Debug, Clone)]
/// The result of emitting one expression: its LLVM type text, the operand
/// text that refers to it, and whether `text` denotes an address that must
/// still be `load`ed to get the value (an lvalue) or the value itself.
pub struct Value {
    pub kind: ValueKind,
    /// The LLVM type of the value itself (not of the address, when
    /// `is_lvalue` is set) — e.g. `"i32"`, `"%struct.P*"`.
    pub llvm_ty: String,
    /// The operand text: a register name, a global name, or a literal.
    pub text: String,
    /// When true, `text` is a pointer to where the value lives (the
    /// result of evaluating an lvalue expression, e.g. a bare variable
    /// reference) and callers that want the value must emit a `load`.
    pub is_lvalue: bool,
}

impl Value {
    pub fn rvalue(llvm_ty: impl Into<String>, text: impl Into<String>) -> Self {
        Value { kind: ValueKind::Register, llvm_ty: llvm_ty.into(), text: text.into(), is_lvalue: false }
    }

    pub fn constant(llvm_ty: impl Into<String>, text: impl Into<String>) -> Self {
        Value { kind: ValueKind::Constant, llvm_ty: llvm_ty.into(), text: text.into(), is_lvalue: false }
    }

    pub fn lvalue(llvm_ty: impl Into<String>, address: impl Into<String>) -> Self {
        Value { kind: ValueKind::Register, llvm_ty: llvm_ty.into(), text: address.into(), is_lvalue: true }
    }

    pub fn global(llvm_ty: impl Into<String>, name: impl Into<String>) -> Self {
        Value { kind: ValueKind::Global, llvm_ty: llvm_ty.into(), text: name.into(), is_lvalue: false }
    }

    pub fn function(llvm_ty: impl Into<String>, name: impl Into<String>) -> Self {
        Value { kind: ValueKind::Function, llvm_ty: llvm_ty.into(), text: name.into(), is_lvalue: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lvalue_marks_text_as_an_address() {
        let v = Value::lvalue("i32", "%x.addr");
        assert!(v.is_lvalue);
        assert_eq!(v.text, "%x.addr");
    }

    #[test]
    fn rvalue_is_not_an_lvalue() {
        let v = Value::rvalue("i32", "%1");
        assert!(!v.is_lvalue);
    }
}
