//! Backend-agnostic vocabulary shared by the emitter: the value descriptor
//! expression codegen passes around, and the LLVM type-text mapping from
//! the C-subset type system.

pub mod value;
pub mod llvm_ty;

pub use value::{Value, ValueKind};
pub use llvm_ty::llvm_type_of;
