//! Size, alignment, and calling-convention primitives shared by the type
//! system and the LLVM emitter.
//!
//! Every type in the C subset this compiler accepts has a fixed size and
//! alignment (there is no target-dependent struct packing beyond the
//! ordinary C alignment rules), so this crate's job is narrower than a
//! full multi-backend ABI layer: one target ([`target::LirTarget`]), one
//! set of layout rules ([`layout::LayoutCtx`]), one calling convention
//! ([`calling_convention`]).

pub mod calling_convention;
pub mod layout;
pub mod size_and_align;
pub mod target;

pub use calling_convention::{ArgAbi, FnAbi, PassMode};
pub use layout::{BackendRepr, FieldLayout, Layout, LayoutCtx, TyAndLayout};
pub use size_and_align::{AbiAndPrefAlign, Align, AlignError, Size};
pub use target::{AddressSpace, Endianess, LirTarget, TargetDataLayout, TargetTriple};
