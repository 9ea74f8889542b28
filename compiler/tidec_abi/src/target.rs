use tracing::{info, instrument};

use crate::size_and_align::{AbiAndPrefAlign, Size};

#[derive(Debug)]
/// Describes the target configuration used during code generation.
///
/// This struct encapsulates the data layout and optional target triple used
/// to drive the header lines the emitter writes at the top of every module.
/// This compiler targets LLVM exclusively, so there is no backend
/// discriminator here, unlike the multi-backend layout the teacher's
/// workspace originally scaffolded for.
pub struct LirTarget {
    /// The data layout configuration for the target, including type alignments,
    /// pointer size, and other ABI-relevant properties.
    pub data_layout: TargetDataLayout,
    /// The target triple string identifying the target architecture, vendor,
    /// operating system, and environment.
    ///
    /// If this is `None`, the target triple will not be set in the emitted
    /// module, matching `clang`'s behavior when `-target` is not passed.
    pub target_triple: Option<TargetTriple>,
}

impl LirTarget {
    pub fn new() -> Self {
        LirTarget {
            data_layout: TargetDataLayout::new(),
            target_triple: Some(TargetTriple::new("x86_64", "unknown", "linux", "gnu", "")),
        }
    }

    pub fn data_layout_string(&self) -> String {
        self.data_layout.as_llvm_datalayout_string()
    }

    pub fn target_triple_string(&self) -> Option<String> {
        self.target_triple.as_ref().map(TargetTriple::into_llvm_triple_string)
    }
}

impl Default for LirTarget {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
/// Describes the target platform's data layout, including type alignments, pointer size,
/// and other ABI-related information used during code generation.
///
/// The default matches the fixed size/alignment table this compiler always
/// uses (a single LP64 Unix-like target): `bool`/`char` 1 byte, `short` 2,
/// `int`/`float` 4, `long`/`double`/pointers 8, `enum` 4.
pub struct TargetDataLayout {
    /// The endianness of the target architecture.
    pub endianess: Endianess,

    // Integer type alignments
    pub i1_align: AbiAndPrefAlign,
    pub i8_align: AbiAndPrefAlign,
    pub i16_align: AbiAndPrefAlign,
    pub i32_align: AbiAndPrefAlign,
    pub i64_align: AbiAndPrefAlign,

    // Floating point type alignments
    pub f32_align: AbiAndPrefAlign,
    pub f64_align: AbiAndPrefAlign,

    /// The size of pointers in bytes.
    pub pointer_size: u64,

    /// The ABI and preferred alignment for pointers.
    pub pointer_align: AbiAndPrefAlign,

    /// The minimum and preferred alignment for aggregate types (e.g., structs, arrays).
    pub aggregate_align: AbiAndPrefAlign,

    /// An identifier that specifies the address space that some operation
    /// should operate on. Special address spaces have an effect on code generation,
    /// depending on the target and the address spaces it implements.
    pub instruction_address_space: AddressSpace,
}

impl Default for TargetDataLayout {
    fn default() -> Self {
        TargetDataLayout {
            endianess: Endianess::Little,
            i1_align: AbiAndPrefAlign::new(1),
            i8_align: AbiAndPrefAlign::new(1),
            i16_align: AbiAndPrefAlign::new(2),
            i32_align: AbiAndPrefAlign::new(4),
            i64_align: AbiAndPrefAlign::new(8),
            f32_align: AbiAndPrefAlign::new(4),
            f64_align: AbiAndPrefAlign::new(8),
            pointer_size: 8,
            pointer_align: AbiAndPrefAlign::new(8),
            aggregate_align: AbiAndPrefAlign::new(1),
            instruction_address_space: AddressSpace::DATA,
        }
    }
}

impl TargetDataLayout {
    #[instrument]
    pub fn new() -> Self {
        let target_data_layout = TargetDataLayout::default();
        info!("TargetDataLayout created: {:?}", target_data_layout);
        target_data_layout
    }

    /// Produces the single `target datalayout = "..."` header line emitted at
    /// the top of every module, e.g.
    /// `e-m:e-p:64:64-i1:8-i8:8-i16:16-i32:32-i64:64-f32:32-f64:64-a:8`
    pub fn as_llvm_datalayout_string(&self) -> String {
        let format_align = |name: &str, align: &AbiAndPrefAlign| {
            format!("-{}:{}", name, align.abi.bytes() * 8)
        };

        let mut s = String::new();

        s.push(if self.endianess == Endianess::Little {
            'e'
        } else {
            'E'
        });

        s.push_str(&format!("-p:{}:{}", self.pointer_size * 8, self.pointer_align.abi.bytes() * 8));

        s.push_str(&format_align("i1", &self.i1_align));
        s.push_str(&format_align("i8", &self.i8_align));
        s.push_str(&format_align("i16", &self.i16_align));
        s.push_str(&format_align("i32", &self.i32_align));
        s.push_str(&format_align("i64", &self.i64_align));
        s.push_str(&format_align("f32", &self.f32_align));
        s.push_str(&format_align("f64", &self.f64_align));
        s.push_str(&format_align("a", &self.aggregate_align));

        s
    }
}

#[derive(Debug, PartialEq, Eq)]
/// The endianness of the target architecture.
pub enum Endianess {
    /// Little-endian.
    Little,
    /// Big-endian.
    Big,
}

#[derive(Debug)]
/// Represents a target triple, which uniquely identifies a compilation target.
///
/// Example: `"x86_64-unknown-linux-gnu"`
pub struct TargetTriple {
    pub arch: String,
    pub vendor: String,
    pub os: String,
    pub env: String,
    pub abi: String,
}

impl TargetTriple {
    #[tracing::instrument]
    pub fn new(arch: &str, vendor: &str, os: &str, env: &str, abi: &str) -> Self {
        TargetTriple {
            arch: arch.to_string(),
            vendor: vendor.to_string(),
            os: os.to_string(),
            env: env.to_string(),
            abi: abi.to_string(),
        }
    }

    pub fn into_llvm_triple_string(&self) -> String {
        if self.abi.is_empty() {
            format!("{}-{}-{}-{}", self.arch, self.vendor, self.os, self.env)
        } else {
            format!(
                "{}-{}-{}-{}-{}",
                self.arch, self.vendor, self.os, self.env, self.abi
            )
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressSpace {
    /// The default address space.
    DATA = 0,
}

impl From<&AddressSpace> for u32 {
    fn from(addr_space: &AddressSpace) -> Self {
        match *addr_space {
            AddressSpace::DATA => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datalayout_string_matches_fixed_table() {
        let dl = TargetDataLayout::new();
        let s = dl.as_llvm_datalayout_string();
        assert!(s.starts_with('e'));
        assert!(s.contains("-p:64:64"));
        assert!(s.contains("-i64:64"));
        assert!(s.contains("-i32:32"));
    }

    #[test]
    fn default_triple_is_x86_64_linux_gnu() {
        let target = LirTarget::new();
        assert_eq!(
            target.target_triple_string().unwrap(),
            "x86_64-unknown-linux-gnu"
        );
    }
}
