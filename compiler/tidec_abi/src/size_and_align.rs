//! Byte-denominated size and alignment primitives shared by the type
//! system and the target data layout.

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
/// Specifies both the ABI-required and preferred alignment for a type, in bytes.
///
/// Both `abi` and `pref` are powers of two. The ABI alignment (`abi`) is the minimum
/// required alignment for correct program execution, as defined by the platform's ABI.
/// The preferred alignment (`pref`) is a potentially larger value that may yield better
/// performance on some architectures.
///
/// For example, in LLVM, if a preferred alignment is not explicitly set, it defaults to
/// the ABI alignment.
pub struct AbiAndPrefAlign {
    /// The alignment required by the ABI for this type.
    pub abi: Align,
    /// The preferred alignment for this type, which may be larger than the ABI alignment.
    pub pref: Align,
}

impl AbiAndPrefAlign {
    /// Creates a new `AbiAndPrefAlign` with the same ABI and preferred
    /// alignment (this compiler never distinguishes the two).
    pub fn new(abi: u64) -> Self {
        let abi = Align::from_bytes(abi).unwrap();
        Self { abi, pref: abi }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord)]
/// Size of a type in bytes.
pub struct Size(u64);

impl Size {
    pub const ZERO: Size = Size(0);

    pub const fn from_bytes(bytes: u64) -> Size {
        Size(bytes)
    }

    /// Rounds `bits` up to the next-higher byte boundary, if `bits` is
    /// not a multiple of 8.
    pub fn from_bits(bits: impl TryInto<u64>) -> Size {
        let bits = bits.try_into().ok().unwrap();
        Size(bits / 8 + (bits % 8).div_ceil(8))
    }

    /// Returns the size in bytes.
    pub fn bytes(&self) -> u64 {
        self.0
    }

    /// Rounds `self` up to the next multiple of `align`.
    pub fn align_to(self, align: Align) -> Size {
        let mask = align.bytes() - 1;
        Size((self.0 + mask) & !mask)
    }
}

impl std::ops::Add for Size {
    type Output = Size;
    fn add(self, rhs: Size) -> Size {
        Size(self.0 + rhs.0)
    }
}

impl std::ops::Mul<u64> for Size {
    type Output = Size;
    fn mul(self, rhs: u64) -> Size {
        Size(self.0 * rhs)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord)]
/// Alignment of a type in bytes (always a power of two, minimum 1).
pub struct Align(u64);

#[derive(Debug)]
pub enum AlignError {
    TooLarge(u64),
    NotPowerOfTwo(u64),
}

impl Align {
    pub const ONE: Align = Align(1);

    #[inline]
    pub fn from_bits(bits: u64) -> Result<Align, AlignError> {
        Align::from_bytes(Size::from_bits(bits).bytes())
    }

    #[inline]
    /// Creates an `Align` from a byte count. An alignment of 0 is treated
    /// like 1-byte alignment (e.g. an aggregate with no members).
    pub const fn from_bytes(align: u64) -> Result<Align, AlignError> {
        // To prevent overflow: when `align` is 0, `align.trailing_zeros()` is 64,
        // and `1 << 64` would panic.
        if align == 0 {
            return Ok(Align(1));
        }

        #[cold]
        const fn not_power_of_2(align: u64) -> AlignError {
            AlignError::NotPowerOfTwo(align)
        }

        #[cold]
        const fn too_large(align: u64) -> AlignError {
            AlignError::TooLarge(align)
        }

        let tz = align.trailing_zeros();
        if align != (1 << tz) {
            return Err(not_power_of_2(align));
        }

        if align > u64::MAX / 8 {
            return Err(too_large(align));
        }

        Ok(Align(align))
    }

    #[inline]
    pub const fn bytes(&self) -> u64 {
        self.0
    }

    /// The larger of `self` and `other`.
    pub fn max(self, other: Align) -> Align {
        if self.0 >= other.0 { self } else { other }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_to_rounds_up() {
        assert_eq!(
            Size::from_bytes(5).align_to(Align::from_bytes(4).unwrap()).bytes(),
            8
        );
        assert_eq!(
            Size::from_bytes(8).align_to(Align::from_bytes(4).unwrap()).bytes(),
            8
        );
    }

    #[test]
    fn zero_align_is_one() {
        assert_eq!(Align::from_bytes(0).unwrap().bytes(), 1);
    }

    #[test]
    fn non_power_of_two_rejected() {
        assert!(matches!(
            Align::from_bytes(3),
            Err(AlignError::NotPowerOfTwo(3))
        ));
    }
}
