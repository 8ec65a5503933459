use half::{bf16, f16};

/// Unsigned bit container a [radix key](RadixKey) is mapped to.
pub trait RadixBits:
    bytemuck::Pod + Ord + Eq + Send + Sync + core::fmt::Debug + core::hash::Hash + 'static
{
    /// Number of bits of the container.
    const BITS: u32;

    /// Extract the digit of `width` bits starting at bit `shift`.
    fn digit(self, shift: u32, width: u32) -> usize;

    /// Keep only the bits `[begin, end)`, shifted down to bit zero.
    fn masked(self, begin: u32, end: u32) -> Self;
}

macro_rules! impl_radix_bits {
    ($($ty:ty),*) => {
        $(
            impl RadixBits for $ty {
                const BITS: u32 = <$ty>::BITS;

                #[inline]
                fn digit(self, shift: u32, width: u32) -> usize {
                    (self.masked(shift, shift + width)) as usize
                }

                #[inline]
                fn masked(self, begin: u32, end: u32) -> Self {
                    if begin >= end || begin >= Self::BITS {
                        return 0;
                    }

                    let width = end.min(Self::BITS) - begin;
                    let shifted = self >> begin;

                    if width >= Self::BITS {
                        shifted
                    } else {
                        shifted & ((1 << width) - 1)
                    }
                }
            }
        )*
    };
}

impl_radix_bits!(u8, u16, u32, u64);

/// A key type that can be sorted bit-wise.
///
/// The mapping to [RadixKey::Bits] is order preserving: comparing two mapped keys as unsigned
/// integers gives the same result as comparing the original keys numerically. Signed integers
/// flip their sign bit. Floating-point keys toggle the sign bit when non-negative and invert
/// every bit when negative, which places `-0.0` right before `+0.0`.
pub trait RadixKey: Copy + Send + Sync + core::fmt::Debug + 'static {
    /// The unsigned container with the same width as the key.
    type Bits: RadixBits;

    /// Map the key to its order-preserving unsigned representation.
    fn to_radix(self) -> Self::Bits;

    /// Inverse of [RadixKey::to_radix].
    fn from_radix(bits: Self::Bits) -> Self;

    /// Number of bits participating in a full-width sort.
    fn key_bits() -> u32 {
        <Self::Bits as RadixBits>::BITS
    }
}

macro_rules! impl_radix_unsigned {
    ($($ty:ty),*) => {
        $(
            impl RadixKey for $ty {
                type Bits = $ty;

                #[inline]
                fn to_radix(self) -> Self::Bits {
                    self
                }

                #[inline]
                fn from_radix(bits: Self::Bits) -> Self {
                    bits
                }
            }
        )*
    };
}

macro_rules! impl_radix_signed {
    ($($ty:ty => $bits:ty),*) => {
        $(
            impl RadixKey for $ty {
                type Bits = $bits;

                #[inline]
                fn to_radix(self) -> Self::Bits {
                    (self as $bits) ^ (1 << (<$bits>::BITS - 1))
                }

                #[inline]
                fn from_radix(bits: Self::Bits) -> Self {
                    (bits ^ (1 << (<$bits>::BITS - 1))) as $ty
                }
            }
        )*
    };
}

macro_rules! impl_radix_float {
    ($($ty:ty => $bits:ty),*) => {
        $(
            impl RadixKey for $ty {
                type Bits = $bits;

                #[inline]
                fn to_radix(self) -> Self::Bits {
                    let high_bit: $bits = 1 << (<$bits>::BITS - 1);
                    let bits = self.to_bits();
                    let mask = if bits & high_bit != 0 { <$bits>::MAX } else { high_bit };

                    bits ^ mask
                }

                #[inline]
                fn from_radix(bits: Self::Bits) -> Self {
                    let high_bit: $bits = 1 << (<$bits>::BITS - 1);
                    let mask = if bits & high_bit != 0 { high_bit } else { <$bits>::MAX };

                    <$ty>::from_bits(bits ^ mask)
                }
            }
        )*
    };
}

impl_radix_unsigned!(u8, u16, u32, u64);
impl_radix_signed!(i8 => u8, i16 => u16, i32 => u32, i64 => u64);
impl_radix_float!(f32 => u32, f64 => u64, f16 => u16, bf16 => u16);
