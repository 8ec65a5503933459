use crate::{CastFrom, NumericLimits};
use half::{bf16, f16};

/// Scalar types accepted by the sum reducers.
///
/// Sums accumulate in [Numeric::Accumulator], which is the type itself except for the 16-bit
/// float formats: those accumulate in `f32` and are narrowed only when the result is stored.
/// Integer sums wrap on overflow.
pub trait Numeric:
    bytemuck::Pod
    + PartialOrd
    + NumericLimits
    + Send
    + Sync
    + core::fmt::Debug
    + 'static
{
    /// Type intermediate sums are computed in.
    type Accumulator: Numeric + CastFrom<Self>;

    /// The additive identity.
    fn zero() -> Self;

    /// Sum of two values, wrapping for integers.
    fn add(self, rhs: Self) -> Self;
}

macro_rules! impl_numeric_int {
    ($($ty:ty),*) => {
        $(
            impl Numeric for $ty {
                type Accumulator = $ty;

                fn zero() -> Self {
                    0
                }

                #[inline]
                fn add(self, rhs: Self) -> Self {
                    self.wrapping_add(rhs)
                }
            }
        )*
    };
}

macro_rules! impl_numeric_float {
    ($($ty:ty => $acc:ty),*) => {
        $(
            impl Numeric for $ty {
                type Accumulator = $acc;

                fn zero() -> Self {
                    <$ty>::from_f32(0.0)
                }

                #[inline]
                fn add(self, rhs: Self) -> Self {
                    self + rhs
                }
            }
        )*
    };
}

impl_numeric_int!(u8, u16, u32, u64, i8, i16, i32, i64);
impl_numeric_float!(f16 => f32, bf16 => f32);

impl Numeric for f32 {
    type Accumulator = f32;

    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn add(self, rhs: Self) -> Self {
        self + rhs
    }
}

impl Numeric for f64 {
    type Accumulator = f64;

    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn add(self, rhs: Self) -> Self {
        self + rhs
    }
}
