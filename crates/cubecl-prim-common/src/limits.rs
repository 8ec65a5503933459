use half::{bf16, f16};

/// The algebraic extremes of a scalar type.
///
/// `lowest` and `max_value` are the representable bounds for integers, and the largest finite
/// magnitudes for floating-point types (never subnormal, never infinity).
///
/// `lowest_special` and `max_special` are identical to the bounds for integers. For
/// floating-point types they are negative and positive infinity, so that any finite element
/// wins against them in a reduction.
pub trait NumericLimits: Copy {
    /// The smallest finite value of the type.
    fn lowest() -> Self;

    /// The largest finite value of the type.
    fn max_value() -> Self;

    /// The smallest value of the type, including special values.
    fn lowest_special() -> Self {
        Self::lowest()
    }

    /// The largest value of the type, including special values.
    fn max_special() -> Self {
        Self::max_value()
    }
}

macro_rules! impl_int_limits {
    ($($ty:ty),*) => {
        $(
            impl NumericLimits for $ty {
                fn lowest() -> Self {
                    <$ty>::MIN
                }

                fn max_value() -> Self {
                    <$ty>::MAX
                }
            }
        )*
    };
}

macro_rules! impl_float_limits {
    ($($ty:ty),*) => {
        $(
            impl NumericLimits for $ty {
                fn lowest() -> Self {
                    <$ty>::MIN
                }

                fn max_value() -> Self {
                    <$ty>::MAX
                }

                fn lowest_special() -> Self {
                    <$ty>::NEG_INFINITY
                }

                fn max_special() -> Self {
                    <$ty>::INFINITY
                }
            }
        )*
    };
}

impl_int_limits!(u8, u16, u32, u64, i8, i16, i32, i64);
impl_float_limits!(f32, f64, f16, bf16);
