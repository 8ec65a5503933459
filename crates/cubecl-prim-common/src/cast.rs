use half::{bf16, f16};

/// Value conversion from `T`, with the semantics of an `as` cast.
///
/// Every type converts into itself, which lets reducers run directly on user-defined value
/// types. Numeric conversions truncate or saturate exactly like `as`, and 16-bit floats convert
/// through `f32`.
pub trait CastFrom<T>: Sized {
    /// Convert `value` into `Self`.
    fn cast_from(value: T) -> Self;
}

impl<T> CastFrom<T> for T {
    #[inline(always)]
    fn cast_from(value: T) -> Self {
        value
    }
}

macro_rules! impl_cast_into {
    ($dst:ty; $($src:ty),*) => {
        $(
            impl CastFrom<$src> for $dst {
                #[inline(always)]
                fn cast_from(value: $src) -> Self {
                    value as $dst
                }
            }
        )*
    };
}

impl_cast_into!(u8; u16, u32, u64, usize, i8, i16, i32, i64, f32, f64);
impl_cast_into!(u16; u8, u32, u64, usize, i8, i16, i32, i64, f32, f64);
impl_cast_into!(u32; u8, u16, u64, usize, i8, i16, i32, i64, f32, f64);
impl_cast_into!(u64; u8, u16, u32, usize, i8, i16, i32, i64, f32, f64);
impl_cast_into!(i8; u8, u16, u32, u64, usize, i16, i32, i64, f32, f64);
impl_cast_into!(i16; u8, u16, u32, u64, usize, i8, i32, i64, f32, f64);
impl_cast_into!(i32; u8, u16, u32, u64, usize, i8, i16, i64, f32, f64);
impl_cast_into!(i64; u8, u16, u32, u64, usize, i8, i16, i32, f32, f64);
impl_cast_into!(f32; u8, u16, u32, u64, usize, i8, i16, i32, i64, f64);
impl_cast_into!(f64; u8, u16, u32, u64, usize, i8, i16, i32, i64, f32);

macro_rules! impl_cast_half {
    ($half:ty, $other:ty) => {
        impl_cast_half!(@prims $half; u8, u16, u32, u64, usize, i8, i16, i32, i64, f32, f64);

        impl CastFrom<$other> for $half {
            #[inline(always)]
            fn cast_from(value: $other) -> Self {
                <$half>::from_f32(value.to_f32())
            }
        }
    };
    (@prims $half:ty; $($prim:ty),*) => {
        $(
            impl CastFrom<$prim> for $half {
                #[inline(always)]
                fn cast_from(value: $prim) -> Self {
                    <$half>::from_f32(value as f32)
                }
            }

            impl CastFrom<$half> for $prim {
                #[inline(always)]
                fn cast_from(value: $half) -> Self {
                    value.to_f32() as $prim
                }
            }
        )*
    };
}

impl_cast_half!(f16, bf16);
impl_cast_half!(bf16, f16);
