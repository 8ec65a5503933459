#![no_std]
#![warn(missing_docs)]

//! Scalar type helpers shared by the cubecl-prim device primitives.
//!
//! This crate contains the type-domain knowledge the device algorithms need: identity and
//! sentinel values, the order-preserving bit codec used by radix sort, numeric conversions
//! between value and accumulator types, and the reducer objects accepted by scans and
//! reductions.

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

/// Conversions between scalar types.
pub mod cast;
/// Identity and sentinel values per scalar type.
pub mod limits;
/// Numeric behaviour required by the sum reducers.
pub mod numeric;
/// Reducers and key equality predicates.
pub mod operator;
/// Order-preserving bit representation of sort keys.
pub mod radix;

mod pair;

pub use cast::CastFrom;
pub use limits::NumericLimits;
pub use numeric::Numeric;
pub use operator::{ArgMax, ArgMin, BinaryOp, Equality, KeyEquality, Max, Min, Sum};
pub use pair::KeyValuePair;
pub use radix::{RadixBits, RadixKey};

/// Re-export of the 16-bit float formats supported as keys and values.
pub use half::{bf16, f16};
