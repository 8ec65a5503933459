#![warn(missing_docs)]

//! Device-wide parallel primitives dispatched to a vendor back-end selected at build time.
//!
//! - [device_segmented_radix_sort]: stable radix sort of independent segments of keys, with
//!   optional values.
//! - [device_scan]: inclusive and exclusive scans restarted wherever the key changes.
//! - [device_reduce]: reductions to a single element, including arg-min and arg-max.
//!
//! Every algorithm follows the same two-phase protocol. A first call without temporary storage
//! writes the number of bytes the algorithm needs; the caller allocates a [TempStorage] of that
//! size and calls again to enqueue the work on a [Stream]. Work is asynchronous: results are
//! visible, and device failures reported, once the stream is synchronised.
//!
//! ```ignore
//! let mut bytes = 0;
//! device_scan::inclusive_sum_by_key(None, &mut bytes, keys.clone(), values.clone(), output.clone(), n, Equality, &stream)?;
//! let temp = TempStorage::new(bytes);
//! device_scan::inclusive_sum_by_key(Some(&temp), &mut bytes, keys, values, output, n, Equality, &stream)?;
//! stream.sync()?;
//! ```

pub mod dispatch;

pub mod device_reduce;
pub mod device_scan;
pub mod device_segmented_radix_sort;

mod error;

pub use dispatch::{ActiveBackend, backend_name};
pub use error::*;

pub use cubecl_prim_common::{
    ArgMax, ArgMin, BinaryOp, CastFrom, Equality, KeyEquality, KeyValuePair, Max, Min, Numeric,
    NumericLimits, RadixBits, RadixKey, Sum, bf16, f16,
};
pub use cubecl_prim_runtime::{
    ArgIndexIter, ConstantIter, CountingIter, DeviceBuffer, DiscardIter, DoubleBuffer, InputIter,
    LaunchError, OutputIter, ServerError, Stream, StreamId, TempStorage, TransformIter, ZipIter,
};
