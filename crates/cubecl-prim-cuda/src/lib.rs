#![warn(missing_docs)]

//! NVIDIA-native back-end of the cubecl-prim device primitives.
//!
//! Sorts use 6-bit digits (4-bit for one-byte keys), and scans and reductions process tiles of
//! 128 threads with 12 items each. Scans are limited to `i32::MAX` items. Failures are
//! reported with the [CudaError] status codes.

mod backend;
mod error;
mod policy;

pub use backend::CudaBackend;
pub use error::CudaError;
pub use policy::*;
