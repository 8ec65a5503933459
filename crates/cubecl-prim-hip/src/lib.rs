#![warn(missing_docs)]

//! AMD-native back-end of the cubecl-prim device primitives.
//!
//! Sorts use 8-bit digits, and scans and reductions process tiles of 256 threads with 8 items
//! each. Failures are reported with the [HipError] status codes.

mod backend;
mod error;
mod policy;

pub use backend::HipBackend;
pub use error::HipError;
pub use policy::*;
