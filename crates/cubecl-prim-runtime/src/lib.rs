#![warn(missing_docs)]

//! Host-executed device runtime shared by the cubecl-prim back-ends.
//!
//! A [Stream] runs enqueued work in order on its own worker thread. Device memory is modelled
//! by [DeviceBuffer], and caller-provided scratch memory by [TempStorage]. The [kernel] module
//! contains the block-parallel kernels the back-ends launch, each one parameterised by a
//! policy tuned per back-end.

extern crate alloc;

/// Configuration of the runtime, loaded from `cubecl-prim.toml`.
pub mod config;
/// Kernels launched by the back-ends.
pub mod kernel;

mod backend;
mod error;
mod iter;
mod memory;
mod stream;
mod temp;

pub use backend::*;
pub use error::*;
pub use iter::*;
pub use memory::*;
pub use stream::*;
pub use temp::*;
