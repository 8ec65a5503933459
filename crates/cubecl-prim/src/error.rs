use cubecl_prim_runtime::{LaunchError, ServerError};
use thiserror::Error;

/// Error returned by the device algorithms.
///
/// Every status of the active back-end maps onto one of these variants. Failures happening
/// after the work is enqueued are returned by [Stream::sync](cubecl_prim_runtime::Stream::sync)
/// instead, and convert into [PrimError::Device].
#[derive(Error, Clone, PartialEq, Eq)]
pub enum PrimError {
    /// An argument is invalid.
    #[error("Invalid argument\nCaused by:\n  {reason}")]
    InvalidArgument {
        /// The cause of the error.
        reason: String,
    },

    /// The declared temporary storage is smaller than the size query returned.
    #[error(
        "The temporary buffer is too small: {required} bytes are required, {provided} bytes were provided"
    )]
    TemporaryBufferTooSmall {
        /// Bytes required by the operation.
        required: usize,
        /// Bytes declared by the caller.
        provided: usize,
    },

    /// The active back-end doesn't support the operation with these arguments.
    #[error("Unsupported operation\nCaused by:\n  {reason}")]
    Unsupported {
        /// The cause of the error.
        reason: String,
    },

    /// The device or its runtime failed.
    #[error("A device error happened\nCaused by:\n  {0}")]
    Device(#[from] ServerError),
}

impl core::fmt::Debug for PrimError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("{self}"))
    }
}

impl PrimError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        PrimError::InvalidArgument {
            reason: reason.into(),
        }
    }
}

#[cfg(prim_backend = "hip")]
impl From<cubecl_prim_hip::HipError> for PrimError {
    fn from(err: cubecl_prim_hip::HipError) -> Self {
        use cubecl_prim_hip::HipError;

        match err {
            HipError::InvalidValue { reason } => PrimError::InvalidArgument { reason },
            HipError::InsufficientTemporaryStorage { required, provided } => {
                PrimError::TemporaryBufferTooSmall { required, provided }
            }
            HipError::NotSupported { reason } => PrimError::Unsupported { reason },
            HipError::OutOfMemory { reason } => {
                PrimError::Device(ServerError::Launch(LaunchError::OutOfMemory { reason }))
            }
            HipError::LaunchFailure { reason } => {
                PrimError::Device(ServerError::Launch(LaunchError::Unknown { reason }))
            }
            HipError::Runtime(err) => PrimError::Device(err),
        }
    }
}

#[cfg(prim_backend = "cuda")]
impl From<cubecl_prim_cuda::CudaError> for PrimError {
    fn from(err: cubecl_prim_cuda::CudaError) -> Self {
        use cubecl_prim_cuda::CudaError;

        match err {
            CudaError::InvalidValue { reason } => PrimError::InvalidArgument { reason },
            CudaError::TempStorageTooSmall { required, provided } => {
                PrimError::TemporaryBufferTooSmall { required, provided }
            }
            CudaError::NotSupported { reason } => PrimError::Unsupported { reason },
            CudaError::MemoryAllocation { reason } => {
                PrimError::Device(ServerError::Launch(LaunchError::OutOfMemory { reason }))
            }
            CudaError::LaunchFailure { reason } => {
                PrimError::Device(ServerError::Launch(LaunchError::Unknown { reason }))
            }
            CudaError::Runtime(err) => PrimError::Device(err),
        }
    }
}
