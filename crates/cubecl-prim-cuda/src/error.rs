use cubecl_prim_runtime::{LaunchError, ServerError, TempError};
use thiserror::Error;

/// Status codes of the NVIDIA-native back-end.
#[derive(Error, Clone, PartialEq, Eq)]
pub enum CudaError {
    /// An argument is invalid.
    #[error("Invalid value\nCaused by:\n  {reason}")]
    InvalidValue {
        /// The cause of the error.
        reason: String,
    },

    /// The declared temporary storage is smaller than the size query returned.
    #[error("Temporary storage too small: {required} bytes required, {provided} bytes provided")]
    TempStorageTooSmall {
        /// Bytes required by the operation.
        required: usize,
        /// Bytes declared by the caller.
        provided: usize,
    },

    /// The operation isn't available with these arguments.
    #[error("Operation not supported\nCaused by:\n  {reason}")]
    NotSupported {
        /// The cause of the error.
        reason: String,
    },

    /// A device allocation failed.
    #[error("Memory allocation failed\nCaused by:\n  {reason}")]
    MemoryAllocation {
        /// The cause of the error.
        reason: String,
    },

    /// The kernel couldn't be launched.
    #[error("Launch failure\nCaused by:\n  {reason}")]
    LaunchFailure {
        /// The cause of the error.
        reason: String,
    },

    /// The runtime rejected the work.
    #[error("Runtime error\nCaused by:\n  {0}")]
    Runtime(ServerError),
}

impl core::fmt::Debug for CudaError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("{self}"))
    }
}

impl From<LaunchError> for CudaError {
    fn from(err: LaunchError) -> Self {
        match err {
            LaunchError::OutOfMemory { reason } => CudaError::MemoryAllocation { reason },
            LaunchError::Unknown { reason } => CudaError::LaunchFailure { reason },
        }
    }
}

impl From<ServerError> for CudaError {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::Launch(err) => err.into(),
            err => CudaError::Runtime(err),
        }
    }
}

impl From<TempError> for CudaError {
    fn from(err: TempError) -> Self {
        match err {
            TempError::TooSmall { required, provided } => {
                CudaError::TempStorageTooSmall { required, provided }
            }
            err @ TempError::ShorterThanDeclared { .. } => CudaError::InvalidValue {
                reason: err.to_string(),
            },
        }
    }
}
