use cubecl_prim_runtime::{LaunchError, ServerError, TempError};
use thiserror::Error;

/// Status codes of the AMD-native back-end.
#[derive(Error, Clone, PartialEq, Eq)]
pub enum HipError {
    /// An argument is invalid.
    #[error("Invalid value\nCaused by:\n  {reason}")]
    InvalidValue {
        /// The cause of the error.
        reason: String,
    },

    /// The declared temporary storage is smaller than the size query returned.
    #[error("Insufficient temporary storage: {provided} bytes provided, {required} bytes required")]
    InsufficientTemporaryStorage {
        /// Bytes required by the operation.
        required: usize,
        /// Bytes declared by the caller.
        provided: usize,
    },

    /// The operation isn't available with these arguments.
    #[error("Not supported\nCaused by:\n  {reason}")]
    NotSupported {
        /// The cause of the error.
        reason: String,
    },

    /// The device ran out of memory.
    #[error("Out of memory\nCaused by:\n  {reason}")]
    OutOfMemory {
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

impl core::fmt::Debug for HipError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("{self}"))
    }
}

impl From<LaunchError> for HipError {
    fn from(err: LaunchError) -> Self {
        match err {
            LaunchError::OutOfMemory { reason } => HipError::OutOfMemory { reason },
            LaunchError::Unknown { reason } => HipError::LaunchFailure { reason },
        }
    }
}

impl From<ServerError> for HipError {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::Launch(err) => err.into(),
            err => HipError::Runtime(err),
        }
    }
}

impl From<TempError> for HipError {
    fn from(err: TempError) -> Self {
        match err {
            TempError::TooSmall { required, provided } => {
                HipError::InsufficientTemporaryStorage { required, provided }
            }
            err @ TempError::ShorterThanDeclared { .. } => HipError::InvalidValue {
                reason: err.to_string(),
            },
        }
    }
}
