use thiserror::Error;

/// Error that can happen asynchronously while executing work enqueued on a
/// [stream](crate::Stream).
///
/// Such errors are recorded by the stream and returned by the next
/// [synchronisation](crate::Stream::sync).
#[derive(Error, Clone, PartialEq, Eq)]
pub enum ServerError {
    /// A task failed while executing on the device.
    #[error("An error happened during execution\nCaused by:\n  {reason}")]
    Execution {
        /// The cause of the error.
        reason: String,
    },

    /// A task accessed memory outside of the declared ranges.
    #[error("A device fault happened during execution\nCaused by:\n  {reason}")]
    DeviceFault {
        /// The cause of the error.
        reason: String,
    },

    /// A launch error happened before the task could run.
    #[error("A launch error happened\nCaused by:\n  {0}")]
    Launch(#[from] LaunchError),

    /// The stream can't accept or run work anymore.
    #[error("The server is in an invalid state\nCaused by:\n  {reason}")]
    ServerUnhealthy {
        /// The cause of the error.
        reason: String,
    },
}

/// Error that can happen when launching work on the device.
#[derive(Error, Clone, PartialEq, Eq)]
pub enum LaunchError {
    /// The device can't provide the requested memory.
    #[error("The device can't provide the requested memory\nCaused by:\n  {reason}")]
    OutOfMemory {
        /// The cause of the error.
        reason: String,
    },

    /// Unknown launch error.
    #[error("An unknown error happened during launch\nCaused by:\n  {reason}")]
    Unknown {
        /// The cause of the error.
        reason: String,
    },
}

impl core::fmt::Debug for ServerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("{self}"))
    }
}

impl core::fmt::Debug for LaunchError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("{self}"))
    }
}
