/// Streaming config module.
pub mod streaming;

mod base;
mod logger;

pub use base::*;
pub use logger::{LogCrateLevel, LogLevel, Logger, LoggerConfig};
pub use streaming::{StreamingConfig, StreamingLogLevel};
