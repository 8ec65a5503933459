use super::logger::{LogLevel, LoggerConfig};

/// Configuration for streams.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct StreamingConfig {
    /// Logger configuration for stream events.
    #[serde(default)]
    pub logger: LoggerConfig<StreamingLogLevel>,
    /// Name prefix of the worker thread spawned for each stream.
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            logger: Default::default(),
            thread_name: default_thread_name(),
        }
    }
}

fn default_thread_name() -> String {
    "cubecl-prim-stream".into()
}

/// Log levels for streams.
#[derive(Default, Clone, Copy, Debug, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub enum StreamingLogLevel {
    /// Stream logging is disabled.
    #[default]
    #[serde(rename = "disabled")]
    Disabled,

    /// Every task enqueued on a stream is logged.
    #[serde(rename = "basic")]
    Basic,

    /// Task completions, failures and synchronisations are logged as well.
    #[serde(rename = "full")]
    Full,
}

impl LogLevel for StreamingLogLevel {}
