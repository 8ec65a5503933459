use super::streaming::{StreamingConfig, StreamingLogLevel};
use std::sync::Arc;

/// Static mutex holding the global configuration, initialized as `None`.
static PRIM_GLOBAL_CONFIG: spin::Mutex<Option<Arc<GlobalConfig>>> = spin::Mutex::new(None);

/// The global configuration of the runtime.
///
/// Only the runtime reads it; the device algorithms themselves have no configuration surface.
#[derive(Default, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct GlobalConfig {
    /// Configuration for streams and their worker threads.
    #[serde(default)]
    pub streaming: StreamingConfig,
}

impl GlobalConfig {
    /// Retrieves the current global configuration, loading it from the current directory if not set.
    ///
    /// If no configuration is set, it attempts to load one from `cubecl-prim.toml` or
    /// `CubeclPrim.toml` in the current directory or its parents, then applies the environment
    /// overrides. If no file is found, a default configuration is used.
    ///
    /// Streams read the configuration once, when they are created.
    pub fn get() -> Arc<Self> {
        let mut state = PRIM_GLOBAL_CONFIG.lock();

        match state.as_ref() {
            Some(config) => config.clone(),
            None => {
                cfg_if::cfg_if! {
                    if #[cfg(std_io)] {
                        let config = Self::from_current_dir().override_from_env();
                    } else {
                        let config = Self::default();
                    }
                }

                let config = Arc::new(config);
                *state = Some(config.clone());
                config
            }
        }
    }

    /// Sets the global configuration to the provided value.
    ///
    /// # Panics
    /// Panics if the configuration has already been set or read, as it cannot be overridden.
    ///
    /// # Warning
    /// This method must be called at the start of the program, before any stream is created.
    pub fn set(config: Self) {
        let mut state = PRIM_GLOBAL_CONFIG.lock();
        if state.is_some() {
            panic!("Cannot set the global configuration multiple times.");
        }
        *state = Some(Arc::new(config));
    }

    #[cfg(std_io)]
    /// Overrides configuration fields based on environment variables.
    ///
    /// `CUBECL_PRIM_DEBUG_LOG` enables full stream logging: `stdout` and `stderr` select the
    /// console, `1`/`true` log to `/tmp/cubecl-prim.log`, `0`/`false` disable logging and any
    /// other value is used as a file path.
    pub fn override_from_env(mut self) -> Self {
        if let Ok(val) = std::env::var("CUBECL_PRIM_DEBUG_LOG") {
            self.streaming.logger.level = StreamingLogLevel::Full;

            match val.as_str() {
                "stdout" => {
                    self.streaming.logger.stdout = true;
                }
                "stderr" => {
                    self.streaming.logger.stderr = true;
                }
                "1" | "true" => {
                    self.streaming.logger.file = Some("/tmp/cubecl-prim.log".into());
                }
                "0" | "false" => {
                    self.streaming.logger.level = StreamingLogLevel::Disabled;
                }
                file_path => {
                    self.streaming.logger.file = Some(file_path.into());
                }
            }
        };

        if let Ok(val) = std::env::var("CUBECL_PRIM_STREAM_LOG_LEVEL") {
            match val.as_str() {
                "disabled" | "0" => self.streaming.logger.level = StreamingLogLevel::Disabled,
                "basic" | "1" => self.streaming.logger.level = StreamingLogLevel::Basic,
                "full" | "2" => self.streaming.logger.level = StreamingLogLevel::Full,
                _ => {}
            }
        }

        self
    }

    // Loads configuration from `cubecl-prim.toml` or `CubeclPrim.toml` in the current directory
    // or its parents, falling back to the default configuration.
    #[cfg(std_io)]
    fn from_current_dir() -> Self {
        let Ok(mut dir) = std::env::current_dir() else {
            return Self::default();
        };

        loop {
            for name in ["cubecl-prim.toml", "CubeclPrim.toml"] {
                if let Ok(content) = Self::from_file_path(dir.join(name)) {
                    return content;
                }
            }

            if !dir.pop() {
                break;
            }
        }

        Self::default()
    }

    /// Loads configuration from a specified file path.
    ///
    /// # Panics
    /// Panics if the file exists but isn't a valid configuration.
    #[cfg(std_io)]
    pub fn from_file_path<P: AsRef<std::path::Path>>(path: P) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = match toml::from_str(&content) {
            Ok(val) => val,
            Err(err) => panic!("The file provided doesn't have the right format => {err:?}"),
        };

        Ok(config)
    }
}
