use super::{GlobalConfig, streaming::StreamingLogLevel};
use core::fmt::Display;
use hashbrown::HashSet;
use std::sync::Arc;

#[cfg(std_io)]
use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::PathBuf,
};

/// Configuration of one logging category, parameterized by its log level type.
///
/// Several sinks can be enabled at the same time; each message goes to all of them.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(bound = "")]
pub struct LoggerConfig<L: LogLevel> {
    /// Path to the log file, if file logging is enabled.
    #[serde(default)]
    #[cfg(std_io)]
    pub file: Option<PathBuf>,

    /// Whether to append to the log file (true) or truncate it (false). Defaults to true.
    #[serde(default = "append_default")]
    pub append: bool,

    /// Whether to log to standard output.
    #[serde(default)]
    pub stdout: bool,

    /// Whether to log to standard error.
    #[serde(default)]
    pub stderr: bool,

    /// Forward messages to the `log` crate at the given level.
    #[serde(default)]
    pub log: Option<LogCrateLevel>,

    /// Verbosity of the category.
    #[serde(default)]
    pub level: L,
}

impl<L: LogLevel> Default for LoggerConfig<L> {
    fn default() -> Self {
        Self {
            #[cfg(std_io)]
            file: None,
            append: true,
            stdout: false,
            stderr: false,
            log: None,
            level: L::default(),
        }
    }
}

/// Levels used when forwarding to the `log` crate.
#[derive(
    Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize, Hash, PartialEq, Eq,
)]
pub enum LogCrateLevel {
    /// Forwarded with `log::info!`.
    #[default]
    #[serde(rename = "info")]
    Info,

    /// Forwarded with `log::debug!`.
    #[serde(rename = "debug")]
    Debug,

    /// Forwarded with `log::trace!`.
    #[serde(rename = "trace")]
    Trace,
}

fn append_default() -> bool {
    true
}

/// Trait for types that can be used as log levels in [LoggerConfig].
pub trait LogLevel:
    serde::de::DeserializeOwned + serde::Serialize + Clone + Copy + core::fmt::Debug + Default
{
}

/// Writes stream events to the sinks selected by the global configuration.
///
/// Creating a logger opens its files, so streams create one and keep it.
#[derive(Debug)]
pub struct Logger {
    sinks: Vec<Sink>,
    level: StreamingLogLevel,
    /// Global configuration the logger was built from.
    pub config: Arc<GlobalConfig>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Creates a new logger based on the global configuration.
    pub fn new() -> Self {
        Self::from_config(GlobalConfig::get())
    }

    /// Creates a new logger from an explicit configuration.
    pub fn from_config(config: Arc<GlobalConfig>) -> Self {
        let settings = &config.streaming.logger;
        let level = settings.level;
        let mut sinks = Vec::new();

        if level != StreamingLogLevel::Disabled {
            let mut seen = HashSet::new();
            let mut register = |id: SinkId, sink: Sink| {
                if seen.insert(id) {
                    sinks.push(sink);
                }
            };

            #[cfg(std_io)]
            if let Some(path) = &settings.file {
                match FileSink::new(path, settings.append) {
                    Ok(file) => register(SinkId::File(path.clone()), Sink::File(file)),
                    Err(err) => log::warn!("Can't open log file {}: {err}", path.display()),
                }
            }
            if settings.stdout {
                register(SinkId::Stdout, Sink::Stdout);
            }
            if settings.stderr {
                register(SinkId::Stderr, Sink::Stderr);
            }
            if let Some(crate_level) = settings.log {
                register(SinkId::LogCrate(crate_level), Sink::Log(crate_level));
            }
        }

        Self {
            sinks,
            level,
            config,
        }
    }

    /// Logs a stream event to every configured sink.
    pub fn log_streaming<S: Display>(&mut self, msg: &S) {
        match self.sinks.len() {
            0 => {}
            1 => self.sinks[0].log(msg),
            _ => {
                let msg = msg.to_string();
                for sink in self.sinks.iter_mut() {
                    sink.log(&msg);
                }
            }
        }
    }

    /// Returns the stream log level.
    pub fn log_level_streaming(&self) -> StreamingLogLevel {
        self.level
    }
}

#[derive(Hash, PartialEq, Eq)]
enum SinkId {
    #[cfg(std_io)]
    File(PathBuf),
    Stdout,
    Stderr,
    LogCrate(LogCrateLevel),
}

#[derive(Debug)]
enum Sink {
    #[cfg(std_io)]
    File(FileSink),
    Stdout,
    Stderr,
    Log(LogCrateLevel),
}

impl Sink {
    fn log<S: Display>(&mut self, msg: &S) {
        match self {
            #[cfg(std_io)]
            Sink::File(file) => file.log(msg),
            Sink::Stdout => println!("{msg}"),
            Sink::Stderr => eprintln!("{msg}"),
            Sink::Log(level) => match level {
                LogCrateLevel::Info => log::info!("{msg}"),
                LogCrateLevel::Debug => log::debug!("{msg}"),
                LogCrateLevel::Trace => log::trace!("{msg}"),
            },
        }
    }
}

#[derive(Debug)]
#[cfg(std_io)]
struct FileSink {
    writer: BufWriter<File>,
}

#[cfg(std_io)]
impl FileSink {
    fn new(path: &PathBuf, append: bool) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .append(append)
            .truncate(!append)
            .create(true)
            .open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    fn log<S: Display>(&mut self, msg: &S) {
        // Logging failures are ignored.
        if writeln!(self.writer, "{msg}").is_ok() {
            let _ = self.writer.flush();
        }
    }
}
