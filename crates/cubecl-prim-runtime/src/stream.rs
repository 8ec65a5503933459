use crate::config::{GlobalConfig, Logger, StreamingLogLevel};
use crate::error::ServerError;
use core::sync::atomic::{AtomicU64, Ordering};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

static STREAM_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique identifier of a [Stream].
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct StreamId {
    /// The value representing the stream.
    pub value: u64,
}

impl StreamId {
    fn next() -> Self {
        Self {
            value: STREAM_COUNTER.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl core::fmt::Display for StreamId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("StreamId({:?})", self.value))
    }
}

type Task = Box<dyn FnOnce() -> Result<(), ServerError> + Send>;

enum Message {
    Execute { name: String, task: Task },
    Sync(async_channel::Sender<()>),
}

/// An ordered execution channel.
///
/// Work enqueued on a stream runs on the stream's own worker thread, in submission order, and
/// observes the writes of the work enqueued before it. Work on different streams is unordered.
///
/// Enqueuing never blocks on the device. A task failing while it runs doesn't stop the stream:
/// its error is recorded and returned by the next call to [Stream::sync].
#[derive(Clone)]
pub struct Stream {
    id: StreamId,
    state: Arc<StreamState>,
}

struct StreamState {
    sender: async_channel::Sender<Message>,
    errors: Arc<spin::Mutex<Vec<ServerError>>>,
    logger: Arc<spin::Mutex<Logger>>,
}

impl core::fmt::Debug for Stream {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Stream").field("id", &self.id).finish()
    }
}

impl Default for Stream {
    fn default() -> Self {
        Self::new()
    }
}

impl Stream {
    /// Create a new stream and spawn its worker thread.
    pub fn new() -> Self {
        Self::with_config(GlobalConfig::get())
    }

    /// Create a new stream using an explicit configuration.
    pub fn with_config(config: Arc<GlobalConfig>) -> Self {
        let id = StreamId::next();
        let (sender, receiver) = async_channel::unbounded();
        let errors = Arc::new(spin::Mutex::new(Vec::new()));
        let thread_name = format!("{}-{}", config.streaming.thread_name, id.value);
        let logger = Arc::new(spin::Mutex::new(Logger::from_config(config)));

        let worker = Worker {
            id,
            receiver,
            errors: errors.clone(),
            logger: logger.clone(),
        };
        std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || worker.work())
            .expect("Should be able to spawn the stream worker thread");

        Self {
            id,
            state: Arc::new(StreamState {
                sender,
                errors,
                logger,
            }),
        }
    }

    /// The identifier of the stream.
    pub fn id(&self) -> StreamId {
        self.id
    }

    /// Enqueue `task` after all the work previously submitted to this stream.
    ///
    /// Returns as soon as the task is queued. An error is returned only when the stream can't
    /// accept work anymore; failures of the task itself surface on [Stream::sync].
    pub fn enqueue<F>(&self, name: impl Into<String>, task: F) -> Result<(), ServerError>
    where
        F: FnOnce() -> Result<(), ServerError> + Send + 'static,
    {
        let name = name.into();

        {
            let mut logger = self.state.logger.lock();
            if logger.log_level_streaming() != StreamingLogLevel::Disabled {
                logger.log_streaming(&format!("[{}] enqueue {name}", self.id));
            }
        }

        self.state
            .sender
            .send_blocking(Message::Execute {
                name,
                task: Box::new(task),
            })
            .map_err(|_| ServerError::ServerUnhealthy {
                reason: format!("The worker of {} has stopped", self.id),
            })
    }

    /// Block until all the work submitted so far has completed.
    ///
    /// Returns the first error recorded since the previous synchronisation, if any. Recorded
    /// errors are cleared.
    pub fn sync(&self) -> Result<(), ServerError> {
        futures_lite::future::block_on(self.sync_async())
    }

    /// Wait until all the work submitted so far has completed.
    ///
    /// See [Stream::sync].
    pub async fn sync_async(&self) -> Result<(), ServerError> {
        let unhealthy = || ServerError::ServerUnhealthy {
            reason: format!("The worker of {} has stopped", self.id),
        };
        let (callback, response) = async_channel::bounded(1);

        self.state
            .sender
            .send(Message::Sync(callback))
            .await
            .map_err(|_| unhealthy())?;
        response.recv().await.map_err(|_| unhealthy())?;

        let mut errors = self.state.errors.lock();
        if errors.is_empty() {
            return Ok(());
        }

        let first = errors.remove(0);
        if !errors.is_empty() {
            log::warn!(
                "{} more errors were recorded on {} and are dropped",
                errors.len(),
                self.id
            );
            errors.clear();
        }

        Err(first)
    }
}

struct Worker {
    id: StreamId,
    receiver: async_channel::Receiver<Message>,
    errors: Arc<spin::Mutex<Vec<ServerError>>>,
    logger: Arc<spin::Mutex<Logger>>,
}

impl Worker {
    fn work(self) {
        log::trace!("Worker of {} started", self.id);

        while let Ok(message) = self.receiver.recv_blocking() {
            match message {
                Message::Execute { name, task } => {
                    let result = match std::panic::catch_unwind(AssertUnwindSafe(task)) {
                        Ok(result) => result,
                        Err(payload) => Err(ServerError::DeviceFault {
                            reason: panic_reason(payload.as_ref()),
                        }),
                    };

                    match result {
                        Ok(()) => self.log_full(|| format!("[{}] completed {name}", self.id)),
                        Err(err) => {
                            self.log_full(|| format!("[{}] failed {name}: {err}", self.id));
                            self.errors.lock().push(err);
                        }
                    }
                }
                Message::Sync(callback) => {
                    self.log_full(|| format!("[{}] sync", self.id));
                    // The caller may have stopped waiting.
                    let _ = callback.send_blocking(());
                }
            }
        }

        log::trace!("Worker of {} stopped", self.id);
    }

    fn log_full(&self, msg: impl FnOnce() -> String) {
        let mut logger = self.logger.lock();
        if let StreamingLogLevel::Full = logger.log_level_streaming() {
            logger.log_streaming(&msg());
        }
    }
}

fn panic_reason(payload: &(dyn core::any::Any + Send)) -> String {
    if let Some(reason) = payload.downcast_ref::<&str>() {
        reason.to_string()
    } else if let Some(reason) = payload.downcast_ref::<String>() {
        reason.clone()
    } else {
        "Unknown panic".to_string()
    }
}
