//! Destinations for guide log lines.
//!
//! The log selects a sink when it is enabled or disabled: [`FileSink`] writes
//! through a buffered file handle, [`QueuedSink`] hands lines to a worker
//! thread that owns the file, and [`NullSink`] discards everything while the
//! log is disabled.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, Sender};
use tracing::{debug, warn};

/// Line-oriented output used by the guiding log.
pub trait LogSink: Send {
    /// Write one line; the sink appends the terminator.
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Push buffered lines to durable storage.
    fn flush(&mut self) -> io::Result<()>;

    /// False for the sink used while the log is disabled.
    fn is_active(&self) -> bool {
        true
    }
}

/// Sink of a disabled log.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LogSink for NullSink {
    fn write_line(&mut self, _line: &str) -> io::Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn is_active(&self) -> bool {
        false
    }
}

/// Buffered file opened in append mode.
pub struct FileSink {
    writer: BufWriter<File>,
}

impl FileSink {
    /// Open `path` for appending, creating it if absent.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl LogSink for FileSink {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()
    }
}

enum Command {
    Line(String),
    Flush(Sender<io::Result<()>>),
}

/// Sink driven by a worker thread.
///
/// Lines travel through a bounded queue, so a slow disk applies backpressure
/// once `depth` lines are pending. Write errors are held by the worker and
/// surface on the next [`LogSink::flush`]; after the first error further
/// writes are refused.
pub struct QueuedSink {
    sender: Option<Sender<Command>>,
    worker: Option<JoinHandle<()>>,
    failed: Arc<AtomicBool>,
}

impl QueuedSink {
    /// Open `path` on the calling thread, then hand it to a new worker.
    pub fn open(path: &Path, depth: usize) -> io::Result<Self> {
        let sink = FileSink::open(path)?;
        Self::spawn(sink, depth, path.display().to_string())
    }

    /// Move `sink` onto a new worker thread; `name` labels its log messages.
    pub fn spawn<S>(mut sink: S, depth: usize, name: String) -> io::Result<Self>
    where
        S: LogSink + 'static,
    {
        let (sender, receiver) = bounded::<Command>(depth.max(1));
        let failed = Arc::new(AtomicBool::new(false));
        let worker_failed = failed.clone();

        let worker = std::thread::Builder::new()
            .name("guidelog-writer".to_string())
            .spawn(move || {
                debug!("Guide log writer started for {}", name);
                let mut pending: Option<io::Error> = None;
                while let Ok(command) = receiver.recv() {
                    match command {
                        Command::Line(line) => {
                            if pending.is_some() {
                                continue;
                            }
                            if let Err(e) = sink.write_line(&line) {
                                warn!("Guide log writer failed on {}: {}", name, e);
                                worker_failed.store(true, Ordering::Release);
                                pending = Some(e);
                            }
                        }
                        Command::Flush(ack) => {
                            let result = match pending.take() {
                                Some(e) => Err(e),
                                None => sink.flush(),
                            };
                            if result.is_err() {
                                worker_failed.store(true, Ordering::Release);
                            }
                            // The requester may have given up waiting
                            let _ = ack.send(result);
                        }
                    }
                }
                if let Err(e) = sink.flush() {
                    warn!("Final flush of {} failed: {}", name, e);
                }
                debug!("Guide log writer for {} shutting down", name);
            })?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
            failed,
        })
    }

    fn send(&self, command: Command) -> io::Result<()> {
        let sender = self.sender.as_ref().ok_or_else(disconnected)?;
        sender.send(command).map_err(|_| disconnected())
    }
}

fn disconnected() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "guide log writer has shut down")
}

impl LogSink for QueuedSink {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        if self.failed.load(Ordering::Acquire) {
            return Err(io::Error::other("guide log writer failed"));
        }
        self.send(Command::Line(line.to_string()))
    }

    fn flush(&mut self) -> io::Result<()> {
        let (ack, done) = bounded(1);
        self.send(Command::Flush(ack))?;
        done.recv().map_err(|_| disconnected())?
    }
}

impl Drop for QueuedSink {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain the queue and exit
        drop(self.sender.take());
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.join() {
                warn!("Guide log writer panicked: {:?}", e);
            }
        }
    }
}
