//! In-order execution stream.
//!
//! Work is enqueued as boxed tasks and executed by a single worker thread in
//! submission order, so a task always observes the effects of every task
//! enqueued before it. `enqueue` never waits; `synchronize` blocks until the
//! queue has drained.
//!
//! A failing task faults the stream: every later task is skipped and every
//! later `synchronize` reports the first failure. There is no cancellation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

use crate::error::{Result, SpmmError};

type Task = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

enum Command {
    Run { label: &'static str, task: Task },
    Fence(Sender<Result<()>>),
}

/// A FIFO execution queue backed by one worker thread.
#[derive(Debug)]
pub struct Stream {
    name: String,
    sender: Mutex<Option<Sender<Command>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    submitted: AtomicU64,
}

impl Stream {
    /// Spawn the worker thread for a new stream.
    pub fn new(name: &str) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<Command>();
        let thread_name = format!("spmm-stream-{}", name);
        let worker = thread::Builder::new()
            .name(thread_name)
            .spawn(move || {
                let mut fault: Option<String> = None;
                for command in rx {
                    match command {
                        Command::Run { label, task } => {
                            if fault.is_some() {
                                log::debug!("stream faulted, skipping task '{}'", label);
                                continue;
                            }
                            if let Err(e) = task() {
                                log::error!("stream task '{}' failed: {}", label, e);
                                fault = Some(format!("task '{}': {}", label, e));
                            }
                        }
                        Command::Fence(reply) => {
                            let status = match &fault {
                                Some(msg) => Err(SpmmError::StreamFault(msg.clone())),
                                None => Ok(()),
                            };
                            let _ = reply.send(status);
                        }
                    }
                }
            })
            .map_err(|e| SpmmError::StreamFault(format!("failed to spawn worker: {}", e)))?;

        Ok(Stream {
            name: name.to_string(),
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            submitted: AtomicU64::new(0),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of tasks enqueued so far.
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Append a task to the queue and return without waiting for it.
    pub fn enqueue<F>(&self, label: &'static str, task: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.send(Command::Run {
            label,
            task: Box::new(task),
        })?;
        self.submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Block until every previously enqueued task has run.
    ///
    /// # Errors
    /// Returns `StreamFault` if any task on this stream has failed.
    pub fn synchronize(&self) -> Result<()> {
        let (tx, rx) = mpsc::channel();
        self.send(Command::Fence(tx))?;
        rx.recv()
            .map_err(|_| SpmmError::StreamFault("stream worker exited".to_string()))?
    }

    fn send(&self, command: Command) -> Result<()> {
        let guard = self
            .sender
            .lock()
            .map_err(|_| SpmmError::StreamFault("stream lock poisoned".to_string()))?;
        let sender = guard
            .as_ref()
            .ok_or_else(|| SpmmError::StreamFault("stream is shut down".to_string()))?;
        sender
            .send(command)
            .map_err(|_| SpmmError::StreamFault("stream worker exited".to_string()))
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain the queue and exit.
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
        if let Ok(mut worker) = self.worker.lock() {
            if let Some(handle) = worker.take() {
                let _ = handle.join();
            }
        }
    }
}
