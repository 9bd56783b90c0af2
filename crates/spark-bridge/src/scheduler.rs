//! Dedicated async worker for the bridge.
//!
//! [`AsyncScheduler`] spawns one named background thread that owns the task
//! queue exclusively. Long-running or blocking work triggered by command
//! execution is routed here instead of running inline on a host event-bus
//! thread, which would stall the host's main tick.
//!
//! # Design
//!
//! - `submit` is a non-blocking enqueue; tasks run strictly in submission
//!   order on the single worker (FIFO relative to `submit` from any thread).
//! - There is no mid-task cancellation; a dequeued task runs to completion.
//! - `shutdown` stops accepting tasks, drains in-flight work, and joins the
//!   worker. It is idempotent and also runs on drop, so the worker is
//!   released on every teardown path.

use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;

use tracing::warn;

use spark_types::BridgeError;

/// A unit of work for the async worker.
pub type Task = Box<dyn FnOnce() + Send>;

/// Handle to the dedicated worker thread.
pub struct AsyncScheduler {
    tx: Mutex<Option<mpsc::Sender<Task>>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
}

impl AsyncScheduler {
    /// Spawn the worker thread under the given name.
    pub fn new(thread_name: &str) -> Self {
        let (tx, rx) = mpsc::channel::<Task>();
        let worker = thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || Self::worker_loop(rx))
            .expect("failed to spawn async worker thread");

        Self {
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Main loop: run tasks until the channel closes.
    fn worker_loop(rx: mpsc::Receiver<Task>) {
        for task in rx {
            task();
        }
    }

    /// Enqueue a task for execution on the worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::SchedulerStopped`] if `shutdown` has already
    /// run.
    pub fn submit(&self, task: Task) -> Result<(), BridgeError> {
        let tx = self.tx.lock().expect("scheduler sender poisoned");
        match tx.as_ref() {
            Some(tx) => tx.send(task).map_err(|_| BridgeError::SchedulerStopped),
            None => Err(BridgeError::SchedulerStopped),
        }
    }

    /// Stop accepting tasks, drain in-flight work, and join the worker.
    ///
    /// Safe to call more than once; later calls are no-ops.
    pub fn shutdown(&self) {
        // Dropping the sender closes the channel; the worker drains what is
        // already queued and exits.
        drop(self.tx.lock().expect("scheduler sender poisoned").take());

        let worker = self.worker.lock().expect("scheduler worker poisoned").take();
        if let Some(handle) = worker {
            if handle.join().is_err() {
                warn!("async worker panicked while draining");
            }
        }
    }
}

impl Drop for AsyncScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
