use std::fmt::Debug;
use std::sync::mpsc;
use std::thread;

use tracing::warn;

/// A unit of work handed to an executor.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A serial execution context that stands in for the UI thread.
///
/// Completion callbacks are marshaled through an executor before caller
/// code runs, so a consumer may mutate its state from inside the callback
/// without further dispatching: tasks submitted to one executor never run
/// concurrently with each other.
pub trait UiExecutor: Send + Sync + Debug {
    /// Run `task` on this executor, after every task submitted before it.
    fn execute(&self, task: Task);
}

/// Runs tasks one at a time, in submission order, on a dedicated worker
/// thread.
///
/// Dropping the executor flushes tasks already submitted and joins the
/// worker; tasks submitted through surviving clones of an `Arc` are still
/// delivered. A task may itself release the last handle to the executor
/// it runs on: the worker cannot join its own thread, so teardown then
/// leaves it to exit on the closed channel.
#[derive(Debug)]
pub struct SerialExecutor {
    tx: Option<mpsc::Sender<Task>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl SerialExecutor {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel::<Task>();
        let worker = thread::spawn(move || {
            while let Ok(task) = rx.recv() {
                task();
            }
        });

        Self { tx: Some(tx), worker: Some(worker) }
    }
}

impl Default for SerialExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl UiExecutor for SerialExecutor {
    fn execute(&self, task: Task) {
        let Some(tx) = &self.tx else {
            return;
        };

        // Fails only if the worker died, e.g. because an earlier task
        // panicked; the task is dropped rather than run out of order.
        if tx.send(task).is_err() {
            warn!("serial executor worker is gone; dropping task");
        }
    }
}

impl Drop for SerialExecutor {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain what was already
        // submitted and exit.
        drop(self.tx.take());
        if let Some(worker) = self.worker.take() {
            // Reached from the worker itself when a task releases the
            // last handle; a thread cannot join itself.
            if thread::current().id() == worker.thread().id() {
                return;
            }
            let _ = worker.join();
        }
    }
}

/// Runs each task immediately on the calling thread.
///
/// Useful in tests and in synchronous consumers, where hopping to a
/// separate thread would only obscure ordering.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl UiExecutor for InlineExecutor {
    fn execute(&self, task: Task) {
        task();
    }
}
