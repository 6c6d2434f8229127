//! UI task sinks.
//!
//! Notifications raised from a worker thread must not be delivered there when
//! the subscribers live on the UI thread. A [`Dispatcher`] is handed to the
//! [`WeakEventManager`](crate::WeakEventManager) at construction and decides
//! where each handler invocation runs:
//!
//! - [`ImmediateDispatcher`] runs the job inline on the calling thread
//! - [`QueuedDispatcher`] posts the job into a [`DispatchQueue`] that the UI
//!   loop drains with [`DispatchQueue::run_pending`]

use std::fmt;

use tokio::sync::mpsc;

/// A unit of deferred work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Destination for handler invocations.
pub trait Dispatcher: Send + Sync {
    /// Runs `job` now or schedules it for later.
    fn post(&self, job: Job);
}

/// Runs every job synchronously on the posting thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateDispatcher;

impl Dispatcher for ImmediateDispatcher {
    fn post(&self, job: Job) {
        job();
    }
}

/// Posts jobs to a queue owned by the UI loop.
#[derive(Clone)]
pub struct QueuedDispatcher {
    sender: mpsc::UnboundedSender<Job>,
}

impl QueuedDispatcher {
    /// Creates a dispatcher and the queue it feeds.
    #[must_use]
    pub fn new() -> (Self, DispatchQueue) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, DispatchQueue { receiver })
    }
}

impl fmt::Debug for QueuedDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedDispatcher")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

impl Dispatcher for QueuedDispatcher {
    fn post(&self, job: Job) {
        if self.sender.send(job).is_err() {
            tracing::debug!("Dispatch queue closed, dropping notification");
        }
    }
}

/// Receiving end of a [`QueuedDispatcher`].
pub struct DispatchQueue {
    receiver: mpsc::UnboundedReceiver<Job>,
}

impl DispatchQueue {
    /// Runs every job queued so far and returns how many ran.
    ///
    /// Jobs posted by a running job are picked up in the same call.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.receiver.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Waits for the next job and runs it.
    ///
    /// Returns `false` once every [`QueuedDispatcher`] has been dropped and the
    /// queue is empty.
    pub async fn run_next(&mut self) -> bool {
        match self.receiver.recv().await {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for DispatchQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchQueue").finish_non_exhaustive()
    }
}
