//! Background worker for running a job off the calling thread.
//!
//! The compositor itself is blocking. This wraps a [`Job`] in a thread,
//! reports each layer as it starts and honours cancellation between layers.

use std::any::Any;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::compose::CompositeReport;
use crate::job::Job;
use crate::util::{Error, Result};

/// Events sent from the worker thread.
#[derive(Debug)]
pub enum WorkerEvent {
    /// Layer `index` of `total` is about to be burned.
    Progress {
        index: usize,
        total: usize,
        path: PathBuf,
    },
    /// The run ended; the result is also returned by [`CompositeWorker::join`].
    Finished { ok: bool, message: String },
}

/// Handle to a running job.
pub struct CompositeWorker {
    /// Receive progress events.
    pub rx: Receiver<WorkerEvent>,
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<Result<CompositeReport>>>,
}

impl CompositeWorker {
    /// Start `job` on a new thread.
    pub fn spawn(job: Job) -> Self {
        let (tx, rx) = channel::<WorkerEvent>();
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);

        let handle = thread::spawn(move || worker_main(job, flag, tx));

        Self {
            rx,
            cancel,
            handle: Some(handle),
        }
    }

    /// Ask the worker to stop before its next layer.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Check for a pending event (non-blocking).
    pub fn try_recv(&self) -> Option<WorkerEvent> {
        self.rx.try_recv().ok()
    }

    /// Wait for the worker and return its result.
    pub fn join(mut self) -> Result<CompositeReport> {
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(result)) => result,
            Some(Err(payload)) => Err(Error::WorkerPanicked(panic_message(&*payload))),
            None => Err(Error::Cancelled),
        }
    }
}

impl Drop for CompositeWorker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.cancel();
            let _ = handle.join();
        }
    }
}

/// Text of a panic payload, as printed by the default hook.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn worker_main(job: Job, cancel: Arc<AtomicBool>, tx: Sender<WorkerEvent>) -> Result<CompositeReport> {
    let result = job.run_with(|progress| {
        if cancel.load(Ordering::Relaxed) {
            return ControlFlow::Break(());
        }
        let _ = tx.send(WorkerEvent::Progress {
            index: progress.index,
            total: progress.total,
            path: progress.layer.path.clone(),
        });
        ControlFlow::Continue(())
    });

    let (ok, message) = match &result {
        Ok(report) => (true, format!("Saved to: {}", report.output.display())),
        Err(e) => (false, e.to_string()),
    };
    let _ = tx.send(WorkerEvent::Finished { ok, message });
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_job_reports_failure() {
        let job = Job::from_json(r#"{ "dem": "a.tif", "output": "b.tif", "layers": [] }"#).unwrap();
        let worker = CompositeWorker::spawn(job);

        let event = worker.rx.recv().unwrap();
        match event {
            WorkerEvent::Finished { ok, message } => {
                assert!(!ok);
                assert!(message.contains("layer"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(matches!(worker.join(), Err(Error::Config(_))));
    }

    fn payload_of(f: impl FnOnce() + Send + 'static) -> Box<dyn Any + Send> {
        thread::spawn(f).join().unwrap_err()
    }

    #[test]
    fn test_panic_message() {
        let payload = payload_of(|| panic!("static message"));
        assert_eq!(panic_message(&*payload), "static message");

        let payload = payload_of(|| panic!("layer {} failed", 3));
        assert_eq!(panic_message(&*payload), "layer 3 failed");

        let payload = payload_of(|| std::panic::panic_any(42u8));
        assert_eq!(panic_message(&*payload), "unknown panic payload");
    }

    #[test]
    fn test_join_reports_worker_panic() {
        let (_tx, rx) = channel::<WorkerEvent>();
        let worker = CompositeWorker {
            rx,
            cancel: Arc::new(AtomicBool::new(false)),
            handle: Some(thread::spawn(|| -> Result<CompositeReport> { panic!("gdal went away") })),
        };
        match worker.join() {
            Err(e @ Error::WorkerPanicked(_)) => {
                assert_eq!(e.kind(), "worker-panic");
                assert!(e.to_string().contains("gdal went away"));
            }
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("expected a panic error"),
        }
    }
}
