//! Watches page snapshots and forwards each accepted submission exactly once.
//!
//! Acceptance verdicts tend to stay on the page while it keeps re-rendering,
//! so a submission is only forwarded when the page goes from "not accepted"
//! to "accepted". Failures re-arm the detector so the next change retries.

use std::sync::Arc;

use shared::SubmissionRecord;
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    extractor::{ExtractError, Extractor},
    page::PageSnapshot,
};

#[async_trait::async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(&self, record: SubmissionRecord) -> anyhow::Result<()>;
}

/// Remembers the previous verdict and reports rising edges only.
#[derive(Debug, Default)]
pub struct EdgeDetector {
    last: bool,
}

impl EdgeDetector {
    pub fn observe(&mut self, success: bool) -> bool {
        let rising = success && !self.last;
        self.last = success;
        rising
    }

    pub fn reset(&mut self) {
        self.last = false;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Idle,
    Dropped(ExtractError),
    Forwarded(SubmissionRecord),
    ForwardFailed,
}

enum Inspection {
    Idle,
    Extracted(Result<SubmissionRecord, ExtractError>),
}

pub struct ChangeObserver<F> {
    extractor: Extractor,
    forwarder: F,
    edge: Mutex<EdgeDetector>,
}

impl<F: Forwarder> ChangeObserver<F> {
    pub fn new(extractor: Extractor, forwarder: F) -> Self {
        Self {
            extractor,
            forwarder,
            edge: Mutex::new(EdgeDetector::default()),
        }
    }

    // The parsed page is not Send, so it must be gone before any await.
    fn inspect(&self, snapshot: &PageSnapshot, edge: &mut EdgeDetector) -> Inspection {
        let doc = snapshot.document();
        let success = self.extractor.is_successful_submission(&doc);
        if !edge.observe(success) {
            return Inspection::Idle;
        }
        Inspection::Extracted(self.extractor.extract(&doc))
    }

    pub async fn on_mutation(&self, snapshot: &PageSnapshot) -> Outcome {
        let mut edge = self.edge.lock().await;
        let record = match self.inspect(snapshot, &mut edge) {
            Inspection::Idle => return Outcome::Idle,
            Inspection::Extracted(Ok(record)) => record,
            Inspection::Extracted(Err(e)) => {
                warn!("Accepted submission on {} could not be read: {e}", snapshot.url);
                edge.reset();
                return Outcome::Dropped(e);
            }
        };

        info!(
            "Accepted submission detected: {} {}",
            record.platform, record.problem_id
        );
        match self.forwarder.forward(record.clone()).await {
            Ok(()) => Outcome::Forwarded(record),
            Err(e) => {
                warn!("Failed to forward {}: {e:#}", record.problem_id);
                edge.reset();
                Outcome::ForwardFailed
            }
        }
    }
}

impl<F: Forwarder + 'static> ChangeObserver<F> {
    /// Consumes snapshots until the channel closes or the handle is disposed.
    pub fn spawn(self, mut batches: mpsc::Receiver<PageSnapshot>) -> ObserverHandle {
        let observer = Arc::new(self);
        let task = tokio::spawn(async move {
            while let Some(snapshot) = batches.recv().await {
                let outcome = observer.on_mutation(&snapshot).await;
                debug!("Snapshot of {} handled: {outcome:?}", snapshot.url);
            }
            debug!("Snapshot channel closed, observer stopped");
        });
        ObserverHandle { task: Some(task) }
    }
}

pub struct ObserverHandle {
    task: Option<JoinHandle<()>>,
}

impl ObserverHandle {
    pub fn dispose(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}
