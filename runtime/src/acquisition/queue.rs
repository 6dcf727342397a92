//! Single-flight FIFO queue in front of the pipeline.
//!
//! One worker task owns the pipeline and the browser session manager, so
//! two runs can never overlap. Jobs are served strictly in arrival order.
//! When a job settles and another is already waiting, the worker pauses for
//! the cool-down before starting it; a job submitted to an idle queue starts
//! immediately.

use super::pipeline::AcquisitionPipeline;
use crate::error::{AcquisitionError, AcquisitionResult};
use crate::model::Item;
use crate::session::BrowserSessionManager;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Default pause between back-to-back runs.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(1);

/// What a job's caller eventually receives.
pub type JobOutcome = AcquisitionResult<Vec<Item>>;

#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub cooldown: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

/// One caller's pending request.
struct Job {
    id: Uuid,
    requested_count: usize,
    enqueued_at: Instant,
    outcome: oneshot::Sender<JobOutcome>,
}

impl Job {
    /// Deliver the outcome. Consumes the job, so it can only happen once.
    fn settle(self, outcome: JobOutcome) {
        if self.outcome.send(outcome).is_err() {
            debug!(job = %self.id, "caller went away before the outcome was delivered");
        }
    }
}

/// Handle for submitting acquisition jobs.
pub struct AcquisitionQueue {
    tx: mpsc::UnboundedSender<Job>,
    pending: Arc<AtomicUsize>,
    busy: Arc<AtomicBool>,
}

impl AcquisitionQueue {
    /// Spawn the worker. Must be called inside a tokio runtime.
    pub fn spawn(
        pipeline: AcquisitionPipeline,
        sessions: BrowserSessionManager,
        config: QueueConfig,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        let busy = Arc::new(AtomicBool::new(false));

        let worker = QueueWorker {
            rx,
            pipeline,
            sessions,
            cooldown: config.cooldown,
            pending: Arc::clone(&pending),
            busy: Arc::clone(&busy),
        };
        tokio::spawn(worker.run());

        Self { tx, pending, busy }
    }

    /// Enqueue a request for up to `requested_count` items and wait for it.
    pub async fn submit(&self, requested_count: usize) -> JobOutcome {
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let job = Job {
            id: Uuid::new_v4(),
            requested_count,
            enqueued_at: Instant::now(),
            outcome: outcome_tx,
        };
        let id = job.id;

        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(job).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(AcquisitionError::QueueClosed);
        }
        debug!(job = %id, requested_count, "job enqueued");

        outcome_rx.await.unwrap_or(Err(AcquisitionError::QueueClosed))
    }

    /// Jobs waiting behind the current run.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Whether a run is in progress right now.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

struct QueueWorker {
    rx: mpsc::UnboundedReceiver<Job>,
    pipeline: AcquisitionPipeline,
    sessions: BrowserSessionManager,
    cooldown: Duration,
    pending: Arc<AtomicUsize>,
    busy: Arc<AtomicBool>,
}

impl QueueWorker {
    async fn run(mut self) {
        let mut next: Option<Job> = None;

        loop {
            let job = match next.take() {
                Some(job) => job,
                None => match self.rx.recv().await {
                    Some(job) => job,
                    None => break,
                },
            };

            self.process(job).await;

            match self.rx.try_recv() {
                Ok(waiting) => {
                    debug!(cooldown_ms = self.cooldown.as_millis() as u64, "cooling down before next job");
                    tokio::time::sleep(self.cooldown).await;
                    next = Some(waiting);
                }
                Err(mpsc::error::TryRecvError::Empty) => {}
                Err(mpsc::error::TryRecvError::Disconnected) => break,
            }
        }

        self.sessions.stop().await;
        debug!("acquisition queue worker stopped");
    }

    async fn process(&mut self, job: Job) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
        self.busy.store(true, Ordering::SeqCst);
        info!(
            job = %job.id,
            requested = job.requested_count,
            waited_ms = job.enqueued_at.elapsed().as_millis() as u64,
            "processing acquisition job"
        );

        let run = AssertUnwindSafe(self.pipeline.run(&mut self.sessions, job.requested_count))
            .catch_unwind()
            .await;

        let outcome = match run {
            Ok(items) => Ok(items),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(job = %job.id, "acquisition run panicked: {message}");
                self.sessions.stop().await;
                Err(AcquisitionError::JobAborted(message))
            }
        };

        self.busy.store(false, Ordering::SeqCst);
        job.settle(outcome);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
