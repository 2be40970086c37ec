// Batch scheduler - Bounded-concurrency dispatch with per-job failure isolation

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::domain::errors::DomainError;
use crate::domain::model::{
    BatchProgress, Job, JobId, JobKind, JobOutput, JobStatus, JobSummary, MediaSource,
};
use crate::ports::{BatchObserver, NoopObserver, ProgressSink};

use super::processor::JobProcessor;

/// Maximum number of jobs in Processing at once
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Jobs and counters of the current batch
#[derive(Debug, Default)]
struct BatchState {
    jobs: Vec<Job>,
    processed: usize,
    /// Bumped on reset; results from older generations are discarded
    generation: u64,
}

impl BatchState {
    fn progress(&self) -> BatchProgress {
        BatchProgress {
            processed: self.processed,
            total: self.jobs.len(),
        }
    }

    fn job_mut(&mut self, id: JobId) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|job| job.id == id)
    }
}

fn lock(state: &Mutex<BatchState>) -> MutexGuard<'_, BatchState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Serialisable view of the batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchSnapshot {
    pub progress: BatchProgress,
    pub jobs: Vec<JobSummary>,
}

impl BatchSnapshot {
    pub fn count(&self, status: JobStatus) -> usize {
        self.jobs.iter().filter(|job| job.status == status).count()
    }
}

/// A claimed job, moved into its worker task
struct Claim {
    id: JobId,
    kind: JobKind,
    file_name: String,
    source: MediaSource,
}

/// Per-job handle on the batch state, shared by the worker's progress
/// reports and its final settlement
#[derive(Clone)]
struct JobContext {
    state: Arc<Mutex<BatchState>>,
    observer: Arc<dyn BatchObserver>,
    id: JobId,
    generation: u64,
}

impl JobContext {
    /// Record the terminal state of the job, unless the batch was reset since
    fn settle(&self, result: Result<JobOutput, DomainError>) {
        let id = self.id;
        let (status, progress) = {
            let mut state = lock(&self.state);
            if state.generation != self.generation {
                debug!("Discarding result of {} from a superseded batch", id);
                return;
            }
            let Some(job) = state.job_mut(id) else {
                debug!("Discarding result of unknown job {}", id);
                return;
            };

            let transition = match result {
                Ok(output) => {
                    info!("{} completed ({} bytes, {})", id, output.len(), output.mime);
                    job.complete(output)
                }
                Err(e) => {
                    warn!("{} failed: {}", id, e);
                    job.fail(&e)
                }
            };
            if let Err(e) = transition {
                warn!("Ignoring result for {}: {}", id, e);
                return;
            }

            let status = job.status();
            state.processed += 1;
            (status, state.progress())
        };

        self.observer.on_status(id, status);
        self.observer.on_batch_progress(progress);
    }
}

impl ProgressSink for JobContext {
    fn report(&self, percent: u8) {
        {
            let mut state = lock(&self.state);
            if state.generation != self.generation {
                return;
            }
            match state.job_mut(self.id) {
                Some(job) => job.set_progress(percent),
                None => return,
            }
        }
        self.observer.on_progress(self.id, percent);
    }
}

/// Process one claimed job and settle it.
///
/// Runs detached from the dispatcher, so the job reaches a terminal state
/// even when the caller of `dispatch_next` goes away.
async fn run_worker(processor: Arc<JobProcessor>, claim: Claim, context: JobContext) {
    let Claim {
        kind,
        file_name,
        source,
        ..
    } = claim;
    info!("Processing {}", file_name);

    let sink = context.clone();
    let processing = tokio::spawn(
        async move { processor.process(kind, &source, &file_name, &sink).await }
            .in_current_span(),
    );
    let result = match processing.await {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(DomainError::Internal(format!("worker panicked: {e}"))),
        Err(e) => Err(DomainError::Internal(format!("worker task aborted: {e}"))),
    };
    context.settle(result);
}

/// Wait for every worker of a window, leaving unfinished handles in place
/// if this future is dropped
async fn drain(window: &mut Vec<JoinHandle<()>>) {
    while let Some(handle) = window.last_mut() {
        if let Err(e) = handle.await {
            warn!("Worker task ended abnormally: {}", e);
        }
        window.pop();
    }
}

/// Owns the job queue and drives jobs through their lifecycle.
///
/// Jobs are dispatched in fixed windows of `concurrency` in insertion order;
/// the next window starts only once every job of the current one is terminal.
pub struct BatchScheduler {
    state: Arc<Mutex<BatchState>>,
    processor: Arc<JobProcessor>,
    observer: Arc<dyn BatchObserver>,
    concurrency: usize,
    /// Workers of the window in flight; an abandoned dispatch leaves its
    /// handles here for the next one to wait on
    window: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl BatchScheduler {
    pub fn new(processor: Arc<JobProcessor>) -> Self {
        Self {
            state: Arc::new(Mutex::new(BatchState::default())),
            processor,
            observer: Arc::new(NoopObserver),
            concurrency: DEFAULT_CONCURRENCY,
            window: tokio::sync::Mutex::new(Vec::new()),
        }
    }

    /// Set the concurrency ceiling (at least 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn BatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Append pending jobs to the batch; returns the ids accepted
    pub fn enqueue(&self, jobs: impl IntoIterator<Item = Job>) -> Vec<JobId> {
        let (accepted, progress) = {
            let mut state = lock(&self.state);
            let mut accepted = Vec::new();
            for job in jobs {
                if job.status() != JobStatus::Pending {
                    warn!("Ignoring {} job {} on enqueue", job.status(), job.id);
                    continue;
                }
                accepted.push(job.id);
                state.jobs.push(job);
            }
            (accepted, state.progress())
        };

        debug!("Enqueued {} jobs ({} total)", accepted.len(), progress.total);
        self.observer.on_batch_progress(progress);
        accepted
    }

    /// Claim and run the next window of pending jobs to completion.
    ///
    /// Returns the number of jobs dispatched; zero when nothing is pending.
    pub async fn dispatch_next(&self) -> usize {
        let mut window = self.window.lock().await;
        // Workers left behind by an abandoned dispatch still count against the ceiling
        drain(&mut window).await;

        let (claims, generation) = self.claim_window();
        if claims.is_empty() {
            return 0;
        }
        for claim in &claims {
            self.observer.on_status(claim.id, JobStatus::Processing);
        }

        let dispatched = claims.len();
        for claim in claims {
            let context = JobContext {
                state: Arc::clone(&self.state),
                observer: Arc::clone(&self.observer),
                id: claim.id,
                generation,
            };
            let span = info_span!("job", id = %claim.id, kind = %claim.kind);
            window.push(tokio::spawn(
                run_worker(Arc::clone(&self.processor), claim, context).instrument(span),
            ));
        }
        drain(&mut window).await;

        dispatched
    }

    /// Dispatch windows until no pending job remains
    pub async fn run(&self) -> BatchProgress {
        while self.dispatch_next().await > 0 {}
        let progress = self.progress();
        info!("Batch finished: {}/{} jobs processed", progress.processed, progress.total);
        progress
    }

    /// Discard every job and its derived handles.
    ///
    /// Work already in flight runs to completion and its result is dropped.
    pub fn reset(&self) {
        let progress = {
            let mut state = lock(&self.state);
            state.generation += 1;
            for job in state.jobs.iter_mut() {
                job.release();
            }
            let discarded = state.jobs.len();
            state.jobs.clear();
            state.processed = 0;
            debug!("Reset batch, discarded {} jobs", discarded);
            state.progress()
        };
        self.observer.on_batch_progress(progress);
    }

    pub fn progress(&self) -> BatchProgress {
        lock(&self.state).progress()
    }

    pub fn snapshot(&self) -> BatchSnapshot {
        let state = lock(&self.state);
        BatchSnapshot {
            progress: state.progress(),
            jobs: state.jobs.iter().map(Job::summary).collect(),
        }
    }

    /// Clones of every job in insertion order
    pub fn jobs(&self) -> Vec<Job> {
        lock(&self.state).jobs.clone()
    }

    pub fn job(&self, id: JobId) -> Option<Job> {
        lock(&self.state).jobs.iter().find(|job| job.id == id).cloned()
    }

    fn claim_window(&self) -> (Vec<Claim>, u64) {
        let mut state = lock(&self.state);
        let generation = state.generation;
        let mut claims = Vec::new();

        for job in state.jobs.iter_mut() {
            if claims.len() >= self.concurrency {
                break;
            }
            if job.status() != JobStatus::Pending {
                continue;
            }
            if let Err(e) = job.begin() {
                warn!("Cannot claim {}: {}", job.id, e);
                continue;
            }
            claims.push(Claim {
                id: job.id,
                kind: job.kind,
                file_name: job.file_name.clone(),
                source: job.source.clone(),
            });
        }

        (claims, generation)
    }
}
