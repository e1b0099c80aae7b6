/// Background fractal jobs.
///
/// A job runs one [`FractalGenerator`] on its own thread and streams tagged
/// [`FractalMessage`]s back over a channel that belongs to that job alone.
/// Cancellation is cooperative: the generator checks a shared [`CancelToken`]
/// before every emitted item. A watchdog thread enforces the wall-clock budget
/// by flipping the same token to `TimedOut`.
///
/// [`FractalEngine`] is the per-drawable slot: starting a job cancels and
/// drops the previous one together with its channel, so nothing the old job
/// produced can reach the consumer afterwards.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::wire::FractalMessage;
use crate::error::{MathVizError, Result};
use crate::formulas::{Completion, FractalGenerator, FractalOutput};

pub type JobId = u64;

/// Terminal state of a job. Cancellation and timeout are normal endings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobStatus {
    Completed,
    Cancelled,
    TimedOut,
    /// The generator hit a dimension mismatch or similar hard error.
    Failed,
}

const RUNNING: u8 = 0;
const CANCELLED: u8 = 1;
const TIMED_OUT: u8 = 2;

/// Shared stop flag. The first stop reason wins.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicU8>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the job was already stopped.
    pub fn cancel(&self) -> bool {
        self.stop(CANCELLED)
    }

    pub fn time_out(&self) -> bool {
        self.stop(TIMED_OUT)
    }

    fn stop(&self, reason: u8) -> bool {
        self.0.compare_exchange(RUNNING, reason, Ordering::AcqRel, Ordering::Acquire).is_ok()
    }

    #[inline(always)]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire) != RUNNING
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire) == CANCELLED
    }

    /// Why the job was stopped, if it was.
    pub fn stop_status(&self) -> Option<JobStatus> {
        match self.0.load(Ordering::Acquire) {
            CANCELLED => Some(JobStatus::Cancelled),
            TIMED_OUT => Some(JobStatus::TimedOut),
            _ => None,
        }
    }
}

/// What a job sends to its consumer.
#[derive(Clone, Debug, PartialEq)]
pub enum JobEvent {
    Result(FractalMessage),
    Done { job_id: JobId, status: JobStatus },
}

/// The job's side of the channel.
pub struct JobContext {
    pub id: JobId,
    pub token: CancelToken,
    sender: Sender<JobEvent>,
}

impl JobContext {
    pub fn new(id: JobId, token: CancelToken, sender: Sender<JobEvent>) -> Self {
        Self { id, token, sender }
    }

    /// Tag and forward one result. Breaks once the job is stopped or nobody is listening.
    pub fn emit(&self, output: FractalOutput) -> ControlFlow<()> {
        if self.token.is_stopped() {
            return ControlFlow::Break(());
        }
        match self.sender.send(JobEvent::Result(FractalMessage::from_output(self.id, output))) {
            Ok(()) => ControlFlow::Continue(()),
            Err(_) => {
                log::debug!("job {}: consumer went away", self.id);
                ControlFlow::Break(())
            }
        }
    }

    /// Drive `generator` to its end and report the final status as the last event.
    pub fn run(self, generator: &mut dyn FractalGenerator) -> JobStatus {
        log::debug!("job {}: running {}", self.id, generator.name());
        let status = match generator.run(&mut |out| self.emit(out)) {
            Ok(Completion::Finished) => JobStatus::Completed,
            Ok(Completion::Stopped) => self.token.stop_status().unwrap_or(JobStatus::Cancelled),
            Err(e) => {
                log::error!("job {}: {e}", self.id);
                JobStatus::Failed
            }
        };
        log::info!("job {} ({}) finished: {status:?}", self.id, generator.name());
        // consumer may already be gone
        let _ = self.sender.send(JobEvent::Done { job_id: self.id, status });
        status
    }
}

/// Handle to one running or finished job.
pub struct FractalJob {
    id: JobId,
    token: CancelToken,
    receiver: Receiver<JobEvent>,
    worker: Option<JoinHandle<()>>,
    status: Option<JobStatus>,
}

impl FractalJob {
    /// Spawn `generator` on a worker thread, plus a watchdog when `timeout` is set.
    fn spawn(id: JobId, mut generator: Box<dyn FractalGenerator>, timeout: Option<Duration>) -> Result<Self> {
        let token = CancelToken::new();
        let (sender, receiver) = mpsc::channel();
        let context = JobContext::new(id, token.clone(), sender);

        // the worker owns `finished`; its exit disconnects the watchdog
        let (finished, watch) = mpsc::channel::<()>();
        let worker = thread::Builder::new()
            .name(format!("fractal-job-{id}"))
            .spawn(move || {
                let _finished = finished;
                context.run(generator.as_mut());
            })
            .map_err(|e| {
                log::warn!("job {id}: cannot spawn worker: {e}");
                MathVizError::UnsupportedFeature("threads")
            })?;

        if let Some(limit) = timeout {
            let watchdog_token = token.clone();
            let spawned = thread::Builder::new().name(format!("fractal-watchdog-{id}")).spawn(move || {
                if let Err(RecvTimeoutError::Timeout) = watch.recv_timeout(limit) {
                    if watchdog_token.time_out() {
                        log::info!("job {id}: timed out after {limit:?}");
                    }
                }
            });
            if let Err(e) = spawned {
                log::warn!("job {id}: no watchdog, running without a timeout: {e}");
            }
        }

        Ok(Self { id, token, receiver, worker: Some(worker), status: None })
    }

    /// Run `generator` to completion on the calling thread. Results stay queued for `poll`.
    fn run_inline(id: JobId, mut generator: Box<dyn FractalGenerator>) -> Self {
        let token = CancelToken::new();
        let (sender, receiver) = mpsc::channel();
        JobContext::new(id, token.clone(), sender).run(generator.as_mut());
        Self { id, token, receiver, worker: None, status: None }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Final status once the job's last event has been received.
    pub fn status(&self) -> Option<JobStatus> {
        self.status
    }

    fn accept(&mut self, event: JobEvent, out: &mut Vec<FractalMessage>) {
        match event {
            JobEvent::Result(msg) if msg.job_id() == self.id && !self.token.is_cancelled() => out.push(msg),
            JobEvent::Result(msg) => log::trace!("job {}: dropped result of job {}", self.id, msg.job_id()),
            JobEvent::Done { job_id, status } if job_id == self.id => self.status = Some(status),
            JobEvent::Done { .. } => {}
        }
    }

    /// Non-blocking drain of up to `max` results.
    fn poll(&mut self, max: usize) -> Vec<FractalMessage> {
        let mut out = Vec::new();
        while out.len() < max {
            match self.receiver.try_recv() {
                Ok(event) => self.accept(event, &mut out),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.mark_disconnected();
                    break;
                }
            }
        }
        out
    }

    /// Block until the job ends, returning every result not yet polled.
    fn wait(&mut self) -> Vec<FractalMessage> {
        let mut out = Vec::new();
        while self.status.is_none() {
            match self.receiver.recv() {
                Ok(event) => self.accept(event, &mut out),
                Err(_) => self.mark_disconnected(),
            }
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("job {}: worker panicked", self.id);
            }
        }
        out
    }

    fn mark_disconnected(&mut self) {
        if self.status.is_none() {
            // worker exited without a final event, i.e. it panicked
            self.status = Some(JobStatus::Failed);
        }
    }
}

impl Drop for FractalJob {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Slot holding at most one active job.
#[derive(Default)]
pub struct FractalEngine {
    job: Option<FractalJob>,
    next_id: JobId,
}

impl FractalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> JobId {
        self.next_id += 1;
        self.next_id
    }

    /// Start `generator` on a worker thread, superseding any current job.
    ///
    /// Fails with `UnsupportedFeature("threads")` where threads are unavailable;
    /// the caller can fall back to [`FractalEngine::run_blocking`].
    pub fn start(&mut self, generator: Box<dyn FractalGenerator>, timeout: Option<Duration>) -> Result<JobId> {
        if cfg!(target_arch = "wasm32") {
            return Err(MathVizError::UnsupportedFeature("threads"));
        }
        self.supersede();
        let id = self.allocate_id();
        let job = FractalJob::spawn(id, generator, timeout)?;
        log::info!("job {id}: started (timeout {timeout:?})");
        self.job = Some(job);
        Ok(id)
    }

    /// Run `generator` to the end on this thread, superseding any current job.
    pub fn run_blocking(&mut self, generator: Box<dyn FractalGenerator>) -> JobId {
        self.supersede();
        let id = self.allocate_id();
        self.job = Some(FractalJob::run_inline(id, generator));
        id
    }

    fn supersede(&mut self) {
        if let Some(old) = self.job.take() {
            if old.token.cancel() {
                log::info!("job {}: superseded", old.id);
            }
        }
    }

    /// Ask the active job to stop. Results it has not yet delivered are discarded.
    pub fn cancel(&mut self) -> Option<JobId> {
        let job = self.job.as_ref()?;
        if job.token.cancel() {
            log::info!("job {}: cancel requested", job.id);
        }
        Some(job.id)
    }

    pub fn active_id(&self) -> Option<JobId> {
        self.job.as_ref().map(FractalJob::id)
    }

    pub fn job(&self) -> Option<&FractalJob> {
        self.job.as_ref()
    }

    /// True while a job exists and its final status has not arrived.
    pub fn is_running(&self) -> bool {
        self.job.as_ref().is_some_and(|j| j.status.is_none())
    }

    pub fn status(&self) -> Option<JobStatus> {
        self.job.as_ref().and_then(FractalJob::status)
    }

    /// Up to `max` results from the active job, in generation order.
    pub fn poll(&mut self, max: usize) -> Vec<FractalMessage> {
        self.job.as_mut().map(|j| j.poll(max)).unwrap_or_default()
    }

    /// Block until the active job ends; returns its remaining results.
    pub fn wait(&mut self) -> Vec<FractalMessage> {
        self.job.as_mut().map(FractalJob::wait).unwrap_or_default()
    }
}
