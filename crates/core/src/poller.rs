//! Job status polling.
//!
//! A [`PollHandle`] owns the repeating timer of one job. The timer stops on
//! the first terminal status, on [`PollHandle::stop`], or when the handle is
//! dropped, whichever comes first. Requests never overlap: the next tick is
//! not awaited until the previous status request has finished.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    backend::JobBackend,
    error::ReelnoteError,
    notice::Notice,
    types::{Job, JobStatus, TaskId},
};

#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// Non-terminal status report.
    Progress(Job),
    Completed(Job),
    Failed(Job),
    /// The status request itself failed; polling continues.
    RequestFailed { task_id: TaskId, reason: String },
}

impl PollEvent {
    pub fn notice(&self) -> Option<Notice> {
        match self {
            PollEvent::Progress(_) => None,
            PollEvent::Completed(_) => Some(Notice::success("Video processing completed!")),
            PollEvent::Failed(job) => Some(match &job.status {
                JobStatus::Error { message } if !message.is_empty() => {
                    Notice::error(format!("Error processing video: {message}"))
                }
                _ => Notice::error("Error processing video"),
            }),
            PollEvent::RequestFailed { reason, .. } => {
                Some(Notice::error(format!("Could not check job status: {reason}")))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed(Job),
    Failed(Job),
    /// The backend no longer knows the task.
    NotFound(TaskId),
    Cancelled,
}

#[derive(Clone)]
pub struct StatusPoller {
    backend: Arc<dyn JobBackend>,
    interval: Duration,
}

impl StatusPoller {
    pub fn new(backend: Arc<dyn JobBackend>, interval: Duration) -> Self {
        Self { backend, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start polling `task_id`. The first request goes out one interval from
    /// now.
    pub fn start(&self, task_id: TaskId) -> PollHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        info!(%task_id, interval_ms = self.interval.as_millis() as u64, "polling started");
        let task = tokio::spawn(run(
            Arc::clone(&self.backend),
            task_id,
            self.interval,
            shutdown_rx,
            events_tx,
        ));

        PollHandle {
            events: events_rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

pub struct PollHandle {
    events: mpsc::UnboundedReceiver<PollEvent>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<PollOutcome>>,
}

impl PollHandle {
    /// Next status event, or `None` once polling has ended.
    pub async fn next_event(&mut self) -> Option<PollEvent> {
        self.events.recv().await
    }

    /// Wait for polling to end.
    pub async fn wait(mut self) -> PollOutcome {
        let Some(task) = self.task.take() else {
            return PollOutcome::Cancelled;
        };
        task.await.unwrap_or(PollOutcome::Cancelled)
    }

    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run(
    backend: Arc<dyn JobBackend>,
    task_id: TaskId,
    period: Duration,
    mut shutdown: oneshot::Receiver<()>,
    events: mpsc::UnboundedSender<PollEvent>,
) -> PollOutcome {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                debug!(%task_id, "polling cancelled");
                return PollOutcome::Cancelled;
            }
            _ = ticker.tick() => {}
        }

        let report = tokio::select! {
            _ = &mut shutdown => {
                debug!(%task_id, "polling cancelled during request");
                return PollOutcome::Cancelled;
            }
            report = backend.status(&task_id) => report,
        };

        match report {
            Ok(job) => match job.status {
                JobStatus::Completed => {
                    info!(%task_id, folder_id = ?job.folder_id, "job completed");
                    let _ = events.send(PollEvent::Completed(job.clone()));
                    return PollOutcome::Completed(job);
                }
                JobStatus::Error { ref message } => {
                    warn!(%task_id, %message, "job failed");
                    let _ = events.send(PollEvent::Failed(job.clone()));
                    return PollOutcome::Failed(job);
                }
                _ => {
                    debug!(%task_id, status = job.status.label(), progress = job.progress, "job progress");
                    let _ = events.send(PollEvent::Progress(job));
                }
            },
            Err(ReelnoteError::TaskNotFound { .. }) => {
                warn!(%task_id, "backend does not know the task");
                let _ = events.send(PollEvent::RequestFailed {
                    task_id: task_id.clone(),
                    reason: "task not found".into(),
                });
                return PollOutcome::NotFound(task_id);
            }
            Err(err) => {
                warn!(%task_id, error = %err, "status request failed");
                let _ = events.send(PollEvent::RequestFailed {
                    task_id: task_id.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }
}
