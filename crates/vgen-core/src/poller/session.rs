//! Tokio host for [`PollMachine`].

use super::config::PollConfig;
use super::event::{Outcome, PollEvent};
use super::machine::{Action, Input, PollMachine};
use crate::api::{ApiError, JobBackend};
use crate::control::CancelToken;
use crate::error::{normalize, CanonicalError, ErrorKind};
use crate::model::{GenerationRequest, JobHandle};
use std::future::Future;
use std::sync::{Arc, OnceLock};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;

/// Starts poll sessions against one backend.
#[derive(Debug)]
pub struct Poller<B> {
    backend: Arc<B>,
    config: PollConfig,
}

impl<B> Clone for Poller<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            config: self.config.clone(),
        }
    }
}

impl<B: JobBackend> Poller<B> {
    pub fn new(backend: Arc<B>, config: PollConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Submit `request` and poll the resulting job.
    pub fn start(&self, request: GenerationRequest) -> PollSession {
        self.spawn(PollMachine::submitting(self.config.clone(), request))
    }

    /// Poll a job that was already submitted.
    pub fn attach(&self, job_id: JobHandle) -> PollSession {
        self.spawn(PollMachine::attached(self.config.clone(), job_id))
    }

    fn spawn(&self, machine: PollMachine) -> PollSession {
        let (tx, rx) = mpsc::unbounded_channel();
        let token = CancelToken::new();
        let job_slot = Arc::new(OnceLock::new());
        if let Some(job_id) = machine.job_id() {
            let _ = job_slot.set(job_id.clone());
        }
        let driver = tokio::spawn(drive(
            Arc::clone(&self.backend),
            machine,
            token.clone(),
            tx,
            Arc::clone(&job_slot),
        ));
        PollSession::from_parts(rx, token, job_slot, driver)
    }
}

/// Run `call` on its own task unless the token fires first. On cancellation
/// the task is detached and its result is never looked at.
async fn guarded<T, F>(token: &CancelToken, call: F) -> Option<Result<T, ApiError>>
where
    T: Send + 'static,
    F: Future<Output = Result<T, ApiError>> + Send + 'static,
{
    if token.is_cancelled() {
        return None;
    }
    let mut handle = tokio::spawn(call);
    tokio::select! {
        biased;
        _ = token.cancelled() => None,
        joined = &mut handle => {
            Some(joined.unwrap_or_else(|e| Err(ApiError::Interrupted(e.to_string()))))
        }
    }
}

async fn drive<B: JobBackend>(
    backend: Arc<B>,
    mut machine: PollMachine,
    token: CancelToken,
    events: mpsc::UnboundedSender<PollEvent>,
    job_slot: Arc<OnceLock<JobHandle>>,
) {
    let retry = machine.config().retry.clone();
    let mut accepted_at = Instant::now();

    let mut action = machine.start();
    loop {
        let input = match action {
            Action::Submit(request) => {
                let call = {
                    let backend = Arc::clone(&backend);
                    let retry = retry.clone();
                    async move { backend.submit(&request, &retry).await }
                };
                match guarded(&token, call).await {
                    None => Input::Cancel,
                    Some(Ok(receipt)) => {
                        accepted_at = Instant::now();
                        let _ = job_slot.set(receipt.job_id.clone());
                        Input::Submitted(Ok(receipt.job_id))
                    }
                    Some(Err(e)) => Input::Submitted(Err(normalize(&e))),
                }
            }
            Action::Poll { after } => {
                if !token.sleep(after).await {
                    Input::Cancel
                } else {
                    let Some(job_id) = machine.job_id().cloned() else {
                        break;
                    };
                    let call = {
                        let backend = Arc::clone(&backend);
                        let retry = retry.clone();
                        async move { backend.status(&job_id, &retry).await }
                    };
                    match guarded(&token, call).await {
                        None => Input::Cancel,
                        Some(result) => Input::Polled(result.map_err(|e| normalize(&e))),
                    }
                }
            }
            Action::Idle | Action::Stop => break,
        };

        let step = machine.tick(input, accepted_at.elapsed());
        for event in step.events {
            log_event(machine.job_id(), &event);
            if events.send(event).is_err() {
                // Session handle dropped; nobody is listening.
                token.cancel();
            }
        }
        action = step.action;
    }
}

fn log_event(job_id: Option<&JobHandle>, event: &PollEvent) {
    let job_id = job_id.map(JobHandle::as_str).unwrap_or("-");
    match event {
        PollEvent::Snapshot(s) => {
            tracing::debug!(job_id, progress = s.progress, "job processing")
        }
        PollEvent::QueryFailed { attempt, error } => tracing::warn!(
            job_id,
            attempt,
            kind = %error.kind,
            "status query failed: {}",
            error
        ),
        PollEvent::Finished(outcome) => match outcome {
            Outcome::Completed(s) => tracing::info!(
                job_id,
                result_url = s.result_url.as_deref().unwrap_or(""),
                "job completed"
            ),
            Outcome::Failed(s) => tracing::warn!(
                job_id,
                "job failed: {}",
                s.error_message.as_deref().unwrap_or("")
            ),
            Outcome::SubmitFailed(e) => {
                tracing::error!(kind = %e.kind, "submission failed: {}", e)
            }
            Outcome::TimedOut {
                attempts, budget, ..
            } => tracing::warn!(job_id, attempts, %budget, "gave up polling"),
            Outcome::Cancelled { .. } => tracing::info!(job_id, "poll session cancelled"),
            Outcome::Aborted(e) => tracing::error!(job_id, "poll session aborted: {}", e),
        },
    }
}

/// Caller side of one poll session.
///
/// Events arrive in poll order and the terminal `Finished` event is the last
/// one. After [`PollSession::cancel`] the next event is `Finished(Cancelled)`,
/// even if other events were already queued. Dropping the session cancels it.
#[derive(Debug)]
pub struct PollSession {
    events: mpsc::UnboundedReceiver<PollEvent>,
    token: CancelToken,
    job_id: Arc<OnceLock<JobHandle>>,
    driver: Option<JoinHandle<()>>,
    outcome: Option<Outcome>,
}

impl PollSession {
    pub(super) fn from_parts(
        events: mpsc::UnboundedReceiver<PollEvent>,
        token: CancelToken,
        job_id: Arc<OnceLock<JobHandle>>,
        driver: JoinHandle<()>,
    ) -> Self {
        Self {
            events,
            token,
            job_id,
            driver: Some(driver),
            outcome: None,
        }
    }

    /// Next event, or `None` once the terminal event has been delivered.
    pub async fn next_event(&mut self) -> Option<PollEvent> {
        if self.outcome.is_some() {
            return None;
        }
        let received = tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            event = self.events.recv() => event,
        };
        let event = match received {
            _ if self.token.is_cancelled() => {
                self.events.close();
                PollEvent::Finished(Outcome::Cancelled {
                    job_id: self.job_id().cloned(),
                })
            }
            Some(event) => event,
            None => PollEvent::Finished(self.driver_exit().await),
        };
        if let PollEvent::Finished(outcome) = &event {
            self.outcome = Some(outcome.clone());
        }
        Some(event)
    }

    /// The channel closed without a terminal event: the driver task is gone.
    async fn driver_exit(&mut self) -> Outcome {
        let detail = match self.driver.take() {
            Some(handle) => match handle.await {
                Ok(()) => "driver stopped without a result".to_string(),
                Err(e) => join_failure(e),
            },
            None => "driver stopped without a result".to_string(),
        };
        let error = CanonicalError::new(
            ErrorKind::Unknown,
            "poll session stopped unexpectedly",
            Some(detail),
        );
        log_event(self.job_id(), &PollEvent::Finished(Outcome::Aborted(error.clone())));
        Outcome::Aborted(error)
    }

    /// Drain the session and return how it ended.
    pub async fn wait(mut self) -> Outcome {
        while self.next_event().await.is_some() {}
        match self.outcome.take() {
            Some(outcome) => outcome,
            None => self.driver_exit().await,
        }
    }

    /// Stop observing the job. The remote job keeps running.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// A token that cancels this session, e.g. for a [`crate::control::SessionRegistry`].
    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    /// The job id, once the backend has accepted the job.
    pub fn job_id(&self) -> Option<&JobHandle> {
        self.job_id.get()
    }

    /// True once the terminal event has been received.
    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }
}

fn join_failure(e: JoinError) -> String {
    if !e.is_panic() {
        return e.to_string();
    }
    let payload = e.into_panic();
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "driver task panicked".to_string())
}

impl Drop for PollSession {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
