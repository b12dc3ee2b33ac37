//! The poll session state machine.
//!
//! `Submitting -> Polling -> {Completed, Failed, TimedOut, Cancelled}`.
//!
//! The machine does no I/O and reads no clock: the host feeds it an
//! [`Input`] together with the time elapsed since the job was accepted, and
//! gets back the events to deliver and the next [`Action`] to schedule. The
//! tokio driver in `session.rs` is one such host; tests drive it directly.

use super::config::PollConfig;
use super::event::{Outcome, PollEvent};
use crate::error::{Budget, CanonicalError};
use crate::model::{GenerationRequest, JobHandle, JobSnapshot, JobStatus, StatusReport};
use crate::progress::ProgressEstimator;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Submitting,
    Polling,
    Completed,
    Failed,
    TimedOut,
    Cancelled,
}

impl PollState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PollState::Submitting | PollState::Polling)
    }
}

/// Result of the last scheduled action, or a cancellation request.
#[derive(Debug)]
pub enum Input {
    Submitted(Result<JobHandle, CanonicalError>),
    Polled(Result<StatusReport, CanonicalError>),
    Cancel,
}

/// What the host should do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Submit this request.
    Submit(GenerationRequest),
    /// Run one poll step after waiting `after`.
    Poll { after: Duration },
    /// The input did not apply to the current state; nothing new to schedule.
    Idle,
    /// The session is over.
    Stop,
}

/// Events produced by one tick plus the next action.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub events: Vec<PollEvent>,
    pub action: Action,
}

impl Step {
    fn quiet(action: Action) -> Self {
        Self {
            events: Vec::new(),
            action,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollMachine {
    config: PollConfig,
    estimator: ProgressEstimator,
    state: PollState,
    request: Option<GenerationRequest>,
    job_id: Option<JobHandle>,
    attempts: u32,
    last_progress: f64,
}

impl PollMachine {
    /// A session that still has to submit `request`.
    pub fn submitting(config: PollConfig, request: GenerationRequest) -> Self {
        Self::with_state(config, PollState::Submitting, Some(request), None)
    }

    /// A session for a job that was already accepted.
    pub fn attached(config: PollConfig, job_id: JobHandle) -> Self {
        Self::with_state(config, PollState::Polling, None, Some(job_id))
    }

    /// A zero attempt budget is treated as one poll step.
    fn with_state(
        mut config: PollConfig,
        state: PollState,
        request: Option<GenerationRequest>,
        job_id: Option<JobHandle>,
    ) -> Self {
        config.max_attempts = config.max_attempts.max(1);
        Self {
            estimator: ProgressEstimator::new(config.expected_duration),
            config,
            state,
            request,
            job_id,
            attempts: 0,
            last_progress: 0.0,
        }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn job_id(&self) -> Option<&JobHandle> {
        self.job_id.as_ref()
    }

    /// Poll steps completed so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// First action of the session.
    pub fn start(&mut self) -> Action {
        match self.state {
            PollState::Submitting => match self.request.take() {
                Some(request) => Action::Submit(request),
                None => Action::Idle,
            },
            PollState::Polling => Action::Poll {
                after: self.config.initial_delay,
            },
            _ => Action::Stop,
        }
    }

    /// Advance the machine. Once terminal, every input is dropped, which is
    /// how a late in-flight result is discarded.
    pub fn tick(&mut self, input: Input, elapsed: Duration) -> Step {
        if self.state.is_terminal() {
            return Step::quiet(Action::Stop);
        }
        match (self.state, input) {
            (_, Input::Cancel) => {
                let job_id = self.job_id.clone();
                self.finish(Outcome::Cancelled { job_id }, Vec::new())
            }
            (PollState::Submitting, Input::Submitted(Ok(job_id))) => {
                self.job_id = Some(job_id);
                self.state = PollState::Polling;
                Step::quiet(Action::Poll {
                    after: self.config.initial_delay,
                })
            }
            (PollState::Submitting, Input::Submitted(Err(error))) => {
                self.finish(Outcome::SubmitFailed(error), Vec::new())
            }
            (PollState::Polling, Input::Polled(result)) => match self.job_id.clone() {
                Some(job_id) => self.on_polled(job_id, result, elapsed),
                None => Step::quiet(Action::Idle),
            },
            _ => Step::quiet(Action::Idle),
        }
    }

    fn on_polled(
        &mut self,
        job_id: JobHandle,
        result: Result<StatusReport, CanonicalError>,
        elapsed: Duration,
    ) -> Step {
        self.attempts += 1;
        let mut events = Vec::new();
        match result {
            Ok(report) => match report.status {
                JobStatus::Completed => {
                    let snapshot = JobSnapshot::from_report(report, 1.0);
                    return self.finish(Outcome::Completed(snapshot), events);
                }
                JobStatus::Failed => {
                    let snapshot = JobSnapshot::from_report(report, self.last_progress);
                    return self.finish(Outcome::Failed(snapshot), events);
                }
                JobStatus::Processing => {
                    let progress = self.next_progress(elapsed, report.progress);
                    events.push(PollEvent::Snapshot(JobSnapshot::from_report(report, progress)));
                }
            },
            Err(error) => events.push(PollEvent::QueryFailed {
                attempt: self.attempts,
                error,
            }),
        }

        if let Some(budget) = self.exhausted_budget(elapsed) {
            let outcome = Outcome::TimedOut {
                job_id,
                attempts: self.attempts,
                elapsed,
                budget,
            };
            return self.finish(outcome, events);
        }
        Step {
            events,
            action: Action::Poll {
                after: self.config.poll_interval,
            },
        }
    }

    /// Progress for a processing snapshot: clamped to [0, 1] and never below
    /// what was already delivered.
    fn next_progress(&mut self, elapsed: Duration, reported: Option<f64>) -> f64 {
        let raw = self.estimator.estimate(elapsed.as_secs_f64(), reported);
        if raw.is_finite() {
            self.last_progress = self.last_progress.max(raw.clamp(0.0, 1.0));
        }
        self.last_progress
    }

    fn exhausted_budget(&self, elapsed: Duration) -> Option<Budget> {
        if self.attempts >= self.config.max_attempts {
            return Some(Budget::Attempts(self.config.max_attempts));
        }
        match self.config.max_elapsed {
            Some(ceiling) if elapsed >= ceiling => Some(Budget::Elapsed(ceiling)),
            _ => None,
        }
    }

    fn finish(&mut self, outcome: Outcome, mut events: Vec<PollEvent>) -> Step {
        self.state = outcome.state();
        events.push(PollEvent::Finished(outcome));
        Step {
            events,
            action: Action::Stop,
        }
    }
}
