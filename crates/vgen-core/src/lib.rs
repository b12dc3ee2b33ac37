//! Client for asynchronous video-generation jobs: submit a job, poll it to
//! completion with retry/backoff on transient failures, estimate progress,
//! and let the caller cancel at any time.

pub mod api;
pub mod config;
pub mod control;
pub mod error;
pub mod logging;
pub mod model;
pub mod poller;
pub mod progress;
pub mod retry;
pub mod transport;
