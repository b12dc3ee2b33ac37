//! Domain types shared by the API client and the poller.

mod request;
mod snapshot;

pub use request::{
    GenerationOptions, GenerationRequest, RequestError, SourceRef, MAX_DURATION_SECS,
    MIN_DURATION_SECS,
};
pub use snapshot::{JobHandle, JobSnapshot, JobStatus, StatusReport};
