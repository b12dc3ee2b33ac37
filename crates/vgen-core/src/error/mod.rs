//! Error normalization and the caller-facing failure taxonomy.

mod failure;
mod normalize;

pub use failure::{Budget, FailureKind, PollFailure};
pub use normalize::{normalize, normalize_anyhow, CanonicalError, ErrorKind};
