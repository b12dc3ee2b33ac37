//! `vgen watch <job-id>...` – follow already-submitted jobs.

use anyhow::Result;
use std::sync::Arc;
use vgen_core::api::BackendClient;
use vgen_core::model::JobHandle;
use vgen_core::poller::{PollConfig, Poller};
use vgen_core::transport::CurlTransport;

use super::follow::follow_all;

pub async fn run_watch(
    client: BackendClient<CurlTransport>,
    poll: PollConfig,
    job_ids: &[String],
) -> Result<()> {
    let poller = Poller::new(Arc::new(client), poll);
    let sessions = job_ids
        .iter()
        .map(|id| poller.attach(JobHandle::new(id.as_str())))
        .collect();
    follow_all(sessions).await
}
