//! `vgen generate <post-id>` – submit a job and follow it.

use anyhow::Result;
use std::sync::Arc;
use vgen_core::api::BackendClient;
use vgen_core::model::GenerationRequest;
use vgen_core::poller::{PollConfig, Poller};
use vgen_core::transport::CurlTransport;

use super::follow::follow_all;

pub async fn run_generate(
    client: BackendClient<CurlTransport>,
    poll: PollConfig,
    request: GenerationRequest,
) -> Result<()> {
    println!(
        "Generating {}s {} video for post {}",
        request.options().duration,
        request.options().style,
        request.source().post_id
    );
    let poller = Poller::new(Arc::new(client), poll);
    follow_all(vec![poller.start(request)]).await
}
