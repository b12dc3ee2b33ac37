//! `vgen submit <post-id>` – submit a job without waiting for it.

use anyhow::Result;
use vgen_core::api::BackendClient;
use vgen_core::error::normalize;
use vgen_core::model::GenerationRequest;
use vgen_core::retry::RetryPolicy;
use vgen_core::transport::CurlTransport;

pub async fn run_submit(
    client: &BackendClient<CurlTransport>,
    request: &GenerationRequest,
    retry: &RetryPolicy,
) -> Result<()> {
    let receipt = client
        .submit_job(request, retry)
        .await
        .map_err(|e| normalize(&e))?;
    println!("Submitted job {}", receipt.job_id);
    println!("Follow it with: vgen watch {}", receipt.job_id);
    Ok(())
}
