//! `vgen health` – check the backend.

use anyhow::Result;
use vgen_core::api::BackendClient;
use vgen_core::error::normalize;
use vgen_core::retry::RetryPolicy;
use vgen_core::transport::CurlTransport;

pub async fn run_health(client: &BackendClient<CurlTransport>, retry: &RetryPolicy) -> Result<()> {
    let report = client.health(retry).await.map_err(|e| normalize(&e))?;
    let message = report.message.as_deref().unwrap_or("");
    if !report.is_ok() {
        anyhow::bail!("backend at {} unhealthy: {} {}", client.base_url(), report.status, message);
    }
    println!("{} ok {}", client.base_url(), message);
    Ok(())
}
