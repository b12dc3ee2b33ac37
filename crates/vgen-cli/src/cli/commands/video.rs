//! `vgen video <job-id>` – show a completed video.

use anyhow::Result;
use vgen_core::api::BackendClient;
use vgen_core::error::normalize;
use vgen_core::model::JobHandle;
use vgen_core::retry::RetryPolicy;
use vgen_core::transport::CurlTransport;

pub async fn run_video(
    client: &BackendClient<CurlTransport>,
    job_id: &str,
    retry: &RetryPolicy,
) -> Result<()> {
    let details = client
        .completed_video(&JobHandle::from(job_id), retry)
        .await
        .map_err(|e| normalize(&e))?;
    let Some(v) = details else {
        anyhow::bail!("no completed video for job {}", job_id);
    };
    println!("{:<12} {}", "JOB", v.video_id);
    println!("{:<12} {}", "STATUS", v.status);
    println!("{:<12} {}", "VIDEO", v.video_url.as_deref().unwrap_or("-"));
    println!(
        "{:<12} {}",
        "THUMBNAIL",
        v.thumbnail_url.as_deref().unwrap_or("-")
    );
    if let Some(d) = v.duration {
        println!("{:<12} {:.0}s", "DURATION", d);
    }
    Ok(())
}
