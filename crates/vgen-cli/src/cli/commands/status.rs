//! `vgen status <job-id>` – query a job once.

use anyhow::Result;
use vgen_core::api::BackendClient;
use vgen_core::error::normalize;
use vgen_core::model::JobHandle;
use vgen_core::retry::RetryPolicy;
use vgen_core::transport::CurlTransport;

pub async fn run_status(
    client: &BackendClient<CurlTransport>,
    job_id: &str,
    retry: &RetryPolicy,
) -> Result<()> {
    let report = client
        .job_status(&JobHandle::from(job_id), retry)
        .await
        .map_err(|e| normalize(&e))?;

    println!("{:<12} {}", "JOB", report.id);
    println!("{:<12} {}", "STATUS", report.status.as_str());
    if let Some(p) = report.progress {
        println!("{:<12} {:.1}%", "PROGRESS", p * 100.0);
    }
    if let Some(url) = &report.result_url {
        println!("{:<12} {}", "VIDEO", url);
    }
    if let Some(url) = &report.thumbnail_url {
        println!("{:<12} {}", "THUMBNAIL", url);
    }
    if let Some(d) = report.duration_secs {
        println!("{:<12} {:.0}s", "DURATION", d);
    }
    if let Some(msg) = &report.error_message {
        println!("{:<12} {}", "ERROR", msg);
    }
    Ok(())
}
