//! Print poll sessions as they progress; Ctrl-C stops watching all of them.

use anyhow::Result;
use std::sync::Arc;
use vgen_core::control::SessionRegistry;
use vgen_core::poller::{Outcome, PollEvent, PollSession};

pub async fn follow_all(sessions: Vec<PollSession>) -> Result<()> {
    let total = sessions.len();
    let registry = Arc::new(SessionRegistry::new());

    let interrupt = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let n = registry.cancel_all();
                eprintln!("\nInterrupted; stopped watching {} job(s). They keep running remotely.", n);
            }
        })
    };

    let handles: Vec<_> = sessions
        .into_iter()
        .map(|session| {
            let registry = Arc::clone(&registry);
            let key = registry.register(session.cancel_token());
            tokio::spawn(async move {
                let outcome = follow(session).await;
                registry.unregister(key);
                outcome
            })
        })
        .collect();

    let mut unfinished = 0;
    for handle in handles {
        let outcome = handle.await?;
        report(&outcome);
        if !outcome.is_success() {
            unfinished += 1;
        }
    }
    interrupt.abort();

    if unfinished > 0 {
        anyhow::bail!("{} of {} job(s) did not complete", unfinished, total);
    }
    Ok(())
}

async fn follow(mut session: PollSession) -> Outcome {
    while let Some(event) = session.next_event().await {
        match event {
            PollEvent::Snapshot(s) => println!(
                "  {}  {:<10} {:>5.1}%",
                s.id,
                s.status.as_str(),
                s.progress * 100.0
            ),
            PollEvent::QueryFailed { attempt, error } => {
                let id = session.job_id().map(|j| j.to_string()).unwrap_or_default();
                eprintln!("  {}  status query {} failed: {}", id, attempt, error);
            }
            PollEvent::Finished(_) => {}
        }
    }
    session.wait().await
}

fn report(outcome: &Outcome) {
    match outcome {
        Outcome::Completed(s) => {
            println!("{} completed", s.id);
            println!("  video:     {}", s.result_url.as_deref().unwrap_or("-"));
            if let Some(thumb) = &s.thumbnail_url {
                println!("  thumbnail: {}", thumb);
            }
            if let Some(d) = s.duration_secs {
                println!("  duration:  {:.0}s", d);
            }
        }
        other => {
            if let Err(failure) = other.clone().into_result() {
                let hint = if failure.is_resubmittable() {
                    " (retrying may help)"
                } else {
                    ""
                };
                eprintln!("[{:?}] {}{}", failure.kind(), failure, hint);
            }
        }
    }
}
