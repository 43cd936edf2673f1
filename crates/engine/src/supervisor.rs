//! Timeout supervision for processing runs.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use billkeeper_billing::JobStatus;
use billkeeper_core::JobId;

use crate::processor::finish_job;
use crate::store::JobStore;

/// Watch one run and mark it `Timeout` if it outlives its budget.
///
/// Completion races are settled by `finish_job`: whichever side writes a
/// terminal status first wins, the other side is a no-op.
pub(crate) async fn supervise(
    jobs: Arc<dyn JobStore>,
    job_id: JobId,
    timeout: Duration,
    mut done: watch::Receiver<bool>,
) {
    if tokio::time::timeout(timeout, wait_for_completion(&mut done))
        .await
        .is_ok()
    {
        tracing::debug!(%job_id, "run completed within its budget");
        return;
    }

    tracing::warn!(%job_id, ?timeout, "run exceeded its budget");
    match finish_job(jobs.as_ref(), job_id, JobStatus::Timeout).await {
        Ok(true) => tracing::info!(%job_id, "job marked as timed out"),
        Ok(false) => tracing::debug!(%job_id, "job finished just before the deadline"),
        Err(e) => tracing::error!(%job_id, error = %e, "failed to mark job as timed out"),
    }
}

async fn wait_for_completion(done: &mut watch::Receiver<bool>) {
    loop {
        if *done.borrow() {
            return;
        }
        if done.changed().await.is_err() {
            // The run vanished without signalling; wait out the clock.
            std::future::pending::<()>().await;
        }
    }
}
