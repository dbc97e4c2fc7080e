// Confirm / User-Input / Cancel Use Cases
//
// Each action validates the job's current state, performs its side effect
// (signal file or process kill) and records the resulting transition. State
// checks run under the store lock; the side effects are deliberately outside
// it since they await I/O.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{JobSnapshot, JobStatus, JobStore};
use crate::error::{AppError, Result};
use crate::port::{SignalChannel, TimeProvider, WorkerSpawner};

fn wrong_state(job_id: &str, current: JobStatus, wanted: JobStatus) -> AppError {
    AppError::InvalidState(format!(
        "Job {job_id} is {current}, action requires {wanted}"
    ))
}

/// Confirm a purchase that is awaiting user confirmation
///
/// Writes the confirmation signal for the polling worker, then moves the
/// job to `completing`. Fire-and-forget: success means the signal is on
/// disk, not that the worker saw it.
pub async fn confirm(
    store: &Arc<JobStore>,
    signals: &Arc<dyn SignalChannel>,
    job_id: &str,
) -> Result<JobSnapshot> {
    let order_number = store
        .update(job_id, |j| {
            if j.status() != JobStatus::AwaitingConfirmation {
                return Err(wrong_state(job_id, j.status(), JobStatus::AwaitingConfirmation));
            }
            Ok(j.order_number().to_string())
        })
        .await?;

    signals.signal_confirmation(&order_number).await?;
    info!(job_id = %job_id, order_number = %order_number, "Purchase confirmed");

    store
        .update(job_id, |j| {
            // A fast worker may have seen the signal and finished already;
            // that still counts as a successful confirmation.
            if j.status().is_terminal() {
                return Ok(());
            }
            j.set_phase(JobStatus::Completing, "Confirmation received, completing order")?;
            Ok(())
        })
        .await?;

    store.snapshot(job_id).await
}

/// Answer a pending interactive prompt
///
/// The response is durably written for the worker first; only then is the
/// prompt cleared and the job returned to its prior active phase.
pub async fn submit_user_input(
    store: &Arc<JobStore>,
    signals: &Arc<dyn SignalChannel>,
    job_id: &str,
    response: serde_json::Value,
) -> Result<JobSnapshot> {
    store
        .update(job_id, |j| {
            if j.status() != JobStatus::AwaitingUserInput {
                return Err(wrong_state(job_id, j.status(), JobStatus::AwaitingUserInput));
            }
            Ok(())
        })
        .await?;

    signals.submit_user_input(job_id, &response).await?;
    info!(job_id = %job_id, "User input recorded");

    store
        .update(job_id, |j| {
            j.clear_user_input()?;
            Ok(())
        })
        .await?;

    store.snapshot(job_id).await
}

/// Cancel a job
///
/// Terminates the owned worker process (best effort - external side effects
/// the worker already performed are not rolled back) and moves a
/// non-terminal job to `cancelled`. A no-op on terminal jobs, so repeated
/// cancels are safe.
pub async fn cancel(
    store: &Arc<JobStore>,
    spawner: &Arc<dyn WorkerSpawner>,
    time_provider: &dyn TimeProvider,
    job_id: &str,
) -> Result<JobSnapshot> {
    let (status, pid) = store
        .update(job_id, |j| Ok((j.status(), j.worker_pid())))
        .await?;

    if status.is_terminal() {
        return store.snapshot(job_id).await;
    }

    if let Some(pid) = pid {
        if let Err(e) = spawner.kill(pid).await {
            // Best effort: the process may already be gone.
            warn!(job_id = %job_id, pid, error = %e, "Worker kill failed");
        }
    }

    let now = time_provider.now_millis();
    store
        .update(job_id, |j| {
            j.cancel(now);
            Ok(())
        })
        .await?;

    info!(job_id = %job_id, "Job cancelled");
    store.snapshot(job_id).await
}
