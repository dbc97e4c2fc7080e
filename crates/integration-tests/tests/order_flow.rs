//! End-to-end order flows against real worker processes.
//!
//! Each test runs a small `/bin/sh` script in place of the Python
//! automation worker. The scripts emit the same tagged stdout lines the
//! real worker prints and poll the same signal files it polls.

#![cfg(unix)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sdw_core::application::{OrderService, StartOrderRequest};
use sdw_core::domain::{JobSnapshot, JobStatus, JobStore};
use sdw_core::port::id_provider::SequentialIdProvider;
use sdw_core::port::time_provider::SystemTimeProvider;
use sdw_core::port::{SpawnError, WorkerHandle, WorkerSpawner, WorkerSpec};
use sdw_infra_system::{FsSignalChannel, TokioWorkerSpawner, WorkerCommand};

/// Spawner that runs a fixed shell script instead of the Python worker.
/// The real per-job args are dropped; the script already knows its paths.
struct ScriptSpawner {
    inner: TokioWorkerSpawner,
    script: String,
}

impl ScriptSpawner {
    fn new(script: String) -> Self {
        Self {
            inner: TokioWorkerSpawner::new(WorkerCommand {
                python_bin: "/bin/sh".to_string(),
                script_path: "-c".to_string(),
            }),
            script,
        }
    }
}

#[async_trait]
impl WorkerSpawner for ScriptSpawner {
    async fn spawn(&self, spec: &WorkerSpec) -> Result<Box<dyn WorkerHandle>, SpawnError> {
        let rewritten = WorkerSpec {
            job_id: spec.job_id.clone(),
            order_number: spec.order_number.clone(),
            args: vec![self.script.clone()],
        };
        self.inner.spawn(&rewritten).await
    }

    async fn kill(&self, pid: i32) -> Result<(), SpawnError> {
        self.inner.kill(pid).await
    }

    fn is_alive(&self, pid: i32) -> bool {
        self.inner.is_alive(pid)
    }
}

struct Harness {
    service: OrderService,
    _tmp: tempfile::TempDir,
}

/// Build a service around `script`, substituting `%CONFIRM%` and
/// `%RESPONSE%` with the signal directories.
fn harness(script_template: &str) -> Harness {
    let tmp = tempfile::tempdir().expect("tempdir");
    let confirm_dir = tmp.path().join("confirm");
    let response_dir = tmp.path().join("responses");

    let script = script_template
        .replace("%CONFIRM%", &confirm_dir.display().to_string())
        .replace("%RESPONSE%", &response_dir.display().to_string());

    let service = OrderService::new(
        Arc::new(JobStore::new()),
        Arc::new(ScriptSpawner::new(script)),
        Arc::new(FsSignalChannel::new(confirm_dir, response_dir)),
        Arc::new(SequentialIdProvider::new()),
        Arc::new(SystemTimeProvider),
    );

    Harness {
        service,
        _tmp: tmp,
    }
}

fn request(order_number: &str) -> StartOrderRequest {
    StartOrderRequest {
        order_number: order_number.to_string(),
        card: "primary".to_string(),
        mode: "order".to_string(),
        quote_link: None,
    }
}

async fn wait_for_status(
    service: &OrderService,
    job_id: &str,
    expected: JobStatus,
) -> JobSnapshot {
    for _ in 0..200 {
        let snap = service.status(job_id).await.expect("job exists");
        if snap.status == expected {
            return snap;
        }
        assert!(
            !(snap.status.is_terminal() && snap.status != expected),
            "job settled in {:?} while waiting for {:?} ({})",
            snap.status,
            expected,
            snap.progress_message
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("job {job_id} never reached {expected:?}");
}

#[tokio::test]
async fn order_completes_after_confirmation() {
    // Worker: report progress, quote shipping, wait for the confirmation
    // file, then report completion.
    let h = harness(
        r#"
echo "Launching browser"
echo "Logging in"
echo 'ITEMS_TO_PROCESS_JSON:[{"sku":"A-1","qty":2}]'
echo "Calculating shipping"
echo "SHIPPING_CALCULATED:12.50:112.50"
i=0
while [ ! -f "%CONFIRM%/confirm_1001.txt" ]; do
  sleep 0.1
  i=$((i+1))
  if [ "$i" -gt 100 ]; then exit 1; fi
done
echo 'ORDER_COMPLETE_JSON:{"invoice_number":"INV-77","total":112.50}'
"#,
    );

    let snap = h.service.start(request("1001")).await.unwrap();
    let job_id = snap.job_id;
    assert_eq!(snap.status, JobStatus::Initializing);

    let snap = wait_for_status(&h.service, &job_id, JobStatus::AwaitingConfirmation).await;
    assert_eq!(snap.calculated_shipping, Some(12.50));
    assert_eq!(snap.calculated_total, Some(112.50));
    assert_eq!(snap.order_items.map(|i| i.len()), Some(1));

    let snap = h.service.confirm(&job_id).await.unwrap();
    assert_eq!(snap.status, JobStatus::Completing);

    let snap = wait_for_status(&h.service, &job_id, JobStatus::Completed).await;
    let invoice = snap
        .completion_data
        .and_then(|d| d["invoice_number"].as_str().map(String::from));
    assert_eq!(invoice, Some("INV-77".to_string()));
    assert!(snap.finished_at.is_some());
}

#[tokio::test]
async fn prompt_is_answered_through_response_file() {
    // Worker: raise a prompt, wait for the response file, finish.
    // SequentialIdProvider makes the first job id `job-1`.
    let h = harness(
        r#"
echo "Processing item 1 of 1"
echo '[JOB_EVENT] {"event":"user_input_required","prompt_type":"item_substitution","prompt_data":{"sku":"A-1"}}'
i=0
while [ ! -f "%RESPONSE%/job-1.json" ]; do
  sleep 0.1
  i=$((i+1))
  if [ "$i" -gt 100 ]; then exit 1; fi
done
echo 'ORDER_COMPLETE_JSON:{"invoice_number":"INV-88"}'
"#,
    );

    let snap = h.service.start(request("2002")).await.unwrap();
    let job_id = snap.job_id;
    assert_eq!(job_id, "job-1");

    let snap = wait_for_status(&h.service, &job_id, JobStatus::AwaitingUserInput).await;
    let prompt = snap.pending_prompt.expect("prompt recorded");
    assert_eq!(prompt.prompt_type, "item_substitution");
    assert_eq!(prompt.prompt_data["sku"], "A-1");

    let snap = h
        .service
        .submit_user_input(&job_id, serde_json::json!({"action": "substitute"}))
        .await
        .unwrap();
    // Resumes in the phase the prompt interrupted.
    assert_eq!(snap.status, JobStatus::ProcessingItem);
    assert!(snap.pending_prompt.is_none());

    wait_for_status(&h.service, &job_id, JobStatus::Completed).await;
}

#[tokio::test]
async fn worker_reported_failure_surfaces_in_snapshot() {
    let h = harness(
        r#"
echo "Logging in"
echo 'ORDER_FAILED_JSON:{"error_message":"Login rejected","failed_step":"login"}'
exit 1
"#,
    );

    let snap = h.service.start(request("3003")).await.unwrap();
    let snap = wait_for_status(&h.service, &snap.job_id, JobStatus::Failed).await;

    assert_eq!(snap.progress_message, "Login rejected");
    assert_eq!(
        snap.failure_data.and_then(|d| d["failed_step"].as_str().map(String::from)),
        Some("login".to_string())
    );
}

#[tokio::test]
async fn quote_mode_stops_at_confirmation_even_after_exit() {
    // Quote runs hand off at the pricing step and the worker exits cleanly;
    // the job must stay parked, not flip to failed.
    let h = harness(
        r#"
echo "Calculating shipping"
echo "SHIPPING_CALCULATED:8.00:58.00"
exit 0
"#,
    );

    let mut req = request("4004");
    req.mode = "quote".to_string();
    let snap = h.service.start(req).await.unwrap();
    let job_id = snap.job_id;

    let snap = wait_for_status(&h.service, &job_id, JobStatus::AwaitingConfirmation).await;
    assert_eq!(snap.calculated_total, Some(58.00));

    // Give the exit event time to arrive, then re-check nothing moved.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let snap = h.service.status(&job_id).await.unwrap();
    assert_eq!(snap.status, JobStatus::AwaitingConfirmation);
    assert_eq!(snap.finished_at, None);
}
