//! Edge cases around worker death, cancellation and bad input.

#![cfg(unix)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sdw_core::application::{OrderService, StartOrderRequest};
use sdw_core::domain::{JobStatus, JobStore};
use sdw_core::error::AppError;
use sdw_core::port::id_provider::SequentialIdProvider;
use sdw_core::port::time_provider::SystemTimeProvider;
use sdw_core::port::{SpawnError, WorkerHandle, WorkerSpawner, WorkerSpec};
use sdw_infra_system::{FsSignalChannel, TokioWorkerSpawner, WorkerCommand};

struct ScriptSpawner {
    inner: TokioWorkerSpawner,
    script: String,
}

impl ScriptSpawner {
    fn new(script: impl Into<String>) -> Self {
        Self {
            inner: TokioWorkerSpawner::new(WorkerCommand {
                python_bin: "/bin/sh".to_string(),
                script_path: "-c".to_string(),
            }),
            script: script.into(),
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

fn service_with(script: &str) -> (OrderService, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("tempdir");
    let service = OrderService::new(
        Arc::new(JobStore::new()),
        Arc::new(ScriptSpawner::new(script)),
        Arc::new(FsSignalChannel::new(
            tmp.path().join("confirm"),
            tmp.path().join("responses"),
        )),
        Arc::new(SequentialIdProvider::new()),
        Arc::new(SystemTimeProvider),
    );
    (service, tmp)
}

fn request(order_number: &str) -> StartOrderRequest {
    StartOrderRequest {
        order_number: order_number.to_string(),
        card: "primary".to_string(),
        mode: "order".to_string(),
        quote_link: None,
    }
}

async fn wait_for_status(service: &OrderService, job_id: &str, expected: JobStatus) {
    for _ in 0..200 {
        let snap = service.status(job_id).await.expect("job exists");
        if snap.status == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("job {job_id} never reached {expected:?}");
}

#[tokio::test]
async fn crash_mid_run_fails_the_job() {
    let (service, _tmp) = service_with(
        r#"
echo "Processing item 1 of 3"
exit 2
"#,
    );

    let snap = service.start(request("1001")).await.unwrap();
    wait_for_status(&service, &snap.job_id, JobStatus::Failed).await;

    let snap = service.status(&snap.job_id).await.unwrap();
    assert_eq!(snap.progress_message, "Worker exited with status 2");
}

#[tokio::test]
async fn silent_clean_exit_fails_the_job() {
    // Worker exits 0 without ever reaching the confirmation hand-off.
    let (service, _tmp) = service_with(r#"echo "Logging in""#);

    let snap = service.start(request("1002")).await.unwrap();
    wait_for_status(&service, &snap.job_id, JobStatus::Failed).await;

    let snap = service.status(&snap.job_id).await.unwrap();
    assert_eq!(
        snap.progress_message,
        "Worker exited before completing the order"
    );
}

#[tokio::test]
async fn cancel_terminates_a_sleeping_worker() {
    let (service, _tmp) = service_with(
        r#"
echo "Processing item 1 of 5"
sleep 30
"#,
    );

    let snap = service.start(request("1003")).await.unwrap();
    let job_id = snap.job_id;
    wait_for_status(&service, &job_id, JobStatus::ProcessingItem).await;

    let snap = service.cancel(&job_id).await.unwrap();
    assert_eq!(snap.status, JobStatus::Cancelled);

    // SIGTERM killed the shell; the exit event must not flip the job to
    // failed afterwards.
    tokio::time::sleep(Duration::from_millis(500)).await;
    let snap = service.status(&job_id).await.unwrap();
    assert_eq!(snap.status, JobStatus::Cancelled);
}

#[tokio::test]
async fn malformed_payload_lines_are_skipped_not_fatal() {
    let (service, _tmp) = service_with(
        r#"
echo 'ITEMS_TO_PROCESS_JSON:not json at all'
echo 'ORDER_COMPLETE_JSON:{"invoice_number":"INV-5"}'
"#,
    );

    let snap = service.start(request("1004")).await.unwrap();
    wait_for_status(&service, &snap.job_id, JobStatus::Completed).await;

    let snap = service.status(&snap.job_id).await.unwrap();
    // The malformed items line was dropped, completion still applied.
    assert_eq!(snap.order_items, None);
    assert!(snap.completion_data.is_some());
}

#[tokio::test]
async fn unknown_job_id_is_not_found() {
    let (service, _tmp) = service_with("true");

    let err = service.status("no-such-job").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = service.confirm("no-such-job").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = service.cancel("no-such-job").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn invalid_requests_never_spawn_a_worker() {
    let (service, _tmp) = service_with("true");

    let err = service.start(request("12x456")).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = service.start(request("1234567890123")).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let mut req = request("1005");
    req.card = "platinum".to_string();
    let err = service.start(req).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let mut req = request("1005");
    req.quote_link = Some("https://evil-sdwholesale.com/quote/1".to_string());
    let err = service.start(req).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn confirming_twice_is_a_conflict() {
    let (service, _tmp) = service_with(
        r#"
echo "SHIPPING_CALCULATED:5.00:55.00"
sleep 5
"#,
    );

    let snap = service.start(request("1006")).await.unwrap();
    let job_id = snap.job_id;
    wait_for_status(&service, &job_id, JobStatus::AwaitingConfirmation).await;

    service.confirm(&job_id).await.unwrap();
    let err = service.confirm(&job_id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    service.cancel(&job_id).await.unwrap();
}

#[tokio::test]
async fn concurrent_orders_do_not_interfere() {
    let (service, _tmp) = service_with(
        r#"
echo "Processing item 1 of 1"
echo 'ORDER_COMPLETE_JSON:{"invoice_number":"INV-9"}'
"#,
    );

    let a = service.start(request("2001")).await.unwrap();
    let b = service.start(request("2002")).await.unwrap();
    assert_ne!(a.job_id, b.job_id);

    wait_for_status(&service, &a.job_id, JobStatus::Completed).await;
    wait_for_status(&service, &b.job_id, JobStatus::Completed).await;

    let a = service.status(&a.job_id).await.unwrap();
    let b = service.status(&b.job_id).await.unwrap();
    assert_eq!(a.order_number, "2001");
    assert_eq!(b.order_number, "2002");
}
