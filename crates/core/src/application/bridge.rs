// Worker Output Bridge
//
// Translates the worker's stdout/stderr stream into Job mutations. One
// bridge task runs per job and exclusively owns that job's worker handle;
// it is the only writer of worker-driven state changes.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::progress;
use crate::domain::{JobStatus, JobStore};
use crate::error::AppError;
use crate::port::{TimeProvider, WorkerEvent, WorkerHandle};

// Tagged stdout line prefixes emitted by the automation worker. These are
// wire format: they must match the worker byte-for-byte.
const JOB_EVENT_PREFIX: &str = "[JOB_EVENT] ";
const ITEMS_PREFIX: &str = "ITEMS_TO_PROCESS_JSON:";
const SUMMARY_PREFIX: &str = "ORDER_SUMMARY_JSON:";
const COMPLETE_PREFIX: &str = "ORDER_COMPLETE_JSON:";
const FAILED_PREFIX: &str = "ORDER_FAILED_JSON:";
const SHIPPING_PREFIX: &str = "SHIPPING_CALCULATED:";

/// Bridge between one worker's output stream and its Job record
pub struct WorkerBridge {
    store: Arc<JobStore>,
    time_provider: Arc<dyn TimeProvider>,
}

impl WorkerBridge {
    pub fn new(store: Arc<JobStore>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            store,
            time_provider,
        }
    }

    /// Drive `handle` to completion, mutating the job as output arrives
    ///
    /// Never returns an error: a misbehaving worker must not take the
    /// daemon down, so every problem is logged and absorbed here.
    pub async fn run(self, job_id: String, mut handle: Box<dyn WorkerHandle>) {
        info!(job_id = %job_id, pid = ?handle.pid(), "Worker bridge started");

        let mut exited = false;
        while let Some(event) = handle.next_event().await {
            match event {
                WorkerEvent::Stdout(chunk) => {
                    // A single read may carry several logical lines.
                    for line in chunk.lines() {
                        self.handle_stdout_line(&job_id, line).await;
                    }
                }
                WorkerEvent::Stderr(chunk) => {
                    for line in chunk.lines() {
                        self.handle_stderr_line(&job_id, line).await;
                    }
                }
                WorkerEvent::Exited { exit_code } => {
                    self.handle_exit(&job_id, exit_code).await;
                    exited = true;
                    break;
                }
            }
        }

        if !exited {
            warn!(job_id = %job_id, "Worker stream ended without an exit event");
        }
        info!(job_id = %job_id, "Worker bridge finished");
    }

    /// Interpret one stdout line: tagged payloads first, then the free-text
    /// trigger table, otherwise a plain progress message.
    pub async fn handle_stdout_line(&self, job_id: &str, line: &str) {
        let line = line.trim_end();
        if line.is_empty() {
            return;
        }

        if let Some(payload) = line.strip_prefix(JOB_EVENT_PREFIX) {
            self.handle_job_event(job_id, payload).await;
        } else if let Some(payload) = line.strip_prefix(ITEMS_PREFIX) {
            match serde_json::from_str::<Vec<serde_json::Value>>(payload) {
                Ok(items) => {
                    info!(job_id = %job_id, count = items.len(), "Worker reported item list");
                    self.mutate(job_id, |j| {
                        j.set_order_items(items);
                        Ok(())
                    })
                    .await;
                }
                Err(e) => warn!(job_id = %job_id, error = %e, "Malformed item list line, skipping"),
            }
        } else if let Some(payload) = line.strip_prefix(SUMMARY_PREFIX) {
            match serde_json::from_str::<serde_json::Value>(payload) {
                Ok(summary) => {
                    self.mutate(job_id, |j| {
                        j.set_order_summary(summary);
                        Ok(())
                    })
                    .await;
                }
                Err(e) => warn!(job_id = %job_id, error = %e, "Malformed order summary line, skipping"),
            }
        } else if let Some(payload) = line.strip_prefix(COMPLETE_PREFIX) {
            match serde_json::from_str::<serde_json::Value>(payload) {
                Ok(data) => {
                    info!(job_id = %job_id, "Worker reported order complete");
                    let now = self.time_provider.now_millis();
                    self.mutate(job_id, |j| {
                        j.complete(data, now);
                        Ok(())
                    })
                    .await;
                }
                Err(e) => warn!(job_id = %job_id, error = %e, "Malformed completion line, skipping"),
            }
        } else if let Some(payload) = line.strip_prefix(FAILED_PREFIX) {
            match serde_json::from_str::<serde_json::Value>(payload) {
                Ok(data) => {
                    warn!(job_id = %job_id, "Worker reported order failure");
                    let now = self.time_provider.now_millis();
                    self.mutate(job_id, |j| {
                        j.fail(data, now);
                        Ok(())
                    })
                    .await;
                }
                Err(e) => warn!(job_id = %job_id, error = %e, "Malformed failure line, skipping"),
            }
        } else if let Some(payload) = line.strip_prefix(SHIPPING_PREFIX) {
            // Legacy colon-delimited format: <shippingCost>:<totalPrice>
            match parse_shipping(payload) {
                Some((shipping, total)) => {
                    info!(job_id = %job_id, shipping, total, "Worker reported shipping quote");
                    self.mutate(job_id, |j| {
                        j.record_shipping_quote(shipping, total)?;
                        Ok(())
                    })
                    .await;
                }
                None => warn!(job_id = %job_id, payload = %payload, "Malformed shipping line, skipping"),
            }
        } else if let Some(trigger) = progress::match_trigger(line) {
            debug!(job_id = %job_id, phase = %trigger.phase, "Progress trigger matched");
            self.mutate(job_id, |j| {
                j.set_phase(trigger.phase, trigger.message)?;
                Ok(())
            })
            .await;
        } else {
            self.mutate(job_id, |j| {
                j.record_message(line);
                Ok(())
            })
            .await;
        }
    }

    /// stderr lines surface as progress tagged `error`; they never change
    /// status on their own.
    pub async fn handle_stderr_line(&self, job_id: &str, line: &str) {
        let line = line.trim_end();
        if line.is_empty() {
            return;
        }
        debug!(job_id = %job_id, line = %line, "Worker stderr");
        self.mutate(job_id, |j| {
            j.record_progress("error", line);
            Ok(())
        })
        .await;
    }

    /// Apply the exit-code semantics once the worker is gone
    ///
    /// Zero exits are benign only for jobs already terminal or parked in
    /// `awaiting_confirmation` (the interactive hand-off); anything else
    /// that has not completed is a failure.
    pub async fn handle_exit(&self, job_id: &str, exit_code: Option<i32>) {
        info!(job_id = %job_id, exit_code = ?exit_code, "Worker exited");
        let now = self.time_provider.now_millis();
        self.mutate(job_id, |j| {
            let status = j.status();
            if status.is_terminal() {
                return Ok(());
            }
            match exit_code {
                Some(0) if status == JobStatus::AwaitingConfirmation => {
                    // Expected exit during the confirmation hand-off.
                }
                Some(0) => {
                    j.fail(
                        serde_json::json!({
                            "error_message": "Worker exited before completing the order"
                        }),
                        now,
                    );
                }
                code => {
                    let detail = match code {
                        Some(c) => format!("Worker exited with status {c}"),
                        None => "Worker terminated by signal".to_string(),
                    };
                    j.fail(serde_json::json!({ "error_message": detail }), now);
                }
            }
            Ok(())
        })
        .await;
    }

    /// Handle a `[JOB_EVENT]` structured notification
    async fn handle_job_event(&self, job_id: &str, payload: &str) {
        let event: serde_json::Value = match serde_json::from_str(payload) {
            Ok(v) => v,
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Malformed job event line, skipping");
                return;
            }
        };

        match event.get("event").and_then(|v| v.as_str()) {
            Some("user_input_required") => {
                let prompt_type = event
                    .get("prompt_type")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown")
                    .to_string();
                let prompt_data = event
                    .get("prompt_data")
                    .cloned()
                    .unwrap_or(serde_json::Value::Null);
                info!(job_id = %job_id, prompt_type = %prompt_type, "Worker requested user input");
                self.mutate(job_id, |j| {
                    j.request_user_input(prompt_type, prompt_data)?;
                    Ok(())
                })
                .await;
            }
            other => {
                debug!(job_id = %job_id, event = ?other, "Unhandled job event");
            }
        }
    }

    /// Run a mutation, absorbing errors so the bridge never dies
    async fn mutate(
        &self,
        job_id: &str,
        f: impl FnOnce(&mut crate::domain::Job) -> crate::error::Result<()>,
    ) {
        match self.store.update(job_id, f).await {
            Ok(()) => {}
            Err(AppError::Domain(e)) => {
                warn!(job_id = %job_id, error = %e, "Ignoring worker output for current state")
            }
            Err(e) => warn!(job_id = %job_id, error = %e, "Job update failed"),
        }
    }
}

/// Parse the `<shippingCost>:<totalPrice>` payload (two floats)
fn parse_shipping(payload: &str) -> Option<(f64, f64)> {
    let (shipping, total) = payload.split_once(':')?;
    Some((
        shipping.trim().parse::<f64>().ok()?,
        total.trim().parse::<f64>().ok()?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_shipping_two_floats() {
        assert_eq!(parse_shipping("45.99:345.99"), Some((45.99, 345.99)));
    }

    #[test]
    fn parse_shipping_rejects_garbage() {
        assert_eq!(parse_shipping("45.99"), None);
        assert_eq!(parse_shipping("abc:def"), None);
        assert_eq!(parse_shipping(""), None);
    }
}
