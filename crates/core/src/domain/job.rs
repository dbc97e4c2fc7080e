// Job Domain Model

use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, Result};

/// Job ID (UUID v4, generated by an injected IdProvider)
pub type JobId = String;

/// Commerce order number the job is processing
pub type OrderNumber = String;

/// Job status
///
/// Terminal states are `Completed`, `Failed` and `Cancelled`; once a job
/// reaches one of them no further transition is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Initializing,
    LaunchingBrowser,
    LoggingIn,
    ProcessingItem,
    CalculatingShipping,
    AwaitingConfirmation,
    Completing,
    AwaitingUserInput,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// True for states no transition may leave
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Machine-readable tag mirrored into the progress fields
    pub fn tag(&self) -> &'static str {
        match self {
            JobStatus::Initializing => "initializing",
            JobStatus::LaunchingBrowser => "launching_browser",
            JobStatus::LoggingIn => "logging_in",
            JobStatus::ProcessingItem => "processing_item",
            JobStatus::CalculatingShipping => "calculating_shipping",
            JobStatus::AwaitingConfirmation => "awaiting_confirmation",
            JobStatus::Completing => "completing",
            JobStatus::AwaitingUserInput => "awaiting_user_input",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Interactive prompt the worker is blocked on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInputPrompt {
    pub prompt_type: String,
    pub prompt_data: serde_json::Value,
}

/// Pending prompt plus the phase to resume into once answered
#[derive(Debug, Clone)]
struct PendingPrompt {
    prompt: UserInputPrompt,
    resume: JobStatus,
}

/// Immutable view of a job, safe to serialize to a client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub job_id: JobId,
    pub order_number: OrderNumber,
    pub status: JobStatus,
    pub progress_message: String,
    pub progress_tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_items: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_summary: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculated_shipping: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculated_total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_prompt: Option<UserInputPrompt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_data: Option<serde_json::Value>,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<i64>,
}

/// One tracked purchase attempt through the external automation worker
///
/// All mutation goes through the methods below; they enforce the state
/// machine invariants (terminal immutability, prompt bookkeeping, payload
/// exclusivity). Raw field access stays within this module.
#[derive(Debug, Clone)]
pub struct Job {
    id: JobId,
    order_number: OrderNumber,
    status: JobStatus,
    progress_message: String,
    progress_tag: String,
    order_items: Option<Vec<serde_json::Value>>,
    order_summary: Option<serde_json::Value>,
    calculated_shipping: Option<f64>,
    calculated_total: Option<f64>,
    pending: Option<PendingPrompt>,
    completion_data: Option<serde_json::Value>,
    failure_data: Option<serde_json::Value>,
    worker_pid: Option<i32>,
    created_at: i64,
    finished_at: Option<i64>,
}

impl Job {
    /// Create a new job in `initializing` state
    ///
    /// # Arguments
    ///
    /// * `id` - Unique job ID (injected, not generated)
    /// * `order_number` - Commerce order to process
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    pub fn new(
        id: impl Into<String>,
        order_number: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            order_number: order_number.into(),
            status: JobStatus::Initializing,
            progress_message: "Initializing".to_string(),
            progress_tag: JobStatus::Initializing.tag().to_string(),
            order_items: None,
            order_summary: None,
            calculated_shipping: None,
            calculated_total: None,
            pending: None,
            completion_data: None,
            failure_data: None,
            worker_pid: None,
            created_at,
            finished_at: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Pid of the spawned worker, if attached
    pub fn worker_pid(&self) -> Option<i32> {
        self.worker_pid
    }

    /// Record the spawned worker process id (used only for cancellation)
    pub fn attach_worker(&mut self, pid: i32) {
        self.worker_pid = Some(pid);
    }

    fn invalid(&self, to: JobStatus) -> DomainError {
        DomainError::InvalidStateTransition {
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }

    /// Transition to an active processing phase
    ///
    /// Rejected from terminal states. Leaving `awaiting_user_input` via a
    /// phase report drops the stale prompt so the prompt/status invariant
    /// holds.
    pub fn set_phase(&mut self, phase: JobStatus, message: impl Into<String>) -> Result<()> {
        if self.status.is_terminal() {
            return Err(self.invalid(phase));
        }
        self.pending = None;
        self.status = phase;
        self.progress_tag = phase.tag().to_string();
        self.progress_message = message.into();
        Ok(())
    }

    /// Enter `awaiting_user_input`, recording the prompt and the phase to
    /// resume into once the response is durably written for the worker
    pub fn request_user_input(
        &mut self,
        prompt_type: impl Into<String>,
        prompt_data: serde_json::Value,
    ) -> Result<()> {
        if self.status.is_terminal() {
            return Err(self.invalid(JobStatus::AwaitingUserInput));
        }
        let prompt_type = prompt_type.into();
        // A repeated prompt keeps the originally recorded resume phase.
        let resume = match &self.pending {
            Some(p) => p.resume,
            None => self.status,
        };
        self.progress_message = format!("Waiting for user input: {prompt_type}");
        self.progress_tag = JobStatus::AwaitingUserInput.tag().to_string();
        self.status = JobStatus::AwaitingUserInput;
        self.pending = Some(PendingPrompt {
            prompt: UserInputPrompt {
                prompt_type,
                prompt_data,
            },
            resume,
        });
        Ok(())
    }

    /// Exit `awaiting_user_input` back to the prior active phase
    pub fn clear_user_input(&mut self) -> Result<()> {
        let pending = self
            .pending
            .take()
            .ok_or_else(|| DomainError::NoPendingPrompt(self.id.clone()))?;
        self.status = pending.resume;
        self.progress_tag = pending.resume.tag().to_string();
        self.progress_message = "User input received, resuming".to_string();
        Ok(())
    }

    /// Record the calculated pricing and move to `awaiting_confirmation`
    pub fn record_shipping_quote(&mut self, shipping: f64, total: f64) -> Result<()> {
        if self.status.is_terminal() || self.status == JobStatus::AwaitingUserInput {
            return Err(self.invalid(JobStatus::AwaitingConfirmation));
        }
        self.calculated_shipping = Some(shipping);
        self.calculated_total = Some(total);
        self.status = JobStatus::AwaitingConfirmation;
        self.progress_tag = JobStatus::AwaitingConfirmation.tag().to_string();
        self.progress_message = format!("Shipping {shipping:.2}, total {total:.2} - awaiting confirmation");
        Ok(())
    }

    pub fn set_order_items(&mut self, items: Vec<serde_json::Value>) {
        if self.status.is_terminal() {
            return;
        }
        self.order_items = Some(items);
    }

    pub fn set_order_summary(&mut self, summary: serde_json::Value) {
        if self.status.is_terminal() {
            return;
        }
        self.order_summary = Some(summary);
    }

    /// Terminal transition to `completed`
    ///
    /// A no-op on an already-terminal job; the worker may emit duplicate
    /// terminal lines.
    pub fn complete(&mut self, data: serde_json::Value, now_millis: i64) {
        if self.status.is_terminal() {
            return;
        }
        self.pending = None;
        self.status = JobStatus::Completed;
        self.progress_tag = JobStatus::Completed.tag().to_string();
        let invoice = data.get("invoice_number").and_then(|v| v.as_str());
        self.progress_message = match invoice {
            Some(inv) => format!("Order complete, invoice {inv}"),
            None => "Order complete".to_string(),
        };
        self.completion_data = Some(data);
        self.finished_at = Some(now_millis);
    }

    /// Terminal transition to `failed`; no-op once terminal
    pub fn fail(&mut self, data: serde_json::Value, now_millis: i64) {
        if self.status.is_terminal() {
            return;
        }
        self.pending = None;
        self.status = JobStatus::Failed;
        self.progress_tag = JobStatus::Failed.tag().to_string();
        self.progress_message = data
            .get("error_message")
            .and_then(|v| v.as_str())
            .unwrap_or("Order failed")
            .to_string();
        self.failure_data = Some(data);
        self.finished_at = Some(now_millis);
    }

    /// Terminal transition to `cancelled`; no-op once terminal
    pub fn cancel(&mut self, now_millis: i64) {
        if self.status.is_terminal() {
            return;
        }
        self.pending = None;
        self.status = JobStatus::Cancelled;
        self.progress_tag = JobStatus::Cancelled.tag().to_string();
        self.progress_message = "Cancelled by user".to_string();
        self.finished_at = Some(now_millis);
    }

    /// Update the progress fields without touching status
    ///
    /// Used for stderr lines (tag `error`) and unmatched free-text output.
    pub fn record_progress(&mut self, tag: impl Into<String>, message: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.progress_tag = tag.into();
        self.progress_message = message.into();
    }

    /// Update only the progress message, keeping the current tag
    pub fn record_message(&mut self, message: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.progress_message = message.into();
    }

    /// Immutable snapshot for polling clients
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            job_id: self.id.clone(),
            order_number: self.order_number.clone(),
            status: self.status,
            progress_message: self.progress_message.clone(),
            progress_tag: self.progress_tag.clone(),
            order_items: self.order_items.clone(),
            order_summary: self.order_summary.clone(),
            calculated_shipping: self.calculated_shipping,
            calculated_total: self.calculated_total,
            pending_prompt: self.pending.as_ref().map(|p| p.prompt.clone()),
            completion_data: self.completion_data.clone(),
            failure_data: self.failure_data.clone(),
            created_at: self.created_at,
            finished_at: self.finished_at,
        }
    }
}
