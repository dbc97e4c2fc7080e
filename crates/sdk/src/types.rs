//! SDK Request/Response Types
//!
//! Mirrors the JSON-RPC types from the api-rpc crate. Deliberately
//! duplicated so SDK consumers never link the daemon's internals.

use serde::{Deserialize, Serialize};

/// Parameters for starting an order run
#[derive(Debug, Clone, Serialize)]
pub struct StartOrderParams {
    pub order_number: String,
    pub card: String,
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_link: Option<String>,
}

impl StartOrderParams {
    /// Defaults: primary card, full order mode
    pub fn order(order_number: impl Into<String>) -> Self {
        Self {
            order_number: order_number.into(),
            card: "primary".to_string(),
            mode: "order".to_string(),
            quote_link: None,
        }
    }
}

/// Response from order.start.v1
#[derive(Debug, Clone, Deserialize)]
pub struct StartOrderResult {
    pub job_id: String,
    pub order_number: String,
    pub status: String,
}

/// A prompt the worker is blocked on
#[derive(Debug, Clone, Deserialize)]
pub struct PendingPrompt {
    pub prompt_type: String,
    pub prompt_data: serde_json::Value,
}

/// Full job snapshot from order.status.v1
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusResult {
    pub job_id: String,
    pub order_number: String,
    pub status: String,
    pub progress_message: String,
    pub progress_tag: String,
    #[serde(default)]
    pub order_items: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub order_summary: Option<serde_json::Value>,
    #[serde(default)]
    pub calculated_shipping: Option<f64>,
    #[serde(default)]
    pub calculated_total: Option<f64>,
    #[serde(default)]
    pub pending_prompt: Option<PendingPrompt>,
    #[serde(default)]
    pub completion_data: Option<serde_json::Value>,
    #[serde(default)]
    pub failure_data: Option<serde_json::Value>,
    pub created_at: i64,
    #[serde(default)]
    pub finished_at: Option<i64>,
}

impl JobStatusResult {
    pub fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "completed" | "failed" | "cancelled")
    }
}

/// Response from order.confirm.v1 / order.input.v1
#[derive(Debug, Clone, Deserialize)]
pub struct JobActionResult {
    pub job_id: String,
    pub status: String,
}

/// Response from order.cancel.v1
#[derive(Debug, Clone, Deserialize)]
pub struct CancelResult {
    pub job_id: String,
    pub status: String,
    pub cancelled: bool,
}

/// Response from admin.stats.v1
#[derive(Debug, Clone, Deserialize)]
pub struct StatsResult {
    pub total_jobs: usize,
    pub active_jobs: usize,
    pub awaiting_confirmation: usize,
    pub awaiting_user_input: usize,
    pub completed_jobs: usize,
    pub failed_jobs: usize,
    pub cancelled_jobs: usize,
    pub uptime_seconds: i64,
    pub version: String,
}
