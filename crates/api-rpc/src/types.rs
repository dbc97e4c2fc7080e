//! RPC Request/Response Types
//!
//! Parameter and result shapes for each versioned JSON-RPC method. The
//! polling contract (`order.status.v1`) returns the full job snapshot.

use sdw_core::domain::JobSnapshot;
use serde::{Deserialize, Serialize};

/// order.start.v1 - Start processing an order
#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub order_number: String,
    #[serde(default = "default_card")]
    pub card: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default)]
    pub quote_link: Option<String>,
}

fn default_card() -> String {
    "primary".to_string()
}

fn default_mode() -> String {
    "order".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct StartResponse {
    pub job_id: String,
    pub order_number: String,
    pub status: String,
}

/// order.status.v1 - Poll one job
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub job_id: String,
}

pub type StatusResponse = JobSnapshot;

/// order.confirm.v1 - Confirm a purchase awaiting confirmation
#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub job_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmResponse {
    pub job_id: String,
    pub status: String,
}

/// order.input.v1 - Answer a pending interactive prompt
#[derive(Debug, Deserialize)]
pub struct UserInputRequest {
    pub job_id: String,
    pub response: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserInputResponse {
    pub job_id: String,
    pub status: String,
}

/// order.cancel.v1 - Cancel a job
#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub job_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelResponse {
    pub job_id: String,
    pub status: String,
    pub cancelled: bool,
}

/// admin.stats.v1 - Daemon statistics
#[derive(Debug, Deserialize)]
pub struct StatsRequest {
    // No parameters needed
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
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
