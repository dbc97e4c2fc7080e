//! SDW Order Runner SDK - Rust Client Library
//!
//! Convenient client for driving the SDW Order Runner daemon over JSON-RPC.
//!
//! # Example
//!
//! ```no_run
//! use sdw_sdk::{SdwOrderClient, StartOrderParams};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SdwOrderClient::connect("http://127.0.0.1:8721").await?;
//!
//!     let started = client.start_order(StartOrderParams::order("123456")).await?;
//!     println!("Job started: {}", started.job_id);
//!
//!     let settled = client.wait_until_settled(&started.job_id).await?;
//!     if settled.status == "awaiting_confirmation" {
//!         client.confirm(&started.job_id).await?;
//!     }
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::SdwOrderClient;
pub use error::{Result, SdkError};
pub use types::{
    CancelResult, JobActionResult, JobStatusResult, PendingPrompt, StartOrderParams,
    StartOrderResult, StatsResult,
};
