//! Simple SDK Example
//!
//! Drives one order through the confirmation hand-off.
//!
//! # Usage
//!
//! 1. Start the daemon:
//!    ```bash
//!    cargo run --package sdw-daemon
//!    ```
//!
//! 2. Run this example:
//!    ```bash
//!    cargo run --example simple
//!    ```

use sdw_sdk::{SdwOrderClient, StartOrderParams};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("SDW Order Runner SDK - Simple Example");
    println!("=====================================\n");

    // 1. Connect to daemon
    println!("1. Connecting to daemon...");
    let client = SdwOrderClient::connect("http://127.0.0.1:8721").await?;
    println!("   ✓ Connected\n");

    // 2. Start an order
    println!("2. Starting order 123456...");
    let started = client.start_order(StartOrderParams::order("123456")).await?;
    println!("   ✓ Job started:");
    println!("     - ID: {}", started.job_id);
    println!("     - Status: {}\n", started.status);

    // 3. Follow progress until the job settles
    println!("3. Waiting for the worker...");
    let mut snap = client.wait_until_settled(&started.job_id).await?;
    println!("   ✓ Settled in status: {}\n", snap.status);

    // 4. Answer prompts, confirm pricing
    loop {
        match snap.status.as_str() {
            "awaiting_user_input" => {
                let prompt = snap.pending_prompt.as_ref();
                println!(
                    "4. Worker prompt: {:?} - answering with a skip",
                    prompt.map(|p| p.prompt_type.as_str())
                );
                client
                    .submit_input(&started.job_id, json!({"action": "skip"}))
                    .await?;
            }
            "awaiting_confirmation" => {
                println!(
                    "4. Shipping {:?}, total {:?} - confirming purchase",
                    snap.calculated_shipping, snap.calculated_total
                );
                client.confirm(&started.job_id).await?;
            }
            _ => break,
        }
        snap = client.wait_until_settled(&started.job_id).await?;
    }

    // 5. Final state
    println!("\n5. Final status: {}", snap.status);
    if let Some(data) = &snap.completion_data {
        println!("   Completion data: {}", data);
    }
    if let Some(data) = &snap.failure_data {
        println!("   Failure data: {}", data);
    }

    println!("\n✓ Example completed");

    Ok(())
}
