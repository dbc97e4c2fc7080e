// Signal Channel Port
// One-way hand-off to a worker that polls for filesystem signals

use async_trait::async_trait;

use crate::error::Result;

/// Fire-and-forget signal channel to a blocked worker
///
/// Both operations return once the signal is durably recorded; there is no
/// acknowledgment that the worker observed it. A crashed or stalled worker
/// leaves the job in its current phase - a documented limitation of the
/// hand-off design, not something this layer retries around.
#[async_trait]
pub trait SignalChannel: Send + Sync {
    /// Signal purchase confirmation for `order_number`
    async fn signal_confirmation(&self, order_number: &str) -> Result<()>;

    /// Record the user's response to a pending prompt for `job_id`
    async fn submit_user_input(&self, job_id: &str, response: &serde_json::Value) -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Recording mock channel
    #[derive(Default)]
    pub struct MockSignalChannel {
        confirmations: Mutex<Vec<String>>,
        inputs: Mutex<Vec<(String, serde_json::Value)>>,
    }

    impl MockSignalChannel {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn confirmations(&self) -> Vec<String> {
            self.confirmations
                .lock()
                .map(|c| c.clone())
                .unwrap_or_default()
        }

        pub fn inputs(&self) -> Vec<(String, serde_json::Value)> {
            self.inputs.lock().map(|i| i.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl SignalChannel for MockSignalChannel {
        async fn signal_confirmation(&self, order_number: &str) -> Result<()> {
            if let Ok(mut c) = self.confirmations.lock() {
                c.push(order_number.to_string());
            }
            Ok(())
        }

        async fn submit_user_input(
            &self,
            job_id: &str,
            response: &serde_json::Value,
        ) -> Result<()> {
            if let Ok(mut i) = self.inputs.lock() {
                i.push((job_id.to_string(), response.clone()));
            }
            Ok(())
        }
    }
}
