//! SDW Order Runner client

use crate::error::{Result, SdkError};
use crate::types::{
    CancelResult, JobActionResult, JobStatusResult, StartOrderParams, StartOrderResult,
    StatsResult,
};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use std::time::Duration;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// High-level client for the SDW Order Runner daemon
///
/// # Example
///
/// ```no_run
/// use sdw_sdk::SdwOrderClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = SdwOrderClient::connect("http://127.0.0.1:8721").await?;
/// # Ok(())
/// # }
/// ```
pub struct SdwOrderClient {
    client: HttpClient,
}

impl SdwOrderClient {
    /// Connect to the daemon
    ///
    /// # Arguments
    ///
    /// * `url` - RPC endpoint URL (e.g., `http://127.0.0.1:8721`)
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        let client = HttpClientBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .build(url.as_ref())
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self { client })
    }

    /// Start processing an order
    ///
    /// Returns as soon as the automation worker is spawned; use
    /// [`status`](Self::status) to follow progress.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use sdw_sdk::{SdwOrderClient, StartOrderParams};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client = SdwOrderClient::connect("http://127.0.0.1:8721").await?;
    /// let started = client.start_order(StartOrderParams::order("123456")).await?;
    /// println!("Job ID: {}", started.job_id);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn start_order(&self, request: StartOrderParams) -> Result<StartOrderResult> {
        let mut params = ObjectParams::new();
        params.insert("order_number", &request.order_number)?;
        params.insert("card", &request.card)?;
        params.insert("mode", &request.mode)?;
        if let Some(link) = &request.quote_link {
            params.insert("quote_link", link)?;
        }

        Ok(self.client.request("order.start.v1", params).await?)
    }

    /// Fetch the full snapshot of one job
    pub async fn status(&self, job_id: impl AsRef<str>) -> Result<JobStatusResult> {
        let mut params = ObjectParams::new();
        params.insert("job_id", job_id.as_ref())?;

        Ok(self.client.request("order.status.v1", params).await?)
    }

    /// Confirm a purchase that is awaiting confirmation
    ///
    /// Fails with a conflict (code 4002) unless the job is in
    /// `awaiting_confirmation`.
    pub async fn confirm(&self, job_id: impl AsRef<str>) -> Result<JobActionResult> {
        let mut params = ObjectParams::new();
        params.insert("job_id", job_id.as_ref())?;

        Ok(self.client.request("order.confirm.v1", params).await?)
    }

    /// Answer a pending interactive prompt
    pub async fn submit_input(
        &self,
        job_id: impl AsRef<str>,
        response: serde_json::Value,
    ) -> Result<JobActionResult> {
        let mut params = ObjectParams::new();
        params.insert("job_id", job_id.as_ref())?;
        params.insert("response", response)?;

        Ok(self.client.request("order.input.v1", params).await?)
    }

    /// Cancel a job (idempotent)
    pub async fn cancel(&self, job_id: impl AsRef<str>) -> Result<CancelResult> {
        let mut params = ObjectParams::new();
        params.insert("job_id", job_id.as_ref())?;

        Ok(self.client.request("order.cancel.v1", params).await?)
    }

    /// Daemon statistics
    pub async fn stats(&self) -> Result<StatsResult> {
        Ok(self
            .client
            .request("admin.stats.v1", ObjectParams::new())
            .await?)
    }

    /// Poll until the job settles: terminal, awaiting confirmation, or
    /// awaiting user input. The caller decides what to do next.
    pub async fn wait_until_settled(&self, job_id: impl AsRef<str>) -> Result<JobStatusResult> {
        let job_id = job_id.as_ref();
        loop {
            let snap = self.status(job_id).await?;
            if snap.is_terminal()
                || snap.status == "awaiting_confirmation"
                || snap.status == "awaiting_user_input"
            {
                return Ok(snap);
            }
            tokio::time::sleep(DEFAULT_POLL_INTERVAL).await;
        }
    }
}
