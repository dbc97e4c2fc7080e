//! RPC Method Handlers
//!
//! Thin layer between the wire types and the order service: rate limiting,
//! type conversion, error mapping. No business rules live here.

use crate::error::{throttled, to_rpc_error};
use crate::rate_limiter::RateLimiter;
use crate::types::{
    CancelRequest, CancelResponse, ConfirmRequest, ConfirmResponse, StartRequest, StartResponse,
    StatsRequest, StatsResponse, StatusRequest, StatusResponse, UserInputRequest,
    UserInputResponse,
};
use jsonrpsee::types::ErrorObjectOwned;
use sdw_core::application::{OrderService, StartOrderRequest};
use sdw_core::domain::JobStatus;
use std::sync::Arc;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    service: Arc<OrderService>,
    rate_limiter: RateLimiter,
    start_time: std::time::Instant,
}

impl RpcHandler {
    pub fn new(service: Arc<OrderService>) -> Self {
        // Default: 200 burst, 100 req/sec (configurable via env)
        let max_burst: u32 = std::env::var("SDW_RATE_LIMIT_BURST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(200);

        let rate_per_sec: u32 = std::env::var("SDW_RATE_LIMIT_RATE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100);

        Self {
            service,
            rate_limiter: RateLimiter::new(max_burst, rate_per_sec),
            start_time: std::time::Instant::now(),
        }
    }

    fn throttle(&self) -> Result<(), ErrorObjectOwned> {
        if self.rate_limiter.check() {
            Ok(())
        } else {
            Err(throttled())
        }
    }

    /// order.start.v1
    pub async fn start(&self, params: StartRequest) -> Result<StartResponse, ErrorObjectOwned> {
        self.throttle()?;

        let snap = self
            .service
            .start(StartOrderRequest {
                order_number: params.order_number,
                card: params.card,
                mode: params.mode,
                quote_link: params.quote_link,
            })
            .await
            .map_err(to_rpc_error)?;

        Ok(StartResponse {
            job_id: snap.job_id,
            order_number: snap.order_number,
            status: snap.status.to_string(),
        })
    }

    /// order.status.v1
    pub async fn status(&self, params: StatusRequest) -> Result<StatusResponse, ErrorObjectOwned> {
        self.throttle()?;
        self.service
            .status(&params.job_id)
            .await
            .map_err(to_rpc_error)
    }

    /// order.confirm.v1
    pub async fn confirm(
        &self,
        params: ConfirmRequest,
    ) -> Result<ConfirmResponse, ErrorObjectOwned> {
        self.throttle()?;
        let snap = self
            .service
            .confirm(&params.job_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(ConfirmResponse {
            job_id: snap.job_id,
            status: snap.status.to_string(),
        })
    }

    /// order.input.v1
    pub async fn submit_input(
        &self,
        params: UserInputRequest,
    ) -> Result<UserInputResponse, ErrorObjectOwned> {
        self.throttle()?;
        let snap = self
            .service
            .submit_user_input(&params.job_id, params.response)
            .await
            .map_err(to_rpc_error)?;

        Ok(UserInputResponse {
            job_id: snap.job_id,
            status: snap.status.to_string(),
        })
    }

    /// order.cancel.v1
    pub async fn cancel(&self, params: CancelRequest) -> Result<CancelResponse, ErrorObjectOwned> {
        self.throttle()?;
        let snap = self
            .service
            .cancel(&params.job_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(CancelResponse {
            job_id: snap.job_id,
            cancelled: snap.status == JobStatus::Cancelled,
            status: snap.status.to_string(),
        })
    }

    /// admin.stats.v1
    pub async fn stats(&self, _params: StatsRequest) -> Result<StatsResponse, ErrorObjectOwned> {
        let store = self.service.store();

        let awaiting_confirmation = store.count_by_status(JobStatus::AwaitingConfirmation).await;
        let awaiting_user_input = store.count_by_status(JobStatus::AwaitingUserInput).await;
        let completed_jobs = store.count_by_status(JobStatus::Completed).await;
        let failed_jobs = store.count_by_status(JobStatus::Failed).await;
        let cancelled_jobs = store.count_by_status(JobStatus::Cancelled).await;
        let total_jobs = store.len().await;

        let parked = awaiting_confirmation + awaiting_user_input;
        let terminal = completed_jobs + failed_jobs + cancelled_jobs;
        let active_jobs = total_jobs.saturating_sub(parked + terminal);

        Ok(StatsResponse {
            total_jobs,
            active_jobs,
            awaiting_confirmation,
            awaiting_user_input,
            completed_jobs,
            failed_jobs,
            cancelled_jobs,
            uptime_seconds: self.start_time.elapsed().as_secs() as i64,
            version: sdw_core::VERSION.to_string(),
        })
    }
}
