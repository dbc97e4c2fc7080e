// Order Service - Core use cases for purchase-job management

pub mod actions;
pub mod start;

pub use start::StartOrderRequest;

use std::sync::Arc;

use crate::domain::{JobSnapshot, JobStore};
use crate::error::Result;
use crate::port::{IdProvider, SignalChannel, TimeProvider, WorkerSpawner};

/// Order Service
///
/// Owns the injected store and ports; one instance is shared by all RPC
/// handlers. Workers are spawned per job - there is no queue in front of
/// them.
pub struct OrderService {
    store: Arc<JobStore>,
    spawner: Arc<dyn WorkerSpawner>,
    signals: Arc<dyn SignalChannel>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl OrderService {
    pub fn new(
        store: Arc<JobStore>,
        spawner: Arc<dyn WorkerSpawner>,
        signals: Arc<dyn SignalChannel>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            store,
            spawner,
            signals,
            id_provider,
            time_provider,
        }
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Start processing an order; returns immediately with the new job
    pub async fn start(&self, req: StartOrderRequest) -> Result<JobSnapshot> {
        start::execute(
            &self.store,
            &self.spawner,
            self.id_provider.as_ref(),
            &self.time_provider,
            req,
        )
        .await
    }

    /// Full snapshot of one job
    pub async fn status(&self, job_id: &str) -> Result<JobSnapshot> {
        self.store.snapshot(job_id).await
    }

    /// Confirm a purchase awaiting confirmation
    pub async fn confirm(&self, job_id: &str) -> Result<JobSnapshot> {
        actions::confirm(&self.store, &self.signals, job_id).await
    }

    /// Answer a pending interactive prompt
    pub async fn submit_user_input(
        &self,
        job_id: &str,
        response: serde_json::Value,
    ) -> Result<JobSnapshot> {
        actions::submit_user_input(&self.store, &self.signals, job_id, response).await
    }

    /// Cancel a job (idempotent)
    pub async fn cancel(&self, job_id: &str) -> Result<JobSnapshot> {
        actions::cancel(
            &self.store,
            &self.spawner,
            self.time_provider.as_ref(),
            job_id,
        )
        .await
    }
}
