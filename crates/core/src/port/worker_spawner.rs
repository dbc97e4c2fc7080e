// Worker Spawner Port
// Abstraction over spawning and supervising the external automation worker

use async_trait::async_trait;
use thiserror::Error;

/// Command specification for one worker process
///
/// The adapter decides which interpreter/script to run; core only supplies
/// the per-job arguments.
#[derive(Debug, Clone)]
pub struct WorkerSpec {
    pub job_id: String,
    pub order_number: String,
    pub args: Vec<String>,
}

/// One observation from a running worker
///
/// Stdout/Stderr chunks are raw reads: a single chunk may carry several
/// newline-separated logical lines, and consumers must split before
/// interpreting anything.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Stdout(String),
    Stderr(String),
    Exited { exit_code: Option<i32> },
}

/// Spawn errors
#[derive(Error, Debug)]
pub enum SpawnError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Process kill failed: {0}")]
    Killed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Handle to one spawned worker, owned by its bridge task
#[async_trait]
pub trait WorkerHandle: Send {
    /// OS process id, if the process started
    fn pid(&self) -> Option<i32>;

    /// Next event from the worker, in OS delivery order for this process.
    /// Returns `None` once `Exited` has been delivered.
    async fn next_event(&mut self) -> Option<WorkerEvent>;
}

/// Worker Spawner trait
///
/// Implementations:
/// - TokioWorkerSpawner: spawns the real automation script (infra-system)
/// - mocks::MockWorkerSpawner: scripted events for tests
#[async_trait]
pub trait WorkerSpawner: Send + Sync {
    /// Spawn a worker for `spec` and return its event stream
    ///
    /// # Errors
    /// - SpawnError::SpawnFailed if the process cannot be started
    async fn spawn(&self, spec: &WorkerSpec) -> Result<Box<dyn WorkerHandle>, SpawnError>;

    /// Terminate a running worker by PID (best effort, SIGTERM then SIGKILL)
    async fn kill(&self, pid: i32) -> Result<(), SpawnError>;

    /// Check if a worker process is still alive
    fn is_alive(&self, pid: i32) -> bool;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Mock handle replaying a scripted event sequence
    pub struct MockWorkerHandle {
        pid: Option<i32>,
        events: VecDeque<WorkerEvent>,
    }

    impl MockWorkerHandle {
        pub fn new(pid: Option<i32>, events: Vec<WorkerEvent>) -> Self {
            Self {
                pid,
                events: events.into(),
            }
        }

        /// Script ending in a clean exit
        pub fn exiting(pid: i32, events: Vec<WorkerEvent>, exit_code: i32) -> Self {
            let mut events = events;
            events.push(WorkerEvent::Exited {
                exit_code: Some(exit_code),
            });
            Self::new(Some(pid), events)
        }
    }

    #[async_trait]
    impl WorkerHandle for MockWorkerHandle {
        fn pid(&self) -> Option<i32> {
            self.pid
        }

        async fn next_event(&mut self) -> Option<WorkerEvent> {
            self.events.pop_front()
        }
    }

    /// Mock spawner handing out pre-scripted handles and recording kills
    #[derive(Default)]
    pub struct MockWorkerSpawner {
        scripts: Mutex<VecDeque<Vec<WorkerEvent>>>,
        killed: Arc<Mutex<Vec<i32>>>,
        next_pid: Mutex<i32>,
    }

    impl MockWorkerSpawner {
        pub fn new() -> Self {
            Self {
                scripts: Mutex::new(VecDeque::new()),
                killed: Arc::new(Mutex::new(Vec::new())),
                next_pid: Mutex::new(1000),
            }
        }

        /// Queue the event script for the next spawned worker
        pub fn push_script(&self, events: Vec<WorkerEvent>) {
            if let Ok(mut scripts) = self.scripts.lock() {
                scripts.push_back(events);
            }
        }

        pub fn killed_pids(&self) -> Vec<i32> {
            self.killed.lock().map(|k| k.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl WorkerSpawner for MockWorkerSpawner {
        async fn spawn(&self, _spec: &WorkerSpec) -> Result<Box<dyn WorkerHandle>, SpawnError> {
            let events = self
                .scripts
                .lock()
                .ok()
                .and_then(|mut s| s.pop_front())
                .unwrap_or_default();
            let pid = {
                let mut next = self
                    .next_pid
                    .lock()
                    .map_err(|_| SpawnError::SpawnFailed("pid lock poisoned".to_string()))?;
                *next += 1;
                *next
            };
            Ok(Box::new(MockWorkerHandle::new(Some(pid), events)))
        }

        async fn kill(&self, pid: i32) -> Result<(), SpawnError> {
            if let Ok(mut killed) = self.killed.lock() {
                killed.push(pid);
            }
            Ok(())
        }

        fn is_alive(&self, _pid: i32) -> bool {
            false
        }
    }
}
