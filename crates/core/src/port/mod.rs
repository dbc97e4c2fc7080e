// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod signal_channel;
pub mod time_provider;
pub mod worker_spawner;

// Re-exports
pub use id_provider::IdProvider;
pub use signal_channel::SignalChannel;
pub use time_provider::TimeProvider;
pub use worker_spawner::{SpawnError, WorkerEvent, WorkerHandle, WorkerSpawner, WorkerSpec};
