// SDW Infrastructure - System Adapters
// Implements: WorkerSpawner, SignalChannel

pub mod fs_signal_channel;
pub mod process_spawner;

pub use fs_signal_channel::FsSignalChannel;
pub use process_spawner::{TokioWorkerSpawner, WorkerCommand};
