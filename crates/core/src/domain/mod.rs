// Domain Layer - Pure business logic and entities

pub mod error;
pub mod job;
pub mod store;

// Re-exports
pub use error::DomainError;
pub use job::{Job, JobId, JobSnapshot, JobStatus, OrderNumber, UserInputPrompt};
pub use store::JobStore;
