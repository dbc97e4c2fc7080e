// Application Layer - Use cases wiring the domain to the ports

pub mod bridge;
pub mod order;
pub mod progress;


pub use bridge::WorkerBridge;
pub use order::{OrderService, StartOrderRequest};
