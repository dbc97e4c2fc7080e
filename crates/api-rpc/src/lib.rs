//! JSON-RPC API Layer
//!
//! Implements the JSON-RPC 2.0 server for the SDW Order Runner. All methods
//! are versioned (`order.start.v1` etc.) and bind to localhost only.

pub mod error;
pub mod handler;
pub mod rate_limiter;
pub mod server;
pub mod types;

pub use server::{RpcServer, RpcServerConfig};
