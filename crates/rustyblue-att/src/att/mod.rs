//! Attribute Protocol (ATT) client implementation
//!
//! This module provides the client side of ATT, the protocol that GATT
//! operations ride on: request encoders that respect the negotiated MTU,
//! bounds-checked response decoders, and per-connection tracking of
//! prepared-write transactions.

pub mod constants;
pub mod codec;
pub mod types;
pub mod queue;
pub mod client;
pub mod error;

// Re-export the public API
pub use self::client::{AttClient, AttClientConfig, OversizePolicy};
pub use self::error::{AttError, AttErrorCode, AttResult};
pub use self::queue::{EchoStatus, PreparedWrite, PreparedWriteQueue, QueueState};
pub use self::types::*;
