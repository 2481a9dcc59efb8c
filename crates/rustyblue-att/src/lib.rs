//! RustyBlue ATT - client-side Attribute Protocol for Bluetooth LE
//!
//! This library encodes outbound ATT requests into PDUs that fit the
//! negotiated MTU, decodes inbound ATT PDUs into bounds-checked records and
//! tracks the prepared-write transaction of every connection. The transport
//! underneath (channel lookup, segmentation, MTU negotiation) is reached
//! through the [`AttBearer`] trait.

pub mod att;
pub mod error;
pub mod transport;
pub mod uuid;

// Re-export common types for convenience
pub use att::{AttClient, AttClientConfig, AttError, AttRequest, AttResponse, AttResult};
pub use error::TransportError;
pub use transport::{AttBearer, ConnectionHandle};
pub use uuid::Uuid;
