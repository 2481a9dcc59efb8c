//! Error types for the rustyblue-att library
//!
//! This module defines the errors reported by the transport underneath the
//! ATT layer. ATT-level failures live in [`crate::att::AttError`].

use crate::transport::ConnectionHandle;
use thiserror::Error;

/// Errors that a bearer can report when the ATT layer asks it for the MTU of a
/// connection or hands it a PDU to transmit
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection handle {0} is no longer valid")]
    StaleHandle(ConnectionHandle),

    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}
