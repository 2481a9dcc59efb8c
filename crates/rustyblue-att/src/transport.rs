//! Transport adapter seam
//!
//! The ATT layer never talks to a controller itself. It reads the MTU that was
//! negotiated for a link and hands finished PDUs to an [`AttBearer`], which is
//! typically the fixed ATT channel of an L2CAP implementation.

use crate::error::TransportError;
use std::fmt;

/// Opaque identifier of one active link, handed out by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionHandle(pub u16);

impl ConnectionHandle {
    /// Get the raw handle value
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl From<u16> for ConnectionHandle {
    fn from(raw: u16) -> Self {
        ConnectionHandle(raw)
    }
}

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

/// Reliable, ordered carrier of ATT PDUs for a set of connections
///
/// Implementations must not block waiting for a peer response; `transmit`
/// only queues the PDU for delivery.
pub trait AttBearer {
    /// Current ATT MTU of the connection
    fn mtu(&self, conn: ConnectionHandle) -> Result<u16, TransportError>;

    /// Queue a fully encoded PDU for transmission on the connection
    fn transmit(&mut self, conn: ConnectionHandle, pdu: &[u8]) -> Result<(), TransportError>;
}

impl<B: AttBearer + ?Sized> AttBearer for &mut B {
    fn mtu(&self, conn: ConnectionHandle) -> Result<u16, TransportError> {
        (**self).mtu(conn)
    }

    fn transmit(&mut self, conn: ConnectionHandle, pdu: &[u8]) -> Result<(), TransportError> {
        (**self).transmit(conn, pdu)
    }
}
