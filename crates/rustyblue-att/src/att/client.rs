//! ATT Client implementation
//!
//! [`AttClient`] ties the PDU encoders and decoders to a transport. It keeps
//! one [`PreparedWriteQueue`] per registered connection, reads the MTU from the
//! bearer at encode time and only hands complete, validated PDUs to
//! [`AttBearer::transmit`]. It never waits for a response: matching responses
//! to outstanding requests is left to the layer above.
use super::constants::*;
use super::error::{AttError, AttResult};
use super::queue::{EchoStatus, PreparedWrite, PreparedWriteQueue};
use super::types::*;
use crate::transport::{AttBearer, ConnectionHandle};
use log::{debug, trace, warn};
use std::collections::HashMap;

/// What a Write Request does with a value longer than `mtu - 3`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OversizePolicy {
    /// Send the first `mtu - 3` bytes
    Truncate,
    /// Fail with [`AttError::TooLarge`]
    Reject,
}

/// ATT Client configuration
#[derive(Debug, Clone)]
pub struct AttClientConfig {
    /// MTU assumed when the bearer reports less than the protocol minimum
    pub default_mtu: u16,
    /// Prepared writes a connection may have queued at once
    pub prepare_queue_capacity: usize,
    /// Oversized Write Request handling. Write Commands always truncate.
    pub write_request_oversize: OversizePolicy,
}

impl Default for AttClientConfig {
    fn default() -> Self {
        Self {
            default_mtu: ATT_DEFAULT_MTU,
            prepare_queue_capacity: ATT_PREPARE_WRITE_QUEUE_SIZE,
            write_request_oversize: OversizePolicy::Truncate,
        }
    }
}

/// ATT Client
pub struct AttClient<B: AttBearer> {
    /// Transport carrying the PDUs
    bearer: B,
    /// Client configuration
    config: AttClientConfig,
    /// Prepared-write queue of every registered connection
    connections: HashMap<ConnectionHandle, PreparedWriteQueue>,
}

impl<B: AttBearer> AttClient<B> {
    /// Create a new ATT client
    pub fn new(bearer: B) -> Self {
        Self::with_config(bearer, AttClientConfig::default())
    }

    /// Create a new ATT client with the given configuration
    pub fn with_config(bearer: B, config: AttClientConfig) -> Self {
        Self {
            bearer,
            config,
            connections: HashMap::new(),
        }
    }

    /// Get client configuration
    pub fn config(&self) -> &AttClientConfig {
        &self.config
    }

    /// Set client configuration
    ///
    /// The queue capacity applies to connections registered afterwards.
    pub fn set_config(&mut self, config: AttClientConfig) {
        self.config = config;
    }

    pub fn bearer(&self) -> &B {
        &self.bearer
    }

    pub fn bearer_mut(&mut self) -> &mut B {
        &mut self.bearer
    }

    /// Register a connection established by the transport
    pub fn connect(&mut self, conn: ConnectionHandle) {
        debug!("ATT client attached to connection {}", conn);
        let capacity = self.config.prepare_queue_capacity;
        self.connections
            .entry(conn)
            .or_insert_with(|| PreparedWriteQueue::new(capacity));
    }

    /// Forget a connection, discarding any prepared writes it had queued
    pub fn disconnect(&mut self, conn: ConnectionHandle) -> bool {
        match self.connections.remove(&conn) {
            Some(queue) => {
                if !queue.is_empty() {
                    debug!(
                        "Dropping {} prepared writes of connection {}",
                        queue.len(),
                        conn
                    );
                }
                true
            }
            None => false,
        }
    }

    /// Check if a connection is registered
    pub fn is_connected(&self, conn: ConnectionHandle) -> bool {
        self.connections.contains_key(&conn)
    }

    /// Current MTU of a connection
    pub fn mtu(&self, conn: ConnectionHandle) -> AttResult<u16> {
        if !self.is_connected(conn) {
            return Err(AttError::StaleHandle(conn));
        }

        let mtu = self.bearer.mtu(conn)?;
        if mtu < ATT_DEFAULT_MTU {
            Ok(self.config.default_mtu)
        } else {
            Ok(mtu)
        }
    }

    /// Prepared-write queue of a connection
    pub fn prepared_writes(&self, conn: ConnectionHandle) -> AttResult<&PreparedWriteQueue> {
        self.connections.get(&conn).ok_or(AttError::StaleHandle(conn))
    }

    /// Discard the prepared writes of a connection, returning how many there were
    pub fn reset_prepared_writes(&mut self, conn: ConnectionHandle) -> AttResult<usize> {
        let queue = self
            .connections
            .get_mut(&conn)
            .ok_or(AttError::StaleHandle(conn))?;
        let dropped = queue.reset();
        debug!("Reset {} prepared writes on connection {}", dropped, conn);
        Ok(dropped)
    }

    /// Find information
    pub fn find_information(
        &mut self,
        conn: ConnectionHandle,
        start_handle: u16,
        end_handle: u16,
    ) -> AttResult<()> {
        let req = FindInformationRequest {
            start_handle,
            end_handle,
        };
        self.send(conn, &AttRequest::FindInformation(req)).map(|_| ())
    }

    /// Read attribute
    pub fn read(&mut self, conn: ConnectionHandle, handle: u16) -> AttResult<()> {
        self.send(conn, &AttRequest::Read(ReadRequest { handle }))
            .map(|_| ())
    }

    /// Read blob
    pub fn read_blob(&mut self, conn: ConnectionHandle, handle: u16, offset: u16) -> AttResult<()> {
        let req = ReadBlobRequest { handle, offset };
        self.send(conn, &AttRequest::ReadBlob(req)).map(|_| ())
    }

    /// Read multiple attributes
    pub fn read_multiple(&mut self, conn: ConnectionHandle, handles: &[u16]) -> AttResult<()> {
        let req = ReadMultipleRequest { handles };
        self.send(conn, &AttRequest::ReadMultiple(req)).map(|_| ())
    }

    /// Write request
    ///
    /// Returns the number of value bytes sent, which is less than
    /// `value.len()` when the value was truncated to the MTU.
    pub fn write(&mut self, conn: ConnectionHandle, handle: u16, value: &[u8]) -> AttResult<usize> {
        let pdu = self.send(conn, &AttRequest::Write(WriteRequest { handle, value }))?;
        Ok(pdu.len() - ATT_WRITE_REQ_BASE_SZ)
    }

    /// Write command (no response)
    ///
    /// Returns the number of value bytes sent.
    pub fn write_command(
        &mut self,
        conn: ConnectionHandle,
        handle: u16,
        value: &[u8],
    ) -> AttResult<usize> {
        let pdu = self.send(conn, &AttRequest::WriteCommand(WriteCommand { handle, value }))?;
        Ok(pdu.len() - ATT_WRITE_REQ_BASE_SZ)
    }

    /// Prepare write request
    pub fn prepare_write(
        &mut self,
        conn: ConnectionHandle,
        handle: u16,
        offset: u16,
        value: &[u8],
    ) -> AttResult<()> {
        let req = PrepareWriteRequest {
            handle,
            offset,
            value,
        };
        self.send(conn, &AttRequest::PrepareWrite(req)).map(|_| ())
    }

    /// Execute write request
    ///
    /// Returns the fragments that were queued on the connection. They are
    /// flushed whether `flags` confirms or cancels them at the peer.
    pub fn execute_write(&mut self, conn: ConnectionHandle, flags: u8) -> AttResult<Vec<PreparedWrite>> {
        self.execute(conn, ExecuteWriteRequest { flags })
            .map(|(_, flushed)| flushed)
    }

    fn execute(
        &mut self,
        conn: ConnectionHandle,
        req: ExecuteWriteRequest,
    ) -> AttResult<(Vec<u8>, Vec<PreparedWrite>)> {
        let pdu = self.encode(conn, &AttRequest::ExecuteWrite(req))?;

        let queue = self
            .connections
            .get_mut(&conn)
            .ok_or(AttError::StaleHandle(conn))?;
        transmit(&mut self.bearer, conn, &pdu)?;

        let flushed = queue.flush();
        debug!(
            "Execute write (flags 0x{:02X}) flushed {} prepared writes on connection {}",
            req.flags,
            flushed.len(),
            conn
        );
        Ok((pdu, flushed))
    }

    /// Confirm a Handle Value Indication
    pub fn confirm_indication(&mut self, conn: ConnectionHandle) -> AttResult<()> {
        let conf = AttRequest::HandleValueConfirmation(HandleValueConfirmation);
        self.send(conn, &conf).map(|_| ())
    }

    /// Validate, encode and transmit any request, returning the PDU sent
    ///
    /// Prepare Write and Execute Write go through the connection's
    /// prepared-write queue exactly as their dedicated methods do.
    pub fn send(&mut self, conn: ConnectionHandle, request: &AttRequest<'_>) -> AttResult<Vec<u8>> {
        if let AttRequest::ExecuteWrite(req) = request {
            return self.execute(conn, *req).map(|(pdu, _)| pdu);
        }

        let pdu = self.encode(conn, request)?;
        let queue = self
            .connections
            .get_mut(&conn)
            .ok_or(AttError::StaleHandle(conn))?;

        match request {
            AttRequest::PrepareWrite(req) => {
                queue.admit(req.handle, req.offset, req.value.len())?;
                transmit(&mut self.bearer, conn, &pdu)?;
                queue.push(PreparedWrite::from(req))?;
            }
            _ => transmit(&mut self.bearer, conn, &pdu)?,
        }
        Ok(pdu)
    }

    /// Encode a request for a connection under its current MTU
    fn encode(&self, conn: ConnectionHandle, request: &AttRequest<'_>) -> AttResult<Vec<u8>> {
        let mtu = self.mtu(conn)?;

        if let AttRequest::Write(req) = request {
            if !req.fits(mtu) {
                if self.config.write_request_oversize == OversizePolicy::Reject {
                    return Err(AttError::TooLarge {
                        len: ATT_WRITE_REQ_BASE_SZ + req.value.len(),
                        mtu,
                    });
                }
                debug!(
                    "Truncating write of {} bytes to handle 0x{:04X} to MTU {}",
                    req.value.len(),
                    req.handle,
                    mtu
                );
            }
        }
        if let AttRequest::WriteCommand(cmd) = request {
            if ATT_WRITE_REQ_BASE_SZ + cmd.value.len() > mtu as usize {
                debug!(
                    "Truncating write command of {} bytes to handle 0x{:04X} to MTU {}",
                    cmd.value.len(),
                    cmd.handle,
                    mtu
                );
            }
        }

        request.encode(mtu)
    }

    /// Decode a PDU received on a connection
    ///
    /// Prepare Write Responses are matched against the connection's queue in
    /// request order and the outcome is left in
    /// [`PreparedWriteQueue::last_echo`]; the decoded response is returned
    /// either way. An Error Response to a Prepare Write Request drops the
    /// fragment it refused. A malformed PDU is reported to the caller;
    /// tearing the link down is the caller's decision.
    pub fn receive<'a>(&mut self, conn: ConnectionHandle, pdu: &'a [u8]) -> AttResult<AttResponse<'a>> {
        let queue = self
            .connections
            .get_mut(&conn)
            .ok_or(AttError::StaleHandle(conn))?;
        trace!("ATT rx on {}: {}", conn, hex::encode(pdu));

        let response = AttResponse::parse(pdu).map_err(|err| {
            warn!("Dropping bad ATT PDU on connection {}: {}", conn, err);
            err
        })?;
        debug!("Received ATT opcode 0x{:02X} on connection {}", response.opcode(), conn);

        match &response {
            AttResponse::PrepareWrite(rsp) => match queue.confirm_echo(rsp) {
                EchoStatus::Matched => {}
                status => warn!(
                    "Prepare write echo for handle 0x{:04X} offset {} on connection {}: {:?}",
                    rsp.handle, rsp.offset, conn, status
                ),
            },
            AttResponse::Error(rsp) if rsp.request_opcode == ATT_PREPARE_WRITE_REQ => {
                if let Some(refused) = queue.reject_oldest() {
                    debug!(
                        "Peer refused prepared write to handle 0x{:04X} offset {} on connection {}",
                        refused.handle, refused.offset, conn
                    );
                }
            }
            _ => {}
        }
        Ok(response)
    }
}

fn transmit<B: AttBearer>(bearer: &mut B, conn: ConnectionHandle, pdu: &[u8]) -> AttResult<()> {
    debug!(
        "Sending ATT opcode 0x{:02X} ({} bytes) on connection {}",
        pdu.first().copied().unwrap_or_default(),
        pdu.len(),
        conn
    );
    trace!("ATT tx on {}: {}", conn, hex::encode(pdu));
    bearer.transmit(conn, pdu)?;
    Ok(())
}
