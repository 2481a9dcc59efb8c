//! Type definitions for the ATT protocol
//!
//! Requests implement [`EncodePdu`]: they validate their parameters against the
//! connection MTU, compute the final PDU length and serialize through a
//! [`PduWriter`]. Responses implement [`DecodePdu`]: they check the opcode and
//! the minimum length, then borrow their fields from the received buffer.
//!
//! [`AttRequest`] and [`AttResponse`] close the set of operations so callers
//! can match on every PDU kind exhaustively.
use super::codec::{PduReader, PduWriter};
use super::constants::*;
use super::error::{AttError, AttErrorCode, AttResult};
use crate::uuid::Uuid;
use bitflags::bitflags;

bitflags! {
    /// Flags byte of an Execute Write Request
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ExecuteWriteFlags: u8 {
        const CONFIRM = ATT_EXEC_WRITE_F_CONFIRM;
    }
}

/// Outbound ATT PDU
pub trait EncodePdu {
    /// Opcode for this PDU
    const OPCODE: u8;

    /// Validate the parameters and return the length of the PDU under `mtu`
    fn pdu_len(&self, mtu: u16) -> AttResult<usize>;

    /// Serialize everything after the opcode
    fn write_fields(&self, writer: &mut PduWriter<'_>) -> AttResult<()>;

    /// Encode into `buf` and return the PDU length
    ///
    /// Nothing is written when validation fails.
    fn encode_into(&self, mtu: u16, buf: &mut [u8]) -> AttResult<usize> {
        let len = self.pdu_len(mtu)?;
        if buf.len() < len {
            return Err(AttError::BufferTooShort {
                needed: len,
                available: buf.len(),
            });
        }

        let mut writer = PduWriter::new(&mut buf[..len]);
        writer.write_u8(Self::OPCODE)?;
        self.write_fields(&mut writer)?;
        Ok(writer.position())
    }

    /// Encode into a freshly allocated buffer
    fn encode(&self, mtu: u16) -> AttResult<Vec<u8>> {
        let mut pdu = vec![0u8; self.pdu_len(mtu)?];
        let len = self.encode_into(mtu, &mut pdu)?;
        pdu.truncate(len);
        Ok(pdu)
    }
}

/// Inbound ATT PDU, borrowing from the received buffer
pub trait DecodePdu<'a>: Sized {
    /// Opcode for this PDU
    const OPCODE: u8;

    /// Shortest valid PDU, opcode included
    const MIN_LEN: usize;

    /// Parse everything after the opcode
    fn read_fields(reader: &mut PduReader<'a>) -> AttResult<Self>;

    /// Decode a whole PDU, opcode included
    fn decode(pdu: &'a [u8]) -> AttResult<Self> {
        match pdu.first() {
            None => return Err(AttError::malformed(Self::OPCODE, "empty PDU")),
            Some(&opcode) if opcode != Self::OPCODE => {
                return Err(AttError::malformed(opcode, "unexpected opcode"))
            }
            Some(_) => {}
        }
        if pdu.len() < Self::MIN_LEN {
            return Err(AttError::malformed(Self::OPCODE, "PDU shorter than minimum size"));
        }

        let mut reader = PduReader::new(pdu);
        reader.read_u8()?;
        Self::read_fields(&mut reader)
    }
}

/// Fail with `TooLarge` unless a PDU of `len` bytes fits `mtu`
fn check_fits(len: usize, mtu: u16) -> AttResult<usize> {
    if len > mtu as usize {
        return Err(AttError::TooLarge { len, mtu });
    }
    Ok(len)
}

fn check_handle(handle: u16, what: &str) -> AttResult<()> {
    if handle == ATT_HANDLE_INVALID {
        return Err(AttError::invalid(format!("{} handle is 0", what)));
    }
    Ok(())
}

/// Fixed-size responses carry nothing past their last field
fn check_consumed(reader: &PduReader<'_>, opcode: u8) -> AttResult<()> {
    if !reader.is_empty() {
        return Err(AttError::malformed(opcode, "trailing bytes after fixed-size PDU"));
    }
    Ok(())
}

/// Find Information Request packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindInformationRequest {
    /// First requested handle
    pub start_handle: u16,
    /// Last requested handle
    pub end_handle: u16,
}

impl EncodePdu for FindInformationRequest {
    const OPCODE: u8 = ATT_FIND_INFO_REQ;

    fn pdu_len(&self, mtu: u16) -> AttResult<usize> {
        check_handle(self.start_handle, "start")?;
        if self.start_handle > self.end_handle {
            return Err(AttError::invalid(format!(
                "start handle 0x{:04X} greater than end handle 0x{:04X}",
                self.start_handle, self.end_handle
            )));
        }
        check_fits(ATT_FIND_INFO_REQ_SZ, mtu)
    }

    fn write_fields(&self, writer: &mut PduWriter<'_>) -> AttResult<()> {
        writer.write_u16_le(self.start_handle)?;
        writer.write_u16_le(self.end_handle)
    }
}

/// Read Request packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRequest {
    /// Handle to read
    pub handle: u16,
}

impl EncodePdu for ReadRequest {
    const OPCODE: u8 = ATT_READ_REQ;

    fn pdu_len(&self, mtu: u16) -> AttResult<usize> {
        check_handle(self.handle, "attribute")?;
        check_fits(ATT_READ_REQ_SZ, mtu)
    }

    fn write_fields(&self, writer: &mut PduWriter<'_>) -> AttResult<()> {
        writer.write_u16_le(self.handle)
    }
}

/// Read Blob Request packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadBlobRequest {
    /// Handle to read
    pub handle: u16,
    /// Offset of the first value byte to return
    pub offset: u16,
}

impl EncodePdu for ReadBlobRequest {
    const OPCODE: u8 = ATT_READ_BLOB_REQ;

    fn pdu_len(&self, mtu: u16) -> AttResult<usize> {
        check_handle(self.handle, "attribute")?;
        check_fits(ATT_READ_BLOB_REQ_SZ, mtu)
    }

    fn write_fields(&self, writer: &mut PduWriter<'_>) -> AttResult<()> {
        writer.write_u16_le(self.handle)?;
        writer.write_u16_le(self.offset)
    }
}

/// Read Multiple Request packet
///
/// Rejected rather than truncated when the handle list does not fit the MTU,
/// since dropping handles would change the meaning of the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadMultipleRequest<'a> {
    /// Handles to read, in request order
    pub handles: &'a [u16],
}

impl EncodePdu for ReadMultipleRequest<'_> {
    const OPCODE: u8 = ATT_READ_MULTIPLE_REQ;

    fn pdu_len(&self, mtu: u16) -> AttResult<usize> {
        if self.handles.is_empty() {
            return Err(AttError::invalid("read multiple needs at least one handle"));
        }
        check_fits(ATT_READ_MULTIPLE_REQ_BASE_SZ + 2 * self.handles.len(), mtu)
    }

    fn write_fields(&self, writer: &mut PduWriter<'_>) -> AttResult<()> {
        for &handle in self.handles {
            writer.write_u16_le(handle)?;
        }
        Ok(())
    }
}

/// Length of a write PDU once the value has been cut down to `mtu - 3`
fn truncated_write_len(value_len: usize, mtu: u16) -> AttResult<usize> {
    let len = (ATT_WRITE_REQ_BASE_SZ + value_len).min(mtu as usize);
    check_fits(len.max(ATT_WRITE_REQ_BASE_SZ), mtu)
}

fn write_handle_value(writer: &mut PduWriter<'_>, handle: u16, value: &[u8]) -> AttResult<()> {
    writer.write_u16_le(handle)?;
    writer.write_slice_truncated(value);
    Ok(())
}

/// Write Request packet
///
/// A value longer than `mtu - 3` bytes is silently truncated. Values that
/// must arrive whole go through Prepare Write / Execute Write instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteRequest<'a> {
    /// Handle to write
    pub handle: u16,
    /// Value to write
    pub value: &'a [u8],
}

impl WriteRequest<'_> {
    /// Whether the value goes out whole under `mtu`
    pub fn fits(&self, mtu: u16) -> bool {
        ATT_WRITE_REQ_BASE_SZ + self.value.len() <= mtu as usize
    }
}

impl EncodePdu for WriteRequest<'_> {
    const OPCODE: u8 = ATT_WRITE_REQ;

    fn pdu_len(&self, mtu: u16) -> AttResult<usize> {
        truncated_write_len(self.value.len(), mtu)
    }

    fn write_fields(&self, writer: &mut PduWriter<'_>) -> AttResult<()> {
        write_handle_value(writer, self.handle, self.value)
    }
}

/// Write Command packet
///
/// Fire-and-forget: no response, and an overlong value is silently truncated
/// to `mtu - 3` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteCommand<'a> {
    /// Handle to write
    pub handle: u16,
    /// Value to write
    pub value: &'a [u8],
}

impl EncodePdu for WriteCommand<'_> {
    const OPCODE: u8 = ATT_WRITE_CMD;

    fn pdu_len(&self, mtu: u16) -> AttResult<usize> {
        truncated_write_len(self.value.len(), mtu)
    }

    fn write_fields(&self, writer: &mut PduWriter<'_>) -> AttResult<()> {
        write_handle_value(writer, self.handle, self.value)
    }
}

/// Prepare Write Request packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrepareWriteRequest<'a> {
    /// Handle to write
    pub handle: u16,
    /// Offset of the fragment inside the attribute value
    pub offset: u16,
    /// Fragment bytes
    pub value: &'a [u8],
}

impl EncodePdu for PrepareWriteRequest<'_> {
    const OPCODE: u8 = ATT_PREPARE_WRITE_REQ;

    fn pdu_len(&self, mtu: u16) -> AttResult<usize> {
        let len = check_fits(ATT_PREPARE_WRITE_BASE_SZ + self.value.len(), mtu)?;

        let end = self.offset as usize + self.value.len();
        if end > ATT_MAX_ATTRIBUTE_LEN {
            return Err(AttError::invalid(format!(
                "offset {} + length {} exceeds maximum attribute length {}",
                self.offset,
                self.value.len(),
                ATT_MAX_ATTRIBUTE_LEN
            )));
        }

        check_handle(self.handle, "attribute")?;
        Ok(len)
    }

    fn write_fields(&self, writer: &mut PduWriter<'_>) -> AttResult<()> {
        writer.write_u16_le(self.handle)?;
        writer.write_u16_le(self.offset)?;
        writer.write_slice(self.value)
    }
}

/// Execute Write Request packet
///
/// Only an empty flags byte or [`ExecuteWriteFlags::CONFIRM`] is legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteWriteRequest {
    /// Raw flags byte
    pub flags: u8,
}

impl ExecuteWriteRequest {
    pub fn new(flags: ExecuteWriteFlags) -> Self {
        Self { flags: flags.bits() }
    }

    /// The validated flags
    pub fn flags(&self) -> AttResult<ExecuteWriteFlags> {
        ExecuteWriteFlags::from_bits(self.flags)
            .ok_or_else(|| AttError::invalid(format!("execute write flags 0x{:02X}", self.flags)))
    }
}

impl EncodePdu for ExecuteWriteRequest {
    const OPCODE: u8 = ATT_EXECUTE_WRITE_REQ;

    fn pdu_len(&self, mtu: u16) -> AttResult<usize> {
        self.flags()?;
        check_fits(ATT_EXECUTE_WRITE_REQ_SZ, mtu)
    }

    fn write_fields(&self, writer: &mut PduWriter<'_>) -> AttResult<()> {
        writer.write_u8(self.flags)
    }
}

/// Handle Value Confirmation packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleValueConfirmation;

impl EncodePdu for HandleValueConfirmation {
    const OPCODE: u8 = ATT_HANDLE_VALUE_CONF;

    fn pdu_len(&self, mtu: u16) -> AttResult<usize> {
        check_fits(ATT_HANDLE_VALUE_CONF_SZ, mtu)
    }

    fn write_fields(&self, _writer: &mut PduWriter<'_>) -> AttResult<()> {
        Ok(())
    }
}

/// Error response packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Request opcode in error
    pub request_opcode: u8,
    /// Attribute handle in error
    pub handle: u16,
    /// Error code
    pub error_code: AttErrorCode,
}

impl ErrorResponse {
    /// Turn the response into the error it reports
    pub fn into_error(self) -> AttError {
        AttError::Protocol {
            code: self.error_code,
            handle: self.handle,
            request_opcode: self.request_opcode,
        }
    }
}

impl<'a> DecodePdu<'a> for ErrorResponse {
    const OPCODE: u8 = ATT_ERROR_RSP;
    const MIN_LEN: usize = ATT_ERROR_RSP_SZ;

    fn read_fields(reader: &mut PduReader<'a>) -> AttResult<Self> {
        let request_opcode = reader.read_u8()?;
        let handle = reader.read_u16_le()?;
        let error_code = reader.read_u8()?.into();
        check_consumed(reader, Self::OPCODE)?;

        Ok(Self {
            request_opcode,
            handle,
            error_code,
        })
    }
}

/// UUID width used by every record of one Find Information Response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UuidFormat {
    /// 16-bit SIG-assigned UUIDs
    Uuid16,
    /// Full 128-bit UUIDs
    Uuid128,
}

impl UuidFormat {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            ATT_FIND_INFO_RSP_FORMAT_16BIT => Some(UuidFormat::Uuid16),
            ATT_FIND_INFO_RSP_FORMAT_128BIT => Some(UuidFormat::Uuid128),
            _ => None,
        }
    }

    pub fn raw(&self) -> u8 {
        match self {
            UuidFormat::Uuid16 => ATT_FIND_INFO_RSP_FORMAT_16BIT,
            UuidFormat::Uuid128 => ATT_FIND_INFO_RSP_FORMAT_128BIT,
        }
    }

    /// Width of the UUID field
    pub fn uuid_len(&self) -> usize {
        match self {
            UuidFormat::Uuid16 => 2,
            UuidFormat::Uuid128 => 16,
        }
    }

    /// Size of one (handle, UUID) record
    pub fn stride(&self) -> usize {
        2 + self.uuid_len()
    }
}

/// One (handle, UUID) record of a Find Information Response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleUuidPair {
    pub handle: u16,
    pub uuid: Uuid,
}

/// Find Information Response packet
///
/// The record list stays a view into the received buffer; its length has
/// been checked to be a whole number of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindInformationResponse<'a> {
    /// Format of information data
    pub format: UuidFormat,
    information_data: &'a [u8],
}

impl<'a> FindInformationResponse<'a> {
    /// Number of records
    pub fn len(&self) -> usize {
        self.information_data.len() / self.format.stride()
    }

    /// True for the "no attributes in range" response
    pub fn is_empty(&self) -> bool {
        self.information_data.is_empty()
    }

    /// Records in the order the peer sent them
    pub fn records(&self) -> impl Iterator<Item = HandleUuidPair> + 'a {
        self.information_data
            .chunks_exact(self.format.stride())
            .filter_map(|record| {
                let (handle, uuid) = record.split_at(2);
                Some(HandleUuidPair {
                    handle: u16::from_le_bytes([handle[0], handle[1]]),
                    uuid: Uuid::from_slice_le(uuid)?,
                })
            })
    }
}

impl<'a> DecodePdu<'a> for FindInformationResponse<'a> {
    const OPCODE: u8 = ATT_FIND_INFO_RSP;
    const MIN_LEN: usize = ATT_FIND_INFO_RSP_BASE_SZ;

    fn read_fields(reader: &mut PduReader<'a>) -> AttResult<Self> {
        let raw_format = reader.read_u8()?;
        let format = UuidFormat::from_raw(raw_format)
            .ok_or_else(|| AttError::malformed(Self::OPCODE, "unknown information data format"))?;

        let information_data = reader.read_rest();
        if information_data.len() % format.stride() != 0 {
            return Err(AttError::malformed(
                Self::OPCODE,
                "information data is not a whole number of records",
            ));
        }

        Ok(Self {
            format,
            information_data,
        })
    }
}

/// Read Response packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadResponse<'a> {
    /// Attribute value, possibly empty
    pub value: &'a [u8],
}

impl<'a> DecodePdu<'a> for ReadResponse<'a> {
    const OPCODE: u8 = ATT_READ_RSP;
    const MIN_LEN: usize = ATT_READ_RSP_BASE_SZ;

    fn read_fields(reader: &mut PduReader<'a>) -> AttResult<Self> {
        Ok(Self {
            value: reader.read_rest(),
        })
    }
}

/// Read Blob Response packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadBlobResponse<'a> {
    /// Part of the value starting at the requested offset
    pub value: &'a [u8],
}

impl<'a> DecodePdu<'a> for ReadBlobResponse<'a> {
    const OPCODE: u8 = ATT_READ_BLOB_RSP;
    const MIN_LEN: usize = ATT_READ_BLOB_RSP_BASE_SZ;

    fn read_fields(reader: &mut PduReader<'a>) -> AttResult<Self> {
        Ok(Self {
            value: reader.read_rest(),
        })
    }
}

/// Read Multiple Response packet
///
/// The values are concatenated without length prefixes. Splitting them needs
/// the attribute schema, which only the caller knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadMultipleResponse<'a> {
    /// Concatenated values
    pub values: &'a [u8],
}

impl<'a> DecodePdu<'a> for ReadMultipleResponse<'a> {
    const OPCODE: u8 = ATT_READ_MULTIPLE_RSP;
    const MIN_LEN: usize = ATT_READ_MULTIPLE_RSP_BASE_SZ;

    fn read_fields(reader: &mut PduReader<'a>) -> AttResult<Self> {
        Ok(Self {
            values: reader.read_rest(),
        })
    }
}

/// Write Response packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteResponse;

impl<'a> DecodePdu<'a> for WriteResponse {
    const OPCODE: u8 = ATT_WRITE_RSP;
    const MIN_LEN: usize = ATT_WRITE_RSP_SZ;

    fn read_fields(reader: &mut PduReader<'a>) -> AttResult<Self> {
        check_consumed(reader, Self::OPCODE)?;
        Ok(Self)
    }
}

/// Prepare Write Response packet, echoing the queued fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrepareWriteResponse<'a> {
    /// Handle the peer queued
    pub handle: u16,
    /// Offset the peer queued
    pub offset: u16,
    /// Fragment bytes the peer queued
    pub value: &'a [u8],
}

impl<'a> DecodePdu<'a> for PrepareWriteResponse<'a> {
    const OPCODE: u8 = ATT_PREPARE_WRITE_RSP;
    const MIN_LEN: usize = ATT_PREPARE_WRITE_BASE_SZ;

    fn read_fields(reader: &mut PduReader<'a>) -> AttResult<Self> {
        let handle = reader.read_u16_le()?;
        let offset = reader.read_u16_le()?;
        let value = reader.read_rest();

        Ok(Self {
            handle,
            offset,
            value,
        })
    }
}

/// Execute Write Response packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteWriteResponse;

impl<'a> DecodePdu<'a> for ExecuteWriteResponse {
    const OPCODE: u8 = ATT_EXECUTE_WRITE_RSP;
    const MIN_LEN: usize = ATT_EXECUTE_WRITE_RSP_SZ;

    fn read_fields(reader: &mut PduReader<'a>) -> AttResult<Self> {
        check_consumed(reader, Self::OPCODE)?;
        Ok(Self)
    }
}

/// Handle Value Notification packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleValueNotification<'a> {
    /// Attribute handle
    pub handle: u16,
    /// Attribute value
    pub value: &'a [u8],
}

impl<'a> DecodePdu<'a> for HandleValueNotification<'a> {
    const OPCODE: u8 = ATT_HANDLE_VALUE_NTF;
    const MIN_LEN: usize = ATT_HANDLE_VALUE_BASE_SZ;

    fn read_fields(reader: &mut PduReader<'a>) -> AttResult<Self> {
        let handle = reader.read_u16_le()?;
        Ok(Self {
            handle,
            value: reader.read_rest(),
        })
    }
}

/// Handle Value Indication packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleValueIndication<'a> {
    /// Attribute handle
    pub handle: u16,
    /// Attribute value
    pub value: &'a [u8],
}

impl<'a> DecodePdu<'a> for HandleValueIndication<'a> {
    const OPCODE: u8 = ATT_HANDLE_VALUE_IND;
    const MIN_LEN: usize = ATT_HANDLE_VALUE_BASE_SZ;

    fn read_fields(reader: &mut PduReader<'a>) -> AttResult<Self> {
        let handle = reader.read_u16_le()?;
        Ok(Self {
            handle,
            value: reader.read_rest(),
        })
    }
}

/// Every PDU a client sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttRequest<'a> {
    FindInformation(FindInformationRequest),
    Read(ReadRequest),
    ReadBlob(ReadBlobRequest),
    ReadMultiple(ReadMultipleRequest<'a>),
    Write(WriteRequest<'a>),
    WriteCommand(WriteCommand<'a>),
    PrepareWrite(PrepareWriteRequest<'a>),
    ExecuteWrite(ExecuteWriteRequest),
    HandleValueConfirmation(HandleValueConfirmation),
}

impl AttRequest<'_> {
    pub fn opcode(&self) -> u8 {
        match self {
            AttRequest::FindInformation(_) => FindInformationRequest::OPCODE,
            AttRequest::Read(_) => ReadRequest::OPCODE,
            AttRequest::ReadBlob(_) => ReadBlobRequest::OPCODE,
            AttRequest::ReadMultiple(_) => ReadMultipleRequest::OPCODE,
            AttRequest::Write(_) => WriteRequest::OPCODE,
            AttRequest::WriteCommand(_) => WriteCommand::OPCODE,
            AttRequest::PrepareWrite(_) => PrepareWriteRequest::OPCODE,
            AttRequest::ExecuteWrite(_) => ExecuteWriteRequest::OPCODE,
            AttRequest::HandleValueConfirmation(_) => HandleValueConfirmation::OPCODE,
        }
    }

    /// Whether the peer answers this PDU
    pub fn expects_response(&self) -> bool {
        !matches!(
            self,
            AttRequest::WriteCommand(_) | AttRequest::HandleValueConfirmation(_)
        )
    }

    /// Validate and return the PDU length under `mtu`
    pub fn pdu_len(&self, mtu: u16) -> AttResult<usize> {
        match self {
            AttRequest::FindInformation(req) => req.pdu_len(mtu),
            AttRequest::Read(req) => req.pdu_len(mtu),
            AttRequest::ReadBlob(req) => req.pdu_len(mtu),
            AttRequest::ReadMultiple(req) => req.pdu_len(mtu),
            AttRequest::Write(req) => req.pdu_len(mtu),
            AttRequest::WriteCommand(req) => req.pdu_len(mtu),
            AttRequest::PrepareWrite(req) => req.pdu_len(mtu),
            AttRequest::ExecuteWrite(req) => req.pdu_len(mtu),
            AttRequest::HandleValueConfirmation(req) => req.pdu_len(mtu),
        }
    }

    pub fn encode_into(&self, mtu: u16, buf: &mut [u8]) -> AttResult<usize> {
        match self {
            AttRequest::FindInformation(req) => req.encode_into(mtu, buf),
            AttRequest::Read(req) => req.encode_into(mtu, buf),
            AttRequest::ReadBlob(req) => req.encode_into(mtu, buf),
            AttRequest::ReadMultiple(req) => req.encode_into(mtu, buf),
            AttRequest::Write(req) => req.encode_into(mtu, buf),
            AttRequest::WriteCommand(req) => req.encode_into(mtu, buf),
            AttRequest::PrepareWrite(req) => req.encode_into(mtu, buf),
            AttRequest::ExecuteWrite(req) => req.encode_into(mtu, buf),
            AttRequest::HandleValueConfirmation(req) => req.encode_into(mtu, buf),
        }
    }

    pub fn encode(&self, mtu: u16) -> AttResult<Vec<u8>> {
        let mut pdu = vec![0u8; self.pdu_len(mtu)?];
        let len = self.encode_into(mtu, &mut pdu)?;
        pdu.truncate(len);
        Ok(pdu)
    }
}

/// Every PDU a client receives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttResponse<'a> {
    Error(ErrorResponse),
    FindInformation(FindInformationResponse<'a>),
    Read(ReadResponse<'a>),
    ReadBlob(ReadBlobResponse<'a>),
    ReadMultiple(ReadMultipleResponse<'a>),
    Write(WriteResponse),
    PrepareWrite(PrepareWriteResponse<'a>),
    ExecuteWrite(ExecuteWriteResponse),
    Notification(HandleValueNotification<'a>),
    Indication(HandleValueIndication<'a>),
}

impl<'a> AttResponse<'a> {
    /// Decode a received PDU, selecting the decoder by opcode
    pub fn parse(pdu: &'a [u8]) -> AttResult<Self> {
        let opcode = *pdu
            .first()
            .ok_or_else(|| AttError::malformed(0, "empty PDU"))?;

        Ok(match opcode {
            ATT_ERROR_RSP => AttResponse::Error(ErrorResponse::decode(pdu)?),
            ATT_FIND_INFO_RSP => AttResponse::FindInformation(FindInformationResponse::decode(pdu)?),
            ATT_READ_RSP => AttResponse::Read(ReadResponse::decode(pdu)?),
            ATT_READ_BLOB_RSP => AttResponse::ReadBlob(ReadBlobResponse::decode(pdu)?),
            ATT_READ_MULTIPLE_RSP => AttResponse::ReadMultiple(ReadMultipleResponse::decode(pdu)?),
            ATT_WRITE_RSP => AttResponse::Write(WriteResponse::decode(pdu)?),
            ATT_PREPARE_WRITE_RSP => AttResponse::PrepareWrite(PrepareWriteResponse::decode(pdu)?),
            ATT_EXECUTE_WRITE_RSP => AttResponse::ExecuteWrite(ExecuteWriteResponse::decode(pdu)?),
            ATT_HANDLE_VALUE_NTF => AttResponse::Notification(HandleValueNotification::decode(pdu)?),
            ATT_HANDLE_VALUE_IND => AttResponse::Indication(HandleValueIndication::decode(pdu)?),
            other => return Err(AttError::UnsupportedOpcode(other)),
        })
    }

    pub fn opcode(&self) -> u8 {
        match self {
            AttResponse::Error(_) => ATT_ERROR_RSP,
            AttResponse::FindInformation(_) => ATT_FIND_INFO_RSP,
            AttResponse::Read(_) => ATT_READ_RSP,
            AttResponse::ReadBlob(_) => ATT_READ_BLOB_RSP,
            AttResponse::ReadMultiple(_) => ATT_READ_MULTIPLE_RSP,
            AttResponse::Write(_) => ATT_WRITE_RSP,
            AttResponse::PrepareWrite(_) => ATT_PREPARE_WRITE_RSP,
            AttResponse::ExecuteWrite(_) => ATT_EXECUTE_WRITE_RSP,
            AttResponse::Notification(_) => ATT_HANDLE_VALUE_NTF,
            AttResponse::Indication(_) => ATT_HANDLE_VALUE_IND,
        }
    }

    /// Opcode of the request this PDU answers; `None` for server-initiated PDUs
    pub fn request_opcode(&self) -> Option<u8> {
        match self {
            AttResponse::Error(rsp) => Some(rsp.request_opcode),
            AttResponse::FindInformation(_) => Some(ATT_FIND_INFO_REQ),
            AttResponse::Read(_) => Some(ATT_READ_REQ),
            AttResponse::ReadBlob(_) => Some(ATT_READ_BLOB_REQ),
            AttResponse::ReadMultiple(_) => Some(ATT_READ_MULTIPLE_REQ),
            AttResponse::Write(_) => Some(ATT_WRITE_REQ),
            AttResponse::PrepareWrite(_) => Some(ATT_PREPARE_WRITE_REQ),
            AttResponse::ExecuteWrite(_) => Some(ATT_EXECUTE_WRITE_REQ),
            AttResponse::Notification(_) | AttResponse::Indication(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MTU: u16 = ATT_DEFAULT_MTU;

    #[test]
    fn test_find_information_request_bytes() {
        let req = FindInformationRequest {
            start_handle: 0x0001,
            end_handle: 0xFFFF,
        };
        assert_eq!(req.encode(MTU).unwrap(), vec![ATT_FIND_INFO_REQ, 0x01, 0x00, 0xFF, 0xFF]);
    }

    #[test]
    fn test_read_blob_request_bytes() {
        let req = ReadBlobRequest {
            handle: 0x1234,
            offset: 0x0100,
        };
        assert_eq!(req.encode(MTU).unwrap(), vec![ATT_READ_BLOB_REQ, 0x34, 0x12, 0x00, 0x01]);
    }

    #[test]
    fn test_read_multiple_too_large() {
        // 1 + 2 * 11 = 23 fits, one more handle does not
        let handles: Vec<u16> = (1..=12).collect();
        let fits = ReadMultipleRequest { handles: &handles[..11] };
        assert_eq!(fits.pdu_len(MTU).unwrap(), 23);

        let too_many = ReadMultipleRequest { handles: &handles };
        match too_many.encode(MTU) {
            Err(AttError::TooLarge { len, mtu }) => {
                assert_eq!(len, 25);
                assert_eq!(mtu, MTU);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_encode_into_caller_buffer() {
        let req = PrepareWriteRequest {
            handle: 0x0010,
            offset: 4,
            value: &[0xAA, 0xBB],
        };
        let mut buf = [0u8; 32];
        let len = req.encode_into(MTU, &mut buf).unwrap();
        assert_eq!(&buf[..len], &[ATT_PREPARE_WRITE_REQ, 0x10, 0x00, 0x04, 0x00, 0xAA, 0xBB]);

        let mut short = [0u8; 4];
        assert!(matches!(
            req.encode_into(MTU, &mut short),
            Err(AttError::BufferTooShort {
                needed: 7,
                available: 4
            })
        ));
        assert_eq!(short, [0u8; 4]);
    }

    #[test]
    fn test_execute_write_flags() {
        assert_eq!(
            ExecuteWriteRequest::new(ExecuteWriteFlags::CONFIRM).encode(MTU).unwrap(),
            vec![ATT_EXECUTE_WRITE_REQ, 0x01]
        );
        assert_eq!(
            ExecuteWriteRequest::new(ExecuteWriteFlags::empty()).encode(MTU).unwrap(),
            vec![ATT_EXECUTE_WRITE_REQ, 0x00]
        );
        for bad in [0x02u8, 0x03, 0x80, 0xFF] {
            assert!(matches!(
                ExecuteWriteRequest { flags: bad }.encode(MTU),
                Err(AttError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_decode_rejects_wrong_opcode_and_short_pdu() {
        assert!(matches!(
            ReadResponse::decode(&[ATT_READ_BLOB_RSP, 0x00]),
            Err(AttError::MalformedResponse {
                opcode: ATT_READ_BLOB_RSP,
                ..
            })
        ));
        assert!(matches!(
            ReadResponse::decode(&[]),
            Err(AttError::MalformedResponse { .. })
        ));
        assert!(matches!(
            PrepareWriteResponse::decode(&[ATT_PREPARE_WRITE_RSP, 0x34, 0x12, 0x00]),
            Err(AttError::MalformedResponse { .. })
        ));
        assert!(matches!(
            FindInformationResponse::decode(&[ATT_FIND_INFO_RSP]),
            Err(AttError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_find_information_response_formats() {
        let empty = FindInformationResponse::decode(&[ATT_FIND_INFO_RSP, 0x01]).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.records().count(), 0);

        assert!(matches!(
            FindInformationResponse::decode(&[ATT_FIND_INFO_RSP, 0x03]),
            Err(AttError::MalformedResponse { .. })
        ));

        // Three bytes of a four-byte 16-bit record
        assert!(matches!(
            FindInformationResponse::decode(&[ATT_FIND_INFO_RSP, 0x01, 0x01, 0x00, 0x0F]),
            Err(AttError::MalformedResponse { .. })
        ));

        // One 16-bit record's worth of bytes under the 128-bit format
        assert!(matches!(
            FindInformationResponse::decode(&[ATT_FIND_INFO_RSP, 0x02, 0x01, 0x00, 0x0F, 0x00]),
            Err(AttError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_error_response() {
        let pdu = [ATT_ERROR_RSP, ATT_READ_REQ, 0x05, 0x00, ATT_ERROR_READ_NOT_PERMITTED];
        let rsp = ErrorResponse::decode(&pdu).unwrap();
        assert_eq!(rsp.request_opcode, ATT_READ_REQ);
        assert_eq!(rsp.handle, 5);
        assert_eq!(rsp.error_code, AttErrorCode::ReadNotPermitted);

        let err = rsp.into_error();
        assert_eq!(err.error_code(), Some(AttErrorCode::ReadNotPermitted));
        assert_eq!(err.handle(), Some(5));

        assert!(ErrorResponse::decode(&pdu[..4]).is_err());
        assert!(ErrorResponse::decode(&[ATT_ERROR_RSP, 0x0A, 0x05, 0x00, 0x02, 0x00]).is_err());
    }

    #[test]
    fn test_parse_dispatch() {
        assert!(matches!(
            AttResponse::parse(&[ATT_WRITE_RSP]).unwrap(),
            AttResponse::Write(WriteResponse)
        ));
        assert!(matches!(
            AttResponse::parse(&[ATT_EXECUTE_WRITE_RSP]).unwrap(),
            AttResponse::ExecuteWrite(ExecuteWriteResponse)
        ));
        assert!(AttResponse::parse(&[ATT_EXECUTE_WRITE_RSP, 0x00]).is_err());

        match AttResponse::parse(&[ATT_HANDLE_VALUE_NTF, 0x21, 0x00, 0x64]).unwrap() {
            AttResponse::Notification(ntf) => {
                assert_eq!(ntf.handle, 0x0021);
                assert_eq!(ntf.value, &[0x64]);
            }
            other => panic!("unexpected response: {:?}", other),
        }

        let ind = AttResponse::parse(&[ATT_HANDLE_VALUE_IND, 0x21, 0x00]).unwrap();
        assert_eq!(ind.opcode(), ATT_HANDLE_VALUE_IND);
        assert_eq!(ind.request_opcode(), None);

        let read = AttResponse::parse(&[ATT_READ_RSP, 1, 2]).unwrap();
        assert_eq!(read.request_opcode(), Some(ATT_READ_REQ));

        assert!(matches!(AttResponse::parse(&[0x7F]), Err(AttError::UnsupportedOpcode(0x7F))));
        assert!(matches!(AttResponse::parse(&[]), Err(AttError::MalformedResponse { .. })));
    }

    #[test]
    fn test_request_enum_dispatch() {
        let handles = [0x0003, 0x0007];
        let req = AttRequest::ReadMultiple(ReadMultipleRequest { handles: &handles });
        assert_eq!(req.opcode(), ATT_READ_MULTIPLE_REQ);
        assert!(req.expects_response());
        assert_eq!(req.encode(MTU).unwrap(), vec![ATT_READ_MULTIPLE_REQ, 0x03, 0x00, 0x07, 0x00]);

        let cmd = AttRequest::WriteCommand(WriteCommand {
            handle: 1,
            value: &[],
        });
        assert!(!cmd.expects_response());
        assert_eq!(cmd.pdu_len(MTU).unwrap(), ATT_WRITE_REQ_BASE_SZ);

        let conf = AttRequest::HandleValueConfirmation(HandleValueConfirmation);
        assert_eq!(conf.encode(MTU).unwrap(), vec![ATT_HANDLE_VALUE_CONF]);
    }
}
