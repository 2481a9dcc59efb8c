//! Error handling for the ATT protocol
use super::constants::*;
use crate::error::TransportError;
use crate::transport::ConnectionHandle;
use thiserror::Error;

/// ATT error codes carried in an Error Response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttErrorCode {
    /// Invalid handle
    InvalidHandle,
    /// Read not permitted
    ReadNotPermitted,
    /// Write not permitted
    WriteNotPermitted,
    /// Invalid PDU
    InvalidPdu,
    /// Insufficient authentication
    InsufficientAuthentication,
    /// Request not supported
    RequestNotSupported,
    /// Invalid offset
    InvalidOffset,
    /// Insufficient authorization
    InsufficientAuthorization,
    /// Prepare queue full
    PrepareQueueFull,
    /// Attribute not found
    AttributeNotFound,
    /// Attribute not long
    AttributeNotLong,
    /// Insufficient encryption key size
    InsufficientEncryptionKeySize,
    /// Invalid attribute value length
    InvalidAttributeValueLength,
    /// Unlikely error
    Unlikely,
    /// Insufficient encryption
    InsufficientEncryption,
    /// Unsupported group type
    UnsupportedGroupType,
    /// Insufficient resources
    InsufficientResources,
    /// Database out of sync
    DatabaseOutOfSync,
    /// Value not allowed
    ValueNotAllowed,
    /// Application error
    ApplicationError(u8),
    /// Common profile error
    CommonProfileError(u8),
    /// Reserved or unknown error code
    Unknown(u8),
}

impl From<u8> for AttErrorCode {
    fn from(code: u8) -> Self {
        match code {
            ATT_ERROR_INVALID_HANDLE => AttErrorCode::InvalidHandle,
            ATT_ERROR_READ_NOT_PERMITTED => AttErrorCode::ReadNotPermitted,
            ATT_ERROR_WRITE_NOT_PERMITTED => AttErrorCode::WriteNotPermitted,
            ATT_ERROR_INVALID_PDU => AttErrorCode::InvalidPdu,
            ATT_ERROR_INSUFFICIENT_AUTHENTICATION => AttErrorCode::InsufficientAuthentication,
            ATT_ERROR_REQUEST_NOT_SUPPORTED => AttErrorCode::RequestNotSupported,
            ATT_ERROR_INVALID_OFFSET => AttErrorCode::InvalidOffset,
            ATT_ERROR_INSUFFICIENT_AUTHORIZATION => AttErrorCode::InsufficientAuthorization,
            ATT_ERROR_PREPARE_QUEUE_FULL => AttErrorCode::PrepareQueueFull,
            ATT_ERROR_ATTRIBUTE_NOT_FOUND => AttErrorCode::AttributeNotFound,
            ATT_ERROR_ATTRIBUTE_NOT_LONG => AttErrorCode::AttributeNotLong,
            ATT_ERROR_INSUFFICIENT_ENCRYPTION_KEY_SIZE => {
                AttErrorCode::InsufficientEncryptionKeySize
            }
            ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LENGTH => AttErrorCode::InvalidAttributeValueLength,
            ATT_ERROR_UNLIKELY => AttErrorCode::Unlikely,
            ATT_ERROR_INSUFFICIENT_ENCRYPTION => AttErrorCode::InsufficientEncryption,
            ATT_ERROR_UNSUPPORTED_GROUP_TYPE => AttErrorCode::UnsupportedGroupType,
            ATT_ERROR_INSUFFICIENT_RESOURCES => AttErrorCode::InsufficientResources,
            ATT_ERROR_DATABASE_OUT_OF_SYNC => AttErrorCode::DatabaseOutOfSync,
            ATT_ERROR_VALUE_NOT_ALLOWED => AttErrorCode::ValueNotAllowed,
            ATT_ERROR_APPLICATION_ERROR_START..=ATT_ERROR_APPLICATION_ERROR_END => {
                AttErrorCode::ApplicationError(code)
            }
            ATT_ERROR_COMMON_PROFILE_ERROR_START..=ATT_ERROR_COMMON_PROFILE_ERROR_END => {
                AttErrorCode::CommonProfileError(code)
            }
            _ => AttErrorCode::Unknown(code),
        }
    }
}

impl From<AttErrorCode> for u8 {
    fn from(code: AttErrorCode) -> u8 {
        match code {
            AttErrorCode::InvalidHandle => ATT_ERROR_INVALID_HANDLE,
            AttErrorCode::ReadNotPermitted => ATT_ERROR_READ_NOT_PERMITTED,
            AttErrorCode::WriteNotPermitted => ATT_ERROR_WRITE_NOT_PERMITTED,
            AttErrorCode::InvalidPdu => ATT_ERROR_INVALID_PDU,
            AttErrorCode::InsufficientAuthentication => ATT_ERROR_INSUFFICIENT_AUTHENTICATION,
            AttErrorCode::RequestNotSupported => ATT_ERROR_REQUEST_NOT_SUPPORTED,
            AttErrorCode::InvalidOffset => ATT_ERROR_INVALID_OFFSET,
            AttErrorCode::InsufficientAuthorization => ATT_ERROR_INSUFFICIENT_AUTHORIZATION,
            AttErrorCode::PrepareQueueFull => ATT_ERROR_PREPARE_QUEUE_FULL,
            AttErrorCode::AttributeNotFound => ATT_ERROR_ATTRIBUTE_NOT_FOUND,
            AttErrorCode::AttributeNotLong => ATT_ERROR_ATTRIBUTE_NOT_LONG,
            AttErrorCode::InsufficientEncryptionKeySize => {
                ATT_ERROR_INSUFFICIENT_ENCRYPTION_KEY_SIZE
            }
            AttErrorCode::InvalidAttributeValueLength => ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LENGTH,
            AttErrorCode::Unlikely => ATT_ERROR_UNLIKELY,
            AttErrorCode::InsufficientEncryption => ATT_ERROR_INSUFFICIENT_ENCRYPTION,
            AttErrorCode::UnsupportedGroupType => ATT_ERROR_UNSUPPORTED_GROUP_TYPE,
            AttErrorCode::InsufficientResources => ATT_ERROR_INSUFFICIENT_RESOURCES,
            AttErrorCode::DatabaseOutOfSync => ATT_ERROR_DATABASE_OUT_OF_SYNC,
            AttErrorCode::ValueNotAllowed => ATT_ERROR_VALUE_NOT_ALLOWED,
            AttErrorCode::ApplicationError(code) => code,
            AttErrorCode::CommonProfileError(code) => code,
            AttErrorCode::Unknown(code) => code,
        }
    }
}

/// ATT Error type
///
/// Validation failures (`InvalidParameter`, `TooLarge`, `PrepareQueueFull`) are
/// raised before any byte is written and leave the connection state untouched.
#[derive(Debug, Error)]
pub enum AttError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("PDU of {len} bytes exceeds the ATT MTU of {mtu}")]
    TooLarge { len: usize, mtu: u16 },

    #[error("Malformed response (opcode 0x{opcode:02X}): {reason}")]
    MalformedResponse { opcode: u8, reason: &'static str },

    #[error("Stale connection handle {0}")]
    StaleHandle(ConnectionHandle),

    #[error("Prepare queue full")]
    PrepareQueueFull,

    #[error("Unsupported opcode 0x{0:02X}")]
    UnsupportedOpcode(u8),

    #[error("ATT error {code:?} on handle 0x{handle:04X} for request 0x{request_opcode:02X}")]
    Protocol {
        code: AttErrorCode,
        handle: u16,
        request_opcode: u8,
    },

    #[error("Buffer too short: need {needed} bytes, {available} available")]
    BufferTooShort { needed: usize, available: usize },

    #[error("Transport error: {0}")]
    Transport(TransportError),
}

impl From<TransportError> for AttError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::StaleHandle(conn) => AttError::StaleHandle(conn),
            other => AttError::Transport(other),
        }
    }
}

impl AttError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        AttError::InvalidParameter(msg.into())
    }

    pub(crate) fn malformed(opcode: u8, reason: &'static str) -> Self {
        AttError::MalformedResponse { opcode, reason }
    }

    /// Get the ATT error code, if the peer sent one
    pub fn error_code(&self) -> Option<AttErrorCode> {
        match self {
            AttError::Protocol { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Get the handle associated with this error, if any
    pub fn handle(&self) -> Option<u16> {
        match self {
            AttError::Protocol { handle, .. } => Some(*handle),
            _ => None,
        }
    }
}

/// ATT Result type
pub type AttResult<T> = Result<T, AttError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_ranges() {
        assert_eq!(AttErrorCode::from(0x01), AttErrorCode::InvalidHandle);
        assert_eq!(AttErrorCode::from(0x09), AttErrorCode::PrepareQueueFull);
        assert_eq!(AttErrorCode::from(0x85), AttErrorCode::ApplicationError(0x85));
        assert_eq!(AttErrorCode::from(0xFE), AttErrorCode::CommonProfileError(0xFE));
        assert_eq!(AttErrorCode::from(0x00), AttErrorCode::Unknown(0x00));
        assert_eq!(AttErrorCode::from(0x50), AttErrorCode::Unknown(0x50));

        for raw in [0x01u8, 0x07, 0x0D, 0x13, 0x80, 0x9F, 0xE0, 0xFF, 0x42] {
            assert_eq!(u8::from(AttErrorCode::from(raw)), raw);
        }
    }

    #[test]
    fn test_transport_error_mapping() {
        let stale = AttError::from(TransportError::StaleHandle(ConnectionHandle(7)));
        assert!(matches!(stale, AttError::StaleHandle(ConnectionHandle(7))));

        let other = AttError::from(TransportError::Unavailable("down".into()));
        assert!(matches!(other, AttError::Transport(TransportError::Unavailable(_))));
    }
}
