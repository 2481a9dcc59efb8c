//! ATT Protocol constants

// ATT opcode values
pub const ATT_ERROR_RSP: u8 = 0x01;
pub const ATT_FIND_INFO_REQ: u8 = 0x04;
pub const ATT_FIND_INFO_RSP: u8 = 0x05;
pub const ATT_READ_REQ: u8 = 0x0A;
pub const ATT_READ_RSP: u8 = 0x0B;
pub const ATT_READ_BLOB_REQ: u8 = 0x0C;
pub const ATT_READ_BLOB_RSP: u8 = 0x0D;
pub const ATT_READ_MULTIPLE_REQ: u8 = 0x0E;
pub const ATT_READ_MULTIPLE_RSP: u8 = 0x0F;
pub const ATT_WRITE_REQ: u8 = 0x12;
pub const ATT_WRITE_RSP: u8 = 0x13;
pub const ATT_WRITE_CMD: u8 = 0x52;
pub const ATT_PREPARE_WRITE_REQ: u8 = 0x16;
pub const ATT_PREPARE_WRITE_RSP: u8 = 0x17;
pub const ATT_EXECUTE_WRITE_REQ: u8 = 0x18;
pub const ATT_EXECUTE_WRITE_RSP: u8 = 0x19;
pub const ATT_HANDLE_VALUE_NTF: u8 = 0x1B;
pub const ATT_HANDLE_VALUE_IND: u8 = 0x1D;
pub const ATT_HANDLE_VALUE_CONF: u8 = 0x1E;

// ATT error codes
pub const ATT_ERROR_INVALID_HANDLE: u8 = 0x01;
pub const ATT_ERROR_READ_NOT_PERMITTED: u8 = 0x02;
pub const ATT_ERROR_WRITE_NOT_PERMITTED: u8 = 0x03;
pub const ATT_ERROR_INVALID_PDU: u8 = 0x04;
pub const ATT_ERROR_INSUFFICIENT_AUTHENTICATION: u8 = 0x05;
pub const ATT_ERROR_REQUEST_NOT_SUPPORTED: u8 = 0x06;
pub const ATT_ERROR_INVALID_OFFSET: u8 = 0x07;
pub const ATT_ERROR_INSUFFICIENT_AUTHORIZATION: u8 = 0x08;
pub const ATT_ERROR_PREPARE_QUEUE_FULL: u8 = 0x09;
pub const ATT_ERROR_ATTRIBUTE_NOT_FOUND: u8 = 0x0A;
pub const ATT_ERROR_ATTRIBUTE_NOT_LONG: u8 = 0x0B;
pub const ATT_ERROR_INSUFFICIENT_ENCRYPTION_KEY_SIZE: u8 = 0x0C;
pub const ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LENGTH: u8 = 0x0D;
pub const ATT_ERROR_UNLIKELY: u8 = 0x0E;
pub const ATT_ERROR_INSUFFICIENT_ENCRYPTION: u8 = 0x0F;
pub const ATT_ERROR_UNSUPPORTED_GROUP_TYPE: u8 = 0x10;
pub const ATT_ERROR_INSUFFICIENT_RESOURCES: u8 = 0x11;
pub const ATT_ERROR_DATABASE_OUT_OF_SYNC: u8 = 0x12;
pub const ATT_ERROR_VALUE_NOT_ALLOWED: u8 = 0x13;
pub const ATT_ERROR_APPLICATION_ERROR_START: u8 = 0x80;
pub const ATT_ERROR_APPLICATION_ERROR_END: u8 = 0x9F;
pub const ATT_ERROR_COMMON_PROFILE_ERROR_START: u8 = 0xE0;
pub const ATT_ERROR_COMMON_PROFILE_ERROR_END: u8 = 0xFF;

// ATT handle values
pub const ATT_HANDLE_INVALID: u16 = 0x0000;

// ATT MTU used until a larger one is negotiated
pub const ATT_DEFAULT_MTU: u16 = 23;

/// Longest value an attribute may hold
pub const ATT_MAX_ATTRIBUTE_LEN: usize = 512;

// PDU sizes. `_BASE_SZ` is the fixed part in front of a variable tail.
pub const ATT_ERROR_RSP_SZ: usize = 5;
pub const ATT_FIND_INFO_REQ_SZ: usize = 5;
pub const ATT_FIND_INFO_RSP_BASE_SZ: usize = 2;
pub const ATT_READ_REQ_SZ: usize = 3;
pub const ATT_READ_RSP_BASE_SZ: usize = 1;
pub const ATT_READ_BLOB_REQ_SZ: usize = 5;
pub const ATT_READ_BLOB_RSP_BASE_SZ: usize = 1;
pub const ATT_READ_MULTIPLE_REQ_BASE_SZ: usize = 1;
pub const ATT_READ_MULTIPLE_RSP_BASE_SZ: usize = 1;
pub const ATT_WRITE_REQ_BASE_SZ: usize = 3;
pub const ATT_WRITE_RSP_SZ: usize = 1;
pub const ATT_PREPARE_WRITE_BASE_SZ: usize = 5;
pub const ATT_EXECUTE_WRITE_REQ_SZ: usize = 2;
pub const ATT_EXECUTE_WRITE_RSP_SZ: usize = 1;
pub const ATT_HANDLE_VALUE_BASE_SZ: usize = 3;
pub const ATT_HANDLE_VALUE_CONF_SZ: usize = 1;

// ATT Find Information Response Format
pub const ATT_FIND_INFO_RSP_FORMAT_16BIT: u8 = 0x01;
pub const ATT_FIND_INFO_RSP_FORMAT_128BIT: u8 = 0x02;

// ATT execute write flags
pub const ATT_EXEC_WRITE_F_CONFIRM: u8 = 0x01;

// ATT prepare write queue size
pub const ATT_PREPARE_WRITE_QUEUE_SIZE: usize = 64;
