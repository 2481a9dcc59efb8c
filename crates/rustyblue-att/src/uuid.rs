//! Bluetooth UUIDs as they appear in ATT PDUs
//!
//! ATT carries attribute types either in a 2-byte SIG-assigned short form or
//! in the full 16-byte form, both little-endian on the wire. [`Uuid`] always
//! keeps the full 128-bit value and expands short forms through the Bluetooth
//! base UUID `00000000-0000-1000-8000-00805F9B34FB`.

use std::fmt;

/// Base UUID in little-endian byte order
const BASE_UUID_LE: [u8; 16] = [
    0xFB, 0x34, 0x9B, 0x5F, 0x80, 0x00, 0x00, 0x80, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Position of the short-form value inside the little-endian base UUID
const SHORT_OFFSET: usize = 12;

/// A 128-bit Bluetooth UUID, stored little-endian
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uuid([u8; 16]);

impl Uuid {
    /// UUID from its 16 wire bytes (little-endian)
    pub const fn from_bytes_le(bytes: [u8; 16]) -> Self {
        Uuid(bytes)
    }

    /// Expand a 16-bit SIG-assigned value
    pub const fn from_u16(short: u16) -> Self {
        let mut bytes = BASE_UUID_LE;
        bytes[SHORT_OFFSET] = short as u8;
        bytes[SHORT_OFFSET + 1] = (short >> 8) as u8;
        Uuid(bytes)
    }

    /// Expand a 32-bit SIG-assigned value
    pub const fn from_u32(short: u32) -> Self {
        let mut bytes = BASE_UUID_LE;
        let le = short.to_le_bytes();
        bytes[SHORT_OFFSET] = le[0];
        bytes[SHORT_OFFSET + 1] = le[1];
        bytes[SHORT_OFFSET + 2] = le[2];
        bytes[SHORT_OFFSET + 3] = le[3];
        Uuid(bytes)
    }

    /// UUID from a little-endian wire slice of 2, 4 or 16 bytes
    pub fn from_slice_le(slice: &[u8]) -> Option<Self> {
        match *slice {
            [a, b] => Some(Uuid::from_u16(u16::from_le_bytes([a, b]))),
            [a, b, c, d] => Some(Uuid::from_u32(u32::from_le_bytes([a, b, c, d]))),
            _ => {
                let bytes: [u8; 16] = slice.try_into().ok()?;
                Some(Uuid(bytes))
            }
        }
    }

    /// The 16 wire bytes (little-endian)
    pub const fn as_bytes_le(&self) -> &[u8; 16] {
        &self.0
    }

    fn is_sig_assigned(&self) -> bool {
        self.0[..SHORT_OFFSET] == BASE_UUID_LE[..SHORT_OFFSET]
    }

    /// The 16-bit short form, if this UUID has one
    pub fn as_u16(&self) -> Option<u16> {
        if self.is_sig_assigned() && self.0[SHORT_OFFSET + 2..] == [0, 0] {
            Some(u16::from_le_bytes([self.0[SHORT_OFFSET], self.0[SHORT_OFFSET + 1]]))
        } else {
            None
        }
    }
}

impl From<u16> for Uuid {
    fn from(short: u16) -> Self {
        Uuid::from_u16(short)
    }
}

impl From<[u8; 16]> for Uuid {
    fn from(bytes: [u8; 16]) -> Self {
        Uuid::from_bytes_le(bytes)
    }
}

impl PartialEq<u16> for Uuid {
    fn eq(&self, other: &u16) -> bool {
        self.as_u16() == Some(*other)
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut be = self.0;
        be.reverse();
        let hex = hex::encode(be);
        write!(
            f,
            "{}-{}-{}-{}-{}",
            &hex[0..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..32]
        )
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_u16() {
            Some(short) => write!(f, "Uuid(0x{:04X})", short),
            None => write!(f, "Uuid({})", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_form_expansion() {
        let uuid = Uuid::from_u16(0x2800);
        assert_eq!(uuid.as_u16(), Some(0x2800));
        assert_eq!(uuid, 0x2800u16);
        assert_eq!(uuid.to_string(), "00002800-0000-1000-8000-00805f9b34fb");
        assert_eq!(format!("{:?}", uuid), "Uuid(0x2800)");
    }

    #[test]
    fn test_full_form_has_no_short_form() {
        let bytes: [u8; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];
        let uuid = Uuid::from_bytes_le(bytes);
        assert_eq!(uuid.as_u16(), None);
        assert_eq!(uuid.as_bytes_le(), &bytes);
        assert_eq!(uuid.to_string(), "0f0e0d0c-0b0a-0908-0706-050403020100");
    }

    #[test]
    fn test_from_slice() {
        assert_eq!(Uuid::from_slice_le(&[0x0F, 0x00]), Some(Uuid::from_u16(0x000F)));
        assert_eq!(
            Uuid::from_slice_le(&[0x0A, 0x18, 0x00, 0x00]),
            Some(Uuid::from_u16(0x180A))
        );
        assert_eq!(Uuid::from_slice_le(&[0u8; 16]), Some(Uuid::from_bytes_le([0u8; 16])));
        assert_eq!(Uuid::from_slice_le(&[1, 2, 3]), None);
    }
}
