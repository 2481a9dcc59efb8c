//! PDU field codec
//!
//! [`PduWriter`] and [`PduReader`] wrap a caller-supplied `&mut [u8]` or `&[u8]`
//! and move a cursor over it while writing or reading fixed-width
//! little-endian fields. Neither allocates and neither validates anything
//! beyond the bounds of the underlying slice.

use super::error::{AttError, AttResult};
use byteorder::{ByteOrder, LittleEndian};

/// Cursor writing PDU fields into a fixed buffer
#[derive(Debug)]
pub struct PduWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> PduWriter<'a> {
    /// Create a writer positioned at the start of `buf`
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Number of bytes written so far
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bytes that can still be written
    pub fn space_left(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn reserve(&mut self, len: usize) -> AttResult<&mut [u8]> {
        if len > self.space_left() {
            return Err(AttError::BufferTooShort {
                needed: self.pos + len,
                available: self.buf.len(),
            });
        }
        let start = self.pos;
        self.pos += len;
        Ok(&mut self.buf[start..start + len])
    }

    pub fn write_u8(&mut self, value: u8) -> AttResult<()> {
        self.reserve(1)?[0] = value;
        Ok(())
    }

    pub fn write_u16_le(&mut self, value: u16) -> AttResult<()> {
        LittleEndian::write_u16(self.reserve(2)?, value);
        Ok(())
    }

    /// Write all of `data`, failing if it does not fit
    pub fn write_slice(&mut self, data: &[u8]) -> AttResult<()> {
        self.reserve(data.len())?.copy_from_slice(data);
        Ok(())
    }

    /// Write as much of `data` as fits and return the number of bytes written
    pub fn write_slice_truncated(&mut self, data: &[u8]) -> usize {
        let len = data.len().min(self.space_left());
        self.buf[self.pos..self.pos + len].copy_from_slice(&data[..len]);
        self.pos += len;
        len
    }
}

/// Cursor reading PDU fields out of a received buffer
///
/// Field values borrow from the buffer, so decoded records stay valid for as
/// long as the caller holds on to the received bytes.
#[derive(Debug, Clone)]
pub struct PduReader<'a> {
    data: &'a [u8],
    pos: usize,
    opcode: u8,
}

impl<'a> PduReader<'a> {
    /// Create a reader over a whole PDU, opcode byte included
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            opcode: data.first().copied().unwrap_or(0),
        }
    }

    /// Number of bytes that have not been read yet
    pub fn bytes_left(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.bytes_left() == 0
    }

    /// Read `len` bytes as a view into the underlying buffer
    pub fn read_slice(&mut self, len: usize) -> AttResult<&'a [u8]> {
        if len > self.bytes_left() {
            return Err(AttError::malformed(self.opcode, "PDU ends inside a field"));
        }
        let data: &'a [u8] = self.data;
        let slice = &data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Read everything that is left
    pub fn read_rest(&mut self) -> &'a [u8] {
        let data: &'a [u8] = self.data;
        let rest = &data[self.pos..];
        self.pos = data.len();
        rest
    }

    pub fn read_u8(&mut self) -> AttResult<u8> {
        Ok(self.read_slice(1)?[0])
    }

    pub fn read_u16_le(&mut self) -> AttResult<u16> {
        Ok(LittleEndian::read_u16(self.read_slice(2)?))
    }

    pub fn read_array<const N: usize>(&mut self) -> AttResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_slice(N)?);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_little_endian() {
        let mut buf = [0u8; 5];
        let mut writer = PduWriter::new(&mut buf);
        writer.write_u8(0x0C).unwrap();
        writer.write_u16_le(0x1234).unwrap();
        writer.write_u16_le(0xABCD).unwrap();
        assert_eq!(writer.position(), 5);
        assert_eq!(writer.space_left(), 0);
        assert_eq!(buf, [0x0C, 0x34, 0x12, 0xCD, 0xAB]);
    }

    #[test]
    fn test_writer_bounds() {
        let mut buf = [0u8; 3];
        let mut writer = PduWriter::new(&mut buf);
        writer.write_u16_le(1).unwrap();
        match writer.write_u16_le(2) {
            Err(AttError::BufferTooShort { needed, available }) => {
                assert_eq!(needed, 4);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        // A failed write leaves the cursor where it was
        assert_eq!(writer.position(), 2);
        assert!(writer.write_slice(&[9, 9]).is_err());
        assert_eq!(writer.write_slice_truncated(&[7, 8, 9]), 1);
        assert_eq!(buf, [1, 0, 7]);
    }

    #[test]
    fn test_reader_fields_and_views() {
        let pdu = [0x17, 0x34, 0x12, 0x10, 0x00, 0xAA, 0xBB];
        let mut reader = PduReader::new(&pdu);
        assert_eq!(reader.read_u8().unwrap(), 0x17);
        assert_eq!(reader.read_u16_le().unwrap(), 0x1234);
        assert_eq!(reader.read_array::<2>().unwrap(), [0x10, 0x00]);
        assert_eq!(reader.bytes_left(), 2);
        assert_eq!(reader.read_rest(), &[0xAA, 0xBB]);
        assert!(reader.is_empty());
        assert_eq!(reader.read_rest(), &[] as &[u8]);
    }

    #[test]
    fn test_reader_underflow() {
        let pdu = [0x0B, 0x01];
        let mut reader = PduReader::new(&pdu);
        reader.read_u8().unwrap();
        match reader.read_u16_le() {
            Err(AttError::MalformedResponse { opcode, .. }) => assert_eq!(opcode, 0x0B),
            other => panic!("unexpected result: {:?}", other),
        }
        // The failed read consumed nothing
        assert_eq!(reader.read_u8().unwrap(), 0x01);
    }
}
