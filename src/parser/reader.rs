//! Byte-level reading primitives for the binary format.
//!
//! [`Reader`] is a cursor over a borrowed byte span: the input is never
//! copied, and every lazy iterator derived from a module shares the same
//! underlying bytes. Offsets reported in errors and [`crate::types::At`]
//! annotations are positions in that span.
//!
//! LEB128 decoding is strict: a scalar may use at most `ceil(bits / 7)`
//! bytes, and the unused high bits of the final byte must be proper
//! zero/sign extension. Truncated input is reported at the offset where the
//! scalar started.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::WasmError;

/// Cursor over a borrowed input span.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Reader<'a> {
        Reader { bytes, pos: 0 }
    }

    /// A reader over the same span starting at `pos`.
    pub fn at(bytes: &'a [u8], pos: usize) -> Reader<'a> {
        Reader { bytes, pos }
    }

    // Basic operations --------------------------------------------------------

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub fn has_at_least(&self, count: usize) -> bool {
        self.remaining() >= count
    }

    pub fn skip_to(&mut self, pos: usize) {
        self.pos = pos.min(self.bytes.len());
    }

    fn eof(&self) -> WasmError {
        WasmError::malformed(self.bytes.len(), "unexpected end of input")
    }

    pub fn read_byte(&mut self) -> Result<u8, WasmError> {
        match self.bytes.get(self.pos) {
            Some(byte) => {
                self.pos += 1;
                Ok(*byte)
            }
            None => Err(self.eof()),
        }
    }

    pub fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Borrow `len` bytes from the span and advance past them.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], WasmError> {
        if !self.has_at_least(len) {
            return Err(self.eof());
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    // Fixed-width values ------------------------------------------------------

    pub fn read_u32(&mut self) -> Result<u32, WasmError> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    /// Little-endian IEEE 754 single, returned as its raw bit pattern so NaN
    /// payloads survive round trips.
    pub fn read_f32_bits(&mut self) -> Result<u32, WasmError> {
        self.read_u32()
    }

    /// Little-endian IEEE 754 double, as raw bits.
    pub fn read_f64_bits(&mut self) -> Result<u64, WasmError> {
        Ok(LittleEndian::read_u64(self.read_bytes(8)?))
    }

    pub fn read_v128(&mut self) -> Result<[u8; 16], WasmError> {
        let mut buf = [0u8; 16];
        buf.copy_from_slice(self.read_bytes(16)?);
        Ok(buf)
    }

    // LEB128 ------------------------------------------------------------------

    fn read_vu(&mut self, bits: u32) -> Result<u64, WasmError> {
        let start = self.pos;
        let max_bytes = (bits as usize).div_ceil(7);
        let mut result: u64 = 0;
        for i in 0..max_bytes {
            let byte = self.read_byte()?;
            if i + 1 == max_bytes {
                // Unused high bits of the final group (including the
                // continuation flag) must be zero extension.
                let used = bits - 7 * i as u32;
                let mask = if used >= 8 { 0 } else { !0u8 << used };
                if byte & mask != 0 {
                    return Err(WasmError::malformed(
                        start,
                        format!("last byte of LEB128 u{bits} must be zero extension"),
                    ));
                }
            }
            result |= ((byte & 0x7f) as u64) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Ok(result)
    }

    fn read_vs(&mut self, bits: u32) -> Result<i64, WasmError> {
        let start = self.pos;
        let max_bytes = (bits as usize).div_ceil(7);
        let mut result: i64 = 0;
        let mut shift = 0u32;
        for i in 0..max_bytes {
            let byte = self.read_byte()?;
            if i + 1 == max_bytes {
                // The final group's high bits (and the continuation flag)
                // must all match the sign bit.
                let used = bits - 7 * i as u32;
                let mask = if used > 8 { 0 } else { !0u8 << (used - 1) };
                if byte & mask != 0 && byte & mask != mask & 0x7f {
                    return Err(WasmError::malformed(
                        start,
                        format!("last byte of LEB128 s{bits} must be sign extension"),
                    ));
                }
            }
            result |= ((byte & 0x7f) as i64) << shift;
            shift += 7;
            if byte & 0x80 == 0 {
                if shift < 64 && byte & 0x40 != 0 {
                    result |= -1i64 << shift;
                }
                return Ok(result);
            }
        }
        Ok(result)
    }

    pub fn read_vu64(&mut self) -> Result<u64, WasmError> {
        self.read_vu(64)
    }

    pub fn read_vu32(&mut self) -> Result<u32, WasmError> {
        self.read_vu(32).map(|v| v as u32)
    }

    /// Single-byte LEB128 boolean (0 or 1).
    pub fn read_vu1(&mut self) -> Result<bool, WasmError> {
        let start = self.pos;
        match self.read_vu(1)? {
            0 => Ok(false),
            1 => Ok(true),
            v => Err(WasmError::malformed(
                start,
                format!("invalid flag value: {v}"),
            )),
        }
    }

    pub fn read_vs64(&mut self) -> Result<i64, WasmError> {
        self.read_vs(64)
    }

    pub fn read_vs32(&mut self) -> Result<i32, WasmError> {
        self.read_vs(32).map(|v| v as i32)
    }

    /// 33-bit signed scalar, used by block types where negative one-byte
    /// values encode the shorthand forms and non-negative values are type
    /// indices.
    pub fn read_vs33(&mut self) -> Result<i64, WasmError> {
        self.read_vs(33)
    }

    // Compound values ---------------------------------------------------------

    /// A vector length, sanity-checked against both an implementation limit
    /// and the bytes actually remaining, so a malicious count cannot drive an
    /// overallocation.
    pub fn read_count(&mut self, limit: u32, what: &str) -> Result<u32, WasmError> {
        let start = self.pos;
        let count = self.read_vu32()?;
        if count > limit {
            return Err(WasmError::malformed(
                start,
                format!("{what} count {count} exceeds implementation limit {limit}"),
            ));
        }
        if count as usize > self.remaining() {
            return Err(WasmError::malformed(
                start,
                format!(
                    "{what} count {count} extends past the end of the section ({} bytes left)",
                    self.remaining()
                ),
            ));
        }
        Ok(count)
    }

    /// Length-prefixed byte vector, borrowed from the span.
    pub fn read_u8vec(&mut self) -> Result<&'a [u8], WasmError> {
        let start = self.pos;
        let len = self.read_vu32()? as usize;
        if len > self.remaining() {
            return Err(WasmError::malformed(
                start,
                format!(
                    "byte vector of length {len} extends past the end of the input ({} bytes left)",
                    self.remaining()
                ),
            ));
        }
        self.read_bytes(len)
    }

    /// Length-prefixed UTF-8 name, validated for well-formedness.
    pub fn read_name(&mut self) -> Result<String, WasmError> {
        let start = self.pos;
        let bytes = self.read_u8vec()?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| WasmError::malformed(start, "malformed UTF-8 encoding"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(bytes: &[u8]) -> Reader<'_> {
        Reader::new(bytes)
    }

    #[test]
    fn test_read_byte() {
        let mut r = reader(&[0x01, 0xff]);
        assert_eq!(r.read_byte().unwrap(), 1);
        assert_eq!(r.read_byte().unwrap(), 255);
        assert!(r.read_byte().is_err());
    }

    #[test]
    fn test_read_u32() {
        assert_eq!(reader(&[0, 0, 0, 0]).read_u32().unwrap(), 0);
        assert_eq!(reader(&[1, 0, 0, 0]).read_u32().unwrap(), 1);
        assert_eq!(reader(&[0, 1, 0, 0]).read_u32().unwrap(), 256);
        assert_eq!(
            reader(&[0x00, 0x61, 0x73, 0x6d]).read_u32().unwrap(),
            0x6d73_6100
        );
        assert!(reader(&[1, 2, 3]).read_u32().is_err());
    }

    #[test]
    fn test_read_vu32() {
        assert_eq!(reader(&[0]).read_vu32().unwrap(), 0);
        assert_eq!(reader(&[1]).read_vu32().unwrap(), 1);
        assert_eq!(reader(&[0x7f]).read_vu32().unwrap(), 127);
        assert_eq!(reader(&[0x80, 0x7f]).read_vu32().unwrap(), 16256);
        assert_eq!(
            reader(&[0b1110_0101, 0b1000_1110, 0b0010_0110])
                .read_vu32()
                .unwrap(),
            624485
        );
        assert_eq!(
            reader(&[0xff, 0xff, 0xff, 0xff, 0x0f]).read_vu32().unwrap(),
            0xffff_ffff
        );
        assert_eq!(
            reader(&[0x80, 0x80, 0x80, 0x80, 0x08]).read_vu32().unwrap(),
            0x8000_0000
        );
    }

    #[test]
    fn test_vu32_padded_within_bounds() {
        // Non-minimal but within the 5-byte bound and clean final bits.
        assert_eq!(reader(&[0x80, 0x00]).read_vu32().unwrap(), 0);
        assert_eq!(
            reader(&[0x80, 0x80, 0x80, 0x80, 0x00]).read_vu32().unwrap(),
            0
        );
    }

    #[test]
    fn test_vu32_rejects_overlong() {
        // Six bytes for a u32: the fifth byte still has the continuation bit.
        let mut r = reader(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x00]);
        let err = r.read_vu32().unwrap_err();
        assert!(err.message.contains("zero extension"), "{}", err.message);
    }

    #[test]
    fn test_vu32_rejects_dirty_high_bits() {
        // Fifth byte uses bits beyond the 32nd.
        let err = reader(&[0xff, 0xff, 0xff, 0xff, 0x1f])
            .read_vu32()
            .unwrap_err();
        assert!(err.message.contains("zero extension"));
    }

    #[test]
    fn test_read_vu64() {
        assert_eq!(reader(&[0]).read_vu64().unwrap(), 0);
        assert_eq!(
            reader(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01])
                .read_vu64()
                .unwrap(),
            u64::MAX
        );
        let err = reader(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x02])
            .read_vu64()
            .unwrap_err();
        assert!(err.message.contains("zero extension"));
    }

    #[test]
    fn test_read_vs32() {
        assert_eq!(reader(&[0]).read_vs32().unwrap(), 0);
        assert_eq!(reader(&[1]).read_vs32().unwrap(), 1);
        assert_eq!(reader(&[0x7f]).read_vs32().unwrap(), -1);
        assert_eq!(reader(&[0x80, 0x7f]).read_vs32().unwrap(), -128);
        assert_eq!(
            reader(&[0b1001_1011, 0b1111_0001, 0b0101_1001])
                .read_vs32()
                .unwrap(),
            -624485
        );
        assert_eq!(
            reader(&[0x80, 0x80, 0x80, 0x80, 0x78]).read_vs32().unwrap(),
            i32::MIN
        );
    }

    #[test]
    fn test_vs32_rejects_bad_sign_extension() {
        // A bit leaks past the sign in the final group.
        let err = reader(&[0x80, 0x80, 0x80, 0x80, 0x08])
            .read_vs32()
            .unwrap_err();
        assert!(err.message.contains("sign extension"), "{}", err.message);
        assert!(reader(&[0xff, 0xff, 0xff, 0xff, 0x4f]).read_vs32().is_err());
    }

    #[test]
    fn test_read_vs64() {
        assert_eq!(reader(&[0x7f]).read_vs64().unwrap(), -1);
        assert_eq!(
            reader(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x7f])
                .read_vs64()
                .unwrap(),
            i64::MIN
        );
        assert_eq!(
            reader(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0xfc, 0xff, 0x00])
                .read_vs64()
                .unwrap(),
            0x7ff8_0000_0000_0000
        );
    }

    #[test]
    fn test_read_vs33() {
        assert_eq!(reader(&[0x40]).read_vs33().unwrap(), -64);
        assert_eq!(reader(&[0x00]).read_vs33().unwrap(), 0);
        assert_eq!(
            reader(&[0xff, 0xff, 0xff, 0xff, 0x0f]).read_vs33().unwrap(),
            0xffff_ffff
        );
        assert!(reader(&[0xff, 0xff, 0xff, 0xff, 0x2f]).read_vs33().is_err());
    }

    #[test]
    fn test_read_f32_bits() {
        assert_eq!(
            reader(&[0xdb, 0x0f, 0xc9, 0x40]).read_f32_bits().unwrap(),
            0x40c9_0fdb
        );
        // NaN payload is preserved bit-for-bit.
        assert_eq!(
            reader(&[0x01, 0x00, 0xc0, 0x7f]).read_f32_bits().unwrap(),
            0x7fc0_0001
        );
    }

    #[test]
    fn test_read_f64_bits() {
        assert_eq!(
            reader(&[0x18, 0x2d, 0x44, 0x54, 0xfb, 0x21, 0x19, 0x40])
                .read_f64_bits()
                .unwrap(),
            0x4019_21fb_5444_2d18
        );
    }

    #[test]
    fn test_read_v128() {
        let bytes: Vec<u8> = (0..16).collect();
        assert_eq!(
            reader(&bytes).read_v128().unwrap(),
            [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]
        );
        assert!(reader(&bytes[..15]).read_v128().is_err());
    }

    #[test]
    fn test_read_name() {
        let mut r = reader(&[0x05, b'h', b'e', b'l', b'l', b'o']);
        assert_eq!(r.read_name().unwrap(), "hello");
        assert!(r.is_at_end());

        // Lone continuation byte is not UTF-8.
        let err = reader(&[0x01, 0x80]).read_name().unwrap_err();
        assert_eq!(err.message, "malformed UTF-8 encoding");

        // Overlong encoding of '/' (0xc0 0xaf) is rejected.
        assert!(reader(&[0x02, 0xc0, 0xaf]).read_name().is_err());

        // Surrogate half (0xed 0xa0 0x80) is rejected.
        assert!(reader(&[0x03, 0xed, 0xa0, 0x80]).read_name().is_err());
    }

    #[test]
    fn test_read_u8vec_guards_length() {
        let err = reader(&[0x7f, 1, 2, 3]).read_u8vec().unwrap_err();
        assert!(err.message.contains("extends past the end"));
    }

    #[test]
    fn test_read_count_guards() {
        // Count larger than the remaining bytes cannot be honest.
        let err = reader(&[0x20, 0, 0]).read_count(1000, "type").unwrap_err();
        assert!(err.message.contains("extends past the end"));
        // Count above the implementation limit.
        let bytes = [0xff, 0xff, 0x3f];
        let err = Reader::new(&bytes).read_count(100, "type").unwrap_err();
        assert!(err.message.contains("implementation limit"));
    }

    #[test]
    fn test_error_offsets_point_at_scalar_start() {
        let mut r = reader(&[0x00, 0xff, 0xff, 0xff, 0xff, 0x1f]);
        r.read_byte().unwrap();
        let err = r.read_vu32().unwrap_err();
        assert_eq!(err.offset, Some(1));
    }
}
