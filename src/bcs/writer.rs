use byteorder::{ByteOrder, LittleEndian};

use crate::types::U256;

/// Append-only BCS encoder.
///
/// Every write is infallible; the buffer only grows.
#[derive(Debug, Default, Clone)]
pub struct BcsWriter {
    buf: Vec<u8>,
}

impl BcsWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn write_u16(&mut self, v: u16) -> &mut Self {
        let mut b = [0u8; 2];
        LittleEndian::write_u16(&mut b, v);
        self.write_bytes(&b)
    }

    pub fn write_u32(&mut self, v: u32) -> &mut Self {
        let mut b = [0u8; 4];
        LittleEndian::write_u32(&mut b, v);
        self.write_bytes(&b)
    }

    pub fn write_u64(&mut self, v: u64) -> &mut Self {
        let mut b = [0u8; 8];
        LittleEndian::write_u64(&mut b, v);
        self.write_bytes(&b)
    }

    pub fn write_u128(&mut self, v: u128) -> &mut Self {
        let mut b = [0u8; 16];
        LittleEndian::write_u128(&mut b, v);
        self.write_bytes(&b)
    }

    /// `U256` is already stored little-endian.
    pub fn write_u256(&mut self, v: &U256) -> &mut Self {
        self.write_bytes(v.as_le_bytes())
    }

    pub fn write_bool(&mut self, v: bool) -> &mut Self {
        self.write_u8(v as u8)
    }

    /// Raw bytes, no length prefix.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// ULEB128: 7 data bits per byte, high bit set on all but the last.
    pub fn write_uleb(&mut self, mut v: u32) -> &mut Self {
        loop {
            let mut byte = (v & 0x7F) as u8;
            v >>= 7;
            if v != 0 {
                byte |= 0x80;
            }
            self.buf.push(byte);
            if v == 0 {
                break;
            }
        }
        self
    }

    /// Sequence length prefix.
    ///
    /// # Panics
    ///
    /// If `len` exceeds `u32::MAX`; no BCS sequence can be that long.
    pub fn write_len(&mut self, len: usize) -> &mut Self {
        match u32::try_from(len) {
            Ok(len) => self.write_uleb(len),
            Err(_) => panic!("sequence of {len} elements is too long for BCS"),
        }
    }

    /// `vector<u8>`: ULEB length prefix followed by the raw bytes.
    pub fn write_len_prefixed(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_len(bytes.len()).write_bytes(bytes)
    }

    pub fn write_str(&mut self, s: &str) -> &mut Self {
        self.write_len_prefixed(s.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn to_bytes(self) -> Vec<u8> {
        self.buf
    }
}
