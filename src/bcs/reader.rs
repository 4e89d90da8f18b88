use byteorder::{ByteOrder, LittleEndian};

use crate::error::BcsError;
use crate::types::U256;

/// Cursor over an immutable BCS buffer.
///
/// Every `read_*` advances the cursor on success and leaves it untouched
/// on failure. Nothing here panics on truncated or hostile input.
#[derive(Debug, Clone)]
pub struct BcsReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BcsReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Fails with [`BcsError::TrailingBytes`] unless the buffer is fully consumed.
    pub fn finish(&self) -> Result<(), BcsError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(BcsError::TrailingBytes(n)),
        }
    }

    /// Raw bytes, no length prefix.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], BcsError> {
        if self.remaining() < n {
            return Err(BcsError::UnexpectedEof {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_fixed<const N: usize>(&mut self) -> Result<[u8; N], BcsError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, BcsError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, BcsError> {
        Ok(LittleEndian::read_u16(self.read_bytes(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32, BcsError> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64, BcsError> {
        Ok(LittleEndian::read_u64(self.read_bytes(8)?))
    }

    /// The 16 wire bytes are little-endian and are converted here, so the
    /// returned `u128` is the numeric value. Callers that instead want the
    /// raw bytes (e.g. to build a big-endian big integer) should use
    /// `read_fixed::<16>()` and reverse them.
    pub fn read_u128(&mut self) -> Result<u128, BcsError> {
        Ok(LittleEndian::read_u128(self.read_bytes(16)?))
    }

    pub fn read_u256(&mut self) -> Result<U256, BcsError> {
        Ok(U256::from_le_bytes(self.read_fixed()?))
    }

    pub fn read_bool(&mut self) -> Result<bool, BcsError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            b => {
                self.pos -= 1;
                Err(BcsError::InvalidBool(b))
            }
        }
    }

    /// ULEB128 bounded to `u32`. Non-minimal encodings (a trailing zero
    /// group such as `0x80 0x00`) and values past `u32::MAX` are rejected.
    pub fn read_uleb(&mut self) -> Result<u32, BcsError> {
        let start = self.pos;
        let result = self.read_uleb_inner();
        if result.is_err() {
            self.pos = start;
        }
        result
    }

    fn read_uleb_inner(&mut self) -> Result<u32, BcsError> {
        let mut value: u64 = 0;
        let mut shift = 0u32;
        loop {
            let byte = self.read_u8()?;
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                if shift > 0 && byte == 0 {
                    return Err(BcsError::MalformedVarint);
                }
                return u32::try_from(value).map_err(|_| BcsError::MalformedVarint);
            }
            shift += 7;
            if shift >= 35 {
                return Err(BcsError::MalformedVarint);
            }
        }
    }

    pub fn read_len(&mut self) -> Result<usize, BcsError> {
        Ok(self.read_uleb()? as usize)
    }

    /// `vector<u8>`: ULEB length prefix followed by that many bytes.
    pub fn read_len_prefixed(&mut self) -> Result<&'a [u8], BcsError> {
        let start = self.pos;
        let len = self.read_len()?;
        match self.read_bytes(len) {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                self.pos = start;
                Err(e)
            }
        }
    }

    pub fn read_string(&mut self) -> Result<String, BcsError> {
        let start = self.pos;
        let bytes = self.read_len_prefixed()?;
        match std::str::from_utf8(bytes) {
            Ok(s) => Ok(s.to_owned()),
            Err(_) => {
                self.pos = start;
                Err(BcsError::InvalidUtf8)
            }
        }
    }

    /// Enum variant index, checked against the number of known variants.
    pub fn read_tag(&mut self, kind: &'static str, variants: u32) -> Result<u32, BcsError> {
        let start = self.pos;
        let tag = self.read_uleb()?;
        if tag >= variants {
            self.pos = start;
            return Err(BcsError::InvalidTag { kind, tag });
        }
        Ok(tag)
    }
}
