//! Binary Canonical Serialization.
//!
//! Fixed-width little-endian integers, ULEB128 length and variant
//! prefixes, no padding and no field names. Two encoders that agree on
//! the schema always produce the same bytes, which is what lets a remote
//! validator re-hash exactly what was signed.

mod reader;
mod writer;

pub use reader::BcsReader;
pub use writer::BcsWriter;

use crate::error::BcsError;
use crate::types::U256;

/// Types with an infallible canonical encoding.
pub trait BcsEncode {
    fn encode(&self, w: &mut BcsWriter);
}

pub trait BcsDecode: Sized {
    fn decode(r: &mut BcsReader<'_>) -> Result<Self, BcsError>;
}

pub fn to_bytes<T: BcsEncode + ?Sized>(value: &T) -> Vec<u8> {
    let mut w = BcsWriter::new();
    value.encode(&mut w);
    w.to_bytes()
}

/// Decode a single value that must span the whole buffer.
pub fn from_bytes<T: BcsDecode>(bytes: &[u8]) -> Result<T, BcsError> {
    let mut r = BcsReader::new(bytes);
    let value = T::decode(&mut r)?;
    r.finish()?;
    Ok(value)
}

macro_rules! impl_int {
    ($($ty:ty => $write:ident, $read:ident;)*) => {
        $(
            impl BcsEncode for $ty {
                fn encode(&self, w: &mut BcsWriter) {
                    w.$write(*self);
                }
            }

            impl BcsDecode for $ty {
                fn decode(r: &mut BcsReader<'_>) -> Result<Self, BcsError> {
                    r.$read()
                }
            }
        )*
    };
}

impl_int! {
    u8 => write_u8, read_u8;
    u16 => write_u16, read_u16;
    u32 => write_u32, read_u32;
    u64 => write_u64, read_u64;
    u128 => write_u128, read_u128;
    bool => write_bool, read_bool;
}

impl BcsEncode for U256 {
    fn encode(&self, w: &mut BcsWriter) {
        w.write_u256(self);
    }
}

impl BcsDecode for U256 {
    fn decode(r: &mut BcsReader<'_>) -> Result<Self, BcsError> {
        r.read_u256()
    }
}

impl BcsEncode for str {
    fn encode(&self, w: &mut BcsWriter) {
        w.write_str(self);
    }
}

impl BcsEncode for String {
    fn encode(&self, w: &mut BcsWriter) {
        w.write_str(self);
    }
}

impl BcsDecode for String {
    fn decode(r: &mut BcsReader<'_>) -> Result<Self, BcsError> {
        r.read_string()
    }
}

impl<T: BcsEncode> BcsEncode for [T] {
    fn encode(&self, w: &mut BcsWriter) {
        w.write_len(self.len());
        for item in self {
            item.encode(w);
        }
    }
}

impl<T: BcsEncode> BcsEncode for Vec<T> {
    fn encode(&self, w: &mut BcsWriter) {
        self.as_slice().encode(w);
    }
}

impl<T: BcsDecode> BcsDecode for Vec<T> {
    fn decode(r: &mut BcsReader<'_>) -> Result<Self, BcsError> {
        let len = r.read_len()?;
        // every element takes at least one byte, so never trust the prefix beyond that
        let mut out = Vec::with_capacity(len.min(r.remaining()));
        for _ in 0..len {
            out.push(T::decode(r)?);
        }
        Ok(out)
    }
}

impl<T: BcsEncode> BcsEncode for Option<T> {
    fn encode(&self, w: &mut BcsWriter) {
        match self {
            None => {
                w.write_u8(0);
            }
            Some(v) => {
                w.write_u8(1);
                v.encode(w);
            }
        }
    }
}

impl<T: BcsDecode> BcsDecode for Option<T> {
    fn decode(r: &mut BcsReader<'_>) -> Result<Self, BcsError> {
        match r.read_tag("Option", 2)? {
            0 => Ok(None),
            _ => Ok(Some(T::decode(r)?)),
        }
    }
}

impl<T: BcsEncode + ?Sized> BcsEncode for Box<T> {
    fn encode(&self, w: &mut BcsWriter) {
        (**self).encode(w);
    }
}

impl<T: BcsDecode> BcsDecode for Box<T> {
    fn decode(r: &mut BcsReader<'_>) -> Result<Self, BcsError> {
        Ok(Box::new(T::decode(r)?))
    }
}

pub fn to_base64(bytes: &[u8]) -> String {
    use base64::Engine as _;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}
