//! Core types: addresses, object ids, digests and 256-bit integers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::bcs::{BcsDecode, BcsEncode, BcsReader, BcsWriter};
use crate::error::{BcsError, TxError};

pub const ADDRESS_LENGTH: usize = 32;
pub const DIGEST_LENGTH: usize = 32;

/// 32-byte account or package address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(pub [u8; ADDRESS_LENGTH]);

/// Objects share the address space.
pub type ObjectId = Address;

impl Address {
    pub const ZERO: Self = Self([0u8; ADDRESS_LENGTH]);

    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn into_inner(self) -> [u8; ADDRESS_LENGTH] {
        self.0
    }
}

impl FromStr for Address {
    type Err = TxError;

    /// Accepts `0x`-prefixed or bare hex, left-padding short input with zeros.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let raw = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if raw.is_empty() || raw.len() > ADDRESS_LENGTH * 2 {
            return Err(TxError::InvalidAddress(s.to_owned()));
        }

        let padded = format!("{raw:0>width$}", width = ADDRESS_LENGTH * 2);
        let mut out = [0u8; ADDRESS_LENGTH];
        hex::decode_to_slice(&padded, &mut out)
            .map_err(|_| TxError::InvalidAddress(s.to_owned()))?;
        Ok(Self(out))
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl BcsEncode for Address {
    fn encode(&self, w: &mut BcsWriter) {
        w.write_bytes(&self.0);
    }
}

impl BcsDecode for Address {
    fn decode(r: &mut BcsReader<'_>) -> Result<Self, BcsError> {
        Ok(Self(r.read_fixed()?))
    }
}

/// Canonical long form: `0x` + 64 lowercase hex characters.
pub fn normalize_address(s: &str) -> Result<String, TxError> {
    Ok(Address::from_str(s)?.to_string())
}

pub fn is_valid_address(s: &str) -> bool {
    Address::from_str(s).is_ok()
}

/// 32-byte object or transaction digest, base58 in text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Digest(pub [u8; DIGEST_LENGTH]);

impl Digest {
    pub const ZERO: Self = Self([0u8; DIGEST_LENGTH]);

    pub const fn new(bytes: [u8; DIGEST_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl FromStr for Digest {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s.trim())
            .into_vec()
            .map_err(|e| TxError::InvalidDigest(format!("{s}: {e}")))?;
        let arr: [u8; DIGEST_LENGTH] = bytes.try_into().map_err(|b: Vec<u8>| {
            TxError::InvalidDigest(format!("{s}: expected 32 bytes, got {}", b.len()))
        })?;
        Ok(Self(arr))
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

/// On the wire a digest is a `vector<u8>`, so it carries a `0x20` length byte.
impl BcsEncode for Digest {
    fn encode(&self, w: &mut BcsWriter) {
        w.write_len_prefixed(&self.0);
    }
}

impl BcsDecode for Digest {
    fn decode(r: &mut BcsReader<'_>) -> Result<Self, BcsError> {
        let bytes = r.read_len_prefixed()?;
        let arr: [u8; DIGEST_LENGTH] =
            bytes.try_into().map_err(|_| BcsError::InvalidLength {
                expected: DIGEST_LENGTH,
                found: bytes.len(),
            })?;
        Ok(Self(arr))
    }
}

/// Unsigned 256-bit integer stored as 32 little-endian bytes.
///
/// Only conversion is supported; arithmetic belongs to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct U256([u8; 32]);

impl U256 {
    pub const ZERO: Self = Self([0u8; 32]);

    pub const fn from_le_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_le_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl From<u128> for U256 {
    fn from(v: u128) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..16].copy_from_slice(&v.to_le_bytes());
        Self(bytes)
    }
}

impl From<u64> for U256 {
    fn from(v: u64) -> Self {
        Self::from(u128::from(v))
    }
}

impl FromStr for U256 {
    type Err = TxError;

    /// Decimal, or `0x`-prefixed big-endian hex.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TxError::UnsupportedPureValue(format!("`{s}` is not a valid u256"));
        let s = s.trim();

        if let Some(hex_str) = s.strip_prefix("0x") {
            if hex_str.is_empty() || hex_str.len() > 64 {
                return Err(invalid());
            }
            let padded = format!("{hex_str:0>64}");
            let mut be = [0u8; 32];
            hex::decode_to_slice(&padded, &mut be).map_err(|_| invalid())?;
            be.reverse();
            return Ok(Self(be));
        }

        if s.is_empty() {
            return Err(invalid());
        }
        let mut bytes = [0u8; 32];
        for ch in s.chars() {
            let digit = ch.to_digit(10).ok_or_else(invalid)?;
            // bytes = bytes * 10 + digit
            let mut carry = digit as u16;
            for b in bytes.iter_mut() {
                let v = u16::from(*b) * 10 + carry;
                *b = v as u8;
                carry = v >> 8;
            }
            if carry != 0 {
                return Err(invalid());
            }
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut n = self.0;
        let mut digits = Vec::with_capacity(78);
        loop {
            let mut rem = 0u16;
            for b in n.iter_mut().rev() {
                let cur = (rem << 8) | u16::from(*b);
                *b = (cur / 10) as u8;
                rem = cur % 10;
            }
            digits.push(b'0' + rem as u8);
            if n.iter().all(|&b| b == 0) {
                break;
            }
        }
        digits.reverse();
        // digits are ASCII by construction
        f.write_str(&String::from_utf8_lossy(&digits))
    }
}

macro_rules! serde_as_str {
    ($($ty:ty),*) => {
        $(
            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                    s.collect_str(self)
                }
            }

            impl<'de> Deserialize<'de> for $ty {
                fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                    let s = String::deserialize(d)?;
                    s.parse().map_err(serde::de::Error::custom)
                }
            }
        )*
    };
}

serde_as_str!(Address, Digest, U256);
