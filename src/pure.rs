//! Host values that still need BCS encoding before they can be a `Pure` input.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bcs::BcsWriter;
use crate::error::TxError;
use crate::types::{Address, U256};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PureValue {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(#[serde(with = "crate::encoding::u64_string")] u64),
    U128(#[serde(with = "crate::encoding::u128_string")] u128),
    /// Decimal or `0x` hex text.
    U256(String),
    /// Hex text; short forms are left-padded.
    Address(String),
    String(String),
    /// `vector<u8>`.
    Bytes(#[serde(with = "crate::encoding::base64_bytes")] Vec<u8>),
    Option(Option<Box<PureValue>>),
    /// Elements must all have the same shape.
    Vector(Vec<PureValue>),
    /// Shape inferred from the JSON value: bool, non-negative integer
    /// (`u64`), string, null (empty option) or a homogeneous array.
    Json(Value),
}

/// Encoded shape, used to reject heterogeneous vectors.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Shape {
    Bool,
    U8,
    U16,
    U32,
    U64,
    U128,
    U256,
    Address,
    String,
    Vector(Option<Box<Shape>>),
    Option(Option<Box<Shape>>),
}

impl Shape {
    /// `None` inner shapes (empty vector, absent option) are compatible with anything.
    fn compatible(&self, other: &Shape) -> bool {
        match (self, other) {
            (Shape::Vector(a), Shape::Vector(b)) | (Shape::Option(a), Shape::Option(b)) => {
                match (a, b) {
                    (Some(a), Some(b)) => a.compatible(b),
                    _ => true,
                }
            }
            (a, b) => a == b,
        }
    }
}

impl PureValue {
    /// BCS-encode the value.
    pub fn to_bcs_bytes(&self) -> Result<Vec<u8>, TxError> {
        let mut w = BcsWriter::new();
        self.write(&mut w)?;
        Ok(w.to_bytes())
    }

    fn write(&self, w: &mut BcsWriter) -> Result<Shape, TxError> {
        let shape = match self {
            Self::Bool(v) => {
                w.write_bool(*v);
                Shape::Bool
            }
            Self::U8(v) => {
                w.write_u8(*v);
                Shape::U8
            }
            Self::U16(v) => {
                w.write_u16(*v);
                Shape::U16
            }
            Self::U32(v) => {
                w.write_u32(*v);
                Shape::U32
            }
            Self::U64(v) => {
                w.write_u64(*v);
                Shape::U64
            }
            Self::U128(v) => {
                w.write_u128(*v);
                Shape::U128
            }
            Self::U256(s) => {
                w.write_u256(&s.parse::<U256>()?);
                Shape::U256
            }
            Self::Address(s) => {
                let addr = s.parse::<Address>().map_err(|_| {
                    TxError::UnsupportedPureValue(format!("`{s}` is not an address"))
                })?;
                w.write_bytes(&addr.0);
                Shape::Address
            }
            Self::String(s) => {
                w.write_str(s);
                Shape::String
            }
            Self::Bytes(b) => {
                w.write_len_prefixed(b);
                Shape::Vector(Some(Box::new(Shape::U8)))
            }
            Self::Option(None) => {
                w.write_u8(0);
                Shape::Option(None)
            }
            Self::Option(Some(inner)) => {
                w.write_u8(1);
                Shape::Option(Some(Box::new(inner.write(w)?)))
            }
            Self::Vector(items) => {
                w.write_len(items.len());
                Shape::Vector(write_homogeneous(w, items.iter())?)
            }
            Self::Json(value) => return Self::from_json(value)?.write(w),
        };
        Ok(shape)
    }

    fn from_json(value: &Value) -> Result<Self, TxError> {
        Ok(match value {
            Value::Null => Self::Option(None),
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => match n.as_u64() {
                Some(v) => Self::U64(v),
                None => {
                    return Err(TxError::UnsupportedPureValue(format!(
                        "number {n} is not an unsigned 64-bit integer"
                    )))
                }
            },
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::Vector(
                items
                    .iter()
                    .map(Self::from_json)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(_) => {
                return Err(TxError::UnsupportedPureValue(
                    "JSON objects have no pure encoding".into(),
                ))
            }
        })
    }
}

fn write_homogeneous<'a>(
    w: &mut BcsWriter,
    items: impl Iterator<Item = &'a PureValue>,
) -> Result<Option<Box<Shape>>, TxError> {
    let mut first: Option<Shape> = None;
    for item in items {
        let shape = item.write(w)?;
        match &first {
            None => first = Some(shape),
            Some(expected) if expected.compatible(&shape) => {}
            Some(expected) => {
                return Err(TxError::UnsupportedPureValue(format!(
                    "vector mixes {expected:?} and {shape:?} elements"
                )))
            }
        }
    }
    Ok(first.map(Box::new))
}

macro_rules! pure_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for PureValue {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

pure_from!(
    bool => Bool,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    String => String,
    Vec<u8> => Bytes,
);

impl From<&str> for PureValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<Address> for PureValue {
    fn from(v: Address) -> Self {
        Self::Address(v.to_string())
    }
}

impl From<U256> for PureValue {
    fn from(v: U256) -> Self {
        Self::U256(v.to_string())
    }
}

impl<T: Into<PureValue>> From<Option<T>> for PureValue {
    fn from(v: Option<T>) -> Self {
        Self::Option(v.map(|inner| Box::new(inner.into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fixed_width_sizes() {
        assert_eq!(PureValue::U8(42).to_bcs_bytes().unwrap(), vec![42]);
        assert_eq!(PureValue::U16(1000).to_bcs_bytes().unwrap().len(), 2);
        assert_eq!(PureValue::U32(1).to_bcs_bytes().unwrap().len(), 4);
        assert_eq!(
            PureValue::U64(1_000_000_000).to_bcs_bytes().unwrap(),
            1_000_000_000u64.to_le_bytes().to_vec()
        );
        assert_eq!(PureValue::U256("1".into()).to_bcs_bytes().unwrap().len(), 32);
    }

    #[test]
    fn address_is_raw_32_bytes() {
        let bytes = PureValue::Address("0x1".into()).to_bcs_bytes().unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(bytes[31], 1);
    }

    #[test]
    fn string_and_bytes_are_length_prefixed() {
        assert_eq!(
            PureValue::from("hi").to_bcs_bytes().unwrap(),
            vec![2, b'h', b'i']
        );
        assert_eq!(
            PureValue::Bytes(vec![9, 9]).to_bcs_bytes().unwrap(),
            vec![2, 9, 9]
        );
    }

    #[test]
    fn option_layout() {
        assert_eq!(PureValue::from(Some(5u8)).to_bcs_bytes().unwrap(), vec![1, 5]);
        assert_eq!(PureValue::from(None::<u8>).to_bcs_bytes().unwrap(), vec![0]);
    }

    #[test]
    fn vector_of_u64() {
        let v = PureValue::Vector(vec![1u64.into(), 2u64.into()]);
        let bytes = v.to_bcs_bytes().unwrap();
        assert_eq!(bytes[0], 2);
        assert_eq!(bytes.len(), 1 + 16);
    }

    #[test]
    fn mixed_vector_rejected() {
        let v = PureValue::Vector(vec![1u64.into(), true.into()]);
        assert!(matches!(
            v.to_bcs_bytes(),
            Err(TxError::UnsupportedPureValue(_))
        ));
    }

    #[test]
    fn vector_of_options_with_absent_first_is_fine() {
        let v = PureValue::Vector(vec![None::<u8>.into(), Some(3u8).into()]);
        assert_eq!(v.to_bcs_bytes().unwrap(), vec![2, 0, 1, 3]);
    }

    #[test]
    fn json_shapes_are_inferred() {
        let v = PureValue::Json(json!([1, 2, 3]));
        assert_eq!(v.to_bcs_bytes().unwrap().len(), 1 + 24);
        assert_eq!(PureValue::Json(json!(null)).to_bcs_bytes().unwrap(), vec![0]);
        assert_eq!(PureValue::Json(json!(true)).to_bcs_bytes().unwrap(), vec![1]);
    }

    #[test]
    fn json_rejects_unencodable_shapes() {
        for value in [json!(-1), json!(1.5), json!({"a": 1}), json!([1, "x"])] {
            assert!(matches!(
                PureValue::Json(value).to_bcs_bytes(),
                Err(TxError::UnsupportedPureValue(_))
            ));
        }
    }

    #[test]
    fn bad_u256_and_address_rejected() {
        assert!(matches!(
            PureValue::U256("12a".into()).to_bcs_bytes(),
            Err(TxError::UnsupportedPureValue(_))
        ));
        assert!(matches!(
            PureValue::Address("nope".into()).to_bcs_bytes(),
            Err(TxError::UnsupportedPureValue(_))
        ));
    }
}
