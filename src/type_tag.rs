//! Move type tags: parsing from text and BCS layout.

use std::fmt;
use std::str::FromStr;

use crate::bcs::{BcsDecode, BcsEncode, BcsReader, BcsWriter};
use crate::error::{BcsError, TxError};
use crate::types::Address;

/// Deepest `vector<...>` / generic nesting accepted from text or bytes.
pub const MAX_TYPE_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Bool,
    U8,
    U16,
    U32,
    U64,
    U128,
    U256,
    Address,
    Signer,
    Vector(Box<TypeTag>),
    Struct(Box<StructTag>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructTag {
    pub address: Address,
    pub module: String,
    pub name: String,
    pub type_params: Vec<TypeTag>,
}

impl FromStr for TypeTag {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser {
            src: s,
            pos: 0,
            depth: 0,
        };
        let tag = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != s.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(tag)
    }
}

impl FromStr for StructTag {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<TypeTag>()? {
            TypeTag::Struct(tag) => Ok(*tag),
            _ => Err(TxError::InvalidTypeTag(format!("`{s}` is not a struct type"))),
        }
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, what: &str) -> TxError {
        TxError::InvalidTypeTag(format!("{what} at offset {} in `{}`", self.pos, self.src))
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), TxError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(&format!("expected `{token}`")))
        }
    }

    fn word(&mut self) -> &'a str {
        self.skip_ws();
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn identifier(&mut self) -> Result<String, TxError> {
        let word = self.word();
        match word.chars().next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => Ok(word.to_owned()),
            _ => Err(self.error("expected identifier")),
        }
    }

    fn parse_type(&mut self) -> Result<TypeTag, TxError> {
        if self.depth >= MAX_TYPE_DEPTH {
            return Err(self.error(&format!("nesting deeper than {MAX_TYPE_DEPTH}")));
        }
        self.depth += 1;
        let tag = self.parse_type_inner();
        self.depth -= 1;
        tag
    }

    fn parse_type_inner(&mut self) -> Result<TypeTag, TxError> {
        let word = self.word();
        let tag = match word {
            "bool" => TypeTag::Bool,
            "u8" => TypeTag::U8,
            "u16" => TypeTag::U16,
            "u32" => TypeTag::U32,
            "u64" => TypeTag::U64,
            "u128" => TypeTag::U128,
            "u256" => TypeTag::U256,
            "address" => TypeTag::Address,
            "signer" => TypeTag::Signer,
            "vector" => {
                self.expect("<")?;
                let inner = self.parse_type()?;
                self.expect(">")?;
                TypeTag::Vector(Box::new(inner))
            }
            "" => return Err(self.error("expected type")),
            addr => {
                let address = addr.parse::<Address>().map_err(|_| {
                    self.error(&format!("`{addr}` is neither a primitive nor an address"))
                })?;
                self.expect("::")?;
                let module = self.identifier()?;
                self.expect("::")?;
                let name = self.identifier()?;
                let mut type_params = Vec::new();
                if self.eat("<") {
                    loop {
                        type_params.push(self.parse_type()?);
                        if self.eat(">") {
                            break;
                        }
                        self.expect(",")?;
                    }
                }
                TypeTag::Struct(Box::new(StructTag {
                    address,
                    module,
                    name,
                    type_params,
                }))
            }
        };
        Ok(tag)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::U8 => f.write_str("u8"),
            Self::U16 => f.write_str("u16"),
            Self::U32 => f.write_str("u32"),
            Self::U64 => f.write_str("u64"),
            Self::U128 => f.write_str("u128"),
            Self::U256 => f.write_str("u256"),
            Self::Address => f.write_str("address"),
            Self::Signer => f.write_str("signer"),
            Self::Vector(inner) => write!(f, "vector<{inner}>"),
            Self::Struct(tag) => write!(f, "{tag}"),
        }
    }
}

impl fmt::Display for StructTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.address, self.module, self.name)?;
        if !self.type_params.is_empty() {
            f.write_str("<")?;
            for (i, param) in self.type_params.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{param}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl BcsEncode for TypeTag {
    fn encode(&self, w: &mut BcsWriter) {
        let tag = match self {
            Self::Bool => 0,
            Self::U8 => 1,
            Self::U64 => 2,
            Self::U128 => 3,
            Self::Address => 4,
            Self::Signer => 5,
            Self::Vector(_) => 6,
            Self::Struct(_) => 7,
            Self::U16 => 8,
            Self::U32 => 9,
            Self::U256 => 10,
        };
        w.write_uleb(tag);
        match self {
            Self::Vector(inner) => inner.encode(w),
            Self::Struct(tag) => tag.encode(w),
            _ => {}
        }
    }
}

impl BcsDecode for TypeTag {
    fn decode(r: &mut BcsReader<'_>) -> Result<Self, BcsError> {
        Self::decode_nested(r, 0)
    }
}

impl TypeTag {
    fn decode_nested(r: &mut BcsReader<'_>, depth: usize) -> Result<Self, BcsError> {
        if depth >= MAX_TYPE_DEPTH {
            return Err(BcsError::DepthExceeded(MAX_TYPE_DEPTH));
        }
        Ok(match r.read_tag("TypeTag", 11)? {
            0 => Self::Bool,
            1 => Self::U8,
            2 => Self::U64,
            3 => Self::U128,
            4 => Self::Address,
            5 => Self::Signer,
            6 => Self::Vector(Box::new(Self::decode_nested(r, depth + 1)?)),
            7 => Self::Struct(Box::new(StructTag::decode_nested(r, depth + 1)?)),
            8 => Self::U16,
            9 => Self::U32,
            _ => Self::U256,
        })
    }
}

impl BcsEncode for StructTag {
    fn encode(&self, w: &mut BcsWriter) {
        self.address.encode(w);
        w.write_str(&self.module).write_str(&self.name);
        self.type_params.encode(w);
    }
}

impl BcsDecode for StructTag {
    fn decode(r: &mut BcsReader<'_>) -> Result<Self, BcsError> {
        Self::decode_nested(r, 0)
    }
}

impl StructTag {
    fn decode_nested(r: &mut BcsReader<'_>, depth: usize) -> Result<Self, BcsError> {
        let address = Address::decode(r)?;
        let module = r.read_string()?;
        let name = r.read_string()?;
        let len = r.read_len()?;
        let mut type_params = Vec::with_capacity(len.min(r.remaining()));
        for _ in 0..len {
            type_params.push(TypeTag::decode_nested(r, depth)?);
        }
        Ok(Self {
            address,
            module,
            name,
            type_params,
        })
    }
}
