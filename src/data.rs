//! The transaction aggregate: inputs, commands, sender, gas and expiration.

use serde::{Deserialize, Serialize};

use crate::bcs::{BcsDecode, BcsEncode, BcsReader, BcsWriter};
use crate::commands::{Argument, Command};
use crate::error::{BcsError, TxError};
use crate::inputs::{Input, ObjectRef};
use crate::types::{Address, Digest};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasData {
    #[serde(default)]
    pub payment: Option<Vec<ObjectRef>>,
    /// Defaults to the sender on the wire.
    #[serde(default)]
    pub owner: Option<Address>,
    #[serde(default, with = "crate::encoding::opt_u64_string")]
    pub price: Option<u64>,
    #[serde(default, with = "crate::encoding::opt_u64_string")]
    pub budget: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Expiration {
    #[default]
    None,
    Epoch(#[serde(with = "crate::encoding::u64_string")] u64),
    ValidDuring(ValidDuring),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidDuring {
    #[serde(default, with = "crate::encoding::opt_u64_string")]
    pub min_epoch: Option<u64>,
    #[serde(default, with = "crate::encoding::opt_u64_string")]
    pub max_epoch: Option<u64>,
    #[serde(default, with = "crate::encoding::opt_u64_string")]
    pub min_timestamp: Option<u64>,
    #[serde(default, with = "crate::encoding::opt_u64_string")]
    pub max_timestamp: Option<u64>,
    pub chain: Digest,
    pub nonce: u32,
}

impl BcsEncode for Expiration {
    fn encode(&self, w: &mut BcsWriter) {
        match self {
            Self::None => {
                w.write_uleb(0);
            }
            Self::Epoch(epoch) => {
                w.write_uleb(1).write_u64(*epoch);
            }
            Self::ValidDuring(v) => {
                w.write_uleb(2);
                v.min_epoch.encode(w);
                v.max_epoch.encode(w);
                v.min_timestamp.encode(w);
                v.max_timestamp.encode(w);
                v.chain.encode(w);
                w.write_u32(v.nonce);
            }
        }
    }
}

impl BcsDecode for Expiration {
    fn decode(r: &mut BcsReader<'_>) -> Result<Self, BcsError> {
        Ok(match r.read_tag("TransactionExpiration", 3)? {
            0 => Self::None,
            1 => Self::Epoch(r.read_u64()?),
            _ => Self::ValidDuring(ValidDuring {
                min_epoch: Option::decode(r)?,
                max_epoch: Option::decode(r)?,
                min_timestamp: Option::decode(r)?,
                max_timestamp: Option::decode(r)?,
                chain: Digest::decode(r)?,
                nonce: r.read_u32()?,
            }),
        })
    }
}

/// A programmable transaction without sender, gas or expiration.
///
/// This is what sponsored and dry-run flows exchange.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionKind {
    pub inputs: Vec<Input>,
    pub commands: Vec<Command>,
}

impl TransactionKind {
    pub fn from_wire_bytes(bytes: &[u8]) -> Result<Self, TxError> {
        let mut r = BcsReader::new(bytes);
        let kind = Self::decode(&mut r)?;
        r.finish()?;
        Ok(kind)
    }

    pub fn to_wire_bytes(&self) -> Result<Vec<u8>, TxError> {
        let mut w = BcsWriter::new();
        encode_programmable(&self.inputs, &self.commands, &mut w)?;
        Ok(w.to_bytes())
    }
}

fn encode_programmable(
    inputs: &[Input],
    commands: &[Command],
    w: &mut BcsWriter,
) -> Result<(), TxError> {
    // TransactionKind::ProgrammableTransaction
    w.write_uleb(0);
    w.write_len(inputs.len());
    for (index, input) in inputs.iter().enumerate() {
        input.encode_wire(index, w)?;
    }
    w.write_len(commands.len());
    for command in commands {
        command.encode_wire(w)?;
    }
    Ok(())
}

impl BcsDecode for TransactionKind {
    fn decode(r: &mut BcsReader<'_>) -> Result<Self, BcsError> {
        r.read_tag("TransactionKind", 1)?;
        Ok(Self {
            inputs: Vec::decode(r)?,
            commands: Vec::decode(r)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionData {
    pub version: u8,
    #[serde(default)]
    pub sender: Option<Address>,
    #[serde(default)]
    pub expiration: Option<Expiration>,
    #[serde(default)]
    pub gas_data: GasData,
    #[serde(default)]
    pub inputs: Vec<Input>,
    #[serde(default)]
    pub commands: Vec<Command>,
}

impl Default for TransactionData {
    fn default() -> Self {
        Self {
            version: Self::VERSION,
            sender: None,
            expiration: None,
            gas_data: GasData::default(),
            inputs: Vec::new(),
            commands: Vec::new(),
        }
    }
}

impl TransactionData {
    /// Version of the persisted JSON form.
    pub const VERSION: u8 = 1;

    pub fn new() -> Self {
        Self::default()
    }

    /// True iff no input is waiting for resolution.
    pub fn is_prepared_for_serialization(&self) -> bool {
        self.inputs.iter().all(Input::is_resolved)
    }

    /// Check every argument points at an existing input or an earlier command.
    pub fn validate(&self) -> Result<(), TxError> {
        for (index, command) in self.commands.iter().enumerate() {
            self.check_arguments(index, command)?;
        }
        Ok(())
    }

    /// Check the arguments of `command` as if it sat at position `index`.
    pub fn check_arguments(&self, index: usize, command: &Command) -> Result<(), TxError> {
        for argument in command.arguments() {
            let in_bounds = match *argument {
                Argument::GasCoin => true,
                Argument::Input(i) => usize::from(i) < self.inputs.len(),
                Argument::Result(j) | Argument::NestedResult(j, _) => usize::from(j) < index,
            };
            if !in_bounds {
                return Err(TxError::DanglingReference {
                    command: index,
                    argument: *argument,
                });
            }
        }
        Ok(())
    }

    pub fn kind(&self) -> TransactionKind {
        TransactionKind {
            inputs: self.inputs.clone(),
            commands: self.commands.clone(),
        }
    }

    /// BCS of the `TransactionKind` alone.
    pub fn transaction_kind_bytes(&self) -> Result<Vec<u8>, TxError> {
        self.validate()?;
        let mut w = BcsWriter::new();
        self.encode_kind(&mut w)?;
        Ok(w.to_bytes())
    }

    /// Canonical `TransactionData::V1` bytes.
    pub fn to_wire_bytes(&self) -> Result<Vec<u8>, TxError> {
        self.validate()?;
        let sender = self.sender.ok_or(TxError::MissingSender)?;
        let price = self.gas_data.price.ok_or(TxError::MissingGasData("price"))?;
        let budget = self.gas_data.budget.ok_or(TxError::MissingGasData("budget"))?;
        let payment = self
            .gas_data
            .payment
            .as_ref()
            .ok_or(TxError::MissingGasData("payment"))?;

        let mut w = BcsWriter::with_capacity(256);
        // TransactionData::V1
        w.write_uleb(0);
        self.encode_kind(&mut w)?;
        sender.encode(&mut w);
        payment.encode(&mut w);
        self.gas_data.owner.unwrap_or(sender).encode(&mut w);
        w.write_u64(price).write_u64(budget);
        self.expiration.clone().unwrap_or_default().encode(&mut w);
        Ok(w.to_bytes())
    }

    fn encode_kind(&self, w: &mut BcsWriter) -> Result<(), TxError> {
        encode_programmable(&self.inputs, &self.commands, w)
    }

    /// Inverse of [`to_wire_bytes`](Self::to_wire_bytes). Gas owner and
    /// expiration come back explicit.
    pub fn from_wire_bytes(bytes: &[u8]) -> Result<Self, TxError> {
        let mut r = BcsReader::new(bytes);
        r.read_tag("TransactionData", 1)?;
        let kind = TransactionKind::decode(&mut r)?;
        let sender = Address::decode(&mut r)?;
        let gas_data = GasData {
            payment: Some(Vec::decode(&mut r)?),
            owner: Some(Address::decode(&mut r)?),
            price: Some(r.read_u64()?),
            budget: Some(r.read_u64()?),
        };
        let expiration = Expiration::decode(&mut r)?;
        r.finish()?;

        let data = Self {
            version: Self::VERSION,
            sender: Some(sender),
            expiration: Some(expiration),
            gas_data,
            inputs: kind.inputs,
            commands: kind.commands,
        };
        data.validate()?;
        Ok(data)
    }

    /// The persisted form. Unresolved inputs are kept as they are.
    pub fn to_json(&self) -> Result<String, TxError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, TxError> {
        let data: Self = serde_json::from_str(json)?;
        if data.version != Self::VERSION {
            return Err(TxError::UnsupportedVersion(data.version));
        }
        Ok(data)
    }
}
