//! Commands of a programmable transaction and the arguments they consume.

use serde::{Deserialize, Serialize};

use crate::bcs::{BcsDecode, BcsEncode, BcsReader, BcsWriter};
use crate::error::{BcsError, TxError};
use crate::type_tag::TypeTag;
use crate::types::{Address, ObjectId};

/// Handle to a value a command can consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Argument {
    GasCoin,
    Input(u16),
    Result(u16),
    NestedResult(u16, u16),
}

impl Argument {
    /// The `index`-th value of a command that returns several.
    ///
    /// Only meaningful on `Result`; other variants yield `None`.
    pub fn nested(self, index: u16) -> Option<Argument> {
        match self {
            Self::Result(cmd) => Some(Self::NestedResult(cmd, index)),
            _ => None,
        }
    }
}

impl BcsEncode for Argument {
    fn encode(&self, w: &mut BcsWriter) {
        match *self {
            Self::GasCoin => {
                w.write_uleb(0);
            }
            Self::Input(i) => {
                w.write_uleb(1).write_u16(i);
            }
            Self::Result(i) => {
                w.write_uleb(2).write_u16(i);
            }
            Self::NestedResult(i, j) => {
                w.write_uleb(3).write_u16(i).write_u16(j);
            }
        }
    }
}

impl BcsDecode for Argument {
    fn decode(r: &mut BcsReader<'_>) -> Result<Self, BcsError> {
        Ok(match r.read_tag("Argument", 4)? {
            0 => Self::GasCoin,
            1 => Self::Input(r.read_u16()?),
            2 => Self::Result(r.read_u16()?),
            _ => Self::NestedResult(r.read_u16()?, r.read_u16()?),
        })
    }
}

/// A Move function call. `package` and the type arguments stay text until
/// the wire bytes are produced, so they may still hold a named package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveCall {
    pub package: String,
    pub module: String,
    pub function: String,
    #[serde(default)]
    pub type_arguments: Vec<String>,
    #[serde(default)]
    pub arguments: Vec<Argument>,
}

impl MoveCall {
    /// Build from a `package::module::function` target.
    pub fn new(
        target: &str,
        type_arguments: Vec<String>,
        arguments: Vec<Argument>,
    ) -> Result<Self, TxError> {
        let (package, module, function) = split_target(target)?;
        Ok(Self {
            package: package.to_owned(),
            module: module.to_owned(),
            function: function.to_owned(),
            type_arguments,
            arguments,
        })
    }

    pub fn target(&self) -> String {
        format!("{}::{}::{}", self.package, self.module, self.function)
    }
}

fn split_target(target: &str) -> Result<(&str, &str, &str), TxError> {
    let invalid = || TxError::InvalidTarget(target.to_owned());
    let mut parts = target.trim().splitn(3, "::");
    let package = parts.next().ok_or_else(invalid)?;
    let module = parts.next().ok_or_else(invalid)?;
    let function = parts.next().ok_or_else(invalid)?;
    if [package, module, function]
        .iter()
        .any(|p| p.is_empty() || p.contains("::"))
    {
        return Err(invalid());
    }
    Ok((package, module, function))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    MoveCall(MoveCall),
    TransferObjects {
        objects: Vec<Argument>,
        address: Argument,
    },
    SplitCoins {
        coin: Argument,
        amounts: Vec<Argument>,
    },
    MergeCoins {
        destination: Argument,
        sources: Vec<Argument>,
    },
    Publish {
        #[serde(with = "crate::encoding::base64_vec")]
        modules: Vec<Vec<u8>>,
        dependencies: Vec<ObjectId>,
    },
    MakeMoveVec {
        #[serde(rename = "type", default)]
        type_arg: Option<String>,
        elements: Vec<Argument>,
    },
    Upgrade {
        #[serde(with = "crate::encoding::base64_vec")]
        modules: Vec<Vec<u8>>,
        dependencies: Vec<ObjectId>,
        package: ObjectId,
        ticket: Argument,
    },
}

impl Command {
    /// Every argument the command consumes, in wire order.
    pub fn arguments(&self) -> Vec<&Argument> {
        match self {
            Self::MoveCall(call) => call.arguments.iter().collect(),
            Self::TransferObjects { objects, address } => {
                objects.iter().chain(std::iter::once(address)).collect()
            }
            Self::SplitCoins { coin, amounts } => {
                std::iter::once(coin).chain(amounts.iter()).collect()
            }
            Self::MergeCoins {
                destination,
                sources,
            } => std::iter::once(destination).chain(sources.iter()).collect(),
            Self::Publish { .. } => Vec::new(),
            Self::MakeMoveVec { elements, .. } => elements.iter().collect(),
            Self::Upgrade { ticket, .. } => vec![ticket],
        }
    }

    /// Wire layout. Fails if a package or type argument is not yet a
    /// concrete address / type.
    pub fn encode_wire(&self, w: &mut BcsWriter) -> Result<(), TxError> {
        match self {
            Self::MoveCall(call) => {
                let package = call.package.parse::<Address>()?;
                let type_args = call
                    .type_arguments
                    .iter()
                    .map(|t| t.parse::<TypeTag>())
                    .collect::<Result<Vec<_>, _>>()?;
                w.write_uleb(0);
                package.encode(w);
                w.write_str(&call.module).write_str(&call.function);
                type_args.encode(w);
                call.arguments.encode(w);
            }
            Self::TransferObjects { objects, address } => {
                w.write_uleb(1);
                objects.encode(w);
                address.encode(w);
            }
            Self::SplitCoins { coin, amounts } => {
                w.write_uleb(2);
                coin.encode(w);
                amounts.encode(w);
            }
            Self::MergeCoins {
                destination,
                sources,
            } => {
                w.write_uleb(3);
                destination.encode(w);
                sources.encode(w);
            }
            Self::Publish {
                modules,
                dependencies,
            } => {
                w.write_uleb(4);
                encode_modules(w, modules);
                dependencies.encode(w);
            }
            Self::MakeMoveVec { type_arg, elements } => {
                let type_arg = type_arg
                    .as_deref()
                    .map(str::parse::<TypeTag>)
                    .transpose()?;
                w.write_uleb(5);
                type_arg.encode(w);
                elements.encode(w);
            }
            Self::Upgrade {
                modules,
                dependencies,
                package,
                ticket,
            } => {
                w.write_uleb(6);
                encode_modules(w, modules);
                dependencies.encode(w);
                package.encode(w);
                ticket.encode(w);
            }
        }
        Ok(())
    }
}

fn encode_modules(w: &mut BcsWriter, modules: &[Vec<u8>]) {
    w.write_len(modules.len());
    for module in modules {
        w.write_len_prefixed(module);
    }
}

fn decode_modules(r: &mut BcsReader<'_>) -> Result<Vec<Vec<u8>>, BcsError> {
    let len = r.read_len()?;
    let mut out = Vec::with_capacity(len.min(r.remaining()));
    for _ in 0..len {
        out.push(r.read_len_prefixed()?.to_vec());
    }
    Ok(out)
}

/// Decoded text uses the canonical long address form.
impl BcsDecode for Command {
    fn decode(r: &mut BcsReader<'_>) -> Result<Self, BcsError> {
        Ok(match r.read_tag("Command", 7)? {
            0 => {
                let package = Address::decode(r)?;
                let module = r.read_string()?;
                let function = r.read_string()?;
                let type_arguments = Vec::<TypeTag>::decode(r)?
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                Self::MoveCall(MoveCall {
                    package: package.to_string(),
                    module,
                    function,
                    type_arguments,
                    arguments: Vec::decode(r)?,
                })
            }
            1 => Self::TransferObjects {
                objects: Vec::decode(r)?,
                address: Argument::decode(r)?,
            },
            2 => Self::SplitCoins {
                coin: Argument::decode(r)?,
                amounts: Vec::decode(r)?,
            },
            3 => Self::MergeCoins {
                destination: Argument::decode(r)?,
                sources: Vec::decode(r)?,
            },
            4 => Self::Publish {
                modules: decode_modules(r)?,
                dependencies: Vec::decode(r)?,
            },
            5 => Self::MakeMoveVec {
                type_arg: Option::<TypeTag>::decode(r)?.map(|t| t.to_string()),
                elements: Vec::decode(r)?,
            },
            _ => Self::Upgrade {
                modules: decode_modules(r)?,
                dependencies: Vec::decode(r)?,
                package: ObjectId::decode(r)?,
                ticket: Argument::decode(r)?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bcs;

    fn wire(cmd: &Command) -> Vec<u8> {
        let mut w = BcsWriter::new();
        cmd.encode_wire(&mut w).unwrap();
        w.to_bytes()
    }

    #[test]
    fn argument_layout() {
        assert_eq!(bcs::to_bytes(&Argument::GasCoin), vec![0]);
        assert_eq!(bcs::to_bytes(&Argument::Input(1)), vec![1, 1, 0]);
        assert_eq!(bcs::to_bytes(&Argument::Result(0x0102)), vec![2, 2, 1]);
        assert_eq!(
            bcs::to_bytes(&Argument::NestedResult(1, 2)),
            vec![3, 1, 0, 2, 0]
        );
    }

    #[test]
    fn nested_only_from_result() {
        assert_eq!(
            Argument::Result(4).nested(1),
            Some(Argument::NestedResult(4, 1))
        );
        assert_eq!(Argument::Input(4).nested(1), None);
    }

    #[test]
    fn split_coins_layout() {
        let cmd = Command::SplitCoins {
            coin: Argument::GasCoin,
            amounts: vec![Argument::Input(1)],
        };
        assert_eq!(wire(&cmd), vec![2, 0, 1, 1, 1, 0]);
    }

    #[test]
    fn target_parsing() {
        let call = MoveCall::new("0x2::coin::split", vec![], vec![]).unwrap();
        assert_eq!(call.package, "0x2");
        assert_eq!(call.module, "coin");
        assert_eq!(call.function, "split");
        assert_eq!(call.target(), "0x2::coin::split");

        let named = MoveCall::new("acme/app::mod::fn", vec![], vec![]).unwrap();
        assert_eq!(named.package, "acme/app");

        for bad in ["0x2::coin", "0x2::coin::", "::a::b", "0x2::a::b::c"] {
            assert!(matches!(
                MoveCall::new(bad, vec![], vec![]),
                Err(TxError::InvalidTarget(_))
            ));
        }
    }

    #[test]
    fn move_call_wire_round_trip_is_canonical() {
        let cmd = Command::MoveCall(
            MoveCall::new(
                "0x2::coin::zero",
                vec!["0x2::sui::SUI".into()],
                vec![Argument::Input(0)],
            )
            .unwrap(),
        );
        let bytes = wire(&cmd);
        assert_eq!(bytes[0], 0);
        let Command::MoveCall(decoded) = bcs::from_bytes::<Command>(&bytes).unwrap() else {
            panic!("expected a move call");
        };
        assert_eq!(decoded.package, "0x2".parse::<Address>().unwrap().to_string());
        assert_eq!(
            decoded.type_arguments,
            vec!["0x0000000000000000000000000000000000000000000000000000000000000002::sui::SUI"]
        );
        assert_eq!(decoded.arguments, vec![Argument::Input(0)]);
    }

    #[test]
    fn named_package_cannot_hit_the_wire() {
        let cmd = Command::MoveCall(MoveCall::new("acme/app::m::f", vec![], vec![]).unwrap());
        let mut w = BcsWriter::new();
        assert!(matches!(
            cmd.encode_wire(&mut w),
            Err(TxError::InvalidAddress(_))
        ));
    }

    #[test]
    fn publish_and_upgrade_round_trip() {
        for cmd in [
            Command::Publish {
                modules: vec![vec![0xA1, 0x1C], vec![]],
                dependencies: vec![ObjectId::new([1; 32])],
            },
            Command::Upgrade {
                modules: vec![vec![1, 2, 3]],
                dependencies: vec![],
                package: ObjectId::new([7; 32]),
                ticket: Argument::Result(0),
            },
            Command::MakeMoveVec {
                type_arg: None,
                elements: vec![Argument::Input(0), Argument::Input(1)],
            },
        ] {
            assert_eq!(bcs::from_bytes::<Command>(&wire(&cmd)).unwrap(), cmd);
        }
    }

    #[test]
    fn arguments_in_wire_order() {
        let cmd = Command::TransferObjects {
            objects: vec![Argument::Result(0), Argument::Result(1)],
            address: Argument::Input(2),
        };
        assert_eq!(
            cmd.arguments(),
            vec![&Argument::Result(0), &Argument::Result(1), &Argument::Input(2)]
        );
    }

    #[test]
    fn unknown_command_tag() {
        assert_eq!(
            bcs::from_bytes::<Command>(&[9]).unwrap_err(),
            BcsError::InvalidTag {
                kind: "Command",
                tag: 9
            }
        );
    }
}
