//! Transaction inputs, resolved and unresolved.

use serde::{Deserialize, Serialize};

use crate::bcs::{BcsDecode, BcsEncode, BcsReader, BcsWriter};
use crate::error::{BcsError, TxError};
use crate::pure::PureValue;
use crate::types::{Digest, ObjectId};

/// Fully pinned object reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRef {
    pub object_id: ObjectId,
    #[serde(with = "crate::encoding::u64_string")]
    pub version: u64,
    pub digest: Digest,
}

impl ObjectRef {
    pub fn new(object_id: ObjectId, version: u64, digest: Digest) -> Self {
        Self {
            object_id,
            version,
            digest,
        }
    }
}

impl BcsEncode for ObjectRef {
    fn encode(&self, w: &mut BcsWriter) {
        self.object_id.encode(w);
        w.write_u64(self.version);
        self.digest.encode(w);
    }
}

impl BcsDecode for ObjectRef {
    fn decode(r: &mut BcsReader<'_>) -> Result<Self, BcsError> {
        Ok(Self {
            object_id: ObjectId::decode(r)?,
            version: r.read_u64()?,
            digest: Digest::decode(r)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectArg {
    ImmOrOwned(ObjectRef),
    Shared {
        #[serde(rename = "objectId")]
        object_id: ObjectId,
        #[serde(rename = "initialSharedVersion", with = "crate::encoding::u64_string")]
        initial_shared_version: u64,
        mutable: bool,
    },
    Receiving(ObjectRef),
}

impl ObjectArg {
    pub fn object_id(&self) -> ObjectId {
        match self {
            Self::ImmOrOwned(r) | Self::Receiving(r) => r.object_id,
            Self::Shared { object_id, .. } => *object_id,
        }
    }
}

impl BcsEncode for ObjectArg {
    fn encode(&self, w: &mut BcsWriter) {
        match self {
            Self::ImmOrOwned(r) => {
                w.write_uleb(0);
                r.encode(w);
            }
            Self::Shared {
                object_id,
                initial_shared_version,
                mutable,
            } => {
                w.write_uleb(1);
                object_id.encode(w);
                w.write_u64(*initial_shared_version).write_bool(*mutable);
            }
            Self::Receiving(r) => {
                w.write_uleb(2);
                r.encode(w);
            }
        }
    }
}

impl BcsDecode for ObjectArg {
    fn decode(r: &mut BcsReader<'_>) -> Result<Self, BcsError> {
        Ok(match r.read_tag("ObjectArg", 3)? {
            0 => Self::ImmOrOwned(ObjectRef::decode(r)?),
            1 => Self::Shared {
                object_id: ObjectId::decode(r)?,
                initial_shared_version: r.read_u64()?,
                mutable: r.read_bool()?,
            },
            _ => Self::Receiving(ObjectRef::decode(r)?),
        })
    }
}

/// Object reference whose version, digest or ownership still has to be
/// looked up. Any hint supplied here is used as-is or as a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedObject {
    pub object_id: ObjectId,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::encoding::opt_u64_string"
    )]
    pub version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<Digest>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::encoding::opt_u64_string"
    )]
    pub initial_shared_version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutable: Option<bool>,
}

impl UnresolvedObject {
    pub fn new(object_id: ObjectId) -> Self {
        Self {
            object_id,
            ..Self::default()
        }
    }

    /// Resolution that needs no lookup: a known shared version, or a
    /// known version and digest.
    pub fn try_resolve_locally(&self) -> Option<ObjectArg> {
        if let Some(initial_shared_version) = self.initial_shared_version {
            return Some(ObjectArg::Shared {
                object_id: self.object_id,
                initial_shared_version,
                mutable: self.mutable.unwrap_or(true),
            });
        }
        match (self.version, self.digest) {
            (Some(version), Some(digest)) => Some(ObjectArg::ImmOrOwned(ObjectRef::new(
                self.object_id,
                version,
                digest,
            ))),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Input {
    /// BCS bytes of a pure value.
    Pure(#[serde(with = "crate::encoding::base64_bytes")] Vec<u8>),
    UnresolvedPure(PureValue),
    Object(ObjectArg),
    UnresolvedObject(UnresolvedObject),
}

impl Input {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Pure(_) | Self::Object(_))
    }

    pub fn object_id(&self) -> Option<ObjectId> {
        match self {
            Self::Object(arg) => Some(arg.object_id()),
            Self::UnresolvedObject(obj) => Some(obj.object_id),
            Self::Pure(_) | Self::UnresolvedPure(_) => None,
        }
    }

    /// `CallArg` layout. Fails for unresolved variants; `index` is only
    /// used for the error.
    pub fn encode_wire(&self, index: usize, w: &mut BcsWriter) -> Result<(), TxError> {
        match self {
            Self::Pure(bytes) => {
                w.write_uleb(0).write_len_prefixed(bytes);
            }
            Self::Object(arg) => {
                w.write_uleb(1);
                arg.encode(w);
            }
            Self::UnresolvedPure(_) | Self::UnresolvedObject(_) => {
                return Err(TxError::UnresolvedInput { index })
            }
        }
        Ok(())
    }
}

impl From<ObjectArg> for Input {
    fn from(arg: ObjectArg) -> Self {
        Self::Object(arg)
    }
}

impl From<UnresolvedObject> for Input {
    fn from(obj: UnresolvedObject) -> Self {
        Self::UnresolvedObject(obj)
    }
}

impl From<PureValue> for Input {
    fn from(value: PureValue) -> Self {
        Self::UnresolvedPure(value)
    }
}

impl BcsDecode for Input {
    fn decode(r: &mut BcsReader<'_>) -> Result<Self, BcsError> {
        Ok(match r.read_tag("CallArg", 2)? {
            0 => Self::Pure(r.read_len_prefixed()?.to_vec()),
            _ => Self::Object(ObjectArg::decode(r)?),
        })
    }
}
