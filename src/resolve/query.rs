use async_trait::async_trait;

use crate::error::QueryError;
use crate::types::{Address, Digest, ObjectId};

/// Who may use an object, as reported by the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    AddressOwner(Address),
    ObjectOwner(Address),
    Shared { initial_shared_version: u64 },
    Immutable,
}

/// Current metadata of an on-chain object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectInfo {
    pub object_id: ObjectId,
    pub version: u64,
    pub digest: Digest,
    pub owner: Owner,
}

impl ObjectInfo {
    pub fn initial_shared_version(&self) -> Option<u64> {
        match self.owner {
            Owner::Shared {
                initial_shared_version,
            } => Some(initial_shared_version),
            _ => None,
        }
    }
}

/// Read access to live chain state, supplied by the caller.
///
/// Implementations wrap an RPC or GraphQL client. Both methods may be
/// called concurrently during one build.
#[async_trait]
pub trait ChainQuery: Send + Sync {
    async fn get_object(&self, object_id: ObjectId) -> Result<ObjectInfo, QueryError>;

    async fn get_reference_gas_price(&self) -> Result<u64, QueryError>;
}
