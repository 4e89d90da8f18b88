use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::query::ObjectInfo;
use crate::types::ObjectId;

/// Object lookups remembered across builds of one session.
///
/// Share it between builders with an `Arc`. Entries go stale once the
/// object is mutated on chain; call [`invalidate`](Self::invalidate) after
/// executing a transaction that touched it.
#[derive(Debug, Default)]
pub struct ObjectCache {
    entries: Mutex<HashMap<ObjectId, ObjectInfo>>,
}

impl ObjectCache {
    pub fn new() -> Self {
        Self::default()
    }

    // entries are independent, so a poisoned map is still usable
    fn entries(&self) -> MutexGuard<'_, HashMap<ObjectId, ObjectInfo>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, object_id: &ObjectId) -> Option<ObjectInfo> {
        self.entries().get(object_id).copied()
    }

    pub fn insert(&self, info: ObjectInfo) {
        self.entries().insert(info.object_id, info);
    }

    pub fn invalidate(&self, object_id: &ObjectId) -> Option<ObjectInfo> {
        self.entries().remove(object_id)
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
