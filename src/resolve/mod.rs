//! Turns a draft with unresolved inputs and unset gas fields into one the
//! wire encoder accepts.
//!
//! Lookups go through a caller-supplied [`ChainQuery`]. Under
//! [`ResolvePolicy::BestEffort`] a failed lookup degrades to hints and
//! defaults (logged at `warn`); under [`ResolvePolicy::Strict`] it aborts.

mod cache;
mod query;

pub use cache::ObjectCache;
pub use query::{ChainQuery, ObjectInfo, Owner};

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log::{debug, warn};
use tokio::sync::watch;

use crate::data::{Expiration, TransactionData};
use crate::error::{QueryError, TxError};
use crate::inputs::{Input, ObjectArg, ObjectRef, UnresolvedObject};
use crate::types::{Digest, ObjectId};

/// Gas price used when the reference price cannot be fetched.
pub const DEFAULT_GAS_PRICE: u64 = 1;

/// Budget used when the caller sets none.
pub const MAX_GAS_BUDGET: u64 = 50_000_000_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolvePolicy {
    /// Absorb lookup failures into hints and defaults. Good for dry runs
    /// and gas estimation; the result may not execute.
    #[default]
    BestEffort,
    /// Any failed lookup aborts the build.
    Strict,
}

/// Cooperative cancellation for a build. Clones share the same flag.
#[derive(Debug, Clone)]
pub struct CancelToken(Arc<watch::Sender<bool>>);

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self(Arc::new(tx))
    }

    pub fn cancel(&self) {
        self.0.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Completes once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.0.subscribe();
        // the sender lives in `self`, so the channel cannot close while we wait
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Produce only the `TransactionKind` bytes and skip gas completion.
    pub only_transaction_kind: bool,
    pub policy: ResolvePolicy,
    /// Upper bound on the whole resolution step.
    pub deadline: Option<Duration>,
    pub cancel: Option<CancelToken>,
}

impl BuildOptions {
    pub fn kind_only() -> Self {
        Self {
            only_transaction_kind: true,
            ..Self::default()
        }
    }

    pub fn strict() -> Self {
        Self {
            policy: ResolvePolicy::Strict,
            ..Self::default()
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Run `fut` under the cancellation token and deadline in `options`.
/// Either firing yields [`TxError::Cancelled`].
async fn guarded<T, F>(options: &BuildOptions, fut: F) -> Result<T, TxError>
where
    F: Future<Output = Result<T, TxError>>,
{
    let bounded = async {
        match options.deadline {
            Some(deadline) => tokio::time::timeout(deadline, fut)
                .await
                .unwrap_or_else(|_| Err(TxError::Cancelled)),
            None => fut.await,
        }
    };

    match &options.cancel {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(TxError::Cancelled),
                result = bounded => result,
            }
        }
        None => bounded.await,
    }
}

/// Resolve `data` in place.
///
/// On error `data` may be partially updated; callers that need
/// all-or-nothing should pass a copy and commit it on success.
pub async fn resolve_transaction_data(
    data: &mut TransactionData,
    client: Option<&dyn ChainQuery>,
    cache: Option<&ObjectCache>,
    options: &BuildOptions,
) -> Result<(), TxError> {
    let resolver = Resolver {
        client,
        cache,
        policy: options.policy,
    };
    guarded(options, async {
        resolver.normalize_pure(data)?;
        resolver.resolve_objects(data).await?;
        if !options.only_transaction_kind {
            resolver.complete_gas(data).await?;
        }
        Ok::<_, TxError>(())
    })
    .await
}

struct Resolver<'a> {
    client: Option<&'a dyn ChainQuery>,
    cache: Option<&'a ObjectCache>,
    policy: ResolvePolicy,
}

impl Resolver<'_> {
    fn normalize_pure(&self, data: &mut TransactionData) -> Result<(), TxError> {
        for input in &mut data.inputs {
            if let Input::UnresolvedPure(value) = input {
                *input = Input::Pure(value.to_bcs_bytes()?);
            }
        }
        Ok(())
    }

    async fn resolve_objects(&self, data: &mut TransactionData) -> Result<(), TxError> {
        let mut pending: Vec<(usize, UnresolvedObject)> = Vec::new();
        for (index, input) in data.inputs.iter_mut().enumerate() {
            let Input::UnresolvedObject(obj) = input else {
                continue;
            };
            let obj = *obj;
            match obj.try_resolve_locally() {
                Some(arg) => *input = Input::Object(arg),
                None => pending.push((index, obj)),
            }
        }
        if pending.is_empty() {
            return Ok(());
        }

        let mut found: HashMap<ObjectId, Result<ObjectInfo, QueryError>> = HashMap::new();
        if let Some(cache) = self.cache {
            for (_, obj) in &pending {
                if let Some(info) = cache.get(&obj.object_id) {
                    found.insert(obj.object_id, Ok(info));
                }
            }
        }

        let mut to_fetch: Vec<ObjectId> = pending
            .iter()
            .map(|(_, obj)| obj.object_id)
            .filter(|id| !found.contains_key(id))
            .collect();
        to_fetch.sort();
        to_fetch.dedup();

        if !to_fetch.is_empty() {
            let client = self.client.ok_or(TxError::MissingClient {
                unresolved: to_fetch.len(),
            })?;
            debug!("looking up {} object(s)", to_fetch.len());
            let results = join_all(to_fetch.iter().map(|id| client.get_object(*id))).await;
            for (id, result) in to_fetch.into_iter().zip(results) {
                if let (Some(cache), Ok(info)) = (self.cache, &result) {
                    cache.insert(*info);
                }
                found.insert(id, result);
            }
        }

        for (index, obj) in pending {
            let arg = match found.get(&obj.object_id) {
                Some(Ok(info)) => from_object_info(&obj, info),
                Some(Err(QueryError::Cancelled)) => return Err(TxError::Cancelled),
                Some(Err(err)) if self.policy == ResolvePolicy::Strict => {
                    return Err(err.clone().into())
                }
                Some(Err(err)) => {
                    warn!(
                        "lookup of {} failed ({err}), falling back to hints",
                        obj.object_id
                    );
                    fallback_ref(&obj)
                }
                // every pending id was either cached or fetched
                None => fallback_ref(&obj),
            };
            data.inputs[index] = Input::Object(arg);
        }
        Ok(())
    }

    async fn complete_gas(&self, data: &mut TransactionData) -> Result<(), TxError> {
        let gas = &mut data.gas_data;
        if gas.price.is_none() {
            gas.price = Some(self.reference_gas_price().await?);
        }
        if gas.budget.is_none() {
            debug!("gas budget unset, using {MAX_GAS_BUDGET}");
            gas.budget = Some(MAX_GAS_BUDGET);
        }
        if gas.payment.is_none() {
            debug!("gas payment unset, leaving it empty");
            gas.payment = Some(Vec::new());
        }
        if data.expiration.is_none() {
            data.expiration = Some(Expiration::None);
        }
        Ok(())
    }

    async fn reference_gas_price(&self) -> Result<u64, TxError> {
        let Some(client) = self.client else {
            if self.policy == ResolvePolicy::Strict {
                return Err(TxError::MissingGasData("price"));
            }
            warn!("no chain client, using gas price {DEFAULT_GAS_PRICE}");
            return Ok(DEFAULT_GAS_PRICE);
        };
        match client.get_reference_gas_price().await {
            Ok(price) => Ok(price),
            Err(QueryError::Cancelled) => Err(TxError::Cancelled),
            Err(err) if self.policy == ResolvePolicy::Strict => Err(err.into()),
            Err(err) => {
                warn!("reference gas price lookup failed ({err}), using {DEFAULT_GAS_PRICE}");
                Ok(DEFAULT_GAS_PRICE)
            }
        }
    }
}

fn from_object_info(obj: &UnresolvedObject, info: &ObjectInfo) -> ObjectArg {
    match info.initial_shared_version() {
        Some(initial_shared_version) => ObjectArg::Shared {
            object_id: obj.object_id,
            initial_shared_version,
            mutable: obj.mutable.unwrap_or(true),
        },
        None => ObjectArg::ImmOrOwned(ObjectRef::new(obj.object_id, info.version, info.digest)),
    }
}

fn fallback_ref(obj: &UnresolvedObject) -> ObjectArg {
    ObjectArg::ImmOrOwned(ObjectRef::new(
        obj.object_id,
        obj.version.unwrap_or(0),
        obj.digest.unwrap_or(Digest::ZERO),
    ))
}
