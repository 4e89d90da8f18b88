//! End-to-end builds through the public API, with an in-memory chain.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use sui_ptb::plugins::NamedPackagesPlugin;
use sui_ptb::{
    Address, Argument, BuildOptions, BuildState, CancelToken, ChainQuery, Command, Digest, Input,
    ObjectArg, ObjectCache, ObjectId, ObjectInfo, ObjectRef, Owner, QueryError, Transaction,
    TxError, UnresolvedObject, MAX_GAS_BUDGET,
};

#[derive(Default)]
struct Chain {
    objects: HashMap<ObjectId, ObjectInfo>,
    gas_price: u64,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl Chain {
    fn new(gas_price: u64) -> Self {
        Self {
            gas_price,
            ..Self::default()
        }
    }

    fn with(mut self, info: ObjectInfo) -> Self {
        self.objects.insert(info.object_id, info);
        self
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl ChainQuery for Chain {
    async fn get_object(&self, object_id: ObjectId) -> Result<ObjectInfo, QueryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.objects
            .get(&object_id)
            .copied()
            .ok_or(QueryError::ObjectNotFound(object_id))
    }

    async fn get_reference_gas_price(&self) -> Result<u64, QueryError> {
        Ok(self.gas_price)
    }
}

fn addr(s: &str) -> Address {
    s.parse().unwrap()
}

fn coin(byte: u8, version: u64) -> ObjectInfo {
    ObjectInfo {
        object_id: Address::new([byte; 32]),
        version,
        digest: Digest::new([byte; 32]),
        owner: Owner::AddressOwner(addr("0x1")),
    }
}

fn pool(byte: u8, initial: u64) -> ObjectInfo {
    ObjectInfo {
        object_id: Address::new([byte; 32]),
        version: 900,
        digest: Digest::new([byte; 32]),
        owner: Owner::Shared {
            initial_shared_version: initial,
        },
    }
}

fn split_and_transfer() -> Transaction {
    let mut tx = Transaction::new();
    tx.set_sender(addr("0x1")).unwrap();
    tx.set_gas_budget(1000).unwrap();
    tx.set_gas_price(1).unwrap();
    let amount = tx.pure_bytes(vec![10]).unwrap();
    let split = tx.split_coins(Argument::GasCoin, vec![amount]).unwrap();
    let to = tx.pure_address(addr("0x2")).unwrap();
    tx.transfer_objects(vec![split], to).unwrap();
    tx
}

#[tokio::test]
async fn split_and_transfer_builds_offline() {
    let mut tx = split_and_transfer();
    assert_eq!(tx.inputs()[0], Input::Pure(vec![10]));
    assert_eq!(
        tx.commands()[1],
        Command::TransferObjects {
            objects: vec![Argument::Result(0)],
            address: Argument::Input(1),
        }
    );

    let bytes = tx.build().await.unwrap();
    assert_eq!(&bytes[..3], &[0x00, 0x00, 0x02]);
    assert_eq!(tx.state(), BuildState::Finalized);
    assert_eq!(tx.data().gas_data.payment, Some(vec![]));

    let restored = Transaction::restore(&tx.serialize().unwrap()).unwrap();
    assert_eq!(restored.sender(), Some(addr("0x1")));
    assert_eq!(restored.data().to_wire_bytes().unwrap(), bytes);
}

#[tokio::test]
async fn objects_are_resolved_through_the_client() {
    let chain = Arc::new(Chain::new(750).with(coin(5, 7)).with(pool(6, 3)));
    let mut tx = Transaction::new().with_client(chain.clone());
    tx.set_sender(addr("0x1")).unwrap();

    let owned = tx.object(Address::new([5; 32])).unwrap();
    let shared = tx
        .unresolved_object(UnresolvedObject {
            mutable: Some(false),
            ..UnresolvedObject::new(Address::new([6; 32]))
        })
        .unwrap();
    tx.move_call("0x2::pool::deposit", vec!["0x2::sui::SUI".into()], vec![shared, owned])
        .unwrap();

    tx.build().await.unwrap();
    assert_eq!(
        tx.inputs()[0],
        Input::Object(ObjectArg::ImmOrOwned(ObjectRef::new(
            Address::new([5; 32]),
            7,
            Digest::new([5; 32])
        )))
    );
    assert_eq!(
        tx.inputs()[1],
        Input::Object(ObjectArg::Shared {
            object_id: Address::new([6; 32]),
            initial_shared_version: 3,
            mutable: false,
        })
    );
    assert_eq!(tx.data().gas_data.price, Some(750));
    assert_eq!(tx.data().gas_data.budget, Some(MAX_GAS_BUDGET));
    assert_eq!(chain.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn rebuilding_is_idempotent() {
    let chain = Arc::new(Chain::new(1).with(coin(5, 7)));
    let mut tx = Transaction::new().with_client(chain.clone());
    tx.set_sender(addr("0x1")).unwrap();
    let obj = tx.object(Address::new([5; 32])).unwrap();
    tx.transfer_objects(vec![obj], Argument::Input(0)).unwrap();

    let first = tx.build().await.unwrap();
    let second = tx.build().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(chain.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_client_is_reported() {
    let mut tx = split_and_transfer();
    tx.object(Address::new([5; 32])).unwrap();
    tx.object(Address::new([6; 32])).unwrap();
    let err = tx.build().await.unwrap_err();
    assert!(matches!(err, TxError::MissingClient { unresolved: 2 }));
    assert_eq!(tx.state(), BuildState::Accumulating);
}

#[tokio::test]
async fn shared_cache_spares_lookups() {
    let chain = Arc::new(Chain::new(1).with(coin(5, 7)));
    let cache = Arc::new(ObjectCache::new());

    for _ in 0..3 {
        let mut tx = Transaction::new()
            .with_client(chain.clone())
            .with_cache(cache.clone());
        tx.set_sender(addr("0x1")).unwrap();
        tx.object(Address::new([5; 32])).unwrap();
        tx.build().await.unwrap();
    }
    assert_eq!(chain.calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);

    // a cached object resolves even without a client
    let mut offline = Transaction::new().with_cache(cache.clone());
    offline.set_sender(addr("0x1")).unwrap();
    offline.object(Address::new([5; 32])).unwrap();
    offline.build().await.unwrap();
}

#[tokio::test]
async fn strict_mode_fails_on_unknown_object() {
    let chain = Arc::new(Chain::new(1));
    let mut tx = Transaction::new().with_client(chain);
    tx.set_sender(addr("0x1")).unwrap();
    tx.object(Address::new([9; 32])).unwrap();

    let err = tx.build_with(BuildOptions::strict()).await.unwrap_err();
    assert!(matches!(err, TxError::Query(QueryError::ObjectNotFound(_))));
    assert!(!tx.is_prepared_for_serialization());

    // best effort falls back to a zero reference
    tx.build().await.unwrap();
    assert_eq!(
        tx.inputs()[0],
        Input::Object(ObjectArg::ImmOrOwned(ObjectRef::new(
            Address::new([9; 32]),
            0,
            Digest::ZERO
        )))
    );
}

#[tokio::test(start_paused = true)]
async fn deadline_cancels_slow_lookups() {
    let chain = Arc::new(Chain::new(1).with(coin(5, 7)).slow(Duration::from_secs(60)));
    let mut tx = Transaction::new().with_client(chain);
    tx.set_sender(addr("0x1")).unwrap();
    tx.object(Address::new([5; 32])).unwrap();
    let before = tx.data().clone();

    let options = BuildOptions::default().with_deadline(Duration::from_secs(1));
    assert!(matches!(tx.build_with(options).await, Err(TxError::Cancelled)));
    assert_eq!(tx.data(), &before);
    assert_eq!(tx.state(), BuildState::Accumulating);
}

#[tokio::test]
async fn cancelled_token_stops_the_build() {
    let chain = Arc::new(Chain::new(1).with(coin(5, 7)));
    let mut tx = Transaction::new().with_client(chain);
    tx.set_sender(addr("0x1")).unwrap();
    tx.object(Address::new([5; 32])).unwrap();

    let token = CancelToken::new();
    token.cancel();
    let err = tx
        .build_with(BuildOptions::default().with_cancel(token))
        .await
        .unwrap_err();
    assert!(matches!(err, TxError::Cancelled));
    assert!(err.is_retryable());
    assert!(!tx.is_prepared_for_serialization());
}

#[tokio::test]
async fn named_packages_are_substituted() {
    let mut tx = split_and_transfer();
    tx.add_plugin(Box::new(
        NamedPackagesPlugin::with_packages([("acme/app", "0x2")]).unwrap(),
    ));
    tx.move_call("acme/app::mod::fn", vec!["acme/app::mod::Coin".into()], vec![])
        .unwrap();

    tx.build().await.unwrap();
    let Command::MoveCall(call) = &tx.commands()[2] else {
        panic!("expected a move call");
    };
    assert_eq!(call.target(), "0x2::mod::fn");
    assert_eq!(call.type_arguments, vec!["0x2::mod::Coin"]);
}

#[tokio::test]
async fn finalized_builder_rejects_changes() {
    let mut tx = split_and_transfer();
    tx.build().await.unwrap();
    assert!(matches!(
        tx.set_sender(addr("0x3")),
        Err(TxError::AlreadyFinalized)
    ));
    assert!(matches!(
        tx.object(Address::new([5; 32])),
        Err(TxError::AlreadyFinalized)
    ));
    assert!(matches!(
        tx.merge_coins(Argument::GasCoin, vec![]),
        Err(TxError::AlreadyFinalized)
    ));
}

#[tokio::test]
async fn prepared_transaction_builds_without_client() {
    let chain = Arc::new(Chain::new(3).with(coin(5, 7)));
    let mut tx = Transaction::new().with_client(chain);
    tx.set_sender(addr("0x1")).unwrap();
    let obj = tx.object(Address::new([5; 32])).unwrap();
    let to = tx.pure_address(addr("0x2")).unwrap();
    tx.transfer_objects(vec![obj], to).unwrap();

    tx.prepare(BuildOptions::default()).await.unwrap();
    assert!(tx.is_prepared_for_serialization());
    assert_eq!(tx.state(), BuildState::Accumulating);

    let mut offline = Transaction::restore(&tx.serialize().unwrap()).unwrap();
    let bytes = offline.build().await.unwrap();
    assert_eq!(offline.data().gas_data.price, Some(3));
    assert_eq!(offline.digest().unwrap(), sui_ptb::transaction_digest(&bytes));
}
