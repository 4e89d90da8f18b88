//! Programmable transaction builder and BCS codec for Sui.
//!
//! Accumulate inputs and commands on a [`Transaction`], let plugins and
//! an optional chain client fill in what is missing, and get canonical
//! wire bytes ready for signing.
//!
//! # Quick start
//!
//! ```
//! use sui_ptb::{Address, Argument, Transaction};
//!
//! # tokio_test_block_on(async {
//! let mut tx = Transaction::new();
//! tx.set_sender("0x1".parse()?)?;
//! tx.set_gas_price(1)?;
//! tx.set_gas_budget(1000)?;
//! tx.set_gas_payment(vec![])?;
//!
//! let amount = tx.pure_u64(10)?;
//! let coin = tx.split_coins(Argument::GasCoin, vec![amount])?;
//! let recipient = tx.pure_address("0x2".parse::<Address>()?)?;
//! tx.transfer_objects(vec![coin], recipient)?;
//!
//! let bytes = tx.build().await?;
//! println!("{} {}", tx.digest()?, sui_ptb::bcs::to_base64(&bytes));
//! # Ok::<(), sui_ptb::TxError>(())
//! # }).unwrap();
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```
//!
//! # Modules
//!
//! - [`builder`] -- high-level [`Transaction`] facade
//! - [`data`] -- [`TransactionData`], gas and expiration, wire and JSON forms
//! - [`inputs`] / [`commands`] -- call arguments and PTB commands
//! - [`pure`] -- [`PureValue`], encoded to BCS during resolution
//! - [`resolve`] -- object and gas resolution through a [`ChainQuery`]
//! - [`plugins`] -- build hooks, including [`NamedPackagesPlugin`](plugins::NamedPackagesPlugin)
//! - [`bcs`] -- the byte codec
//! - [`digest`] -- transaction digest and intent message

pub mod bcs;
pub mod builder;
pub mod commands;
pub mod data;
pub mod digest;
pub mod encoding;
pub mod error;
pub mod inputs;
pub mod plugins;
pub mod pure;
pub mod resolve;
pub mod type_tag;
pub mod types;

pub use builder::{BuildState, Transaction};
pub use commands::{Argument, Command, MoveCall};
pub use data::{Expiration, GasData, TransactionData, TransactionKind, ValidDuring};
pub use digest::{intent_message, signing_digest, transaction_digest, TRANSACTION_INTENT};
pub use error::{BcsError, QueryError, TxError};
pub use inputs::{Input, ObjectArg, ObjectRef, UnresolvedObject};
pub use plugins::TransactionPlugin;
pub use pure::PureValue;
pub use resolve::{
    resolve_transaction_data, BuildOptions, CancelToken, ChainQuery, ObjectCache, ObjectInfo,
    Owner, ResolvePolicy, DEFAULT_GAS_PRICE, MAX_GAS_BUDGET,
};
pub use type_tag::{StructTag, TypeTag, MAX_TYPE_DEPTH};
pub use types::{is_valid_address, normalize_address, Address, Digest, ObjectId, U256};
