//! High-level API - [`Transaction`] accumulates inputs and commands,
//! runs plugins and resolution, and produces wire bytes.

use std::sync::Arc;

use log::debug;

use crate::commands::{Argument, Command, MoveCall};
use crate::data::{Expiration, GasData, TransactionData};
use crate::digest::transaction_digest;
use crate::error::TxError;
use crate::inputs::{Input, ObjectArg, ObjectRef, UnresolvedObject};
use crate::plugins::{PluginPipeline, TransactionPlugin};
use crate::pure::PureValue;
use crate::resolve::{self, BuildOptions, ChainQuery, ObjectCache};
use crate::types::{Address, Digest, ObjectId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Empty,
    Accumulating,
    /// A build is running, or one was dropped mid-flight.
    Resolving,
    Finalized,
}

/// A programmable transaction under construction.
///
/// Inputs and commands are only ever appended, so the [`Argument`]
/// handles returned along the way stay valid through `build`. Not meant
/// for concurrent mutation; keep one builder per task.
pub struct Transaction {
    data: TransactionData,
    state: BuildState,
    plugins: PluginPipeline,
    client: Option<Arc<dyn ChainQuery>>,
    cache: Option<Arc<ObjectCache>>,
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("state", &self.state)
            .field("data", &self.data)
            .field("plugins", &self.plugins)
            .field("has_client", &self.client.is_some())
            .finish()
    }
}

impl Transaction {
    pub fn new() -> Self {
        Self {
            data: TransactionData::new(),
            state: BuildState::Empty,
            plugins: PluginPipeline::new(),
            client: None,
            cache: None,
        }
    }

    /// Resume from [`serialize`](Self::serialize) output. Plugins, client
    /// and cache are not part of the persisted form.
    pub fn restore(json: &str) -> Result<Self, TxError> {
        Ok(Self::from_data(TransactionData::from_json(json)?))
    }

    /// Start from canonical wire bytes, e.g. to inspect or rebuild a
    /// transaction received from elsewhere.
    pub fn from_wire_bytes(bytes: &[u8]) -> Result<Self, TxError> {
        Ok(Self::from_data(TransactionData::from_wire_bytes(bytes)?))
    }

    fn from_data(data: TransactionData) -> Self {
        let mut tx = Self::new();
        tx.data = data;
        tx.state = tx.idle_state();
        tx
    }

    pub fn with_client(mut self, client: Arc<dyn ChainQuery>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn set_client(&mut self, client: Arc<dyn ChainQuery>) {
        self.client = Some(client);
    }

    /// Share lookups with other builders of the same session.
    pub fn with_cache(mut self, cache: Arc<ObjectCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn add_plugin(&mut self, plugin: Box<dyn TransactionPlugin>) {
        self.plugins.register(plugin);
    }

    pub fn remove_plugin(&mut self, name: &str) -> Option<Box<dyn TransactionPlugin>> {
        self.plugins.unregister(name)
    }

    pub fn plugins(&self) -> &PluginPipeline {
        &self.plugins
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn data(&self) -> &TransactionData {
        &self.data
    }

    pub fn sender(&self) -> Option<Address> {
        self.data.sender
    }

    pub fn inputs(&self) -> &[Input] {
        &self.data.inputs
    }

    pub fn commands(&self) -> &[Command] {
        &self.data.commands
    }

    /// True iff every input is resolved, so the persisted form can be
    /// turned into wire bytes without a chain client.
    pub fn is_prepared_for_serialization(&self) -> bool {
        self.data.is_prepared_for_serialization()
    }

    fn idle_state(&self) -> BuildState {
        let d = &self.data;
        if d.inputs.is_empty()
            && d.commands.is_empty()
            && d.sender.is_none()
            && d.expiration.is_none()
            && d.gas_data == GasData::default()
        {
            BuildState::Empty
        } else {
            BuildState::Accumulating
        }
    }

    fn mutate(&mut self) -> Result<&mut TransactionData, TxError> {
        match self.state {
            BuildState::Finalized => Err(TxError::AlreadyFinalized),
            BuildState::Empty => {
                self.state = BuildState::Accumulating;
                Ok(&mut self.data)
            }
            BuildState::Accumulating | BuildState::Resolving => Ok(&mut self.data),
        }
    }

    // ---- sender, gas, expiration ----

    pub fn set_sender(&mut self, sender: Address) -> Result<(), TxError> {
        self.mutate()?.sender = Some(sender);
        Ok(())
    }

    pub fn set_sender_if_not_set(&mut self, sender: Address) -> Result<(), TxError> {
        if self.data.sender.is_none() {
            self.set_sender(sender)?;
        }
        Ok(())
    }

    pub fn set_gas_budget(&mut self, budget: u64) -> Result<(), TxError> {
        self.mutate()?.gas_data.budget = Some(budget);
        Ok(())
    }

    pub fn set_gas_budget_if_not_set(&mut self, budget: u64) -> Result<(), TxError> {
        if self.data.gas_data.budget.is_none() {
            self.set_gas_budget(budget)?;
        }
        Ok(())
    }

    pub fn set_gas_price(&mut self, price: u64) -> Result<(), TxError> {
        self.mutate()?.gas_data.price = Some(price);
        Ok(())
    }

    /// Sponsor address; defaults to the sender.
    pub fn set_gas_owner(&mut self, owner: Address) -> Result<(), TxError> {
        self.mutate()?.gas_data.owner = Some(owner);
        Ok(())
    }

    pub fn set_gas_payment(&mut self, payment: Vec<ObjectRef>) -> Result<(), TxError> {
        self.mutate()?.gas_data.payment = Some(payment);
        Ok(())
    }

    pub fn set_expiration(&mut self, expiration: Expiration) -> Result<(), TxError> {
        self.mutate()?.expiration = Some(expiration);
        Ok(())
    }

    // ---- inputs ----

    pub fn add_input(&mut self, input: Input) -> Result<Argument, TxError> {
        let data = self.mutate()?;
        let index =
            u16::try_from(data.inputs.len()).map_err(|_| TxError::IndexOverflow("inputs"))?;
        data.inputs.push(input);
        Ok(Argument::Input(index))
    }

    pub fn gas(&self) -> Argument {
        Argument::GasCoin
    }

    /// Already BCS-encoded bytes.
    pub fn pure_bytes(&mut self, bytes: Vec<u8>) -> Result<Argument, TxError> {
        self.add_input(Input::Pure(bytes))
    }

    /// Encoded during resolution; shape errors surface from `build`.
    pub fn pure(&mut self, value: impl Into<PureValue>) -> Result<Argument, TxError> {
        self.add_input(Input::UnresolvedPure(value.into()))
    }

    fn pure_now(&mut self, value: PureValue) -> Result<Argument, TxError> {
        let bytes = value.to_bcs_bytes()?;
        self.pure_bytes(bytes)
    }

    pub fn pure_u8(&mut self, v: u8) -> Result<Argument, TxError> {
        self.pure_bytes(vec![v])
    }

    pub fn pure_u64(&mut self, v: u64) -> Result<Argument, TxError> {
        self.pure_bytes(v.to_le_bytes().to_vec())
    }

    pub fn pure_bool(&mut self, v: bool) -> Result<Argument, TxError> {
        self.pure_bytes(vec![u8::from(v)])
    }

    pub fn pure_address(&mut self, v: Address) -> Result<Argument, TxError> {
        self.pure_bytes(v.0.to_vec())
    }

    pub fn pure_string(&mut self, v: &str) -> Result<Argument, TxError> {
        self.pure_now(PureValue::from(v))
    }

    pub fn pure_option<T: Into<PureValue>>(
        &mut self,
        v: Option<T>,
    ) -> Result<Argument, TxError> {
        self.pure_now(PureValue::from(v))
    }

    /// Elements must encode to the same shape.
    pub fn pure_vector<T, I>(&mut self, items: I) -> Result<Argument, TxError>
    where
        T: Into<PureValue>,
        I: IntoIterator<Item = T>,
    {
        self.pure_now(PureValue::Vector(items.into_iter().map(Into::into).collect()))
    }

    /// An object whose version, digest and ownership are looked up at build time.
    pub fn object(&mut self, object_id: ObjectId) -> Result<Argument, TxError> {
        self.add_input(Input::UnresolvedObject(UnresolvedObject::new(object_id)))
    }

    pub fn unresolved_object(&mut self, object: UnresolvedObject) -> Result<Argument, TxError> {
        self.add_input(Input::UnresolvedObject(object))
    }

    pub fn object_ref(&mut self, object: ObjectRef) -> Result<Argument, TxError> {
        self.add_input(Input::Object(ObjectArg::ImmOrOwned(object)))
    }

    pub fn shared_object(
        &mut self,
        object_id: ObjectId,
        initial_shared_version: u64,
        mutable: bool,
    ) -> Result<Argument, TxError> {
        self.add_input(Input::Object(ObjectArg::Shared {
            object_id,
            initial_shared_version,
            mutable,
        }))
    }

    pub fn receiving_object(&mut self, object: ObjectRef) -> Result<Argument, TxError> {
        self.add_input(Input::Object(ObjectArg::Receiving(object)))
    }

    // ---- commands ----

    /// Append a command and return a handle to its result. Arguments must
    /// refer to existing inputs or earlier commands.
    pub fn add_command(&mut self, command: Command) -> Result<Argument, TxError> {
        if self.state == BuildState::Finalized {
            return Err(TxError::AlreadyFinalized);
        }
        let index = u16::try_from(self.data.commands.len())
            .map_err(|_| TxError::IndexOverflow("commands"))?;
        self.data.check_arguments(usize::from(index), &command)?;
        self.mutate()?.commands.push(command);
        Ok(Argument::Result(index))
    }

    /// `target` is `package::module::function`; the package may be a named
    /// package if a plugin resolves it.
    pub fn move_call(
        &mut self,
        target: &str,
        type_arguments: Vec<String>,
        arguments: Vec<Argument>,
    ) -> Result<Argument, TxError> {
        let call = MoveCall::new(target, type_arguments, arguments)?;
        self.add_command(Command::MoveCall(call))
    }

    pub fn transfer_objects(
        &mut self,
        objects: Vec<Argument>,
        address: Argument,
    ) -> Result<Argument, TxError> {
        self.add_command(Command::TransferObjects { objects, address })
    }

    pub fn split_coins(
        &mut self,
        coin: Argument,
        amounts: Vec<Argument>,
    ) -> Result<Argument, TxError> {
        self.add_command(Command::SplitCoins { coin, amounts })
    }

    pub fn merge_coins(
        &mut self,
        destination: Argument,
        sources: Vec<Argument>,
    ) -> Result<Argument, TxError> {
        self.add_command(Command::MergeCoins {
            destination,
            sources,
        })
    }

    pub fn make_move_vec(
        &mut self,
        type_arg: Option<String>,
        elements: Vec<Argument>,
    ) -> Result<Argument, TxError> {
        self.add_command(Command::MakeMoveVec { type_arg, elements })
    }

    /// Returns the upgrade capability.
    pub fn publish(
        &mut self,
        modules: Vec<Vec<u8>>,
        dependencies: Vec<ObjectId>,
    ) -> Result<Argument, TxError> {
        self.add_command(Command::Publish {
            modules,
            dependencies,
        })
    }

    /// Returns the upgrade receipt.
    pub fn upgrade(
        &mut self,
        modules: Vec<Vec<u8>>,
        dependencies: Vec<ObjectId>,
        package: ObjectId,
        ticket: Argument,
    ) -> Result<Argument, TxError> {
        self.add_command(Command::Upgrade {
            modules,
            dependencies,
            package,
            ticket,
        })
    }

    /// Split `count` coins of `amount` each off `coin`. The returned
    /// handles address each new coin.
    pub fn split_coin_equal(
        &mut self,
        coin: Argument,
        count: u16,
        amount: u64,
    ) -> Result<Vec<Argument>, TxError> {
        let amount = self.pure_u64(amount)?;
        let split = self.split_coins(coin, vec![amount; usize::from(count)])?;
        Ok((0..count).filter_map(|i| split.nested(i)).collect())
    }

    /// Send `amount` MIST from the gas coin to `recipient`.
    pub fn transfer_sui(&mut self, recipient: Address, amount: u64) -> Result<Argument, TxError> {
        let amount = self.pure_u64(amount)?;
        let split = self.split_coins(Argument::GasCoin, vec![amount])?;
        let recipient = self.pure_address(recipient)?;
        let coin = split.nested(0).unwrap_or(split);
        self.transfer_objects(vec![coin], recipient)
    }

    // ---- build ----

    pub async fn build(&mut self) -> Result<Vec<u8>, TxError> {
        self.build_with(BuildOptions::default()).await
    }

    /// Run the plugin hooks and resolution, then encode.
    ///
    /// Work happens on a copy that replaces the builder's data only once
    /// encoding succeeded; on error the builder is left as it was. A
    /// finalized builder just re-encodes.
    ///
    /// A kind-only build commits the resolved inputs but does not finalize,
    /// so gas can still be set and the full transaction built afterwards.
    pub async fn build_with(&mut self, options: BuildOptions) -> Result<Vec<u8>, TxError> {
        if self.state == BuildState::Finalized {
            return encode(&self.data, &options);
        }

        let previous = match self.state {
            BuildState::Resolving => self.idle_state(),
            state => state,
        };
        self.state = BuildState::Resolving;

        match self.run_build(&options).await {
            Ok((draft, bytes)) => {
                self.data = draft;
                self.state = if options.only_transaction_kind {
                    self.idle_state()
                } else {
                    BuildState::Finalized
                };
                debug!("built {} bytes", bytes.len());
                Ok(bytes)
            }
            Err(e) => {
                debug!("build failed: {e}");
                self.state = previous;
                Err(e)
            }
        }
    }

    async fn run_build(
        &self,
        options: &BuildOptions,
    ) -> Result<(TransactionData, Vec<u8>), TxError> {
        let mut draft = self.data.clone();
        self.plugins.run_before(&mut draft)?;
        self.plugins.run_build(&mut draft)?;
        resolve::resolve_transaction_data(
            &mut draft,
            self.client.as_deref(),
            self.cache.as_deref(),
            options,
        )
        .await?;
        self.plugins.run_after(&mut draft)?;
        let bytes = encode(&draft, options)?;
        Ok((draft, bytes))
    }

    /// Wire bytes as standard base64, the form execution APIs accept.
    pub async fn build_base64(&mut self) -> Result<String, TxError> {
        Ok(crate::bcs::to_base64(&self.build().await?))
    }

    /// Digest of the full transaction. Fails until sender, gas and every
    /// input are resolved.
    pub fn digest(&self) -> Result<Digest, TxError> {
        Ok(transaction_digest(&self.data.to_wire_bytes()?))
    }

    /// The persisted form. Unresolved inputs survive a round trip.
    pub fn serialize(&self) -> Result<String, TxError> {
        self.data.to_json()
    }

    /// Resolve inputs and gas in place without running plugins or
    /// encoding, so the persisted form can later be built without a client.
    pub async fn prepare(&mut self, options: BuildOptions) -> Result<(), TxError> {
        if self.state == BuildState::Finalized {
            return Err(TxError::AlreadyFinalized);
        }
        let mut draft = self.data.clone();
        resolve::resolve_transaction_data(
            &mut draft,
            self.client.as_deref(),
            self.cache.as_deref(),
            &options,
        )
        .await?;
        self.data = draft;
        Ok(())
    }
}

fn encode(data: &TransactionData, options: &BuildOptions) -> Result<Vec<u8>, TxError> {
    if options.only_transaction_kind {
        data.transaction_kind_bytes()
    } else {
        data.to_wire_bytes()
    }
}
