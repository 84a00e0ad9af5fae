//! # Ledger Engine
//!
//! The `Amp` ledger: state, authorization, registry, ownership and the
//! transfer protocol over a journaled key-value store.
//!
//! ## Components
//!
//! - `journal.rs` - Write overlay with nested checkpoints
//! - `state.rs` - Storage keys, indexed sets, credit/debit
//! - `authorization.rs` - Operator and allowance resolution
//! - `registry.rs` - Collateral managers and partition strategies
//! - `ownership.rs` - Two-phase ownership transfer
//! - `transfer.rs` - Transfer protocol, hook dispatch, minting
//! - `invariants.rs` - Cross-counter consistency checks
//!
//! ## Transactions
//!
//! Every public mutation runs inside [`Amp::transact`]. A checkpoint is taken
//! on entry and restored on error. Hooks re-enter the ledger through the
//! `&mut dyn AmpApi` they receive; their calls open nested transactions. Only
//! the outermost successful transaction commits: directory registrations are
//! applied, store writes go out as one batch, then events are published. A
//! failed store batch puts the replaced directory entries back, so an aborted
//! commit leaves neither the store nor the directory changed.

pub mod authorization;
pub mod invariants;
pub mod journal;
pub mod ownership;
pub mod registry;
pub mod state;
pub mod transfer;

#[cfg(test)]
pub(crate) mod testing;

pub use invariants::*;
pub use journal::{Checkpoint, DirectoryWrite, Journal};
pub use state::{LedgerKey, LedgerState, SetId};

use crate::config::{AmpConfig, GRANULARITY};
use crate::domain::entities::TransferKind;
use crate::domain::value_objects::{Address, Hash, Partition, PartitionPrefix, U256};
use crate::errors::AmpError;
use crate::events::AmpEvent;
use crate::ports::inbound::AmpApi;
use crate::ports::outbound::{Directory, EventSink, KeyValueStore};
use amp_telemetry::{ACTIVE_PARTITIONS, MINT_OPERATIONS, PARTITION_CHANGES, TRANSFERS_TOTAL};
use std::sync::Arc;
use tracing::{debug, warn};

// =============================================================================
// AMP LEDGER
// =============================================================================

/// The partitioned token ledger.
///
/// Construct through [`crate::genesis::Genesis`].
pub struct Amp<S: KeyValueStore> {
    config: AmpConfig,
    pub(crate) state: LedgerState<S>,
    directory: Arc<dyn Directory>,
    sink: Arc<dyn EventSink>,
    /// Nesting level of running transactions.
    depth: usize,
}

impl<S: KeyValueStore> std::fmt::Debug for Amp<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Amp")
            .field("config", &self.config)
            .field("depth", &self.depth)
            .field("pending_keys", &self.state.journal.touched_keys())
            .finish_non_exhaustive()
    }
}

impl<S: KeyValueStore> Amp<S> {
    pub(crate) fn new(
        config: AmpConfig,
        store: S,
        directory: Arc<dyn Directory>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            config,
            state: LedgerState::new(store),
            directory,
            sink,
            depth: 0,
        }
    }

    /// Token configuration.
    pub fn config(&self) -> &AmpConfig {
        &self.config
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        self.state.store()
    }

    /// The interface directory.
    pub fn directory(&self) -> &Arc<dyn Directory> {
        &self.directory
    }

    /// Whether genesis ran against the backing store.
    pub fn is_initialized(&self) -> Result<bool, AmpError> {
        Ok(self.state.get_flag(&LedgerKey::Initialized)?)
    }

    /// Number of partitions currently in the active set.
    pub fn active_partition_count(&self) -> Result<u64, AmpError> {
        Ok(self.state.set_len(SetId::TotalPartitions)?)
    }

    // =========================================================================
    // TRANSACTIONS
    // =========================================================================

    /// Run `op` atomically.
    ///
    /// On error every write, event and directory registration made by `op`
    /// is discarded. When this is the outermost transaction and `op`
    /// succeeded, the journal is committed.
    pub(crate) fn transact<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, AmpError>,
    ) -> Result<T, AmpError> {
        let checkpoint = self.state.journal.checkpoint();
        self.depth += 1;
        let result = op(self);
        self.depth -= 1;

        match result {
            Ok(value) if self.depth == 0 => {
                self.commit()?;
                Ok(value)
            }
            Ok(value) => Ok(value),
            Err(err) => {
                self.state.journal.revert_to(checkpoint);
                if self.depth > 0 {
                    debug!(depth = self.depth, code = err.code(), "Nested operation rolled back");
                }
                Err(err)
            }
        }
    }

    /// Current transaction nesting level (zero outside any operation).
    pub fn depth(&self) -> usize {
        self.depth
    }

    fn commit(&mut self) -> Result<(), AmpError> {
        let commit = self.state.journal.take();

        let replaced = self.apply_directory_writes(&commit.directory_writes)?;
        if let Err(err) = self.state.flush(commit.batch) {
            self.restore_directory(replaced);
            return Err(err.into());
        }

        if !commit.events.is_empty() {
            for event in &commit.events {
                match event {
                    AmpEvent::ChangedPartition { .. } => PARTITION_CHANGES.inc(),
                    AmpEvent::Minted { .. } => MINT_OPERATIONS.inc(),
                    _ => {}
                }
            }
            self.sink.publish(&commit.events);
        }

        let active = self.state.set_len(SetId::TotalPartitions)?;
        ACTIVE_PARTITIONS.set(i64::try_from(active).unwrap_or(i64::MAX));
        Ok(())
    }

    /// Publish pending registrations to the directory.
    ///
    /// Returns the entries they replaced, in application order. If any write
    /// fails the ones already applied are restored before the error is
    /// returned.
    fn apply_directory_writes(
        &self,
        writes: &[DirectoryWrite],
    ) -> Result<Vec<DirectoryWrite>, AmpError> {
        let mut replaced = Vec::with_capacity(writes.len());
        for write in writes {
            let applied = self
                .directory
                .interface_implementer(write.account, write.interface)
                .and_then(|previous| {
                    self.directory.set_interface_implementer(
                        write.account,
                        write.interface,
                        write.implementer,
                    )?;
                    Ok(previous.unwrap_or(Address::ZERO))
                });

            match applied {
                Ok(previous) => replaced.push(DirectoryWrite {
                    implementer: previous,
                    ..*write
                }),
                Err(err) => {
                    self.restore_directory(replaced);
                    return Err(err.into());
                }
            }
        }
        Ok(replaced)
    }

    /// Put back directory entries replaced by an aborted commit, newest first.
    fn restore_directory(&self, replaced: Vec<DirectoryWrite>) {
        for write in replaced.into_iter().rev() {
            if let Err(err) = self.directory.set_interface_implementer(
                write.account,
                write.interface,
                write.implementer,
            ) {
                warn!(
                    account = %write.account,
                    error = %err,
                    "Directory entry could not be restored after aborted commit"
                );
            }
        }
    }

    /// Count a transfer attempt made from outside the ledger.
    fn record_transfer<T>(&self, kind: TransferKind, result: &Result<T, AmpError>) {
        if self.depth > 0 {
            return;
        }
        let outcome = if result.is_ok() { "success" } else { "failure" };
        TRANSFERS_TOTAL
            .with_label_values(&[kind.as_str(), outcome])
            .inc();
    }

    pub(crate) fn emit(&mut self, event: AmpEvent) {
        self.state.journal.emit(event);
    }

    // =========================================================================
    // DIRECTORY
    // =========================================================================

    /// Implementer of `interface` for `account`, pending registrations first.
    /// The null implementer reads as unregistered.
    pub(crate) fn implementer_of(
        &self,
        account: Address,
        interface: Hash,
    ) -> Result<Option<Address>, AmpError> {
        let implementer = match self.state.journal.pending_implementer(account, interface) {
            Some(pending) => Some(pending),
            None => self.directory.interface_implementer(account, interface)?,
        };
        Ok(implementer.filter(|address| !address.is_zero()))
    }

    /// Record a directory registration as part of the running transaction.
    pub(crate) fn register_interface(&mut self, account: Address, interface: Hash, implementer: Address) {
        self.state
            .journal
            .register_interface(account, interface, implementer);
    }
}

// =============================================================================
// PUBLIC API
// =============================================================================

impl<S: KeyValueStore> AmpApi for Amp<S> {
    fn address(&self) -> Address {
        self.config.token_address
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn symbol(&self) -> &str {
        &self.config.symbol
    }

    fn decimals(&self) -> u8 {
        self.config.decimals
    }

    fn granularity(&self) -> U256 {
        U256::from(GRANULARITY)
    }

    fn total_supply(&self) -> Result<U256, AmpError> {
        Ok(self.state.total_supply()?)
    }

    fn balance_of(&self, holder: Address) -> Result<U256, AmpError> {
        Ok(self.state.total_balance_of(holder)?)
    }

    fn balance_of_by_partition(
        &self,
        partition: Partition,
        holder: Address,
    ) -> Result<U256, AmpError> {
        Ok(self.state.balance_of_by_partition(partition, holder)?)
    }

    fn partitions_of(&self, holder: Address) -> Result<Vec<Partition>, AmpError> {
        Ok(self.state.partitions_in(SetId::HolderPartitions(holder))?)
    }

    fn total_partitions(&self) -> Result<Vec<Partition>, AmpError> {
        Ok(self.state.partitions_in(SetId::TotalPartitions)?)
    }

    fn total_supply_by_partition(&self, partition: Partition) -> Result<U256, AmpError> {
        Ok(self.state.total_supply_by_partition(partition)?)
    }

    fn allowance(&self, owner: Address, spender: Address) -> Result<U256, AmpError> {
        Ok(self.state.allowance(Partition::DEFAULT, owner, spender)?)
    }

    fn allowance_by_partition(
        &self,
        partition: Partition,
        owner: Address,
        spender: Address,
    ) -> Result<U256, AmpError> {
        Ok(self.state.allowance(partition, owner, spender)?)
    }

    fn approve(&mut self, caller: Address, spender: Address, value: U256) -> Result<bool, AmpError> {
        self.transact(|amp| amp.set_allowance_checked(Partition::DEFAULT, caller, spender, value))?;
        Ok(true)
    }

    fn increase_allowance(
        &mut self,
        caller: Address,
        spender: Address,
        added_value: U256,
    ) -> Result<bool, AmpError> {
        self.transact(|amp| amp.increase_allowance_in(Partition::DEFAULT, caller, spender, added_value))?;
        Ok(true)
    }

    fn decrease_allowance(
        &mut self,
        caller: Address,
        spender: Address,
        subtracted_value: U256,
    ) -> Result<bool, AmpError> {
        self.transact(|amp| {
            amp.decrease_allowance_in(Partition::DEFAULT, caller, spender, subtracted_value)
        })?;
        Ok(true)
    }

    fn approve_by_partition(
        &mut self,
        caller: Address,
        partition: Partition,
        spender: Address,
        value: U256,
    ) -> Result<bool, AmpError> {
        self.transact(|amp| amp.set_allowance_checked(partition, caller, spender, value))?;
        Ok(true)
    }

    fn increase_allowance_by_partition(
        &mut self,
        caller: Address,
        partition: Partition,
        spender: Address,
        added_value: U256,
    ) -> Result<bool, AmpError> {
        self.transact(|amp| amp.increase_allowance_in(partition, caller, spender, added_value))?;
        Ok(true)
    }

    fn decrease_allowance_by_partition(
        &mut self,
        caller: Address,
        partition: Partition,
        spender: Address,
        subtracted_value: U256,
    ) -> Result<bool, AmpError> {
        self.transact(|amp| amp.decrease_allowance_in(partition, caller, spender, subtracted_value))?;
        Ok(true)
    }

    fn is_operator(&self, operator: Address, holder: Address) -> Result<bool, AmpError> {
        self.check_operator(operator, holder)
    }

    fn is_operator_for_partition(
        &self,
        partition: Partition,
        operator: Address,
        holder: Address,
    ) -> Result<bool, AmpError> {
        self.check_operator_for_partition(partition, operator, holder)
    }

    fn is_operator_for_collateral_manager(
        &self,
        partition: Partition,
        operator: Address,
        collateral_manager: Address,
    ) -> Result<bool, AmpError> {
        self.check_operator_for_collateral_manager(partition, operator, collateral_manager)
    }

    fn authorize_operator(&mut self, caller: Address, operator: Address) -> Result<(), AmpError> {
        self.transact(|amp| amp.grant_operator(caller, operator))
    }

    fn revoke_operator(&mut self, caller: Address, operator: Address) -> Result<(), AmpError> {
        self.transact(|amp| amp.withdraw_operator(caller, operator))
    }

    fn authorize_operator_by_partition(
        &mut self,
        caller: Address,
        partition: Partition,
        operator: Address,
    ) -> Result<(), AmpError> {
        self.transact(|amp| amp.grant_partition_operator(caller, partition, operator))
    }

    fn revoke_operator_by_partition(
        &mut self,
        caller: Address,
        partition: Partition,
        operator: Address,
    ) -> Result<(), AmpError> {
        self.transact(|amp| amp.withdraw_partition_operator(caller, partition, operator))
    }

    fn transfer(&mut self, caller: Address, to: Address, value: U256) -> Result<bool, AmpError> {
        let result = self.transact(|amp| {
            amp.execute_transfer(
                TransferKind::Transfer,
                Partition::DEFAULT,
                caller,
                caller,
                to,
                value,
                &[],
                &[],
            )
        });
        self.record_transfer(TransferKind::Transfer, &result);
        result.map(|_| true)
    }

    fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<bool, AmpError> {
        let result = self.transact(|amp| {
            amp.execute_transfer(
                TransferKind::TransferFrom,
                Partition::DEFAULT,
                caller,
                from,
                to,
                value,
                &[],
                &[],
            )
        });
        self.record_transfer(TransferKind::TransferFrom, &result);
        result.map(|_| true)
    }

    fn transfer_by_partition(
        &mut self,
        caller: Address,
        partition: Partition,
        from: Address,
        to: Address,
        value: U256,
        data: &[u8],
        operator_data: &[u8],
    ) -> Result<Partition, AmpError> {
        let result = self.transact(|amp| {
            amp.execute_transfer(
                TransferKind::TransferByPartition,
                partition,
                caller,
                from,
                to,
                value,
                data,
                operator_data,
            )
        });
        self.record_transfer(TransferKind::TransferByPartition, &result);
        result
    }

    fn mint(&mut self, caller: Address, to: Address, value: U256) -> Result<(), AmpError> {
        let result = self.transact(|amp| amp.execute_mint(caller, to, value));
        self.record_transfer(TransferKind::Mint, &result);
        result
    }

    fn register_collateral_manager(&mut self, caller: Address) -> Result<(), AmpError> {
        self.transact(|amp| amp.add_collateral_manager(caller))
    }

    fn is_collateral_manager(&self, address: Address) -> Result<bool, AmpError> {
        Ok(self
            .state
            .set_contains(SetId::CollateralManagers, address.as_bytes())?)
    }

    fn collateral_managers(&self) -> Result<Vec<Address>, AmpError> {
        Ok(self.state.addresses_in(SetId::CollateralManagers)?)
    }

    fn set_partition_strategy(
        &mut self,
        caller: Address,
        prefix: PartitionPrefix,
        implementation: Address,
    ) -> Result<(), AmpError> {
        self.transact(|amp| amp.add_partition_strategy(caller, prefix, implementation))
    }

    fn is_partition_strategy(&self, prefix: PartitionPrefix) -> Result<bool, AmpError> {
        Ok(self
            .state
            .set_contains(SetId::PartitionStrategies, prefix.as_bytes())?)
    }

    fn partition_strategies(&self) -> Result<Vec<PartitionPrefix>, AmpError> {
        Ok(self.state.prefixes_in(SetId::PartitionStrategies)?)
    }

    fn owner(&self) -> Result<Address, AmpError> {
        Ok(self.state.get_address(&LedgerKey::Owner)?)
    }

    fn authorized_new_owner(&self) -> Result<Address, AmpError> {
        Ok(self.state.get_address(&LedgerKey::AuthorizedNewOwner)?)
    }

    fn authorize_ownership_transfer(
        &mut self,
        caller: Address,
        authorized_address: Address,
    ) -> Result<(), AmpError> {
        self.transact(|amp| amp.nominate_owner(caller, authorized_address))
    }

    fn assume_ownership(&mut self, caller: Address) -> Result<(), AmpError> {
        self.transact(|amp| amp.accept_ownership(caller))
    }
}
