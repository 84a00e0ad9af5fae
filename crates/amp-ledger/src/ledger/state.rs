//! # Ledger State
//!
//! Typed access to the key-value store through the write journal, and the
//! balance mutators that keep the nested counters in lockstep.
//!
//! ## Storage layout
//!
//! Keys are bincode-encoded [`LedgerKey`] values. Amounts are stored as 32
//! byte big-endian words, flags as a single `1` byte, addresses as 20 bytes.
//! Zero amounts, cleared flags and null addresses are stored as deletes.
//!
//! ## Indexed sets
//!
//! Holder partitions, active partitions, collateral managers and strategy
//! prefixes are stored as indexed sets: a length, 1-based item slots and a
//! reverse index per item. Insert appends; remove swaps the last item into
//! the freed slot and pops.

use crate::domain::value_objects::{Address, Partition, PartitionPrefix, U256};
use crate::errors::{AmpError, StoreError};
use crate::ledger::journal::Journal;
use crate::ports::outbound::KeyValueStore;
use serde::Serialize;

// =============================================================================
// STORAGE KEYS
// =============================================================================

/// Identifies an indexed set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SetId {
    /// Partitions in which a holder has a non-zero balance.
    HolderPartitions(Address),
    /// Partitions with non-zero supply, plus the default partition.
    TotalPartitions,
    /// Registered collateral managers.
    CollateralManagers,
    /// Prefixes bound to a strategy validator.
    PartitionStrategies,
}

/// Every key the ledger writes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum LedgerKey {
    /// Set once by genesis.
    Initialized,
    /// Current owner.
    Owner,
    /// Nominated successor.
    AuthorizedNewOwner,
    /// Total issued supply.
    TotalSupply,
    /// Aggregate balance of a holder.
    Balance(Address),
    /// Balance of a holder within a partition.
    PartitionBalance(Address, Partition),
    /// Supply of a partition.
    PartitionSupply(Partition),
    /// Allowance of a spender over an owner's partition.
    Allowance {
        partition: Partition,
        owner: Address,
        spender: Address,
    },
    /// Global operator flag.
    Operator { holder: Address, operator: Address },
    /// Partition-scoped operator flag.
    PartitionOperator {
        holder: Address,
        partition: Partition,
        operator: Address,
    },
    /// Number of items in a set.
    SetLen(SetId),
    /// Item at a 1-based position.
    SetItem(SetId, u64),
    /// 1-based position of an item.
    SetIndex(SetId, Vec<u8>),
}

impl LedgerKey {
    /// Encode the key for the store.
    pub fn encode(&self) -> Result<Vec<u8>, StoreError> {
        Ok(bincode::serialize(self)?)
    }
}

// =============================================================================
// LEDGER STATE
// =============================================================================

/// Backing store plus the journal of the running operation.
#[derive(Debug)]
pub struct LedgerState<S> {
    store: S,
    pub(crate) journal: Journal,
}

impl<S: KeyValueStore> LedgerState<S> {
    /// Wraps a store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            journal: Journal::new(),
        }
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // -------------------------------------------------------------------------
    // Raw access
    // -------------------------------------------------------------------------

    fn read(&self, key: &LedgerKey) -> Result<Option<Vec<u8>>, StoreError> {
        let encoded = key.encode()?;
        match self.journal.get(&encoded) {
            Some(pending) => Ok(pending.map(<[u8]>::to_vec)),
            None => self.store.get(&encoded),
        }
    }

    fn write(&mut self, key: &LedgerKey, value: Option<Vec<u8>>) -> Result<(), StoreError> {
        let encoded = key.encode()?;
        self.journal.put(encoded, value);
        Ok(())
    }

    /// Pushes the journal's store writes into the backing store.
    pub(crate) fn flush(&self, batch: crate::ports::outbound::WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        self.store.write_batch(batch)
    }

    // -------------------------------------------------------------------------
    // Typed access
    // -------------------------------------------------------------------------

    pub(crate) fn get_u256(&self, key: &LedgerKey) -> Result<U256, StoreError> {
        match self.read(key)? {
            None => Ok(U256::zero()),
            Some(bytes) if bytes.len() == 32 => Ok(U256::from_big_endian(&bytes)),
            Some(_) => Err(StoreError::Corrupted(format!("{key:?}"))),
        }
    }

    pub(crate) fn put_u256(&mut self, key: &LedgerKey, value: U256) -> Result<(), StoreError> {
        if value.is_zero() {
            return self.write(key, None);
        }
        let mut bytes = [0u8; 32];
        value.to_big_endian(&mut bytes);
        self.write(key, Some(bytes.to_vec()))
    }

    pub(crate) fn get_u64(&self, key: &LedgerKey) -> Result<u64, StoreError> {
        match self.read(key)? {
            None => Ok(0),
            Some(bytes) => <[u8; 8]>::try_from(bytes.as_slice())
                .map(u64::from_be_bytes)
                .map_err(|_| StoreError::Corrupted(format!("{key:?}"))),
        }
    }

    pub(crate) fn put_u64(&mut self, key: &LedgerKey, value: u64) -> Result<(), StoreError> {
        if value == 0 {
            return self.write(key, None);
        }
        self.write(key, Some(value.to_be_bytes().to_vec()))
    }

    pub(crate) fn get_flag(&self, key: &LedgerKey) -> Result<bool, StoreError> {
        Ok(self.read(key)?.is_some())
    }

    pub(crate) fn put_flag(&mut self, key: &LedgerKey, value: bool) -> Result<(), StoreError> {
        self.write(key, value.then(|| vec![1]))
    }

    pub(crate) fn get_address(&self, key: &LedgerKey) -> Result<Address, StoreError> {
        match self.read(key)? {
            None => Ok(Address::ZERO),
            Some(bytes) => {
                Address::from_slice(&bytes).ok_or_else(|| StoreError::Corrupted(format!("{key:?}")))
            }
        }
    }

    pub(crate) fn put_address(&mut self, key: &LedgerKey, value: Address) -> Result<(), StoreError> {
        if value.is_zero() {
            return self.write(key, None);
        }
        self.write(key, Some(value.as_bytes().to_vec()))
    }

    // -------------------------------------------------------------------------
    // Indexed sets
    // -------------------------------------------------------------------------

    pub(crate) fn set_len(&self, set: SetId) -> Result<u64, StoreError> {
        self.get_u64(&LedgerKey::SetLen(set))
    }

    pub(crate) fn set_contains(&self, set: SetId, item: &[u8]) -> Result<bool, StoreError> {
        Ok(self.get_u64(&LedgerKey::SetIndex(set, item.to_vec()))? != 0)
    }

    /// Appends `item`. Returns false if it was already present.
    pub(crate) fn set_insert(&mut self, set: SetId, item: &[u8]) -> Result<bool, StoreError> {
        if self.set_contains(set, item)? {
            return Ok(false);
        }
        let index = self.set_len(set)? + 1;
        self.write(&LedgerKey::SetItem(set, index), Some(item.to_vec()))?;
        self.put_u64(&LedgerKey::SetIndex(set, item.to_vec()), index)?;
        self.put_u64(&LedgerKey::SetLen(set), index)?;
        Ok(true)
    }

    /// Removes `item` by moving the last item into its slot. Returns false if
    /// it was not present.
    pub(crate) fn set_remove(&mut self, set: SetId, item: &[u8]) -> Result<bool, StoreError> {
        let index_key = LedgerKey::SetIndex(set, item.to_vec());
        let index = self.get_u64(&index_key)?;
        if index == 0 {
            return Ok(false);
        }

        let last = self.set_len(set)?;
        if index != last {
            let moved = self
                .read(&LedgerKey::SetItem(set, last))?
                .ok_or_else(|| StoreError::Corrupted(format!("{set:?} slot {last}")))?;
            self.put_u64(&LedgerKey::SetIndex(set, moved.clone()), index)?;
            self.write(&LedgerKey::SetItem(set, index), Some(moved))?;
        }

        self.write(&LedgerKey::SetItem(set, last), None)?;
        self.put_u64(&index_key, 0)?;
        self.put_u64(&LedgerKey::SetLen(set), last - 1)?;
        Ok(true)
    }

    /// Items in slot order.
    pub(crate) fn set_items(&self, set: SetId) -> Result<Vec<Vec<u8>>, StoreError> {
        let len = self.set_len(set)?;
        (1..=len)
            .map(|index| {
                self.read(&LedgerKey::SetItem(set, index))?
                    .ok_or_else(|| StoreError::Corrupted(format!("{set:?} slot {index}")))
            })
            .collect()
    }

    pub(crate) fn partitions_in(&self, set: SetId) -> Result<Vec<Partition>, StoreError> {
        self.set_items(set)?
            .iter()
            .map(|bytes| {
                Partition::from_slice(bytes)
                    .ok_or_else(|| StoreError::Corrupted(format!("{set:?} partition")))
            })
            .collect()
    }

    pub(crate) fn addresses_in(&self, set: SetId) -> Result<Vec<Address>, StoreError> {
        self.set_items(set)?
            .iter()
            .map(|bytes| {
                Address::from_slice(bytes)
                    .ok_or_else(|| StoreError::Corrupted(format!("{set:?} address")))
            })
            .collect()
    }

    pub(crate) fn prefixes_in(&self, set: SetId) -> Result<Vec<PartitionPrefix>, StoreError> {
        self.set_items(set)?
            .iter()
            .map(|bytes| {
                <[u8; 4]>::try_from(bytes.as_slice())
                    .map(PartitionPrefix::new)
                    .map_err(|_| StoreError::Corrupted(format!("{set:?} prefix")))
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Balances
    // -------------------------------------------------------------------------

    /// Aggregate balance of `holder`.
    pub fn total_balance_of(&self, holder: Address) -> Result<U256, StoreError> {
        self.get_u256(&LedgerKey::Balance(holder))
    }

    /// Balance of `holder` in `partition`.
    pub fn balance_of_by_partition(
        &self,
        partition: Partition,
        holder: Address,
    ) -> Result<U256, StoreError> {
        self.get_u256(&LedgerKey::PartitionBalance(holder, partition))
    }

    /// Supply of `partition`.
    pub fn total_supply_by_partition(&self, partition: Partition) -> Result<U256, StoreError> {
        self.get_u256(&LedgerKey::PartitionSupply(partition))
    }

    /// Total issued supply.
    pub fn total_supply(&self) -> Result<U256, StoreError> {
        self.get_u256(&LedgerKey::TotalSupply)
    }

    /// Debit `amount` from `holder` in `partition`.
    ///
    /// Drops the partition from the holder's set when its balance reaches
    /// zero, and from the active set when its supply reaches zero (never for
    /// the default partition).
    pub fn debit(
        &mut self,
        holder: Address,
        partition: Partition,
        amount: U256,
    ) -> Result<(), AmpError> {
        let balance = self.balance_of_by_partition(partition, holder)?;
        if balance < amount {
            return Err(AmpError::InsufficientBalance {
                required: amount,
                available: balance,
            });
        }
        if amount.is_zero() {
            return Ok(());
        }

        let remaining = balance - amount;
        self.put_u256(&LedgerKey::PartitionBalance(holder, partition), remaining)?;

        let total = self.total_balance_of(holder)?;
        let total = total.checked_sub(amount).ok_or(AmpError::ArithmeticOverflow)?;
        self.put_u256(&LedgerKey::Balance(holder), total)?;

        let supply = self.total_supply_by_partition(partition)?;
        let supply = supply.checked_sub(amount).ok_or(AmpError::ArithmeticOverflow)?;
        self.put_u256(&LedgerKey::PartitionSupply(partition), supply)?;

        if supply.is_zero() && !partition.is_default() {
            self.set_remove(SetId::TotalPartitions, partition.as_bytes())?;
        }
        if remaining.is_zero() {
            self.set_remove(SetId::HolderPartitions(holder), partition.as_bytes())?;
        }
        Ok(())
    }

    /// Credit `amount` to `holder` in `partition`. Zero is a no-op.
    pub fn credit(
        &mut self,
        holder: Address,
        partition: Partition,
        amount: U256,
    ) -> Result<(), AmpError> {
        if amount.is_zero() {
            return Ok(());
        }

        let balance = self.balance_of_by_partition(partition, holder)?;
        let updated = balance.checked_add(amount).ok_or(AmpError::ArithmeticOverflow)?;
        self.put_u256(&LedgerKey::PartitionBalance(holder, partition), updated)?;

        let total = self.total_balance_of(holder)?;
        let total = total.checked_add(amount).ok_or(AmpError::ArithmeticOverflow)?;
        self.put_u256(&LedgerKey::Balance(holder), total)?;

        let supply = self.total_supply_by_partition(partition)?;
        let supply = supply.checked_add(amount).ok_or(AmpError::ArithmeticOverflow)?;
        self.put_u256(&LedgerKey::PartitionSupply(partition), supply)?;

        if balance.is_zero() {
            self.set_insert(SetId::HolderPartitions(holder), partition.as_bytes())?;
        }
        self.set_insert(SetId::TotalPartitions, partition.as_bytes())?;
        Ok(())
    }

    /// Add newly issued tokens to the total supply.
    pub fn increase_total_supply(&mut self, amount: U256) -> Result<(), AmpError> {
        let supply = self.total_supply()?;
        let supply = supply.checked_add(amount).ok_or(AmpError::ArithmeticOverflow)?;
        self.put_u256(&LedgerKey::TotalSupply, supply)?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Allowances & operators
    // -------------------------------------------------------------------------

    pub(crate) fn allowance(
        &self,
        partition: Partition,
        owner: Address,
        spender: Address,
    ) -> Result<U256, StoreError> {
        self.get_u256(&LedgerKey::Allowance {
            partition,
            owner,
            spender,
        })
    }

    pub(crate) fn set_allowance(
        &mut self,
        partition: Partition,
        owner: Address,
        spender: Address,
        value: U256,
    ) -> Result<(), StoreError> {
        let key = LedgerKey::Allowance {
            partition,
            owner,
            spender,
        };
        self.put_u256(&key, value)
    }

    pub(crate) fn operator_flag(&self, holder: Address, operator: Address) -> Result<bool, StoreError> {
        self.get_flag(&LedgerKey::Operator { holder, operator })
    }

    pub(crate) fn set_operator_flag(
        &mut self,
        holder: Address,
        operator: Address,
        value: bool,
    ) -> Result<(), StoreError> {
        self.put_flag(&LedgerKey::Operator { holder, operator }, value)
    }

    pub(crate) fn partition_operator_flag(
        &self,
        holder: Address,
        partition: Partition,
        operator: Address,
    ) -> Result<bool, StoreError> {
        self.get_flag(&LedgerKey::PartitionOperator {
            holder,
            partition,
            operator,
        })
    }

    pub(crate) fn set_partition_operator_flag(
        &mut self,
        holder: Address,
        partition: Partition,
        operator: Address,
        value: bool,
    ) -> Result<(), StoreError> {
        let key = LedgerKey::PartitionOperator {
            holder,
            partition,
            operator,
        };
        self.put_flag(&key, value)
    }
}

// =============================================================================
// TESTS
// =============================================================================
