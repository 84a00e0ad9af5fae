//! # Driving Ports (API - Inbound)
//!
//! The public surface of the ledger.
//!
//! `AmpApi` is object safe: hooks receive the ledger as `&mut dyn AmpApi`
//! and the service drives `Amp<S>` through it. Every mutating method takes
//! the authenticated `caller` explicitly and is atomic: on error nothing it
//! did is visible afterwards.

use crate::domain::value_objects::{Address, Partition, PartitionPrefix, U256};
use crate::errors::AmpError;

/// Primary API of the Amp ledger.
pub trait AmpApi {
    // =========================================================================
    // METADATA
    // =========================================================================

    /// The ledger's own account (used as directory key for its strategies).
    fn address(&self) -> Address;

    /// Token name.
    fn name(&self) -> &str;

    /// Token symbol.
    fn symbol(&self) -> &str;

    /// ERC-20 decimals.
    fn decimals(&self) -> u8;

    /// Smallest transferable unit.
    fn granularity(&self) -> U256;

    // =========================================================================
    // BALANCES & SUPPLY
    // =========================================================================

    /// Total issued supply.
    fn total_supply(&self) -> Result<U256, AmpError>;

    /// Aggregate balance across all partitions.
    fn balance_of(&self, holder: Address) -> Result<U256, AmpError>;

    /// Balance of `holder` within `partition`.
    fn balance_of_by_partition(
        &self,
        partition: Partition,
        holder: Address,
    ) -> Result<U256, AmpError>;

    /// Partitions in which `holder` has a non-zero balance (unordered).
    fn partitions_of(&self, holder: Address) -> Result<Vec<Partition>, AmpError>;

    /// Partitions with non-zero supply, plus the default partition (unordered).
    fn total_partitions(&self) -> Result<Vec<Partition>, AmpError>;

    /// Sum of every holder's balance in `partition`.
    fn total_supply_by_partition(&self, partition: Partition) -> Result<U256, AmpError>;

    // =========================================================================
    // ALLOWANCES
    // =========================================================================

    /// ERC-20 allowance (default partition).
    fn allowance(&self, owner: Address, spender: Address) -> Result<U256, AmpError>;

    /// Allowance within `partition`.
    fn allowance_by_partition(
        &self,
        partition: Partition,
        owner: Address,
        spender: Address,
    ) -> Result<U256, AmpError>;

    /// Set the ERC-20 allowance of `spender` over the caller's tokens.
    fn approve(&mut self, caller: Address, spender: Address, value: U256)
        -> Result<bool, AmpError>;

    /// Add to the ERC-20 allowance.
    fn increase_allowance(
        &mut self,
        caller: Address,
        spender: Address,
        added_value: U256,
    ) -> Result<bool, AmpError>;

    /// Subtract from the ERC-20 allowance. Fails rather than going below zero.
    fn decrease_allowance(
        &mut self,
        caller: Address,
        spender: Address,
        subtracted_value: U256,
    ) -> Result<bool, AmpError>;

    /// Set the allowance of `spender` within `partition`.
    fn approve_by_partition(
        &mut self,
        caller: Address,
        partition: Partition,
        spender: Address,
        value: U256,
    ) -> Result<bool, AmpError>;

    /// Add to a partition allowance.
    fn increase_allowance_by_partition(
        &mut self,
        caller: Address,
        partition: Partition,
        spender: Address,
        added_value: U256,
    ) -> Result<bool, AmpError>;

    /// Subtract from a partition allowance. Fails rather than going below zero.
    fn decrease_allowance_by_partition(
        &mut self,
        caller: Address,
        partition: Partition,
        spender: Address,
        subtracted_value: U256,
    ) -> Result<bool, AmpError>;

    // =========================================================================
    // OPERATORS
    // =========================================================================

    /// `operator == holder` or a global operator grant exists.
    fn is_operator(&self, operator: Address, holder: Address) -> Result<bool, AmpError>;

    /// Global operator, partition operator, or strategy-granted scope.
    fn is_operator_for_partition(
        &self,
        partition: Partition,
        operator: Address,
        holder: Address,
    ) -> Result<bool, AmpError>;

    /// Operator check for a registered collateral manager. Never consults
    /// strategy validators.
    fn is_operator_for_collateral_manager(
        &self,
        partition: Partition,
        operator: Address,
        collateral_manager: Address,
    ) -> Result<bool, AmpError>;

    /// Grant `operator` authority over every partition of the caller.
    fn authorize_operator(&mut self, caller: Address, operator: Address) -> Result<(), AmpError>;

    /// Revoke a global grant.
    fn revoke_operator(&mut self, caller: Address, operator: Address) -> Result<(), AmpError>;

    /// Grant `operator` authority over one partition of the caller.
    fn authorize_operator_by_partition(
        &mut self,
        caller: Address,
        partition: Partition,
        operator: Address,
    ) -> Result<(), AmpError>;

    /// Revoke a partition grant.
    fn revoke_operator_by_partition(
        &mut self,
        caller: Address,
        partition: Partition,
        operator: Address,
    ) -> Result<(), AmpError>;

    // =========================================================================
    // TRANSFERS
    // =========================================================================

    /// ERC-20 transfer of the caller's default-partition tokens.
    fn transfer(&mut self, caller: Address, to: Address, value: U256) -> Result<bool, AmpError>;

    /// ERC-20 transfer of `from`'s default-partition tokens by the caller.
    fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<bool, AmpError>;

    /// Partition-aware transfer. Returns the partition credited.
    #[allow(clippy::too_many_arguments)]
    fn transfer_by_partition(
        &mut self,
        caller: Address,
        partition: Partition,
        from: Address,
        to: Address,
        value: U256,
        data: &[u8],
        operator_data: &[u8],
    ) -> Result<Partition, AmpError>;

    /// Issue tokens into the default partition of `to`. Owner only.
    fn mint(&mut self, caller: Address, to: Address, value: U256) -> Result<(), AmpError>;

    // =========================================================================
    // COLLATERAL MANAGERS & STRATEGIES
    // =========================================================================

    /// Register the caller as a collateral manager.
    fn register_collateral_manager(&mut self, caller: Address) -> Result<(), AmpError>;

    /// Whether `address` registered as a collateral manager.
    fn is_collateral_manager(&self, address: Address) -> Result<bool, AmpError>;

    /// Registered collateral managers in registration order.
    fn collateral_managers(&self) -> Result<Vec<Address>, AmpError>;

    /// Bind a validator to `prefix`. Owner only, permanent.
    fn set_partition_strategy(
        &mut self,
        caller: Address,
        prefix: PartitionPrefix,
        implementation: Address,
    ) -> Result<(), AmpError>;

    /// Whether `prefix` has a strategy.
    fn is_partition_strategy(&self, prefix: PartitionPrefix) -> Result<bool, AmpError>;

    /// Strategy prefixes in registration order.
    fn partition_strategies(&self) -> Result<Vec<PartitionPrefix>, AmpError>;

    // =========================================================================
    // OWNERSHIP
    // =========================================================================

    /// Current owner (issuer and strategy administrator).
    fn owner(&self) -> Result<Address, AmpError>;

    /// Successor nominated by the owner, null if none.
    fn authorized_new_owner(&self) -> Result<Address, AmpError>;

    /// Nominate a successor. Owner only.
    fn authorize_ownership_transfer(
        &mut self,
        caller: Address,
        authorized_address: Address,
    ) -> Result<(), AmpError>;

    /// Take over ownership. Only the nominated successor.
    fn assume_ownership(&mut self, caller: Address) -> Result<(), AmpError>;
}
