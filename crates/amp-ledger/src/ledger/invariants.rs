//! # Ledger Invariants
//!
//! Consistency checks over the nested counters:
//!
//! | Invariant | Check |
//! |-----------|-------|
//! | Holder balance | `balance_of(h) == Σ balance_of_by_partition(p, h)` over `partitions_of(h)` |
//! | Holder partitions | every listed partition has a non-zero balance, no duplicates |
//! | Partition supply | `total_supply_by_partition(p) == Σ balance_of_by_partition(p, h)` |
//! | Total supply | `total_supply() == Σ total_supply_by_partition(p)` over `total_partitions()` |
//!
//! The store cannot enumerate holders, so the partition supply check relies
//! on the caller passing every holder of the ledger.

use crate::domain::value_objects::{Address, Partition, U256};
use crate::errors::AmpError;
use crate::ports::inbound::AmpApi;
use std::collections::HashSet;
use std::fmt;

// =============================================================================
// INVARIANT CHECKS
// =============================================================================

/// Aggregate balance equals the sum of the holder's partition balances.
pub fn check_holder_balance_invariant(
    ledger: &dyn AmpApi,
    holder: Address,
) -> Result<Option<InvariantViolation>, AmpError> {
    let total = ledger.balance_of(holder)?;
    let mut sum = U256::zero();
    for partition in ledger.partitions_of(holder)? {
        sum = sum
            .checked_add(ledger.balance_of_by_partition(partition, holder)?)
            .ok_or(AmpError::ArithmeticOverflow)?;
    }

    Ok((total != sum).then_some(InvariantViolation::HolderBalanceMismatch {
        holder,
        total,
        sum,
    }))
}

/// The holder's partition set lists exactly the partitions it holds tokens in.
pub fn check_holder_partitions_invariant(
    ledger: &dyn AmpApi,
    holder: Address,
) -> Result<Option<InvariantViolation>, AmpError> {
    let partitions = ledger.partitions_of(holder)?;
    let mut seen = HashSet::with_capacity(partitions.len());

    for partition in partitions {
        if !seen.insert(partition) {
            return Ok(Some(InvariantViolation::DuplicatePartition { holder, partition }));
        }
        if ledger.balance_of_by_partition(partition, holder)?.is_zero() {
            return Ok(Some(InvariantViolation::EmptyPartitionListed { holder, partition }));
        }
    }
    Ok(None)
}

/// Partition supply equals the sum of `holders`' balances in it.
pub fn check_partition_supply_invariant(
    ledger: &dyn AmpApi,
    partition: Partition,
    holders: &[Address],
) -> Result<Option<InvariantViolation>, AmpError> {
    let supply = ledger.total_supply_by_partition(partition)?;
    let mut sum = U256::zero();
    for holder in holders {
        sum = sum
            .checked_add(ledger.balance_of_by_partition(partition, *holder)?)
            .ok_or(AmpError::ArithmeticOverflow)?;
    }

    Ok((supply != sum).then_some(InvariantViolation::PartitionSupplyMismatch {
        partition,
        supply,
        sum,
    }))
}

/// Total supply equals the sum of active partition supplies, and only
/// partitions with supply (or the default partition) are active.
pub fn check_total_supply_invariant(
    ledger: &dyn AmpApi,
) -> Result<Option<InvariantViolation>, AmpError> {
    let total = ledger.total_supply()?;
    let mut sum = U256::zero();
    for partition in ledger.total_partitions()? {
        let supply = ledger.total_supply_by_partition(partition)?;
        if supply.is_zero() && !partition.is_default() {
            return Ok(Some(InvariantViolation::InactivePartitionListed { partition }));
        }
        sum = sum.checked_add(supply).ok_or(AmpError::ArithmeticOverflow)?;
    }

    Ok((total != sum).then_some(InvariantViolation::TotalSupplyMismatch { total, sum }))
}

/// Run every check for the given holders.
pub fn check_all_invariants(
    ledger: &dyn AmpApi,
    holders: &[Address],
) -> Result<InvariantCheckResult, AmpError> {
    let mut violations = Vec::new();

    for holder in holders {
        violations.extend(check_holder_balance_invariant(ledger, *holder)?);
        violations.extend(check_holder_partitions_invariant(ledger, *holder)?);
    }
    for partition in ledger.total_partitions()? {
        violations.extend(check_partition_supply_invariant(ledger, partition, holders)?);
    }
    violations.extend(check_total_supply_invariant(ledger)?);

    if violations.is_empty() {
        Ok(InvariantCheckResult::Valid)
    } else {
        Ok(InvariantCheckResult::Invalid(violations))
    }
}

// =============================================================================
// INVARIANT TYPES
// =============================================================================

/// Result of checking all invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantCheckResult {
    /// All invariants hold.
    Valid,
    /// One or more invariants violated.
    Invalid(Vec<InvariantViolation>),
}

impl InvariantCheckResult {
    /// Returns true if all invariants hold.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Specific invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Aggregate balance differs from the sum of partition balances.
    HolderBalanceMismatch {
        holder: Address,
        total: U256,
        sum: U256,
    },
    /// A partition appears twice in a holder's set.
    DuplicatePartition {
        holder: Address,
        partition: Partition,
    },
    /// A holder's set lists a partition with zero balance.
    EmptyPartitionListed {
        holder: Address,
        partition: Partition,
    },
    /// Partition supply differs from the sum of holder balances.
    PartitionSupplyMismatch {
        partition: Partition,
        supply: U256,
        sum: U256,
    },
    /// A non-default partition without supply is still active.
    InactivePartitionListed { partition: Partition },
    /// Total supply differs from the sum of partition supplies.
    TotalSupplyMismatch { total: U256, sum: U256 },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HolderBalanceMismatch { holder, total, sum } => {
                write!(f, "holder {holder}: balance {total} != partition sum {sum}")
            }
            Self::DuplicatePartition { holder, partition } => {
                write!(f, "holder {holder}: partition {partition} listed twice")
            }
            Self::EmptyPartitionListed { holder, partition } => {
                write!(f, "holder {holder}: empty partition {partition} listed")
            }
            Self::PartitionSupplyMismatch {
                partition,
                supply,
                sum,
            } => {
                write!(f, "partition {partition}: supply {supply} != holder sum {sum}")
            }
            Self::InactivePartitionListed { partition } => {
                write!(f, "partition {partition} has no supply but is active")
            }
            Self::TotalSupplyMismatch { total, sum } => {
                write!(f, "total supply {total} != partition sum {sum}")
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
