//! # Domain Services
//!
//! Pure functions used by the transfer protocol and the directory lookups.
//! Deterministic, no I/O, no ledger access.

use crate::domain::value_objects::{Hash, Partition, PartitionPrefix};
use sha3::{Digest, Keccak256};

// =============================================================================
// INTERFACE LABELS
// =============================================================================

/// Directory labels used for hook and strategy discovery.
pub mod labels {
    /// Implemented by an account that wants to be called before it sends.
    pub const AMP_TOKENS_SENDER: &str = "AmpTokensSender";

    /// Implemented by an account that wants to be called after it receives.
    pub const AMP_TOKENS_RECIPIENT: &str = "AmpTokensRecipient";

    /// Registered by the ledger for its own account.
    pub const AMP_TOKEN: &str = "AmpToken";

    /// ERC-20 compatibility label, registered by the ledger for its own account.
    pub const ERC20_TOKEN: &str = "ERC20Token";

    /// Prefix of the per-prefix strategy validator label.
    pub const PARTITION_STRATEGY_VALIDATOR: &str = "AmpPartitionStrategyValidator";
}

/// Keccak-256 of arbitrary bytes.
#[must_use]
pub fn keccak256(data: &[u8]) -> Hash {
    let digest = Keccak256::digest(data);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    Hash::new(bytes)
}

/// Directory key for a textual interface label.
#[must_use]
pub fn interface_hash(label: &str) -> Hash {
    keccak256(label.as_bytes())
}

/// Raw label under which the validator for `prefix` is registered:
/// `"AmpPartitionStrategyValidator"` followed by the four prefix bytes.
#[must_use]
pub fn strategy_validator_label(prefix: PartitionPrefix) -> Vec<u8> {
    let mut label = labels::PARTITION_STRATEGY_VALIDATOR.as_bytes().to_vec();
    label.extend_from_slice(prefix.as_bytes());
    label
}

/// Directory key of the validator for `prefix`.
#[must_use]
pub fn strategy_validator_interface(prefix: PartitionPrefix) -> Hash {
    keccak256(&strategy_validator_label(prefix))
}

// =============================================================================
// PARTITION CHANGE
// =============================================================================

/// Flag word that marks `data` as carrying a destination partition.
pub const CHANGE_PARTITION_FLAG: [u8; 32] = [0xcc; 32];

/// Resolves the destination partition of a transfer.
///
/// When `data` holds at least 64 bytes and starts with
/// [`CHANGE_PARTITION_FLAG`], bytes 32..64 name the destination. Anything
/// else keeps the tokens in `from_partition`.
#[must_use]
pub fn destination_partition(data: &[u8], from_partition: Partition) -> Partition {
    if data.len() < 64 || data[..32] != CHANGE_PARTITION_FLAG {
        return from_partition;
    }
    Partition::from_slice(&data[32..64]).unwrap_or(from_partition)
}

/// Builds transfer data requesting a move into `to_partition`.
#[must_use]
pub fn change_partition_data(to_partition: Partition) -> Vec<u8> {
    let mut data = Vec::with_capacity(64);
    data.extend_from_slice(&CHANGE_PARTITION_FLAG);
    data.extend_from_slice(to_partition.as_bytes());
    data
}

// =============================================================================
// TESTS
// =============================================================================
