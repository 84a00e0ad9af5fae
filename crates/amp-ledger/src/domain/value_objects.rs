//! # Value Objects
//!
//! Immutable domain primitives for the ledger.
//! These types represent concepts that are defined by their value, not identity.

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export U256 from primitive-types for 256-bit arithmetic
pub use primitive_types::U256;

// =============================================================================
// ADDRESS (20 bytes)
// =============================================================================

/// A 20-byte account identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The null address (0x0000...0000).
    pub const ZERO: Self = Self([0u8; 20]);

    /// Creates an address from a 20-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Creates an address from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        <[u8; 20]>::try_from(slice).ok().map(Self)
    }

    /// Parses a hex string, with or without a `0x` prefix.
    #[must_use]
    pub fn from_hex(s: &str) -> Option<Self> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).ok()?;
        Self::from_slice(&bytes)
    }

    /// Address whose last 8 bytes are `n` (test and fixture helper).
    #[must_use]
    pub fn from_low_u64(n: u64) -> Self {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&n.to_be_bytes());
        Self(bytes)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns true if this is the null address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}...{}", hex::encode(&self.0[..4]), hex::encode(&self.0[18..]))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl From<Address> for [u8; 20] {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

// =============================================================================
// HASH (32 bytes)
// =============================================================================

/// A 32-byte Keccak-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// The zero hash.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Creates a hash from a 32-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}...{}", hex::encode(&self.0[..4]), hex::encode(&self.0[28..]))
    }
}

// =============================================================================
// PARTITION PREFIX (4 bytes)
// =============================================================================

/// The first four bytes of a partition; selects a partition strategy.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct PartitionPrefix(pub [u8; 4]);

impl PartitionPrefix {
    /// The reserved "unmanaged" prefix. Never carries a strategy.
    pub const ZERO: Self = Self([0u8; 4]);

    /// Creates a prefix from four bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Returns true for the unmanaged prefix.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 4]
    }
}

impl fmt::Debug for PartitionPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for PartitionPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

// =============================================================================
// PARTITION (32 bytes)
// =============================================================================

/// A 32-byte partition identifier.
///
/// Layout by convention:
///
/// | Bytes | Field |
/// |-------|-------|
/// | 0..4 | strategy prefix |
/// | 4..12 | sub-partition |
/// | 12..32 | partition owner |
///
/// Only the prefix is interpreted by the ledger itself; the remaining fields
/// belong to the strategy that owns the prefix.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Partition(pub [u8; 32]);

impl Partition {
    /// The default partition. Holds every minted token and backs the
    /// ERC-20 compatible surface.
    pub const DEFAULT: Self = Self([0u8; 32]);

    /// Creates a partition from a 32-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Creates a partition from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        <[u8; 32]>::try_from(slice).ok().map(Self)
    }

    /// Assembles a partition from its conventional parts.
    #[must_use]
    pub fn from_parts(prefix: PartitionPrefix, sub_partition: [u8; 8], owner: Address) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..4].copy_from_slice(prefix.as_bytes());
        bytes[4..12].copy_from_slice(&sub_partition);
        bytes[12..].copy_from_slice(owner.as_bytes());
        Self(bytes)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The strategy prefix (bytes 0..4).
    #[must_use]
    pub fn prefix(&self) -> PartitionPrefix {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.0[..4]);
        PartitionPrefix(bytes)
    }

    /// The strategy-defined sub-partition (bytes 4..12).
    #[must_use]
    pub fn sub_partition(&self) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.0[4..12]);
        bytes
    }

    /// The partition owner (bytes 12..32).
    #[must_use]
    pub fn owner(&self) -> Address {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&self.0[12..]);
        Address(bytes)
    }

    /// Splits the partition into prefix, sub-partition and owner.
    #[must_use]
    pub fn split(&self) -> (PartitionPrefix, [u8; 8], Address) {
        (self.prefix(), self.sub_partition(), self.owner())
    }

    /// Returns true for the default partition.
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }
}

impl fmt::Debug for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (prefix, sub, owner) = self.split();
        write!(f, "{prefix}:{}:{owner}", hex::encode(sub))
    }
}

impl From<[u8; 32]> for Partition {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

// =============================================================================
// TESTS
// =============================================================================
