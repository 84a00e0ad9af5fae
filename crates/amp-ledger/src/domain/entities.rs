//! # Core Domain Entities
//!
//! The context handed to hooks and the classification of hook call sites.

use crate::domain::value_objects::{Address, Partition, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// TRANSFER KIND
// =============================================================================

/// The public operation a transfer originated from.
///
/// Hooks receive it so they can tell an ERC-20 `transfer` apart from a
/// partition-aware transfer or a mint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferKind {
    /// ERC-20 `transfer` (caller moves its own default-partition tokens).
    Transfer,
    /// ERC-20 `transferFrom` (caller moves someone else's default-partition tokens).
    TransferFrom,
    /// Partition-aware transfer.
    TransferByPartition,
    /// Issuance into the default partition.
    Mint,
}

impl TransferKind {
    /// Metric/log label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::TransferFrom => "transfer_from",
            Self::TransferByPartition => "by_partition",
            Self::Mint => "mint",
        }
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// TRANSFER CONTEXT
// =============================================================================

/// Everything an external hook learns about a transfer.
///
/// `from` is the null address for mints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferContext {
    /// Originating operation.
    pub kind: TransferKind,
    /// Partition the tokens leave.
    pub from_partition: Partition,
    /// Partition the tokens arrive in.
    pub to_partition: Partition,
    /// Account executing the transfer.
    pub operator: Address,
    /// Token holder being debited.
    pub from: Address,
    /// Token holder being credited.
    pub to: Address,
    /// Amount moved.
    pub value: U256,
    /// Holder-supplied data (may carry a partition change request).
    pub data: Vec<u8>,
    /// Operator-supplied data.
    pub operator_data: Vec<u8>,
}

impl TransferContext {
    /// Returns true if the transfer moves tokens between partitions.
    #[must_use]
    pub fn changes_partition(&self) -> bool {
        self.from_partition != self.to_partition
    }

    /// Returns true if this context describes a mint.
    #[must_use]
    pub fn is_mint(&self) -> bool {
        self.kind == TransferKind::Mint
    }
}

// =============================================================================
// HOOK KIND
// =============================================================================

/// External call sites of the transfer protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookKind {
    /// `AmpTokensSender` implementer of the holder being debited.
    Sender,
    /// `AmpTokensRecipient` implementer of the holder being credited.
    Recipient,
    /// Strategy validator of the source partition prefix.
    FromPartition,
    /// Strategy validator of the destination partition prefix.
    ToPartition,
    /// Strategy validator answering an operator-scope query.
    OperatorScope,
}

impl HookKind {
    /// Metric/log label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sender => "sender",
            Self::Recipient => "recipient",
            Self::FromPartition => "from_partition",
            Self::ToPartition => "to_partition",
            Self::OperatorScope => "operator_scope",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// TESTS
// =============================================================================
