//! # Event Schema
//!
//! Ledger events and the request payloads accepted by the service.
//!
//! Events are journaled together with state writes: an operation that fails
//! emits nothing, and events of a successful operation are published once,
//! in emission order, after its writes are committed.

use crate::domain::value_objects::{Address, Hash, Partition, PartitionPrefix, U256};
use serde::{Deserialize, Serialize};

// =============================================================================
// LEDGER EVENTS
// =============================================================================

/// An event emitted by a committed ledger operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmpEvent {
    /// ERC-20 compatible balance movement (`from` is null for mints).
    Transfer {
        /// Debited holder.
        from: Address,
        /// Credited holder.
        to: Address,
        /// Amount moved.
        value: U256,
    },

    /// Partition-aware movement.
    TransferByPartition {
        /// Partition debited.
        from_partition: Partition,
        /// Executing account.
        operator: Address,
        /// Debited holder.
        from: Address,
        /// Credited holder.
        to: Address,
        /// Amount moved.
        value: U256,
        /// Holder data.
        data: Vec<u8>,
        /// Operator data.
        operator_data: Vec<u8>,
    },

    /// Tokens were credited to a different partition than they left.
    ChangedPartition {
        /// Source partition.
        from_partition: Partition,
        /// Destination partition.
        to_partition: Partition,
        /// Amount moved.
        value: U256,
    },

    /// ERC-20 allowance set (default partition).
    Approval {
        /// Token holder.
        owner: Address,
        /// Allowed spender.
        spender: Address,
        /// New allowance.
        value: U256,
    },

    /// Partition allowance set.
    ApprovalByPartition {
        /// Partition of the allowance.
        partition: Partition,
        /// Token holder.
        owner: Address,
        /// Allowed spender.
        spender: Address,
        /// New allowance.
        value: U256,
    },

    /// Global operator granted.
    AuthorizedOperator {
        /// Operator.
        operator: Address,
        /// Granting holder.
        holder: Address,
    },

    /// Global operator revoked.
    RevokedOperator {
        /// Operator.
        operator: Address,
        /// Revoking holder.
        holder: Address,
    },

    /// Partition-scoped operator granted.
    AuthorizedOperatorByPartition {
        /// Partition in scope.
        partition: Partition,
        /// Operator.
        operator: Address,
        /// Granting holder.
        holder: Address,
    },

    /// Partition-scoped operator revoked.
    RevokedOperatorByPartition {
        /// Partition in scope.
        partition: Partition,
        /// Operator.
        operator: Address,
        /// Revoking holder.
        holder: Address,
    },

    /// An account registered itself as a collateral manager.
    CollateralManagerRegistered {
        /// Registered account.
        manager: Address,
    },

    /// A strategy validator was bound to a partition prefix.
    PartitionStrategySet {
        /// Managed prefix.
        prefix: PartitionPrefix,
        /// Directory key the validator is registered under.
        interface: Hash,
        /// Validator implementer.
        implementation: Address,
    },

    /// Tokens were issued.
    Minted {
        /// Issuing account.
        operator: Address,
        /// Recipient.
        to: Address,
        /// Amount issued.
        value: U256,
    },

    /// The owner nominated a successor.
    OwnershipTransferAuthorization {
        /// Nominated successor.
        authorized_address: Address,
    },

    /// Ownership changed hands.
    OwnerUpdate {
        /// Previous owner.
        old_value: Address,
        /// New owner.
        new_value: Address,
    },
}

impl AmpEvent {
    /// Short event name used as log message and topic.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Transfer { .. } => topics::TRANSFER,
            Self::TransferByPartition { .. } => topics::TRANSFER_BY_PARTITION,
            Self::ChangedPartition { .. } => topics::CHANGED_PARTITION,
            Self::Approval { .. } => topics::APPROVAL,
            Self::ApprovalByPartition { .. } => topics::APPROVAL_BY_PARTITION,
            Self::AuthorizedOperator { .. } => topics::AUTHORIZED_OPERATOR,
            Self::RevokedOperator { .. } => topics::REVOKED_OPERATOR,
            Self::AuthorizedOperatorByPartition { .. } => topics::AUTHORIZED_OPERATOR_BY_PARTITION,
            Self::RevokedOperatorByPartition { .. } => topics::REVOKED_OPERATOR_BY_PARTITION,
            Self::CollateralManagerRegistered { .. } => topics::COLLATERAL_MANAGER_REGISTERED,
            Self::PartitionStrategySet { .. } => topics::PARTITION_STRATEGY_SET,
            Self::Minted { .. } => topics::MINTED,
            Self::OwnershipTransferAuthorization { .. } => {
                topics::OWNERSHIP_TRANSFER_AUTHORIZATION
            }
            Self::OwnerUpdate { .. } => topics::OWNER_UPDATE,
        }
    }
}

/// Event topic names.
pub mod topics {
    /// ERC-20 transfer.
    pub const TRANSFER: &str = "Transfer";
    /// Partition transfer.
    pub const TRANSFER_BY_PARTITION: &str = "TransferByPartition";
    /// Partition change.
    pub const CHANGED_PARTITION: &str = "ChangedPartition";
    /// ERC-20 approval.
    pub const APPROVAL: &str = "Approval";
    /// Partition approval.
    pub const APPROVAL_BY_PARTITION: &str = "ApprovalByPartition";
    /// Operator granted.
    pub const AUTHORIZED_OPERATOR: &str = "AuthorizedOperator";
    /// Operator revoked.
    pub const REVOKED_OPERATOR: &str = "RevokedOperator";
    /// Partition operator granted.
    pub const AUTHORIZED_OPERATOR_BY_PARTITION: &str = "AuthorizedOperatorByPartition";
    /// Partition operator revoked.
    pub const REVOKED_OPERATOR_BY_PARTITION: &str = "RevokedOperatorByPartition";
    /// Collateral manager registration.
    pub const COLLATERAL_MANAGER_REGISTERED: &str = "CollateralManagerRegistered";
    /// Strategy registration.
    pub const PARTITION_STRATEGY_SET: &str = "PartitionStrategySet";
    /// Issuance.
    pub const MINTED: &str = "Minted";
    /// Ownership nomination.
    pub const OWNERSHIP_TRANSFER_AUTHORIZATION: &str = "OwnershipTransferAuthorization";
    /// Ownership change.
    pub const OWNER_UPDATE: &str = "OwnerUpdate";
}

// =============================================================================
// REQUEST PAYLOADS (Service Inbound)
// =============================================================================

/// ERC-20 style transfer of the caller's own default-partition tokens.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransferRequestPayload {
    /// Authenticated caller.
    pub caller: Address,
    /// Recipient.
    pub to: Address,
    /// Amount.
    pub value: U256,
}

/// Partition-aware transfer request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransferByPartitionRequestPayload {
    /// Authenticated caller (operator).
    pub caller: Address,
    /// Partition debited.
    pub partition: Partition,
    /// Holder debited.
    pub from: Address,
    /// Recipient.
    pub to: Address,
    /// Amount.
    pub value: U256,
    /// Holder data (may carry a partition change request).
    pub data: Vec<u8>,
    /// Operator data.
    pub operator_data: Vec<u8>,
}

/// Issuance request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MintRequestPayload {
    /// Authenticated caller (must be the issuer).
    pub caller: Address,
    /// Recipient.
    pub to: Address,
    /// Amount.
    pub value: U256,
}

/// Response of a partition-aware transfer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransferByPartitionResponsePayload {
    /// Partition the tokens were credited to.
    pub to_partition: Partition,
}

// =============================================================================
// TESTS
// =============================================================================
