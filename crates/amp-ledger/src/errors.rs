//! # Error Types
//!
//! All error types for the ledger, its hooks and its storage.
//!
//! Every `AmpError` aborts the operation that raised it and leaves ledger
//! state exactly as it was before the call.

use crate::domain::entities::HookKind;
use crate::domain::value_objects::{Address, PartitionPrefix, U256};
use thiserror::Error;

// =============================================================================
// LEDGER ERRORS
// =============================================================================

/// Errors returned by ledger operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmpError {
    /// Tokens cannot be sent to the null address.
    #[error("invalid receiver: null address")]
    InvalidReceiver,

    /// The acting holder is the null address.
    #[error("invalid sender: null address")]
    InvalidSender,

    /// Partition balance too low.
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: U256, available: U256 },

    /// Caller is neither an operator nor covered by an allowance.
    #[error("insufficient allowance: required {required}, available {available}")]
    InsufficientAllowance { required: U256, available: U256 },

    /// Null operator/spender, or a holder naming itself as operator.
    #[error("invalid operator")]
    InvalidOperator,

    /// Address already registered as a collateral manager.
    #[error("address conflict: {0:?} is already a collateral manager")]
    AddressConflict(Address),

    /// Destination prefix has no strategy and is not the unmanaged prefix.
    #[error("partition reserved: prefix {0} has no registered strategy")]
    PartitionReserved(PartitionPrefix),

    /// A strategy already exists for the prefix.
    #[error("partition prefix conflict: {0} already has a strategy")]
    PartitionPrefixConflict(PartitionPrefix),

    /// The unmanaged prefix can never carry a strategy.
    #[error("invalid partition prefix: {0} is reserved")]
    InvalidPartitionPrefix(PartitionPrefix),

    /// An external hook or strategy validator vetoed the operation.
    #[error("{hook} hook rejected: {reason}")]
    HookRejected { hook: HookKind, reason: String },

    /// Caller lacks the owner/issuer role.
    #[error("unauthorized: {0:?} may not perform this operation")]
    Unauthorized(Address),

    /// A checked 256-bit addition overflowed.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    /// Backing store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Directory failure.
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),
}

impl AmpError {
    /// Stable short code for logs and metrics.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InsufficientBalance { .. } => "EC_52",
            Self::InsufficientAllowance { .. } => "EC_53",
            Self::InvalidSender => "EC_56",
            Self::InvalidReceiver => "EC_57",
            Self::InvalidOperator => "EC_58",
            Self::HookRejected { .. } => "EC_59",
            Self::Unauthorized(_) => "EC_5A",
            Self::AddressConflict(_) => "EC_5C",
            Self::PartitionReserved(_) => "EC_5D",
            Self::PartitionPrefixConflict(_) => "EC_5E",
            Self::InvalidPartitionPrefix(_) => "EC_5F",
            Self::ArithmeticOverflow => "EC_60",
            Self::Store(_) => "EC_70",
            Self::Directory(_) => "EC_71",
        }
    }

    /// Returns true if the error came from external hook logic.
    #[must_use]
    pub fn is_hook_rejection(&self) -> bool {
        matches!(self, Self::HookRejected { .. })
    }
}

// =============================================================================
// HOOK ERRORS
// =============================================================================

/// Errors returned by hook and strategy validator implementations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HookError {
    /// The hook refused the transfer.
    #[error("{0}")]
    Rejected(String),

    /// A reentrant ledger call made by the hook failed.
    #[error("reentrant call failed: {0}")]
    Ledger(#[from] AmpError),
}

impl HookError {
    /// Convenience constructor for a plain veto.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }

    /// Attributes the failure to a call site.
    #[must_use]
    pub fn into_ledger_error(self, hook: HookKind) -> AmpError {
        AmpError::HookRejected {
            hook,
            reason: self.to_string(),
        }
    }
}

// =============================================================================
// STORE ERRORS
// =============================================================================

/// Errors from the key-value store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A lock guarding the store was poisoned.
    #[error("store lock poisoned")]
    LockPoisoned,

    /// A key or value could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The stored bytes do not have the expected shape.
    #[error("corrupted value for key {0}")]
    Corrupted(String),

    /// Backend-specific failure.
    #[error("backend error: {0}")]
    Backend(String),
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

// =============================================================================
// DIRECTORY ERRORS
// =============================================================================

/// Errors from the interface directory.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// A lock guarding the directory was poisoned.
    #[error("directory lock poisoned")]
    LockPoisoned,

    /// Directory backend failure.
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// SERVICE ERRORS
// =============================================================================

/// Errors from the async service wrapper.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The ledger lock was not acquired in time.
    #[error("{operation}: ledger busy for more than {timeout_ms} ms")]
    LockTimeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    /// The ledger rejected the operation.
    #[error(transparent)]
    Ledger(#[from] AmpError),
}

impl ServiceError {
    /// Stable short code for logs and metrics.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::LockTimeout { .. } => "EC_80",
            Self::Ledger(err) => err.code(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
