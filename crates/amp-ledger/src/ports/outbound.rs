//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the ledger depends on. External collaborators implement them:
//! - Key-value persistence
//! - Interface directory (hook and validator discovery)
//! - Sender/recipient hooks and partition strategy validators
//! - Event publication
//!
//! Hooks receive the ledger itself as `&mut dyn AmpApi` so they can call back
//! into it. Those reentrant calls are ordinary ledger operations: they are
//! checked, journaled and rolled back like any other.

use crate::domain::entities::TransferContext;
use crate::domain::value_objects::{Address, Hash, Partition};
use crate::errors::{DirectoryError, HookError, StoreError};
use crate::events::AmpEvent;
use crate::ports::inbound::AmpApi;
use std::sync::Arc;

// =============================================================================
// KEY-VALUE STORE
// =============================================================================

/// A batch of writes: `Some(value)` stores, `None` deletes.
pub type WriteBatch = Vec<(Vec<u8>, Option<Vec<u8>>)>;

/// Abstract persistence for ledger state.
///
/// The ledger never writes individual keys: it buffers every write of an
/// operation and hands the whole set over in one `write_batch` call once the
/// operation succeeded.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    ///
    /// # Returns
    ///
    /// * `Some(bytes)` - If the key is present
    /// * `None` - If the key was never written or was deleted
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Apply a batch atomically.
    fn write_batch(&self, batch: WriteBatch) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn write_batch(&self, batch: WriteBatch) -> Result<(), StoreError> {
        (**self).write_batch(batch)
    }
}

// =============================================================================
// DIRECTORY (External Interface Registry)
// =============================================================================

/// Global interface registry.
///
/// Maps `(account, interface hash)` to the address implementing that
/// interface on the account's behalf, and resolves implementer addresses to
/// callable instances.
pub trait Directory: Send + Sync {
    /// Look up the implementer of `interface` for `account`.
    fn interface_implementer(
        &self,
        account: Address,
        interface: Hash,
    ) -> Result<Option<Address>, DirectoryError>;

    /// Record `implementer` for `(account, interface)`.
    ///
    /// Passing the null address clears the entry.
    fn set_interface_implementer(
        &self,
        account: Address,
        interface: Hash,
        implementer: Address,
    ) -> Result<(), DirectoryError>;

    /// Resolve an implementer to its sender hook.
    fn tokens_sender(
        &self,
        implementer: Address,
    ) -> Result<Option<Arc<dyn TokensSender>>, DirectoryError>;

    /// Resolve an implementer to its recipient hook.
    fn tokens_recipient(
        &self,
        implementer: Address,
    ) -> Result<Option<Arc<dyn TokensRecipient>>, DirectoryError>;

    /// Resolve an implementer to its partition strategy validator.
    fn partition_strategy_validator(
        &self,
        implementer: Address,
    ) -> Result<Option<Arc<dyn PartitionStrategyValidator>>, DirectoryError>;
}

// =============================================================================
// HOOKS
// =============================================================================

/// Called before tokens leave a holder that registered an
/// `AmpTokensSender` implementer.
pub trait TokensSender: Send + Sync {
    /// Return an error to veto the transfer.
    fn tokens_to_transfer(
        &self,
        ledger: &mut dyn AmpApi,
        ctx: &TransferContext,
    ) -> Result<(), HookError>;
}

/// Called after tokens arrive at a holder that registered an
/// `AmpTokensRecipient` implementer.
pub trait TokensRecipient: Send + Sync {
    /// Return an error to veto the transfer. Balances already reflect the
    /// transfer; a veto rolls them back.
    fn tokens_received(
        &self,
        ledger: &mut dyn AmpApi,
        ctx: &TransferContext,
    ) -> Result<(), HookError>;
}

/// Validator bound to a partition prefix by the ledger owner.
pub trait PartitionStrategyValidator: Send + Sync {
    /// Called before tokens leave a partition carrying the validator's prefix.
    fn validate_from_partition(
        &self,
        ledger: &mut dyn AmpApi,
        ctx: &TransferContext,
    ) -> Result<(), HookError>;

    /// Called after tokens arrive in a partition carrying the validator's prefix.
    fn validate_to_partition(
        &self,
        ledger: &mut dyn AmpApi,
        ctx: &TransferContext,
    ) -> Result<(), HookError>;

    /// Whether `operator` may act for `holder` within `partition`.
    ///
    /// Implementations must not call operator checks that delegate back to
    /// strategies; use `is_operator_for_collateral_manager` instead.
    fn is_operator_for_partition_scope(
        &self,
        ledger: &dyn AmpApi,
        partition: Partition,
        operator: Address,
        holder: Address,
    ) -> Result<bool, HookError>;
}

// =============================================================================
// EVENT SINK
// =============================================================================

/// Receives the events of every committed top-level operation.
pub trait EventSink: Send + Sync {
    /// Publish events in emission order.
    fn publish(&self, events: &[AmpEvent]);
}
