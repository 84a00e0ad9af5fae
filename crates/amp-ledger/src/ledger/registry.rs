//! # Partition Strategy Registry
//!
//! Append-only registries of collateral managers and strategy prefixes.
//!
//! A strategy's implementer lives in the directory under the ledger's own
//! account and the prefix-specific validator label. Membership in the prefix
//! set gates every lookup, so a directory entry without membership is inert.

use super::{Amp, SetId};
use crate::domain::entities::HookKind;
use crate::domain::services::strategy_validator_interface;
use crate::domain::value_objects::{Address, PartitionPrefix};
use crate::errors::AmpError;
use crate::events::AmpEvent;
use crate::ports::inbound::AmpApi;
use crate::ports::outbound::{KeyValueStore, PartitionStrategyValidator};
use amp_telemetry::log_event;
use std::sync::Arc;

impl<S: KeyValueStore> Amp<S> {
    pub(crate) fn add_collateral_manager(&mut self, caller: Address) -> Result<(), AmpError> {
        if caller.is_zero() {
            return Err(AmpError::InvalidSender);
        }
        if !self
            .state
            .set_insert(SetId::CollateralManagers, caller.as_bytes())?
        {
            return Err(AmpError::AddressConflict(caller));
        }

        self.emit(AmpEvent::CollateralManagerRegistered { manager: caller });
        log_event!(info, "registry", "Collateral manager registered", manager = %caller);
        Ok(())
    }

    pub(crate) fn add_partition_strategy(
        &mut self,
        caller: Address,
        prefix: PartitionPrefix,
        implementation: Address,
    ) -> Result<(), AmpError> {
        self.require_owner(caller)?;
        if prefix.is_zero() {
            return Err(AmpError::InvalidPartitionPrefix(prefix));
        }
        if self.is_partition_strategy(prefix)? {
            return Err(AmpError::PartitionPrefixConflict(prefix));
        }

        let interface = strategy_validator_interface(prefix);
        self.register_interface(self.address(), interface, implementation);
        self.state
            .set_insert(SetId::PartitionStrategies, prefix.as_bytes())?;

        self.emit(AmpEvent::PartitionStrategySet {
            prefix,
            interface,
            implementation,
        });
        log_event!(
            info,
            "registry",
            "Partition strategy set",
            %prefix,
            implementation = %implementation
        );
        Ok(())
    }

    /// Validator responsible for `prefix`.
    ///
    /// `None` when the prefix has no strategy, or its registered implementer
    /// is null or absent from the directory. An implementer the directory
    /// cannot resolve to an instance is reported as a rejection by `hook`.
    pub(crate) fn strategy_validator(
        &self,
        prefix: PartitionPrefix,
        hook: HookKind,
    ) -> Result<Option<(Address, Arc<dyn PartitionStrategyValidator>)>, AmpError> {
        if prefix.is_zero() || !self.is_partition_strategy(prefix)? {
            return Ok(None);
        }

        let interface = strategy_validator_interface(prefix);
        let Some(implementer) = self.implementer_of(self.address(), interface)? else {
            return Ok(None);
        };

        match self.directory.partition_strategy_validator(implementer)? {
            Some(validator) => Ok(Some((implementer, validator))),
            None => Err(self.unresolved_implementer(hook, implementer)),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
