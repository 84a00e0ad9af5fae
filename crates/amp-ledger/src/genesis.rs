//! # Genesis
//!
//! Creates a ledger exactly once over an empty store, or reopens one that
//! genesis already ran against.
//!
//! ## Initialization Sequence
//!
//! 1. Validate token and genesis configuration
//! 2. Refuse a store that is already initialized
//! 3. Record the owner and register the default partition as active
//! 4. Register the ledger's own interfaces (`AmpToken`, `ERC20Token`)
//! 5. Mint the initial allocations into the default partition
//!
//! Steps 3-5 run as one transaction: a failing allocation leaves the store
//! untouched.

use crate::config::AmpConfig;
use crate::domain::services::{interface_hash, labels};
use crate::domain::value_objects::{Address, Partition, U256};
use crate::errors::AmpError;
use crate::events::AmpEvent;
use crate::ledger::{Amp, LedgerKey, SetId};
use crate::ports::outbound::{Directory, EventSink, KeyValueStore};
use amp_telemetry::{component_span, log_event};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Genesis errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenesisError {
    /// Genesis already ran against this store.
    #[error("ledger already initialized")]
    AlreadyInitialized,

    /// The store was never initialized.
    #[error("ledger not initialized")]
    NotInitialized,

    /// Invalid genesis configuration.
    #[error("invalid genesis configuration: {0}")]
    InvalidConfig(String),

    /// A genesis step failed.
    #[error("genesis failed: {0}")]
    Ledger(#[from] AmpError),
}

/// Initial ownership and allocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisConfig {
    /// Initial owner (issuer and strategy administrator).
    pub owner: Address,

    /// Tokens minted into the default partition at genesis.
    pub allocations: Vec<(Address, U256)>,
}

impl GenesisConfig {
    /// Genesis with an owner and no allocations.
    #[must_use]
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            allocations: Vec::new(),
        }
    }

    /// Add an allocation.
    #[must_use]
    pub fn with_allocation(mut self, holder: Address, value: U256) -> Self {
        self.allocations.push((holder, value));
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), GenesisError> {
        if self.owner.is_zero() {
            return Err(GenesisError::InvalidConfig(
                "owner must not be the null address".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(self.allocations.len());
        for (holder, _) in &self.allocations {
            if holder.is_zero() {
                return Err(GenesisError::InvalidConfig(
                    "allocation to the null address".to_string(),
                ));
            }
            if !seen.insert(*holder) {
                return Err(GenesisError::InvalidConfig(format!(
                    "duplicate allocation for {holder:?}"
                )));
            }
        }
        Ok(())
    }

    /// Sum of all allocations.
    pub fn total_allocation(&self) -> Result<U256, GenesisError> {
        self.allocations
            .iter()
            .try_fold(U256::zero(), |acc, (_, value)| acc.checked_add(*value))
            .ok_or(GenesisError::Ledger(AmpError::ArithmeticOverflow))
    }
}

/// Ledger factory.
#[derive(Debug, Clone)]
pub struct Genesis {
    config: AmpConfig,
    genesis: GenesisConfig,
}

impl Genesis {
    /// Prepare genesis.
    #[must_use]
    pub fn new(config: AmpConfig, genesis: GenesisConfig) -> Self {
        Self { config, genesis }
    }

    /// Initialize a ledger over an empty store.
    pub fn build<S: KeyValueStore>(
        self,
        store: S,
        directory: Arc<dyn Directory>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Amp<S>, GenesisError> {
        self.config
            .validate()
            .map_err(|e| GenesisError::InvalidConfig(e.to_string()))?;
        self.genesis.validate()?;
        let total = self.genesis.total_allocation()?;

        let mut amp = Amp::new(self.config, store, directory, sink);
        if amp.is_initialized()? {
            return Err(GenesisError::AlreadyInitialized);
        }

        let owner = self.genesis.owner;
        let allocations = self.genesis.allocations;
        let _span = component_span!("genesis", owner = %owner).entered();
        amp.transact(|amp| {
            amp.state.put_flag(&LedgerKey::Initialized, true)?;
            amp.state.put_address(&LedgerKey::Owner, owner)?;
            amp.state
                .set_insert(SetId::TotalPartitions, Partition::DEFAULT.as_bytes())?;

            let token = amp.config().token_address;
            amp.register_interface(token, interface_hash(labels::AMP_TOKEN), token);
            amp.register_interface(token, interface_hash(labels::ERC20_TOKEN), token);
            amp.emit(AmpEvent::OwnerUpdate {
                old_value: Address::ZERO,
                new_value: owner,
            });

            for (holder, value) in &allocations {
                amp.execute_mint(owner, *holder, *value)?;
            }
            Ok(())
        })?;

        log_event!(
            info,
            "genesis",
            "Ledger initialized",
            owner = %owner,
            allocations = allocations.len(),
            total_supply = %total
        );
        Ok(amp)
    }

    /// Reopen a ledger whose store genesis already ran against.
    pub fn open<S: KeyValueStore>(
        config: AmpConfig,
        store: S,
        directory: Arc<dyn Directory>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Amp<S>, GenesisError> {
        config
            .validate()
            .map_err(|e| GenesisError::InvalidConfig(e.to_string()))?;

        let amp = Amp::new(config, store, directory, sink);
        if !amp.is_initialized()? {
            return Err(GenesisError::NotInitialized);
        }
        Ok(amp)
    }
}

// =============================================================================
// TESTS
// =============================================================================
