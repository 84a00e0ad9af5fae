//! # Interface Directory
//!
//! In-memory `Directory`: interface registrations keyed by
//! `(account, interface hash)`, plus the hook instances reachable at each
//! implementer address.
//!
//! Registering an instance does not register an interface. Accounts opt in
//! through `set_interface_implementer`, the way they would with the global
//! registry.

use crate::domain::value_objects::{Address, Hash};
use crate::errors::DirectoryError;
use crate::ports::outbound::{
    Directory, PartitionStrategyValidator, TokensRecipient, TokensSender,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Callable instances deployed at implementer addresses.
#[derive(Default)]
struct Instances {
    senders: HashMap<Address, Arc<dyn TokensSender>>,
    recipients: HashMap<Address, Arc<dyn TokensRecipient>>,
    validators: HashMap<Address, Arc<dyn PartitionStrategyValidator>>,
}

/// In-memory interface directory.
#[derive(Default)]
pub struct InMemoryDirectory {
    implementers: RwLock<HashMap<(Address, Hash), Address>>,
    instances: RwLock<Instances>,
}

impl fmt::Debug for InMemoryDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryDirectory")
            .field("registrations", &self.registration_count())
            .finish_non_exhaustive()
    }
}

impl InMemoryDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of interface registrations. Zero if the lock is poisoned.
    pub fn registration_count(&self) -> usize {
        self.implementers.read().map(|map| map.len()).unwrap_or(0)
    }

    /// Deploy a sender hook at `implementer`.
    pub fn register_sender(&self, implementer: Address, hook: Arc<dyn TokensSender>) {
        if let Ok(mut instances) = self.instances.write() {
            instances.senders.insert(implementer, hook);
        }
    }

    /// Deploy a recipient hook at `implementer`.
    pub fn register_recipient(&self, implementer: Address, hook: Arc<dyn TokensRecipient>) {
        if let Ok(mut instances) = self.instances.write() {
            instances.recipients.insert(implementer, hook);
        }
    }

    /// Deploy a strategy validator at `implementer`.
    pub fn register_validator(
        &self,
        implementer: Address,
        validator: Arc<dyn PartitionStrategyValidator>,
    ) {
        if let Ok(mut instances) = self.instances.write() {
            instances.validators.insert(implementer, validator);
        }
    }
}

impl Directory for InMemoryDirectory {
    fn interface_implementer(
        &self,
        account: Address,
        interface: Hash,
    ) -> Result<Option<Address>, DirectoryError> {
        let implementers = self
            .implementers
            .read()
            .map_err(|_| DirectoryError::LockPoisoned)?;
        Ok(implementers.get(&(account, interface)).copied())
    }

    fn set_interface_implementer(
        &self,
        account: Address,
        interface: Hash,
        implementer: Address,
    ) -> Result<(), DirectoryError> {
        let mut implementers = self
            .implementers
            .write()
            .map_err(|_| DirectoryError::LockPoisoned)?;
        if implementer.is_zero() {
            implementers.remove(&(account, interface));
        } else {
            implementers.insert((account, interface), implementer);
        }
        Ok(())
    }

    fn tokens_sender(
        &self,
        implementer: Address,
    ) -> Result<Option<Arc<dyn TokensSender>>, DirectoryError> {
        let instances = self
            .instances
            .read()
            .map_err(|_| DirectoryError::LockPoisoned)?;
        Ok(instances.senders.get(&implementer).cloned())
    }

    fn tokens_recipient(
        &self,
        implementer: Address,
    ) -> Result<Option<Arc<dyn TokensRecipient>>, DirectoryError> {
        let instances = self
            .instances
            .read()
            .map_err(|_| DirectoryError::LockPoisoned)?;
        Ok(instances.recipients.get(&implementer).cloned())
    }

    fn partition_strategy_validator(
        &self,
        implementer: Address,
    ) -> Result<Option<Arc<dyn PartitionStrategyValidator>>, DirectoryError> {
        let instances = self
            .instances
            .read()
            .map_err(|_| DirectoryError::LockPoisoned)?;
        Ok(instances.validators.get(&implementer).cloned())
    }
}
