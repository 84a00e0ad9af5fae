//! Fixtures and scripted hooks for the ledger unit tests.

use crate::adapters::{InMemoryDirectory, InMemoryEventLog, InMemoryStore};
use crate::config::AmpConfig;
use crate::domain::entities::{HookKind, TransferContext};
use crate::domain::value_objects::{Address, Partition, PartitionPrefix, U256};
use crate::errors::{HookError, StoreError};
use crate::genesis::{Genesis, GenesisConfig};
use crate::ledger::Amp;
use crate::ports::inbound::AmpApi;
use crate::ports::outbound::{
    KeyValueStore, PartitionStrategyValidator, TokensRecipient, TokensSender, WriteBatch,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const OWNER: Address = Address::new([0x0a; 20]);

pub fn addr(n: u64) -> Address {
    Address::from_low_u64(n)
}

/// Ledger owned by [`OWNER`] with the given default-partition balances.
pub fn funded(
    allocations: &[(Address, u64)],
) -> (
    Amp<InMemoryStore>,
    Arc<InMemoryDirectory>,
    Arc<InMemoryEventLog>,
) {
    amp_telemetry::init_test_tracing();
    let directory = Arc::new(InMemoryDirectory::new());
    let log = Arc::new(InMemoryEventLog::new());
    let genesis = allocations
        .iter()
        .fold(GenesisConfig::new(OWNER), |config, (holder, value)| {
            config.with_allocation(*holder, U256::from(*value))
        });

    let amp = Genesis::new(AmpConfig::default(), genesis)
        .build(InMemoryStore::new(), directory.clone(), log.clone())
        .unwrap();
    (amp, directory, log)
}

pub fn ledger() -> Amp<InMemoryStore> {
    funded(&[]).0
}

/// Committed store contents.
pub fn snapshot(amp: &Amp<InMemoryStore>) -> BTreeMap<Vec<u8>, Vec<u8>> {
    amp.store().snapshot()
}

/// Memory store whose batch writes can be switched off.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: InMemoryStore,
    down: AtomicBool,
}

impl FlakyStore {
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        self.inner.snapshot()
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get(key)
    }

    fn write_batch(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("down".to_string()));
        }
        self.inner.write_batch(batch)
    }
}

/// Empty ledger over a [`FlakyStore`].
pub fn flaky() -> (
    Amp<FlakyStore>,
    Arc<InMemoryDirectory>,
    Arc<InMemoryEventLog>,
) {
    amp_telemetry::init_test_tracing();
    let directory = Arc::new(InMemoryDirectory::new());
    let log = Arc::new(InMemoryEventLog::new());
    let amp = Genesis::new(AmpConfig::default(), GenesisConfig::new(OWNER))
        .build(FlakyStore::default(), directory.clone(), log.clone())
        .unwrap();
    (amp, directory, log)
}

pub fn strategy_partition(prefix: PartitionPrefix, owner: Address) -> Partition {
    Partition::from_parts(prefix, [0u8; 8], owner)
}

// =============================================================================
// SCRIPTED HOOKS
// =============================================================================

/// Rejects every call.
pub struct Veto {
    reason: String,
}

impl Veto {
    pub fn always(reason: &str) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

impl TokensSender for Veto {
    fn tokens_to_transfer(&self, _: &mut dyn AmpApi, _: &TransferContext) -> Result<(), HookError> {
        Err(HookError::rejected(self.reason.clone()))
    }
}

impl TokensRecipient for Veto {
    fn tokens_received(&self, _: &mut dyn AmpApi, _: &TransferContext) -> Result<(), HookError> {
        Err(HookError::rejected(self.reason.clone()))
    }
}

/// Records every call.
#[derive(Default)]
pub struct Recorder {
    calls: Mutex<Vec<(HookKind, TransferContext)>>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<(HookKind, TransferContext)> {
        self.calls.lock().unwrap().clone()
    }
}

impl TokensSender for Recorder {
    fn tokens_to_transfer(&self, _: &mut dyn AmpApi, ctx: &TransferContext) -> Result<(), HookError> {
        self.calls.lock().unwrap().push((HookKind::Sender, ctx.clone()));
        Ok(())
    }
}

impl TokensRecipient for Recorder {
    fn tokens_received(&self, _: &mut dyn AmpApi, ctx: &TransferContext) -> Result<(), HookError> {
        self.calls.lock().unwrap().push((HookKind::Recipient, ctx.clone()));
        Ok(())
    }
}

/// Sender hook that moves `amount` of `holder`'s tokens to `target` the first
/// time it is called.
pub struct Reentrant {
    holder: Address,
    target: Address,
    amount: U256,
    armed: AtomicBool,
}

impl Reentrant {
    pub fn new(holder: Address, target: Address, amount: U256) -> Self {
        Self {
            holder,
            target,
            amount,
            armed: AtomicBool::new(true),
        }
    }
}

impl TokensSender for Reentrant {
    fn tokens_to_transfer(
        &self,
        ledger: &mut dyn AmpApi,
        _: &TransferContext,
    ) -> Result<(), HookError> {
        if self.armed.swap(false, Ordering::SeqCst) {
            ledger.transfer(self.holder, self.target, self.amount)?;
        }
        Ok(())
    }
}

/// Strategy validator with switchable vetoes and an optional operator it
/// grants scope to.
pub struct ScriptedValidator {
    grant: Option<Address>,
    reject_from: AtomicBool,
    reject_to: AtomicBool,
}

impl ScriptedValidator {
    pub fn permissive() -> Self {
        Self {
            grant: None,
            reject_from: AtomicBool::new(false),
            reject_to: AtomicBool::new(false),
        }
    }

    pub fn rejecting_to() -> Self {
        let validator = Self::permissive();
        validator.reject_to.store(true, Ordering::SeqCst);
        validator
    }

    pub fn granting(operator: Address) -> Self {
        Self {
            grant: Some(operator),
            ..Self::permissive()
        }
    }

    pub fn set_reject_from(&self, reject: bool) {
        self.reject_from.store(reject, Ordering::SeqCst);
    }
}

impl PartitionStrategyValidator for ScriptedValidator {
    fn validate_from_partition(
        &self,
        _: &mut dyn AmpApi,
        _: &TransferContext,
    ) -> Result<(), HookError> {
        if self.reject_from.load(Ordering::SeqCst) {
            return Err(HookError::rejected("source partition locked"));
        }
        Ok(())
    }

    fn validate_to_partition(
        &self,
        _: &mut dyn AmpApi,
        _: &TransferContext,
    ) -> Result<(), HookError> {
        if self.reject_to.load(Ordering::SeqCst) {
            return Err(HookError::rejected("destination partition closed"));
        }
        Ok(())
    }

    fn is_operator_for_partition_scope(
        &self,
        _: &dyn AmpApi,
        _: Partition,
        operator: Address,
        _: Address,
    ) -> Result<bool, HookError> {
        Ok(self.grant == Some(operator))
    }
}
