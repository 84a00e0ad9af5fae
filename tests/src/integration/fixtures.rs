//! # Test Fixtures
//!
//! Ledger setup shared by the integration tests and the benchmarks, plus a
//! collateral-manager strategy of the kind external lock-up contracts
//! implement.

use amp_ledger::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Issuer and strategy administrator of every fixture ledger.
pub const ISSUER: Address = Address::new([0x1e; 20]);

/// Prefix bound to [`CollateralLockStrategy`] by [`Harness::with_lock_strategy`].
pub const LOCK_PREFIX: PartitionPrefix = PartitionPrefix::new([0xca, 0xfe, 0x00, 0x01]);

/// Directory address the lock strategy is deployed at.
pub const LOCK_STRATEGY: Address = Address::new([0x5a; 20]);

pub fn account(n: u64) -> Address {
    Address::from_low_u64(n)
}

/// Ledger plus the collaborators a test needs to inspect.
pub struct Harness {
    pub amp: Amp<InMemoryStore>,
    pub directory: Arc<InMemoryDirectory>,
    pub events: Arc<InMemoryEventLog>,
}

impl Harness {
    /// Ledger owned by [`ISSUER`] with the given default-partition balances.
    pub fn new(allocations: &[(Address, u64)]) -> Self {
        amp_telemetry::init_test_tracing();
        let directory = Arc::new(InMemoryDirectory::new());
        let events = Arc::new(InMemoryEventLog::new());
        let genesis = allocations
            .iter()
            .fold(GenesisConfig::new(ISSUER), |config, (holder, value)| {
                config.with_allocation(*holder, U256::from(*value))
            });

        let amp = Genesis::new(AmpConfig::default(), genesis)
            .build(InMemoryStore::new(), directory.clone(), events.clone())
            .expect("genesis");
        Self {
            amp,
            directory,
            events,
        }
    }

    /// Deploy [`CollateralLockStrategy`] and bind it to [`LOCK_PREFIX`].
    pub fn with_lock_strategy(mut self) -> (Self, Arc<CollateralLockStrategy>) {
        let strategy = Arc::new(CollateralLockStrategy::default());
        self.directory
            .register_validator(LOCK_STRATEGY, strategy.clone());
        self.amp
            .set_partition_strategy(ISSUER, LOCK_PREFIX, LOCK_STRATEGY)
            .expect("strategy registration");
        (self, strategy)
    }

    /// Opt `holder` into a sender hook deployed at `implementer`.
    pub fn register_sender(
        &self,
        holder: Address,
        implementer: Address,
        hook: Arc<dyn TokensSender>,
    ) {
        self.directory.register_sender(implementer, hook);
        self.directory
            .set_interface_implementer(
                holder,
                interface_hash(labels::AMP_TOKENS_SENDER),
                implementer,
            )
            .expect("directory registration");
    }

    /// Opt `holder` into a recipient hook deployed at `implementer`.
    pub fn register_recipient(
        &self,
        holder: Address,
        implementer: Address,
        hook: Arc<dyn TokensRecipient>,
    ) {
        self.directory.register_recipient(implementer, hook);
        self.directory
            .set_interface_implementer(
                holder,
                interface_hash(labels::AMP_TOKENS_RECIPIENT),
                implementer,
            )
            .expect("directory registration");
    }

    /// Every holder the ledger has touched, for invariant sweeps.
    pub fn assert_invariants(&self, holders: &[Address]) {
        let result = check_all_invariants(&self.amp, holders).expect("invariant read");
        assert!(result.is_valid(), "invariants violated: {result:?}");
    }
}

/// Partition owned by collateral manager `manager` under [`LOCK_PREFIX`].
pub fn lock_partition(manager: Address) -> Partition {
    Partition::from_parts(LOCK_PREFIX, [0u8; 8], manager)
}

/// Unmanaged partition distinguished by `tag`.
pub fn plain_partition(tag: u8) -> Partition {
    Partition::from_parts(PartitionPrefix::ZERO, [tag; 8], Address::ZERO)
}

// =============================================================================
// COLLATERAL LOCK STRATEGY
// =============================================================================

/// Locks tokens in partitions named after a registered collateral manager.
///
/// - tokens may only enter `LOCK_PREFIX` partitions whose owner field is a
///   registered collateral manager
/// - only the manager, or an operator the manager appointed, may move tokens
///   out of them
/// - the manager's operators act for every holder in the manager's partitions
#[derive(Default)]
pub struct CollateralLockStrategy {
    from_checks: AtomicUsize,
    to_checks: AtomicUsize,
}

impl CollateralLockStrategy {
    pub fn from_checks(&self) -> usize {
        self.from_checks.load(Ordering::SeqCst)
    }

    pub fn to_checks(&self) -> usize {
        self.to_checks.load(Ordering::SeqCst)
    }
}

impl PartitionStrategyValidator for CollateralLockStrategy {
    fn validate_from_partition(
        &self,
        ledger: &mut dyn AmpApi,
        ctx: &TransferContext,
    ) -> Result<(), HookError> {
        self.from_checks.fetch_add(1, Ordering::SeqCst);
        let manager = ctx.from_partition.owner();
        if ledger.is_operator_for_collateral_manager(ctx.from_partition, ctx.operator, manager)? {
            Ok(())
        } else {
            Err(HookError::rejected("tokens are locked"))
        }
    }

    fn validate_to_partition(
        &self,
        ledger: &mut dyn AmpApi,
        ctx: &TransferContext,
    ) -> Result<(), HookError> {
        self.to_checks.fetch_add(1, Ordering::SeqCst);
        if ledger.is_collateral_manager(ctx.to_partition.owner())? {
            Ok(())
        } else {
            Err(HookError::rejected("unknown collateral manager"))
        }
    }

    fn is_operator_for_partition_scope(
        &self,
        ledger: &dyn AmpApi,
        partition: Partition,
        operator: Address,
        _holder: Address,
    ) -> Result<bool, HookError> {
        Ok(ledger.is_operator_for_collateral_manager(partition, operator, partition.owner())?)
    }
}

// =============================================================================
// HOOKS
// =============================================================================

/// Sender and recipient hook that refuses everything.
pub struct Refuse;

impl TokensSender for Refuse {
    fn tokens_to_transfer(&self, _: &mut dyn AmpApi, _: &TransferContext) -> Result<(), HookError> {
        Err(HookError::rejected("sender refuses"))
    }
}

impl TokensRecipient for Refuse {
    fn tokens_received(&self, _: &mut dyn AmpApi, _: &TransferContext) -> Result<(), HookError> {
        Err(HookError::rejected("recipient refuses"))
    }
}

/// Recipient hook that forwards every default-partition receipt to `sink`.
pub struct Forwarder {
    pub sink: Address,
}

impl TokensRecipient for Forwarder {
    fn tokens_received(
        &self,
        ledger: &mut dyn AmpApi,
        ctx: &TransferContext,
    ) -> Result<(), HookError> {
        if ctx.to_partition.is_default() && !ctx.value.is_zero() {
            ledger.transfer(ctx.to, self.sink, ctx.value)?;
        }
        Ok(())
    }
}
