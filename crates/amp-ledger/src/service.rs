//! # Amp Service
//!
//! Async front of the ledger for multi-threaded hosts.
//!
//! ## Concurrency
//!
//! The ledger sits behind one `tokio::sync::Mutex`: every request runs to
//! completion under the lock, so no request observes another's
//! intermediate state. Hooks run synchronously inside the locked section and
//! re-enter the ledger through the `&mut dyn AmpApi` they receive, never
//! through the service, so reentrancy cannot deadlock.
//!
//! A hook that never returns keeps the lock. Other requests give up after
//! `lock_timeout_ms` with [`ServiceError::LockTimeout`] instead of queueing
//! forever.

use crate::config::ConfigError;
use crate::domain::value_objects::{Address, Partition, U256};
use crate::errors::{AmpError, ServiceError};
use crate::events::{
    MintRequestPayload, TransferByPartitionRequestPayload, TransferByPartitionResponsePayload,
    TransferRequestPayload,
};
use crate::ledger::Amp;
use crate::ports::inbound::AmpApi;
use crate::ports::outbound::KeyValueStore;
use amp_telemetry::{time_histogram, LEDGER_ERRORS, OPERATION_DURATION};
use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// How long a request waits for the ledger lock.
    pub lock_timeout_ms: u64,
    /// Operations slower than this are logged as warnings.
    pub slow_operation_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 5000,
            slow_operation_ms: 50,
        }
    }
}

impl ServiceConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `AMP_LOCK_TIMEOUT_MS`: Lock wait budget (default: 5000)
    /// - `AMP_SLOW_OPERATION_MS`: Slow operation threshold (default: 50)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            lock_timeout_ms: parse_env("AMP_LOCK_TIMEOUT_MS", defaults.lock_timeout_ms)?,
            slow_operation_ms: parse_env("AMP_SLOW_OPERATION_MS", defaults.slow_operation_ms)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lock_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "lock timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value }),
        Err(_) => Ok(default),
    }
}

/// Statistics for the service.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    /// Mutating operations executed.
    pub operations: u64,
    /// Operations that committed.
    pub successful_operations: u64,
    /// Operations rolled back.
    pub failed_operations: u64,
    /// Failures caused by a hook or validator veto.
    pub hook_rejections: u64,
    /// Requests that timed out waiting for the lock.
    pub lock_timeouts: u64,
    /// Average execution time in microseconds.
    pub avg_operation_time_us: u64,
}

/// Single-writer service around one ledger.
pub struct AmpService<S: KeyValueStore> {
    ledger: Arc<Mutex<Amp<S>>>,
    config: ServiceConfig,
    stats: Arc<RwLock<ServiceStats>>,
}

impl<S: KeyValueStore> Clone for AmpService<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            config: self.config.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<S: KeyValueStore> AmpService<S> {
    /// Wrap a ledger built by genesis.
    pub fn new(ledger: Amp<S>, config: ServiceConfig) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            config,
            stats: Arc::new(RwLock::new(ServiceStats::default())),
        }
    }

    /// Get current service statistics.
    pub async fn stats(&self) -> ServiceStats {
        self.stats.read().await.clone()
    }

    /// Run a mutating operation under the ledger lock.
    pub async fn execute<T, F>(&self, operation: &'static str, op: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut Amp<S>) -> Result<T, AmpError>,
    {
        let mut ledger = self.acquire(operation).await?;

        let start = Instant::now();
        let result = {
            let _timer = time_histogram!(OPERATION_DURATION);
            op(&mut *ledger)
        };
        drop(ledger);
        let elapsed = start.elapsed();

        if elapsed > Duration::from_millis(self.config.slow_operation_ms) {
            warn!(
                operation,
                elapsed_us = elapsed.as_micros() as u64,
                "Slow ledger operation"
            );
        }
        if let Err(err) = &result {
            LEDGER_ERRORS.with_label_values(&[err.code()]).inc();
            debug!(operation, code = err.code(), error = %err, "Operation rolled back");
        }

        self.record(&result, elapsed).await;
        result.map_err(ServiceError::from)
    }

    /// Run a read-only query under the ledger lock.
    pub async fn query<T, F>(&self, operation: &'static str, op: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&Amp<S>) -> Result<T, AmpError>,
    {
        let ledger = self.acquire(operation).await?;
        Ok(op(&*ledger)?)
    }

    async fn acquire(
        &self,
        operation: &'static str,
    ) -> Result<tokio::sync::MutexGuard<'_, Amp<S>>, ServiceError> {
        let timeout = Duration::from_millis(self.config.lock_timeout_ms);
        match tokio::time::timeout(timeout, self.ledger.lock()).await {
            Ok(guard) => Ok(guard),
            Err(_) => {
                self.stats.write().await.lock_timeouts += 1;
                let err = ServiceError::LockTimeout {
                    operation,
                    timeout_ms: self.config.lock_timeout_ms,
                };
                LEDGER_ERRORS.with_label_values(&[err.code()]).inc();
                warn!(operation, timeout_ms = self.config.lock_timeout_ms, "Ledger lock timeout");
                Err(err)
            }
        }
    }

    async fn record<T>(&self, result: &Result<T, AmpError>, elapsed: Duration) {
        let elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        let mut stats = self.stats.write().await;
        stats.operations += 1;
        match result {
            Ok(_) => stats.successful_operations += 1,
            Err(err) => {
                stats.failed_operations += 1;
                if err.is_hook_rejection() {
                    stats.hook_rejections += 1;
                }
            }
        }
        // Widened so the running sum cannot overflow
        let total = u128::from(stats.operations);
        let sum = u128::from(stats.avg_operation_time_us) * (total - 1) + u128::from(elapsed_us);
        stats.avg_operation_time_us = u64::try_from(sum / total).unwrap_or(u64::MAX);
    }

    // =========================================================================
    // REQUEST HANDLERS
    // =========================================================================

    /// Handle an ERC-20 style transfer request.
    #[instrument(skip(self, payload), fields(correlation_id = %correlation_id, caller = %payload.caller))]
    pub async fn handle_transfer(
        &self,
        correlation_id: Uuid,
        payload: TransferRequestPayload,
    ) -> Result<bool, ServiceError> {
        self.execute("transfer", |amp| {
            amp.transfer(payload.caller, payload.to, payload.value)
        })
        .await
    }

    /// Handle a partition-aware transfer request.
    #[instrument(skip(self, payload), fields(correlation_id = %correlation_id, caller = %payload.caller))]
    pub async fn handle_transfer_by_partition(
        &self,
        correlation_id: Uuid,
        payload: TransferByPartitionRequestPayload,
    ) -> Result<TransferByPartitionResponsePayload, ServiceError> {
        let to_partition = self
            .execute("transfer_by_partition", |amp| {
                amp.transfer_by_partition(
                    payload.caller,
                    payload.partition,
                    payload.from,
                    payload.to,
                    payload.value,
                    &payload.data,
                    &payload.operator_data,
                )
            })
            .await?;
        Ok(TransferByPartitionResponsePayload { to_partition })
    }

    /// Handle an issuance request.
    #[instrument(skip(self, payload), fields(correlation_id = %correlation_id, caller = %payload.caller))]
    pub async fn handle_mint(
        &self,
        correlation_id: Uuid,
        payload: MintRequestPayload,
    ) -> Result<(), ServiceError> {
        self.execute("mint", |amp| {
            amp.mint(payload.caller, payload.to, payload.value)
        })
        .await
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Aggregate balance of `holder`.
    pub async fn balance_of(&self, holder: Address) -> Result<U256, ServiceError> {
        self.query("balance_of", |amp| amp.balance_of(holder)).await
    }

    /// Balance of `holder` in `partition`.
    pub async fn balance_of_by_partition(
        &self,
        partition: Partition,
        holder: Address,
    ) -> Result<U256, ServiceError> {
        self.query("balance_of_by_partition", |amp| {
            amp.balance_of_by_partition(partition, holder)
        })
        .await
    }

    /// Partitions `holder` holds tokens in.
    pub async fn partitions_of(&self, holder: Address) -> Result<Vec<Partition>, ServiceError> {
        self.query("partitions_of", |amp| amp.partitions_of(holder)).await
    }

    /// Active partitions.
    pub async fn total_partitions(&self) -> Result<Vec<Partition>, ServiceError> {
        self.query("total_partitions", |amp| amp.total_partitions()).await
    }

    /// Total issued supply.
    pub async fn total_supply(&self) -> Result<U256, ServiceError> {
        self.query("total_supply", |amp| amp.total_supply()).await
    }
}

// =============================================================================
// TESTS
// =============================================================================
