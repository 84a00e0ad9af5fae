//! # Amp Ledger - Partitioned Token Ledger
//!
//! ## Purpose
//!
//! A fungible token ledger with an ERC-20 compatible surface, where every
//! holder's balance is split across 32-byte partitions. Each partition has
//! its own allowances and operators, and partitions whose 4-byte prefix is
//! bound to a strategy validator route every transfer through it.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement Location |
//! |----|-----------|---------------------|
//! | INVARIANT-1 | Balance = Σ partition balances | `ledger/state.rs` - `debit()`/`credit()` |
//! | INVARIANT-2 | Partition supply = Σ holder balances | `ledger/state.rs` - `debit()`/`credit()` |
//! | INVARIANT-3 | Active partitions have supply (default exempt) | `ledger/state.rs` - `debit()` |
//! | INVARIANT-4 | Atomic operations | `ledger/mod.rs` - `Amp::transact()` |
//! | INVARIANT-5 | Append-only registries | `ledger/registry.rs` |
//!
//! Runtime checks live in `ledger/invariants.rs`.
//!
//! ## Transfer Protocol
//!
//! ```text
//! transfer_by_partition(partition, from, to, value, data, operator_data)
//!   1. to != null
//!   2. operator or allowance (allowance consumed)
//!   3. sender hook, from-partition validator
//!   4. balance re-check
//!   5. destination from data (change-partition flag)
//!   6. debit / credit
//!   7. to-partition validator (or unmanaged prefix), recipient hook
//!   8. Transfer, TransferByPartition, ChangedPartition events
//! ```
//!
//! ## Outbound Dependencies
//!
//! | Port | Purpose |
//! |------|---------|
//! | `KeyValueStore` | Ledger state |
//! | `Directory` | Hook and validator discovery |
//! | `EventSink` | Committed events |
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      OUTER LAYER                                │
//! │  adapters/ - in-memory store, directory, event log              │
//! │  service.rs - async single-writer service                       │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MIDDLE LAYER                               │
//! │  ports/inbound.rs  - AmpApi trait                               │
//! │  ports/outbound.rs - store, directory, hook, sink traits        │
//! │  ledger/           - Amp engine over the ports                  │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      INNER LAYER                                │
//! │  domain/value_objects.rs - Address, Partition, PartitionPrefix  │
//! │  domain/entities.rs      - TransferContext, HookKind            │
//! │  domain/services.rs      - labels, hashing, partition change    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage Example
//!
//! ```ignore
//! use amp_ledger::prelude::*;
//! use std::sync::Arc;
//!
//! let mut amp = Genesis::new(AmpConfig::default(), GenesisConfig::new(owner))
//!     .build(InMemoryStore::new(), Arc::new(InMemoryDirectory::new()), Arc::new(InMemoryEventLog::new()))?;
//!
//! amp.mint(owner, alice, U256::from(1000))?;
//! let to = amp.transfer_by_partition(alice, Partition::DEFAULT, alice, bob, U256::from(300),
//!     &change_partition_data(collateral), &[])?;
//! ```

// Crate-level lints
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod config;
pub mod domain;
pub mod errors;
pub mod events;
pub mod genesis;
pub mod ledger;
pub mod ports;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain
    pub use crate::domain::entities::{HookKind, TransferContext, TransferKind};
    pub use crate::domain::services::{
        change_partition_data, destination_partition, interface_hash, keccak256, labels,
        strategy_validator_interface, strategy_validator_label, CHANGE_PARTITION_FLAG,
    };
    pub use crate::domain::value_objects::{Address, Hash, Partition, PartitionPrefix, U256};

    // Ports
    pub use crate::ports::inbound::AmpApi;
    pub use crate::ports::outbound::{
        Directory, EventSink, KeyValueStore, PartitionStrategyValidator, TokensRecipient,
        TokensSender, WriteBatch,
    };

    // Ledger
    pub use crate::ledger::{
        check_all_invariants, Amp, InvariantCheckResult, InvariantViolation,
    };

    // Events
    pub use crate::events::{
        topics, AmpEvent, MintRequestPayload, TransferByPartitionRequestPayload,
        TransferByPartitionResponsePayload, TransferRequestPayload,
    };

    // Errors
    pub use crate::errors::{AmpError, DirectoryError, HookError, ServiceError, StoreError};

    // Configuration & genesis
    pub use crate::config::{AmpConfig, ConfigError};
    pub use crate::genesis::{Genesis, GenesisConfig, GenesisError};

    // Adapters
    pub use crate::adapters::{InMemoryDirectory, InMemoryEventLog, InMemoryStore};

    // Service
    pub use crate::service::{AmpService, ServiceConfig, ServiceStats};
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
