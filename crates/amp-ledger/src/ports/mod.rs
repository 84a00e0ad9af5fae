//! # Ports Layer (Middle Hexagon)
//!
//! Trait definitions for the ledger.
//!
//! - **Driving Port (Inbound)**: `AmpApi`
//! - **Driven Ports (Outbound)**: `KeyValueStore`, `Directory`,
//!   `TokensSender`, `TokensRecipient`, `PartitionStrategyValidator`,
//!   `EventSink`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
