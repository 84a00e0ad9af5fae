//! # Adapters Layer (Outer Hexagon)
//!
//! In-memory implementations of the driven ports.
//!
//! - `memory_store.rs` - `KeyValueStore` over a `BTreeMap`
//! - `directory.rs` - `Directory` with registrable hook instances
//! - `event_log.rs` - `EventSink` that keeps and logs published events

pub mod directory;
pub mod event_log;
pub mod memory_store;

pub use directory::*;
pub use event_log::*;
pub use memory_store::*;
