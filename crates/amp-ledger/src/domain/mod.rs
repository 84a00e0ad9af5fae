//! # Domain Layer (Inner Hexagon)
//!
//! Pure ledger concepts.
//! NO I/O, NO async, NO ledger state access.
//!
//! - Dependencies point INWARD only (ports, adapters and the ledger engine
//!   depend on this module, never the other way round).

pub mod entities;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use services::*;
pub use value_objects::*;
