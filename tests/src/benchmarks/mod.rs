//! # Amp Ledger Benchmarks
//!
//! Throughput of the transfer protocol over the in-memory adapters.
