//! # Amp Ledger Benchmarks
//!
//! | Area | Measured |
//! |------|----------|
//! | Default partition | ERC-20 transfer, with and without recipient hooks |
//! | Partition change | Round trip through the active partition set |
//! | Strategy dispatch | Lock/release through a collateral validator |
//! | Genesis | Single-commit issuance of many allocations |

use amp_tests::benchmarks::ledger::register_benchmarks;
use criterion::{criterion_group, criterion_main, Criterion};

fn ledger_benchmarks(c: &mut Criterion) {
    register_benchmarks(c);
}

criterion_group!(benches, ledger_benchmarks);
criterion_main!(benches);
