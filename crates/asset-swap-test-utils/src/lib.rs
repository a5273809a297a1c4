//! Helpers shared by the tests and benchmarks of `asset-swap`.

pub mod peak_alloc;
