//! Checks that negotiation memory does not grow with the number of candidates.
//!
//! This is the only test in this binary, so that no other test allocates while the global
//! allocator is tracking.

use asset_swap::{
    codec::{AssetCounts, Valuations},
    negotiate::negotiate,
};
use asset_swap_test_utils::peak_alloc::PeakAllocator;

#[global_allocator]
static ALLOCATOR: PeakAllocator = PeakAllocator::new();

#[test]
fn negotiation_memory_is_linear_in_the_number_of_assets() {
    let valuations = |n0: usize, n1: usize| {
        let n = n0 + n1;
        let party0 = (0..n as i32).map(|v| (v * 7) % 11 - 5).collect();
        let party1 = (0..n as i32).map(|v| (v * 5) % 13 - 6).collect();
        Valuations::new(AssetCounts::new(n0, n1), party0, party1).unwrap()
    };

    let small = valuations(4, 4);
    let large = valuations(8, 8);
    let (small_allocation, small_peak) = ALLOCATOR.measure(|| negotiate(&small));
    let (large_allocation, large_peak) = ALLOCATOR.measure(|| negotiate(&large));
    assert_eq!(small_allocation.len(), 8);
    assert_eq!(large_allocation.len(), 16);

    // 2^16 candidates of 16 owners each would need about a megabyte if they were ever collected
    assert!(large_peak < 16 * 1024, "peak of {large_peak} bytes");
    assert!(
        large_peak <= 8 * small_peak.max(64),
        "peak grew from {small_peak} to {large_peak} bytes"
    );
}
