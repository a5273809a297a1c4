use std::sync::LazyLock;

use asset_swap::{
    circuit::{CompiledSwap, Error, SwapProgram},
    codec::{AssetCounts, Valuations},
    negotiate::negotiate,
};
use proptest::prelude::*;

static TWO_BY_TWO: LazyLock<CompiledSwap> = LazyLock::new(|| {
    SwapProgram::render(AssetCounts::new(2, 2))
        .unwrap()
        .compile()
        .unwrap()
});

#[test]
fn compiled_program_matches_negotiation_for_asymmetric_preferences() -> Result<(), Error> {
    let counts = AssetCounts::new(1, 5);
    let program = SwapProgram::render(counts)?.compile()?;
    let valuations = Valuations::new(
        counts,
        vec![100, 30, 30, 30, 30, 30],
        vec![1000, 6, 8, 3, 5, 1],
    )
    .unwrap();
    let allocation = program.evaluate(&valuations)?;
    assert_eq!(allocation.labels(), vec![1, 0, 1, 0, 0, 0]);
    assert_eq!(allocation, negotiate(&valuations));
    Ok(())
}

#[test]
fn compiled_program_handles_one_sided_ownership() -> Result<(), Error> {
    let counts = AssetCounts::new(0, 3);
    let program = SwapProgram::render(counts)?.compile()?;
    let valuations = Valuations::new(counts, vec![1, 2, 3], vec![3, 2, 1]).unwrap();
    assert_eq!(program.evaluate(&valuations)?.labels(), vec![1, 1, 1]);
    Ok(())
}

#[test]
fn compiled_program_rejects_valuations_for_other_counts() {
    let valuations = Valuations::new(AssetCounts::new(3, 1), vec![0; 4], vec![0; 4]).unwrap();
    assert!(matches!(
        TWO_BY_TWO.evaluate(&valuations),
        Err(Error::CountsMismatch { .. })
    ));
}

#[test]
fn compiled_program_handles_extreme_valuations() -> Result<(), Error> {
    let counts = AssetCounts::new(2, 2);
    let valuations = Valuations::new(
        counts,
        vec![i32::MIN, i32::MAX, i32::MAX, i32::MIN],
        vec![i32::MAX, i32::MIN, i32::MIN, i32::MAX],
    )
    .unwrap();
    assert_eq!(TWO_BY_TWO.evaluate(&valuations)?, negotiate(&valuations));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn compiled_program_matches_negotiation(
        party0 in prop::collection::vec(-100i32..100, 4),
        party1 in prop::collection::vec(-100i32..100, 4),
    ) {
        let valuations = Valuations::new(AssetCounts::new(2, 2), party0, party1).unwrap();
        let allocation = TWO_BY_TWO.evaluate(&valuations).unwrap();
        prop_assert_eq!(allocation, negotiate(&valuations));
    }
}
