//! Enumeration of every candidate allocation as a delta from the initial allocation.
//!
//! The `k`-th delta is the `n`-bit binary representation of `k`, with asset `0` as the least
//! significant bit. Deltas are visited for `k = 0, 1, ..., 2^n - 1` in exactly this order, so the
//! first candidate is always the initial allocation itself. The order decides which of several
//! mutually improving allocations the negotiation ends on, so it is part of the contract.
//!
//! Deltas are produced lazily and hold a single `u64`, which keeps memory at O(n) regardless of
//! how many candidates are scanned.

use std::iter::FusedIterator;

/// The largest number of assets that can be enumerated.
///
/// The scan visits `2^n` candidates, so even far below this ceiling the running time is the
/// practical limit. There is no data-dependent way to shorten the scan.
pub const MAX_ASSETS: usize = 63;

/// The asset count exceeds [`MAX_ASSETS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot enumerate allocations of {0} assets, at most {MAX_ASSETS} are supported")]
pub struct TooManyAssets(pub usize);

/// A bitwise offset from the initial allocation: asset `i` changes hands iff bit `i` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Delta {
    bits: u64,
    len: usize,
}

impl Delta {
    /// The number of assets covered by the delta.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the delta covers no assets.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The index `k` this delta was enumerated at.
    pub fn index(&self) -> u64 {
        self.bits
    }

    /// Whether asset `i` is flipped.
    pub fn bit(&self, i: usize) -> bool {
        i < self.len && (self.bits >> i) & 1 == 1
    }

    /// The flip bits of all assets, asset `0` first.
    pub fn bits(&self) -> impl ExactSizeIterator<Item = bool> + '_ {
        (0..self.len).map(|i| (self.bits >> i) & 1 == 1)
    }
}

/// Enumerates the deltas of a fixed number of assets.
///
/// An [`Enumerator`] is cheap to copy and can be iterated any number of times; every iteration
/// starts again at `k = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enumerator {
    assets: usize,
}

impl Enumerator {
    /// Creates an enumerator over `assets` assets.
    pub fn new(assets: usize) -> Result<Self, TooManyAssets> {
        if assets > MAX_ASSETS {
            return Err(TooManyAssets(assets));
        }
        Ok(Self { assets })
    }

    /// The number of assets.
    pub fn assets(&self) -> usize {
        self.assets
    }

    /// The number of candidates, `2^n`.
    pub fn candidates(&self) -> u64 {
        1 << self.assets
    }

    /// The `k`-th delta, or `None` if `k >= 2^n`.
    pub fn delta(&self, k: u64) -> Option<Delta> {
        (k < self.candidates()).then_some(Delta {
            bits: k,
            len: self.assets,
        })
    }

    /// Iterates over all deltas, starting at the all-zero delta.
    pub fn iter(&self) -> Deltas {
        Deltas {
            assets: self.assets,
            next: 0,
            end: self.candidates(),
        }
    }
}

impl IntoIterator for Enumerator {
    type Item = Delta;
    type IntoIter = Deltas;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &Enumerator {
    type Item = Delta;
    type IntoIter = Deltas;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the deltas of an [`Enumerator`], in increasing order of `k`.
#[derive(Debug, Clone)]
pub struct Deltas {
    assets: usize,
    next: u64,
    end: u64,
}

impl Iterator for Deltas {
    type Item = Delta;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == self.end {
            return None;
        }
        let delta = Delta {
            bits: self.next,
            len: self.assets,
        };
        self.next += 1;
        Some(delta)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        match usize::try_from(remaining) {
            Ok(remaining) => (remaining, Some(remaining)),
            Err(_) => (usize::MAX, None),
        }
    }
}

// the remaining count of up to 2^63 candidates only fits a 64-bit usize
#[cfg(target_pointer_width = "64")]
impl ExactSizeIterator for Deltas {}

impl FusedIterator for Deltas {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_delta_is_all_zero() {
        for n in [0, 1, 5, MAX_ASSETS] {
            let first = Enumerator::new(n).unwrap().iter().next().unwrap();
            assert_eq!(first.index(), 0);
            assert!(first.bits().all(|bit| !bit));
        }
    }

    #[test]
    fn deltas_are_binary_counts_with_lsb_first() {
        let deltas: Vec<Vec<bool>> = Enumerator::new(2)
            .unwrap()
            .iter()
            .map(|d| d.bits().collect())
            .collect();
        assert_eq!(
            deltas,
            vec![
                vec![false, false],
                vec![true, false],
                vec![false, true],
                vec![true, true],
            ]
        );
    }

    #[test]
    fn zero_assets_yield_a_single_empty_delta() {
        let enumerator = Enumerator::new(0).unwrap();
        assert_eq!(enumerator.candidates(), 1);
        let deltas: Vec<Delta> = enumerator.iter().collect();
        assert_eq!(deltas.len(), 1);
        assert!(deltas[0].is_empty());
    }

    #[test]
    fn iteration_restarts_from_zero() {
        let enumerator = Enumerator::new(3).unwrap();
        let mut partial = enumerator.iter();
        partial.nth(4);
        let again: Vec<u64> = enumerator.iter().map(|d| d.index()).collect();
        assert_eq!(again, (0..8).collect::<Vec<_>>());
        assert_eq!(enumerator.iter().size_hint(), (8, Some(8)));
    }

    #[test]
    fn size_hint_is_exact_or_unbounded_at_the_ceiling() {
        let mut deltas = Enumerator::new(MAX_ASSETS).unwrap().iter();
        deltas.next();
        let remaining = (1u64 << MAX_ASSETS) - 1;
        match usize::try_from(remaining) {
            Ok(remaining) => assert_eq!(deltas.size_hint(), (remaining, Some(remaining))),
            Err(_) => assert_eq!(deltas.size_hint(), (usize::MAX, None)),
        }
    }

    #[test]
    fn rejects_asset_counts_above_the_ceiling() {
        assert_eq!(
            Enumerator::new(MAX_ASSETS + 1),
            Err(TooManyAssets(MAX_ASSETS + 1))
        );
        assert_eq!(Enumerator::new(3).unwrap().delta(8), None);
    }
}
