//! Parties and allocations of assets to parties.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{codec::AssetCounts, enumerate::Delta};

/// One of the two negotiating parties.
///
/// Serialized as the owner label `0` or `1` used at the system boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Party {
    /// The party owning the first block of assets.
    Zero = 0,
    /// The party owning the second block of assets.
    One = 1,
}

impl Party {
    /// Both parties, in index order.
    pub const BOTH: [Party; 2] = [Party::Zero, Party::One];

    /// The index of the party, `0` or `1`.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The owner bit of the party, `true` for [`Party::One`].
    pub fn bit(self) -> bool {
        self as u8 == 1
    }

    /// Returns the party whose owner bit is `bit`.
    pub fn from_bit(bit: bool) -> Self {
        [Party::Zero, Party::One][usize::from(bit)]
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "party{}", self.index())
    }
}

impl From<Party> for u8 {
    fn from(party: Party) -> Self {
        party as u8
    }
}

/// The owner label was neither `0` nor `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid owner label {0}, expected 0 or 1")]
pub struct InvalidOwner(pub u8);

impl TryFrom<u8> for Party {
    type Error = InvalidOwner;

    fn try_from(label: u8) -> Result<Self, Self::Error> {
        match label {
            0 => Ok(Party::Zero),
            1 => Ok(Party::One),
            other => Err(InvalidOwner(other)),
        }
    }
}

/// An assignment of every asset to one of the two parties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    owners: Vec<Party>,
}

impl Allocation {
    /// The allocation in which each party keeps the assets it originally owns.
    pub fn initial(counts: AssetCounts) -> Self {
        let owners = std::iter::repeat_n(Party::Zero, counts.party0)
            .chain(std::iter::repeat_n(Party::One, counts.party1))
            .collect();
        Self { owners }
    }

    /// Builds an allocation from its owner bits (`true` = [`Party::One`]).
    pub fn from_bits(bits: impl IntoIterator<Item = bool>) -> Self {
        Self {
            owners: bits.into_iter().map(Party::from_bit).collect(),
        }
    }

    /// Overwrites `self` with `base XOR delta`, reusing the existing buffer.
    ///
    /// `self`, `base` and `delta` must cover the same number of assets.
    pub(crate) fn set_xor(&mut self, base: &Allocation, delta: &Delta) {
        debug_assert_eq!(base.len(), delta.len());
        self.owners.clear();
        self.owners.extend(
            base.owners
                .iter()
                .zip(delta.bits())
                .map(|(owner, flip)| Party::from_bit(owner.bit() ^ flip)),
        );
    }

    /// Overwrites `self` with `other` if `take` is set, and leaves it unchanged otherwise.
    ///
    /// Every asset is rewritten through a bit mux whether or not `take` is set.
    pub(crate) fn select_from(&mut self, take: bool, other: &Allocation) {
        debug_assert_eq!(self.len(), other.len());
        for (own, other) in self.owners.iter_mut().zip(&other.owners) {
            *own = Party::from_bit((take & other.bit()) | (!take & own.bit()));
        }
    }

    /// The candidate `base XOR delta`.
    pub fn with_delta(base: &Allocation, delta: &Delta) -> Self {
        let mut candidate = Allocation {
            owners: Vec::with_capacity(base.len()),
        };
        candidate.set_xor(base, delta);
        candidate
    }

    /// The party that receives asset `i`.
    pub fn owner(&self, i: usize) -> Option<Party> {
        self.owners.get(i).copied()
    }

    /// The number of assets.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Whether the allocation covers no assets at all.
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// The owners of all assets in flat asset order.
    pub fn owners(&self) -> &[Party] {
        &self.owners
    }

    /// The owner labels (`0` or `1`) of all assets in flat asset order.
    pub fn labels(&self) -> Vec<u8> {
        self.owners.iter().map(|owner| u8::from(*owner)).collect()
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.labels())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_allocation_keeps_original_owners() {
        let alloc = Allocation::initial(AssetCounts::new(3, 2));
        assert_eq!(alloc.labels(), vec![0, 0, 0, 1, 1]);
    }

    #[test]
    fn select_from_only_copies_when_taken() {
        let mut leader = Allocation::from_bits([false, true, true]);
        let candidate = Allocation::from_bits([true, false, true]);
        leader.select_from(false, &candidate);
        assert_eq!(leader.labels(), vec![0, 1, 1]);
        leader.select_from(true, &candidate);
        assert_eq!(leader, candidate);
    }

    #[test]
    fn owner_labels_round_trip_through_serde() {
        let alloc = Allocation::from_bits([true, false]);
        assert_eq!(
            serde_json::to_string(&alloc).unwrap(),
            r#"{"owners":[1,0]}"#
        );
        assert!(serde_json::from_str::<Allocation>(r#"{"owners":[2]}"#).is_err());
    }
}
