//! Each party's own-perspective value of an allocation.

use serde::{Deserialize, Serialize};

use crate::{
    allocation::{Allocation, Party},
    codec::Valuations,
};

/// The value each party assigns to what it receives under an allocation.
///
/// The two components are measured in unrelated units, so there is deliberately no ordering and
/// no way to merge them into a single number. Scores are only ever compared component-wise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Score {
    party0: i64,
    party1: i64,
}

impl Score {
    /// The total value `party` assigns to the assets it receives.
    pub fn of(&self, party: Party) -> i64 {
        [self.party0, self.party1][party.index()]
    }

    /// Whether `self` is at least as good as `other` for both parties.
    ///
    /// Both comparisons are always evaluated.
    pub fn weakly_dominates(&self, other: &Score) -> bool {
        (self.party0 >= other.party0) & (self.party1 >= other.party1)
    }

    /// `other` if `take` is set, `self` otherwise, computed as `take * other + (1 - take) * self`.
    pub(crate) fn select(&self, take: bool, other: &Score) -> Score {
        let take = i64::from(take);
        Score {
            party0: take * other.party0 + (1 - take) * self.party0,
            party1: take * other.party1 + (1 - take) * self.party1,
        }
    }
}

/// Scores `allocation` under the private valuation tables.
///
/// Every asset contributes to both sums through a `0`/`1` mask, so the same additions and
/// multiplications happen for every allocation and every table: the work depends only on the
/// number of assets.
pub fn score(allocation: &Allocation, valuations: &Valuations) -> Score {
    debug_assert_eq!(allocation.len(), valuations.assets());
    let table0 = valuations.table(Party::Zero);
    let table1 = valuations.table(Party::One);
    let mut party0 = 0i64;
    let mut party1 = 0i64;
    for ((owner, v0), v1) in allocation.owners().iter().zip(table0).zip(table1) {
        let to_party1 = i64::from(owner.bit());
        party0 += (1 - to_party1) * i64::from(*v0);
        party1 += to_party1 * i64::from(*v1);
    }
    Score { party0, party1 }
}
