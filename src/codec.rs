//! Mapping between the flat asset index space and the names used at the system boundary.
//!
//! Assets are named `party{p}Asset{j}`, where `p` is the party that originally owns the asset and
//! `j` its position inside that party's block. Party 0's assets come first in the flat index
//! space, so `party0Asset{j}` is asset `j` and `party1Asset{j}` is asset `n0 + j`.
//!
//! All shape checks happen here, before a negotiation starts. Once [`Valuations`] exist, the
//! negotiation itself cannot fail.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    allocation::{Allocation, Party},
    enumerate::{Enumerator, TooManyAssets},
};

/// Errors caused by input of the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The assets cannot be enumerated.
    #[error(transparent)]
    TooManyAssets(#[from] TooManyAssets),
    /// A valuation table does not contain exactly one value per asset.
    #[error("{party} supplied {actual} valuations, expected one for each of the {expected} assets")]
    WrongValuationCount {
        /// The party supplying the table.
        party: Party,
        /// The total number of assets.
        expected: usize,
        /// The length of the supplied table.
        actual: usize,
    },
    /// The string is not of the form `party{p}Asset{j}`.
    #[error("invalid asset identifier '{0}', expected e.g. 'party0Asset3'")]
    InvalidAssetId(String),
    /// The asset identifier is well-formed, but no such asset exists.
    #[error("{id} does not exist, {} only owns {count} assets", .id.owner)]
    UnknownAsset {
        /// The unknown asset.
        id: AssetId,
        /// The number of assets originally owned by `id.owner`.
        count: usize,
    },
    /// A party did not supply a valuation for an asset.
    #[error("{party} did not supply a valuation for {id}")]
    MissingValuation {
        /// The party that omitted the valuation.
        party: Party,
        /// The asset without valuation.
        id: AssetId,
    },
    /// A party supplied more than one valuation for an asset.
    #[error("{party} supplied more than one valuation for {id}")]
    DuplicateValuation {
        /// The party that supplied the duplicate.
        party: Party,
        /// The asset valued twice.
        id: AssetId,
    },
    /// An allocation does not cover exactly the declared assets.
    #[error("the allocation covers {actual} assets, but {expected} were declared")]
    WrongAllocationLength {
        /// The total number of declared assets.
        expected: usize,
        /// The number of assets in the allocation.
        actual: usize,
    },
}

/// The number of assets originally owned by each party. Public to both parties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetCounts {
    /// The number of assets originally owned by party 0 (`n0`).
    pub party0: usize,
    /// The number of assets originally owned by party 1 (`n1`).
    pub party1: usize,
}

impl AssetCounts {
    /// Declares `party0` assets owned by party 0 and `party1` assets owned by party 1.
    pub const fn new(party0: usize, party1: usize) -> Self {
        Self { party0, party1 }
    }

    /// The number of assets originally owned by `party`.
    pub fn of(&self, party: Party) -> usize {
        match party {
            Party::Zero => self.party0,
            Party::One => self.party1,
        }
    }

    /// The total number of assets, `n = n0 + n1`.
    pub fn total(&self) -> usize {
        self.party0.saturating_add(self.party1)
    }

    /// The enumerator over all allocations of these assets.
    pub fn enumerator(&self) -> Result<Enumerator, TooManyAssets> {
        Enumerator::new(self.total())
    }

    /// The identifiers of all assets, in flat index order.
    pub fn asset_ids(&self) -> impl Iterator<Item = AssetId> + use<> {
        let party0 = (0..self.party0).map(|index| AssetId::new(Party::Zero, index));
        let party1 = (0..self.party1).map(|index| AssetId::new(Party::One, index));
        party0.chain(party1)
    }

    /// The identifier of the asset at flat index `i`.
    pub fn asset_id(&self, i: usize) -> Option<AssetId> {
        if i < self.party0 {
            Some(AssetId::new(Party::Zero, i))
        } else if i < self.total() {
            Some(AssetId::new(Party::One, i - self.party0))
        } else {
            None
        }
    }

    /// The flat index of the asset `id`.
    pub fn flat_index(&self, id: AssetId) -> Result<usize, Error> {
        let count = self.of(id.owner);
        if id.index >= count {
            return Err(Error::UnknownAsset { id, count });
        }
        Ok(match id.owner {
            Party::Zero => id.index,
            Party::One => self.party0 + id.index,
        })
    }
}

/// The boundary name of an asset: its original owner and its position in that owner's block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct AssetId {
    /// The party that originally owns the asset.
    pub owner: Party,
    /// The position of the asset among the assets of `owner`.
    pub index: usize,
}

impl AssetId {
    /// The `index`-th asset originally owned by `owner`.
    pub const fn new(owner: Party, index: usize) -> Self {
        Self { owner, index }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Asset{}", self.owner, self.index)
    }
}

impl FromStr for AssetId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidAssetId(s.to_string());
        let rest = s.strip_prefix("party").ok_or_else(invalid)?;
        let (owner, rest) = rest.split_at_checked(1).ok_or_else(invalid)?;
        let owner = match owner {
            "0" => Party::Zero,
            "1" => Party::One,
            _ => return Err(invalid()),
        };
        let index = rest.strip_prefix("Asset").ok_or_else(invalid)?;
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let index = index.parse().map_err(|_| invalid())?;
        Ok(AssetId { owner, index })
    }
}

impl From<AssetId> for String {
    fn from(id: AssetId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for AssetId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// The private valuation tables of both parties, one value per asset in flat index order.
///
/// Values of different parties are never combined: the tables are only ever read one party at a
/// time.
#[derive(Clone, PartialEq, Eq)]
pub struct Valuations {
    counts: AssetCounts,
    enumerator: Enumerator,
    tables: [Vec<i32>; 2],
}

impl Valuations {
    /// Checks that both tables hold one value per asset.
    pub fn new(counts: AssetCounts, party0: Vec<i32>, party1: Vec<i32>) -> Result<Self, Error> {
        let enumerator = counts.enumerator()?;
        let expected = counts.total();
        for (party, table) in Party::BOTH.into_iter().zip([&party0, &party1]) {
            if table.len() != expected {
                return Err(Error::WrongValuationCount {
                    party,
                    expected,
                    actual: table.len(),
                });
            }
        }
        Ok(Self {
            counts,
            enumerator,
            tables: [party0, party1],
        })
    }

    /// Builds the tables from valuations keyed by asset identifier.
    pub fn from_keyed(
        counts: AssetCounts,
        party0: impl IntoIterator<Item = (AssetId, i32)>,
        party1: impl IntoIterator<Item = (AssetId, i32)>,
    ) -> Result<Self, Error> {
        let party0 = decode_table(counts, Party::Zero, party0)?;
        let party1 = decode_table(counts, Party::One, party1)?;
        Self::new(counts, party0, party1)
    }

    /// The declared asset counts.
    pub fn counts(&self) -> AssetCounts {
        self.counts
    }

    /// The total number of assets.
    pub fn assets(&self) -> usize {
        self.counts.total()
    }

    /// The enumerator over all allocations of the valued assets.
    pub fn enumerator(&self) -> Enumerator {
        self.enumerator
    }

    /// The valuation table of `party`, in flat asset order.
    pub fn table(&self, party: Party) -> &[i32] {
        &self.tables[party.index()]
    }
}

impl fmt::Debug for Valuations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Valuations")
            .field("counts", &self.counts)
            // valuations are private and must not end up in logs
            .field("tables", &"<REDACTED>")
            .finish()
    }
}

/// Builds the flat valuation table of `party` from per-asset entries.
pub fn decode_table(
    counts: AssetCounts,
    party: Party,
    entries: impl IntoIterator<Item = (AssetId, i32)>,
) -> Result<Vec<i32>, Error> {
    counts.enumerator()?;
    let mut slots = vec![None; counts.total()];
    for (id, value) in entries {
        let slot = &mut slots[counts.flat_index(id)?];
        if slot.is_some() {
            return Err(Error::DuplicateValuation { party, id });
        }
        *slot = Some(value);
    }
    slots
        .into_iter()
        .zip(counts.asset_ids())
        .map(|(slot, id)| slot.ok_or(Error::MissingValuation { party, id }))
        .collect()
}

/// The public result for a single asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicOutput {
    /// The asset.
    pub asset: AssetId,
    /// The party receiving the asset.
    pub owner: Party,
}

/// Labels the final allocation with the boundary names of its assets.
pub fn encode_allocation(
    counts: AssetCounts,
    allocation: &Allocation,
) -> Result<Vec<PublicOutput>, Error> {
    if allocation.len() != counts.total() {
        return Err(Error::WrongAllocationLength {
            expected: counts.total(),
            actual: allocation.len(),
        });
    }
    Ok(counts
        .asset_ids()
        .zip(allocation.owners())
        .map(|(asset, owner)| PublicOutput {
            asset,
            owner: *owner,
        })
        .collect())
}
