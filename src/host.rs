//! The boundary to the runtime that hosts a swap.
//!
//! In production the host is a secure-computation runtime: private inputs are only visible to the
//! party supplying them and only the public outputs are revealed. [`MemoryHost`] is a plain
//! in-memory stand-in that reads everything from a [`SwapInputs`] document.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    allocation::{Allocation, Party},
    codec::{self, AssetCounts, AssetId, Valuations, encode_allocation},
    negotiate::negotiate,
};

/// The id of the public input holding the number of assets originally owned by party 0.
pub const PARTY0_ASSETS: &str = "party0Assets";
/// The id of the public input holding the number of assets originally owned by party 1.
pub const PARTY1_ASSETS: &str = "party1Assets";

/// Errors that can occur while exchanging inputs and outputs with the host.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The host does not provide a public input.
    #[error("missing public input '{0}'")]
    MissingPublicInput(String),
    /// A party did not provide a private input.
    #[error("{party} did not provide private input '{id}'")]
    MissingPrivateInput {
        /// The party expected to provide the input.
        party: Party,
        /// The id of the input.
        id: String,
    },
    /// The inputs have the wrong shape.
    #[error("invalid swap inputs")]
    Codec(#[from] codec::Error),
    /// The host refused a public output.
    #[error("could not publish output '{id}': {reason}")]
    Publish {
        /// The id of the output.
        id: String,
        /// Why the output could not be published.
        reason: String,
    },
}

/// The runtime executing a swap.
pub trait Host {
    /// Reads a public input, known to both parties before the swap starts.
    fn public_input(&mut self, id: &str) -> Result<usize, Error>;

    /// Reads a private input of `party`.
    fn private_input(&mut self, party: Party, id: &str) -> Result<i32, Error>;

    /// Publishes the final owner of an asset to both parties.
    fn publish(&mut self, id: &str, owner: Party) -> Result<(), Error>;
}

/// Runs a complete swap: reads the inputs from `host`, negotiates and publishes the outputs.
///
/// Each party values every asset, party `p`'s valuation of asset `X` being its private input `X`.
/// One output is published per asset, named after the asset.
pub fn run_swap<H: Host>(host: &mut H) -> Result<Allocation, Error> {
    let counts = AssetCounts::new(
        host.public_input(PARTY0_ASSETS)?,
        host.public_input(PARTY1_ASSETS)?,
    );
    counts.enumerator().map_err(codec::Error::from)?;
    info!(
        party0 = counts.party0,
        party1 = counts.party1,
        "starting asset swap"
    );
    let party0 = read_valuations(host, counts, Party::Zero)?;
    let party1 = read_valuations(host, counts, Party::One)?;
    let valuations = Valuations::from_keyed(counts, party0, party1)?;

    let allocation = negotiate(&valuations);

    for output in encode_allocation(counts, &allocation)? {
        host.publish(&output.asset.to_string(), output.owner)?;
    }
    info!("asset swap finished");
    Ok(allocation)
}

fn read_valuations<H: Host>(
    host: &mut H,
    counts: AssetCounts,
    party: Party,
) -> Result<Vec<(AssetId, i32)>, Error> {
    counts
        .asset_ids()
        .map(|id| Ok((id, host.private_input(party, &id.to_string())?)))
        .collect()
}

/// All inputs of a swap, as exchanged with the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapInputs {
    /// The public inputs, [`PARTY0_ASSETS`] and [`PARTY1_ASSETS`].
    pub public: BTreeMap<String, usize>,
    /// The private inputs of both parties.
    pub private: PrivateInputs,
}

/// The private inputs of both parties, keyed by input id.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateInputs {
    /// The private inputs of party 0.
    pub party0: BTreeMap<String, i32>,
    /// The private inputs of party 1.
    pub party1: BTreeMap<String, i32>,
}

impl PrivateInputs {
    fn of(&self, party: Party) -> &BTreeMap<String, i32> {
        match party {
            Party::Zero => &self.party0,
            Party::One => &self.party1,
        }
    }
}

impl fmt::Debug for PrivateInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateInputs")
            .field("party0", &"<REDACTED>")
            .field("party1", &"<REDACTED>")
            .finish()
    }
}

impl SwapInputs {
    /// The inputs describing `valuations`.
    pub fn from_valuations(valuations: &Valuations) -> Self {
        let counts = valuations.counts();
        let public = BTreeMap::from([
            (PARTY0_ASSETS.to_string(), counts.party0),
            (PARTY1_ASSETS.to_string(), counts.party1),
        ]);
        let keyed = |party: Party| -> BTreeMap<String, i32> {
            counts
                .asset_ids()
                .map(String::from)
                .zip(valuations.table(party).iter().copied())
                .collect()
        };
        Self {
            public,
            private: PrivateInputs {
                party0: keyed(Party::Zero),
                party1: keyed(Party::One),
            },
        }
    }
}

/// A [`Host`] holding all inputs in memory and recording the published outputs.
#[derive(Debug, Clone)]
pub struct MemoryHost {
    inputs: SwapInputs,
    used_public: BTreeSet<String>,
    used_private: [BTreeSet<String>; 2],
    outputs: Vec<(String, Party)>,
}

impl MemoryHost {
    /// Creates a host serving `inputs`.
    pub fn new(inputs: SwapInputs) -> Self {
        Self {
            inputs,
            used_public: BTreeSet::new(),
            used_private: [BTreeSet::new(), BTreeSet::new()],
            outputs: vec![],
        }
    }

    /// The outputs published so far, in publishing order.
    pub fn outputs(&self) -> &[(String, Party)] {
        &self.outputs
    }

    /// The inputs that were supplied but never read.
    ///
    /// Private inputs are reported as `party{p}/{id}`.
    pub fn unused_inputs(&self) -> Vec<String> {
        let public = self
            .inputs
            .public
            .keys()
            .filter(|id| !self.used_public.contains(*id))
            .cloned();
        let private = Party::BOTH.into_iter().flat_map(move |party| {
            self.inputs
                .private
                .of(party)
                .keys()
                .filter(move |id| !self.used_private[party.index()].contains(*id))
                .map(move |id| format!("{party}/{id}"))
        });
        public.chain(private).collect()
    }
}

impl Host for MemoryHost {
    fn public_input(&mut self, id: &str) -> Result<usize, Error> {
        let value = *self
            .inputs
            .public
            .get(id)
            .ok_or_else(|| Error::MissingPublicInput(id.to_string()))?;
        self.used_public.insert(id.to_string());
        Ok(value)
    }

    fn private_input(&mut self, party: Party, id: &str) -> Result<i32, Error> {
        let value = *self
            .inputs
            .private
            .of(party)
            .get(id)
            .ok_or_else(|| Error::MissingPrivateInput {
                party,
                id: id.to_string(),
            })?;
        self.used_private[party.index()].insert(id.to_string());
        Ok(value)
    }

    fn publish(&mut self, id: &str, owner: Party) -> Result<(), Error> {
        if self.outputs.iter().any(|(published, _)| published == id) {
            return Err(Error::Publish {
                id: id.to_string(),
                reason: "output was already published".to_string(),
            });
        }
        debug!(id, owner = u8::from(owner), "publishing output");
        self.outputs.push((id.to_string(), owner));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_a() -> SwapInputs {
        let valuations = Valuations::new(
            AssetCounts::new(3, 2),
            vec![10, 10, 10, 0, 0],
            vec![0, 0, 0, 10, 10],
        )
        .unwrap();
        SwapInputs::from_valuations(&valuations)
    }

    #[test]
    fn publishes_one_output_per_asset() {
        let mut host = MemoryHost::new(scenario_a());
        let allocation = run_swap(&mut host).unwrap();
        assert_eq!(allocation.labels(), vec![0, 0, 0, 1, 1]);
        let outputs: Vec<(&str, u8)> = host
            .outputs()
            .iter()
            .map(|(id, owner)| (id.as_str(), u8::from(*owner)))
            .collect();
        assert_eq!(
            outputs,
            vec![
                ("party0Asset0", 0),
                ("party0Asset1", 0),
                ("party0Asset2", 0),
                ("party1Asset0", 1),
                ("party1Asset1", 1),
            ]
        );
        assert!(host.unused_inputs().is_empty());
    }

    #[test]
    fn reports_missing_and_unused_inputs() {
        let mut inputs = scenario_a();
        inputs.private.party1.remove("party0Asset2");
        inputs.private.party0.insert("party0Asset9".to_string(), 1);
        let mut host = MemoryHost::new(inputs);
        let err = run_swap(&mut host).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingPrivateInput { party: Party::One, ref id } if id == "party0Asset2"
        ));
        assert!(
            host.unused_inputs()
                .contains(&"party0/party0Asset9".to_string())
        );
    }

    #[test]
    fn requires_the_asset_counts() {
        let mut inputs = scenario_a();
        inputs.public.remove(PARTY1_ASSETS);
        let err = run_swap(&mut MemoryHost::new(inputs)).unwrap_err();
        assert!(matches!(err, Error::MissingPublicInput(id) if id == PARTY1_ASSETS));
    }

    #[test]
    fn rejects_unenumerable_asset_counts_before_reading_valuations() {
        let mut inputs = SwapInputs::default();
        inputs.public.insert(PARTY0_ASSETS.to_string(), usize::MAX);
        inputs.public.insert(PARTY1_ASSETS.to_string(), 1);
        let err = run_swap(&mut MemoryHost::new(inputs)).unwrap_err();
        assert!(matches!(err, Error::Codec(codec::Error::TooManyAssets(_))));
    }

    #[test]
    fn debug_output_redacts_private_inputs() {
        let debug = format!("{:?}", scenario_a());
        assert!(debug.contains("<REDACTED>"));
        assert!(!debug.contains("party1Asset1"));
    }
}
