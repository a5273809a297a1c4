//! An in-process simulation of a swap between two parties.
//!
//! Each party runs in its own task and talks to a trusted dealer over a
//! [`Channel`](crate::channel::Channel). The dealer stands in for the secure-computation runtime:
//! it is the only participant that ever sees both valuation tables, and the parties only ever
//! receive the public allocation. Useful for tests and demos, but it provides none of the privacy
//! of a real MPC engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info};

use crate::{
    allocation::Allocation,
    channel::{self, SimpleChannel, recv_from, send_to},
    codec::{self, AssetCounts, Valuations},
    negotiate::negotiate,
};

/// The participant index of the dealer. Parties have the indices `0` and `1`.
pub const DEALER: usize = 2;

/// Errors that can occur during a simulated swap.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A message could not be sent or received.
    #[error(transparent)]
    Channel(#[from] channel::Error),
    /// The parties expect different asset counts.
    #[error("the parties disagree on the asset counts: {party0:?} vs. {party1:?}")]
    TermsMismatch {
        /// The counts expected by party 0.
        party0: AssetCounts,
        /// The counts expected by party 1.
        party1: AssetCounts,
    },
    /// A valuation table has the wrong shape.
    #[error("invalid valuations")]
    Codec(#[from] codec::Error),
    /// The dealer aborted the swap.
    #[error("the swap was aborted: {0}")]
    Aborted(String),
    /// The task of a participant panicked or was cancelled.
    #[error("a participant task failed")]
    Task(#[from] JoinError),
    /// The parties received different allocations.
    #[error("the parties received different allocations")]
    InconsistentOutputs,
}

/// What a single party brings to a swap.
#[derive(Clone, PartialEq, Eq)]
pub struct PartyInput {
    /// The asset counts the party expects, known to both parties.
    pub counts: AssetCounts,
    /// The party's private valuation of every asset, in flat asset order.
    pub valuations: Vec<i32>,
}

impl fmt::Debug for PartyInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartyInput")
            .field("counts", &self.counts)
            .field("valuations", &"<REDACTED>")
            .finish()
    }
}

/// The dealer's reply to both parties.
#[derive(Debug, Serialize, Deserialize)]
enum Outcome {
    Allocated(Allocation),
    Aborted(String),
}

/// Simulates a swap between two parties and a trusted dealer, returning the public allocation.
pub async fn simulate_swap(inputs: [PartyInput; 2]) -> Result<Allocation, Error> {
    let mut channels = SimpleChannel::channels(DEALER + 1);
    let mut dealer_channel = channels.remove(DEALER);

    let mut parties = JoinSet::new();
    for (party, (mut channel, input)) in channels.into_iter().zip(inputs).enumerate() {
        parties.spawn(async move { run_party(&mut channel, party, input).await });
    }

    let allocation = run_dealer(&mut dealer_channel).await?;

    while let Some(received) = parties.join_next().await {
        if received?? != allocation {
            return Err(Error::InconsistentOutputs);
        }
    }
    info!("simulated swap finished");
    Ok(allocation)
}

async fn run_party(
    channel: &mut SimpleChannel,
    party: usize,
    input: PartyInput,
) -> Result<Allocation, Error> {
    send_to(channel, DEALER, "terms", &input.counts).await?;
    send_to(channel, DEALER, "valuations", &input.valuations).await?;
    match recv_from(channel, DEALER, "outcome").await? {
        Outcome::Allocated(allocation) => {
            debug!(party, "received allocation");
            Ok(allocation)
        }
        Outcome::Aborted(reason) => Err(Error::Aborted(reason)),
    }
}

async fn run_dealer(channel: &mut SimpleChannel) -> Result<Allocation, Error> {
    let mut terms = vec![];
    let mut tables = vec![];
    for party in 0..2 {
        terms.push(recv_from::<AssetCounts>(channel, party, "terms").await?);
        tables.push(recv_from::<Vec<i32>>(channel, party, "valuations").await?);
    }
    let (party0, party1) = (terms[0], terms[1]);
    let valuations = if party0 != party1 {
        Err(Error::TermsMismatch { party0, party1 })
    } else {
        let party1_table = tables.pop().unwrap_or_default();
        let party0_table = tables.pop().unwrap_or_default();
        Valuations::new(party0, party0_table, party1_table).map_err(Error::from)
    };
    let valuations = match valuations {
        Ok(valuations) => valuations,
        Err(e) => {
            for party in 0..2 {
                send_to(channel, party, "outcome", &Outcome::Aborted(e.to_string())).await?;
            }
            return Err(e);
        }
    };

    debug!(
        party0 = party0.party0,
        party1 = party0.party1,
        "dealer starts negotiation"
    );
    let allocation = tokio::task::spawn_blocking(move || negotiate(&valuations)).await?;
    let outcome = Outcome::Allocated(allocation.clone());
    for party in 0..2 {
        send_to(channel, party, "outcome", &outcome).await?;
    }
    Ok(allocation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn both_parties_receive_the_negotiated_allocation() -> Result<(), Error> {
        let counts = AssetCounts::new(1, 5);
        let allocation = simulate_swap([
            PartyInput {
                counts,
                valuations: vec![100, 30, 30, 30, 30, 30],
            },
            PartyInput {
                counts,
                valuations: vec![1000, 6, 8, 3, 5, 1],
            },
        ])
        .await?;
        assert_eq!(allocation.labels(), vec![1, 0, 1, 0, 0, 0]);
        Ok(())
    }

    #[tokio::test]
    async fn disagreeing_terms_abort_the_swap() {
        let err = simulate_swap([
            PartyInput {
                counts: AssetCounts::new(1, 1),
                valuations: vec![1, 2],
            },
            PartyInput {
                counts: AssetCounts::new(2, 0),
                valuations: vec![1, 2],
            },
        ])
        .await
        .unwrap_err();
        assert!(matches!(err, Error::TermsMismatch { .. }));
    }

    #[tokio::test]
    async fn malformed_tables_abort_the_swap() {
        let counts = AssetCounts::new(1, 1);
        let err = simulate_swap([
            PartyInput {
                counts,
                valuations: vec![1, 2],
            },
            PartyInput {
                counts,
                valuations: vec![1, 2, 3],
            },
        ])
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Codec(codec::Error::WrongValuationCount { .. })
        ));
    }
}
