//! The negotiation engine: an exhaustive scan over all allocations under mutual acceptance.
//!
//! The scan starts with the initial allocation as the leader and visits every other candidate
//! in enumeration order. A candidate replaces the leader iff it is at least as good as the leader
//! for *both* parties. Ties replace the leader too, which changes which allocations later
//! candidates are compared against, so the rule is `>=` on both components and nothing else.
//!
//! No candidate is ever skipped and the scan never ends early. The leader is updated through an
//! arithmetic mux on every step, whether or not the candidate is accepted, so the sequence of
//! operations is the same for all valuations. The cost is `O(2^n * n)`, see
//! [`MAX_ASSETS`](crate::enumerate::MAX_ASSETS).
//!
//! The scan can only be run as a whole, so it cannot be fed deltas of the wrong length:
//!
//! ```compile_fail
//! use asset_swap::negotiate::Negotiation;
//! ```

use tracing::debug;

use crate::{
    allocation::Allocation,
    codec::Valuations,
    enumerate::Delta,
    score::{Score, score},
};

/// Negotiates the final allocation of the assets described by `valuations`.
///
/// The result weakly dominates the initial allocation for both parties.
pub fn negotiate(valuations: &Valuations) -> Allocation {
    let enumerator = valuations.enumerator();
    debug!(
        assets = enumerator.assets(),
        candidates = enumerator.candidates(),
        "starting negotiation"
    );
    let mut negotiation = Negotiation::new(valuations);
    // k = 0 is the initial allocation, which is already the leader
    for delta in enumerator.iter().skip(1) {
        negotiation.consider(&delta);
    }
    debug!("negotiation finished");
    negotiation.into_leader()
}

/// The state of a negotiation in progress.
///
/// Apart from the final leader, nothing observable about a negotiation may depend on the
/// valuations. Steps are never logged. Every delta must come from the enumerator of the
/// valuations, which is why single steps are not exposed outside the crate.
pub(crate) struct Negotiation<'a> {
    valuations: &'a Valuations,
    initial: Allocation,
    leader: Allocation,
    leader_score: Score,
    candidate: Allocation,
}

impl<'a> Negotiation<'a> {
    /// Starts a negotiation with the initial allocation as the leader.
    pub(crate) fn new(valuations: &'a Valuations) -> Self {
        let initial = Allocation::initial(valuations.counts());
        let leader_score = score(&initial, valuations);
        Self {
            valuations,
            leader: initial.clone(),
            candidate: initial.clone(),
            initial,
            leader_score,
        }
    }

    /// Applies the mutual-acceptance rule to the candidate `initial XOR delta`.
    pub(crate) fn consider(&mut self, delta: &Delta) {
        self.candidate.set_xor(&self.initial, delta);
        let candidate_score = score(&self.candidate, self.valuations);
        let accept = candidate_score.weakly_dominates(&self.leader_score);
        self.leader.select_from(accept, &self.candidate);
        self.leader_score = self.leader_score.select(accept, &candidate_score);
    }

    /// The current leader.
    #[cfg(test)]
    pub(crate) fn leader(&self) -> &Allocation {
        &self.leader
    }

    /// The score of the current leader.
    #[cfg(test)]
    pub(crate) fn leader_score(&self) -> Score {
        self.leader_score
    }

    /// Ends the negotiation, returning the leader.
    pub(crate) fn into_leader(self) -> Allocation {
        self.leader
    }
}
