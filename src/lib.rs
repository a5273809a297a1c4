//! A fair reallocation of indivisible assets between two parties, written so that it can run
//! inside secure multi-party computation (MPC).
//!
//! Each party privately values every asset, its own and the other party's. Valuations of
//! different parties have no common unit, so they are never added to or compared with each other.
//! Instead, the negotiation scans every possible allocation in a fixed order and moves to a
//! candidate whenever it is at least as good as the current leader for *both* parties. As the
//! initial allocation is the first leader, neither party ever ends up worse off than before.
//!
//! Inside MPC the valuations are hidden from everyone, so the sequence of operations must not
//! depend on them: only the final allocation may. The scan is therefore exhaustive, the scoring
//! uses masks instead of branches and the leader is updated through a mux on every step.
//!
//! ## Main Components
//!
//! * [`enumerate`]: The candidate allocations, as deltas from the initial allocation.
//! * [`score`]: Each party's own-perspective value of an allocation.
//! * [`negotiate`]: The [`negotiate::negotiate`] function which runs the scan.
//! * [`codec`]: Asset counts, asset names and valuation tables at the system boundary.
//! * [`host`]: The [`host::Host`] trait for the runtime hosting a swap and [`host::run_swap`].
//! * [`circuit`]: The negotiation as a Garble program, to be executed by an MPC engine.
//! * [`simulate`]: An in-process simulation of a swap over [`channel`]s.
//!
//! ## Example
//!
//! ```
//! use asset_swap::{
//!     codec::{AssetCounts, Valuations},
//!     negotiate::negotiate,
//! };
//!
//! # fn main() -> Result<(), asset_swap::codec::Error> {
//! // party 0 owns asset 0, party 1 owns assets 1 to 5
//! let counts = AssetCounts::new(1, 5);
//! let valuations = Valuations::new(
//!     counts,
//!     vec![100, 30, 30, 30, 30, 30],
//!     vec![1000, 6, 8, 3, 5, 1],
//! )?;
//!
//! let allocation = negotiate(&valuations);
//! assert_eq!(allocation.labels(), vec![1, 0, 1, 0, 0, 0]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Cost
//!
//! The scan visits all `2^n` allocations of `n` assets. Any shortcut would have to look at the
//! valuations and would leak them through the running time, so the exponential cost is inherent
//! and [`enumerate::MAX_ASSETS`] is a hard ceiling.
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use garble_lang;

pub mod allocation;
pub mod channel;
pub mod circuit;
pub mod codec;
pub mod enumerate;
pub mod host;
pub mod negotiate;
pub mod score;
pub mod simulate;
