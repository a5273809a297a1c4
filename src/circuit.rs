//! The negotiation as a [Garble](https://garble-lang.org/) program.
//!
//! Garble programs compile to boolean circuits, which is the form an MPC engine needs to run the
//! swap without revealing the valuations. The program scans exactly the same candidates in exactly
//! the same order as [`negotiate`](crate::negotiate::negotiate): the deltas are taken from the
//! [`Enumerator`] and embedded in the program source.
//!
//! Party 0 supplies its valuations as `[i32; n]`, party 1 supplies its valuations as `[i32; n]`,
//! and the output is `[bool; n]`, with `true` meaning that the asset goes to party 1.

use garble_lang::{
    GarbleProgram, compile, eval::EvalError, literal::Literal, token::SignedNumType,
};
use tracing::debug;

use crate::{
    allocation::{Allocation, Party},
    codec::{AssetCounts, Valuations},
    enumerate::{Enumerator, TooManyAssets},
};

/// The largest number of assets for which a program is rendered.
///
/// The circuit grows with `2^n`, so larger programs are impractical to compile and execute.
pub const MAX_CIRCUIT_ASSETS: usize = 10;

const TEMPLATE: &str = include_str!("circuit/asset_swap.garble.rs");

/// Errors that can occur while rendering, compiling or evaluating a swap program.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Programs are only rendered for `1..=MAX_CIRCUIT_ASSETS` assets.
    #[error("programs can be rendered for 1 to {MAX_CIRCUIT_ASSETS} assets, not {0}")]
    UnsupportedAssetCount(usize),
    /// The rendered program does not compile.
    // TODO use source for garble error once they implement Error trait
    #[error("the swap program does not compile: {0:?}")]
    Compile(garble_lang::Error),
    /// The valuations were rejected by the program.
    #[error("invalid input to the swap program: {0:?}")]
    InvalidInput(EvalError),
    /// The program could not be evaluated.
    #[error("evaluation of the swap program failed: {0:?}")]
    Eval(EvalError),
    /// The program returned something other than one owner bit per asset.
    #[error("unexpected output of the swap program: {0}")]
    UnexpectedOutput(String),
    /// The valuations do not match the counts the program was rendered for.
    #[error("the program was rendered for {expected:?}, but the valuations are for {actual:?}")]
    CountsMismatch {
        /// The counts of the program.
        expected: AssetCounts,
        /// The counts of the valuations.
        actual: AssetCounts,
    },
}

/// The Garble source of a swap for fixed, public asset counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapProgram {
    counts: AssetCounts,
    source: String,
}

impl SwapProgram {
    /// Renders the program for `counts`.
    pub fn render(counts: AssetCounts) -> Result<Self, Error> {
        let assets = counts.total();
        if !(1..=MAX_CIRCUIT_ASSETS).contains(&assets) {
            return Err(Error::UnsupportedAssetCount(assets));
        }
        let enumerator =
            Enumerator::new(assets).map_err(|TooManyAssets(n)| Error::UnsupportedAssetCount(n))?;
        let initial = Allocation::initial(counts);
        let initial = bool_array(initial.owners().iter().map(|owner| owner.bit()));
        // k = 0 is the initial allocation, which the program starts with
        let deltas: Vec<String> = enumerator
            .iter()
            .skip(1)
            .map(|delta| bool_array(delta.bits()))
            .collect();
        let deltas = format!("[\n        {}\n    ]", deltas.join(",\n        "));
        let source = TEMPLATE
            .replace("__CANDIDATES__", &(enumerator.candidates() - 1).to_string())
            .replace("__ASSETS__", &assets.to_string())
            .replace("__INITIAL__", &initial)
            .replace("__DELTAS__", &deltas);
        Ok(Self { counts, source })
    }

    /// The counts the program was rendered for.
    pub fn counts(&self) -> AssetCounts {
        self.counts
    }

    /// The Garble source code.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The BLAKE3 hash of the source, for parties to check they are running the same program.
    pub fn hash(&self) -> String {
        blake3::hash(self.source.as_bytes()).to_string()
    }

    /// Compiles the program to a circuit.
    pub fn compile(&self) -> Result<CompiledSwap, Error> {
        let program = compile(&self.source).map_err(Error::Compile)?;
        debug!(
            assets = self.counts.total(),
            hash = %self.hash(),
            "compiled swap program"
        );
        Ok(CompiledSwap {
            counts: self.counts,
            program,
        })
    }
}

fn bool_array(bits: impl Iterator<Item = bool>) -> String {
    let bits: Vec<String> = bits.map(|bit| bit.to_string()).collect();
    format!("[{}]", bits.join(", "))
}

/// A compiled swap program.
pub struct CompiledSwap {
    counts: AssetCounts,
    program: GarbleProgram,
}

impl CompiledSwap {
    /// The compiled Garble program, ready to be executed by an MPC engine.
    pub fn program(&self) -> &GarbleProgram {
        &self.program
    }

    /// Evaluates the circuit in the clear.
    ///
    /// This reveals all valuations to the caller and is meant for checking the circuit against
    /// [`negotiate`](crate::negotiate::negotiate), not for running a swap between two parties.
    pub fn evaluate(&self, valuations: &Valuations) -> Result<Allocation, Error> {
        if valuations.counts() != self.counts {
            return Err(Error::CountsMismatch {
                expected: self.counts,
                actual: valuations.counts(),
            });
        }
        let mut eval = self.program.evaluator();
        for party in Party::BOTH {
            eval.set_literal(table_literal(valuations.table(party)))
                .map_err(Error::InvalidInput)?;
        }
        let output = eval.run().map_err(Error::Eval)?;
        let output = output.into_literal().map_err(Error::Eval)?;
        decode_output(output, self.counts.total())
    }
}

/// The Garble literal of a valuation table.
pub fn table_literal(table: &[i32]) -> Literal {
    Literal::Array(
        table
            .iter()
            .map(|value| Literal::NumSigned((*value).into(), SignedNumType::I32))
            .collect(),
    )
}

/// Decodes the `[bool; n]` output of the program.
pub fn decode_output(output: Literal, assets: usize) -> Result<Allocation, Error> {
    let unexpected = |output: &Literal| Error::UnexpectedOutput(output.to_string());
    let Literal::Array(elems) = &output else {
        return Err(unexpected(&output));
    };
    if elems.len() != assets {
        return Err(unexpected(&output));
    }
    let bits = elems
        .iter()
        .map(|elem| match elem {
            Literal::True => Ok(true),
            Literal::False => Ok(false),
            _ => Err(unexpected(&output)),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Allocation::from_bits(bits))
}
