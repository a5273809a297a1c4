//! Command line front end for fair two-party asset swaps.
use std::{collections::BTreeMap, fs, path::PathBuf};

use anyhow::{Context, bail};
use asset_swap::{
    allocation::Allocation,
    circuit::SwapProgram,
    codec::{AssetCounts, AssetId, Valuations, encode_allocation},
    host::{Host, MemoryHost, PARTY0_ASSETS, PARTY1_ASSETS, SwapInputs, run_swap},
};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

/// Negotiates a fair reallocation of assets between two parties.
///
/// Logging can be controlled with an EnvFilter via the `ASSET_SWAP_LOG` environment
/// variable.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Runs the swap described by a JSON input document and prints the published outputs.
    Negotiate {
        /// The input document, with `public` and `private` inputs.
        input: PathBuf,
        /// Also evaluate the Garble program and check that it agrees.
        #[arg(long)]
        circuit: bool,
    },
    /// Prints the Garble program for the given asset counts.
    Program {
        /// The number of assets originally owned by party 0.
        #[arg(long)]
        party0_assets: usize,
        /// The number of assets originally owned by party 1.
        #[arg(long)]
        party1_assets: usize,
    },
}

fn main() -> anyhow::Result<()> {
    init_tracing().context("tracing initialization")?;

    match Cli::parse().command {
        Command::Negotiate { input, circuit } => negotiate(input, circuit),
        Command::Program {
            party0_assets,
            party1_assets,
        } => {
            let counts = AssetCounts::new(party0_assets, party1_assets);
            let program = SwapProgram::render(counts)?;
            info!(hash = %program.hash(), "rendered swap program");
            println!("{}", program.source());
            Ok(())
        }
    }
}

fn negotiate(input: PathBuf, circuit: bool) -> anyhow::Result<()> {
    let json = fs::read_to_string(&input)
        .with_context(|| format!("could not read {}", input.display()))?;
    let inputs: SwapInputs = serde_json::from_str(&json)
        .with_context(|| format!("{} is not a valid swap document", input.display()))?;

    let mut host = MemoryHost::new(inputs.clone());
    let allocation = run_swap(&mut host)?;
    let unused = host.unused_inputs();
    if !unused.is_empty() {
        bail!("unused inputs: {}", unused.join(", "));
    }

    let counts = AssetCounts::new(
        host.public_input(PARTY0_ASSETS)?,
        host.public_input(PARTY1_ASSETS)?,
    );
    if circuit {
        check_circuit(counts, &inputs, &allocation)?;
    }
    let outputs = encode_allocation(counts, &allocation)?;
    println!("{}", serde_json::to_string_pretty(&outputs)?);
    Ok(())
}

fn check_circuit(
    counts: AssetCounts,
    inputs: &SwapInputs,
    allocation: &Allocation,
) -> anyhow::Result<()> {
    let keyed = |table: &BTreeMap<String, i32>| {
        table
            .iter()
            .map(|(id, value)| Ok((id.parse::<AssetId>()?, *value)))
            .collect::<Result<Vec<_>, asset_swap::codec::Error>>()
    };
    let valuations = Valuations::from_keyed(
        counts,
        keyed(&inputs.private.party0)?,
        keyed(&inputs.private.party1)?,
    )?;
    let program = SwapProgram::render(counts)?;
    info!(hash = %program.hash(), "evaluating swap program");
    let evaluated = program
        .compile()
        .context("circuit check")?
        .evaluate(&valuations)
        .context("circuit check")?;
    if &evaluated != allocation {
        bail!("the circuit computed {evaluated}, but the negotiation computed {allocation}");
    }
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::builder()
        .with_env_var("ASSET_SWAP_LOG")
        .with_default_directive("asset_swap=info".parse()?)
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
