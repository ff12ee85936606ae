//! Binary entry point for the Rolex CLI: train an engine from a sorted
//! key/value file, serve it over the RPC surface, or inspect a serialized
//! arena. Intentionally thin — not a workload-generation benchmark harness,
//! which spec §1 keeps out of the core's scope.

use std::error::Error;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rolex::admin::{stats, verify};
use rolex::{RolexConfig, RolexEngine};

type BoxError = Box<dyn Error>;

/// Fixed leaf capacity for the CLI binary. `N` is a compile-time parameter
/// on [`RolexEngine`] since it determines the on-wire leaf layout; the
/// library itself is generic over it, but a single binary has to settle on
/// one value to have a concrete type to build/load.
const LEAF_CAPACITY: usize = 64;

type Engine = RolexEngine<LEAF_CAPACITY>;

#[derive(Parser, Debug)]
#[command(name = "rolex", version, about = "Learned ordered key-value index")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Trains an engine from a sorted `key,value` file and writes the
    /// serialized arena to disk.
    Train {
        #[arg(long, value_name = "FILE")]
        keys: PathBuf,
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
        #[arg(long, default_value_t = 32)]
        epsilon: usize,
        #[arg(long, default_value_t = 128)]
        syn_max: usize,
        #[arg(long, default_value_t = 1 << 20)]
        leaf_capacity: usize,
    },
    /// Loads a serialized arena and runs the RPC server against it.
    Serve {
        #[arg(long, value_name = "FILE")]
        arena: PathBuf,
        #[arg(long, default_value = "127.0.0.1:7878")]
        addr: SocketAddr,
    },
    /// Prints submodel count, leaf occupancy, and a structural integrity
    /// check for a serialized arena.
    Inspect {
        #[arg(long, value_name = "FILE")]
        arena: PathBuf,
        #[arg(long)]
        format: Option<OutputFormat>,
    },
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() {
    rolex::logging::init_tracing();
    if let Err(err) = run().await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), BoxError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Train {
            keys,
            out,
            epsilon,
            syn_max,
            leaf_capacity,
        } => cmd_train(keys, out, epsilon, syn_max, leaf_capacity),
        Command::Serve { arena, addr } => cmd_serve(arena, addr).await,
        Command::Inspect { arena, format } => cmd_inspect(arena, format.unwrap_or(OutputFormat::Text)),
    }
}

fn cmd_train(
    keys_path: PathBuf,
    out_path: PathBuf,
    epsilon: usize,
    syn_max: usize,
    leaf_capacity: usize,
) -> Result<(), BoxError> {
    let contents = fs::read_to_string(&keys_path)?;
    let mut keys = Vec::new();
    let mut vals = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (k, v) = line
            .split_once(',')
            .ok_or_else(|| format!("malformed line (expected `key,value`): {line}"))?;
        keys.push(k.trim().parse::<u64>()?);
        vals.push(v.trim().parse::<u64>()?);
    }

    let config = RolexConfig {
        epsilon,
        syn_max,
        leaf_capacity,
        ..RolexConfig::default()
    };
    let engine = Engine::train(&keys, &vals, config);
    let bytes = engine.serialize()?;
    fs::write(&out_path, &bytes)?;
    tracing::info!(
        keys = keys.len(),
        out = %out_path.display(),
        bytes = bytes.len(),
        "wrote trained arena"
    );
    Ok(())
}

async fn cmd_serve(arena_path: PathBuf, addr: SocketAddr) -> Result<(), BoxError> {
    let bytes = fs::read(&arena_path)?;
    let engine = std::sync::Arc::new(Engine::deserialize(&bytes)?);
    rolex::rpc::serve(engine, addr).await?;
    Ok(())
}

fn cmd_inspect(arena_path: PathBuf, format: OutputFormat) -> Result<(), BoxError> {
    let bytes = fs::read(&arena_path)?;
    let engine = Engine::deserialize(&bytes)?;
    let report = stats(&engine);
    let integrity = verify(&engine);

    match format {
        OutputFormat::Json => {
            let combined = serde_json::json!({
                "stats": report,
                "verify": integrity,
            });
            println!("{}", serde_json::to_string_pretty(&combined)?);
        }
        OutputFormat::Text => {
            println!("submodels:        {}", report.submodels);
            println!(
                "leaves used:      {} / {} ({:.1}%)",
                report.leaves_used,
                report.leaves_capacity,
                report.leaf_utilization * 100.0
            );
            for sm in &report.per_submodel {
                println!(
                    "  submodel {:>4}  pivot={:<12} capacity={:<6} slots={:<4} synonyms={}/{}",
                    sm.index, sm.pivot_key, sm.capacity, sm.slots, sm.synonym_leaves, sm.syn_max
                );
            }
            println!(
                "integrity:        {} ({} findings)",
                if integrity.success { "OK" } else { "FAILED" },
                integrity.findings.len()
            );
            for finding in &integrity.findings {
                println!("  [{:?}] {}", finding.severity, finding.message);
            }
        }
    }
    Ok(())
}
