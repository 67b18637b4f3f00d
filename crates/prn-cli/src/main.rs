//! # PRN Driver
//!
//! Thin command-line driver for the Prime Resonance Network substrate:
//! loads a RISA program (text or JSON records), runs it on a fresh
//! engine, and prints the exit status as JSON. A demo subcommand runs a
//! two-party session roundtrip.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use prn_session::PrutcSystem;
use prn_vm::{Engine, Program, DEFAULT_MAX_STEPS};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "prn", about = "Prime Resonance Network driver", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a RISA program and print its exit status.
    Run {
        /// Program file: `.risa` assembler text or `.json` records.
        file: PathBuf,

        /// Step budget before the run is aborted.
        #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
        max_steps: u64,

        /// Seed for the engine RNG.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Register two users, exchange a message, print the decoded payloads.
    DemoSession {
        /// Global seed for key generation.
        #[arg(long, default_value = "demo-seed")]
        seed: String,

        /// Message sent from alice to bob.
        #[arg(long, default_value = "Hello")]
        message: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match Cli::parse().command {
        Command::Run {
            file,
            max_steps,
            seed,
        } => run_program(&file, max_steps, seed),
        Command::DemoSession { seed, message } => demo_session(&seed, &message),
    }
}

fn run_program(file: &Path, max_steps: u64, seed: Option<u64>) -> Result<()> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let program = if file.extension().is_some_and(|ext| ext == "json") {
        Program::parse_json(&source)?
    } else {
        Program::parse(&source)?
    };

    let mut engine = Engine::new();
    if let Some(seed) = seed {
        engine.seed_rng(seed);
    }
    engine.load_program(program)?;
    engine.on_output(Box::new(|line| println!("{line}")));

    let status = engine.run(max_steps);
    println!("{}", serde_json::to_string_pretty(&status)?);
    if status.success {
        Ok(())
    } else {
        bail!(
            "program failed: {}",
            status.error.as_deref().unwrap_or("not halted")
        )
    }
}

fn demo_session(seed: &str, message: &str) -> Result<()> {
    let mut system = PrutcSystem::new(seed);
    system.register_user("alice")?;
    system.register_user("bob")?;

    let session = system.establish_session("alice", "bob")?;
    println!("session {session}");

    system.send(session, "alice", message)?;
    let payloads = system.receive(session, "bob")?;
    for payload in &payloads {
        println!("{}", serde_json::to_string(payload)?);
    }
    system.close_session(session)?;
    Ok(())
}
