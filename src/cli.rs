//! CLI interface for instinct

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{Read, Write};
use tracing::error;

use crate::config::{Paths, Settings};
use crate::learning::{InstinctStore, LearningEngine, PatternDetector};
use crate::observation::{Capture, ObservationStore};

#[derive(Parser)]
#[command(name = "instinct")]
#[command(about = "Session self-observation and tool-sequence instinct mining", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record one tool-use hook event from stdin (invoked by the host)
    Observe {
        /// Hook kind hint, e.g. PreToolUse or PostToolUse
        hook_kind: Option<String>,
    },
    /// Mine the observation log for recurring tool sequences (session end)
    Learn,
    /// Inspect persisted instincts
    Instincts {
        #[command(subcommand)]
        command: InstinctCommands,
    },
    /// Show store status
    Status,
    /// Re-enable observation capture
    Enable,
    /// Disable observation capture
    Disable,
}

#[derive(Subcommand)]
enum InstinctCommands {
    /// Show instinct statistics
    Stats,
    /// List instincts, strongest first
    List {
        /// Only show instincts at or above this confidence
        #[arg(long)]
        min_confidence: Option<f64>,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // The hook-facing commands must be invisible to the host: any
        // failure becomes a diagnostic on stderr and a zero exit.
        Commands::Observe { hook_kind } => {
            if let Err(e) = run_observe(hook_kind.as_deref()) {
                error!("Observation capture failed: {:#}", e);
            }
            Ok(())
        }
        Commands::Learn => {
            if let Err(e) = run_learn() {
                error!("Pattern analysis failed: {:#}", e);
            }
            Ok(())
        }
        Commands::Instincts { command } => match command {
            InstinctCommands::Stats => show_stats(),
            InstinctCommands::List { min_confidence } => list_instincts(min_confidence),
        },
        Commands::Status => show_status(),
        Commands::Enable => set_enabled(true),
        Commands::Disable => set_enabled(false),
    }
}

/// Capture process: one hook event in, the same payload out. Recording is
/// a side channel; the pass-through must survive every failure mode.
fn run_observe(hook_kind: Option<&str>) -> Result<()> {
    let paths = Paths::resolve()?;
    std::fs::create_dir_all(paths.root())
        .with_context(|| format!("Failed to create {}", paths.root().display()))?;

    // Opt-out gate: bail before touching stdin
    if paths.is_disabled() {
        return Ok(());
    }

    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .context("Failed to read hook payload from stdin")?;

    observe_and_echo(&paths, hook_kind, &raw, &mut std::io::stdout())
}

/// Record the payload, then echo it through byte-for-byte. The echo does
/// not depend on recording succeeding.
fn observe_and_echo(
    paths: &Paths,
    hook_kind: Option<&str>,
    raw: &str,
    out: &mut impl Write,
) -> Result<()> {
    let recorded = (|| -> Result<()> {
        let settings = Settings::load(&paths.config_file())?;
        let store = ObservationStore::new(paths, &settings);
        let capture = Capture::new(store, &settings);
        capture.observe(hook_kind, raw)?;
        Ok(())
    })();
    if let Err(e) = recorded {
        error!("Failed to record observation: {:#}", e);
    }

    if !raw.trim().is_empty() {
        out.write_all(raw.as_bytes())
            .context("Failed to echo hook payload")?;
        out.flush().context("Failed to flush stdout")?;
    }
    Ok(())
}

/// Analysis process: read everything, promote recurring sequences
fn run_learn() -> Result<()> {
    let paths = Paths::resolve()?;
    let settings = Settings::load(&paths.config_file())?;

    std::fs::create_dir_all(paths.root())
        .with_context(|| format!("Failed to create {}", paths.root().display()))?;
    // Reserved for instincts promoted into full skills
    std::fs::create_dir_all(paths.learned_skills_dir()).with_context(|| {
        format!("Failed to create {}", paths.learned_skills_dir().display())
    })?;

    let engine = LearningEngine::new(
        ObservationStore::new(&paths, &settings),
        InstinctStore::with_dir(paths.instincts_dir())?,
        PatternDetector::from_settings(&settings),
        settings.min_observations,
    );
    engine.run_cycle()?;
    Ok(())
}

fn show_stats() -> Result<()> {
    let paths = Paths::resolve()?;
    let store = InstinctStore::with_dir(paths.instincts_dir())?;
    let instincts = store.list()?;

    println!("Instincts: {}", instincts.len());
    if instincts.is_empty() {
        return Ok(());
    }

    let mean: f64 =
        instincts.iter().map(|i| i.confidence).sum::<f64>() / instincts.len() as f64;
    println!("Mean confidence: {:.2}", mean);

    // list() is sorted strongest first
    let strongest = &instincts[0];
    println!(
        "Strongest: {} ({})",
        strongest.id,
        strongest.confidence_label()
    );
    Ok(())
}

fn list_instincts(min_confidence: Option<f64>) -> Result<()> {
    let paths = Paths::resolve()?;
    let store = InstinctStore::with_dir(paths.instincts_dir())?;
    let floor = min_confidence.unwrap_or(0.0);

    let mut shown = 0;
    for instinct in store.list()? {
        if instinct.confidence < floor {
            continue;
        }
        println!(
            "{}  {}  {}",
            instinct.confidence_label(),
            instinct.id,
            instinct.trigger
        );
        shown += 1;
    }
    if shown == 0 {
        println!("No instincts to show. Run 'instinct learn' after a session.");
    }
    Ok(())
}

fn show_status() -> Result<()> {
    let paths = Paths::resolve()?;
    let settings = Settings::load(&paths.config_file())?;
    let observations = ObservationStore::new(&paths, &settings);
    let instincts = InstinctStore::with_dir(paths.instincts_dir())?;

    println!("{} v{}", crate::NAME, crate::VERSION);
    println!("Data directory: {}", paths.root().display());
    println!(
        "Capture: {}",
        if paths.is_disabled() {
            "disabled"
        } else {
            "enabled"
        }
    );
    println!("Observations: {}", observations.count());
    println!("Archived logs: {}", observations.archive_count());
    println!("Instincts: {}", instincts.count());
    Ok(())
}

fn set_enabled(enabled: bool) -> Result<()> {
    let paths = Paths::resolve()?;
    paths.set_disabled(!enabled)?;
    println!(
        "Observation capture {}",
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}
