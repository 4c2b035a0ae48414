//! CLI entry point for hotkey-combo
//!
//! Provides commands for normalising key names, inspecting how a
//! combination is parsed, and replaying scenario scripts.

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;
use hotkey_combo::core::{normalize, CombinationRule, EventType, ModifierOptions};
use hotkey_combo::script::{load_script, run_script};
use hotkey_combo::{BindingOptions, ManagerConfig};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hotkey-combo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log matching decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the token each raw key name normalises to
    Normalize {
        /// Raw key names (use " " for the space key)
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Parse a combination and print its canonical form
    Parse {
        /// Combination string, e.g. "ctrl shift k"
        combo: String,

        /// Event type (keydown or keyup)
        #[arg(short, long, default_value = "keydown")]
        event: String,

        /// Keys must be pressed in the written order
        #[arg(long)]
        ordered: bool,

        /// Keep repeated keys
        #[arg(long)]
        repeatable: bool,

        #[arg(long)]
        ctrl: bool,
        #[arg(long)]
        alt: bool,
        #[arg(long)]
        shift: bool,
        #[arg(long)]
        meta: bool,

        /// Print the rule as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replay a scenario script and report which bindings fire
    Simulate {
        /// Path to the scenario script
        script: PathBuf,

        /// Inactivity delay in milliseconds
        #[arg(short, long, default_value_t = 500)]
        delay_ms: u64,

        /// Treat bindings as ordered unless they say otherwise
        #[arg(long)]
        ordered: bool,

        /// Keep repeated keys unless bindings say otherwise
        #[arg(long)]
        repeatable: bool,

        /// Treat "all" as a literal key instead of a wildcard
        #[arg(long)]
        no_wildcard: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Normalize { keys } => normalize_keys(&keys),
        Commands::Parse {
            combo,
            event,
            ordered,
            repeatable,
            ctrl,
            alt,
            shift,
            meta,
            json,
        } => {
            let modifiers = ModifierOptions::new()
                .ctrl(ctrl)
                .alt(alt)
                .shift(shift)
                .meta(meta);
            let config = ManagerConfig::default()
                .with_ordered(ordered)
                .with_repeatable(repeatable);
            parse_combo(&combo, &event, modifiers, config, json)?
        }
        Commands::Simulate {
            script,
            delay_ms,
            ordered,
            repeatable,
            no_wildcard,
            json,
        } => {
            let config = ManagerConfig::default()
                .with_delay_ms(delay_ms)
                .with_ordered(ordered)
                .with_repeatable(repeatable)
                .with_wildcard(!no_wildcard);
            simulate(&script, config, json)?
        }
    }

    Ok(())
}

/// Install the tracing subscriber (RUST_LOG wins over --verbose)
fn init_logging(verbose: bool) {
    let default = if verbose { "hotkey_combo=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Print the normalised token of every key
fn normalize_keys(keys: &[String]) {
    for key in keys {
        match normalize(key) {
            Some(token) => println!("{:?} → {}", key, token.to_string().green()),
            None => println!("{:?} → {}", key, "(filtered)".dimmed()),
        }
    }
}

/// Parse one combination and show its identity
fn parse_combo(
    combo: &str,
    event: &str,
    modifiers: ModifierOptions,
    config: ManagerConfig,
    json: bool,
) -> anyhow::Result<()> {
    let event_type: EventType = event.parse()?;
    let options = BindingOptions::new().modifiers(modifiers).resolve(&config);
    let rule = CombinationRule::parse(event_type, combo, &modifiers, options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rule)?);
        return Ok(());
    }

    println!("{} {}", "Combination:".bold(), rule.source());
    println!("  {} {}", "tokens:".dimmed(), rule.canonical().cyan());
    println!("  {} {}", "modifiers:".dimmed(), rule.modifiers().to_string().magenta());
    println!(
        "  {} {}",
        "order:".dimmed(),
        if rule.is_ordered() { "ordered" } else { "any order" }
    );
    println!("  {} {}", "key:".dimmed(), rule.key().to_string().yellow());

    Ok(())
}

/// Replay a scenario and report firings
fn simulate(script: &Path, config: ManagerConfig, json: bool) -> anyhow::Result<()> {
    // Expand tilde in path
    let expanded = shellexpand::tilde(
        script
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid path encoding"))?,
    );
    let path = Path::new(expanded.as_ref());

    let lines = load_script(path).with_context(|| format!("Failed to load {}", path.display()))?;
    let report = run_script(&lines, config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} Replaying: {}", "→".cyan(), path.display());

    if report.firings.is_empty() {
        println!("{} {}", "✗".red().bold(), "No binding fired".bold());
    } else {
        for firing in &report.firings {
            println!(
                "  {} {} {} {}",
                format!("{:>6}ms", firing.at_ms).dimmed(),
                firing.name.green().bold(),
                format!("({:?})", firing.key).cyan(),
                firing.rule.dimmed(),
            );
        }
    }

    println!(
        "\n{} {} event{}, {} firing{}, {} timeout{}",
        "✓".green(),
        report.events,
        if report.events == 1 { "" } else { "s" },
        report.firings.len(),
        if report.firings.len() == 1 { "" } else { "s" },
        report.expired,
        if report.expired == 1 { "" } else { "s" },
    );

    Ok(())
}
