//! handswipe - replay recorded hand poses through the swipe recognizer.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use handswipe::replay::TracePoseSource;
use handswipe::{Config, DetectorMode, Direction, GestureDispatcher, SwipeCallbacks};

#[derive(Parser, Debug)]
#[command(name = "handswipe", version, about = "Hand-pose swipe recognizer")]
struct Cli {
    /// Configuration plist, e.g. (:block-duration 0.3)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Start from the single-direction defaults (1s cooldown)
    #[arg(long, global = true)]
    legacy: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Feed a pose trace through the recognizer and print fired swipes
    Replay {
        /// Pose trace, one s-expression per line
        trace: PathBuf,

        /// Detect only this direction: left, right, up or down
        #[arg(long)]
        direction: Option<String>,

        /// Print the final status plist after the trace
        #[arg(long)]
        status: bool,
    },
    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "handswipe=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref(), cli.legacy)?;

    match cli.command {
        Command::Config => {
            println!("{}", config.config_sexp());
            Ok(())
        }
        Command::Replay {
            trace,
            direction,
            status,
        } => replay(config, &trace, direction.as_deref(), status),
    }
}

fn load_config(path: Option<&Path>, legacy: bool) -> Result<Config> {
    let mut config = if legacy { Config::legacy() } else { Config::default() };
    if let Some(path) = path {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let value = handswipe::sexp::parse(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config
            .apply_sexp(&value)
            .with_context(|| format!("applying config {}", path.display()))?;
    }
    Ok(config)
}

fn replay(config: Config, trace: &Path, direction: Option<&str>, status: bool) -> Result<()> {
    let text = std::fs::read_to_string(trace)
        .with_context(|| format!("reading trace {}", trace.display()))?;
    let mut source = TracePoseSource::parse(&text)
        .with_context(|| format!("parsing trace {}", trace.display()))?;
    info!("replaying {} samples from {}", source.len(), trace.display());

    let mut dispatcher = GestureDispatcher::new(config)?;
    dispatcher.subscribe_neutral(|state| {
        info!("neutral {} (distance {:.4}m)", state.neutral, state.distance);
    });

    let callbacks = SwipeCallbacks::all(|event| {
        info!("swipe {} at {:.3}s", event.direction.as_str(), event.time);
    });
    match direction {
        Some(name) => {
            let direction = Direction::parse(name)?;
            dispatcher.add_detector_with_mode(DetectorMode::Single(direction), callbacks);
        }
        None => {
            dispatcher.add_detector(callbacks);
        }
    }

    let mut fired = 0usize;
    while let Some(now) = source.next_time() {
        let events = dispatcher
            .tick_source(&mut source, now)
            .with_context(|| format!("tick at {:.4}s", now))?;
        for event in events {
            println!("{}", event.to_sexp());
            fired += 1;
        }
    }
    info!("replay finished: {} swipes", fired);

    if status {
        println!("{}", dispatcher.status_sexp());
    }
    Ok(())
}
