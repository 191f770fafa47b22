//! snake-duo: terminal front end for the shared-region snake game.
//!
//! Start it twice against the same backing file. The first becomes
//! Active; the second waits and takes over when the first quits, dies,
//! or hands off with `t`.

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use clap::Parser;
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
use snake_engine::engine::SnakeEngine;
use snake_engine::hashing::canonical_hash;
use tracing_subscriber::{fmt, EnvFilter};

use snake_runtime::config::RuntimeConfig;
use snake_runtime::display::TerminalDisplay;
use snake_runtime::input::TerminalInput;
use snake_runtime::layout::{ProcessId, Snapshot};
use snake_runtime::process_loop::ProcessLoop;
use snake_runtime::region::SharedRegion;
use snake_runtime::{Result, RuntimeError};

#[derive(Parser, Debug)]
#[command(name = "snake-duo", version)]
#[command(about = "Snake shared between two processes with heartbeat failover")]
struct Cli {
    /// Backing file for the shared region [default: /dev/shm/snake-duo.region]
    file: Option<PathBuf>,

    /// Byte offset into FILE, in hex (`1000` or `0x1000`) [default: 0]
    #[arg(value_parser = parse_hex_offset)]
    offset: Option<u64>,

    /// JSON file overriding runtime defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for food placement
    #[arg(long)]
    seed: Option<u64>,

    /// Write logs here; the game screen owns the terminal
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print the decoded region as JSON and exit
    #[arg(long)]
    inspect: bool,
}

fn parse_hex_offset(raw: &str) -> std::result::Result<u64, String> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    u64::from_str_radix(digits, 16).map_err(|e| format!("invalid hex offset {raw:?}: {e}"))
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // --help and --version land here too.
            return if err.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "exiting");
            eprintln!("snake-duo: {err}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging(cli.log_file.as_deref(), cli.inspect)?;
    let config = load_config(&cli)?;

    if cli.inspect {
        let snapshot = SharedRegion::peek(&config.region_path, config.region_offset)?;
        return inspect(&config, &snapshot);
    }
    let (region, _) =
        SharedRegion::open(&config.region_path, config.region_offset, config.size_policy)?;

    let seed = config.rng_seed.unwrap_or_else(rand::random);
    let me = ProcessId::generate();
    tracing::info!(%me, seed, path = %config.region_path.display(), "starting");

    let shutdown = Arc::new(AtomicBool::new(false));
    install_signal_flag(&shutdown)?;

    let display = TerminalDisplay::enter()?;
    let mut process = ProcessLoop::new(
        &config,
        region,
        SnakeEngine::new(seed),
        me,
        TerminalInput::new(),
        display,
        Instant::now(),
    );
    process.run(&shutdown)
}

/// Termination signals raise `shutdown`; the loop then exits and
/// releases ownership instead of leaving the partner to time out.
fn install_signal_flag(shutdown: &Arc<AtomicBool>) -> Result<()> {
    for signal in [SIGINT, SIGTERM, SIGHUP] {
        signal_hook::flag::register(signal, Arc::clone(shutdown)).map_err(RuntimeError::Signal)?;
    }
    Ok(())
}

/// Defaults, then the JSON file, then command-line arguments.
fn load_config(cli: &Cli) -> Result<RuntimeConfig> {
    let mut config = match &cli.config {
        Some(path) => RuntimeConfig::from_file(path)?,
        None => RuntimeConfig::default(),
    };
    if let Some(file) = &cli.file {
        config.region_path = file.clone();
    }
    if let Some(offset) = cli.offset {
        config.region_offset = offset;
    }
    if let Some(seed) = cli.seed {
        config.rng_seed = Some(seed);
    }
    config.validate()?;
    Ok(config)
}

/// `RUST_LOG` overrides the default `warn` filter. Without a log file,
/// interactive runs stay silent so the raw-mode screen is not corrupted.
fn init_logging(log_file: Option<&Path>, to_stderr: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| RuntimeError::io(path, e))?;
            fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None if to_stderr => {
            fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(io::stderr)
                .init();
        }
        None => {}
    }
    Ok(())
}

fn inspect(config: &RuntimeConfig, snapshot: &Snapshot) -> Result<()> {
    let report = serde_json::json!({
        "path": config.region_path.display().to_string(),
        "offset": config.region_offset,
        "header_valid": snapshot.is_valid(),
        "snapshot": snapshot,
        "game_hash": canonical_hash(&snapshot.game),
    });
    let out = io::stdout().lock();
    serde_json::to_writer_pretty(out, &report).map_err(|e| RuntimeError::Terminal(e.into()))?;
    println!();
    Ok(())
}
