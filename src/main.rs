//! FocusFlow CLI
//!
//! Attention tracking against a GazeFlow eye tracker.

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use crossbeam_channel::RecvTimeoutError;
use focusflow::{
    aoi::{load_index, save_index, AoiKind, Category, Rect},
    collector::GazeCollector,
    config::Config,
    error::Error,
    metrics::{ReportBuilder, SessionReport},
    protocol::{ClientConfig, GazeSessionClient},
    stats::{create_shared_stats_with_persistence, read_persisted, StreamStats},
    tracker::{TickOutcome, TrackingSession},
    RECORDING_NOTICE, VERSION,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "focusflow")]
#[command(version = VERSION)]
#[command(about = "Attention tracking with a GazeFlow eye tracker", long_about = None)]
struct Cli {
    /// Tracker host (overrides config)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Tracker port (overrides config)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// GazeFlow application key (overrides config)
    #[arg(long, global = true)]
    app_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the tracker and print a few samples
    Probe {
        /// Number of samples to read
        #[arg(long, default_value = "10")]
        count: usize,
    },

    /// Manage areas of interest
    Aoi {
        #[command(subcommand)]
        action: AoiAction,
    },

    /// Record a session until Ctrl+C, the duration elapses or the tracker goes away
    Track {
        /// Stop after this many seconds
        #[arg(long)]
        duration: Option<f64>,
    },

    /// Print the summary of a saved session report
    Report {
        /// Path to a report JSON file
        path: PathBuf,
    },

    /// Show cumulative stream statistics
    Status {
        /// Zero the persisted counters
        #[arg(long)]
        reset: bool,
    },

    /// Show configuration
    Config,
}

#[derive(Subcommand)]
enum AoiAction {
    /// Define a new area of interest
    Add {
        /// productive or distraction
        #[arg(long)]
        kind: AoiKind,

        /// Corners as x1,y1,x2,y2
        #[arg(long, allow_hyphen_values = true)]
        rect: Rect,
    },

    /// List defined areas of interest
    List,

    /// Remove all areas of interest
    Clear,
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("focusflow=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load().context("Could not load configuration")?;
    config.tracker = config
        .tracker
        .with_overrides(cli.host, cli.port, cli.app_key);

    match cli.command {
        Commands::Probe { count } => cmd_probe(&config, count),
        Commands::Aoi { action } => cmd_aoi(&config, action),
        Commands::Track { duration } => cmd_track(&config, duration),
        Commands::Report { path } => cmd_report(&path),
        Commands::Status { reset } => cmd_status(&config, reset),
        Commands::Config => cmd_config(&config),
    }
}

fn cmd_probe(config: &Config, count: usize) -> anyhow::Result<()> {
    let tracker = &config.tracker;
    println!("Connecting to GazeFlow at {}:{}...", tracker.host, tracker.port);

    let mut client = GazeSessionClient::new(ClientConfig::default());
    client
        .connect(&tracker.host, tracker.port, &tracker.app_key)
        .context("Handshake failed")?;
    println!("Connected.");
    println!();

    let mut received = 0;
    let mut malformed = 0;
    while received < count {
        match client.receive_sample() {
            Ok(sample) => {
                received += 1;
                println!(
                    "[{}] x={:.1} y={:.1}",
                    Utc::now().format("%H:%M:%S%.3f"),
                    sample.x,
                    sample.y
                );
            }
            Err(Error::Sample(e)) => {
                malformed += 1;
                println!("[{}] {e}", Utc::now().format("%H:%M:%S%.3f"));
            }
            Err(e) => return Err(e).context("Tracker stopped sending samples"),
        }
    }
    client.disconnect();

    println!();
    println!("Read {received} sample(s), {malformed} malformed.");
    Ok(())
}

fn cmd_aoi(config: &Config, action: AoiAction) -> anyhow::Result<()> {
    let path = config.aois_path();
    let mut index = load_index(&path).context("Could not load AOI definitions")?;

    match action {
        AoiAction::Add { kind, rect } => {
            let order = index.add(rect, kind)?;
            save_index(&index, &path).context("Could not save AOI definitions")?;
            println!("Added {kind} AOI #{order} at {}", rect.normalized());
        }
        AoiAction::List => {
            if index.is_empty() {
                println!("No AOIs defined.");
                println!("Run 'focusflow aoi add' to define one.");
                return Ok(());
            }
            println!("Areas of Interest ({})", index.len());
            println!("=====================");
            for aoi in index.iter() {
                println!(
                    "  #{:<3} {:<12} {}  (area {:.0})",
                    aoi.insertion_order,
                    aoi.category().as_str(),
                    aoi.rect,
                    aoi.rect.area()
                );
            }
        }
        AoiAction::Clear => {
            let removed = index.len();
            index.clear()?;
            save_index(&index, &path).context("Could not save AOI definitions")?;
            println!("Removed {removed} AOI(s).");
        }
    }

    Ok(())
}

fn cmd_track(config: &Config, duration: Option<f64>) -> anyhow::Result<()> {
    println!("FocusFlow v{VERSION}");
    println!();

    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let index = load_index(&config.aois_path()).context("Could not load AOI definitions")?;
    if index.is_empty() {
        bail!("No AOIs defined. Run 'focusflow aoi add' first.");
    }

    let deadline = match duration {
        Some(secs) if secs.is_finite() && secs > 0.0 => {
            Some(Instant::now() + Duration::from_secs_f64(secs))
        }
        Some(secs) => bail!("Invalid duration: {secs}"),
        None => None,
    };

    println!("{RECORDING_NOTICE}");

    let stats = create_shared_stats_with_persistence(config.stats_path());
    let builder = ReportBuilder::new(config.sampling_interval_secs);
    println!("Instance ID: {}", builder.instance_id());
    println!(
        "Tracker: {}:{}  AOIs: {}",
        config.tracker.host,
        config.tracker.port,
        index.len()
    );

    let mut collector = GazeCollector::new(config.collector_config());
    collector
        .start()
        .context("Could not connect to the tracker")?;

    let mut tracking = TrackingSession::new(index, builder)
        .with_viewport(config.viewport)
        .with_stats(Arc::clone(&stats));
    tracking.start(Utc::now())?;

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(Arc::clone(&running))?;

    println!("Recording. Press Ctrl+C to stop.");
    println!();

    let receiver = collector.receiver().clone();
    let mut last_category: Option<Category> = None;
    let mut cut_short: Option<SessionReport> = None;

    while running.load(Ordering::SeqCst) {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            println!("Duration elapsed.");
            break;
        }

        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => match tracking.handle(event) {
                TickOutcome::Classified { category, .. } => {
                    if last_category != Some(category) {
                        println!("[{}] Gaze -> {category}", Utc::now().format("%H:%M:%S"));
                        last_category = Some(category);
                    }
                }
                TickOutcome::Malformed { .. } => {}
                TickOutcome::ConnectionLost { report } => {
                    eprintln!("Connection to the tracker was lost.");
                    cut_short = report;
                    break;
                }
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                eprintln!("Collector disconnected unexpectedly");
                break;
            }
        }
    }

    println!();
    println!("Stopping session...");
    collector.stop();

    let report = match cut_short {
        Some(report) => report,
        None => tracking.finish()?,
    };

    let started_at = report
        .meta
        .as_ref()
        .map(|m| m.started_at)
        .unwrap_or_else(Utc::now);
    let export_path = config.export_path.join(SessionReport::file_name(started_at));
    match report.save(&export_path) {
        Ok(()) => {
            stats.record_report_exported();
            println!("Saved report to {export_path:?}");
        }
        Err(e) => eprintln!("Error writing report: {e}"),
    }

    if let Err(e) = stats.save() {
        eprintln!("Warning: Could not save stream statistics: {e}");
    }

    println!();
    println!("--- Session Metrics ---");
    println!("{}", report.summary());
    println!();
    println!("{}", stats.summary());
    Ok(())
}

fn cmd_report(path: &Path) -> anyhow::Result<()> {
    let report =
        SessionReport::load(path).with_context(|| format!("Could not load report {path:?}"))?;

    println!("Session Report");
    println!("==============");
    if let Some(meta) = &report.meta {
        println!("Started: {}", meta.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
        println!("Produced by {} v{}", meta.producer, meta.version);
    }
    println!("Samples: {}", report.raw_log.len());
    println!();
    println!("{}", report.summary());
    Ok(())
}

fn cmd_status(config: &Config, reset: bool) -> anyhow::Result<()> {
    if reset {
        let stats = StreamStats::with_persistence(config.stats_path());
        stats.reset();
        stats.save().context("Could not save stream statistics")?;
        println!("Stream statistics reset.");
        return Ok(());
    }

    println!("FocusFlow Status");
    println!("================");
    println!();

    println!("Tracker: {}:{}", config.tracker.host, config.tracker.port);
    match load_index(&config.aois_path()) {
        Ok(index) => println!("AOIs defined: {}", index.len()),
        Err(e) => println!("AOIs: could not load ({e})"),
    }
    println!();

    let stats_path = config.stats_path();
    if stats_path.exists() {
        let persisted = read_persisted(&stats_path).context("Could not read stream statistics")?;
        println!(
            "Cumulative statistics (last updated {}):",
            persisted.last_updated.format("%Y-%m-%d %H:%M:%S UTC")
        );
        println!("{}", StreamStats::with_persistence(stats_path).summary());
    } else {
        println!("No previous session data found.");
    }
    Ok(())
}

fn cmd_config(config: &Config) -> anyhow::Result<()> {
    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) -> anyhow::Result<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl+C handler")
}
