//! Guide log summary
//!
//! Replays each guiding session of a guide log through a sample history and
//! prints its stability statistics.
//!
//! Usage:
//! ```
//! cargo run --release --bin guide_log_summary -- GuideLog.txt --sampling 1.2
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use guidelog::{parse_file, GraphLimits, LogSession, SampleHistory};
use shared::algo::median;
use shared::config_storage::{ConfigStorage, SettingsStore};
use tracing::{info, warn};

/// Command line arguments for the guide log summary
#[derive(Parser, Debug)]
#[command(
    name = "Guide Log Summary",
    about = "Prints stability statistics for every guiding session in a guide log",
    long_about = None
)]
struct Args {
    /// Guide log to summarize
    log: PathBuf,

    /// Display scale applied to the statistics (e.g. arcsec per pixel)
    #[arg(long, default_value_t = 1.0)]
    sampling: f64,

    /// History capacity in samples; statistics cover at most this many
    #[arg(long)]
    max_length: Option<i64>,

    /// Settings directory holding graph limits (settings.json)
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

fn load_limits(args: &Args) -> Result<GraphLimits> {
    let mut store: Box<dyn SettingsStore> = match &args.settings {
        Some(dir) => Box::new(
            ConfigStorage::open(dir.clone())
                .with_context(|| format!("Failed to open settings in {}", dir.display()))?,
        ),
        None => Box::new(HashMap::<String, i64>::new()),
    };

    let mut limits = GraphLimits::load(store.as_mut());
    if let Some(max_length) = args.max_length {
        if let Err(e) = limits.set_max_length(max_length, store.as_mut()) {
            warn!("{e}");
        }
    }
    Ok(limits)
}

fn summarize(
    index: usize,
    session: &LogSession,
    limits: &GraphLimits,
    sampling: f64,
) -> Result<()> {
    let samples = session
        .samples()
        .with_context(|| format!("Session starting at line {}", session.line))?;

    let mut history = SampleHistory::new(*limits);
    for sample in &samples {
        history.append(*sample);
    }
    let report = history.stability_report(sampling);

    println!("Session {} (Guiding Begins at {})", index + 1, session.started);
    println!(
        "  frames: {}  retained: {}/{}",
        samples.len(),
        history.len(),
        history.capacity()
    );
    println!("  {}", report.rms_label());
    println!("  {}", report.oscillation_label());
    if report.is_oscillation_anomalous() {
        println!("  oscillation index outside the healthy band");
    }

    if session.column("SNR").is_some() {
        let snr = session.values("SNR")?;
        match median(&snr) {
            Ok(m) => println!("  median SNR: {m:.2}"),
            Err(e) => println!("  median SNR: n/a ({e})"),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let limits = load_limits(&args)?;
    let file = parse_file(&args.log)
        .with_context(|| format!("Failed to read guide log {}", args.log.display()))?;

    info!(
        "{}: {} log header(s), {} session(s)",
        args.log.display(),
        file.headers.len(),
        file.sessions.len()
    );

    let mut count = 0;
    for (index, session) in file.guiding_sessions().enumerate() {
        summarize(index, session, &limits, args.sampling)?;
        count += 1;
    }
    if count == 0 {
        println!("No guiding sessions in {}", args.log.display());
    }
    Ok(())
}
