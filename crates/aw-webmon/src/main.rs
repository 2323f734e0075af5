//! Alarm Webmon
//!
//! Follows the alarm configuration topics and prints what the monitor sees.
//!
//! Usage:
//!   aw-webmon                          - Kafka, `ALARM_SERVER` / `ALARM_CONFIG`
//!   aw-webmon --topic Demo --wait-secs 30
//!   aw-webmon --replay recorded.jsonl  - replay a recorded stream

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use aw_monitor::{AlarmMonitor, EventSource, MonitorConfig, ReplaySource};
use clap::Parser;

#[derive(Parser)]
#[command(name = "aw-webmon", about = "Alarm Webmon monitor")]
struct Cli {
    /// Kafka bootstrap servers (overrides ALARM_SERVER)
    #[arg(short, long)]
    server: Option<String>,

    /// Topic to follow, repeatable (overrides ALARM_CONFIG)
    #[arg(short, long = "topic")]
    topics: Vec<String>,

    /// JSON monitor configuration used instead of the environment
    #[arg(short, long)]
    config_file: Option<PathBuf>,

    /// Replay recorded records (JSON lines) instead of reading Kafka
    #[arg(short, long)]
    replay: Option<PathBuf>,

    /// How long to monitor before shutting down
    #[arg(short, long, default_value_t = 10)]
    wait_secs: u64,

    /// Print the dump every N seconds while running (0: only at exit)
    #[arg(short, long, default_value_t = 0)]
    dump_interval_secs: u64,

    /// Print the alarms JSON document at exit
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = monitor_config(&cli)?;
    log::info!("Alarm Webmon");
    log::info!("Server: {}", config.server);
    log::info!("Topics: {}", config.topics.join(", "));

    let source = open_source(&cli, &config)?;
    let monitor = AlarmMonitor::start(source, &config).context("Failed to start monitor")?;

    run_for(&monitor, &cli);

    println!("{}", monitor.dump());
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&monitor.alarms_document())?);
    }

    let stats = monitor.stats();
    log::info!(
        "{} records: {} config, {} state, {} removed, {} ignored, {} failed",
        stats.records,
        stats.config_updates,
        stats.state_updates,
        stats.removals,
        stats.ignored,
        stats.failed
    );

    monitor.shutdown();
    Ok(())
}

fn monitor_config(cli: &Cli) -> Result<MonitorConfig> {
    let mut config = match &cli.config_file {
        Some(path) => MonitorConfig::from_json_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => MonitorConfig::from_env(),
    };
    if let Some(server) = &cli.server {
        config.server = server.clone();
    }
    if !cli.topics.is_empty() {
        config.topics = cli.topics.clone();
    }
    config.validate()?;
    Ok(config)
}

fn open_source(cli: &Cli, config: &MonitorConfig) -> Result<Box<dyn EventSource>> {
    match &cli.replay {
        Some(path) => {
            let source = ReplaySource::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Ok(Box::new(source))
        }
        None => kafka_source(config),
    }
}

#[cfg(feature = "kafka")]
fn kafka_source(config: &MonitorConfig) -> Result<Box<dyn EventSource>> {
    let source = aw_monitor::KafkaSource::subscribe(config)
        .with_context(|| format!("Failed to subscribe to {}", config.server))?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "kafka"))]
fn kafka_source(_config: &MonitorConfig) -> Result<Box<dyn EventSource>> {
    anyhow::bail!("built without Kafka support; rebuild with `--features kafka` or use --replay")
}

/// Keep the monitor running, printing periodic dumps
fn run_for(monitor: &AlarmMonitor, cli: &Cli) {
    let deadline = Instant::now() + Duration::from_secs(cli.wait_secs);
    let interval = Duration::from_secs(cli.dump_interval_secs);
    let mut next_dump = Instant::now() + interval;

    while Instant::now() < deadline {
        if !monitor.is_running() {
            log::warn!("Monitor stopped early");
            return;
        }
        if !interval.is_zero() && Instant::now() >= next_dump {
            println!("{}", monitor.dump());
            next_dump += interval;
        }
        thread::sleep(Duration::from_millis(100));
    }
}
