mod caffeinate;
mod config;
mod engine;
mod input;
mod sound;
mod system;
mod tui;
mod update;
mod utils;
mod worker;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fd_lock::RwLock;
use input::InputSimulator;
use std::fs::OpenOptions;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration as StdDuration;
use utils::format_duration;
use worker::WorkerParams;

#[derive(Parser)]
#[command(name = "perk")]
#[command(about = "Keep a macOS workstation awake and online", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the keep-awake loop
    Start {
        /// Seconds between simulated-activity bursts
        #[arg(short, long)]
        interval: Option<u64>,
        /// Idle seconds before bursts begin (0 = always burst)
        #[arg(short, long)]
        threshold: Option<u64>,
        /// Play a sound on every burst
        #[arg(long)]
        beep: bool,
        /// Also tap the Shift key during each burst
        #[arg(long)]
        key_tap: bool,
        /// Stop automatically after this long (e.g. 8h, 30m)
        #[arg(long)]
        timeout: Option<String>,
        /// Run without the status display, logging bursts to stdout
        #[arg(long)]
        no_tui: bool,
    },
    /// Update perk to the latest version
    SelfUpdate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            interval,
            threshold,
            beep,
            key_tap,
            timeout,
            no_tui,
        } => {
            let config = config::load_config()?;

            let base_dir = config::get_base_dir()?;
            let lock_path = base_dir.join("perk.lock");
            let lock_file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(lock_path)?;

            let mut lock = RwLock::new(lock_file);
            let _guard = lock.try_write().map_err(|_| {
                anyhow::anyhow!("Another instance of Perk is already running. Please close it before starting a new one.")
            })?;

            let merged = config::Config {
                interval_secs: interval.unwrap_or(config.interval_secs),
                threshold_secs: threshold.unwrap_or(config.threshold_secs),
                beep_enabled: beep || config.beep_enabled,
            };
            merged.validate()?;

            let timeout = timeout
                .map(|t| {
                    humantime::parse_duration(&t)
                        .with_context(|| format!("invalid timeout: {t}"))
                        .and_then(|d| {
                            chrono::Duration::from_std(d).context("timeout is too large")
                        })
                })
                .transpose()?;

            let simulator = InputSimulator::new()?;

            let params = WorkerParams {
                interval_secs: merged.interval_secs,
                threshold_secs: merged.threshold_secs,
                beep_enabled: merged.beep_enabled,
                key_tap_enabled: key_tap,
                timeout,
                log_to_stdout: no_tui,
            };
            let handle = worker::spawn(params, simulator);

            if no_tui {
                run_headless(&handle, &merged)?;
            } else {
                tui::run_tui(&handle)?;
            }

            let final_status = handle.stop();
            if let Some(status) = final_status {
                println!(
                    "Session ended after {} with {} activity burst(s).",
                    format_duration((chrono::Utc::now() - status.run_start).num_seconds()),
                    status.burst_count
                );
            }
        }
        Commands::SelfUpdate => {
            update::update()?;
        }
    }

    Ok(())
}

fn run_headless(handle: &worker::WorkerHandle, config: &config::Config) -> Result<()> {
    println!(
        "Perk running - simulating activity every {} once idle for {}",
        format_duration(config.interval_secs as i64),
        format_duration(config.threshold_secs as i64)
    );
    if config.beep_enabled {
        println!("Beeping is enabled");
    }
    println!("Press Ctrl-C to stop");

    let controls = std::sync::Arc::clone(&handle.controls);
    ctrlc::set_handler(move || {
        controls.shutdown.store(true, Ordering::SeqCst);
    })
    .context("failed to install Ctrl-C handler")?;

    while !handle.is_finished() && !handle.controls.shutdown.load(Ordering::SeqCst) {
        thread::sleep(StdDuration::from_millis(200));
    }

    Ok(())
}
