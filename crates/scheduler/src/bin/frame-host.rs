//! frame-host: drives a scheduler from a simulated fixed-rate frame loop.
//!
//! Each frame signals its start, spends `--mandatory-ms` on fixed per-frame
//! work, then drains queued tasks within whatever budget is left. A producer
//! thread feeds two queues while frames run:
//! - `terrain` (priority 2): ordered rebuilds that must apply in sequence
//! - `effects` (priority 1): unordered cosmetic work, locked once fed
//!
//! Prints the accumulated scheduler metrics as JSON on exit.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{info, warn};

use framefill_core::config::load_dotenv;
use framefill_scheduler::{Callback, DrainReport, Job, Scheduler, SchedulerConfig, TaskKind};

// ── CLI ─────────────────────────────────────────────────────────────

/// Frame loop host for the framefill scheduler.
#[derive(Parser, Debug)]
#[command(name = "frame-host", version, about)]
struct Cli {
    /// Path to a scheduler TOML config. Defaults plus `FRAMEFILL_*` env when absent.
    #[arg(long, env = "FRAMEFILL_CONFIG")]
    config: Option<String>,

    /// Number of frames to simulate.
    #[arg(long, default_value_t = 120)]
    frames: u32,

    /// Override the configured target frame rate (0 = uncapped).
    #[arg(long)]
    fps: Option<u32>,

    /// Tasks the producer enqueues per queue.
    #[arg(long, default_value_t = 200)]
    tasks: usize,

    /// Fixed per-frame work in milliseconds, done before draining.
    #[arg(long, default_value_t = 8)]
    mandatory_ms: u64,
}

fn load_config(cli: &Cli) -> anyhow::Result<SchedulerConfig> {
    let Some(path) = &cli.config else {
        return Ok(SchedulerConfig::from_env()?);
    };
    match SchedulerConfig::from_file(path) {
        Ok(config) => {
            info!(path = %path, "loaded scheduler config");
            Ok(config)
        }
        Err(e) => {
            warn!(error = %e, path = %path, "failed to load config, using env defaults");
            Ok(SchedulerConfig::from_env()?)
        }
    }
}

/// Busy work standing in for a real task body.
fn spin(duration: Duration) {
    let until = Instant::now() + duration;
    while Instant::now() < until {
        std::hint::spin_loop();
    }
}

fn spawn_producer(
    scheduler: Arc<Scheduler>,
    tasks: usize,
    done: Arc<AtomicUsize>,
) -> anyhow::Result<thread::JoinHandle<()>> {
    let terrain = scheduler.create_queue(2, true);
    let effects = scheduler.create_queue(1, true);

    let counter = Arc::clone(&done);
    let caught_up: Callback = Arc::new(move || {
        info!(done = counter.load(Ordering::Relaxed), "terrain queue caught up");
    });
    let canceled: Callback = Arc::new(|| warn!("effects queue canceled"));
    scheduler.set_on_completion(terrain, Some(caught_up))?;
    scheduler.set_on_cancel(effects, Some(canceled))?;

    let handle = thread::Builder::new()
        .name("producer".into())
        .spawn(move || {
            for i in 0..tasks {
                let d = Arc::clone(&done);
                let rebuild = Job::new(move || {
                    spin(Duration::from_micros(400 + (i as u64 % 5) * 300));
                    d.fetch_add(1, Ordering::Relaxed);
                })
                .with_kind(TaskKind::from_static("terrain::rebuild"));
                if let Err(e) = scheduler.add_task(rebuild, terrain, true) {
                    warn!(error = %e, "terrain enqueue failed");
                }

                let d = Arc::clone(&done);
                let burst = Job::new(move || {
                    spin(Duration::from_micros(100));
                    d.fetch_add(1, Ordering::Relaxed);
                })
                .with_kind(TaskKind::from_static("effects::burst"));
                if let Err(e) = scheduler.add_task(burst, effects, false) {
                    warn!(error = %e, "effects enqueue failed");
                }

                if i % 25 == 24 {
                    thread::sleep(Duration::from_millis(5));
                }
            }
            if let Err(e) = scheduler.lock(effects) {
                warn!(error = %e, "failed to lock effects queue");
            }
        })?;
    Ok(handle)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    config.log_summary();

    let scheduler = Arc::new(Scheduler::new(&config));
    if let Some(fps) = cli.fps {
        scheduler.set_target_fps(fps);
    }
    scheduler.on_drain_finished(Arc::new(|report: &DrainReport| {
        if report.lagging() {
            warn!(elapsed_us = report.elapsed.as_micros() as u64, "frame lagging");
        }
    }));

    let done = Arc::new(AtomicUsize::new(0));
    let producer = spawn_producer(Arc::clone(&scheduler), cli.tasks, Arc::clone(&done))?;

    let frame_budget = scheduler.frame_budget();
    let mandatory = Duration::from_millis(cli.mandatory_ms);
    info!(frames = cli.frames, mandatory_ms = cli.mandatory_ms, "frame loop starting");

    for frame in 0..cli.frames {
        let frame_start = Instant::now();
        scheduler.frame_started();
        spin(mandatory);

        let report = scheduler.process_frame();
        if frame % 30 == 0 {
            info!(
                frame,
                executed = report.executed,
                pending = scheduler.pending_tasks(),
                stop = ?report.stop,
                "frame"
            );
        }

        let spent = frame_start.elapsed();
        if spent < frame_budget {
            thread::sleep(frame_budget - spent);
        }
    }

    if producer.join().is_err() {
        warn!("producer thread panicked");
    }

    info!(
        completed = done.load(Ordering::Relaxed),
        pending = scheduler.pending_tasks(),
        "frame loop finished"
    );
    println!("{}", serde_json::to_string_pretty(&scheduler.metrics())?);
    Ok(())
}
