use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use framefill_scheduler::{Callback, Job, ManualClock, Scheduler, SchedulerConfig};

/// Build a config with every timing knob explicit.
pub fn make_config(fps: u32, padding_us: u64, floor_us: u64, baseline_us: u64) -> SchedulerConfig {
    SchedulerConfig {
        target_fps: fps,
        frame_padding_us: padding_us,
        min_process_time_us: floor_us,
        baseline_estimate_us: baseline_us,
        skip_ahead_factor: 2,
    }
}

/// Scheduler driven by a manual clock shared with the test.
pub fn manual_scheduler(config: SchedulerConfig) -> (Scheduler, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    (Scheduler::with_clock(&config, clock.clone()), clock)
}

/// Execution log shared between jobs and the test body.
#[derive(Clone, Default)]
pub struct Recorder {
    log: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A job of the given kind that logs `label` and advances the clock by
    /// `cost_us`, standing in for real work.
    pub fn job(&self, label: &str, kind: &'static str, clock: &Arc<ManualClock>, cost_us: u64) -> Job {
        let log = Arc::clone(&self.log);
        let clock = Arc::clone(clock);
        let label = label.to_string();
        Job::new(move || {
            clock.advance(Duration::from_micros(cost_us));
            log.lock().unwrap().push(label);
        })
        .with_kind(kind)
    }

    pub fn entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

/// Callback that counts how often it fired.
pub fn counting_callback() -> (Arc<AtomicUsize>, Callback) {
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    let callback: Callback = Arc::new(move || {
        h.fetch_add(1, Ordering::SeqCst);
    });
    (hits, callback)
}
