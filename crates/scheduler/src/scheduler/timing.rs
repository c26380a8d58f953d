//! Frame timing state and the deadline rule.
//!
//! Every value is stored in microseconds in an atomic so configuration can be
//! changed from any thread while a drain is running; each check reads the
//! current value.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use framefill_core::config::frame_budget_for;
use framefill_core::SchedulerConfig;

fn micros(d: Duration) -> u64 {
    d.as_micros() as u64
}

#[derive(Debug)]
pub(crate) struct FrameTiming {
    target_fps: AtomicU32,
    /// Derived from `target_fps` by `recompute`. 0 = no deadline.
    frame_budget: AtomicU64,
    frame_padding: AtomicU64,
    min_process_time: AtomicU64,
    baseline_estimate: AtomicU64,
    skip_ahead_factor: AtomicU32,
    frame_start: AtomicU64,
    frame_latched: AtomicBool,
    processing_start: AtomicU64,
    processing: AtomicBool,
}

impl FrameTiming {
    pub fn new(config: &SchedulerConfig) -> Self {
        let timing = Self {
            target_fps: AtomicU32::new(config.target_fps),
            frame_budget: AtomicU64::new(0),
            frame_padding: AtomicU64::new(config.frame_padding_us),
            min_process_time: AtomicU64::new(config.min_process_time_us),
            baseline_estimate: AtomicU64::new(config.baseline_estimate_us),
            skip_ahead_factor: AtomicU32::new(config.skip_ahead_factor.max(1)),
            frame_start: AtomicU64::new(0),
            frame_latched: AtomicBool::new(false),
            processing_start: AtomicU64::new(0),
            processing: AtomicBool::new(false),
        };
        timing.recompute();
        timing
    }

    // ── Configuration ───────────────────────────────────────────

    pub fn recompute(&self) {
        let budget = frame_budget_for(self.target_fps.load(Ordering::Relaxed));
        self.frame_budget.store(micros(budget), Ordering::Relaxed);
    }

    pub fn set_target_fps(&self, fps: u32) {
        self.target_fps.store(fps, Ordering::Relaxed);
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps.load(Ordering::Relaxed)
    }

    pub fn frame_budget(&self) -> Duration {
        Duration::from_micros(self.frame_budget.load(Ordering::Relaxed))
    }

    pub fn set_frame_padding(&self, padding: Duration) {
        self.frame_padding.store(micros(padding), Ordering::Relaxed);
    }

    pub fn frame_padding(&self) -> Duration {
        Duration::from_micros(self.frame_padding.load(Ordering::Relaxed))
    }

    pub fn set_min_process_time(&self, floor: Duration) {
        self.min_process_time.store(micros(floor), Ordering::Relaxed);
    }

    pub fn min_process_time(&self) -> Duration {
        Duration::from_micros(self.min_process_time.load(Ordering::Relaxed))
    }

    pub fn set_baseline_estimate(&self, baseline: Duration) {
        self.baseline_estimate.store(micros(baseline), Ordering::Relaxed);
    }

    pub fn baseline_estimate(&self) -> Duration {
        Duration::from_micros(self.baseline_estimate.load(Ordering::Relaxed))
    }

    pub fn set_skip_ahead_factor(&self, factor: u32) {
        self.skip_ahead_factor.store(factor.max(1), Ordering::Relaxed);
    }

    pub fn skip_ahead_factor(&self) -> u32 {
        self.skip_ahead_factor.load(Ordering::Relaxed)
    }

    // ── Frame lifecycle ─────────────────────────────────────────

    /// Record the frame start unless it was already recorded this frame.
    pub fn latch_frame_start(&self, now: Duration) {
        if self
            .frame_latched
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.frame_start.store(micros(now), Ordering::Release);
        }
    }

    pub fn begin_processing(&self, now: Duration) {
        self.processing_start.store(micros(now), Ordering::Relaxed);
        self.processing.store(true, Ordering::Release);
    }

    /// End the drain and release the latch so the next frame start is fresh.
    pub fn finish_processing(&self) {
        self.processing.store(false, Ordering::Release);
        self.frame_latched.store(false, Ordering::Release);
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    // ── Deadline rule ───────────────────────────────────────────

    fn since_frame_start(&self, now: Duration) -> u64 {
        micros(now).saturating_sub(self.frame_start.load(Ordering::Acquire))
    }

    /// Still inside the guaranteed processing floor.
    pub fn within_floor(&self, now: Duration) -> bool {
        let since = micros(now).saturating_sub(self.processing_start.load(Ordering::Relaxed));
        since < self.min_process_time.load(Ordering::Relaxed)
    }

    /// The frame had already used its whole budget before draining began.
    pub fn lagging(&self, now: Duration) -> bool {
        let budget = self.frame_budget.load(Ordering::Relaxed);
        budget > 0 && self.since_frame_start(now) > budget
    }

    /// Deadline check made before each task.
    ///
    /// Never true inside the floor. Past it, true once the frame is beyond
    /// `budget - padding`; with no budget the floor alone throttles, and a
    /// zero floor leaves the drain unbounded.
    pub fn over_budget(&self, now: Duration) -> bool {
        if self.within_floor(now) {
            return false;
        }
        let budget = self.frame_budget.load(Ordering::Relaxed);
        if budget == 0 {
            return self.min_process_time.load(Ordering::Relaxed) > 0;
        }
        let padding = self.frame_padding.load(Ordering::Relaxed);
        self.since_frame_start(now) > budget.saturating_sub(padding)
    }

    /// Whether a task with the given average cost should be passed over
    /// because it would likely run past the deadline.
    pub fn too_expensive(&self, now: Duration, estimate: Duration) -> bool {
        if self.within_floor(now) {
            return false;
        }
        let budget = self.frame_budget.load(Ordering::Relaxed);
        if budget == 0 {
            return false;
        }
        let padding = self.frame_padding.load(Ordering::Relaxed);
        let projected = micros(estimate).saturating_mul(u64::from(self.skip_ahead_factor()));
        self.since_frame_start(now).saturating_add(projected) > budget.saturating_sub(padding)
    }
}
