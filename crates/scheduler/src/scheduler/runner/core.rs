use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use framefill_core::{QueueId, SchedulerConfig, TaskKind};
use indexmap::IndexMap;
use tracing::info;

use crate::scheduler::clock::{Clock, MonotonicClock};
use crate::scheduler::cost::CostTable;
use crate::scheduler::deferred::DeferredCalls;
use crate::scheduler::metrics::SchedulerMetrics;
use crate::scheduler::queue::TaskQueue;
use crate::scheduler::timing::FrameTiming;
use crate::scheduler::types::DrainListener;

/// Queue map and id allocator, guarded together by one lock.
pub(super) struct QueueMap {
    /// Creation order is kept so priority ties resolve to the oldest queue.
    pub(super) queues: IndexMap<QueueId, TaskQueue>,
    pub(super) next_id: u64,
}

/// The frame scheduler.
///
/// Owns every queue and runs queued jobs once per frame within the frame's
/// time budget. Share it between the host and producers as `Arc<Scheduler>`;
/// all methods take `&self`.
pub struct Scheduler {
    pub(super) shared: Mutex<QueueMap>,
    pub(super) costs: Mutex<CostTable>,
    pub(super) timing: FrameTiming,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) deferred: DeferredCalls,
    pub(super) listeners: RwLock<Vec<DrainListener>>,
    pub(super) metrics: RwLock<SchedulerMetrics>,
}

impl Scheduler {
    /// Create a scheduler timed by the wall clock.
    pub fn new(config: &SchedulerConfig) -> Self {
        Self::with_clock(config, Arc::new(MonotonicClock::new()))
    }

    /// Create a scheduler driven by the given clock.
    pub fn with_clock(config: &SchedulerConfig, clock: Arc<dyn Clock>) -> Self {
        let mut queues = IndexMap::new();
        queues.insert(QueueId::DEFAULT, TaskQueue::new(QueueId::DEFAULT, 0, false));

        let scheduler = Self {
            shared: Mutex::new(QueueMap {
                queues,
                next_id: QueueId::DEFAULT.0 + 1,
            }),
            costs: Mutex::new(CostTable::new()),
            timing: FrameTiming::new(config),
            clock,
            deferred: DeferredCalls::default(),
            listeners: RwLock::new(Vec::new()),
            metrics: RwLock::new(SchedulerMetrics::default()),
        };
        info!("Scheduler created (frame budget: {:?})", scheduler.timing.frame_budget());
        scheduler
    }

    pub(super) fn lock_queues(&self) -> MutexGuard<'_, QueueMap> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn lock_costs(&self) -> MutexGuard<'_, CostTable> {
        self.costs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Timing configuration ────────────────────────────────────

    /// Change the target frame rate and recompute the frame budget. 0 = uncapped.
    pub fn set_target_fps(&self, fps: u32) {
        self.timing.set_target_fps(fps);
        self.recompute_timing();
    }

    /// Re-derive the frame budget from the current target frame rate.
    pub fn recompute_timing(&self) {
        self.timing.recompute();
        info!(
            "Frame timing recomputed: {} fps, {:?} budget",
            self.timing.target_fps(),
            self.timing.frame_budget()
        );
    }

    pub fn target_fps(&self) -> u32 {
        self.timing.target_fps()
    }

    /// Time allotted per frame. Zero when the frame rate is uncapped.
    pub fn frame_budget(&self) -> Duration {
        self.timing.frame_budget()
    }

    pub fn set_frame_padding(&self, padding: Duration) {
        self.timing.set_frame_padding(padding);
    }

    pub fn frame_padding(&self) -> Duration {
        self.timing.frame_padding()
    }

    pub fn set_min_process_time(&self, floor: Duration) {
        self.timing.set_min_process_time(floor);
    }

    pub fn min_process_time(&self) -> Duration {
        self.timing.min_process_time()
    }

    pub fn set_baseline_estimate(&self, baseline: Duration) {
        self.timing.set_baseline_estimate(baseline);
    }

    pub fn baseline_estimate(&self) -> Duration {
        self.timing.baseline_estimate()
    }

    /// Margin multiplier for the skip-ahead decision. Values below 1 are clamped.
    pub fn set_skip_ahead_factor(&self, factor: u32) {
        self.timing.set_skip_ahead_factor(factor);
    }

    pub fn skip_ahead_factor(&self) -> u32 {
        self.timing.skip_ahead_factor()
    }

    // ── Observability ───────────────────────────────────────────

    /// Get a snapshot of the current scheduler metrics.
    pub fn metrics(&self) -> SchedulerMetrics {
        self.metrics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Running average cost of a task kind, `None` if it has never run.
    pub fn estimated_cost(&self, kind: &TaskKind) -> Option<Duration> {
        self.lock_costs().average(kind)
    }

    /// Callbacks waiting for the next deferred flush.
    pub fn pending_deferred(&self) -> usize {
        self.deferred.len()
    }
}
