use std::collections::HashMap;
use std::time::Duration;

use framefill_core::TaskKind;
use serde::Serialize;

use super::types::DrainReport;

/// Scheduler operational metrics, accumulated across frames.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchedulerMetrics {
    /// Frames in which the drain loop ran.
    pub frames_drained: u64,
    /// Frames skipped because the frame was already over budget.
    pub frames_lagging: u64,
    /// Total tasks executed, keyed by kind label.
    pub tasks_executed: HashMap<String, u64>,
    /// Tasks dropped because their target was gone.
    pub tasks_discarded: u64,
    /// Expensive tasks passed over for later ones.
    pub skip_aheads: u64,
    /// Queues drained to empty.
    pub queues_completed: u64,
    /// Mean time spent per `process_frame` call.
    pub avg_drain_time: Duration,
    /// Time spent in the most recent `process_frame` call.
    pub last_drain_time: Duration,
}

impl SchedulerMetrics {
    /// Record a task execution.
    pub fn record_execution(&mut self, kind: &TaskKind) {
        *self.tasks_executed.entry(kind.to_string()).or_default() += 1;
    }

    /// Fold one frame's report into the totals.
    pub fn record_frame(&mut self, report: &DrainReport) {
        if report.lagging() {
            self.frames_lagging += 1;
        } else {
            self.frames_drained += 1;
        }
        self.tasks_discarded += report.discarded as u64;
        self.skip_aheads += report.skipped_ahead as u64;
        self.queues_completed += report.queues_completed as u64;
        self.last_drain_time = report.elapsed;

        // Incremental mean: new_avg = prev_avg + (elapsed - prev_avg) / count
        let count = self.frames_drained + self.frames_lagging;
        self.avg_drain_time = if count == 1 {
            report.elapsed
        } else {
            let prev = self.avg_drain_time.as_nanos() as f64;
            let cur = report.elapsed.as_nanos() as f64;
            Duration::from_nanos((prev + (cur - prev) / count as f64) as u64)
        };
    }

    /// Total tasks executed across all kinds.
    pub fn total_executed(&self) -> u64 {
        self.tasks_executed.values().sum()
    }
}
