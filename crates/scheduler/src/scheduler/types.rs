use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

/// Queue callback (`on_completion` / `on_cancel`). May fire many times over
/// a queue's lifetime.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Listener notified once per frame when the drain finishes.
pub type DrainListener = Arc<dyn Fn(&DrainReport) + Send + Sync>;

/// Result of a successful [`cancel`](crate::Scheduler::cancel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CancelOutcome {
    /// Pending tasks dropped, queue kept.
    Cleared,
    /// Pending tasks dropped and the queue removed.
    Deleted,
}

/// Why a frame's drain stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum StopReason {
    /// No unpaused queue has pending tasks.
    #[default]
    Idle,
    /// Frame already past its budget before draining started.
    Lagging,
    /// Deadline reached after the processing floor.
    BudgetExhausted,
    /// Next task looked too expensive and no unordered task followed it.
    NoCheaperTask,
    /// Skip-ahead reached the end of the queue.
    EndOfReachable,
}

/// Summary of one [`process_frame`](crate::Scheduler::process_frame) call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    /// Tasks executed.
    pub executed: usize,
    /// Tasks dropped because their target was gone.
    pub discarded: usize,
    /// Times an expensive task was passed over for a later one.
    pub skipped_ahead: usize,
    /// Queues drained to empty this frame.
    pub queues_completed: usize,
    pub stop: StopReason,
    /// Time spent inside `process_frame`.
    pub elapsed: Duration,
}

impl DrainReport {
    pub fn lagging(&self) -> bool {
        self.stop == StopReason::Lagging
    }

    /// The drain ran until the frame deadline.
    pub fn budget_exhausted(&self) -> bool {
        self.stop == StopReason::BudgetExhausted
    }
}
