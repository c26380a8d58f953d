use framefill_core::QueueId;
use indexmap::IndexMap;

use crate::scheduler::queue::{TaskHandle, TaskQueue};

use super::Scheduler;

/// Position of the drain loop: a task within the queue being drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Cursor {
    pub queue: QueueId,
    pub task: TaskHandle,
}

/// Head of the highest-priority queue that is neither paused nor empty.
/// Ties go to the queue created first.
pub(super) fn select_queue(queues: &IndexMap<QueueId, TaskQueue>) -> Option<Cursor> {
    let mut best: Option<&TaskQueue> = None;
    for queue in queues.values() {
        if queue.is_paused() || queue.is_empty() {
            continue;
        }
        if best.map_or(true, |b| queue.priority() > b.priority()) {
            best = Some(queue);
        }
    }
    let queue = best?;
    Some(Cursor {
        queue: queue.id(),
        task: queue.head()?,
    })
}

impl Scheduler {
    /// Pick the queue to drain next.
    pub(super) fn select_current(&self) -> Option<Cursor> {
        select_queue(&self.lock_queues().queues)
    }
}
