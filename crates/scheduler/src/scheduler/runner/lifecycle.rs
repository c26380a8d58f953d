use framefill_core::{QueueId, SchedulerError};
use tracing::{debug, info, warn};

use crate::scheduler::queue::TaskQueue;
use crate::scheduler::types::{CancelOutcome, Callback};

use super::Scheduler;

impl Scheduler {
    /// Create an empty queue. A queue created inactive starts paused.
    pub fn create_queue(&self, priority: i32, start_active: bool) -> QueueId {
        let mut map = self.lock_queues();
        let id = QueueId(map.next_id);
        map.next_id += 1;
        map.queues
            .insert(id, TaskQueue::new(id, priority, !start_active));
        drop(map);

        info!("Created queue {} (priority: {}, active: {})", id, priority, start_active);
        id
    }

    pub fn queue_exists(&self, id: QueueId) -> bool {
        self.lock_queues().queues.contains_key(&id)
    }

    /// Ids of every live queue, in creation order.
    pub fn queue_ids(&self) -> Vec<QueueId> {
        self.lock_queues().queues.keys().copied().collect()
    }

    /// Number of pending tasks in a queue.
    pub fn queue_len(&self, id: QueueId) -> Result<usize, SchedulerError> {
        self.lock_queues()
            .queues
            .get(&id)
            .map(TaskQueue::len)
            .ok_or(SchedulerError::NotFound(id))
    }

    /// Pending tasks across all queues.
    pub fn pending_tasks(&self) -> usize {
        self.lock_queues().queues.values().map(TaskQueue::len).sum()
    }

    pub fn set_priority(&self, id: QueueId, priority: i32) -> Result<(), SchedulerError> {
        self.with_queue(id, |queue| queue.priority = priority)
    }

    pub fn get_priority(&self, id: QueueId) -> Result<i32, SchedulerError> {
        self.lock_queues()
            .queues
            .get(&id)
            .map(TaskQueue::priority)
            .ok_or(SchedulerError::NotFound(id))
    }

    pub fn pause(&self, id: QueueId) -> Result<(), SchedulerError> {
        self.with_queue(id, |queue| queue.paused = true)?;
        debug!("Paused queue {}", id);
        Ok(())
    }

    pub fn resume(&self, id: QueueId) -> Result<(), SchedulerError> {
        self.with_queue(id, |queue| queue.paused = false)?;
        debug!("Resumed queue {}", id);
        Ok(())
    }

    /// Whether a queue is paused. Unknown queues are reported as not paused.
    pub fn is_paused(&self, id: QueueId) -> bool {
        self.lock_queues()
            .queues
            .get(&id)
            .is_some_and(TaskQueue::is_paused)
    }

    /// Stop a queue from accepting new tasks. The queue is deleted as soon as
    /// it is empty, immediately if it already is. The default queue cannot be
    /// locked.
    pub fn lock(&self, id: QueueId) -> Result<(), SchedulerError> {
        if id.is_default() {
            warn!("Refusing to lock the default queue");
            return Err(SchedulerError::Unavailable(id));
        }

        let mut map = self.lock_queues();
        let queue = map
            .queues
            .get_mut(&id)
            .ok_or(SchedulerError::NotFound(id))?;
        queue.locked = true;
        let removed = if queue.is_empty() {
            map.queues.shift_remove(&id)
        } else {
            None
        };
        drop(map);

        info!("Locked queue {} (deleted: {})", id, removed.is_some());
        drop(removed);
        Ok(())
    }

    /// Whether a queue refuses new tasks. Unknown queues are reported as locked.
    pub fn is_locked(&self, id: QueueId) -> bool {
        self.lock_queues()
            .queues
            .get(&id)
            .map_or(true, TaskQueue::is_locked)
    }

    /// Drop every pending task of a queue and dispatch its `on_cancel`
    /// callback. The callback runs later, at the next deferred flush, never
    /// inside this call.
    ///
    /// The queue is deleted when it was locked or `also_delete` is set. The
    /// default queue is never deleted: the request is downgraded to a clear
    /// and reported as [`CancelOutcome::Cleared`].
    pub fn cancel(&self, id: QueueId, also_delete: bool) -> Result<CancelOutcome, SchedulerError> {
        let (dropped, on_cancel, outcome, removed) = {
            let mut map = self.lock_queues();
            let queue = map
                .queues
                .get_mut(&id)
                .ok_or(SchedulerError::NotFound(id))?;
            let dropped = queue.clear();
            let on_cancel = queue.on_cancel.clone();
            let delete = queue.locked || also_delete;

            let (outcome, removed) = if delete && !id.is_default() {
                (CancelOutcome::Deleted, map.queues.shift_remove(&id))
            } else {
                if delete {
                    warn!("Default queue cannot be deleted, clearing only");
                }
                (CancelOutcome::Cleared, None)
            };
            (dropped, on_cancel, outcome, removed)
        };

        info!("Canceled queue {}: {} tasks dropped ({:?})", id, dropped.len(), outcome);
        if let Some(callback) = on_cancel {
            self.deferred.push(Box::new(move || callback()));
        }
        // Dropped jobs and the deleted queue release their captures outside the lock.
        drop(dropped);
        drop(removed);
        Ok(outcome)
    }

    /// Replace the callback fired when normal draining empties the queue.
    pub fn set_on_completion(
        &self,
        id: QueueId,
        callback: Option<Callback>,
    ) -> Result<(), SchedulerError> {
        let previous = self.with_queue(id, |queue| std::mem::replace(&mut queue.on_completion, callback))?;
        drop(previous);
        Ok(())
    }

    /// Replace the callback fired when the queue is canceled.
    pub fn set_on_cancel(&self, id: QueueId, callback: Option<Callback>) -> Result<(), SchedulerError> {
        let previous = self.with_queue(id, |queue| std::mem::replace(&mut queue.on_cancel, callback))?;
        drop(previous);
        Ok(())
    }

    fn with_queue<R>(
        &self,
        id: QueueId,
        f: impl FnOnce(&mut TaskQueue) -> R,
    ) -> Result<R, SchedulerError> {
        let mut map = self.lock_queues();
        let queue = map
            .queues
            .get_mut(&id)
            .ok_or(SchedulerError::NotFound(id))?;
        Ok(f(queue))
    }
}
