use std::sync::{Arc, PoisonError};

use tracing::{debug, info, trace};

use crate::scheduler::types::{DrainListener, DrainReport, StopReason};

use super::scheduling::Cursor;
use super::Scheduler;

/// Outcome of handling the task under the cursor.
enum Step {
    /// Keep draining from this cursor.
    Continue(Cursor),
    Stop(StopReason),
}

impl Scheduler {
    /// Signal the start of a physics step.
    ///
    /// Only the first call after a drain is recorded, so the frame deadline
    /// is anchored to the start of the step rather than to the start of the
    /// drain. If the host never calls this, the drain anchors to itself.
    pub fn frame_started(&self) {
        self.timing.latch_frame_start(self.clock.now());
    }

    /// Whether `process_frame` is running.
    pub fn is_processing(&self) -> bool {
        self.timing.is_processing()
    }

    /// Register a listener called once at the end of every `process_frame`,
    /// whether or not any task ran.
    pub fn on_drain_finished(&self, listener: DrainListener) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Run callbacks postponed by earlier operations (e.g. `on_cancel`).
    /// `process_frame` does this at its start and end.
    pub fn flush_deferred(&self) -> usize {
        self.deferred.run_pending()
    }

    /// Drain queued tasks for this frame. Call once per frame after all
    /// mandatory per-frame work.
    ///
    /// Skips the drain entirely when the frame is already over its budget.
    pub fn process_frame(&self) -> DrainReport {
        self.flush_deferred();

        let started = self.clock.now();
        self.timing.latch_frame_start(started);
        self.timing.begin_processing(started);

        let mut report = DrainReport::default();
        if self.timing.lagging(started) {
            debug!(
                "Frame already past its {:?} budget, skipping drain",
                self.timing.frame_budget()
            );
            report.stop = StopReason::Lagging;
        } else {
            report.stop = self.drain(&mut report);
        }
        report.elapsed = self.clock.now().saturating_sub(started);

        self.timing.finish_processing();
        self.flush_deferred();

        if let Ok(mut m) = self.metrics.write() {
            m.record_frame(&report);
        }
        debug!(
            "Frame drained in {:?}: {} executed, {} discarded, {} skipped ahead, {} queues completed ({:?})",
            report.elapsed,
            report.executed,
            report.discarded,
            report.skipped_ahead,
            report.queues_completed,
            report.stop
        );
        self.notify_drain_finished(&report);
        report
    }

    fn notify_drain_finished(&self, report: &DrainReport) {
        let listeners: Vec<DrainListener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(Arc::clone)
            .collect();
        for listener in listeners {
            listener(report);
        }
    }

    /// The drain loop. The queue lock is only held for selection, inspection,
    /// taking a job, and removal; jobs and callbacks run without it.
    fn drain(&self, report: &mut DrainReport) -> StopReason {
        let Some(mut cursor) = self.select_current() else {
            return StopReason::Idle;
        };
        let mut first_call = true;

        loop {
            let now = self.clock.now();
            if self.timing.over_budget(now) {
                return StopReason::BudgetExhausted;
            }

            let peek = {
                let map = self.lock_queues();
                map.queues
                    .get(&cursor.queue)
                    .filter(|queue| !queue.is_paused())
                    .and_then(|queue| queue.peek(cursor.task))
            };
            let Some(peek) = peek else {
                // Canceled, paused, or deleted from another thread.
                match self.select_current() {
                    Some(next) => {
                        cursor = next;
                        continue;
                    }
                    None => return StopReason::Idle,
                }
            };

            if peek.valid {
                let estimate = self
                    .lock_costs()
                    .estimate(&peek.kind, self.timing.baseline_estimate());

                if !first_call && self.timing.too_expensive(now, estimate) {
                    let candidate = self
                        .lock_queues()
                        .queues
                        .get(&cursor.queue)
                        .and_then(|queue| queue.next_unordered_after(cursor.task));
                    match candidate {
                        Some(task) => {
                            trace!(
                                "Task {} in queue {} estimated at {:?}, skipping ahead",
                                peek.kind,
                                cursor.queue,
                                estimate
                            );
                            report.skipped_ahead += 1;
                            cursor.task = task;
                            continue;
                        }
                        None => return StopReason::NoCheaperTask,
                    }
                }

                let job = self
                    .lock_queues()
                    .queues
                    .get_mut(&cursor.queue)
                    .and_then(|queue| queue.take_job(cursor.task));
                let Some(job) = job else {
                    continue;
                };

                let run_start = self.clock.now();
                job.run();
                let elapsed = self.clock.now().saturating_sub(run_start);

                self.lock_costs().record(&peek.kind, elapsed);
                if let Ok(mut m) = self.metrics.write() {
                    m.record_execution(&peek.kind);
                }
                first_call = false;
                report.executed += 1;
            } else {
                trace!("Discarding task {} in queue {}: target dropped", peek.kind, cursor.queue);
                report.discarded += 1;
            }

            match self.retire(cursor, report) {
                Step::Continue(next) => cursor = next,
                Step::Stop(reason) => return reason,
            }
        }
    }

    /// Remove the handled task, fire completion when its queue empties, and
    /// work out where the drain continues.
    ///
    /// A discarded task's job and a deleted queue are dropped only after the
    /// queue lock is released; their captures may call back into the scheduler.
    fn retire(&self, cursor: Cursor, report: &mut DrainReport) -> Step {
        let (next, emptied, completion, leftover, removed_queue) = {
            let mut map = self.lock_queues();
            let Some(queue) = map.queues.get_mut(&cursor.queue) else {
                drop(map);
                return self.reselect();
            };
            // Only the head advances structurally; a task reached by skipping
            // ahead continues to the next unordered task so ordered ones are
            // never run out of turn.
            let next = if queue.is_head(cursor.task) {
                queue.next_of(cursor.task)
            } else {
                queue.next_unordered_after(cursor.task)
            };
            let Some(leftover) = queue.remove(cursor.task) else {
                drop(map);
                return self.reselect();
            };

            let emptied = queue.is_empty();
            let mut completion = None;
            let mut removed_queue = None;
            if emptied {
                completion = queue.on_completion.clone();
                if queue.is_locked() && !cursor.queue.is_default() {
                    removed_queue = map.queues.shift_remove(&cursor.queue);
                    info!("Locked queue {} drained and removed", cursor.queue);
                }
            }
            (next, emptied, completion, leftover, removed_queue)
        };
        drop(leftover);
        drop(removed_queue);

        if emptied {
            report.queues_completed += 1;
            debug!("Queue {} drained", cursor.queue);
            if let Some(callback) = completion {
                callback();
            }
            return self.reselect();
        }

        match next {
            Some(task) => Step::Continue(Cursor { queue: cursor.queue, task }),
            None => Step::Stop(StopReason::EndOfReachable),
        }
    }

    fn reselect(&self) -> Step {
        match self.select_current() {
            Some(cursor) => Step::Continue(cursor),
            None => Step::Stop(StopReason::Idle),
        }
    }
}
