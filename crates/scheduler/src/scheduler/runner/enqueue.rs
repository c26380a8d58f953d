use framefill_core::{QueueId, SchedulerError};
use tracing::{debug, trace};

use crate::scheduler::job::Job;
use crate::scheduler::queue::{TaskChain, TaskQueue};

use super::core::QueueMap;
use super::Scheduler;

fn writable_queue(map: &mut QueueMap, id: QueueId) -> Result<&mut TaskQueue, SchedulerError> {
    let queue = map
        .queues
        .get_mut(&id)
        .ok_or(SchedulerError::NotFound(id))?;
    if queue.locked {
        return Err(SchedulerError::Locked(id));
    }
    Ok(queue)
}

impl Scheduler {
    /// Append a job to the tail of a queue.
    ///
    /// `ordered` jobs run in submission order relative to the other ordered
    /// jobs of the same queue; unordered jobs may be run ahead of them.
    pub fn add_task(&self, job: Job, queue: QueueId, ordered: bool) -> Result<(), SchedulerError> {
        let kind = job.kind().clone();
        {
            let mut map = self.lock_queues();
            writable_queue(&mut map, queue)?.push_back(job, ordered);
        }
        trace!("Added task {} to queue {} (ordered: {})", kind, queue, ordered);
        Ok(())
    }

    /// Append many jobs to a queue with a single lock acquisition.
    ///
    /// The tasks are built before the lock is taken and spliced onto the tail
    /// in one step. Jobs whose target is already gone are skipped. Returns the
    /// number of tasks added.
    pub fn add_task_batch<I>(&self, jobs: I, queue: QueueId, ordered: bool) -> Result<usize, SchedulerError>
    where
        I: IntoIterator<Item = Job>,
    {
        let jobs = jobs.into_iter();
        let mut chain = TaskChain::with_capacity(jobs.size_hint().0);
        let mut skipped = 0usize;
        for job in jobs {
            if job.is_valid() {
                chain.push(job, ordered);
            } else {
                skipped += 1;
            }
        }

        let added = {
            let mut map = self.lock_queues();
            let target = writable_queue(&mut map, queue)?;
            if chain.is_empty() {
                0
            } else {
                target.append(chain)
            }
        };
        debug!(
            "Added {} tasks to queue {} (ordered: {}, {} skipped with dropped targets)",
            added, queue, ordered, skipped
        );
        Ok(added)
    }
}
