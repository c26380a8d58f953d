//! Task queues.
//!
//! A [`TaskQueue`] keeps its tasks in an arena of slots threaded into a
//! doubly linked list. Links are slot indices, and callers refer to tasks by
//! [`TaskHandle`], which carries the slot's generation: once a task is removed
//! (or the queue is cleared) every handle to it stops resolving, even after the
//! slot is reused.

use std::fmt;

use framefill_core::{QueueId, TaskKind};

use super::job::Job;
use super::types::Callback;

/// Generational reference to a task inside one queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    index: u32,
    generation: u32,
}

#[derive(Debug)]
struct TaskNode {
    /// `None` while the job is being executed.
    job: Option<Job>,
    kind: TaskKind,
    ordered: bool,
    prev: Option<u32>,
    next: Option<u32>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<TaskNode>,
}

/// What the drain loop needs to know about a task before deciding to run it.
#[derive(Debug, Clone)]
pub(crate) struct TaskPeek {
    pub kind: TaskKind,
    pub ordered: bool,
    /// Job present and its target still alive.
    pub valid: bool,
}

/// A run of tasks prepared outside the scheduler lock, spliced onto a queue
/// in one operation by [`TaskQueue::append`].
#[derive(Debug, Default)]
pub(crate) struct TaskChain {
    nodes: Vec<TaskNode>,
}

impl TaskChain {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { nodes: Vec::with_capacity(capacity) }
    }

    pub fn push(&mut self, job: Job, ordered: bool) {
        self.nodes.push(TaskNode {
            kind: job.kind().clone(),
            job: Some(job),
            ordered,
            prev: None,
            next: None,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A prioritized, pausable, lockable list of pending tasks.
pub struct TaskQueue {
    id: QueueId,
    pub(crate) priority: i32,
    pub(crate) paused: bool,
    pub(crate) locked: bool,
    pub(crate) on_completion: Option<Callback>,
    pub(crate) on_cancel: Option<Callback>,
    slots: Vec<Slot>,
    free: Vec<u32>,
    head: Option<u32>,
    tail: Option<u32>,
    len: usize,
}

impl TaskQueue {
    pub(crate) fn new(id: QueueId, priority: i32, paused: bool) -> Self {
        Self {
            id,
            priority,
            paused,
            locked: false,
            on_completion: None,
            on_cancel: None,
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn id(&self) -> QueueId {
        self.id
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn head(&self) -> Option<TaskHandle> {
        self.head.map(|index| self.handle(index))
    }

    pub fn is_head(&self, handle: TaskHandle) -> bool {
        self.resolve(handle).is_some() && self.head == Some(handle.index)
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, handle: TaskHandle) -> bool {
        self.resolve(handle).is_some()
    }

    /// Kinds of the pending tasks, head to tail.
    #[cfg(test)]
    pub(crate) fn kinds(&self) -> Vec<TaskKind> {
        let mut kinds = Vec::with_capacity(self.len);
        let mut cursor = self.head;
        while let Some(index) = cursor {
            let node = self.node_at(index);
            kinds.push(node.kind.clone());
            cursor = node.next;
        }
        kinds
    }

    pub(crate) fn peek(&self, handle: TaskHandle) -> Option<TaskPeek> {
        let node = self.resolve(handle)?;
        Some(TaskPeek {
            kind: node.kind.clone(),
            ordered: node.ordered,
            valid: node.job.as_ref().is_some_and(Job::is_valid),
        })
    }

    pub(crate) fn push_back(&mut self, job: Job, ordered: bool) -> TaskHandle {
        let kind = job.kind().clone();
        let index = self.alloc(TaskNode {
            job: Some(job),
            kind,
            ordered,
            prev: None,
            next: None,
        });
        self.link_back(index);
        self.handle(index)
    }

    /// Splice a prepared chain onto the tail. Returns the number of tasks added.
    pub(crate) fn append(&mut self, chain: TaskChain) -> usize {
        let added = chain.nodes.len();
        for node in chain.nodes {
            let index = self.alloc(node);
            self.link_back(index);
        }
        added
    }

    /// Move the job out of its task for execution. The task stays linked
    /// until [`remove`](Self::remove) is called.
    pub(crate) fn take_job(&mut self, handle: TaskHandle) -> Option<Job> {
        self.resolve_mut(handle)?.job.take()
    }

    /// Structural successor.
    pub(crate) fn next_of(&self, handle: TaskHandle) -> Option<TaskHandle> {
        let next = self.resolve(handle)?.next?;
        Some(self.handle(next))
    }

    /// Nearest unordered task after `handle`, passing over ordered ones.
    pub(crate) fn next_unordered_after(&self, handle: TaskHandle) -> Option<TaskHandle> {
        let mut cursor = self.resolve(handle)?.next;
        while let Some(index) = cursor {
            let node = self.node_at(index);
            if !node.ordered {
                return Some(self.handle(index));
            }
            cursor = node.next;
        }
        None
    }

    /// Unlink and free a task.
    ///
    /// Returns `None` if the handle no longer resolves, otherwise the task's
    /// job if it was never taken, so the caller can drop it outside the
    /// scheduler lock.
    pub(crate) fn remove(&mut self, handle: TaskHandle) -> Option<Option<Job>> {
        let node = self.resolve(handle)?;
        let (prev, next) = (node.prev, node.next);

        match prev {
            Some(p) => self.node_at_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_at_mut(n).prev = prev,
            None => self.tail = prev,
        }

        let slot = &mut self.slots[handle.index as usize];
        let node = slot.node.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        Some(node.and_then(|n| n.job))
    }

    /// Drop every pending task. Returns the jobs that were still queued so the
    /// caller can release them outside the scheduler lock.
    pub(crate) fn clear(&mut self) -> Vec<Job> {
        let mut jobs = Vec::with_capacity(self.len);
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(node) = slot.node.take() {
                slot.generation = slot.generation.wrapping_add(1);
                jobs.extend(node.job);
            }
            self.free.push(index as u32);
        }
        self.head = None;
        self.tail = None;
        self.len = 0;
        jobs
    }

    fn alloc(&mut self, node: TaskNode) -> u32 {
        match self.free.pop() {
            Some(index) => {
                self.slots[index as usize].node = Some(node);
                index
            }
            None => {
                self.slots.push(Slot { generation: 0, node: Some(node) });
                (self.slots.len() - 1) as u32
            }
        }
    }

    fn link_back(&mut self, index: u32) {
        let tail = self.tail;
        {
            let node = self.node_at_mut(index);
            node.prev = tail;
            node.next = None;
        }
        match tail {
            Some(t) => self.node_at_mut(t).next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;
    }

    fn handle(&self, index: u32) -> TaskHandle {
        TaskHandle {
            index,
            generation: self.slots[index as usize].generation,
        }
    }

    fn resolve(&self, handle: TaskHandle) -> Option<&TaskNode> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn resolve_mut(&mut self, handle: TaskHandle) -> Option<&mut TaskNode> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.node.as_mut()
    }

    // Linked indices always point at occupied slots.
    fn node_at(&self, index: u32) -> &TaskNode {
        match &self.slots[index as usize].node {
            Some(node) => node,
            None => unreachable!("linked slot {index} is vacant"),
        }
    }

    fn node_at_mut(&mut self, index: u32) -> &mut TaskNode {
        match &mut self.slots[index as usize].node {
            Some(node) => node,
            None => unreachable!("linked slot {index} is vacant"),
        }
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("paused", &self.paused)
            .field("locked", &self.locked)
            .field("len", &self.len)
            .field("on_completion", &self.on_completion.is_some())
            .field("on_cancel", &self.on_cancel.is_some())
            .finish()
    }
}
