//! Time-budgeted cooperative task scheduler.
//!
//! Callers enqueue [`Job`]s into prioritized queues; once per frame the host
//! calls [`Scheduler::process_frame`] after its mandatory work, and the
//! scheduler runs as many queued jobs as fit before the frame deadline.
//! Higher-priority queues are drained first, and a job whose running average
//! cost no longer fits is passed over in favor of a later unordered job.
//!
//! Jobs run on the thread that calls `process_frame` and are never preempted.
//! Every other operation may be called from any thread, including from inside
//! a running job.

pub mod clock;
pub mod cost;
mod deferred;
pub mod job;
pub mod metrics;
pub mod queue;
pub mod runner;
mod timing;
pub mod types;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use cost::{CostEntry, CostTable};
pub use job::Job;
pub use metrics::SchedulerMetrics;
pub use queue::{TaskHandle, TaskQueue};
pub use runner::Scheduler;
pub use types::{CancelOutcome, Callback, DrainListener, DrainReport, StopReason};
