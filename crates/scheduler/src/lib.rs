pub mod scheduler;

pub use framefill_core::{ConfigError, QueueId, SchedulerConfig, SchedulerError, TaskKind};
pub use scheduler::{
    CancelOutcome, Callback, Clock, DrainListener, DrainReport, Job, ManualClock, MonotonicClock,
    Scheduler, SchedulerMetrics, StopReason,
};
