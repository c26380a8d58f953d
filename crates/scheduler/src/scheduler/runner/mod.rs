//! Scheduler runner -- queue bookkeeping and the per-frame drain loop.
//!
//! Split into focused submodules:
//! - `core`: Scheduler struct, constructor, timing configuration, and accessors
//! - `lifecycle`: queue creation, priority, pause, lock, and cancellation
//! - `enqueue`: single and batch task submission
//! - `scheduling`: selection of the queue to drain
//! - `execution`: frame signals and the time-budgeted drain loop

mod core;
mod enqueue;
mod execution;
mod lifecycle;
mod scheduling;

pub use self::core::Scheduler;
