pub mod config;
pub mod error;
pub mod ids;

pub use config::SchedulerConfig;
pub use error::*;
pub use ids::*;
