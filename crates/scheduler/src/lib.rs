pub mod error;
pub mod model;
pub mod runtime;

pub use error::SchedulerError;
pub use model::{PositionCallback, QueueStats, SchedulerConfig};
pub use runtime::RunScheduler;
