pub mod interval;
pub mod sm2;

pub use interval::{format_interval, next_review_at};
pub use sm2::{Phase, Scheduler, SchedulerConfig};
