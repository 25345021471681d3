pub mod card;
pub mod review;

pub use card::{Card, SchedulingState};
pub use review::{ReviewDecision, ReviewQuality};
