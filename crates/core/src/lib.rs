#![forbid(unsafe_code)]

pub mod model;
pub mod policy;
pub mod time;

pub use policy::{AdjusterConfig, DifficultyAdjuster};
pub use time::Clock;
