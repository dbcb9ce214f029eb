//! Configuration model for ralph.
//!
//! This module defines the Config struct that represents
//! `.claude/orchestrator.yaml`. The file is optional; unknown fields are
//! preserved for forward compatibility and values are validated on load.

mod model;
mod operations;
pub mod types;


pub use model::Config;
pub use types::{RunnerSettings, TrackerSettings};
