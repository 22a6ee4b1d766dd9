//! Domain types shared across the pipeline.
//!
//! This module defines:
//!
//! - the resolved simulation configuration (`SimulationConfig`)
//! - fleet-level enums (`RankStat`, `ParamSource`)

pub mod types;

pub use types::*;
