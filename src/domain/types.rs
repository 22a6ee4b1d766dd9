//! Shared domain types.
//!
//! These are derived from CLI flags (plus defaults) and passed through
//! the pipeline unchanged; the engine-facing types live in
//! `crate::engine`.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::engine::{FormulaVersion, ModelParameters};
use crate::math::Range;

/// Fallback active parameter count (billions) for usage rows that miss
/// the model registry.
pub const DEFAULT_ACTIVE_PARAMS_B: f64 = 20.0;
/// Fallback total parameter count (billions) for usage rows that miss
/// the model registry.
pub const DEFAULT_TOTAL_PARAMS_B: f64 = 120.0;

/// Which stat orders the fleet ranking table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RankStat {
    /// Energy midpoint, Wh.
    Energy,
    /// Emissions midpoint, gCO2eq.
    Gwp,
}

impl RankStat {
    pub fn display_name(self) -> &'static str {
        match self {
            RankStat::Energy => "energy",
            RankStat::Gwp => "emissions",
        }
    }
}

/// Where a row's parameter counts came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamSource {
    /// Resolved from the model registry.
    Registry,
    /// Registry miss; simulation defaults applied.
    Defaults,
}

impl ParamSource {
    pub fn label(self) -> &'static str {
        match self {
            ParamSource::Registry => "registry",
            ParamSource::Defaults => "defaults",
        }
    }
}

/// A full run's resolved simulation settings.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub version: FormulaVersion,
    /// Electricity-mix zone code.
    pub zone: String,
    pub pue: Range,
    /// Datacenter water intensity, L/kWh. Ignored by the legacy
    /// generation.
    pub wue: Range,
    /// Latency ceiling per individual request, seconds
    /// (`f64::INFINITY` = uncapped). Fleet rows multiply this by their
    /// request count.
    pub per_request_latency: f64,
    /// Parameters assumed for models absent from the registry.
    pub default_params: ModelParameters,
}

impl SimulationConfig {
    /// Defaults for the given formula generation: world mix, the
    /// generation's own PUE/WUE constants, uncapped latency, and the
    /// standard 20B/120B fallback model.
    pub fn for_version(version: FormulaVersion) -> Self {
        let (pue, wue) = match version {
            FormulaVersion::V1 => (crate::engine::v1::DATACENTER_PUE, 0.0),
            FormulaVersion::V2 => (
                crate::engine::v2::DATACENTER_PUE,
                crate::engine::v2::DATACENTER_WUE,
            ),
        };
        Self {
            version,
            zone: "WOR".to_string(),
            pue: Range::scalar(pue),
            wue: Range::scalar(wue),
            per_request_latency: f64::INFINITY,
            default_params: ModelParameters::new(
                Range::scalar(DEFAULT_ACTIVE_PARAMS_B),
                Range::scalar(DEFAULT_TOTAL_PARAMS_B),
            ),
        }
    }
}
