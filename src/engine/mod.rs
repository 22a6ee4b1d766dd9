//! Per-request impact engine.
//!
//! The engine is a deterministic, side-effect-free analytical model: given
//! a model's parameter counts, a token count, a latency ceiling, and an
//! electricity mix, it produces the request's energy draw and its
//! usage-phase and embodied-phase footprints.
//!
//! Two formula generations exist and are never mixed:
//!
//! - [`v1`] — the legacy generation (interval-carrying regressions,
//!   4-bit quantization, exact GPU-count ceil, no water footprint)
//! - [`v2`] — the current generation (batch-amortized energy, 16-bit
//!   quantization, power-of-two GPU provisioning, water footprint)
//!
//! Each generation is a sealed module carrying its own constant set;
//! callers pick one explicitly via [`FormulaVersion`]. Every call is
//! pure and lock-free, so any number of requests may be evaluated
//! concurrently once the mix registries are loaded.

pub mod aggregate;
pub mod hardware;
pub mod v1;
pub mod v2;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::Range;

/// Which formula generation to evaluate.
///
/// The two generations carry disjoint coefficient sets and differ in
/// batch-size normalization, GPU-count rounding, and output shape (v2
/// adds a water footprint). There is no auto-detection or fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FormulaVersion {
    /// Legacy generation.
    V1,
    /// Current generation.
    V2,
}

impl FormulaVersion {
    pub fn display_name(self) -> &'static str {
        match self {
            FormulaVersion::V1 => "v1 (legacy)",
            FormulaVersion::V2 => "v2 (current)",
        }
    }
}

/// Engine failures.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ImpactError {
    /// Electricity-mix zone code absent from the selected registry.
    /// Always fatal to the call; never silently defaulted.
    #[error("unknown electricity-mix zone `{zone}`")]
    UnknownZone { zone: String },

    /// Rejected at the boundary before any arithmetic runs, so the
    /// formulas can never see inputs that would produce negative
    /// footprints.
    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },

    /// The embedded registry snapshot failed to parse. Surfaced rather
    /// than defaulted so a broken data file cannot masquerade as an
    /// empty registry.
    #[error("electricity-mix registry unavailable: {detail}")]
    Registry { detail: String },
}

/// Model parameter counts, in billions, as scalar-or-range values.
///
/// Mixture-of-experts models publish uncertainty bounds rather than
/// exact counts; dense models collapse to degenerate ranges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelParameters {
    /// Parameters active per forward pass.
    pub active: Range,
    /// Parameters resident in accelerator memory.
    pub total: Range,
}

impl ModelParameters {
    pub fn new(active: Range, total: Range) -> Self {
        Self { active, total }
    }

    /// Dense model: every parameter is active.
    pub fn dense(params: Range) -> Self {
        Self {
            active: params,
            total: params,
        }
    }
}

/// Per-request modeling inputs other than the model itself.
///
/// `latency_ceiling` is a modeling input (it bounds the simulated
/// generation time, the caller's SLA winning over the projection); it is
/// not an execution deadline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestContext {
    /// Completion tokens generated for the request.
    pub output_tokens: u64,
    /// Upper bound on generation latency, seconds. `f64::INFINITY`
    /// leaves the projected latency uncapped.
    pub latency_ceiling: f64,
    /// Identical requests represented by this call; results scale
    /// linearly.
    pub request_count: u64,
    /// Datacenter power-usage-effectiveness multiplier.
    pub pue: Range,
    /// Datacenter water-usage-effectiveness, L/kWh. Ignored by v1.
    pub wue: Range,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            output_tokens: 0,
            latency_ceiling: f64::INFINITY,
            request_count: 1,
            pue: Range::scalar(v2::DATACENTER_PUE),
            wue: Range::scalar(v2::DATACENTER_WUE),
        }
    }
}

/// Usage-phase footprints (proportional to energy drawn).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UsageImpacts {
    pub energy: Range,
    pub gwp: Range,
    pub adpe: Range,
    pub pe: Range,
    /// Water footprint, L. Present only for the current generation.
    pub wcf: Option<Range>,
}

/// Embodied-phase footprints (manufacturing impact prorated by
/// time-of-use).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EmbodiedImpacts {
    pub gwp: Range,
    pub adpe: Range,
    pub pe: Range,
}

/// Full impact of one request (or `request_count` identical requests).
///
/// The top-level `gwp`/`adpe`/`pe` are always the exact sums of their
/// usage and embodied parts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImpactResult {
    /// Final energy drawn from the grid, kWh.
    pub energy: Range,
    /// Total global-warming potential, kgCO2eq.
    pub gwp: Range,
    /// Total abiotic-resource depletion, kgSbeq.
    pub adpe: Range,
    /// Total primary energy, MJ.
    pub pe: Range,
    /// Water footprint, L. Present only for the current generation.
    pub wcf: Option<Range>,
    pub usage: UsageImpacts,
    pub embodied: EmbodiedImpacts,
}

/// Compute the impact of `ctx.request_count` identical requests against
/// the electricity mix registered under `zone`.
///
/// Parameter ranges are evaluated at their endpoints and merged (see
/// [`aggregate`]); scalar inputs produce exact, unwidened results.
pub fn compute_impact(
    version: FormulaVersion,
    params: &ModelParameters,
    zone: &str,
    ctx: &RequestContext,
) -> Result<ImpactResult, ImpactError> {
    validate_inputs(params, ctx)?;

    let single = match version {
        FormulaVersion::V1 => v1::compute_request(params, zone, ctx)?,
        FormulaVersion::V2 => v2::compute_request(params, zone, ctx)?,
    };

    Ok(aggregate::scale_requests(single, ctx.request_count))
}

/// Boundary validation: the formulas themselves assume well-formed,
/// non-negative inputs.
fn validate_inputs(params: &ModelParameters, ctx: &RequestContext) -> Result<(), ImpactError> {
    check_bounds("active parameter count", params.active, 0.0)?;
    check_bounds("total parameter count", params.total, 0.0)?;
    check_bounds("datacenter WUE", ctx.wue, 0.0)?;
    check_bounds("datacenter PUE", ctx.pue, 0.0)?;
    if ctx.pue.min <= 0.0 {
        return Err(invalid("datacenter PUE must be positive"));
    }
    if ctx.latency_ceiling.is_nan() || ctx.latency_ceiling < 0.0 {
        return Err(invalid("latency ceiling must be >= 0 (or infinite)"));
    }
    if ctx.request_count == 0 {
        return Err(invalid("request count must be >= 1"));
    }
    Ok(())
}

fn check_bounds(label: &str, range: Range, floor: f64) -> Result<(), ImpactError> {
    if range.min.is_nan() || range.max.is_nan() || range.min.is_infinite() || range.max.is_infinite()
    {
        return Err(invalid(format!("{label} must be finite")));
    }
    if range.min < floor {
        return Err(invalid(format!("{label} must be >= {floor}")));
    }
    if range.min > range.max {
        return Err(invalid(format!("{label} range has min > max")));
    }
    Ok(())
}

fn invalid(reason: impl Into<String>) -> ImpactError {
    ImpactError::InvalidParameter {
        reason: reason.into(),
    }
}
