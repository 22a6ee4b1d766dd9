//! Legacy formula generation.
//!
//! Coefficients are carried verbatim from the original published
//! regression set and must never be mixed with the current generation's:
//! the energy and latency regressions here carry 95 %-confidence
//! intervals from fixed standard-deviation terms, quantization is 4 bits,
//! the accelerator count is the raw ceiling, and no water footprint is
//! produced.

use crate::engine::aggregate::{self, RequestFootprint};
use crate::engine::hardware::{self, GpuRounding};
use crate::engine::{ImpactError, ImpactResult, ModelParameters, RequestContext};
use crate::math::Range;
use crate::mix::{self, LegacyMix};

const MODEL_QUANTIZATION_BITS: f64 = 4.0;

/// Energy-per-token regression in active parameters (kWh/token).
const GPU_ENERGY_ALPHA: f64 = 8.91e-8;
const GPU_ENERGY_BETA: f64 = 1.43e-6;
const GPU_ENERGY_STDEV: f64 = 5.19e-7;

/// Latency-per-token regression in active parameters (s/token).
const GPU_LATENCY_ALPHA: f64 = 8.02e-4;
const GPU_LATENCY_BETA: f64 = 2.23e-2;
const GPU_LATENCY_STDEV: f64 = 7.0e-6;

/// Two-sided 95 % confidence multiplier.
const CONFIDENCE_95: f64 = 1.96;

const GPU_MEMORY_GB: f64 = 80.0;
const GPU_EMBODIED_IMPACT_GWP: f64 = 143.0;
const GPU_EMBODIED_IMPACT_ADPE: f64 = 5.1e-3;
const GPU_EMBODIED_IMPACT_PE: f64 = 1828.0;

const SERVER_GPUS: f64 = 8.0;
/// Non-accelerator server draw, kW.
const SERVER_POWER_KW: f64 = 1.0;
const SERVER_EMBODIED_IMPACT_GWP: f64 = 3000.0;
const SERVER_EMBODIED_IMPACT_ADPE: f64 = 0.24;
const SERVER_EMBODIED_IMPACT_PE: f64 = 38000.0;

/// Amortization window for embodied impacts: 5 years, in seconds.
const HARDWARE_LIFESPAN_SECS: f64 = 5.0 * 365.0 * 24.0 * 60.0 * 60.0;

/// Default power-usage-effectiveness when the caller does not override it.
pub const DATACENTER_PUE: f64 = 1.2;

/// Evaluate the legacy formulas for one request (before request-count
/// scaling).
pub(crate) fn compute_request(
    params: &ModelParameters,
    zone: &str,
    ctx: &RequestContext,
) -> Result<ImpactResult, ImpactError> {
    let mix = mix::lookup_legacy(zone)?;
    let fp = aggregate::evaluate_endpoints(params, |active, total| {
        compute_once(active, total, ctx, mix)
    });
    Ok(aggregate::assemble(fp))
}

/// One scalar-endpoint evaluation. Pure; inputs already validated.
fn compute_once(
    active_params: f64,
    total_params: f64,
    ctx: &RequestContext,
    mix: &LegacyMix,
) -> RequestFootprint {
    let tokens = ctx.output_tokens as f64;

    // Per-accelerator energy with its 95% confidence interval, kWh.
    let energy_per_token = GPU_ENERGY_ALPHA * active_params + GPU_ENERGY_BETA;
    let gpu_energy = Range::new(
        tokens * (energy_per_token - CONFIDENCE_95 * GPU_ENERGY_STDEV),
        tokens * (energy_per_token + CONFIDENCE_95 * GPU_ENERGY_STDEV),
    )
    .clamp_min(0.0);

    // Projected generation latency interval, seconds. The caller's SLA
    // wins: if the whole interval does not fit under the ceiling, the
    // ceiling becomes the (scalar) generation latency.
    let latency_per_token = GPU_LATENCY_ALPHA * active_params + GPU_LATENCY_BETA;
    let latency = Range::new(
        tokens * (latency_per_token - CONFIDENCE_95 * GPU_LATENCY_STDEV),
        tokens * (latency_per_token + CONFIDENCE_95 * GPU_LATENCY_STDEV),
    )
    .clamp_min(0.0);
    let gen_latency = if latency.less_than(ctx.latency_ceiling) {
        latency
    } else {
        Range::scalar(ctx.latency_ceiling)
    };

    let gpu_count = hardware::gpu_count(
        total_params,
        MODEL_QUANTIZATION_BITS,
        GPU_MEMORY_GB,
        GpuRounding::Exact,
    ) as f64;

    // Non-accelerator server draw, prorated by this model's share of the
    // server's accelerator slots.
    let server_energy = gen_latency.scale((SERVER_POWER_KW / 3600.0) * (gpu_count / SERVER_GPUS));
    let request_energy = server_energy.add(gpu_energy.scale(gpu_count)).mul(ctx.pue);

    let usage_gwp = request_energy.scale(mix.gwp);
    let usage_adpe = request_energy.scale(mix.adpe);
    let usage_pe = request_energy.scale(mix.pe);

    // Embodied inventory for the accelerators plus their server share,
    // amortized over the hardware lifetime and prorated by time-of-use.
    let embodied_gwp_inventory =
        (gpu_count / SERVER_GPUS) * SERVER_EMBODIED_IMPACT_GWP + gpu_count * GPU_EMBODIED_IMPACT_GWP;
    let embodied_adpe_inventory = (gpu_count / SERVER_GPUS) * SERVER_EMBODIED_IMPACT_ADPE
        + gpu_count * GPU_EMBODIED_IMPACT_ADPE;
    let embodied_pe_inventory =
        (gpu_count / SERVER_GPUS) * SERVER_EMBODIED_IMPACT_PE + gpu_count * GPU_EMBODIED_IMPACT_PE;

    let embodied_gwp = gen_latency.scale(embodied_gwp_inventory / HARDWARE_LIFESPAN_SECS);
    let embodied_adpe = gen_latency.scale(embodied_adpe_inventory / HARDWARE_LIFESPAN_SECS);
    let embodied_pe = gen_latency.scale(embodied_pe_inventory / HARDWARE_LIFESPAN_SECS);

    RequestFootprint {
        energy: request_energy,
        usage_gwp,
        usage_adpe,
        usage_pe,
        usage_wcf: None,
        embodied_gwp,
        embodied_adpe,
        embodied_pe,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{FormulaVersion, compute_impact};

    fn ctx(tokens: u64) -> RequestContext {
        RequestContext {
            output_tokens: tokens,
            pue: Range::scalar(DATACENTER_PUE),
            ..RequestContext::default()
        }
    }

    fn rel_close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() <= expected.abs() * 1e-9 + 1e-15
    }

    #[test]
    fn dense_20b_of_120b_request_energy() {
        // 20B active / 120B total, 100 tokens, uncapped latency, PUE 1.2.
        let params = ModelParameters {
            active: Range::scalar(20.0),
            total: Range::scalar(120.0),
        };
        let result = compute_impact(FormulaVersion::V1, &params, "WOR", &ctx(100)).unwrap();

        // 120B at 4 bits is 72 GB: a single 80 GB accelerator.
        // Energy/token: 8.91e-8 * 20 + 1.43e-6 = 3.212e-6 kWh +/- 1.96sd.
        let ept = GPU_ENERGY_ALPHA * 20.0 + GPU_ENERGY_BETA;
        let gpu_lo = 100.0 * (ept - 1.96 * GPU_ENERGY_STDEV);
        let gpu_hi = 100.0 * (ept + 1.96 * GPU_ENERGY_STDEV);

        // Latency/token: 8.02e-4 * 20 + 2.23e-2 = 3.834e-2 s +/- 1.96sd.
        let lpt = GPU_LATENCY_ALPHA * 20.0 + GPU_LATENCY_BETA;
        let lat_lo = 100.0 * (lpt - 1.96 * GPU_LATENCY_STDEV);
        let lat_hi = 100.0 * (lpt + 1.96 * GPU_LATENCY_STDEV);

        let server_lo = lat_lo * (1.0 / 3600.0) * (1.0 / 8.0);
        let server_hi = lat_hi * (1.0 / 3600.0) * (1.0 / 8.0);

        let expected_lo = (server_lo + gpu_lo) * 1.2;
        let expected_hi = (server_hi + gpu_hi) * 1.2;

        assert!(rel_close(result.energy.min, expected_lo));
        assert!(rel_close(result.energy.max, expected_hi));
        assert!(result.energy.min < result.energy.max);

        // WOR mix: usage GWP is energy times the carbon intensity.
        let mix = mix::lookup_legacy("WOR").unwrap();
        assert!(rel_close(result.usage.gwp.min, expected_lo * mix.gwp));
        assert!(rel_close(result.usage.gwp.max, expected_hi * mix.gwp));

        // Legacy generation produces no water footprint.
        assert!(result.wcf.is_none());
        assert!(result.usage.wcf.is_none());
    }

    #[test]
    fn embodied_share_prorated_by_latency() {
        let params = ModelParameters {
            active: Range::scalar(20.0),
            total: Range::scalar(120.0),
        };
        let result = compute_impact(FormulaVersion::V1, &params, "WOR", &ctx(100)).unwrap();

        let lpt = GPU_LATENCY_ALPHA * 20.0 + GPU_LATENCY_BETA;
        let lat_hi = 100.0 * (lpt + 1.96 * GPU_LATENCY_STDEV);
        // One accelerator: 1/8 of a server plus one GPU's own inventory.
        let inventory = SERVER_EMBODIED_IMPACT_GWP / 8.0 + GPU_EMBODIED_IMPACT_GWP;
        let expected_hi = lat_hi * inventory / HARDWARE_LIFESPAN_SECS;

        assert!(rel_close(result.embodied.gwp.max, expected_hi));
    }

    #[test]
    fn latency_ceiling_replaces_interval_when_exceeded() {
        let params = ModelParameters {
            active: Range::scalar(20.0),
            total: Range::scalar(120.0),
        };
        // Projected latency is ~3.83 s for 100 tokens; a 2 s ceiling wins
        // and collapses the latency to a scalar.
        let capped = RequestContext {
            latency_ceiling: 2.0,
            ..ctx(100)
        };
        let result = compute_impact(FormulaVersion::V1, &params, "WOR", &capped).unwrap();

        // With latency pinned, the embodied footprint is scalar.
        assert!(result.embodied.gwp.is_scalar());
        let inventory = SERVER_EMBODIED_IMPACT_GWP / 8.0 + GPU_EMBODIED_IMPACT_GWP;
        assert!(rel_close(
            result.embodied.gwp.max,
            2.0 * inventory / HARDWARE_LIFESPAN_SECS
        ));

        // A ceiling above the projected interval leaves it untouched.
        let uncapped = RequestContext {
            latency_ceiling: 10.0,
            ..ctx(100)
        };
        let free = compute_impact(FormulaVersion::V1, &params, "WOR", &uncapped).unwrap();
        let lpt = GPU_LATENCY_ALPHA * 20.0 + GPU_LATENCY_BETA;
        let lat_hi = 100.0 * (lpt + 1.96 * GPU_LATENCY_STDEV);
        assert!(rel_close(
            free.embodied.gwp.max,
            lat_hi * inventory / HARDWARE_LIFESPAN_SECS
        ));
    }

    #[test]
    fn scalar_and_degenerate_range_agree_exactly() {
        let scalar = ModelParameters {
            active: Range::scalar(45.0),
            total: Range::scalar(45.0),
        };
        let range = ModelParameters {
            active: Range::new(45.0, 45.0),
            total: Range::new(45.0, 45.0),
        };
        let a = compute_impact(FormulaVersion::V1, &scalar, "FRA", &ctx(250)).unwrap();
        let b = compute_impact(FormulaVersion::V1, &range, "FRA", &ctx(250)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn moe_range_widens_toward_both_endpoints() {
        let lo = ModelParameters {
            active: Range::scalar(10.0),
            total: Range::scalar(100.0),
        };
        let hi = ModelParameters {
            active: Range::scalar(40.0),
            total: Range::scalar(500.0),
        };
        let moe = ModelParameters {
            active: Range::new(10.0, 40.0),
            total: Range::new(100.0, 500.0),
        };

        let r_lo = compute_impact(FormulaVersion::V1, &lo, "WOR", &ctx(100)).unwrap();
        let r_hi = compute_impact(FormulaVersion::V1, &hi, "WOR", &ctx(100)).unwrap();
        let r_moe = compute_impact(FormulaVersion::V1, &moe, "WOR", &ctx(100)).unwrap();

        assert_eq!(r_moe.energy.min, r_lo.energy.min);
        assert_eq!(r_moe.energy.max, r_hi.energy.max);
        assert_eq!(r_moe.gwp.min, r_lo.gwp.min);
        assert_eq!(r_moe.gwp.max, r_hi.gwp.max);
    }

    #[test]
    fn zero_tokens_zero_usage() {
        let params = ModelParameters {
            active: Range::scalar(20.0),
            total: Range::scalar(120.0),
        };
        let result = compute_impact(FormulaVersion::V1, &params, "WOR", &ctx(0)).unwrap();
        assert_eq!(result.energy, Range::scalar(0.0));
        assert_eq!(result.gwp, Range::scalar(0.0));
        assert_eq!(result.embodied.pe, Range::scalar(0.0));
    }

    #[test]
    fn request_count_scales_linearly() {
        let params = ModelParameters {
            active: Range::scalar(20.0),
            total: Range::scalar(120.0),
        };
        let one = compute_impact(FormulaVersion::V1, &params, "WOR", &ctx(100)).unwrap();
        let many_ctx = RequestContext {
            request_count: 1000,
            ..ctx(100)
        };
        let many = compute_impact(FormulaVersion::V1, &params, "WOR", &many_ctx).unwrap();

        assert!(rel_close(many.energy.max, one.energy.max * 1000.0));
        assert!(rel_close(many.usage.adpe.min, one.usage.adpe.min * 1000.0));
        assert!(rel_close(many.embodied.pe.max, one.embodied.pe.max * 1000.0));
    }

    #[test]
    fn all_fields_nonnegative() {
        let params = ModelParameters {
            active: Range::new(0.0, 2000.0),
            total: Range::new(0.0, 4000.0),
        };
        let result = compute_impact(FormulaVersion::V1, &params, "POL", &ctx(5000)).unwrap();
        for r in [
            result.energy,
            result.gwp,
            result.adpe,
            result.pe,
            result.usage.energy,
            result.embodied.gwp,
            result.embodied.adpe,
            result.embodied.pe,
        ] {
            assert!(r.min >= 0.0 && r.max >= r.min);
        }
    }
}
