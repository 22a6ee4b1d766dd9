//! Current formula generation.
//!
//! The revised regression set models a server that serves many requests
//! concurrently: per-token accelerator energy is batch-adjusted with an
//! exponential term, the non-accelerator server draw and the embodied
//! shares are amortized over the inference batch, accelerators are
//! provisioned in power-of-two counts, quantization is 16 bits, and a
//! water footprint is produced from datacenter and grid water
//! intensities. Coefficients are this generation's own; none are shared
//! with the legacy module.

use crate::engine::aggregate::{self, RequestFootprint};
use crate::engine::hardware::{self, GpuRounding};
use crate::engine::{ImpactError, ImpactResult, ModelParameters, RequestContext};
use crate::math::Range;
use crate::mix::{self, Mix};

const MODEL_QUANTIZATION_BITS: f64 = 16.0;

/// Concurrent requests amortized per server.
const SERVER_BATCH_SIZE: f64 = 32.0;

/// Energy-per-token regression in active parameters (kWh/token), before
/// batch adjustment.
const GPU_ENERGY_ALPHA: f64 = 2.30e-9;
const GPU_ENERGY_BETA: f64 = 7.72e-9;
/// Exponential decay of per-token energy with batch size.
const GPU_ENERGY_BATCH_DECAY: f64 = 2.00e-2;

/// Latency-per-token regression in active parameters and batch size
/// (s/token).
const GPU_LATENCY_ALPHA: f64 = 2.00e-3;
const GPU_LATENCY_BETA: f64 = 6.60e-3;
const GPU_LATENCY_BATCH: f64 = 2.00e-4;

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
/// Default on-site water-usage-effectiveness, L/kWh.
pub const DATACENTER_WUE: f64 = 0.18;

/// Evaluate the current formulas for one request (before request-count
/// scaling).
pub(crate) fn compute_request(
    params: &ModelParameters,
    zone: &str,
    ctx: &RequestContext,
) -> Result<ImpactResult, ImpactError> {
    let mix = mix::lookup_current(zone)?;
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
    mix: &Mix,
) -> RequestFootprint {
    let tokens = ctx.output_tokens as f64;

    // Per-accelerator energy, kWh. Single value: this generation's
    // regression carries no confidence interval.
    let energy_per_token = (GPU_ENERGY_ALPHA * active_params + GPU_ENERGY_BETA)
        * (-GPU_ENERGY_BATCH_DECAY * SERVER_BATCH_SIZE).exp();
    let gpu_energy = tokens * energy_per_token;

    // Projected generation latency, seconds; the caller's SLA wins.
    let latency_per_token =
        GPU_LATENCY_ALPHA * active_params + GPU_LATENCY_BETA + GPU_LATENCY_BATCH * SERVER_BATCH_SIZE;
    let projected_latency = tokens * latency_per_token;
    let gen_latency = if ctx.latency_ceiling < projected_latency {
        Range::scalar(ctx.latency_ceiling)
    } else {
        Range::scalar(projected_latency)
    };

    let gpu_count = hardware::gpu_count(
        total_params,
        MODEL_QUANTIZATION_BITS,
        GPU_MEMORY_GB,
        GpuRounding::PowerOfTwo,
    ) as f64;

    // Non-accelerator server draw, prorated by the accelerator-slot
    // share and amortized across the requests served concurrently.
    let server_energy = gen_latency
        .scale((SERVER_POWER_KW / 3600.0) * (gpu_count / SERVER_GPUS) / SERVER_BATCH_SIZE);
    let request_energy = server_energy
        .add(Range::scalar(gpu_energy).scale(gpu_count))
        .mul(ctx.pue);

    let usage_gwp = request_energy.scale(mix.gwp);
    let usage_adpe = request_energy.scale(mix.adpe);
    let usage_pe = request_energy.scale(mix.pe);

    // Water drawn on-site plus upstream at the power plant, per kWh of
    // request energy.
    let water_intensity = ctx.wue.add(ctx.pue.scale(mix.wue));
    let usage_wcf = request_energy.mul(water_intensity);

    // Embodied inventory, amortized over the lifetime, prorated by
    // time-of-use, and shared across the batch like the server draw.
    let embodied_gwp_inventory =
        (gpu_count / SERVER_GPUS) * SERVER_EMBODIED_IMPACT_GWP + gpu_count * GPU_EMBODIED_IMPACT_GWP;
    let embodied_adpe_inventory = (gpu_count / SERVER_GPUS) * SERVER_EMBODIED_IMPACT_ADPE
        + gpu_count * GPU_EMBODIED_IMPACT_ADPE;
    let embodied_pe_inventory =
        (gpu_count / SERVER_GPUS) * SERVER_EMBODIED_IMPACT_PE + gpu_count * GPU_EMBODIED_IMPACT_PE;

    let embodied_scale = 1.0 / (HARDWARE_LIFESPAN_SECS * SERVER_BATCH_SIZE);
    let embodied_gwp = gen_latency.scale(embodied_gwp_inventory * embodied_scale);
    let embodied_adpe = gen_latency.scale(embodied_adpe_inventory * embodied_scale);
    let embodied_pe = gen_latency.scale(embodied_pe_inventory * embodied_scale);

    RequestFootprint {
        energy: request_energy,
        usage_gwp,
        usage_adpe,
        usage_pe,
        usage_wcf: Some(usage_wcf),
        embodied_gwp,
        embodied_adpe,
        embodied_pe,
    }
}
