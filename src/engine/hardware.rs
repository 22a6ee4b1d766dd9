//! Hardware sizing: how many accelerators a model of a given size needs.
//!
//! Memory demand is `1.2 × total_params × bits / 8` GB — the 1.2 factor
//! covers runtime overhead (KV cache, activations, framework buffers)
//! beyond the raw weights. The accelerator count is the ceiling of that
//! demand over a single accelerator's memory, then rounded per the
//! formula generation's provisioning policy.

/// Accelerator-count rounding policy.
///
/// The two formula generations size hardware differently and the
/// policies are not interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuRounding {
    /// Take the raw ceiling as-is (legacy generation).
    Exact,
    /// Round up to the next power of two (current generation; physical
    /// server builds are provisioned in power-of-two accelerator counts).
    PowerOfTwo,
}

/// Accelerator memory needed to host the model, GB.
pub fn model_memory_gb(total_params: f64, bits_per_param: f64) -> f64 {
    1.2 * total_params * bits_per_param / 8.0
}

/// Number of accelerators required to host `total_params` billions of
/// parameters at the given quantization width.
///
/// A zero-size model needs zero accelerators under both policies
/// (`u32::next_power_of_two` would otherwise turn 0 into 1).
pub fn gpu_count(
    total_params: f64,
    bits_per_param: f64,
    gpu_memory_gb: f64,
    rounding: GpuRounding,
) -> u32 {
    let raw = (model_memory_gb(total_params, bits_per_param) / gpu_memory_gb).ceil() as u32;
    match rounding {
        GpuRounding::Exact => raw,
        GpuRounding::PowerOfTwo => {
            if raw == 0 {
                0
            } else {
                raw.next_power_of_two()
            }
        }
    }
}
