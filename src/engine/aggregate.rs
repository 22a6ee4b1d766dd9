//! Range aggregation over the per-request calculators, plus linear
//! request-count scaling.
//!
//! When parameter counts are supplied as ranges (mixture-of-experts
//! uncertainty bounds), the calculator is evaluated at the two endpoints
//! `(active.min, total.min)` and `(active.max, total.max)` and each
//! output field is merged independently. This relies on the formulas
//! being monotonic in both parameter counts over the valid domain —
//! every regression here is affine with non-negative slope and the
//! sizing step is a monotone step function — so interior extrema cannot
//! escape the endpoint envelope. Only the endpoints are sampled.

use crate::engine::{EmbodiedImpacts, ImpactResult, ModelParameters, UsageImpacts};
use crate::math::Range;

/// Raw per-phase output of one calculator evaluation, before totals are
/// derived.
#[derive(Debug, Clone, Copy)]
pub struct RequestFootprint {
    pub energy: Range,
    pub usage_gwp: Range,
    pub usage_adpe: Range,
    pub usage_pe: Range,
    /// Water usage, current generation only.
    pub usage_wcf: Option<Range>,
    pub embodied_gwp: Range,
    pub embodied_adpe: Range,
    pub embodied_pe: Range,
}

impl RequestFootprint {
    fn merge(self, other: Self) -> Self {
        Self {
            energy: self.energy.merge(other.energy),
            usage_gwp: self.usage_gwp.merge(other.usage_gwp),
            usage_adpe: self.usage_adpe.merge(other.usage_adpe),
            usage_pe: self.usage_pe.merge(other.usage_pe),
            usage_wcf: merge_opt(self.usage_wcf, other.usage_wcf),
            embodied_gwp: self.embodied_gwp.merge(other.embodied_gwp),
            embodied_adpe: self.embodied_adpe.merge(other.embodied_adpe),
            embodied_pe: self.embodied_pe.merge(other.embodied_pe),
        }
    }
}

fn merge_opt(a: Option<Range>, b: Option<Range>) -> Option<Range> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.merge(b)),
        (a, b) => a.or(b),
    }
}

/// Evaluate a per-request calculator at both parameter endpoints and
/// merge the results fieldwise.
///
/// Scalar parameters make the two evaluations identical, so the merged
/// result is exact with no synthetic widening.
pub fn evaluate_endpoints<F>(params: &ModelParameters, eval: F) -> RequestFootprint
where
    F: Fn(f64, f64) -> RequestFootprint,
{
    let lo = eval(params.active.min, params.total.min);
    let hi = eval(params.active.max, params.total.max);
    lo.merge(hi)
}

/// Derive the result tree from merged per-phase footprints.
///
/// Totals are computed from the already-merged phases, so
/// `gwp == usage.gwp + embodied.gwp` (and likewise for adpe/pe) holds by
/// construction.
pub fn assemble(fp: RequestFootprint) -> ImpactResult {
    ImpactResult {
        energy: fp.energy,
        gwp: fp.usage_gwp.add(fp.embodied_gwp),
        adpe: fp.usage_adpe.add(fp.embodied_adpe),
        pe: fp.usage_pe.add(fp.embodied_pe),
        wcf: fp.usage_wcf,
        usage: UsageImpacts {
            energy: fp.energy,
            gwp: fp.usage_gwp,
            adpe: fp.usage_adpe,
            pe: fp.usage_pe,
            wcf: fp.usage_wcf,
        },
        embodied: EmbodiedImpacts {
            gwp: fp.embodied_gwp,
            adpe: fp.embodied_adpe,
            pe: fp.embodied_pe,
        },
    }
}

/// Scale a single-request result to `request_count` identical requests.
///
/// `request_count == 1` is a strict identity: the input is returned
/// untouched, with no rounding drift.
pub fn scale_requests(result: ImpactResult, request_count: u64) -> ImpactResult {
    if request_count == 1 {
        return result;
    }
    let n = request_count as f64;
    ImpactResult {
        energy: result.energy.scale(n),
        gwp: result.gwp.scale(n),
        adpe: result.adpe.scale(n),
        pe: result.pe.scale(n),
        wcf: result.wcf.map(|r| r.scale(n)),
        usage: UsageImpacts {
            energy: result.usage.energy.scale(n),
            gwp: result.usage.gwp.scale(n),
            adpe: result.usage.adpe.scale(n),
            pe: result.usage.pe.scale(n),
            wcf: result.usage.wcf.map(|r| r.scale(n)),
        },
        embodied: EmbodiedImpacts {
            gwp: result.embodied.gwp.scale(n),
            adpe: result.embodied.adpe.scale(n),
            pe: result.embodied.pe.scale(n),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn footprint(scale: f64) -> RequestFootprint {
        RequestFootprint {
            energy: Range::scalar(1.0 * scale),
            usage_gwp: Range::scalar(2.0 * scale),
            usage_adpe: Range::scalar(3.0 * scale),
            usage_pe: Range::scalar(4.0 * scale),
            usage_wcf: Some(Range::scalar(5.0 * scale)),
            embodied_gwp: Range::scalar(6.0 * scale),
            embodied_adpe: Range::scalar(7.0 * scale),
            embodied_pe: Range::scalar(8.0 * scale),
        }
    }

    #[test]
    fn endpoint_evaluation_widens_each_field() {
        let params = ModelParameters {
            active: Range::new(10.0, 20.0),
            total: Range::new(100.0, 200.0),
        };
        let merged = evaluate_endpoints(&params, |active, _total| footprint(active / 10.0));

        assert_eq!(merged.energy, Range::new(1.0, 2.0));
        assert_eq!(merged.embodied_pe, Range::new(8.0, 16.0));
        assert_eq!(merged.usage_wcf, Some(Range::new(5.0, 10.0)));
    }

    #[test]
    fn scalar_parameters_stay_exact() {
        let params = ModelParameters::dense(Range::scalar(70.0));
        let merged = evaluate_endpoints(&params, |active, total| {
            assert_eq!(active, 70.0);
            assert_eq!(total, 70.0);
            footprint(1.0)
        });
        assert!(merged.energy.is_scalar());
        assert_eq!(merged.energy, Range::scalar(1.0));
    }

    #[test]
    fn assemble_sums_usage_and_embodied() {
        let result = assemble(footprint(1.0));
        assert_eq!(result.gwp, Range::scalar(8.0));
        assert_eq!(result.adpe, Range::scalar(10.0));
        assert_eq!(result.pe, Range::scalar(12.0));
        assert_eq!(result.wcf, Some(Range::scalar(5.0)));
        assert_eq!(result.usage.energy, result.energy);
    }

    #[test]
    fn scaling_by_one_is_identity() {
        let result = assemble(footprint(1.0));
        let scaled = scale_requests(result, 1);
        assert_eq!(scaled, result);
    }

    #[test]
    fn scaling_multiplies_every_field() {
        let result = assemble(footprint(1.0));
        let scaled = scale_requests(result, 10);
        assert_eq!(scaled.energy, Range::scalar(10.0));
        assert_eq!(scaled.gwp, Range::scalar(80.0));
        assert_eq!(scaled.usage.pe, Range::scalar(40.0));
        assert_eq!(scaled.embodied.adpe, Range::scalar(70.0));
        assert_eq!(scaled.wcf, Some(Range::scalar(50.0)));
    }
}
