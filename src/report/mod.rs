//! Reporting: per-model footprints, rankings, totals, and equivalences.

pub mod format;

use serde::Serialize;

use crate::domain::{ParamSource, RankStat};
use crate::engine::ImpactResult;

/// One usage row with its computed footprint.
///
/// `energy_wh` and `gwp_g` are display/ranking midpoints (Wh and gCO2eq);
/// the full range tree stays available in `impact`.
#[derive(Debug, Clone, Serialize)]
pub struct ModelFootprint {
    pub model: String,
    pub provider: Option<String>,
    pub requests: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub param_source: ParamSource,
    pub impact: ImpactResult,
    pub energy_wh: f64,
    pub gwp_g: f64,
}

impl ModelFootprint {
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }

    fn stat(&self, stat: RankStat) -> f64 {
        match stat {
            RankStat::Energy => self.energy_wh,
            RankStat::Gwp => self.gwp_g,
        }
    }
}

/// Fleet-wide sums over every computed row (midpoints).
#[derive(Debug, Clone, Serialize)]
pub struct FleetTotals {
    pub requests: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub energy_wh: f64,
    pub gwp_g: f64,
    pub adpe_kgsbeq: f64,
    pub pe_mj: f64,
    /// Present when every row carries a water footprint (current
    /// formula generation).
    pub wcf_l: Option<f64>,
}

/// Sum the computed rows into fleet totals.
pub fn compute_totals(rows: &[ModelFootprint]) -> FleetTotals {
    let mut totals = FleetTotals {
        requests: 0,
        prompt_tokens: 0,
        completion_tokens: 0,
        total_tokens: 0,
        energy_wh: 0.0,
        gwp_g: 0.0,
        adpe_kgsbeq: 0.0,
        pe_mj: 0.0,
        wcf_l: None,
    };

    let mut wcf_sum = 0.0;
    let mut wcf_rows = 0usize;

    for row in rows {
        totals.requests += row.requests;
        totals.prompt_tokens += row.prompt_tokens;
        totals.completion_tokens += row.completion_tokens;
        totals.total_tokens += row.total_tokens();
        totals.energy_wh += row.energy_wh;
        totals.gwp_g += row.gwp_g;
        totals.adpe_kgsbeq += row.impact.adpe.midpoint();
        totals.pe_mj += row.impact.pe.midpoint();
        if let Some(wcf) = row.impact.wcf {
            wcf_sum += wcf.midpoint();
            wcf_rows += 1;
        }
    }

    if wcf_rows == rows.len() && wcf_rows > 0 {
        totals.wcf_l = Some(wcf_sum);
    }
    totals
}

/// Rank the top-N rows by the chosen stat, highest first.
pub fn rank_models(rows: &[ModelFootprint], stat: RankStat, top_n: usize) -> Vec<ModelFootprint> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| {
        b.stat(stat)
            .partial_cmp(&a.stat(stat))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted.truncate(top_n);
    sorted
}

/// Everyday equivalences for fleet totals.
///
/// Conversion anchors: a smartphone charge is ~12.3 Wh, boiling a kettle
/// ~113 Wh, an hour of LED lighting ~10 Wh, a km in a petrol car
/// ~170 gCO2eq, a shower ~65 L.
pub fn equivalences(totals: &FleetTotals) -> Vec<(&'static str, f64)> {
    let mut out = vec![
        ("smartphone charges", totals.energy_wh / 12.3),
        ("kettles boiled", totals.energy_wh / 113.0),
        ("hours of LED lighting", totals.energy_wh / 10.0),
        ("km driven in a petrol car", totals.gwp_g / 170.0),
    ];
    if let Some(wcf_l) = totals.wcf_l {
        out.push(("showers taken", wcf_l / 65.0));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EmbodiedImpacts, UsageImpacts};
    use crate::math::Range;

    fn footprint(model: &str, energy_wh: f64, gwp_g: f64, wcf: Option<f64>) -> ModelFootprint {
        let impact = ImpactResult {
            energy: Range::scalar(energy_wh / 1000.0),
            gwp: Range::scalar(gwp_g / 1000.0),
            adpe: Range::scalar(1.0e-7),
            pe: Range::scalar(0.01),
            wcf: wcf.map(Range::scalar),
            usage: UsageImpacts {
                energy: Range::scalar(energy_wh / 1000.0),
                gwp: Range::scalar(gwp_g / 1000.0),
                adpe: Range::scalar(1.0e-7),
                pe: Range::scalar(0.01),
                wcf: wcf.map(Range::scalar),
            },
            embodied: EmbodiedImpacts {
                gwp: Range::scalar(0.0),
                adpe: Range::scalar(0.0),
                pe: Range::scalar(0.0),
            },
        };
        ModelFootprint {
            model: model.to_string(),
            provider: None,
            requests: 10,
            prompt_tokens: 2000,
            completion_tokens: 500,
            param_source: ParamSource::Registry,
            impact,
            energy_wh,
            gwp_g,
        }
    }

    #[test]
    fn totals_sum_rows() {
        let rows = vec![
            footprint("a", 100.0, 40.0, Some(1.0)),
            footprint("b", 50.0, 90.0, Some(2.0)),
        ];
        let totals = compute_totals(&rows);
        assert_eq!(totals.requests, 20);
        assert_eq!(totals.total_tokens, 5000);
        assert!((totals.energy_wh - 150.0).abs() < 1e-9);
        assert!((totals.gwp_g - 130.0).abs() < 1e-9);
        assert_eq!(totals.wcf_l, Some(3.0));
    }

    #[test]
    fn water_total_absent_when_any_row_lacks_it() {
        let rows = vec![
            footprint("a", 100.0, 40.0, Some(1.0)),
            footprint("b", 50.0, 90.0, None),
        ];
        assert_eq!(compute_totals(&rows).wcf_l, None);
    }

    #[test]
    fn ranking_orders_by_selected_stat() {
        let rows = vec![
            footprint("low-energy", 10.0, 99.0, None),
            footprint("high-energy", 500.0, 1.0, None),
        ];

        let by_energy = rank_models(&rows, RankStat::Energy, 10);
        assert_eq!(by_energy[0].model, "high-energy");

        let by_gwp = rank_models(&rows, RankStat::Gwp, 10);
        assert_eq!(by_gwp[0].model, "low-energy");

        let top1 = rank_models(&rows, RankStat::Energy, 1);
        assert_eq!(top1.len(), 1);
    }

    #[test]
    fn equivalences_include_water_only_with_wcf() {
        let with = compute_totals(&[footprint("a", 123.0, 340.0, Some(130.0))]);
        let eq = equivalences(&with);
        assert!(eq.iter().any(|(label, _)| *label == "showers taken"));
        let charges = eq
            .iter()
            .find(|(label, _)| *label == "smartphone charges")
            .unwrap()
            .1;
        assert!((charges - 10.0).abs() < 1e-9);

        let without = compute_totals(&[footprint("a", 123.0, 340.0, None)]);
        assert!(
            !equivalences(&without)
                .iter()
                .any(|(label, _)| *label == "showers taken")
        );
    }
}
