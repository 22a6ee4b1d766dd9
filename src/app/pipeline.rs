//! Shared fleet-projection pipeline used by the `fleet` and `simulate`
//! subcommands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! usage rows -> parameter resolution -> per-row engine calls ->
//! rankings -> totals
//!
//! Each usage row is projected as one aggregated call: its completion
//! tokens are the output tokens, and the per-request latency ceiling is
//! scaled by the row's request count. The engine is pure and the
//! registries are frozen before the first call, so rows are evaluated in
//! parallel.

use rayon::prelude::*;

use crate::domain::{ParamSource, RankStat, SimulationConfig};
use crate::engine::{self, ModelParameters, RequestContext};
use crate::error::AppError;
use crate::io::usage::{UsageRow, UsageSnapshot};
use crate::models;
use crate::report::{self, FleetTotals, ModelFootprint};

/// All computed outputs of a fleet run.
#[derive(Debug, Clone)]
pub struct FleetOutput {
    pub rows: Vec<ModelFootprint>,
    pub totals: FleetTotals,
    pub rankings: Vec<ModelFootprint>,
}

/// Project a usage snapshot under the given simulation settings.
pub fn run_fleet(
    snapshot: &UsageSnapshot,
    config: &SimulationConfig,
    stat: RankStat,
    top_n: usize,
) -> Result<FleetOutput, AppError> {
    // Resolve the registry up front so a broken snapshot fails once,
    // not per row, and so every parallel reader sees the frozen table.
    let registry = models::registry().map_err(AppError::data)?;

    let rows: Result<Vec<ModelFootprint>, AppError> = snapshot
        .rows
        .par_iter()
        .map(|row| project_row(row, registry, config))
        .collect();
    let rows = rows?;

    let totals = report::compute_totals(&rows);
    let rankings = report::rank_models(&rows, stat, top_n);

    Ok(FleetOutput {
        rows,
        totals,
        rankings,
    })
}

fn project_row(
    row: &UsageRow,
    registry: &models::ModelRegistry,
    config: &SimulationConfig,
) -> Result<ModelFootprint, AppError> {
    let (params, param_source) = resolve_params(row, registry, config);

    let ctx = RequestContext {
        output_tokens: row.completion_tokens,
        latency_ceiling: config.per_request_latency * row.requests as f64,
        request_count: 1,
        pue: config.pue,
        wue: config.wue,
    };

    let impact = engine::compute_impact(config.version, &params, &config.zone, &ctx)
        .map_err(AppError::from)?;

    Ok(ModelFootprint {
        model: row.model.clone(),
        provider: row.provider.clone(),
        requests: row.requests,
        prompt_tokens: row.prompt_tokens,
        completion_tokens: row.completion_tokens,
        param_source,
        // kWh -> Wh and kgCO2eq -> gCO2eq for display/ranking.
        energy_wh: impact.energy.midpoint() * 1e3,
        gwp_g: impact.gwp.midpoint() * 1e3,
        impact,
    })
}

/// Registry hit wins; otherwise fall back to the simulation defaults.
fn resolve_params(
    row: &UsageRow,
    registry: &models::ModelRegistry,
    config: &SimulationConfig,
) -> (ModelParameters, ParamSource) {
    let entry = match &row.provider {
        Some(provider) => registry.find(provider, &row.model),
        None => registry.find_by_name(&row.model),
    };
    match entry {
        Some(entry) => (
            entry.architecture.to_model_parameters(),
            ParamSource::Registry,
        ),
        None => (config.default_params, ParamSource::Defaults),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FormulaVersion;
    use chrono::NaiveDate;

    fn snapshot() -> UsageSnapshot {
        UsageSnapshot {
            asof_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            period: Some("month".to_string()),
            rows: vec![
                UsageRow {
                    model: "mixtral-8x7b".to_string(),
                    provider: Some("mistralai".to_string()),
                    requests: 1200,
                    prompt_tokens: 4_800_000,
                    completion_tokens: 960_000,
                },
                UsageRow {
                    model: "some-unlisted-model".to_string(),
                    provider: None,
                    requests: 300,
                    prompt_tokens: 900_000,
                    completion_tokens: 150_000,
                },
            ],
        }
    }

    #[test]
    fn fleet_projects_every_row() {
        let config = SimulationConfig::for_version(FormulaVersion::V2);
        let out = run_fleet(&snapshot(), &config, RankStat::Energy, 10).unwrap();

        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.totals.requests, 1500);
        assert!(out.totals.energy_wh > 0.0);
        assert!(out.totals.wcf_l.is_some());

        // Registry hit for the MoE model, defaults for the unlisted one.
        let mixtral = out
            .rows
            .iter()
            .find(|r| r.model == "mixtral-8x7b")
            .unwrap();
        assert_eq!(mixtral.param_source, ParamSource::Registry);
        let unlisted = out
            .rows
            .iter()
            .find(|r| r.model == "some-unlisted-model")
            .unwrap();
        assert_eq!(unlisted.param_source, ParamSource::Defaults);
    }

    #[test]
    fn legacy_generation_produces_no_water_total() {
        let config = SimulationConfig::for_version(FormulaVersion::V1);
        let out = run_fleet(&snapshot(), &config, RankStat::Gwp, 10).unwrap();
        assert_eq!(out.totals.wcf_l, None);
    }

    #[test]
    fn unknown_zone_fails_the_whole_run() {
        let mut config = SimulationConfig::for_version(FormulaVersion::V2);
        config.zone = "ZZZ".to_string();
        let err = run_fleet(&snapshot(), &config, RankStat::Energy, 10).unwrap_err();
        assert!(err.to_string().contains("ZZZ"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn rankings_respect_top_n() {
        let config = SimulationConfig::for_version(FormulaVersion::V2);
        let out = run_fleet(&snapshot(), &config, RankStat::Energy, 1).unwrap();
        assert_eq!(out.rankings.len(), 1);
        // The big mixtral row dominates either stat.
        assert_eq!(out.rankings[0].model, "mixtral-8x7b");
    }
}
