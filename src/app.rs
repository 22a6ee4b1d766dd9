//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main"
//! that:
//! - parses CLI arguments
//! - resolves models and simulation settings
//! - runs the impact engine / fleet pipeline
//! - prints reports
//! - writes optional exports

use clap::Parser;

use crate::cli::{
    Command, EstimateArgs, FleetArgs, SimArgs, SimulateArgs, UpdateArgs, ZonesArgs,
};
use crate::data::{update, workload};
use crate::domain::{RankStat, SimulationConfig};
use crate::engine::{self, FormulaVersion, ModelParameters, RequestContext};
use crate::error::AppError;
use crate::io::usage::UsageSnapshot;
use crate::{io, mix, models, report};

pub mod pipeline;

/// Entry point for the `llmfp` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Estimate(args) => handle_estimate(args),
        Command::Fleet(args) => handle_fleet(args),
        Command::Simulate(args) => handle_simulate(args),
        Command::Zones(args) => handle_zones(args),
        Command::UpdateData(args) => handle_update(args),
    }
}

fn handle_estimate(args: EstimateArgs) -> Result<(), AppError> {
    let config = simulation_config(&args.sim, args.latency_ceiling);
    let (params, model_label) = resolve_estimate_params(&args, &config)?;

    let ctx = RequestContext {
        output_tokens: args.tokens,
        latency_ceiling: config.per_request_latency,
        request_count: args.requests,
        pue: config.pue,
        wue: config.wue,
    };

    let result = engine::compute_impact(config.version, &params, &config.zone, &ctx)?;

    println!(
        "{}",
        report::format::format_estimate(
            &result,
            &params,
            model_label.as_deref(),
            &config,
            args.tokens,
            args.requests,
        )
    );
    Ok(())
}

fn resolve_estimate_params(
    args: &EstimateArgs,
    config: &SimulationConfig,
) -> Result<(ModelParameters, Option<String>), AppError> {
    if let Some(model_ref) = &args.model {
        if args.active.is_some() || args.total.is_some() {
            return Err(AppError::usage(
                "`--model` conflicts with `--active`/`--total`; pick one way to size the model.",
            ));
        }
        let registry = models::registry().map_err(AppError::data)?;
        let entry = match model_ref.split_once('/') {
            Some((provider, name)) => registry.find(provider, name),
            None => registry.find_by_name(model_ref),
        }
        .ok_or_else(|| AppError::usage(format!("Unknown model `{model_ref}` in the registry.")))?;
        return Ok((
            entry.architecture.to_model_parameters(),
            Some(format!("{}/{}", entry.provider, entry.name)),
        ));
    }

    let params = match (args.active, args.total) {
        (Some(active), Some(total)) => ModelParameters::new(active, total),
        // A single bound means a dense model.
        (Some(active), None) => ModelParameters::dense(active),
        (None, Some(total)) => ModelParameters::dense(total),
        (None, None) => config.default_params,
    };
    Ok((params, None))
}

fn handle_fleet(args: FleetArgs) -> Result<(), AppError> {
    let snapshot = io::usage::read_usage_snapshot(&args.usage)?;
    let config = simulation_config(&args.sim, args.request_latency);
    report_fleet(
        &snapshot,
        &config,
        args.stat,
        args.top,
        args.export.as_deref(),
    )
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let spec = workload::WorkloadSpec {
        total_requests: args.requests,
        model_count: args.models,
        seed: args.seed,
        median_completion_tokens: args.median_tokens,
        token_sigma: args.token_sigma,
        asof_date: chrono::Local::now().date_naive(),
    };
    let snapshot = workload::generate_workload(&spec)?;

    println!(
        "Synthetic workload: {} requests across {} models (seed {}).\n",
        args.requests,
        snapshot.rows.len(),
        args.seed
    );

    let config = simulation_config(&args.sim, args.request_latency);
    report_fleet(
        &snapshot,
        &config,
        args.stat,
        args.top,
        args.export.as_deref(),
    )
}

fn report_fleet(
    snapshot: &UsageSnapshot,
    config: &SimulationConfig,
    stat: RankStat,
    top: usize,
    export: Option<&std::path::Path>,
) -> Result<(), AppError> {
    let output = pipeline::run_fleet(snapshot, config, stat, top)?;

    println!(
        "{}",
        report::format::format_fleet_summary(snapshot, &output.totals, config)
    );
    println!("{}", report::format::format_rankings(&output.rankings, stat));

    if let Some(path) = export {
        io::export::write_results_csv(path, &output.rows)?;
        println!("Exported {} rows to {}.", output.rows.len(), path.display());
    }
    Ok(())
}

fn handle_zones(args: ZonesArgs) -> Result<(), AppError> {
    let rows = zone_rows(args.formula)?;
    println!("{}", report::format::format_zone_table(args.formula, &rows));
    Ok(())
}

fn zone_rows(version: FormulaVersion) -> Result<Vec<report::format::ZoneRow>, AppError> {
    let mut rows = match version {
        FormulaVersion::V1 => mix::legacy_table()?
            .iter()
            .map(|mix| report::format::ZoneRow {
                code: mix.name.clone(),
                name: mix.name.clone(),
                gwp: mix.gwp,
                adpe: mix.adpe,
                pe: mix.pe,
                wue: None,
            })
            .collect::<Vec<_>>(),
        FormulaVersion::V2 => mix::current_table()?
            .iter()
            .map(|(code, mix)| report::format::ZoneRow {
                code: code.clone(),
                name: mix.name.clone(),
                gwp: mix.gwp,
                adpe: mix.adpe,
                pe: mix.pe,
                wue: Some(mix.wue),
            })
            .collect::<Vec<_>>(),
    };

    // World and Europe lead; everything else alphabetically.
    rows.sort_by(|a, b| {
        let rank = |code: &str| match code {
            "WOR" => 0,
            "EEE" => 1,
            _ => 2,
        };
        rank(&a.code)
            .cmp(&rank(&b.code))
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(rows)
}

fn handle_update(args: UpdateArgs) -> Result<(), AppError> {
    let summary = update::run_update(&args.out)?;
    println!(
        "Refreshed {} zones and {} models under {}.",
        summary.zones,
        summary.models,
        summary.out_dir.display()
    );
    println!("Rebuild to compile the new snapshots in.");
    Ok(())
}

/// Resolve CLI flags into a full simulation configuration.
fn simulation_config(sim: &SimArgs, per_request_latency: Option<f64>) -> SimulationConfig {
    let mut config = SimulationConfig::for_version(sim.formula);
    config.zone = sim.zone.clone();
    if let Some(pue) = sim.pue {
        config.pue = pue;
    }
    if let Some(wue) = sim.wue {
        config.wue = wue;
    }
    if let Some(latency) = per_request_latency {
        config.per_request_latency = latency;
    }
    config
}
