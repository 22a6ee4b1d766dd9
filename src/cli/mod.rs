//! Command-line parsing for the footprint estimator.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the modeling code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::RankStat;
use crate::engine::FormulaVersion;
use crate::math::Range;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "llmfp",
    version,
    about = "LLM inference environmental footprint estimator"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Estimate the footprint of a single inference request.
    Estimate(EstimateArgs),
    /// Project fleet totals and rankings from a usage snapshot.
    Fleet(FleetArgs),
    /// Project a synthetic fleet (no snapshot needed).
    Simulate(SimulateArgs),
    /// List the electricity-mix zones of a formula generation.
    Zones(ZonesArgs),
    /// Refresh the reference data files from upstream.
    UpdateData(UpdateArgs),
}

/// Simulation settings shared by every estimating subcommand.
#[derive(Debug, Parser, Clone)]
pub struct SimArgs {
    /// Formula generation to evaluate.
    #[arg(long, value_enum, default_value_t = FormulaVersion::V2)]
    pub formula: FormulaVersion,

    /// Electricity-mix zone code (e.g. WOR, FRA, USA).
    #[arg(short = 'z', long, default_value = "WOR")]
    pub zone: String,

    /// Datacenter PUE; scalar or range (e.g. `1.2` or `1.1..1.4`).
    #[arg(long, value_parser = parse_bound)]
    pub pue: Option<Range>,

    /// Datacenter WUE in L/kWh; scalar or range. Current generation only.
    #[arg(long, value_parser = parse_bound)]
    pub wue: Option<Range>,
}

/// Options for a single-request estimate.
#[derive(Debug, Parser)]
pub struct EstimateArgs {
    #[command(flatten)]
    pub sim: SimArgs,

    /// Look the model up in the registry (`provider/name`, or a bare
    /// name matched across providers).
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Active parameters in billions; scalar or range (e.g. `12.9` or
    /// `8..20`).
    #[arg(long, value_parser = parse_bound)]
    pub active: Option<Range>,

    /// Total parameters in billions; scalar or range.
    #[arg(long, value_parser = parse_bound)]
    pub total: Option<Range>,

    /// Completion tokens generated by the request.
    #[arg(short = 't', long, default_value_t = 100)]
    pub tokens: u64,

    /// Latency ceiling in seconds (uncapped when omitted).
    #[arg(long)]
    pub latency_ceiling: Option<f64>,

    /// Number of identical requests.
    #[arg(short = 'n', long, default_value_t = 1)]
    pub requests: u64,
}

/// Options for projecting a usage snapshot.
#[derive(Debug, Parser)]
pub struct FleetArgs {
    #[command(flatten)]
    pub sim: SimArgs,

    /// Usage snapshot JSON file.
    #[arg(short = 'u', long, value_name = "JSON")]
    pub usage: PathBuf,

    /// Per-request latency ceiling in seconds, scaled by each row's
    /// request count (uncapped when omitted).
    #[arg(long)]
    pub request_latency: Option<f64>,

    /// Show the top-N models.
    #[arg(long, default_value_t = 20)]
    pub top: usize,

    /// Stat to rank models by.
    #[arg(long, value_enum, default_value_t = RankStat::Energy)]
    pub stat: RankStat,

    /// Export per-model results to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

/// Options for projecting a synthetic fleet.
#[derive(Debug, Parser)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub sim: SimArgs,

    /// Total request count across the synthetic fleet.
    #[arg(short = 'n', long, default_value_t = 1_000_000)]
    pub requests: u64,

    /// How many registry models take part.
    #[arg(long, default_value_t = 20)]
    pub models: usize,

    /// Random seed for workload generation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Median completion length per request, tokens.
    #[arg(long, default_value_t = 300.0)]
    pub median_tokens: f64,

    /// Log-normal sigma of per-model completion length.
    #[arg(long, default_value_t = 0.8)]
    pub token_sigma: f64,

    /// Per-request latency ceiling in seconds (uncapped when omitted).
    #[arg(long)]
    pub request_latency: Option<f64>,

    /// Show the top-N models.
    #[arg(long, default_value_t = 20)]
    pub top: usize,

    /// Stat to rank models by.
    #[arg(long, value_enum, default_value_t = RankStat::Energy)]
    pub stat: RankStat,

    /// Export per-model results to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

/// Options for listing zones.
#[derive(Debug, Parser)]
pub struct ZonesArgs {
    /// Formula generation whose table to list.
    #[arg(long, value_enum, default_value_t = FormulaVersion::V2)]
    pub formula: FormulaVersion,
}

/// Options for refreshing reference data.
#[derive(Debug, Parser)]
pub struct UpdateArgs {
    /// Directory the refreshed data files are written to.
    #[arg(long, default_value = "data")]
    pub out: PathBuf,
}

/// Parse `N` or `MIN..MAX` into a range.
pub fn parse_bound(s: &str) -> Result<Range, String> {
    let parse_one = |part: &str| -> Result<f64, String> {
        part.trim()
            .parse::<f64>()
            .map_err(|_| format!("invalid number `{part}`"))
            .and_then(|v| {
                if v.is_finite() {
                    Ok(v)
                } else {
                    Err(format!("non-finite number `{part}`"))
                }
            })
    };

    match s.split_once("..") {
        Some((lo, hi)) => {
            let min = parse_one(lo)?;
            let max = parse_one(hi)?;
            if min > max {
                return Err(format!("range `{s}` has min > max"));
            }
            Ok(Range::new(min, max))
        }
        None => Ok(Range::scalar(parse_one(s)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_bound_parses() {
        assert_eq!(parse_bound("12.9").unwrap(), Range::scalar(12.9));
    }

    #[test]
    fn range_bound_parses() {
        assert_eq!(parse_bound("8..20").unwrap(), Range::new(8.0, 20.0));
        assert_eq!(parse_bound(" 1.1 .. 1.4 ").unwrap(), Range::new(1.1, 1.4));
    }

    #[test]
    fn inverted_or_garbled_bounds_are_rejected() {
        assert!(parse_bound("20..8").is_err());
        assert!(parse_bound("abc").is_err());
        assert!(parse_bound("1..x").is_err());
        assert!(parse_bound("inf").is_err());
    }

    #[test]
    fn cli_parses_an_estimate_invocation() {
        let cli = Cli::try_parse_from([
            "llmfp", "estimate", "--model", "mistralai/mixtral-8x7b", "--tokens", "400", "--zone",
            "FRA",
        ])
        .unwrap();
        match cli.command {
            Command::Estimate(args) => {
                assert_eq!(args.model.as_deref(), Some("mistralai/mixtral-8x7b"));
                assert_eq!(args.tokens, 400);
                assert_eq!(args.sim.zone, "FRA");
                assert_eq!(args.sim.formula, FormulaVersion::V2);
            }
            _ => panic!("expected estimate"),
        }
    }

    #[test]
    fn cli_parses_fleet_with_ranged_pue() {
        let cli = Cli::try_parse_from([
            "llmfp",
            "fleet",
            "--usage",
            "usage.json",
            "--pue",
            "1.1..1.4",
            "--stat",
            "gwp",
        ])
        .unwrap();
        match cli.command {
            Command::Fleet(args) => {
                assert_eq!(args.sim.pue.unwrap(), Range::new(1.1, 1.4));
                assert_eq!(args.stat, RankStat::Gwp);
            }
            _ => panic!("expected fleet"),
        }
    }
}
