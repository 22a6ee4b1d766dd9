//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the engine and pipeline stay clean and testable
//! - output changes are localized

use crate::domain::{RankStat, SimulationConfig};
use crate::engine::{FormulaVersion, ImpactResult, ModelParameters};
use crate::io::usage::UsageSnapshot;
use crate::math::Range;
use crate::report::{FleetTotals, ModelFootprint, equivalences};

/// Energy with an SI-scaled unit, from a Wh value.
pub fn fmt_energy_wh(wh: f64) -> String {
    if wh >= 1e12 {
        format!("{:.2} TWh", wh / 1e12)
    } else if wh >= 1e9 {
        format!("{:.2} GWh", wh / 1e9)
    } else if wh >= 1e6 {
        format!("{:.2} MWh", wh / 1e6)
    } else if wh >= 1e3 {
        format!("{:.2} kWh", wh / 1e3)
    } else {
        format!("{wh:.2} Wh")
    }
}

/// CO2-equivalent mass with an SI-scaled unit, from a gram value.
pub fn fmt_mass_g(g: f64) -> String {
    if g >= 1e6 {
        format!("{:.2} tCO2eq", g / 1e6)
    } else if g >= 1e3 {
        format!("{:.2} kgCO2eq", g / 1e3)
    } else {
        format!("{g:.2} gCO2eq")
    }
}

/// Antimony-equivalent mass, from a kg value (typically tiny).
pub fn fmt_adpe_kg(kg: f64) -> String {
    if kg >= 1.0 {
        format!("{kg:.3} kgSbeq")
    } else if kg >= 1e-3 {
        format!("{:.3} gSbeq", kg * 1e3)
    } else {
        format!("{:.3} mgSbeq", kg * 1e6)
    }
}

/// Primary energy, from an MJ value.
pub fn fmt_pe_mj(mj: f64) -> String {
    if mj >= 1e6 {
        format!("{:.2} TJ", mj / 1e6)
    } else if mj >= 1e3 {
        format!("{:.2} GJ", mj / 1e3)
    } else if mj >= 1.0 {
        format!("{mj:.2} MJ")
    } else {
        format!("{:.2} kJ", mj * 1e3)
    }
}

/// Water volume, from a litre value.
pub fn fmt_water_l(l: f64) -> String {
    if l >= 1e3 {
        format!("{:.2} m3", l / 1e3)
    } else if l >= 1.0 {
        format!("{l:.2} L")
    } else {
        format!("{:.1} mL", l * 1e3)
    }
}

/// Plain count with K/M/B/T suffixes.
pub fn fmt_count(n: f64) -> String {
    if n >= 1e12 {
        format!("{:.2}T", n / 1e12)
    } else if n >= 1e9 {
        format!("{:.2}B", n / 1e9)
    } else if n >= 1e6 {
        format!("{:.2}M", n / 1e6)
    } else if n >= 1e3 {
        format!("{:.2}K", n / 1e3)
    } else {
        format!("{n:.0}")
    }
}

/// A range rendered through a unit formatter; degenerate ranges render
/// as a single value.
pub fn fmt_range(r: Range, unit: impl Fn(f64) -> String) -> String {
    if r.is_scalar() {
        unit(r.min)
    } else {
        format!("{} .. {}", unit(r.min), unit(r.max))
    }
}

fn fmt_params(r: Range) -> String {
    if r.is_scalar() {
        format!("{}B", r.min)
    } else {
        format!("{}B .. {}B", r.min, r.max)
    }
}

/// Format the single-request estimate report.
pub fn format_estimate(
    result: &ImpactResult,
    params: &ModelParameters,
    model_label: Option<&str>,
    config: &SimulationConfig,
    output_tokens: u64,
    request_count: u64,
) -> String {
    let mut out = String::new();

    out.push_str("=== llmfp - LLM Inference Footprint ===\n");
    out.push_str(&format!("Formula: {}\n", config.version.display_name()));
    out.push_str(&format!("Zone: {}\n", config.zone));
    if let Some(label) = model_label {
        out.push_str(&format!("Model: {label}\n"));
    }
    out.push_str(&format!(
        "Params: active={} total={}\n",
        fmt_params(params.active),
        fmt_params(params.total)
    ));
    out.push_str(&format!(
        "Tokens: {output_tokens} | Requests: {request_count} | PUE: {}\n",
        fmt_range(config.pue, |v| v.to_string())
    ));

    out.push_str("\nFootprint:\n");
    out.push_str(&format!(
        "- energy   : {}\n",
        fmt_range(result.energy, |v| fmt_energy_wh(v * 1e3))
    ));
    out.push_str(&format!(
        "- gwp      : {}  (usage {}, embodied {})\n",
        fmt_range(result.gwp, |v| fmt_mass_g(v * 1e3)),
        fmt_range(result.usage.gwp, |v| fmt_mass_g(v * 1e3)),
        fmt_range(result.embodied.gwp, |v| fmt_mass_g(v * 1e3)),
    ));
    out.push_str(&format!(
        "- adpe     : {}  (usage {}, embodied {})\n",
        fmt_range(result.adpe, fmt_adpe_kg),
        fmt_range(result.usage.adpe, fmt_adpe_kg),
        fmt_range(result.embodied.adpe, fmt_adpe_kg),
    ));
    out.push_str(&format!(
        "- pe       : {}  (usage {}, embodied {})\n",
        fmt_range(result.pe, fmt_pe_mj),
        fmt_range(result.usage.pe, fmt_pe_mj),
        fmt_range(result.embodied.pe, fmt_pe_mj),
    ));
    if let Some(wcf) = result.wcf {
        out.push_str(&format!("- water    : {}\n", fmt_range(wcf, fmt_water_l)));
    }

    out
}

/// Format the fleet run summary (snapshot stats + totals + equivalences).
pub fn format_fleet_summary(
    snapshot: &UsageSnapshot,
    totals: &FleetTotals,
    config: &SimulationConfig,
) -> String {
    let mut out = String::new();

    out.push_str("=== llmfp - Fleet Footprint Projection ===\n");
    out.push_str(&format!("Formula: {}\n", config.version.display_name()));
    out.push_str(&format!("Zone: {}\n", config.zone));
    out.push_str(&format!("As-of: {}", snapshot.asof_date));
    if let Some(period) = &snapshot.period {
        out.push_str(&format!(" ({period})"));
    }
    out.push('\n');
    out.push_str(&format!("Models: {}\n", snapshot.rows.len()));

    out.push_str("\nTotals (range midpoints):\n");
    out.push_str(&format!(
        "- requests          : {}\n",
        fmt_count(totals.requests as f64)
    ));
    out.push_str(&format!(
        "- prompt tokens     : {}\n",
        fmt_count(totals.prompt_tokens as f64)
    ));
    out.push_str(&format!(
        "- completion tokens : {}\n",
        fmt_count(totals.completion_tokens as f64)
    ));
    out.push_str(&format!(
        "- energy            : {}\n",
        fmt_energy_wh(totals.energy_wh)
    ));
    out.push_str(&format!(
        "- emissions         : {}\n",
        fmt_mass_g(totals.gwp_g)
    ));
    out.push_str(&format!(
        "- abiotic depletion : {}\n",
        fmt_adpe_kg(totals.adpe_kgsbeq)
    ));
    out.push_str(&format!(
        "- primary energy    : {}\n",
        fmt_pe_mj(totals.pe_mj)
    ));
    if let Some(wcf_l) = totals.wcf_l {
        out.push_str(&format!("- water             : {}\n", fmt_water_l(wcf_l)));
    }

    out.push_str("\nThat is roughly:\n");
    for (label, value) in equivalences(totals) {
        out.push_str(&format!("- {} {label}\n", fmt_count(value)));
    }

    out
}

/// Format the top-N ranking table.
pub fn format_rankings(ranked: &[ModelFootprint], stat: RankStat) -> String {
    let mut out = String::new();

    out.push_str(&format!("Top models by {}:\n", stat.display_name()));
    out.push_str(&format!(
        "{:<4} {:<36} {:>10} {:>12} {:>12} {:>14} {:<9}\n",
        "#", "model", "requests", "tokens", "energy", "emissions", "params"
    ));
    out.push_str(&format!(
        "{:-<4} {:-<36} {:-<10} {:-<12} {:-<12} {:-<14} {:-<9}\n",
        "", "", "", "", "", "", ""
    ));

    for (idx, row) in ranked.iter().enumerate() {
        let label = match &row.provider {
            Some(provider) => format!("{provider}/{}", row.model),
            None => row.model.clone(),
        };
        out.push_str(&format!(
            "{:<4} {:<36} {:>10} {:>12} {:>12} {:>14} {:<9}\n",
            idx + 1,
            truncate(&label, 36),
            fmt_count(row.requests as f64),
            fmt_count(row.total_tokens() as f64),
            fmt_energy_wh(row.energy_wh),
            fmt_mass_g(row.gwp_g),
            row.param_source.label(),
        ));
    }

    out
}

/// Format a formula generation's zone table.
pub fn format_zone_table(version: FormulaVersion, rows: &[ZoneRow]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Electricity mixes ({}):\n",
        version.display_name()
    ));
    let has_wue = rows.iter().any(|r| r.wue.is_some());
    if has_wue {
        out.push_str(&format!(
            "{:<6} {:<24} {:>12} {:>12} {:>10} {:>10}\n",
            "zone", "name", "kgCO2eq/kWh", "kgSbeq/kWh", "MJ/kWh", "L/kWh"
        ));
    } else {
        out.push_str(&format!(
            "{:<6} {:>12} {:>12} {:>10}\n",
            "zone", "kgCO2eq/kWh", "kgSbeq/kWh", "MJ/kWh"
        ));
    }
    for row in rows {
        if has_wue {
            out.push_str(&format!(
                "{:<6} {:<24} {:>12.6} {:>12.3e} {:>10.3} {:>10.2}\n",
                row.code,
                truncate(&row.name, 24),
                row.gwp,
                row.adpe,
                row.pe,
                row.wue.unwrap_or(0.0),
            ));
        } else {
            out.push_str(&format!(
                "{:<6} {:>12.6} {:>12.3e} {:>10.3}\n",
                row.code, row.gwp, row.adpe, row.pe
            ));
        }
    }
    out
}

/// One row of the `zones` listing, shape-agnostic across the two tables.
#[derive(Debug, Clone)]
pub struct ZoneRow {
    pub code: String,
    pub name: String,
    pub gwp: f64,
    pub adpe: f64,
    pub pe: f64,
    pub wue: Option<f64>,
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
