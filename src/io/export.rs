//! Export per-model fleet results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or
//! downstream scripts; ranges are written as explicit min/mid/max
//! columns rather than a formatted string.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::AppError;
use crate::math::Range;
use crate::report::ModelFootprint;

/// Write per-model results to a CSV file.
pub fn write_results_csv(path: &Path, rows: &[ModelFootprint]) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::usage(format!(
            "Failed to create export CSV '{}': {e}",
            path.display()
        ))
    })?;

    writeln!(
        file,
        "model,provider,requests,prompt_tokens,completion_tokens,param_source,\
         energy_kwh_min,energy_kwh_mid,energy_kwh_max,\
         gwp_kgco2eq_min,gwp_kgco2eq_mid,gwp_kgco2eq_max,\
         adpe_kgsbeq_mid,pe_mj_mid,wcf_l_mid"
    )
    .map_err(|e| AppError::usage(format!("Failed to write export CSV header: {e}")))?;

    for row in rows {
        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            csv_field(&row.model),
            csv_field(row.provider.as_deref().unwrap_or("")),
            row.requests,
            row.prompt_tokens,
            row.completion_tokens,
            row.param_source.label(),
            fmt(row.impact.energy.min),
            fmt(row.impact.energy.midpoint()),
            fmt(row.impact.energy.max),
            fmt(row.impact.gwp.min),
            fmt(row.impact.gwp.midpoint()),
            fmt(row.impact.gwp.max),
            fmt(row.impact.adpe.midpoint()),
            fmt(row.impact.pe.midpoint()),
            row.impact
                .wcf
                .map(|r: Range| fmt(r.midpoint()))
                .unwrap_or_default(),
        )
        .map_err(|e| AppError::usage(format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

fn fmt(v: f64) -> String {
    format!("{v:.10e}")
}

/// Quote a field when it contains CSV-significant characters.
fn csv_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
