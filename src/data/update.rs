//! Upstream refresh of the reference data files.
//!
//! Pulls the published model registry and electricity-mix table and
//! rewrites the local `data/` snapshots in both registry shapes. The
//! binary keeps using its compiled-in snapshots until rebuilt; this
//! command exists so a refresh is a reviewable data-file diff rather
//! than a hand edit.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;

use crate::error::AppError;
use crate::mix::{LegacyMix, Mix};
use crate::models::ModelRegistry;

const UPSTREAM_BASE_URL: &str =
    "https://raw.githubusercontent.com/genai-impact/ecologits/refs/heads/main/ecologits/data";

/// What a refresh wrote, for the terminal summary.
#[derive(Debug, Clone)]
pub struct UpdateSummary {
    pub zones: usize,
    pub models: usize,
    pub out_dir: PathBuf,
}

/// Fetch upstream data and rewrite the snapshots under `out_dir`.
pub fn run_update(out_dir: &Path) -> Result<UpdateSummary, AppError> {
    let client = Client::new();

    let models_json = fetch_text(&client, &format!("{UPSTREAM_BASE_URL}/models.json"))?;
    let mixes_csv = fetch_text(&client, &format!("{UPSTREAM_BASE_URL}/electricity_mixes.csv"))?;

    // Validate the registry before writing anything.
    let registry: ModelRegistry = serde_json::from_str(&models_json)
        .map_err(|e| AppError::data(format!("Upstream models.json failed to parse: {e}")))?;

    let (legacy, current) = parse_mixes_csv(&mixes_csv)?;
    if legacy.is_empty() {
        return Err(AppError::data("Upstream mix table contains no zones."));
    }

    fs::create_dir_all(out_dir)
        .map_err(|e| AppError::usage(format!("Failed to create '{}': {e}", out_dir.display())))?;

    write_file(&out_dir.join("models.json"), &models_json)?;
    write_file(
        &out_dir.join("electricity_mixes_legacy.json"),
        &to_pretty_json(&legacy)?,
    )?;
    write_file(
        &out_dir.join("electricity_mixes.json"),
        &to_pretty_json(&current)?,
    )?;

    Ok(UpdateSummary {
        zones: legacy.len(),
        models: registry.models.len(),
        out_dir: out_dir.to_path_buf(),
    })
}

fn fetch_text(client: &Client, url: &str) -> Result<String, AppError> {
    let resp = client
        .get(url)
        .send()
        .map_err(|e| AppError::internal(format!("Request to {url} failed: {e}")))?;

    if !resp.status().is_success() {
        return Err(AppError::internal(format!(
            "Request to {url} failed with status {}.",
            resp.status()
        )));
    }

    resp.text()
        .map_err(|e| AppError::internal(format!("Failed to read response from {url}: {e}")))
}

/// Parse the upstream CSV (`name,gwp,adpe,pe[,wue]`) into both registry
/// shapes. Display names for the keyed table are carried over from the
/// compiled-in snapshot where the zone is already known.
fn parse_mixes_csv(csv: &str) -> Result<(Vec<LegacyMix>, BTreeMap<String, Mix>), AppError> {
    let mut lines = csv.trim().lines();
    let header = lines
        .next()
        .ok_or_else(|| AppError::data("Upstream mix CSV is empty."))?;
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();

    let col = |name: &str| columns.iter().position(|c| *c == name);
    let name_idx =
        col("name").ok_or_else(|| AppError::data("Upstream mix CSV misses `name` column."))?;
    let gwp_idx =
        col("gwp").ok_or_else(|| AppError::data("Upstream mix CSV misses `gwp` column."))?;
    let adpe_idx =
        col("adpe").ok_or_else(|| AppError::data("Upstream mix CSV misses `adpe` column."))?;
    let pe_idx = col("pe").ok_or_else(|| AppError::data("Upstream mix CSV misses `pe` column."))?;
    let wue_idx = col("wue");

    let known_names = crate::mix::current_table().ok();

    let mut legacy = Vec::new();
    let mut current = BTreeMap::new();

    for (line_no, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let get = |idx: usize| -> Result<f64, AppError> {
            fields
                .get(idx)
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    AppError::data(format!(
                        "Upstream mix CSV line {}: bad numeric field.",
                        line_no + 2
                    ))
                })
        };

        let code = fields
            .get(name_idx)
            .map(|s| s.to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                AppError::data(format!(
                    "Upstream mix CSV line {}: missing zone code.",
                    line_no + 2
                ))
            })?;
        let gwp = get(gwp_idx)?;
        let adpe = get(adpe_idx)?;
        let pe = get(pe_idx)?;
        let wue = match wue_idx {
            Some(idx) => get(idx)?,
            None => 0.0,
        };

        let display_name = known_names
            .and_then(|table| table.get(&code))
            .map(|mix| mix.name.clone())
            .unwrap_or_else(|| code.clone());

        legacy.push(LegacyMix {
            name: code.clone(),
            gwp,
            adpe,
            pe,
        });
        current.insert(
            code,
            Mix {
                name: display_name,
                gwp,
                adpe,
                pe,
                wue,
            },
        );
    }

    Ok((legacy, current))
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AppError::internal(format!("Failed to serialize data file: {e}")))
}

fn write_file(path: &Path, content: &str) -> Result<(), AppError> {
    fs::write(path, content)
        .map_err(|e| AppError::usage(format!("Failed to write '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_with_wue_parses_into_both_shapes() {
        let csv = "name,gwp,adpe,pe,wue\nWOR,0.59,7.4e-8,9.99,2.3\nFRA,0.08,4.9e-8,11.3,1.4\n";
        let (legacy, current) = parse_mixes_csv(csv).unwrap();

        assert_eq!(legacy.len(), 2);
        assert_eq!(legacy[0].name, "WOR");
        assert!((legacy[0].gwp - 0.59).abs() < 1e-12);

        let fra = current.get("FRA").unwrap();
        assert!((fra.wue - 1.4).abs() < 1e-12);
        // Known zone picks up the compiled-in display name.
        assert_eq!(current.get("WOR").unwrap().name, "World");
    }

    #[test]
    fn csv_without_wue_defaults_to_zero() {
        let csv = "name,gwp,adpe,pe\nWOR,0.59,7.4e-8,9.99\n";
        let (_, current) = parse_mixes_csv(csv).unwrap();
        assert_eq!(current.get("WOR").unwrap().wue, 0.0);
    }

    #[test]
    fn bad_numeric_field_is_rejected() {
        let csv = "name,gwp,adpe,pe\nWOR,abc,7.4e-8,9.99\n";
        assert!(parse_mixes_csv(csv).is_err());
    }

    #[test]
    fn missing_column_is_rejected() {
        let csv = "name,gwp,pe\nWOR,0.59,9.99\n";
        assert!(parse_mixes_csv(csv).is_err());
    }
}
