//! Electricity-mix registries.
//!
//! Each formula generation resolves zones against its own table, and the
//! two tables deliberately keep their historical shapes:
//!
//! - the legacy registry is a list scanned by its `name` field (the zone
//!   code), as published alongside the legacy formula set;
//! - the current registry is keyed directly by zone code and carries a
//!   display name and a water-intensity column.
//!
//! Both are parsed once from snapshots embedded at compile time and then
//! frozen: the `OnceLock` initialization happens-before every reader, and
//! no mutation path exists afterward. The engine does not validate the
//! factor values; it trusts the snapshot the same way it would trust any
//! externally supplied table.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::engine::ImpactError;

/// One zone of the legacy table: intensity factors per kWh drawn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyMix {
    /// Zone code (the legacy table calls this `name`).
    pub name: String,
    /// Carbon intensity, kgCO2eq/kWh.
    pub gwp: f64,
    /// Abiotic depletion, kgSbeq/kWh.
    pub adpe: f64,
    /// Primary energy, MJ/kWh.
    pub pe: f64,
}

/// One zone of the current table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mix {
    /// Human-readable zone name (the code is the map key).
    pub name: String,
    pub gwp: f64,
    pub adpe: f64,
    pub pe: f64,
    /// Water drawn upstream at generation, L/kWh.
    pub wue: f64,
}

const LEGACY_JSON: &str = include_str!("../../data/electricity_mixes_legacy.json");
const CURRENT_JSON: &str = include_str!("../../data/electricity_mixes.json");

static LEGACY: OnceLock<Result<Vec<LegacyMix>, String>> = OnceLock::new();
static CURRENT: OnceLock<Result<HashMap<String, Mix>, String>> = OnceLock::new();

/// The legacy registry, loaded on first use and frozen.
pub fn legacy_table() -> Result<&'static [LegacyMix], ImpactError> {
    LEGACY
        .get_or_init(|| {
            serde_json::from_str(LEGACY_JSON)
                .map_err(|e| format!("embedded legacy mix table: {e}"))
        })
        .as_ref()
        .map(|v| v.as_slice())
        .map_err(|detail| ImpactError::Registry {
            detail: detail.clone(),
        })
}

/// The current registry, loaded on first use and frozen.
pub fn current_table() -> Result<&'static HashMap<String, Mix>, ImpactError> {
    CURRENT
        .get_or_init(|| {
            serde_json::from_str(CURRENT_JSON)
                .map_err(|e| format!("embedded current mix table: {e}"))
        })
        .as_ref()
        .map_err(|detail| ImpactError::Registry {
            detail: detail.clone(),
        })
}

/// Resolve a zone in the legacy table (exact-match list scan).
pub fn lookup_legacy(zone: &str) -> Result<&'static LegacyMix, ImpactError> {
    legacy_table()?
        .iter()
        .find(|mix| mix.name == zone)
        .ok_or_else(|| ImpactError::UnknownZone {
            zone: zone.to_string(),
        })
}

/// Resolve a zone in the current table (keyed lookup).
pub fn lookup_current(zone: &str) -> Result<&'static Mix, ImpactError> {
    current_table()?
        .get(zone)
        .ok_or_else(|| ImpactError::UnknownZone {
            zone: zone.to_string(),
        })
}
