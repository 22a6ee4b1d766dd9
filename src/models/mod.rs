//! Model registry: parameter counts per published model.
//!
//! The registry is collaborator data, not engine logic: the engine only
//! ever consumes the `ModelParameters` resolved here. Lookups resolve
//! aliases first (point releases that share a base model's architecture)
//! and then match provider + name exactly. A miss is a caller-level
//! concern; the engine never sees it.
//!
//! Parameter counts are in billions. Dense models publish a scalar or an
//! uncertainty interval; mixture-of-experts models publish separate
//! active/total counts, either of which may itself be an interval.

use std::sync::OnceLock;

use serde::Deserialize;

use crate::engine::ModelParameters;
use crate::math::Range;

/// A scalar or `{min, max}` parameter count, billions.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(f64),
    Bounds { min: f64, max: f64 },
}

impl ParamValue {
    pub fn to_range(self) -> Range {
        match self {
            ParamValue::Scalar(v) => Range::scalar(v),
            ParamValue::Bounds { min, max } => Range::new(min, max),
        }
    }
}

/// Mixture-of-experts parameter counts.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MoeParams {
    pub total: ParamValue,
    pub active: ParamValue,
}

/// Published architecture of a model.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Architecture {
    Dense { parameters: ParamValue },
    Moe { parameters: MoeParams },
}

impl Architecture {
    pub fn to_model_parameters(self) -> ModelParameters {
        match self {
            Architecture::Dense { parameters } => ModelParameters::dense(parameters.to_range()),
            Architecture::Moe { parameters } => ModelParameters::new(
                parameters.active.to_range(),
                parameters.total.to_range(),
            ),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub provider: String,
    pub name: String,
    pub architecture: Architecture,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelAlias {
    pub provider: String,
    pub name: String,
    pub alias: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelRegistry {
    #[serde(default)]
    pub aliases: Vec<ModelAlias>,
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

impl ModelRegistry {
    /// Resolve `provider`/`name` to an entry, following one alias hop.
    pub fn find(&self, provider: &str, name: &str) -> Option<&ModelEntry> {
        let resolved = self
            .aliases
            .iter()
            .find(|a| a.provider == provider && a.name == name)
            .map(|a| a.alias.as_str())
            .unwrap_or(name);
        self.models
            .iter()
            .find(|m| m.provider == provider && m.name == resolved)
    }

    /// Resolve a model from any provider by name alone (first match in
    /// registry order). Useful when usage rows omit the provider.
    pub fn find_by_name(&self, name: &str) -> Option<&ModelEntry> {
        self.models.iter().find(|m| m.name == name)
    }
}

const MODELS_JSON: &str = include_str!("../../data/models.json");

static REGISTRY: OnceLock<Result<ModelRegistry, String>> = OnceLock::new();

/// The process-wide registry, parsed once from the embedded snapshot.
pub fn registry() -> Result<&'static ModelRegistry, String> {
    REGISTRY
        .get_or_init(|| {
            serde_json::from_str(MODELS_JSON).map_err(|e| format!("embedded model registry: {e}"))
        })
        .as_ref()
        .map_err(Clone::clone)
}
