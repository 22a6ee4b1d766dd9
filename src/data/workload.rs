//! Synthetic usage-snapshot generation.
//!
//! Projects a hypothetical fleet when no real usage snapshot is at hand:
//! requests are spread over the registry's models with a heavy-tailed
//! rank weighting, and per-request completion lengths are drawn from a
//! log-normal (short answers dominate, long generations are rare but
//! heavy). Deterministic for a given seed.

use chrono::NaiveDate;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::LogNormal;

use crate::error::AppError;
use crate::io::usage::{UsageRow, UsageSnapshot};
use crate::models;

#[derive(Debug, Clone)]
pub struct WorkloadSpec {
    /// Total request count across the synthetic fleet.
    pub total_requests: u64,
    /// How many registry models take part.
    pub model_count: usize,
    pub seed: u64,
    /// Median completion length per request, tokens.
    pub median_completion_tokens: f64,
    /// Log-normal sigma of per-model mean completion length.
    pub token_sigma: f64,
    pub asof_date: NaiveDate,
}

pub fn generate_workload(spec: &WorkloadSpec) -> Result<UsageSnapshot, AppError> {
    if spec.total_requests == 0 {
        return Err(AppError::usage("Total request count must be > 0."));
    }
    if spec.model_count == 0 {
        return Err(AppError::usage("Model count must be > 0."));
    }
    if !(spec.median_completion_tokens.is_finite() && spec.median_completion_tokens >= 1.0) {
        return Err(AppError::usage("Median completion tokens must be >= 1."));
    }
    if !(spec.token_sigma.is_finite() && spec.token_sigma >= 0.0) {
        return Err(AppError::usage("Token sigma must be finite and >= 0."));
    }

    let registry = models::registry().map_err(AppError::data)?;
    if registry.models.is_empty() {
        return Err(AppError::data("Model registry is empty."));
    }
    let model_count = spec.model_count.min(registry.models.len());

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let tokens_dist = LogNormal::new(spec.median_completion_tokens.ln(), spec.token_sigma)
        .map_err(|e| AppError::internal(format!("Token distribution error: {e}")))?;

    // Heavy-tailed rank weights: usage concentrates on a few models.
    let weights: Vec<f64> = (0..model_count).map(|i| 1.0 / (i + 1) as f64).collect();
    let weight_sum: f64 = weights.iter().sum();

    let mut rows = Vec::with_capacity(model_count);
    for (idx, entry) in registry.models.iter().take(model_count).enumerate() {
        let share = weights[idx] / weight_sum;
        let requests = ((spec.total_requests as f64 * share).round() as u64).max(1);

        // Per-model mean completion length, then totals for the row.
        let mean_tokens = tokens_dist.sample(&mut rng).max(1.0);
        let completion_tokens = (requests as f64 * mean_tokens).round() as u64;

        // Prompts run a few times longer than completions.
        let io_ratio = rng.gen_range(2.0..8.0);
        let prompt_tokens = (completion_tokens as f64 * io_ratio).round() as u64;

        rows.push(UsageRow {
            model: entry.name.clone(),
            provider: Some(entry.provider.clone()),
            requests,
            prompt_tokens,
            completion_tokens,
        });
    }

    Ok(UsageSnapshot {
        asof_date: spec.asof_date,
        period: Some("synthetic".to_string()),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(seed: u64) -> WorkloadSpec {
        WorkloadSpec {
            total_requests: 1_000_000,
            model_count: 10,
            seed,
            median_completion_tokens: 300.0,
            token_sigma: 0.8,
            asof_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        }
    }

    #[test]
    fn same_seed_same_workload() {
        let a = generate_workload(&spec(42)).unwrap();
        let b = generate_workload(&spec(42)).unwrap();
        assert_eq!(a.rows.len(), b.rows.len());
        for (x, y) in a.rows.iter().zip(&b.rows) {
            assert_eq!(x.model, y.model);
            assert_eq!(x.requests, y.requests);
            assert_eq!(x.completion_tokens, y.completion_tokens);
            assert_eq!(x.prompt_tokens, y.prompt_tokens);
        }
    }

    #[test]
    fn different_seeds_differ() {
        let a = generate_workload(&spec(1)).unwrap();
        let b = generate_workload(&spec(2)).unwrap();
        let same = a
            .rows
            .iter()
            .zip(&b.rows)
            .all(|(x, y)| x.completion_tokens == y.completion_tokens);
        assert!(!same);
    }

    #[test]
    fn usage_concentrates_on_leading_models() {
        let snap = generate_workload(&spec(42)).unwrap();
        assert_eq!(snap.rows.len(), 10);
        assert!(snap.rows[0].requests > snap.rows[9].requests);
        // Every row stays valid for the fleet pipeline.
        for row in &snap.rows {
            assert!(row.requests >= 1);
            assert!(row.prompt_tokens >= row.completion_tokens);
        }
    }

    #[test]
    fn model_count_is_clamped_to_registry_size() {
        let mut s = spec(42);
        s.model_count = 10_000;
        let snap = generate_workload(&s).unwrap();
        assert!(snap.rows.len() <= models::registry().unwrap().models.len());
    }

    #[test]
    fn invalid_specs_are_rejected() {
        let mut s = spec(42);
        s.total_requests = 0;
        assert!(generate_workload(&s).is_err());

        let mut s = spec(42);
        s.median_completion_tokens = 0.0;
        assert!(generate_workload(&s).is_err());

        let mut s = spec(42);
        s.token_sigma = -1.0;
        assert!(generate_workload(&s).is_err());
    }
}
