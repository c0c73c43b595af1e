//! Simulation outcomes and aggregate recovery statistics.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use adaptest_core::exposure::ExposureTracker;
use adaptest_core::session::SessionSummary;

/// What one simulated session produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOutcome {
    /// The ability the respondent was simulated at.
    pub true_theta: f64,
    /// End-of-session summary, including the final estimate.
    pub summary: SessionSummary,
    /// Rendered performance report.
    pub report_text: String,
}

impl SessionOutcome {
    /// Signed estimation error for this session.
    pub fn bias(&self) -> f64 {
        self.summary.ability.theta - self.true_theta
    }
}

/// Recovery and exposure statistics over a whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateStats {
    pub sessions: usize,
    /// Mean signed error of the final estimates.
    pub mean_bias: f64,
    /// Root mean squared error of the final estimates.
    pub rmse: f64,
    /// Mean finite standard error; NaN when no session reached a finite SE.
    pub mean_se: f64,
    pub mean_items_served: f64,
    /// Highest exposure fraction any item reached.
    pub max_exposure: f64,
    /// Mean exposure over items that were served at least once.
    pub mean_exposure: f64,
    /// Number of distinct items served at least once.
    pub items_exposed: usize,
    /// Total serves per skill across all sessions.
    pub serves_by_skill: BTreeMap<String, usize>,
}

/// Aggregate outcomes and the final shared exposure state.
pub fn compute_aggregate(
    outcomes: &[SessionOutcome],
    exposure: &ExposureTracker,
) -> AggregateStats {
    let sessions = outcomes.len();
    let n = sessions.max(1) as f64;

    let mean_bias = outcomes.iter().map(SessionOutcome::bias).sum::<f64>() / n;
    let rmse = (outcomes
        .iter()
        .map(|o| o.bias().powi(2))
        .sum::<f64>()
        / n)
        .sqrt();

    let finite_ses: Vec<f64> = outcomes
        .iter()
        .map(|o| o.summary.ability.se)
        .filter(|se| se.is_finite())
        .collect();
    let mean_se = finite_ses.iter().sum::<f64>() / finite_ses.len().max(1) as f64;

    let mean_items_served = outcomes
        .iter()
        .map(|o| o.summary.items_served as f64)
        .sum::<f64>()
        / n;

    let exposures: Vec<f64> = exposure.iter().map(|(_, e)| e).collect();
    let max_exposure = exposures.iter().copied().fold(0.0, f64::max);
    let mean_exposure = exposures.iter().sum::<f64>() / exposures.len().max(1) as f64;

    let mut serves_by_skill = BTreeMap::new();
    for outcome in outcomes {
        for skill in &outcome.summary.skills {
            *serves_by_skill.entry(skill.skill.clone()).or_insert(0) += skill.served;
        }
    }

    AggregateStats {
        sessions,
        mean_bias,
        rmse,
        mean_se,
        mean_items_served,
        max_exposure,
        mean_exposure,
        items_exposed: exposure.len(),
        serves_by_skill,
    }
}

/// Everything a simulation run produced, serializable for later analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub outcomes: Vec<SessionOutcome>,
    pub aggregate: AggregateStats,
    pub duration_ms: u64,
}

impl SimulationReport {
    /// Write the full report as pretty-printed JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("failed to create report file: {}", path.display()))?;
        serde_json::to_writer_pretty(file, self)
            .with_context(|| format!("failed to write report: {}", path.display()))
    }
}
