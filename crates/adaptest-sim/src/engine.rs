//! The simulation engine: runs many sessions against one shared bank.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{anyhow, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};
use uuid::Uuid;

use adaptest_core::blueprint::{BlueprintSpec, BlueprintState};
use adaptest_core::estimator::MapEstimator;
use adaptest_core::exposure::ExposureTracker;
use adaptest_core::model::{ItemBank, ItemId, ParameterTable};
use adaptest_core::selector::{ItemSelector, SelectorConfig};
use adaptest_core::session::{SessionConfig, TestSession};
use adaptest_core::traits::{
    ExplanationRequest, ExplanationService, ReportRequest, ReportService,
};

use crate::report::{compute_aggregate, SessionOutcome, SimulationReport};
use crate::respondent::SimulatedRespondent;

/// Configuration for one simulation run.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Number of simulated sessions.
    pub sessions: usize,
    /// Maximum sessions in flight at once.
    pub parallelism: usize,
    /// Master seed; true abilities, selectors, and respondents all
    /// derive from it, so a run is reproducible end to end.
    pub seed: u64,
    /// Stop rules applied to every session.
    pub session: SessionConfig,
    /// Selection weights applied to every session.
    pub selector: SelectorConfig,
    /// Blueprint applied to every session; `None` runs unconstrained.
    pub blueprint: Option<BlueprintSpec>,
    /// Historical exposure seeded into the shared tracker before any
    /// session runs; items at or above the selector's exposure limit
    /// start out filtered.
    pub initial_exposure: Vec<(ItemId, f64)>,
    /// True abilities are drawn uniformly from this range.
    pub theta_range: (f64, f64),
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            sessions: 100,
            parallelism: 8,
            seed: 7,
            session: SessionConfig::default(),
            selector: SelectorConfig::default(),
            blueprint: None,
            initial_exposure: Vec::new(),
            theta_range: (-2.5, 2.5),
        }
    }
}

/// Progress callback invoked as sessions finish.
pub trait SimProgress: Send + Sync {
    fn session_finished(&self, completed: usize, total: usize);
}

/// Progress sink that does nothing.
pub struct NoopProgress;

impl SimProgress for NoopProgress {
    fn session_finished(&self, _completed: usize, _total: usize) {}
}

/// Runs simulated sessions concurrently over a shared exposure tracker.
pub struct SimulationEngine {
    config: SimulationConfig,
    explanation: Arc<dyn ExplanationService>,
    report: Arc<dyn ReportService>,
}

impl SimulationEngine {
    pub fn new(
        config: SimulationConfig,
        explanation: Arc<dyn ExplanationService>,
        report: Arc<dyn ReportService>,
    ) -> Self {
        Self {
            config,
            explanation,
            report,
        }
    }

    /// Run the configured number of sessions and aggregate the outcomes.
    pub async fn run(
        &self,
        bank: Arc<ItemBank>,
        params: Arc<ParameterTable>,
        progress: Arc<dyn SimProgress>,
    ) -> Result<SimulationReport> {
        let started = Instant::now();
        let total = self.config.sessions;
        info!(
            sessions = total,
            parallelism = self.config.parallelism,
            seed = self.config.seed,
            bank_items = bank.len(),
            explanation_service = self.explanation.name(),
            report_service = self.report.name(),
            "starting simulation"
        );

        // Draw all true abilities up front so they depend only on the
        // master seed, not on completion order.
        let mut theta_rng = StdRng::seed_from_u64(self.config.seed);
        let (lo, hi) = self.config.theta_range;
        let true_thetas: Vec<f64> = (0..total).map(|_| theta_rng.gen_range(lo..=hi)).collect();

        let mut tracker = ExposureTracker::new();
        for (id, seeded) in &self.config.initial_exposure {
            tracker.seed(id.clone(), *seeded);
        }
        let exposure = Arc::new(Mutex::new(tracker));
        let completed = Arc::new(Mutex::new(0usize));

        let outcomes: Vec<SessionOutcome> = stream::iter(true_thetas.into_iter().enumerate())
            .map(|(index, true_theta)| {
                let bank = Arc::clone(&bank);
                let params = Arc::clone(&params);
                let exposure = Arc::clone(&exposure);
                let completed = Arc::clone(&completed);
                let progress = Arc::clone(&progress);
                async move {
                    let outcome = self
                        .run_one(index, true_theta, &bank, &params, &exposure)
                        .await?;
                    let done = {
                        let mut completed = completed
                            .lock()
                            .map_err(|_| anyhow!("progress counter lock poisoned"))?;
                        *completed += 1;
                        *completed
                    };
                    progress.session_finished(done, total);
                    Ok::<_, anyhow::Error>(outcome)
                }
            })
            .buffer_unordered(self.config.parallelism.max(1))
            .try_collect()
            .await?;

        let aggregate = {
            let tracker = exposure
                .lock()
                .map_err(|_| anyhow!("exposure tracker lock poisoned"))?;
            compute_aggregate(&outcomes, &tracker)
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            sessions = outcomes.len(),
            rmse = aggregate.rmse,
            mean_items = aggregate.mean_items_served,
            duration_ms,
            "simulation finished"
        );

        Ok(SimulationReport {
            id: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            outcomes,
            aggregate,
            duration_ms,
        })
    }

    async fn run_one(
        &self,
        index: usize,
        true_theta: f64,
        bank: &ItemBank,
        params: &ParameterTable,
        exposure: &Mutex<ExposureTracker>,
    ) -> Result<SessionOutcome> {
        // Offset derived seeds so sessions are independent streams.
        let seed = self.config.seed.wrapping_add(index as u64 + 1);
        let mut respondent = SimulatedRespondent::new(true_theta, seed.wrapping_mul(2));
        let selector = ItemSelector::with_seed(self.config.selector, seed.wrapping_mul(3));
        let blueprint = self.config.blueprint.clone().map(BlueprintState::new);
        let mut session = TestSession::new(
            self.config.session,
            MapEstimator::default(),
            selector,
            blueprint,
        );

        loop {
            // Selection holds the shared tracker lock; it is released
            // before any await point.
            let item = {
                let mut tracker = exposure
                    .lock()
                    .map_err(|_| anyhow!("exposure tracker lock poisoned"))?;
                session.next_item(bank, params, &mut tracker)
            };
            let Some(item) = item else {
                break;
            };

            let Some(&item_params) = params.get(&item.id) else {
                // Selection only picks parameterized items.
                continue;
            };
            let correct = respondent.answer(item_params);
            let ability = session.record_response(item.id.clone(), correct, params);
            debug!(
                session = %session.id(),
                item = %item.id,
                correct,
                theta = ability.theta,
                "response scored"
            );

            let request = ExplanationRequest {
                item_id: item.id.clone(),
                stem: item.stem.clone(),
                correct_choice: item.answer_key.clone(),
                answered_correctly: correct,
                ability,
            };
            if let Err(error) = self.explanation.explain(&request).await {
                warn!(item = %item.id, %error, "explanation service failed, continuing");
            }
        }

        let summary = session.summary(bank);
        let report = self
            .report
            .generate(&ReportRequest {
                summary: summary.clone(),
            })
            .await?;

        Ok(SessionOutcome {
            true_theta,
            summary,
            report_text: report.text,
        })
    }
}
