//! MAP ability estimation via one-step Fisher scoring.
//!
//! Each call performs a single Newton step toward the posterior mode of
//! theta given the full response history and a Gaussian prior. The
//! caller re-invokes after every response; the sequence of single steps
//! converges as evidence accumulates. Re-summing the whole history each
//! call is deliberate: the linearization point shifts between calls, and
//! histories are short (tens of items), so robustness wins over an
//! incremental update.

use serde::{Deserialize, Serialize};

use crate::irt::{self, EPS};
use crate::model::{AbilityEstimate, ParameterTable, ResponseRecord};

/// Gaussian prior over the latent ability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prior {
    pub mean: f64,
    pub var: f64,
}

impl Default for Prior {
    fn default() -> Self {
        // Standard-normal prior on the theta scale.
        Self { mean: 0.0, var: 1.0 }
    }
}

/// One-step MAP Fisher-scoring estimator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MapEstimator {
    pub prior: Prior,
    /// Fraction of the Newton step applied per call.
    pub step_size: f64,
}

impl Default for MapEstimator {
    fn default() -> Self {
        Self {
            prior: Prior::default(),
            step_size: 1.0,
        }
    }
}

impl MapEstimator {
    pub fn new(prior: Prior, step_size: f64) -> Self {
        Self { prior, step_size }
    }

    /// Apply one Fisher-scoring step at the current theta.
    ///
    /// History entries are skipped when the item has no parameter entry,
    /// when the parameters are degenerate, or when the predicted
    /// probability falls within [`EPS`] of its bounds. The returned theta
    /// is clamped to the ability scale; the SE is `1/sqrt(I + 1/var)` and
    /// becomes infinite only if the denominator is non-positive (which a
    /// positive prior variance rules out).
    pub fn update(
        &self,
        theta: f64,
        history: &[ResponseRecord],
        params: &ParameterTable,
    ) -> AbilityEstimate {
        let mut score = 0.0;
        let mut info = 0.0;

        for record in history {
            let Some(&pars) = params.get(&record.item_id) else {
                tracing::warn!(item = %record.item_id, "answered item has no IRT parameters, skipping");
                continue;
            };
            if pars.is_degenerate() {
                continue;
            }
            let p = irt::prob_correct(theta, pars);
            if p <= EPS || p >= 1.0 - EPS {
                continue;
            }
            let dp = irt::dprob_dtheta(theta, pars);
            let pq = p * (1.0 - p);
            let response = if record.correct { 1.0 } else { 0.0 };
            score += (response - p) * dp / pq;
            info += dp * dp / pq;
        }

        let prior_precision = 1.0 / self.prior.var;
        let denominator = info + prior_precision;
        if denominator <= 0.0 {
            return AbilityEstimate::new(theta, f64::INFINITY);
        }

        let numerator = score - prior_precision * (theta - self.prior.mean);
        let theta_new = irt::clamp_theta(theta + self.step_size * numerator / denominator);
        AbilityEstimate::new(theta_new, 1.0 / denominator.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IrtParameters, ItemId};

    fn single_item_table() -> ParameterTable {
        [(ItemId::new("q1"), IrtParameters::new(1.2, 0.0, 0.2))]
            .into_iter()
            .collect()
    }

    #[test]
    fn theta_increases_on_correct_response() {
        let estimator = MapEstimator::default();
        let history = vec![ResponseRecord::new("q1", true)];
        let estimate = estimator.update(0.0, &history, &single_item_table());
        assert!(estimate.theta > 0.0);
        assert!(estimate.se.is_finite());
    }

    #[test]
    fn theta_decreases_on_incorrect_response() {
        let estimator = MapEstimator::default();
        let history = vec![ResponseRecord::new("q1", false)];
        let estimate = estimator.update(0.0, &history, &single_item_table());
        assert!(estimate.theta < 0.0);
        assert!(estimate.se.is_finite());
    }

    #[test]
    fn empty_history_yields_prior_se() {
        let estimator = MapEstimator::default();
        let estimate = estimator.update(0.0, &[], &ParameterTable::new());
        // With prior N(0,1) and theta at the prior mean, nothing moves.
        assert_eq!(estimate.theta, 0.0);
        assert!((estimate.se - 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_history_pulls_theta_toward_prior_mean() {
        let estimator = MapEstimator::default();
        let estimate = estimator.update(2.0, &[], &ParameterTable::new());
        assert!(estimate.theta < 2.0);
        assert!(estimate.theta > 0.0);
    }

    #[test]
    fn missing_parameters_are_skipped() {
        let estimator = MapEstimator::default();
        let history = vec![
            ResponseRecord::new("q1", true),
            ResponseRecord::new("ghost", true),
        ];
        let with_ghost = estimator.update(0.0, &history, &single_item_table());
        let without = estimator.update(
            0.0,
            &[ResponseRecord::new("q1", true)],
            &single_item_table(),
        );
        assert_eq!(with_ghost, without);
    }

    #[test]
    fn degenerate_parameters_contribute_nothing() {
        let estimator = MapEstimator::default();
        let table: ParameterTable = [
            (ItemId::new("q1"), IrtParameters::new(1.2, 0.0, 0.2)),
            (ItemId::new("bad"), IrtParameters::new(-1.0, 0.0, 0.2)),
        ]
        .into_iter()
        .collect();
        let history = vec![
            ResponseRecord::new("q1", true),
            ResponseRecord::new("bad", false),
        ];
        let estimate = estimator.update(0.0, &history, &table);
        let baseline = estimator.update(
            0.0,
            &[ResponseRecord::new("q1", true)],
            &table,
        );
        assert_eq!(estimate, baseline);
    }

    #[test]
    fn theta_clamped_on_long_correct_streak() {
        let estimator = MapEstimator::default();
        let table = single_item_table();
        let mut theta = 0.0;
        let mut history = Vec::new();
        for _ in 0..100 {
            history.push(ResponseRecord::new("q1", true));
            theta = estimator.update(theta, &history, &table).theta;
        }
        assert!(theta <= crate::irt::THETA_MAX);
    }

    #[test]
    fn nonpositive_denominator_guard() {
        // Negative prior variance is a misconfiguration; the guard keeps
        // theta unchanged and reports infinite SE instead of NaN.
        let estimator = MapEstimator::new(Prior { mean: 0.0, var: -1.0 }, 1.0);
        let estimate = estimator.update(0.5, &[], &ParameterTable::new());
        assert_eq!(estimate.theta, 0.5);
        assert!(estimate.se.is_infinite());
    }

    #[test]
    fn se_shrinks_as_evidence_accumulates() {
        let estimator = MapEstimator::default();
        let table: ParameterTable = (0..10)
            .map(|i| {
                (
                    ItemId::new(format!("q{i}")),
                    IrtParameters::new(1.3, (i as f64 - 5.0) * 0.3, 0.2),
                )
            })
            .collect();
        let mut theta = 0.0;
        let mut history = Vec::new();
        let mut last_se = f64::INFINITY;
        for i in 0..10 {
            history.push(ResponseRecord::new(format!("q{i}"), i % 2 == 0));
            let estimate = estimator.update(theta, &history, &table);
            theta = estimate.theta;
            if i == 9 {
                assert!(estimate.se < 1.0, "SE should tighten below the prior");
            }
            last_se = estimate.se;
        }
        assert!(last_se.is_finite());
    }
}
