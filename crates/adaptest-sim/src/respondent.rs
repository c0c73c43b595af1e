//! Simulated test-takers with a known true ability.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use adaptest_core::irt;
use adaptest_core::model::IrtParameters;

/// A respondent whose answers are Bernoulli draws from the 3PL model at
/// a fixed true ability.
///
/// Because the true ability is known, comparing it against the final
/// estimate measures recovery quality directly.
#[derive(Debug, Clone)]
pub struct SimulatedRespondent {
    true_theta: f64,
    rng: StdRng,
}

impl SimulatedRespondent {
    pub fn new(true_theta: f64, seed: u64) -> Self {
        Self {
            true_theta,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn true_theta(&self) -> f64 {
        self.true_theta
    }

    /// Answer one item: correct with the model probability at the true
    /// ability.
    pub fn answer(&mut self, params: IrtParameters) -> bool {
        let p = irt::prob_correct(self.true_theta, params);
        self.rng.gen_bool(p)
    }
}
