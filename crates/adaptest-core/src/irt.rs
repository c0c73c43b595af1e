//! Numerically stable 3PL probability model and Fisher information.
//!
//! Pure functions over double-precision floats, no state. Numeric edge
//! cases (degenerate parameters, probabilities at the bounds) are mapped
//! to zero information rather than errors so they can never win selection
//! or masquerade as high-confidence evidence.

use crate::model::IrtParameters;

/// Logistic scaling constant approximating the normal-ogive model.
pub const D: f64 = 1.7;

/// Lower bound of the latent ability scale.
pub const THETA_MIN: f64 = -4.0;

/// Upper bound of the latent ability scale.
pub const THETA_MAX: f64 = 4.0;

/// Probabilities within EPS of 0 or 1 are treated as uninformative.
pub const EPS: f64 = 1e-6;

/// Logistic function that never exponentiates a positive argument, so it
/// cannot overflow for any finite input.
pub fn stable_sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

/// Probability of a correct response under the 3PL model.
///
/// `c + (1 - c) * sigmoid(D * a * (theta - b))`; strictly increasing in
/// theta for a > 0 and bounded in (c, 1).
pub fn prob_correct(theta: f64, params: IrtParameters) -> f64 {
    let s = stable_sigmoid(D * params.a * (theta - params.b));
    params.c + (1.0 - params.c) * s
}

/// Closed-form derivative of [`prob_correct`] with respect to theta.
pub fn dprob_dtheta(theta: f64, params: IrtParameters) -> f64 {
    let s = stable_sigmoid(D * params.a * (theta - params.b));
    (1.0 - params.c) * D * params.a * s * (1.0 - s)
}

/// Fisher information of a single Bernoulli trial under the 3PL model.
///
/// Returns 0.0 for degenerate parameters or when the probability sits
/// within [`EPS`] of its bounds, where the derivative ratio is unstable.
/// Peaks near theta = b and scales with a^2.
pub fn fisher_info(theta: f64, params: IrtParameters) -> f64 {
    if params.is_degenerate() {
        return 0.0;
    }
    let p = prob_correct(theta, params);
    if p <= EPS || p >= 1.0 - EPS {
        return 0.0;
    }
    let dp = dprob_dtheta(theta, params);
    (dp * dp) / (p * (1.0 - p))
}

/// Clamp an ability estimate to the fixed scale bounds.
pub fn clamp_theta(theta: f64) -> f64 {
    theta.clamp(THETA_MIN, THETA_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_exact_at_zero() {
        assert_eq!(stable_sigmoid(0.0), 0.5);
    }

    #[test]
    fn sigmoid_extreme_arguments_do_not_overflow() {
        assert!((stable_sigmoid(1e6) - 1.0).abs() < 1e-12);
        assert!(stable_sigmoid(-1e6) >= 0.0);
        assert!(stable_sigmoid(-1e6) < 1e-12);
        assert!(stable_sigmoid(f64::MAX).is_finite());
        assert!(stable_sigmoid(-f64::MAX).is_finite());
    }

    #[test]
    fn sigmoid_symmetric_around_zero() {
        for x in [0.3, 1.7, 42.0] {
            let sum = stable_sigmoid(x) + stable_sigmoid(-x);
            assert!((sum - 1.0).abs() < 1e-12, "sigmoid({x}) asymmetric: {sum}");
        }
    }

    #[test]
    fn prob_correct_bounded_by_guessing_floor() {
        let params = IrtParameters::new(1.2, 0.0, 0.2);
        for theta in [-4.0, -2.0, 0.0, 2.0, 4.0] {
            let p = prob_correct(theta, params);
            assert!(p > params.c, "p={p} not above floor at theta={theta}");
            assert!(p < 1.0, "p={p} not below 1 at theta={theta}");
        }
    }

    #[test]
    fn prob_correct_strictly_increasing_in_theta() {
        let params = IrtParameters::new(1.0, 0.3, 0.25);
        let mut last = prob_correct(-4.0, params);
        let mut theta = -3.5;
        while theta <= 4.0 {
            let p = prob_correct(theta, params);
            assert!(p > last, "not increasing at theta={theta}");
            last = p;
            theta += 0.5;
        }
    }

    #[test]
    fn derivative_matches_finite_difference() {
        let params = IrtParameters::new(1.4, -0.6, 0.15);
        let h = 1e-6;
        for theta in [-2.0, 0.0, 1.5] {
            let numeric = (prob_correct(theta + h, params) - prob_correct(theta - h, params))
                / (2.0 * h);
            let analytic = dprob_dtheta(theta, params);
            assert!(
                (numeric - analytic).abs() < 1e-6,
                "derivative mismatch at theta={theta}: {numeric} vs {analytic}"
            );
        }
    }

    #[test]
    fn fisher_info_zero_for_degenerate_parameters() {
        assert_eq!(fisher_info(0.0, IrtParameters::new(0.0, 0.0, 0.2)), 0.0);
        assert_eq!(fisher_info(0.0, IrtParameters::new(-1.0, 0.0, 0.2)), 0.0);
        assert_eq!(fisher_info(0.0, IrtParameters::new(1.0, 0.0, 1.0)), 0.0);
        assert_eq!(fisher_info(0.0, IrtParameters::new(1.0, 0.0, -0.2)), 0.0);
    }

    #[test]
    fn fisher_info_positive_at_item_difficulty() {
        let params = IrtParameters::new(1.0, 0.0, 0.2);
        assert!(fisher_info(0.0, params) > 0.01);
    }

    #[test]
    fn fisher_info_peaks_near_item_difficulty() {
        let params = IrtParameters::new(1.3, 0.8, 0.2);
        let near = fisher_info(0.9, params);
        let far = fisher_info(-3.0, params);
        assert!(near > far);
    }

    #[test]
    fn fisher_info_zero_at_saturated_probability() {
        // Huge discrimination far from b drives p to within EPS of 1.
        let params = IrtParameters::new(50.0, -10.0, 0.0);
        assert_eq!(fisher_info(4.0, params), 0.0);
    }

    #[test]
    fn clamp_theta_respects_bounds() {
        assert_eq!(clamp_theta(10.0), THETA_MAX);
        assert_eq!(clamp_theta(-10.0), THETA_MIN);
        assert_eq!(clamp_theta(1.25), 1.25);
    }
}
