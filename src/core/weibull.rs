//! Weibull reliability math
//!
//! Two-parameter Weibull model with shape `beta` and scale `eta` (hours):
//!
//! ```text
//! F(t) = 1 - exp(-(t/eta)^beta)
//! R(t) = 1 - F(t)
//! ```
//!
//! Every function here is total: degenerate parameters give a probability of
//! zero instead of an error, and the result is never NaN.

use serde::{Deserialize, Serialize};

/// Upper bound applied to `(t/eta)^beta` before exponentiation
pub const EXPONENT_CLAMP: f64 = 700.0;

/// Minimum forecast window length in hours
pub const MIN_HORIZON_HOURS: f64 = 1.0;

/// How the window failure probability is normalized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowPolicy {
    /// Probability of failing in the window given survival to the current age:
    /// `(F1 - F0) / (1 - F0)`
    #[default]
    Conditional,
    /// Raw probability mass inside the window: `F1 - F0`
    Unconditional,
}

impl std::fmt::Display for WindowPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowPolicy::Conditional => write!(f, "conditional"),
            WindowPolicy::Unconditional => write!(f, "unconditional"),
        }
    }
}

impl std::str::FromStr for WindowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "conditional" => Ok(WindowPolicy::Conditional),
            "unconditional" => Ok(WindowPolicy::Unconditional),
            other => Err(format!(
                "unknown window policy '{}' (expected 'conditional' or 'unconditional')",
                other
            )),
        }
    }
}

/// Weibull cumulative distribution function.
///
/// Returns the probability that a unit fails at or before `t`. Non-positive
/// or NaN `t`, and non-positive or non-finite `eta` or `beta`, yield `0.0`.
///
/// ```
/// let f = pcf::core::weibull::cdf(8760.0, 8760.0, 2.0);
/// assert!((f - (1.0 - (-1.0_f64).exp())).abs() < 1e-12);
/// assert_eq!(pcf::core::weibull::cdf(-1.0, 100.0, 2.0), 0.0);
/// ```
pub fn cdf(t: f64, eta: f64, beta: f64) -> f64 {
    if !(t > 0.0 && eta > 0.0 && beta > 0.0 && eta.is_finite() && beta.is_finite()) {
        return 0.0;
    }
    let x = (t / eta).powf(beta);
    if x.is_nan() {
        return 0.0;
    }
    1.0 - (-x.clamp(0.0, EXPONENT_CLAMP)).exp()
}

/// Conditional failure probability within `[age, age + horizon]` using the
/// default [`WindowPolicy::Conditional`] form.
///
/// Negative or NaN ages are treated as zero and the horizon is floored to
/// one hour. The result is always in `[0, 1]`.
pub fn probability_of_failure_in_window(
    age_hours: f64,
    eta: f64,
    beta: f64,
    horizon_hours: f64,
) -> f64 {
    window_probability(age_hours, eta, beta, horizon_hours, WindowPolicy::Conditional)
}

/// Window failure probability under an explicit policy
pub fn window_probability(
    age_hours: f64,
    eta: f64,
    beta: f64,
    horizon_hours: f64,
    policy: WindowPolicy,
) -> f64 {
    let age = age_hours.max(0.0);
    let horizon = horizon_hours.max(MIN_HORIZON_HOURS);

    let f0 = cdf(age, eta, beta);
    let f1 = cdf(age + horizon, eta, beta);

    match policy {
        WindowPolicy::Unconditional => (f1 - f0).clamp(0.0, 1.0),
        WindowPolicy::Conditional => {
            let survival = 1.0 - f0;
            if survival <= 0.0 {
                // Failure already certain at the current age
                return 1.0;
            }
            let p = (f1 - f0) / survival;
            if p.is_finite() {
                p.clamp(0.0, 1.0)
            } else {
                1.0
            }
        }
    }
}

/// Validated Weibull parameters with reliability helpers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeibullParams {
    /// Shape parameter (beta)
    pub beta: f64,
    /// Scale parameter (eta), hours
    pub eta: f64,
}

impl WeibullParams {
    /// Returns `None` unless both parameters are finite and positive
    pub fn new(beta: f64, eta: f64) -> Option<Self> {
        if !beta.is_finite() || !eta.is_finite() || beta <= 0.0 || eta <= 0.0 {
            return None;
        }
        Some(Self { beta, eta })
    }

    /// Failure probability by time `t`
    pub fn cdf(&self, t: f64) -> f64 {
        cdf(t, self.eta, self.beta)
    }

    /// Survival probability at time `t` (`1.0` for `t <= 0`)
    pub fn reliability(&self, t: f64) -> f64 {
        1.0 - self.cdf(t)
    }

    /// Instantaneous failure rate `(beta/eta) * (t/eta)^(beta-1)`; zero for `t <= 0`
    pub fn hazard_rate(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        (self.beta / self.eta) * (t / self.eta).powf(self.beta - 1.0)
    }

    /// Time by which `fraction_failed` of the population has failed.
    ///
    /// `b_life(0.10)` is the B10 life. Returns `None` outside `(0, 1)`.
    pub fn b_life(&self, fraction_failed: f64) -> Option<f64> {
        if !(fraction_failed > 0.0 && fraction_failed < 1.0) {
            return None;
        }
        Some(self.eta * (-(1.0 - fraction_failed).ln()).powf(1.0 / self.beta))
    }

    /// Window failure probability for a unit of this population
    pub fn window_probability(&self, age_hours: f64, horizon_hours: f64, policy: WindowPolicy) -> f64 {
        window_probability(age_hours, self.eta, self.beta, horizon_hours, policy)
    }
}

/// Upper bound on the number of points [`survival_curve`] returns
pub const MAX_CURVE_POINTS: usize = 10_000;

/// A sampled point on the survival curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub hours: f64,
    pub survival: f64,
}

/// Sample `R(t)` at `0, step, 2*step, ...` strictly below `max_hours`.
///
/// The step is widened when needed so that at most [`MAX_CURVE_POINTS`]
/// points are produced. A non-finite `max_hours` yields an empty curve.
pub fn survival_curve(params: &WeibullParams, max_hours: f64, step: f64) -> Vec<CurvePoint> {
    if !(step > 0.0) || !(max_hours > 0.0) || !max_hours.is_finite() {
        return Vec::new();
    }

    let step = step.max(max_hours / MAX_CURVE_POINTS as f64);
    let count = ((max_hours / step).ceil() as usize).min(MAX_CURVE_POINTS);
    (0..count)
        .map(|i| i as f64 * step)
        .take_while(|&t| t < max_hours)
        .map(|t| CurvePoint {
            hours: t,
            survival: params.reliability(t),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdf_degenerate_inputs() {
        assert_eq!(cdf(0.0, 100.0, 2.0), 0.0);
        assert_eq!(cdf(-5.0, 100.0, 2.0), 0.0);
        assert_eq!(cdf(50.0, 0.0, 2.0), 0.0);
        assert_eq!(cdf(50.0, -100.0, 2.0), 0.0);
        assert_eq!(cdf(50.0, 100.0, 0.0), 0.0);
        assert_eq!(cdf(50.0, 100.0, -1.0), 0.0);
        assert_eq!(cdf(f64::NAN, 100.0, 2.0), 0.0);
        assert_eq!(cdf(50.0, f64::NAN, 2.0), 0.0);
        assert_eq!(cdf(50.0, 100.0, f64::NAN), 0.0);
    }

    #[test]
    fn test_cdf_non_finite_parameters_are_degenerate() {
        assert_eq!(cdf(f64::INFINITY, f64::INFINITY, 2.0), 0.0);
        assert_eq!(cdf(f64::INFINITY, f64::INFINITY, 426_209.15), 0.0);
        assert_eq!(cdf(50.0, f64::INFINITY, 2.0), 0.0);
        assert_eq!(cdf(50.0, 100.0, f64::INFINITY), 0.0);
        assert_eq!(cdf(f64::INFINITY, 100.0, 2.0), 1.0);
    }

    #[test]
    fn test_window_probability_non_finite_inputs() {
        for policy in [WindowPolicy::Conditional, WindowPolicy::Unconditional] {
            let p = window_probability(f64::INFINITY, f64::INFINITY, 2.0, 0.0, policy);
            assert_eq!(p, 0.0, "{policy}");
            let q = window_probability(100.0, 2.0, f64::INFINITY, 24.0, policy);
            assert_eq!(q, 0.0, "{policy}");
        }
        let old = window_probability(f64::INFINITY, 100.0, 2.0, 0.0, WindowPolicy::Unconditional);
        assert_eq!(old, 0.0);
    }

    #[test]
    fn test_cdf_one_characteristic_life() {
        let f = cdf(8760.0, 8760.0, 2.0);
        assert!((f - 0.6321).abs() < 1e-4, "F(eta) = {}", f);
        assert!((f - (1.0 - (-1.0_f64).exp())).abs() < 1e-12);
    }

    #[test]
    fn test_cdf_monotone() {
        let mut prev = 0.0;
        for i in 0..=500 {
            let t = i as f64 * 100.0;
            let f = cdf(t, 10_000.0, 1.5);
            assert!(f >= prev, "cdf decreased at t={}: {} < {}", t, f, prev);
            prev = f;
        }
    }

    #[test]
    fn test_cdf_saturates_at_clamp() {
        // (t/eta)^beta = 1000 > 700
        let f = cdf(1000.0, 1.0, 1.0);
        assert_eq!(f, 1.0);
        assert!(cdf(f64::INFINITY, 100.0, 2.0) <= 1.0);
        let near = cdf(700.0, 1.0, 1.0);
        assert!((near - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_window_probability_reference_scenario() {
        // eta=10000, beta=1.5, age=2000h, 90 day horizon
        let p = probability_of_failure_in_window(2000.0, 10_000.0, 1.5, 2160.0);
        let f0 = cdf(2000.0, 10_000.0, 1.5);
        let f1 = cdf(4160.0, 10_000.0, 1.5);
        let expected = (f1 - f0) / (1.0 - f0);
        assert_eq!(p, expected);
        assert!(p > 0.0 && p < 1.0);
        assert_eq!(p, probability_of_failure_in_window(2000.0, 10_000.0, 1.5, 2160.0));
    }

    #[test]
    fn test_window_probability_conditional_exceeds_unconditional() {
        let c = window_probability(12_000.0, 10_000.0, 2.0, 2160.0, WindowPolicy::Conditional);
        let u = window_probability(12_000.0, 10_000.0, 2.0, 2160.0, WindowPolicy::Unconditional);
        assert!(c > u, "conditional {} should exceed unconditional {}", c, u);
    }

    #[test]
    fn test_window_probability_certain_prior_failure() {
        // F0 rounds to exactly 1.0
        let p = probability_of_failure_in_window(1_000_000.0, 10.0, 3.0, 24.0);
        assert_eq!(p, 1.0);
        let u = window_probability(1_000_000.0, 10.0, 3.0, 24.0, WindowPolicy::Unconditional);
        assert_eq!(u, 0.0);
    }

    #[test]
    fn test_window_probability_normalizes_inputs() {
        let neg_age = probability_of_failure_in_window(-100.0, 1000.0, 2.0, 240.0);
        let zero_age = probability_of_failure_in_window(0.0, 1000.0, 2.0, 240.0);
        assert_eq!(neg_age, zero_age);

        let tiny = probability_of_failure_in_window(100.0, 1000.0, 2.0, 0.0);
        let one = probability_of_failure_in_window(100.0, 1000.0, 2.0, 1.0);
        assert_eq!(tiny, one);

        let nan_age = probability_of_failure_in_window(f64::NAN, 1000.0, 2.0, 240.0);
        assert_eq!(nan_age, zero_age);
    }

    #[test]
    fn test_window_probability_invalid_params_are_zero() {
        assert_eq!(probability_of_failure_in_window(100.0, 0.0, 2.0, 240.0), 0.0);
        assert_eq!(probability_of_failure_in_window(100.0, 1000.0, 0.0, 240.0), 0.0);
        assert_eq!(probability_of_failure_in_window(100.0, -5.0, -2.0, 240.0), 0.0);
    }

    #[test]
    fn test_policy_parse_and_display() {
        assert_eq!("conditional".parse::<WindowPolicy>(), Ok(WindowPolicy::Conditional));
        assert_eq!(" Unconditional ".parse::<WindowPolicy>(), Ok(WindowPolicy::Unconditional));
        assert!("raw".parse::<WindowPolicy>().is_err());
        assert_eq!(WindowPolicy::default().to_string(), "conditional");
    }

    #[test]
    fn test_params_validation() {
        assert!(WeibullParams::new(2.0, 100.0).is_some());
        assert!(WeibullParams::new(0.0, 100.0).is_none());
        assert!(WeibullParams::new(2.0, -1.0).is_none());
        assert!(WeibullParams::new(f64::NAN, 100.0).is_none());
        assert!(WeibullParams::new(2.0, f64::INFINITY).is_none());
    }

    #[test]
    fn test_reliability_and_hazard() {
        let params = WeibullParams::new(2.0, 100.0).expect("valid parameters");
        assert_eq!(params.reliability(0.0), 1.0);
        assert!((params.reliability(100.0) - (-1.0_f64).exp()).abs() < 1e-12);
        assert_eq!(params.hazard_rate(0.0), 0.0);
        assert!(params.hazard_rate(50.0) < params.hazard_rate(80.0));

        let exponential = WeibullParams::new(1.0, 20.0).expect("valid parameters");
        assert!((exponential.hazard_rate(7.0) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_b10_life() {
        let params = WeibullParams::new(2.0, 100.0).expect("valid parameters");
        let b10 = params.b_life(0.10).expect("valid fraction");
        assert!((params.cdf(b10) - 0.10).abs() < 1e-10);
        assert!(params.b_life(0.0).is_none());
        assert!(params.b_life(1.0).is_none());

        let b50 = params.b_life(0.50).expect("valid fraction");
        assert!(b10 < b50);
    }

    #[test]
    fn test_survival_curve_sampling() {
        let params = WeibullParams::new(1.5, 1000.0).expect("valid parameters");
        let curve = survival_curve(&params, 200.0, 50.0);
        let hours: Vec<f64> = curve.iter().map(|p| p.hours).collect();
        assert_eq!(hours, vec![0.0, 50.0, 100.0, 150.0]);
        assert_eq!(curve[0].survival, 1.0);
        assert!(curve.windows(2).all(|w| w[1].survival <= w[0].survival));

        assert!(survival_curve(&params, 200.0, 0.0).is_empty());
        assert!(survival_curve(&params, 0.0, 50.0).is_empty());
    }

    #[test]
    fn test_survival_curve_is_bounded() {
        let params = WeibullParams::new(2.0, 1.0).expect("valid parameters");
        assert!(survival_curve(&params, f64::INFINITY, 50.0).is_empty());
        assert!(survival_curve(&params, f64::NAN, 50.0).is_empty());

        let wide = WeibullParams::new(2.0, 1e9).expect("valid parameters");
        let curve = survival_curve(&wide, 1.5e9, 50.0);
        assert!(!curve.is_empty());
        assert!(curve.len() <= MAX_CURVE_POINTS);
        assert_eq!(curve[0].hours, 0.0);
        assert!(curve.last().is_some_and(|p| p.hours < 1.5e9));
        assert!(curve.windows(2).all(|w| w[1].hours > w[0].hours));
    }
}
