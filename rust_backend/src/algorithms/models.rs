//! Afterglow model evaluation and goodness-of-fit helpers.

use std::f64::consts::LN_10;

/// Parameters of the Willingale et al. (2007) afterglow form, in log10 space.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct W07Params {
    /// log10 of the break time `T` (seconds)
    pub log_t_break: f64,
    /// log10 of the flux at the break
    pub log_flux: f64,
    /// Temporal decay index
    pub alpha: f64,
    /// log10 of the rise time `t_a` (seconds)
    pub log_t_rise: f64,
}

impl W07Params {
    pub fn new(log_t_break: f64, log_flux: f64, alpha: f64, log_t_rise: f64) -> Self {
        Self {
            log_t_break,
            log_flux,
            alpha,
            log_t_rise,
        }
    }

    /// log10 flux at log10 time `log_t`.
    pub fn evaluate(&self, log_t: f64) -> f64 {
        w07(log_t, self.log_t_break, self.log_flux, self.alpha, self.log_t_rise)
    }
}

/// Evaluate the W07 afterglow model at `log_t`.
///
/// Before the break the flux follows the exponential phase
/// `logF + (α·(1 − t/T) − t_a/t) / ln 10`; afterwards the power-law phase
/// `logF − α·(log t − logT) − (t_a/t) / ln 10`.
///
/// # Arguments
/// * `log_t` - log10 of the time since trigger
/// * `log_t_break` - log10 of the break time `T`
/// * `log_flux` - log10 of the flux at `T`
/// * `alpha` - decay index
/// * `log_t_rise` - log10 of the rise time `t_a`
///
/// # Examples
///
/// ```
/// use grblc_rust::algorithms::models::w07;
///
/// // far from the rise time the value at the break is logF
/// let value = w07(3.0, 3.0, -10.0, 1.5, -10.0);
/// assert!((value + 10.0).abs() < 1e-9);
/// ```
pub fn w07(log_t: f64, log_t_break: f64, log_flux: f64, alpha: f64, log_t_rise: f64) -> f64 {
    let t = 10f64.powf(log_t);
    let t_break = 10f64.powf(log_t_break);
    let t_rise = 10f64.powf(log_t_rise);

    if log_t < log_t_break {
        log_flux + (alpha * (1.0 - t / t_break) - t_rise / t) / LN_10
    } else {
        log_flux - alpha * (log_t - log_t_break) - (t_rise / t) / LN_10
    }
}

/// Vectorized [`w07`].
pub fn w07_batch(log_t: &[f64], params: &W07Params) -> Vec<f64> {
    log_t.iter().map(|&x| params.evaluate(x)).collect()
}

/// `Σ ((observed − expected) / sigma)²`
///
/// Slices must have equal length; extra elements of a longer slice are ignored.
pub fn chi_square(observed: &[f64], expected: &[f64], sigma: &[f64]) -> f64 {
    observed
        .iter()
        .zip(expected)
        .zip(sigma)
        .map(|((o, e), s)| {
            let r = (o - e) / s;
            r * r
        })
        .sum()
}

/// Chi-square divided by `n − n_params` degrees of freedom.
///
/// Returns `None` when there are no degrees of freedom left.
pub fn reduced_chi_square(
    observed: &[f64],
    expected: &[f64],
    sigma: &[f64],
    n_params: usize,
) -> Option<f64> {
    let n = observed.len().min(expected.len()).min(sigma.len());
    if n <= n_params {
        return None;
    }
    Some(chi_square(observed, expected, sigma) / (n - n_params) as f64)
}
