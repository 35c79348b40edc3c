//! Per-band inverse-variance weighted regression of rescaling factors.
//!
//! Each non-reference band gets a straight-line fit of `magnitude_offset`
//! against `log10(observation_time)` plus a weighted mean of the offsets.
//! The slope decides whether the band shows color evolution.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use super::models;
use crate::core::domain::{
    BandRegressionResult, Classification, ConstantFit, LinearFit, RescalingFactorSample,
    WeightedMean,
};

/// Thresholds of the per-band regressor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionSettings {
    /// Minimum number of samples for a line fit
    #[serde(default = "default_min_fit_samples")]
    pub min_fit_samples: usize,
    /// Slopes with a smaller magnitude never count as evolution
    #[serde(default = "default_slope_threshold")]
    pub slope_threshold: f64,
    /// Width of the slope confidence interval, in standard errors
    #[serde(default = "default_sigma_multiplier")]
    pub sigma_multiplier: f64,
}

fn default_min_fit_samples() -> usize {
    3
}

fn default_slope_threshold() -> f64 {
    0.1
}

fn default_sigma_multiplier() -> f64 {
    3.0
}

impl Default for RegressionSettings {
    fn default() -> Self {
        Self {
            min_fit_samples: default_min_fit_samples(),
            slope_threshold: default_slope_threshold(),
            sigma_multiplier: default_sigma_multiplier(),
        }
    }
}

/// Inverse-variance weighted mean of the sample offsets.
///
/// Returns `None` for an empty slice or when any combined error is zero or
/// not finite.
pub fn weighted_mean(samples: &[RescalingFactorSample]) -> Option<WeightedMean> {
    if samples.is_empty() || !samples.iter().all(has_usable_error) {
        return None;
    }

    let (sum_w, sum_wy) = samples.iter().fold((0.0, 0.0), |(sw, swy), s| {
        let w = s.weight();
        (sw + w, swy + w * s.magnitude_offset)
    });

    Some(WeightedMean {
        value: sum_wy / sum_w,
        error: 1.0 / sum_w.sqrt(),
    })
}

/// Chi-square of the constant model `offset = mean` (slope fixed at zero).
///
/// Needs at least two samples so that one degree of freedom remains.
pub fn fit_constant(samples: &[RescalingFactorSample], mean: &WeightedMean) -> Option<ConstantFit> {
    if samples.len() < 2 || !samples.iter().all(has_usable_error) {
        return None;
    }

    let observed: Vec<f64> = samples.iter().map(|s| s.magnitude_offset).collect();
    let expected = vec![mean.value; samples.len()];
    let sigma: Vec<f64> = samples.iter().map(|s| s.combined_error).collect();

    let chi_square = models::chi_square(&observed, &expected, &sigma);
    let reduced_chi_square = models::reduced_chi_square(&observed, &expected, &sigma, 1)?;
    let degrees_of_freedom = samples.len() - 1;

    Some(ConstantFit {
        chi_square,
        reduced_chi_square,
        degrees_of_freedom,
        p_value: survival(chi_square, degrees_of_freedom),
    })
}

/// Weighted least-squares line `offset = slope·log10(t) + intercept`.
///
/// Parameter errors are scaled by the reduced chi-square. Returns `None`
/// when the fit is singular: fewer than three samples, unusable errors, or
/// all samples at the same log-time.
pub fn fit_weighted_line(samples: &[RescalingFactorSample]) -> Option<LinearFit> {
    let n = samples.len();
    if n < 3 || !samples.iter().all(has_usable_error) {
        return None;
    }

    let mut s = 0.0;
    let mut sx = 0.0;
    let mut sy = 0.0;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for sample in samples {
        let w = sample.weight();
        let x = sample.log_time();
        let y = sample.magnitude_offset;
        s += w;
        sx += w * x;
        sy += w * y;
        sxx += w * x * x;
        sxy += w * x * y;
    }

    let delta = s * sxx - sx * sx;
    if !delta.is_finite() || delta <= f64::EPSILON * s * sxx {
        return None;
    }

    let slope = (s * sxy - sx * sy) / delta;
    let intercept = (sxx * sy - sx * sxy) / delta;

    let observed: Vec<f64> = samples.iter().map(|s| s.magnitude_offset).collect();
    let expected: Vec<f64> = samples
        .iter()
        .map(|s| slope * s.log_time() + intercept)
        .collect();
    let sigma: Vec<f64> = samples.iter().map(|s| s.combined_error).collect();

    let chi_square = models::chi_square(&observed, &expected, &sigma);
    let reduced_chi_square = models::reduced_chi_square(&observed, &expected, &sigma, 2)?;
    let degrees_of_freedom = n - 2;

    let slope_err = (s / delta * reduced_chi_square).sqrt();
    let intercept_err = (sxx / delta * reduced_chi_square).sqrt();

    if ![slope, intercept, slope_err, intercept_err].iter().all(|v| v.is_finite()) {
        return None;
    }

    let p_value = survival(chi_square, degrees_of_freedom);

    Some(LinearFit {
        slope,
        slope_err,
        intercept,
        intercept_err,
        chi_square,
        reduced_chi_square,
        degrees_of_freedom,
        p_value,
    })
}

/// Classify a fitted band.
///
/// Shallow slopes and slopes whose confidence interval contains zero are
/// not evolution.
pub fn classify(fit: &LinearFit, settings: &RegressionSettings) -> Classification {
    if fit.slope.abs() < settings.slope_threshold {
        return Classification::NoColorEvolution;
    }
    let (lower, upper) = fit.slope_interval(settings.sigma_multiplier);
    if lower <= 0.0 && 0.0 <= upper {
        Classification::NoColorEvolution
    } else {
        Classification::ColorEvolution
    }
}

fn survival(chi_square: f64, degrees_of_freedom: usize) -> Option<f64> {
    ChiSquared::new(degrees_of_freedom as f64)
        .ok()
        .map(|dist| dist.sf(chi_square))
}

fn has_usable_error(sample: &RescalingFactorSample) -> bool {
    sample.combined_error.is_finite() && sample.combined_error > 0.0
}

/// Regresses the rescaling factors of one band at a time.
#[derive(Debug, Clone, Default)]
pub struct BandRegressor {
    settings: RegressionSettings,
}

impl BandRegressor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: RegressionSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RegressionSettings {
        &self.settings
    }

    /// Build the regression result for `band`.
    ///
    /// # Arguments
    /// * `band` - Normalized band label
    /// * `occurrence_count` - Number of observations of the band
    /// * `samples` - The band's rescaling factor samples
    ///
    /// # Returns
    /// A result whose classification is always set; a singular fit degrades
    /// to `InsufficientData` instead of failing.
    pub fn regress(
        &self,
        band: &str,
        occurrence_count: usize,
        samples: &[RescalingFactorSample],
    ) -> BandRegressionResult {
        let mean = weighted_mean(samples);
        if samples.is_empty() {
            log::debug!("Band '{}' has no time-matched samples", band);
        } else if mean.is_none() {
            log::warn!("Band '{}' has samples with zero or non-finite errors", band);
        }

        let (fit, classification) = if samples.len() < self.settings.min_fit_samples {
            (None, Classification::InsufficientData)
        } else {
            match fit_weighted_line(samples) {
                Some(fit) => (Some(fit), classify(&fit, &self.settings)),
                None => {
                    log::warn!(
                        "Weighted fit for band '{}' is singular ({} samples); marking insufficient data",
                        band,
                        samples.len()
                    );
                    (None, Classification::InsufficientData)
                }
            }
        };

        if let Some(fit) = &fit {
            log::debug!(
                "Band '{}': slope {:.4} ± {:.4}, reduced chi2 {:.3} -> {}",
                band,
                fit.slope,
                fit.slope_err,
                fit.reduced_chi_square,
                classification
            );
        }

        let constant = mean.as_ref().and_then(|m| fit_constant(samples, m));

        BandRegressionResult {
            band: band.to_string(),
            occurrence_count,
            sample_count: samples.len(),
            fit,
            mean,
            constant,
            classification,
        }
    }
}
