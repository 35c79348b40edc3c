//! Light-curve validation with detailed error and warning reporting.
//!
//! Errors are values that cannot be analysed at all (non-finite numbers,
//! negative uncertainties). Rows the preprocessing pipeline will drop
//! (limiting magnitudes, non-positive times, flagged outliers) only produce
//! warnings.

use serde::{Deserialize, Serialize};

use crate::core::domain::Observation;

/// Per-row messages beyond this count are summarised in a single line.
const MAX_REPORTED: usize = 5;

/// Validation result with categorized issues and statistics.
///
/// Errors make `is_valid` false, while warnings are informational.
///
/// # Examples
///
/// ```
/// use grblc_rust::preprocessing::validator::ValidationResult;
///
/// let mut result = ValidationResult::new();
/// assert!(result.is_valid);
///
/// result.add_error("Non-finite magnitude at row 3".to_string());
/// assert!(!result.is_valid);
/// assert_eq!(result.errors.len(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub stats: ValidationStats,
}

/// Summary statistics computed during validation.
///
/// # Fields
///
/// * `total_rows` - Number of observations validated
/// * `band_count` - Number of distinct band labels
/// * `limiting_magnitudes` - Rows with `mag_err == 0`
/// * `non_positive_times` - Rows with `time_sec <= 0`
/// * `flagged_outliers` - Rows whose flag is neither `no` nor `ok`
/// * `non_finite_values` - Rows with a NaN or infinite number
/// * `negative_errors` - Rows with `mag_err < 0`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationStats {
    pub total_rows: usize,
    pub band_count: usize,
    pub limiting_magnitudes: usize,
    pub non_positive_times: usize,
    pub flagged_outliers: usize,
    pub non_finite_values: usize,
    pub negative_errors: usize,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            stats: ValidationStats::default(),
        }
    }

    /// Adds a critical error and marks the result as invalid.
    pub fn add_error(&mut self, error: String) {
        self.is_valid = false;
        self.errors.push(error);
    }

    /// Adds a non-critical warning without invalidating the result.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// `true` when an outlier flag marks the row as usable.
pub fn is_accepted_flag(flag: Option<&str>) -> bool {
    match flag {
        None => true,
        Some(f) => {
            let f = f.trim();
            f.is_empty() || f.eq_ignore_ascii_case("no") || f.eq_ignore_ascii_case("ok")
        }
    }
}

/// Validator for light-curve observations.
pub struct LightCurveValidator;

impl LightCurveValidator {
    /// Validates a slice of raw observations.
    ///
    /// # Arguments
    ///
    /// * `observations` - Rows as parsed from the input table
    ///
    /// # Returns
    ///
    /// `ValidationResult` containing all errors, warnings, and statistics.
    ///
    /// # Examples
    ///
    /// ```
    /// use grblc_rust::core::domain::Observation;
    /// use grblc_rust::preprocessing::validator::LightCurveValidator;
    ///
    /// let observations = vec![
    ///     Observation::new(100.0, 18.0, 0.1, "R"),
    ///     Observation::new(200.0, 19.5, 0.0, "R"),
    /// ];
    ///
    /// let result = LightCurveValidator::validate_observations(&observations);
    /// assert!(result.is_valid);
    /// assert_eq!(result.stats.limiting_magnitudes, 1);
    /// ```
    pub fn validate_observations(observations: &[Observation]) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.stats.total_rows = observations.len();

        let mut bands: Vec<&str> = Vec::new();
        for (row, obs) in observations.iter().enumerate() {
            if !bands.contains(&obs.band.as_str()) {
                bands.push(obs.band.as_str());
            }
            Self::validate_row(row, obs, &mut result);
        }
        result.stats.band_count = bands.len();

        Self::summarise(&mut result);

        if result.stats.limiting_magnitudes > 0 {
            result.add_warning(format!(
                "{} limiting magnitude(s) will be excluded",
                result.stats.limiting_magnitudes
            ));
        }
        if result.stats.non_positive_times > 0 {
            result.add_warning(format!(
                "{} row(s) with non-positive time will be excluded",
                result.stats.non_positive_times
            ));
        }
        if result.stats.flagged_outliers > 0 {
            result.add_warning(format!(
                "{} row(s) are flagged as outliers",
                result.stats.flagged_outliers
            ));
        }
        if result.stats.band_count == 1 {
            result.add_warning(format!(
                "All observations are in band '{}'; there is nothing to rescale",
                bands[0]
            ));
        }

        result
    }

    fn validate_row(row: usize, obs: &Observation, result: &mut ValidationResult) {
        if !(obs.time_sec.is_finite() && obs.magnitude.is_finite() && obs.magnitude_err.is_finite())
        {
            result.stats.non_finite_values += 1;
            if result.stats.non_finite_values <= MAX_REPORTED {
                result.add_error(format!(
                    "Row {} (band '{}') has a non-finite value: time_sec={}, mag={}, mag_err={}",
                    row, obs.band, obs.time_sec, obs.magnitude, obs.magnitude_err
                ));
            }
            return;
        }

        if obs.magnitude_err < 0.0 {
            result.stats.negative_errors += 1;
            if result.stats.negative_errors <= MAX_REPORTED {
                result.add_error(format!(
                    "Row {} (band '{}') has negative mag_err {}",
                    row, obs.band, obs.magnitude_err
                ));
            }
        } else if obs.is_limiting() {
            result.stats.limiting_magnitudes += 1;
        }

        if obs.time_sec <= 0.0 {
            result.stats.non_positive_times += 1;
        }

        if !is_accepted_flag(obs.quality_flag.as_deref()) {
            result.stats.flagged_outliers += 1;
        }
    }

    fn summarise(result: &mut ValidationResult) {
        if result.stats.non_finite_values > MAX_REPORTED {
            result.add_error(format!(
                "Total rows with non-finite values: {} (showing first {})",
                result.stats.non_finite_values, MAX_REPORTED
            ));
        }
        if result.stats.negative_errors > MAX_REPORTED {
            result.add_error(format!(
                "Total negative errors: {} (showing first {})",
                result.stats.negative_errors, MAX_REPORTED
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_clean_lightcurve() {
        let observations = vec![
            Observation::new(100.0, 18.0, 0.1, "R").with_flag("no"),
            Observation::new(200.0, 18.3, 0.1, "V").with_flag("ok"),
        ];

        let result = LightCurveValidator::validate_observations(&observations);
        assert!(result.is_valid);
        assert!(result.warnings.is_empty());
        assert_eq!(result.stats.total_rows, 2);
        assert_eq!(result.stats.band_count, 2);
    }

    #[test]
    fn test_validate_invalid_rows() {
        let observations = vec![
            Observation::new(100.0, f64::NAN, 0.1, "R"),
            Observation::new(200.0, 18.3, -0.1, "R"),
            Observation::new(-5.0, 18.3, 0.0, "R").with_flag("yes"),
        ];

        let result = LightCurveValidator::validate_observations(&observations);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.stats.non_finite_values, 1);
        assert_eq!(result.stats.negative_errors, 1);
        assert_eq!(result.stats.limiting_magnitudes, 1);
        assert_eq!(result.stats.non_positive_times, 1);
        assert_eq!(result.stats.flagged_outliers, 1);
        // limiting, time, outlier and single-band warnings
        assert_eq!(result.warnings.len(), 4);
    }

    #[test]
    fn test_many_errors_are_summarised() {
        let observations: Vec<Observation> = (0..8)
            .map(|i| Observation::new(100.0 + i as f64, 18.0, -1.0, "R"))
            .collect();

        let result = LightCurveValidator::validate_observations(&observations);
        assert_eq!(result.stats.negative_errors, 8);
        assert_eq!(result.errors.len(), MAX_REPORTED + 1);
    }

    #[test]
    fn test_accepted_flags() {
        assert!(is_accepted_flag(None));
        assert!(is_accepted_flag(Some("no")));
        assert!(is_accepted_flag(Some("OK")));
        assert!(is_accepted_flag(Some("")));
        assert!(!is_accepted_flag(Some("yes")));
        assert!(!is_accepted_flag(Some("outlier")));
    }
}
