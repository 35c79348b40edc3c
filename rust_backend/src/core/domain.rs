//! Domain models for GRB afterglow photometry and color-evolution diagnostics.
//!
//! This module provides the core data structures that flow through the
//! rescaling pipeline: photometric observations, the per-pair rescaling
//! factor samples, per-band regression results and the rescaled output rows.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single photometric point of an afterglow light curve.
///
/// Observations are immutable once ingested; every pipeline stage produces
/// new derived values instead of editing them.
///
/// # Fields
///
/// * `time_sec` - Time since trigger in seconds (must be > 0)
/// * `magnitude` - Observed magnitude
/// * `magnitude_err` - Magnitude uncertainty (0 marks a limiting magnitude)
/// * `band` - Band label as reported by the source
/// * `band_normalized` - Band label after alias canonicalization
/// * `system`, `telescope`, `extcorr`, `source` - Opaque passthrough metadata
/// * `quality_flag` - Optional outlier flag (`"no"`, `"ok"`, `"yes"`, ...)
///
/// # Examples
///
/// ```
/// use grblc_rust::core::domain::Observation;
///
/// let obs = Observation::new(3600.0, 19.2, 0.05, "R")
///     .with_metadata("Vega", "NOT", "n", "GCN 12345");
///
/// assert_eq!(obs.band_normalized, "R");
/// assert!(!obs.is_limiting());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub time_sec: f64,
    pub magnitude: f64,
    pub magnitude_err: f64,
    pub band: String,
    pub band_normalized: String,
    pub system: String,
    pub telescope: String,
    pub extcorr: String,
    pub source: String,
    pub quality_flag: Option<String>,
}

impl Observation {
    /// Creates an observation whose normalized band equals the raw label.
    pub fn new(time_sec: f64, magnitude: f64, magnitude_err: f64, band: impl Into<String>) -> Self {
        let band = band.into();
        Self {
            time_sec,
            magnitude,
            magnitude_err,
            band_normalized: band.clone(),
            band,
            system: String::new(),
            telescope: String::new(),
            extcorr: String::new(),
            source: String::new(),
            quality_flag: None,
        }
    }

    /// Replaces the normalized band label.
    pub fn with_normalized_band(mut self, band_normalized: impl Into<String>) -> Self {
        self.band_normalized = band_normalized.into();
        self
    }

    /// Attaches the passthrough metadata columns.
    pub fn with_metadata(
        mut self,
        system: impl Into<String>,
        telescope: impl Into<String>,
        extcorr: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        self.system = system.into();
        self.telescope = telescope.into();
        self.extcorr = extcorr.into();
        self.source = source.into();
        self
    }

    /// Attaches a quality flag.
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.quality_flag = Some(flag.into());
        self
    }

    /// Returns `true` for a limiting magnitude (non-detection).
    pub fn is_limiting(&self) -> bool {
        self.magnitude_err == 0.0
    }

    /// Closed interval `[mag - err, mag + err]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use grblc_rust::core::domain::Observation;
    ///
    /// let range = Observation::new(10.0, 18.0, 0.25, "R").magnitude_range();
    /// assert_eq!(range.lower, 17.75);
    /// assert_eq!(range.upper, 18.25);
    /// ```
    pub fn magnitude_range(&self) -> MagnitudeRange {
        MagnitudeRange::around(self.magnitude, self.magnitude_err)
    }
}

/// Closed magnitude interval used by the rescaler's overlap test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MagnitudeRange {
    pub lower: f64,
    pub upper: f64,
}

impl MagnitudeRange {
    pub fn around(value: f64, error: f64) -> Self {
        Self {
            lower: value - error,
            upper: value + error,
        }
    }

    /// Two closed intervals overlap iff neither lies strictly outside the other.
    ///
    /// # Examples
    ///
    /// ```
    /// use grblc_rust::core::domain::MagnitudeRange;
    ///
    /// let a = MagnitudeRange::around(18.0, 0.1);
    /// let touching = MagnitudeRange { lower: 18.1, upper: 18.5 };
    /// let apart = MagnitudeRange::around(19.0, 0.1);
    ///
    /// assert!(a.overlaps(&touching));
    /// assert!(!a.overlaps(&apart));
    /// ```
    pub fn overlaps(&self, other: &MagnitudeRange) -> bool {
        !(self.upper < other.lower || self.lower > other.upper)
    }
}

/// Ordered, read-only snapshot of observations for one pipeline run.
///
/// Row indices are stable for the lifetime of the table and are what
/// [`RescalingFactorSample`] refers to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationTable {
    observations: Vec<Observation>,
}

impl ObservationTable {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Observation> {
        self.observations.get(index)
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    pub fn into_inner(self) -> Vec<Observation> {
        self.observations
    }

    /// Rows whose normalized band equals `band`, with their table index.
    pub fn rows_in_band<'a>(
        &'a self,
        band: &'a str,
    ) -> impl Iterator<Item = (usize, &'a Observation)> + 'a {
        self.observations
            .iter()
            .enumerate()
            .filter(move |(_, obs)| obs.band_normalized == band)
    }

    /// Distinct normalized bands in first-encountered order.
    pub fn bands(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for obs in &self.observations {
            if !seen.contains(&obs.band_normalized.as_str()) {
                seen.push(obs.band_normalized.as_str());
            }
        }
        seen
    }

    /// `true` if at least one row is not a limiting magnitude.
    pub fn has_detections(&self) -> bool {
        self.observations.iter().any(|o| !o.is_limiting())
    }
}

impl FromIterator<Observation> for ObservationTable {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ObservationTable {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

/// Occurrence count of a normalized band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandCount {
    pub band: String,
    pub count: usize,
}

/// One time-matched (reference, observation) pair.
///
/// At most one sample exists per (band, observation); when several reference
/// points qualify, the nearest in fractional time wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescalingFactorSample {
    pub band: String,
    pub reference_index: usize,
    pub observation_index: usize,
    pub reference_time: f64,
    pub observation_time: f64,
    /// `|t_ref - t_obs| / t_ref`
    pub time_fraction_difference: f64,
    /// `mag_ref - mag_obs`
    pub magnitude_offset: f64,
    /// `sqrt(err_ref² + err_obs²)`
    pub combined_error: f64,
    pub reference_magnitude: f64,
    pub reference_magnitude_err: f64,
}

impl RescalingFactorSample {
    pub fn log_time(&self) -> f64 {
        self.observation_time.log10()
    }

    /// Inverse-variance weight `1 / combined_error²`.
    pub fn weight(&self) -> f64 {
        1.0 / (self.combined_error * self.combined_error)
    }

    pub fn reference_range(&self) -> MagnitudeRange {
        MagnitudeRange::around(self.reference_magnitude, self.reference_magnitude_err)
    }
}

/// Color-evolution verdict for a non-reference band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    NoColorEvolution,
    ColorEvolution,
    InsufficientData,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::NoColorEvolution => "no_color_evolution",
            Classification::ColorEvolution => "color_evolution",
            Classification::InsufficientData => "insufficient_data",
        }
    }

    /// Human-readable comment used in exported tables.
    pub fn comment(&self) -> &'static str {
        match self {
            Classification::NoColorEvolution => "no color evolution",
            Classification::ColorEvolution => "color evolution",
            Classification::InsufficientData => "insufficient data",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inverse-variance weighted straight-line fit of offset vs. log10(time).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub slope_err: f64,
    pub intercept: f64,
    pub intercept_err: f64,
    pub chi_square: f64,
    pub reduced_chi_square: f64,
    pub degrees_of_freedom: usize,
    /// Chi-square survival probability of the fit, when defined.
    pub p_value: Option<f64>,
}

impl LinearFit {
    /// Lower and upper bound of `slope ± k·slope_err`.
    pub fn slope_interval(&self, sigma_multiplier: f64) -> (f64, f64) {
        (
            self.slope - sigma_multiplier * self.slope_err,
            self.slope + sigma_multiplier * self.slope_err,
        )
    }
}

/// Inverse-variance weighted mean and its standard error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedMean {
    pub value: f64,
    pub error: f64,
}

/// Goodness of fit of the constant ("a = 0") model, offset = weighted mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstantFit {
    pub chi_square: f64,
    pub reduced_chi_square: f64,
    pub degrees_of_freedom: usize,
    pub p_value: Option<f64>,
}

/// Regression diagnostics for one non-reference band.
///
/// `fit` is `None` whenever no line was fitted (too few samples or a
/// degenerate fit); `mean` is `None` when the band has no usable samples.
/// `constant` needs at least two samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandRegressionResult {
    pub band: String,
    pub occurrence_count: usize,
    pub sample_count: usize,
    pub fit: Option<LinearFit>,
    pub mean: Option<WeightedMean>,
    #[serde(default)]
    pub constant: Option<ConstantFit>,
    pub classification: Classification,
}

impl BandRegressionResult {
    pub fn slope(&self) -> Option<f64> {
        self.fit.map(|f| f.slope)
    }

    pub fn slope_err(&self) -> Option<f64> {
        self.fit.map(|f| f.slope_err)
    }

    pub fn intercept(&self) -> Option<f64> {
        self.fit.map(|f| f.intercept)
    }

    pub fn intercept_err(&self) -> Option<f64> {
        self.fit.map(|f| f.intercept_err)
    }

    pub fn reduced_chi_square(&self) -> Option<f64> {
        self.fit.map(|f| f.reduced_chi_square)
    }

    pub fn weighted_mean(&self) -> Option<f64> {
        self.mean.map(|m| m.value)
    }

    pub fn weighted_mean_err(&self) -> Option<f64> {
        self.mean.map(|m| m.error)
    }

    pub fn constant_reduced_chi_square(&self) -> Option<f64> {
        self.constant.map(|c| c.reduced_chi_square)
    }

    /// `true` when the rescaler may shift this band's points.
    pub fn is_rescalable(&self) -> bool {
        self.classification == Classification::NoColorEvolution && self.mean.is_some()
    }
}

/// An observation together with its magnitude on the reference scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescaledObservation {
    pub observation: Observation,
    pub rescaled_magnitude: f64,
    pub rescaled_magnitude_err: f64,
    /// `false` when the point passed through unchanged.
    pub rescaled: bool,
}

impl RescaledObservation {
    pub fn passthrough(observation: Observation) -> Self {
        Self {
            rescaled_magnitude: observation.magnitude,
            rescaled_magnitude_err: observation.magnitude_err,
            observation,
            rescaled: false,
        }
    }

    pub fn shifted(observation: Observation, offset: WeightedMean) -> Self {
        Self {
            rescaled_magnitude: observation.magnitude + offset.value,
            rescaled_magnitude_err: offset.error,
            observation,
            rescaled: true,
        }
    }
}

/// Output of the rescaler: rows on the reference band's scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescaledTable {
    pub reference_band: String,
    pub rows: Vec<RescaledObservation>,
}

impl RescaledTable {
    /// Column name of the rescaled magnitudes, e.g. `mag_rescaled_to_R`.
    ///
    /// # Examples
    ///
    /// ```
    /// use grblc_rust::core::domain::RescaledTable;
    ///
    /// let table = RescaledTable { reference_band: "R".to_string(), rows: vec![] };
    /// assert_eq!(table.rescaled_column_name(), "mag_rescaled_to_R");
    /// ```
    pub fn rescaled_column_name(&self) -> String {
        format!("mag_rescaled_to_{}", self.reference_band)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rescaled_count(&self) -> usize {
        self.rows.iter().filter(|r| r.rescaled).count()
    }
}
