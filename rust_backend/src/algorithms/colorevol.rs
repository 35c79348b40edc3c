//! Color-evolution analysis: matcher and regressor composed per band, and
//! the configurable end-to-end pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

use super::bands::{count_bands, select_reference_band_with};
use super::matching::{MatchSettings, PairwiseMatcher};
use super::regression::{BandRegressor, RegressionSettings};
use super::rescale::rescale;
use crate::config::PipelineConfig;
use crate::core::domain::{
    BandCount, BandRegressionResult, Classification, ObservationTable, RescaledTable,
    RescalingFactorSample,
};
use crate::core::error::{ColorEvolError, Result};

/// Per-band samples and regression results for one reference band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorEvolutionReport {
    pub reference_band: String,
    /// Occurrences of every band, most numerous first
    pub band_counts: Vec<BandCount>,
    pub samples: BTreeMap<String, Vec<RescalingFactorSample>>,
    pub results: BTreeMap<String, BandRegressionResult>,
}

impl ColorEvolutionReport {
    /// A report with no non-reference bands.
    pub fn empty(reference_band: impl Into<String>) -> Self {
        Self {
            reference_band: reference_band.into(),
            band_counts: Vec::new(),
            samples: BTreeMap::new(),
            results: BTreeMap::new(),
        }
    }

    pub fn result(&self, band: &str) -> Option<&BandRegressionResult> {
        self.results.get(band)
    }

    pub fn samples_for(&self, band: &str) -> &[RescalingFactorSample] {
        self.samples.get(band).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn occurrence_count(&self, band: &str) -> Option<usize> {
        self.band_counts
            .iter()
            .find(|c| c.band == band)
            .map(|c| c.count)
    }

    fn bands_with(&self, classification: Classification) -> Vec<&str> {
        self.results
            .values()
            .filter(|r| r.classification == classification)
            .map(|r| r.band.as_str())
            .collect()
    }

    pub fn no_evolution_bands(&self) -> Vec<&str> {
        self.bands_with(Classification::NoColorEvolution)
    }

    pub fn evolution_bands(&self) -> Vec<&str> {
        self.bands_with(Classification::ColorEvolution)
    }

    pub fn insufficient_bands(&self) -> Vec<&str> {
        self.bands_with(Classification::InsufficientData)
    }

    /// One line per band with slope, mean offset and verdict.
    pub fn slope_summary(&self) -> String {
        let mut out = format!("Color evolution relative to '{}':", self.reference_band);
        for result in self.results.values() {
            let slope = match result.fit {
                Some(fit) => format!("{:+.4} ± {:.4}", fit.slope, fit.slope_err),
                None => "n/a".to_string(),
            };
            let mean = match result.mean {
                Some(mean) => format!("{:+.4} ± {:.4}", mean.value, mean.error),
                None => "n/a".to_string(),
            };
            let _ = write!(
                out,
                "\n  {:<10} n={:<4} samples={:<4} slope {:<20} mean {:<20} {}",
                result.band,
                result.occurrence_count,
                result.sample_count,
                slope,
                mean,
                result.classification.comment()
            );
        }
        out
    }
}

/// Runs the pairwise matcher and the per-band regressor.
#[derive(Debug, Clone, Default)]
pub struct ColorEvolutionAnalyzer {
    matcher: PairwiseMatcher,
    regressor: BandRegressor,
}

impl ColorEvolutionAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(matching: MatchSettings, regression: RegressionSettings) -> Self {
        Self {
            matcher: PairwiseMatcher::with_settings(matching),
            regressor: BandRegressor::with_settings(regression),
        }
    }

    /// Compute samples and regression results for every non-reference band.
    ///
    /// # Errors
    /// * `InsufficientData` with fewer than two observations, only limiting
    ///   magnitudes, or no band other than the reference
    /// * `UnknownBand` if `reference_band` is absent from the table
    /// * `InvalidObservation` from the matcher
    pub fn analyze(
        &self,
        table: &ObservationTable,
        reference_band: &str,
    ) -> Result<ColorEvolutionReport> {
        if table.len() < 2 {
            return Err(ColorEvolError::InsufficientData(format!(
                "{} observation(s); at least two are needed",
                table.len()
            )));
        }

        if !table.has_detections() {
            return Err(ColorEvolError::InsufficientData(
                "only limiting magnitudes present".to_string(),
            ));
        }

        let band_counts = count_bands(table);
        if !band_counts.iter().any(|c| c.band == reference_band) {
            return Err(ColorEvolError::UnknownBand(reference_band.to_string()));
        }
        if band_counts.len() < 2 {
            return Err(ColorEvolError::InsufficientData(format!(
                "all observations are in band '{}'; nothing to rescale",
                reference_band
            )));
        }

        let samples = self.matcher.match_all(table, reference_band)?;

        let results: BTreeMap<String, BandRegressionResult> = band_counts
            .iter()
            .filter(|c| c.band != reference_band)
            .map(|c| {
                let band_samples = samples.get(&c.band).map(Vec::as_slice).unwrap_or(&[]);
                (
                    c.band.clone(),
                    self.regressor.regress(&c.band, c.count, band_samples),
                )
            })
            .collect();

        let report = ColorEvolutionReport {
            reference_band: reference_band.to_string(),
            band_counts,
            samples,
            results,
        };

        log::info!(
            "Color evolution vs '{}': {} without, {} with, {} insufficient",
            reference_band,
            report.no_evolution_bands().len(),
            report.evolution_bands().len(),
            report.insufficient_bands().len()
        );

        Ok(report)
    }
}

/// Compute color evolution with default thresholds.
pub fn compute_color_evolution(
    table: &ObservationTable,
    reference_band: &str,
) -> Result<ColorEvolutionReport> {
    ColorEvolutionAnalyzer::new().analyze(table, reference_band)
}

/// Result of a full pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub reference_band: String,
    pub report: ColorEvolutionReport,
    pub rescaled: RescaledTable,
}

/// Reference selection, color-evolution analysis and rescaling driven by a
/// [`PipelineConfig`].
#[derive(Debug, Clone, Default)]
pub struct ColorEvolutionPipeline {
    config: PipelineConfig,
}

impl ColorEvolutionPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run all three stages on a preprocessed table.
    pub fn run(&self, table: &ObservationTable) -> Result<PipelineOutput> {
        let (reference_band, _) = select_reference_band_with(
            table,
            self.config.reference.band.as_deref(),
            self.config.input.appx_bands,
        )?;

        let analyzer =
            ColorEvolutionAnalyzer::with_settings(self.config.matching, self.config.regression);
        let report = analyzer.analyze(table, &reference_band)?;
        log::info!("{}", report.slope_summary());

        let rescaled = rescale(
            table,
            &reference_band,
            &report,
            self.config.rescale.remove_duplicates,
        )?;

        Ok(PipelineOutput {
            reference_band,
            report,
            rescaled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::Observation;

    fn obs(t: f64, mag: f64, err: f64, band: &str) -> Observation {
        Observation::new(t, mag, err, band)
    }

    #[test]
    fn every_non_reference_band_is_classified() {
        let table: ObservationTable = vec![
            obs(100.0, 18.0, 0.1, "R"),
            obs(1000.0, 19.0, 0.1, "R"),
            obs(101.0, 18.3, 0.1, "V"),
            obs(5000.0, 20.0, 0.1, "B"),
        ]
        .into_iter()
        .collect();

        let report = compute_color_evolution(&table, "R").unwrap();
        let bands: Vec<&str> = report.results.keys().map(String::as_str).collect();
        assert_eq!(bands, vec!["B", "V"]);
        assert_eq!(report.insufficient_bands(), vec!["B", "V"]);
        assert!(report.samples_for("B").is_empty());
        assert_eq!(report.samples_for("V").len(), 1);
        assert_eq!(report.occurrence_count("R"), Some(2));
        assert!(!report.results.contains_key("R"));
    }

    #[test]
    fn too_few_observations() {
        let table: ObservationTable = vec![obs(100.0, 18.0, 0.1, "R")].into_iter().collect();
        let err = compute_color_evolution(&table, "R").unwrap_err();
        assert!(matches!(err, ColorEvolError::InsufficientData(_)));
    }

    #[test]
    fn single_band_is_insufficient() {
        let table: ObservationTable = vec![obs(100.0, 18.0, 0.1, "R"), obs(200.0, 18.2, 0.1, "R")]
            .into_iter()
            .collect();
        let err = compute_color_evolution(&table, "R").unwrap_err();
        assert!(matches!(err, ColorEvolError::InsufficientData(_)));
    }

    #[test]
    fn only_limiting_magnitudes_are_insufficient() {
        let table: ObservationTable = vec![obs(100.0, 21.0, 0.0, "R"), obs(200.0, 21.2, 0.0, "V")]
            .into_iter()
            .collect();
        let err = compute_color_evolution(&table, "R").unwrap_err();
        assert!(matches!(err, ColorEvolError::InsufficientData(msg) if msg.contains("limiting")));
    }

    #[test]
    fn pipeline_resolves_aliases_only_with_band_approximation() {
        let table: ObservationTable = [100.0, 1000.0, 10000.0]
            .iter()
            .flat_map(|&t| {
                [
                    obs(t, 18.0, 0.1, "Ks").with_normalized_band("K"),
                    obs(t * 1.01, 18.4, 0.1, "R"),
                ]
            })
            .collect();

        let mut config = PipelineConfig::default();
        config.reference.band = Some("Kp".to_string());
        let output = ColorEvolutionPipeline::with_config(config.clone()).run(&table);
        assert_eq!(output.unwrap().reference_band, "K");

        config.input.appx_bands = false;
        let err = ColorEvolutionPipeline::with_config(config).run(&table).unwrap_err();
        assert!(matches!(err, ColorEvolError::UnknownBand(_)));
    }

    #[test]
    fn missing_reference_is_unknown() {
        let table: ObservationTable = vec![obs(100.0, 18.0, 0.1, "R"), obs(200.0, 18.2, 0.1, "V")]
            .into_iter()
            .collect();
        let err = compute_color_evolution(&table, "K").unwrap_err();
        assert!(matches!(err, ColorEvolError::UnknownBand(_)));
    }

    #[test]
    fn summary_lists_each_band() {
        let table: ObservationTable = vec![
            obs(100.0, 18.0, 0.1, "R"),
            obs(101.0, 18.3, 0.1, "V"),
            obs(400.0, 19.0, 0.1, "B"),
        ]
        .into_iter()
        .collect();
        let report = compute_color_evolution(&table, "R").unwrap();
        let summary = report.slope_summary();

        assert!(summary.starts_with("Color evolution relative to 'R'"));
        assert_eq!(summary.lines().count(), 3);
        assert!(summary.contains("insufficient data"));
    }

    #[test]
    fn report_serializes_to_json() {
        let report = ColorEvolutionReport::empty("R");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["reference_band"], "R");
        assert!(json["results"].as_object().unwrap().is_empty());
    }
}
