use anyhow::{Context, Result};
use polars::prelude::*;
use std::path::Path;

use crate::config::InputSettings;
use crate::core::domain::{Observation, ObservationTable};
use crate::core::error::ColorEvolError;
use crate::parsing::{table_parser, BandApproximator, Delimiter};
use crate::preprocessing::validator::{is_accepted_flag, LightCurveValidator, ValidationResult};

/// Result of preprocessing operation
#[derive(Debug)]
pub struct PreprocessResult {
    pub table: ObservationTable,
    pub dataframe: DataFrame,
    pub validation: ValidationResult,
    pub total_rows: usize,
    pub dropped_limiting: usize,
    pub dropped_non_positive: usize,
    pub dropped_outliers: usize,
}

/// Configuration for the preprocessing pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessConfig {
    pub validate: bool,
    pub delimiter: Delimiter,
    pub appx_bands: bool,
    pub remove_outliers: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            validate: true,
            delimiter: Delimiter::default(),
            appx_bands: true,
            remove_outliers: false,
        }
    }
}

impl From<&InputSettings> for PreprocessConfig {
    fn from(settings: &InputSettings) -> Self {
        Self {
            validate: true,
            delimiter: settings.delimiter,
            appx_bands: settings.appx_bands,
            remove_outliers: settings.remove_outliers,
        }
    }
}

/// Main preprocessing pipeline
pub struct PreprocessPipeline {
    config: PreprocessConfig,
}

impl PreprocessPipeline {
    /// Create a new pipeline with default configuration
    pub fn new() -> Self {
        Self {
            config: PreprocessConfig::default(),
        }
    }

    /// Create a pipeline with custom configuration
    pub fn with_config(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Process a light-curve file into an analysis-ready table
    ///
    /// # Arguments
    /// * `path` - Path to the light-curve text file
    ///
    /// # Returns
    /// PreprocessResult with the table, its DataFrame view and validation info
    pub fn process(&self, path: &Path) -> Result<PreprocessResult> {
        let df = table_parser::parse_lightcurve_table(path, self.config.delimiter)?;
        let observations = table_parser::dataframe_to_observations(&df)
            .with_context(|| format!("Failed to read observations from {}", path.display()))?;
        self.process_observations(observations)
            .with_context(|| format!("Failed to preprocess {}", path.display()))
    }

    /// Process light-curve text (useful for testing or API usage)
    pub fn process_str(&self, content: &str) -> Result<PreprocessResult> {
        let df = table_parser::parse_lightcurve_str(content, self.config.delimiter)?;
        let observations = table_parser::dataframe_to_observations(&df)
            .context("Failed to read observations from table")?;
        self.process_observations(observations)
    }

    /// Validate, filter, canonicalize and sort raw observations
    pub fn process_observations(&self, observations: Vec<Observation>) -> Result<PreprocessResult> {
        let total_rows = observations.len();
        if total_rows == 0 {
            return Err(ColorEvolError::InsufficientData("light curve has no rows".to_string()).into());
        }

        // Step 1: Validate
        let validation = if self.config.validate {
            LightCurveValidator::validate_observations(&observations)
        } else {
            ValidationResult::new()
        };
        for warning in &validation.warnings {
            log::warn!("{}", warning);
        }
        if !validation.is_valid {
            return Err(ColorEvolError::InvalidObservation(validation.errors.join("; ")).into());
        }

        // Step 2: Drop limiting magnitudes
        let mut rows: Vec<Observation> = observations
            .into_iter()
            .filter(|o| !o.is_limiting())
            .collect();
        let dropped_limiting = total_rows - rows.len();
        if rows.is_empty() {
            return Err(ColorEvolError::InsufficientData(
                "only limiting magnitudes present".to_string(),
            )
            .into());
        }

        // Step 3: Drop non-positive times
        let before = rows.len();
        rows.retain(|o| o.time_sec > 0.0);
        let dropped_non_positive = before - rows.len();
        if dropped_non_positive > 0 {
            log::warn!("Excluded {} row(s) with non-positive time", dropped_non_positive);
        }

        // Step 4: Outliers (if requested)
        let before = rows.len();
        if self.config.remove_outliers {
            rows.retain(|o| is_accepted_flag(o.quality_flag.as_deref()));
        }
        let dropped_outliers = before - rows.len();

        if rows.is_empty() {
            return Err(ColorEvolError::InsufficientData(
                "no observations left after filtering".to_string(),
            )
            .into());
        }

        // Step 5: Band approximation
        if self.config.appx_bands {
            rows = rows
                .into_iter()
                .map(|o| {
                    let normalized = BandApproximator::approximate(&o.band);
                    o.with_normalized_band(normalized)
                })
                .collect();
        }

        // Step 6: Sort by time (stable)
        rows.sort_by(|a, b| a.time_sec.total_cmp(&b.time_sec));

        let dataframe = table_parser::observations_to_dataframe(&rows)
            .context("Failed to convert observations to DataFrame")?;

        log::debug!(
            "Preprocessed {} of {} rows ({} limiting, {} non-positive time, {} outliers dropped)",
            rows.len(),
            total_rows,
            dropped_limiting,
            dropped_non_positive,
            dropped_outliers
        );

        Ok(PreprocessResult {
            table: ObservationTable::new(rows),
            dataframe,
            validation,
            total_rows,
            dropped_limiting,
            dropped_non_positive,
            dropped_outliers,
        })
    }
}

impl Default for PreprocessPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to preprocess a light-curve file
pub fn preprocess_lightcurve(path: &Path, settings: &InputSettings) -> Result<PreprocessResult> {
    PreprocessPipeline::with_config(PreprocessConfig::from(settings)).process(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIGHTCURVE: &str = "time_sec\tmag\tmag_err\tband\tsystem\ttelescope\textcorr\tsource\tflag\n\
        3000\t19.0\t0.1\tR\tVega\tNOT\ty\tGCN\tno\n\
        1000\t18.0\t0.1\tr'\tAB\tSDSS\ty\tGCN\tno\n\
        -50\t16.0\t0.1\tR\tVega\tNOT\ty\tGCN\tno\n\
        2000\t20.5\t0\tR\tVega\tNOT\ty\tGCN\tno\n\
        1500\t18.4\t0.2\tKs\tVega\tREM\tn\tpaper\tyes\n";

    fn tab_pipeline(remove_outliers: bool) -> PreprocessPipeline {
        PreprocessPipeline::with_config(PreprocessConfig {
            delimiter: Delimiter::Tab,
            remove_outliers,
            ..PreprocessConfig::default()
        })
    }

    #[test]
    fn test_process_str_filters_and_sorts() {
        let result = tab_pipeline(false).process_str(LIGHTCURVE).unwrap();

        assert_eq!(result.total_rows, 5);
        assert_eq!(result.dropped_limiting, 1);
        assert_eq!(result.dropped_non_positive, 1);
        assert_eq!(result.dropped_outliers, 0);
        assert_eq!(result.table.len(), 3);
        assert_eq!(result.dataframe.height(), 3);

        let times: Vec<f64> = result.table.iter().map(|o| o.time_sec).collect();
        assert_eq!(times, vec![1000.0, 1500.0, 3000.0]);

        let first = result.table.get(0).unwrap();
        assert_eq!(first.band, "r'");
        assert_eq!(first.band_normalized, "r");
        assert_eq!(result.table.get(1).unwrap().band_normalized, "K");
    }

    #[test]
    fn test_remove_outliers() {
        let result = tab_pipeline(true).process_str(LIGHTCURVE).unwrap();
        assert_eq!(result.dropped_outliers, 1);
        assert!(result.table.iter().all(|o| o.band != "Ks"));
    }

    #[test]
    fn test_without_band_approximation() {
        let pipeline = PreprocessPipeline::with_config(PreprocessConfig {
            delimiter: Delimiter::Tab,
            appx_bands: false,
            ..PreprocessConfig::default()
        });
        let result = pipeline.process_str(LIGHTCURVE).unwrap();
        assert!(result.table.iter().all(|o| o.band == o.band_normalized));
    }

    #[test]
    fn test_only_limiting_magnitudes() {
        let content = "time_sec\tmag\tmag_err\tband\n100\t20.0\t0\tR\n200\t20.5\t0\tV\n";
        let err = tab_pipeline(false).process_str(content).unwrap_err();
        let kind = err.downcast_ref::<ColorEvolError>().unwrap();
        assert!(matches!(kind, ColorEvolError::InsufficientData(msg) if msg.contains("limiting")));
    }

    #[test]
    fn test_invalid_rows_fail() {
        let observations = vec![
            Observation::new(100.0, 18.0, -0.1, "R"),
            Observation::new(200.0, 18.0, 0.1, "R"),
        ];
        let err = PreprocessPipeline::new()
            .process_observations(observations)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ColorEvolError>(),
            Some(ColorEvolError::InvalidObservation(_))
        ));
    }

    #[test]
    fn test_sort_is_stable_for_equal_times() {
        let observations = vec![
            Observation::new(200.0, 18.0, 0.1, "V"),
            Observation::new(100.0, 18.0, 0.1, "B"),
            Observation::new(200.0, 18.0, 0.1, "R"),
        ];
        let result = PreprocessPipeline::new()
            .process_observations(observations)
            .unwrap();
        let bands: Vec<&str> = result.table.iter().map(|o| o.band.as_str()).collect();
        assert_eq!(bands, vec!["B", "V", "R"]);
    }
}
