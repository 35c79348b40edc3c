//! Pipeline configuration file support.
//!
//! This module reads the TOML configuration that drives loading, color
//! evolution analysis, rescaling and export. Every field has a default, so
//! an empty file (or no file at all) gives the standard analysis.
//!
//! ```toml
//! [input]
//! delimiter = "tab"
//! appx_bands = true
//!
//! [reference]
//! band = "R"
//!
//! [regression]
//! slope_threshold = 0.1
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::algorithms::matching::MatchSettings;
use crate::algorithms::regression::RegressionSettings;
use crate::core::error::{ColorEvolError, Result};
use crate::parsing::Delimiter;

/// File name looked up by [`PipelineConfig::from_default_location`].
pub const CONFIG_FILE_NAME: &str = "grblc.toml";

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub input: InputSettings,
    #[serde(default)]
    pub reference: ReferenceSettings,
    #[serde(default)]
    pub matching: MatchSettings,
    #[serde(default)]
    pub regression: RegressionSettings,
    #[serde(default)]
    pub rescale: RescaleSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Light-curve reading and preprocessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSettings {
    #[serde(default)]
    pub delimiter: Delimiter,
    /// Fold band aliases onto their parent band
    #[serde(default = "default_true")]
    pub appx_bands: bool,
    /// Drop rows whose flag is not `no`/`ok`
    #[serde(default)]
    pub remove_outliers: bool,
}

/// Reference band choice; `None` picks the most numerous band.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSettings {
    #[serde(default)]
    pub band: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RescaleSettings {
    #[serde(default)]
    pub remove_duplicates: bool,
}

/// Where and under which name the artifacts are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
    /// GRB name used in file names; derived from the input file stem when unset
    #[serde(default)]
    pub grb_name: Option<String>,
    #[serde(default = "default_true")]
    pub save: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_true() -> bool {
    true
}

fn default_output_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::default(),
            appx_bands: true,
            remove_outliers: false,
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            grb_name: None,
            save: true,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl PipelineConfig {
    /// Parse configuration from TOML text.
    ///
    /// Type errors name the offending key, e.g. `regression.min_fit_samples`.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let deserializer = toml::Deserializer::new(content);
        let config: PipelineConfig = serde_path_to_error::deserialize(deserializer).map_err(|e| {
            ColorEvolError::Config(format!("Invalid value at '{}': {}", e.path(), e.inner()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(PipelineConfig)` if the file was read, parsed and validated
    /// * `Err(ColorEvolError::Config)` otherwise
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ColorEvolError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `grblc.toml` in:
    /// 1. Current directory
    /// 2. `rust_backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self> {
        let search_paths = [
            PathBuf::from(CONFIG_FILE_NAME),
            PathBuf::from("rust_backend").join(CONFIG_FILE_NAME),
            PathBuf::from("..").join(CONFIG_FILE_NAME),
        ];

        for path in search_paths {
            if path.exists() {
                log::debug!("Using configuration {}", path.display());
                return Self::from_file(&path);
            }
        }

        Err(ColorEvolError::Config(format!(
            "No {} found in standard locations",
            CONFIG_FILE_NAME
        )))
    }

    /// [`from_default_location`](Self::from_default_location), falling back
    /// to defaults when no file exists. Parse errors still fail.
    pub fn from_default_location_or_default() -> Result<Self> {
        match Self::from_default_location() {
            Ok(config) => Ok(config),
            Err(ColorEvolError::Config(msg)) if msg.starts_with("No ") => {
                log::debug!("{}; using defaults", msg);
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Reject thresholds that would make the analysis meaningless.
    pub fn validate(&self) -> Result<()> {
        if !(self.matching.max_time_fraction > 0.0) {
            return Err(ColorEvolError::Config(format!(
                "matching.max_time_fraction must be > 0, got {}",
                self.matching.max_time_fraction
            )));
        }
        if self.regression.min_fit_samples < 3 {
            return Err(ColorEvolError::Config(format!(
                "regression.min_fit_samples must be >= 3, got {}",
                self.regression.min_fit_samples
            )));
        }
        if !(self.regression.slope_threshold > 0.0) {
            return Err(ColorEvolError::Config(format!(
                "regression.slope_threshold must be > 0, got {}",
                self.regression.slope_threshold
            )));
        }
        if !(self.regression.sigma_multiplier > 0.0) {
            return Err(ColorEvolError::Config(format!(
                "regression.sigma_multiplier must be > 0, got {}",
                self.regression.sigma_multiplier
            )));
        }
        if let Some(band) = &self.reference.band {
            if band.trim().is_empty() {
                return Err(ColorEvolError::Config(
                    "reference.band must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_file_gives_defaults() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.matching.max_time_fraction, 0.025);
        assert_eq!(config.regression.min_fit_samples, 3);
        assert!(config.input.appx_bands);
        assert!(config.output.save);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn sections_override_defaults() {
        let content = r#"
            [input]
            delimiter = "comma"
            remove_outliers = true

            [reference]
            band = "Rc"

            [matching]
            max_time_fraction = 0.05

            [regression]
            sigma_multiplier = 2.0

            [rescale]
            remove_duplicates = true

            [output]
            directory = "out"
            grb_name = "GRB050820A"
        "#;
        let config = PipelineConfig::from_toml_str(content).unwrap();

        assert_eq!(config.input.delimiter, Delimiter::Comma);
        assert!(config.input.remove_outliers);
        assert!(config.input.appx_bands);
        assert_eq!(config.reference.band.as_deref(), Some("Rc"));
        assert_eq!(config.matching.max_time_fraction, 0.05);
        assert_eq!(config.regression.sigma_multiplier, 2.0);
        assert_eq!(config.regression.slope_threshold, 0.1);
        assert!(config.rescale.remove_duplicates);
        assert_eq!(config.output.directory, PathBuf::from("out"));
        assert_eq!(config.output.grb_name.as_deref(), Some("GRB050820A"));
    }

    #[test]
    fn type_errors_report_the_key_path() {
        let err = PipelineConfig::from_toml_str("[regression]\nmin_fit_samples = \"three\"\n")
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("regression.min_fit_samples"), "{}", message);
    }

    #[test]
    fn validation_rejects_bad_thresholds() {
        assert!(PipelineConfig::from_toml_str("[matching]\nmax_time_fraction = 0.0\n").is_err());
        assert!(PipelineConfig::from_toml_str("[regression]\nmin_fit_samples = 2\n").is_err());
        assert!(PipelineConfig::from_toml_str("[regression]\nslope_threshold = -0.1\n").is_err());
        assert!(PipelineConfig::from_toml_str("[reference]\nband = \" \"\n").is_err());
    }

    #[test]
    fn from_file_reads_toml() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[rescale]\nremove_duplicates = true\n").unwrap();

        let config = PipelineConfig::from_file(file.path()).unwrap();
        assert!(config.rescale.remove_duplicates);

        let err = PipelineConfig::from_file("/nonexistent/grblc.toml").unwrap_err();
        assert!(matches!(err, ColorEvolError::Config(_)));
    }
}
