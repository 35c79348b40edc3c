use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::path::PathBuf;

use super::anyhow_to_py;
use super::types::PyObservation;
use crate::parsing::Delimiter;
use crate::preprocessing::{PreprocessConfig, PreprocessPipeline, ValidationStats};

/// Python wrapper for ValidationResult
#[pyclass(name = "ValidationResult")]
#[derive(Clone)]
pub struct PyValidationResult {
    #[pyo3(get)]
    pub is_valid: bool,
    #[pyo3(get)]
    pub errors: Vec<String>,
    #[pyo3(get)]
    pub warnings: Vec<String>,
    stats: ValidationStats,
}

#[pymethods]
impl PyValidationResult {
    fn __repr__(&self) -> String {
        format!(
            "ValidationResult(valid={}, errors={}, warnings={})",
            self.is_valid,
            self.errors.len(),
            self.warnings.len()
        )
    }

    /// Get statistics as a Python dict
    fn get_stats(&self, py: Python<'_>) -> PyResult<Py<PyDict>> {
        let dict = PyDict::new(py);
        dict.set_item("total_rows", self.stats.total_rows)?;
        dict.set_item("band_count", self.stats.band_count)?;
        dict.set_item("limiting_magnitudes", self.stats.limiting_magnitudes)?;
        dict.set_item("non_positive_times", self.stats.non_positive_times)?;
        dict.set_item("flagged_outliers", self.stats.flagged_outliers)?;
        dict.set_item("non_finite_values", self.stats.non_finite_values)?;
        dict.set_item("negative_errors", self.stats.negative_errors)?;
        Ok(dict.into())
    }
}

fn pipeline_for(delimiter: &str, appx_bands: bool, remove_outliers: bool) -> PyResult<PreprocessPipeline> {
    let delimiter: Delimiter = delimiter
        .parse()
        .map_err(pyo3::exceptions::PyValueError::new_err)?;
    Ok(PreprocessPipeline::with_config(PreprocessConfig {
        validate: true,
        delimiter,
        appx_bands,
        remove_outliers,
    }))
}

/// Load a light-curve file into a list of observations
///
/// Limiting magnitudes and non-positive times are dropped, band aliases are
/// folded when `appx_bands` is set, and rows are sorted by time.
///
/// Args:
///     path: Path to the light-curve text file
///     delimiter: "tab", "whitespace" or "comma" (default: "tab")
///     appx_bands: Fold band aliases such as r' -> r (default: True)
///     remove_outliers: Keep only rows flagged "no"/"ok" (default: False)
///
/// Returns:
///     list[Observation]
///
/// Example:
///     >>> import grblc_rust
///     >>> obs = grblc_rust.load_observations("GRB050820A_magADS.txt")
///     >>> ref, counts = grblc_rust.select_reference_band(obs)
#[pyfunction]
#[pyo3(signature = (path, delimiter="tab", appx_bands=true, remove_outliers=false))]
pub fn load_observations(
    path: &str,
    delimiter: &str,
    appx_bands: bool,
    remove_outliers: bool,
) -> PyResult<Vec<PyObservation>> {
    let (observations, _) = preprocess_lightcurve(path, delimiter, appx_bands, remove_outliers)?;
    Ok(observations)
}

/// Load a light-curve file and also return its validation report
///
/// Returns:
///     tuple: (list[Observation], ValidationResult)
#[pyfunction]
#[pyo3(signature = (path, delimiter="tab", appx_bands=true, remove_outliers=false))]
pub fn preprocess_lightcurve(
    path: &str,
    delimiter: &str,
    appx_bands: bool,
    remove_outliers: bool,
) -> PyResult<(Vec<PyObservation>, PyValidationResult)> {
    let pipeline = pipeline_for(delimiter, appx_bands, remove_outliers)?;
    let result = pipeline
        .process(&PathBuf::from(path))
        .map_err(anyhow_to_py)?;

    let validation = PyValidationResult {
        is_valid: result.validation.is_valid,
        errors: result.validation.errors,
        warnings: result.validation.warnings,
        stats: result.validation.stats,
    };
    let observations = result
        .table
        .into_inner()
        .into_iter()
        .map(PyObservation::from)
        .collect();

    Ok((observations, validation))
}
