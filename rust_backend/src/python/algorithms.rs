use pyo3::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;

use super::colorevol_to_py;
use super::types::{to_table, PyBandRegression, PyObservation, PyRescaledObservation};
use crate::algorithms::{self, ColorEvolutionReport, FluxConverter, FluxSettings, ZeroPoint};

/// Python wrapper for ColorEvolutionReport
#[pyclass(name = "ColorEvolutionReport")]
#[derive(Clone)]
pub struct PyColorEvolutionReport {
    pub inner: ColorEvolutionReport,
}

#[pymethods]
impl PyColorEvolutionReport {
    #[getter]
    fn reference_band(&self) -> String {
        self.inner.reference_band.clone()
    }

    /// (band, count) pairs, most numerous first
    #[getter]
    fn band_counts(&self) -> Vec<(String, usize)> {
        self.inner
            .band_counts
            .iter()
            .map(|c| (c.band.clone(), c.count))
            .collect()
    }

    /// Regression results ordered by band
    #[getter]
    fn results(&self) -> Vec<PyBandRegression> {
        self.inner.results.values().map(PyBandRegression::from).collect()
    }

    fn result(&self, band: &str) -> Option<PyBandRegression> {
        self.inner.result(band).map(PyBandRegression::from)
    }

    /// Matched (observation_time, magnitude_offset, combined_error) triples of a band
    fn samples(&self, band: &str) -> Vec<(f64, f64, f64)> {
        self.inner
            .samples_for(band)
            .iter()
            .map(|s| (s.observation_time, s.magnitude_offset, s.combined_error))
            .collect()
    }

    fn no_evolution_bands(&self) -> Vec<String> {
        to_strings(self.inner.no_evolution_bands())
    }

    fn evolution_bands(&self) -> Vec<String> {
        to_strings(self.inner.evolution_bands())
    }

    fn insufficient_bands(&self) -> Vec<String> {
        to_strings(self.inner.insufficient_bands())
    }

    fn summary(&self) -> String {
        self.inner.slope_summary()
    }

    /// Write `<GRB>_colorevol.txt` into `directory` and return its path
    fn save(&self, directory: &str, grb: &str) -> PyResult<String> {
        let path = crate::io::save_color_evolution(&PathBuf::from(directory), grb, &self.inner)
            .map_err(super::anyhow_to_py)?;
        Ok(path.display().to_string())
    }

    fn to_json(&self) -> PyResult<String> {
        serde_json::to_string(&self.inner)
            .map_err(|e| pyo3::exceptions::PyRuntimeError::new_err(e.to_string()))
    }

    fn __repr__(&self) -> String {
        format!(
            "ColorEvolutionReport(reference='{}', bands={})",
            self.inner.reference_band,
            self.inner.results.len()
        )
    }
}

fn to_strings(bands: Vec<&str>) -> Vec<String> {
    bands.into_iter().map(str::to_string).collect()
}

/// Select the reference band
///
/// Args:
///     observations: list[Observation]
///     explicit_band: Band to use instead of the most numerous one
///
/// Returns:
///     tuple: (reference_band, list of (band, count))
#[pyfunction]
#[pyo3(signature = (observations, explicit_band=None))]
pub fn select_reference_band(
    observations: Vec<PyRef<'_, PyObservation>>,
    explicit_band: Option<&str>,
) -> PyResult<(String, Vec<(String, usize)>)> {
    let table = to_table(&observations);
    let (reference, counts) =
        algorithms::select_reference_band(&table, explicit_band).map_err(colorevol_to_py)?;
    Ok((reference, counts.into_iter().map(|c| (c.band, c.count)).collect()))
}

/// Match, fit and classify every non-reference band
///
/// Returns:
///     ColorEvolutionReport
#[pyfunction]
pub fn compute_color_evolution(
    observations: Vec<PyRef<'_, PyObservation>>,
    reference_band: &str,
) -> PyResult<PyColorEvolutionReport> {
    let table = to_table(&observations);
    let inner =
        algorithms::compute_color_evolution(&table, reference_band).map_err(colorevol_to_py)?;
    Ok(PyColorEvolutionReport { inner })
}

/// Rescale observations onto the reference band
///
/// Args:
///     observations: The list the report was computed from
///     reference_band: Reference band identifier
///     report: Result of compute_color_evolution
///     remove_duplicates: Keep one row per identical time (default: False)
///
/// Returns:
///     list[RescaledObservation]
#[pyfunction]
#[pyo3(signature = (observations, reference_band, report, remove_duplicates=false))]
pub fn rescale(
    observations: Vec<PyRef<'_, PyObservation>>,
    reference_band: &str,
    report: PyRef<'_, PyColorEvolutionReport>,
    remove_duplicates: bool,
) -> PyResult<Vec<PyRescaledObservation>> {
    let table = to_table(&observations);
    let rescaled = algorithms::rescale(&table, reference_band, &report.inner, remove_duplicates)
        .map_err(colorevol_to_py)?;
    Ok(rescaled
        .rows
        .into_iter()
        .map(PyRescaledObservation::from)
        .collect())
}

/// Evaluate the W07 afterglow model in log10 space
///
/// Args:
///     log_t: log10 time since trigger
///     log_T: log10 break time
///     log_F: log10 flux at the break
///     alpha: decay index
///     log_ta: log10 rise time
#[pyfunction]
#[pyo3(name = "w07")]
#[allow(non_snake_case)]
pub fn py_w07(log_t: f64, log_T: f64, log_F: f64, alpha: f64, log_ta: f64) -> f64 {
    algorithms::w07(log_t, log_T, log_F, alpha, log_ta)
}

/// Convert magnitudes to energy flux (erg/cm²/s)
///
/// Args:
///     observations: list[Observation]
///     zero_points: dict of band name -> (wavelength [Å], zero-point flux density);
///         must contain "R"
///     photon_index: Spectral photon index (beta = photon_index - 1)
///     photon_index_err: Error of the photon index
///     extinction: Galactic extinction A_b in magnitudes
///
/// Returns:
///     list[tuple]: (time_sec, flux, flux_err, band); unsupported bands are skipped
#[pyfunction]
#[pyo3(signature = (observations, zero_points, photon_index=0.0, photon_index_err=0.0, extinction=0.0))]
pub fn convert_to_flux(
    observations: Vec<PyRef<'_, PyObservation>>,
    zero_points: HashMap<String, (f64, f64)>,
    photon_index: f64,
    photon_index_err: f64,
    extinction: f64,
) -> PyResult<Vec<(f64, f64, f64, String)>> {
    let table = to_table(&observations);
    let converter = zero_points.into_iter().fold(
        FluxConverter::new(FluxSettings {
            photon_index,
            photon_index_err,
            extinction,
        }),
        |converter, (band, (wavelength, flux_density))| {
            converter.with_zero_point(band, ZeroPoint { wavelength, flux_density })
        },
    );

    let rows = converter.convert_table(&table).map_err(colorevol_to_py)?;
    Ok(rows
        .into_iter()
        .map(|r| (r.time_sec, r.flux, r.flux_err, r.band))
        .collect())
}
