use pyo3::prelude::*;

use crate::core::domain::{
    BandRegressionResult, Observation, ObservationTable, RescaledObservation,
};

/// Python wrapper for Observation
#[pyclass(name = "Observation")]
#[derive(Clone)]
pub struct PyObservation {
    pub inner: Observation,
}

#[pymethods]
impl PyObservation {
    #[new]
    #[pyo3(signature = (time_sec, mag, mag_err, band, system="", telescope="", extcorr="", source="", flag=None, band_normalized=None))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        time_sec: f64,
        mag: f64,
        mag_err: f64,
        band: &str,
        system: &str,
        telescope: &str,
        extcorr: &str,
        source: &str,
        flag: Option<&str>,
        band_normalized: Option<&str>,
    ) -> Self {
        let mut obs = Observation::new(time_sec, mag, mag_err, band)
            .with_metadata(system, telescope, extcorr, source);
        if let Some(flag) = flag {
            obs = obs.with_flag(flag);
        }
        if let Some(normalized) = band_normalized {
            obs = obs.with_normalized_band(normalized);
        }
        Self { inner: obs }
    }

    #[getter]
    fn time_sec(&self) -> f64 {
        self.inner.time_sec
    }

    #[getter]
    fn mag(&self) -> f64 {
        self.inner.magnitude
    }

    #[getter]
    fn mag_err(&self) -> f64 {
        self.inner.magnitude_err
    }

    #[getter]
    fn band(&self) -> String {
        self.inner.band.clone()
    }

    #[getter]
    fn band_normalized(&self) -> String {
        self.inner.band_normalized.clone()
    }

    #[getter]
    fn system(&self) -> String {
        self.inner.system.clone()
    }

    #[getter]
    fn telescope(&self) -> String {
        self.inner.telescope.clone()
    }

    #[getter]
    fn extcorr(&self) -> String {
        self.inner.extcorr.clone()
    }

    #[getter]
    fn source(&self) -> String {
        self.inner.source.clone()
    }

    #[getter]
    fn flag(&self) -> Option<String> {
        self.inner.quality_flag.clone()
    }

    fn __repr__(&self) -> String {
        format!(
            "Observation(time_sec={}, mag={:.3}, mag_err={:.3}, band='{}')",
            self.inner.time_sec, self.inner.magnitude, self.inner.magnitude_err, self.inner.band
        )
    }
}

impl From<Observation> for PyObservation {
    fn from(inner: Observation) -> Self {
        Self { inner }
    }
}

/// Build a table from Python-side observations, keeping their order.
pub fn to_table(observations: &[PyRef<'_, PyObservation>]) -> ObservationTable {
    observations.iter().map(|o| o.inner.clone()).collect()
}

/// Python wrapper for BandRegressionResult
#[pyclass(name = "BandRegression")]
#[derive(Clone)]
pub struct PyBandRegression {
    #[pyo3(get)]
    pub band: String,
    #[pyo3(get)]
    pub occurrence_count: usize,
    #[pyo3(get)]
    pub sample_count: usize,
    #[pyo3(get)]
    pub slope: Option<f64>,
    #[pyo3(get)]
    pub slope_err: Option<f64>,
    #[pyo3(get)]
    pub intercept: Option<f64>,
    #[pyo3(get)]
    pub intercept_err: Option<f64>,
    #[pyo3(get)]
    pub reduced_chi_square: Option<f64>,
    #[pyo3(get)]
    pub p_value: Option<f64>,
    #[pyo3(get)]
    pub weighted_mean: Option<f64>,
    #[pyo3(get)]
    pub weighted_mean_err: Option<f64>,
    /// Reduced chi-square of the constant ("a = 0") model
    #[pyo3(get)]
    pub constant_reduced_chi_square: Option<f64>,
    #[pyo3(get)]
    pub constant_p_value: Option<f64>,
    #[pyo3(get)]
    pub classification: String,
}

#[pymethods]
impl PyBandRegression {
    fn __repr__(&self) -> String {
        format!(
            "BandRegression(band='{}', samples={}, classification={})",
            self.band, self.sample_count, self.classification
        )
    }
}

impl From<&BandRegressionResult> for PyBandRegression {
    fn from(result: &BandRegressionResult) -> Self {
        PyBandRegression {
            band: result.band.clone(),
            occurrence_count: result.occurrence_count,
            sample_count: result.sample_count,
            slope: result.slope(),
            slope_err: result.slope_err(),
            intercept: result.intercept(),
            intercept_err: result.intercept_err(),
            reduced_chi_square: result.reduced_chi_square(),
            p_value: result.fit.and_then(|f| f.p_value),
            weighted_mean: result.weighted_mean(),
            weighted_mean_err: result.weighted_mean_err(),
            constant_reduced_chi_square: result.constant_reduced_chi_square(),
            constant_p_value: result.constant.and_then(|c| c.p_value),
            classification: result.classification.as_str().to_string(),
        }
    }
}

/// Python wrapper for RescaledObservation
#[pyclass(name = "RescaledObservation")]
#[derive(Clone)]
pub struct PyRescaledObservation {
    #[pyo3(get)]
    pub time_sec: f64,
    #[pyo3(get)]
    pub mag: f64,
    #[pyo3(get)]
    pub mag_err: f64,
    #[pyo3(get)]
    pub mag_rescaled: f64,
    #[pyo3(get)]
    pub mag_rescaled_err: f64,
    #[pyo3(get)]
    pub band: String,
    #[pyo3(get)]
    pub rescaled: bool,
    observation: Observation,
}

#[pymethods]
impl PyRescaledObservation {
    /// The original observation
    fn observation(&self) -> PyObservation {
        PyObservation::from(self.observation.clone())
    }

    fn __repr__(&self) -> String {
        format!(
            "RescaledObservation(time_sec={}, band='{}', mag={:.3} -> {:.3}, rescaled={})",
            self.time_sec, self.band, self.mag, self.mag_rescaled, self.rescaled
        )
    }
}

impl From<RescaledObservation> for PyRescaledObservation {
    fn from(row: RescaledObservation) -> Self {
        PyRescaledObservation {
            time_sec: row.observation.time_sec,
            mag: row.observation.magnitude,
            mag_err: row.observation.magnitude_err,
            mag_rescaled: row.rescaled_magnitude,
            mag_rescaled_err: row.rescaled_magnitude_err,
            band: row.observation.band.clone(),
            rescaled: row.rescaled,
            observation: row.observation,
        }
    }
}
