//! grbLC Rust backend: GRB afterglow color-evolution detection and rescaling.
//!
//! The pipeline reads a multi-band light curve, picks a reference band,
//! time-matches every other band against it, fits the resulting magnitude
//! offsets against log-time and rescales the bands that show no color
//! evolution onto the reference band.

pub mod algorithms;
pub mod config;
pub mod core;
pub mod io;
pub mod parsing;
pub mod preprocessing;
#[cfg(feature = "python")]
pub mod python;

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// grbLC Rust backend - color evolution and rescaling of GRB light curves
#[cfg(feature = "python")]
#[pymodule]
fn grblc_rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Register classes
    m.add_class::<python::PyObservation>()?;
    m.add_class::<python::PyBandRegression>()?;
    m.add_class::<python::PyColorEvolutionReport>()?;
    m.add_class::<python::PyRescaledObservation>()?;
    m.add_class::<python::PyValidationResult>()?;

    // Register data loading functions
    m.add_function(wrap_pyfunction!(python::load_observations, m)?)?;
    m.add_function(wrap_pyfunction!(python::preprocess_lightcurve, m)?)?;

    // Register analysis functions
    m.add_function(wrap_pyfunction!(python::select_reference_band, m)?)?;
    m.add_function(wrap_pyfunction!(python::compute_color_evolution, m)?)?;
    m.add_function(wrap_pyfunction!(python::rescale, m)?)?;
    m.add_function(wrap_pyfunction!(python::py_w07, m)?)?;
    m.add_function(wrap_pyfunction!(python::convert_to_flux, m)?)?;

    Ok(())
}
