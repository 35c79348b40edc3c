//! Python bindings for the grbLC backend.
//!
//! This module exposes loading, color-evolution analysis and rescaling to
//! Python via PyO3. It is compiled only with the `python` feature.
//!
//! # Modules
//!
//! - [`types`]: Python classes wrapping the domain records
//! - [`loaders`]: Light-curve loading and validation
//! - [`algorithms`]: Reference selection, color evolution, rescaling, W07,
//!   flux conversion
//!
//! Contract violations (unknown band, insufficient data, ...) raise
//! `ValueError`; I/O and table errors raise `RuntimeError`.

pub mod algorithms;
pub mod loaders;
pub mod types;

pub use algorithms::*;
pub use loaders::*;
pub use types::*;

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::PyErr;

use crate::core::error::ColorEvolError;

pub(crate) fn colorevol_to_py(err: ColorEvolError) -> PyErr {
    if err.is_contract_violation() {
        PyValueError::new_err(err.to_string())
    } else {
        PyRuntimeError::new_err(err.to_string())
    }
}

pub(crate) fn anyhow_to_py(err: anyhow::Error) -> PyErr {
    let message = format!("{:#}", err);
    match err.downcast_ref::<ColorEvolError>() {
        Some(kind) if kind.is_contract_violation() => PyValueError::new_err(message),
        _ => PyRuntimeError::new_err(message),
    }
}
