//! Color-evolution detection and rescaling algorithms.
//!
//! This module holds the numerical core of the backend: it decides which
//! photometric bands can be merged onto a common reference band and applies
//! the corresponding magnitude offsets.
//!
//! # Components
//!
//! - [`bands`]: Band counting and reference-band selection
//! - [`matching`]: Pairwise time matching against the reference band
//! - [`regression`]: Weighted line fit, weighted mean and classification per band
//! - [`rescale`]: Shifting no-evolution bands and duplicate-time collapsing
//! - [`colorevol`]: Composition of the above into a report and a pipeline
//! - [`models`]: W07 afterglow model and chi-square helpers
//! - [`convert`]: Magnitude to energy-flux conversion
//!
//! # Example
//!
//! ```
//! use grblc_rust::algorithms::{compute_color_evolution, rescale, select_reference_band};
//! use grblc_rust::core::{Observation, ObservationTable};
//!
//! let table: ObservationTable = vec![
//!     Observation::new(100.0, 18.0, 0.05, "R"),
//!     Observation::new(1000.0, 19.0, 0.05, "R"),
//!     Observation::new(101.0, 18.4, 0.05, "V"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let (reference, _counts) = select_reference_band(&table, None)?;
//! let report = compute_color_evolution(&table, &reference)?;
//! assert_eq!(report.insufficient_bands(), vec!["V"]);
//!
//! // a single matched V point is not enough to rescale anything
//! assert!(rescale(&table, &reference, &report, false).is_err());
//! # Ok::<(), grblc_rust::core::ColorEvolError>(())
//! ```

pub mod bands;
pub mod colorevol;
pub mod convert;
pub mod matching;
pub mod models;
pub mod regression;
pub mod rescale;

pub use bands::{count_bands, select_reference_band, select_reference_band_with};
pub use colorevol::{
    compute_color_evolution, ColorEvolutionAnalyzer, ColorEvolutionPipeline,
    ColorEvolutionReport, PipelineOutput,
};
pub use convert::{
    flux_band_name, to_flux, Flux, FluxConverter, FluxObservation, FluxSettings, ZeroPoint,
};
pub use matching::{match_rescaling_factors, MatchSettings, PairwiseMatcher};
pub use models::{chi_square, reduced_chi_square, w07, W07Params};
pub use regression::{
    classify, fit_constant, fit_weighted_line, weighted_mean, BandRegressor, RegressionSettings,
};
pub use rescale::{collapse_duplicates, rescale};
