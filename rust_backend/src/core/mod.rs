//! Core domain models for GRB afterglow color-evolution analysis.
//!
//! This module defines the fundamental data structures used throughout the
//! backend, representing photometric observations, rescaling factor samples,
//! per-band regression results, and the error taxonomy of the pipeline.

pub mod domain;
pub mod error;

pub use domain::{
    BandCount, BandRegressionResult, Classification, ConstantFit, LinearFit, MagnitudeRange,
    Observation, ObservationTable, RescaledObservation, RescaledTable, RescalingFactorSample,
    WeightedMean,
};
pub use error::{ColorEvolError, Result};
