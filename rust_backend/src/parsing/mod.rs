//! Parsers for GRB light-curve tables and band labels.
//!
//! This module reads delimited light-curve text tables into Polars
//! DataFrames, converts them to and from typed [`Observation`] records, and
//! canonicalizes photometric band labels.
//!
//! # Parsers
//!
//! - [`table_parser`]: Parse tab-, whitespace- or comma-delimited tables
//! - [`bands`]: Band alias canonicalization (`u'` → `u`, `Ks` → `K`, ...)
//!
//! # Example
//!
//! ```no_run
//! use grblc_rust::parsing::{parse_lightcurve_table, dataframe_to_observations, Delimiter};
//! use std::path::Path;
//!
//! let df = parse_lightcurve_table(Path::new("GRB050820A.txt"), Delimiter::Whitespace)
//!     .expect("Failed to parse light curve");
//! let observations = dataframe_to_observations(&df).expect("Malformed rows");
//! ```
//!
//! [`Observation`]: crate::core::domain::Observation

pub mod bands;
pub mod table_parser;


pub use bands::BandApproximator;
pub use table_parser::{
    dataframe_to_observations, observations_to_dataframe, parse_lightcurve_str,
    parse_lightcurve_table, rescaled_to_dataframe, Delimiter,
};
