//! Light-curve loading and artifact export.
//!
//! Loaders combine parsing and preprocessing into an analysis-ready
//! [`ObservationTable`](crate::core::ObservationTable); writers persist the
//! rescaled light curve and the per-band diagnostics next to each other.
//!
//! # Example
//!
//! ```no_run
//! use grblc_rust::config::PipelineConfig;
//! use grblc_rust::io::loaders::load_observations;
//! use std::path::Path;
//!
//! let table = load_observations(Path::new("GRB050820A_magADS.txt"), &PipelineConfig::default())
//!     .expect("Failed to load");
//! println!("Loaded {} observations", table.len());
//! ```

pub mod loaders;


pub use loaders::{
    colorevol_file_name, colorevol_to_dataframe, converted_flux_file_name, grb_name,
    grb_name_from_path, load_observations, rescaled_file_name, save_color_evolution,
    save_converted_flux, save_rescaled,
};
