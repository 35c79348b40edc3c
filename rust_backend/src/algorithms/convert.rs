//! Magnitude to energy-flux conversion.
//!
//! Magnitudes are converted with a per-band zero-point flux density and
//! moved to the R band assuming a power-law spectrum `f ∝ λ^β` with
//! `β = photon_index − 1`. The result is `ν_R·f_R·10^(−(mag + A_b)/2.5)`
//! (or `λ_R·f_R·…` for Swift/UVOT bands, whose zero points are given per
//! Ångström). Galactic extinction `A_b` is supplied by the caller.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::domain::{Observation, ObservationTable};
use crate::core::error::{ColorEvolError, Result};

/// Speed of light, m/s
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Band whose wavelength every flux is referred to
pub const FLUX_REFERENCE_BAND: &str = "R";

/// Bands whose zero points are `f_λ` (erg/cm²/s/Å) rather than `f_ν`.
const PER_ANGSTROM_BANDS: [&str; 7] = [
    "u_swift",
    "b_swift",
    "v_swift",
    "uvw1_swift",
    "uvw2_swift",
    "uvm2_swift",
    "white",
];

/// Frequency in Hz of light with wavelength `angstrom`.
pub fn angstrom_to_hz(angstrom: f64) -> f64 {
    SPEED_OF_LIGHT / (angstrom * 1e-10)
}

/// Unit of a zero-point flux density
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FluxDensityUnit {
    /// erg / cm² / s / Hz
    PerHertz,
    /// erg / cm² / s / Å
    PerAngstrom,
}

impl FluxDensityUnit {
    /// Unit used for a band name produced by [`flux_band_name`].
    pub fn for_band(band: &str) -> Self {
        let lower = band.to_lowercase();
        if PER_ANGSTROM_BANDS.contains(&lower.as_str()) {
            FluxDensityUnit::PerAngstrom
        } else {
            FluxDensityUnit::PerHertz
        }
    }
}

/// Effective wavelength (Å) and zero-magnitude flux density of a band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZeroPoint {
    pub wavelength: f64,
    pub flux_density: f64,
}

/// Spectral and extinction inputs of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FluxSettings {
    #[serde(default)]
    pub photon_index: f64,
    #[serde(default)]
    pub photon_index_err: f64,
    /// Galactic extinction in magnitudes, added to every magnitude
    #[serde(default)]
    pub extinction: f64,
}

/// Energy flux and its error, erg/cm²/s
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Flux {
    pub value: f64,
    pub error: f64,
}

/// One converted row of a light curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluxObservation {
    pub time_sec: f64,
    pub flux: f64,
    pub flux_err: f64,
    pub band: String,
}

/// Canonical zero-point lookup name of a raw band label.
///
/// Drops `'`, `_`, `\` and parenthesised suffixes, prefixes UVOT filter
/// codes (`w1`, `m2`, ...) with `uv`, tags `uvot` data with `_swift` and
/// upper-cases a bare `v`.
///
/// # Examples
///
/// ```
/// use grblc_rust::algorithms::convert::flux_band_name;
///
/// assert_eq!(flux_band_name("r'", "manual"), "r");
/// assert_eq!(flux_band_name("w1", "uvot"), "uvw1_swift");
/// assert_eq!(flux_band_name("R(Kron)", "manual"), "R");
/// assert_eq!(flux_band_name("v", "manual"), "V");
/// ```
pub fn flux_band_name(band: &str, source: &str) -> String {
    let mut cleaned = String::with_capacity(band.len());
    let mut depth = 0usize;
    for c in band.trim().chars() {
        match c {
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            _ if depth > 0 => {}
            '\'' | '_' | '\\' => {}
            _ => cleaned.push(c),
        }
    }

    let chars: Vec<char> = cleaned.chars().collect();
    let mut name = String::with_capacity(chars.len() + 8);
    for (i, &c) in chars.iter().enumerate() {
        let after_letter = i > 0 && chars[i - 1].is_ascii_alphabetic();
        let before_digit = chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
        if (c == 'm' || c == 'w') && !after_letter && before_digit {
            name.push_str("uv");
        }
        name.push(c);
    }

    if source.eq_ignore_ascii_case("uvot") {
        name.push_str("_swift");
    }
    if name == "v" {
        name = "V".to_string();
    }
    name
}

/// Convert one magnitude to energy flux.
///
/// # Arguments
/// * `magnitude`, `magnitude_err` - Observed magnitude and its error
/// * `band` - Zero-point name as returned by [`flux_band_name`]
/// * `zero_point` - Zero point of `band`
/// * `reference_wavelength` - Effective wavelength of the R band, Å
/// * `settings` - Photon index and extinction
///
/// # Errors
/// `InvalidObservation` for non-positive wavelengths or a negative or
/// non-finite result.
pub fn to_flux(
    magnitude: f64,
    magnitude_err: f64,
    band: &str,
    zero_point: &ZeroPoint,
    reference_wavelength: f64,
    settings: &FluxSettings,
) -> Result<Flux> {
    if !(zero_point.wavelength > 0.0 && reference_wavelength > 0.0) {
        return Err(ColorEvolError::InvalidObservation(format!(
            "band '{}': wavelengths must be positive ({} Å, R {} Å)",
            band, zero_point.wavelength, reference_wavelength
        )));
    }

    let beta = settings.photon_index - 1.0;
    let wavelength_ratio = zero_point.wavelength / reference_wavelength;
    let reference_density = zero_point.flux_density * wavelength_ratio.powf(-beta);

    let lam_or_nu = match FluxDensityUnit::for_band(band) {
        FluxDensityUnit::PerAngstrom => reference_wavelength,
        FluxDensityUnit::PerHertz => angstrom_to_hz(reference_wavelength),
    };

    let value = lam_or_nu * reference_density * 10f64.powf(-(magnitude + settings.extinction) / 2.5);
    let error = value.abs()
        * ((magnitude_err * 0.4 * std::f64::consts::LN_10).powi(2)
            + (settings.photon_index_err * wavelength_ratio.ln()).powi(2))
        .sqrt();

    if !(value.is_finite() && value >= 0.0 && error.is_finite()) {
        return Err(ColorEvolError::InvalidObservation(format!(
            "band '{}': magnitude {} does not convert to a finite flux",
            band, magnitude
        )));
    }

    Ok(Flux { value, error })
}

/// Zero-point table plus conversion settings
#[derive(Debug, Clone, Default)]
pub struct FluxConverter {
    zero_points: HashMap<String, ZeroPoint>,
    settings: FluxSettings,
}

impl FluxConverter {
    pub fn new(settings: FluxSettings) -> Self {
        Self {
            zero_points: HashMap::new(),
            settings,
        }
    }

    /// Register the zero point of `band` (a [`flux_band_name`] name).
    pub fn with_zero_point(mut self, band: impl Into<String>, zero_point: ZeroPoint) -> Self {
        self.zero_points.insert(band.into(), zero_point);
        self
    }

    pub fn settings(&self) -> &FluxSettings {
        &self.settings
    }

    /// Convert one observation. Its `source` decides the UVOT naming.
    ///
    /// # Errors
    /// * `UnknownBand` if the band or the R band has no zero point
    /// * `InvalidObservation` from [`to_flux`]
    pub fn convert(&self, obs: &Observation) -> Result<Flux> {
        let reference = self
            .zero_points
            .get(FLUX_REFERENCE_BAND)
            .ok_or_else(|| ColorEvolError::UnknownBand(FLUX_REFERENCE_BAND.to_string()))?;

        let name = flux_band_name(&obs.band, &obs.source);
        let zero_point = self
            .zero_points
            .get(&name)
            .ok_or_else(|| ColorEvolError::UnknownBand(name.clone()))?;

        to_flux(
            obs.magnitude,
            obs.magnitude_err,
            &name,
            zero_point,
            reference.wavelength,
            &self.settings,
        )
    }

    /// Convert every row; rows in unsupported bands are skipped with a
    /// warning.
    ///
    /// # Errors
    /// `UnknownBand` if the R band has no zero point, `InvalidObservation`
    /// for rows that do not convert.
    pub fn convert_table(&self, table: &ObservationTable) -> Result<Vec<FluxObservation>> {
        if !self.zero_points.contains_key(FLUX_REFERENCE_BAND) {
            return Err(ColorEvolError::UnknownBand(FLUX_REFERENCE_BAND.to_string()));
        }

        let mut rows = Vec::with_capacity(table.len());
        let mut skipped = 0usize;
        for obs in table {
            match self.convert(obs) {
                Ok(flux) => rows.push(FluxObservation {
                    time_sec: obs.time_sec,
                    flux: flux.value,
                    flux_err: flux.error,
                    band: obs.band.clone(),
                }),
                Err(ColorEvolError::UnknownBand(band)) => {
                    log::warn!("Band '{}' is not currently supported; row skipped", band);
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        log::info!("Converted {} of {} rows to flux ({} skipped)", rows.len(), table.len(), skipped);
        Ok(rows)
    }
}
