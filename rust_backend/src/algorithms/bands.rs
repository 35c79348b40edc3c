//! Band Aggregator: per-band occurrence counts and reference-band selection.
//!
//! Limiting magnitudes (`magnitude_err == 0`) are not detections and are
//! left out of the counts.

use crate::core::domain::{BandCount, ObservationTable};
use crate::core::error::{ColorEvolError, Result};
use crate::parsing::BandApproximator;

/// Count detections per normalized band
///
/// # Arguments
/// * `table` - Observation table
///
/// # Returns
/// Band counts sorted by descending count; equal counts keep the order in
/// which the bands first appear in the table. Bands holding only limiting
/// magnitudes are absent.
pub fn count_bands(table: &ObservationTable) -> Vec<BandCount> {
    let mut counts: Vec<BandCount> = Vec::new();
    for obs in table.iter().filter(|o| !o.is_limiting()) {
        match counts.iter_mut().find(|c| c.band == obs.band_normalized) {
            Some(entry) => entry.count += 1,
            None => counts.push(BandCount {
                band: obs.band_normalized.clone(),
                count: 1,
            }),
        }
    }
    // stable: ties stay in first-encountered order
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Select the reference band for rescaling
///
/// Explicit names are matched through band aliases as well; see
/// [`select_reference_band_with`] to turn that off.
///
/// # Arguments
/// * `table` - Observation table (must hold at least one detection)
/// * `explicit_band` - Band requested by the caller, or `None` for the most
///   numerous band
///
/// # Returns
/// The reference band identifier and the ordered band counts
///
/// # Errors
/// * `InsufficientData` if the table is empty or holds only limiting
///   magnitudes
/// * `UnknownBand` if `explicit_band` matches no band in the table
pub fn select_reference_band(
    table: &ObservationTable,
    explicit_band: Option<&str>,
) -> Result<(String, Vec<BandCount>)> {
    select_reference_band_with(table, explicit_band, true)
}

/// [`select_reference_band`] with alias resolution of `explicit_band`
/// enabled only when `approximate_aliases` is set (`input.appx_bands`).
pub fn select_reference_band_with(
    table: &ObservationTable,
    explicit_band: Option<&str>,
    approximate_aliases: bool,
) -> Result<(String, Vec<BandCount>)> {
    if table.is_empty() {
        return Err(ColorEvolError::InsufficientData(
            "observation table is empty".to_string(),
        ));
    }
    if !table.has_detections() {
        return Err(ColorEvolError::InsufficientData(
            "only limiting magnitudes present".to_string(),
        ));
    }

    let counts = count_bands(table);

    let reference = match explicit_band {
        Some(requested) => resolve_band(table, requested, approximate_aliases)
            .ok_or_else(|| ColorEvolError::UnknownBand(requested.to_string()))?,
        None => counts[0].band.clone(),
    };

    log::debug!(
        "Reference band '{}' selected among {} bands",
        reference,
        counts.len()
    );

    Ok((reference, counts))
}

/// Resolve a caller-supplied band name against the table's labels.
///
/// Tries the normalized label, then the canonical alias (if enabled), then
/// raw labels. Only detections are considered.
fn resolve_band(
    table: &ObservationTable,
    requested: &str,
    approximate_aliases: bool,
) -> Option<String> {
    let requested = requested.trim();
    let detections = || table.iter().filter(|o| !o.is_limiting());

    if detections().any(|o| o.band_normalized == requested) {
        return Some(requested.to_string());
    }

    if approximate_aliases {
        let approximated = BandApproximator::approximate(requested);
        if detections().any(|o| o.band_normalized == approximated) {
            return Some(approximated);
        }
    }

    detections()
        .find(|o| o.band == requested)
        .map(|o| o.band_normalized.clone())
}
