//! Pairwise time matching of non-reference bands against the reference band.
//!
//! Every observation `o` of a non-reference band is compared with every
//! reference point `r`. A pair is admitted when `|t_r - t_o| / t_r` does not
//! exceed the configured fraction (2.5% by default); among admitted pairs for
//! one `o`, only the nearest in fractional time survives.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::domain::{Observation, ObservationTable, RescalingFactorSample};
use crate::core::error::{ColorEvolError, Result};

/// Default maximum fractional time difference for a matched pair.
pub const DEFAULT_MAX_TIME_FRACTION: f64 = 0.025;

/// Settings of the pairwise matcher
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchSettings {
    #[serde(default = "default_max_time_fraction")]
    pub max_time_fraction: f64,
}

fn default_max_time_fraction() -> f64 {
    DEFAULT_MAX_TIME_FRACTION
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            max_time_fraction: DEFAULT_MAX_TIME_FRACTION,
        }
    }
}

/// Computes rescaling factor samples between the reference band and the others.
#[derive(Debug, Clone, Default)]
pub struct PairwiseMatcher {
    settings: MatchSettings,
}

impl PairwiseMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: MatchSettings) -> Self {
        Self { settings }
    }

    /// Match every non-reference band of `table` against `reference_band`.
    ///
    /// # Returns
    /// A map from band to its samples, ordered by observation time. Every
    /// non-reference band with at least one detection gets an entry, possibly
    /// empty. Limiting magnitudes never take part in a match.
    ///
    /// # Errors
    /// `InvalidObservation` if a time that takes part in a comparison is not
    /// strictly positive and finite.
    pub fn match_all(
        &self,
        table: &ObservationTable,
        reference_band: &str,
    ) -> Result<BTreeMap<String, Vec<RescalingFactorSample>>> {
        let reference: Vec<(usize, &Observation)> = table
            .rows_in_band(reference_band)
            .filter(|(_, o)| !o.is_limiting())
            .collect();
        for (index, obs) in &reference {
            check_time(*index, obs)?;
        }

        let mut samples = BTreeMap::new();
        for band in table.bands() {
            if band == reference_band
                || table.rows_in_band(band).all(|(_, o)| o.is_limiting())
            {
                continue;
            }
            let band_samples = self.match_band(table, &reference, band)?;
            log::debug!(
                "Band '{}': {} matched samples against '{}'",
                band,
                band_samples.len(),
                reference_band
            );
            samples.insert(band.to_string(), band_samples);
        }

        Ok(samples)
    }

    fn match_band(
        &self,
        table: &ObservationTable,
        reference: &[(usize, &Observation)],
        band: &str,
    ) -> Result<Vec<RescalingFactorSample>> {
        let mut samples = Vec::new();

        for (obs_index, obs) in table.rows_in_band(band).filter(|(_, o)| !o.is_limiting()) {
            check_time(obs_index, obs)?;

            let mut best: Option<(usize, &Observation, f64)> = None;
            for &(ref_index, ref_obs) in reference {
                let fraction = time_fraction_difference(ref_obs.time_sec, obs.time_sec);
                if fraction > self.settings.max_time_fraction {
                    continue;
                }
                // strict comparison keeps the first-encountered reference on ties
                if best.map_or(true, |(_, _, current)| fraction < current) {
                    best = Some((ref_index, ref_obs, fraction));
                }
            }

            if let Some((ref_index, ref_obs, fraction)) = best {
                samples.push(RescalingFactorSample {
                    band: band.to_string(),
                    reference_index: ref_index,
                    observation_index: obs_index,
                    reference_time: ref_obs.time_sec,
                    observation_time: obs.time_sec,
                    time_fraction_difference: fraction,
                    magnitude_offset: ref_obs.magnitude - obs.magnitude,
                    combined_error: ref_obs.magnitude_err.hypot(obs.magnitude_err),
                    reference_magnitude: ref_obs.magnitude,
                    reference_magnitude_err: ref_obs.magnitude_err,
                });
            }
        }

        samples.sort_by(|a, b| a.observation_time.total_cmp(&b.observation_time));
        Ok(samples)
    }
}

/// `|t_ref - t_obs| / t_ref`
pub fn time_fraction_difference(reference_time: f64, observation_time: f64) -> f64 {
    (reference_time - observation_time).abs() / reference_time
}

fn check_time(index: usize, obs: &Observation) -> Result<()> {
    if obs.time_sec.is_finite() && obs.time_sec > 0.0 {
        Ok(())
    } else {
        Err(ColorEvolError::InvalidObservation(format!(
            "row {} (band '{}') has non-positive time_sec {}",
            index, obs.band, obs.time_sec
        )))
    }
}

/// Match with default settings
pub fn match_rescaling_factors(
    table: &ObservationTable,
    reference_band: &str,
) -> Result<BTreeMap<String, Vec<RescalingFactorSample>>> {
    PairwiseMatcher::new().match_all(table, reference_band)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn obs(t: f64, mag: f64, err: f64, band: &str) -> Observation {
        Observation::new(t, mag, err, band)
    }

    #[test]
    fn pairs_within_threshold_are_admitted() {
        let table: ObservationTable = vec![
            obs(1000.0, 18.0, 0.03, "R"),
            obs(1020.0, 18.5, 0.04, "V"),
            obs(5000.0, 19.0, 0.03, "R"),
            obs(6000.0, 19.4, 0.04, "V"),
        ]
        .into_iter()
        .collect();

        let samples = match_rescaling_factors(&table, "R").unwrap();
        let v = &samples["V"];

        assert_eq!(v.len(), 1);
        assert_eq!(v[0].reference_index, 0);
        assert_eq!(v[0].observation_index, 1);
        assert_relative_eq!(v[0].time_fraction_difference, 0.02);
        assert_relative_eq!(v[0].magnitude_offset, -0.5);
        assert_relative_eq!(v[0].combined_error, 0.05);
    }

    #[test]
    fn threshold_is_inclusive() {
        let table: ObservationTable = vec![obs(1000.0, 18.0, 0.1, "R"), obs(1025.0, 18.1, 0.1, "V")]
            .into_iter()
            .collect();

        let samples = match_rescaling_factors(&table, "R").unwrap();
        assert_eq!(samples["V"].len(), 1);

        let table: ObservationTable = vec![obs(1000.0, 18.0, 0.1, "R"), obs(1026.0, 18.1, 0.1, "V")]
            .into_iter()
            .collect();

        let samples = match_rescaling_factors(&table, "R").unwrap();
        assert!(samples["V"].is_empty());
    }

    #[test]
    fn nearest_reference_point_wins() {
        let table: ObservationTable = vec![
            obs(1000.0, 18.0, 0.1, "R"),
            obs(1010.0, 18.2, 0.1, "R"),
            obs(1012.0, 18.9, 0.1, "V"),
        ]
        .into_iter()
        .collect();

        let samples = match_rescaling_factors(&table, "R").unwrap();
        let v = &samples["V"];
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].reference_index, 1);
        assert_relative_eq!(v[0].magnitude_offset, 18.2 - 18.9);
    }

    #[test]
    fn equal_distance_keeps_first_reference() {
        let table: ObservationTable = vec![
            obs(1000.0, 18.0, 0.1, "R"),
            obs(1000.0, 18.3, 0.1, "R"),
            obs(1010.0, 18.9, 0.1, "V"),
        ]
        .into_iter()
        .collect();

        let samples = match_rescaling_factors(&table, "R").unwrap();
        assert_eq!(samples["V"][0].reference_index, 0);
    }

    #[test]
    fn unmatched_band_has_empty_entry() {
        let table: ObservationTable = vec![obs(100.0, 18.0, 0.1, "R"), obs(900.0, 18.0, 0.1, "B")]
            .into_iter()
            .collect();

        let samples = match_rescaling_factors(&table, "R").unwrap();
        assert!(samples.contains_key("B"));
        assert!(samples["B"].is_empty());
        assert!(!samples.contains_key("R"));
    }

    #[test]
    fn non_positive_time_is_rejected() {
        let table: ObservationTable = vec![obs(0.0, 18.0, 0.1, "R"), obs(10.0, 18.0, 0.1, "V")]
            .into_iter()
            .collect();

        let err = match_rescaling_factors(&table, "R").unwrap_err();
        assert!(matches!(err, ColorEvolError::InvalidObservation(_)));

        let table: ObservationTable = vec![obs(10.0, 18.0, 0.1, "R"), obs(-5.0, 18.0, 0.1, "V")]
            .into_iter()
            .collect();
        assert!(match_rescaling_factors(&table, "R").is_err());
    }

    #[test]
    fn custom_threshold_is_honoured() {
        let table: ObservationTable = vec![obs(1000.0, 18.0, 0.1, "R"), obs(1080.0, 18.1, 0.1, "V")]
            .into_iter()
            .collect();

        let matcher = PairwiseMatcher::with_settings(MatchSettings {
            max_time_fraction: 0.1,
        });
        assert_eq!(matcher.match_all(&table, "R").unwrap()["V"].len(), 1);
        assert!(match_rescaling_factors(&table, "R").unwrap()["V"].is_empty());
    }

    #[test]
    fn limiting_magnitudes_are_not_matched() {
        let table: ObservationTable = vec![
            obs(1000.0, 21.0, 0.0, "R"),
            obs(1010.0, 18.0, 0.1, "R"),
            obs(1001.0, 18.2, 0.1, "V"),
            obs(1011.0, 20.5, 0.0, "V"),
            obs(1000.0, 22.0, 0.0, "B"),
        ]
        .into_iter()
        .collect();

        let samples = match_rescaling_factors(&table, "R").unwrap();
        assert!(!samples.contains_key("B"));

        let v = &samples["V"];
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].observation_index, 2);
        assert_eq!(v[0].reference_index, 1);
    }

    #[test]
    fn samples_are_sorted_by_observation_time() {
        let table: ObservationTable = vec![
            obs(3000.0, 18.0, 0.1, "R"),
            obs(1000.0, 17.0, 0.1, "R"),
            obs(3010.0, 18.3, 0.1, "V"),
            obs(1005.0, 17.3, 0.1, "V"),
        ]
        .into_iter()
        .collect();

        let samples = match_rescaling_factors(&table, "R").unwrap();
        let times: Vec<f64> = samples["V"].iter().map(|s| s.observation_time).collect();
        assert_eq!(times, vec![1005.0, 3010.0]);
    }
}
