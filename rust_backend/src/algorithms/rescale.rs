//! Rescaler: shifts no-evolution bands onto the reference band's scale.

use std::collections::{HashMap, HashSet};

use super::colorevol::ColorEvolutionReport;
use crate::core::domain::{
    Observation, ObservationTable, RescaledObservation, RescaledTable, RescalingFactorSample,
};
use crate::core::error::{ColorEvolError, Result};

/// Rescale every observation onto `reference_band`.
///
/// A non-reference observation is shifted by its band's weighted-mean offset
/// only when the band is classified as having no color evolution, the
/// observation was time-matched to a reference point, and the two
/// magnitude±error ranges do not overlap. Everything else passes through.
///
/// # Arguments
/// * `table` - The observation table the report was computed from
/// * `reference_band` - Reference band identifier
/// * `report` - Output of [`compute_color_evolution`](super::compute_color_evolution)
/// * `remove_duplicates` - Collapse rows sharing an identical `time_sec`
///
/// # Errors
/// * `UnknownBand` if `reference_band` is absent from the table
/// * `InsufficientData` if the report belongs to another reference band
/// * `NoRescalableBands` if no band can be rescaled and the table holds
///   more than the reference band
pub fn rescale(
    table: &ObservationTable,
    reference_band: &str,
    report: &ColorEvolutionReport,
    remove_duplicates: bool,
) -> Result<RescaledTable> {
    if !table.iter().any(|o| o.band_normalized == reference_band) {
        return Err(ColorEvolError::UnknownBand(reference_band.to_string()));
    }

    let only_reference = table.iter().all(|o| o.band_normalized == reference_band);

    if !only_reference {
        if report.reference_band != reference_band {
            return Err(ColorEvolError::InsufficientData(format!(
                "color-evolution report was computed against '{}', not '{}'",
                report.reference_band, reference_band
            )));
        }
        if report.no_evolution_bands().is_empty() {
            return Err(ColorEvolError::NoRescalableBands(reference_band.to_string()));
        }
    }

    let matched: HashMap<usize, &RescalingFactorSample> = report
        .samples
        .values()
        .flatten()
        .map(|s| (s.observation_index, s))
        .collect();

    let mut rows = Vec::with_capacity(table.len());
    for (index, obs) in table.iter().enumerate() {
        if obs.band_normalized == reference_band {
            rows.push(RescaledObservation::passthrough(obs.clone()));
            continue;
        }

        let offset = report
            .results
            .get(&obs.band_normalized)
            .filter(|r| r.is_rescalable())
            .and_then(|r| r.mean);

        let sample = matched
            .get(&index)
            .copied()
            .filter(|sample| pairs_with(sample, obs));

        let row = match (offset, sample) {
            (Some(mean), Some(sample))
                if !obs.magnitude_range().overlaps(&sample.reference_range()) =>
            {
                RescaledObservation::shifted(obs.clone(), mean)
            }
            _ => RescaledObservation::passthrough(obs.clone()),
        };
        rows.push(row);
    }

    let mut rescaled = RescaledTable {
        reference_band: reference_band.to_string(),
        rows,
    };

    if remove_duplicates {
        let before = rescaled.len();
        rescaled = collapse_duplicates(rescaled, report);
        log::debug!(
            "Duplicate collapsing removed {} of {} rows",
            before - rescaled.len(),
            before
        );
    }

    log::info!(
        "Rescaled {} of {} observations to band '{}'",
        rescaled.rescaled_count(),
        rescaled.len(),
        reference_band
    );

    Ok(rescaled)
}

/// A sample only applies to the row it was matched from; reports built from
/// another table can share indices without sharing rows.
fn pairs_with(sample: &RescalingFactorSample, obs: &Observation) -> bool {
    sample.band == obs.band_normalized && sample.observation_time == obs.time_sec
}

/// Keep one row per `time_sec`, preferring the most numerous band.
///
/// Ties keep input order; the result is sorted by time.
pub fn collapse_duplicates(table: RescaledTable, report: &ColorEvolutionReport) -> RescaledTable {
    let RescaledTable {
        reference_band,
        mut rows,
    } = table;

    let count_of = |band: &str| report.occurrence_count(band).unwrap_or(0);

    // stable sorts: equal keys stay in input order
    rows.sort_by(|a, b| {
        count_of(&b.observation.band_normalized).cmp(&count_of(&a.observation.band_normalized))
    });

    let mut seen = HashSet::new();
    rows.retain(|row| seen.insert(row.observation.time_sec.to_bits()));

    rows.sort_by(|a, b| a.observation.time_sec.total_cmp(&b.observation.time_sec));

    RescaledTable {
        reference_band,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::colorevol::compute_color_evolution;
    use crate::core::domain::{Classification, Observation};
    use approx::assert_relative_eq;

    fn obs(t: f64, mag: f64, err: f64, band: &str) -> Observation {
        Observation::new(t, mag, err, band)
    }

    /// Reference R plus a V band sitting a constant 0.5 mag fainter.
    fn offset_table() -> ObservationTable {
        let mut rows = Vec::new();
        for (i, t) in [100.0, 300.0, 1000.0, 3000.0, 10000.0].iter().enumerate() {
            let mag = 16.0 + i as f64;
            rows.push(obs(*t, mag, 0.05, "R"));
            rows.push(obs(t * 1.01, mag + 0.5, 0.05, "V"));
        }
        rows.into_iter().collect()
    }

    #[test]
    fn samples_from_another_table_are_not_applied() {
        let report = compute_color_evolution(&offset_table(), "R").unwrap();

        // same reference band and row layout, different V epochs
        let other: ObservationTable = offset_table()
            .into_inner()
            .into_iter()
            .map(|o| {
                if o.band == "V" {
                    Observation { time_sec: o.time_sec * 1.5, ..o }
                } else {
                    o
                }
            })
            .collect();

        let rescaled = rescale(&other, "R", &report, false).unwrap();
        assert_eq!(rescaled.rescaled_count(), 0);
        assert_eq!(rescale(&offset_table(), "R", &report, false).unwrap().rescaled_count(), 5);
    }

    #[test]
    fn no_evolution_band_is_shifted() {
        let table = offset_table();
        let report = compute_color_evolution(&table, "R").unwrap();
        assert_eq!(report.results["V"].classification, Classification::NoColorEvolution);

        let rescaled = rescale(&table, "R", &report, false).unwrap();
        assert_eq!(rescaled.len(), table.len());

        let mean = report.results["V"].mean.unwrap();
        for row in &rescaled.rows {
            if row.observation.band == "V" {
                assert!(row.rescaled);
                assert_relative_eq!(row.rescaled_magnitude, row.observation.magnitude - 0.5, epsilon = 1e-9);
                assert_eq!(row.rescaled_magnitude_err, mean.error);
            } else {
                assert!(!row.rescaled);
                assert_eq!(row.rescaled_magnitude, row.observation.magnitude);
                assert_eq!(row.rescaled_magnitude_err, row.observation.magnitude_err);
            }
        }
    }

    #[test]
    fn overlapping_points_pass_through() {
        let mut rows: Vec<Observation> = offset_table().into_inner();
        // third V point within errors of its reference point
        rows[5] = obs(1010.0, 18.05, 0.05, "V");
        let table: ObservationTable = rows.into_iter().collect();

        let report = compute_color_evolution(&table, "R").unwrap();
        let rescaled = rescale(&table, "R", &report, false).unwrap();

        assert!(!rescaled.rows[5].rescaled);
        assert_eq!(rescaled.rows[5].rescaled_magnitude, 18.05);
        assert!(rescaled.rows[3].rescaled);
    }

    #[test]
    fn unmatched_points_pass_through() {
        let mut rows: Vec<Observation> = offset_table().into_inner();
        rows.push(obs(50000.0, 21.0, 0.1, "V"));
        let table: ObservationTable = rows.into_iter().collect();

        let report = compute_color_evolution(&table, "R").unwrap();
        let rescaled = rescale(&table, "R", &report, false).unwrap();

        let last = rescaled.rows.last().unwrap();
        assert!(!last.rescaled);
        assert_eq!(last.rescaled_magnitude, 21.0);
    }

    #[test]
    fn only_reference_band_is_identity() {
        let table: ObservationTable = vec![obs(10.0, 18.0, 0.1, "R"), obs(20.0, 18.4, 0.1, "R")]
            .into_iter()
            .collect();
        let report = ColorEvolutionReport::empty("R");

        let rescaled = rescale(&table, "R", &report, false).unwrap();
        assert_eq!(rescaled.rescaled_count(), 0);
        for (row, original) in rescaled.rows.iter().zip(table.iter()) {
            assert_eq!(&row.observation, original);
            assert_eq!(row.rescaled_magnitude, original.magnitude);
        }
    }

    #[test]
    fn nothing_rescalable_is_an_error() {
        let table: ObservationTable = vec![
            obs(100.0, 18.0, 0.1, "R"),
            obs(200.0, 18.5, 0.1, "R"),
            obs(101.0, 18.4, 0.1, "V"),
        ]
        .into_iter()
        .collect();
        let report = compute_color_evolution(&table, "R").unwrap();

        let err = rescale(&table, "R", &report, false).unwrap_err();
        assert!(matches!(err, ColorEvolError::NoRescalableBands(_)));
    }

    #[test]
    fn unknown_reference_is_rejected() {
        let table = offset_table();
        let report = compute_color_evolution(&table, "R").unwrap();
        let err = rescale(&table, "B", &report, false).unwrap_err();
        assert!(matches!(err, ColorEvolError::UnknownBand(_)));
    }

    #[test]
    fn duplicates_keep_most_numerous_band() {
        let mut rows: Vec<Observation> = offset_table().into_inner();
        // a V point at exactly the time of an R point
        rows.insert(0, obs(300.0, 17.5, 0.05, "V"));
        let table: ObservationTable = rows.into_iter().collect();

        let report = compute_color_evolution(&table, "R").unwrap();
        let rescaled = rescale(&table, "R", &report, true).unwrap();

        let at_300: Vec<_> = rescaled
            .rows
            .iter()
            .filter(|r| r.observation.time_sec == 300.0)
            .collect();
        assert_eq!(at_300.len(), 1);
        assert_eq!(at_300[0].observation.band, "V");
        assert_eq!(rescaled.len(), table.len() - 1);

        let times: Vec<f64> = rescaled.rows.iter().map(|r| r.observation.time_sec).collect();
        let mut sorted = times.clone();
        sorted.sort_by(f64::total_cmp);
        assert_eq!(times, sorted);
    }
}
