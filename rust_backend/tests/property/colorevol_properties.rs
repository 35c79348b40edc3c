use grblc_rust::algorithms::{
    compute_color_evolution, match_rescaling_factors, rescale, select_reference_band,
    ColorEvolutionReport,
};
use grblc_rust::algorithms::matching::{time_fraction_difference, DEFAULT_MAX_TIME_FRACTION};
use grblc_rust::core::{Observation, ObservationTable};
use proptest::prelude::*;
use std::collections::HashSet;

const BANDS: [&str; 4] = ["R", "V", "B", "I"];

fn observation() -> impl Strategy<Value = Observation> {
    (0..BANDS.len(), 1.0f64..6.0, 10.0f64..22.0, 0.01f64..0.5)
        .prop_map(|(band, log_t, mag, err)| Observation::new(10f64.powf(log_t), mag, err, BANDS[band]))
}

fn light_curve() -> impl Strategy<Value = ObservationTable> {
    prop::collection::vec(observation(), 2..40).prop_map(ObservationTable::new)
}

fn single_band_curve() -> impl Strategy<Value = ObservationTable> {
    prop::collection::vec((1.0f64..6.0, 10.0f64..22.0, 0.01f64..0.5), 1..20).prop_map(|rows| {
        rows.into_iter()
            .map(|(log_t, mag, err)| Observation::new(10f64.powf(log_t), mag, err, "R"))
            .collect()
    })
}

proptest! {
    #[test]
    fn matched_samples_respect_time_bound(table in light_curve()) {
        let (reference, _) = select_reference_band(&table, None).unwrap();
        let samples = match_rescaling_factors(&table, &reference).unwrap();
        for band_samples in samples.values() {
            for s in band_samples {
                prop_assert!(s.time_fraction_difference <= DEFAULT_MAX_TIME_FRACTION);
                prop_assert_eq!(
                    s.time_fraction_difference,
                    time_fraction_difference(s.reference_time, s.observation_time)
                );
            }
        }
    }

    #[test]
    fn each_observation_matched_at_most_once(table in light_curve()) {
        let (reference, _) = select_reference_band(&table, None).unwrap();
        let samples = match_rescaling_factors(&table, &reference).unwrap();
        let mut seen = HashSet::new();
        for s in samples.values().flatten() {
            prop_assert!(seen.insert(s.observation_index), "index {} matched twice", s.observation_index);
            prop_assert_eq!(&table.get(s.reference_index).unwrap().band_normalized, &reference);
        }
    }

    #[test]
    fn every_other_band_is_classified(table in light_curve()) {
        let (reference, counts) = select_reference_band(&table, None).unwrap();
        prop_assume!(counts.len() > 1);

        let report = compute_color_evolution(&table, &reference).unwrap();
        let expected: HashSet<&str> = counts
            .iter()
            .map(|c| c.band.as_str())
            .filter(|b| *b != reference)
            .collect();
        let classified: HashSet<&str> = report.results.keys().map(String::as_str).collect();
        prop_assert_eq!(expected, classified);

        let partitioned = report.no_evolution_bands().len()
            + report.evolution_bands().len()
            + report.insufficient_bands().len();
        prop_assert_eq!(partitioned, report.results.len());
    }

    #[test]
    fn reference_rows_pass_through(table in light_curve()) {
        let (reference, counts) = select_reference_band(&table, None).unwrap();
        prop_assume!(counts.len() > 1);

        let report = compute_color_evolution(&table, &reference).unwrap();
        if let Ok(rescaled) = rescale(&table, &reference, &report, false) {
            prop_assert_eq!(rescaled.len(), table.len());
            for (row, obs) in rescaled.rows.iter().zip(table.iter()) {
                prop_assert_eq!(&row.observation, obs);
                if obs.band_normalized == reference {
                    prop_assert!(!row.rescaled);
                    prop_assert_eq!(row.rescaled_magnitude, obs.magnitude);
                    prop_assert_eq!(row.rescaled_magnitude_err, obs.magnitude_err);
                }
            }
        }
    }

    #[test]
    fn reference_only_table_is_unchanged(table in single_band_curve()) {
        let rescaled = rescale(&table, "R", &ColorEvolutionReport::empty("R"), false).unwrap();
        prop_assert_eq!(rescaled.len(), table.len());
        prop_assert_eq!(rescaled.rescaled_count(), 0);
        for (row, obs) in rescaled.rows.iter().zip(table.iter()) {
            prop_assert_eq!(row.rescaled_magnitude, obs.magnitude);
            prop_assert_eq!(row.rescaled_magnitude_err, obs.magnitude_err);
        }
    }

    #[test]
    fn reference_selection_is_deterministic(table in light_curve()) {
        let first = select_reference_band(&table, None).unwrap();
        let second = select_reference_band(&table, None).unwrap();
        prop_assert_eq!(&first, &second);

        let (reference, counts) = first;
        let max = counts.iter().map(|c| c.count).max().unwrap();
        prop_assert_eq!(counts[0].count, max);
        prop_assert_eq!(&counts[0].band, &reference);
    }
}
