use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Aliases folded onto their parent photometric band, keyed by upper-case label.
static BAND_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("U'", "u"),
        ("G'", "g"),
        ("R'", "r"),
        ("I'", "i"),
        ("Z'", "z"),
        ("BJ", "B"),
        ("VJ", "V"),
        ("UJ", "U"),
        ("RM", "R"),
        ("BM", "B"),
        ("UM", "U"),
        ("JS", "J"),
        ("KS", "K"),
        ("K'", "K"),
        ("KP", "K"),
    ])
});

/// Unfiltered labels that only differ in capitalisation between sources.
const UNFILTERED_LABELS: [&str; 3] = ["clear", "unfiltered", "lum"];

/// Band label canonicalization ("band approximation")
pub struct BandApproximator;

impl BandApproximator {
    /// Canonical label for `band`; labels without an alias pass through.
    ///
    /// # Examples
    ///
    /// ```
    /// use grblc_rust::parsing::BandApproximator;
    ///
    /// assert_eq!(BandApproximator::approximate("r'"), "r");
    /// assert_eq!(BandApproximator::approximate("Ks"), "K");
    /// assert_eq!(BandApproximator::approximate("CLEAR"), "clear");
    /// assert_eq!(BandApproximator::approximate("Rc"), "Rc");
    /// ```
    pub fn approximate(band: &str) -> String {
        let trimmed = band.trim();
        let lower = trimmed.to_lowercase();
        if UNFILTERED_LABELS.contains(&lower.as_str()) {
            return lower;
        }
        match BAND_ALIASES.get(trimmed.to_uppercase().as_str()) {
            Some(canonical) => canonical.to_string(),
            None => trimmed.to_string(),
        }
    }

    pub fn approximate_batch(bands: &[&str]) -> Vec<String> {
        bands.iter().map(|b| Self::approximate(b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primed_sloan_bands_drop_the_prime() {
        for (raw, expected) in [("u'", "u"), ("g'", "g"), ("r'", "r"), ("i'", "i"), ("z'", "z")] {
            assert_eq!(BandApproximator::approximate(raw), expected);
        }
    }

    #[test]
    fn johnson_and_infrared_aliases() {
        let raw = vec!["BJ", "vj", "Uj", "RM", "Bm", "UM", "Js", "KS", "k'", "Kp"];
        let approximated = BandApproximator::approximate_batch(&raw);
        assert_eq!(approximated, vec!["B", "V", "U", "R", "B", "U", "J", "K", "K", "K"]);
    }

    #[test]
    fn unknown_labels_pass_through_unchanged() {
        assert_eq!(BandApproximator::approximate("Rc"), "Rc");
        assert_eq!(BandApproximator::approximate("white"), "white");
        assert_eq!(BandApproximator::approximate(" R "), "R");
    }

    #[test]
    fn unfiltered_labels_are_lower_cased() {
        assert_eq!(BandApproximator::approximate("Unfiltered"), "unfiltered");
        assert_eq!(BandApproximator::approximate("LUM"), "lum");
    }
}
