//! Stable place identity derived from coordinates.
//!
//! Identity is coordinate-based, never name-based: re-extracting the same
//! location under a slightly different name string ("Eiffel Tower" vs
//! "the Eiffel Tower, Paris") still maps to the same place. Coordinates are
//! rounded to 5 decimal places (~1 m at the equator) before hashing, so any
//! two resolutions within that precision share an id.

/// Decimal places kept when rounding coordinates for identity.
pub const COORD_PRECISION: i32 = 5;

/// Round a coordinate to [`COORD_PRECISION`] decimal places.
///
/// Negative zero is normalised to positive zero so that values straddling
/// the rounding boundary at 0 produce the same key.
pub fn round_coord(v: f64) -> f64 {
    let factor = 10f64.powi(COORD_PRECISION);
    let rounded = (v * factor).round() / factor;
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Derive the stable id for a coordinate pair.
///
/// The id is the first 16 hex characters of the blake3 hash of the rounded
/// `"lat,lng"` key. Deterministic, and independent of any name string.
pub fn place_id(lat: f64, lng: f64) -> String {
    let key = format!(
        "{:.prec$},{:.prec$}",
        round_coord(lat),
        round_coord(lng),
        prec = COORD_PRECISION as usize
    );
    blake3::hash(key.as_bytes()).to_hex()[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        assert_eq!(place_id(48.8584, 2.2945), place_id(48.8584, 2.2945));
    }

    #[test]
    fn id_is_16_hex_chars() {
        let id = place_id(48.8584, 2.2945);
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn within_rounding_precision_same_id() {
        // Differ only in the 6th decimal place.
        assert_eq!(place_id(48.858401, 2.294502), place_id(48.858399, 2.294498));
    }

    #[test]
    fn beyond_rounding_precision_different_id() {
        assert_ne!(place_id(48.8584, 2.2945), place_id(48.8585, 2.2945));
    }

    #[test]
    fn latitude_and_longitude_not_interchangeable() {
        assert_ne!(place_id(2.2945, 48.8584), place_id(48.8584, 2.2945));
    }

    #[test]
    fn negative_zero_normalised() {
        assert_eq!(place_id(-0.000001, 0.0), place_id(0.000001, 0.0));
    }

    #[test]
    fn round_coord_exact_values() {
        assert_eq!(round_coord(48.858401), 48.8584);
        assert_eq!(round_coord(1.000014), 1.00001);
        assert_eq!(round_coord(1.000016), 1.00002);
        assert_eq!(round_coord(0.0), 0.0);
    }
}
