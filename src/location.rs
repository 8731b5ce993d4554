use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{LocalityType, Location};

static TYPED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+?),\s*(.+?)\s*\((Kab\.|Kota)\)\s*$").expect("typed location pattern")
});

static UNTYPED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?),\s*(.+)$").expect("untyped location pattern"));

/// Parse a raw `Lokasi` value such as `Lampung, Way Kanan (Kab.)`.
///
/// Multi-location values (`A | B`) only contribute their first segment.
/// Never fails: text without a comma maps to itself for both province and
/// locality, and a missing value maps to `Lainnya` everywhere.
pub fn parse_location(raw: Option<&str>) -> Location {
    let Some(raw) = raw else {
        return Location::other();
    };
    let text = raw.split('|').next().unwrap_or_default().trim();

    if let Some(caps) = TYPED.captures(text) {
        let locality_type = if &caps[3] == "Kab." {
            LocalityType::Kabupaten
        } else {
            LocalityType::Kota
        };
        return Location {
            province: caps[1].trim().to_string(),
            locality: caps[2].trim().to_string(),
            locality_type,
        };
    }

    if let Some(caps) = UNTYPED.captures(text) {
        return Location {
            province: caps[1].trim().to_string(),
            locality: caps[2].trim().to_string(),
            locality_type: LocalityType::Lainnya,
        };
    }

    Location {
        province: text.to_string(),
        locality: text.to_string(),
        locality_type: LocalityType::Lainnya,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple(raw: Option<&str>) -> (String, String, &'static str) {
        let loc = parse_location(raw);
        (loc.province, loc.locality, loc.locality_type.as_str())
    }

    #[test]
    fn test_kabupaten() {
        assert_eq!(
            triple(Some("Lampung, Way Kanan (Kab.)")),
            ("Lampung".into(), "Way Kanan".into(), "Kabupaten")
        );
    }

    #[test]
    fn test_kota() {
        assert_eq!(
            triple(Some("DKI Jakarta, Jakarta Pusat (Kota)")),
            ("DKI Jakarta".into(), "Jakarta Pusat".into(), "Kota")
        );
    }

    #[test]
    fn test_only_first_segment_is_parsed() {
        assert_eq!(
            triple(Some("A (Kab.) | B (Kota)")),
            ("A (Kab.)".into(), "A (Kab.)".into(), "Lainnya")
        );
        assert_eq!(
            triple(Some("Bali, Badung (Kab.) | Bali, Denpasar (Kota)")),
            ("Bali".into(), "Badung".into(), "Kabupaten")
        );
    }

    #[test]
    fn test_comma_without_type() {
        assert_eq!(
            triple(Some("Jawa Barat, Seluruh Wilayah")),
            ("Jawa Barat".into(), "Seluruh Wilayah".into(), "Lainnya")
        );
    }

    #[test]
    fn test_no_comma_duplicates_text() {
        assert_eq!(
            triple(Some("  Nasional  ")),
            ("Nasional".into(), "Nasional".into(), "Lainnya")
        );
    }

    #[test]
    fn test_missing_value() {
        assert_eq!(
            triple(None),
            ("Lainnya".into(), "Lainnya".into(), "Lainnya")
        );
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        assert_eq!(
            triple(Some("  Aceh ,   Banda Aceh   (Kota)  ")),
            ("Aceh".into(), "Banda Aceh".into(), "Kota")
        );
    }

    #[test]
    fn test_unknown_parenthesized_type_falls_back() {
        assert_eq!(
            triple(Some("Papua, Mimika (Desa)")),
            ("Papua".into(), "Mimika (Desa)".into(), "Lainnya")
        );
    }

    #[test]
    fn test_total_over_odd_input() {
        for raw in ["", ",", "|", "(Kab.)", ", (Kota)", "a,b,c (Kab.)", "\u{0}\u{ffff}"] {
            let _ = parse_location(Some(raw));
        }
        assert_eq!(triple(Some("a,b,c (Kab.)")), ("a".into(), "b,c".into(), "Kabupaten"));
    }
}
