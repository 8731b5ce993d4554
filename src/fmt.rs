/// Widest a group label may be before it wraps in a table cell.
pub const LABEL_WIDTH: usize = 40;

fn group_thousands(int_part: &str, sep: char) -> String {
    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(sep);
        }
        grouped.push(c);
    }
    grouped.chars().rev().collect()
}

fn with_commas(val: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, val.abs());
    let (int_part, dec_part) = match fixed.split_once('.') {
        Some((i, d)) => (i, Some(d)),
        None => (fixed.as_str(), None),
    };
    let sign = if val < 0.0 { "-" } else { "" };
    match dec_part {
        Some(d) => format!("{sign}{}.{d}", group_thousands(int_part, ',')),
        None => format!("{sign}{}", group_thousands(int_part, ',')),
    }
}

/// Compact Rupiah amount: `Rp 1.50 T`, `Rp 2.25 M`, `Rp 1.5 Jt`, `Rp 950,000`.
pub fn rupiah(val: f64) -> String {
    if !val.is_finite() || val == 0.0 {
        return "Rp 0".to_string();
    }
    let abs = val.abs();
    if abs >= 1e12 {
        format!("Rp {} T", with_commas(val / 1e12, 2))
    } else if abs >= 1e9 {
        format!("Rp {} M", with_commas(val / 1e9, 2))
    } else if abs >= 1e6 {
        format!("Rp {} Jt", with_commas(val / 1e6, 1))
    } else {
        format!("Rp {}", with_commas(val, 0))
    }
}

/// Whole number with dot thousands separators: 12.345
pub fn count(n: usize) -> String {
    group_thousands(&n.to_string(), '.')
}

pub fn percent(val: f64) -> String {
    format!("{val:.2}%")
}

/// Wrap a long group label onto several lines.
pub fn wrap_label(label: &str) -> String {
    textwrap::wrap(label, LABEL_WIDTH).join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rupiah_formatting() {
        assert_eq!(rupiah(0.0), "Rp 0");
        assert_eq!(rupiah(950_000.0), "Rp 950,000");
        assert_eq!(rupiah(1_500_000.0), "Rp 1.5 Jt");
        assert_eq!(rupiah(2_250_000_000.0), "Rp 2.25 M");
        assert_eq!(rupiah(1_500_000_000_000.0), "Rp 1.50 T");
        assert_eq!(rupiah(12_345_000_000_000_000.0), "Rp 12,345.00 T");
    }

    #[test]
    fn test_count_formatting() {
        assert_eq!(count(0), "0");
        assert_eq!(count(999), "999");
        assert_eq!(count(1234567), "1.234.567");
    }

    #[test]
    fn test_percent_and_wrap() {
        assert_eq!(percent(12.3456), "12.35%");
        let wrapped = wrap_label("Dinas Komunikasi Informatika Statistik dan Persandian Kabupaten");
        assert!(wrapped.lines().all(|l| l.len() <= LABEL_WIDTH));
        assert!(wrapped.lines().count() > 1);
    }
}
