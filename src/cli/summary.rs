use colored::Colorize;

use crate::aggregate::{summarize, Summary};
use crate::cli::render::{heading, metrics, no_data};
use crate::cli::Session;
use crate::error::Result;
use crate::filter::Filter;
use crate::fmt::{count, percent, rupiah};

pub fn run(session: &mut Session, filter: &Filter) -> Result<String> {
    let dataset = session.dataset()?;
    let view = filter.apply(&dataset);
    let title = format!("Ringkasan RUP: {} ({})", dataset.source, dataset.table);
    if view.is_empty() {
        return Ok(format!("{}\n{}", heading(&title), no_data()));
    }
    Ok(format!("{}\n{}", heading(&title), format_summary(&summarize(&dataset, &view))))
}

fn optional(n: Option<usize>) -> String {
    n.map(count).unwrap_or_else(|| "-".to_string())
}

pub fn format_summary(s: &Summary) -> String {
    metrics(&[
        ("Total Pagu", rupiah(s.total)),
        ("Jumlah Paket", count(s.count)),
        (
            "Pagu ICT",
            format!(
                "{} ({} | {} paket)",
                rupiah(s.ict_total).as_str().green(),
                percent(s.ict_share),
                count(s.ict_count)
            ),
        ),
        (
            "Pagu Non-ICT",
            format!(
                "{} ({} | {} paket)",
                rupiah(s.non_ict_total),
                percent(s.non_ict_share),
                count(s.non_ict_count)
            ),
        ),
        ("Provinsi", count(s.provinces)),
        ("K/L/PD", optional(s.organizations)),
        ("Satuan Kerja", optional(s.sub_units)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_summary_lists_metrics() {
        let s = Summary {
            total: 2_000_000_000.0,
            count: 1234,
            ict_total: 500_000_000.0,
            ict_count: 100,
            ict_share: 25.0,
            non_ict_total: 1_500_000_000.0,
            non_ict_count: 1134,
            non_ict_share: 75.0,
            provinces: 3,
            organizations: Some(12),
            sub_units: None,
        };
        let out = format_summary(&s);
        assert!(out.contains("Rp 2.00 M"));
        assert!(out.contains("1.234"));
        assert!(out.contains("25.00%"));
        assert!(out.contains("Rp 1.50 M (75.00% | 1.134 paket)"));
        assert!(out.lines().any(|l| l.contains("Satuan Kerja") && l.contains('-')));
    }
}
