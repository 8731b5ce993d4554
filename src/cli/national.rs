use crate::aggregate::{self, DeepDive, NationalOverview, WIDE_REACH_SUB_UNITS};
use crate::cli::render::{group_table, group_table_marked, heading, metrics, no_data, Extras};
use crate::cli::Session;
use crate::error::Result;
use crate::filter::{Filter, SectorView};
use crate::fmt::{count, percent, rupiah};
use crate::models::LocalityType;

const SATKER: Extras<'static> = Extras {
    distinct: Some("Satker"),
    first: None,
};

// ---------------------------------------------------------------------------
// Data-fetching wrappers
// ---------------------------------------------------------------------------

pub fn overview(session: &mut Session, sector: SectorView, filter: &Filter) -> Result<String> {
    let dataset = session.dataset()?;
    let view = filter.apply(&dataset).sector(sector);
    if view.is_empty() {
        return Ok(format!("{}\n{}", heading(&title(sector)), no_data()));
    }
    let report = aggregate::national_overview(&dataset, &view, &session.limits());
    Ok(format_overview(&report))
}

pub fn categories(session: &mut Session, filter: &Filter) -> Result<String> {
    let dataset = session.dataset()?;
    let view = filter.apply(&dataset);
    let table = aggregate::category_breakdown(&view);
    let mut out = group_table("Kategori ICT", &table, Extras::default());
    if !table.is_empty() {
        out.push_str(&format!(
            "\nTotal ICT: {} dari {} ({})",
            rupiah(table.universe),
            rupiah(view.universe),
            percent(if view.universe > 0.0 {
                table.universe / view.universe * 100.0
            } else {
                0.0
            })
        ));
    }
    Ok(out)
}

pub fn deep_dive(
    session: &mut Session,
    province: &str,
    locality_type: Option<LocalityType>,
    sector: SectorView,
    filter: &Filter,
) -> Result<String> {
    let dataset = session.dataset()?;
    let view = filter.apply(&dataset).sector(sector);
    let report = aggregate::deep_dive(&dataset, &view, province, locality_type, &session.limits())?;
    Ok(format_deep_dive(&report))
}

// ---------------------------------------------------------------------------
// Pure formatting
// ---------------------------------------------------------------------------

fn title(sector: SectorView) -> String {
    format!("Ringkasan Nasional: {}", sector.label())
}

pub fn format_overview(report: &NationalOverview) -> String {
    let label = report.sector.label();
    let mut sections = vec![
        heading(&format!(
            "{} | {} | {} paket | {} provinsi",
            title(report.sector),
            rupiah(report.universe),
            count(report.count),
            count(report.province_count)
        )),
        group_table(
            &format!("Top Provinsi ({label})"),
            &report.provinces,
            SATKER,
        ),
    ];
    if let Some(t) = &report.organizations {
        sections.push(group_table_marked(
            &format!("Top K/L/PD ({label})"),
            t,
            SATKER,
            |row| row.distinct.unwrap_or(0) >= WIDE_REACH_SUB_UNITS,
        ));
    }
    if let Some(t) = &report.sub_units {
        sections.push(group_table(
            &format!("Top Satuan Kerja ({label})"),
            t,
            Extras {
                distinct: None,
                first: Some("K/L/PD Induk"),
            },
        ));
    }
    if let Some(t) = &report.procurement_types {
        sections.push(group_table("Per Jenis Pengadaan", t, Extras::default()));
    }
    if let Some(t) = &report.methods {
        sections.push(group_table("Per Metode Pemilihan", t, Extras::default()));
    }
    if let Some(t) = &report.timeline {
        sections.push(group_table(
            &format!("Timeline Pemilihan ({label})"),
            t,
            Extras::default(),
        ));
    }
    sections.join("\n\n")
}

pub fn format_deep_dive(report: &DeepDive) -> String {
    let scope = match report.locality_type {
        Some(t) => format!("{} ({t})", report.province),
        None => report.province.clone(),
    };
    let optional = |n: Option<usize>| n.map(count).unwrap_or_else(|| "-".to_string());
    let mut sections = vec![
        heading(&format!("{scope}: {}", report.sector.label())),
        metrics(&[
            (
                "Total Pagu",
                format!("{} ({} dari semesta)", rupiah(report.total), percent(report.share)),
            ),
            ("Jumlah Paket", count(report.count)),
            ("K/L/PD", optional(report.organizations)),
            ("Satuan Kerja", optional(report.sub_units)),
        ]),
        group_table(
            &format!("Top Kab/Kota: {}", report.province),
            &report.localities,
            Extras::default(),
        ),
    ];
    if let Some(t) = &report.top_sub_units {
        sections.push(group_table(
            &format!("Top Satuan Kerja: {}", report.province),
            t,
            Extras::default(),
        ));
    }
    if let Some(t) = &report.procurement_types {
        sections.push(group_table("Per Jenis Pengadaan", t, Extras::default()));
    }
    if let Some(t) = &report.methods {
        sections.push(group_table("Per Metode", t, Extras::default()));
    }
    sections.join("\n\n")
}
