use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::aggregate::{GroupRow, GroupTable};
use crate::fmt::{count, percent, rupiah, wrap_label};
use crate::models::ProcurementRecord;

pub const NO_DATA: &str = "Tidak ada data untuk pilihan ini.";

pub fn heading(title: &str) -> String {
    format!("{}", title.bold())
}

pub fn no_data() -> String {
    format!("{}", NO_DATA.dimmed())
}

fn money_cell(val: f64) -> Cell {
    Cell::new(rupiah(val)).set_alignment(CellAlignment::Right)
}

fn num_cell(n: usize) -> Cell {
    Cell::new(count(n)).set_alignment(CellAlignment::Right)
}

/// Optional extra columns of a group table.
#[derive(Debug, Clone, Copy, Default)]
pub struct Extras<'a> {
    pub distinct: Option<&'a str>,
    pub first: Option<&'a str>,
}

pub fn group_table(title: &str, table: &GroupTable, extras: Extras) -> String {
    group_table_marked(title, table, extras, |_| false)
}

/// Ranked group table. Rows for which `mark` holds get a star.
pub fn group_table_marked<F>(title: &str, table: &GroupTable, extras: Extras, mark: F) -> String
where
    F: Fn(&GroupRow) -> bool,
{
    let mut out = heading(title);
    out.push('\n');
    if table.is_empty() {
        out.push_str(&no_data());
        return out;
    }

    let mut header = vec!["#", table.dimension.label(), "Total Pagu", "Paket"];
    if let Some(label) = extras.distinct {
        header.push(label);
    }
    if let Some(label) = extras.first {
        header.push(label);
    }
    header.push("% Semesta");

    let mut t = Table::new();
    t.set_header(header);
    for (i, row) in table.rows.iter().enumerate() {
        let key = if mark(row) {
            format!("★ {}", row.key)
        } else {
            row.key.clone()
        };
        let mut cells = vec![
            Cell::new(i + 1),
            Cell::new(wrap_label(&key)),
            money_cell(row.total),
            num_cell(row.count),
        ];
        if extras.distinct.is_some() {
            cells.push(num_cell(row.distinct.unwrap_or(0)));
        }
        if extras.first.is_some() {
            cells.push(Cell::new(wrap_label(row.first.as_deref().unwrap_or("-"))));
        }
        cells.push(Cell::new(percent(row.share)).set_alignment(CellAlignment::Right));
        t.add_row(cells);
    }
    out.push_str(&t.to_string());
    if table.groups > table.rows.len() {
        out.push_str(&format!(
            "\nDari {} {}, ditampilkan {} dari {}",
            count(table.groups),
            table.dimension.label().to_lowercase(),
            rupiah(table.displayed_total()),
            rupiah(table.grouped_total)
        ));
    }
    out
}

/// Largest packages, one per row.
pub fn packages_table(title: &str, packages: &[&ProcurementRecord]) -> String {
    let mut out = heading(title);
    out.push('\n');
    if packages.is_empty() {
        out.push_str(&no_data());
        return out;
    }
    let mut t = Table::new();
    t.set_header(vec!["Nama Paket", "Pagu", "Jenis", "Metode", "Sektor"]);
    for p in packages {
        t.add_row(vec![
            Cell::new(wrap_label(p.package_name.as_deref().unwrap_or("-"))),
            money_cell(p.budget),
            Cell::new(p.procurement_type.as_deref().unwrap_or("-")),
            Cell::new(p.method.as_deref().unwrap_or("-")),
            Cell::new(p.sector().label()),
        ]);
    }
    out.push_str(&t.to_string());
    out
}

/// Two-column label/value block for metric cards.
pub fn metrics(rows: &[(&str, String)]) -> String {
    let mut t = Table::new();
    for (label, value) in rows {
        t.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    t.to_string()
}
