use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use crate::error::Result;
use crate::models::{Dataset, Field, ProcurementRecord};

/// Columns computed at load time, written after the source fields.
pub const DERIVED_COLUMNS: [&str; 6] = [
    "Provinsi",
    "Daerah",
    "Tipe_Daerah",
    "Is_ICT",
    "Kategori_ICT",
    "Sektor",
];

/// Header row for a dataset: its resolved fields in canonical order, then the derived columns.
pub fn header(dataset: &Dataset) -> Vec<&'static str> {
    Field::ALL
        .iter()
        .filter(|f| dataset.has(**f))
        .map(|f| f.label())
        .chain(DERIVED_COLUMNS)
        .collect()
}

fn row(dataset: &Dataset, record: &ProcurementRecord) -> Vec<String> {
    let mut cells: Vec<String> = Field::ALL
        .iter()
        .filter(|f| dataset.has(**f))
        .map(|f| match f {
            Field::Budget => record.budget.to_string(),
            other => record.text(*other).unwrap_or_default().to_string(),
        })
        .collect();
    cells.extend([
        record.location.province.clone(),
        record.location.locality.clone(),
        record.location.locality_type.to_string(),
        if record.is_ict() { "True" } else { "False" }.to_string(),
        record.category().map(|c| c.name().to_string()).unwrap_or_default(),
        record.sector().label().to_string(),
    ]);
    cells
}

/// Write records as UTF-8 CSV with a header row. Returns the number of data rows.
pub fn write_records<W: Write>(
    writer: W,
    dataset: &Dataset,
    records: &[&ProcurementRecord],
) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(header(dataset))?;
    for record in records {
        wtr.write_record(row(dataset, record))?;
    }
    wtr.flush()?;
    Ok(records.len())
}

/// `<prefix>_<label>_<YYYYMMDD>.csv`, with anything but letters, digits and `-` in the label replaced.
pub fn file_name(prefix: &str, label: &str, date: NaiveDate) -> String {
    let label: String = label
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("{prefix}_{label}_{}.csv", date.format("%Y%m%d"))
}

pub fn default_path(dir: &Path, prefix: &str, label: &str) -> PathBuf {
    dir.join(file_name(prefix, label, chrono::Local::now().date_naive()))
}

pub fn write_csv(path: &Path, dataset: &Dataset, records: &[&ProcurementRecord]) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    let rows = write_records(file, dataset, records)?;
    info!(path = %path.display(), rows, "Exported CSV");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::RuleSet;
    use crate::filter::{Filter, SectorView};
    use crate::loader::load_dataset;

    fn seed(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("RUP.db");
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE rup (Nama_Paket TEXT, Pagu TEXT, KLPD TEXT, Satuan_Kerja TEXT, Lokasi TEXT, Metode TEXT);
             INSERT INTO rup VALUES ('Pengadaan Jasa Internet Kantor', 'Rp 1.500.000', 'Kab. Way Kanan', 'Diskominfo', 'Lampung, Way Kanan (Kab.)', 'E-Purchasing');
             INSERT INTO rup VALUES ('Pembelian Meja Kursi', '2500000.5', 'Kota Bandung', 'Setda', 'Jawa Barat, Bandung (Kota)', 'Tender');
             INSERT INTO rup VALUES ('Lisensi Software Antivirus', '750000', 'Kota Bandung', 'Diskominfo', 'Jawa Barat, Bandung (Kota) | Jawa Barat, Cimahi (Kota)', NULL);
             INSERT INTO rup VALUES ('Internet untuk Rumah Sakit, \"Daerah\"', NULL, 'Kota Bandung', 'RSUD', NULL, 'Tender');",
        )
        .unwrap();
        path
    }

    #[test]
    fn test_header_skips_absent_fields() {
        let dir = tempfile::tempdir().unwrap();
        let ds = load_dataset(&seed(&dir), &RuleSet::standard().unwrap()).unwrap();
        assert_eq!(
            header(&ds),
            vec![
                "Nama_Paket", "Pagu_Rp", "Metode", "KLPD", "Satuan_Kerja", "Lokasi",
                "Provinsi", "Daerah", "Tipe_Daerah", "Is_ICT", "Kategori_ICT", "Sektor",
            ]
        );
    }

    #[test]
    fn test_export_reload_preserves_rows_and_budget() {
        let dir = tempfile::tempdir().unwrap();
        let rules = RuleSet::standard().unwrap();
        let ds = load_dataset(&seed(&dir), &rules).unwrap();
        let view = Filter {
            provinces: vec!["Jawa Barat".into(), "Lainnya".into()],
            ..Filter::default()
        }
        .apply(&ds);
        assert_eq!(view.len(), 3);

        let out = dir.path().join("out").join("view.csv");
        assert_eq!(write_csv(&out, &ds, &view.records).unwrap(), 3);

        let reloaded = load_dataset(&out, &rules).unwrap();
        assert_eq!(reloaded.len(), view.len());
        let sum: f64 = reloaded.records.iter().map(|r| r.budget).sum();
        assert_eq!(sum, view.universe);
        let ict = Filter::default().apply(&reloaded).sector(SectorView::Ict);
        assert_eq!(ict.len(), view.sector(SectorView::Ict).len());
    }

    #[test]
    fn test_derived_columns_written() {
        let dir = tempfile::tempdir().unwrap();
        let ds = load_dataset(&seed(&dir), &RuleSet::standard().unwrap()).unwrap();
        let records: Vec<&ProcurementRecord> = ds.records.iter().take(1).collect();
        let mut buf = Vec::new();
        write_records(&mut buf, &ds, &records).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let line = text.lines().nth(1).unwrap();
        assert!(line.ends_with("Lampung,Way Kanan,Kabupaten,True,Connectivity,ICT"));
        assert!(line.contains(",1500000,"));
    }

    #[test]
    fn test_file_name_format() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(
            file_name("Top10_Provinsi", "Sektor ICT", date),
            "Top10_Provinsi_Sektor_ICT_20250307.csv"
        );
        assert_eq!(file_name("RUP", "Non-ICT", date), "RUP_Non-ICT_20250307.csv");
    }
}
