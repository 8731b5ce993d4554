use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info};

use crate::classifier::RuleSet;
use crate::error::{Result, RupError};
use crate::location::parse_location;
use crate::models::{Classification, Dataset, Field, Location, ProcurementRecord};

// ---------------------------------------------------------------------------
// Column discovery
// ---------------------------------------------------------------------------

/// Known source column names per semantic field, in resolution order.
pub const FIELD_ALIASES: &[(Field, &[&str])] = &[
    (Field::PackageName, &["Nama_Paket", "Paket", "Nama Paket"]),
    (Field::Budget, &["Pagu_Rp", "Pagu", "Pagu (Rp)"]),
    (Field::ProcurementType, &["Jenis_Pengadaan", "Jenis Pengadaan"]),
    (Field::Method, &["Metode", "Metode_Pemilihan"]),
    (Field::Organization, &["K/L/PD", "KLPD", "Instansi", "K_L_PD"]),
    (Field::SubUnit, &["Satuan_Kerja", "Satuan Kerja", "Satker"]),
    (Field::Location, &["Lokasi"]),
    (Field::Timeline, &["Pemilihan", "Waktu_Pemilihan", "Jadwal_Pemilihan"]),
    (Field::Id, &["ID_RUP", "ID", "Kode_RUP", "No"]),
    (Field::SmallBusiness, &["Usaha_Kecil", "Usaha Kecil/Koperasi"]),
    (Field::DomesticProduct, &["Produk_DN", "Produk_Dalam_Negeri", "Produk Dalam Negeri"]),
];

/// Shortest name allowed to take part in substring matching.
const MIN_CONTAINS_LEN: usize = 3;

/// Lowercase and drop everything that is not a letter or digit.
pub fn normalize_header(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Resolved mapping from semantic field to source column index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMap {
    columns: BTreeMap<Field, usize>,
}

impl ColumnMap {
    /// Exact (normalized) alias matches are settled first for every field,
    /// then unresolved fields fall back to substring containment. A column is
    /// never claimed twice.
    pub fn resolve(headers: &[String]) -> Self {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
        let mut columns = BTreeMap::new();
        let mut claimed = BTreeSet::new();

        for (field, aliases) in FIELD_ALIASES {
            let hit = aliases.iter().map(|a| normalize_header(a)).find_map(|alias| {
                normalized
                    .iter()
                    .position(|h| *h == alias)
                    .filter(|idx| !claimed.contains(idx))
            });
            if let Some(idx) = hit {
                columns.insert(*field, idx);
                claimed.insert(idx);
            }
        }

        for (field, aliases) in FIELD_ALIASES {
            if columns.contains_key(field) {
                continue;
            }
            let hit = aliases.iter().map(|a| normalize_header(a)).find_map(|alias| {
                normalized.iter().enumerate().position(|(idx, h)| {
                    !claimed.contains(&idx) && contains_either(h, &alias)
                })
            });
            if let Some(idx) = hit {
                columns.insert(*field, idx);
                claimed.insert(idx);
            }
        }

        Self { columns }
    }

    pub fn index(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    pub fn fields(&self) -> BTreeSet<Field> {
        self.columns.keys().copied().collect()
    }
}

fn contains_either(header: &str, alias: &str) -> bool {
    let shorter = header.len().min(alias.len());
    shorter >= MIN_CONTAINS_LEN && (header.contains(alias) || alias.contains(header))
}

// ---------------------------------------------------------------------------
// Value normalization
// ---------------------------------------------------------------------------

/// Turn a free-text budget such as `Rp 1.500.000` into a number.
///
/// Keeps digits and `.` only. Several dots are thousands separators and are
/// dropped; a single dot is a decimal point. A trailing decimal comma with one
/// or two digits (`1.500.000,50`) is discarded first. Anything unparseable is 0.
pub fn normalize_budget_text(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };
    let raw = raw.trim_end();
    let raw = match raw.rfind(',') {
        Some(pos)
            if (2..=3).contains(&(raw.len() - pos))
                && raw[pos + 1..].chars().all(|c| c.is_ascii_digit()) =>
        {
            &raw[..pos]
        }
        _ => raw,
    };
    let kept: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    let kept = if kept.matches('.').count() > 1 {
        kept.replace('.', "")
    } else {
        kept
    };
    match kept.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v,
        _ => 0.0,
    }
}

/// Budget from a raw cell: native numbers pass through, text is normalized.
pub fn normalize_budget(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Integer(i)) => (*i).max(0) as f64,
        Some(Value::Real(r)) if r.is_finite() => r.max(0.0),
        Some(Value::Text(s)) => normalize_budget_text(Some(s.as_str())),
        Some(Value::Blob(b)) => normalize_budget_text(Some(String::from_utf8_lossy(b).as_ref())),
        _ => 0.0,
    }
}

/// Text form of a raw cell. `NULL` is absent.
pub fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(r) if r.fract() == 0.0 && r.abs() < 1e15 => Some(format!("{}", *r as i64)),
        Value::Real(r) => Some(r.to_string()),
        Value::Text(s) => Some(s.clone()),
        Value::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
    }
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// A table read in full: header names plus rows of dynamic values.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// File-backed tabular store, dispatched on file kind.
pub enum Store {
    Sqlite { path: PathBuf, conn: Connection },
    Csv { path: PathBuf },
}

impl Store {
    /// Open a store read-only. A file that cannot be opened is `SourceUnavailable`.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(RupError::SourceUnavailable(format!(
                "{} not found",
                path.display()
            )));
        }
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if is_csv {
            return Ok(Self::Csv { path: path.to_path_buf() });
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| RupError::SourceUnavailable(format!("{}: {e}", path.display())))?;
        Ok(Self::Sqlite { path: path.to_path_buf(), conn })
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Sqlite { path, .. } | Self::Csv { path } => path,
        }
    }

    pub fn table_names(&self) -> Result<Vec<String>> {
        match self {
            Self::Sqlite { path, conn } => {
                let mut stmt = conn
                    .prepare(
                        "SELECT name FROM sqlite_master WHERE type='table' \
                         AND name NOT LIKE 'sqlite_%' ORDER BY rowid",
                    )
                    .map_err(|e| RupError::SourceUnavailable(format!("{}: {e}", path.display())))?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<String>, _>>()?;
                Ok(names)
            }
            Self::Csv { path } => Ok(vec![path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "csv".to_string())]),
        }
    }

    pub fn read_table(&self, name: &str) -> Result<RawTable> {
        match self {
            Self::Sqlite { conn, .. } => {
                let sql = format!("SELECT * FROM \"{}\"", name.replace('"', "\"\""));
                let mut stmt = conn.prepare(&sql)?;
                let headers: Vec<String> =
                    stmt.column_names().iter().map(|c| c.to_string()).collect();
                let width = headers.len();
                let rows = stmt
                    .query_map([], |row| {
                        (0..width)
                            .map(|i| row.get::<_, Value>(i))
                            .collect::<rusqlite::Result<Vec<Value>>>()
                    })?
                    .collect::<std::result::Result<Vec<Vec<Value>>, _>>()?;
                Ok(RawTable { name: name.to_string(), headers, rows })
            }
            Self::Csv { path } => {
                let mut rdr = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
                let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
                let width = headers.len();
                let mut rows = Vec::new();
                for record in rdr.records() {
                    let record = record?;
                    let row = (0..width)
                        .map(|i| match record.get(i) {
                            Some(s) if !s.is_empty() => Value::Text(s.to_string()),
                            _ => Value::Null,
                        })
                        .collect();
                    rows.push(row);
                }
                Ok(RawTable { name: name.to_string(), headers, rows })
            }
        }
    }
}

/// Prefer a table whose name mentions `rup`, otherwise the first one.
pub fn select_table(names: &[String]) -> Option<&String> {
    names
        .iter()
        .find(|n| n.to_lowercase().contains("rup"))
        .or_else(|| names.first())
}

// ---------------------------------------------------------------------------
// Enrichment
// ---------------------------------------------------------------------------

fn enrich_row(row: &[Value], columns: &ColumnMap, rules: &RuleSet) -> ProcurementRecord {
    let text = |field: Field| -> Option<String> {
        columns
            .index(field)
            .and_then(|idx| row.get(idx))
            .and_then(cell_text)
    };

    let location_raw = text(Field::Location);
    let location = if columns.index(Field::Location).is_some() {
        parse_location(location_raw.as_deref())
    } else {
        Location::other()
    };

    let package_name = text(Field::PackageName);
    let classification = if columns.index(Field::PackageName).is_some() {
        rules.classify(package_name.as_deref())
    } else {
        Classification::NON_ICT
    };

    let budget = columns
        .index(Field::Budget)
        .map(|idx| normalize_budget(row.get(idx)))
        .unwrap_or(0.0);

    ProcurementRecord {
        id: text(Field::Id),
        package_name,
        budget,
        procurement_type: text(Field::ProcurementType),
        method: text(Field::Method),
        organization: text(Field::Organization),
        sub_unit: text(Field::SubUnit),
        location_raw,
        timeline: text(Field::Timeline),
        small_business: text(Field::SmallBusiness),
        domestic_product: text(Field::DomesticProduct),
        location,
        classification,
    }
}

/// Enrich an already-read table in one pass.
pub fn enrich_table(source: &str, table: RawTable, rules: &RuleSet) -> Dataset {
    let columns = ColumnMap::resolve(&table.headers);
    let fields = columns.fields();
    let missing: Vec<&str> = Field::ALL
        .iter()
        .filter(|f| !fields.contains(f))
        .map(|f| f.label())
        .collect();
    if !missing.is_empty() {
        debug!(table = %table.name, ?missing, "Fields without a matching column");
    }

    let records = table
        .rows
        .iter()
        .map(|row| enrich_row(row, &columns, rules))
        .collect();

    Dataset {
        source: source.to_string(),
        table: table.name,
        fields,
        records,
    }
}

/// Load and enrich the procurement table of a store.
///
/// A store that cannot be opened is an error; a store with no table or no rows
/// yields an empty dataset so the caller can report "no data" separately.
pub fn load_dataset(path: &Path, rules: &RuleSet) -> Result<Dataset> {
    let store = Store::open(path)?;
    let source = store.path().display().to_string();
    let names = store.table_names()?;
    let Some(table) = select_table(&names) else {
        info!(source = %source, "Store has no tables");
        return Ok(Dataset { source, ..Dataset::default() });
    };
    let raw = store.read_table(table)?;
    let dataset = enrich_table(&source, raw, rules);
    info!(
        source = %dataset.source,
        table = %dataset.table,
        rows = dataset.len(),
        fields = dataset.fields.len(),
        "Loaded procurement plan"
    );
    Ok(dataset)
}
