use std::collections::{HashMap, HashSet};

use crate::error::{Result, RupError};
use crate::filter::{SectorView, View};
use crate::models::{Dataset, Field, LocalityType, ProcurementRecord};

// ---------------------------------------------------------------------------
// Dimensions
// ---------------------------------------------------------------------------

/// A grouping key over enriched records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Dimension {
    Province,
    Organization,
    SubUnit,
    Locality,
    ProcurementType,
    Method,
    Category,
    Timeline,
}

impl Dimension {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Province => "Provinsi",
            Self::Organization => "K/L/PD",
            Self::SubUnit => "Satuan Kerja",
            Self::Locality => "Kab/Kota",
            Self::ProcurementType => "Jenis Pengadaan",
            Self::Method => "Metode",
            Self::Category => "Kategori ICT",
            Self::Timeline => "Pemilihan",
        }
    }

    /// Prefix used in export file names.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Province => "Provinsi",
            Self::Organization => "KLPD",
            Self::SubUnit => "Satker",
            Self::Locality => "Daerah",
            Self::ProcurementType => "Jenis",
            Self::Method => "Metode",
            Self::Category => "Kategori",
            Self::Timeline => "Timeline",
        }
    }

    /// Source field the dimension depends on. Panels over a missing field are omitted.
    pub fn required_field(&self) -> Field {
        match self {
            Self::Province | Self::Locality => Field::Location,
            Self::Organization => Field::Organization,
            Self::SubUnit => Field::SubUnit,
            Self::ProcurementType => Field::ProcurementType,
            Self::Method => Field::Method,
            Self::Category => Field::PackageName,
            Self::Timeline => Field::Timeline,
        }
    }

    /// Province is always derivable (unparsed locations fall back to "Lainnya").
    pub fn available(&self, dataset: &Dataset) -> bool {
        matches!(self, Self::Province) || dataset.has(self.required_field())
    }

    /// Group key of a record, `None` when the value is missing.
    pub fn key(&self, record: &ProcurementRecord) -> Option<String> {
        match self {
            Self::Province => Some(record.location.province.clone()),
            Self::Locality => Some(locality_label(
                &record.location.locality,
                record.location.locality_type,
            )),
            Self::Category => record.category().map(|c| c.name().to_string()),
            Self::Organization => record.organization.clone(),
            Self::SubUnit => record.sub_unit.clone(),
            Self::ProcurementType => record.procurement_type.clone(),
            Self::Method => record.method.clone(),
            Self::Timeline => record.timeline.clone(),
        }
    }

    /// Whether a record belongs to the group named `name` (case-insensitive).
    /// Localities also match on the bare locality name.
    pub fn matches(&self, record: &ProcurementRecord, name: &str) -> bool {
        let name = name.trim();
        if *self == Self::Locality && record.location.locality.eq_ignore_ascii_case(name) {
            return true;
        }
        self.key(record)
            .is_some_and(|k| k.trim().eq_ignore_ascii_case(name))
    }
}

/// `Way Kanan (Kab.)`, `Jakarta Pusat (Kot.)`.
pub fn locality_label(locality: &str, kind: LocalityType) -> String {
    format!("{locality} ({}.)", kind.short())
}

// ---------------------------------------------------------------------------
// Timeline ordering
// ---------------------------------------------------------------------------

const MONTHS: [[&str; 2]; 12] = [
    ["january", "januari"],
    ["february", "februari"],
    ["march", "maret"],
    ["april", "april"],
    ["may", "mei"],
    ["june", "juni"],
    ["july", "juli"],
    ["august", "agustus"],
    ["september", "september"],
    ["october", "oktober"],
    ["november", "november"],
    ["december", "desember"],
];

/// Sort key for timeline labels: month index x 100 + trailing year digits.
/// Labels without a month name get `u32::MAX`.
pub fn timeline_sort_key(label: &str) -> u32 {
    let lower = label.to_lowercase();
    let Some(month) = MONTHS
        .iter()
        .position(|names| names.iter().any(|n| lower.contains(n)))
    else {
        return u32::MAX;
    };
    let year = label
        .split_whitespace()
        .last()
        .filter(|t| !t.is_empty() && t.chars().all(|c| c.is_ascii_digit()))
        .and_then(|t| t.parse::<u32>().ok())
        .unwrap_or(0);
    (month as u32 + 1)
        .saturating_mul(100)
        .saturating_add(year)
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// What to compute per group besides the budget sum and count.
#[derive(Debug, Clone, PartialEq)]
pub struct Grouping {
    pub dimension: Dimension,
    pub distinct: Option<Field>,
    pub first: Option<Field>,
    pub top_n: Option<usize>,
    pub drop_zero: bool,
}

impl Grouping {
    pub fn by(dimension: Dimension) -> Self {
        Self {
            dimension,
            distinct: None,
            first: None,
            top_n: None,
            drop_zero: false,
        }
    }

    pub fn distinct(mut self, field: Field) -> Self {
        self.distinct = Some(field);
        self
    }

    pub fn first(mut self, field: Field) -> Self {
        self.first = Some(field);
        self
    }

    pub fn top(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    pub fn nonzero(mut self) -> Self {
        self.drop_zero = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    pub key: String,
    pub total: f64,
    pub count: usize,
    /// Distinct non-missing values of the grouping's secondary field.
    pub distinct: Option<usize>,
    /// First non-missing value of the grouping's `first` field.
    pub first: Option<String>,
    /// Percent of the universe total.
    pub share: f64,
}

/// A ranked, possibly truncated table of groups.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTable {
    pub dimension: Dimension,
    pub rows: Vec<GroupRow>,
    /// Number of groups before truncation.
    pub groups: usize,
    /// Budget sum over all groups before truncation.
    pub grouped_total: f64,
    pub universe: f64,
}

impl GroupTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn displayed_total(&self) -> f64 {
        self.rows.iter().map(|r| r.total).sum()
    }
}

#[cfg(test)]
impl GroupTable {
    pub fn keys(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.key.as_str()).collect()
    }

    /// Re-aggregate this table's rows by its own dimension.
    pub fn regroup(&self, top_n: Option<usize>) -> GroupTable {
        let mut merged: Vec<GroupRow> = Vec::with_capacity(self.rows.len());
        let mut index: HashMap<&str, usize> = HashMap::new();
        for row in &self.rows {
            match index.get(row.key.as_str()) {
                Some(&i) => {
                    merged[i].total += row.total;
                    merged[i].count += row.count;
                    merged[i].share = share(merged[i].total, self.universe);
                }
                None => {
                    index.insert(row.key.as_str(), merged.len());
                    merged.push(row.clone());
                }
            }
        }
        let rows = rank(merged, self.dimension, top_n);
        GroupTable {
            dimension: self.dimension,
            rows,
            groups: self.groups,
            grouped_total: self.grouped_total,
            universe: self.universe,
        }
    }
}

fn share(total: f64, universe: f64) -> f64 {
    if universe > 0.0 {
        total / universe * 100.0
    } else {
        0.0
    }
}

/// Stable ordering then truncation. Timeline is calendar order, everything
/// else is budget descending with ties kept in input order.
fn rank(mut rows: Vec<GroupRow>, dimension: Dimension, top_n: Option<usize>) -> Vec<GroupRow> {
    if dimension == Dimension::Timeline {
        rows.sort_by_key(|r| timeline_sort_key(&r.key));
    } else {
        rows.sort_by(|a, b| b.total.total_cmp(&a.total));
    }
    if let Some(n) = top_n {
        rows.truncate(n);
    }
    rows
}

struct Acc<'a> {
    key: String,
    total: f64,
    count: usize,
    distinct: HashSet<&'a str>,
    first: Option<&'a str>,
}

/// Group `records`, rank, truncate and annotate each row with its share of `universe`.
pub fn aggregate<'a, I>(records: I, grouping: &Grouping, universe: f64) -> GroupTable
where
    I: IntoIterator<Item = &'a ProcurementRecord>,
{
    let mut accs: Vec<Acc<'a>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let Some(key) = grouping.dimension.key(record) else {
            continue;
        };
        let i = match index.get(&key) {
            Some(&i) => i,
            None => {
                index.insert(key.clone(), accs.len());
                accs.push(Acc {
                    key,
                    total: 0.0,
                    count: 0,
                    distinct: HashSet::new(),
                    first: None,
                });
                accs.len() - 1
            }
        };
        let acc = &mut accs[i];
        acc.total += record.budget;
        acc.count += 1;
        if let Some(v) = grouping.distinct.and_then(|f| record.text(f)) {
            acc.distinct.insert(v);
        }
        if acc.first.is_none() {
            acc.first = grouping.first.and_then(|f| record.text(f));
        }
    }

    if grouping.drop_zero {
        accs.retain(|a| a.total != 0.0);
    }

    let groups = accs.len();
    let grouped_total = accs.iter().map(|a| a.total).sum();
    let rows = accs
        .into_iter()
        .map(|a| GroupRow {
            share: share(a.total, universe),
            distinct: grouping.distinct.map(|_| a.distinct.len()),
            first: a.first.map(str::to_string),
            key: a.key,
            total: a.total,
            count: a.count,
        })
        .collect();

    GroupTable {
        dimension: grouping.dimension,
        rows: rank(rows, grouping.dimension, grouping.top_n),
        groups,
        grouped_total,
        universe,
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// How many rows each kind of panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub primary: usize,
    pub timeline: usize,
    pub secondary: usize,
    pub distribution: usize,
    pub composition: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            primary: 10,
            timeline: 15,
            secondary: 5,
            distribution: 8,
            composition: 6,
        }
    }
}

/// Organizations with at least this many sub-units get highlighted.
pub const WIDE_REACH_SUB_UNITS: usize = 5;

pub struct Summary {
    pub total: f64,
    pub count: usize,
    pub ict_total: f64,
    pub ict_count: usize,
    pub ict_share: f64,
    pub non_ict_total: f64,
    pub non_ict_count: usize,
    pub non_ict_share: f64,
    pub provinces: usize,
    pub organizations: Option<usize>,
    pub sub_units: Option<usize>,
}

pub fn summarize(dataset: &Dataset, view: &View) -> Summary {
    let ict = view.sector(SectorView::Ict);
    let non_ict = view.sector(SectorView::NonIct);
    Summary {
        total: view.universe,
        count: view.len(),
        ict_total: ict.universe,
        ict_count: ict.len(),
        ict_share: share(ict.universe, view.universe),
        non_ict_total: non_ict.universe,
        non_ict_count: non_ict.len(),
        non_ict_share: share(non_ict.universe, view.universe),
        provinces: view.distinct_provinces(),
        organizations: dataset
            .has(Field::Organization)
            .then(|| view.distinct(Field::Organization)),
        sub_units: dataset
            .has(Field::SubUnit)
            .then(|| view.distinct(Field::SubUnit)),
    }
}

fn panel(dataset: &Dataset, view: &View, grouping: Grouping) -> Option<GroupTable> {
    if !grouping.dimension.available(dataset) {
        return None;
    }
    let mut grouping = grouping;
    if grouping.distinct.is_some_and(|f| !dataset.has(f)) {
        grouping.distinct = None;
    }
    if grouping.first.is_some_and(|f| !dataset.has(f)) {
        grouping.first = None;
    }
    Some(aggregate(view.records.iter().copied(), &grouping, view.universe))
}

pub struct NationalOverview {
    pub sector: SectorView,
    pub universe: f64,
    pub count: usize,
    pub provinces: GroupTable,
    pub province_count: usize,
    pub organizations: Option<GroupTable>,
    pub sub_units: Option<GroupTable>,
    pub procurement_types: Option<GroupTable>,
    pub methods: Option<GroupTable>,
    pub timeline: Option<GroupTable>,
}

/// The national ranking panels of one sector view.
pub fn national_overview(dataset: &Dataset, view: &View, limits: &Limits) -> NationalOverview {
    let provinces = aggregate(
        view.records.iter().copied(),
        &Grouping {
            distinct: dataset.has(Field::SubUnit).then_some(Field::SubUnit),
            ..Grouping::by(Dimension::Province).top(limits.primary)
        },
        view.universe,
    );
    NationalOverview {
        sector: view.sector,
        universe: view.universe,
        count: view.len(),
        province_count: view.distinct_provinces(),
        provinces,
        organizations: panel(
            dataset,
            view,
            Grouping::by(Dimension::Organization)
                .distinct(Field::SubUnit)
                .top(limits.primary),
        ),
        sub_units: panel(
            dataset,
            view,
            Grouping::by(Dimension::SubUnit)
                .first(Field::Organization)
                .top(limits.primary),
        ),
        procurement_types: panel(
            dataset,
            view,
            Grouping::by(Dimension::ProcurementType).top(limits.distribution),
        ),
        methods: panel(
            dataset,
            view,
            Grouping::by(Dimension::Method).top(limits.distribution),
        ),
        timeline: panel(
            dataset,
            view,
            Grouping::by(Dimension::Timeline).top(limits.timeline),
        ),
    }
}

/// ICT budget per category, empty categories dropped. Shares are of the ICT total.
pub fn category_breakdown(view: &View) -> GroupTable {
    let ict = view.sector(SectorView::Ict);
    aggregate(
        ict.records.iter().copied(),
        &Grouping::by(Dimension::Category).nonzero(),
        ict.universe,
    )
}

#[derive(Debug)]
pub struct DeepDive {
    pub province: String,
    pub locality_type: Option<LocalityType>,
    pub sector: SectorView,
    pub total: f64,
    /// Percent of the sector universe.
    pub share: f64,
    pub count: usize,
    pub organizations: Option<usize>,
    pub sub_units: Option<usize>,
    pub localities: GroupTable,
    pub top_sub_units: Option<GroupTable>,
    pub procurement_types: Option<GroupTable>,
    pub methods: Option<GroupTable>,
}

/// Provinces of a view ranked by budget, for selection.
pub fn province_options(view: &View) -> Vec<String> {
    aggregate(
        view.records.iter().copied(),
        &Grouping::by(Dimension::Province),
        view.universe,
    )
    .rows
    .into_iter()
    .map(|r| r.key)
    .collect()
}

/// Regional detail for one province of a sector view.
///
/// Shares are taken against the sector universe so nested figures stay
/// comparable with the national panels.
pub fn deep_dive(
    dataset: &Dataset,
    view: &View,
    province: &str,
    locality_type: Option<LocalityType>,
    limits: &Limits,
) -> Result<DeepDive> {
    let Some(name) = province_options(view)
        .into_iter()
        .find(|p| p.eq_ignore_ascii_case(province.trim()))
    else {
        return Err(RupError::UnknownProvince(province.to_string()));
    };

    let region = view.subset(|r| {
        r.location.province == name && locality_type.map_or(true, |t| r.location.locality_type == t)
    });
    // Region panels keep the sector universe as denominator.
    let scoped = View {
        universe: view.universe,
        ..region.clone()
    };

    Ok(DeepDive {
        total: region.universe,
        share: share(region.universe, view.universe),
        count: region.len(),
        organizations: dataset
            .has(Field::Organization)
            .then(|| region.distinct(Field::Organization)),
        sub_units: dataset
            .has(Field::SubUnit)
            .then(|| region.distinct(Field::SubUnit)),
        localities: aggregate(
            region.records.iter().copied(),
            &Grouping::by(Dimension::Locality).top(limits.primary),
            view.universe,
        ),
        top_sub_units: panel(
            dataset,
            &scoped,
            Grouping::by(Dimension::SubUnit).top(limits.primary),
        ),
        procurement_types: panel(
            dataset,
            &scoped,
            Grouping::by(Dimension::ProcurementType).top(limits.composition),
        ),
        methods: panel(
            dataset,
            &scoped,
            Grouping::by(Dimension::Method).top(limits.composition),
        ),
        province: name,
        locality_type,
        sector: view.sector,
    })
}

/// Child dimension shown when expanding a group of `parent`.
pub fn drill_child(parent: Dimension) -> Option<Dimension> {
    match parent {
        Dimension::Province => Some(Dimension::Organization),
        Dimension::Organization | Dimension::Locality => Some(Dimension::SubUnit),
        _ => None,
    }
}

/// Top `child` groups inside the `parent` group called `name`.
pub fn drill_down(
    view: &View,
    parent: Dimension,
    name: &str,
    child: Dimension,
    top_n: usize,
) -> GroupTable {
    aggregate(
        view.records.iter().copied().filter(|r| parent.matches(r, name)),
        &Grouping::by(child).top(top_n),
        view.universe,
    )
}

/// Provinces holding a locality called `name`, in order of appearance. More
/// than one means a bare locality name is ambiguous in this view.
pub fn locality_provinces(view: &View, name: &str) -> Vec<String> {
    let mut provinces: Vec<String> = Vec::new();
    for r in view.records.iter().filter(|r| Dimension::Locality.matches(r, name)) {
        if !provinces.contains(&r.location.province) {
            provinces.push(r.location.province.clone());
        }
    }
    provinces
}

/// Largest packages of one sub-unit, by budget.
pub fn top_packages<'a>(view: &View<'a>, sub_unit: &str, n: usize) -> Vec<&'a ProcurementRecord> {
    let mut packages: Vec<&ProcurementRecord> = view
        .records
        .iter()
        .copied()
        .filter(|r| Dimension::SubUnit.matches(r, sub_unit))
        .collect();
    packages.sort_by(|a, b| b.budget.total_cmp(&a.budget));
    packages.truncate(n);
    packages
}

/// Records belonging to the displayed groups of a table.
pub fn records_in<'a>(view: &View<'a>, table: &GroupTable) -> Vec<&'a ProcurementRecord> {
    let keys: HashSet<&str> = table.rows.iter().map(|r| r.key.as_str()).collect();
    view.records
        .iter()
        .copied()
        .filter(|r| {
            table
                .dimension
                .key(r)
                .is_some_and(|k| keys.contains(k.as_str()))
        })
        .collect()
}
