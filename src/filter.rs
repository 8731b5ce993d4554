use std::collections::HashSet;

use crate::models::{Dataset, Field, LocalityType, ProcurementRecord};

/// Which slice of the filtered universe a view covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SectorView {
    #[default]
    All,
    Ict,
    NonIct,
}

impl SectorView {
    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "Semua Sektor",
            Self::Ict => "Sektor ICT",
            Self::NonIct => "Sektor Non-ICT",
        }
    }

    /// Short form for file names.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::All => "Semua",
            Self::Ict => "ICT",
            Self::NonIct => "NonICT",
        }
    }

    pub fn includes(&self, record: &ProcurementRecord) -> bool {
        match self {
            Self::All => true,
            Self::Ict => record.is_ict(),
            Self::NonIct => !record.is_ict(),
        }
    }
}

/// User-selected predicates. An empty list places no restriction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub provinces: Vec<String>,
    pub locality_types: Vec<LocalityType>,
    pub procurement_types: Vec<String>,
    pub methods: Vec<String>,
    pub sub_units: Vec<String>,
}

fn selected(choices: &[String], value: Option<&str>) -> bool {
    if choices.is_empty() {
        return true;
    }
    let Some(value) = value else {
        return false;
    };
    let value = value.trim();
    choices.iter().any(|c| c.trim().eq_ignore_ascii_case(value))
}

impl Filter {
    /// Predicates on fields the dataset lacks are skipped.
    pub fn matches(&self, dataset: &Dataset, record: &ProcurementRecord) -> bool {
        selected(&self.provinces, Some(record.location.province.as_str()))
            && (self.locality_types.is_empty()
                || self.locality_types.contains(&record.location.locality_type))
            && (!dataset.has(Field::ProcurementType)
                || selected(&self.procurement_types, record.procurement_type.as_deref()))
            && (!dataset.has(Field::Method) || selected(&self.methods, record.method.as_deref()))
            && (!dataset.has(Field::SubUnit) || selected(&self.sub_units, record.sub_unit.as_deref()))
    }

    pub fn apply<'a>(&self, dataset: &'a Dataset) -> View<'a> {
        View::new(
            SectorView::All,
            dataset
                .records
                .iter()
                .filter(|r| self.matches(dataset, r))
                .collect(),
        )
    }
}

/// A read-only subset of the base records together with its universe total.
#[derive(Debug, Clone)]
pub struct View<'a> {
    pub sector: SectorView,
    pub records: Vec<&'a ProcurementRecord>,
    pub universe: f64,
}

impl<'a> View<'a> {
    pub fn new(sector: SectorView, records: Vec<&'a ProcurementRecord>) -> Self {
        let universe = records.iter().map(|r| r.budget).sum();
        Self { sector, records, universe }
    }

    /// Narrow to one sector. The universe becomes that sector's total.
    pub fn sector(&self, sector: SectorView) -> View<'a> {
        View::new(
            sector,
            self.records.iter().copied().filter(|r| sector.includes(r)).collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keep records matching `pred`, retaining this view's sector label.
    pub fn subset<P>(&self, pred: P) -> View<'a>
    where
        P: Fn(&ProcurementRecord) -> bool,
    {
        View::new(
            self.sector,
            self.records.iter().copied().filter(|r| pred(*r)).collect(),
        )
    }

    /// Count of distinct non-missing values of a text field.
    pub fn distinct(&self, field: Field) -> usize {
        self.records
            .iter()
            .filter_map(|r| r.text(field))
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn distinct_provinces(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.location.province.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Classification, IctCategory, Location};
    use std::collections::BTreeSet;

    fn record(province: &str, kind: LocalityType, budget: f64, ict: bool, method: Option<&str>) -> ProcurementRecord {
        ProcurementRecord {
            id: None,
            package_name: None,
            budget,
            procurement_type: Some("Barang".into()),
            method: method.map(str::to_string),
            organization: Some("Org".into()),
            sub_unit: Some(format!("Satker {province}")),
            location_raw: None,
            timeline: None,
            small_business: None,
            domestic_product: None,
            location: Location {
                province: province.into(),
                locality: province.into(),
                locality_type: kind,
            },
            classification: if ict {
                Classification::ict(IctCategory::Software)
            } else {
                Classification::NON_ICT
            },
        }
    }

    fn dataset(fields: &[Field]) -> Dataset {
        Dataset {
            source: "test".into(),
            table: "rup".into(),
            fields: fields.iter().copied().collect::<BTreeSet<_>>(),
            records: vec![
                record("Bali", LocalityType::Kota, 100.0, true, Some("E-Purchasing")),
                record("Bali", LocalityType::Kabupaten, 50.0, false, Some("Tender")),
                record("Aceh", LocalityType::Kabupaten, 30.0, true, None),
            ],
        }
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let ds = dataset(&[Field::Method]);
        let view = Filter::default().apply(&ds);
        assert_eq!(view.len(), 3);
        assert_eq!(view.universe, 180.0);
    }

    #[test]
    fn test_province_and_type_filters() {
        let ds = dataset(&[]);
        let filter = Filter {
            provinces: vec!["bali".into()],
            locality_types: vec![LocalityType::Kota],
            ..Filter::default()
        };
        let view = filter.apply(&ds);
        assert_eq!(view.len(), 1);
        assert_eq!(view.universe, 100.0);
    }

    #[test]
    fn test_filter_excludes_missing_values_when_selecting() {
        let ds = dataset(&[Field::Method]);
        let filter = Filter {
            methods: vec!["Tender".into(), "E-Purchasing".into()],
            ..Filter::default()
        };
        assert_eq!(filter.apply(&ds).len(), 2);
    }

    #[test]
    fn test_filter_on_absent_field_is_ignored() {
        let ds = dataset(&[]);
        let filter = Filter {
            methods: vec!["Tender".into()],
            ..Filter::default()
        };
        assert_eq!(filter.apply(&ds).len(), 3);
    }

    #[test]
    fn test_sector_views_partition_universe() {
        let ds = dataset(&[]);
        let all = Filter::default().apply(&ds);
        let ict = all.sector(SectorView::Ict);
        let non = all.sector(SectorView::NonIct);
        assert_eq!(ict.universe, 130.0);
        assert_eq!(non.universe, 50.0);
        assert_eq!(ict.len() + non.len(), all.len());
        assert_eq!(ict.sector, SectorView::Ict);
    }

    #[test]
    fn test_distinct_and_options() {
        let ds = dataset(&[Field::Method]);
        let view = Filter::default().apply(&ds);
        assert_eq!(view.distinct(Field::SubUnit), 2);
        assert_eq!(view.distinct(Field::Method), 2);
        assert_eq!(view.distinct_provinces(), 2);
    }

    #[test]
    fn test_filtering_never_mutates_base() {
        let ds = dataset(&[]);
        let before = ds.records.clone();
        let _ = Filter { provinces: vec!["Aceh".into()], ..Filter::default() }.apply(&ds);
        assert_eq!(ds.records, before);
    }
}
