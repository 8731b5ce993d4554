use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Kind of locality a location string resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LocalityType {
    Kabupaten,
    Kota,
    Lainnya,
}

impl LocalityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kabupaten => "Kabupaten",
            Self::Kota => "Kota",
            Self::Lainnya => "Lainnya",
        }
    }

    /// Three-letter form used in locality labels, e.g. `Way Kanan (Kab.)`.
    pub fn short(&self) -> &'static str {
        &self.as_str()[..3]
    }
}

impl fmt::Display for LocalityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocalityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kabupaten" | "kab" | "kab." => Ok(Self::Kabupaten),
            "kota" => Ok(Self::Kota),
            "lainnya" => Ok(Self::Lainnya),
            other => Err(format!("unknown locality type '{other}' (Kabupaten, Kota, Lainnya)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub province: String,
    pub locality: String,
    pub locality_type: LocalityType,
}

impl Location {
    pub fn other() -> Self {
        Self {
            province: "Lainnya".to_string(),
            locality: "Lainnya".to_string(),
            locality_type: LocalityType::Lainnya,
        }
    }
}

/// ICT subcategories, declared in classification order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IctCategory {
    Connectivity,
    CloudDataCenter,
    Telecommunications,
    Collaboration,
    IotSmartCity,
    SurveillanceSecurity,
    ComputerHardware,
    ServerHardware,
    NetworkHardware,
    Software,
    ItServices,
}

impl IctCategory {
    #[cfg(test)]
    pub const ALL: [IctCategory; 11] = [
        Self::Connectivity,
        Self::CloudDataCenter,
        Self::Telecommunications,
        Self::Collaboration,
        Self::IotSmartCity,
        Self::SurveillanceSecurity,
        Self::ComputerHardware,
        Self::ServerHardware,
        Self::NetworkHardware,
        Self::Software,
        Self::ItServices,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Connectivity => "Connectivity",
            Self::CloudDataCenter => "Cloud & Data Center",
            Self::Telecommunications => "Telecommunications",
            Self::Collaboration => "Collaboration",
            Self::IotSmartCity => "IoT & Smart City",
            Self::SurveillanceSecurity => "Surveillance & Security",
            Self::ComputerHardware => "Computer Hardware",
            Self::ServerHardware => "Server Hardware",
            Self::NetworkHardware => "Network Hardware",
            Self::Software => "Software",
            Self::ItServices => "IT Services",
        }
    }
}

impl fmt::Display for IctCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sector {
    Ict,
    NonIct,
}

impl Sector {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ict => "ICT",
            Self::NonIct => "Non-ICT",
        }
    }
}

/// Outcome of the sector classifier. A category is only ever present for ICT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub category: Option<IctCategory>,
}

impl Classification {
    pub const NON_ICT: Classification = Classification { category: None };

    pub fn ict(category: IctCategory) -> Self {
        Self { category: Some(category) }
    }

    pub fn is_ict(&self) -> bool {
        self.category.is_some()
    }

    pub fn sector(&self) -> Sector {
        if self.is_ict() {
            Sector::Ict
        } else {
            Sector::NonIct
        }
    }
}

/// Semantic fields of a procurement plan row, independent of source column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Id,
    PackageName,
    Budget,
    ProcurementType,
    Method,
    Organization,
    SubUnit,
    Location,
    Timeline,
    SmallBusiness,
    DomesticProduct,
}

impl Field {
    pub const ALL: [Field; 11] = [
        Self::Id,
        Self::PackageName,
        Self::Budget,
        Self::ProcurementType,
        Self::Method,
        Self::Organization,
        Self::SubUnit,
        Self::Location,
        Self::Timeline,
        Self::SmallBusiness,
        Self::DomesticProduct,
    ];

    /// Column label used in exports and tables.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Id => "ID_RUP",
            Self::PackageName => "Nama_Paket",
            Self::Budget => "Pagu_Rp",
            Self::ProcurementType => "Jenis_Pengadaan",
            Self::Method => "Metode",
            Self::Organization => "KLPD",
            Self::SubUnit => "Satuan_Kerja",
            Self::Location => "Lokasi",
            Self::Timeline => "Pemilihan",
            Self::SmallBusiness => "Usaha_Kecil",
            Self::DomesticProduct => "Produk_DN",
        }
    }
}

/// One planned procurement package, enriched at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcurementRecord {
    pub id: Option<String>,
    pub package_name: Option<String>,
    pub budget: f64,
    pub procurement_type: Option<String>,
    pub method: Option<String>,
    pub organization: Option<String>,
    pub sub_unit: Option<String>,
    pub location_raw: Option<String>,
    pub timeline: Option<String>,
    pub small_business: Option<String>,
    pub domestic_product: Option<String>,
    pub location: Location,
    pub classification: Classification,
}

impl ProcurementRecord {
    /// Text value of a semantic field. `Budget` has no text form.
    pub fn text(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::Id => &self.id,
            Field::PackageName => &self.package_name,
            Field::Budget => return None,
            Field::ProcurementType => &self.procurement_type,
            Field::Method => &self.method,
            Field::Organization => &self.organization,
            Field::SubUnit => &self.sub_unit,
            Field::Location => &self.location_raw,
            Field::Timeline => &self.timeline,
            Field::SmallBusiness => &self.small_business,
            Field::DomesticProduct => &self.domestic_product,
        };
        value.as_deref()
    }

    pub fn is_ict(&self) -> bool {
        self.classification.is_ict()
    }

    pub fn sector(&self) -> Sector {
        self.classification.sector()
    }

    pub fn category(&self) -> Option<IctCategory> {
        self.classification.category
    }
}

/// The enriched record set of one store, plus which semantic fields it resolved.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub source: String,
    pub table: String,
    pub fields: BTreeSet<Field>,
    pub records: Vec<ProcurementRecord>,
}

impl Dataset {
    pub fn has(&self, field: Field) -> bool {
        self.fields.contains(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}
