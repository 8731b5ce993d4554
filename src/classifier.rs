use regex::{Regex, RegexBuilder};

use crate::error::Result;
use crate::models::{Classification, IctCategory};

/// `(include, exclude)`: the include pattern matches unless the text right
/// after the match starts with the exclude pattern.
pub type PatternSpec = (&'static str, Option<&'static str>);

pub const WHITELIST: &[(IctCategory, &[PatternSpec])] = &[
    (
        IctCategory::Connectivity,
        &[
            (r"\bINTERNET\b", None),
            (r"\bBANDWIDTH\b", None),
            (r"\bBROADBAND\b", None),
            (r"\bFIBER\s*OPTI[CK]\b", None),
            (r"\bFIBER\b", Some(r"\s*GLASS")),
            (r"\bMPLS\b", None),
            (r"\bVPN\b", None),
            (r"\bVSAT\b", None),
            (r"\bWI[\s\-]?FI\b", None),
            (r"\bWIRELESS\b", None),
            (r"\bHOTSPOT\b", None),
        ],
    ),
    (
        IctCategory::CloudDataCenter,
        &[
            (r"\bCLOUD\b", Some(r"\s*NINE")),
            (r"\bDATA\s*CENTER\b", None),
            (r"\bCOLOCATION\b", None),
            (r"\bHOSTING\b", None),
            (r"\bVIRTUAL\s+SERVER\b", None),
            (r"\bVPS\b", None),
        ],
    ),
    (
        IctCategory::Telecommunications,
        &[
            (r"\bPULSA\b", None),
            (r"\bPAKET\s+DATA\b", None),
            (r"\bSIM\s*CARD\b", None),
            (r"\bTELEKOMUNIKASI\b", None),
            (r"\bPABX\b", None),
            (r"\bVOIP\b", None),
            (r"\bIP\s+PHONE\b", None),
            (r"\bCALL\s+CENTER\b", None),
        ],
    ),
    (
        IctCategory::Collaboration,
        &[
            (r"\bVIDEO\s*CONFERENCE\b", None),
            (r"\bZOOM\b", Some(r"\s*IN|\s*OUT")),
            (r"\bWEBINAR\b", None),
            (r"\bMICROSOFT\s+TEAMS\b", None),
        ],
    ),
    (
        IctCategory::IotSmartCity,
        &[
            (r"\bIOT\b", None),
            (r"\bGPS\s+TRACK(ER|ING)\b", None),
            (r"\bTELEMATICS?\b", None),
            (r"\bSMART\s+CITY\b", None),
        ],
    ),
    (
        IctCategory::SurveillanceSecurity,
        &[
            (r"\bCCTV\b", None),
            (r"\bSURVEILLANCE\b", None),
            (r"\bIP\s+CAMERA\b", None),
            (r"\bNVR\b", None),
            (r"\bDVR\b", Some(r"\s+PLAYER")),
            (r"\bACCESS\s+CONTROL\b", None),
            (r"\bBIOMETRIC\b", None),
            (r"\bCYBER\s*SECURITY\b", None),
            (r"\bNETWORK\s+SECURITY\b", None),
        ],
    ),
    (
        IctCategory::ComputerHardware,
        &[
            (r"\bKOMPUTER\b", None),
            (r"\bCOMPUTER\b", None),
            (r"\bLAPTOP\b", None),
            (r"\bNOTEBOOK\b", None),
            (r"\bDESKTOP\b", None),
            (r"\bWORKSTATION\b", None),
        ],
    ),
    (
        IctCategory::ServerHardware,
        &[
            (r"\bSERVER\b", Some(r"\s+MAKANAN|\s+MINUMAN")),
            (r"\bSTORAGE\b", Some(r"\s+BOX|\s+RACK\s+BESI")),
            (r"\bRACK\s+SERVER\b", None),
            (r"\bUPS\b", Some(r"\s+DELIVERY")),
        ],
    ),
    (
        IctCategory::NetworkHardware,
        &[
            (r"\bROUTER\b", None),
            (r"\bSWITCH\b", Some(r"\s+ON|\s+OFF")),
            (r"\bFIREWALL\b", None),
            (r"\bMODEM\b", None),
        ],
    ),
    (
        IctCategory::Software,
        &[
            (r"\bSOFTWARE\b", None),
            (r"\bAPLIKASI\b", Some(r"\s+LAMARAN")),
            (r"\bSISTEM\s+INFORMASI\b", None),
            (r"\bWEBSITE\b", None),
            (r"\bDATABASE\b", None),
            (r"\bERP\b", None),
            (r"\bANTIVIRUS\b", None),
            (r"\bLISENSI\b", None),
            (r"\bLICENSE\b", None),
        ],
    ),
    (
        IctCategory::ItServices,
        &[
            (r"\bMAINTENANCE\s+(JARINGAN|SERVER|IT|NETWORK)\b", None),
            (r"\bSYSTEM\s+INTEGRAT(OR|ION)\b", None),
            (r"\bMANAGED\s+SERVICE\b", None),
        ],
    ),
];

pub const BLACKLIST: &[PatternSpec] = &[
    (r"\bBUKU\b", None),
    (r"\bPRINTER\b", None),
    (r"\bTONER\b", None),
    (r"\bTINTA\b", None),
    (r"\bBANGUNAN\b", None),
    (r"\bKONSTRUKSI\b", None),
    (r"\bOBAT\b", None),
    (r"\bVAKSIN\b", None),
    (r"\bALAT\s+KESEHATAN\b", None),
    (r"\bMEDIS\b", None),
    (r"\bRUMAH\s+SAKIT\b", None),
    (r"\bELEKTROMEDI[CKS]?\b", None),
    (r"\bPATIENT\s+MONITOR\b", None),
    (r"\bVENTILATOR\b", None),
    (r"\bINCUBATOR\b", None),
    (r"\bENDOSCOP[EY]\b", None),
    (r"\bCT\s+SCAN\b", None),
    (r"\bMRI\b", None),
    (r"\bUSG\b", None),
    (r"\bMAKANAN\b", None),
    (r"\bMINUMAN\b", None),
    (r"\bKATERING\b", None),
    (r"\bATK\b", None),
    (r"\bSERAGAM\b", None),
    (r"\bMOBIL\b", Some(r"\s+APP")),
    (r"\bKENDARAAN\b", None),
];

/// A compiled keyword pattern with an optional trailing-phrase exclusion.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: &'static str,
    excluding: Option<&'static str>,
    include: Regex,
    exclude: Option<Regex>,
}

impl Pattern {
    pub fn compile(spec: PatternSpec) -> Result<Self> {
        let (source, excluding) = spec;
        let include = RegexBuilder::new(source).case_insensitive(true).build()?;
        let exclude = match excluding {
            Some(ex) => Some(
                RegexBuilder::new(&format!("^(?:{ex})"))
                    .case_insensitive(true)
                    .build()?,
            ),
            None => None,
        };
        Ok(Self {
            source,
            excluding,
            include,
            exclude,
        })
    }

    pub fn source(&self) -> &'static str {
        self.source
    }

    /// Continuation that cancels a match of this pattern, if any.
    pub fn excluding(&self) -> Option<&'static str> {
        self.excluding
    }

    pub fn is_match(&self, text: &str) -> bool {
        match &self.exclude {
            None => self.include.is_match(text),
            Some(ex) => self
                .include
                .find_iter(text)
                .any(|m| !ex.is_match(&text[m.end()..])),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub category: IctCategory,
    pub patterns: Vec<Pattern>,
}

impl CategoryRule {
    fn first_match(&self, text: &str) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.is_match(text))
    }
}

/// Why a name ended up in its sector.
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    pub classification: Classification,
    pub blacklisted_by: Option<&'static str>,
    pub matched_by: Option<&'static str>,
}

/// Ordered category whitelist plus a global blacklist. Built once, read-only.
#[derive(Debug, Clone)]
pub struct RuleSet {
    categories: Vec<CategoryRule>,
    blacklist: Vec<Pattern>,
}

impl RuleSet {
    pub fn standard() -> Result<Self> {
        Self::from_tables(WHITELIST, BLACKLIST)
    }

    pub fn from_tables(
        whitelist: &[(IctCategory, &[PatternSpec])],
        blacklist: &[PatternSpec],
    ) -> Result<Self> {
        let categories = whitelist
            .iter()
            .map(|(category, specs)| -> Result<CategoryRule> {
                Ok(CategoryRule {
                    category: *category,
                    patterns: specs
                        .iter()
                        .map(|s| Pattern::compile(*s))
                        .collect::<Result<Vec<_>>>()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let blacklist = blacklist
            .iter()
            .map(|s| Pattern::compile(*s))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { categories, blacklist })
    }

    pub fn categories(&self) -> &[CategoryRule] {
        &self.categories
    }

    pub fn blacklist(&self) -> &[Pattern] {
        &self.blacklist
    }

    /// Blacklist first, then the first whitelist category in declared order.
    pub fn classify(&self, name: Option<&str>) -> Classification {
        self.explain(name).classification
    }

    pub fn explain(&self, name: Option<&str>) -> Explanation {
        let mut explanation = Explanation {
            classification: Classification::NON_ICT,
            blacklisted_by: None,
            matched_by: None,
        };
        let Some(text) = name else {
            return explanation;
        };
        if let Some(p) = self.blacklist.iter().find(|p| p.is_match(text)) {
            explanation.blacklisted_by = Some(p.source());
            return explanation;
        }
        for rule in &self.categories {
            if let Some(p) = rule.first_match(text) {
                explanation.classification = Classification::ict(rule.category);
                explanation.matched_by = Some(p.source());
                break;
            }
        }
        explanation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> RuleSet {
        RuleSet::standard().unwrap()
    }

    fn category(name: &str) -> Option<IctCategory> {
        rules().classify(Some(name)).category
    }

    #[test]
    fn test_whitelist_order_matches_category_enum() {
        let order: Vec<_> = rules().categories().iter().map(|r| r.category).collect();
        assert_eq!(order, IctCategory::ALL.to_vec());
    }

    #[test]
    fn test_single_whitelist_match() {
        let c = rules().classify(Some("Pengadaan Jasa Internet Kantor"));
        assert!(c.is_ict());
        assert_eq!(c.category, Some(IctCategory::Connectivity));
    }

    #[test]
    fn test_blacklist_wins_over_whitelist() {
        let c = rules().classify(Some("Internet untuk Rumah Sakit"));
        assert!(!c.is_ict());
        assert_eq!(c.category, None);
        assert_eq!(category("Pengadaan Laptop dan Printer"), None);
        assert_eq!(category("Server Makanan Kantin"), None);
    }

    #[test]
    fn test_no_match_is_non_ict() {
        let c = rules().classify(Some("Pembelian Meja Kursi"));
        assert!(!c.is_ict());
        assert_eq!(c.category, None);
    }

    #[test]
    fn test_missing_name_is_non_ict() {
        assert_eq!(rules().classify(None), Classification::NON_ICT);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(category("sewa bandwidth"), Some(IctCategory::Connectivity));
        assert_eq!(category("Belanja Cctv Kantor"), Some(IctCategory::SurveillanceSecurity));
    }

    #[test]
    fn test_first_category_in_order_wins() {
        // Connectivity is declared before Computer Hardware.
        assert_eq!(category("Laptop dengan Modem Internet"), Some(IctCategory::Connectivity));
        // Server Hardware comes before Software.
        assert_eq!(category("Server Aplikasi"), Some(IctCategory::ServerHardware));
    }

    #[test]
    fn test_word_boundaries() {
        assert_eq!(category("Pemeliharaan Ruang Pasupsup"), None);
        assert_eq!(category("Pengadaan Komputerisasi Arsip"), None);
        assert_eq!(category("Belanja Groups Ukm"), None);
    }

    #[test]
    fn test_trailing_exclusions() {
        assert_eq!(category("Event Cloud Nine"), None);
        assert_eq!(category("Layanan Cloud Pemerintah"), Some(IctCategory::CloudDataCenter));
        assert_eq!(category("Switch On Lampu Taman"), None);
        assert_eq!(category("Switch Core Gedung"), Some(IctCategory::NetworkHardware));
        assert_eq!(category("Pengadaan Storage Box Arsip"), None);
        assert_eq!(category("Storage Rack Besi Gudang"), None);
        assert_eq!(category("Storage SAN"), Some(IctCategory::ServerHardware));
        assert_eq!(category("UPS Delivery Paket"), None);
        assert_eq!(category("Aplikasi Lamaran Kerja"), None);
        assert_eq!(category("DVR Player Ruang Rapat"), None);
        assert_eq!(category("Zoom In Kamera"), None);
        assert_eq!(category("Fiberglass Perahu"), None);
        assert_eq!(category("Fiber Glass Kapal"), None);
    }

    #[test]
    fn test_exclusion_only_applies_to_that_occurrence() {
        assert_eq!(
            category("Switch Off Panel dan Switch Jaringan"),
            Some(IctCategory::NetworkHardware)
        );
    }

    #[test]
    fn test_blacklist_exclusion() {
        assert!(!rules().classify(Some("Sewa Mobil Operasional dan Internet")).is_ict());
        assert_eq!(category("Mobil App Pelayanan Internet"), Some(IctCategory::Connectivity));
    }

    #[test]
    fn test_explain_reports_patterns() {
        let e = rules().explain(Some("Pengadaan CCTV dan Obat"));
        assert_eq!(e.blacklisted_by, Some(r"\bOBAT\b"));
        assert_eq!(e.matched_by, None);

        let e = rules().explain(Some("Wi-Fi Publik"));
        assert_eq!(e.classification.category, Some(IctCategory::Connectivity));
        assert_eq!(e.matched_by, Some(r"\bWI[\s\-]?FI\b"));
    }

    #[test]
    fn test_custom_tables() {
        const WL: &[(IctCategory, &[PatternSpec])] =
            &[(IctCategory::Software, &[(r"\bAPP\b", None)])];
        const BL: &[PatternSpec] = &[(r"\bGAME\b", None)];
        let rules = RuleSet::from_tables(WL, BL).unwrap();
        assert!(rules.classify(Some("Mobile App")).is_ict());
        assert!(!rules.classify(Some("Game App")).is_ict());
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        const BL: &[PatternSpec] = &[(r"(", None)];
        assert!(RuleSet::from_tables(&[], BL).is_err());
    }
}
