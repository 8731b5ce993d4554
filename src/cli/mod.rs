pub mod classify;
pub mod config;
pub mod drill;
pub mod export;
pub mod national;
pub mod render;
pub mod rules;
pub mod shell;
pub mod summary;

use std::path::PathBuf;
use std::rc::Rc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::debug;

use crate::aggregate::{Dimension, Limits};
use crate::cache::LoadCache;
use crate::classifier::RuleSet;
use crate::error::{Result, RupError};
use crate::filter::{Filter, SectorView};
use crate::loader::load_dataset;
use crate::models::{Dataset, LocalityType};
use crate::settings::{load_settings, Settings};

#[derive(Parser, Debug)]
#[command(
    name = "rupscope",
    about = "ICT / Non-ICT classification and exploration of government procurement plans (RUP)."
)]
pub struct Cli {
    /// Procurement plan store (SQLite or CSV). Overrides the configured path.
    #[arg(long, global = true)]
    pub db: Option<String>,
    /// Debug logging to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

/// Filters shared by every view command. Repeat a flag to select several values.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Province name
    #[arg(long = "province")]
    pub provinces: Vec<String>,
    /// Locality type: Kabupaten, Kota or Lainnya
    #[arg(long = "tipe")]
    pub locality_types: Vec<LocalityType>,
    #[command(flatten)]
    pub scope: ScopeArgs,
}

/// Filters that do not pick a region. `deep-dive` takes only these, since
/// its own `--province` and `--tipe` choose the region.
#[derive(Args, Debug, Clone, Default)]
pub struct ScopeArgs {
    /// Procurement type (Jenis Pengadaan)
    #[arg(long = "jenis")]
    pub procurement_types: Vec<String>,
    /// Selection method (Metode)
    #[arg(long = "metode")]
    pub methods: Vec<String>,
    /// Sub-unit (Satuan Kerja)
    #[arg(long = "satker")]
    pub sub_units: Vec<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> Filter {
        Filter {
            provinces: self.provinces.clone(),
            locality_types: self.locality_types.clone(),
            ..self.scope.to_filter()
        }
    }
}

impl ScopeArgs {
    pub fn to_filter(&self) -> Filter {
        Filter {
            procurement_types: self.procurement_types.clone(),
            methods: self.methods.clone(),
            sub_units: self.sub_units.clone(),
            ..Filter::default()
        }
    }
}

/// Group kinds that can be expanded one level down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DrillTarget {
    Province,
    Organization,
    SubUnit,
    /// Needs --province when the name exists in several provinces
    Locality,
}

impl DrillTarget {
    pub fn dimension(&self) -> Dimension {
        match self {
            Self::Province => Dimension::Province,
            Self::Organization => Dimension::Organization,
            Self::SubUnit => Dimension::SubUnit,
            Self::Locality => Dimension::Locality,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Headline metrics for the filtered universe.
    Summary {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// National ranking panels for one sector.
    National {
        #[arg(long, value_enum, default_value_t = SectorView::All)]
        sector: SectorView,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// ICT budget per category.
    Categories {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Regional detail for one province.
    DeepDive {
        /// Province to inspect
        #[arg(long)]
        province: String,
        /// Only Kabupaten, Kota or Lainnya localities
        #[arg(long)]
        tipe: Option<LocalityType>,
        #[arg(long, value_enum, default_value_t = SectorView::All)]
        sector: SectorView,
        #[command(flatten)]
        filters: ScopeArgs,
    },
    /// Expand one group: organizations of a province, sub-units of an
    /// organization or locality, packages of a sub-unit.
    Drill {
        #[arg(value_enum)]
        target: DrillTarget,
        /// Group name as shown in the ranking tables
        name: String,
        /// Rows to show (default 5 groups, 10 packages)
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, value_enum, default_value_t = SectorView::All)]
        sector: SectorView,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Any single ranked table.
    Top {
        #[arg(long, value_enum)]
        by: Dimension,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, value_enum, default_value_t = SectorView::All)]
        sector: SectorView,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Classify a package name as ICT or Non-ICT.
    Classify {
        name: String,
    },
    /// Split a location string into province, locality and type.
    ParseLocation {
        raw: String,
    },
    /// List the classification rules.
    Rules,
    /// Write records to CSV.
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },
    /// Interactive session; the loaded data is reused between commands.
    Shell,
    /// Show or change settings.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Every record of a filtered sector view.
    View {
        #[arg(long, value_enum, default_value_t = SectorView::All)]
        sector: SectorView,
        #[command(flatten)]
        filters: FilterArgs,
        /// Output file (default: <export_dir>/RUP_<sector>_<date>.csv)
        #[arg(long, short)]
        output: Option<String>,
    },
    /// Records belonging to the top groups of a dimension.
    Top {
        #[arg(long, value_enum)]
        by: Dimension,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, value_enum, default_value_t = SectorView::All)]
        sector: SectorView,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, short)]
        output: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective settings.
    Show,
    /// Persist the default store path.
    SetDb {
        path: String,
    },
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// State carried across commands: settings, the rule set and the load cache.
pub struct Session {
    pub settings: Settings,
    pub db: PathBuf,
    pub rules: RuleSet,
    cache: LoadCache,
}

impl Session {
    pub fn new(db: Option<String>) -> Result<Self> {
        let settings = load_settings();
        let db = PathBuf::from(db.unwrap_or_else(|| settings.db_path.clone()));
        Ok(Self {
            cache: LoadCache::new(settings.cache_ttl()),
            rules: RuleSet::standard()?,
            settings,
            db,
        })
    }

    pub fn limits(&self) -> Limits {
        self.settings.limits()
    }

    /// The enriched dataset, loaded on first use. An empty store is an error here.
    pub fn dataset(&mut self) -> Result<Rc<Dataset>> {
        let rules = &self.rules;
        let dataset = self.cache.get_or_load(&self.db, |p| load_dataset(p, rules))?;
        if dataset.is_empty() {
            return Err(RupError::SourceEmpty(self.db.display().to_string()));
        }
        Ok(dataset)
    }

    pub fn loads(&self) -> usize {
        self.cache.loads()
    }
}

/// Run one command and return what it prints.
pub fn execute(session: &mut Session, command: Commands) -> Result<String> {
    debug!(?command, "Executing");
    match command {
        Commands::Summary { filters } => summary::run(session, &filters.to_filter()),
        Commands::National { sector, filters } => {
            national::overview(session, sector, &filters.to_filter())
        }
        Commands::Categories { filters } => national::categories(session, &filters.to_filter()),
        Commands::DeepDive {
            province,
            tipe,
            sector,
            filters,
        } => national::deep_dive(session, &province, tipe, sector, &filters.to_filter()),
        Commands::Drill {
            target,
            name,
            limit,
            sector,
            filters,
        } => drill::run(session, target, &name, limit, sector, &filters.to_filter()),
        Commands::Top {
            by,
            limit,
            sector,
            filters,
        } => drill::top(session, by, limit, sector, &filters.to_filter()),
        Commands::Classify { name } => Ok(classify::classify(&session.rules, &name)),
        Commands::ParseLocation { raw } => Ok(classify::parse_location(&raw)),
        Commands::Rules => Ok(rules::list(&session.rules)),
        Commands::Export { command } => match command {
            ExportCommands::View {
                sector,
                filters,
                output,
            } => export::view(session, sector, &filters.to_filter(), output),
            ExportCommands::Top {
                by,
                limit,
                sector,
                filters,
                output,
            } => export::top(session, by, limit, sector, &filters.to_filter(), output),
        },
        Commands::Shell => shell::run(session),
        Commands::Config { command } => match command {
            ConfigCommands::Show => Ok(config::show(session)),
            ConfigCommands::SetDb { path } => config::set_db(session, &path),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_flags_parse() {
        let cli = Cli::try_parse_from([
            "rupscope", "summary", "--province", "Bali", "--province", "Aceh", "--tipe", "kota",
            "--metode", "Tender",
        ])
        .unwrap();
        let Commands::Summary { filters } = cli.command else {
            panic!("expected summary");
        };
        let filter = filters.to_filter();
        assert_eq!(filter.provinces, vec!["Bali", "Aceh"]);
        assert_eq!(filter.locality_types, vec![LocalityType::Kota]);
        assert_eq!(filter.methods, vec!["Tender"]);
        assert!(filter.sub_units.is_empty());
    }

    #[test]
    fn test_global_db_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["rupscope", "national", "--sector", "non-ict", "--db", "x.db"]).unwrap();
        assert_eq!(cli.db.as_deref(), Some("x.db"));
        assert!(matches!(cli.command, Commands::National { sector: SectorView::NonIct, .. }));
    }

    #[test]
    fn test_top_dimension_values() {
        let cli = Cli::try_parse_from(["rupscope", "top", "--by", "sub-unit", "--limit", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Top { by: Dimension::SubUnit, limit: Some(3), .. }
        ));
    }

    #[test]
    fn test_deep_dive_takes_scope_filters() {
        let cli = Cli::try_parse_from([
            "rupscope", "deep-dive", "--province", "Lampung", "--tipe", "kab", "--metode", "Tender",
        ])
        .unwrap();
        let Commands::DeepDive { province, tipe, filters, .. } = cli.command else {
            panic!("expected deep-dive");
        };
        assert_eq!(province, "Lampung");
        assert_eq!(tipe, Some(LocalityType::Kabupaten));
        let filter = filters.to_filter();
        assert_eq!(filter.methods, vec!["Tender"]);
        assert!(filter.provinces.is_empty());
    }

    #[test]
    fn test_bad_locality_type_rejected() {
        assert!(Cli::try_parse_from(["rupscope", "summary", "--tipe", "desa"]).is_err());
    }
}
