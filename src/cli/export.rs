use std::path::{Path, PathBuf};

use crate::aggregate::{self, Dimension, Grouping};
use crate::cli::drill::default_limit;
use crate::cli::Session;
use crate::error::Result;
use crate::export;
use crate::filter::{Filter, SectorView};
use crate::fmt::count;

fn target(session: &Session, output: Option<String>, prefix: &str, label: &str) -> PathBuf {
    output
        .map(PathBuf::from)
        .unwrap_or_else(|| export::default_path(Path::new(&session.settings.export_dir), prefix, label))
}

fn written(rows: usize, path: &Path) -> String {
    format!("Wrote {} rows to {}", count(rows), path.display())
}

pub fn view(
    session: &mut Session,
    sector: SectorView,
    filter: &Filter,
    output: Option<String>,
) -> Result<String> {
    let dataset = session.dataset()?;
    let view = filter.apply(&dataset).sector(sector);
    let path = target(session, output, "RUP", sector.slug());
    let rows = export::write_csv(&path, &dataset, &view.records)?;
    Ok(written(rows, &path))
}

/// Raw records of the top groups, as the ranking panels download them.
pub fn top(
    session: &mut Session,
    by: Dimension,
    limit: Option<usize>,
    sector: SectorView,
    filter: &Filter,
    output: Option<String>,
) -> Result<String> {
    let dataset = session.dataset()?;
    let view = filter.apply(&dataset).sector(sector);
    let n = limit.unwrap_or_else(|| default_limit(session, by));
    let table = aggregate::aggregate(view.records.iter().copied(), &Grouping::by(by).top(n), view.universe);
    let records = aggregate::records_in(&view, &table);
    let path = target(
        session,
        output,
        &format!("Top{n}_{}", by.slug()),
        sector.slug(),
    );
    let rows = export::write_csv(&path, &dataset, &records)?;
    Ok(written(rows, &path))
}
