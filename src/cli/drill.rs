use colored::Colorize;

use crate::aggregate::{self, Dimension, Grouping};
use crate::cli::render::{group_table, packages_table, Extras};
use crate::cli::{DrillTarget, Session};
use crate::error::{Result, RupError};
use crate::filter::{Filter, SectorView};

/// Packages listed when drilling into a sub-unit.
const PACKAGE_ROWS: usize = 10;

pub fn run(
    session: &mut Session,
    target: DrillTarget,
    name: &str,
    limit: Option<usize>,
    sector: SectorView,
    filter: &Filter,
) -> Result<String> {
    let dataset = session.dataset()?;
    let view = filter.apply(&dataset).sector(sector);
    let parent = target.dimension();
    if !parent.available(&dataset) {
        return Ok(unavailable(parent));
    }

    let Some(child) = aggregate::drill_child(parent) else {
        let packages = aggregate::top_packages(&view, name, limit.unwrap_or(PACKAGE_ROWS));
        return Ok(packages_table(
            &format!("Paket terbesar: {name} ({})", sector.label()),
            &packages,
        ));
    };
    if !child.available(&dataset) {
        return Ok(unavailable(child));
    }
    if target == DrillTarget::Locality {
        let provinces = aggregate::locality_provinces(&view, name);
        if provinces.len() > 1 {
            return Err(RupError::AmbiguousLocality(name.to_string(), provinces.join(", ")));
        }
    }
    let table = aggregate::drill_down(
        &view,
        parent,
        name,
        child,
        limit.unwrap_or(session.limits().secondary),
    );
    Ok(group_table(
        &format!("Top {} di {name} ({})", child.label(), sector.label()),
        &table,
        Extras::default(),
    ))
}

pub fn top(
    session: &mut Session,
    by: Dimension,
    limit: Option<usize>,
    sector: SectorView,
    filter: &Filter,
) -> Result<String> {
    let dataset = session.dataset()?;
    if !by.available(&dataset) {
        return Ok(unavailable(by));
    }
    let view = filter.apply(&dataset).sector(sector);
    let grouping = Grouping::by(by).top(limit.unwrap_or_else(|| default_limit(session, by)));
    let table = aggregate::aggregate(view.records.iter().copied(), &grouping, view.universe);
    Ok(group_table(
        &format!("Top {} ({})", by.label(), sector.label()),
        &table,
        Extras::default(),
    ))
}

pub(crate) fn default_limit(session: &Session, by: Dimension) -> usize {
    let limits = session.limits();
    match by {
        Dimension::Timeline => limits.timeline,
        Dimension::ProcurementType | Dimension::Method => limits.distribution,
        _ => limits.primary,
    }
}

/// A dimension over a missing column is skipped, not an error.
fn unavailable(dimension: Dimension) -> String {
    let msg = format!(
        "{} tidak tersedia: kolom {} tidak ditemukan",
        dimension.label(),
        dimension.required_field().label()
    );
    msg.as_str().dimmed().to_string()
}
