use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::classifier::RuleSet;
use crate::location;

pub fn classify(rules: &RuleSet, name: &str) -> String {
    let explanation = rules.explain(Some(name));
    let verdict = match explanation.classification.category {
        Some(category) => format!("{} ({category})", "ICT".green().bold()),
        None => format!("{}", "Non-ICT".bold()),
    };
    let reason = match (explanation.blacklisted_by, explanation.matched_by) {
        (Some(pattern), _) => format!("excluded by {pattern}"),
        (None, Some(pattern)) => format!("matched {pattern}"),
        (None, None) => "no rule matched".to_string(),
    };
    format!("{name}\n  {verdict}: {reason}")
}

pub fn parse_location(raw: &str) -> String {
    let loc = location::parse_location(Some(raw));
    let mut table = Table::new();
    table.set_header(vec!["Provinsi", "Daerah", "Tipe_Daerah"]);
    table.add_row(vec![
        Cell::new(&loc.province),
        Cell::new(&loc.locality),
        Cell::new(loc.locality_type),
    ]);
    table.to_string()
}
