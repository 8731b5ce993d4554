use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::classifier::{Pattern, RuleSet};

fn describe(pattern: &Pattern) -> String {
    match pattern.excluding() {
        Some(ex) => format!("{} (not followed by {ex})", pattern.source()),
        None => pattern.source().to_string(),
    }
}

pub fn list(rules: &RuleSet) -> String {
    let mut whitelist = Table::new();
    whitelist.set_header(vec!["#", "Category", "Patterns"]);
    for (i, rule) in rules.categories().iter().enumerate() {
        let patterns: Vec<String> = rule.patterns.iter().map(describe).collect();
        whitelist.add_row(vec![
            Cell::new(i + 1),
            Cell::new(rule.category),
            Cell::new(patterns.join("\n")),
        ]);
    }

    let mut blacklist = Table::new();
    blacklist.set_header(vec!["Pattern"]);
    for pattern in rules.blacklist() {
        blacklist.add_row(vec![Cell::new(describe(pattern))]);
    }

    format!(
        "{}\n{whitelist}\n\n{}\n{blacklist}",
        "Whitelist (first matching category wins)".bold(),
        "Blacklist (always Non-ICT)".bold(),
    )
}
