use std::path::Path;

use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::rules::{OverrideTrigger, RuleSet};
use crate::settings::load_config;

pub fn list(config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    print!("{}", render(&config.rules));
    Ok(())
}

fn render(rules: &RuleSet) -> String {
    let mut preprocess = Table::new();
    preprocess.set_header(vec!["#", "Match", "Find", "Replace"]);
    for (i, rule) in rules.preprocess.iter().enumerate() {
        preprocess.add_row(vec![
            Cell::new(i + 1),
            Cell::new(rule.matcher.as_str()),
            Cell::new(rule.find.as_str()),
            Cell::new(&rule.replace),
        ]);
    }

    let mut accounts = Table::new();
    accounts.set_header(vec!["#", "Match", "Source", "Destination", "Category"]);
    for (i, rule) in rules.accounts.iter().enumerate() {
        accounts.add_row(vec![
            Cell::new(i + 1),
            Cell::new(rule.matcher.as_str()),
            Cell::new(rule.source.as_deref().unwrap_or("")),
            Cell::new(rule.destination.as_deref().unwrap_or("")),
            Cell::new(rule.category.as_deref().unwrap_or("")),
        ]);
    }

    let mut overrides = Table::new();
    overrides.set_header(vec!["#", "On", "Pattern", "Options"]);
    for (i, rule) in rules.file_overrides.iter().enumerate() {
        let (on, pattern) = match &rule.trigger {
            OverrideTrigger::FileName(re) => ("file", re.as_str()),
            OverrideTrigger::HeaderLine(re) => ("header", re.as_str()),
        };
        let keys: Vec<&str> = rule.options.keys().map(String::as_str).collect();
        overrides.add_row(vec![
            Cell::new(i + 1),
            Cell::new(on),
            Cell::new(pattern),
            Cell::new(keys.join(", ")),
        ]);
    }

    format!(
        "Preprocess rules ({})\n{preprocess}\n\nAccount rules ({})\n{accounts}\n\nFile overrides ({})\n{overrides}\n",
        rules.preprocess.len(),
        rules.accounts.len(),
        rules.file_overrides.len(),
    )
}
