use std::path::Path;

use tracing::{debug, info};

use crate::error::Result;
use crate::rules::{FileOverrideRule, OverrideTrigger, RuleTable};
use crate::settings::Options;

fn header_matches(input: &Path, pattern: &regex::Regex) -> Result<bool> {
    let bytes = std::fs::read(input)?;
    let content = String::from_utf8_lossy(&bytes);
    Ok(content.lines().any(|line| pattern.is_match(line)))
}

/// Pick per-file options for `input`. The first rule whose trigger fires
/// supplies its overrides and scanning stops there.
pub fn resolve(
    input: &Path,
    rules: &RuleTable<FileOverrideRule>,
    options: &Options,
) -> Result<Options> {
    let path = input.to_string_lossy();
    for (i, rule) in rules.iter().enumerate() {
        let fired = match &rule.trigger {
            OverrideTrigger::FileName(re) => re.is_match(&path),
            OverrideTrigger::HeaderLine(re) => header_matches(input, re)?,
        };
        if fired {
            info!(rule = i + 1, file = %path, keys = rule.options.len(), "applying file override");
            return options.with_overrides(&rule.options);
        }
        debug!(rule = i + 1, file = %path, "file override did not match");
    }
    Ok(options.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::FileOverrideRuleSpec;
    use serde_json::json;

    fn spec(file: Option<&str>, header: Option<&str>, options: serde_json::Value) -> FileOverrideRuleSpec {
        FileOverrideRuleSpec {
            file: file.map(str::to_string),
            header: header.map(str::to_string),
            options: options.as_object().cloned().unwrap(),
        }
    }

    fn write_input(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_no_rules_keeps_options() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "bank.csv", "2008/08/08,Exxon,20\n");
        let base = Options::default();
        let resolved = resolve(&input, &RuleTable::default(), &base).unwrap();
        assert_eq!(resolved, base);
    }

    #[test]
    fn test_filename_rule_applies() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "visa-2008.csv", "2008/08/08,Exxon,20\n");
        let rules = RuleTable::<FileOverrideRule>::compile(&[spec(
            Some(r"visa-\d+\.csv$"),
            None,
            json!({"default_source": "Liabilities:Visa", "negate": true}),
        )])
        .unwrap();
        let resolved = resolve(&input, &rules, &Options::default()).unwrap();
        assert_eq!(resolved.default_source, "Liabilities:Visa");
        assert!(resolved.negate);
    }

    #[test]
    fn test_header_rule_applies() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(
            dir.path(),
            "export.csv",
            "Posting Date,Ref,Payee,Amount\n08/08/2008,2134,Exxon,20\n",
        );
        let rules = RuleTable::<FileOverrideRule>::compile(&[spec(
            None,
            Some("^Posting Date,"),
            json!({"skip_lines": 1, "date_format": "%m/%d/%Y"}),
        )])
        .unwrap();
        let resolved = resolve(&input, &rules, &Options::default()).unwrap();
        assert_eq!(resolved.skip_lines, 1);
        assert_eq!(resolved.date_format, "%m/%d/%Y");
    }

    #[test]
    fn test_only_first_satisfied_rule_applies() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "checking.csv", "Date,Desc,Amount\n");
        let rules = RuleTable::<FileOverrideRule>::compile(&[
            spec(Some("checking"), None, json!({"default_source": "Assets:Checking:Main"})),
            spec(None, Some("^Date,"), json!({"default_source": "Other", "negate": true})),
        ])
        .unwrap();
        let resolved = resolve(&input, &rules, &Options::default()).unwrap();
        assert_eq!(resolved.default_source, "Assets:Checking:Main");
        assert!(!resolved.negate);
    }

    #[test]
    fn test_header_scan_on_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let rules = RuleTable::<FileOverrideRule>::compile(&[spec(None, Some("^Date"), json!({"negate": true}))]).unwrap();
        let result = resolve(&dir.path().join("missing.csv"), &rules, &Options::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_filename_rule_does_not_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let rules = RuleTable::<FileOverrideRule>::compile(&[spec(Some("missing"), None, json!({"negate": true}))]).unwrap();
        let resolved = resolve(&dir.path().join("missing.csv"), &rules, &Options::default()).unwrap();
        assert!(resolved.negate);
    }
}
