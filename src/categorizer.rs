use tracing::debug;

use crate::rules::{AccountRule, RuleTable};

pub const UNKNOWN_DESTINATION: &str = "Expense:Unknown";
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Accounts picked for a line. Fields are exactly what the matching rule
/// said, so any of them may be absent or empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub category: Option<String>,
}

/// Accounts after defaulting; never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAccounts {
    pub source: String,
    pub destination: String,
    pub category: String,
}

fn or_default(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => default.to_string(),
    }
}

impl Classification {
    /// Fill in anything the classifier left absent or empty.
    pub fn resolve(self, default_source: &str) -> ResolvedAccounts {
        ResolvedAccounts {
            source: or_default(self.source, default_source),
            destination: or_default(self.destination, UNKNOWN_DESTINATION),
            category: or_default(self.category, UNKNOWN_CATEGORY),
        }
    }
}

pub struct AccountClassifier<'a> {
    rules: &'a RuleTable<AccountRule>,
    default_source: &'a str,
}

impl<'a> AccountClassifier<'a> {
    pub fn new(rules: &'a RuleTable<AccountRule>, default_source: &'a str) -> Self {
        Self {
            rules,
            default_source,
        }
    }

    pub fn classify(&self, line: &str) -> Classification {
        match self.rules.first_match(line) {
            Some((i, rule)) => {
                debug!(rule = i + 1, pattern = rule.matcher.as_str(), "account rule matched");
                Classification {
                    source: rule.source.clone(),
                    destination: rule.destination.clone(),
                    category: rule.category.clone(),
                }
            }
            None => Classification {
                source: Some(self.default_source.to_string()),
                destination: Some(UNKNOWN_DESTINATION.to_string()),
                category: Some(UNKNOWN_CATEGORY.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::AccountRuleSpec;

    fn rule(pattern: &str, source: Option<&str>, dest: Option<&str>, cat: Option<&str>) -> AccountRuleSpec {
        AccountRuleSpec {
            pattern: pattern.to_string(),
            source: source.map(str::to_string),
            destination: dest.map(str::to_string),
            category: cat.map(str::to_string),
        }
    }

    #[test]
    fn test_no_match_uses_defaults() {
        let table = RuleTable::<AccountRule>::compile(&[rule("SHELL", None, Some("Expenses:Fuel"), None)]).unwrap();
        let classifier = AccountClassifier::new(&table, "Assets:Checking");
        let c = classifier.classify("2008/08/08,2134,Exxon,20");
        assert_eq!(c.source.as_deref(), Some("Assets:Checking"));
        assert_eq!(c.destination.as_deref(), Some(UNKNOWN_DESTINATION));
        assert_eq!(c.category.as_deref(), Some(UNKNOWN_CATEGORY));
    }

    #[test]
    fn test_first_matching_rule_returned_verbatim() {
        let table = RuleTable::<AccountRule>::compile(&[
            rule("SHELL", Some("Liabilities:Visa"), Some("Expenses:Fuel"), Some("Car")),
            rule("(?i)exxon", None, Some("Expenses:Fuel:Exxon"), Some("")),
            rule("Exxon", Some("Assets:Cash"), Some("Expenses:Other"), Some("Misc")),
        ])
        .unwrap();
        let classifier = AccountClassifier::new(&table, "Assets:Checking");
        let c = classifier.classify("2008/08/08,2134,Exxon,20");
        assert_eq!(
            c,
            Classification {
                source: None,
                destination: Some("Expenses:Fuel:Exxon".to_string()),
                category: Some(String::new()),
            }
        );
    }

    #[test]
    fn test_later_rules_do_not_influence_result() {
        let first = rule("Exxon", Some("A"), Some("B"), Some("C"));
        let only = RuleTable::<AccountRule>::compile(&[first.clone()]).unwrap();
        let with_more = RuleTable::<AccountRule>::compile(&[
            first,
            rule("Exxon", Some("X"), Some("Y"), Some("Z")),
            rule(".*", None, None, None),
        ])
        .unwrap();
        let line = "2008/08/08,,Exxon,20";
        assert_eq!(
            AccountClassifier::new(&only, "D").classify(line),
            AccountClassifier::new(&with_more, "D").classify(line)
        );
    }

    #[test]
    fn test_resolve_fills_absent_and_empty() {
        let c = Classification {
            source: Some(String::new()),
            destination: None,
            category: Some("Fuel".to_string()),
        };
        let r = c.resolve("Assets:Checking");
        assert_eq!(r.source, "Assets:Checking");
        assert_eq!(r.destination, UNKNOWN_DESTINATION);
        assert_eq!(r.category, "Fuel");
    }
}
