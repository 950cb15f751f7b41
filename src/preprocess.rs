use tracing::debug;

use crate::rules::{PreprocessRule, RuleTable};

/// Rewrites raw input lines before they are split into columns.
///
/// Every rule whose `match` pattern matches the current text fires, in table
/// order, and later rules see the output of earlier ones.
pub struct PreprocessEngine<'a> {
    rules: &'a RuleTable<PreprocessRule>,
}

impl<'a> PreprocessEngine<'a> {
    pub fn new(rules: &'a RuleTable<PreprocessRule>) -> Self {
        Self { rules }
    }

    pub fn apply(&self, line: &str) -> String {
        let mut line = line.to_string();
        for (i, rule) in self.rules.iter().enumerate() {
            if !rule.matcher.is_match(&line) {
                continue;
            }
            let rewritten = rule.find.replace_all(&line, rule.replace.as_str()).into_owned();
            debug!(rule = i + 1, before = %line, after = %rewritten, "preprocess rule fired");
            line = rewritten;
        }
        line
    }
}
