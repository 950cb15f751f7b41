use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{LedgerError, Result};

// ---------------------------------------------------------------------------
// Config shapes, as written in the config file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreprocessRuleSpec {
    #[serde(rename = "match")]
    pub pattern: String,
    /// Pattern the replacement is applied to. Defaults to `match`.
    #[serde(default)]
    pub find: Option<String>,
    #[serde(default)]
    pub replace: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountRuleSpec {
    #[serde(rename = "match")]
    pub pattern: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileOverrideRuleSpec {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub options: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Compiled rules
// ---------------------------------------------------------------------------

/// Builds a compiled rule from its config shape. `index` is the rule's
/// position in its table, used in error messages.
pub trait CompileRule: Sized {
    type Spec;
    const TABLE: &'static str;

    fn compile(index: usize, spec: &Self::Spec) -> Result<Self>;
}

fn compile_pattern(table: &str, index: usize, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| LedgerError::pattern(format!("{table} rule #{}", index + 1), e))
}

#[derive(Debug, Clone)]
pub struct PreprocessRule {
    pub matcher: Regex,
    pub find: Regex,
    pub replace: String,
}

impl CompileRule for PreprocessRule {
    type Spec = PreprocessRuleSpec;
    const TABLE: &'static str = "preprocess";

    fn compile(index: usize, spec: &PreprocessRuleSpec) -> Result<Self> {
        let matcher = compile_pattern(Self::TABLE, index, &spec.pattern)?;
        let find = match &spec.find {
            Some(find) => compile_pattern(Self::TABLE, index, find)?,
            None => matcher.clone(),
        };
        Ok(Self {
            matcher,
            find,
            replace: spec.replace.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct AccountRule {
    pub matcher: Regex,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub category: Option<String>,
}

impl CompileRule for AccountRule {
    type Spec = AccountRuleSpec;
    const TABLE: &'static str = "accounts";

    fn compile(index: usize, spec: &AccountRuleSpec) -> Result<Self> {
        Ok(Self {
            matcher: compile_pattern(Self::TABLE, index, &spec.pattern)?,
            source: spec.source.clone(),
            destination: spec.destination.clone(),
            category: spec.category.clone(),
        })
    }
}

/// What a file override rule looks at: the input path or the lines inside it.
#[derive(Debug, Clone)]
pub enum OverrideTrigger {
    FileName(Regex),
    HeaderLine(Regex),
}

#[derive(Debug, Clone)]
pub struct FileOverrideRule {
    pub trigger: OverrideTrigger,
    pub options: Map<String, Value>,
}

impl CompileRule for FileOverrideRule {
    type Spec = FileOverrideRuleSpec;
    const TABLE: &'static str = "file_overrides";

    fn compile(index: usize, spec: &FileOverrideRuleSpec) -> Result<Self> {
        let trigger = match (&spec.file, &spec.header) {
            (Some(file), None) => OverrideTrigger::FileName(compile_pattern(Self::TABLE, index, file)?),
            (None, Some(header)) => {
                OverrideTrigger::HeaderLine(compile_pattern(Self::TABLE, index, header)?)
            }
            _ => {
                return Err(LedgerError::Config(format!(
                    "{} rule #{} needs exactly one of 'file' or 'header'",
                    Self::TABLE,
                    index + 1
                )))
            }
        };
        Ok(Self {
            trigger,
            options: spec.options.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// RuleTable
// ---------------------------------------------------------------------------

/// Ordered list of compiled rules. Tables are always walked top to bottom.
#[derive(Debug, Clone)]
pub struct RuleTable<R> {
    rules: Vec<R>,
}

impl<R> Default for RuleTable<R> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<R> RuleTable<R> {
    pub fn new(rules: Vec<R>) -> Self {
        Self { rules }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<R: CompileRule> RuleTable<R> {
    pub fn compile(specs: &[R::Spec]) -> Result<Self> {
        let rules = specs
            .iter()
            .enumerate()
            .map(|(i, spec)| R::compile(i, spec))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }
}

impl RuleTable<AccountRule> {
    /// First rule whose pattern matches `line`, with its 0-based position.
    pub fn first_match(&self, line: &str) -> Option<(usize, &AccountRule)> {
        self.rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matcher.is_match(line))
    }
}

/// Raw rule tables as they appear in the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuleSpecs {
    pub preprocess: Vec<PreprocessRuleSpec>,
    pub accounts: Vec<AccountRuleSpec>,
    pub file_overrides: Vec<FileOverrideRuleSpec>,
}

/// The three compiled rule tables used by a run.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub preprocess: RuleTable<PreprocessRule>,
    pub accounts: RuleTable<AccountRule>,
    pub file_overrides: RuleTable<FileOverrideRule>,
}

impl RuleSet {
    pub fn compile(specs: &RuleSpecs) -> Result<Self> {
        Ok(Self {
            preprocess: RuleTable::<PreprocessRule>::compile(&specs.preprocess)?,
            accounts: RuleTable::<AccountRule>::compile(&specs.accounts)?,
            file_overrides: RuleTable::<FileOverrideRule>::compile(&specs.file_overrides)?,
        })
    }
}
