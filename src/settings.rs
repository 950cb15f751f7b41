use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{LedgerError, Result};
use crate::rules::{RuleSet, RuleSpecs};

pub const DEFAULT_TEMPLATE: &str = "\
{date} {cleared}{checknum}{desc}
    ; csvhash: {hash}
    ; category: {category}
{metadata}{receipts}    {destination}    {formatted_amount}
    {source}

";

/// Options for one conversion run. Built once per input file and never
/// changed afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Options {
    pub fields: Vec<String>,
    pub delimiter: char,
    pub skip_lines: usize,
    pub record_pattern: Option<String>,
    pub date_format: String,
    pub default_source: String,
    pub negate: bool,
    pub clear: bool,
    pub currency: String,
    pub dedup: bool,
    pub cache_file: Option<PathBuf>,
    pub receipts_dir: Option<PathBuf>,
    pub fuzzy_days: u32,
    /// Rendered in the order given.
    #[serde(with = "ordered_pairs")]
    pub metadata: Vec<(String, String)>,
    pub template: String,
    pub template_file: Option<PathBuf>,
    pub reverse: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            fields: vec!["date".to_string(), "desc".to_string(), "amount".to_string()],
            delimiter: ',',
            skip_lines: 0,
            record_pattern: None,
            date_format: "%Y/%m/%d".to_string(),
            default_source: "Assets:Checking".to_string(),
            negate: false,
            clear: false,
            currency: "$".to_string(),
            dedup: true,
            cache_file: default_cache_file(),
            receipts_dir: None,
            fuzzy_days: 0,
            metadata: Vec::new(),
            template: DEFAULT_TEMPLATE.to_string(),
            template_file: None,
            reverse: false,
        }
    }
}

impl Options {
    /// Replace every option named in `overrides`. Unknown names are rejected
    /// so a typo in a file override rule fails loudly.
    pub fn with_overrides(&self, overrides: &Map<String, Value>) -> Result<Self> {
        let mut value = serde_json::to_value(self)?;
        let Some(obj) = value.as_object_mut() else {
            return Err(LedgerError::Config("options must serialize to an object".to_string()));
        };
        for (key, val) in overrides {
            if !obj.contains_key(key) {
                return Err(LedgerError::Config(format!("unknown option '{key}' in file override")));
            }
            obj.insert(key.clone(), val.clone());
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Set a metadata value, keeping the key's first position.
    pub fn set_metadata(&mut self, key: &str, value: &str) {
        match self.metadata.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.metadata.push((key.to_string(), value.to_string())),
        }
    }

    /// The template text, read from `template_file` when one is set.
    pub fn template_text(&self) -> Result<String> {
        match &self.template_file {
            Some(path) => Ok(std::fs::read_to_string(path)?),
            None => Ok(self.template.clone()),
        }
    }
}

/// Metadata pairs in document order. Read from a JSON object or a list of
/// `[key, value]` pairs; written as the list so a round trip through
/// `serde_json::Value` keeps the order.
mod ordered_pairs {
    use std::fmt;

    use serde::de::{MapAccess, SeqAccess, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(pairs: &[(String, String)], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(pairs)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<(String, String)>, D::Error> {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = Vec<(String, String)>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object or a list of [key, value] pairs")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::new();
                while let Some(entry) = map.next_entry::<String, String>()? {
                    pairs.push(entry);
                }
                Ok(pairs)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::new();
                while let Some(entry) = seq.next_element::<(String, String)>()? {
                    pairs.push(entry);
                }
                Ok(pairs)
            }
        }

        d.deserialize_any(PairsVisitor)
    }
}

/// Contents of the config file: global options plus the rule tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigFile {
    #[serde(flatten)]
    pub options: Options,
    #[serde(flatten)]
    pub rules: RuleSpecs,
    /// Keys neither of the above claimed.
    #[serde(flatten)]
    pub unknown: Map<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub options: Options,
    pub rules: RuleSet,
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(json)?;
        if !file.unknown.is_empty() {
            let keys: Vec<&str> = file.unknown.keys().map(String::as_str).collect();
            return Err(LedgerError::Config(format!(
                "unknown config key(s): {}",
                keys.join(", ")
            )));
        }
        Ok(Self {
            rules: RuleSet::compile(&file.rules)?,
            options: file.options,
        })
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("csv2ledger")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

fn default_cache_file() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("csv2ledger").join("hashes.txt"))
}

/// Load the config file. An explicitly named file must exist; the default
/// location is optional and falls back to built-in defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(p) if !p.exists() => {
            return Err(LedgerError::Config(format!("config file not found: {}", p.display())))
        }
        Some(p) => p.to_path_buf(),
        None => {
            let p = config_path();
            if !p.exists() {
                return Ok(Config::default());
            }
            p
        }
    };
    let content = std::fs::read_to_string(&path)?;
    Config::from_json(&content)
}

/// Options given explicitly on the command line. These win over everything.
#[derive(Debug, Clone, Default)]
pub struct FlagOverrides {
    pub fields: Option<Vec<String>>,
    pub negate: bool,
    pub clear: bool,
    pub no_dedup: bool,
    pub fuzzy_days: Option<u32>,
    pub receipts_dir: Option<PathBuf>,
    pub cache_file: Option<PathBuf>,
    pub default_source: Option<String>,
    pub metadata: Vec<(String, String)>,
    pub skip_lines: Option<usize>,
    pub template_file: Option<PathBuf>,
}

impl FlagOverrides {
    pub fn apply(&self, mut options: Options) -> Options {
        if let Some(fields) = &self.fields {
            options.fields = fields.clone();
        }
        if self.negate {
            options.negate = true;
        }
        if self.clear {
            options.clear = true;
        }
        if self.no_dedup {
            options.dedup = false;
        }
        if let Some(days) = self.fuzzy_days {
            options.fuzzy_days = days;
        }
        if let Some(dir) = &self.receipts_dir {
            options.receipts_dir = Some(dir.clone());
        }
        if let Some(cache) = &self.cache_file {
            options.cache_file = Some(cache.clone());
        }
        if let Some(source) = &self.default_source {
            options.default_source = source.clone();
        }
        for (key, value) in &self.metadata {
            options.set_metadata(key, value);
        }
        if let Some(n) = self.skip_lines {
            options.skip_lines = n;
        }
        if let Some(path) = &self.template_file {
            options.template_file = Some(path.clone());
        }
        options
    }
}

/// Parse a `KEY=VALUE` metadata flag.
pub fn parse_meta(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty metadata key in '{raw}'"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}
