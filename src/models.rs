use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::dedup::ContentHashes;
use crate::fmt::{money, signed};

pub const LEDGER_DATE_FORMAT: &str = "%Y/%m/%d";

/// Column values of one input line, keyed by the configured field names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    fields: Vec<(String, String)>,
}

impl RawRecord {
    pub fn new(names: &[String], values: Vec<String>) -> Self {
        Self {
            fields: names.iter().cloned().zip(values).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// One ledger entry in the making.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub date: NaiveDate,
    pub cleared: bool,
    pub check_num: String,
    pub description: String,
    pub amount: Decimal,
    pub source: String,
    pub destination: String,
    pub category: String,
    pub hashes: ContentHashes,
    pub metadata: Vec<(String, String)>,
    pub receipts: Vec<PathBuf>,
    pub record: RawRecord,
}

/// Names every transaction supplies to a template, besides raw field names.
pub const TEMPLATE_FIELDS: &[&str] = &[
    "date",
    "cleared",
    "checknum",
    "desc",
    "amount",
    "formatted_amount",
    "source",
    "destination",
    "category",
    "hash",
    "metadata",
    "receipts",
];

impl Transaction {
    pub fn cleared_marker(&self) -> &'static str {
        if self.cleared {
            "* "
        } else {
            ""
        }
    }

    pub fn formatted_check_num(&self) -> String {
        if self.check_num.is_empty() {
            String::new()
        } else {
            format!("({}) ", self.check_num)
        }
    }

    /// Values for template rendering. Raw columns go in first so the named
    /// transaction fields win on a clash.
    pub fn template_values(&self, currency: &str) -> BTreeMap<String, String> {
        let mut values: BTreeMap<String, String> = self
            .record
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let metadata: String = self
            .metadata
            .iter()
            .map(|(k, v)| format!("    ; {k}: {v}\n"))
            .collect();
        let receipts: String = self
            .receipts
            .iter()
            .map(|p| format!("    ; receipt: {}\n", p.display()))
            .collect();

        for (key, value) in [
            ("date", self.date.format(LEDGER_DATE_FORMAT).to_string()),
            ("cleared", self.cleared_marker().to_string()),
            ("checknum", self.formatted_check_num()),
            ("desc", self.description.clone()),
            ("amount", signed(self.amount)),
            ("formatted_amount", money(self.amount, currency)),
            ("source", self.source.clone()),
            ("destination", self.destination.clone()),
            ("category", self.category.clone()),
            ("hash", self.hashes.primary.clone()),
            ("metadata", metadata),
            ("receipts", receipts),
        ] {
            values.insert(key.to_string(), value);
        }
        values
    }
}
