use std::path::PathBuf;

use chrono::{Days, NaiveDate};
use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{LedgerError, Result};
use crate::fmt::filename_amount;

/// Widest receipt search window, in days either side of the transaction.
pub const MAX_FUZZY_DAYS: u32 = 366;

/// Dates to try for a transaction: the exact date first, then one day
/// either side, then two days, and so on out to `fuzzy_days`. The window
/// stops short at the edge of the representable calendar.
pub fn candidate_dates(date: NaiveDate, fuzzy_days: u32) -> Vec<NaiveDate> {
    let mut dates = vec![date];
    for offset in 1..=u64::from(fuzzy_days) {
        let days = Days::new(offset);
        let (Some(before), Some(after)) = (date.checked_sub_days(days), date.checked_add_days(days)) else {
            break;
        };
        dates.push(before);
        dates.push(after);
    }
    dates
}

/// Finds scanned receipts named `YYYYMMDD_<anything>_<dollars>_<cents><suffix>`
/// under a search root.
#[derive(Debug, Clone)]
pub struct ReceiptAttacher {
    root: PathBuf,
    fuzzy_days: u32,
}

impl ReceiptAttacher {
    pub fn new(root: impl Into<PathBuf>, fuzzy_days: u32) -> Self {
        Self {
            root: root.into(),
            fuzzy_days,
        }
    }

    fn patterns(&self, date: NaiveDate, amount: Decimal) -> Result<Vec<Regex>> {
        let amount = regex::escape(&filename_amount(amount));
        candidate_dates(date, self.fuzzy_days)
            .into_iter()
            .map(|d| {
                let pattern = format!("^{}_.*?_{amount}[_.]", d.format("%Y%m%d"));
                Regex::new(&pattern).map_err(|e| LedgerError::pattern("receipt pattern", e))
            })
            .collect()
    }

    /// Walk the search root once and return the first file whose name
    /// matches any candidate date, relative to the root.
    pub fn attach(&self, date: NaiveDate, amount: Decimal) -> Result<Vec<PathBuf>> {
        let patterns = self.patterns(date, amount)?;
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if patterns.iter().any(|re| re.is_match(name)) {
                let rel = entry
                    .path()
                    .strip_prefix(&self.root)
                    .unwrap_or_else(|_| entry.path())
                    .to_path_buf();
                debug!(receipt = %rel.display(), %date, %amount, "receipt matched");
                return Ok(vec![rel]);
            }
        }
        Ok(Vec::new())
    }
}
