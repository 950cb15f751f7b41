use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::categorizer::AccountClassifier;
use crate::dedup::{ContentHashes, DuplicateIndex, MemoryIndex};
use crate::error::{LedgerError, Result};
use crate::models::{RawRecord, Transaction, TEMPLATE_FIELDS};
use crate::overrides;
use crate::preprocess::PreprocessEngine;
use crate::receipts::{ReceiptAttacher, MAX_FUZZY_DAYS};
use crate::rules::RuleSet;
use crate::settings::{Config, FlagOverrides, Options};
use crate::template::Template;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const DATE_FALLBACKS: &[&str] = &["%Y/%m/%d", "%m/%d/%Y", "%Y-%m-%d", "%d.%m.%Y"];
const REQUIRED_FIELDS: &[&str] = &["date", "desc", "amount"];

pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let s = raw.replace([',', '"', '$'], "");
    let s = s.trim();
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return Decimal::from_str(inner.trim()).ok().map(|d| -d);
    }
    let s = s.strip_prefix('+').unwrap_or(s);
    Decimal::from_str(s).ok()
}

/// Parse with the configured format first, then the common bank formats.
pub fn parse_date(raw: &str, format: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    std::iter::once(format)
        .chain(DATE_FALLBACKS.iter().copied())
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

pub fn split_record(line: &str, delimiter: char) -> Result<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter as u8)
        .from_reader(line.as_bytes());
    match rdr.records().next() {
        Some(record) => Ok(record?.iter().map(str::to_string).collect()),
        None => Ok(Vec::new()),
    }
}

// ---------------------------------------------------------------------------
// Converter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConvertStats {
    pub seen: usize,
    pub imported: usize,
    pub duplicates: usize,
    pub unmatched: usize,
    pub with_receipts: usize,
}

impl ConvertStats {
    pub fn skipped(&self) -> usize {
        self.duplicates + self.unmatched
    }
}

/// Runs the per-line pipeline for one set of effective options.
pub struct Converter<'a> {
    options: &'a Options,
    preprocess: PreprocessEngine<'a>,
    classifier: AccountClassifier<'a>,
    record_pattern: Option<Regex>,
    receipts: Option<ReceiptAttacher>,
    template: Template,
}

impl<'a> Converter<'a> {
    pub fn new(options: &'a Options, rules: &'a RuleSet) -> Result<Self> {
        for required in REQUIRED_FIELDS {
            if !options.fields.iter().any(|f| f == required) {
                return Err(LedgerError::Config(format!(
                    "field layout [{}] has no '{required}' column",
                    options.fields.join(",")
                )));
            }
        }
        let unique: BTreeSet<&str> = options.fields.iter().map(String::as_str).collect();
        if unique.len() != options.fields.len() {
            return Err(LedgerError::Config(format!(
                "field layout [{}] repeats a column name",
                options.fields.join(",")
            )));
        }
        if !options.delimiter.is_ascii() {
            return Err(LedgerError::Config(format!(
                "delimiter '{}' must be a single ASCII character",
                options.delimiter
            )));
        }

        if options.fuzzy_days > MAX_FUZZY_DAYS {
            return Err(LedgerError::Config(format!(
                "fuzzy_days {} is over the limit of {MAX_FUZZY_DAYS}",
                options.fuzzy_days
            )));
        }

        let record_pattern = options
            .record_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| LedgerError::pattern("record_pattern", e))?;

        let template = Template::parse(&options.template_text()?)?;
        let known: BTreeSet<String> = TEMPLATE_FIELDS
            .iter()
            .map(|s| s.to_string())
            .chain(options.fields.iter().cloned())
            .collect();
        template.validate(&known)?;
        if options.dedup && options.cache_file.is_none() && !template.uses("hash") {
            warn!("template has no {{hash}} and no cache file is set; duplicates will only be caught within this run");
        }

        let receipts = options
            .receipts_dir
            .as_ref()
            .map(|dir| ReceiptAttacher::new(dir.clone(), options.fuzzy_days));

        Ok(Self {
            options,
            preprocess: PreprocessEngine::new(&rules.preprocess),
            classifier: AccountClassifier::new(&rules.accounts, &options.default_source),
            record_pattern,
            receipts,
            template,
        })
    }

    /// Turn one raw line into a transaction. `None` when the line is not a
    /// record.
    fn build_transaction(&self, line_no: usize, raw: &str) -> Result<Option<Transaction>> {
        // Hash the line as read; rules and the splitter never see the CR.
        let hashes = ContentHashes::of(raw);
        let line = self.preprocess.apply(raw.trim_end_matches('\r'));

        if let Some(re) = &self.record_pattern {
            if !re.is_match(&line) {
                warn!(line = line_no, text = %line, "not a record, skipping");
                return Ok(None);
            }
        }

        let values = split_record(&line, self.options.delimiter)?;
        if values.len() != self.options.fields.len() {
            return Err(LedgerError::ColumnCount {
                line: line_no,
                expected: self.options.fields.len(),
                found: values.len(),
                fields: self.options.fields.join(","),
            });
        }
        let record = RawRecord::new(&self.options.fields, values);

        let date_raw = record.get("date").unwrap_or_default();
        let date = parse_date(date_raw, &self.options.date_format).ok_or_else(|| {
            LedgerError::InvalidDate {
                line: line_no,
                value: date_raw.to_string(),
            }
        })?;
        let amount_raw = record.get("amount").unwrap_or_default();
        let mut amount = parse_amount(amount_raw).ok_or_else(|| LedgerError::InvalidAmount {
            line: line_no,
            value: amount_raw.to_string(),
        })?;
        if self.options.negate {
            amount = -amount;
        }

        let accounts = self
            .classifier
            .classify(&line)
            .resolve(&self.options.default_source);

        Ok(Some(Transaction {
            date,
            cleared: self.options.clear,
            check_num: record.get("checknum").unwrap_or_default().trim().to_string(),
            description: record.get("desc").unwrap_or_default().trim().to_string(),
            amount,
            source: accounts.source,
            destination: accounts.destination,
            category: accounts.category,
            hashes,
            metadata: self.options.metadata.clone(),
            receipts: Vec::new(),
            record,
        }))
    }

    /// Convert every record in `content`, writing rendered entries to `out`.
    pub fn run<I: DuplicateIndex, W: Write>(
        &self,
        content: &str,
        index: &mut I,
        out: &mut W,
    ) -> Result<ConvertStats> {
        let mut lines: Vec<(usize, &str)> = content
            .split('\n')
            .enumerate()
            .skip(self.options.skip_lines)
            .map(|(i, line)| (i + 1, line))
            .collect();
        if self.options.reverse {
            lines.reverse();
        }

        let mut stats = ConvertStats::default();
        for (line_no, raw) in lines {
            if raw.trim().is_empty() {
                continue;
            }
            stats.seen += 1;

            let Some(mut txn) = self.build_transaction(line_no, raw)? else {
                stats.unmatched += 1;
                continue;
            };

            if self.options.dedup && index.is_duplicate(&txn.hashes)? {
                info!(line = line_no, date = %txn.date, desc = %txn.description, "duplicate record, skipping");
                stats.duplicates += 1;
                continue;
            }

            if let Some(attacher) = &self.receipts {
                txn.receipts = attacher.attach(txn.date, txn.amount)?;
                if !txn.receipts.is_empty() {
                    stats.with_receipts += 1;
                }
            }

            let entry = self
                .template
                .render(&txn.template_values(&self.options.currency))?;
            out.write_all(entry.as_bytes())?;
            out.flush()?;
            index.record(&txn.hashes)?;
            debug!(line = line_no, destination = %txn.destination, "record converted");
            stats.imported += 1;
        }
        Ok(stats)
    }
}

// ---------------------------------------------------------------------------
// convert
// ---------------------------------------------------------------------------

/// One conversion request from the command line.
pub struct ConvertJob<'a> {
    pub input: &'a Path,
    pub output: Option<&'a Path>,
    pub config: &'a Config,
    pub flags: &'a FlagOverrides,
    /// Print entries to stdout and leave the output file and cache alone.
    pub dry_run: bool,
}

/// Options for `input`: config file, then the first matching file override,
/// then command-line flags.
pub fn effective_options(input: &Path, config: &Config, flags: &FlagOverrides) -> Result<Options> {
    if !input.is_file() {
        return Err(LedgerError::MissingInput(input.to_path_buf()));
    }
    let options = overrides::resolve(input, &config.rules.file_overrides, &config.options)?;
    Ok(flags.apply(options))
}

pub fn convert(job: &ConvertJob) -> Result<ConvertStats> {
    let options = effective_options(job.input, job.config, job.flags)?;
    let converter = Converter::new(&options, &job.config.rules)?;
    if job.config.rules.accounts.is_empty() {
        debug!("no account rules; every record gets the default accounts");
    }

    let bytes = std::fs::read(job.input)?;
    let content = String::from_utf8_lossy(&bytes);

    let mut index = MemoryIndex::load(job.output, options.cache_file.as_deref(), !job.dry_run)?;
    debug!(known_hashes = index.len(), "duplicate index loaded");

    let stats = match (job.dry_run, job.output) {
        (true, _) => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            converter.run(&content, &mut index, &mut out)?
        }
        (false, Some(output)) => {
            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let mut out = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(output)?;
            converter.run(&content, &mut index, &mut out)?
        }
        (false, None) => return Err(LedgerError::Config("no output file given".to_string())),
    };

    info!(
        input = %job.input.display(),
        seen = stats.seen,
        imported = stats.imported,
        duplicates = stats.duplicates,
        unmatched = stats.unmatched,
        with_receipts = stats.with_receipts,
        "conversion finished"
    );
    Ok(stats)
}
