pub mod convert;
pub mod hash;
pub mod rules;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use crate::settings::{parse_meta, FlagOverrides};

#[derive(Parser)]
#[command(
    name = "csv2ledger",
    version,
    about = "Convert bank CSV exports into ledger entries."
)]
pub struct Cli {
    /// Log rule firings and receipt matches to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a CSV file and append ledger entries to the output file.
    Convert {
        /// CSV file to convert
        input: PathBuf,
        /// Ledger file to append to (also checked for duplicates)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Config file with options and rule tables (default: ~/.config/csv2ledger/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print entries to stdout; leave the output file and hash cache untouched
        #[arg(long = "dry-run")]
        dry_run: bool,
        /// Print run statistics as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        flags: ConvertFlags,
    },
    /// Show the rule tables loaded from the config file.
    Rules {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print both duplicate-detection hashes for a raw CSV line.
    Hash {
        /// The line exactly as it appears in the input file
        line: String,
    },
    /// Generate shell completions.
    Completions {
        shell: Shell,
    },
}

#[derive(Args, Debug, Default)]
pub struct ConvertFlags {
    /// Comma-separated column names, e.g. date,checknum,desc,amount
    #[arg(long, value_delimiter = ',')]
    pub fields: Option<Vec<String>>,
    /// Flip the sign of every amount
    #[arg(long)]
    pub negate: bool,
    /// Mark every entry as cleared
    #[arg(long)]
    pub clear: bool,
    /// Do not skip records seen in the output file or hash cache
    #[arg(long = "no-dedup")]
    pub no_dedup: bool,
    /// Days either side of the transaction date to search for receipts
    #[arg(long = "fuzzy-days")]
    pub fuzzy_days: Option<u32>,
    /// Directory tree holding receipt scans
    #[arg(long = "receipts-dir")]
    pub receipts_dir: Option<PathBuf>,
    /// File of previously imported hashes
    #[arg(long = "cache-file")]
    pub cache_file: Option<PathBuf>,
    /// Account used when no rule supplies a source
    #[arg(long = "default-source")]
    pub default_source: Option<String>,
    /// Extra metadata line on every entry, KEY=VALUE (repeatable)
    #[arg(long = "meta", value_parser = parse_meta)]
    pub meta: Vec<(String, String)>,
    /// Number of leading lines to ignore
    #[arg(long = "skip-lines")]
    pub skip_lines: Option<usize>,
    /// Template file for rendering entries
    #[arg(long = "template-file")]
    pub template_file: Option<PathBuf>,
}

impl From<ConvertFlags> for FlagOverrides {
    fn from(f: ConvertFlags) -> Self {
        Self {
            fields: f.fields,
            negate: f.negate,
            clear: f.clear,
            no_dedup: f.no_dedup,
            fuzzy_days: f.fuzzy_days,
            receipts_dir: f.receipts_dir,
            cache_file: f.cache_file,
            default_source: f.default_source,
            metadata: f.meta,
            skip_lines: f.skip_lines,
            template_file: f.template_file,
        }
    }
}
