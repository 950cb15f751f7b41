use std::path::Path;

use colored::Colorize;

use crate::error::Result;
use crate::importer::{convert, ConvertJob, ConvertStats};
use crate::settings::{load_config, FlagOverrides};

pub fn run(
    input: &Path,
    output: Option<&Path>,
    config: Option<&Path>,
    flags: &FlagOverrides,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let config = load_config(config)?;
    let stats = convert(&ConvertJob {
        input,
        output,
        config: &config,
        flags,
        dry_run,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_summary(&stats, dry_run);
    }
    Ok(())
}

fn print_summary(stats: &ConvertStats, dry_run: bool) {
    // Dry runs put entries on stdout, so keep the summary off it.
    let summary = format!(
        "{} records: {} imported, {} skipped ({} duplicates, {} not records), {} with receipts",
        stats.seen,
        stats.imported.to_string().green(),
        stats.skipped().to_string().yellow(),
        stats.duplicates,
        stats.unmatched,
        stats.with_receipts,
    );
    if dry_run {
        eprintln!("{summary}");
    } else {
        println!("{summary}");
    }
}
