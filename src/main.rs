mod categorizer;
mod cli;
mod dedup;
mod error;
mod fmt;
mod importer;
mod models;
mod overrides;
mod preprocess;
mod receipts;
mod rules;
mod settings;
mod template;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn init_tracing(verbose: bool) {
    let default = if verbose { "csv2ledger=debug" } else { "csv2ledger=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            config,
            dry_run,
            json,
            flags,
        } => cli::convert::run(
            &input,
            output.as_deref(),
            config.as_deref(),
            &flags.into(),
            dry_run,
            json,
        ),
        Commands::Rules { config } => cli::rules::list(config.as_deref()),
        Commands::Hash { line } => cli::hash::run(&line),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "csv2ledger", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
