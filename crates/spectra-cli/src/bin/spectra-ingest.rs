// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `spectra-ingest SOURCE DEST TABLE`: load graph records into a new table.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use spectra_cli::{logging, settings};
use spectra_codec::TypeRegistry;
use spectra_store::{IngestOptions, IngestRequest, Ingestor};

#[derive(Parser, Debug)]
#[command(
    name = "spectra-ingest",
    version,
    about = "Load a JSON array of graph records into a new SQLite table"
)]
struct Args {
    /// JSON config file (default: store.json in the platform config directory)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,
    /// Log errors only
    #[arg(short, long)]
    quiet: bool,
    /// SOURCE DEST TABLE
    #[arg(value_name = "SOURCE DEST TABLE")]
    positional: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = settings::load(args.config.as_deref())?;
    logging::init(
        config.log_level,
        logging::Verbosity {
            verbose: args.verbose,
            quiet: args.quiet,
        },
    );

    let options = IngestOptions::from(&config);
    let request = IngestRequest::from_positional(&args.positional, &options)?;
    let registry = TypeRegistry::with_builtin_codecs();
    let report = Ingestor::new(&registry, options)
        .run(&request)
        .with_context(|| {
            format!(
                "ingesting '{}' into '{}'",
                request.source().display(),
                request.destination().display()
            )
        })?;

    writeln!(
        std::io::stdout().lock(),
        "inserted {} rows into table '{}' in '{}'",
        report.rows_inserted,
        report.table,
        report.destination.display()
    )?;
    Ok(())
}
