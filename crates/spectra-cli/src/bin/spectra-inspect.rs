// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `spectra-inspect DB TABLE`: read a stored table back and print it.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use spectra_cli::{logging, render, settings};
use spectra_codec::TypeRegistry;
use spectra_store::{ColumnMaterializer, RowMaterializer};

#[derive(Parser, Debug)]
#[command(
    name = "spectra-inspect",
    version,
    about = "Print a Spectra table read back through the row or column materializer"
)]
struct Args {
    /// Database file
    db: PathBuf,
    /// Table name
    table: String,
    /// Use the column materializer and show each column's representation
    #[arg(long)]
    columnar: bool,
    /// Maximum rows to print
    #[arg(long, default_value_t = 20)]
    limit: usize,
    /// JSON config file (default: store.json in the platform config directory)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,
    /// Log errors only
    #[arg(short, long)]
    quiet: bool,
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

    let registry = TypeRegistry::with_builtin_codecs();
    let context = || format!("reading table '{}' from '{}'", args.table, args.db.display());
    let mut out = std::io::stdout().lock();
    if args.columnar {
        let data = ColumnMaterializer::new(&registry)
            .load_path(&args.db, &args.table)
            .with_context(context)?;
        writeln!(out, "{}", render::column_layout(&data))?;
        writeln!(out, "{}", render::columns(&data, args.limit))?;
        writeln!(
            out,
            "{}",
            render::summary(data.num_rows, data.columns.len(), data.num_rows.min(args.limit))
        )?;
    } else {
        let data = RowMaterializer::new(&registry)
            .load_path(&args.db, &args.table)
            .with_context(context)?;
        writeln!(out, "{}", render::rows(&data, args.limit))?;
        writeln!(
            out,
            "{}",
            render::summary(data.num_rows(), data.columns.len(), data.num_rows().min(args.limit))
        )?;
    }
    Ok(())
}
