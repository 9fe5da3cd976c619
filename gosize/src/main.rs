//! Command line driver: parses a Go binary and prints its size breakdown.

use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use gosize_object::BinaryInfo;
use gosize_pclntab::LineTable;
use gosize_report::{
    attribute, diff, name_stats, read_baseline, write_json, write_sql, write_tsv, Row,
};

/// Breaks down the size of a Go binary for analysis in SQLite.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Binary to analyze, or SELF for this executable.
    binary: String,

    /// Output mode.
    #[arg(long, value_enum, default_value = "sql")]
    mode: Mode,

    /// Baseline JSON report to diff from; only valid with --mode json.
    #[arg(long)]
    base: Option<PathBuf>,

    /// Launch SQLite on the data (the mode flag is ignored).
    #[arg(long)]
    sqlite: bool,
}

#[derive(ValueEnum, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Sql,
    Tsv,
    Json,
    Nameinfo,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(err) = run(Args::parse()) {
        eprintln!("gosize: {err}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mode = if args.sqlite { Mode::Sql } else { args.mode };
    if args.base.is_some() && mode != Mode::Json {
        return Err("--base only works with --mode json".into());
    }

    let path = if args.binary == "SELF" {
        std::env::current_exe()?
    } else {
        PathBuf::from(&args.binary)
    };
    let data = fs::read(&path)?;
    let binary_size = data.len() as i64;

    let info = BinaryInfo::parse(&data)?;
    let table = LineTable::parse(info.pclntab, info.text_start)?;
    let funcs = table.functions()?;

    if let Mode::Nameinfo = mode {
        let stats = name_stats(funcs.iter().map(|f| f.name));
        println!(
            "                          total length of func names: {}",
            stats.total_bytes
        );
        println!(
            "bytes of func names which are prefixes of other func: {}",
            stats.prefix_bytes
        );
        return Ok(());
    }

    let rows = attribute(&table, &funcs, binary_size);

    let stdout = io::stdout();
    match mode {
        Mode::Sql if args.sqlite => run_sqlite(&rows)?,
        Mode::Sql => write_sql(&mut stdout.lock(), &rows)?,
        Mode::Tsv => write_tsv(&mut stdout.lock(), &rows)?,
        Mode::Json => {
            let rows = match &args.base {
                Some(base) => diff(&read_baseline(fs::File::open(base)?)?, &rows),
                None => rows,
            };
            let mut out = stdout.lock();
            write_json(&mut out, &rows)?;
            writeln!(out)?;
        }
        Mode::Nameinfo => unreachable!("handled above"),
    }
    Ok(())
}

/// Loads the report into a throwaway database, then hands the terminal to
/// an interactive sqlite3 shell on it.
fn run_sqlite(rows: &[Row]) -> Result<(), Box<dyn Error>> {
    let dir = tempfile::Builder::new().prefix("gosize").tempdir()?;
    let db_path = dir.path().join("gosize.db");

    let mut load = Command::new("sqlite3")
        .arg(&db_path)
        .stdin(Stdio::piped())
        .spawn()?;
    let mut stdin = load.stdin.take().ok_or("sqlite3 stdin unavailable")?;
    write_sql(&mut stdin, rows)?;
    drop(stdin);
    let status = load.wait()?;
    if !status.success() {
        return Err("sqlite3 failed to load the report".into());
    }

    let status = Command::new("sqlite3").arg(&db_path).status()?;
    if !status.success() {
        return Err("sqlite3 exited with an error".into());
    }
    Ok(())
}
