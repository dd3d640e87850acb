use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sri_sales::{Columns, Dataset, Report};

#[derive(Parser)]
#[command(version, about)]
/// Reports sales, exports, imports and zero-rate sales by province from an
/// SRI sales data file.
struct Args {
    /// Data file
    #[arg(default_value = "datos/sri_ventas_2024.csv")]
    path: PathBuf,

    /// Column name overrides
    #[arg(short, long, value_name = "FILE")]
    columns: Option<PathBuf>,

    /// Province to look up (may be repeated)
    #[arg(short, long = "province", value_name = "NAME")]
    provinces: Vec<String>,

    /// Ask for N province names on standard input
    #[arg(long, value_name = "N", default_value_t = 0)]
    ask: usize,

    /// Number of provinces in the zero-rate ranking
    #[arg(long, value_name = "N", default_value_t = 5)]
    top: usize,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let columns = match &args.columns {
        Some(path) => Columns::from_file(path)?,
        None => Columns::default(),
    };
    let data = Dataset::load(&args.path, &columns);
    if data.is_empty() {
        eprintln!(
            "No data could be loaded from {} (missing, unreadable or empty).",
            args.path.display()
        );
        return Ok(ExitCode::FAILURE);
    }
    info!(records = data.len(), "loaded {}", args.path.display());

    let mut provinces = args.provinces;
    provinces.extend(ask_provinces(args.ask)?);

    let report = Report::new(data);
    let summary = report.summary(&provinces, args.top);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{summary}");
    }
    Ok(ExitCode::SUCCESS)
}

/// Prompts for `n` province names, stopping early at end of input.
fn ask_provinces(n: usize) -> Result<Vec<String>> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut names = Vec::with_capacity(n);
    for i in 1..=n {
        eprint!("Province #{i}: ");
        io::stderr().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        names.push(line.context("reading province name")?);
    }
    Ok(names)
}
