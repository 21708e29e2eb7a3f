use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tdstab::export::{self, ScanReport};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "tdstab")]
#[command(about = "Extract, normalize and aggregate PART-I TDS certificate text exports")]
struct Args {
    /// Input .txt file(s), or directories to scan for them
    inputs: Vec<PathBuf>,

    /// Output directory for generated tables
    #[arg(short, long, default_value = "out")]
    out: PathBuf,

    /// Table output format
    #[arg(long, value_enum, default_value = "csv")]
    format: Format,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Csv,
    Parquet,
    Both,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // ─── 1) init logging ─────────────────────────────────────────────
    let default_filter = if args.verbose { "debug" } else { "info" };
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    fmt::Subscriber::builder().with_env_filter(env).init();

    // ─── 2) collect inputs ───────────────────────────────────────────
    let files = collect_inputs(&args.inputs)?;
    if files.is_empty() {
        bail!("no .txt inputs found");
    }
    fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;
    info!(files = files.len(), out = %args.out.display(), "starting");

    // ─── 3) process each file; every file owns its full parse state ──
    let failures: usize = files
        .par_iter()
        .map(|path| match process_file(path, &args.out, args.format) {
            Ok(()) => 0,
            Err(err) => {
                error!(file = %path.display(), "{err:#}");
                1
            }
        })
        .sum();

    if failures > 0 {
        bail!("{failures} of {} inputs failed", files.len());
    }
    info!("all done");
    Ok(())
}

fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in fs::read_dir(input)
                .with_context(|| format!("reading {}", input.display()))?
            {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) == Some("txt") {
                    files.push(path);
                }
            }
        } else {
            files.push(input.clone());
        }
    }
    files.sort();
    Ok(files)
}

fn process_file(path: &Path, out_dir: &Path, format: Format) -> Result<()> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let tables = tdstab::run_document(&raw)
        .with_context(|| format!("parsing {}", path.display()))?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("input");

    if matches!(format, Format::Csv | Format::Both) {
        export::write_csv(&tables.records, &out_dir.join(format!("{stem}.records.csv")))?;
        export::write_csv(&tables.aggregate, &out_dir.join(format!("{stem}.aggregate.csv")))?;
    }
    if matches!(format, Format::Parquet | Format::Both) {
        export::write_parquet(&tables.records, &out_dir.join(format!("{stem}.records.parquet")))?;
        export::write_parquet(
            &tables.aggregate,
            &out_dir.join(format!("{stem}.aggregate.parquet")),
        )?;
    }

    let report = ScanReport {
        source: path.display().to_string(),
        generated_at: Utc::now(),
        stats: tables.stats.clone(),
    };
    export::write_report(&report, &out_dir.join(format!("{stem}.report.json")))?;

    info!(
        file = %path.display(),
        records = tables.records.num_rows(),
        deductors = tables.aggregate.num_rows(),
        "processed"
    );
    Ok(())
}
