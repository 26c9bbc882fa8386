use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use glob::glob;
use meterflow::{export, process_with, ConsumptionTable, PipelineConfig, RecordFilter};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Derive per-interval energy consumption from cumulative meter exports.
#[derive(Debug, Parser)]
#[command(name = "meterflow", version)]
struct Cli {
    /// Input files or glob patterns (.csv, .xlsx, .json, .txt)
    #[arg(required = true)]
    inputs: Vec<String>,

    /// YAML file overriding the column lists
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only keep this device
    #[arg(long)]
    device: Option<String>,

    /// First day to keep (YYYY-MM-DD), used together with --to
    #[arg(long, requires = "to")]
    from: Option<NaiveDate>,

    /// Last day to keep (YYYY-MM-DD), used together with --from
    #[arg(long, requires = "from")]
    to: Option<NaiveDate>,

    /// How many devices to list in the ranking
    #[arg(long, default_value_t = 5)]
    top: usize,

    /// Write the filtered table to this workbook
    #[arg(long)]
    xlsx: Option<PathBuf>,

    /// Write the filtered table to this Parquet file
    #[arg(long)]
    parquet: Option<PathBuf>,
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,meterflow=info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let cli = Cli::parse();

    // ─── 2) config + inputs ──────────────────────────────────────────
    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    let inputs = expand_inputs(&cli.inputs)?;
    if inputs.is_empty() {
        bail!("no input files matched {:?}", cli.inputs);
    }
    if inputs.len() > 1 && (cli.xlsx.is_some() || cli.parquet.is_some()) {
        bail!("--xlsx/--parquet need exactly one input, got {}", inputs.len());
    }

    let filter = RecordFilter {
        device: cli.device.clone(),
        from: cli.from,
        to: cli.to,
    };

    // ─── 3) one file at a time ───────────────────────────────────────
    let mut failed = 0usize;
    for path in &inputs {
        let file_name = display_name(path);
        let table = match process_path(&config, path) {
            Ok(table) => table.filter(&filter),
            Err(e) => {
                error!(file = %file_name, "{:#}", e);
                failed += 1;
                continue;
            }
        };

        print_summary(&file_name, &table, cli.top);

        if let Some(out) = &cli.xlsx {
            export::write_xlsx(&table, out)?;
        }
        if let Some(out) = &cli.parquet {
            export::write_parquet(&table, out)?;
        }
    }

    if failed > 0 {
        bail!("{} of {} inputs failed", failed, inputs.len());
    }
    info!("all done");
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read one input and run the pipeline over it. Read failures and pipeline
/// errors both come back as `Err` so the caller can move on to the next file.
fn process_path(config: &PipelineConfig, path: &Path) -> Result<ConsumptionTable> {
    let content = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let table = process_with(config, &display_name(path), &content)?;
    Ok(table)
}

/// Paths are taken as-is when they exist; anything else is treated as a glob.
fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for pattern in patterns {
        if Path::new(pattern).is_file() {
            out.push(PathBuf::from(pattern));
            continue;
        }
        let mut matched = false;
        for entry in glob(pattern).with_context(|| format!("invalid pattern {}", pattern))? {
            match entry {
                Ok(p) if p.is_file() => {
                    out.push(p);
                    matched = true;
                }
                Ok(_) => {}
                Err(e) => warn!("cannot read glob entry: {}", e),
            }
        }
        if !matched {
            warn!(pattern = %pattern, "matched no files");
        }
    }
    Ok(out)
}

fn print_summary(file_name: &str, table: &ConsumptionTable, top: usize) {
    println!("== {} ==", file_name);
    println!(
        "{} records, {} devices, {} clamped",
        table.len(),
        table.devices().len(),
        table.clamped_count()
    );
    for (device, kwh) in table.totals_by_device() {
        if kwh > 0.0 {
            println!("  {:<30} {:>12.2} kWh", device, kwh);
        }
    }
    println!("  {:<30} {:>12.2} kWh", "TOTAL", table.total_consumption());

    if top > 0 && !table.is_empty() {
        println!("top {}:", top);
        for (rank, (device, kwh)) in table.top_devices(top).iter().enumerate() {
            println!("  {}. {} ({:.2} kWh)", rank + 1, device, kwh);
        }
    }
    for (day, kwh) in table.daily_totals() {
        println!("  {}  {:>12.2} kWh", day, kwh);
    }
}
