//! etl-runner: headless runner for the bankrisk ETL pipeline.
//!
//! Usage:
//!   etl-runner --input Banking.csv --db bankrisk.db --output ./output
//!   etl-runner --input Banking.csv --as-of 2026-01-31 --json
//!   etl-runner --db bankrisk.db --output ./output            (export latest run only)

use anyhow::{bail, Context, Result};
use bankrisk_core::{export, extract, pipeline, store::EtlStore};
use chrono::{NaiveDate, Utc};
use std::env;
use std::path::Path;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let input = flag_value(&args, "--input");
    let db = flag_value(&args, "--db").unwrap_or("bankrisk.db");
    let output = flag_value(&args, "--output");
    let json = args.iter().any(|a| a == "--json");
    let as_of = match flag_value(&args, "--as-of") {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("invalid --as-of date '{raw}', expected YYYY-MM-DD"))?,
        None => Utc::now().date_naive(),
    };

    let mut store = EtlStore::open(db)?;
    store.migrate()?;

    let Some(input) = input else {
        // Read-only mode: export the latest successful run.
        let Some(output) = output else {
            bail!("nothing to do: pass --input <csv> to run the pipeline, or --output <dir> to export the latest run");
        };
        let run_id = export::export_run(&store, None, Path::new(output))?;
        println!("Exported run {run_id} to {output}");
        return Ok(());
    };

    if !json {
        println!("{}", "=".repeat(60));
        println!("Banking Risk Assessment ETL Pipeline");
        println!("{}", "=".repeat(60));
        println!("  input:  {input}");
        println!("  db:     {db}");
        println!("  as-of:  {as_of}");
        println!();
    }

    let records = extract::extract_file(Path::new(input))?;
    let report = pipeline::run_pipeline(&mut store, &records, input, as_of)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("KPI SUMMARY (run {})", report.run_id);
        println!("{}", "-".repeat(60));
        for kpi in &report.kpis {
            println!("  {}: {}", kpi.name, kpi.formatted);
        }
        println!();
        println!("RISK DISTRIBUTION");
        println!("{}", "-".repeat(60));
        let s = &report.risk_summary;
        println!("  Mean: {:.2}  Median: {:.2}  Min: {:.2}  Max: {:.2}", s.mean, s.median, s.min, s.max);
        println!("  Low (0-30):        {}", s.low_count);
        println!("  Moderate (31-60):  {}", s.moderate_count);
        println!("  High (61-80):      {}", s.high_count);
        println!("  Critical (81-100): {}", s.critical_count);
        println!();
        println!(
            "Run {} completed: {} records loaded in {:.2}s",
            report.run_id, report.records_loaded, report.execution_seconds
        );
    }

    if let Some(output) = output {
        export::export_run(&store, Some(report.run_id), Path::new(output))?;
        if !json {
            println!("Outputs exported to: {output}");
        }
    }

    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
