//! Pipeline orchestration.
//!
//! STAGE ORDER (fixed, documented, never reordered):
//!   1. Begin run        (audit row, failed placeholder)
//!   2. Field deriver    (pure, per record)
//!   3. Risk scoring     (pure, per record)
//!   4. KPI aggregation  (global + five dimensions)
//!   5. Persist          (single transaction, success finalization inside)
//!
//! Any error after stage 1 finalizes the run as failed with the error text
//! in `notes` and propagates. A failed run is recorded, never hidden.

use crate::{
    error::EtlResult,
    kpi::{self, Dimension, DimensionalKpiRow, GlobalKpi, DIMENSIONS},
    record::{CustomerRecord, EnrichedRecord},
    scoring::{self, RiskSummary},
    store::EtlStore,
    transform,
    types::RunId,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::time::Instant;

/// Outcome of one successful pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub run_id:            RunId,
    pub source_file:       String,
    pub records_extracted: usize,
    pub records_loaded:    usize,
    pub execution_seconds: f64,
    pub kpis:              Vec<GlobalKpi>,
    pub risk_summary:      RiskSummary,
}

/// Derive and score every record independently. Pure given `as_of` — no
/// shared accumulator, no wall clock, so enrichment is idempotent.
pub fn enrich_records(
    records: &[CustomerRecord],
    as_of: NaiveDate,
) -> EtlResult<Vec<EnrichedRecord>> {
    let current_year = transform::as_of_year(as_of);
    records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let derived = transform::derive(r, as_of, i + 1)?;
            let risk = scoring::score_record(r, current_year);
            Ok(EnrichedRecord {
                customer: r.clone(),
                derived,
                risk,
            })
        })
        .collect()
}

/// Execute one complete run against the store.
///
/// The run is committed atomically; on any error the data writes roll back
/// and the run's audit row is finalized as failed (records_loaded = 0).
pub fn run_pipeline(
    store: &mut EtlStore,
    records: &[CustomerRecord],
    source_file: &str,
    as_of: NaiveDate,
) -> EtlResult<RunReport> {
    let started = Instant::now();
    let run_id = store.begin_run(source_file, records.len())?;
    log::info!(
        "pipeline: run {run_id} started, {} records extracted from {source_file}",
        records.len()
    );

    match execute(store, run_id, records, source_file, as_of, &started) {
        Ok(report) => {
            log::info!(
                "pipeline: run {run_id} succeeded in {:.2}s",
                report.execution_seconds
            );
            Ok(report)
        }
        Err(err) => {
            log::warn!("pipeline: run {run_id} failed: {err}");
            if let Err(fin) = store.finalize_failed(run_id, started.elapsed().as_secs_f64(), &err.to_string()) {
                log::warn!("pipeline: could not finalize failed run {run_id}: {fin}");
            }
            Err(err)
        }
    }
}

fn execute(
    store: &mut EtlStore,
    run_id: RunId,
    records: &[CustomerRecord],
    source_file: &str,
    as_of: NaiveDate,
    started: &Instant,
) -> EtlResult<RunReport> {
    let enriched = enrich_records(records, as_of)?;

    let kpis = kpi::global_kpis(&enriched);
    let dimensional: Vec<(Dimension, Vec<DimensionalKpiRow>)> = DIMENSIONS
        .iter()
        .map(|&d| (d, kpi::kpis_by_dimension(&enriched, d)))
        .collect();
    let scores: Vec<f64> = enriched.iter().map(|r| r.risk.risk_score).collect();
    let risk_summary = RiskSummary::from_scores(&scores);

    let execution_seconds = started.elapsed().as_secs_f64();
    let loaded = store.persist_run(run_id, &enriched, &kpis, &dimensional, execution_seconds)?;

    Ok(RunReport {
        run_id,
        source_file: source_file.to_string(),
        records_extracted: records.len(),
        records_loaded: loaded,
        execution_seconds,
        kpis,
        risk_summary,
    })
}
