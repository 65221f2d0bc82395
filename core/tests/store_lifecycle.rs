//! Run-versioned store tests: lifecycle, atomicity, lineage, read path.

mod common;

use bankrisk_core::{
    kpi::{self, Dimension, DimensionalKpiRow, GlobalKpi, DIMENSIONS},
    pipeline,
    record::CustomerRecord,
    store::{EtlStore, RunStatus},
};
use common::{as_of, customer, date};

fn store() -> EtlStore {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = EtlStore::in_memory().unwrap();
    store.migrate().unwrap();
    store
}

fn sample_records(n: u32) -> Vec<CustomerRecord> {
    (1..=n)
        .map(|j| {
            let mut c = customer(&format!("C{j:03}"));
            c.bank_loans = 1_000.0 * j as f64;
            c.business_lending = 500.0 * j as f64;
            c.credit_card_balance = 100.0 * j as f64;
            c.bank_deposits = 2_000.0 * j as f64;
            c.checking_accounts = 300.0 * j as f64;
            c.saving_accounts = 400.0 * j as f64;
            c.foreign_currency_account = 50.0 * j as f64;
            c.amount_of_credit_cards = 1;
            c.estimated_income = 60_000.0 + 10_000.0 * j as f64;
            c.joined_date = date(2020, 6, 15);
            c
        })
        .collect()
}

/// A successful run reaches terminal success with final counts, and its
/// audit row carries no notes.
#[test]
fn successful_run_lifecycle() {
    let mut store = store();
    let records = sample_records(10);

    let report = pipeline::run_pipeline(&mut store, &records, "Banking.csv", as_of()).unwrap();
    assert_eq!(report.records_extracted, 10);
    assert_eq!(report.records_loaded, 10);

    let run = store.run(report.run_id).unwrap();
    assert_eq!(run.status, RunStatus::Success);
    assert_eq!(run.records_extracted, 10);
    assert_eq!(run.records_loaded, 10);
    assert_eq!(run.source_file, "Banking.csv");
    assert!(run.notes.is_none());
    assert!(run.execution_time_seconds.is_some());

    assert_eq!(store.latest_successful_run().unwrap(), Some(report.run_id));
    assert_eq!(store.record_count_for_run(report.run_id).unwrap(), 10);
}

/// End-to-end: stored global KPIs match hand-computed totals exactly.
/// Sum of j over 1..=10 is 55.
#[test]
fn stored_kpis_match_hand_computed_totals() {
    let mut store = store();
    let report =
        pipeline::run_pipeline(&mut store, &sample_records(10), "Banking.csv", as_of()).unwrap();

    let kpis = store.kpi_summary_for_run(report.run_id).unwrap();
    assert_eq!(kpis.len(), 13);
    let value = |name: &str| {
        kpis.iter()
            .find(|k| k.kpi_name == name)
            .unwrap_or_else(|| panic!("missing KPI '{name}'"))
            .kpi_value
    };

    assert_eq!(value("Total Clients"), 10.0);
    assert_eq!(value("Bank Loan"), 55_000.0);
    assert_eq!(value("Business Lending"), 27_500.0);
    assert_eq!(value("Credit Cards Balance"), 5_500.0);
    assert_eq!(value("Total Loan"), 88_000.0);
    assert_eq!(value("Bank Deposit"), 110_000.0);
    assert_eq!(value("Checking Account Amount"), 16_500.0);
    assert_eq!(value("Saving Account Amount"), 22_000.0);
    assert_eq!(value("Foreign Currency Amount"), 2_750.0);
    assert_eq!(value("Total Deposit"), 151_250.0);
    assert_eq!(value("Total CC Amount"), 10.0);

    let expected_days = (as_of() - date(2020, 6, 15)).num_days() * 10;
    assert_eq!(value("Engagement Account"), expected_days as f64);
}

/// Records round-trip through the store unchanged.
#[test]
fn records_round_trip() {
    let mut store = store();
    let records = sample_records(3);
    let enriched = pipeline::enrich_records(&records, as_of()).unwrap();

    let report = pipeline::run_pipeline(&mut store, &records, "Banking.csv", as_of()).unwrap();
    let stored = store.records_for_run(report.run_id).unwrap();

    assert_eq!(stored, enriched, "read-back must equal what was enriched");
}

/// Dimensional snapshots round-trip and keep one row per observed
/// category value per dimension.
#[test]
fn dimensional_snapshots_round_trip() {
    let mut store = store();
    let mut records = sample_records(6);
    records[0].nationality = "NZ".to_string();
    records[1].nationality = "NZ".to_string();
    records[2].fee_structure = "High".to_string();

    let enriched = pipeline::enrich_records(&records, as_of()).unwrap();
    let report = pipeline::run_pipeline(&mut store, &records, "Banking.csv", as_of()).unwrap();

    for dimension in DIMENSIONS {
        let expected = kpi::kpis_by_dimension(&enriched, dimension);
        let stored = store
            .kpis_by_dimension_for_run(report.run_id, dimension)
            .unwrap();
        assert_eq!(stored, expected, "dimension {dimension:?} mismatch");
    }

    let by_nationality = store
        .kpis_by_dimension_for_run(report.run_id, Dimension::Nationality)
        .unwrap();
    assert_eq!(by_nationality.len(), 2, "AU and NZ");
}

/// A run that fails validation is finalized as failed with the error in
/// notes and zero records loaded, and never becomes the latest success.
#[test]
fn failed_run_is_recorded_and_skipped() {
    let mut store = store();
    let first =
        pipeline::run_pipeline(&mut store, &sample_records(5), "Banking.csv", as_of()).unwrap();

    // One record with a join date after the as-of date poisons the batch.
    let mut records = sample_records(5);
    records[3].joined_date = date(2027, 1, 1);
    let err = pipeline::run_pipeline(&mut store, &records, "Banking_v2.csv", as_of());
    assert!(err.is_err(), "future join date must reject the run");

    let failed_id = first.run_id + 1;
    let failed = store.run(failed_id).unwrap();
    assert_eq!(failed.status, RunStatus::Failed);
    assert_eq!(failed.records_loaded, 0);
    let notes = failed.notes.expect("failure reason captured in notes");
    assert!(notes.contains("joined_date"), "notes: {notes}");

    assert_eq!(store.record_count_for_run(failed_id).unwrap(), 0);
    assert_eq!(
        store.latest_successful_run().unwrap(),
        Some(first.run_id),
        "latest successful run skips the failure"
    );
}

/// A persistence failure inside the run transaction rolls back every
/// write for that run: no records, no KPIs, nothing partially visible.
#[test]
fn persistence_failure_rolls_back_all_writes() {
    let mut store = store();
    let records = sample_records(4);
    let enriched = pipeline::enrich_records(&records, as_of()).unwrap();
    let kpis = kpi::global_kpis(&enriched);

    // Duplicate KPI names violate UNIQUE(run_id, kpi_name) after the
    // records were already inserted in the same transaction.
    let mut bad_kpis: Vec<GlobalKpi> = kpis.clone();
    bad_kpis.push(kpis[0].clone());

    let run_id = store.begin_run("Banking.csv", records.len()).unwrap();
    let dims: Vec<(Dimension, Vec<DimensionalKpiRow>)> = DIMENSIONS
        .iter()
        .map(|&d| (d, kpi::kpis_by_dimension(&enriched, d)))
        .collect();

    let result = store.persist_run(run_id, &enriched, &bad_kpis, &dims, 0.1);
    assert!(result.is_err(), "duplicate KPI name must fail the transaction");

    assert_eq!(store.record_count_for_run(run_id).unwrap(), 0);
    assert!(store.kpi_summary_for_run(run_id).unwrap().is_empty());

    let run = store.run(run_id).unwrap();
    assert_eq!(run.status, RunStatus::Failed, "placeholder status survives");
    assert_eq!(run.records_loaded, 0);
    assert_eq!(store.latest_successful_run().unwrap(), None);
}

/// Append-only lineage: re-running allocates the next run_id and leaves
/// the prior run's stored data byte-identical.
#[test]
fn rerun_appends_and_preserves_prior_run() {
    let mut store = store();
    let first =
        pipeline::run_pipeline(&mut store, &sample_records(10), "Banking.csv", as_of()).unwrap();
    let first_records = store.records_for_run(first.run_id).unwrap();
    let first_kpis = store.kpi_summary_for_run(first.run_id).unwrap();

    let second =
        pipeline::run_pipeline(&mut store, &sample_records(11), "Banking.csv", as_of()).unwrap();
    assert_eq!(second.run_id, first.run_id + 1, "run ids are monotonic");

    assert_eq!(store.records_for_run(first.run_id).unwrap(), first_records);
    assert_eq!(store.kpi_summary_for_run(first.run_id).unwrap(), first_kpis);

    assert_eq!(store.latest_successful_run().unwrap(), Some(second.run_id));
    assert_eq!(store.record_count_for_run(second.run_id).unwrap(), 11);
}

/// resolve_run defaults to the latest successful run and errors when
/// nothing has succeeded yet.
#[test]
fn resolve_run_defaults_to_latest_success() {
    let mut store = store();
    assert!(store.resolve_run(None).is_err(), "no successful run yet");

    let report =
        pipeline::run_pipeline(&mut store, &sample_records(2), "Banking.csv", as_of()).unwrap();
    assert_eq!(store.resolve_run(None).unwrap(), report.run_id);
    assert_eq!(store.resolve_run(Some(1)).unwrap(), 1);
}

/// A second connection opened via reopen sees committed runs in a
/// file-backed database: the export path reads through its own handle.
#[test]
fn reopened_file_store_sees_committed_runs() {
    let _ = env_logger::builder().is_test(true).try_init();
    let path = std::env::temp_dir().join(format!("bankrisk_reopen_{}.db", std::process::id()));
    let path_str = path.to_str().unwrap();

    let mut store = EtlStore::open(path_str).unwrap();
    store.migrate().unwrap();
    let report =
        pipeline::run_pipeline(&mut store, &sample_records(3), "Banking.csv", as_of()).unwrap();

    let reader = store.reopen().unwrap();
    assert_eq!(reader.latest_successful_run().unwrap(), Some(report.run_id));
    assert_eq!(reader.record_count_for_run(report.run_id).unwrap(), 3);
    assert_eq!(
        reader.kpi_summary_for_run(report.run_id).unwrap().len(),
        13,
        "full KPI snapshot visible through the second connection"
    );

    drop(reader);
    drop(store);
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{path_str}{suffix}"));
    }
}

/// list_runs returns every run, newest first, success and failure alike.
#[test]
fn list_runs_newest_first() {
    let mut store = store();
    pipeline::run_pipeline(&mut store, &sample_records(2), "a.csv", as_of()).unwrap();
    let mut bad = sample_records(1);
    bad[0].joined_date = date(2030, 1, 1);
    let _ = pipeline::run_pipeline(&mut store, &bad, "b.csv", as_of());
    pipeline::run_pipeline(&mut store, &sample_records(3), "c.csv", as_of()).unwrap();

    let runs = store.list_runs().unwrap();
    assert_eq!(runs.len(), 3);
    assert_eq!(runs[0].run_id, 3);
    assert_eq!(runs[0].status, RunStatus::Success);
    assert_eq!(runs[1].status, RunStatus::Failed);
    assert_eq!(runs[2].run_id, 1);
}
