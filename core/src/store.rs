//! SQLite persistence layer.
//!
//! RULE: Only the store modules talk to the database.
//! Pipeline stages call store methods — they never execute SQL directly.
//!
//! Every pipeline execution is an immutable, numbered run. A run row is
//! inserted with a failed-status placeholder before any data is written,
//! and reaches success only inside the same transaction that wrote all of
//! its data — readers never observe a partially loaded run.

mod kpis;
mod records;

use crate::{
    error::{EtlError, EtlResult},
    kpi::{Dimension, DimensionalKpiRow, GlobalKpi},
    record::EnrichedRecord,
    types::RunId,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

pub use kpis::StoredKpi;

/// Records inserted per prepared-statement batch. Throughput only — the
/// enclosing transaction makes batching invisible to readers.
pub const BATCH_SIZE: usize = 500;

/// Terminal status of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Success,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
        }
    }

    fn parse(s: &str) -> Self {
        // CHECK constraint admits exactly these two values.
        if s == "success" {
            RunStatus::Success
        } else {
            RunStatus::Failed
        }
    }
}

/// One audit row from `pipeline_runs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub run_id:                 RunId,
    pub run_timestamp:          DateTime<Utc>,
    pub source_file:            String,
    pub records_extracted:      i64,
    pub records_loaded:         i64,
    pub status:                 RunStatus,
    pub execution_time_seconds: Option<f64>,
    pub notes:                  Option<String>,
}

pub struct EtlStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl EtlStore {
    /// Open (or create) the pipeline database at `path`.
    pub fn open(path: &str) -> EtlResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode: better concurrent read performance.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> EtlResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database file.
    /// For in-memory databases this returns a fresh, isolated database.
    pub fn reopen(&self) -> EtlResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> EtlResult<()> {
        self.conn
            .execute_batch(include_str!("../migrations/001_schema.sql"))?;
        Ok(())
    }

    // ── Run lifecycle ──────────────────────────────────────────

    /// Start a run: insert the audit row with a failed-status placeholder
    /// and zero records loaded, before any data is written. Guarantees a
    /// terminal audit record exists even if the process dies mid-load.
    pub fn begin_run(&self, source_file: &str, records_extracted: usize) -> EtlResult<RunId> {
        self.conn.execute(
            "INSERT INTO pipeline_runs
                 (run_timestamp, source_file, records_extracted, records_loaded, status)
             VALUES (?1, ?2, ?3, 0, 'failed')",
            params![Utc::now().to_rfc3339(), source_file, records_extracted as i64],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Persist everything a run produced, atomically: batched records, the
    /// global KPI snapshot, the dimensional breakdowns, and the success
    /// finalization of the run row. Commit or roll back as a unit.
    pub fn persist_run(
        &mut self,
        run_id: RunId,
        records: &[EnrichedRecord],
        kpi_summary: &[GlobalKpi],
        dimensional: &[(Dimension, Vec<DimensionalKpiRow>)],
        execution_seconds: f64,
    ) -> EtlResult<usize> {
        let tx = self.conn.transaction()?;

        let loaded = records::insert_records(&tx, run_id, records)?;
        kpis::insert_kpi_summary(&tx, run_id, kpi_summary)?;
        for (dimension, rows) in dimensional {
            kpis::insert_dimensional(&tx, run_id, *dimension, rows)?;
        }

        tx.execute(
            "UPDATE pipeline_runs
             SET records_loaded = ?1, execution_time_seconds = ?2,
                 status = 'success', notes = NULL
             WHERE run_id = ?3",
            params![loaded as i64, execution_seconds, run_id],
        )?;

        tx.commit()?;
        log::info!("store: run {run_id} committed, {loaded} records loaded");
        Ok(loaded)
    }

    /// Finalize a run as failed, capturing the error text in `notes`.
    /// Runs outside any data transaction: the data writes were already
    /// rolled back, so `records_loaded` stays at 0.
    pub fn finalize_failed(
        &self,
        run_id: RunId,
        execution_seconds: f64,
        notes: &str,
    ) -> EtlResult<()> {
        self.conn.execute(
            "UPDATE pipeline_runs
             SET execution_time_seconds = ?1, status = 'failed', notes = ?2
             WHERE run_id = ?3",
            params![execution_seconds, notes, run_id],
        )?;
        Ok(())
    }

    // ── Run queries ────────────────────────────────────────────

    /// The run with the highest run_id among status='success', if any.
    pub fn latest_successful_run(&self) -> EtlResult<Option<RunId>> {
        let id: Option<RunId> = self
            .conn
            .query_row(
                "SELECT MAX(run_id) FROM pipeline_runs WHERE status = 'success'",
                [],
                |row| row.get(0),
            )
            .optional()?
            .flatten();
        Ok(id)
    }

    /// Resolve an explicit run_id, or default to the latest successful run.
    pub fn resolve_run(&self, run_id: Option<RunId>) -> EtlResult<RunId> {
        match run_id {
            Some(id) => Ok(id),
            None => self
                .latest_successful_run()?
                .ok_or(EtlError::NoSuccessfulRun),
        }
    }

    pub fn run(&self, run_id: RunId) -> EtlResult<PipelineRun> {
        self.conn
            .query_row(
                "SELECT run_id, run_timestamp, source_file, records_extracted,
                        records_loaded, status, execution_time_seconds, notes
                 FROM pipeline_runs WHERE run_id = ?1",
                params![run_id],
                Self::map_run,
            )
            .optional()?
            .ok_or(EtlError::RunNotFound(run_id))
    }

    /// All runs, newest first.
    pub fn list_runs(&self) -> EtlResult<Vec<PipelineRun>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, run_timestamp, source_file, records_extracted,
                    records_loaded, status, execution_time_seconds, notes
             FROM pipeline_runs ORDER BY run_id DESC",
        )?;
        let runs = stmt
            .query_map([], Self::map_run)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }

    fn map_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<PipelineRun> {
        let ts: String = row.get(1)?;
        let status: String = row.get(5)?;
        Ok(PipelineRun {
            run_id: row.get(0)?,
            run_timestamp: DateTime::parse_from_rfc3339(&ts)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        1,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?,
            source_file: row.get(2)?,
            records_extracted: row.get(3)?,
            records_loaded: row.get(4)?,
            status: RunStatus::parse(&status),
            execution_time_seconds: row.get(6)?,
            notes: row.get(7)?,
        })
    }
}
