//! KPI snapshot persistence: global summary and dimensional breakdowns.

use super::EtlStore;
use crate::{
    error::EtlResult,
    kpi::{Dimension, DimensionalKpiRow, GlobalKpi},
    types::RunId,
};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

/// One global KPI as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredKpi {
    pub kpi_name:      String,
    pub kpi_value:     f64,
    pub kpi_formatted: String,
}

/// Insert the global KPI snapshot inside the caller's transaction.
/// UNIQUE(run_id, kpi_name) rejects duplicate snapshots for a run.
pub(super) fn insert_kpi_summary(
    conn: &Connection,
    run_id: RunId,
    kpis: &[GlobalKpi],
) -> EtlResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO kpi_summary (run_id, kpi_name, kpi_value, kpi_formatted)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for kpi in kpis {
        stmt.execute(params![run_id, kpi.name, kpi.value, kpi.formatted])?;
    }
    Ok(())
}

/// Insert one dimension's breakdown rows inside the caller's transaction.
pub(super) fn insert_dimensional(
    conn: &Connection,
    run_id: RunId,
    dimension: Dimension,
    rows: &[DimensionalKpiRow],
) -> EtlResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO kpi_by_dimension (
            run_id, dimension_type, dimension_value,
            total_clients, total_loan, bank_loan, business_lending,
            credit_cards_balance, total_deposit, bank_deposit,
            checking_account_amount, saving_account_amount,
            foreign_currency_amount, total_cc_amount, total_fees,
            engagement_account, avg_risk_score
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                  ?14, ?15, ?16, ?17)",
    )?;
    for row in rows {
        stmt.execute(params![
            run_id,
            dimension.label(),
            &row.dimension_value,
            row.total_clients,
            row.total_loan,
            row.bank_loan,
            row.business_lending,
            row.credit_cards_balance,
            row.total_deposit,
            row.bank_deposit,
            row.checking_account_amount,
            row.saving_account_amount,
            row.foreign_currency_amount,
            row.total_cc_amount,
            row.total_fees,
            row.engagement_account,
            row.avg_risk_score,
        ])?;
    }
    Ok(())
}

impl EtlStore {
    /// Global KPI snapshot for one run, in insertion (report) order.
    pub fn kpi_summary_for_run(&self, run_id: RunId) -> EtlResult<Vec<StoredKpi>> {
        let mut stmt = self.conn.prepare(
            "SELECT kpi_name, kpi_value, kpi_formatted
             FROM kpi_summary WHERE run_id = ?1 ORDER BY id",
        )?;
        let kpis = stmt
            .query_map(params![run_id], |row| {
                Ok(StoredKpi {
                    kpi_name: row.get(0)?,
                    kpi_value: row.get(1)?,
                    kpi_formatted: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(kpis)
    }

    /// One dimension's breakdown for one run, ordered by category value.
    pub fn kpis_by_dimension_for_run(
        &self,
        run_id: RunId,
        dimension: Dimension,
    ) -> EtlResult<Vec<DimensionalKpiRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT dimension_value, total_clients, total_loan, bank_loan,
                    business_lending, credit_cards_balance, total_deposit,
                    bank_deposit, checking_account_amount, saving_account_amount,
                    foreign_currency_amount, total_cc_amount, total_fees,
                    engagement_account, avg_risk_score
             FROM kpi_by_dimension
             WHERE run_id = ?1 AND dimension_type = ?2
             ORDER BY dimension_value",
        )?;
        let rows = stmt
            .query_map(params![run_id, dimension.label()], |row| {
                Ok(DimensionalKpiRow {
                    dimension_value: row.get(0)?,
                    total_clients: row.get(1)?,
                    total_loan: row.get(2)?,
                    bank_loan: row.get(3)?,
                    business_lending: row.get(4)?,
                    credit_cards_balance: row.get(5)?,
                    total_deposit: row.get(6)?,
                    bank_deposit: row.get(7)?,
                    checking_account_amount: row.get(8)?,
                    saving_account_amount: row.get(9)?,
                    foreign_currency_amount: row.get(10)?,
                    total_cc_amount: row.get(11)?,
                    total_fees: row.get(12)?,
                    engagement_account: row.get(13)?,
                    avg_risk_score: row.get(14)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
