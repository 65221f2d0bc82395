//! Enriched customer record persistence.

use super::{EtlStore, BATCH_SIZE};
use crate::{
    error::EtlResult,
    record::{CustomerRecord, DerivedFields, EnrichedRecord, RiskBreakdown},
    types::RunId,
};
use chrono::NaiveDate;
use rusqlite::{params, Connection};

const INSERT_SQL: &str = "INSERT INTO customer_records (
        run_id, client_id, name, age, nationality, joined_date,
        fee_structure, loyalty_classification,
        estimated_income, superannuation_savings, amount_of_credit_cards,
        credit_card_balance, bank_loans, bank_deposits, checking_accounts,
        saving_accounts, foreign_currency_account, business_lending,
        properties_owned,
        engagement_days, engagement_timeframe, income_band,
        processing_fee_rate, total_loan, total_deposit, total_fees,
        debt_burden, liquidity_risk, credit_utilization, asset_backing,
        tenure_risk, risk_score
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
              ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26,
              ?27, ?28, ?29, ?30, ?31, ?32)";

const SELECT_COLUMNS: &str = "client_id, name, age, nationality, joined_date,
        fee_structure, loyalty_classification,
        estimated_income, superannuation_savings, amount_of_credit_cards,
        credit_card_balance, bank_loans, bank_deposits, checking_accounts,
        saving_accounts, foreign_currency_account, business_lending,
        properties_owned,
        engagement_days, engagement_timeframe, income_band,
        processing_fee_rate, total_loan, total_deposit, total_fees,
        debt_burden, liquidity_risk, credit_utilization, asset_backing,
        tenure_risk, risk_score";

/// Insert all records for one run inside the caller's transaction.
/// Batched through a single prepared statement for throughput.
pub(super) fn insert_records(
    conn: &Connection,
    run_id: RunId,
    records: &[EnrichedRecord],
) -> EtlResult<usize> {
    let mut stmt = conn.prepare(INSERT_SQL)?;

    let mut inserted = 0usize;
    for chunk in records.chunks(BATCH_SIZE) {
        for r in chunk {
            stmt.execute(params![
                run_id,
                &r.customer.client_id,
                &r.customer.name,
                r.customer.age,
                &r.customer.nationality,
                r.customer.joined_date.format("%Y-%m-%d").to_string(),
                &r.customer.fee_structure,
                &r.customer.loyalty_classification,
                r.customer.estimated_income,
                r.customer.superannuation_savings,
                r.customer.amount_of_credit_cards,
                r.customer.credit_card_balance,
                r.customer.bank_loans,
                r.customer.bank_deposits,
                r.customer.checking_accounts,
                r.customer.saving_accounts,
                r.customer.foreign_currency_account,
                r.customer.business_lending,
                r.customer.properties_owned,
                r.derived.engagement_days,
                &r.derived.engagement_timeframe,
                &r.derived.income_band,
                r.derived.processing_fee_rate,
                r.derived.total_loan,
                r.derived.total_deposit,
                r.derived.total_fees,
                r.risk.debt_burden,
                r.risk.liquidity_risk,
                r.risk.credit_utilization,
                r.risk.asset_backing,
                r.risk.tenure_risk,
                r.risk.risk_score,
            ])?;
        }
        inserted += chunk.len();
        log::debug!("store: inserted batch of {} records ({inserted} total)", chunk.len());
    }
    Ok(inserted)
}

impl EtlStore {
    /// All enriched records belonging to one run, ordered by client id.
    pub fn records_for_run(&self, run_id: RunId) -> EtlResult<Vec<EnrichedRecord>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM customer_records
             WHERE run_id = ?1 ORDER BY client_id, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![run_id], map_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn record_count_for_run(&self, run_id: RunId) -> EtlResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM customer_records WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn map_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<EnrichedRecord> {
    let date: String = row.get(4)?;
    let joined_date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(EnrichedRecord {
        customer: CustomerRecord {
            client_id: row.get(0)?,
            name: row.get(1)?,
            age: row.get(2)?,
            nationality: row.get(3)?,
            joined_date,
            fee_structure: row.get(5)?,
            loyalty_classification: row.get(6)?,
            estimated_income: row.get(7)?,
            superannuation_savings: row.get(8)?,
            amount_of_credit_cards: row.get(9)?,
            credit_card_balance: row.get(10)?,
            bank_loans: row.get(11)?,
            bank_deposits: row.get(12)?,
            checking_accounts: row.get(13)?,
            saving_accounts: row.get(14)?,
            foreign_currency_account: row.get(15)?,
            business_lending: row.get(16)?,
            properties_owned: row.get(17)?,
        },
        derived: DerivedFields {
            engagement_days: row.get(18)?,
            engagement_timeframe: row.get(19)?,
            income_band: row.get(20)?,
            processing_fee_rate: row.get(21)?,
            total_loan: row.get(22)?,
            total_deposit: row.get(23)?,
            total_fees: row.get(24)?,
        },
        risk: RiskBreakdown {
            debt_burden: row.get(25)?,
            liquidity_risk: row.get(26)?,
            credit_utilization: row.get(27)?,
            asset_backing: row.get(28)?,
            tenure_risk: row.get(29)?,
            risk_score: row.get(30)?,
        },
    })
}
