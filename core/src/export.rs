//! Output boundary: flat CSV export of one run's stored data.
//!
//! Exports read from the store, not from in-memory pipeline state, so a
//! past run can be re-exported at any time. Column headers use the
//! human-readable labels from aggregation, matching the source report.

use crate::{
    error::EtlResult,
    kpi::{Dimension, DIMENSIONS},
    record::EnrichedRecord,
    store::EtlStore,
    types::RunId,
};
use std::fmt::Write as _;
use std::path::Path;

const RECORD_HEADER: &str = "Client ID,Name,Age,Nationality,Joined Bank,\
Fee Structure,Loyalty Classification,Estimated Income,\
Superannuation Savings,Amount of Credit Cards,Credit Card Balance,\
Bank Loans,Bank Deposits,Checking Accounts,Saving Accounts,\
Foreign Currency Account,Business Lending,Properties Owned,\
Engagement Days,Engagement Timeframe,Income Band,Processing Fees,\
Total Loan,Total Deposit,Total Fees,Debt Burden Score,\
Liquidity Risk Score,Credit Utilization Score,Asset Backing Score,\
Tenure Risk Score,Risk Score";

/// Export one run (default: latest successful) to CSV files in `output_dir`.
/// Writes `cleaned_banking.csv`, `kpi_summary.csv` and one
/// `kpi_by_<dimension>.csv` per dimension. Returns the exported run id.
pub fn export_run(
    store: &EtlStore,
    run_id: Option<RunId>,
    output_dir: &Path,
) -> EtlResult<RunId> {
    let run_id = store.resolve_run(run_id)?;
    std::fs::create_dir_all(output_dir)?;

    write_records(store, run_id, &output_dir.join("cleaned_banking.csv"))?;
    write_kpi_summary(store, run_id, &output_dir.join("kpi_summary.csv"))?;
    for dimension in DIMENSIONS {
        let file = format!("kpi_by_{}.csv", dimension.file_stem());
        write_dimension(store, run_id, dimension, &output_dir.join(file))?;
    }

    log::info!("export: run {run_id} exported to {}", output_dir.display());
    Ok(run_id)
}

fn write_records(store: &EtlStore, run_id: RunId, path: &Path) -> EtlResult<()> {
    let mut out = String::from(RECORD_HEADER);
    out.push('\n');
    for r in store.records_for_run(run_id)? {
        push_record_row(&mut out, &r);
    }
    std::fs::write(path, out)?;
    Ok(())
}

fn push_record_row(out: &mut String, r: &EnrichedRecord) {
    let c = &r.customer;
    let d = &r.derived;
    let k = &r.risk;
    let _ = writeln!(
        out,
        "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
        field(&c.client_id),
        field(&c.name),
        c.age,
        field(&c.nationality),
        c.joined_date.format("%Y-%m-%d"),
        field(&c.fee_structure),
        field(&c.loyalty_classification),
        c.estimated_income,
        c.superannuation_savings,
        c.amount_of_credit_cards,
        c.credit_card_balance,
        c.bank_loans,
        c.bank_deposits,
        c.checking_accounts,
        c.saving_accounts,
        c.foreign_currency_account,
        c.business_lending,
        c.properties_owned,
        d.engagement_days,
        field(&d.engagement_timeframe),
        field(&d.income_band),
        d.processing_fee_rate,
        d.total_loan,
        d.total_deposit,
        d.total_fees,
        k.debt_burden,
        k.liquidity_risk,
        k.credit_utilization,
        k.asset_backing,
        k.tenure_risk,
        k.risk_score,
    );
}

fn write_kpi_summary(store: &EtlStore, run_id: RunId, path: &Path) -> EtlResult<()> {
    let mut out = String::from("KPI,Value,Formatted\n");
    for kpi in store.kpi_summary_for_run(run_id)? {
        let _ = writeln!(
            out,
            "{},{},{}",
            field(&kpi.kpi_name),
            kpi.kpi_value,
            field(&kpi.kpi_formatted)
        );
    }
    std::fs::write(path, out)?;
    Ok(())
}

fn write_dimension(
    store: &EtlStore,
    run_id: RunId,
    dimension: Dimension,
    path: &Path,
) -> EtlResult<()> {
    let mut out = format!(
        "{},Total Clients,Total Loan,Bank Loan,Business Lending,\
Credit Cards Balance,Total Deposit,Bank Deposit,Checking Account Amount,\
Saving Account Amount,Foreign Currency Amount,Total CC Amount,Total Fees,\
Engagement Account,Avg Risk Score\n",
        dimension.label()
    );
    for row in store.kpis_by_dimension_for_run(run_id, dimension)? {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            field(&row.dimension_value),
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
        );
    }
    std::fs::write(path, out)?;
    Ok(())
}

/// Quote a text field if it contains CSV metacharacters.
fn field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
