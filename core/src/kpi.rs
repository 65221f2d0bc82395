//! KPI aggregator — global metrics and per-dimension breakdowns.
//!
//! Aggregation works on enriched records only; it never touches the store.
//! Formatting is display-only and must not leak into stored numeric values.

use crate::record::EnrichedRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// The 13 global KPI names, in report order.
pub const GLOBAL_KPI_NAMES: [&str; 13] = [
    "Total Clients",
    "Total Loan",
    "Bank Loan",
    "Business Lending",
    "Credit Cards Balance",
    "Total Deposit",
    "Bank Deposit",
    "Checking Account Amount",
    "Saving Account Amount",
    "Foreign Currency Amount",
    "Total CC Amount",
    "Total Fees",
    "Engagement Account",
];

/// One named global KPI with its raw value and display form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalKpi {
    pub name:      &'static str,
    pub value:     f64,
    pub formatted: String,
}

/// A categorical grouping attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimension {
    Nationality,
    IncomeBand,
    EngagementTimeframe,
    FeeStructure,
    LoyaltyClassification,
}

/// All dimensions, in the order breakdowns are produced and exported.
pub const DIMENSIONS: [Dimension; 5] = [
    Dimension::Nationality,
    Dimension::IncomeBand,
    Dimension::EngagementTimeframe,
    Dimension::FeeStructure,
    Dimension::LoyaltyClassification,
];

impl Dimension {
    /// Human-readable label, used as `dimension_type` in the store and as
    /// the leading column header in exports.
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Nationality => "Nationality",
            Dimension::IncomeBand => "Income Band",
            Dimension::EngagementTimeframe => "Engagement Timeframe",
            Dimension::FeeStructure => "Fee Structure",
            Dimension::LoyaltyClassification => "Loyalty Classification",
        }
    }

    /// Export file stem, e.g. `kpi_by_income_band.csv`.
    pub fn file_stem(&self) -> &'static str {
        match self {
            Dimension::Nationality => "nationality",
            Dimension::IncomeBand => "income_band",
            Dimension::EngagementTimeframe => "engagement_timeframe",
            Dimension::FeeStructure => "fee_structure",
            Dimension::LoyaltyClassification => "loyalty_classification",
        }
    }

    /// The record's category value for this dimension.
    pub fn value_of<'a>(&self, r: &'a EnrichedRecord) -> &'a str {
        match self {
            Dimension::Nationality => &r.customer.nationality,
            Dimension::IncomeBand => &r.derived.income_band,
            Dimension::EngagementTimeframe => &r.derived.engagement_timeframe,
            Dimension::FeeStructure => &r.customer.fee_structure,
            Dimension::LoyaltyClassification => &r.customer.loyalty_classification,
        }
    }
}

/// KPI metrics for one category value of one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionalKpiRow {
    pub dimension_value:         String,
    pub total_clients:           i64,
    pub total_loan:              f64,
    pub bank_loan:               f64,
    pub business_lending:        f64,
    pub credit_cards_balance:    f64,
    pub total_deposit:           f64,
    pub bank_deposit:            f64,
    pub checking_account_amount: f64,
    pub saving_account_amount:   f64,
    pub foreign_currency_amount: f64,
    pub total_cc_amount:         i64,
    pub total_fees:              f64,
    pub engagement_account:      i64,
    /// Mean composite risk score over the group's rows, not a sum.
    pub avg_risk_score:          f64,
}

#[derive(Debug, Default)]
struct Sums {
    clients:          HashSet<String>,
    total_loan:       f64,
    bank_loans:       f64,
    business_lending: f64,
    cc_balance:       f64,
    total_deposit:    f64,
    bank_deposits:    f64,
    checking:         f64,
    saving:           f64,
    foreign_currency: f64,
    cc_count:         i64,
    total_fees:       f64,
    engagement_days:  i64,
    risk_sum:         f64,
    rows:             usize,
}

impl Sums {
    fn add(&mut self, r: &EnrichedRecord) {
        self.clients.insert(r.customer.client_id.clone());
        self.total_loan += r.derived.total_loan;
        self.bank_loans += r.customer.bank_loans;
        self.business_lending += r.customer.business_lending;
        self.cc_balance += r.customer.credit_card_balance;
        self.total_deposit += r.derived.total_deposit;
        self.bank_deposits += r.customer.bank_deposits;
        self.checking += r.customer.checking_accounts;
        self.saving += r.customer.saving_accounts;
        self.foreign_currency += r.customer.foreign_currency_account;
        self.cc_count += r.customer.amount_of_credit_cards as i64;
        self.total_fees += r.derived.total_fees;
        self.engagement_days += r.derived.engagement_days;
        self.risk_sum += r.risk.risk_score;
        self.rows += 1;
    }
}

/// Compute the 13 global KPIs for a record set, in report order.
/// "Total Clients" counts distinct client ids, not rows.
pub fn global_kpis(records: &[EnrichedRecord]) -> Vec<GlobalKpi> {
    let mut sums = Sums::default();
    for r in records {
        sums.add(r);
    }

    let values: [f64; 13] = [
        sums.clients.len() as f64,
        sums.total_loan,
        sums.bank_loans,
        sums.business_lending,
        sums.cc_balance,
        sums.total_deposit,
        sums.bank_deposits,
        sums.checking,
        sums.saving,
        sums.foreign_currency,
        sums.cc_count as f64,
        sums.total_fees,
        sums.engagement_days as f64,
    ];

    GLOBAL_KPI_NAMES
        .iter()
        .zip(values)
        .map(|(&name, value)| GlobalKpi {
            name,
            value,
            formatted: format_kpi(name, value),
        })
        .collect()
}

/// Group records by one dimension and compute the per-group metrics.
/// One row per observed category value, sorted by value.
pub fn kpis_by_dimension(records: &[EnrichedRecord], dimension: Dimension) -> Vec<DimensionalKpiRow> {
    let mut groups: BTreeMap<String, Sums> = BTreeMap::new();
    for r in records {
        groups
            .entry(dimension.value_of(r).to_string())
            .or_default()
            .add(r);
    }

    groups
        .into_iter()
        .map(|(value, sums)| DimensionalKpiRow {
            dimension_value: value,
            total_clients: sums.clients.len() as i64,
            total_loan: sums.total_loan,
            bank_loan: sums.bank_loans,
            business_lending: sums.business_lending,
            credit_cards_balance: sums.cc_balance,
            total_deposit: sums.total_deposit,
            bank_deposit: sums.bank_deposits,
            checking_account_amount: sums.checking,
            saving_account_amount: sums.saving,
            foreign_currency_amount: sums.foreign_currency,
            total_cc_amount: sums.cc_count,
            total_fees: sums.total_fees,
            engagement_account: sums.engagement_days,
            avg_risk_score: sums.risk_sum / sums.rows as f64,
        })
        .collect()
}

/// Count-like KPIs display as thousands-grouped integers; everything else
/// is monetary and scales to $M / $K above the respective thresholds.
pub fn format_kpi(name: &str, value: f64) -> String {
    match name {
        "Total Clients" | "Total CC Amount" | "Engagement Account" => {
            group_thousands(value as i64)
        }
        _ => format_money(value),
    }
}

fn format_money(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("${:.2}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("${:.2}K", value / 1_000.0)
    } else {
        format!("${value:.2}")
    }
}

fn group_thousands(n: i64) -> String {
    let digits = n.abs().to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if n < 0 {
        format!("-{out}")
    } else {
        out
    }
}
