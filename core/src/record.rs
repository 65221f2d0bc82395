//! Customer record data model.
//!
//! A `CustomerRecord` is one validated input row. The pipeline enriches it
//! exactly once per run (`DerivedFields` + `RiskBreakdown`) and the result
//! is never mutated after persistence — each run owns its own copy.

use crate::types::ClientId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One validated input row from the source file.
/// All monetary fields are non-negative; validation happens upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    // Identity
    pub client_id:   ClientId,
    pub name:        String,
    pub age:         u32,
    pub nationality: String,
    pub joined_date: NaiveDate,

    // Classification
    pub fee_structure:          String,
    pub loyalty_classification: String,

    // Financial inputs
    pub estimated_income:         f64,
    pub superannuation_savings:   f64,
    pub amount_of_credit_cards:   u32,
    pub credit_card_balance:      f64,
    pub bank_loans:               f64,
    pub bank_deposits:            f64,
    pub checking_accounts:        f64,
    pub saving_accounts:          f64,
    pub foreign_currency_account: f64,
    pub business_lending:         f64,
    pub properties_owned:         u32,
}

/// Calculated attributes produced by the field deriver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedFields {
    pub engagement_days:      i64,
    pub engagement_timeframe: String,
    pub income_band:          String,
    pub processing_fee_rate:  f64,
    pub total_loan:           f64,
    pub total_deposit:        f64,
    pub total_fees:           f64,
}

/// The five component scores plus the weighted composite, all 0-100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    pub debt_burden:        f64,
    pub liquidity_risk:     f64,
    pub credit_utilization: f64,
    pub asset_backing:      f64,
    pub tenure_risk:        f64,
    /// Weighted composite, rounded to two decimals.
    pub risk_score:         f64,
}

/// A fully enriched record, ready for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub customer: CustomerRecord,
    pub derived:  DerivedFields,
    pub risk:     RiskBreakdown,
}

/// Reporting band for a composite risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskCategory {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Low      => "Low",
            RiskCategory::Moderate => "Moderate",
            RiskCategory::High     => "High",
            RiskCategory::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
