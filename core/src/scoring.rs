//! Risk scoring engine — composite customer credit risk on a 0-100 scale.
//!
//! Five independent sub-scores, each pure and clamped to [0,100]:
//!   1. Debt burden        (35%)  total debt / income
//!   2. Liquidity risk     (25%)  liquid assets / total debt
//!   3. Credit utilization (20%)  credit card balance / income
//!   4. Asset backing      (10%)  (properties + superannuation) / total debt
//!   5. Tenure risk        (10%)  years with the bank
//!
//! Division-by-zero singularities are handled by explicit per-function
//! policy (documented on each function), never left to float arithmetic.

use crate::record::{CustomerRecord, RiskBreakdown, RiskCategory};
use serde::{Deserialize, Serialize};

const WEIGHT_DEBT_BURDEN: f64 = 0.35;
const WEIGHT_LIQUIDITY: f64 = 0.25;
const WEIGHT_UTILIZATION: f64 = 0.20;
const WEIGHT_ASSET_BACKING: f64 = 0.10;
const WEIGHT_TENURE: f64 = 0.10;

/// A debt-to-income ratio of 5.0 or more saturates debt burden at 100.
const DEBT_INCOME_SATURATION: f64 = 5.0;
/// Liquid coverage of 2x debt or more saturates liquidity risk at 0.
const COVERAGE_SATURATION: f64 = 2.0;
/// Credit card debt at 50% of income or more saturates utilization at 100.
const UTILIZATION_SATURATION: f64 = 0.5;
/// Asset backing of 3x debt or more saturates asset backing at 0.
const BACKING_SATURATION: f64 = 3.0;
/// Assumed average property value for collateral estimation.
const PROPERTY_VALUE: f64 = 500_000.0;
/// 20+ years with the bank saturates tenure risk at 0.
const TENURE_SATURATION_YEARS: f64 = 20.0;
/// Neutral score when the join year is unknown.
const TENURE_UNKNOWN: f64 = 50.0;

fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

fn total_debt(r: &CustomerRecord) -> f64 {
    r.bank_loans + r.credit_card_balance + r.business_lending
}

/// Debt burden score. No income with any debt position is maximum risk.
pub fn debt_burden(r: &CustomerRecord) -> f64 {
    if r.estimated_income <= 0.0 {
        return 100.0;
    }
    let ratio = total_debt(r) / r.estimated_income;
    (ratio / DEBT_INCOME_SATURATION * 100.0).min(100.0)
}

/// Liquidity risk score. No debt means no liquidity risk, regardless of
/// how little the client holds in liquid assets.
pub fn liquidity_risk(r: &CustomerRecord) -> f64 {
    let debt = total_debt(r);
    if debt <= 0.0 {
        return 0.0;
    }
    let liquid = r.bank_deposits + r.checking_accounts + r.saving_accounts;
    let coverage = liquid / debt;
    clamp_score((1.0 - coverage / COVERAGE_SATURATION) * 100.0)
}

/// Credit utilization score. With no income, any card balance at all is
/// maximum risk; no balance is none.
pub fn credit_utilization(r: &CustomerRecord) -> f64 {
    if r.estimated_income <= 0.0 {
        return if r.credit_card_balance > 0.0 { 100.0 } else { 0.0 };
    }
    let utilization = r.credit_card_balance / r.estimated_income;
    (utilization / UTILIZATION_SATURATION * 100.0).min(100.0)
}

/// Asset backing score. No debt means nothing to back.
pub fn asset_backing(r: &CustomerRecord) -> f64 {
    let debt = total_debt(r);
    if debt <= 0.0 {
        return 0.0;
    }
    let assets = r.properties_owned as f64 * PROPERTY_VALUE + r.superannuation_savings;
    let backing = assets / debt;
    clamp_score((1.0 - backing / BACKING_SATURATION) * 100.0)
}

/// Tenure risk score from calendar years only (not day precision).
/// Unknown join year is a neutral 50 — tenure is one signal of five and
/// must not abort scoring for an otherwise valid record. A join year in
/// the future goes negative and the clamp pushes it to 100.
pub fn tenure_risk(joined_year: Option<i32>, current_year: i32) -> f64 {
    let Some(year) = joined_year else {
        return TENURE_UNKNOWN;
    };
    let years_with_bank = (current_year - year) as f64;
    clamp_score((1.0 - years_with_bank / TENURE_SATURATION_YEARS) * 100.0)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Weighted composite of the five sub-scores, rounded to two decimals.
pub fn composite(
    debt_burden: f64,
    liquidity_risk: f64,
    credit_utilization: f64,
    asset_backing: f64,
    tenure_risk: f64,
) -> f64 {
    round2(
        debt_burden * WEIGHT_DEBT_BURDEN
            + liquidity_risk * WEIGHT_LIQUIDITY
            + credit_utilization * WEIGHT_UTILIZATION
            + asset_backing * WEIGHT_ASSET_BACKING
            + tenure_risk * WEIGHT_TENURE,
    )
}

/// Score one record. Pure: `current_year` is injected by the caller.
pub fn score_record(r: &CustomerRecord, current_year: i32) -> RiskBreakdown {
    use chrono::Datelike;

    let debt = debt_burden(r);
    let liquidity = liquidity_risk(r);
    let utilization = credit_utilization(r);
    let backing = asset_backing(r);
    let tenure = tenure_risk(Some(r.joined_date.year()), current_year);

    RiskBreakdown {
        debt_burden: debt,
        liquidity_risk: liquidity,
        credit_utilization: utilization,
        asset_backing: backing,
        tenure_risk: tenure,
        risk_score: composite(debt, liquidity, utilization, backing, tenure),
    }
}

/// Reporting band for a composite score. Upper bound of each band is
/// inclusive: <=30 Low, <=60 Moderate, <=80 High, else Critical.
pub fn risk_category(score: f64) -> RiskCategory {
    if score <= 30.0 {
        RiskCategory::Low
    } else if score <= 60.0 {
        RiskCategory::Moderate
    } else if score <= 80.0 {
        RiskCategory::High
    } else {
        RiskCategory::Critical
    }
}

/// Summary statistics over a scored record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub mean:           f64,
    pub median:         f64,
    pub min:            f64,
    pub max:            f64,
    pub std_dev:        f64,
    pub low_count:      usize,
    pub moderate_count: usize,
    pub high_count:     usize,
    pub critical_count: usize,
}

impl RiskSummary {
    /// Compute from composite scores. Empty input yields all zeros.
    pub fn from_scores(scores: &[f64]) -> Self {
        if scores.is_empty() {
            return Self {
                mean: 0.0,
                median: 0.0,
                min: 0.0,
                max: 0.0,
                std_dev: 0.0,
                low_count: 0,
                moderate_count: 0,
                high_count: 0,
                critical_count: 0,
            };
        }

        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        // Sample standard deviation (n-1 denominator).
        let variance = if scores.len() > 1 {
            scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1.0)
        } else {
            0.0
        };

        let mut sorted = scores.to_vec();
        sorted.sort_by(f64::total_cmp);
        let median = if sorted.len() % 2 == 1 {
            sorted[sorted.len() / 2]
        } else {
            (sorted[sorted.len() / 2 - 1] + sorted[sorted.len() / 2]) / 2.0
        };

        let mut counts = [0usize; 4];
        for &s in scores {
            match risk_category(s) {
                RiskCategory::Low => counts[0] += 1,
                RiskCategory::Moderate => counts[1] += 1,
                RiskCategory::High => counts[2] += 1,
                RiskCategory::Critical => counts[3] += 1,
            }
        }

        Self {
            mean,
            median,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            std_dev: variance.sqrt(),
            low_count: counts[0],
            moderate_count: counts[1],
            high_count: counts[2],
            critical_count: counts[3],
        }
    }
}
