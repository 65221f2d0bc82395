//! Field deriver — per-record calculated attributes.
//!
//! Every function here is pure: the reference date is an explicit `as_of`
//! parameter, never the wall clock, so derivation is deterministic and
//! re-running it on the same input yields identical output.

use crate::{
    error::{EtlError, EtlResult},
    record::{CustomerRecord, DerivedFields},
};
use chrono::{Datelike, NaiveDate};

/// Income band boundaries: < 100K Low, 100K-300K Mid, > 300K High.
const INCOME_BAND_LOW_CEIL: f64 = 100_000.0;
const INCOME_BAND_MID_CEIL: f64 = 300_000.0;

/// Processing fee rates per fee structure tier.
const FEE_RATE_HIGH: f64 = 0.05;
const FEE_RATE_MID: f64 = 0.03;
const FEE_RATE_LOW: f64 = 0.01;

/// Days the client has been with the bank as of `as_of`.
/// A join date after `as_of` is a data-quality condition, not a record to
/// clamp — the caller rejects the run.
pub fn engagement_days(joined: NaiveDate, as_of: NaiveDate) -> i64 {
    (as_of - joined).num_days()
}

/// Engagement band from day count. Strict `<` at 5/10/20 years.
pub fn engagement_timeframe(days: i64) -> &'static str {
    let years = days as f64 / 365.0;
    if years < 5.0 {
        "< 5 Years"
    } else if years < 10.0 {
        "< 10 Years"
    } else if years < 20.0 {
        "< 20 Years"
    } else {
        "> 20 Years"
    }
}

pub fn income_band(income: f64) -> &'static str {
    if income < INCOME_BAND_LOW_CEIL {
        "Low"
    } else if income <= INCOME_BAND_MID_CEIL {
        "Mid"
    } else {
        "High"
    }
}

/// Fee rate for a fee structure tier. Unrecognized values fail open to the
/// Low rate rather than rejecting the record.
pub fn processing_fee_rate(fee_structure: &str) -> f64 {
    match fee_structure {
        "High" => FEE_RATE_HIGH,
        "Mid" => FEE_RATE_MID,
        "Low" => FEE_RATE_LOW,
        other => {
            log::debug!("transform: unknown fee structure '{other}', defaulting to Low rate");
            FEE_RATE_LOW
        }
    }
}

pub fn total_loan(r: &CustomerRecord) -> f64 {
    r.bank_loans + r.business_lending + r.credit_card_balance
}

pub fn total_deposit(r: &CustomerRecord) -> f64 {
    r.bank_deposits + r.saving_accounts + r.foreign_currency_account + r.checking_accounts
}

/// Compute all derived fields for one record.
///
/// `row` is the record's position in the input, used only for error context.
/// Fails if the join date is after `as_of` (negative engagement).
pub fn derive(r: &CustomerRecord, as_of: NaiveDate, row: usize) -> EtlResult<DerivedFields> {
    let days = engagement_days(r.joined_date, as_of);
    if days < 0 {
        return Err(EtlError::Validation {
            row,
            field: "joined_date",
            message: format!(
                "join date {} is after the as-of date {} ({} days of negative engagement)",
                r.joined_date,
                as_of,
                -days
            ),
        });
    }

    let fee_rate = processing_fee_rate(&r.fee_structure);
    let loan = total_loan(r);

    Ok(DerivedFields {
        engagement_days: days,
        engagement_timeframe: engagement_timeframe(days).to_string(),
        income_band: income_band(r.estimated_income).to_string(),
        processing_fee_rate: fee_rate,
        total_loan: loan,
        total_deposit: total_deposit(r),
        total_fees: loan * fee_rate,
    })
}

/// Calendar year of `as_of`, used by tenure scoring.
pub fn as_of_year(as_of: NaiveDate) -> i32 {
    as_of.year()
}
