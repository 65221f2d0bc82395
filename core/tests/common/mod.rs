//! Shared test fixtures.

use bankrisk_core::record::CustomerRecord;
use chrono::NaiveDate;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// The fixed "now" used by deterministic tests.
pub fn as_of() -> NaiveDate {
    date(2026, 1, 1)
}

/// A baseline customer with zeroed financials. Tests override what they
/// exercise.
pub fn customer(client_id: &str) -> CustomerRecord {
    CustomerRecord {
        client_id: client_id.to_string(),
        name: format!("Customer {client_id}"),
        age: 40,
        nationality: "AU".to_string(),
        joined_date: date(2015, 6, 15),
        fee_structure: "Mid".to_string(),
        loyalty_classification: "Gold".to_string(),
        estimated_income: 0.0,
        superannuation_savings: 0.0,
        amount_of_credit_cards: 0,
        credit_card_balance: 0.0,
        bank_loans: 0.0,
        bank_deposits: 0.0,
        checking_accounts: 0.0,
        saving_accounts: 0.0,
        foreign_currency_account: 0.0,
        business_lending: 0.0,
        properties_owned: 0,
    }
}
