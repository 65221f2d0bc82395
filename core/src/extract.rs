//! Input boundary: header-mapped CSV into validated `CustomerRecord`s.
//!
//! Thin by design — typed parsing and fail-fast validation only. Any bad
//! required field rejects the whole run (never silently drops rows, which
//! would skew KPI totals).

use crate::{
    error::{EtlError, EtlResult},
    record::CustomerRecord,
};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::Path;

const COL_CLIENT_ID: &str = "Client ID";
const COL_NAME: &str = "Name";
const COL_AGE: &str = "Age";
const COL_NATIONALITY: &str = "Nationality";
const COL_JOINED: &str = "Joined Bank";
const COL_FEE_STRUCTURE: &str = "Fee Structure";
const COL_LOYALTY: &str = "Loyalty Classification";
const COL_CC_COUNT: &str = "Amount of Credit Cards";
const COL_PROPERTIES: &str = "Properties Owned";

/// Read and validate a banking CSV file.
pub fn extract_file(path: &Path) -> EtlResult<Vec<CustomerRecord>> {
    let content = std::fs::read_to_string(path)?;
    let records = extract_records(&content)?;
    log::info!(
        "extract: loaded {} records from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

/// Parse CSV content (header row required) into validated records.
pub fn extract_records(content: &str) -> EtlResult<Vec<CustomerRecord>> {
    let mut lines = content.lines();
    let header = lines.next().ok_or_else(|| EtlError::Validation {
        row: 0,
        field: "header",
        message: "input is empty".into(),
    })?;

    let columns: HashMap<String, usize> = split_row(header)
        .into_iter()
        .enumerate()
        .map(|(i, name)| (name, i))
        .collect();

    let mut records = Vec::new();
    for (i, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row = i + 1; // 1-based data row, header excluded
        let fields = split_row(line);
        records.push(RowReader { columns: &columns, fields: &fields, row }.parse()?);
    }
    Ok(records)
}

/// Split one CSV line, honoring double-quoted fields: a quoted field may
/// contain commas, and a doubled quote inside quotes is a literal quote.
/// The exporter quotes on write, so the store's own exports re-read.
fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);

    for f in &mut fields {
        let trimmed = f.trim();
        if trimmed.len() != f.len() {
            *f = trimmed.to_string();
        }
    }
    fields
}

struct RowReader<'a> {
    columns: &'a HashMap<String, usize>,
    fields:  &'a [String],
    row:     usize,
}

impl<'a> RowReader<'a> {
    fn cell(&self, name: &str) -> Option<&'a str> {
        let idx = *self.columns.get(name)?;
        self.fields.get(idx).map(|s| s.as_str())
    }

    fn required(&self, name: &'static str) -> EtlResult<&'a str> {
        match self.cell(name).filter(|v| !v.is_empty()) {
            Some(v) => Ok(v),
            None => Err(EtlError::Validation {
                row: self.row,
                field: name,
                message: "required field missing or empty".into(),
            }),
        }
    }

    /// Classification inputs are not validated enums: unknown fee tiers
    /// fail open downstream, so an empty cell is carried through as-is.
    fn text(&self, name: &str) -> &'a str {
        self.cell(name).unwrap_or("")
    }

    /// Optional numeric: a missing column or empty cell reads as 0.
    fn numeric(&self, name: &'static str) -> EtlResult<f64> {
        let raw = self.text(name);
        if raw.is_empty() {
            return Ok(0.0);
        }
        let value: f64 = raw.parse().map_err(|_| EtlError::Validation {
            row: self.row,
            field: name,
            message: format!("expected a number, got '{raw}'"),
        })?;
        if value < 0.0 {
            return Err(EtlError::Validation {
                row: self.row,
                field: name,
                message: format!("negative value {value} not allowed"),
            });
        }
        Ok(value)
    }

    fn count(&self, name: &'static str) -> EtlResult<u32> {
        let value = self.numeric(name)?;
        if value.fract() != 0.0 {
            return Err(EtlError::Validation {
                row: self.row,
                field: name,
                message: format!("expected a whole number, got {value}"),
            });
        }
        Ok(value as u32)
    }

    fn parse(&self) -> EtlResult<CustomerRecord> {
        let age: u32 = self
            .required(COL_AGE)?
            .parse()
            .map_err(|_| EtlError::Validation {
                row: self.row,
                field: COL_AGE,
                message: "expected an integer age".into(),
            })?;
        if age > 120 {
            return Err(EtlError::Validation {
                row: self.row,
                field: COL_AGE,
                message: format!("age {age} out of range 0-120"),
            });
        }

        let joined_raw = self.required(COL_JOINED)?;
        let joined_date = parse_date(joined_raw).ok_or_else(|| EtlError::Validation {
            row: self.row,
            field: COL_JOINED,
            message: format!("unparseable date '{joined_raw}'"),
        })?;

        Ok(CustomerRecord {
            client_id: self.required(COL_CLIENT_ID)?.to_string(),
            name: self.required(COL_NAME)?.to_string(),
            age,
            nationality: self.required(COL_NATIONALITY)?.to_string(),
            joined_date,
            fee_structure: self.text(COL_FEE_STRUCTURE).to_string(),
            loyalty_classification: self.text(COL_LOYALTY).to_string(),
            estimated_income: self.numeric("Estimated Income")?,
            superannuation_savings: self.numeric("Superannuation Savings")?,
            amount_of_credit_cards: self.count(COL_CC_COUNT)?,
            credit_card_balance: self.numeric("Credit Card Balance")?,
            bank_loans: self.numeric("Bank Loans")?,
            bank_deposits: self.numeric("Bank Deposits")?,
            checking_accounts: self.numeric("Checking Accounts")?,
            saving_accounts: self.numeric("Saving Accounts")?,
            foreign_currency_account: self.numeric("Foreign Currency Account")?,
            business_lending: self.numeric("Business Lending")?,
            properties_owned: self.count(COL_PROPERTIES)?,
        })
    }
}

/// Source files carry M/D/YYYY; re-exported files carry ISO dates.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}
