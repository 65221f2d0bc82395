//! KPI aggregator tests: global metrics, dimensional grouping, formatting.

mod common;

use bankrisk_core::kpi::{self, Dimension, GLOBAL_KPI_NAMES};
use bankrisk_core::pipeline;
use common::{as_of, customer, date};

/// Exactly 13 named global KPIs, in report order.
#[test]
fn thirteen_global_kpis_in_order() {
    let enriched = pipeline::enrich_records(&[customer("C001")], as_of()).unwrap();
    let kpis = kpi::global_kpis(&enriched);

    assert_eq!(kpis.len(), 13);
    let names: Vec<&str> = kpis.iter().map(|k| k.name).collect();
    assert_eq!(names, GLOBAL_KPI_NAMES);
}

/// Total Clients counts distinct client ids: duplicate rows for the same
/// client collapse in the count while their sums still accumulate.
#[test]
fn total_clients_collapses_duplicates() {
    let mut a = customer("C001");
    a.bank_loans = 10_000.0;
    let mut b = customer("C001"); // same client, second row
    b.bank_loans = 5_000.0;
    let c = customer("C002");

    let enriched = pipeline::enrich_records(&[a, b, c], as_of()).unwrap();
    let kpis = kpi::global_kpis(&enriched);

    let clients = kpis.iter().find(|k| k.name == "Total Clients").unwrap();
    assert_eq!(clients.value, 2.0, "duplicate client ids must collapse");

    let bank_loan = kpis.iter().find(|k| k.name == "Bank Loan").unwrap();
    assert_eq!(bank_loan.value, 15_000.0, "sums still cover every row");
}

/// Global sums match hand-computed totals for a known record set.
#[test]
fn global_sums_match_hand_computed_totals() {
    let mut records = Vec::new();
    for j in 1..=4_u32 {
        let mut c = customer(&format!("C{j:03}"));
        c.bank_loans = 1_000.0 * j as f64;
        c.business_lending = 500.0 * j as f64;
        c.credit_card_balance = 100.0 * j as f64;
        c.bank_deposits = 2_000.0 * j as f64;
        c.checking_accounts = 300.0 * j as f64;
        c.saving_accounts = 400.0 * j as f64;
        c.foreign_currency_account = 50.0 * j as f64;
        c.amount_of_credit_cards = j;
        c.fee_structure = "Low".to_string();
        records.push(c);
    }
    let enriched = pipeline::enrich_records(&records, as_of()).unwrap();
    let kpis = kpi::global_kpis(&enriched);
    let value = |name: &str| kpis.iter().find(|k| k.name == name).unwrap().value;

    // Sum of j over 1..=4 is 10.
    assert_eq!(value("Total Clients"), 4.0);
    assert_eq!(value("Bank Loan"), 10_000.0);
    assert_eq!(value("Business Lending"), 5_000.0);
    assert_eq!(value("Credit Cards Balance"), 1_000.0);
    assert_eq!(value("Total Loan"), 16_000.0);
    assert_eq!(value("Bank Deposit"), 20_000.0);
    assert_eq!(value("Checking Account Amount"), 3_000.0);
    assert_eq!(value("Saving Account Amount"), 4_000.0);
    assert_eq!(value("Foreign Currency Amount"), 500.0);
    assert_eq!(value("Total Deposit"), 27_500.0);
    assert_eq!(value("Total CC Amount"), 10.0);
    assert_eq!(value("Total Fees"), 16_000.0 * 0.01);

    let expected_days = (as_of() - date(2015, 6, 15)).num_days() * 4;
    assert_eq!(value("Engagement Account"), expected_days as f64);
}

/// Grouping by a dimension partitions distinct clients: per-group client
/// counts sum back to the overall distinct total when client ids are
/// unique (each client maps to exactly one category).
#[test]
fn dimensional_client_counts_partition_the_total() {
    let mut records = Vec::new();
    for (i, nat) in ["AU", "NZ", "AU", "UK", "NZ", "AU"].iter().enumerate() {
        let mut c = customer(&format!("C{i:03}"));
        c.nationality = nat.to_string();
        c.estimated_income = 80_000.0 + 90_000.0 * i as f64;
        records.push(c);
    }
    let enriched = pipeline::enrich_records(&records, as_of()).unwrap();

    for dimension in kpi::DIMENSIONS {
        let rows = kpi::kpis_by_dimension(&enriched, dimension);
        let grouped_total: i64 = rows.iter().map(|r| r.total_clients).sum();
        assert_eq!(
            grouped_total, 6,
            "dimension {:?} must partition the distinct-client total",
            dimension
        );
    }

    let by_nationality = kpi::kpis_by_dimension(&enriched, Dimension::Nationality);
    let values: Vec<(&str, i64)> = by_nationality
        .iter()
        .map(|r| (r.dimension_value.as_str(), r.total_clients))
        .collect();
    assert_eq!(values, vec![("AU", 3), ("NZ", 2), ("UK", 1)]);
}

/// Per-group risk is a mean over the group's rows, not a sum.
#[test]
fn dimensional_risk_is_mean_not_sum() {
    let mut a = customer("C001");
    a.estimated_income = 100_000.0;
    a.bank_loans = 500_000.0; // debt ratio 5.0, saturated
    let b = customer("C002"); // zero financials

    let enriched = pipeline::enrich_records(&[a, b], as_of()).unwrap();
    let rows = kpi::kpis_by_dimension(&enriched, Dimension::Nationality);
    assert_eq!(rows.len(), 1, "both records share one nationality");

    let expected =
        (enriched[0].risk.risk_score + enriched[1].risk.risk_score) / 2.0;
    assert_eq!(rows[0].avg_risk_score, expected);
}

/// Display formatting: counts are thousands-grouped integers, monetary
/// values scale to $M / $K, and formatting never alters stored values.
#[test]
fn kpi_display_formatting_policy() {
    assert_eq!(kpi::format_kpi("Total Clients", 3_214.0), "3,214");
    assert_eq!(kpi::format_kpi("Engagement Account", 1_234_567.0), "1,234,567");
    assert_eq!(kpi::format_kpi("Total CC Amount", 999.0), "999");

    assert_eq!(kpi::format_kpi("Total Loan", 4_380_000.0), "$4.38M");
    assert_eq!(kpi::format_kpi("Total Fees", 12_500.0), "$12.50K");
    assert_eq!(kpi::format_kpi("Bank Deposit", 999.99), "$999.99");
    assert_eq!(kpi::format_kpi("Total Deposit", 1_000.0), "$1.00K");
    assert_eq!(kpi::format_kpi("Total Loan", 1_000_000.0), "$1.00M");
}
