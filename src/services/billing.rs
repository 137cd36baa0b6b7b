// Cost resolution and aggregation: the numeric contracts behind dashboards,
// invoices, and revenue reports. All accumulation is in Decimal; rounding to
// two places happens only in display fields.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::AppError;
use crate::store::Store;
use crate::types::{
    ClientServiceAssignment, ClientStatus, ServiceCategory, ServiceDefinition,
};

/// The one numeric-semantics contract in the system: an explicitly-set
/// override always wins, even when it is zero. `custom_cost.unwrap_or(..)`
/// rather than any truthiness check — a zero override must not fall back to
/// the default.
pub fn effective_cost(def: &ServiceDefinition, assignment: &ClientServiceAssignment) -> Decimal {
    assignment.custom_cost.unwrap_or(def.default_cost)
}

fn active_costed(store: &Store) -> impl Iterator<Item = (&ServiceDefinition, &ClientServiceAssignment)> {
    store
        .client_services
        .iter()
        .filter(|a| a.is_active)
        .filter_map(|a| store.get_service(&a.service_id).map(|d| (d, a)))
}

/// Sum of effective costs over a client's active assignments.
pub fn client_monthly_total(store: &Store, client_id: &str) -> Decimal {
    active_costed(store)
        .filter(|(_, a)| a.client_id == client_id)
        .map(|(d, a)| effective_cost(d, a))
        .sum()
}

/// System-wide totals of active assignments, grouped by service category.
pub fn category_totals(store: &Store) -> BTreeMap<ServiceCategory, Decimal> {
    let mut totals = BTreeMap::new();
    for (def, assignment) in active_costed(store) {
        *totals.entry(def.category.clone()).or_insert(Decimal::ZERO) +=
            effective_cost(def, assignment);
    }
    totals
}

// =============================================================================
// Invoices
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub service_id: String,
    pub service_name: String,
    pub category: ServiceCategory,
    pub amount: Decimal,
    /// Rounded for display only.
    pub display_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub number: String,
    pub client_id: String,
    pub client_name: String,
    pub issued_on: NaiveDate,
    pub lines: Vec<InvoiceLine>,
    pub total: Decimal,
    pub display_total: Decimal,
}

/// Build a simple monthly invoice for a client: one line per active
/// assignment at its effective cost.
pub fn generate_invoice(
    store: &Store,
    client_id: &str,
    issued_on: NaiveDate,
) -> Result<Invoice, AppError> {
    let client = store
        .get_client(client_id)
        .ok_or_else(|| AppError::not_found("client", client_id))?;

    let mut lines = Vec::new();
    let mut total = Decimal::ZERO;
    for (def, assignment) in active_costed(store).filter(|(_, a)| a.client_id == client_id) {
        let amount = effective_cost(def, assignment);
        total += amount;
        lines.push(InvoiceLine {
            service_id: def.id.clone(),
            service_name: def.name.clone(),
            category: def.category.clone(),
            amount,
            display_amount: amount.round_dp(2),
        });
    }

    Ok(Invoice {
        number: format!(
            "INV-{}-{}",
            crate::util::slugify(&client.company_name),
            issued_on.format("%Y%m")
        ),
        client_id: client.id.clone(),
        client_name: client.company_name.clone(),
        issued_on,
        lines,
        total,
        display_total: total.round_dp(2),
    })
}

// =============================================================================
// Revenue reports
// =============================================================================

/// Dashboard roll-up across the whole book of business.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSummary {
    pub total_clients: usize,
    pub active_clients: usize,
    pub monthly_total: Decimal,
    pub by_category: BTreeMap<ServiceCategory, Decimal>,
}

pub fn revenue_summary(store: &Store) -> RevenueSummary {
    let monthly_total = active_costed(store)
        .map(|(d, a)| effective_cost(d, a))
        .sum::<Decimal>()
        .round_dp(2);

    RevenueSummary {
        total_clients: store.clients.len(),
        active_clients: store
            .clients
            .iter()
            .filter(|c| c.status == ClientStatus::Active)
            .count(),
        monthly_total,
        by_category: category_totals(store)
            .into_iter()
            .map(|(k, v)| (k, v.round_dp(2)))
            .collect(),
    }
}

/// One month's bucket in the revenue report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRevenue {
    pub year: i32,
    pub month: u32,
    pub total: Decimal,
}

fn month_bounds(year: i32, month: u32) -> (NaiveDate, NaiveDate) {
    let start = NaiveDate::from_ymd_opt(year, month, 1).expect("valid month start");
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .expect("valid month start")
        .pred_opt()
        .expect("month end");
    (start, end)
}

/// Per-month revenue buckets between `from` and `to` (inclusive, truncated
/// to months). A client contributes its monthly total to every month it was
/// active: started on or before the month end, and not ended before the
/// month start.
pub fn monthly_revenue(store: &Store, from: NaiveDate, to: NaiveDate) -> Vec<MonthlyRevenue> {
    let mut buckets = Vec::new();
    let (mut year, mut month) = (from.year(), from.month());

    while NaiveDate::from_ymd_opt(year, month, 1).map(|d| d <= to) == Some(true) {
        let (month_start, month_end) = month_bounds(year, month);
        let total = store
            .clients
            .iter()
            .filter(|c| {
                c.start_date <= month_end
                    && c.end_date.map(|end| end >= month_start).unwrap_or(true)
            })
            .map(|c| client_monthly_total(store, &c.id))
            .sum::<Decimal>()
            .round_dp(2);
        buckets.push(MonthlyRevenue { year, month, total });

        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    buckets
}
