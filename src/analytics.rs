//! Aggregate sales figures for the dashboard charts.
//!
//! Everything here works over the in-memory normalized list: an inclusive
//! date-range scope, the paid-only sales total, most-frequent values for
//! the headline cards, and per-field occurrence counts shaped for the pie
//! (sizes) and bar (per-worker) charts.

use chrono::NaiveDate;
use serde::Serialize;

use crate::orders::Order;
use crate::query::payment_amount;
use crate::status::Status;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive range filter on the order date. If either bound is absent or
/// unparseable, everything passes through; there is no partial-bound
/// filtering. Rows whose own date does not parse are excluded while the
/// filter is active.
pub fn filter_by_date_range(
    orders: &[Order],
    start: Option<&str>,
    end: Option<&str>,
) -> Vec<Order> {
    let bounds = match (parse_date(start), parse_date(end)) {
        (Some(start), Some(end)) => (start, end),
        _ => return orders.to_vec(),
    };
    orders
        .iter()
        .filter(|o| {
            NaiveDate::parse_from_str(&o.order_date, DATE_FORMAT)
                .map(|d| d >= bounds.0 && d <= bounds.1)
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value?.trim(), DATE_FORMAT).ok()
}

/// Sum of the payment field over orders whose status is Paid. Orders in
/// any other stage are excluded by business rule, not oversight: money is
/// only counted once it has actually come in.
pub fn total_paid(orders: &[Order]) -> f64 {
    orders
        .iter()
        .filter(|o| o.status == Status::Paid)
        .map(payment_amount)
        .sum()
}

/// Field selector for the counting aggregations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountField {
    Size,
    Brand,
    Worker,
}

impl CountField {
    fn value_of(&self, order: &Order) -> &'static str {
        match self {
            CountField::Size => order.size.as_str(),
            CountField::Brand => order.brand.as_str(),
            CountField::Worker => order.worker.as_str(),
        }
    }
}

/// One chart slice/bar: a field value and how many orders carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartDatum {
    pub name: String,
    pub count: u64,
}

/// Occurrence counts in first-occurrence order, ready for the pie and bar
/// charts.
pub fn count_by_field(orders: &[Order], field: CountField) -> Vec<ChartDatum> {
    let mut counts: Vec<ChartDatum> = Vec::new();
    for order in orders {
        let value = field.value_of(order);
        match counts.iter_mut().find(|d| d.name == value) {
            Some(datum) => datum.count += 1,
            None => counts.push(ChartDatum {
                name: value.to_string(),
                count: 1,
            }),
        }
    }
    counts
}

/// The field value with the highest occurrence count. Ties break toward
/// the value that reached the maximum first (first-occurrence order).
/// `None` when there are no orders.
pub fn mode_of(orders: &[Order], field: CountField) -> Option<String> {
    let counts = count_by_field(orders, field);
    let mut best: Option<&ChartDatum> = None;
    for datum in &counts {
        if best.map(|b| datum.count > b.count).unwrap_or(true) {
            best = Some(datum);
        }
    }
    best.map(|d| d.name.clone())
}

/// Everything the dashboard page shows, computed over the optional date
/// scope in one pass.
#[derive(Debug, Clone, Serialize)]
pub struct SalesReport {
    pub total_paid: f64,
    pub top_size: Option<String>,
    pub top_brand: Option<String>,
    pub sizes: Vec<ChartDatum>,
    pub workers: Vec<ChartDatum>,
}

pub fn sales_report(orders: &[Order], start: Option<&str>, end: Option<&str>) -> SalesReport {
    let scoped = filter_by_date_range(orders, start, end);
    SalesReport {
        total_paid: total_paid(&scoped),
        top_size: mode_of(&scoped, CountField::Size),
        top_brand: mode_of(&scoped, CountField::Brand),
        sizes: count_by_field(&scoped, CountField::Size),
        workers: count_by_field(&scoped, CountField::Worker),
    }
}
