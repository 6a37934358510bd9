//! List-view query logic: free-text search, status filter, and sort.
//!
//! The visible set is `filter_by_status(search(orders, term), filter)` in
//! the current sort order. Filters are conjunctive and independent of
//! application order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::orders::Order;
use crate::status::Status;

// ---------------------------------------------------------------------------
// Search and status filter
// ---------------------------------------------------------------------------

/// Case-insensitive substring search across requester, company, and
/// assigned worker. The empty term is the identity (short-circuit, not a
/// vacuous match).
pub fn search(orders: &[Order], term: &str) -> Vec<Order> {
    if term.is_empty() {
        return orders.to_vec();
    }
    let needle = term.to_lowercase();
    orders
        .iter()
        .filter(|o| {
            o.requester.to_lowercase().contains(&needle)
                || o.company.to_lowercase().contains(&needle)
                || o.worker.as_str().to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// Status filter with an "All" sentinel that disables it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

/// Exact equality against the normalized `estado`.
pub fn filter_by_status(orders: &[Order], filter: StatusFilter) -> Vec<Order> {
    match filter {
        StatusFilter::All => orders.to_vec(),
        StatusFilter::Only(status) => orders
            .iter()
            .filter(|o| o.status == status)
            .cloned()
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Sort
// ---------------------------------------------------------------------------

/// Sortable order field, resolved from a displayed column label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    Requester,
    Worker,
    Payment,
    OrderDate,
    Shift,
    Company,
    Colors,
    Brand,
    Size,
    Gender,
    Status,
}

impl SortKey {
    /// Resolve a column header label (case-insensitive) to a sort key.
    pub fn from_label(label: &str) -> Option<SortKey> {
        match label.trim().to_lowercase().as_str() {
            "persona" => Some(SortKey::Requester),
            "encargado" | "encargadopor" => Some(SortKey::Worker),
            "pago" => Some(SortKey::Payment),
            "fecha" | "fechapedido" => Some(SortKey::OrderDate),
            "turno" => Some(SortKey::Shift),
            "empresa" => Some(SortKey::Company),
            "colores" => Some(SortKey::Colors),
            "marca" => Some(SortKey::Brand),
            "talla" => Some(SortKey::Size),
            "género" | "genero" => Some(SortKey::Gender),
            "estado" => Some(SortKey::Status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Current `(key, direction)` pair. Reselecting the active key flips the
/// direction; selecting a new key resets to ascending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortConfig {
    pub key: Option<SortKey>,
    pub direction: SortDirection,
}

impl SortConfig {
    pub fn toggle(&mut self, key: SortKey) {
        if self.key == Some(key) && self.direction == SortDirection::Asc {
            self.direction = SortDirection::Desc;
        } else {
            self.key = Some(key);
            self.direction = SortDirection::Asc;
        }
    }
}

/// Sort in place. Stable: equal keys keep their prior relative order.
/// `pago` compares numerically (blank or unparseable as 0), everything
/// else lexicographically by code unit, no locale collation.
pub fn sort_orders(orders: &mut [Order], key: SortKey, direction: SortDirection) {
    orders.sort_by(|a, b| {
        let ord = compare_by_key(a, b, key);
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

pub(crate) fn payment_amount(order: &Order) -> f64 {
    order.payment.trim().parse::<f64>().unwrap_or(0.0)
}

fn compare_by_key(a: &Order, b: &Order, key: SortKey) -> Ordering {
    match key {
        SortKey::Requester => a.requester.cmp(&b.requester),
        SortKey::Worker => a.worker.as_str().cmp(b.worker.as_str()),
        SortKey::Payment => payment_amount(a)
            .partial_cmp(&payment_amount(b))
            .unwrap_or(Ordering::Equal),
        SortKey::OrderDate => a.order_date.cmp(&b.order_date),
        SortKey::Shift => a.shift.as_str().cmp(b.shift.as_str()),
        SortKey::Company => a.company.cmp(&b.company),
        SortKey::Colors => a.colors.cmp(&b.colors),
        SortKey::Brand => a.brand.as_str().cmp(b.brand.as_str()),
        SortKey::Size => a.size.as_str().cmp(b.size.as_str()),
        SortKey::Gender => a.gender.as_str().cmp(b.gender.as_str()),
        SortKey::Status => a.status.as_str().cmp(b.status.as_str()),
    }
}

/// Apply search, status filter, and the current sort in one pass over the
/// full in-memory list.
pub fn visible(
    orders: &[Order],
    term: &str,
    filter: StatusFilter,
    sort: &SortConfig,
) -> Vec<Order> {
    let mut result = filter_by_status(&search(orders, term), filter);
    if let Some(key) = sort.key {
        sort_orders(&mut result, key, sort.direction);
    }
    result
}
