use crate::{
    db::{
        Store,
        query::FilterExt,
        record::{Collection, ID_FIELD, Record},
    },
    error::InternalError,
    value::{Value, value_eq},
};
use std::collections::BTreeMap;

pub(super) const DASHBOARD_STATS: &str = "dashboard_stats";
pub(super) const CHECK_IN_RESERVATION: &str = "check_in_reservation";

const CANCELLED: &str = "cancelado";
const CHECKED_IN: &str = "checked_in";
const OCCUPIED: &str = "ocupada";

/// Order and table counts by status, revenue over non-cancelled orders
/// and the reservation count, optionally for one `date`.
pub(super) fn dashboard_stats(store: &Store, params: &Value) -> Result<Value, InternalError> {
    let date = match params.get("date") {
        None | Some(Value::Null) => None,
        Some(Value::Text(date)) => Some(date.as_str()),
        Some(other) => {
            return Err(InternalError::rpc_invalid(format!(
                "{DASHBOARD_STATS}: 'date' must be text, got {other}"
            )));
        }
    };

    let orders = store.from("orders").select_all()?;
    let tables = store.from("tables").select_all()?;
    let reservations = store.from("reservations").select_all()?;

    let revenue: f64 = orders
        .iter()
        .filter(|order| order.get("status").and_then(Value::as_text) != Some(CANCELLED))
        .filter_map(|order| order.get("total").and_then(Value::as_f64))
        .sum();

    let reservation_count = reservations
        .iter()
        .filter(|r| date.is_none_or(|d| r.get("date").and_then(Value::as_text) == Some(d)))
        .count();

    let stats = Record::new()
        .with("orders_total", count_value(orders.len()))
        .with("orders_by_status", count_by_status(&orders))
        .with("revenue", revenue)
        .with("tables_by_status", count_by_status(&tables))
        .with("reservations", count_value(reservation_count));

    Ok(stats.into())
}

/// Seat a reservation: mark it checked in and, when it names a table,
/// mark that table occupied.
///
/// The two writes are separate read-modify-writes; a failure on the
/// table write leaves the reservation already checked in.
pub(super) fn check_in_reservation(store: &Store, params: &Value) -> Result<Value, InternalError> {
    let id = match params.get("reservation_id") {
        Some(id @ (Value::Text(_) | Value::Int(_))) => id.clone(),
        _ => {
            return Err(InternalError::rpc_invalid(format!(
                "{CHECK_IN_RESERVATION}: 'reservation_id' is required"
            )));
        }
    };

    let updated = store
        .from("reservations")
        .update(Record::new().with("status", CHECKED_IN))
        .eq(ID_FIELD, id.clone())
        .execute()?;
    let reservation = updated.into_iter().next().ok_or_else(|| {
        InternalError::rpc_not_found(format!("reservation {id} does not exist"))
    })?;

    if let Some(table_id) = reservation.get("table_id").filter(|v| !v.is_null()) {
        let seated = store
            .from("tables")
            .update(Record::new().with("status", OCCUPIED))
            .eq(ID_FIELD, table_id.clone())
            .execute()?;
        if !seated.iter().any(|t| t.id().is_some_and(|v| value_eq(v, table_id))) {
            tracing::warn!(reservation = %id, table = %table_id, "check-in names a missing table");
        }
    }

    Ok(reservation.into())
}

fn count_by_status(rows: &Collection) -> Value {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for row in rows {
        if let Some(status) = row.get("status").and_then(Value::as_text) {
            *counts.entry(status.to_string()).or_default() += 1;
        }
    }

    Value::Map(
        counts
            .into_iter()
            .map(|(status, n)| (status, count_value(n)))
            .collect(),
    )
}

fn count_value(n: usize) -> Value {
    Value::Int(i64::try_from(n).unwrap_or(i64::MAX))
}
