//! Build a [`Reservation`] from the group of join rows that share its id.
//!
//! ```text
//! rows (LEFT JOIN, by id)            Reservation
//! ┌──────────────────────────┐      ┌──────────────────────────┐
//! │ id 1, cust 10, line a    │      │ id 1, cust 10            │
//! │ id 1, cust 10, line b    │  →   │ lines: [a, b]            │
//! ├──────────────────────────┤      ├──────────────────────────┤
//! │ id 2, cust 11, (no line) │      │ id 2, cust 11, lines: [] │
//! └──────────────────────────┘      └──────────────────────────┘
//! ```
//!
//! A row with every line column empty contributes no line. A row with only
//! some line columns empty is malformed and fails the group.

use crate::error::{TransformError, TransformResult};
use crate::models::{Reservation, ReservationLine, ReservationRow};
use crate::sequence::Group;

/// Columns a reservation source must provide.
pub const RESERVATION_COLUMNS: [&str; 5] =
    ["reservation_id", "customer_id", "line_id", "sku", "quantity"];

/// Grouping key of a reservation row.
pub fn reservation_key(row: &ReservationRow) -> i64 {
    row.reservation_id
}

/// Turn one group of rows into a reservation with its lines in row order.
pub fn build_reservation(group: Group<i64, ReservationRow>) -> TransformResult<Reservation> {
    let key = *group.key();
    let first = group.first();
    let mut reservation = Reservation::new(first.reservation_id, first.customer_id);

    for row in group {
        if row.customer_id != reservation.customer_id {
            return Err(TransformError::InconsistentParent {
                key: key.to_string(),
                field: "customer_id".to_string(),
            });
        }
        if let Some(line) = line_from_row(key, row)? {
            reservation.add_line(line);
        }
    }

    Ok(reservation)
}

fn line_from_row(key: i64, row: ReservationRow) -> TransformResult<Option<ReservationLine>> {
    let partial = |field: &str, other: &str| TransformError::PartialChildRow {
        key: key.to_string(),
        field: field.to_string(),
        other: other.to_string(),
    };

    let Some(id) = row.line_id else {
        let stray = [
            ("sku", row.sku.is_some()),
            ("quantity", row.quantity.is_some()),
            ("unit_price_cents", row.unit_price_cents.is_some()),
        ];
        return match stray.iter().find(|(_, set)| *set) {
            Some((other, _)) => Err(partial("line_id", other)),
            None => Ok(None),
        };
    };

    let sku = row.sku.ok_or_else(|| partial("sku", "line_id"))?;
    let quantity = row.quantity.ok_or_else(|| partial("quantity", "line_id"))?;

    Ok(Some(ReservationLine {
        id,
        sku,
        quantity,
        unit_price_cents: row.unit_price_cents,
    }))
}
