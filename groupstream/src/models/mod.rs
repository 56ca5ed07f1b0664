//! Domain models for the reservation export.
//!
//! - [`ReservationRow`] - one row of `reservations LEFT JOIN reservation_lines`
//! - [`Reservation`] - a reservation with all of its lines
//! - [`ReservationLine`] - one line item of a reservation
//! - [`Record`] - schema-less row used by the generic nesting transform

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Schema-less row: column name to scalar value, in header order.
pub type Record = Map<String, Value>;

// =============================================================================
// Source Row
// =============================================================================

/// One flat row of the join, ordered by `reservation_id` upstream.
///
/// Line columns are all `None` for a reservation without lines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReservationRow {
    pub reservation_id: i64,
    pub customer_id: i64,
    pub line_id: Option<String>,
    pub sku: Option<String>,
    pub quantity: Option<u32>,
    pub unit_price_cents: Option<i64>,
}

impl ReservationRow {
    /// Row for a reservation that has no lines.
    pub fn without_line(reservation_id: i64, customer_id: i64) -> Self {
        Self {
            reservation_id,
            customer_id,
            line_id: None,
            sku: None,
            quantity: None,
            unit_price_cents: None,
        }
    }

    /// Row carrying one line of a reservation.
    pub fn with_line(
        reservation_id: i64,
        customer_id: i64,
        line_id: impl Into<String>,
        sku: impl Into<String>,
        quantity: u32,
    ) -> Self {
        Self {
            reservation_id,
            customer_id,
            line_id: Some(line_id.into()),
            sku: Some(sku.into()),
            quantity: Some(quantity),
            unit_price_cents: None,
        }
    }
}

// =============================================================================
// Reservation
// =============================================================================

/// One line item of a reservation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationLine {
    pub id: String,
    pub sku: String,
    pub quantity: u32,
    /// Omitted when the source has no price for the line.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub unit_price_cents: Option<i64>,
}

/// A reservation with its lines, in source order.
///
/// This is the output shape: one per group of rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: i64,
    pub customer_id: i64,
    pub lines: Vec<ReservationLine>,
}

impl Reservation {
    pub fn new(id: i64, customer_id: i64) -> Self {
        Self {
            id,
            customer_id,
            lines: Vec::new(),
        }
    }

    pub fn add_line(&mut self, line: ReservationLine) {
        self.lines.push(line);
    }

    /// Total quantity over all lines.
    pub fn total_quantity(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reservation_serialization() {
        let mut reservation = Reservation::new(1, 42);
        reservation.add_line(ReservationLine {
            id: "a".into(),
            sku: "ROOM-DBL".into(),
            quantity: 2,
            unit_price_cents: None,
        });

        let json = serde_json::to_value(&reservation).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["customerId"], 42);
        assert_eq!(json["lines"][0]["id"], "a");
        assert!(json["lines"][0].get("unitPriceCents").is_none());
    }

    #[test]
    fn test_total_quantity() {
        let mut reservation = Reservation::new(1, 1);
        for (id, qty) in [("a", 2), ("b", 3)] {
            reservation.add_line(ReservationLine {
                id: id.into(),
                sku: "X".into(),
                quantity: qty,
                unit_price_cents: Some(100),
            });
        }
        assert_eq!(reservation.total_quantity(), 5);
    }

    #[test]
    fn test_row_deserializes_empty_line_columns_as_none() {
        let data = "reservation_id,customer_id,line_id,sku,quantity,unit_price_cents\n2,9,,,,\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let row: ReservationRow = reader.deserialize().next().unwrap().unwrap();
        assert_eq!(row, ReservationRow::without_line(2, 9));
    }
}
