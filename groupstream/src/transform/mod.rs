//! Transformation module.
//!
//! - Reservation: join rows to reservations with nested lines
//! - Grouper: schema-less rows to nested JSON objects
//! - Serialize: records to NDJSON lines
//! - Pipeline: stage composition and ready-made exports

pub mod grouper;
pub mod pipeline;
pub mod reservation;
pub mod serialize;

pub use grouper::{nest_group, NestSpec, DEFAULT_CHILDREN_FIELD};
pub use pipeline::*;
pub use reservation::{build_reservation, reservation_key, RESERVATION_COLUMNS};
pub use serialize::to_json_line;
