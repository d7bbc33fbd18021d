//! # Data Models
//!
//! Records emitted by streams and the values they hold.

pub mod record;

pub use record::{FieldValue, InvalidNumber, Record, parse_decimal};
