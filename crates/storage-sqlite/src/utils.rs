//! Shared row-conversion helpers.

use chrono::{DateTime, Utc};
use log::warn;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parses an RFC 3339 column value, falling back to the epoch for rows
/// written by hand or by older releases.
pub fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            warn!("Invalid timestamp '{}' in database: {}", value, e);
            DateTime::<Utc>::UNIX_EPOCH
        })
}

/// Parses a decimal column value, falling back to zero.
pub fn parse_decimal(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap_or_else(|e| {
        warn!("Invalid decimal '{}' in database: {}", value, e);
        Decimal::ZERO
    })
}
