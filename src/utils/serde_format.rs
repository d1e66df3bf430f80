//! Serialization helpers for the JSON payload handed to the response layer

use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{NaiveDateTime, NaiveTime};
use serde::ser::Error;
use serde::Serializer;

pub const TIME_FORMAT: &str = "%H:%M:%S";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Decimals go out as plain JSON numbers
///
/// Values pass through `f64`, so digits beyond about 15 significant places are lost.
pub fn decimal<S: Serializer>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error> {
    match value.to_f64() {
        Some(v) if v.is_finite() => serializer.serialize_f64(v),
        _ => Err(S::Error::custom(format!(
            "decimal {} cannot be represented as a number",
            value
        ))),
    }
}

pub fn time<S: Serializer>(value: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&value.format(TIME_FORMAT))
}

pub fn datetime<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&value.format(DATETIME_FORMAT))
}
