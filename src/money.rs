//! Decimal helpers for amounts carried inside JSON documents.
//!
//! Documents store amounts as JSON numbers; all arithmetic happens on
//! `rust_decimal::Decimal` and is rounded to cents before it is written back.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::{Map, Number, Value};
use std::str::FromStr;

pub fn parse_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn to_value(amount: Decimal) -> Value {
    round_cents(amount)
        .to_f64()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Writes an amount back without rounding, for quantities and rates
pub fn to_exact_value(amount: Decimal) -> Value {
    amount
        .normalize()
        .to_f64()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Reads a decimal field from a document body, treating missing/null as zero
pub fn field_or_zero(body: &Map<String, Value>, field: &str) -> Decimal {
    body.get(field).and_then(parse_decimal).unwrap_or(Decimal::ZERO)
}
