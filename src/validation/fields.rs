use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use super::error::ValidationErrors;
use super::object_id::is_valid_object_id;
use crate::money;

/// Declared type of an allow-listed document field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Text { max: usize },
    Email,
    /// Calendar date, `YYYY-MM-DD`
    Date,
    /// Non-negative amount with at most two decimal places
    Money,
    /// Amount that may be negative (debits, balances)
    SignedMoney,
    Number { min: f64, max: f64 },
    Integer { min: i64, max: i64 },
    Boolean,
    Enum(&'static [&'static str]),
    /// Three-letter currency code, normalised to upper case
    Currency,
    /// Reference to a document of the named collection inside the caller's scope
    Ref(&'static str),
    RefList(&'static str),
    TextList,
    Object,
    LineItems,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldDef {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

pub const MAX_LIST_ITEMS: usize = 200;

/// Line item quantities (hours, units) keep up to this many decimal places
pub const MAX_QUANTITY_DP: u32 = 4;

/// Validate one value against its declared kind, returning the normalised value.
/// `null` is accepted for every kind and clears the field.
pub fn validate_value(kind: FieldKind, value: &Value) -> Result<Value, String> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    match kind {
        FieldKind::Text { max } => {
            let s = value.as_str().ok_or("Must be a string")?;
            if s.chars().count() > max {
                return Err(format!("Must be at most {} characters", max));
            }
            Ok(Value::String(s.to_string()))
        }
        FieldKind::Email => {
            let s = value.as_str().ok_or("Must be a string")?;
            if !is_valid_email(s) {
                return Err("Must be a valid email address".to_string());
            }
            Ok(Value::String(s.to_ascii_lowercase()))
        }
        FieldKind::Date => {
            let s = value.as_str().ok_or("Must be a date string (YYYY-MM-DD)")?;
            let date = parse_date(s).ok_or("Must be a valid date (YYYY-MM-DD)")?;
            Ok(Value::String(date.format("%Y-%m-%d").to_string()))
        }
        FieldKind::Money => {
            let amount = validate_amount(value)?;
            if amount.is_sign_negative() && !amount.is_zero() {
                return Err("Must not be negative".to_string());
            }
            Ok(money::to_value(amount))
        }
        FieldKind::SignedMoney => Ok(money::to_value(validate_amount(value)?)),
        FieldKind::Number { min, max } => {
            let n = value.as_f64().ok_or("Must be a number")?;
            if n < min || n > max {
                return Err(format!("Must be between {} and {}", min, max));
            }
            Ok(value.clone())
        }
        FieldKind::Integer { min, max } => {
            let n = value.as_i64().ok_or("Must be an integer")?;
            if n < min || n > max {
                return Err(format!("Must be between {} and {}", min, max));
            }
            Ok(Value::from(n))
        }
        FieldKind::Boolean => value.as_bool().map(Value::Bool).ok_or_else(|| "Must be a boolean".to_string()),
        FieldKind::Enum(allowed) => {
            let s = value.as_str().ok_or("Must be a string")?;
            if !allowed.contains(&s) {
                return Err(format!("Must be one of: {}", allowed.join(", ")));
            }
            Ok(Value::String(s.to_string()))
        }
        FieldKind::Currency => {
            let s = value.as_str().ok_or("Must be a currency code")?;
            if s.len() != 3 || !s.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err("Must be a three-letter currency code".to_string());
            }
            Ok(Value::String(s.to_ascii_uppercase()))
        }
        FieldKind::Ref(_) => {
            let s = value.as_str().ok_or("Must be an ID string")?;
            if !is_valid_object_id(s) {
                return Err("Invalid ID format".to_string());
            }
            Ok(Value::String(s.to_ascii_lowercase()))
        }
        FieldKind::RefList(_) => {
            let items = as_bounded_list(value)?;
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item.as_str() {
                    Some(s) if is_valid_object_id(s) => out.push(Value::String(s.to_ascii_lowercase())),
                    _ => return Err("Every entry must be a valid ID".to_string()),
                }
            }
            Ok(Value::Array(out))
        }
        FieldKind::TextList => {
            let items = as_bounded_list(value)?;
            if items.iter().any(|item| !item.is_string()) {
                return Err("Every entry must be a string".to_string());
            }
            Ok(Value::Array(items.clone()))
        }
        FieldKind::Object => {
            if !value.is_object() {
                return Err("Must be an object".to_string());
            }
            Ok(value.clone())
        }
        FieldKind::LineItems => validate_line_items(value),
    }
}

/// Validate every present field of `body` against `fields`, accumulating errors
pub fn validate_fields(
    body: &mut Map<String, Value>,
    fields: &[FieldDef],
    errors: &mut ValidationErrors,
) {
    for def in fields {
        let result = match body.get(def.name) {
            Some(value) => validate_value(def.kind, value),
            None => continue,
        };
        match result {
            Ok(normalised) => {
                body.insert(def.name.to_string(), normalised);
            }
            Err(message) => errors.add(def.name, message),
        }
    }
}

pub fn check_required(body: &Map<String, Value>, required: &[&str], errors: &mut ValidationErrors) {
    for field in required {
        let missing = match body.get(*field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(Value::Array(items)) => items.is_empty(),
            _ => false,
        };
        if missing {
            errors.add(*field, "This field is required");
        }
    }
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

pub fn date_field(body: &Map<String, Value>, field: &str) -> Option<NaiveDate> {
    body.get(field).and_then(Value::as_str).and_then(parse_date)
}

fn is_valid_email(s: &str) -> bool {
    if s.len() > 254 || s.chars().any(char::is_whitespace) {
        return false;
    }
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

fn validate_amount(value: &Value) -> Result<Decimal, String> {
    let amount = money::parse_decimal(value).ok_or("Must be a numeric amount")?;
    if amount.normalize().scale() > 2 {
        return Err("Must have at most two decimal places".to_string());
    }
    Ok(amount)
}

fn as_bounded_list(value: &Value) -> Result<&Vec<Value>, String> {
    let items = value.as_array().ok_or("Must be an array")?;
    if items.len() > MAX_LIST_ITEMS {
        return Err(format!("Must contain at most {} entries", MAX_LIST_ITEMS));
    }
    Ok(items)
}

fn validate_line_items(value: &Value) -> Result<Value, String> {
    let items = as_bounded_list(value)?;
    let mut out = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let obj = item
            .as_object()
            .ok_or_else(|| format!("Item {} must be an object", index + 1))?;

        let description = obj
            .get("description")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| format!("Item {} needs a description", index + 1))?;

        let quantity = obj
            .get("quantity")
            .and_then(money::parse_decimal)
            .filter(|q| *q > Decimal::ZERO)
            .ok_or_else(|| format!("Item {} needs a positive quantity", index + 1))?;
        if quantity.normalize().scale() > MAX_QUANTITY_DP {
            return Err(format!(
                "Item {} quantity must have at most {} decimal places",
                index + 1,
                MAX_QUANTITY_DP
            ));
        }

        let unit_price = obj
            .get("unitPrice")
            .and_then(money::parse_decimal)
            .filter(|p| !p.is_sign_negative() || p.is_zero())
            .ok_or_else(|| format!("Item {} needs a non-negative unitPrice", index + 1))?;
        if unit_price.normalize().scale() > 2 {
            return Err(format!("Item {} unitPrice must have at most two decimal places", index + 1));
        }

        let mut clean = Map::new();
        clean.insert("description".to_string(), Value::String(description.to_string()));
        clean.insert("quantity".to_string(), money::to_exact_value(quantity));
        clean.insert("unitPrice".to_string(), money::to_exact_value(unit_price));
        clean.insert("amount".to_string(), money::to_value(quantity * unit_price));
        out.push(Value::Object(clean));
    }

    Ok(Value::Array(out))
}
