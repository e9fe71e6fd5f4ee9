use std::collections::HashMap;

use serde_json::Value;

use super::def::ResourceDef;
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::store::{Query, SortDirection};
use crate::validation::{FieldKind, ObjectId};

const TIMESTAMP_SORTS: &[&str] = &["createdAt", "updatedAt"];

#[derive(Debug, Clone)]
pub struct ListParams {
    pub page: u64,
    pub limit: u64,
    pub query: Query,
}

/// Turn raw query-string pairs into a paged, filtered store query.
/// Parameters that are neither paging, sorting nor a filterable field are ignored.
pub fn parse_list_params(
    params: &HashMap<String, String>,
    def: &ResourceDef,
    api: &ApiConfig,
) -> Result<ListParams, ApiError> {
    let page = match params.get("page") {
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(page) if page >= 1 => page,
            _ => return Err(ApiError::bad_request("page must be a positive integer")),
        },
        None => 1,
    };

    let limit = match params.get("limit") {
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(limit) if limit >= 1 => limit.min(api.max_page_size),
            _ => return Err(ApiError::bad_request("limit must be a positive integer")),
        },
        None => api.default_page_size.min(api.max_page_size),
    };

    let (sort_field, direction) = match params.get("sort") {
        Some(raw) => parse_sort(raw, def)?,
        None => ("createdAt".to_string(), SortDirection::Desc),
    };

    let mut query = Query::new().sort_by(sort_field, direction);
    for field in def.filterable {
        if let Some(raw) = params.get(*field) {
            query = query.eq(*field, filter_value(def, field, raw)?);
        }
    }

    Ok(ListParams {
        page,
        limit,
        query: query.page((page - 1) * limit, limit),
    })
}

fn parse_sort(raw: &str, def: &ResourceDef) -> Result<(String, SortDirection), ApiError> {
    let raw = raw.trim();
    let (field, direction) = if let Some(field) = raw.strip_prefix('-') {
        (field, SortDirection::Desc)
    } else if let Some((field, dir)) = raw.split_once(' ') {
        match dir.trim().to_ascii_lowercase().as_str() {
            "desc" => (field, SortDirection::Desc),
            "asc" => (field, SortDirection::Asc),
            _ => return Err(ApiError::bad_request(format!("Invalid sort direction '{}'", dir.trim()))),
        }
    } else {
        (raw, SortDirection::Asc)
    };

    let field = field.trim();
    if def.sortable.contains(&field) || TIMESTAMP_SORTS.contains(&field) {
        Ok((field.to_string(), direction))
    } else {
        Err(ApiError::bad_request(format!("Cannot sort {} by '{}'", def.segment, field)))
    }
}

fn filter_value(def: &ResourceDef, field: &str, raw: &str) -> Result<Value, ApiError> {
    let raw = raw.trim();
    match raw {
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        _ => {}
    }

    match def.kind_of(field) {
        Some(FieldKind::Integer { .. }) => raw
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| ApiError::field_error(field, "Must be an integer")),
        Some(FieldKind::Number { .. }) => raw
            .parse::<f64>()
            .ok()
            .and_then(|n| serde_json::Number::from_f64(n).map(Value::Number))
            .ok_or_else(|| ApiError::field_error(field, "Must be a number")),
        _ if field.ends_with("Id") => Ok(Value::String(ObjectId::parse(raw)?.to_string())),
        _ => Ok(Value::String(raw.to_string())),
    }
}
