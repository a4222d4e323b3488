use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{AppError, FieldError};
use crate::utils::sanitize_string;

pub const MAX_QUERY_LENGTH: usize = 200;
pub const MIN_LIMIT: u32 = 1;
pub const MAX_LIMIT: u32 = 50;
pub const DEFAULT_LIMIT: u32 = 5;

/// Geographic center of the contiguous United States.
pub const DEFAULT_COORDINATES: &str = "38.447030, -101.547385";

static COORDINATES_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+\.?[0-9]*,\s*-?[0-9]+\.?[0-9]*$").ok());

/// A search request that passed validation, ready to forward upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedSearchQuery {
    /// Trimmed and HTML-escaped.
    pub query: String,
    pub coordinates: String,
    pub limit: u32,
}

impl ValidatedSearchQuery {
    /// Validates an arbitrary JSON body, reporting every failing field at once.
    pub fn validate(body: &Value) -> Result<Self, AppError> {
        let Some(fields) = body.as_object() else {
            return Err(AppError::Validation(vec![FieldError::new(
                "body",
                "invalid_type",
                "request body must be a JSON object",
            )]));
        };

        let query = validate_query(fields);
        let coordinates = validate_coordinates(fields);
        let limit = validate_limit(fields);

        match (query, coordinates, limit) {
            (Ok(query), Ok(coordinates), Ok(limit)) => Ok(Self {
                query: sanitize_string(&query),
                coordinates,
                limit,
            }),
            (query, coordinates, limit) => Err(AppError::Validation(
                [query.err(), coordinates.err(), limit.err()]
                    .into_iter()
                    .flatten()
                    .collect(),
            )),
        }
    }
}

fn validate_query(fields: &Map<String, Value>) -> Result<String, FieldError> {
    let raw = match fields.get("query") {
        None => return Err(FieldError::new("query", "required", "query is required")),
        Some(Value::String(s)) => s,
        Some(_) => {
            return Err(FieldError::new(
                "query",
                "invalid_type",
                "query must be a string",
            ));
        }
    };

    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if len == 0 {
        return Err(FieldError::new(
            "query",
            "too_small",
            "query must contain at least 1 character",
        ));
    }
    if len > MAX_QUERY_LENGTH {
        return Err(FieldError::new(
            "query",
            "too_big",
            format!("query must contain at most {MAX_QUERY_LENGTH} characters"),
        ));
    }

    Ok(trimmed.to_string())
}

fn validate_coordinates(fields: &Map<String, Value>) -> Result<String, FieldError> {
    match fields.get("coordinates") {
        None => Ok(DEFAULT_COORDINATES.to_string()),
        Some(Value::String(s)) if is_coordinate_pair(s) => Ok(s.clone()),
        Some(Value::String(_)) => Err(FieldError::new(
            "coordinates",
            "invalid_string",
            "coordinates must be formatted as \"lat, lon\"",
        )),
        Some(_) => Err(FieldError::new(
            "coordinates",
            "invalid_type",
            "coordinates must be a string",
        )),
    }
}

fn validate_limit(fields: &Map<String, Value>) -> Result<u32, FieldError> {
    let value = match fields.get("limit") {
        None => return Ok(DEFAULT_LIMIT),
        Some(v) => v,
    };

    let Some(n) = value.as_f64() else {
        return Err(FieldError::new(
            "limit",
            "invalid_type",
            "limit must be a number",
        ));
    };
    if n.fract() != 0.0 {
        return Err(FieldError::new(
            "limit",
            "invalid_type",
            "limit must be an integer",
        ));
    }
    if n < f64::from(MIN_LIMIT) {
        return Err(FieldError::new(
            "limit",
            "too_small",
            format!("limit must be at least {MIN_LIMIT}"),
        ));
    }
    if n > f64::from(MAX_LIMIT) {
        return Err(FieldError::new(
            "limit",
            "too_big",
            format!("limit must be at most {MAX_LIMIT}"),
        ));
    }

    Ok(n as u32)
}

fn is_coordinate_pair(s: &str) -> bool {
    COORDINATES_PATTERN
        .as_ref()
        .is_some_and(|re| re.is_match(s))
}
