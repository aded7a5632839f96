//! Row-level transformation engine.
//!
//! `apply` is total: inapplicable inputs pass the source value through (or a fixed
//! sentinel such as `"N/A"`), never an error.

use crate::models::{FunctionType, Row, Transformation};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Number, Value};
use std::fmt::Write;

const NOT_AVAILABLE: &str = "N/A";
const DEFAULT_DATE_FORMAT: &str = "YYYY-MM-DD";

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

/// Derive one value from `row` according to `transformation`.
pub fn apply(row: &Row, transformation: &Transformation) -> Value {
    let Some(first_column) = transformation.source_columns.first() else {
        return Value::Null;
    };
    let source = row.get(first_column).cloned().unwrap_or(Value::Null);
    let params = &transformation.parameters;

    match transformation.function_type {
        FunctionType::IfMissing | FunctionType::FillNa => {
            if is_missing(&source) {
                fill_value(params)
            } else {
                source
            }
        }
        FunctionType::Uppercase => map_str(source, |s| s.to_uppercase()),
        FunctionType::Lowercase => map_str(source, |s| s.to_lowercase()),
        FunctionType::Trim => map_str(source, |s| s.trim().to_string()),
        FunctionType::Round => match source.as_f64() {
            Some(n) => {
                let decimals = param_f64(params, "decimals").unwrap_or(0.0).clamp(0.0, 15.0) as i32;
                number_value(js_round(n, decimals))
            }
            None => source,
        },
        FunctionType::Abs => match source.as_f64() {
            Some(n) => number_value(n.abs()),
            None => source,
        },
        FunctionType::Log => match source.as_f64() {
            Some(n) if n <= 0.0 => Value::String(NOT_AVAILABLE.to_string()),
            Some(n) => fixed4(n.ln()),
            None => source,
        },
        FunctionType::Sqrt => match source.as_f64() {
            Some(n) if n < 0.0 => Value::String(NOT_AVAILABLE.to_string()),
            Some(n) => fixed4(n.sqrt()),
            None => source,
        },
        // Fixed-modulus placeholder, not min-max normalisation.
        FunctionType::Normalize => match source.as_f64() {
            Some(n) => fixed4((n % 100.0) / 100.0),
            None => source,
        },
        // Fixed mean 50 / stddev 25 placeholder, not a computed z-score.
        FunctionType::Scale => match source.as_f64() {
            Some(n) => fixed4((n - 50.0) / 25.0),
            None => source,
        },
        FunctionType::Concat => {
            if transformation.source_columns.len() == 1 {
                return source;
            }
            let separator = param_str(params, "separator").unwrap_or_else(|| " ".to_string());
            let parts: Vec<String> = transformation
                .source_columns
                .iter()
                .map(|column| row.get(column).map(display_value).unwrap_or_default())
                .collect();
            Value::String(parts.join(&separator))
        }
        FunctionType::Substring => match source {
            Value::String(s) => {
                let start = param_f64(params, "start").unwrap_or(0.0).max(0.0) as usize;
                let length = param_f64(params, "length").unwrap_or(10.0).max(0.0) as usize;
                Value::String(s.chars().skip(start).take(length).collect())
            }
            other => other,
        },
        FunctionType::Replace => match source {
            Value::String(s) => match param_str(params, "pattern") {
                Some(pattern) => {
                    let replacement = param_str(params, "replacement").unwrap_or_default();
                    Value::String(s.replacen(&pattern, &replacement, 1))
                }
                None => Value::String(s),
            },
            other => other,
        },
        FunctionType::DateFormat => {
            let format = param_str(params, "format").unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string());
            format_date(&source, &format).map(Value::String).unwrap_or(source)
        }
        FunctionType::Sum
        | FunctionType::Avg
        | FunctionType::Count
        | FunctionType::Min
        | FunctionType::Max => Value::String(format!("[{}]", transformation.function_type.name())),
        FunctionType::Unknown => source,
    }
}

fn is_missing(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// `fillValue ?? defaultValue ?? "N/A"`
fn fill_value(params: &Map<String, Value>) -> Value {
    ["fillValue", "defaultValue"]
        .iter()
        .filter_map(|key| params.get(*key))
        .find(|v| !v.is_null())
        .cloned()
        .unwrap_or_else(|| Value::String(NOT_AVAILABLE.to_string()))
}

fn map_str(value: Value, f: impl FnOnce(&str) -> String) -> Value {
    match value {
        Value::String(s) => Value::String(f(&s)),
        other => other,
    }
}

/// Numeric parameter; form inputs may deliver numbers as strings.
pub(crate) fn param_f64(params: &Map<String, Value>, key: &str) -> Option<f64> {
    match params.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn param_str(params: &Map<String, Value>, key: &str) -> Option<String> {
    match params.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(display_value(other)),
    }
}

/// Half-up rounding to `decimals` places, matching `Math.round(n * 10^d) / 10^d`.
fn js_round(n: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (n * factor + 0.5).floor() / factor
}

fn fixed4(n: f64) -> Value {
    Value::String(format!("{:.4}", n))
}

/// Integral values become JSON integers so `12.0` and `12` compare equal.
pub(crate) fn number_value(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// String rendering used when values are joined into text.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

fn parse_date(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Number(n) => {
            let millis = n.as_f64()?;
            DateTime::from_timestamp_millis(millis as i64).map(|dt| dt.naive_utc())
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.naive_utc());
            }
            for format in DATETIME_FORMATS {
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                    return Some(dt);
                }
            }
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        }
        _ => None,
    }
}

/// Accepts strftime patterns or `YYYY-MM-DD`-style tokens.
fn to_strftime(format: &str) -> String {
    if format.contains('%') {
        return format.to_string();
    }
    format
        .replace("YYYY", "%Y")
        .replace("YY", "%y")
        .replace("MM", "%m")
        .replace("DD", "%d")
        .replace("HH", "%H")
        .replace("mm", "%M")
        .replace("ss", "%S")
}

fn format_date(value: &Value, format: &str) -> Option<String> {
    let parsed = parse_date(value)?;
    let pattern = to_strftime(format);
    let items: Vec<Item<'_>> = StrftimeItems::new(&pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return None;
    }
    // Offset and zone specifiers have nothing to render on a naive datetime.
    let mut rendered = String::new();
    write!(rendered, "{}", parsed.format_with_items(items.into_iter())).ok()?;
    Some(rendered)
}
