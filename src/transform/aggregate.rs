// Full-dataset materialisation, where aggregate functions see the whole column

use super::engine::{apply, number_value};
use crate::models::{FunctionType, Row, Transformation};
use serde_json::{Map, Value};

/// Like `preview_rows`, but `SUM/AVG/COUNT/MIN/MAX` are computed over every row of their
/// first source column and the result is broadcast to each row.
pub fn materialize(rows: &[Row], transformations: &[Transformation]) -> Vec<Row> {
    let column_results: Vec<Option<Value>> = transformations
        .iter()
        .map(|t| {
            if t.function_type.is_aggregate() {
                Some(aggregate_column(rows, t))
            } else {
                None
            }
        })
        .collect();

    rows.iter()
        .map(|row| {
            let mut derived = Map::new();
            for (transformation, aggregate) in transformations.iter().zip(&column_results) {
                let value = match aggregate {
                    Some(v) => v.clone(),
                    None => apply(row, transformation),
                };
                derived.insert(transformation.column_name.clone(), value);
            }
            let mut out = row.clone();
            out.extend(derived);
            out
        })
        .collect()
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Aggregate over one column. Non-numeric cells are skipped by SUM/AVG/MIN/MAX;
/// COUNT counts non-missing cells.
pub fn aggregate_column(rows: &[Row], transformation: &Transformation) -> Value {
    let Some(column) = transformation.source_columns.first() else {
        return Value::Null;
    };
    let cells = rows.iter().filter_map(|row| row.get(column));

    match transformation.function_type {
        FunctionType::Count => {
            let count = cells
                .filter(|v| !matches!(v, Value::Null) && v.as_str() != Some(""))
                .count();
            Value::from(count as u64)
        }
        FunctionType::Sum => number_value(cells.filter_map(numeric).sum()),
        FunctionType::Avg => {
            let values: Vec<f64> = cells.filter_map(numeric).collect();
            if values.is_empty() {
                Value::Null
            } else {
                number_value(values.iter().sum::<f64>() / values.len() as f64)
            }
        }
        FunctionType::Min => cells
            .filter_map(numeric)
            .reduce(f64::min)
            .map(number_value)
            .unwrap_or(Value::Null),
        FunctionType::Max => cells
            .filter_map(numeric)
            .reduce(f64::max)
            .map(number_value)
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}
