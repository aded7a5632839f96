// Dataset merge validation and preview execution

use super::engine::display_value;
use crate::error::ValidationError;
use crate::models::{DatasetMerge, JoinType, Row};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

const RIGHT_SUFFIX: &str = "_right";

pub fn validate_merge(merge: &DatasetMerge) -> Result<(), ValidationError> {
    if merge.output_name.trim().is_empty() {
        return Err(ValidationError::EmptyMergeName);
    }
    if merge.left_dataset_id == merge.right_dataset_id {
        return Err(ValidationError::SameDatasetMerge);
    }
    if merge.join_type != JoinType::Concat && merge.join_keys.is_empty() {
        return Err(ValidationError::MissingJoinKeys {
            join_type: format!("{:?}", merge.join_type).to_lowercase(),
        });
    }
    Ok(())
}

/// Join key of a row. `None` when any key cell is missing, so nulls never match.
fn key_of<'a>(row: &Row, columns: impl Iterator<Item = &'a String>) -> Option<Vec<String>> {
    columns
        .map(|c| match row.get(c) {
            None | Some(Value::Null) => None,
            Some(v) => Some(display_value(v)),
        })
        .collect()
}

fn column_names(rows: &[Row]) -> BTreeSet<String> {
    rows.iter().flat_map(|r| r.keys().cloned()).collect()
}

/// Execute a merge over sample rows.
///
/// Keyed joins match when every `(left, right)` key pair is equal. Left columns keep their
/// names; a right column colliding with a left one is suffixed `_right`, except a right key
/// column sharing its left key's name, which is folded into it. `concat` appends right rows
/// after left rows.
pub fn preview_merge(left: &[Row], right: &[Row], merge: &DatasetMerge) -> Vec<Row> {
    if merge.join_type == JoinType::Concat {
        return left.iter().chain(right.iter()).cloned().collect();
    }

    let left_columns = column_names(left);
    let right_columns = column_names(right);
    let folded: BTreeSet<&String> = merge
        .join_keys
        .iter()
        .filter(|k| k.left == k.right)
        .map(|k| &k.right)
        .collect();

    let right_name = |column: &String| -> Option<String> {
        if folded.contains(column) {
            None
        } else if left_columns.contains(column) {
            Some(format!("{}{}", column, RIGHT_SUFFIX))
        } else {
            Some(column.clone())
        }
    };

    let combine = |l: Option<&Row>, r: Option<&Row>| -> Row {
        let mut out = Row::new();
        for column in &left_columns {
            let value = l.and_then(|row| row.get(column)).cloned().unwrap_or(Value::Null);
            out.insert(column.clone(), value);
        }
        if l.is_none() {
            if let Some(r) = r {
                for key in &merge.join_keys {
                    if let Some(v) = r.get(&key.right) {
                        out.insert(key.left.clone(), v.clone());
                    }
                }
            }
        }
        for column in &right_columns {
            if let Some(name) = right_name(column) {
                let value = r.and_then(|row| row.get(column)).cloned().unwrap_or(Value::Null);
                out.insert(name, value);
            }
        }
        out
    };

    let mut index: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
    for (i, row) in right.iter().enumerate() {
        if let Some(key) = key_of(row, merge.join_keys.iter().map(|k| &k.right)) {
            index.entry(key).or_default().push(i);
        }
    }

    let keep_unmatched_left = matches!(merge.join_type, JoinType::Left | JoinType::Full);
    let keep_unmatched_right = matches!(merge.join_type, JoinType::Right | JoinType::Full);

    let mut matched_right = vec![false; right.len()];
    let mut out = Vec::new();

    for l in left {
        let matches = key_of(l, merge.join_keys.iter().map(|k| &k.left))
            .and_then(|key| index.get(&key))
            .cloned()
            .unwrap_or_default();
        if matches.is_empty() {
            if keep_unmatched_left {
                out.push(combine(Some(l), None));
            }
            continue;
        }
        for i in matches {
            matched_right[i] = true;
            out.push(combine(Some(l), Some(&right[i])));
        }
    }

    if keep_unmatched_right {
        for (i, r) in right.iter().enumerate() {
            if !matched_right[i] {
                out.push(combine(None, Some(r)));
            }
        }
    }

    out
}
