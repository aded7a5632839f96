// Preview composition of selected columns and derived transformation outputs

use super::engine::apply;
use crate::models::{CatalogEntry, ColumnType, Row, SelectedDatasetConfig, Transformation};
use serde::Serialize;
use serde_json::{Map, Value};

/// Every native column copied through, then each transformation written into its output
/// column in list order. Transformations read the native row only; a later output with the
/// same name supersedes an earlier one, and any output hides a same-named native column.
pub fn preview_rows(rows: &[Row], transformations: &[Transformation]) -> Vec<Row> {
    rows.iter()
        .map(|row| {
            let mut derived = Map::new();
            for transformation in transformations {
                derived.insert(transformation.column_name.clone(), apply(row, transformation));
            }
            let mut out = row.clone();
            out.extend(derived);
            out
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreviewColumn {
    pub name: String,
    pub column_type: Option<ColumnType>,
    pub derived: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PreviewTable {
    pub columns: Vec<PreviewColumn>,
    pub rows: Vec<Row>,
}

/// Projection of a catalog dataset through its selection: selected native columns in schema
/// order, then derived-only columns in transformation order.
pub fn build_preview(entry: &CatalogEntry, selection: &SelectedDatasetConfig) -> PreviewTable {
    let is_output = |name: &str| {
        selection
            .transformations
            .iter()
            .any(|t| t.column_name == name)
    };

    let mut columns: Vec<PreviewColumn> = entry
        .schema
        .iter()
        .filter(|c| selection.selected_columns.contains(&c.name))
        .map(|c| {
            let derived = is_output(&c.name);
            PreviewColumn {
                name: c.name.clone(),
                column_type: if derived {
                    None
                } else {
                    Some(
                        selection
                            .column_types
                            .get(&c.name)
                            .copied()
                            .unwrap_or(c.column_type),
                    )
                },
                derived,
            }
        })
        .collect();

    for transformation in &selection.transformations {
        if !columns.iter().any(|c| c.name == transformation.column_name) {
            columns.push(PreviewColumn {
                name: transformation.column_name.clone(),
                column_type: None,
                derived: true,
            });
        }
    }

    let rows = preview_rows(&entry.preview, &selection.transformations)
        .into_iter()
        .map(|full| {
            columns
                .iter()
                .map(|c| (c.name.clone(), full.get(&c.name).cloned().unwrap_or(Value::Null)))
                .collect()
        })
        .collect();

    PreviewTable { columns, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CatalogColumn, FunctionType};
    use serde_json::json;
    use std::collections::{BTreeMap, BTreeSet};

    fn column(name: &str, column_type: ColumnType) -> CatalogColumn {
        CatalogColumn {
            name: name.to_string(),
            column_type,
            null_count: 0,
            unique_count: 0,
            sample: vec![],
        }
    }

    fn transformation(column_name: &str, function_type: FunctionType, source: &str) -> Transformation {
        Transformation::new(
            column_name,
            column_name,
            function_type,
            vec![source.to_string()],
            Map::new(),
        )
    }

    #[test]
    fn test_later_transformation_supersedes_same_output() {
        let rows = vec![json!({ "name": " ada " }).as_object().cloned().unwrap()];
        let transformations = vec![
            transformation("clean", FunctionType::Uppercase, "name"),
            transformation("clean", FunctionType::Trim, "name"),
        ];
        let out = preview_rows(&rows, &transformations);
        assert_eq!(out[0]["clean"], json!("ada"));
        assert_eq!(out[0]["name"], json!(" ada "));
    }

    #[test]
    fn test_output_hides_native_column_in_projection() {
        let entry = CatalogEntry {
            id: "d1".to_string(),
            name: "customers".to_string(),
            schema: vec![column("name", ColumnType::String), column("age", ColumnType::Number)],
            row_count: 1,
            preview: vec![json!({ "name": "ada", "age": 36 }).as_object().cloned().unwrap()],
        };
        let selection = SelectedDatasetConfig {
            dataset_id: "d1".to_string(),
            selected_columns: BTreeSet::from(["name".to_string(), "age".to_string()]),
            column_types: BTreeMap::from([("age".to_string(), ColumnType::Integer)]),
            transformations: vec![
                transformation("name", FunctionType::Uppercase, "name"),
                transformation("age_log", FunctionType::Log, "age"),
            ],
        };

        let table = build_preview(&entry, &selection);

        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["name", "age", "age_log"]);
        assert!(table.columns[0].derived);
        assert_eq!(table.columns[1].column_type, Some(ColumnType::Integer));
        assert_eq!(table.rows[0]["name"], json!("ADA"));
        assert_eq!(table.rows[0]["age_log"], json!("3.5835"));
    }
}
