// Data collection command handlers: dataset selection, transformations and merges
use crate::error::{ValidationError, WorkbenchError, WorkbenchResult};
use crate::models::{
    CatalogEntry, ColumnType, DataCollectionConfig, DatasetMerge, ModelingConfig, Row,
    SelectedDatasetConfig, Transformation,
};
use crate::transform::{build_preview, materialize, preview_merge, validate_merge, PreviewTable};
use crate::workbench::Project;
use log::debug;
use std::collections::HashSet;

pub fn list_ready_datasets(project: &Project) -> Vec<CatalogEntry> {
    project.catalog.list_ready()
}

pub fn get_data_collection(project: &Project, process_id: &str) -> DataCollectionConfig {
    project.store.read::<DataCollectionConfig>(process_id)
}

fn catalog_entry(project: &Project, dataset_id: &str) -> WorkbenchResult<CatalogEntry> {
    project
        .catalog
        .get(dataset_id)
        .ok_or_else(|| WorkbenchError::not_found("dataset", dataset_id))
}

fn selection_mut<'a>(
    config: &'a mut DataCollectionConfig,
    dataset_id: &str,
) -> WorkbenchResult<&'a mut SelectedDatasetConfig> {
    config
        .selected_datasets
        .iter_mut()
        .find(|d| d.dataset_id == dataset_id)
        .ok_or_else(|| WorkbenchError::not_found("dataset selection", dataset_id))
}

fn selection<'a>(config: &'a DataCollectionConfig, dataset_id: &str) -> WorkbenchResult<&'a SelectedDatasetConfig> {
    config
        .selected_datasets
        .iter()
        .find(|d| d.dataset_id == dataset_id)
        .ok_or_else(|| WorkbenchError::not_found("dataset selection", dataset_id))
}

/// Native columns of a selection are the ones seeded from the catalog schema.
fn ensure_column(selection: &SelectedDatasetConfig, column: &str) -> Result<(), ValidationError> {
    if selection.column_types.contains_key(column) {
        Ok(())
    } else {
        Err(ValidationError::UnknownColumn {
            dataset_id: selection.dataset_id.clone(),
            column: column.to_string(),
        })
    }
}

/// Checks a transformation against the selection it will join. `replacing` names the
/// transformation being edited so its own output column does not count as a duplicate.
fn validate_transformation(
    selection: &SelectedDatasetConfig,
    transformation: &Transformation,
    replacing: Option<&str>,
) -> Result<(), ValidationError> {
    if transformation.name.trim().is_empty() {
        return Err(ValidationError::EmptyTransformationName);
    }
    if transformation.column_name.trim().is_empty() {
        return Err(ValidationError::EmptyOutputColumn);
    }
    let duplicate = selection
        .transformations
        .iter()
        .filter(|t| Some(t.id.as_str()) != replacing)
        .any(|t| t.column_name == transformation.column_name);
    if duplicate {
        return Err(ValidationError::DuplicateOutputColumn {
            column: transformation.column_name.clone(),
        });
    }
    for source in &transformation.source_columns {
        ensure_column(selection, source)?;
    }
    Ok(())
}

/// Select a catalog dataset with every column selected and the catalog types copied.
pub fn add_dataset(project: &Project, process_id: &str, dataset_id: &str) -> WorkbenchResult<SelectedDatasetConfig> {
    let entry = catalog_entry(project, dataset_id)?;
    let selected = SelectedDatasetConfig {
        dataset_id: entry.id.clone(),
        selected_columns: entry.schema.iter().map(|c| c.name.clone()).collect(),
        column_types: entry
            .schema
            .iter()
            .map(|c| (c.name.clone(), c.column_type))
            .collect(),
        transformations: Vec::new(),
    };

    project.store.modify::<DataCollectionConfig, _, _>(process_id, |config| {
        if config.selected_datasets.iter().any(|d| d.dataset_id == dataset_id) {
            return Err(ValidationError::DatasetAlreadySelected {
                dataset_id: dataset_id.to_string(),
            }
            .into());
        }
        config.selected_datasets.push(selected.clone());
        Ok(())
    })?;

    debug!("Added dataset {} to process {}", dataset_id, process_id);
    Ok(selected)
}

/// Drop a selection and every merge that reads it. Once no process selects the dataset any
/// more, it is also removed from every modeling phase's dataset list.
pub fn remove_dataset(project: &Project, process_id: &str, dataset_id: &str) -> WorkbenchResult<bool> {
    let removed = project.store.modify::<DataCollectionConfig, _, _>(process_id, |config| {
        let before = config.selected_datasets.len();
        config.selected_datasets.retain(|d| d.dataset_id != dataset_id);
        if config.selected_datasets.len() == before {
            return Ok(false);
        }
        config
            .merges
            .retain(|m| m.left_dataset_id != dataset_id && m.right_dataset_id != dataset_id);
        Ok(true)
    })?;
    if !removed {
        return Ok(false);
    }

    let still_selected = project
        .store
        .all_selected_datasets()
        .iter()
        .any(|d| d.dataset_id == dataset_id);
    if !still_selected {
        let cleared = project.store.modify_all::<ModelingConfig, _>(|_, modeling| {
            let before = modeling.selected_dataset_ids.len();
            modeling.selected_dataset_ids.retain(|id| id != dataset_id);
            modeling.selected_dataset_ids.len() != before
        })?;
        if cleared > 0 {
            debug!("Cleared dataset {} from {} modeling config(s)", dataset_id, cleared);
        }
    }

    debug!("Removed dataset {} from process {}", dataset_id, process_id);
    Ok(true)
}

/// Symmetric add/remove of a column. Returns whether the column is now selected.
pub fn toggle_column(project: &Project, process_id: &str, dataset_id: &str, column: &str) -> WorkbenchResult<bool> {
    project.store.modify::<DataCollectionConfig, _, _>(process_id, |config| {
        let selection = selection_mut(config, dataset_id)?;
        ensure_column(selection, column)?;
        if selection.selected_columns.remove(column) {
            Ok(false)
        } else {
            selection.selected_columns.insert(column.to_string());
            Ok(true)
        }
    })
}

/// Override the type of one column for this selection only. The catalog is never touched.
pub fn set_column_type(
    project: &Project,
    process_id: &str,
    dataset_id: &str,
    column: &str,
    column_type: ColumnType,
) -> WorkbenchResult<()> {
    project.store.modify::<DataCollectionConfig, _, _>(process_id, |config| {
        let selection = selection_mut(config, dataset_id)?;
        ensure_column(selection, column)?;
        selection.column_types.insert(column.to_string(), column_type);
        Ok(())
    })
}

pub fn add_transformation(
    project: &Project,
    process_id: &str,
    dataset_id: &str,
    transformation: Transformation,
) -> WorkbenchResult<Transformation> {
    project.store.modify::<DataCollectionConfig, _, _>(process_id, |config| {
        let selection = selection_mut(config, dataset_id)?;
        validate_transformation(selection, &transformation, None)?;
        selection.transformations.push(transformation.clone());
        debug!(
            "Added transformation {} ({}) to dataset {}",
            transformation.name, transformation.formula, dataset_id
        );
        Ok(transformation)
    })
}

/// Replace a transformation in place, keeping its position in the list.
pub fn update_transformation(
    project: &Project,
    process_id: &str,
    dataset_id: &str,
    transformation: Transformation,
) -> WorkbenchResult<Transformation> {
    project.store.modify::<DataCollectionConfig, _, _>(process_id, |config| {
        let selection = selection_mut(config, dataset_id)?;
        let index = selection
            .transformations
            .iter()
            .position(|t| t.id == transformation.id)
            .ok_or_else(|| WorkbenchError::not_found("transformation", transformation.id.as_str()))?;
        validate_transformation(selection, &transformation, Some(&transformation.id))?;
        selection.transformations[index] = transformation.clone();
        Ok(transformation)
    })
}

pub fn remove_transformation(
    project: &Project,
    process_id: &str,
    dataset_id: &str,
    transformation_id: &str,
) -> WorkbenchResult<bool> {
    project.store.modify::<DataCollectionConfig, _, _>(process_id, |config| {
        let selection = selection_mut(config, dataset_id)?;
        let before = selection.transformations.len();
        selection.transformations.retain(|t| t.id != transformation_id);
        Ok(selection.transformations.len() != before)
    })
}

/// `ordered_ids` must name every transformation of the dataset exactly once.
pub fn reorder_transformations(
    project: &Project,
    process_id: &str,
    dataset_id: &str,
    ordered_ids: &[String],
) -> WorkbenchResult<Vec<Transformation>> {
    project.store.modify::<DataCollectionConfig, _, _>(process_id, |config| {
        let selection = selection_mut(config, dataset_id)?;
        let unique: HashSet<&String> = ordered_ids.iter().collect();
        if unique.len() != ordered_ids.len() || ordered_ids.len() != selection.transformations.len() {
            return Err(ValidationError::InvalidPartial {
                reason: "transformation order must list every transformation exactly once".to_string(),
            }
            .into());
        }

        let mut reordered = Vec::with_capacity(ordered_ids.len());
        for id in ordered_ids {
            let transformation = selection
                .transformations
                .iter()
                .find(|t| &t.id == id)
                .ok_or_else(|| WorkbenchError::not_found("transformation", id.as_str()))?;
            reordered.push(transformation.clone());
        }
        selection.transformations = reordered.clone();
        Ok(reordered)
    })
}

/// Sample rows of a selected dataset projected through its columns and transformations.
pub fn preview_dataset(project: &Project, process_id: &str, dataset_id: &str) -> WorkbenchResult<PreviewTable> {
    let config = get_data_collection(project, process_id);
    let selection = selection(&config, dataset_id)?;
    let entry = catalog_entry(project, dataset_id)?;
    Ok(build_preview(&entry, selection))
}

/// Catalog rows with every transformation applied, aggregates computed over the full column.
pub fn materialize_dataset(project: &Project, process_id: &str, dataset_id: &str) -> WorkbenchResult<Vec<Row>> {
    let config = get_data_collection(project, process_id);
    let selection = selection(&config, dataset_id)?;
    let entry = catalog_entry(project, dataset_id)?;
    Ok(materialize(&entry.preview, &selection.transformations))
}

/// Record a merge between two datasets selected in the same process. A fresh id is assigned.
pub fn add_merge(project: &Project, process_id: &str, mut merge: DatasetMerge) -> WorkbenchResult<DatasetMerge> {
    validate_merge(&merge)?;
    merge.id = uuid::Uuid::new_v4().to_string();

    project.store.modify::<DataCollectionConfig, _, _>(process_id, |config| {
        selection(config, &merge.left_dataset_id)?;
        selection(config, &merge.right_dataset_id)?;
        config.merges.push(merge.clone());
        Ok(())
    })?;

    debug!(
        "Added merge {} of {} and {} to process {}",
        merge.output_name, merge.left_dataset_id, merge.right_dataset_id, process_id
    );
    Ok(merge)
}

pub fn remove_merge(project: &Project, process_id: &str, merge_id: &str) -> WorkbenchResult<bool> {
    project.store.modify::<DataCollectionConfig, _, _>(process_id, |config| {
        let before = config.merges.len();
        config.merges.retain(|m| m.id != merge_id);
        Ok(config.merges.len() != before)
    })
}

/// Execute a stored merge over the materialised sample rows of both sides.
pub fn preview_stored_merge(project: &Project, process_id: &str, merge_id: &str) -> WorkbenchResult<Vec<Row>> {
    let config = get_data_collection(project, process_id);
    let merge = config
        .merges
        .iter()
        .find(|m| m.id == merge_id)
        .ok_or_else(|| WorkbenchError::not_found("merge", merge_id))?;

    let side = |dataset_id: &str| -> WorkbenchResult<Vec<Row>> {
        let selection = selection(&config, dataset_id)?;
        let entry = catalog_entry(project, dataset_id)?;
        Ok(materialize(&entry.preview, &selection.transformations))
    };
    let left = side(&merge.left_dataset_id)?;
    let right = side(&merge.right_dataset_id)?;
    Ok(preview_merge(&left, &right, merge))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BuiltinAlgorithms, StaticCatalog};
    use crate::models::{CatalogColumn, FunctionType, JoinKey, JoinType};
    use crate::store::MemoryBackend;
    use crate::workbench::Workbench;
    use serde_json::{json, Map, Value};
    use std::sync::Arc;

    fn column(name: &str, column_type: ColumnType) -> CatalogColumn {
        CatalogColumn {
            name: name.to_string(),
            column_type,
            null_count: 0,
            unique_count: 0,
            sample: vec![],
        }
    }

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn project() -> Project {
        let catalog = StaticCatalog::new(vec![
            CatalogEntry {
                id: "d1".to_string(),
                name: "Orders".to_string(),
                schema: vec![column("id", ColumnType::Integer), column("amount", ColumnType::Number)],
                row_count: 2,
                preview: vec![
                    row(json!({"id": 1, "amount": 12.347})),
                    row(json!({"id": 2, "amount": 7.5})),
                ],
            },
            CatalogEntry {
                id: "d2".to_string(),
                name: "Customers".to_string(),
                schema: vec![column("id", ColumnType::Integer), column("name", ColumnType::String)],
                row_count: 1,
                preview: vec![row(json!({"id": 1, "name": "Ada"}))],
            },
        ]);
        let dir = std::env::temp_dir().join("unused-settings");
        Workbench::new(
            Arc::new(MemoryBackend::new()),
            dir.join("settings.json"),
            Arc::new(catalog),
            Arc::new(BuiltinAlgorithms::new()),
        )
        .project("proj")
    }

    fn round_amount(column_name: &str) -> Transformation {
        let mut parameters = Map::new();
        parameters.insert("decimals".to_string(), json!(1));
        Transformation::new(
            "Round amount",
            column_name,
            FunctionType::Round,
            vec!["amount".to_string()],
            parameters,
        )
    }

    #[test]
    fn test_add_dataset_seeds_all_columns_and_types() {
        let project = project();
        let selected = add_dataset(&project, "p1", "d1").unwrap();
        assert_eq!(selected.selected_columns.len(), 2);
        assert_eq!(selected.column_types["amount"], ColumnType::Number);

        let err = add_dataset(&project, "p1", "d1").unwrap_err();
        assert!(err.is_validation());
        assert!(matches!(
            add_dataset(&project, "p1", "missing"),
            Err(WorkbenchError::NotFound { .. })
        ));
    }

    #[test]
    fn test_toggle_column_is_symmetric() {
        let project = project();
        add_dataset(&project, "p1", "d1").unwrap();
        assert!(!toggle_column(&project, "p1", "d1", "amount").unwrap());
        assert!(toggle_column(&project, "p1", "d1", "amount").unwrap());
        assert!(toggle_column(&project, "p1", "d1", "nope").unwrap_err().is_validation());
    }

    #[test]
    fn test_set_column_type_overrides_selection_only() {
        let project = project();
        add_dataset(&project, "p1", "d1").unwrap();
        set_column_type(&project, "p1", "d1", "id", ColumnType::Categorical).unwrap();

        let config = get_data_collection(&project, "p1");
        assert_eq!(config.selected_datasets[0].column_types["id"], ColumnType::Categorical);
        let catalog_type = project.catalog.get("d1").unwrap().schema[0].column_type;
        assert_eq!(catalog_type, ColumnType::Integer);
    }

    #[test]
    fn test_round_transformation_preview() {
        let project = project();
        add_dataset(&project, "p1", "d1").unwrap();
        add_transformation(&project, "p1", "d1", round_amount("amount_rounded")).unwrap();

        let preview = preview_dataset(&project, "p1", "d1").unwrap();
        assert_eq!(preview.rows[0]["amount_rounded"], json!(12.3));
        assert!(preview.columns.iter().any(|c| c.name == "amount_rounded" && c.derived));
    }

    #[test]
    fn test_transformation_validation_rejects_without_writing() {
        let project = project();
        add_dataset(&project, "p1", "d1").unwrap();
        add_transformation(&project, "p1", "d1", round_amount("amount_rounded")).unwrap();

        let duplicate = add_transformation(&project, "p1", "d1", round_amount("amount_rounded"));
        assert!(matches!(
            duplicate,
            Err(WorkbenchError::Validation(ValidationError::DuplicateOutputColumn { .. }))
        ));

        let mut unnamed = round_amount("other");
        unnamed.name = "  ".to_string();
        assert!(matches!(
            add_transformation(&project, "p1", "d1", unnamed),
            Err(WorkbenchError::Validation(ValidationError::EmptyTransformationName))
        ));

        let mut unknown_source = round_amount("other");
        unknown_source.source_columns = vec!["price".to_string()];
        assert!(add_transformation(&project, "p1", "d1", unknown_source).is_err());

        let config = get_data_collection(&project, "p1");
        assert_eq!(config.selected_datasets[0].transformations.len(), 1);
    }

    #[test]
    fn test_update_and_reorder_transformations() {
        let project = project();
        add_dataset(&project, "p1", "d1").unwrap();
        let first = add_transformation(&project, "p1", "d1", round_amount("a")).unwrap();
        let second = add_transformation(&project, "p1", "d1", round_amount("b")).unwrap();

        let mut edited = first.clone();
        edited.name = "Renamed".to_string();
        update_transformation(&project, "p1", "d1", edited).unwrap();

        let order = vec![second.id.clone(), first.id.clone()];
        let reordered = reorder_transformations(&project, "p1", "d1", &order).unwrap();
        assert_eq!(reordered[0].id, second.id);
        assert_eq!(reordered[1].name, "Renamed");

        let partial = vec![second.id.clone()];
        assert!(reorder_transformations(&project, "p1", "d1", &partial).is_err());
        assert!(remove_transformation(&project, "p1", "d1", &first.id).unwrap());
        assert!(!remove_transformation(&project, "p1", "d1", &first.id).unwrap());
    }

    #[test]
    fn test_remove_dataset_cascades_to_merges_and_modeling() {
        let project = project();
        add_dataset(&project, "p1", "d1").unwrap();
        add_dataset(&project, "p1", "d2").unwrap();
        add_merge(
            &project,
            "p1",
            DatasetMerge {
                id: String::new(),
                left_dataset_id: "d1".to_string(),
                right_dataset_id: "d2".to_string(),
                join_type: JoinType::Inner,
                join_keys: vec![JoinKey {
                    left: "id".to_string(),
                    right: "id".to_string(),
                }],
                output_name: "orders_customers".to_string(),
            },
        )
        .unwrap();
        project
            .store
            .modify::<ModelingConfig, _, _>("p9", |m| {
                m.selected_dataset_ids = vec!["d1".to_string(), "d2".to_string()];
                Ok(())
            })
            .unwrap();

        assert!(remove_dataset(&project, "p1", "d2").unwrap());

        let config = get_data_collection(&project, "p1");
        assert!(config.merges.is_empty());
        let modeling = project.store.read::<ModelingConfig>("p9");
        assert_eq!(modeling.selected_dataset_ids, vec!["d1".to_string()]);
        assert!(!remove_dataset(&project, "p1", "d2").unwrap());
    }

    #[test]
    fn test_stored_merge_preview_joins_sample_rows() {
        let project = project();
        add_dataset(&project, "p1", "d1").unwrap();
        add_dataset(&project, "p1", "d2").unwrap();
        let merge = add_merge(
            &project,
            "p1",
            DatasetMerge {
                id: String::new(),
                left_dataset_id: "d1".to_string(),
                right_dataset_id: "d2".to_string(),
                join_type: JoinType::Left,
                join_keys: vec![JoinKey {
                    left: "id".to_string(),
                    right: "id".to_string(),
                }],
                output_name: "orders_customers".to_string(),
            },
        )
        .unwrap();
        assert!(!merge.id.is_empty());

        let rows = preview_stored_merge(&project, "p1", &merge.id).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], json!("Ada"));
        assert_eq!(rows[1].get("name").cloned().unwrap_or(Value::Null), Value::Null);
    }

    #[test]
    fn test_add_merge_requires_selected_datasets() {
        let project = project();
        add_dataset(&project, "p1", "d1").unwrap();
        let result = add_merge(
            &project,
            "p1",
            DatasetMerge {
                id: String::new(),
                left_dataset_id: "d1".to_string(),
                right_dataset_id: "d2".to_string(),
                join_type: JoinType::Concat,
                join_keys: vec![],
                output_name: "all".to_string(),
            },
        );
        assert!(matches!(result, Err(WorkbenchError::NotFound { .. })));
        assert!(get_data_collection(&project, "p1").merges.is_empty());
    }
}
