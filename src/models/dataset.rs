// Dataset selection, transformation and merge data models
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// A single sample row. Column name to cell value.
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    String,
    Number,
    Integer,
    Boolean,
    Date,
    Categorical,
    #[serde(other)]
    Unknown,
}

/// Schema column as reported by the dataset catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default)]
    pub null_count: u64,
    #[serde(default)]
    pub unique_count: u64,
    #[serde(default)]
    pub sample: Vec<Value>,
}

/// A ready dataset exposed by the catalog. Only `id`, `schema` and `preview` are read here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub schema: Vec<CatalogColumn>,
    #[serde(default)]
    pub row_count: u64,
    #[serde(default)]
    pub preview: Vec<Row>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FunctionType {
    IfMissing,
    FillNa,
    Uppercase,
    Lowercase,
    Trim,
    Round,
    Abs,
    Log,
    Sqrt,
    Normalize,
    Scale,
    Concat,
    Substring,
    Replace,
    DateFormat,
    Sum,
    Avg,
    Count,
    Min,
    Max,
    #[serde(other)]
    Unknown,
}

impl FunctionType {
    pub fn name(&self) -> &'static str {
        match self {
            FunctionType::IfMissing => "IF_MISSING",
            FunctionType::FillNa => "FILL_NA",
            FunctionType::Uppercase => "UPPERCASE",
            FunctionType::Lowercase => "LOWERCASE",
            FunctionType::Trim => "TRIM",
            FunctionType::Round => "ROUND",
            FunctionType::Abs => "ABS",
            FunctionType::Log => "LOG",
            FunctionType::Sqrt => "SQRT",
            FunctionType::Normalize => "NORMALIZE",
            FunctionType::Scale => "SCALE",
            FunctionType::Concat => "CONCAT",
            FunctionType::Substring => "SUBSTRING",
            FunctionType::Replace => "REPLACE",
            FunctionType::DateFormat => "DATE_FORMAT",
            FunctionType::Sum => "SUM",
            FunctionType::Avg => "AVG",
            FunctionType::Count => "COUNT",
            FunctionType::Min => "MIN",
            FunctionType::Max => "MAX",
            FunctionType::Unknown => "UNKNOWN",
        }
    }

    pub fn category(&self) -> FunctionCategory {
        match self {
            FunctionType::IfMissing | FunctionType::FillNa => FunctionCategory::MissingValues,
            FunctionType::Uppercase
            | FunctionType::Lowercase
            | FunctionType::Trim
            | FunctionType::Concat
            | FunctionType::Substring
            | FunctionType::Replace => FunctionCategory::Text,
            FunctionType::Round
            | FunctionType::Abs
            | FunctionType::Log
            | FunctionType::Sqrt
            | FunctionType::Normalize
            | FunctionType::Scale => FunctionCategory::Numeric,
            FunctionType::DateFormat => FunctionCategory::Date,
            FunctionType::Sum
            | FunctionType::Avg
            | FunctionType::Count
            | FunctionType::Min
            | FunctionType::Max => FunctionCategory::Aggregate,
            FunctionType::Unknown => FunctionCategory::Custom,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        self.category() == FunctionCategory::Aggregate
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FunctionCategory {
    MissingValues,
    Text,
    Numeric,
    Date,
    Aggregate,
    #[serde(other)]
    Custom,
}

/// A named derivation producing one output column from one or more source columns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transformation {
    pub id: String,
    pub name: String,
    pub column_name: String,
    pub function_type: FunctionType,
    pub function_category: FunctionCategory,
    #[serde(default)]
    pub formula: String,
    #[serde(default)]
    pub source_columns: Vec<String>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl Transformation {
    pub fn new(
        name: impl Into<String>,
        column_name: impl Into<String>,
        function_type: FunctionType,
        source_columns: Vec<String>,
        parameters: Map<String, Value>,
    ) -> Self {
        let formula = format!("{}({})", function_type.name(), source_columns.join(", "));
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            column_name: column_name.into(),
            function_type,
            function_category: function_type.category(),
            formula,
            source_columns,
            parameters,
        }
    }
}

/// Per-dataset selection inside a data collection phase. `dataset_id` references the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelectedDatasetConfig {
    pub dataset_id: String,
    #[serde(default)]
    pub selected_columns: BTreeSet<String>,
    #[serde(default)]
    pub column_types: BTreeMap<String, ColumnType>,
    #[serde(default)]
    pub transformations: Vec<Transformation>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Concat,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JoinKey {
    pub left: String,
    pub right: String,
}

/// Declared merge of two selected datasets. `join_keys` is ignored for `concat`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMerge {
    #[serde(default)]
    pub id: String,
    pub left_dataset_id: String,
    pub right_dataset_id: String,
    pub join_type: JoinType,
    #[serde(default)]
    pub join_keys: Vec<JoinKey>,
    pub output_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DataCollectionConfig {
    #[serde(default)]
    pub selected_datasets: Vec<SelectedDatasetConfig>,
    #[serde(default)]
    pub merges: Vec<DatasetMerge>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_function_type_deserializes() {
        let parsed: FunctionType = serde_json::from_str("\"PIVOT\"").unwrap();
        assert_eq!(parsed, FunctionType::Unknown);
        let parsed: FunctionType = serde_json::from_str("\"DATE_FORMAT\"").unwrap();
        assert_eq!(parsed, FunctionType::DateFormat);
    }

    #[test]
    fn test_new_transformation_derives_category_and_formula() {
        let t = Transformation::new(
            "Full name",
            "full_name",
            FunctionType::Concat,
            vec!["first".to_string(), "last".to_string()],
            Map::new(),
        );
        assert_eq!(t.function_category, FunctionCategory::Text);
        assert_eq!(t.formula, "CONCAT(first, last)");
        assert!(!t.id.is_empty());
    }
}
