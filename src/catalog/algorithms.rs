// Algorithm registry collaborator with the built-in algorithm set
use crate::models::{AlgorithmConfig, AlgorithmFamily, HyperParameterKind, HyperParameterSpec};
use serde_json::{json, Value};

pub trait AlgorithmRegistry: Send + Sync {
    fn get_by_family(&self, family: AlgorithmFamily) -> Vec<AlgorithmConfig>;
    fn get_config(&self, algorithm_type: &str) -> Option<AlgorithmConfig>;
}

fn spec(
    name: &str,
    kind: HyperParameterKind,
    default: Value,
    range: Option<(f64, f64)>,
    options: &[&str],
    description: &str,
) -> HyperParameterSpec {
    HyperParameterSpec {
        name: name.to_string(),
        kind,
        default,
        min: range.map(|r| r.0),
        max: range.map(|r| r.1),
        options: options.iter().map(|o| o.to_string()).collect(),
        description: description.to_string(),
    }
}

fn algorithm(
    algorithm_type: &str,
    name: &str,
    family: AlgorithmFamily,
    hyper_parameters: Vec<HyperParameterSpec>,
) -> AlgorithmConfig {
    AlgorithmConfig {
        algorithm_type: algorithm_type.to_string(),
        name: name.to_string(),
        family,
        hyper_parameters,
    }
}

pub struct BuiltinAlgorithms {
    algorithms: Vec<AlgorithmConfig>,
}

impl BuiltinAlgorithms {
    pub fn new() -> Self {
        use AlgorithmFamily::*;
        use HyperParameterKind::*;

        let algorithms = vec![
            algorithm(
                "random_forest",
                "Random Forest",
                Classification,
                vec![
                    spec("n_estimators", Integer, json!(100), Some((10.0, 1000.0)), &[], "Number of trees"),
                    spec("max_depth", Integer, json!(10), Some((1.0, 50.0)), &[], "Maximum tree depth"),
                    spec("criterion", Select, json!("gini"), None, &["gini", "entropy"], "Split quality measure"),
                ],
            ),
            algorithm(
                "logistic_regression",
                "Logistic Regression",
                Classification,
                vec![
                    spec("c", Float, json!(1.0), Some((0.001, 100.0)), &[], "Inverse regularisation strength"),
                    spec("max_iter", Integer, json!(100), Some((10.0, 10000.0)), &[], "Maximum iterations"),
                    spec("fit_intercept", Boolean, json!(true), None, &[], "Fit an intercept term"),
                ],
            ),
            algorithm(
                "gradient_boosting",
                "Gradient Boosting",
                Classification,
                vec![
                    spec("n_estimators", Integer, json!(100), Some((10.0, 1000.0)), &[], "Boosting stages"),
                    spec("learning_rate", Float, json!(0.1), Some((0.001, 1.0)), &[], "Shrinkage per stage"),
                    spec("max_depth", Integer, json!(3), Some((1.0, 20.0)), &[], "Maximum tree depth"),
                ],
            ),
            algorithm(
                "linear_regression",
                "Linear Regression",
                Regression,
                vec![spec("fit_intercept", Boolean, json!(true), None, &[], "Fit an intercept term")],
            ),
            algorithm(
                "random_forest_regressor",
                "Random Forest Regressor",
                Regression,
                vec![
                    spec("n_estimators", Integer, json!(100), Some((10.0, 1000.0)), &[], "Number of trees"),
                    spec("max_depth", Integer, json!(10), Some((1.0, 50.0)), &[], "Maximum tree depth"),
                ],
            ),
            algorithm(
                "kmeans",
                "K-Means",
                Clustering,
                vec![
                    spec("n_clusters", Integer, json!(8), Some((2.0, 100.0)), &[], "Number of clusters"),
                    spec("init", Select, json!("k-means++"), None, &["k-means++", "random"], "Initialisation method"),
                ],
            ),
            algorithm(
                "arima",
                "ARIMA",
                TimeSeries,
                vec![
                    spec("p", Integer, json!(1), Some((0.0, 10.0)), &[], "Autoregressive order"),
                    spec("d", Integer, json!(1), Some((0.0, 3.0)), &[], "Differencing order"),
                    spec("q", Integer, json!(1), Some((0.0, 10.0)), &[], "Moving average order"),
                ],
            ),
        ];

        Self { algorithms }
    }
}

impl Default for BuiltinAlgorithms {
    fn default() -> Self {
        Self::new()
    }
}

impl AlgorithmRegistry for BuiltinAlgorithms {
    fn get_by_family(&self, family: AlgorithmFamily) -> Vec<AlgorithmConfig> {
        self.algorithms
            .iter()
            .filter(|a| a.family == family)
            .cloned()
            .collect()
    }

    fn get_config(&self, algorithm_type: &str) -> Option<AlgorithmConfig> {
        self.algorithms
            .iter()
            .find(|a| a.algorithm_type == algorithm_type)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_family_has_algorithms() {
        let registry = BuiltinAlgorithms::new();
        for family in [
            AlgorithmFamily::Classification,
            AlgorithmFamily::Regression,
            AlgorithmFamily::Clustering,
            AlgorithmFamily::TimeSeries,
        ] {
            assert!(!registry.get_by_family(family).is_empty());
        }
    }

    #[test]
    fn test_defaults_fall_inside_ranges() {
        let registry = BuiltinAlgorithms::new();
        for algorithm in &registry.algorithms {
            for param in &algorithm.hyper_parameters {
                if let (Some(min), Some(max), Some(default)) = (param.min, param.max, param.default.as_f64()) {
                    assert!(min <= default && default <= max, "{}.{}", algorithm.algorithm_type, param.name);
                }
            }
        }
        assert!(registry.get_config("svm").is_none());
    }
}
