// External collaborators: dataset catalog and algorithm registry
pub mod algorithms;
pub mod datasets;

pub use algorithms::{AlgorithmRegistry, BuiltinAlgorithms};
pub use datasets::{DatasetCatalog, StaticCatalog};
