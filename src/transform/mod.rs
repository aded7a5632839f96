//! Transformation DSL: row-level engine, preview composition, full-dataset
//! materialisation and merge previews.

pub mod aggregate;
pub mod engine;
pub mod merge;
pub mod preview;

pub use aggregate::{aggregate_column, materialize};
pub use engine::apply;
pub use merge::{preview_merge, validate_merge};
pub use preview::{build_preview, preview_rows, PreviewColumn, PreviewTable};
