// File persistence helpers
pub mod json_ops;

pub use json_ops::*;
