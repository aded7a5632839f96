// Filesystem layout helpers
pub mod paths;

pub use paths::*;
