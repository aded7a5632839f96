// Data models (structs)
pub mod dataset;
pub mod evaluation;
pub mod job;
pub mod modeling;
pub mod optimization;
pub mod phase;
pub mod phase_config;
pub mod production;
pub mod settings;

pub use dataset::*;
pub use evaluation::*;
pub use job::*;
pub use modeling::*;
pub use optimization::*;
pub use phase::*;
pub use phase_config::*;
pub use production::*;
pub use settings::*;
