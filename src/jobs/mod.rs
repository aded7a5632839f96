pub mod engine;
pub mod lifecycle;
pub mod selection;
pub mod simulate;

pub use engine::*;
pub use lifecycle::{fail, transition, Job, JobHost};
pub use selection::*;
pub use simulate::*;
