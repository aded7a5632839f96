//! Phase configuration persistence

pub mod backend;
pub mod phase_store;
pub mod registry;

pub use backend::{ConfigBackend, JsonFileBackend, MemoryBackend, RawEntries};
pub use phase_store::PhaseConfigStore;
pub use registry::StoreRegistry;
