// One store per project, shared so that all writers of a project use the same lock

use super::backend::ConfigBackend;
use super::phase_store::PhaseConfigStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

pub struct StoreRegistry {
    backend: Arc<dyn ConfigBackend>,
    stores: Mutex<HashMap<String, Arc<PhaseConfigStore>>>,
}

impl StoreRegistry {
    pub fn new(backend: Arc<dyn ConfigBackend>) -> Self {
        Self {
            backend,
            stores: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self, project_id: &str) -> Arc<PhaseConfigStore> {
        self.stores
            .lock()
            .entry(project_id.to_string())
            .or_insert_with(|| Arc::new(PhaseConfigStore::new(project_id, self.backend.clone())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;

    #[test]
    fn test_same_project_shares_one_store() {
        let registry = StoreRegistry::new(Arc::new(MemoryBackend::new()));
        let a = registry.store("alpha");
        let b = registry.store("alpha");
        let c = registry.store("beta");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(c.project_id(), "beta");
    }
}
