// Dataset catalog collaborator
use crate::models::CatalogEntry;
use parking_lot::RwLock;

pub trait DatasetCatalog: Send + Sync {
    /// Datasets ready for selection.
    fn list_ready(&self) -> Vec<CatalogEntry>;

    fn get(&self, dataset_id: &str) -> Option<CatalogEntry> {
        self.list_ready().into_iter().find(|d| d.id == dataset_id)
    }
}

/// In-memory catalog, populated by the embedding application.
#[derive(Default)]
pub struct StaticCatalog {
    entries: RwLock<Vec<CatalogEntry>>,
}

impl StaticCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Insert or replace by id.
    pub fn upsert(&self, entry: CatalogEntry) {
        let mut entries = self.entries.write();
        match entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
    }
}

impl DatasetCatalog for StaticCatalog {
    fn list_ready(&self) -> Vec<CatalogEntry> {
        self.entries.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, name: &str) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            name: name.to_string(),
            schema: vec![],
            row_count: 0,
            preview: vec![],
        }
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let catalog = StaticCatalog::new(vec![entry("d1", "old")]);
        catalog.upsert(entry("d1", "new"));
        catalog.upsert(entry("d2", "other"));
        assert_eq!(catalog.list_ready().len(), 2);
        assert_eq!(catalog.get("d1").map(|d| d.name), Some("new".to_string()));
        assert!(catalog.get("d3").is_none());
    }
}
