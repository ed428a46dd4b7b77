//! Test KB manager
//!
//! Provides isolated knowledge-base stores for testing: each test gets a
//! temp-directory SQLite store, seeds it through the ingestion writer, and
//! opens read-only accessors on top. The store is deleted when the manager
//! drops.

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use tabsem_core::{EntityRecord, KbStoreWriter, KnowledgeBase, WikidataKb};

/// Manager for per-test KB stores.
///
/// # Example
///
/// ```rust,ignore
/// let mut kb = TestKbManager::new();
/// kb.put("Q90", paris_record());
/// let accessor = kb.accessor();
/// ```
pub struct TestKbManager {
    writer: KbStoreWriter,
    db_path: PathBuf,
    /// Kept alive so the temp directory survives the test.
    _temp_dir: TempDir,
}

impl TestKbManager {
    /// Create an empty store in a fresh temp directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test_kb.db");
        let writer = KbStoreWriter::create(&db_path).expect("Failed to create test KB store");
        Self {
            writer,
            db_path,
            _temp_dir: temp_dir,
        }
    }

    /// Seed one entity record.
    pub fn put(&self, entity_id: &str, record: EntityRecord) {
        self.writer
            .put(entity_id, &record)
            .expect("Failed to seed test KB record");
    }

    /// Open a shared read-only Wikidata accessor over the seeded store.
    pub fn accessor(&self) -> Arc<dyn KnowledgeBase> {
        Arc::new(WikidataKb::open(Some(self.db_path.clone())).expect("Failed to open test KB"))
    }

    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }
}

impl Default for TestKbManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_records_are_readable() {
        let kb = TestKbManager::new();
        kb.put(
            "Q42",
            EntityRecord {
                labels: vec!["Douglas Adams".into()],
                ..Default::default()
            },
        );
        let accessor = kb.accessor();
        let labels = accessor.labels("Q42").unwrap();
        assert_eq!(labels.label.as_deref(), Some("Douglas Adams"));
    }
}
