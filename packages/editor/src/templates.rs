//! # Document Templates
//!
//! Saved snapshots of a whole document, kept as one JSON list under
//! [`TEMPLATES_KEY`].

use chrono::{DateTime, Utc};
use playbook_common::{read_json, write_json, KeyValueStore, StorageResult};
use playbook_model::BlockMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const TEMPLATES_KEY: &str = "playbook-templates";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTemplate {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub blocks: BlockMap,
    pub created_at: DateTime<Utc>,
}

impl DocumentTemplate {
    pub fn new(name: impl Into<String>, description: Option<String>, blocks: BlockMap) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            name: name.into(),
            description,
            blocks,
            created_at: Utc::now(),
        }
    }
}

/// Template list on top of a key-value store
pub struct TemplateLibrary<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> TemplateLibrary<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    pub fn try_list(&self) -> StorageResult<Vec<DocumentTemplate>> {
        Ok(read_json(self.store, TEMPLATES_KEY)?.unwrap_or_default())
    }

    /// Every saved template; an unreadable list reads as empty
    pub fn list(&self) -> Vec<DocumentTemplate> {
        self.try_list().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read templates");
            Vec::new()
        })
    }

    pub fn find(&self, id: &str) -> Option<DocumentTemplate> {
        self.list().into_iter().find(|template| template.id == id)
    }

    pub fn save(&self, template: DocumentTemplate) -> StorageResult<()> {
        let mut templates = self.list();
        templates.push(template);
        write_json(self.store, TEMPLATES_KEY, &templates)
    }

    /// Returns false when no template had that id
    pub fn delete(&self, id: &str) -> StorageResult<bool> {
        let mut templates = self.list();
        let before = templates.len();
        templates.retain(|template| template.id != id);
        if templates.len() == before {
            return Ok(false);
        }
        write_json(self.store, TEMPLATES_KEY, &templates)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playbook_common::MemoryStore;

    #[test]
    fn test_save_find_delete() {
        let store = MemoryStore::new();
        let library = TemplateLibrary::new(&store);

        let template = DocumentTemplate::new("Onboarding", Some("day one".into()), BlockMap::new());
        let id = template.id.clone();
        library.save(template).unwrap();
        library
            .save(DocumentTemplate::new("Other", None, BlockMap::new()))
            .unwrap();

        assert_eq!(library.list().len(), 2);
        assert_eq!(library.find(&id).unwrap().name, "Onboarding");

        assert!(library.delete(&id).unwrap());
        assert!(!library.delete(&id).unwrap());
        assert!(library.find(&id).is_none());
    }

    #[test]
    fn test_corrupt_list_reads_empty() {
        let store = MemoryStore::new();
        store.set(TEMPLATES_KEY, "not json").unwrap();

        let library = TemplateLibrary::new(&store);
        assert!(library.list().is_empty());
        assert!(library.try_list().is_err());
    }
}
