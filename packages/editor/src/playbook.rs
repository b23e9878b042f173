//! # Playbook Aggregate
//!
//! The document as a publishable unit: caller-supplied metadata plus
//! statistics computed from the current blocks.

use chrono::{DateTime, Utc};
use playbook_common::{write_json, KeyValueStore};
use playbook_model::BlockId;
use serde::{Deserialize, Serialize};

pub const WORDS_PER_MINUTE: usize = 200;
pub const DEFAULT_TITLE: &str = "Novo Playbook";
pub const DEFAULT_CATEGORY: &str = "geral";
pub const DEFAULT_ID: &str = "new-playbook";

/// Minutes, rounded up
pub fn reading_time(words: usize) -> usize {
    words.div_ceil(WORDS_PER_MINUTE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Team,
    Public,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybookSettings {
    pub allow_comments: bool,
    pub allow_suggestions: bool,
    pub allow_copy: bool,
    pub allow_export: bool,
    pub require_approval: bool,
    pub enable_versioning: bool,
    pub enable_analytics: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Default for PlaybookSettings {
    fn default() -> Self {
        Self {
            allow_comments: true,
            allow_suggestions: true,
            allow_copy: true,
            allow_export: true,
            require_approval: false,
            enable_versioning: true,
            enable_analytics: true,
            custom_domain: None,
            expires_at: None,
        }
    }
}

/// Counts gathered from the editor at build time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    pub block_count: usize,
    pub word_count: usize,
    pub image_count: usize,
    pub video_count: usize,
    pub file_count: usize,
    pub comment_count: usize,
    pub suggestion_count: usize,
    pub collaborator_count: usize,
}

impl DocumentStats {
    pub fn reading_time(&self) -> usize {
        reading_time(self.word_count)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybookMetadata {
    pub word_count: usize,
    pub reading_time: usize,
    pub last_edited_by: String,
    pub block_count: usize,
    pub image_count: usize,
    pub video_count: usize,
    pub file_count: usize,
    pub comment_count: usize,
    pub suggestion_count: usize,
    pub collaborator_count: usize,
    pub view_count: usize,
    pub share_count: usize,
    pub copy_count: usize,
    pub export_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playbook {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    pub blocks: Vec<BlockId>,
    pub tags: Vec<String>,
    pub category: String,
    pub visibility: Visibility,
    pub template: bool,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub last_edited_by: String,
    pub collaborators: Vec<String>,
    pub settings: PlaybookSettings,
    pub metadata: PlaybookMetadata,
}

/// Caller-supplied playbook fields; anything left out gets a default
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaybookDraft {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub cover: Option<String>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub visibility: Option<Visibility>,
    pub template: bool,
    pub version: Option<u32>,
    pub created_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub collaborators: Vec<String>,
    pub settings: Option<PlaybookSettings>,
}

impl PlaybookDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn build(
        self,
        blocks: Vec<BlockId>,
        stats: DocumentStats,
        user: &str,
        now: DateTime<Utc>,
    ) -> Playbook {
        Playbook {
            id: self.id.unwrap_or_else(|| DEFAULT_ID.to_string()),
            title: self.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: self.description,
            icon: self.icon,
            cover: self.cover,
            blocks,
            tags: self.tags,
            category: self.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            visibility: self.visibility.unwrap_or_default(),
            template: self.template,
            version: self.version.unwrap_or(1),
            created_at: self.created_at.unwrap_or(now),
            updated_at: now,
            created_by: self.created_by.unwrap_or_else(|| user.to_string()),
            last_edited_by: user.to_string(),
            collaborators: self.collaborators,
            settings: self.settings.unwrap_or_default(),
            metadata: PlaybookMetadata {
                word_count: stats.word_count,
                reading_time: stats.reading_time(),
                last_edited_by: user.to_string(),
                block_count: stats.block_count,
                image_count: stats.image_count,
                video_count: stats.video_count,
                file_count: stats.file_count,
                comment_count: stats.comment_count,
                suggestion_count: stats.suggestion_count,
                collaborator_count: stats.collaborator_count,
                view_count: 0,
                share_count: 0,
                copy_count: 0,
                export_count: 0,
            },
        }
    }
}

pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// Where saved and published playbooks go
pub trait PlaybookSink {
    fn save(&mut self, playbook: &Playbook) -> Result<(), SinkError>;
}

impl PlaybookSink for Vec<Playbook> {
    fn save(&mut self, playbook: &Playbook) -> Result<(), SinkError> {
        self.push(playbook.clone());
        Ok(())
    }
}

/// Writes each playbook under `playbook-{id}`
pub struct StoreSink<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> StoreSink<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    pub fn key_for(id: &str) -> String {
        format!("playbook-{}", id)
    }
}

impl PlaybookSink for StoreSink<'_> {
    fn save(&mut self, playbook: &Playbook) -> Result<(), SinkError> {
        write_json(self.store, &Self::key_for(&playbook.id), playbook)?;
        Ok(())
    }
}
