//! Editor settings and constructor options.

use crate::errors::{EditorError, EditorResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_USER_ID: &str = "current-user";
pub const DEFAULT_AUTO_SAVE_INTERVAL_MS: u64 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Auto,
}

/// Serialized camelCase; missing fields take their defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorSettings {
    pub theme: Theme,
    pub font_size: u32,
    pub font_family: String,
    pub line_height: f64,
    pub show_block_handles: bool,
    pub show_line_numbers: bool,
    pub enable_spell_check: bool,
    pub enable_auto_save: bool,
    /// Milliseconds
    pub auto_save_interval: u64,
    pub enable_collaboration: bool,
    pub enable_comments: bool,
    pub enable_version_history: bool,
    /// Bytes
    pub max_file_size: u64,
    pub allowed_file_types: Vec<String>,
    #[serde(rename = "customCSS", skip_serializing_if = "Option::is_none")]
    pub custom_css: Option<String>,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            font_size: 16,
            font_family: "Inter, sans-serif".to_string(),
            line_height: 1.6,
            show_block_handles: true,
            show_line_numbers: false,
            enable_spell_check: true,
            enable_auto_save: true,
            auto_save_interval: DEFAULT_AUTO_SAVE_INTERVAL_MS,
            enable_collaboration: false,
            enable_comments: true,
            enable_version_history: true,
            max_file_size: 10 * 1024 * 1024,
            allowed_file_types: [
                "image/*", "video/*", "audio/*", ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt",
                ".pptx",
            ]
            .iter()
            .map(|t| t.to_string())
            .collect(),
            custom_css: None,
        }
    }
}

impl EditorSettings {
    /// Merge the fields present in `partial` over these settings
    pub fn overlay(&self, partial: &Value) -> EditorResult<Self> {
        let Value::Object(fields) = partial else {
            return Err(EditorError::InvalidFormat(
                "settings must be a JSON object".to_string(),
            ));
        };

        let mut merged = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        for (key, value) in fields {
            merged.insert(key.clone(), value.clone());
        }

        serde_json::from_value(Value::Object(merged))
            .map_err(|e| EditorError::InvalidFormat(format!("invalid settings: {}", e)))
    }

    pub fn auto_save_due(&self) -> bool {
        self.enable_auto_save && self.auto_save_interval > 0
    }
}

/// Passed to [`crate::EditorService::new`]
#[derive(Debug, Clone)]
pub struct EditorOptions {
    pub user_id: String,
    /// 0 keeps every operation
    pub history_limit: usize,
    pub settings: EditorSettings,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            user_id: DEFAULT_USER_ID.to_string(),
            history_limit: crate::history::History::DEFAULT_MAX_SIZE,
            settings: EditorSettings::default(),
        }
    }
}
