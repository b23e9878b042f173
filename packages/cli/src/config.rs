use playbook_common::FileStore;
use playbook_editor::settings::DEFAULT_USER_ID;
use playbook_editor::{EditorOptions, EditorSettings, History};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "playbook.config.json";

/// Playbook configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding templates and playbooks, one JSON file per key
    #[serde(default = "default_store_dir")]
    pub store_dir: String,

    /// Author stamped on edits made through the CLI
    #[serde(default = "default_user_id")]
    pub user_id: String,

    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Editor settings; missing fields take their defaults
    #[serde(default)]
    pub settings: EditorSettings,
}

fn default_store_dir() -> String {
    ".playbook".to_string()
}

fn default_user_id() -> String {
    DEFAULT_USER_ID.to_string()
}

fn default_history_limit() -> usize {
    History::DEFAULT_MAX_SIZE
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    /// Get absolute path to the store directory
    pub fn get_store_dir(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.store_dir)
    }

    pub fn store(&self, cwd: &str) -> FileStore {
        FileStore::new(self.get_store_dir(cwd))
    }

    pub fn editor_options(&self) -> EditorOptions {
        let mut settings = self.settings.clone();
        // The CLI runs one command and exits
        settings.enable_auto_save = false;
        EditorOptions {
            user_id: self.user_id.clone(),
            history_limit: self.history_limit,
            settings,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            user_id: default_user_id(),
            history_limit: default_history_limit(),
            settings: EditorSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "storeDir": "playbooks",
            "userId": "ana",
            "historyLimit": 20,
            "settings": { "fontSize": 14, "theme": "dark" }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.store_dir, "playbooks");
        assert_eq!(config.user_id, "ana");
        assert_eq!(config.history_limit, 20);
        assert_eq!(config.settings.font_size, 14);
        assert!(config.settings.enable_comments);
    }

    #[test]
    fn test_default_config() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.store_dir, ".playbook");
        assert_eq!(config.history_limit, 100);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().display().to_string()).unwrap();
        assert_eq!(config, Config::default());
        assert!(!config.editor_options().settings.enable_auto_save);
    }
}
