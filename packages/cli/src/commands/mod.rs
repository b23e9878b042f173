pub mod export;
pub mod init;
pub mod stats;
pub mod templates;

pub use export::{export, ExportArgs};
pub use init::{init, InitArgs};
pub use stats::{stats, StatsArgs};
pub use templates::{templates, TemplatesArgs};

use crate::config::Config;
use anyhow::{Context, Result};
use playbook_editor::EditorService;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// An editor over the configured store, optionally loaded from an export
/// envelope
pub(crate) fn open_editor(config: &Config, cwd: &str, input: Option<&Path>) -> Result<EditorService> {
    let mut editor = EditorService::new(config.editor_options(), config.store(cwd));
    if let Some(input) = input {
        let path = resolve(cwd, input);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        editor
            .import_json(&json)
            .with_context(|| format!("Cannot import {}", path.display()))?;
        debug!(path = %path.display(), blocks = editor.block_count(), "Loaded export envelope");
    }
    Ok(editor)
}

/// Write `content` to `out`, or stdout when absent
pub(crate) fn emit(cwd: &str, out: Option<&Path>, content: &str) -> Result<Option<PathBuf>> {
    match out {
        Some(out) => {
            let path = resolve(cwd, out);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, content)?;
            Ok(Some(path))
        }
        None => {
            println!("{}", content);
            Ok(None)
        }
    }
}

fn resolve(cwd: &str, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        PathBuf::from(cwd).join(path)
    }
}
