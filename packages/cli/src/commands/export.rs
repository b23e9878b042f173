use super::{emit, open_editor};
use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Export envelope to read
    pub input: PathBuf,

    /// Output format (json, markdown)
    #[arg(short, long, default_value = "markdown")]
    pub format: String,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub fn export(args: ExportArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let editor = open_editor(&config, cwd, Some(&args.input))?;

    let content = match args.format.as_str() {
        "markdown" | "md" => editor.export_markdown(),
        "json" => editor.export_json()?,
        other => {
            return Err(anyhow!(
                "Invalid format: {}. Use: json or markdown",
                other
            ))
        }
    };

    if let Some(path) = emit(cwd, args.out.as_deref(), &content)? {
        println!(
            "{} {} blocks → {}",
            "✓".green(),
            editor.block_count(),
            path.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use playbook_common::MemoryStore;
    use playbook_editor::{BlockPatch, BlockType, EditorService};
    use serde_json::json;
    use std::fs;

    #[test]
    fn test_export_markdown_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = dir.path().display().to_string();

        let mut editor = EditorService::new(Config::default().editor_options(), MemoryStore::new());
        let title = BlockPatch::from_value(json!({ "content": [{ "type": "text", "text": "Deploy" }] }))
            .unwrap();
        editor
            .create_block(BlockType::Heading1, Some(&title), None)
            .unwrap();
        fs::write(dir.path().join("doc.json"), editor.export_json().unwrap()).unwrap();

        export(
            ExportArgs {
                input: PathBuf::from("doc.json"),
                format: "markdown".to_string(),
                out: Some(PathBuf::from("out/doc.md")),
            },
            &cwd,
        )
        .unwrap();

        let markdown = fs::read_to_string(dir.path().join("out/doc.md")).unwrap();
        assert_eq!(markdown, "# Deploy");
    }

    #[test]
    fn test_rejects_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = dir.path().display().to_string();
        fs::write(dir.path().join("doc.json"), r#"{"blocks": {}}"#).unwrap();

        let result = export(
            ExportArgs {
                input: PathBuf::from("doc.json"),
                format: "pdf".to_string(),
                out: None,
            },
            &cwd,
        );
        assert!(result.is_err());
    }
}
