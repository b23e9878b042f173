use super::{emit, open_editor};
use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct TemplatesArgs {
    #[command(subcommand)]
    pub command: TemplatesCommand,
}

#[derive(Debug, Subcommand)]
pub enum TemplatesCommand {
    /// List saved templates
    List,

    /// Save an export envelope as a template
    Save {
        /// Export envelope to read
        input: PathBuf,

        /// Template name
        #[arg(short, long)]
        name: String,

        /// Template description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Write a template out as an export envelope
    Apply {
        /// Template id
        id: String,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Delete a saved template
    Delete {
        /// Template id
        id: String,
    },
}

pub fn templates(args: TemplatesArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;

    match args.command {
        TemplatesCommand::List => {
            let editor = open_editor(&config, cwd, None)?;
            let templates = editor.templates();
            if templates.is_empty() {
                println!("{}", "⚠️  No templates found".yellow());
                return Ok(());
            }
            for template in templates {
                println!(
                    "  {} {} ({} blocks, {})",
                    template.id.bright_white(),
                    template.name,
                    template.blocks.len(),
                    template.created_at.format("%Y-%m-%d")
                );
                if let Some(description) = &template.description {
                    println!("      {}", description.dimmed());
                }
            }
        }
        TemplatesCommand::Save {
            input,
            name,
            description,
        } => {
            let mut editor = open_editor(&config, cwd, Some(&input))?;
            let template = editor.save_as_template(&name, description.as_deref())?;
            println!(
                "{} Saved template {} ({})",
                "✓".green(),
                template.name,
                template.id
            );
        }
        TemplatesCommand::Apply { id, out } => {
            let mut editor = open_editor(&config, cwd, None)?;
            editor.try_load_template(&id)?;
            let envelope = editor.export_json()?;
            if let Some(path) = emit(cwd, out.as_deref(), &envelope)? {
                println!("{} {} → {}", "✓".green(), id, path.display());
            }
        }
        TemplatesCommand::Delete { id } => {
            let mut editor = open_editor(&config, cwd, None)?;
            if !editor.delete_template(&id)? {
                return Err(anyhow!("Template not found: {}", id));
            }
            println!("{} Deleted template {}", "✓".green(), id);
        }
    }

    Ok(())
}
