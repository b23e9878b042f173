use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Store directory for templates and playbooks
    #[arg(short, long, default_value = ".playbook")]
    pub store_dir: String,

    /// Author recorded on edits
    #[arg(short, long)]
    pub user_id: Option<String>,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!(
        "{}",
        "📝 Initializing Playbook workspace...".bright_blue().bold()
    );

    let mut config = Config {
        store_dir: args.store_dir.clone(),
        ..Config::default()
    };
    if let Some(user_id) = args.user_id {
        config.user_id = user_id;
    }

    let store_dir = config.get_store_dir(cwd);
    if !store_dir.exists() {
        fs::create_dir_all(&store_dir)?;
        println!("  {} Created {}/", "✓".green(), args.store_dir);
    }

    // Write config file
    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Workspace initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Export a playbook from the editor as JSON");
    println!("  2. Run: playbook templates save playbook.json --name \"My template\"");
    println!("  3. Run: playbook export playbook.json --format markdown");

    Ok(())
}
