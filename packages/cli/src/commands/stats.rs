use super::open_editor;
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Export envelope to inspect
    pub input: PathBuf,

    /// Print the statistics as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn stats(args: StatsArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let editor = open_editor(&config, cwd, Some(&args.input))?;
    let stats = editor.stats();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "📊 Playbook statistics".bright_blue().bold());
    println!("  Blocks:       {}", stats.block_count);
    println!("  Root blocks:  {}", editor.root_blocks().len());
    println!("  Words:        {}", stats.word_count);
    println!("  Reading time: {} min", stats.reading_time());
    println!("  Images:       {}", stats.image_count);
    println!("  Videos:       {}", stats.video_count);
    println!("  Files:        {}", stats.file_count);
    Ok(())
}
