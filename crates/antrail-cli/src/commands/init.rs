//! Write a default antrail.toml.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::{Config, CONFIG_FILE};

pub fn run(path: Option<String>) -> Result<()> {
    let base_path = match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir().context("Cannot read current directory")?,
    };

    println!("{} Initializing Antrail project...", "→".blue());

    std::fs::create_dir_all(&base_path)
        .with_context(|| format!("Failed to create {}", base_path.display()))?;

    let config_path = base_path.join(CONFIG_FILE);
    if !config_path.exists() {
        Config::default().save(&config_path)?;
        println!("  {} Created {}", "✓".green(), config_path.display());
    } else {
        println!("  {} {} already exists", "•".yellow(), config_path.display());
    }

    println!();
    println!("{} Antrail project initialized!", "✓".green().bold());
    println!();
    println!("Next steps:");
    println!("  {} antrail graph", "1.".blue());
    println!("  {} antrail optimize --start A --end B --output run.json", "2.".blue());
    println!("  {} antrail replay --trace run.json", "3.".blue());

    Ok(())
}
