//! Interactive setup wizard for folderfort configuration

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password};
use folderfort_core::{save_config, transport::normalize_base_url, ConfigFile, DEFAULT_BASE_URL};

/// Run the interactive setup wizard, starting from `config`
pub async fn run_init_wizard(mut config: ConfigFile) -> Result<()> {
    println!("🚀 Welcome to folderfort setup!\n");

    println!("You will need:");
    println!("  1. The API URL of your FolderFort region (e.g. {})", DEFAULT_BASE_URL);
    println!("  2. A personal API token\n");

    let base_url = prompt_base_url(&config.api.base_url)?;
    let api_token = prompt_api_token()?;
    let exclude_patterns = prompt_exclude_patterns(&config)?;

    // Summary
    println!("\n📋 Configuration summary:");
    println!("  API URL: {}", base_url);
    println!("  Token: {}", if api_token.is_some() { "set" } else { "from environment" });
    println!("  Exclude: {}", exclude_patterns.join(", "));

    let confirm = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Save this configuration?")
        .default(true)
        .interact()?;

    if !confirm {
        println!("❌ Configuration cancelled");
        return Ok(());
    }

    config.api.base_url = base_url;
    config.api.api_token = api_token;
    config.sync.exclude_patterns = exclude_patterns;

    let path = save_config(&config)?;

    println!("\n🎉 Setup complete!");
    println!("\nConfiguration saved to: {}", path.display());
    println!("\nYou can now use folderfort:");
    println!("  $ folderfort folder backups/2024");
    println!("  $ folderfort upload report.pdf --name docs/report.pdf --overwrite");
    println!("  $ folderfort sync ./project --folder project-backup");

    Ok(())
}

/// Prompt for the base API URL
fn prompt_base_url(current: &str) -> Result<String> {
    let input: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("API URL")
        .default(current.to_string())
        .validate_with(|input: &String| -> Result<(), String> {
            normalize_base_url(input).map(|_| ()).map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(|e| anyhow::anyhow!("Failed to get API URL: {}", e))?;

    Ok(normalize_base_url(&input)?)
}

/// Prompt for the API token; empty keeps it out of the file
fn prompt_api_token() -> Result<Option<String>> {
    let token = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("API token (leave empty to use FOLDERFORT_API_TOKEN)")
        .allow_empty_password(true)
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to get API token: {}", e))?;

    let token = token.trim().to_string();
    Ok(if token.is_empty() { None } else { Some(token) })
}

/// Prompt for the exclusion patterns as a comma-separated list
fn prompt_exclude_patterns(config: &ConfigFile) -> Result<Vec<String>> {
    let input: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Exclude patterns (comma-separated)")
        .default(config.sync.exclude_patterns.join(","))
        .allow_empty(true)
        .interact_text()
        .map_err(|e| anyhow::anyhow!("Failed to get exclude patterns: {}", e))?;

    Ok(parse_patterns(&input))
}

fn parse_patterns(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}
