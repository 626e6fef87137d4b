//! Command handlers for the folderfort CLI

use crate::wizard::run_init_wizard;
use crate::SyncArgs;
use anyhow::{Context, Result};
use clap::Command;
use clap_complete::{generate, Shell as ClapShell};
use console::style;
use folderfort_core::{
    get_config_path, guess_mime_type, load_config, validate_config, ConfigFile, DriveClient,
    EntryId, ExclusionSet, LeakyBucket, SyncReport, TOKEN_ENV_VAR,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tabled::{Table, Tabled};
use tokio_util::sync::CancellationToken;

/// Connection settings given on the command line
#[derive(Debug, Default)]
pub struct Connection {
    pub url: Option<String>,
    pub token: Option<String>,
}

/// Build a client from command-line overrides and the configuration file
fn build_client(
    connection: &Connection,
    config: &ConfigFile,
    cancel: Option<CancellationToken>,
) -> Result<DriveClient> {
    let base_url = connection
        .url
        .clone()
        .unwrap_or_else(|| config.api.base_url.clone());

    let api_token = connection
        .token
        .clone()
        .or_else(|| config.api_token())
        .ok_or_else(|| anyhow::anyhow!(
            "API token required.\n\
             Set {} or run 'folderfort init'.",
            TOKEN_ENV_VAR
        ))?;

    tracing::debug!(%base_url, "using API");

    let client = DriveClient::connect_with_timeout(&base_url, api_token, config.timeout())?;
    Ok(match cancel {
        Some(token) => client.with_cancellation(token),
        None => client,
    })
}

/// Cancellation token tripped by Ctrl-C
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, aborting after the current request...");
            trigger.cancel();
        }
    });
    token
}

fn spinner(message: String) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

/// Handle init command
pub async fn handle_init(config: ConfigFile) -> Result<()> {
    run_init_wizard(config).await
}

/// Handle config commands
pub async fn handle_config(action: &str, config: &ConfigFile) -> Result<()> {
    match action {
        "show" => {
            println!("Current configuration:");
            println!();

            println!("API:");
            println!("  Base URL: {}", config.api.base_url);
            println!(
                "  Token: {}",
                match config.api_token() {
                    Some(token) => mask_token(&token),
                    None => "not set".to_string(),
                }
            );
            println!("  Timeout: {}s", config.api.timeout);
            println!();
            println!("Sync:");
            println!("  Exclude: {}", config.sync.exclude_patterns.join(", "));
            println!("  Max file size: {}", format_bytes(config.sync.max_file_size));
            println!("  Upload interval: {}ms", config.sync.upload_interval_ms);

            Ok(())
        }
        "validate" => {
            println!("Validating configuration...");

            let config = load_config()?;
            validate_config(&config)?;
            println!("  ✅ Valid configuration format");

            if config.api_token().is_none() {
                println!("  ⚠️  No API token configured (set {})", TOKEN_ENV_VAR);
            }

            Ok(())
        }
        "path" => {
            println!("{}", get_config_path()?.display());
            Ok(())
        }
        _ => {
            println!("Unknown action: {}", action);
            println!("Available actions: show, validate, path");
            Ok(())
        }
    }
}

/// Handle folder command
pub async fn handle_folder(
    connection: &Connection,
    config: &ConfigFile,
    path: &str,
    parent: Option<EntryId>,
) -> Result<()> {
    let client = build_client(connection, config, Some(cancel_on_ctrl_c()))?;

    let pb = spinner(format!("Resolving folder '{}'...", path))?;
    let result = client.get_or_create_folder(path, parent).await;
    pb.finish_and_clear();

    let id = result.with_context(|| format!("Failed to get or create folder '{}'", path))?;
    println!("  ✅ Folder '{}' id: {}", path, style(id).bold());

    Ok(())
}

/// Handle upload command
pub async fn handle_upload(
    connection: &Connection,
    config: &ConfigFile,
    file: &Path,
    name: Option<&str>,
    parent: Option<EntryId>,
    overwrite: bool,
) -> Result<()> {
    if !file.is_file() {
        return Err(anyhow::anyhow!("File not found: {}", file.display()));
    }

    let client = build_client(connection, config, Some(cancel_on_ctrl_c()))?;
    let file_size = file.metadata()?.len();

    println!("Uploading {}...", file.display());
    println!("  Size: {}", format_bytes(file_size));

    let pb = spinner("Uploading...".to_string())?;
    let result = match name {
        Some(name) => {
            let content = tokio::fs::File::open(file).await?;
            let mime_type = guess_mime_type(Path::new(name));
            client
                .upload_file(name, content, &mime_type, parent, overwrite)
                .await
        }
        None => client.upload_file_from_path(file, parent, overwrite).await,
    };
    pb.finish_and_clear();

    result.with_context(|| format!("Failed to upload {}", file.display()))?;
    println!("  ✅ Upload complete");

    Ok(())
}

/// Handle sync command
pub async fn handle_sync(connection: &Connection, config: &ConfigFile, args: SyncArgs) -> Result<()> {
    if !args.dir.is_dir() {
        return Err(anyhow::anyhow!("Directory not found: {}", args.dir.display()));
    }

    let client = build_client(connection, config, Some(cancel_on_ctrl_c()))?;

    let mut options = config.sync.sync_options();
    if args.no_default_excludes {
        options.exclude = ExclusionSet::empty();
    }
    options.exclude.extend(args.exclude);
    if let Some(max_size) = args.max_size {
        options.max_file_size = max_size;
    }

    let interval = args
        .interval_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.sync.upload_interval());
    let limiter = LeakyBucket::new(interval);

    let mut parent = args.parent;
    if let Some(folder) = args.folder.as_deref() {
        let id = client
            .create_folder(folder.trim(), parent)
            .await
            .with_context(|| format!("Failed to create parent folder '{}'", folder))?;
        println!("Created folder '{}' (id: {})", folder, id);
        parent = Some(id);
    }

    println!("Uploading directory: {}", args.dir.display());
    if !options.exclude.patterns().is_empty() {
        println!("  Excluding: {}", options.exclude.patterns().join(", "));
    }

    let report = client
        .upload_directory(&args.dir, parent, &options, &limiter)
        .await
        .with_context(|| format!("Failed to upload directory {}", args.dir.display()))?;

    println!();
    println!("{}", style("Done.").green().bold());
    println!("{}", summary_table(&report));

    Ok(())
}

fn summary_table(report: &SyncReport) -> Table {
    #[derive(Tabled)]
    struct SummaryRow {
        item: &'static str,
        count: String,
    }

    let rows = vec![
        SummaryRow {
            item: "Folders",
            count: report.folders_resolved.to_string(),
        },
        SummaryRow {
            item: "Files uploaded",
            count: report.files_uploaded.to_string(),
        },
        SummaryRow {
            item: "Bytes uploaded",
            count: format_bytes(report.bytes_uploaded),
        },
        SummaryRow {
            item: "Skipped (too large)",
            count: report.skipped_oversize.to_string(),
        },
        SummaryRow {
            item: "Excluded",
            count: report.excluded.to_string(),
        },
    ];

    Table::new(rows)
}

/// Keep only the first and last characters of a secret
fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        "********".to_string()
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

/// Format bytes to human-readable size
fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

/// Handle shell completion generation
pub async fn handle_completion(shell: &str, cmd: &mut Command) -> Result<()> {
    use std::io;

    let clap_shell = match shell {
        "bash" => ClapShell::Bash,
        "zsh" => ClapShell::Zsh,
        "fish" => ClapShell::Fish,
        "elvish" => ClapShell::Elvish,
        "powershell" | "pwsh" => ClapShell::PowerShell,
        _ => {
            return Err(anyhow::anyhow!(
                "Unsupported shell: {}\nSupported shells: bash, zsh, fish, elvish, powershell",
                shell
            ));
        }
    };

    generate(clap_shell, cmd, "folderfort", &mut io::stdout());

    Ok(())
}
