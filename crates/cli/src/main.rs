use anyhow::Result;
use clap::{CommandFactory, Parser};
use color_eyre::config::HookBuilder;
use folderfort_core::{load_config_or_default, ConfigFile, EntryId};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod handlers;
mod wizard;

/// folderfort - upload files and mirror directories to a FolderFort drive
#[derive(Parser, Debug)]
#[command(name = "folderfort")]
#[command(version)]
#[command(about = "Upload files and mirror local directories to a FolderFort drive", long_about = None)]
struct Cli {
    /// Base API URL (https://<host>/api/v1)
    #[arg(long, global = true, env = "FOLDERFORT_API_URL")]
    url: Option<String>,

    /// API token
    #[arg(long, global = true, env = "FOLDERFORT_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Interactive first-time setup
    Init,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Get or create a folder, creating missing parents
    Folder {
        /// Folder path, e.g. backups/2024/photos
        path: String,
        /// Parent folder ID (defaults to the drive root)
        #[arg(short, long)]
        parent: Option<EntryId>,
    },

    /// Upload a single file
    Upload {
        /// Local file to upload
        file: PathBuf,
        /// Remote name, may include parent folders (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,
        /// Parent folder ID (defaults to the drive root)
        #[arg(short, long)]
        parent: Option<EntryId>,
        /// Replace entries with the same name first
        #[arg(long)]
        overwrite: bool,
    },

    /// Mirror a local directory onto the drive
    Sync(SyncArgs),

    /// Shell completion
    Completion {
        /// Shell type (bash, zsh, fish, elvish, powershell)
        shell: String,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Show the current configuration
    Show,
    /// Validate the configuration file
    Validate,
    /// Print the configuration file path
    Path,
}

#[derive(clap::Args, Debug)]
pub struct SyncArgs {
    /// Local directory to upload
    #[arg(default_value = ".")]
    pub dir: PathBuf,
    /// Create a new folder with this name and upload into it
    #[arg(short, long)]
    pub folder: Option<String>,
    /// Parent folder ID (defaults to the drive root)
    #[arg(short, long)]
    pub parent: Option<EntryId>,
    /// Extra substring pattern to exclude (repeatable)
    #[arg(short, long = "exclude", value_name = "PATTERN")]
    pub exclude: Vec<String>,
    /// Do not apply the configured exclusion patterns
    #[arg(long)]
    pub no_default_excludes: bool,
    /// Minimum delay between uploads in milliseconds
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,
    /// Skip files larger than this many bytes
    #[arg(long, value_name = "BYTES")]
    pub max_size: Option<u64>,
}

/// Commands that talk to the drive need a readable configuration; the others
/// fall back to defaults so a broken file can still be inspected or rewritten.
fn config_for(command: &Commands, loaded: folderfort_core::Result<ConfigFile>) -> Result<ConfigFile> {
    match (command, loaded) {
        (_, Ok(config)) => Ok(config),
        (Commands::Init | Commands::Config { .. } | Commands::Completion { .. }, Err(err)) => {
            eprintln!("Warning: {}, using defaults", err);
            Ok(ConfigFile::default())
        }
        (_, Err(err)) => Err(err.into()),
    }
}

fn init_tracing(verbose: bool, configured_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { configured_level };
        EnvFilter::new(format!("warn,folderfort={level},folderfort_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup error handling
    if let Err(e) = HookBuilder::default().install() {
        eprintln!("Warning: Failed to install error handler: {}", e);
    }

    // Parse CLI arguments
    let cli = Cli::parse();

    let config = config_for(&cli.command, load_config_or_default())?;
    init_tracing(cli.verbose, &config.logging.level);

    let connection = handlers::Connection {
        url: cli.url,
        token: cli.token,
    };

    // Execute command
    match cli.command {
        Commands::Init => handlers::handle_init(config).await,
        Commands::Config { action } => {
            let action_str = match action {
                ConfigAction::Show => "show",
                ConfigAction::Validate => "validate",
                ConfigAction::Path => "path",
            };
            handlers::handle_config(action_str, &config).await
        }
        Commands::Folder { path, parent } => {
            handlers::handle_folder(&connection, &config, &path, parent).await
        }
        Commands::Upload {
            file,
            name,
            parent,
            overwrite,
        } => {
            handlers::handle_upload(&connection, &config, &file, name.as_deref(), parent, overwrite)
                .await
        }
        Commands::Sync(args) => handlers::handle_sync(&connection, &config, args).await,
        Commands::Completion { shell } => {
            handlers::handle_completion(&shell, &mut Cli::command()).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sync_args() {
        let cli = Cli::try_parse_from([
            "folderfort",
            "sync",
            "./site",
            "--folder",
            "site-backup",
            "--parent",
            "42",
            "-e",
            "target",
            "-e",
            "dist",
            "--interval-ms",
            "0",
        ])
        .unwrap();

        match cli.command {
            Commands::Sync(args) => {
                assert_eq!(args.dir, PathBuf::from("./site"));
                assert_eq!(args.folder.as_deref(), Some("site-backup"));
                assert_eq!(args.parent, Some(EntryId(42)));
                assert_eq!(args.exclude, vec!["target".to_string(), "dist".to_string()]);
                assert_eq!(args.interval_ms, Some(0));
                assert!(!args.no_default_excludes);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_upload_args() {
        let cli = Cli::try_parse_from([
            "folderfort",
            "upload",
            "report.pdf",
            "--name",
            "docs/report.pdf",
            "--overwrite",
        ])
        .unwrap();

        match cli.command {
            Commands::Upload {
                file,
                name,
                parent,
                overwrite,
            } => {
                assert_eq!(file, PathBuf::from("report.pdf"));
                assert_eq!(name.as_deref(), Some("docs/report.pdf"));
                assert_eq!(parent, None);
                assert!(overwrite);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_parent_id() {
        let result = Cli::try_parse_from(["folderfort", "folder", "a/b", "--parent", "abc"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_config_only_blocks_remote_commands() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api\nbase_url = ").unwrap();
        let load = || folderfort_core::load_config_from(&path);

        let init = Cli::try_parse_from(["folderfort", "init"]).unwrap();
        assert_eq!(config_for(&init.command, load()).unwrap(), ConfigFile::default());

        let show = Cli::try_parse_from(["folderfort", "config", "path"]).unwrap();
        assert!(config_for(&show.command, load()).is_ok());

        let sync = Cli::try_parse_from(["folderfort", "sync", "."]).unwrap();
        assert!(config_for(&sync.command, load()).is_err());
    }

    #[test]
    fn test_global_url_after_subcommand() {
        let cli = Cli::try_parse_from([
            "folderfort",
            "folder",
            "a/b",
            "--url",
            "https://eu.folderfort.com/api/v1",
        ])
        .unwrap();
        assert_eq!(cli.url.as_deref(), Some("https://eu.folderfort.com/api/v1"));
    }
}
