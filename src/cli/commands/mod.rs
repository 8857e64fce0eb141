//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod init;
mod page;
mod serve;
mod upload;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "pagesum")]
#[command(about = "Image upload service with OCR text extraction and short summaries")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory holding the database and stored images
    #[arg(long, global = true, env = "PAGESUM_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Start the HTTP server
    Serve {
        /// Address to bind: port, host, or host:port (default from config)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Upload an image file for a user and print the summaries
    Upload {
        /// Username that owns the upload
        username: String,
        /// Image file to upload
        file: PathBuf,
    },

    /// Show a page's text and summary
    Show {
        /// Page ID
        page_id: String,
    },

    /// List a user's pages
    Pages {
        /// Username
        username: String,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        data_dir: cli.data_dir,
    };
    let (settings, config) = load_settings_with_options(options).await?;

    match cli.command {
        Commands::Init => init::cmd_init(&settings, &config).await,
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| settings.bind.clone());
            serve::cmd_serve(&settings, &bind).await
        }
        Commands::Upload { username, file } => {
            upload::cmd_upload(&settings, &username, &file).await
        }
        Commands::Show { page_id } => page::cmd_show(&settings, &page_id).await,
        Commands::Pages { username } => page::cmd_pages(&settings, &username).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_upload() {
        let cli = Cli::try_parse_from(["pagesum", "-v", "upload", "alice", "scan.png"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Upload { username, file } => {
                assert_eq!(username, "alice");
                assert_eq!(file, PathBuf::from("scan.png"));
            }
            _ => panic!("expected upload command"),
        }
    }

    #[test]
    fn test_parse_serve_bind() {
        let cli = Cli::try_parse_from(["pagesum", "serve", "--bind", "0.0.0.0:9000"]).unwrap();
        match cli.command {
            Commands::Serve { bind } => assert_eq!(bind.as_deref(), Some("0.0.0.0:9000")),
            _ => panic!("expected serve command"),
        }
    }
}
