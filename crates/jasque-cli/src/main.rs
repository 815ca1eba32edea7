//! Jasque CLI: Markdown vault manager for AI assistants
//!
//! Commands: serve, tree, search, find, tags, tasks, read, prefs, completions

mod config;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use rmcp::transport::io::stdio;
use rmcp::ServiceExt;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use jasque_core::format_preferences_for_agent;
use jasque_mcp::JasqueMcpService;
use jasque_vault::VaultManager;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "jasque")]
#[command(version)]
#[command(about = "Markdown vault manager for AI assistants")]
struct Cli {
    /// Vault root directory (overrides vault_path from the config file)
    #[arg(long, short, global = true)]
    vault: Option<PathBuf>,

    /// Path to config file (TOML). Defaults to ./jasque.toml if present.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server (stdio transport)
    Serve,
    /// Print the folder and note tree as JSON
    Tree {
        /// Folder to start from
        path: Option<String>,
    },
    /// Case-insensitive full-text search
    #[command(alias = "s")]
    Search {
        query: String,
        /// Folder to search in
        #[arg(long)]
        path: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Find notes by file name or title
    Find {
        name: String,
        #[arg(long)]
        path: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// List every tag in the vault
    Tags,
    /// List checkbox tasks
    Tasks {
        #[arg(long)]
        path: Option<String>,
        /// Include completed tasks
        #[arg(long)]
        all: bool,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Print a note as JSON (body, title, tags, header metadata)
    Read { path: String },
    /// Print the user's preferences as the agent sees them
    Prefs,
    /// Generate shell completions
    Completions { shell: Shell },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "jasque", &mut io::stdout());
        return Ok(());
    }

    let config = Config::resolve(cli.config.as_deref(), cli.vault)?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .with_context(|| format!("invalid log_filter: {}", config.log_filter))?;
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();

    let vault_path = config.vault_path()?;
    let vault = VaultManager::new(vault_path)
        .with_context(|| format!("opening vault: {}", vault_path.display()))?;

    match cli.command {
        Commands::Serve => {
            let server = JasqueMcpService::with_default_limit(vault, config.default_limit);
            tracing::info!(vault = %vault_path.display(), "cli.serve.started");
            let service = server.serve(stdio()).await?;
            service.waiting().await?;
        }
        Commands::Tree { path } => print_json(&vault.list_structure(path.as_deref()).await?)?,
        Commands::Search { query, path, limit } => {
            print_json(&vault.search_text(&query, path.as_deref(), limit).await?)?;
        }
        Commands::Find { name, path, limit } => {
            print_json(&vault.find_by_name(&name, path.as_deref(), limit).await?)?;
        }
        Commands::Tags => print_json(&vault.get_tags().await?)?,
        Commands::Tasks { path, all, limit } => {
            print_json(&vault.list_tasks(path.as_deref(), all, limit).await?)?;
        }
        Commands::Read { path } => print_json(&vault.read_note(&path).await?)?,
        Commands::Prefs => match vault.load_preferences().await? {
            Some(prefs) => println!("{}", format_preferences_for_agent(&prefs)),
            None => eprintln!("No preferences found in this vault."),
        },
        // Printed before the vault is opened.
        Commands::Completions { .. } => {}
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{text}");
    Ok(())
}
