use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use uuid::Uuid;

use repolists::catalog::CatalogService;
use repolists::config::Config;
use repolists::constants::CONFIG_GENERATED;
use repolists::logger;
use repolists::storage::LocalStorage;

#[derive(Parser)]
#[command(name = "repolists")]
#[command(about = "Inspect tag-driven repository lists")]
#[command(version)]
struct Cli {
    /// Config file path (defaults to ./repolists.toml, then the XDG config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database URL (overrides the config file)
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the repositories that currently belong to a list
    Resolve { user: Uuid, list: Uuid },
    /// Print every repository of the user with the rule that decided it
    Explain { user: Uuid, list: Uuid },
    /// Print a list and its rule set
    Show { user: Uuid, list: Uuid },
    /// Print all lists of a user
    Lists { user: Uuid },
    /// Write a default configuration file
    InitConfig {
        /// Destination (defaults to the XDG config dir)
        path: Option<PathBuf>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let output = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", output);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::InitConfig { path } = &cli.command {
        let path = match path {
            Some(path) => path.clone(),
            None => Config::get_default_config_path()?,
        };
        Config::generate_default_config(&path)?;
        println!("{}: {}", CONFIG_GENERATED, path.display());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load()?,
    };
    if let Some(url) = cli.database {
        config.database.url = url;
        config.validate()?;
    }

    let _log_buffer = logger::init(&config.logging)?;
    let storage = LocalStorage::new(&config.database).await?;
    let catalog = CatalogService::from_config(storage, &config.lists);

    match cli.command {
        Commands::Resolve { user, list } => {
            let members = catalog.resolve_list_membership(user, list).await?;
            info!("CLI: List {} has {} members", list, members.len());
            print_json(&members)
        }
        Commands::Explain { user, list } => print_json(&catalog.explain_list_membership(user, list).await?),
        Commands::Show { user, list } => print_json(&catalog.get_list(user, list).await?),
        Commands::Lists { user } => print_json(&catalog.list_lists(user).await?),
        Commands::InitConfig { .. } => Ok(()),
    }
}
