//! CLI commands and argument parsing
//!
//! This module defines the command-line interface structure using clap
//! and runs each command against a `ResourceDeletionCoordinator`.

use crate::client::{AzureStorageClient, StorageClient};
use crate::config::{self, AuthMethod, Config};
use crate::coordinator::ResourceDeletionCoordinator;
use crate::error::{Result, SweepError};
use crate::resource::{ListingOrder, ResourceKind, StorageResource};
use crate::utils::format::{OutputFormat, TableFormatter};
use crate::utils::interactive::InteractivePrompt;
use clap::{Parser, Subcommand};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "ssw")]
#[command(about = "List and delete Azure Storage blob containers and queues")]
#[command(version = env!("VERSION_WITH_GIT"), author)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Storage account name (overrides config and AZURE_STORAGE_ACCOUNT)
    #[arg(long, global = true, value_name = "NAME")]
    pub account: Option<String>,

    /// Authentication method (default, client_secret, access_key)
    #[arg(long, global = true, value_name = "METHOD")]
    pub auth: Option<String>,

    /// Where queues appear relative to containers (containers_first, queues_first)
    #[arg(long, global = true, value_name = "ORDER")]
    pub order: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List blob containers and queues
    #[command(alias = "ls")]
    List {
        /// Only show one kind of resource
        #[arg(short, long, value_enum)]
        kind: Option<ResourceKind>,
    },
    /// Delete a blob container or queue
    #[command(alias = "rm")]
    Delete {
        /// Resource kind
        #[arg(value_enum)]
        kind: ResourceKind,
        /// Resource name
        name: String,
        /// Force deletion without confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Pick a resource interactively and delete it
    Select {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
    /// Write a default configuration file
    Init,
}

impl Cli {
    /// Apply global flags on top of file and environment configuration
    pub fn apply_overrides(&self, config: &mut Config) -> Result<()> {
        if self.debug {
            config.debug = true;
        }
        if self.json {
            config.output_json = true;
        }
        if self.no_color {
            config.no_color = true;
        }
        if let Some(account) = &self.account {
            config.storage_account = account.clone();
        }
        if let Some(auth) = &self.auth {
            config.auth_method = AuthMethod::from_str(auth).map_err(SweepError::config)?;
        }
        if let Some(order) = &self.order {
            config.listing_order = ListingOrder::from_str(order).map_err(SweepError::config)?;
        }
        Ok(())
    }

    /// Run the command against an already merged configuration
    pub async fn execute(self, config: Config) -> Result<()> {
        match self.command {
            Commands::Config { command } => execute_config_command(command, config).await,
            Commands::List { kind } => azure_session(&config)?.list(kind).await,
            Commands::Delete { kind, name, force } => {
                azure_session(&config)?.delete(kind, &name, force).await?;
                Ok(())
            }
            Commands::Select { force } => {
                azure_session(&config)?.select_and_delete(force).await?;
                Ok(())
            }
        }
    }
}

fn azure_session(config: &Config) -> Result<Session> {
    let client: Arc<dyn StorageClient> = Arc::new(AzureStorageClient::from_config(config)?);
    Ok(Session::new(client, config))
}

/// A front-end session: one coordinator plus output settings
pub struct Session {
    coordinator: ResourceDeletionCoordinator,
    formatter: TableFormatter,
    prompt: InteractivePrompt,
}

impl Session {
    pub fn new(client: Arc<dyn StorageClient>, config: &Config) -> Self {
        let format = if config.output_json {
            OutputFormat::Json
        } else {
            OutputFormat::Table
        };

        Self {
            coordinator: ResourceDeletionCoordinator::new(client, config.listing_order),
            formatter: TableFormatter::new(format, config.no_color),
            prompt: InteractivePrompt::new(),
        }
    }

    pub fn coordinator(&self) -> &ResourceDeletionCoordinator {
        &self.coordinator
    }

    /// Refresh and print the listing
    pub async fn list(&self, kind: Option<ResourceKind>) -> Result<()> {
        let listing = self.coordinator.refresh_listing().await?;
        debug!("Fetched {} resources", listing.len());

        let output = match kind {
            Some(kind) => self.formatter.format_resources(listing.of_kind(kind))?,
            None => self.formatter.format_listing(&listing)?,
        };
        println!("{output}");
        Ok(())
    }

    /// Refresh, select the named resource and delete it
    ///
    /// Returns the deleted resource, or `None` if the user declined.
    pub async fn delete(
        &self,
        kind: ResourceKind,
        name: &str,
        force: bool,
    ) -> Result<Option<StorageResource>> {
        self.coordinator.refresh_listing().await?;
        let resource = self.coordinator.select_by_name(kind, name)?;
        self.confirm_and_delete(&resource, force).await
    }

    /// Refresh, let the user pick a resource and delete it
    pub async fn select_and_delete(&self, force: bool) -> Result<Option<StorageResource>> {
        let listing = self.coordinator.refresh_listing().await?;
        if listing.is_empty() {
            self.prompt.info("No containers or queues found");
            return Ok(None);
        }

        let labels: Vec<String> = listing.iter().map(|r| r.to_string()).collect();
        let Some(index) = self
            .prompt
            .fuzzy_select("Select a container or queue to delete", &labels)?
        else {
            self.prompt.info("Nothing selected");
            return Ok(None);
        };

        let resource = listing
            .get(index)
            .cloned()
            .ok_or_else(|| SweepError::input("Selection out of range"))?;
        self.coordinator.select(&resource)?;
        self.confirm_and_delete(&resource, force).await
    }

    async fn confirm_and_delete(
        &self,
        resource: &StorageResource,
        force: bool,
    ) -> Result<Option<StorageResource>> {
        if !force {
            let confirmed = self
                .prompt
                .confirm(&format!("Are you sure you want to delete {resource}?"), false)?;
            if !confirmed {
                self.coordinator.clear_selection();
                self.prompt.info("Deletion cancelled");
                return Ok(None);
            }
        }

        let spinner = self.prompt.spinner(format!("Deleting {resource}..."));
        let result = self.coordinator.delete_selected().await;
        spinner.finish_and_clear();

        match result {
            Ok(deleted) => {
                info!("Deleted {}", deleted);
                self.prompt.success(&format!("Deleted {deleted}"));
                Ok(Some(deleted))
            }
            Err(e) => {
                debug!("Failed to delete {}: {}", resource, e);
                Err(e.into())
            }
        }
    }
}

async fn execute_config_command(command: ConfigCommands, config: Config) -> Result<()> {
    match command {
        ConfigCommands::Show => execute_config_show(&config),
        ConfigCommands::Path => {
            println!("{}", Config::get_config_path()?.display());
            Ok(())
        }
        ConfigCommands::Set { key, value } => execute_config_set(&key, &value).await,
        ConfigCommands::Init => {
            let path = Config::get_config_path()?;
            if config::init_default_config().await? {
                println!("Created {}", path.display());
            } else {
                println!("Configuration already exists at {}", path.display());
            }
            Ok(())
        }
    }
}

fn execute_config_show(config: &Config) -> Result<()> {
    if config.output_json {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        let mut table = tabled::Table::new([config.clone()]);
        table.with(tabled::settings::Rotate::Left);
        table.with(tabled::settings::Style::rounded());
        println!("{table}");
    }
    Ok(())
}

async fn execute_config_set(key: &str, value: &str) -> Result<()> {
    // Persist only file-backed values; environment overrides stay out of the file
    let path = Config::get_config_path()?;
    let mut file_config = if path.exists() {
        config::load_from_file(&path).await?
    } else {
        Config::default()
    };

    file_config.set_value(key, value)?;
    file_config.save().await?;

    println!("Set {key} = {value}");
    Ok(())
}
