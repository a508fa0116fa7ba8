use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sacco_api::SaccoClient;
use sacco_engine::{CatalogQuery, CatalogReader};
use sacco_types::{ApplicantType, Section};
use sacco_util::{PortalConfig, token_store_for};
use tracing::debug;

mod application;

#[derive(Debug, Parser)]
#[command(name = "sacco", version, about = "SACCO loan portal client")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and store the bearer token.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "SACCO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored bearer token.
    Logout,
    /// List loan products; only active ones unless --all.
    Products {
        #[arg(long)]
        all: bool,
        #[arg(long)]
        applicant_type: Option<ApplicantType>,
    },
    /// List members available as applicants.
    Members,
    #[command(subcommand)]
    Application(ApplicationCommand),
}

#[derive(Debug, Subcommand)]
pub(crate) enum ApplicationCommand {
    /// Create an application from a JSON draft.
    Create {
        #[arg(long)]
        file: PathBuf,
        /// Print the request instead of sending it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Show an application, or one of its sections.
    Show {
        #[arg(long)]
        id: u64,
        #[arg(long)]
        section: Option<Section>,
    },
    /// Replace one section of an existing application.
    Edit {
        #[arg(long)]
        id: u64,
        #[arg(long)]
        section: Section,
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = PortalConfig::load().context("loading configuration")?;
    debug!(base_url = %config.base_url, timeout_secs = config.timeout_secs, "configuration loaded");
    let tokens = token_store_for(&config.base_url);
    let client = Arc::new(SaccoClient::new(&config, tokens)?);
    let catalog = CatalogReader::new(Arc::clone(&client), config.catalog_cache_ttl());

    match cli.command {
        Command::Login { username, password } => {
            client.login(&username, &password).await?;
            println!("Signed in to {} as {}", client.base_url, username);
        }
        Command::Logout => {
            if !client.has_session()? {
                debug!("no stored session to clear");
            }
            client.logout()?;
            println!("Signed out of {}", client.base_url);
        }
        Command::Products { all, applicant_type } => {
            let query = CatalogQuery {
                active_only: !all,
                applicant_type,
            };
            for product in catalog.loan_products(query).await? {
                let sections: Vec<&str> = Section::REPEATABLE
                    .iter()
                    .filter(|section| product.requires(**section))
                    .map(|section| section.slug())
                    .collect();
                println!(
                    "{}\t{}\t{}-{}\t{}-{} days\t{}{}",
                    product.id,
                    product.name,
                    product.min_amount,
                    product.max_amount,
                    product.min_term_days,
                    product.max_term_days,
                    if sections.is_empty() { "-".to_string() } else { sections.join(",") },
                    if product.is_active { "" } else { "\t(inactive)" },
                );
            }
        }
        Command::Members => {
            for member in catalog.members().await? {
                println!("{}\t{}", member.id, member.display_name());
            }
        }
        Command::Application(command) => application::run(&catalog, command).await?,
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
