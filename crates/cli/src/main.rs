//! dmesh: discover, inspect and query data mesh products.
//!
//! # Commands
//!
//! - `discover`: List data products, optionally within one domain.
//! - `info`: Show a product's descriptor (location, format, owner, tags).
//! - `schema`: Print or save a product's column schema as JSON.
//! - `query`: Run SQL against a product in an ephemeral DuckDB session.
//! - `whoami`: Show the active role and caller identity.
//!
//! Credentials come from the configured profile, the environment, or a
//! cached SSO login, in that order. Run `aws sso login` when they expire.

use clap::{CommandFactory, Parser, Subcommand};
use dmesh_common::config::{ConfigError, MeshConfig};
use dmesh_common::telemetry;
use dmesh_core::{CatalogError, CredentialError, Mesh, QueryError, Role};
use dmesh_error::{Coded, ErrorCategory, ErrorCode, MeshError};
use dotenv::dotenv;
use owo_colors::OwoColorize;
use std::path::PathBuf;

mod commands;
mod exit_codes;
mod output;

use output::OutputFormat;

#[derive(Parser)]
#[command(name = "dmesh", version)]
#[command(about = "Discover, inspect and query data mesh products", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (human, json, yaml, csv for query results)
    #[arg(long, short = 'o', global = true, value_enum, default_value = "human")]
    output: OutputFormat,

    /// Configuration profile
    #[arg(long, global = true, env = "DMESH_PROFILE")]
    profile: Option<String>,

    /// Assume this role before running the command
    #[arg(long, global = true)]
    role: Option<String>,

    /// Debug logging on stderr
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List available data products
    Discover {
        /// Only list products in this domain
        #[arg(long, short = 'd')]
        domain: Option<String>,
    },
    /// Show details of a data product
    Info {
        /// Product name (domain.product)
        product: String,
    },
    /// Show the schema of a data product
    Schema {
        /// Product name (domain.product)
        product: String,
        /// Write the schema JSON to this file instead of stdout
        #[arg(long, short = 'f')]
        output_file: Option<PathBuf>,
        /// Single-line JSON
        #[arg(long, default_value_t = false)]
        compact: bool,
    },
    /// Run SQL against a data product
    Query {
        /// SQL text; the product is available as domain.product
        sql: String,
        /// Product to register before running the query
        #[arg(long, short = 'p')]
        product: String,
    },
    /// Show the active role and caller identity
    Whoami,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv().ok();

    let cli = Cli::parse();

    if cli.output == OutputFormat::Csv && !matches!(cli.command, Commands::Query { .. }) {
        Cli::command()
            .error(
                clap::error::ErrorKind::ArgumentConflict,
                "--output csv is only supported by the query command",
            )
            .exit();
    }

    if let Err(e) = run_cli(&cli).await {
        let exit_code = map_error_to_exit_code(&e);
        let mesh_error = to_mesh_error(&e);
        tracing::debug!(code = %mesh_error.code, "Command failed: {:#}", e);

        if cli.output.is_machine_readable() {
            output::print_error(cli.output, &mesh_error, exit_code).ok();
        } else {
            eprintln!("{} {}", "Error:".red().bold(), e);
            if let Some(hint) = &mesh_error.hint {
                eprintln!("{} {}", "Hint:".yellow().bold(), hint);
            }
        }
        std::process::exit(exit_code);
    }

    Ok(())
}

async fn run_cli(cli: &Cli) -> Result<(), anyhow::Error> {
    let config = MeshConfig::load(cli.profile.as_deref())?;
    telemetry::init_logging(&config.logging, cli.verbose);
    tracing::debug!(region = %config.aws_region, profile = ?cli.profile, "Configuration loaded");

    let mesh = Mesh::from_config(&config);

    if let Some(role) = &cli.role {
        mesh.credentials
            .assume_role(Role::new(role.clone(), config.aws_account_id.clone()))
            .await?;
    }

    match &cli.command {
        Commands::Discover { domain } => {
            commands::discover(&mesh, domain.as_deref(), cli.output).await?;
        }
        Commands::Info { product } => {
            commands::info(&mesh, product, cli.output).await?;
        }
        Commands::Schema {
            product,
            output_file,
            compact,
        } => {
            commands::schema(&mesh, product, output_file.as_deref(), *compact, cli.output).await?;
        }
        Commands::Query { sql, product } => {
            commands::query(&mesh, sql, product, cli.output).await?;
        }
        Commands::Whoami => {
            commands::whoami(&mesh, cli.output).await?;
        }
    }
    Ok(())
}

fn coded(e: &anyhow::Error) -> Option<&dyn Coded> {
    if let Some(err) = e.downcast_ref::<CredentialError>() {
        return Some(err);
    }
    if let Some(err) = e.downcast_ref::<CatalogError>() {
        return Some(err);
    }
    if let Some(err) = e.downcast_ref::<QueryError>() {
        return Some(err);
    }
    if let Some(err) = e.downcast_ref::<ConfigError>() {
        return Some(err);
    }
    None
}

fn to_mesh_error(e: &anyhow::Error) -> MeshError {
    match coded(e) {
        Some(err) => {
            let mut mesh_error = MeshError::new(err.code(), e.to_string());
            mesh_error.hint = err.hint();
            mesh_error
        }
        None => MeshError::new(ErrorCode::Internal, e.to_string()),
    }
}

fn map_error_to_exit_code(e: &anyhow::Error) -> i32 {
    // Type-safe mapping for component errors
    if let Some(err) = coded(e) {
        let code = err.code();
        return match code.category() {
            ErrorCategory::Credentials => exit_codes::CREDENTIAL_ERROR,
            ErrorCategory::Config => exit_codes::CONFIG_ERROR,
            ErrorCategory::Query => exit_codes::QUERY_ERROR,
            ErrorCategory::Catalog => match code {
                ErrorCode::MalformedName | ErrorCode::ProductNotFound | ErrorCode::NotADataProduct => {
                    exit_codes::NOT_FOUND_ERROR
                }
                _ => exit_codes::CONNECTION_ERROR,
            },
            ErrorCategory::Internal => exit_codes::GENERAL_ERROR,
            _ => exit_codes::GENERAL_ERROR, // Handle future variants
        };
    }

    // Fallback: string heuristics for everything else
    let s = e.to_string().to_lowercase();
    if s.contains("usage") || s.contains("argument") {
        return exit_codes::USAGE_ERROR;
    }
    if s.contains("config") || s.contains("yaml") {
        return exit_codes::CONFIG_ERROR;
    }
    if s.contains("connect") || s.contains("timeout") {
        return exit_codes::CONNECTION_ERROR;
    }
    if s.contains("credential") || s.contains("expired") {
        return exit_codes::CREDENTIAL_ERROR;
    }
    exit_codes::GENERAL_ERROR
}
