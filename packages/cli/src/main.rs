#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for one-off parcel resolution.
//!
//! `parcel-map resolve` runs the same pipeline as the API server for an
//! address or place name given on the command line and prints the
//! response body. `parcel-map services` prints the effective upstream
//! service configuration.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use parcel_map_parcel::assemble::to_feature_collection;
use parcel_map_parcel::service_registry::{self, RegistryError};
use parcel_map_parcel::{ParcelResolver, ResolveError};
use parcel_map_parcel_models::LocatorInput;
use parcel_map_parcel_models::config::ServiceConfig;
use parcel_map_server_models::{ApiError, ApiParcelResponse};

/// Resolve property addresses to parcel polygons.
#[derive(Parser)]
#[command(name = "parcel-map")]
#[command(about = "Resolve property addresses to parcel polygons")]
struct Cli {
    /// Service configuration TOML (default: `PARCEL_SERVICES_CONFIG` or
    /// the embedded Maine services).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Resolve an address or place name and print the `GeoJSON` response.
    Resolve {
        /// Street address, e.g. "Lot 45 Winter Street".
        #[arg(long)]
        street: Option<String>,

        /// City or town.
        #[arg(long)]
        city: Option<String>,

        /// State name or abbreviation.
        #[arg(long)]
        state: Option<String>,

        /// Municipality name, used when there is no full street address.
        #[arg(long)]
        place: Option<String>,

        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },

    /// Print the effective service configuration.
    Services,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Resolve {
            street,
            city,
            state,
            place,
            pretty,
        } => {
            let input = LocatorInput {
                street_address: street,
                city,
                state,
                place_name: place,
            };
            cmd_resolve(&config, &input, pretty).await
        }
        Commands::Services => cmd_services(&config),
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<ServiceConfig, RegistryError> {
    match path {
        Some(path) => service_registry::load_from_file(path),
        None => service_registry::from_env(),
    }
}

/// Runs one resolution and prints the success body to stdout, or the
/// error body to stderr with a non-zero exit code.
async fn cmd_resolve(
    config: &ServiceConfig,
    input: &LocatorInput,
    pretty: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let resolver = ParcelResolver::from_config(config)?;

    let result = match resolver.resolve(input).await {
        Ok(resolution) => to_feature_collection(&resolution)
            .map(|geojson| ApiParcelResponse::new(geojson, resolution.metadata))
            .map_err(ResolveError::from),
        Err(e) => Err(e),
    };

    match result {
        Ok(response) => {
            println!("{}", to_json(&response, pretty)?);
            Ok(())
        }
        Err(e) => {
            log::debug!("Resolution failed: {e}");
            let body = ApiError::new(e.summary(), e.details());
            eprintln!("{}", to_json(&body, pretty)?);
            std::process::exit(i32::from(e.status_code() / 100));
        }
    }
}

/// Prints the effective configuration as TOML.
fn cmd_services(config: &ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}
